//! The Elm Architecture (TEA) for the dashboard.
//!
//! - `Model`: dashboard state, including the cached result of the last run
//! - `Message`: keyboard input and pipeline completions
//! - `Command`: side effects requested by `update`
//! - `update`: the state transition function

pub mod command;
pub mod message;
pub mod model;
pub mod update;

pub use command::Command;
pub use message::Message;
pub use model::{Model, Notification, NotificationLevel, Section};
pub use update::update;
