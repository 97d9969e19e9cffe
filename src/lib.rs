pub mod assemble;
pub mod config;
pub mod crew;
pub mod engine;
pub mod error;
pub mod log;
pub mod normalize;
pub mod persist;
pub mod pipeline;
pub mod util;

// Decoupled game loop architecture
pub mod app;
pub mod render;
pub mod tea;
pub mod ui;

pub use config::Config;
pub use engine::{CrewOutput, Orchestrator};
pub use error::{Error, Result};
pub use normalize::{ensure_json, StepRecord};
pub use pipeline::{MergedResult, Pipeline};
