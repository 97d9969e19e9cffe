//! Inputs to the update function.

use crossterm::event::KeyEvent;

use crate::pipeline::MergedResult;

#[derive(Debug)]
pub enum Message {
    // Keyboard/terminal events
    Key(KeyEvent),
    Resize(u16, u16),

    // Pipeline completion callbacks
    RunFinished(Box<MergedResult>),
    /// Engine failure: display message and the error's source chain.
    RunFailed { message: String, trace: String },
}
