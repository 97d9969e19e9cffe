//! Side effects returned by the update function and executed by the logic thread.

use crate::config::Config;

#[derive(Debug)]
pub enum Command {
    /// Kick off one pipeline run with the given (topic-specific) config.
    RunPipeline { config: Box<Config> },

    Quit,
}
