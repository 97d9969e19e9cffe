use std::sync::atomic::{AtomicU64, Ordering};

use crate::assemble::{HomeView, SubtopicView};
use crate::tea::Notification;

/// Content pane of the dashboard.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum Page {
    /// No run has completed yet.
    #[default]
    Empty,
    Home(HomeView),
    Subtopic { name: String, view: SubtopicView },
}

static VERSION_COUNTER: AtomicU64 = AtomicU64::new(1);

pub fn next_version() -> u64 {
    VERSION_COUNTER.fetch_add(1, Ordering::Relaxed)
}

/// Snapshot sent from the logic thread to the render loop.
#[derive(Debug, Clone, Default)]
pub struct RenderState {
    pub version: u64,
    pub topic: String,
    pub topic_count: usize,
    pub running: bool,
    /// Navigation labels; index 0 is Home.
    pub sections: Vec<String>,
    pub selected: usize,
    pub page: Page,
    pub scroll: u16,
    pub notification: Option<Notification>,
    /// Source chain of the last engine failure, shown until the next key.
    pub error_trace: Option<String>,
    /// Whether the keymap legend is expanded (toggled by '?')
    pub show_keymap: bool,
    pub write_error: Option<String>,
}
