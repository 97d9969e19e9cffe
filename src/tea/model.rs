//! Dashboard state. No channels or handles live here.

use crate::assemble::FinalView;
use crate::config::{Config, TopicConfig};
use crate::pipeline::MergedResult;
use crate::render::{next_version, Page, RenderState};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NotificationLevel {
    /// Red, with an "Error:" prefix
    Error,
    /// Green
    Info,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notification {
    pub level: NotificationLevel,
    pub message: String,
}

/// Entry in the navigation pane.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Section {
    Home,
    Subtopic(String),
}

impl Section {
    pub fn label(&self) -> &str {
        match self {
            Section::Home => "Home",
            Section::Subtopic(name) => name,
        }
    }
}

pub struct Model {
    pub config: Config,
    pub topics: Vec<TopicConfig>,
    pub topic_index: usize,

    /// Last successful run; kept when a later run fails.
    pub results: Option<MergedResult>,
    /// `results.final` read for rendering.
    pub view: Option<FinalView>,

    pub selected: usize,
    pub scroll: u16,
    pub running: bool,

    pub notification: Option<Notification>,
    pub error_trace: Option<String>,
    pub show_keymap: bool,

    pub dirty: bool,
}

impl Model {
    pub fn new(config: Config) -> Self {
        let topics = config.topic_choices();
        Self {
            config,
            topics,
            topic_index: 0,
            results: None,
            view: None,
            selected: 0,
            scroll: 0,
            running: false,
            notification: None,
            error_trace: None,
            show_keymap: false,
            dirty: true,
        }
    }

    /// Start with a previously saved result on screen.
    pub fn with_results(mut self, results: MergedResult) -> Self {
        if let Some(i) = self.topics.iter().position(|t| t.name == results.topic) {
            self.topic_index = i;
        }
        self.set_results(results);
        self
    }

    pub fn set_results(&mut self, results: MergedResult) {
        self.view = Some(results.view());
        self.results = Some(results);
        self.selected = 0;
        self.scroll = 0;
        self.dirty = true;
    }

    pub fn current_topic(&self) -> &TopicConfig {
        &self.topics[self.topic_index]
    }

    /// Config for a run on the selected topic.
    pub fn run_config(&self) -> Config {
        self.config.with_topic(self.current_topic())
    }

    /// Home followed by the subtopics the result lists.
    pub fn sections(&self) -> Vec<Section> {
        let mut sections = vec![Section::Home];
        if let Some(view) = &self.view {
            sections.extend(view.subtopics.iter().cloned().map(Section::Subtopic));
        }
        sections
    }

    pub fn selected_section(&self) -> Section {
        self.sections()
            .into_iter()
            .nth(self.selected)
            .unwrap_or(Section::Home)
    }

    /// Immutable snapshot for the render thread.
    pub fn snapshot(&self) -> RenderState {
        let page = match (&self.view, self.selected_section()) {
            (None, _) => Page::Empty,
            (Some(view), Section::Home) => Page::Home(view.home.clone()),
            (Some(view), Section::Subtopic(name)) => Page::Subtopic {
                view: view.subtopic(&name).cloned().unwrap_or_default(),
                name,
            },
        };

        RenderState {
            version: next_version(),
            topic: self.current_topic().name.clone(),
            topic_count: self.topics.len(),
            running: self.running,
            sections: self
                .sections()
                .iter()
                .map(|s| s.label().to_string())
                .collect(),
            selected: self.selected,
            page,
            scroll: self.scroll,
            notification: self.notification.clone(),
            error_trace: self.error_trace.clone(),
            show_keymap: self.show_keymap,
            write_error: self
                .results
                .as_ref()
                .and_then(|r| r.file_write_error.clone()),
        }
    }
}
