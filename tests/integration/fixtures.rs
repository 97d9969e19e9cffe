//! Test fixtures for integration tests.
//!
//! Provides helpers for:
//! - Scratch workspaces with output and memory directories
//! - Scripted engines returning fixed task outputs
//! - Canned pick, edit and final records

use std::path::PathBuf;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use serde_json::{json, Value};
use tempfile::TempDir;

use newsdesk::config::Config;
use newsdesk::engine::{CrewOutput, CrewRequest, Orchestrator, TaskOutput};
use newsdesk::{Error, Pipeline, Result};

/// A scratch workspace whose config points into a temporary directory.
pub struct TestDesk {
    pub temp_dir: TempDir,
    pub config: Config,
}

impl TestDesk {
    /// Two subtopics give a 9-step crew: picks 1-2, edits 3-4, chief 5,
    /// QA check 6, remediation 7, rebuild 8, closing QA 9.
    pub fn new() -> Self {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let config = Config {
            topic: "Cancer Health Care".to_string(),
            subtopics: vec![
                "Precision Oncology".to_string(),
                "Cancer Treatment Methods".to_string(),
            ],
            output_dir: temp_dir.path().join("output").to_string_lossy().into_owned(),
            memory_dir: temp_dir.path().join("memory").to_string_lossy().into_owned(),
            ..Config::default()
        };
        config.ensure_dirs().expect("Failed to create workspace dirs");
        Self { temp_dir, config }
    }

    pub fn pipeline(&self, engine: Arc<dyn Orchestrator>) -> Pipeline {
        Pipeline::new(self.config.clone(), engine)
    }

    pub fn result_file(&self) -> PathBuf {
        self.temp_dir
            .path()
            .join("output")
            .join("cancer_health_care_result.json")
    }
}

/// Returns the same task outputs on every kickoff and counts calls.
pub struct ScriptedCrew {
    outputs: Vec<String>,
    pub calls: AtomicUsize,
    pub last_topic: std::sync::Mutex<Option<String>>,
}

impl ScriptedCrew {
    pub fn new<S: Into<String>>(outputs: impl IntoIterator<Item = S>) -> Arc<Self> {
        Arc::new(Self {
            outputs: outputs.into_iter().map(Into::into).collect(),
            calls: AtomicUsize::new(0),
            last_topic: std::sync::Mutex::new(None),
        })
    }
}

#[async_trait]
impl Orchestrator for ScriptedCrew {
    async fn kickoff(&self, request: &CrewRequest) -> Result<CrewOutput> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        *self.last_topic.lock().unwrap() = Some(request.inputs.topic.clone());
        Ok(CrewOutput {
            tasks_output: self.outputs.iter().map(TaskOutput::raw).collect(),
        })
    }

    fn describe(&self) -> String {
        format!("scripted ({} outputs)", self.outputs.len())
    }
}

/// Always fails the way a crashed engine process does.
pub struct FailingCrew;

#[async_trait]
impl Orchestrator for FailingCrew {
    async fn kickoff(&self, _request: &CrewRequest) -> Result<CrewOutput> {
        Err(Error::Engine("rate limit exceeded".to_string()))
    }

    fn describe(&self) -> String {
        "failing".to_string()
    }
}

pub fn pick(titles: &[&str]) -> String {
    let articles: Vec<Value> = titles
        .iter()
        .map(|t| {
            json!({
                "title": t,
                "url": format!("https://news.example/{}", t.to_lowercase().replace(' ', "-")),
                "source": "Reuters",
                "published_date": "2025-08-01",
            })
        })
        .collect();
    json!({ "articles": articles }).to_string()
}

pub fn edit(summaries: &[&str], editorial: &str) -> String {
    json!({ "summaries": summaries, "editorial": editorial }).to_string()
}

/// Closing QA report; never carries a `final`.
pub fn qa_report() -> String {
    json!({ "passed": true, "issues": [] }).to_string()
}

pub fn final_record(headline: &str) -> String {
    json!({
        "final": {
            "topic": "Cancer Health Care",
            "subtopics": ["Precision Oncology"],
            "per_subtopic": {
                "Precision Oncology": {
                    "best_article": { "title": headline },
                    "candidates": [{ "title": headline }],
                    "editorial_candidates": [{ "title": "Why biomarkers matter" }],
                }
            },
            "home": {
                "best_articles": [{ "title": headline, "subtopic": "Precision Oncology" }],
                "main_editorial": { "title": "Why biomarkers matter" },
            }
        }
    })
    .to_string()
}
