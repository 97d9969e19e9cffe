//! The pipeline driver: one engine kickoff, normalization, final-view
//! resolution and persistence.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use serde::ser::{Serialize, SerializeMap, Serializer};
use serde_json::{Map, Value};

use crate::assemble::{resolve_final, FinalView};
use crate::config::Config;
use crate::crew::{CrewManifest, StepLayout};
use crate::engine::{CrewOutput, CrewRequest, Orchestrator};
use crate::normalize::{ensure_json, StepRecord};
use crate::persist;
use crate::util::blocking;
use crate::{nlog, nlog_debug, nlog_warn, Error, Result};

/// Everything one run produced, keyed the way it is persisted.
#[derive(Debug, Clone, PartialEq)]
pub struct MergedResult {
    pub topic: String,
    /// Step records in task order; `steps[0]` is `step_1`.
    pub steps: Vec<StepRecord>,
    pub final_view: Value,
    pub file_write_error: Option<String>,
}

impl MergedResult {
    /// Normalize engine output and resolve `final`.
    pub fn from_crew_output(
        topic: &str,
        subtopics: &[String],
        layout: &StepLayout,
        output: &CrewOutput,
    ) -> Self {
        let steps: Vec<StepRecord> = output
            .tasks_output
            .iter()
            .map(|task| ensure_json(task.text()))
            .collect();

        for (i, record) in steps.iter().enumerate() {
            if let StepRecord::NonJson { raw } = record {
                nlog_warn!("step_{} is not JSON ({} chars)", i + 1, raw.len());
            }
        }

        let final_view = resolve_final(&steps, layout, topic, subtopics);
        Self {
            topic: topic.to_string(),
            steps,
            final_view,
            file_write_error: None,
        }
    }

    pub fn view(&self) -> FinalView {
        FinalView::from_value(&self.final_view)
    }

    /// Number of steps that parsed as JSON.
    pub fn parsed_steps(&self) -> usize {
        self.steps.iter().filter(|s| s.is_parsed()).count()
    }

    pub fn to_value(&self) -> Value {
        let mut map = Map::new();
        map.insert("topic".to_string(), Value::String(self.topic.clone()));
        for (i, step) in self.steps.iter().enumerate() {
            map.insert(format!("step_{}", i + 1), step.to_value());
        }
        map.insert("final".to_string(), self.final_view.clone());
        if let Some(err) = &self.file_write_error {
            map.insert("file_write_error".to_string(), Value::String(err.clone()));
        }
        Value::Object(map)
    }

    /// Rebuild from the persisted mapping. Steps are read in numeric order
    /// until the first gap.
    pub fn from_value(value: Value) -> Result<Self> {
        let Value::Object(mut map) = value else {
            return Err(Error::Validation("result must be a JSON object".to_string()));
        };

        let topic = match map.remove("topic") {
            Some(Value::String(s)) => s,
            _ => return Err(Error::Validation("result has no topic".to_string())),
        };

        let mut steps = Vec::new();
        while let Some(step) = map.remove(&format!("step_{}", steps.len() + 1)) {
            steps.push(StepRecord::from_value(step));
        }

        Ok(Self {
            topic,
            steps,
            final_view: map.remove("final").unwrap_or(Value::Null),
            file_write_error: map
                .remove("file_write_error")
                .and_then(|v| v.as_str().map(str::to_string)),
        })
    }
}

impl Serialize for MergedResult {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        let extra = usize::from(self.file_write_error.is_some());
        let mut map = serializer.serialize_map(Some(self.steps.len() + 2 + extra))?;
        map.serialize_entry("topic", &self.topic)?;
        for (i, step) in self.steps.iter().enumerate() {
            map.serialize_entry(&format!("step_{}", i + 1), step)?;
        }
        map.serialize_entry("final", &self.final_view)?;
        if let Some(err) = &self.file_write_error {
            map.serialize_entry("file_write_error", err)?;
        }
        map.end()
    }
}

/// A configured crew bound to an engine.
pub struct Pipeline {
    config: Config,
    request: CrewRequest,
    engine: Arc<dyn Orchestrator>,
}

impl Pipeline {
    pub fn new(config: Config, engine: Arc<dyn Orchestrator>) -> Self {
        let request = CrewRequest::for_config(&config);
        Self {
            config,
            request,
            engine,
        }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn manifest(&self) -> &CrewManifest {
        &self.request.manifest
    }

    pub fn request(&self) -> &CrewRequest {
        &self.request
    }

    pub fn output_path(&self) -> PathBuf {
        persist::result_path(&self.config.output_dir(), &self.config.topic)
    }

    /// Run the crew once and build, persist and return the merged result.
    ///
    /// Engine failures propagate. So does an expired `engine.timeout_secs`,
    /// which abandons the kickoff before anything is written. A failed file
    /// write does not: it is recorded under `file_write_error`.
    pub async fn run(&self) -> Result<MergedResult> {
        self.config.validate()?;
        nlog!(
            "Pipeline::run topic={} engine={}",
            self.config.topic,
            self.engine.describe()
        );

        let kickoff = self.engine.kickoff(&self.request);
        let output = match self.config.engine.timeout_secs {
            Some(secs) => {
                let limit = Duration::from_secs(secs);
                tokio::time::timeout(limit, kickoff).await.map_err(|_| {
                    nlog_warn!("Engine timed out after {:?}", limit);
                    Error::Timeout(limit)
                })??
            }
            None => kickoff.await?,
        };

        let mut merged = MergedResult::from_crew_output(
            &self.config.topic,
            &self.config.subtopics,
            &self.manifest().layout(),
            &output,
        );
        nlog_debug!(
            "Merged {} steps ({} parsed)",
            merged.steps.len(),
            merged.parsed_steps()
        );

        let path = self.output_path();
        let written = {
            let path = path.clone();
            let snapshot = merged.clone();
            blocking(move || persist::write_result(&path, &snapshot)).await
        };
        match written {
            Ok(()) => nlog!("Result saved to {}", path.display()),
            Err(e) => {
                nlog_warn!("Result write failed for {}: {}", path.display(), e);
                merged.file_write_error = Some(e.to_string());
            }
        }
        Ok(merged)
    }
}
