//! Boundary to the external orchestration engine.
//!
//! The engine runs the crew against a language model and its tools and
//! hands back one text output per task, in task order. Everything behind
//! that boundary is opaque to newsdesk.

use std::path::PathBuf;
use std::process::Stdio;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tokio::io::AsyncWriteExt;
use tokio::process::Command;

use crate::config::{Config, EngineConfig};
use crate::crew::CrewManifest;
use crate::error::{Error, Result};
use crate::{nlog, nlog_debug, nlog_trace, nlog_warn};

/// Input mapping for a crew kickoff.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CrewInputs {
    pub topic: String,
}

/// Everything the engine needs for one run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CrewRequest {
    pub inputs: CrewInputs,
    pub manifest: CrewManifest,
}

impl CrewRequest {
    /// The news portal crew for the configured topic and subtopics.
    pub fn for_config(config: &Config) -> Self {
        Self {
            inputs: CrewInputs {
                topic: config.topic.clone(),
            },
            manifest: CrewManifest::news_portal(
                &config.topic,
                &config.subtopics,
                &config.memory_dir(),
            ),
        }
    }
}

/// One task's output as reported by the engine.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TaskOutput {
    #[serde(default)]
    pub raw: Option<String>,
    #[serde(default)]
    pub output: Option<String>,
}

impl TaskOutput {
    pub fn raw(text: impl Into<String>) -> Self {
        Self {
            raw: Some(text.into()),
            output: None,
        }
    }

    /// Primary `raw` text if non-empty, else `output`, else the empty string.
    pub fn text(&self) -> &str {
        [self.raw.as_deref(), self.output.as_deref()]
            .into_iter()
            .flatten()
            .find(|s| !s.is_empty())
            .unwrap_or("")
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CrewOutput {
    #[serde(default)]
    pub tasks_output: Vec<TaskOutput>,
}

impl CrewOutput {
    /// Parse engine stdout: the whole text first, then its last non-empty
    /// line (engines print progress before the result).
    pub fn from_stdout(stdout: &str) -> Result<Self> {
        match serde_json::from_str::<CrewOutput>(stdout.trim()) {
            Ok(output) => Ok(output),
            Err(whole_err) => {
                let last = stdout.lines().rev().find(|l| !l.trim().is_empty());
                match last.map(|l| serde_json::from_str::<CrewOutput>(l.trim())) {
                    Some(Ok(output)) => Ok(output),
                    _ => Err(Error::Json(whole_err)),
                }
            }
        }
    }
}

/// A crew runner.
///
/// Dropping the returned future abandons the run; implementations that own
/// a child process kill it.
#[async_trait]
pub trait Orchestrator: Send + Sync {
    async fn kickoff(&self, request: &CrewRequest) -> Result<CrewOutput>;

    fn describe(&self) -> String;
}

/// Runs the crew as a child process speaking JSON over stdin/stdout.
#[derive(Debug, Clone)]
pub struct CommandCrew {
    binary: PathBuf,
    args: Vec<String>,
}

impl CommandCrew {
    /// Resolve `command` on PATH.
    pub fn new(command: &str, args: Vec<String>) -> Result<Self> {
        let binary = which::which(command).map_err(|_| Error::EngineNotFound(command.to_string()))?;
        Ok(Self { binary, args })
    }

    pub fn with_binary(binary: PathBuf, args: Vec<String>) -> Self {
        Self { binary, args }
    }
}

#[async_trait]
impl Orchestrator for CommandCrew {
    async fn kickoff(&self, request: &CrewRequest) -> Result<CrewOutput> {
        nlog!(
            "CommandCrew kickoff binary={} topic={} tasks={}",
            self.binary.display(),
            request.inputs.topic,
            request.manifest.tasks.len()
        );
        let payload = serde_json::to_vec(request)?;

        let mut child = Command::new(&self.binary)
            .args(&self.args)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()?;

        let mut stdin = child.stdin.take();
        let feed = async move {
            if let Some(stdin) = stdin.as_mut() {
                stdin.write_all(&payload).await?;
                stdin.shutdown().await?;
            }
            Ok::<_, std::io::Error>(())
        };

        // stdin is fed while stdout drains.
        let (fed, output) = tokio::join!(feed, child.wait_with_output());
        if let Err(e) = fed {
            nlog_debug!("CommandCrew stdin write ended early: {}", e);
        }
        let output = output?;
        let stdout = String::from_utf8_lossy(&output.stdout);
        let stderr = String::from_utf8_lossy(&output.stderr);
        nlog_trace!("CommandCrew stdout: {}", stdout);

        if !output.status.success() {
            let message = if stderr.trim().is_empty() {
                format!(
                    "engine exited with code {}",
                    output.status.code().unwrap_or(-1)
                )
            } else {
                stderr.trim().to_string()
            };
            nlog_warn!("CommandCrew failed: {}", message);
            return Err(Error::Engine(message));
        }

        let crew_output = CrewOutput::from_stdout(&stdout)?;
        nlog_debug!(
            "CommandCrew returned {} task outputs",
            crew_output.tasks_output.len()
        );
        Ok(crew_output)
    }

    fn describe(&self) -> String {
        format!("command {}", self.binary.display())
    }
}

/// Replays a recorded crew output from disk.
#[derive(Debug, Clone)]
pub struct ReplayCrew {
    path: PathBuf,
}

impl ReplayCrew {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

#[async_trait]
impl Orchestrator for ReplayCrew {
    async fn kickoff(&self, request: &CrewRequest) -> Result<CrewOutput> {
        nlog!(
            "ReplayCrew kickoff path={} topic={}",
            self.path.display(),
            request.inputs.topic
        );
        let text = tokio::fs::read_to_string(&self.path).await?;
        Ok(serde_json::from_str(&text)?)
    }

    fn describe(&self) -> String {
        format!("replay {}", self.path.display())
    }
}

/// Build the engine selected by configuration: a replay file wins over a command.
pub fn from_config(config: &EngineConfig) -> Result<Box<dyn Orchestrator>> {
    if let Some(path) = &config.replay {
        return Ok(Box::new(ReplayCrew::new(path)));
    }
    Ok(Box::new(CommandCrew::new(
        config.effective_command(),
        config.args.clone(),
    )?))
}
