//! Crew configuration handed to the orchestration engine.
//!
//! The news portal runs a fixed, sequential crew: one news-pick task and one
//! edit task per subtopic, then the late stages. The chief editor compiles,
//! QA checks, the editor remediates, the chief rebuilds and QA signs off.
//! The engine receives this manifest verbatim; the step layout derived from
//! it tells the assembler which outputs to pair.

use std::collections::BTreeMap;
use std::path::Path;

use serde::{Deserialize, Serialize};

pub const NEWS_PICKER: &str = "news_picker_agent";
pub const EDITOR: &str = "editor_agent";
pub const CHIEF_EDITOR: &str = "chief_editor_agent";
pub const QA: &str = "qa_agent";

pub const NEWS_SEARCH_TOOL: &str = "news_search";
pub const SCRAPE_TOOL: &str = "scrape_website";

/// Role a task plays in the pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskKind {
    Pick,
    Edit,
    Chief,
    QaCheck,
    Remediate,
    Rebuild,
    FinalCheck,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AgentSpec {
    pub name: String,
    pub role: String,
    pub goal: String,
    pub tools: Vec<String>,
    pub memory: bool,
    pub allow_delegation: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolSpec {
    pub name: String,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub params: BTreeMap<String, serde_json::Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub requires_env: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TaskSpec {
    pub name: String,
    pub kind: TaskKind,
    pub agent: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub subtopic: Option<String>,
    pub description: String,
    pub expected_output: String,
}

/// Memory stores available to the engine. Declared only; `enabled` stays false.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MemorySpec {
    pub enabled: bool,
    pub long_term_db: String,
    pub rag_path: String,
    pub embedder_provider: String,
    pub embedder_model: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CrewManifest {
    pub process: String,
    pub agents: Vec<AgentSpec>,
    pub tools: Vec<ToolSpec>,
    pub tasks: Vec<TaskSpec>,
    pub memory: MemorySpec,
}

impl CrewManifest {
    /// The news-portal crew for `topic`, one pick and one edit task per subtopic.
    pub fn news_portal(topic: &str, subtopics: &[String], memory_dir: &Path) -> Self {
        let mut tasks = Vec::with_capacity(subtopics.len() * 2 + 5);

        for sub in subtopics {
            tasks.push(TaskSpec {
                name: format!("pick_news_{}", abbreviate(sub)),
                kind: TaskKind::Pick,
                agent: NEWS_PICKER.to_string(),
                subtopic: Some(sub.clone()),
                description: format!(
                    "Search recent news about '{sub}' within {topic}. Pick up to 5 credible \
                     articles published in the last two months and one editorial candidate."
                ),
                expected_output: "JSON object: {\"subtopic\", \"articles\": [{\"title\", \
                                  \"url\", \"source\", \"published_date\"}], \
                                  \"editorial_candidates\": [...]}"
                    .to_string(),
            });
        }

        for sub in subtopics {
            tasks.push(TaskSpec {
                name: format!("edit_{}", abbreviate(sub)),
                kind: TaskKind::Edit,
                agent: EDITOR.to_string(),
                subtopic: Some(sub.clone()),
                description: format!(
                    "Read the articles picked for '{sub}', write a short summary of each in \
                     the same order, and write a brief editorial for the subtopic."
                ),
                expected_output: "JSON object: {\"subtopic\", \"summaries\": [string], \
                                  \"editorial\": string}"
                    .to_string(),
            });
        }

        let final_format = "JSON object with key \"final\": {\"subtopics\", \
                            \"per_subtopic\", \"home\": {\"best_articles\", \
                            \"main_editorial\"}}";
        let late = |name: &str, kind: TaskKind, agent: &str, description: String| TaskSpec {
            name: name.to_string(),
            kind,
            agent: agent.to_string(),
            subtopic: None,
            description,
            expected_output: final_format.to_string(),
        };

        tasks.push(late(
            "chief_editor",
            TaskKind::Chief,
            CHIEF_EDITOR,
            format!(
                "Compile the portal for {topic}: choose the best article per subtopic and \
                 the best editorial overall."
            ),
        ));
        tasks.push(late(
            "qa_task",
            TaskKind::QaCheck,
            QA,
            "Check the compiled portal for broken links, duplicates and missing fields. \
             Return the structure with problems listed or fixed."
                .to_string(),
        ));
        tasks.push(late(
            "qa_remediate",
            TaskKind::Remediate,
            EDITOR,
            "Replace every article or summary QA flagged with a sound alternative from the \
             picked candidates."
                .to_string(),
        ));
        tasks.push(late(
            "rebuild_final",
            TaskKind::Rebuild,
            CHIEF_EDITOR,
            format!("Rebuild the {topic} front page from the remediated sections."),
        ));
        tasks.push(TaskSpec {
            expected_output: "JSON object: {\"passed\": bool, \"issues\": [string]}"
                .to_string(),
            ..late(
                "qa_task_final",
                TaskKind::FinalCheck,
                QA,
                "Verify the rebuilt portal once more and report any problems left.".to_string(),
            )
        });

        Self {
            process: "sequential".to_string(),
            agents: default_agents(topic),
            tools: default_tools(),
            tasks,
            memory: MemorySpec {
                enabled: false,
                long_term_db: memory_dir
                    .join("long_term_memory_storage.db")
                    .to_string_lossy()
                    .into_owned(),
                rag_path: memory_dir.to_string_lossy().into_owned(),
                embedder_provider: "openai".to_string(),
                embedder_model: "text-embedding-3-small".to_string(),
            },
        }
    }

    pub fn layout(&self) -> StepLayout {
        StepLayout::from_manifest(self)
    }
}

fn default_agents(topic: &str) -> Vec<AgentSpec> {
    let agent = |name: &str, role: &str, goal: String, tools: &[&str]| AgentSpec {
        name: name.to_string(),
        role: role.to_string(),
        goal,
        tools: tools.iter().map(|t| t.to_string()).collect(),
        memory: false,
        allow_delegation: false,
    };

    vec![
        agent(
            NEWS_PICKER,
            "News Picker",
            format!("Find the most relevant recent {topic} news"),
            &[NEWS_SEARCH_TOOL],
        ),
        agent(
            EDITOR,
            "Editor",
            "Summarize picked articles and write subtopic editorials".to_string(),
            &[SCRAPE_TOOL, NEWS_SEARCH_TOOL],
        ),
        agent(
            CHIEF_EDITOR,
            "Chief Editor",
            format!("Assemble the {topic} portal front page"),
            &[],
        ),
        agent(
            QA,
            "Quality Assurance",
            "Verify and fix the compiled portal".to_string(),
            &[],
        ),
    ]
}

fn default_tools() -> Vec<ToolSpec> {
    let params = [
        ("type", serde_json::json!("news")),
        ("num", serde_json::json!(20)),
        ("hl", serde_json::json!("en")),
        ("gl", serde_json::json!("us")),
        ("tbs", serde_json::json!("qdr:m2")),
    ]
    .into_iter()
    .map(|(k, v)| (k.to_string(), v))
    .collect();

    vec![
        ToolSpec {
            name: NEWS_SEARCH_TOOL.to_string(),
            params,
            requires_env: Some("SERPER_API_KEY".to_string()),
        },
        ToolSpec {
            name: SCRAPE_TOOL.to_string(),
            params: BTreeMap::new(),
            requires_env: None,
        },
    ]
}

const STOP_WORDS: [&str; 4] = ["and", "or", "of", "the"];

/// Initials of a subtopic's words, lowercased, connectives skipped:
/// `Early Detection and Diagnosis` -> `edd`.
pub fn abbreviate(subtopic: &str) -> String {
    subtopic
        .split(|c: char| !c.is_alphanumeric())
        .filter(|word| !word.is_empty())
        .filter(|word| !STOP_WORDS.iter().any(|stop| word.eq_ignore_ascii_case(stop)))
        .filter_map(|word| word.chars().next())
        .flat_map(char::to_lowercase)
        .collect()
}

/// 1-based step numbers of the tasks the assembler cares about.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct StepLayout {
    /// Pick step per subtopic, in subtopic order.
    pub pick_steps: Vec<usize>,
    /// Edit step per subtopic, in subtopic order.
    pub edit_steps: Vec<usize>,
    /// Steps whose `"final"` field is preferred, most trusted first:
    /// rebuild, remediation, QA check, then the chief's compilation. The
    /// closing QA pass reports instead of emitting a `final`.
    pub final_steps: Vec<usize>,
}

impl StepLayout {
    pub fn from_manifest(manifest: &CrewManifest) -> Self {
        let steps_of = |kind: TaskKind| -> Vec<usize> {
            manifest
                .tasks
                .iter()
                .enumerate()
                .filter(|(_, t)| t.kind == kind)
                .map(|(i, _)| i + 1)
                .collect()
        };

        let final_steps = [
            TaskKind::Rebuild,
            TaskKind::Remediate,
            TaskKind::QaCheck,
            TaskKind::Chief,
        ]
        .into_iter()
        .flat_map(steps_of)
        .collect();

        Self {
            pick_steps: steps_of(TaskKind::Pick),
            edit_steps: steps_of(TaskKind::Edit),
            final_steps,
        }
    }
}
