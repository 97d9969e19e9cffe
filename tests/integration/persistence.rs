//! Result files: what a run writes and what `show` reads back.

use serde_json::Value;

use newsdesk::config::Config;
use newsdesk::persist;
use newsdesk::{Error, MergedResult};

use crate::fixtures::{edit, final_record, pick, qa_report, ScriptedCrew, TestDesk};

/// Test: saved result reloads
/// Given a completed run
/// When its file is loaded
/// Then the merged result matches, step records included
#[tokio::test]
async fn test_saved_result_reloads() {
    let desk = TestDesk::new();
    let crew = ScriptedCrew::new([
        pick(&["Liquid biopsy"]),
        "not json".to_string(),
        edit(&["sum1"], "Editorial"),
        String::new(),
        String::new(),
        String::new(),
        String::new(),
        final_record("Headline"),
        qa_report(),
    ]);

    let result = desk.pipeline(crew).run().await.unwrap();
    let loaded = persist::load_result(&desk.result_file()).unwrap();

    assert_eq!(loaded, result);
    assert_eq!(loaded.steps.len(), 9);
    assert_eq!(
        loaded.view().home.best_articles[0].title.as_deref(),
        Some("Headline")
    );
}

/// Test: key order on disk
/// Given a completed run
/// When the file is read as text
/// Then topic comes first, steps in order, final last
#[tokio::test]
async fn test_file_key_order() {
    let desk = TestDesk::new();
    let crew = ScriptedCrew::new([pick(&["A"]), pick(&["B"]), edit(&[], "")]);
    desk.pipeline(crew).run().await.unwrap();

    let text = std::fs::read_to_string(desk.result_file()).unwrap();
    let topic = text.find("\"topic\"").unwrap();
    let step_1 = text.find("\"step_1\"").unwrap();
    let step_3 = text.find("\"step_3\"").unwrap();
    let fin = text.find("\"final\"").unwrap();
    assert!(topic < step_1 && step_1 < step_3 && step_3 < fin);
}

/// Test: topic-derived path
/// Given a config with a punctuated topic
/// When the result path is derived
/// Then the slug is lowercase with underscores
#[test]
fn test_result_path_from_config() {
    let config = Config {
        topic: "Diabetes & Metabolism".to_string(),
        output_dir: "./out".to_string(),
        ..Config::default()
    };
    let path = persist::result_path(&config.output_dir(), &config.topic);
    assert!(path.ends_with("diabetes_metabolism_result.json"));
}

/// Test: loading a non-result file
/// Given a JSON file without a topic
/// When it is loaded
/// Then a validation error is returned
#[test]
fn test_load_rejects_non_result() {
    let desk = TestDesk::new();
    let path = desk.temp_dir.path().join("other.json");
    std::fs::write(&path, r#"{"hello": "world"}"#).unwrap();

    assert!(matches!(
        persist::load_result(&path),
        Err(Error::Validation(_))
    ));
}

/// Test: loading a result written elsewhere
/// Given a hand-written result with only a final view
/// When it is loaded
/// Then the view is readable and there are no steps
#[test]
fn test_load_minimal_result() {
    let desk = TestDesk::new();
    let path = desk.temp_dir.path().join("minimal.json");
    std::fs::write(
        &path,
        r#"{"topic": "Neuroscience", "final": {"subtopics": ["Sleep"], "home": {"best_articles": []}}}"#,
    )
    .unwrap();

    let loaded: MergedResult = persist::load_result(&path).unwrap();
    assert_eq!(loaded.topic, "Neuroscience");
    assert!(loaded.steps.is_empty());
    assert_eq!(loaded.view().subtopics, vec!["Sleep".to_string()]);
    assert!(loaded.to_value().get("final").is_some_and(Value::is_object));
}
