//! Full pipeline runs against scripted engines.

use std::sync::atomic::Ordering;
use std::sync::Arc;

use serde_json::{json, Value};

use newsdesk::Error;

use crate::fixtures::{edit, final_record, pick, qa_report, FailingCrew, ScriptedCrew, TestDesk};

/// Test: rebuilt final wins
/// Given a crew whose every late stage emits a final
/// When the pipeline runs
/// Then the rebuild step's final is used verbatim
#[tokio::test]
async fn test_rebuilt_final_is_used() {
    let desk = TestDesk::new();
    let crew = ScriptedCrew::new([
        pick(&["Liquid biopsy"]),
        pick(&["CAR-T"]),
        edit(&["s1"], "e1"),
        edit(&["s2"], "e2"),
        final_record("From chief"),
        final_record("From QA"),
        final_record("From remediation"),
        final_record("From rebuild"),
        qa_report(),
    ]);

    let result = desk.pipeline(crew.clone()).run().await.unwrap();

    assert_eq!(crew.calls.load(Ordering::SeqCst), 1);
    assert_eq!(
        crew.last_topic.lock().unwrap().as_deref(),
        Some("Cancer Health Care")
    );
    assert_eq!(result.steps.len(), 9);
    let view = result.view();
    assert_eq!(
        view.home.best_articles[0].title.as_deref(),
        Some("From rebuild")
    );
    assert_eq!(
        view.home.main_editorial.unwrap().title.as_deref(),
        Some("Why biomarkers matter")
    );
}

/// Test: late stages fall back in order
/// Given a rebuild that failed and a remediation with an empty final
/// When the pipeline runs
/// Then the QA check's final is used
#[tokio::test]
async fn test_qa_final_when_later_stages_fail() {
    let desk = TestDesk::new();
    let crew = ScriptedCrew::new([
        pick(&["A"]),
        pick(&["B"]),
        edit(&[], ""),
        edit(&[], ""),
        final_record("From chief"),
        final_record("From QA"),
        json!({ "final": {} }).to_string(),
        "Rebuild: ran out of time".to_string(),
        qa_report(),
    ]);

    let result = desk.pipeline(crew).run().await.unwrap();
    assert_eq!(
        result.view().home.best_articles[0].title.as_deref(),
        Some("From QA")
    );
}

/// Test: chief editor is the last choice
/// Given only the chief step carrying a real final
/// When the pipeline runs
/// Then the chief's final is used
#[tokio::test]
async fn test_chief_final_when_no_later_final() {
    let desk = TestDesk::new();
    let crew = ScriptedCrew::new([
        pick(&["A"]),
        pick(&["B"]),
        edit(&[], ""),
        edit(&[], ""),
        final_record("From chief"),
        json!({ "final": null }).to_string(),
        String::new(),
        json!({ "final": [] }).to_string(),
        qa_report(),
    ]);

    let result = desk.pipeline(crew).run().await.unwrap();
    assert_eq!(
        result.view().home.best_articles[0].title.as_deref(),
        Some("From chief")
    );
}

/// Test: fallback reconstruction
/// Given late-stage steps that are not JSON
/// When the pipeline runs
/// Then final is rebuilt from the pick and edit records
#[tokio::test]
async fn test_fallback_pairs_picks_with_summaries() {
    let desk = TestDesk::new();
    let crew = ScriptedCrew::new([
        pick(&["Liquid biopsy", "Tumor DNA"]),
        pick(&["CAR-T"]),
        edit(&["sum1", "sum2"], "Screening saves lives"),
        "The editor wandered off.".to_string(),
        "Chief: I could not finish".to_string(),
        String::new(),
        String::new(),
        String::new(),
        String::new(),
    ]);

    let result = desk.pipeline(crew).run().await.unwrap();
    let value = result.to_value();
    let fin = &value["final"];

    assert_eq!(fin["topic"], "Cancer Health Care");
    assert_eq!(
        fin["subtopics"],
        json!(["Precision Oncology", "Cancer Treatment Methods"])
    );

    let oncology = &fin["per_subtopic"]["Precision Oncology"];
    assert_eq!(oncology["articles"][0]["summary"], "sum1");
    assert_eq!(oncology["articles"][1]["summary"], "sum2");
    assert_eq!(oncology["best_article"], oncology["articles"][0]);
    assert_eq!(oncology["editorial"], "Screening saves lives");

    let treatment = &fin["per_subtopic"]["Cancer Treatment Methods"];
    assert_eq!(treatment["articles"][0]["summary"], Value::Null);
    assert_eq!(treatment["editorial"], Value::Null);

    let home = &fin["home"]["best_articles"];
    assert_eq!(home.as_array().unwrap().len(), 2);
    assert_eq!(home[1]["subtopic"], "Cancer Treatment Methods");
    assert_eq!(fin["home"]["main_editorial"], Value::Null);

    assert_eq!(value["step_4"]["error"], "non_json_output");
    assert_eq!(value["step_4"]["raw"], "The editor wandered off.");
    assert_eq!(value["step_9"], json!({ "empty": true }));
}

/// Test: short output
/// Given an engine that returns fewer outputs than tasks
/// When the pipeline runs
/// Then missing steps read as empty and final is still present
#[tokio::test]
async fn test_fewer_outputs_than_tasks() {
    let desk = TestDesk::new();
    let crew = ScriptedCrew::new([pick(&["Only one"])]);

    let result = desk.pipeline(crew).run().await.unwrap();
    let value = result.to_value();

    assert!(value.get("final").is_some());
    assert!(value.get("step_2").is_none());
    let oncology = &value["final"]["per_subtopic"]["Precision Oncology"];
    assert_eq!(oncology["articles"][0]["title"], "Only one");
    assert_eq!(
        value["final"]["per_subtopic"]["Cancer Treatment Methods"]["articles"],
        json!([])
    );
}

/// Test: file is written
/// Given a writable output directory
/// When the pipeline runs
/// Then the topic-derived file holds the merged result
#[tokio::test]
async fn test_result_file_written() {
    let desk = TestDesk::new();
    let crew = ScriptedCrew::new([pick(&["A"]), pick(&["B"])]);

    let result = desk.pipeline(crew).run().await.unwrap();
    assert!(result.file_write_error.is_none());

    let text = std::fs::read_to_string(desk.result_file()).unwrap();
    let on_disk: Value = serde_json::from_str(&text).unwrap();
    assert_eq!(on_disk, result.to_value());
    assert!(on_disk.get("file_write_error").is_none());
}

/// Test: write failure is recorded, not raised
/// Given an output directory that is actually a regular file
/// When the pipeline runs
/// Then the run succeeds and the result carries file_write_error
#[tokio::test]
async fn test_write_failure_recorded() {
    let mut desk = TestDesk::new();
    let blocker = desk.temp_dir.path().join("blocker");
    std::fs::write(&blocker, "not a directory").unwrap();
    desk.config.output_dir = blocker.join("output").to_string_lossy().into_owned();

    let crew = ScriptedCrew::new([pick(&["A"])]);
    let result = desk.pipeline(crew).run().await.unwrap();

    assert!(result.file_write_error.is_some());
    assert!(result.to_value().get("final").is_some());
    assert!(result.to_value().get("file_write_error").is_some());
}

/// Test: engine failure propagates
/// Given an engine that errors
/// When the pipeline runs
/// Then the error surfaces and no file is written
#[tokio::test]
async fn test_engine_failure_propagates() {
    let desk = TestDesk::new();
    let err = desk
        .pipeline(Arc::new(FailingCrew))
        .run()
        .await
        .unwrap_err();

    assert!(matches!(err, Error::Engine(ref m) if m.contains("rate limit")));
    assert!(err.trace().starts_with("Engine error: rate limit exceeded"));
    assert!(!desk.result_file().exists());
}

/// Test: generous timeout
/// Given a timeout far longer than the run
/// When the pipeline runs
/// Then it completes and writes its file
#[tokio::test]
async fn test_run_within_timeout() {
    let mut desk = TestDesk::new();
    desk.config.engine.timeout_secs = Some(30);
    let crew = ScriptedCrew::new([pick(&["A"]), pick(&["B"])]);

    let result = desk.pipeline(crew).run().await.unwrap();
    assert_eq!(result.view().subtopics.len(), 2);
    assert!(desk.result_file().exists());
}

/// Test: colliding subtopics
/// Given two subtopics that abbreviate alike
/// When the pipeline runs
/// Then it is rejected before the engine is called
#[tokio::test]
async fn test_colliding_subtopics_rejected() {
    let mut desk = TestDesk::new();
    desk.config.subtopics = vec![
        "Precision Oncology".to_string(),
        "Pediatric Oncology".to_string(),
    ];
    let crew = ScriptedCrew::new([pick(&["A"])]);

    let err = desk.pipeline(crew.clone()).run().await.unwrap_err();
    assert!(matches!(err, Error::Validation(_)));
    assert_eq!(crew.calls.load(Ordering::SeqCst), 0);
}

/// Test: manifest drives the request
/// Given the default crew for two subtopics
/// When a request is built
/// Then it carries nine tasks and the topic input
#[test]
fn test_request_carries_manifest() {
    let desk = TestDesk::new();
    let pipeline = desk.pipeline(Arc::new(FailingCrew));
    let request = pipeline.request();

    assert_eq!(request.inputs.topic, "Cancer Health Care");
    let names: Vec<&str> = request.manifest.tasks.iter().map(|t| t.name.as_str()).collect();
    assert_eq!(
        names,
        [
            "pick_news_po",
            "pick_news_ctm",
            "edit_po",
            "edit_ctm",
            "chief_editor",
            "qa_task",
            "qa_remediate",
            "rebuild_final",
            "qa_task_final"
        ]
    );
    assert_eq!(pipeline.manifest().layout().final_steps, vec![8, 7, 6, 5]);
}
