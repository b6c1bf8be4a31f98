//! Evaluation scorer against fake answerers.

use std::cell::RefCell;
use std::fs;

use docqa_core::{
    evaluate_file, load_cases, score, ChatResponse, Citation, DocQaError, MetricSet,
    QuestionAnswerer,
};
use serde_json::json;
use tempfile::TempDir;

const HEX: &str = "3707e488749344c49ff61e6449a067db";

/// Answers every question the same way and records session ids.
struct ScriptedAnswerer {
    answer: String,
    cited_source: String,
    contexts: Vec<String>,
    fail_on: Option<String>,
    sessions: RefCell<Vec<String>>,
}

impl ScriptedAnswerer {
    fn new(answer: &str, cited_source: &str) -> Self {
        Self {
            answer: answer.to_string(),
            cited_source: cited_source.to_string(),
            contexts: Vec::new(),
            fail_on: None,
            sessions: RefCell::new(Vec::new()),
        }
    }
}

impl QuestionAnswerer for ScriptedAnswerer {
    fn ask(&self, question: &str, session_id: &str) -> Result<ChatResponse, DocQaError> {
        self.sessions.borrow_mut().push(session_id.to_string());
        if self.fail_on.as_deref() == Some(question) {
            return Err(DocQaError::InvalidArgument("scripted failure".to_string()));
        }
        Ok(ChatResponse::new(session_id, self.answer.clone())
            .with_citations(vec![Citation {
                source: self.cited_source.clone(),
                chunk_id: Some(1),
                relevance: 0.9,
            }])
            .with_contexts(self.contexts.clone()))
    }
}

#[test]
fn parties_case_scores_full_source_and_term_marks() {
    let cases = vec![json!({
        "question": "Who are the parties?",
        "expected_answer": "The parties are a supplier and a distributor.",
        "required_terms": ["supplier", "distributor"],
        "expected_sources": ["FuseMedicalInc.pdf"]
    })];
    let answerer = ScriptedAnswerer::new(
        "The supplier and distributor are the two parties.",
        &format!("{HEX}_FuseMedicalInc.pdf"),
    );

    let metrics = score(&answerer, &cases);
    assert_eq!(metrics.retrieval_hit_rate, 1.0);
    assert_eq!(metrics.source_recall, 1.0);
    assert_eq!(metrics.source_precision, 1.0);
    assert_eq!(metrics.required_term_coverage, 1.0);
    assert!(metrics.answer_f1 > 0.0);
    assert_eq!(metrics.valid_case_rate, 1.0);
    assert_eq!(metrics.success_rate, 1.0);
}

#[test]
fn invalid_and_failing_cases_are_counted_separately() {
    let cases = vec![
        json!({"question": ""}),
        json!({"expected_answer": "no question here"}),
        json!({"question": "explode"}),
        json!({"question": "What is the term?", "expected_answer": "twelve months"}),
    ];
    let mut answerer = ScriptedAnswerer::new("The term is twelve months.", "a.pdf");
    answerer.fail_on = Some("explode".to_string());

    let metrics = score(&answerer, &cases);
    assert_eq!(metrics.valid_case_rate, 0.5);
    assert_eq!(metrics.success_rate, 0.5);
    // The failed case contributes to no content metric.
    assert_eq!(metrics.answer_overlap, 1.0);
}

#[test]
fn each_case_gets_its_own_session() {
    let cases = vec![
        json!({"question": "first"}),
        json!(42),
        json!({"question": "third"}),
    ];
    let answerer = ScriptedAnswerer::new("x", "a.pdf");
    score(&answerer, &cases);
    assert_eq!(
        *answerer.sessions.borrow(),
        vec!["evaluation-0".to_string(), "evaluation-2".to_string()]
    );
}

#[test]
fn groundedness_uses_returned_contexts() {
    let cases = vec![json!({"question": "q"})];
    let mut answerer = ScriptedAnswerer::new("rent is monthly", "a.pdf");
    answerer.contexts = vec!["The rent".to_string(), "is paid monthly".to_string()];
    assert_eq!(score(&answerer, &cases).groundedness, 1.0);

    answerer.contexts.clear();
    assert_eq!(score(&answerer, &cases).groundedness, 0.0);
}

#[test]
fn forbidden_terms_and_wrong_sources() {
    let cases = vec![
        json!({
            "question": "Is delivery guaranteed?",
            "forbidden_terms": ["guaranteed"],
            "expected_sources": ["other.pdf"]
        }),
        json!({
            "question": "Is delivery guaranteed?",
            "forbidden_terms": ["refund"]
        }),
    ];
    let answerer = ScriptedAnswerer::new("Delivery is Guaranteed.", "a.pdf");
    let metrics = score(&answerer, &cases);
    assert_eq!(metrics.forbidden_term_violation_rate, 0.5);
    assert_eq!(metrics.retrieval_hit_rate, 0.0);
    assert_eq!(metrics.source_precision, 0.0);
}

#[test]
fn empty_case_list_is_all_zero() {
    let answerer = ScriptedAnswerer::new("x", "a.pdf");
    let metrics = score(&answerer, &[]);
    assert_eq!(metrics, MetricSet::default());
    assert_eq!(metrics.valid_case_rate, 0.0);
    assert_eq!(metrics.success_rate, 0.0);
}

#[test]
fn load_cases_reports_missing_and_malformed_files() {
    let tmp = TempDir::new().unwrap();

    let missing = tmp.path().join("missing.json");
    assert!(matches!(
        load_cases(&missing),
        Err(DocQaError::EvaluationCasesNotFound(_))
    ));

    let broken = tmp.path().join("broken.json");
    fs::write(&broken, "[{").unwrap();
    assert!(matches!(
        load_cases(&broken),
        Err(DocQaError::InvalidEvaluationInput(_))
    ));

    let object = tmp.path().join("object.json");
    fs::write(&object, r#"{"question": "q"}"#).unwrap();
    assert!(matches!(
        load_cases(&object),
        Err(DocQaError::InvalidEvaluationInput(_))
    ));
}

#[test]
fn evaluate_file_reports_case_count() {
    let tmp = TempDir::new().unwrap();
    let path = tmp.path().join("cases.json");
    fs::write(
        &path,
        r#"[{"question": "What is the term?"}, {"question": "  "}, "junk"]"#,
    )
    .unwrap();

    let answerer = ScriptedAnswerer::new("twelve months", "a.pdf");
    let report = evaluate_file(&answerer, &path).unwrap();
    assert_eq!(report.cases_count, 3);
    assert_eq!(report.metrics.valid_case_rate, 0.3333);
    assert_eq!(report.metrics.success_rate, 1.0);

    let json = serde_json::to_value(&report).unwrap();
    assert_eq!(json["casesCount"], 3);
    assert!(json["metrics"].get("forbidden_term_violation_rate").is_some());
}
