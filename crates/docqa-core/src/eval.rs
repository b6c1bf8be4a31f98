//! Evaluation scorer.
//!
//! Runs a labeled case set through a [`QuestionAnswerer`] and aggregates
//! answer, retrieval and safety metrics. Cases are plain JSON values so that
//! malformed entries can be skipped one by one instead of rejecting the
//! whole file.

use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, info, warn};

use crate::citation::round4;
use crate::errors::DocQaError;
use crate::grounding::grounding_ratio;
use crate::pipeline::{AnswerPipeline, ChatResponse};
use crate::source::source_key;
use crate::tokenize::content_tokens;

/// Default location of the case file.
pub const DEFAULT_CASES_PATH: &str = "data/eval_cases.json";

// ============================================================================
// QuestionAnswerer
// ============================================================================

/// What the scorer drives. Errors mark a case as unsuccessful.
pub trait QuestionAnswerer {
    fn ask(&self, question: &str, session_id: &str) -> Result<ChatResponse, DocQaError>;
}

impl QuestionAnswerer for AnswerPipeline {
    fn ask(&self, question: &str, session_id: &str) -> Result<ChatResponse, DocQaError> {
        self.try_answer(question, session_id)
    }
}

impl<F> QuestionAnswerer for F
where
    F: Fn(&str, &str) -> Result<ChatResponse, DocQaError>,
{
    fn ask(&self, question: &str, session_id: &str) -> Result<ChatResponse, DocQaError> {
        self(question, session_id)
    }
}

// ============================================================================
// EvaluationCase
// ============================================================================

/// A structurally valid case.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct EvaluationCase {
    pub question: String,
    pub expected_answer: Option<String>,
    pub expected_sources: Option<Vec<String>>,
    pub required_terms: Option<Vec<String>>,
    pub forbidden_terms: Option<Vec<String>>,
}

impl EvaluationCase {
    /// Parse one case. `None` when the value is not an object or has no
    /// non-blank `question` string.
    pub fn from_value(value: &Value) -> Option<Self> {
        let obj = value.as_object()?;
        let question = obj.get("question")?.as_str()?.trim();
        if question.is_empty() {
            return None;
        }

        Some(Self {
            question: question.to_string(),
            expected_answer: obj
                .get("expected_answer")
                .and_then(Value::as_str)
                .map(str::to_string),
            expected_sources: obj.get("expected_sources").and_then(string_list),
            required_terms: obj.get("required_terms").and_then(string_list),
            forbidden_terms: obj.get("forbidden_terms").and_then(string_list),
        })
    }
}

/// Strings and numbers of a JSON array as text. Non-arrays yield `None`.
fn string_list(value: &Value) -> Option<Vec<String>> {
    let items = value.as_array()?;
    Some(
        items
            .iter()
            .filter_map(|item| match item {
                Value::String(s) => Some(s.clone()),
                Value::Number(n) => Some(n.to_string()),
                _ => None,
            })
            .collect(),
    )
}

/// Trimmed, lower-cased, non-empty terms.
fn normalized_terms(terms: &[String]) -> Vec<String> {
    terms
        .iter()
        .map(|t| t.trim().to_lowercase())
        .filter(|t| !t.is_empty())
        .collect()
}

// ============================================================================
// MetricSet
// ============================================================================

/// Aggregated metrics, each rounded to 4 decimal places.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MetricSet {
    pub answer_overlap: f64,
    pub answer_f1: f64,
    pub retrieval_hit_rate: f64,
    pub source_recall: f64,
    pub source_precision: f64,
    pub groundedness: f64,
    pub required_term_coverage: f64,
    pub forbidden_term_violation_rate: f64,
    pub valid_case_rate: f64,
    pub success_rate: f64,
}

impl MetricSet {
    /// `(name, value)` pairs in report order.
    pub fn entries(&self) -> [(&'static str, f64); 10] {
        [
            ("answer_overlap", self.answer_overlap),
            ("answer_f1", self.answer_f1),
            ("retrieval_hit_rate", self.retrieval_hit_rate),
            ("source_recall", self.source_recall),
            ("source_precision", self.source_precision),
            ("groundedness", self.groundedness),
            ("required_term_coverage", self.required_term_coverage),
            ("forbidden_term_violation_rate", self.forbidden_term_violation_rate),
            ("valid_case_rate", self.valid_case_rate),
            ("success_rate", self.success_rate),
        ]
    }
}

// ============================================================================
// Per-case metrics
// ============================================================================

fn answer_overlap(expected: &str, predicted: &str) -> Option<f64> {
    let expected = content_tokens(expected);
    if expected.is_empty() {
        return None;
    }
    let predicted = content_tokens(predicted);
    Some(expected.intersection(&predicted).count() as f64 / expected.len() as f64)
}

fn answer_f1(expected: &str, predicted: &str) -> Option<f64> {
    let expected = content_tokens(expected);
    if expected.is_empty() {
        return None;
    }
    let predicted = content_tokens(predicted);
    let shared = expected.intersection(&predicted).count();
    if predicted.is_empty() || shared == 0 {
        return Some(0.0);
    }
    let precision = shared as f64 / predicted.len() as f64;
    let recall = shared as f64 / expected.len() as f64;
    Some(2.0 * precision * recall / (precision + recall))
}

/// Hit, recall and precision of cited sources against expected ones.
fn source_scores(expected: &[String], cited: &HashSet<String>) -> Option<(f64, f64, f64)> {
    let expected: HashSet<String> = expected
        .iter()
        .filter(|s| !s.trim().is_empty())
        .map(|s| source_key(s))
        .collect();
    if expected.is_empty() {
        return None;
    }
    if cited.is_empty() {
        return Some((0.0, 0.0, 0.0));
    }

    let shared = expected.intersection(cited).count();
    let hit = if shared > 0 { 1.0 } else { 0.0 };
    Some((
        hit,
        shared as f64 / expected.len() as f64,
        shared as f64 / cited.len() as f64,
    ))
}

fn required_term_coverage(terms: &[String], answer: &str) -> Option<f64> {
    let terms = normalized_terms(terms);
    if terms.is_empty() {
        return None;
    }
    let answer = answer.to_lowercase();
    let found = terms.iter().filter(|t| answer.contains(t.as_str())).count();
    Some(found as f64 / terms.len() as f64)
}

fn forbidden_term_violation(terms: &[String], answer: &str) -> Option<f64> {
    let terms = normalized_terms(terms);
    if terms.is_empty() {
        return None;
    }
    let answer = answer.to_lowercase();
    Some(if terms.iter().any(|t| answer.contains(t.as_str())) {
        1.0
    } else {
        0.0
    })
}

// ============================================================================
// Scoring
// ============================================================================

#[derive(Default)]
struct Accumulator {
    overlap: Vec<f64>,
    f1: Vec<f64>,
    hits: Vec<f64>,
    recall: Vec<f64>,
    precision: Vec<f64>,
    groundedness: Vec<f64>,
    required: Vec<f64>,
    forbidden: Vec<f64>,
}

fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        0.0
    } else {
        values.iter().sum::<f64>() / values.len() as f64
    }
}

fn ratio(numerator: usize, denominator: usize) -> f64 {
    if denominator == 0 {
        0.0
    } else {
        numerator as f64 / denominator as f64
    }
}

impl Accumulator {
    fn record(&mut self, case: &EvaluationCase, response: &ChatResponse) {
        let answer = response.answer.as_str();

        if let Some(expected) = &case.expected_answer {
            self.overlap.extend(answer_overlap(expected, answer));
            self.f1.extend(answer_f1(expected, answer));
        }

        if let Some(expected) = &case.expected_sources {
            let cited: HashSet<String> =
                response.citations.iter().map(|c| source_key(&c.source)).collect();
            if let Some((hit, recall, precision)) = source_scores(expected, &cited) {
                self.hits.push(hit);
                self.recall.push(recall);
                self.precision.push(precision);
            }
        }

        if let Some(terms) = &case.required_terms {
            self.required.extend(required_term_coverage(terms, answer));
        }
        if let Some(terms) = &case.forbidden_terms {
            self.forbidden.extend(forbidden_term_violation(terms, answer));
        }

        self.groundedness
            .push(grounding_ratio(answer, &response.retrieved_contexts));
    }
}

/// Score `cases` against `answerer`.
///
/// Each valid case runs in its own session (`evaluation-<index>`). A failing
/// case is counted as valid but unsuccessful and contributes to no content
/// metric.
pub fn score<A: QuestionAnswerer + ?Sized>(answerer: &A, cases: &[Value]) -> MetricSet {
    if cases.is_empty() {
        return MetricSet::default();
    }

    let mut acc = Accumulator::default();
    let mut valid = 0usize;
    let mut successful = 0usize;

    for (idx, value) in cases.iter().enumerate() {
        let Some(case) = EvaluationCase::from_value(value) else {
            debug!("skipping malformed evaluation case {}", idx);
            continue;
        };
        valid += 1;

        let session_id = format!("evaluation-{}", idx);
        let response = match answerer.ask(&case.question, &session_id) {
            Ok(response) => response,
            Err(err) => {
                warn!("evaluation case {} failed: {}", idx, err);
                continue;
            }
        };
        successful += 1;
        acc.record(&case, &response);
    }

    info!(
        "evaluated {} cases: {} valid, {} successful",
        cases.len(),
        valid,
        successful
    );

    MetricSet {
        answer_overlap: round4(mean(&acc.overlap)),
        answer_f1: round4(mean(&acc.f1)),
        retrieval_hit_rate: round4(mean(&acc.hits)),
        source_recall: round4(mean(&acc.recall)),
        source_precision: round4(mean(&acc.precision)),
        groundedness: round4(mean(&acc.groundedness)),
        required_term_coverage: round4(mean(&acc.required)),
        forbidden_term_violation_rate: round4(mean(&acc.forbidden)),
        valid_case_rate: round4(ratio(valid, cases.len())),
        success_rate: round4(ratio(successful, valid)),
    }
}

// ============================================================================
// Case file I/O
// ============================================================================

/// Read a JSON array of cases.
pub fn load_cases(path: &Path) -> Result<Vec<Value>, DocQaError> {
    if !path.exists() {
        return Err(DocQaError::EvaluationCasesNotFound(path.to_path_buf()));
    }
    let content = fs::read_to_string(path)?;
    let value: Value = serde_json::from_str(&content).map_err(|e| {
        DocQaError::InvalidEvaluationInput(format!("{}: {}", path.display(), e))
    })?;
    match value {
        Value::Array(cases) => Ok(cases),
        other => Err(DocQaError::InvalidEvaluationInput(format!(
            "{}: expected a JSON array of cases, found {}",
            path.display(),
            json_kind(&other)
        ))),
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

/// Result of evaluating a case file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EvaluationReport {
    pub cases_path: PathBuf,
    pub metrics: MetricSet,
    pub cases_count: usize,
}

/// Load `path` and score it.
pub fn evaluate_file<A: QuestionAnswerer + ?Sized>(
    answerer: &A,
    path: &Path,
) -> Result<EvaluationReport, DocQaError> {
    let cases = load_cases(path)?;
    Ok(EvaluationReport {
        cases_path: path.to_path_buf(),
        metrics: score(answerer, &cases),
        cases_count: cases.len(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_case_requires_string_question() {
        assert!(EvaluationCase::from_value(&json!({"question": "  "})).is_none());
        assert!(EvaluationCase::from_value(&json!({"question": 5})).is_none());
        assert!(EvaluationCase::from_value(&json!({})).is_none());
        assert!(EvaluationCase::from_value(&json!("question")).is_none());
        let case = EvaluationCase::from_value(&json!({"question": " Term? "})).unwrap();
        assert_eq!(case.question, "Term?");
        assert_eq!(case.expected_sources, None);
    }

    #[test]
    fn test_non_list_terms_are_ignored() {
        let case = EvaluationCase::from_value(&json!({
            "question": "q",
            "required_terms": "supplier",
            "forbidden_terms": ["x", 3, null]
        }))
        .unwrap();
        assert_eq!(case.required_terms, None);
        assert_eq!(case.forbidden_terms, Some(vec!["x".to_string(), "3".to_string()]));
    }

    #[test]
    fn test_f1_zero_when_prediction_empty() {
        assert_eq!(answer_f1("supplier distributor", ""), Some(0.0));
        assert_eq!(answer_f1("the a of", "anything"), None);
    }

    #[test]
    fn test_overlap_ignores_stopwords() {
        assert_eq!(answer_overlap("the supplier", "supplier"), Some(1.0));
    }

    #[test]
    fn test_source_scores_empty_citations_count_as_zero() {
        let expected = vec!["a.pdf".to_string()];
        assert_eq!(source_scores(&expected, &HashSet::new()), Some((0.0, 0.0, 0.0)));
        assert_eq!(source_scores(&[" ".to_string()], &HashSet::new()), None);
    }

    #[test]
    fn test_source_scores_partial() {
        let expected = vec!["A.pdf".to_string(), "docs/b.pdf".to_string()];
        let cited: HashSet<String> = ["a.pdf", "c.pdf"].iter().map(|s| s.to_string()).collect();
        assert_eq!(source_scores(&expected, &cited), Some((1.0, 0.5, 0.5)));
    }

    #[test]
    fn test_term_checks_are_case_insensitive_substrings() {
        let terms = vec!["Supplier".to_string(), "net 30".to_string()];
        assert_eq!(required_term_coverage(&terms, "The SUPPLIER pays"), Some(0.5));
        assert_eq!(
            forbidden_term_violation(&["guarantee".to_string()], "No guarantees"),
            Some(1.0)
        );
        assert_eq!(forbidden_term_violation(&["".to_string()], "x"), None);
    }

    #[test]
    fn test_empty_case_list_is_all_zero() {
        let answerer = |_: &str, _: &str| -> Result<ChatResponse, DocQaError> {
            Ok(ChatResponse::new("s", "x"))
        };
        assert_eq!(score(&answerer, &[]), MetricSet::default());
    }

    #[test]
    fn test_metric_entries_order() {
        let names: Vec<&str> = MetricSet::default().entries().iter().map(|(n, _)| *n).collect();
        assert_eq!(names.first(), Some(&"answer_overlap"));
        assert_eq!(names.last(), Some(&"success_rate"));
        assert_eq!(names.len(), 10);
    }
}
