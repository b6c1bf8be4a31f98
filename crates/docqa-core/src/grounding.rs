//! Grounding verifier: how much of an answer's vocabulary appears in the
//! retrieved evidence.

use crate::tokenize::raw_tokens;

/// Note appended to answers whose grounding ratio is under the threshold.
pub const LOW_GROUNDING_NOTE: &str =
    "\n\nNote: confidence is low because evidence overlap is limited.";

/// `|answer ∩ context| / |answer|` over unfiltered tokens, in `[0, 1]`.
///
/// Returns 0.0 when either side has no tokens.
pub fn grounding_ratio<S: AsRef<str>>(answer: &str, contexts: &[S]) -> f64 {
    let answer_tokens = raw_tokens(answer);
    if answer_tokens.is_empty() {
        return 0.0;
    }

    let joined = contexts
        .iter()
        .map(|c| c.as_ref())
        .collect::<Vec<_>>()
        .join(" ");
    let context_tokens = raw_tokens(&joined);
    if context_tokens.is_empty() {
        return 0.0;
    }

    let shared = answer_tokens.intersection(&context_tokens).count();
    shared as f64 / answer_tokens.len() as f64
}

/// Append [`LOW_GROUNDING_NOTE`] when `ratio < threshold`. Never replaces text.
pub fn annotate_low_grounding(answer: String, ratio: f64, threshold: f64) -> (String, bool) {
    if ratio < threshold {
        (format!("{}{}", answer, LOW_GROUNDING_NOTE), true)
    } else {
        (answer, false)
    }
}
