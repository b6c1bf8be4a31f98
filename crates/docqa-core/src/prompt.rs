//! Prompt templates.

/// Marker that introduces the numbered evidence blocks.
pub const CONTEXT_MARKER: &str = "Context:\n";

/// Chunks of a document fed into a summary.
pub const SUMMARY_CHUNK_LIMIT: usize = 8;

/// Grounded question-answering prompt over numbered context blocks.
pub fn answer_prompt(question: &str, context_blocks: &[String]) -> String {
    format!(
        "You are a smart contract assistant. Answer strictly using the provided context. \
         If the answer is not present, say you do not have enough information.\n\n\
         Question: {}\n\n{}{}\n\n\
         Return a concise answer with inline citations like [1], [2].",
        question,
        CONTEXT_MARKER,
        context_blocks.join("\n\n")
    )
}

/// Bullet-point contract summary prompt.
pub fn summary_prompt(content: &str) -> String {
    format!(
        "Summarize the following contract content in bullet points. \
         Include key obligations, durations, payment terms, and termination clauses if present.\n\n\
         Content:\n{}",
        content
    )
}
