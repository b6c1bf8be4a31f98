//! Table rendering for CLI output using comfy-table.
//!
//! | Command | Table Function |
//! |---------|----------------|
//! | `docqa ask` | `render_citations_table()` |
//! | `docqa history` | `render_history_table()` |
//! | `docqa eval` | `render_metrics_table()` |

use comfy_table::presets::NOTHING;
use comfy_table::{Cell, CellAlignment, ColumnConstraint, Table, Width};
use docqa_core::{ChatTurn, Citation, MetricSet};

use super::format::{format_metric, format_timestamp, truncate_str};

/// Widest content cell in history output.
const HISTORY_CONTENT_WIDTH: usize = 72;

fn plain_table(headers: Vec<Cell>) -> Table {
    let mut table = Table::new();
    table.load_preset(NOTHING);
    table.set_header(headers);
    table
}

/// Render citations in rank order.
///
/// ```text
/// #   SOURCE                CHUNK   RELEVANCE
/// 1   FuseMedicalInc.pdf        3      0.8123
/// ```
pub fn render_citations_table(citations: &[Citation]) -> String {
    if citations.is_empty() {
        return String::new();
    }

    let mut table = plain_table(vec![
        Cell::new("#"),
        Cell::new("SOURCE"),
        Cell::new("CHUNK").set_alignment(CellAlignment::Right),
        Cell::new("RELEVANCE").set_alignment(CellAlignment::Right),
    ]);
    table.set_constraints(vec![
        ColumnConstraint::LowerBoundary(Width::Fixed(3)),
        ColumnConstraint::LowerBoundary(Width::Fixed(20)),
        ColumnConstraint::LowerBoundary(Width::Fixed(6)),
        ColumnConstraint::LowerBoundary(Width::Fixed(10)),
    ]);

    for (i, citation) in citations.iter().enumerate() {
        let chunk = citation
            .chunk_id
            .map(|c| c.to_string())
            .unwrap_or_else(|| "-".to_string());
        table.add_row(vec![
            Cell::new(i + 1),
            Cell::new(truncate_str(&citation.source, 40)),
            Cell::new(chunk).set_alignment(CellAlignment::Right),
            Cell::new(format_metric(citation.relevance)).set_alignment(CellAlignment::Right),
        ]);
    }

    table.to_string()
}

/// Render a session transcript.
pub fn render_history_table(turns: &[ChatTurn]) -> String {
    if turns.is_empty() {
        return String::new();
    }

    let mut table = plain_table(vec![Cell::new("TIME"), Cell::new("ROLE"), Cell::new("CONTENT")]);
    for turn in turns {
        table.add_row(vec![
            Cell::new(format_timestamp(turn.created_at)),
            Cell::new(turn.role.to_string()),
            Cell::new(truncate_str(&turn.content, HISTORY_CONTENT_WIDTH)),
        ]);
    }

    table.to_string()
}

/// Render evaluation metrics, one per row.
pub fn render_metrics_table(metrics: &MetricSet) -> String {
    let mut table = plain_table(vec![
        Cell::new("METRIC"),
        Cell::new("VALUE").set_alignment(CellAlignment::Right),
    ]);
    for (name, value) in metrics.entries() {
        table.add_row(vec![
            Cell::new(name),
            Cell::new(format_metric(value)).set_alignment(CellAlignment::Right),
        ]);
    }
    table.to_string()
}
