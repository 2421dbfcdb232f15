//! Table formatting utilities for structured output.

use crate::pipeline::Extraction;
use crate::search::HybridSearchOutput;
use crate::topics::Topic;
use comfy_table::{Attribute, Cell, Table, modifiers::UTF8_ROUND_CORNERS, presets::UTF8_FULL};

/// Characters of document text shown per row.
const PREVIEW_CHARS: usize = 72;

/// Builder for creating formatted tables.
pub struct TableBuilder {
    table: Table,
}

impl Default for TableBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl TableBuilder {
    /// Create a new table builder.
    pub fn new() -> Self {
        let mut table = Table::new();
        table.load_preset(UTF8_FULL);
        table.apply_modifier(UTF8_ROUND_CORNERS);
        Self { table }
    }

    /// Set the table headers.
    pub fn set_headers(mut self, headers: Vec<&str>) -> Self {
        let header_cells: Vec<Cell> = headers
            .into_iter()
            .map(|h| Cell::new(h).add_attribute(Attribute::Bold))
            .collect();
        self.table.set_header(header_cells);
        self
    }

    /// Add a row to the table.
    pub fn add_row(mut self, row: Vec<String>) -> Self {
        self.table.add_row(row);
        self
    }

    /// Build and return the formatted table.
    pub fn build(self) -> String {
        self.table.to_string()
    }
}

/// One row per topic, largest first.
pub fn topics_table(topics: &[Topic]) -> String {
    let mut sorted: Vec<&Topic> = topics.iter().collect();
    sorted.sort_by(|a, b| b.size().cmp(&a.size()).then(a.id.cmp(&b.id)));

    sorted
        .into_iter()
        .fold(
            TableBuilder::new().set_headers(vec!["ID", "Topic", "Documents"]),
            |table, topic| {
                table.add_row(vec![
                    topic.id.to_string(),
                    topic.name.clone(),
                    topic.size().to_string(),
                ])
            },
        )
        .build()
}

/// Ranked hybrid search results with document previews.
pub fn search_results_table(output: &HybridSearchOutput) -> String {
    output
        .results
        .iter()
        .enumerate()
        .fold(
            TableBuilder::new().set_headers(vec!["#", "Score", "Document", "Text"]),
            |table, (rank, result)| {
                let text = output
                    .text(result.document_id)
                    .map(preview)
                    .unwrap_or_else(|| "<missing>".to_string());
                table.add_row(vec![
                    (rank + 1).to_string(),
                    format!("{:.3}", result.score),
                    result.document_id.to_string(),
                    text,
                ])
            },
        )
        .build()
}

/// Extracted tasks and ideas.
pub fn extractions_table(extractions: &[Extraction]) -> String {
    extractions
        .iter()
        .fold(
            TableBuilder::new().set_headers(vec!["Document", "Kind", "Text"]),
            |table, extraction| {
                table.add_row(vec![
                    extraction.document_id.to_string(),
                    extraction.kind.as_str().to_string(),
                    preview(&extraction.text),
                ])
            },
        )
        .build()
}

fn preview(text: &str) -> String {
    let single_line = text.split_whitespace().collect::<Vec<_>>().join(" ");
    if single_line.chars().count() <= PREVIEW_CHARS {
        return single_line;
    }
    let mut cut: String = single_line.chars().take(PREVIEW_CHARS).collect();
    cut.push('…');
    cut
}
