//! Table formatting utilities for structured output.

use comfy_table::{
    Attribute, Cell, Color, Table, modifiers::UTF8_ROUND_CORNERS, presets::UTF8_FULL,
};

use crate::profile::Extraction;
use crate::semantic::{IndexStats, ScoredDocument, format_location, thresholds};

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

    /// Add a row of prepared cells.
    pub fn add_cells(mut self, row: Vec<Cell>) -> Self {
        self.table.add_row(row);
        self
    }

    /// Build and return the formatted table.
    pub fn build(self) -> String {
        self.table.to_string()
    }
}

/// Index summary for `floatrag stats`.
pub fn create_stats_table(stats: &IndexStats) -> String {
    TableBuilder::new()
        .set_headers(vec!["Metric", "Value"])
        .add_row(vec!["Documents".to_string(), stats.total_documents.to_string()])
        .add_row(vec!["Vectors".to_string(), stats.index_size.to_string()])
        .add_row(vec!["Dimension".to_string(), stats.dimension.to_string()])
        .add_row(vec!["Model".to_string(), stats.model_name.clone()])
        .build()
}

/// Cell colour for a similarity score; comfy-table doesn't handle raw ANSI.
fn score_cell(score: f32) -> Cell {
    let cell = Cell::new(format!("{score:.3}"));
    if score >= thresholds::VERY_SIMILAR {
        cell.fg(Color::Green).add_attribute(Attribute::Bold)
    } else if score >= thresholds::SIMILAR {
        cell.fg(Color::Yellow)
    } else {
        cell
    }
}

/// Ranked documents for `floatrag search`.
pub fn create_results_table(results: &[ScoredDocument]) -> String {
    let mut builder = TableBuilder::new().set_headers(vec![
        "#",
        "Score",
        "Float",
        "Location",
        "Date",
        "Parameters",
    ]);

    for (rank, scored) in results.iter().enumerate() {
        let doc = &scored.document;
        let location = doc
            .position()
            .map(|(lat, lon)| {
                format_location(lat, lon)
                    .trim_start_matches("Location: ")
                    .to_string()
            })
            .unwrap_or_else(|| "-".to_string());
        let parameters = doc
            .parameter_names()
            .map(|names| names.join(", "))
            .unwrap_or_else(|| "-".to_string());

        builder = builder.add_cells(vec![
            Cell::new(rank + 1),
            score_cell(scored.similarity_score),
            Cell::new(doc.float_id().unwrap_or_else(|| "-".to_string())),
            Cell::new(location),
            Cell::new(doc.date().unwrap_or_else(|| "-".to_string())),
            Cell::new(parameters),
        ]);
    }

    builder.build()
}

/// Per-profile overview for `floatrag extract`.
pub fn create_extraction_table(extraction: &Extraction) -> String {
    let mut builder = TableBuilder::new().set_headers(vec![
        "Profile",
        "Date",
        "Latitude",
        "Longitude",
        "Parameters",
    ]);

    for profile in &extraction.profiles {
        let coordinate =
            |value: Option<f64>| value.map_or_else(|| "-".to_string(), |v| format!("{v:.3}"));
        builder = builder.add_row(vec![
            profile.profile_id.to_string(),
            profile
                .date
                .map_or_else(|| "-".to_string(), |d| d.format("%Y-%m-%d %H:%M").to_string()),
            coordinate(profile.latitude),
            coordinate(profile.longitude),
            profile.measurements.codes().collect::<Vec<_>>().join(", "),
        ]);
    }

    builder.build()
}
