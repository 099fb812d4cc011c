//! Renders retrieved documents into the text handed to the generator.

use crate::semantic::{ScoredDocument, format_location};

/// Context used when retrieval found nothing.
pub const NO_DATA_CONTEXT: &str = "No relevant data found in the database.";

const CONTEXT_HEADER: &str = "RELEVANT ARGO DATA:";

/// Parameters summarised surface to deep, in this order.
const SUMMARY_PARAMETERS: [&str; 3] = ["TEMP", "PSAL", "DOXY"];

/// Formats documents as a numbered block, one field per line.
///
/// ```text
/// RELEVANT ARGO DATA:
///
/// 1. Float Data:
///    Float ID: 2902746
///    Location: 12.35°N, 67.89°E
///    TEMP: 28.10 (surface) to 4.20 (deep)
///    Relevance: 0.87
/// ```
pub fn format_context(documents: &[ScoredDocument]) -> String {
    if documents.is_empty() {
        return NO_DATA_CONTEXT.to_string();
    }

    let mut lines = vec![CONTEXT_HEADER.to_string()];

    for (i, scored) in documents.iter().enumerate() {
        let doc = &scored.document;
        lines.push(format!("\n{}. Float Data:", i + 1));

        if let Some(id) = doc.float_id() {
            lines.push(format!("   Float ID: {id}"));
        }
        if let Some((lat, lon)) = doc.position() {
            lines.push(format!("   {}", format_location(lat, lon)));
        }
        if let Some(date) = doc.date() {
            lines.push(format!("   Date: {date}"));
        }
        if let Some(params) = doc.parameter_names() {
            lines.push(format!("   Available parameters: {}", params.join(", ")));

            for param in SUMMARY_PARAMETERS {
                let values = doc.parameter_values(param);
                if let (Some(surface), Some(deep)) = (values.first(), values.last()) {
                    lines.push(format!(
                        "   {param}: {surface:.2} (surface) to {deep:.2} (deep)"
                    ));
                }
            }
        }

        lines.push(format!("   Relevance: {:.2}", scored.similarity_score));
    }

    lines.join("\n")
}
