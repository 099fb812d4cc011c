//! Semantic search over float documents
//!
//! This module pairs the vector layer with document metadata: documents
//! are rendered to searchable text, embedded, and stored so that position
//! *i* of the vectors is document *i*.

mod document;
mod index;
mod metadata;

pub use document::{
    IndexedDocument, PARAMETER_SYNONYMS, ScoredDocument, format_location, is_equatorial,
    ocean_basin, parameter_synonym,
};
pub use index::{DOCUMENTS_FILE, DocumentIndex, IndexStats};
pub use metadata::IndexManifest;

/// Similarity score bands used when presenting results
pub mod thresholds {
    /// Strong match for the query topic
    pub const VERY_SIMILAR: f32 = 0.75;

    /// Related to the query topic
    pub const SIMILAR: f32 = 0.60;
}
