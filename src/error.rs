//! Error types for extraction, indexing and query answering
//!
//! This module provides structured error types using thiserror. Only
//! `ExtractError::Parse` and `IndexError::Persist` are meant to reach a
//! caller; the rest are degraded at an explicit call site.

use crate::vector::VectorError;
use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

/// Errors raised while turning a float file into records
#[derive(Error, Debug)]
pub enum ExtractError {
    /// The container itself could not be opened or decoded
    #[error("Failed to parse array container '{path}': {reason}")]
    Parse { path: PathBuf, reason: String },

    /// The input stream could not be staged for reading
    #[error("Failed to stage input for reading: {source}")]
    Staging {
        #[source]
        source: std::io::Error,
    },

    /// A sub-stage (metadata, profiles, trajectory) failed and was replaced
    /// by an empty value
    #[error("Extraction stage '{stage}' failed: {reason}")]
    Stage { stage: &'static str, reason: String },

    /// A variable could not be read or has the wrong kind of data
    #[error("Failed to read variable '{name}': {reason}")]
    Read { name: String, reason: String },

    /// A variable is too short for the dimensions it is indexed with
    #[error("Variable '{name}' has {actual} elements, expected at least {expected}")]
    Shape {
        name: String,
        actual: usize,
        expected: usize,
    },
}

impl ExtractError {
    /// Stable identifier for JSON responses.
    pub fn status_code(&self) -> String {
        match self {
            Self::Parse { .. } => "PARSE_FAILURE",
            Self::Staging { .. } => "STAGING_FAILURE",
            Self::Stage { .. } => "DEGRADED_EXTRACTION",
            Self::Read { .. } => "READ_FAILURE",
            Self::Shape { .. } => "SHAPE_MISMATCH",
        }
        .to_string()
    }
}

/// Errors from the document index
#[derive(Error, Debug)]
pub enum IndexError {
    /// Persisted state could not be loaded
    #[error("Failed to load index from '{path}': {reason}")]
    Load { path: PathBuf, reason: String },

    /// Persisted state could not be written after an add
    #[error("Failed to persist index to '{path}': {source}")]
    Persist {
        path: PathBuf,
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    #[error("Failed to generate embeddings: {0}")]
    Embedding(String),

    #[error("Embedding dimension mismatch: expected {expected}, got {actual}")]
    DimensionMismatch { expected: usize, actual: usize },

    #[error("Embedder returned {actual} vectors for {expected} documents")]
    BatchMismatch { expected: usize, actual: usize },

    #[error(transparent)]
    Vector(#[from] VectorError),
}

impl IndexError {
    /// Stable identifier for JSON responses.
    pub fn status_code(&self) -> String {
        match self {
            Self::Load { .. } => "INDEX_LOAD_FAILURE",
            Self::Persist { .. } => "INDEX_WRITE_FAILURE",
            Self::Embedding(_) => "EMBEDDING_FAILURE",
            Self::DimensionMismatch { .. } => "DIMENSION_MISMATCH",
            Self::BatchMismatch { .. } => "BATCH_MISMATCH",
            Self::Vector(_) => "VECTOR_ERROR",
        }
        .to_string()
    }

    /// Get recovery suggestions for this error
    pub fn recovery_suggestions(&self) -> Vec<&'static str> {
        match self {
            Self::Load { .. } => vec![
                "The index was started empty; re-run 'floatrag extract --index' on your files",
                "Delete the index directory if the files were written by another version",
            ],
            Self::Persist { .. } => vec![
                "The add was rolled back, the in-memory index is unchanged",
                "Check disk space and permissions in the index directory",
            ],
            Self::Embedding(_) => vec![
                "Check that the embedding model downloaded correctly",
                "Ensure you have internet connection for first-time model download",
            ],
            Self::DimensionMismatch { .. } => vec![
                "The configured embedding model differs from the one that built the index",
                "Rebuild the index after changing the embedding model",
            ],
            _ => vec![],
        }
    }
}

/// Errors from the query pipeline; always folded into a degraded answer
#[derive(Error, Debug)]
pub enum PipelineError {
    #[error("Retrieval failed: {0}")]
    Retrieval(#[from] IndexError),

    #[error("Answer generation failed: {0}")]
    Generation(String),

    #[error("Query timed out after {timeout:?}")]
    Timeout { timeout: Duration },

    #[error("Query task failed: {0}")]
    Task(String),
}

impl PipelineError {
    pub fn status_code(&self) -> String {
        match self {
            Self::Retrieval(_) => "RETRIEVAL_FAILURE",
            Self::Generation(_) => "GENERATION_FAILURE",
            Self::Timeout { .. } => "TIMEOUT",
            Self::Task(_) => "TASK_FAILURE",
        }
        .to_string()
    }
}

/// Result type alias for extraction
pub type ExtractResult<T> = Result<T, ExtractError>;

/// Result type alias for index operations
pub type IndexResult<T> = Result<T, IndexError>;

/// Result type alias for pipeline stages
pub type PipelineResult<T> = Result<T, PipelineError>;
