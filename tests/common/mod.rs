#![allow(dead_code)]

use floatrag::EmbeddingGenerator;
use floatrag::profile::MemoryContainer;
use floatrag::rag::TextGenerator;
use floatrag::vector::{VectorDimension, VectorError};
use floatrag::{DocumentIndex, PipelineResult};
use std::sync::Arc;
use std::time::Duration;
use tempfile::TempDir;

pub const TEST_DIMENSION: usize = 64;

/// Bag-of-words embedder: every lowercase token lands in one hashed bucket.
///
/// Deterministic across runs so scores can be compared in assertions.
#[derive(Debug, Default)]
pub struct HashingEmbedder;

fn bucket(token: &str) -> usize {
    // FNV-1a
    let mut hash: u64 = 0xcbf2_9ce4_8422_2325;
    for byte in token.bytes() {
        hash ^= u64::from(byte);
        hash = hash.wrapping_mul(0x0000_0100_0000_01b3);
    }
    (hash % TEST_DIMENSION as u64) as usize
}

impl EmbeddingGenerator for HashingEmbedder {
    fn generate_embeddings(&self, texts: &[&str]) -> Result<Vec<Vec<f32>>, VectorError> {
        Ok(texts
            .iter()
            .map(|text| {
                let mut embedding = vec![0.0; TEST_DIMENSION];
                // Keeps empty text from producing a zero vector
                embedding[TEST_DIMENSION - 1] = 0.01;
                for token in text
                    .to_lowercase()
                    .split(|c: char| !c.is_alphanumeric())
                    .filter(|t| !t.is_empty())
                {
                    embedding[bucket(token)] += 1.0;
                }
                embedding
            })
            .collect())
    }

    fn dimension(&self) -> VectorDimension {
        VectorDimension::new(TEST_DIMENSION).expect("non-zero dimension")
    }

    fn model_name(&self) -> String {
        "hashing-test".to_string()
    }
}

/// Generator that takes longer than any test timeout.
pub struct SlowGenerator(pub Duration);

impl TextGenerator for SlowGenerator {
    fn generate(&self, query: &str, _context: &str) -> PipelineResult<String> {
        std::thread::sleep(self.0);
        Ok(format!("eventually: {query}"))
    }

    fn name(&self) -> &str {
        "slow"
    }
}

/// Creates an empty index with an isolated directory.
pub fn create_test_index() -> (Arc<DocumentIndex>, TempDir) {
    let temp_dir = TempDir::new().expect("Failed to create temp dir");
    let index = DocumentIndex::initialize(temp_dir.path().join("index"), Arc::new(HashingEmbedder));
    (Arc::new(index), temp_dir)
}

/// Three profiles of float 2902746 with four levels each.
///
/// Profile 0 is fully valid. Profile 1 has a fill value and a NaN in TEMP
/// and no valid PSAL. Profile 2 has no position or date and no valid TEMP.
pub fn argo_container() -> MemoryContainer {
    let nan = f64::NAN;
    MemoryContainer::new()
        .dimension("N_PROF", 3)
        .dimension("N_LEVELS", 4)
        .attribute("platform_number", "2902746")
        .attribute("institution", "INCOIS")
        .attribute("data_mode", "D")
        .attribute("format_version", "3.1")
        .text("PLATFORM_NUMBER", vec!["2902746 ", "2902746 ", "2902746 "])
        .text("PROJECT_NAME", vec!["ARGO INDIA", "ARGO INDIA", "ARGO INDIA"])
        .numeric("LATITUDE", vec![10.5, -12.0, nan])
        .numeric("LONGITUDE", vec![65.2, 80.1, 70.0])
        .numeric("JULD", vec![26_722.5, 26_732.5, nan])
        .numeric(
            "PRES",
            vec![
                5.0, 50.0, 200.0, 1000.0, //
                5.0, 50.0, 200.0, 1000.0, //
                5.0, 50.0, 200.0, 1000.0,
            ],
        )
        .numeric(
            "TEMP",
            vec![
                28.1, 27.5, 15.0, 4.2, //
                26.0, -999.0, 12.0, nan, //
                nan, nan, nan, nan,
            ],
        )
        .text("TEMP_QC", vec!["1111", "1141", "4444"])
        .numeric(
            "PSAL",
            vec![
                35.1, 35.0, 34.9, 34.7, //
                -999.0, -999.0, -999.0, -999.0, //
                34.5, 34.6, 34.7, 34.8,
            ],
        )
        .text("PROFILE_PRES_QC", vec!["A", "B", "C"])
}
