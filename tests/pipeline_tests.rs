//! Question answering over an index built from extracted profiles.

mod common;

use common::{SlowGenerator, argo_container, create_test_index};
use floatrag::profile::ProfileExtractor;
use floatrag::rag::{DEGRADED_RESPONSE, NO_DATA_CONTEXT, format_context};
use floatrag::{RetrievalPipeline, TextGenerator};
use std::sync::Arc;
use std::time::Duration;

fn populated_pipeline() -> (Arc<RetrievalPipeline>, tempfile::TempDir) {
    let (index, dir) = create_test_index();
    let extraction = ProfileExtractor::new().extract_container(&mut argo_container());
    index.add(extraction.documents()).unwrap();
    (Arc::new(RetrievalPipeline::new(index)), dir)
}

#[test]
fn test_answer_over_extracted_profiles() {
    let (pipeline, _dir) = populated_pipeline();
    let answer = pipeline.answer("What is the temperature in the Indian Ocean?", 2);

    assert!(!answer.is_degraded());
    assert!(answer.response.starts_with(
        "Based on the ARGO float data, here's what I found about temperature:"
    ));
    assert_eq!(answer.context_documents.as_ref().unwrap().len(), 2);
    assert_eq!(
        answer.structured_query.as_deref(),
        Some("SELECT * FROM argo_profiles WHERE measurements ? 'TEMP'")
    );
    assert_eq!(
        answer.suggestions.as_deref().unwrap(),
        [
            "Plot temperature depth profiles",
            "Compare with historical data",
            "Show temperature anomalies",
        ]
    );
}

#[test]
fn test_context_summarises_surface_and_deep() {
    let (pipeline, _dir) = populated_pipeline();
    let documents = pipeline.index().try_search("salinity temperature", 3).unwrap();
    let context = format_context(&documents);

    assert!(context.starts_with("RELEVANT ARGO DATA:\n\n1. Float Data:"));
    assert!(context.contains("   TEMP: 28.10 (surface) to 4.20 (deep)"));
    assert!(context.contains("   PSAL: 35.10 (surface) to 34.70 (deep)"));
    assert!(context.contains("   Location: 10.50°N, 65.20°E"));
    assert!(context.contains("3. Float Data:"));
}

#[test]
fn test_empty_index_answers_without_data() {
    let (index, _dir) = create_test_index();
    let pipeline = RetrievalPipeline::new(index);

    let answer = pipeline.answer("where are the floats", 5);
    assert!(!answer.is_degraded());
    assert!(answer.context_documents.unwrap().is_empty());
    assert!(answer.response.contains("No specific data found"));
    assert_eq!(
        answer.structured_query.as_deref(),
        Some("SELECT * FROM argo_profiles ORDER BY date DESC LIMIT 100")
    );
    assert_eq!(format_context(&[]), NO_DATA_CONTEXT);
}

#[test]
fn test_position_query_uses_bounding_box() {
    let (pipeline, _dir) = populated_pipeline();
    let answer = pipeline.answer("profiles near latitude 10", 5);
    assert_eq!(
        answer.structured_query.as_deref(),
        Some(
            "SELECT * FROM argo_profiles WHERE latitude BETWEEN ? AND ? AND longitude BETWEEN ? AND ?"
        )
    );
}

#[tokio::test]
async fn test_slow_generator_times_out() {
    let (index, _dir) = create_test_index();
    let slow: Arc<dyn TextGenerator> = Arc::new(SlowGenerator(Duration::from_millis(500)));
    let pipeline = Arc::new(RetrievalPipeline::with_generator(index, slow));

    let answer = pipeline
        .answer_with_timeout("salinity".to_string(), 5, Duration::from_millis(20))
        .await;

    assert!(answer.is_degraded());
    assert_eq!(answer.response, DEGRADED_RESPONSE);
    assert!(answer.error.unwrap().contains("timed out"));
    assert!(answer.context_documents.is_none());
}

#[tokio::test]
async fn test_timeout_wrapper_passes_answer_through() {
    let (pipeline, _dir) = populated_pipeline();
    let answer = Arc::clone(&pipeline)
        .answer_with_timeout("salinity".to_string(), 1, Duration::from_secs(10))
        .await;

    assert!(!answer.is_degraded());
    assert_eq!(answer.context_documents.unwrap().len(), 1);
}
