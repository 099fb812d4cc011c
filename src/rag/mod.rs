//! Retrieval-augmented answers over the document index
//!
//! A query runs through five sequential steps: retrieve documents, render
//! them as context, derive a structured query, synthesize the answer text
//! and pick follow-up suggestions. Only retrieval can fail; it turns the
//! whole answer into the degraded apology.

mod context;
mod generator;
mod pipeline;
mod rules;

pub use context::{NO_DATA_CONTEXT, format_context};
pub use generator::{SYSTEM_PROMPT, TemplateGenerator, TextGenerator};
pub use pipeline::{
    Answer, DEFAULT_CONTEXT_LIMIT, DEGRADED_RESPONSE, GENERATION_FALLBACK, RetrievalPipeline,
};
pub use rules::{
    DecisionTable, MAX_SUGGESTIONS, OPENING_SENTENCES, QueryPredicate, SQL_TEMPLATES,
    SUGGESTION_LISTS, opening_sentence, structured_query, suggestions,
};
