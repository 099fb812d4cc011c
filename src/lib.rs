//! The main library module for floatrag
pub mod chat;
pub mod config;
pub mod display;
pub mod error;
pub mod logging;
pub mod profile;
pub mod rag;
pub mod semantic;
pub mod state;
pub mod vector;

// Explicit exports for better API clarity
pub use chat::{CHAT_ERROR_RESPONSE, ChatReply, ChatService, ChatTurn, Conversation, Role};
pub use config::Settings;
pub use error::{
    ExtractError, ExtractResult, IndexError, IndexResult, PipelineError, PipelineResult,
};
pub use profile::{Extraction, ProfileExtractor, ProfileRecord};
pub use rag::{Answer, RetrievalPipeline, TemplateGenerator, TextGenerator};
pub use semantic::{DocumentIndex, IndexStats, IndexedDocument, ScoredDocument};
pub use state::AppState;
pub use vector::{EmbeddingGenerator, FastEmbedGenerator};
