//! Process-wide application state.

use std::sync::Arc;

use crate::chat::ChatService;
use crate::config::Settings;
use crate::error::IndexResult;
use crate::rag::RetrievalPipeline;
use crate::semantic::DocumentIndex;
use crate::vector::{EmbeddingGenerator, FastEmbedGenerator};

/// Everything a front end needs, built once at startup.
#[derive(Debug, Clone)]
pub struct AppState {
    pub settings: Arc<Settings>,
    pub index: Arc<DocumentIndex>,
    pub pipeline: Arc<RetrievalPipeline>,
    pub chat: Arc<ChatService>,
}

impl AppState {
    /// Load the embedding model, then load or create the index.
    ///
    /// # Errors
    /// Fails only when the embedding model cannot be set up; an unreadable
    /// index starts empty.
    pub fn initialize(settings: Settings) -> IndexResult<Self> {
        let embedding = &settings.embedding;
        let embedder = FastEmbedGenerator::new(
            &embedding.model,
            embedding.models_dir(),
            embedding.show_download_progress,
        )?;
        Ok(Self::with_embedder(settings, Arc::new(embedder)))
    }

    /// Wire up the state around an existing embedder.
    pub fn with_embedder(settings: Settings, embedder: Arc<dyn EmbeddingGenerator>) -> Self {
        let index = Arc::new(DocumentIndex::initialize(settings.index_path.clone(), embedder));
        let pipeline = Arc::new(RetrievalPipeline::new(Arc::clone(&index)));
        let chat = Arc::new(ChatService::new(
            Arc::clone(&pipeline),
            settings.retrieval.context_limit,
            settings.retrieval.timeout(),
        ));

        Self {
            settings: Arc::new(settings),
            index,
            pipeline,
            chat,
        }
    }
}
