//! Persistent document index.
//!
//! Vectors and documents live side by side behind one lock; position *i*
//! in the vector engine is document *i*. Every add rewrites the three
//! files under the index directory:
//!
//! - `vectors.bin`: see [`crate::vector::VectorFile`]
//! - `documents.json`: the documents as a JSON array
//! - `manifest.json`: see [`IndexManifest`]
//!
//! The manifest is committed last and is the commit record. Adds only
//! append, so stores holding more rows than the manifest counts are cut
//! back to it on load.

use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use serde::Serialize;
use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::error::{IndexError, IndexResult};
use crate::semantic::{IndexManifest, IndexedDocument, ScoredDocument};
use crate::vector::{
    EmbeddingGenerator, FlatIndex, NearestNeighbors, StagedFile, VectorError, VectorFile,
    normalize,
};

/// File name of the document store inside an index directory.
pub const DOCUMENTS_FILE: &str = "documents.json";

/// Summary returned by [`DocumentIndex::stats`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct IndexStats {
    pub total_documents: usize,
    pub index_size: usize,
    pub dimension: usize,
    pub model_name: String,
}

struct IndexState<N> {
    vectors: N,
    documents: Vec<IndexedDocument>,
    /// Set once the index has been persisted at least once
    created_at: Option<DateTime<Utc>>,
}

/// Semantic index over arbitrary JSON documents.
pub struct DocumentIndex<N: NearestNeighbors = FlatIndex> {
    path: PathBuf,
    embedder: Arc<dyn EmbeddingGenerator>,
    state: RwLock<IndexState<N>>,
}

impl<N: NearestNeighbors> std::fmt::Debug for DocumentIndex<N> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DocumentIndex")
            .field("path", &self.path)
            .field("documents", &self.len())
            .field("model", &self.embedder.model_name())
            .finish()
    }
}

impl DocumentIndex<FlatIndex> {
    /// Load the index stored at `path`, or start empty.
    ///
    /// Never fails: missing stores give an empty index and unreadable ones
    /// are logged and replaced by an empty index.
    pub fn initialize(path: impl Into<PathBuf>, embedder: Arc<dyn EmbeddingGenerator>) -> Self {
        Self::initialize_with(path, embedder)
    }
}

impl<N: NearestNeighbors> DocumentIndex<N> {
    /// [`DocumentIndex::initialize`] for any search engine.
    pub fn initialize_with(
        path: impl Into<PathBuf>,
        embedder: Arc<dyn EmbeddingGenerator>,
    ) -> Self {
        let path = path.into();

        let state = match Self::load(&path, embedder.as_ref()) {
            Ok(Some(state)) => {
                tracing::info!(
                    path = %path.display(),
                    documents = state.documents.len(),
                    "loaded document index"
                );
                state
            }
            Ok(None) => {
                tracing::debug!(path = %path.display(), "no persisted index, starting empty");
                Self::empty_state(embedder.as_ref())
            }
            Err(e) => {
                tracing::warn!(
                    path = %path.display(),
                    error = %e,
                    code = %e.status_code(),
                    "failed to load document index, starting empty"
                );
                Self::empty_state(embedder.as_ref())
            }
        };

        Self {
            path,
            embedder,
            state: RwLock::new(state),
        }
    }

    fn empty_state(embedder: &dyn EmbeddingGenerator) -> IndexState<N> {
        IndexState {
            vectors: N::empty(embedder.dimension()),
            documents: Vec::new(),
            created_at: None,
        }
    }

    /// Reads both stores. `Ok(None)` when either is missing.
    fn load(path: &Path, embedder: &dyn EmbeddingGenerator) -> IndexResult<Option<IndexState<N>>> {
        let vector_file = VectorFile::in_dir(path);
        let documents_path = path.join(DOCUMENTS_FILE);
        if !vector_file.exists() || !documents_path.exists() {
            return Ok(None);
        }

        let load_error = |reason: String| IndexError::Load {
            path: path.to_path_buf(),
            reason,
        };

        let mut stored = vector_file
            .read()
            .map_err(|e| load_error(format!("Failed to read vectors: {e}")))?;

        let expected = embedder.dimension().get();
        if stored.dimension.get() != expected {
            return Err(IndexError::DimensionMismatch {
                expected,
                actual: stored.dimension.get(),
            });
        }

        let file = File::open(&documents_path)
            .map_err(|e| load_error(format!("Failed to open documents: {e}")))?;
        let mut documents: Vec<IndexedDocument> = serde_json::from_reader(BufReader::new(file))
            .map_err(|e| load_error(format!("Failed to parse documents: {e}")))?;

        let created_at = if IndexManifest::exists(path) {
            let manifest = IndexManifest::load(path)?;
            if manifest.dimension != expected
                || manifest.count > documents.len()
                || manifest.count > stored.count()
            {
                return Err(load_error(format!(
                    "manifest describes {} documents of dimension {}, stores hold {} documents and {} vectors of dimension {expected}",
                    manifest.count,
                    manifest.dimension,
                    documents.len(),
                    stored.count()
                )));
            }
            if manifest.model_name != embedder.model_name() {
                tracing::warn!(
                    stored = %manifest.model_name,
                    configured = %embedder.model_name(),
                    "index was built with a different embedding model"
                );
            }

            if documents.len() > manifest.count || stored.count() > manifest.count {
                tracing::warn!(
                    committed = manifest.count,
                    documents = documents.len(),
                    vectors = stored.count(),
                    "discarding rows from an uncommitted add"
                );
                documents.truncate(manifest.count);
                stored.data.truncate(manifest.count * stored.dimension.get());
            }
            Some(manifest.created_at)
        } else {
            None
        };

        if stored.count() != documents.len() {
            return Err(load_error(format!(
                "{} vectors but {} documents",
                stored.count(),
                documents.len()
            )));
        }

        let vectors = N::from_stored(stored)?;
        Ok(Some(IndexState {
            vectors,
            documents,
            created_at,
        }))
    }

    /// Embed and append `documents`, then persist the index.
    ///
    /// Either every document is added and written, or the index is left as
    /// it was. A failed write rolls the in-memory stores back before
    /// returning [`IndexError::Persist`].
    pub fn add(&self, documents: Vec<IndexedDocument>) -> IndexResult<()> {
        if documents.is_empty() {
            return Ok(());
        }

        let texts: Vec<String> = documents
            .iter()
            .map(IndexedDocument::searchable_text)
            .collect();
        let text_refs: Vec<&str> = texts.iter().map(String::as_str).collect();

        let mut embeddings = self
            .embedder
            .generate_embeddings(&text_refs)
            .map_err(|e| IndexError::Embedding(e.to_string()))?;

        if embeddings.len() != documents.len() {
            return Err(IndexError::BatchMismatch {
                expected: documents.len(),
                actual: embeddings.len(),
            });
        }

        let expected = self.embedder.dimension().get();
        for embedding in &mut embeddings {
            if embedding.len() != expected {
                return Err(IndexError::DimensionMismatch {
                    expected,
                    actual: embedding.len(),
                });
            }
            normalize(embedding);
        }

        let mut state = self.state.write();
        let previous = state.documents.len();
        let added = documents.len();

        state.vectors.add(&embeddings)?;
        state.documents.extend(documents);

        match self.persist(&state) {
            Ok(manifest) => {
                state.created_at = Some(manifest.created_at);
                tracing::info!(added, total = state.documents.len(), "indexed documents");
                Ok(())
            }
            Err(source) => {
                state.vectors.truncate(previous);
                state.documents.truncate(previous);
                tracing::warn!(
                    path = %self.path.display(),
                    error = %source,
                    "failed to persist index, add rolled back"
                );
                // Stores renamed before the failure now hold the new rows
                if let Err(e) = self.restore(&state) {
                    tracing::warn!(
                        path = %self.path.display(),
                        error = %e,
                        "failed to restore stores after rollback"
                    );
                }
                Err(IndexError::Persist {
                    path: self.path.clone(),
                    source: Box::new(source),
                })
            }
        }
    }

    /// Stages every store before replacing any of them.
    fn persist(&self, state: &IndexState<N>) -> Result<IndexManifest, VectorError> {
        let dimension = state.vectors.dimension();
        let count = state.documents.len();
        let model_name = self.embedder.model_name();
        let manifest = match state.created_at {
            Some(created_at) => {
                IndexManifest::updated(model_name, dimension.get(), count, created_at)
            }
            None => IndexManifest::new(model_name, dimension.get(), count),
        };

        let [vectors, documents] = self.stage_stores(state)?;
        let manifest_file = manifest.stage(&self.path)?;

        // Manifest last: until it lands the previous count still holds
        for file in [vectors, documents, manifest_file] {
            file.commit()?;
        }

        Ok(manifest)
    }

    /// Rewrites the vector and document stores from `state`, leaving the
    /// manifest alone.
    fn restore(&self, state: &IndexState<N>) -> Result<(), VectorError> {
        for file in self.stage_stores(state)? {
            file.commit()?;
        }
        Ok(())
    }

    fn stage_stores(&self, state: &IndexState<N>) -> Result<[StagedFile; 2], VectorError> {
        Ok([
            VectorFile::in_dir(&self.path)
                .stage(state.vectors.dimension(), state.vectors.as_flat())?,
            StagedFile::create(&self.path.join(DOCUMENTS_FILE), |writer| {
                serde_json::to_writer(writer, &state.documents).map_err(std::io::Error::from)
            })?,
        ])
    }

    /// Nearest documents to `query`, best first, at most `limit`.
    pub fn try_search(&self, query: &str, limit: usize) -> IndexResult<Vec<ScoredDocument>> {
        if limit == 0 || self.is_empty() {
            return Ok(Vec::new());
        }

        let mut query_embedding = self
            .embedder
            .generate_embeddings(&[query])
            .map_err(|e| IndexError::Embedding(e.to_string()))?
            .into_iter()
            .next()
            .ok_or(IndexError::BatchMismatch {
                expected: 1,
                actual: 0,
            })?;
        normalize(&mut query_embedding);

        let state = self.state.read();
        let neighbors = state.vectors.search(&query_embedding, limit)?;

        tracing::debug!(
            query,
            limit,
            hits = neighbors.len(),
            top_score = neighbors.first().map(|n| n.score),
            "searched document index"
        );

        Ok(neighbors
            .into_iter()
            .filter_map(|neighbor| {
                state
                    .documents
                    .get(neighbor.position)
                    .map(|document| ScoredDocument {
                        document: document.clone(),
                        similarity_score: neighbor.score,
                    })
            })
            .collect())
    }

    /// Like [`DocumentIndex::try_search`] but degrades failures to no results.
    pub fn search(&self, query: &str, limit: usize) -> Vec<ScoredDocument> {
        self.try_search(query, limit).unwrap_or_else(|e| {
            tracing::warn!(query, error = %e, "search failed, returning no results");
            Vec::new()
        })
    }

    pub fn stats(&self) -> IndexStats {
        let state = self.state.read();
        IndexStats {
            total_documents: state.documents.len(),
            index_size: state.vectors.len(),
            dimension: state.vectors.dimension().get(),
            model_name: self.embedder.model_name(),
        }
    }

    pub fn len(&self) -> usize {
        self.state.read().documents.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}
