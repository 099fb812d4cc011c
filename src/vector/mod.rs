//! Vector embedding, storage and nearest-neighbour search.
//!
//! The pieces here know nothing about float documents: embeddings turn
//! text into unit vectors, [`FlatIndex`] answers inner-product queries and
//! [`VectorFile`] persists the rows. The document index in
//! [`crate::semantic`] pairs them with metadata.

mod embedding;
mod engine;
mod storage;
mod types;

#[cfg(test)]
pub use embedding::MockEmbeddingGenerator;
pub use embedding::{
    EmbeddingGenerator, FastEmbedGenerator, model_to_string, parse_embedding_model,
};
pub use engine::{FlatIndex, NearestNeighbors};
pub use storage::{StagedFile, StoredVectors, VectorFile};
pub use types::{
    Neighbor, VECTOR_DIMENSION_384, VectorDimension, VectorError, inner_product, normalize,
};
