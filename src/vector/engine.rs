//! Nearest-neighbour search over unit-length vectors.
//!
//! Scoring is the plain inner product, which equals cosine similarity
//! because every vector is normalized before it is added and every query
//! before it is searched.

use crate::vector::{Neighbor, StoredVectors, VectorDimension, VectorError, inner_product};

/// Capability the document index is generic over.
///
/// Positions are dense and follow insertion order; `truncate` is the only
/// way to remove vectors and exists so a failed add can be rolled back.
pub trait NearestNeighbors: Send + Sync {
    /// Creates an empty index.
    fn empty(dimension: VectorDimension) -> Self
    where
        Self: Sized;

    /// Rebuilds an index from persisted rows.
    fn from_stored(stored: StoredVectors) -> Result<Self, VectorError>
    where
        Self: Sized;

    /// Dimension every stored and query vector must have.
    fn dimension(&self) -> VectorDimension;

    /// Number of stored vectors.
    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Appends vectors at the end, in order.
    fn add(&mut self, vectors: &[Vec<f32>]) -> Result<(), VectorError>;

    /// Drops every vector at position `len` or later.
    fn truncate(&mut self, len: usize);

    /// Returns at most `k` neighbours, best score first. Ties keep
    /// insertion order so repeated searches are identical.
    fn search(&self, query: &[f32], k: usize) -> Result<Vec<Neighbor>, VectorError>;

    /// Row-major copy of every stored vector, for persistence.
    fn as_flat(&self) -> &[f32];
}

/// Exact search by scanning every stored vector.
#[derive(Debug, Clone)]
pub struct FlatIndex {
    dimension: VectorDimension,
    data: Vec<f32>,
}

impl FlatIndex {
    /// Creates an empty index.
    #[must_use]
    pub fn new(dimension: VectorDimension) -> Self {
        Self {
            dimension,
            data: Vec::new(),
        }
    }

    /// Rebuilds an index from persisted row-major data.
    pub fn from_flat(dimension: VectorDimension, data: Vec<f32>) -> Result<Self, VectorError> {
        if data.len() % dimension.get() != 0 {
            return Err(VectorError::InvalidFormat(format!(
                "{} values is not a whole number of {dimension}-dimensional rows",
                data.len()
            )));
        }
        Ok(Self { dimension, data })
    }

    fn row(&self, position: usize) -> &[f32] {
        let dim = self.dimension.get();
        &self.data[position * dim..(position + 1) * dim]
    }
}

impl NearestNeighbors for FlatIndex {
    fn empty(dimension: VectorDimension) -> Self {
        Self::new(dimension)
    }

    fn from_stored(stored: StoredVectors) -> Result<Self, VectorError> {
        Self::from_flat(stored.dimension, stored.data)
    }

    fn dimension(&self) -> VectorDimension {
        self.dimension
    }

    fn len(&self) -> usize {
        self.data.len() / self.dimension.get()
    }

    fn add(&mut self, vectors: &[Vec<f32>]) -> Result<(), VectorError> {
        // Validate the whole batch before touching the data
        for vector in vectors {
            self.dimension.validate_vector(vector)?;
        }
        self.data.reserve(vectors.len() * self.dimension.get());
        for vector in vectors {
            self.data.extend_from_slice(vector);
        }
        Ok(())
    }

    fn truncate(&mut self, len: usize) {
        self.data.truncate(len * self.dimension.get());
    }

    fn search(&self, query: &[f32], k: usize) -> Result<Vec<Neighbor>, VectorError> {
        self.dimension.validate_vector(query)?;

        let mut scored: Vec<Neighbor> = (0..self.len())
            .map(|position| Neighbor {
                position,
                score: inner_product(query, self.row(position)),
            })
            .collect();

        // Stable sort keeps equal scores in insertion order
        scored.sort_by(|a, b| b.score.total_cmp(&a.score));
        scored.truncate(k.min(self.len()));
        Ok(scored)
    }

    fn as_flat(&self) -> &[f32] {
        &self.data
    }
}
