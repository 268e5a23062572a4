//! Exact nearest-neighbour index over the snippet corpus
//!
//! A flat index: every query is compared against every stored vector under
//! squared Euclidean distance.

use tracing::debug;

use crate::errors::FirstAidError;
use crate::errors::Result;

/// One search hit: a corpus snippet and its squared L2 distance to the query
#[derive(Debug, Clone, PartialEq)]
pub struct IndexHit {
    /// Position of the snippet in the corpus
    pub position: usize,
    pub snippet: String,
    pub distance: f32,
}

#[derive(Debug)]
struct FlatL2 {
    snippets: Vec<String>,
    /// Row-major `snippets.len() x dimension` matrix
    vectors: Vec<f32>,
    dimension: usize,
}

/// Read-only after [`LocalIndex::build`]; safe to share behind an `Arc`.
#[derive(Debug, Default)]
pub struct LocalIndex {
    inner: Option<FlatL2>,
}

impl LocalIndex {
    /// An empty index; [`LocalIndex::search`] fails until it is built
    #[must_use]
    pub const fn new() -> Self {
        Self { inner: None }
    }

    /// Build and return an index in one step
    pub fn from_embeddings(snippets: Vec<String>, embeddings: Vec<Vec<f32>>) -> Result<Self> {
        let mut index = Self::new();
        index.build(snippets, embeddings)?;
        Ok(index)
    }

    /// Populate the index from snippets and their embeddings
    ///
    /// # Errors
    /// `Configuration` when the corpus is empty, counts differ, a vector is
    /// zero-length or dimensions disagree, or the index is already built.
    pub fn build(&mut self, snippets: Vec<String>, embeddings: Vec<Vec<f32>>) -> Result<()> {
        if self.inner.is_some() {
            return Err(FirstAidError::Configuration(
                "Local index is already built".to_string(),
            ));
        }
        if snippets.is_empty() {
            return Err(FirstAidError::Configuration(
                "Cannot build local index from an empty corpus".to_string(),
            ));
        }
        if snippets.len() != embeddings.len() {
            return Err(FirstAidError::Configuration(format!(
                "Got {} snippets but {} embeddings",
                snippets.len(),
                embeddings.len()
            )));
        }

        let dimension = embeddings[0].len();
        if dimension == 0 {
            return Err(FirstAidError::Configuration(
                "Embeddings must have at least one dimension".to_string(),
            ));
        }

        let mut vectors = Vec::with_capacity(snippets.len() * dimension);
        for (position, embedding) in embeddings.into_iter().enumerate() {
            if embedding.len() != dimension {
                return Err(FirstAidError::Configuration(format!(
                    "Embedding {position} has dimension {}, expected {dimension}",
                    embedding.len()
                )));
            }
            vectors.extend(embedding);
        }

        debug!(
            "Built local index: {} snippets, dimension {}",
            snippets.len(),
            dimension
        );

        self.inner = Some(FlatL2 {
            snippets,
            vectors,
            dimension,
        });
        Ok(())
    }

    pub fn is_built(&self) -> bool {
        self.inner.is_some()
    }

    /// Number of indexed snippets (0 before build)
    pub fn len(&self) -> usize {
        self.inner.as_ref().map_or(0, |i| i.snippets.len())
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Vector dimension, once built
    pub fn dimension(&self) -> Option<usize> {
        self.inner.as_ref().map(|i| i.dimension)
    }

    /// The `k` snippets closest to `query`, ascending by distance
    ///
    /// Asking for more than the corpus holds returns the whole corpus.
    /// Equal distances keep corpus order.
    ///
    /// # Errors
    /// `NotBuilt` before [`LocalIndex::build`]; `Configuration` when the
    /// query dimension does not match the index.
    pub fn search(&self, query: &[f32], k: usize) -> Result<Vec<IndexHit>> {
        let inner = self.inner.as_ref().ok_or(FirstAidError::NotBuilt)?;

        if query.len() != inner.dimension {
            return Err(FirstAidError::Configuration(format!(
                "Query vector has dimension {}, index expects {}",
                query.len(),
                inner.dimension
            )));
        }

        let mut scored: Vec<(usize, f32)> = inner
            .vectors
            .chunks_exact(inner.dimension)
            .map(|row| euclidean_distance_squared(query, row))
            .enumerate()
            .collect();

        scored.sort_by(|a, b| a.1.total_cmp(&b.1).then(a.0.cmp(&b.0)));
        scored.truncate(k);

        Ok(scored
            .into_iter()
            .map(|(position, distance)| IndexHit {
                position,
                snippet: inner.snippets[position].clone(),
                distance,
            })
            .collect())
    }
}

/// Squared Euclidean distance; callers guarantee equal lengths
pub fn euclidean_distance_squared(a: &[f32], b: &[f32]) -> f32 {
    a.iter()
        .zip(b)
        .map(|(x, y)| {
            let d = x - y;
            d * d
        })
        .sum()
}
