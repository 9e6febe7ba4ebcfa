use crate::embeddings::Embedding;
use anyhow::Result;

/// One search hit: the vector's insertion position and its squared L2 distance
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Neighbor {
    pub position: usize,
    pub distance: f32,
}

/// Exact nearest-neighbor index over a flat list of vectors.
///
/// Every query scans all vectors, so results are always the true k nearest.
#[derive(Debug, Clone)]
pub struct FlatIndex {
    dimension: usize,
    vectors: Vec<Embedding>,
}

impl FlatIndex {
    pub fn new(dimension: usize) -> Self {
        FlatIndex {
            dimension,
            vectors: Vec::new(),
        }
    }

    pub fn dimension(&self) -> usize {
        self.dimension
    }

    pub fn len(&self) -> usize {
        self.vectors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.vectors.is_empty()
    }

    /// Replace the whole index content with `vectors`, keeping their order as positions.
    ///
    /// On a dimension mismatch the previous content is left untouched.
    pub fn rebuild(&mut self, vectors: Vec<Embedding>) -> Result<()> {
        if let Some((position, vector)) = vectors
            .iter()
            .enumerate()
            .find(|(_, v)| v.len() != self.dimension)
        {
            return Err(anyhow::anyhow!(
                "Vector {} has {} dimensions, index expects {}",
                position,
                vector.len(),
                self.dimension
            ));
        }

        self.vectors = vectors;
        Ok(())
    }

    /// The `k` nearest vectors to `query`, ascending by distance.
    ///
    /// Ties keep insertion order. Returns fewer than `k` hits when the index
    /// holds fewer vectors, and nothing for `k == 0`. The caller is
    /// responsible for passing a query of the index dimension.
    pub fn search(&self, query: &[f32], k: usize) -> Vec<Neighbor> {
        if k == 0 || self.vectors.is_empty() {
            return Vec::new();
        }

        let mut neighbors: Vec<Neighbor> = self
            .vectors
            .iter()
            .enumerate()
            .map(|(position, vector)| Neighbor {
                position,
                distance: squared_l2(query, vector),
            })
            .collect();

        // Stable sort keeps insertion order among equal distances
        neighbors.sort_by(|a, b| a.distance.total_cmp(&b.distance));
        neighbors.truncate(k);
        neighbors
    }
}

fn squared_l2(a: &[f32], b: &[f32]) -> f32 {
    a.iter()
        .zip(b)
        .map(|(x, y)| {
            let diff = x - y;
            diff * diff
        })
        .sum()
}
