use crate::chunking::Chunk;
use crate::embeddings::Embedding;
use crate::error::RetrievalError;
use crate::index::{FlatIndex, Neighbor};
use anyhow::Result;
use std::sync::Arc;
use tokio::sync::RwLock;

/// One complete build of chunks plus their index.
///
/// Position `i` in the chunk list and position `i` in the index always refer
/// to the same chunk. A generation is immutable once built.
#[derive(Debug)]
pub struct CorpusGeneration {
    chunks: Vec<Chunk>,
    index: FlatIndex,
}

impl CorpusGeneration {
    /// A generation with no chunks for an index of `dimension`
    pub fn empty(dimension: usize) -> Self {
        CorpusGeneration {
            chunks: Vec::new(),
            index: FlatIndex::new(dimension),
        }
    }

    /// Pair `chunks` with their `embeddings`, in the same order
    pub fn build(chunks: Vec<Chunk>, embeddings: Vec<Embedding>, dimension: usize) -> Result<Self> {
        if chunks.len() != embeddings.len() {
            return Err(anyhow::anyhow!(
                "Got {} embeddings for {} chunks",
                embeddings.len(),
                chunks.len()
            ));
        }

        let mut index = FlatIndex::new(dimension);
        index.rebuild(embeddings)?;

        Ok(CorpusGeneration { chunks, index })
    }

    pub fn len(&self) -> usize {
        self.chunks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.chunks.is_empty()
    }

    pub fn dimension(&self) -> usize {
        self.index.dimension()
    }

    /// The chunk stored at an index position
    pub fn get(&self, position: usize) -> Result<&Chunk, RetrievalError> {
        self.chunks
            .get(position)
            .ok_or(RetrievalError::PositionOutOfRange {
                position,
                len: self.chunks.len(),
            })
    }

    /// The `k` nearest chunks to `query`, nearest first
    pub fn search(&self, query: &[f32], k: usize) -> Result<Vec<Neighbor>, RetrievalError> {
        if self.is_empty() {
            return Err(RetrievalError::EmptyCorpus);
        }
        if query.len() != self.dimension() {
            return Err(RetrievalError::DimensionMismatch {
                expected: self.dimension(),
                actual: query.len(),
            });
        }

        Ok(self.index.search(query, k))
    }
}

/// Shared handle to the current corpus generation.
///
/// Readers take a snapshot and keep using it for the whole request; a rebuild
/// swaps the reference in one step, so nobody sees chunks and vectors from
/// different generations.
pub struct CorpusStore {
    current: RwLock<Arc<CorpusGeneration>>,
}

impl CorpusStore {
    pub fn new(generation: CorpusGeneration) -> Self {
        CorpusStore {
            current: RwLock::new(Arc::new(generation)),
        }
    }

    /// The generation currently being served
    pub async fn snapshot(&self) -> Arc<CorpusGeneration> {
        self.current.read().await.clone()
    }

    /// Atomically install a new generation, returning the previous one
    pub async fn replace(&self, generation: CorpusGeneration) -> Arc<CorpusGeneration> {
        let mut current = self.current.write().await;
        std::mem::replace(&mut *current, Arc::new(generation))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chunking::split_into_chunks;

    fn generation(text: &str) -> CorpusGeneration {
        let chunks = split_into_chunks(text, "doc.txt", 1);
        let embeddings = chunks
            .iter()
            .enumerate()
            .map(|(i, _)| vec![i as f32, 0.0])
            .collect();
        CorpusGeneration::build(chunks, embeddings, 2).unwrap()
    }

    #[test]
    fn test_build_rejects_length_mismatch() {
        let chunks = split_into_chunks("abc", "doc.txt", 1);
        let err = CorpusGeneration::build(chunks, vec![vec![0.0, 0.0]], 2).unwrap_err();
        assert!(err.to_string().contains("1 embeddings for 3 chunks"));
    }

    #[test]
    fn test_get_out_of_range() {
        let generation = generation("ab");
        assert_eq!(generation.get(1).unwrap().text, "b");
        assert!(matches!(
            generation.get(2),
            Err(RetrievalError::PositionOutOfRange { position: 2, len: 2 })
        ));
    }

    #[test]
    fn test_positions_line_up_with_chunks() {
        let generation = generation("xyz");
        for position in 0..generation.len() {
            let hits = generation.search(&[position as f32, 0.0], 1).unwrap();
            assert_eq!(hits[0].position, position);
            assert_eq!(hits[0].distance, 0.0);
            assert_eq!(
                generation.get(hits[0].position).unwrap().metadata.chunk_id,
                position
            );
        }
    }

    #[test]
    fn test_search_errors() {
        assert!(matches!(
            CorpusGeneration::empty(2).search(&[0.0, 0.0], 3),
            Err(RetrievalError::EmptyCorpus)
        ));
        assert!(matches!(
            generation("a").search(&[0.0], 1),
            Err(RetrievalError::DimensionMismatch {
                expected: 2,
                actual: 1
            })
        ));
    }

    #[tokio::test]
    async fn test_snapshot_survives_replace() {
        let store = CorpusStore::new(generation("old"));
        let before = store.snapshot().await;

        let previous = store.replace(generation("fresh!")).await;

        assert_eq!(previous.len(), 3);
        assert_eq!(before.len(), 3);
        assert_eq!(before.get(0).unwrap().text, "o");
        assert_eq!(store.snapshot().await.len(), 6);
    }
}
