use anyhow::Result;
use async_trait::async_trait;

/// Output size of the reference embedding model
pub const DEFAULT_EMBEDDING_DIMENSION: usize = 384;

/// A fixed-length embedding vector
pub type Embedding = Vec<f32>;

/// Maps text to fixed-dimension vectors.
///
/// Implementations must return exactly one vector per input, in input order,
/// each of length [`Embedder::dimension`], and be deterministic for a fixed
/// model.
#[async_trait]
pub trait Embedder: Send + Sync {
    /// Length of every vector this embedder produces
    fn dimension(&self) -> usize;

    /// Generate embeddings for a batch of texts
    async fn embed(&self, texts: &[String]) -> Result<Vec<Embedding>>;

    /// Generate the embedding for a single text
    async fn embed_one(&self, text: &str) -> Result<Embedding> {
        let mut embeddings = self.embed(&[text.to_string()]).await?;
        if embeddings.len() != 1 {
            return Err(anyhow::anyhow!(
                "Expected 1 embedding, got {}",
                embeddings.len()
            ));
        }
        Ok(embeddings.remove(0))
    }
}
