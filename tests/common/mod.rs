#![allow(dead_code)]

use anyhow::Result;
use async_trait::async_trait;
use rag_qa::answer::Generator;
use rag_qa::embeddings::{Embedder, Embedding, DEFAULT_EMBEDDING_DIMENSION};
use rag_qa::rag::{EngineSettings, RagEngine};
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

/// Deterministic stand-in: hashes character bigrams into fixed buckets
pub struct HashEmbedder;

#[async_trait]
impl Embedder for HashEmbedder {
    fn dimension(&self) -> usize {
        DEFAULT_EMBEDDING_DIMENSION
    }

    async fn embed(&self, texts: &[String]) -> Result<Vec<Embedding>> {
        Ok(texts.iter().map(|text| hash_bigrams(text)).collect())
    }
}

pub fn hash_bigrams(text: &str) -> Embedding {
    let mut vector = vec![0.0; DEFAULT_EMBEDDING_DIMENSION];
    let chars: Vec<char> = text.to_lowercase().chars().collect();
    for pair in chars.windows(2) {
        let bucket = (pair[0] as usize * 31 + pair[1] as usize) % DEFAULT_EMBEDDING_DIMENSION;
        vector[bucket] += 1.0;
    }
    vector
}

pub struct FailingEmbedder;

#[async_trait]
impl Embedder for FailingEmbedder {
    fn dimension(&self) -> usize {
        DEFAULT_EMBEDDING_DIMENSION
    }

    async fn embed(&self, _texts: &[String]) -> Result<Vec<Embedding>> {
        Err(anyhow::anyhow!("embedding backend unreachable"))
    }
}

/// Answers with a fixed string
pub struct CannedGenerator(pub &'static str);

#[async_trait]
impl Generator for CannedGenerator {
    async fn generate(&self, _prompt: &str) -> Result<String> {
        Ok(self.0.to_string())
    }
}

/// Never answers within a test timeout
pub struct SlowGenerator;

#[async_trait]
impl Generator for SlowGenerator {
    async fn generate(&self, _prompt: &str) -> Result<String> {
        tokio::time::sleep(Duration::from_secs(10)).await;
        Ok("too late".to_string())
    }
}

pub struct FailingGenerator;

#[async_trait]
impl Generator for FailingGenerator {
    async fn generate(&self, _prompt: &str) -> Result<String> {
        Err(anyhow::anyhow!("generation backend unreachable"))
    }
}

pub fn settings_for(dir: &Path) -> EngineSettings {
    EngineSettings {
        documents_dir: dir.to_path_buf(),
        model_timeout: Duration::from_secs(5),
        ..EngineSettings::default()
    }
}

pub fn engine(
    dir: &Path,
    embedder: Arc<dyn Embedder>,
    generator: Arc<dyn Generator>,
) -> Arc<RagEngine> {
    Arc::new(RagEngine::new(embedder, generator, settings_for(dir)))
}
