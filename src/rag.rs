use crate::answer::{AnswerGenerator, Generator};
use crate::chunking::{split_into_chunks, Chunk, DEFAULT_CHUNK_SIZE};
use crate::context::{assemble_context, DEFAULT_MAX_CONTEXT_CHARS};
use crate::corpus::{CorpusGeneration, CorpusStore};
use crate::document::load_documents;
use crate::embeddings::Embedder;
use crate::error::{QueryError, RetrievalError, Stage};
use anyhow::{Context, Result};
use log::{debug, info};
use serde::Serialize;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;
use tokio::time::timeout;

/// Tunables for corpus builds and question answering
#[derive(Debug, Clone)]
pub struct EngineSettings {
    pub documents_dir: PathBuf,
    /// Chunk window in characters
    pub chunk_size: usize,
    /// Context cap in characters, 0 for none
    pub max_context_chars: usize,
    /// Upper bound for each embedding or generation call made while answering
    pub model_timeout: Duration,
}

impl Default for EngineSettings {
    fn default() -> Self {
        EngineSettings {
            documents_dir: PathBuf::from("./documents"),
            chunk_size: DEFAULT_CHUNK_SIZE,
            max_context_chars: DEFAULT_MAX_CONTEXT_CHARS,
            model_timeout: Duration::from_secs(30),
        }
    }
}

/// A retrieved chunk and its squared L2 distance to the question
#[derive(Debug, Clone, Serialize)]
pub struct RetrievedChunk {
    #[serde(flatten)]
    pub chunk: Chunk,
    pub distance: f32,
}

/// Answer to one question plus the chunks it was grounded on, nearest first
#[derive(Debug, Clone, Serialize)]
pub struct QueryResult {
    pub answer: String,
    pub relevant_chunks: Vec<RetrievedChunk>,
}

/// Counts from one corpus rebuild
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct RebuildSummary {
    pub files: usize,
    pub failed_files: usize,
    pub chunks: usize,
}

/// RAG (Retrieval-Augmented Generation) engine
pub struct RagEngine {
    embedder: Arc<dyn Embedder>,
    answers: AnswerGenerator,
    corpus: CorpusStore,
    settings: EngineSettings,
    rebuild_lock: Mutex<()>,
}

impl RagEngine {
    /// Create a new RAG engine serving an empty corpus until the first rebuild
    pub fn new(
        embedder: Arc<dyn Embedder>,
        generator: Arc<dyn Generator>,
        settings: EngineSettings,
    ) -> Self {
        let corpus = CorpusStore::new(CorpusGeneration::empty(embedder.dimension()));

        RagEngine {
            embedder,
            answers: AnswerGenerator::new(generator),
            corpus,
            settings,
            rebuild_lock: Mutex::new(()),
        }
    }

    pub fn settings(&self) -> &EngineSettings {
        &self.settings
    }

    pub fn corpus(&self) -> &CorpusStore {
        &self.corpus
    }

    /// Load, chunk and embed the documents directory, then swap the result in.
    ///
    /// The new generation is fully built before it replaces the current one;
    /// on error the current generation keeps serving.
    pub async fn rebuild(&self) -> Result<RebuildSummary> {
        let _guard = self.rebuild_lock.lock().await;

        let report = load_documents(&self.settings.documents_dir).await?;

        let mut chunks = Vec::new();
        for document in &report.documents {
            let document_chunks =
                split_into_chunks(&document.content, &document.filename, self.settings.chunk_size);
            debug!("Split {} into {} chunks", document.filename, document_chunks.len());
            chunks.extend(document_chunks);
        }

        let texts: Vec<String> = chunks.iter().map(|chunk| chunk.text.clone()).collect();
        let embeddings = if texts.is_empty() {
            Vec::new()
        } else {
            self.embedder
                .embed(&texts)
                .await
                .context("Failed to embed document chunks")?
        };

        let generation = CorpusGeneration::build(chunks, embeddings, self.embedder.dimension())?;
        let summary = RebuildSummary {
            files: report.documents.len(),
            failed_files: report.failures.len(),
            chunks: generation.len(),
        };

        self.corpus.replace(generation).await;
        info!(
            "Processed {} document chunks from {} files",
            summary.chunks, summary.files
        );

        Ok(summary)
    }

    /// Answer a question from the `top_k` nearest chunks.
    ///
    /// `top_k` is expected to be positive; request validation happens before this.
    pub async fn ask(&self, question: &str, top_k: usize) -> Result<QueryResult, QueryError> {
        debug!("Received question (top_k={})", top_k);

        let query = timeout(self.settings.model_timeout, self.embedder.embed_one(question))
            .await
            .map_err(|_| QueryError::Timeout {
                stage: Stage::Embedding,
            })?
            .map_err(QueryError::Embedding)?;
        debug!("Question embedded");

        // One snapshot for the whole request
        let generation = self.corpus.snapshot().await;
        let relevant_chunks = generation
            .search(&query, top_k)?
            .into_iter()
            .map(|neighbor| {
                Ok(RetrievedChunk {
                    chunk: generation.get(neighbor.position)?.clone(),
                    distance: neighbor.distance,
                })
            })
            .collect::<Result<Vec<_>, RetrievalError>>()?;
        debug!("Retrieved {} chunks", relevant_chunks.len());

        let context = assemble_context(
            relevant_chunks.iter().map(|hit| hit.chunk.text.as_str()),
            self.settings.max_context_chars,
        );
        debug!("Assembled context of {} characters", context.chars().count());

        let answer = timeout(
            self.settings.model_timeout,
            self.answers.generate(&context, question),
        )
        .await
        .map_err(|_| QueryError::Timeout {
            stage: Stage::Generation,
        })?
        .map_err(QueryError::Generation)?;
        debug!("Answer generated");

        Ok(QueryResult {
            answer,
            relevant_chunks,
        })
    }
}
