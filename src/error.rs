use thiserror::Error;

/// The index and corpus could not produce hits for a query
#[derive(Debug, Error)]
pub enum RetrievalError {
    #[error("the document corpus is empty")]
    EmptyCorpus,

    #[error("index position {position} is out of range for a corpus of {len} chunks")]
    PositionOutOfRange { position: usize, len: usize },

    #[error("query vector has {actual} dimensions, index expects {expected}")]
    DimensionMismatch { expected: usize, actual: usize },
}

/// Which external call ran out of time
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Embedding,
    Generation,
}

impl std::fmt::Display for Stage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Stage::Embedding => write!(f, "embedding"),
            Stage::Generation => write!(f, "generation"),
        }
    }
}

/// Failure of a single question, tagged with the stage that failed
#[derive(Debug, Error)]
pub enum QueryError {
    #[error("embedding failed: {0:#}")]
    Embedding(#[source] anyhow::Error),

    #[error("retrieval failed: {0}")]
    Retrieval(#[from] RetrievalError),

    #[error("generation failed: {0:#}")]
    Generation(#[source] anyhow::Error),

    #[error("{stage} timed out")]
    Timeout { stage: Stage },
}

impl QueryError {
    /// Stable machine-readable name of the error kind
    pub fn kind(&self) -> &'static str {
        match self {
            QueryError::Embedding(_) => "embedding_error",
            QueryError::Retrieval(_) => "retrieval_error",
            QueryError::Generation(_) => "generation_error",
            QueryError::Timeout { .. } => "timeout",
        }
    }
}
