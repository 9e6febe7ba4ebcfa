use serde::Serialize;

/// Default window size in characters
pub const DEFAULT_CHUNK_SIZE: usize = 500;

/// Provenance of a chunk within the corpus
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ChunkMetadata {
    /// File name (without directory) of the source document
    pub filename: String,
    /// 0-based position of this chunk within its source document
    pub chunk_id: usize,
}

/// Represents a text chunk with metadata
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Chunk {
    /// The actual text content of this chunk
    pub text: String,
    pub metadata: ChunkMetadata,
}

/// Split text into non-overlapping windows of `chunk_size` characters.
///
/// Windows ignore sentence and word boundaries; only the last one may be
/// shorter. Empty text yields no chunks. A `chunk_size` of zero is treated as 1.
pub fn split_into_chunks(text: &str, filename: &str, chunk_size: usize) -> Vec<Chunk> {
    let chunk_size = chunk_size.max(1);

    let mut chunks = Vec::new();
    let mut start = 0;
    let mut chars_in_window = 0;

    for (offset, _) in text.char_indices() {
        if chars_in_window == chunk_size {
            chunks.push(make_chunk(&text[start..offset], filename, chunks.len()));
            start = offset;
            chars_in_window = 0;
        }
        chars_in_window += 1;
    }

    if start < text.len() {
        chunks.push(make_chunk(&text[start..], filename, chunks.len()));
    }

    chunks
}

fn make_chunk(text: &str, filename: &str, chunk_id: usize) -> Chunk {
    Chunk {
        text: text.to_string(),
        metadata: ChunkMetadata {
            filename: filename.to_string(),
            chunk_id,
        },
    }
}
