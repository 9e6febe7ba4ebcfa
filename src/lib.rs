pub mod answer;
pub mod chunking;
pub mod context;
pub mod corpus;
pub mod document;
pub mod embeddings;
pub mod error;
pub mod gemini;
pub mod index;
pub mod rag;
pub mod server;
