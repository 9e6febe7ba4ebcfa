use crate::answer::Generator;
use crate::embeddings::{Embedder, Embedding, DEFAULT_EMBEDDING_DIMENSION};
use anyhow::{Context, Result};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::env;

const DEFAULT_EMBEDDINGS_URL: &str =
    "https://generativelanguage.googleapis.com/v1beta/models/text-embedding-004:embedContent";
const DEFAULT_GENERATE_URL: &str =
    "https://generativelanguage.googleapis.com/v1beta/models/gemini-2.0-flash-lite:generateContent";
const EMBEDDING_MODEL: &str = "models/text-embedding-004";
const DEFAULT_MAX_OUTPUT_TOKENS: u32 = 200;

/// Configuration for Gemini API
#[derive(Clone, Debug)]
pub struct GeminiConfig {
    pub api_key: String,
    pub embeddings_url: String,
    pub generate_url: String,
    /// Requested embedding size; the vector index is built with the same value
    pub embedding_dimension: usize,
    /// Output length cap for generated answers
    pub max_output_tokens: u32,
}

impl GeminiConfig {
    /// Configuration with the public endpoints and reference model limits
    pub fn new(api_key: impl Into<String>) -> Self {
        GeminiConfig {
            api_key: api_key.into(),
            embeddings_url: DEFAULT_EMBEDDINGS_URL.to_string(),
            generate_url: DEFAULT_GENERATE_URL.to_string(),
            embedding_dimension: DEFAULT_EMBEDDING_DIMENSION,
            max_output_tokens: DEFAULT_MAX_OUTPUT_TOKENS,
        }
    }

    /// Create a new configuration from environment variables
    pub fn from_env() -> Result<Self> {
        let api_key = env::var("GEMINI_API_KEY").context("GEMINI_API_KEY not set")?;
        let mut config = GeminiConfig::new(api_key);

        if let Ok(url) = env::var("GEMINI_EMBEDDINGS_URL") {
            config.embeddings_url = url;
        }
        if let Ok(url) = env::var("GEMINI_GENERATE_URL") {
            config.generate_url = url;
        }
        if let Ok(value) = env::var("EMBEDDING_DIMENSION") {
            config.embedding_dimension = value
                .parse()
                .with_context(|| format!("Invalid EMBEDDING_DIMENSION: {}", value))?;
        }
        if let Ok(value) = env::var("MAX_OUTPUT_TOKENS") {
            config.max_output_tokens = value
                .parse()
                .with_context(|| format!("Invalid MAX_OUTPUT_TOKENS: {}", value))?;
        }

        Ok(config)
    }
}

/// Client for interacting with Gemini API
#[derive(Clone)]
pub struct GeminiClient {
    config: GeminiConfig,
    client: reqwest::Client,
}

impl GeminiClient {
    /// Create a new Gemini client
    pub fn new(config: GeminiConfig) -> Self {
        let client = reqwest::Client::new();
        GeminiClient { config, client }
    }

    /// Get the client configuration
    pub fn config(&self) -> &GeminiConfig {
        &self.config
    }

    /// Generate embeddings for a text
    pub async fn get_embedding(&self, text: &str) -> Result<Embedding> {
        let request = EmbeddingRequest {
            model: EMBEDDING_MODEL,
            content: EmbeddingContent {
                parts: vec![Part { text }],
            },
            output_dimensionality: self.config.embedding_dimension,
        };

        let response = self
            .client
            .post(&self.config.embeddings_url)
            .query(&[("key", &self.config.api_key)])
            .json(&request)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            return Err(anyhow::anyhow!(
                "Embedding request failed: {} {}",
                status,
                error_text
            ));
        }

        let response_data: EmbeddingResponse = response.json().await?;
        let values = response_data.embedding.values;

        if values.len() != self.config.embedding_dimension {
            return Err(anyhow::anyhow!(
                "Embedding has {} dimensions, expected {}",
                values.len(),
                self.config.embedding_dimension
            ));
        }

        Ok(values)
    }

    /// Generate text from a prompt
    pub async fn generate_text(&self, prompt: &str) -> Result<String> {
        let request = GenerateRequest {
            contents: vec![Content::new_with_role(prompt, "user")],
            generation_config: GenerationConfig {
                temperature: 0.2,
                top_p: 0.8,
                top_k: 40,
                max_output_tokens: self.config.max_output_tokens,
            },
        };

        let response = self
            .client
            .post(&self.config.generate_url)
            .query(&[("key", &self.config.api_key)])
            .json(&request)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            return Err(anyhow::anyhow!(
                "Generation request failed: {} {}",
                status,
                error_text
            ));
        }

        let response_data: GenerateResponse = response.json().await?;

        response_data
            .candidates
            .into_iter()
            .next()
            .and_then(|c| c.content.parts.into_iter().next())
            .map(|p| p.text)
            .ok_or_else(|| anyhow::anyhow!("No response generated"))
    }
}

#[async_trait]
impl Embedder for GeminiClient {
    fn dimension(&self) -> usize {
        self.config.embedding_dimension
    }

    async fn embed(&self, texts: &[String]) -> Result<Vec<Embedding>> {
        let mut embeddings = Vec::with_capacity(texts.len());

        for text in texts {
            embeddings.push(self.get_embedding(text).await?);
        }

        Ok(embeddings)
    }

    async fn embed_one(&self, text: &str) -> Result<Embedding> {
        self.get_embedding(text).await
    }
}

#[async_trait]
impl Generator for GeminiClient {
    async fn generate(&self, prompt: &str) -> Result<String> {
        self.generate_text(prompt).await
    }
}

#[derive(Serialize)]
struct EmbeddingRequest<'a> {
    model: &'static str,
    content: EmbeddingContent<'a>,
    output_dimensionality: usize,
}

#[derive(Serialize)]
struct EmbeddingContent<'a> {
    parts: Vec<Part<'a>>,
}

#[derive(Deserialize, Debug)]
struct EmbeddingResponse {
    embedding: EmbeddingData,
}

#[derive(Deserialize, Debug)]
struct EmbeddingData {
    values: Vec<f32>,
}

#[derive(Serialize)]
struct GenerateRequest<'a> {
    contents: Vec<Content<'a>>,
    generation_config: GenerationConfig,
}

#[derive(Serialize)]
struct Content<'a> {
    parts: Vec<Part<'a>>,
    role: &'static str,
}

impl<'a> Content<'a> {
    fn new_with_role(text: &'a str, role: &'static str) -> Self {
        Content {
            parts: vec![Part { text }],
            role,
        }
    }
}

#[derive(Serialize)]
struct Part<'a> {
    text: &'a str,
}

#[derive(Serialize)]
struct GenerationConfig {
    temperature: f32,
    top_p: f32,
    top_k: i32,
    max_output_tokens: u32,
}

#[derive(Deserialize, Debug)]
struct GenerateResponse {
    candidates: Vec<Candidate>,
}

#[derive(Deserialize, Debug)]
struct Candidate {
    content: ResponseContent,
}

#[derive(Deserialize, Debug)]
struct ResponseContent {
    parts: Vec<ResponsePart>,
}

#[derive(Deserialize, Debug)]
struct ResponsePart {
    text: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_default_config_matches_reference_models() {
        let config = GeminiConfig::new("key");
        assert_eq!(config.embedding_dimension, 384);
        assert_eq!(config.max_output_tokens, 200);
        assert!(config.embeddings_url.ends_with(":embedContent"));
    }

    #[test]
    fn test_embedding_request_shape() {
        let request = EmbeddingRequest {
            model: EMBEDDING_MODEL,
            content: EmbeddingContent {
                parts: vec![Part { text: "hello" }],
            },
            output_dimensionality: 384,
        };

        assert_eq!(
            serde_json::to_value(&request).unwrap(),
            json!({
                "model": "models/text-embedding-004",
                "content": { "parts": [{ "text": "hello" }] },
                "output_dimensionality": 384
            })
        );
    }

    #[test]
    fn test_generate_request_shape() {
        let request = GenerateRequest {
            contents: vec![Content::new_with_role("prompt", "user")],
            generation_config: GenerationConfig {
                temperature: 0.5,
                top_p: 0.5,
                top_k: 40,
                max_output_tokens: 200,
            },
        };

        let value = serde_json::to_value(&request).unwrap();
        assert_eq!(value["contents"][0]["role"], "user");
        assert_eq!(value["contents"][0]["parts"][0]["text"], "prompt");
        assert_eq!(value["generation_config"]["max_output_tokens"], 200);
    }

    #[test]
    fn test_generate_response_parsing() {
        let body = json!({
            "candidates": [
                { "content": { "parts": [{ "text": "The sky is blue." }] } }
            ]
        });

        let parsed: GenerateResponse = serde_json::from_value(body).unwrap();
        assert_eq!(parsed.candidates[0].content.parts[0].text, "The sky is blue.");
    }
}
