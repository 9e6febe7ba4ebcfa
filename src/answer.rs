use anyhow::Result;
use async_trait::async_trait;
use std::sync::Arc;

/// Text-generation capability: prompt in, completion out.
///
/// Backends cap their output length and may silently truncate overlong
/// prompts; callers should expect that rather than treat it as an error.
#[async_trait]
pub trait Generator: Send + Sync {
    async fn generate(&self, prompt: &str) -> Result<String>;
}

/// Formats the RAG prompt and delegates to a [`Generator`]
#[derive(Clone)]
pub struct AnswerGenerator {
    generator: Arc<dyn Generator>,
}

impl AnswerGenerator {
    pub fn new(generator: Arc<dyn Generator>) -> Self {
        AnswerGenerator { generator }
    }

    /// Generate an answer to `question` grounded in `context`. No retries.
    pub async fn generate(&self, context: &str, question: &str) -> Result<String> {
        let prompt = build_prompt(context, question);
        self.generator.generate(&prompt).await
    }
}

/// Prompt handed to the generation model for every question
pub fn build_prompt(context: &str, question: &str) -> String {
    format!("Context: {}\n\nQuestion: {}\nAnswer:", context, question)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    struct RecordingGenerator {
        prompts: Mutex<Vec<String>>,
    }

    #[async_trait]
    impl Generator for RecordingGenerator {
        async fn generate(&self, prompt: &str) -> Result<String> {
            self.prompts.lock().unwrap().push(prompt.to_string());
            Ok("blue".to_string())
        }
    }

    #[test]
    fn test_build_prompt() {
        let prompt = build_prompt("The sky is blue.\n\n", "What color is the sky?");
        assert_eq!(
            prompt,
            "Context: The sky is blue.\n\n\n\nQuestion: What color is the sky?\nAnswer:"
        );
    }

    #[test]
    fn test_build_prompt_does_not_expand_placeholders_in_context() {
        let prompt = build_prompt("literal {question} here", "Q?");
        assert_eq!(prompt, "Context: literal {question} here\n\nQuestion: Q?\nAnswer:");
    }

    #[tokio::test]
    async fn test_generate_sends_formatted_prompt() {
        let recorder = Arc::new(RecordingGenerator {
            prompts: Mutex::new(Vec::new()),
        });
        let answers = AnswerGenerator::new(recorder.clone());

        let answer = answers.generate("ctx", "why?").await.unwrap();

        assert_eq!(answer, "blue");
        assert_eq!(
            *recorder.prompts.lock().unwrap(),
            vec!["Context: ctx\n\nQuestion: why?\nAnswer:".to_string()]
        );
    }
}
