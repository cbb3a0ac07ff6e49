//! Query service: embed the question, retrieve, prompt, answer.
//!
//! One configurable service replaces the pile of near-identical answer
//! scripts this pipeline tends to grow: the prompt template, retrieved
//! field handling, delimiter, refusal message, and top-k are all
//! configuration.

use std::sync::Arc;

use tracing::{debug, info};

use crate::completions::CompletionProvider;
use crate::embeddings::EmbeddingProvider;
use crate::stores::{QueryMatch, VectorIndex};
use crate::types::RagError;

/// Instruction template filled with `{context}` and `{question}`.
pub const DEFAULT_PROMPT_TEMPLATE: &str = r#"
You are an expert Minecraft assistant. Your sole purpose is to answer a user's question about the game clearly and accurately.

You will be given a user's QUESTION and a CONTEXT of retrieved Minecraft Wiki articles. You must adhere to the following rules:

**RULES:**
1.  **Answer the QUESTION using ONLY the information found in the provided CONTEXT.** Do not use any of your internal knowledge or information from your training data. All parts of your answer must be directly supported by the text in the CONTEXT.
2.  **Synthesize the information** from the CONTEXT into a single, coherent, and easy-to-understand answer. Do not just copy and paste sentences from the articles.
3.  **If the CONTEXT does not contain the information** needed to answer the QUESTION, you must respond with: "I'm sorry, but the provided articles don't have the information needed to answer that question."
4.  **Be direct and concise.** Get straight to the point and avoid unnecessary fluff.
5.  **Use a friendly and helpful tone,** as if you were another Minecraft player.
6.  **Use markdown formatting** (like bullet points, numbered lists, or bolding key terms) to improve readability, especially for crafting recipes, steps, or lists of items.
7.  **Your primary context is Java Edition Survival Mode. Filter all information to ensure it is only relevant to this context. Do not mention Bedrock Edition, Creative Mode, or other variants unless the user's question explicitly asks about them.

---

**CONTEXT:**
{context}

---

**QUESTION:**
{question}

---

**ANSWER:**
"#;

/// Returned when retrieval comes back empty, and demanded of the model when
/// the retrieved context cannot support an answer.
pub const DEFAULT_REFUSAL: &str =
    "I'm sorry, but the provided articles don't have the information needed to answer that question.";

#[derive(Clone, Debug)]
pub struct QueryConfig {
    pub namespace: String,
    pub top_k: usize,
    /// Separator between retrieved passages in the context block.
    pub context_delimiter: String,
    /// Prefix each passage with its article title.
    pub include_titles: bool,
    pub prompt_template: String,
    pub refusal_message: String,
}

impl Default for QueryConfig {
    fn default() -> Self {
        Self {
            namespace: "__default__".to_string(),
            top_k: 5,
            context_delimiter: "\n---\n".to_string(),
            include_titles: false,
            prompt_template: DEFAULT_PROMPT_TEMPLATE.to_string(),
            refusal_message: DEFAULT_REFUSAL.to_string(),
        }
    }
}

pub struct QueryService {
    embedder: Arc<dyn EmbeddingProvider>,
    index: Arc<dyn VectorIndex>,
    completions: Arc<dyn CompletionProvider>,
    config: QueryConfig,
}

impl QueryService {
    pub fn new(
        embedder: Arc<dyn EmbeddingProvider>,
        index: Arc<dyn VectorIndex>,
        completions: Arc<dyn CompletionProvider>,
        config: QueryConfig,
    ) -> Self {
        Self {
            embedder,
            index,
            completions,
            config,
        }
    }

    /// Answers a question grounded in retrieved context. An embedding or
    /// retrieval failure is a hard error; an empty retrieval short-circuits
    /// to the refusal message without a model call.
    pub async fn answer(&self, question: &str) -> Result<String, RagError> {
        let vector = self.embedder.embed(question).await?;
        debug!(dims = vector.len(), "question embedded");

        let matches = self
            .index
            .query(&self.config.namespace, &vector, self.config.top_k)
            .await?;
        info!(matches = matches.len(), "retrieved context candidates");

        if matches.is_empty() {
            return Ok(self.config.refusal_message.clone());
        }

        let context = self.build_context(&matches);
        let prompt = self.render_prompt(&context, question);
        self.completions.complete(&prompt).await
    }

    fn build_context(&self, matches: &[QueryMatch]) -> String {
        let passages: Vec<String> = matches
            .iter()
            .filter_map(|hit| hit.metadata.as_ref())
            .map(|meta| {
                if self.config.include_titles {
                    format!("{}\n{}", meta.title, meta.text)
                } else {
                    meta.text.clone()
                }
            })
            .collect();
        passages.join(&self.config.context_delimiter)
    }

    fn render_prompt(&self, context: &str, question: &str) -> String {
        self.config
            .prompt_template
            .replace("{context}", context)
            .replace("{question}", question)
    }
}
