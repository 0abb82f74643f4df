//! Offline stand-ins for the chat model and the embedder.

#![allow(dead_code)]

use async_trait::async_trait;
use std::path::Path;
use std::sync::Arc;

use campus_assist::answer::{AnswerGenerator, Assistant, FALLBACK_ANSWER};
use campus_assist::config::{Config, StoreConfig};
use campus_assist::embedding::Embedder;
use campus_assist::error::{AssistError, AssistResult};
use campus_assist::llm::{ChatMessage, ChatModel, GenerateParams};
use campus_assist::retrieve::Retriever;

const STOPWORDS: &[&str] = &[
    "what", "which", "where", "when", "does", "have", "about", "that", "this", "there", "with",
    "tell", "give", "college",
];

fn keywords(question: &str) -> Vec<String> {
    question
        .split(|c: char| !c.is_alphanumeric())
        .map(|w| w.to_lowercase())
        .filter(|w| w.len() >= 4 && !STOPWORDS.contains(&w.as_str()))
        .collect()
}

/// Answers extractively: returns the context lines sharing a keyword with
/// the question, or the fallback sentence when none do.
pub struct KeywordModel;

#[async_trait]
impl ChatModel for KeywordModel {
    fn model_name(&self) -> &str {
        "keyword-stub"
    }

    async fn complete(
        &self,
        messages: &[ChatMessage],
        _params: &GenerateParams,
    ) -> AssistResult<String> {
        let user = messages.last().map(|m| m.content.as_str()).unwrap_or("");
        let Some((context, question)) = user
            .strip_prefix("Context:\n")
            .and_then(|rest| rest.rsplit_once("\n\nQuestion: "))
        else {
            return Ok(format!("Plan for: {}", user));
        };

        let keys = keywords(question);
        let hits: Vec<&str> = context
            .lines()
            .filter(|line| {
                let line = line.to_lowercase();
                keys.iter().any(|k| line.contains(k.as_str()))
            })
            .collect();

        if hits.is_empty() {
            Ok(FALLBACK_ANSWER.to_string())
        } else {
            Ok(hits.join("\n"))
        }
    }
}

/// Every call fails as an upstream error.
pub struct FailingModel;

#[async_trait]
impl ChatModel for FailingModel {
    fn model_name(&self) -> &str {
        "failing-stub"
    }

    async fn complete(
        &self,
        _messages: &[ChatMessage],
        _params: &GenerateParams,
    ) -> AssistResult<String> {
        Err(AssistError::transport("HTTP 429 Too Many Requests"))
    }
}

/// Bag-of-words hashing embedder; texts sharing words get similar vectors.
pub struct HashEmbedder {
    pub dims: usize,
}

impl HashEmbedder {
    pub fn vector(&self, text: &str) -> Vec<f32> {
        let mut v = vec![0.0f32; self.dims];
        for word in text
            .split(|c: char| !c.is_alphanumeric())
            .filter(|w| !w.is_empty())
        {
            let h = word
                .to_lowercase()
                .bytes()
                .fold(2166136261u32, |h, b| (h ^ b as u32).wrapping_mul(16777619));
            v[h as usize % self.dims] += 1.0;
        }
        v
    }
}

#[async_trait]
impl Embedder for HashEmbedder {
    fn model_name(&self) -> &str {
        "hash-stub"
    }

    async fn embed_batch(&self, texts: &[String]) -> AssistResult<Vec<Vec<f32>>> {
        Ok(texts.iter().map(|t| self.vector(t)).collect())
    }
}

pub fn params() -> GenerateParams {
    GenerateParams {
        max_tokens: 450,
        temperature: 0.12,
    }
}

pub fn static_assistant(context: &str, model: Arc<dyn ChatModel>) -> Assistant {
    Assistant::new(
        Retriever::fixed(context),
        AnswerGenerator::new(model, params()),
    )
}

/// Config whose store lives under `root`.
pub fn test_config(root: &Path) -> Config {
    let mut cfg = Config::minimal();
    cfg.store = StoreConfig {
        dir: root.join("data"),
        name: "college_db".to_string(),
    };
    cfg.chunking.chunk_chars = 120;
    cfg.chunking.overlap_chars = 20;
    cfg
}
