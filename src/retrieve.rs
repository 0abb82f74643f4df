//! Context retrieval for a question.
//!
//! Two modes, chosen by `[retrieval] mode`:
//!
//! - **static**: the whole fixed corpus is the context for every question.
//! - **indexed**: the question is embedded and the `top_k` nearest chunks in
//!   the vector store are joined with blank lines, best match first.

use anyhow::Result;
use std::sync::Arc;

use crate::config::{Config, RetrievalMode, StoreConfig};
use crate::embedding::{create_embedder, Embedder};
use crate::error::{AssistError, AssistResult};
use crate::knowledge;
use crate::store::{ScoredChunk, VectorStore};

/// Context handed to the answer generator.
#[derive(Debug, Clone, Default)]
pub struct RetrievedContext {
    pub text: String,
    /// Matched chunks in indexed mode; empty in static mode.
    pub chunks: Vec<ScoredChunk>,
}

pub enum Retriever {
    Static {
        context: String,
    },
    Indexed {
        store: StoreConfig,
        embedder: Arc<dyn Embedder>,
        top_k: usize,
        allow_empty: bool,
    },
}

impl Retriever {
    /// Build the retriever selected by `config`.
    ///
    /// In indexed mode the store is opened per query, so a missing store is
    /// reported when asking rather than at startup.
    pub fn from_config(config: &Config) -> Result<Self> {
        match config.retrieval.mode {
            RetrievalMode::Static => Ok(Self::fixed(knowledge::load_corpus(config)?)),
            RetrievalMode::Indexed => Ok(Self::indexed(
                config.store.clone(),
                create_embedder(&config.embedding)?,
                config.retrieval.top_k,
                config.retrieval.allow_empty,
            )),
        }
    }

    pub fn fixed(context: impl Into<String>) -> Self {
        Self::Static {
            context: context.into(),
        }
    }

    pub fn indexed(
        store: StoreConfig,
        embedder: Arc<dyn Embedder>,
        top_k: usize,
        allow_empty: bool,
    ) -> Self {
        Self::Indexed {
            store,
            embedder,
            top_k,
            allow_empty,
        }
    }

    pub fn mode(&self) -> RetrievalMode {
        match self {
            Self::Static { .. } => RetrievalMode::Static,
            Self::Indexed { .. } => RetrievalMode::Indexed,
        }
    }

    /// Context for `query`.
    ///
    /// # Errors
    ///
    /// - [`AssistError::InvalidInput`] for an empty query.
    /// - [`AssistError::StoreNotFound`] when the store is missing, unreadable,
    ///   empty (unless `allow_empty`), or was built with vectors of a different
    ///   width than the query embedder produces.
    /// - [`AssistError::TransportFailure`] when embedding the query fails.
    pub async fn retrieve(&self, query: &str) -> AssistResult<RetrievedContext> {
        let query = query.trim();
        if query.is_empty() {
            return Err(AssistError::invalid("question is empty"));
        }

        match self {
            Self::Static { context } => Ok(RetrievedContext {
                text: context.clone(),
                chunks: Vec::new(),
            }),
            Self::Indexed {
                store,
                embedder,
                top_k,
                allow_empty,
            } => {
                let db = VectorStore::open(store).await?;
                let result = search(&db, embedder.as_ref(), query, *top_k, *allow_empty).await;
                db.close().await;
                result
            }
        }
    }
}

async fn search(
    db: &VectorStore,
    embedder: &dyn Embedder,
    query: &str,
    top_k: usize,
    allow_empty: bool,
) -> AssistResult<RetrievedContext> {
    let unreadable = |e: anyhow::Error| {
        AssistError::StoreNotFound(format!("{}: {}", db.path().display(), e))
    };

    let count = db.count().await.map_err(unreadable)?;
    if count == 0 {
        if allow_empty {
            return Ok(RetrievedContext::default());
        }
        return Err(AssistError::StoreNotFound(format!(
            "{} contains no chunks",
            db.path().display()
        )));
    }

    let query_vec = embedder.embed(query).await?;
    let stored_dims = db.dims().await.map_err(unreadable)?;
    if let Some(dims) = stored_dims {
        if dims != query_vec.len() {
            let model = db.get_meta("model").await.map_err(unreadable)?;
            return Err(AssistError::StoreNotFound(format!(
                "{} holds {}-dimensional vectors from {} but {} produces {}",
                db.path().display(),
                dims,
                model.as_deref().unwrap_or("an unknown model"),
                embedder.model_name(),
                query_vec.len()
            )));
        }
    }
    let chunks = db.nearest_k(&query_vec, top_k).await.map_err(unreadable)?;
    tracing::debug!(
        query,
        hits = chunks.len(),
        best = chunks.first().map(|c| c.score).unwrap_or(0.0),
        "retrieved chunks"
    );

    let text = chunks
        .iter()
        .map(|c| c.chunk.text.as_str())
        .collect::<Vec<_>>()
        .join("\n\n");

    Ok(RetrievedContext { text, chunks })
}
