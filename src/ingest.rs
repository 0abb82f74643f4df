//! Ingestion pipeline.
//!
//! corpus → chunking → batched embedding → fresh vector store. Each run
//! replaces the previous store entirely, so querying never sees a mix of
//! two corpus versions.

use anyhow::{bail, Context, Result};
use chrono::Utc;

use crate::chunk::chunk_text;
use crate::config::Config;
use crate::embedding::Embedder;
use crate::knowledge;
use crate::store::VectorStore;

/// Counts reported at the end of a run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IngestStats {
    pub corpus_chars: usize,
    pub chunks_written: usize,
    pub dims: usize,
    pub model: String,
}

/// Load the configured corpus and ingest it.
pub async fn run_ingest(config: &Config, embedder: &dyn Embedder) -> Result<IngestStats> {
    let corpus = knowledge::load_corpus(config)?;
    ingest_text(config, embedder, &corpus).await
}

/// Chunk, embed and persist `corpus` into a new store at `config.store`.
pub async fn ingest_text(
    config: &Config,
    embedder: &dyn Embedder,
    corpus: &str,
) -> Result<IngestStats> {
    let chunks = chunk_text(
        corpus,
        config.chunking.chunk_chars,
        config.chunking.overlap_chars,
    );
    tracing::info!(
        chunks = chunks.len(),
        chunk_chars = config.chunking.chunk_chars,
        overlap = config.chunking.overlap_chars,
        "chunked corpus"
    );

    let mut vectors: Vec<Vec<f32>> = Vec::with_capacity(chunks.len());
    let batch_size = config.embedding.batch_size.max(1);
    for batch in chunks.chunks(batch_size) {
        let texts: Vec<String> = batch.iter().map(|c| c.text.clone()).collect();
        let embedded = embedder
            .embed_batch(&texts)
            .await
            .with_context(|| format!("Embedding failed with model {}", embedder.model_name()))?;
        if embedded.len() != texts.len() {
            bail!(
                "Embedder returned {} vectors for {} chunks",
                embedded.len(),
                texts.len()
            );
        }
        vectors.extend(embedded);
        tracing::debug!(done = vectors.len(), total = chunks.len(), "embedded batch");
    }

    let dims = vectors.first().map(|v| v.len()).unwrap_or(0);
    if let Some(bad) = vectors.iter().position(|v| v.len() != dims) {
        bail!(
            "Embedding dimension mismatch at chunk {}: expected {}, got {}",
            bad,
            dims,
            vectors[bad].len()
        );
    }
    if let Some(expected) = config.embedding.dims {
        if !vectors.is_empty() && dims != expected {
            bail!(
                "Embedder {} produced {}-dimensional vectors but [embedding] dims = {}",
                embedder.model_name(),
                dims,
                expected
            );
        }
    }

    // Everything is embedded before the old store is touched.
    let store = VectorStore::create(&config.store).await?;
    store.upsert_all(&chunks, &vectors).await?;
    store.set_meta("model", embedder.model_name()).await?;
    store.set_meta("dims", &dims.to_string()).await?;
    store
        .set_meta("ingested_at", &Utc::now().to_rfc3339())
        .await?;
    store.close().await;

    Ok(IngestStats {
        corpus_chars: corpus.chars().count(),
        chunks_written: chunks.len(),
        dims,
        model: embedder.model_name().to_string(),
    })
}

/// CLI summary.
pub fn print_stats(config: &Config, stats: &IngestStats) {
    println!("ingest {}", config.store.path().display());
    println!("  corpus chars: {}", stats.corpus_chars);
    println!("  chunks written: {}", stats.chunks_written);
    println!("  embedding model: {} ({} dims)", stats.model, stats.dims);
    println!("ok");
}
