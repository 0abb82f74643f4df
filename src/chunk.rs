//! Fixed-size, overlapping character chunker.
//!
//! Splits corpus text into [`KnowledgeChunk`]s of at most `chunk_chars`
//! characters, each starting `overlap_chars` before the end of the previous
//! one. Where possible a window ends on whitespace so words are not cut in
//! half; a window is never shortened below half its nominal size.
//!
//! Lengths and offsets are counted in `char`s, not bytes, so multi-byte
//! text is never split inside a code point.

use sha2::{Digest, Sha256};

use crate::models::KnowledgeChunk;

/// Split `text` into overlapping windows.
///
/// Returns chunks with contiguous indices starting at 0. Whitespace-only
/// input yields no chunks.
///
/// # Panics
///
/// Panics if `chunk_chars == 0` or `overlap_chars >= chunk_chars`;
/// [`config::validate`](crate::config::validate) rejects both.
pub fn chunk_text(text: &str, chunk_chars: usize, overlap_chars: usize) -> Vec<KnowledgeChunk> {
    assert!(chunk_chars > 0, "chunk_chars must be > 0");
    assert!(overlap_chars < chunk_chars, "overlap must be smaller than chunk");

    let chars: Vec<char> = text.chars().collect();
    let n = chars.len();
    let mut chunks = Vec::new();
    let mut start = 0usize;

    while start < n {
        let mut end = (start + chunk_chars).min(n);

        // Prefer to break on whitespace, but keep the window at least half
        // full and always past the overlap so the next start moves forward.
        if end < n {
            let floor = (start + chunk_chars / 2).max(start + overlap_chars + 1);
            if let Some(pos) = (floor..end).rev().find(|&i| chars[i].is_whitespace()) {
                end = pos + 1;
            }
        }

        let window = &chars[start..end];
        let leading = window.iter().take_while(|c| c.is_whitespace()).count();
        let piece: String = window[leading..].iter().collect();
        let piece = piece.trim_end();
        if !piece.is_empty() {
            chunks.push(make_chunk(
                chunks.len() as i64,
                (start + leading) as i64,
                piece,
            ));
        }

        if end == n {
            break;
        }
        start = end - overlap_chars;
    }

    chunks
}

fn make_chunk(index: i64, source_offset: i64, text: &str) -> KnowledgeChunk {
    let mut hasher = Sha256::new();
    hasher.update(text.as_bytes());
    let hash = format!("{:x}", hasher.finalize());

    KnowledgeChunk {
        index,
        source_offset,
        text: text.to_string(),
        hash,
    }
}
