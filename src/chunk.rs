//! Character-budget text chunker with overlap.
//!
//! Splits extracted document text into [`Chunk`]s that respect a configurable
//! `chunk_size` (in characters). Splitting occurs on paragraph boundaries
//! (`\n\n`) to preserve semantic coherence; oversized paragraphs fall back to
//! newline/space boundaries and finally to a hard split. Consecutive chunks
//! share up to `chunk_overlap` trailing characters so that retrieval does not
//! lose context at chunk borders.
//!
//! Each chunk receives a UUID, the owning document's name, a contiguous index
//! starting at 0, and a SHA-256 hash of its text.

use sha2::{Digest, Sha256};
use uuid::Uuid;

use crate::models::Chunk;

/// Split text into chunks respecting `chunk_size`, with `chunk_overlap`
/// characters carried between consecutive chunks. Returns chunks with
/// contiguous indices starting at 0; empty input yields no chunks.
pub fn chunk_text(document: &str, text: &str, chunk_size: usize, chunk_overlap: usize) -> Vec<Chunk> {
    if text.trim().is_empty() {
        return Vec::new();
    }

    let mut pieces: Vec<String> = Vec::new();
    // The buffer may start seeded with overlap from the previous chunk;
    // only flush it once it has accumulated new content.
    let mut buf = String::new();
    let mut buf_has_new = false;

    for para in text.split("\n\n") {
        let trimmed = para.trim();
        if trimmed.is_empty() {
            continue;
        }

        let would_be = if buf.is_empty() {
            trimmed.len()
        } else {
            buf.len() + 2 + trimmed.len() // +2 for \n\n separator
        };

        if would_be > chunk_size && buf_has_new {
            pieces.push(buf.clone());
            buf = overlap_tail(&buf, chunk_overlap);
            buf_has_new = false;
        }

        if trimmed.len() > chunk_size {
            if buf_has_new {
                pieces.push(buf.clone());
            }
            buf.clear();
            buf_has_new = false;
            split_oversized(trimmed, chunk_size, chunk_overlap, &mut pieces);
            if let Some(last) = pieces.last() {
                buf = overlap_tail(last, chunk_overlap);
            }
        } else {
            if !buf.is_empty() && !buf_has_new && buf.len() + 2 + trimmed.len() > chunk_size {
                // Overlap seed plus this paragraph would bust the budget; drop the seed.
                buf.clear();
            }
            if !buf.is_empty() {
                buf.push_str("\n\n");
            }
            buf.push_str(trimmed);
            buf_has_new = true;
        }
    }

    if buf_has_new {
        pieces.push(buf);
    }

    pieces
        .into_iter()
        .enumerate()
        .map(|(i, text)| make_chunk(document, i as i64, &text))
        .collect()
}

/// Hard-splits a paragraph that exceeds `chunk_size`, preferring newline and
/// space boundaries, and stepping back `chunk_overlap` characters between pieces.
fn split_oversized(para: &str, chunk_size: usize, chunk_overlap: usize, pieces: &mut Vec<String>) {
    let mut remaining = para;
    while !remaining.is_empty() {
        if remaining.len() <= chunk_size {
            pieces.push(remaining.trim().to_string());
            break;
        }

        let mut limit = floor_char_boundary(remaining, chunk_size);
        if limit == 0 {
            // chunk_size is smaller than the first character; emit the whole
            // character rather than an empty piece.
            limit = ceil_char_boundary(remaining, 1);
        }
        let split_at = remaining[..limit]
            .rfind('\n')
            .or_else(|| remaining[..limit].rfind(' '))
            .map(|pos| pos + 1)
            .unwrap_or(limit);
        pieces.push(remaining[..split_at].trim().to_string());

        // Advance past the piece minus the overlap, always making progress.
        let mut advance = if split_at > chunk_overlap {
            split_at - chunk_overlap
        } else {
            split_at
        };
        advance = ceil_char_boundary(remaining, advance.max(1));
        remaining = remaining[advance..].trim_start();
    }
}

/// Trailing `overlap` characters of `text`, started at a whitespace boundary
/// where one exists so the seed begins on a whole word.
fn overlap_tail(text: &str, overlap: usize) -> String {
    if overlap == 0 || text.len() <= overlap {
        return String::new();
    }
    let start = floor_char_boundary(text, text.len() - overlap);
    let tail = &text[start..];
    match tail.find(char::is_whitespace) {
        Some(pos) => tail[pos..].trim_start().to_string(),
        None => tail.to_string(),
    }
}

fn floor_char_boundary(s: &str, mut i: usize) -> usize {
    i = i.min(s.len());
    while i > 0 && !s.is_char_boundary(i) {
        i -= 1;
    }
    i
}

fn ceil_char_boundary(s: &str, mut i: usize) -> usize {
    i = i.min(s.len());
    while i < s.len() && !s.is_char_boundary(i) {
        i += 1;
    }
    i
}

fn make_chunk(document: &str, index: i64, text: &str) -> Chunk {
    let mut hasher = Sha256::new();
    hasher.update(text.as_bytes());
    let hash = format!("{:x}", hasher.finalize());

    Chunk {
        id: Uuid::new_v4().to_string(),
        document: document.to_string(),
        chunk_index: index,
        text: text.to_string(),
        hash,
    }
}
