//! Per-session in-memory vector index.
//!
//! Brute-force cosine similarity over all stored chunk vectors. A session's
//! corpus is a handful of PDFs, so no ANN structure is warranted; results are
//! sorted by descending similarity with a deterministic tie-break and
//! truncated to the requested `top_k`.

use anyhow::{bail, Result};

use crate::embedding::cosine_similarity;
use crate::models::{Chunk, RetrievedChunk};

struct IndexedChunk {
    chunk: Chunk,
    vector: Vec<f32>,
}

/// Vector index owned by a single session. Built once at upload, never
/// mutated afterwards.
pub struct VectorIndex {
    dims: usize,
    entries: Vec<IndexedChunk>,
}

impl VectorIndex {
    pub fn new(dims: usize) -> Self {
        Self {
            dims,
            entries: Vec::new(),
        }
    }

    pub fn dims(&self) -> usize {
        self.dims
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Insert a chunk with its embedding vector.
    pub fn insert(&mut self, chunk: Chunk, vector: Vec<f32>) -> Result<()> {
        if vector.len() != self.dims {
            bail!(
                "embedding dimensionality mismatch: index has {}, vector has {}",
                self.dims,
                vector.len()
            );
        }
        self.entries.push(IndexedChunk { chunk, vector });
        Ok(())
    }

    /// Top-k most similar chunks to `query` by cosine similarity.
    ///
    /// Sorted by descending score; ties break on (document, chunk_index)
    /// so results are deterministic.
    pub fn search(&self, query: &[f32], top_k: usize) -> Vec<RetrievedChunk> {
        let mut results: Vec<RetrievedChunk> = self
            .entries
            .iter()
            .map(|entry| RetrievedChunk {
                chunk_id: entry.chunk.id.clone(),
                document: entry.chunk.document.clone(),
                chunk_index: entry.chunk.chunk_index,
                score: cosine_similarity(query, &entry.vector),
                text: entry.chunk.text.clone(),
            })
            .collect();

        results.sort_by(|a, b| {
            b.score
                .partial_cmp(&a.score)
                .unwrap_or(std::cmp::Ordering::Equal)
                .then_with(|| a.document.cmp(&b.document))
                .then(a.chunk_index.cmp(&b.chunk_index))
        });
        results.truncate(top_k);
        results
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn chunk(document: &str, index: i64, text: &str) -> Chunk {
        Chunk {
            id: format!("{}-{}", document, index),
            document: document.to_string(),
            chunk_index: index,
            text: text.to_string(),
            hash: String::new(),
        }
    }

    #[test]
    fn search_ranks_by_cosine_similarity() {
        let mut index = VectorIndex::new(2);
        index.insert(chunk("a.pdf", 0, "east"), vec![1.0, 0.0]).unwrap();
        index.insert(chunk("a.pdf", 1, "north"), vec![0.0, 1.0]).unwrap();
        index
            .insert(chunk("a.pdf", 2, "northeast"), vec![1.0, 1.0])
            .unwrap();

        let results = index.search(&[1.0, 0.0], 3);
        assert_eq!(results.len(), 3);
        assert_eq!(results[0].text, "east");
        assert_eq!(results[1].text, "northeast");
        assert_eq!(results[2].text, "north");
        assert!(results[0].score > results[1].score);
    }

    #[test]
    fn search_truncates_to_top_k() {
        let mut index = VectorIndex::new(2);
        for i in 0..10 {
            index
                .insert(chunk("a.pdf", i, &format!("chunk {}", i)), vec![1.0, i as f32])
                .unwrap();
        }
        assert_eq!(index.search(&[1.0, 0.0], 4).len(), 4);
    }

    #[test]
    fn tie_break_is_deterministic() {
        let mut index = VectorIndex::new(2);
        index.insert(chunk("b.pdf", 0, "tie b"), vec![1.0, 0.0]).unwrap();
        index.insert(chunk("a.pdf", 1, "tie a1"), vec![1.0, 0.0]).unwrap();
        index.insert(chunk("a.pdf", 0, "tie a0"), vec![1.0, 0.0]).unwrap();

        let results = index.search(&[1.0, 0.0], 3);
        assert_eq!(results[0].text, "tie a0");
        assert_eq!(results[1].text, "tie a1");
        assert_eq!(results[2].text, "tie b");
    }

    #[test]
    fn insert_rejects_wrong_dims() {
        let mut index = VectorIndex::new(3);
        let err = index.insert(chunk("a.pdf", 0, "x"), vec![1.0, 0.0]).unwrap_err();
        assert!(err.to_string().contains("dimensionality mismatch"));
    }

    #[test]
    fn empty_index_returns_no_results() {
        let index = VectorIndex::new(2);
        assert!(index.search(&[1.0, 0.0], 4).is_empty());
        assert!(index.is_empty());
    }
}
