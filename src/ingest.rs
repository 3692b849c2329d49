//! Upload pipeline orchestration.
//!
//! Coordinates the full upload flow: PDF extraction → chunking → embedding →
//! session index construction. A failed extraction or embedding fails the
//! whole upload; no partial session is created.

use anyhow::{bail, Context, Result};
use chrono::{DateTime, Utc};

use crate::chunk::chunk_text;
use crate::config::Config;
use crate::embedding::Embedder;
use crate::extract;
use crate::index::VectorIndex;
use crate::session::SessionStore;

/// Result of a successful upload.
#[derive(Debug)]
pub struct UploadOutcome {
    pub session_id: String,
    /// Number of uploaded files.
    pub documents: usize,
    /// Number of chunks indexed across all files.
    pub chunks: usize,
    /// When the session was created.
    pub created_at: DateTime<Utc>,
}

/// Build a new session from uploaded PDF files (name, bytes pairs).
pub async fn create_session(
    config: &Config,
    embedder: &dyn Embedder,
    sessions: &SessionStore,
    files: &[(String, Vec<u8>)],
) -> Result<UploadOutcome> {
    if files.is_empty() {
        bail!("upload at least one PDF");
    }

    let mut chunks = Vec::new();
    for (name, bytes) in files {
        let text = extract::extract_text(bytes)
            .with_context(|| format!("failed to extract text from {}", name))?;
        chunks.extend(chunk_text(
            name,
            &text,
            config.chunking.chunk_size,
            config.chunking.chunk_overlap,
        ));
    }

    if chunks.is_empty() {
        bail!("uploaded PDFs contained no readable text");
    }

    let texts: Vec<String> = chunks.iter().map(|c| c.text.clone()).collect();
    let vectors = embedder.embed(&texts).await?;
    if vectors.len() != chunks.len() {
        bail!(
            "embedding count mismatch: {} chunks, {} vectors",
            chunks.len(),
            vectors.len()
        );
    }

    let mut index = VectorIndex::new(embedder.dims());
    let chunk_count = chunks.len();
    for (chunk, vector) in chunks.into_iter().zip(vectors) {
        index.insert(chunk, vector)?;
    }

    let session_id = sessions.create(index);
    let created_at = sessions.created_at(&session_id)?;

    Ok(UploadOutcome {
        session_id,
        documents: files.len(),
        chunks: chunk_count,
        created_at,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{ChunkingConfig, Config, EmbeddingConfig, RetrievalConfig, ServerConfig};
    use crate::embedding::Embedder;
    use anyhow::Result;
    use async_trait::async_trait;

    /// Deterministic stand-in embedder: buckets byte values into a small
    /// fixed-dimensional vector.
    struct FakeEmbedder;

    #[async_trait]
    impl Embedder for FakeEmbedder {
        fn model_name(&self) -> &str {
            "fake"
        }
        fn dims(&self) -> usize {
            4
        }
        async fn embed(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
            Ok(texts
                .iter()
                .map(|t| {
                    let mut v = vec![0.0f32; 4];
                    for b in t.bytes() {
                        v[(b % 4) as usize] += 1.0;
                    }
                    v
                })
                .collect())
        }
    }

    fn test_config() -> Config {
        Config {
            server: ServerConfig {
                bind: "127.0.0.1:0".to_string(),
                allowed_origins: vec![],
            },
            chunking: ChunkingConfig {
                chunk_size: 2000,
                chunk_overlap: 200,
            },
            retrieval: RetrievalConfig::default(),
            embedding: EmbeddingConfig {
                provider: "ollama".to_string(),
                model: "fake".to_string(),
                dims: 4,
                url: None,
                batch_size: 64,
                max_retries: 0,
                timeout_secs: 1,
            },
            llm: Default::default(),
        }
    }

    #[tokio::test]
    async fn upload_creates_a_resolvable_session() {
        let config = test_config();
        let sessions = SessionStore::new();
        let pdf = crate::test_pdf::pdf_with_text("The warehouse ships on Tuesdays.");

        let outcome = create_session(&config, &FakeEmbedder, &sessions, &[("a.pdf".to_string(), pdf)])
            .await
            .unwrap();

        assert_eq!(outcome.documents, 1);
        assert!(outcome.chunks >= 1);
        assert!(outcome.created_at <= chrono::Utc::now());
        assert!(sessions.history(&outcome.session_id).unwrap().is_empty());
        let hits = sessions
            .search(&outcome.session_id, &[1.0, 1.0, 1.0, 1.0], 4)
            .unwrap();
        assert!(!hits.is_empty());
    }

    #[tokio::test]
    async fn empty_upload_is_rejected() {
        let config = test_config();
        let sessions = SessionStore::new();
        let err = create_session(&config, &FakeEmbedder, &sessions, &[])
            .await
            .unwrap_err();
        assert!(err.to_string().contains("at least one PDF"));
    }

    #[tokio::test]
    async fn non_pdf_bytes_fail_the_upload() {
        let config = test_config();
        let sessions = SessionStore::new();
        let files = vec![("junk.pdf".to_string(), b"plain text".to_vec())];
        let err = create_session(&config, &FakeEmbedder, &sessions, &files)
            .await
            .unwrap_err();
        assert!(err.to_string().contains("junk.pdf"));
        assert!(sessions.is_empty());
    }
}
