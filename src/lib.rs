//! # PDF Chat
//!
//! A conversational question-answering service for uploaded PDF documents.
//!
//! Each upload creates an isolated session: the PDFs are extracted, chunked,
//! embedded, and held in an in-memory vector index. Questions are answered
//! with retrieval-augmented generation against that index, with the chat
//! history folded into both the retrieval query and the answer.
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────┐   ┌──────────────────┐   ┌───────────────┐
//! │  Upload  │──▶│    Pipeline       │──▶│   Session      │
//! │  (PDFs)  │   │ Extract+Chunk     │   │ index+history  │
//! └──────────┘   │ +Embed            │   └───────┬───────┘
//!                └──────────────────┘           │
//! ┌──────────┐   ┌──────────────────┐           │
//! │ Question │──▶│ Rewrite→Retrieve │◀──────────┘
//! │          │   │ →Answer→Append   │
//! └──────────┘   └──────────────────┘
//! ```
//!
//! ## Quick Start
//!
//! ```bash
//! pdfchat serve                                  # start the HTTP server
//! pdfchat ask --pdf report.pdf "What changed?"   # one-shot local pipeline
//! ```
//!
//! ## Modules
//!
//! | Module | Purpose |
//! |--------|---------|
//! | [`config`] | TOML configuration parsing |
//! | [`models`] | Core data types |
//! | [`extract`] | PDF text extraction |
//! | [`chunk`] | Text chunking with overlap |
//! | [`embedding`] | Embedding provider abstraction |
//! | [`index`] | Per-session vector index |
//! | [`llm`] | Chat completion client |
//! | [`prompt`] | Rewrite and answer prompt assembly |
//! | [`session`] | Session map and chat history |
//! | [`ingest`] | Upload pipeline |
//! | [`chat`] | Question-answering pipeline |
//! | [`server`] | HTTP server |

pub mod chat;
pub mod chunk;
pub mod config;
pub mod embedding;
pub mod extract;
pub mod index;
pub mod ingest;
pub mod llm;
pub mod models;
pub mod prompt;
pub mod server;
pub mod session;

#[cfg(test)]
pub(crate) mod test_pdf;
