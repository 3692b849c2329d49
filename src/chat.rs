//! Question-answering pipeline.
//!
//! For each question: snapshot the session history, rewrite the question to
//! be standalone when history exists, embed the standalone question, retrieve
//! the top-k chunks from the session index, generate a grounded answer, and
//! append the completed turn to the history.
//!
//! Retrieval uses the rewritten question; the answer call always sees the
//! user's original wording.

use anyhow::{bail, Result};

use crate::config::Config;
use crate::embedding::{embed_query, Embedder};
use crate::llm::ChatModel;
use crate::models::ChatTurn;
use crate::prompt;
use crate::session::SessionStore;

/// Result of answering one question.
#[derive(Debug)]
pub struct ChatOutcome {
    pub answer: String,
    /// Full history snapshot including the new turn.
    pub history: Vec<ChatTurn>,
}

pub async fn answer_question(
    config: &Config,
    embedder: &dyn Embedder,
    llm: &dyn ChatModel,
    sessions: &SessionStore,
    session_id: &str,
    question: &str,
) -> Result<ChatOutcome> {
    let question = question.trim();
    if question.is_empty() {
        bail!("message must not be empty");
    }

    let history = sessions.history(session_id)?;

    // Rewrite only when there is history to resolve references against.
    let standalone = if history.is_empty() {
        question.to_string()
    } else {
        let rewritten = llm
            .complete(&prompt::rewrite_messages(&history, question))
            .await?;
        let rewritten = rewritten.trim();
        if rewritten.is_empty() {
            question.to_string()
        } else {
            rewritten.to_string()
        }
    };

    let query_vec = embed_query(embedder, &standalone).await?;
    let retrieved = sessions.search(session_id, &query_vec, config.retrieval.top_k)?;
    let context = prompt::format_context(&retrieved);

    let answer = llm
        .complete(&prompt::answer_messages(&history, question, &context))
        .await?;

    sessions.append_turn(session_id, question.to_string(), answer.clone())?;
    let history = sessions.history(session_id)?;

    Ok(ChatOutcome { answer, history })
}
