//! Prompt templates and message assembly for the two LLM calls.
//!
//! The rewrite prompt turns a follow-up question into a standalone one given
//! the chat history; the answer prompt grounds the reply in the retrieved
//! context. Both calls receive the history as alternating user/assistant
//! messages with the question last.

use crate::models::{ChatMessage, ChatTurn, RetrievedChunk};

/// System prompt for the history-aware question rewrite. The model must
/// reformulate, never answer.
pub const REWRITE_SYSTEM_PROMPT: &str = "Given a chat history and the latest user question \
which might reference context in the chat history, formulate a standalone question \
which can be understood without the chat history. Do NOT answer the question, \
just reformulate it if needed and otherwise return it as is.";

/// System prompt for grounded answer generation. The retrieved context is
/// appended after a blank line.
pub const ANSWER_SYSTEM_PROMPT: &str = "You are an assistant for question-answering tasks. \
Use the following pieces of retrieved context to answer the question. \
If you don't know the answer, say that you don't know. \
Use three sentences maximum and keep the answer concise.";

/// Join retrieved chunk texts into the context block, blank-line separated.
pub fn format_context(chunks: &[RetrievedChunk]) -> String {
    chunks
        .iter()
        .map(|c| c.text.as_str())
        .collect::<Vec<_>>()
        .join("\n\n")
}

fn history_messages(history: &[ChatTurn]) -> impl Iterator<Item = ChatMessage> + '_ {
    history.iter().flat_map(|turn| {
        [
            ChatMessage::user(turn.user.clone()),
            ChatMessage::assistant(turn.assistant.clone()),
        ]
    })
}

/// Messages for the rewrite call: rewrite system prompt, history, question.
pub fn rewrite_messages(history: &[ChatTurn], question: &str) -> Vec<ChatMessage> {
    let mut messages = vec![ChatMessage::system(REWRITE_SYSTEM_PROMPT)];
    messages.extend(history_messages(history));
    messages.push(ChatMessage::user(question));
    messages
}

/// Messages for the answer call: answer system prompt with the retrieved
/// context appended, history, and the original (unrewritten) question.
pub fn answer_messages(history: &[ChatTurn], question: &str, context: &str) -> Vec<ChatMessage> {
    let system = format!("{}\n\n{}", ANSWER_SYSTEM_PROMPT, context);
    let mut messages = vec![ChatMessage::system(system)];
    messages.extend(history_messages(history));
    messages.push(ChatMessage::user(question));
    messages
}
