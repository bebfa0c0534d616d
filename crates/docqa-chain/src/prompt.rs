//! Prompt templates for the two model calls a question can make.

use docqa_core::types::{ChatMessage, Citation, Exchange};

const ANSWER_SYSTEM_TEMPLATE: &str = "Use the following pieces of context to answer the user's question. \n\
If you don't know the answer, just say that you don't know, don't try to make up an answer.\n\
----------------\n\
{context}";

const CONDENSE_TEMPLATE: &str = "Given the following conversation and a follow up question, \
rephrase the follow up question to be a standalone question, in its original language.\n\
\n\
Chat History:\n\
{chat_history}\n\
Follow Up Input: {question}\n\
Standalone question:";

/// Retrieved chunk texts, in retrieval order, separated by blank lines.
pub fn format_context(sources: &[Citation]) -> String {
    sources
        .iter()
        .map(|c| c.chunk.content.as_str())
        .collect::<Vec<_>>()
        .join("\n\n")
}

pub fn format_history(history: &[Exchange]) -> String {
    history
        .iter()
        .map(|turn| format!("Human: {}\nAssistant: {}", turn.question, turn.answer))
        .collect::<Vec<_>>()
        .join("\n")
}

/// Substitute `{name}` slots in a single pass over `template`. Inserted
/// values are never scanned again, so braces inside them survive as-is.
fn fill(template: &str, slots: &[(&str, &str)]) -> String {
    let mut out = String::with_capacity(template.len());
    let mut rest = template;
    while let Some(open) = rest.find('{') {
        out.push_str(&rest[..open]);
        let tail = &rest[open..];
        let slot = slots.iter().find(|(name, _)| {
            tail[1..].strip_prefix(name).is_some_and(|after| after.starts_with('}'))
        });
        match slot {
            Some((name, value)) => {
                out.push_str(value);
                rest = &tail[name.len() + 2..];
            }
            None => {
                out.push('{');
                rest = &tail[1..];
            }
        }
    }
    out.push_str(rest);
    out
}

/// System message carrying the context, then the question as the user turn.
pub fn answer_messages(question: &str, sources: &[Citation]) -> Vec<ChatMessage> {
    let system = fill(ANSWER_SYSTEM_TEMPLATE, &[("context", format_context(sources).as_str())]);
    vec![ChatMessage::system(system), ChatMessage::user(question)]
}

/// Single user message asking for a standalone rewrite of `question`.
pub fn condense_messages(question: &str, history: &[Exchange]) -> Vec<ChatMessage> {
    let history = format_history(history);
    let prompt = fill(CONDENSE_TEMPLATE, &[("chat_history", history.as_str()), ("question", question)]);
    vec![ChatMessage::user(prompt)]
}
