//! Extraction of a [`SearchEvent`] from a chat-completions request payload.
//!
//! The extractor is total: malformed or unexpected shapes degrade to "no
//! event", never to an error. Forwarding must not depend on capture.

use serde_json::{json, Map, Value};

use super::{QueryText, SearchEvent};

/// Derive a search event from a parsed chat-completions request body.
///
/// Scans `messages` from the end for the most recent `role: "user"` entry
/// and uses its content as the query. Returns `None` when the payload has no
/// usable user message.
pub fn extract_search_event(payload: &Value) -> Option<SearchEvent> {
    let messages = payload.get("messages")?.as_array()?;

    let user_message = messages
        .iter()
        .rev()
        .find(|message| message.get("role").and_then(Value::as_str) == Some("user"))?;

    let content = extract_user_text(user_message.get("content")?)?;
    let query = QueryText::try_new(content).ok()?;

    let request_metadata = payload
        .get("metadata")
        .and_then(Value::as_object)
        .cloned()
        .unwrap_or_default();

    let conversation_id = non_null(payload.get("conversation_id"))
        .or_else(|| non_null(request_metadata.get("conversation_id")))
        .cloned()
        .unwrap_or(Value::Null);

    let mut metadata = Map::new();
    metadata.insert(
        "model".to_string(),
        payload.get("model").cloned().unwrap_or(Value::Null),
    );
    metadata.insert("messages_count".to_string(), json!(messages.len()));
    metadata.insert("stream".to_string(), json!(is_truthy(payload.get("stream"))));
    metadata.insert("conversation_id".to_string(), conversation_id);
    if !request_metadata.is_empty() {
        metadata.insert(
            "request_metadata".to_string(),
            Value::Object(request_metadata.clone()),
        );
    }

    // Empty strings count as absent, so a blank `user` field still lets the
    // metadata id through.
    let user_id = payload
        .get("user")
        .and_then(Value::as_str)
        .filter(|s| !s.is_empty())
        .or_else(|| {
            request_metadata
                .get("user_id")
                .and_then(Value::as_str)
                .filter(|s| !s.is_empty())
        })
        .map(str::to_string);
    let email = request_metadata
        .get("email")
        .and_then(Value::as_str)
        .map(str::to_string);
    let name = request_metadata
        .get("name")
        .and_then(Value::as_str)
        .map(str::to_string);

    Some(SearchEvent {
        user_id,
        email,
        name,
        query,
        metadata: Some(metadata),
        timestamp: None,
    })
}

/// Pull user-authored text out of a message `content` field.
///
/// Plain strings are used verbatim; part arrays contribute the trimmed
/// `text` of every part that carries one, joined with a single space. Any
/// other shape yields nothing.
fn extract_user_text(content: &Value) -> Option<String> {
    match content {
        Value::String(text) => Some(text.clone()),
        Value::Array(parts) => {
            let bits: Vec<&str> = parts
                .iter()
                .filter_map(|part| part.get("text").and_then(Value::as_str))
                .map(str::trim)
                .filter(|bit| !bit.is_empty())
                .collect();
            Some(bits.join(" "))
        }
        _ => None,
    }
}

fn non_null(value: Option<&Value>) -> Option<&Value> {
    value.filter(|v| !v.is_null())
}

/// Whether a chat-completions body asks for a streamed response.
pub fn stream_requested(payload: &Value) -> bool {
    is_truthy(payload.get("stream"))
}

/// Truthiness cast for the `stream` flag: null, false, zero, and empty
/// strings/containers all count as not streaming.
fn is_truthy(value: Option<&Value>) -> bool {
    match value {
        None | Some(Value::Null) => false,
        Some(Value::Bool(b)) => *b,
        Some(Value::Number(n)) => n.as_f64().is_some_and(|f| f != 0.0),
        Some(Value::String(s)) => !s.is_empty(),
        Some(Value::Array(a)) => !a.is_empty(),
        Some(Value::Object(o)) => !o.is_empty(),
    }
}
