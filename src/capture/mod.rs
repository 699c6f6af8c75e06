//! Search-event capture: the normalized record of a user's query extracted
//! from an otherwise opaque proxied request, plus the extractor that derives
//! it from chat-completions payloads.

mod extractor;

pub use extractor::{extract_search_event, stream_requested};

use chrono::{DateTime, Utc};
use nutype::nutype;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// The text of a captured search query.
///
/// Trimmed on construction and never empty; a payload that would produce an
/// empty query produces no event instead.
#[nutype(
    sanitize(trim),
    validate(not_empty),
    derive(Clone, Debug, Display, PartialEq, Eq, Deserialize, Serialize, TryFrom, AsRef)
)]
pub struct QueryText(String);

/// A user search captured from proxied traffic or posted directly to the
/// log endpoint.
#[derive(Clone, Debug, PartialEq, Deserialize, Serialize)]
pub struct SearchEvent {
    /// Stable caller-supplied identifier, if the client sent one.
    #[serde(default)]
    pub user_id: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
    pub query: QueryText,
    #[serde(default)]
    pub metadata: Option<Map<String, Value>>,
    /// Client-provided capture time; the store assigns one when missing.
    #[serde(default)]
    pub timestamp: Option<DateTime<Utc>>,
}
