//! Search results and response parsing.

use serde_json::Value;

use crate::error::{Error, Result, server_error};

/// Hits and total count returned by a search.
#[derive(Debug, Clone, Default)]
pub struct SearchResult {
    /// Raw hit objects, each carrying `_id`, `_score`, and `_source`.
    pub hits: Vec<Value>,
    /// Total number of matching documents reported by the store.
    pub total: u64,
}

/// Parse a search response body.
///
/// A top-level `error` payload fails the call; a response without the
/// `hits.hits` list or `hits.total.value` count is malformed, never an
/// empty result.
pub(crate) fn parse_search_response(body: &Value) -> Result<SearchResult> {
    if let Some(error) = server_error(body) {
        return Err(error);
    }

    let hits = body
        .get("hits")
        .ok_or_else(|| Error::UnexpectedResponse(format!("no hits in search response: {body}")))?;
    let entities = hits.get("hits").and_then(Value::as_array).ok_or_else(|| {
        Error::UnexpectedResponse(format!("no hit list in search response: {body}"))
    })?;
    let total = hits
        .get("total")
        .and_then(|total| total.get("value"))
        .and_then(Value::as_u64)
        .ok_or_else(|| Error::UnexpectedResponse(format!("no total in search response: {body}")))?;

    Ok(SearchResult {
        hits: entities.clone(),
        total,
    })
}
