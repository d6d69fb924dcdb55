//! Document operations.

use reqwest::Method;
use serde_json::{Value, json};
use tracing::debug;

use crate::{
    bulk::{self, Action},
    client::Client,
    error::{Error, Result, server_error},
    search::{self, SearchResult},
};

/// Schema-less document payload.
///
/// The reserved `_id` key names the document; it addresses requests and is
/// stripped before the remaining fields travel in a request body.
pub type Entity = serde_json::Map<String, Value>;

/// Entity batches for one bulk [`Documents::set`] call.
#[derive(Debug, Clone, Default)]
pub struct SetParams {
    /// Entities to create. Any `_id` is dropped; the store assigns one.
    pub to_add: Vec<Entity>,
    /// Entities to update in place. `_id` selects the document.
    pub to_update: Vec<Entity>,
    /// Entities to delete. Only `_id` is consulted.
    pub to_delete: Vec<Entity>,
}

/// Per-action outcome of a bulk [`Documents::set`] call.
#[derive(Debug, Default)]
pub struct SetResult {
    /// Documents created.
    pub added: usize,
    /// Documents updated.
    pub updated: usize,
    /// Documents deleted.
    pub deleted: usize,
    /// Items the store rejected.
    pub failed: usize,
    /// Collected item errors.
    pub errors: Vec<Error>,
}

impl SetResult {
    /// Result for a call that failed before reaching the store, or whose
    /// request never completed. Counts stay at zero.
    pub(crate) fn from_error(error: Error) -> Self {
        Self {
            errors: vec![error],
            ..Self::default()
        }
    }
}

/// Handle for document operations against one store.
#[derive(Debug, Clone)]
pub struct Documents {
    client: Client,
}

impl Documents {
    pub(crate) fn new(client: Client) -> Self {
        Self { client }
    }

    /// Fetch one document by id. A missing document is `Ok(None)`.
    pub async fn get(&self, id: &str, index: &str) -> Result<Option<Entity>> {
        if id.is_empty() {
            return Err(Error::Validation("no document id provided".to_string()));
        }

        debug!("getting document {} from index {}", id, index);
        let body = self
            .client
            .request(Method::GET, &format!("/{index}/_doc/{id}"), None, false)
            .await?;

        if let Some(error) = server_error(&body) {
            return Err(error);
        }
        match body.get("found").and_then(Value::as_bool) {
            Some(false) => Ok(None),
            Some(true) => match body.get("_source") {
                Some(Value::Object(source)) => Ok(Some(source.clone())),
                _ => Err(Error::UnexpectedResponse(format!(
                    "no _source in get response: {body}"
                ))),
            },
            None => Err(Error::UnexpectedResponse(format!(
                "no found flag in get response: {body}"
            ))),
        }
    }

    /// Fetch several documents by id in one call.
    ///
    /// Empty ids are dropped before querying; ids the store does not find
    /// are silently absent from the result.
    pub async fn mget(&self, ids: &[String], index: &str) -> Result<Vec<Entity>> {
        let ids: Vec<&str> = ids
            .iter()
            .map(String::as_str)
            .filter(|id| !id.is_empty())
            .collect();
        if ids.is_empty() {
            return Err(Error::Validation("no document ids provided".to_string()));
        }

        debug!("getting {} documents from index {}", ids.len(), index);
        let params = json!({"ids": ids}).to_string();
        let body = self
            .client
            .request(Method::GET, &format!("/{index}/_mget"), Some(params), false)
            .await?;

        if let Some(error) = server_error(&body) {
            return Err(error);
        }
        let docs = body.get("docs").and_then(Value::as_array).ok_or_else(|| {
            Error::UnexpectedResponse(format!("no docs in mget response: {body}"))
        })?;

        let mut entities = Vec::new();
        for doc in docs {
            if doc.get("found").and_then(Value::as_bool) == Some(true)
                && let Some(Value::Object(source)) = doc.get("_source")
            {
                entities.push(source.clone());
            }
        }

        Ok(entities)
    }

    /// Run a query against an index.
    ///
    /// The query is caller-supplied JSON in the store's query DSL; hits come
    /// back raw together with the total match count.
    pub async fn search(&self, query: &Value, index: &str) -> Result<SearchResult> {
        debug!("searching index {}", index);
        let params = serde_json::to_string(query)?;
        let body = self
            .client
            .request(Method::GET, &format!("/{index}/_search"), Some(params), false)
            .await?;

        search::parse_search_response(&body)
    }

    /// Create one document. Returns the id the store assigned.
    pub async fn create(
        &self,
        entity: &Entity,
        index: &str,
        wait_for_refresh: bool,
    ) -> Result<String> {
        let mut entity = entity.clone();
        entity.remove("_id");

        debug!("creating document in index {}", index);
        let body = serde_json::to_string(&entity)?;
        let result = self
            .client
            .request(
                Method::POST,
                &format!("/{index}/_doc"),
                Some(body),
                wait_for_refresh,
            )
            .await?;

        parse_edit_response(&result, Action::Create)
    }

    /// Update one document in place. The entity must carry a string `_id`;
    /// without one the call fails before any request is issued.
    pub async fn update(
        &self,
        entity: &Entity,
        index: &str,
        wait_for_refresh: bool,
    ) -> Result<String> {
        let mut entity = entity.clone();
        let Some(id) = take_id(&mut entity) else {
            return Err(Error::Validation(format!(
                "no _id in entity for update: {}",
                Value::Object(entity)
            )));
        };

        debug!("updating document {} in index {}", id, index);
        let body = serde_json::to_string(&entity)?;
        let result = self
            .client
            .request(
                Method::PUT,
                &format!("/{index}/_doc/{id}"),
                Some(body),
                wait_for_refresh,
            )
            .await?;

        parse_edit_response(&result, Action::Update)
    }

    /// Delete one document. The entity must carry a string `_id`; without
    /// one the call fails before any request is issued.
    pub async fn delete(
        &self,
        entity: &Entity,
        index: &str,
        wait_for_refresh: bool,
    ) -> Result<String> {
        let mut entity = entity.clone();
        let Some(id) = take_id(&mut entity) else {
            return Err(Error::Validation(format!(
                "no _id in entity for delete: {}",
                Value::Object(entity)
            )));
        };

        debug!("deleting document {} from index {}", id, index);
        let body = serde_json::to_string(&entity)?;
        let result = self
            .client
            .request(
                Method::DELETE,
                &format!("/{index}/_doc/{id}"),
                Some(body),
                wait_for_refresh,
            )
            .await?;

        parse_edit_response(&result, Action::Delete)
    }

    /// Apply entity batches through the bulk API.
    ///
    /// Item failures are reported per item in the result rather than
    /// failing the whole call. A statement that cannot be built, or a
    /// request that never completes, short-circuits into a result carrying
    /// that single error and zero counts.
    pub async fn set(&self, params: &SetParams, index: &str, wait_for_refresh: bool) -> SetResult {
        let statements = match bulk::build_bulk_body(params, index) {
            Ok(statements) => statements,
            Err(error) => return SetResult::from_error(error),
        };

        debug!(
            "bulk set of {}+{}+{} entities against index {}",
            params.to_add.len(),
            params.to_update.len(),
            params.to_delete.len(),
            index
        );
        match self
            .client
            .request(Method::POST, "/_bulk", Some(statements), wait_for_refresh)
            .await
        {
            Ok(body) => bulk::parse_set_response(&body),
            Err(error) => SetResult::from_error(error),
        }
    }
}

/// Remove the reserved `_id` key, returning it when it holds a string.
pub(crate) fn take_id(entity: &mut Entity) -> Option<String> {
    match entity.remove("_id") {
        Some(Value::String(id)) => Some(id),
        _ => None,
    }
}

/// Parse the response to a single-document create, update, or delete.
///
/// The call succeeded only when the reported `result` is the action's past
/// tense; anything else becomes an error naming the id when one is present
/// and quoting the store's description, or "unknown" without one.
pub(crate) fn parse_edit_response(body: &Value, action: Action) -> Result<String> {
    let id = body.get("_id").and_then(Value::as_str);
    let result = body.get("result").and_then(Value::as_str);

    if let (Some(id), Some(result)) = (id, result)
        && result == action.past_tense()
    {
        return Ok(id.to_string());
    }

    let detail = match result {
        Some(result) => result.to_string(),
        None => match body.get("error") {
            Some(Value::String(message)) => message.clone(),
            Some(error) => error
                .get("reason")
                .and_then(Value::as_str)
                .unwrap_or("unknown")
                .to_string(),
            None => "unknown".to_string(),
        },
    };

    Err(Error::Server(match id {
        Some(id) => format!("failed to {action} document {id}: {detail}"),
        None => format!("failed to {action} document: {detail}"),
    }))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entity(value: Value) -> Entity {
        value.as_object().cloned().unwrap()
    }

    #[test]
    fn test_take_id_removes_string_id() {
        let mut ent = entity(json!({"_id": "7", "name": "a"}));
        assert_eq!(take_id(&mut ent), Some("7".to_string()));
        assert!(!ent.contains_key("_id"));
    }

    #[test]
    fn test_take_id_rejects_non_string_id() {
        let mut ent = entity(json!({"_id": 7, "name": "a"}));
        assert_eq!(take_id(&mut ent), None);
    }

    #[test]
    fn test_parse_edit_response_success() {
        let body = json!({"_id": "7", "result": "created"});
        assert_eq!(parse_edit_response(&body, Action::Create).unwrap(), "7");
    }

    #[test]
    fn test_parse_edit_response_wrong_result_word() {
        let body = json!({"_id": "7", "result": "noop"});
        let err = parse_edit_response(&body, Action::Update).unwrap_err();
        assert_eq!(
            err.to_string(),
            "Server error: failed to update document 7: noop"
        );
    }

    #[test]
    fn test_parse_edit_response_mismatched_action() {
        // A created answer does not satisfy a delete call.
        let body = json!({"_id": "7", "result": "created"});
        assert!(parse_edit_response(&body, Action::Delete).is_err());
    }

    #[test]
    fn test_parse_edit_response_quotes_error_reason() {
        let body = json!({"error": {"type": "x", "reason": "mapper failure"}});
        let err = parse_edit_response(&body, Action::Create).unwrap_err();
        assert_eq!(
            err.to_string(),
            "Server error: failed to create document: mapper failure"
        );
    }

    #[test]
    fn test_parse_edit_response_unknown_without_detail() {
        let err = parse_edit_response(&json!({}), Action::Delete).unwrap_err();
        assert_eq!(
            err.to_string(),
            "Server error: failed to delete document: unknown"
        );
    }
}
