//! Bulk statement assembly and response parsing.
//!
//! The bulk endpoint takes newline-delimited JSON: one action line per item,
//! followed by a source line for creates and updates. Statements for one
//! `set` call are concatenated add, update, delete.

use std::fmt;

use serde_json::{Value, json};

use crate::{
    document::{Entity, SetParams, SetResult, take_id},
    error::{Error, Result, server_error},
};

/// Bulk actions in the order response items are probed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Action {
    Create,
    Update,
    Delete,
}

impl Action {
    pub(crate) const ALL: [Action; 3] = [Action::Create, Action::Update, Action::Delete];

    pub(crate) fn as_str(self) -> &'static str {
        match self {
            Action::Create => "create",
            Action::Update => "update",
            Action::Delete => "delete",
        }
    }

    /// The `result` word the store reports when the action succeeded.
    pub(crate) fn past_tense(self) -> &'static str {
        match self {
            Action::Create => "created",
            Action::Update => "updated",
            Action::Delete => "deleted",
        }
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Serialize all three batches into one bulk request body.
pub(crate) fn build_bulk_body(params: &SetParams, index: &str) -> Result<String> {
    let mut body = String::new();
    body.push_str(&add_statements(&params.to_add, index)?);
    body.push_str(&update_statements(&params.to_update, index)?);
    body.push_str(&delete_statements(&params.to_delete, index)?);
    Ok(body)
}

/// Create statements: action line plus source line, `_id` stripped so the
/// store assigns one.
fn add_statements(entities: &[Entity], index: &str) -> Result<String> {
    let mut statements = String::new();
    if entities.is_empty() {
        return Ok(statements);
    }

    let action = json!({"create": {"_index": index}}).to_string();
    for entity in entities {
        let mut entity = entity.clone();
        entity.remove("_id");

        statements.push_str(&action);
        statements.push('\n');
        statements.push_str(&serde_json::to_string(&entity)?);
        statements.push('\n');
    }

    Ok(statements)
}

/// Update statements: action line addressing `_id`, then the remaining
/// fields wrapped in a `doc` envelope.
fn update_statements(entities: &[Entity], index: &str) -> Result<String> {
    let mut statements = String::new();
    for entity in entities {
        let mut entity = entity.clone();
        let Some(id) = take_id(&mut entity) else {
            return Err(Error::Validation(format!(
                "no _id in entity for update statement: {}",
                Value::Object(entity)
            )));
        };

        statements.push_str(&json!({"update": {"_index": index, "_id": id}}).to_string());
        statements.push('\n');
        statements.push_str(&json!({"doc": entity}).to_string());
        statements.push('\n');
    }

    Ok(statements)
}

/// Delete statements: a single action line per entity, `_id` only.
fn delete_statements(entities: &[Entity], index: &str) -> Result<String> {
    let mut statements = String::new();
    for entity in entities {
        let Some(id) = entity.get("_id").and_then(Value::as_str) else {
            return Err(Error::Validation(format!(
                "no _id in entity for delete statement: {}",
                Value::Object(entity.clone())
            )));
        };

        statements.push_str(&json!({"delete": {"_index": index, "_id": id}}).to_string());
        statements.push('\n');
    }

    Ok(statements)
}

/// Aggregate a bulk response into per-action counts and item errors.
pub(crate) fn parse_set_response(body: &Value) -> SetResult {
    let Some(items) = body.get("items").and_then(Value::as_array) else {
        let error = server_error(body).unwrap_or_else(|| {
            Error::UnexpectedResponse(format!("no items in bulk response: {body}"))
        });
        return SetResult::from_error(error);
    };

    let mut result = SetResult::default();
    for item in items {
        match parse_set_item(item) {
            Some((action, true, _)) => match action {
                Action::Create => result.added += 1,
                Action::Update => result.updated += 1,
                Action::Delete => result.deleted += 1,
            },
            Some((_, false, error)) => {
                result.failed += 1;
                if let Some(error) = error {
                    result.errors.push(error);
                }
            }
            None => {
                result.failed += 1;
                result.errors.push(Error::Server(format!("no action: {item}")));
            }
        }
    }

    result
}

/// Classify one response item: which action it belongs to, whether it
/// succeeded, and the reported reason when it failed. `None` when the item
/// matches no known action.
fn parse_set_item(item: &Value) -> Option<(Action, bool, Option<Error>)> {
    for action in Action::ALL {
        let Some(outcome) = item.get(action.as_str()) else {
            continue;
        };

        if let Some(result) = outcome.get("result").and_then(Value::as_str) {
            return Some((action, result == action.past_tense(), None));
        }

        let error = outcome
            .get("error")
            .and_then(|error| error.get("reason"))
            .and_then(Value::as_str)
            .map(|reason| Error::Server(reason.to_string()));
        return Some((action, false, error));
    }

    None
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entity(value: Value) -> Entity {
        value.as_object().cloned().unwrap()
    }

    fn lines(body: &str) -> Vec<Value> {
        body.lines()
            .map(|line| serde_json::from_str(line).unwrap())
            .collect()
    }

    #[test]
    fn test_add_statements_strip_id() {
        let entities = vec![entity(json!({"_id": "9", "name": "a"}))];
        let body = add_statements(&entities, "articles").unwrap();

        let lines = lines(&body);
        assert_eq!(lines.len(), 2);
        assert_eq!(lines[0], json!({"create": {"_index": "articles"}}));
        assert_eq!(lines[1], json!({"name": "a"}));
    }

    #[test]
    fn test_update_statements_wrap_doc() {
        let entities = vec![entity(json!({"_id": "1", "name": "b"}))];
        let body = update_statements(&entities, "articles").unwrap();

        let lines = lines(&body);
        assert_eq!(lines.len(), 2);
        assert_eq!(lines[0], json!({"update": {"_index": "articles", "_id": "1"}}));
        assert_eq!(lines[1], json!({"doc": {"name": "b"}}));
    }

    #[test]
    fn test_update_statements_require_id() {
        let entities = vec![entity(json!({"name": "b"}))];
        let err = update_statements(&entities, "articles").unwrap_err();
        assert!(matches!(err, Error::Validation(_)));
    }

    #[test]
    fn test_delete_statements_single_line() {
        let entities = vec![entity(json!({"_id": "5", "name": "c"}))];
        let body = delete_statements(&entities, "articles").unwrap();

        let lines = lines(&body);
        assert_eq!(lines.len(), 1);
        assert_eq!(lines[0], json!({"delete": {"_index": "articles", "_id": "5"}}));
    }

    #[test]
    fn test_delete_statements_require_id() {
        let entities = vec![entity(json!({"name": "c"}))];
        assert!(delete_statements(&entities, "articles").is_err());
    }

    #[test]
    fn test_bulk_body_line_count_and_order() {
        let params = SetParams {
            to_add: vec![entity(json!({"name": "a"})), entity(json!({"name": "b"}))],
            to_update: vec![
                entity(json!({"_id": "1", "name": "c"})),
                entity(json!({"_id": "2", "name": "d"})),
            ],
            to_delete: vec![entity(json!({"_id": "3"}))],
        };

        let body = build_bulk_body(&params, "articles").unwrap();
        let lines = lines(&body);

        // 2 per add, 2 per update, 1 per delete
        assert_eq!(lines.len(), 2 * 2 + 2 * 2 + 1);
        assert_eq!(lines[0], json!({"create": {"_index": "articles"}}));
        assert_eq!(lines[4], json!({"update": {"_index": "articles", "_id": "1"}}));
        assert_eq!(lines[8], json!({"delete": {"_index": "articles", "_id": "3"}}));
    }

    #[test]
    fn test_bulk_body_empty_batches() {
        let body = build_bulk_body(&SetParams::default(), "articles").unwrap();
        assert!(body.is_empty());
    }

    #[test]
    fn test_parse_set_counts_each_action() {
        let body = json!({"items": [
            {"create": {"_id": "1", "result": "created"}},
            {"update": {"_id": "2", "result": "updated"}},
            {"delete": {"_id": "3", "result": "deleted"}},
        ]});

        let result = parse_set_response(&body);
        assert_eq!(result.added, 1);
        assert_eq!(result.updated, 1);
        assert_eq!(result.deleted, 1);
        assert_eq!(result.failed, 0);
        assert!(result.errors.is_empty());
    }

    #[test]
    fn test_parse_set_collects_failure_reasons() {
        let body = json!({"items": [
            {"update": {"_id": "2", "error": {"type": "x", "reason": "document missing"}}},
        ]});

        let result = parse_set_response(&body);
        assert_eq!(result.failed, 1);
        assert_eq!(result.errors.len(), 1);
        assert!(result.errors[0].to_string().contains("document missing"));
    }

    #[test]
    fn test_parse_set_result_mismatch_counts_failed() {
        let body = json!({"items": [{"create": {"_id": "1", "result": "noop"}}]});

        let result = parse_set_response(&body);
        assert_eq!(result.added, 0);
        assert_eq!(result.failed, 1);
        assert!(result.errors.is_empty());
    }

    #[test]
    fn test_parse_set_unrecognized_item() {
        let body = json!({"items": [{"index": {"_id": "1", "result": "created"}}]});

        let result = parse_set_response(&body);
        assert_eq!(result.failed, 1);
        assert_eq!(result.errors.len(), 1);
        let message = result.errors[0].to_string();
        assert!(message.contains("no action:"));
        assert!(message.contains("\"index\""));
    }

    #[test]
    fn test_parse_set_missing_items_reports_server_error() {
        let body = json!({"error": {"type": "parse_exception", "reason": "bad body"}});

        let result = parse_set_response(&body);
        assert_eq!(result.added + result.updated + result.deleted + result.failed, 0);
        assert_eq!(result.errors.len(), 1);
        assert!(result.errors[0].to_string().contains("parse_exception"));
    }
}
