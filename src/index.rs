//! Index operations.

use reqwest::{Method, StatusCode};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, info};

use crate::{
    client::Client,
    error::{Error, Result, server_error},
};

/// Handle for index operations against one store.
#[derive(Debug, Clone)]
pub struct Indices {
    client: Client,
}

impl Indices {
    pub(crate) fn new(client: Client) -> Self {
        Self { client }
    }

    /// Fetch the structure of an index.
    pub async fn get(&self, name: &str) -> Result<IndexStructure> {
        debug!("getting index {}", name);
        let body = self
            .client
            .request(Method::GET, &format!("/{name}"), None, false)
            .await?;

        if let Some(error) = server_error(&body) {
            return Err(error);
        }
        let Some(raw) = body.get(name) else {
            return Err(Error::UnexpectedResponse(format!(
                "index {name} missing from response: {body}"
            )));
        };

        let mut structure: IndexStructure = serde_json::from_value(raw.clone())?;
        structure.name = name.to_string();
        Ok(structure)
    }

    /// Check whether an index exists.
    ///
    /// Decided by the HTTP status of a HEAD probe: 200 means it exists,
    /// 404 that it does not. Anything else is an error.
    pub async fn exists(&self, name: &str) -> Result<bool> {
        debug!("checking index {}", name);
        let response = self
            .client
            .send(Method::HEAD, &format!("/{name}"), None, false)
            .await?;

        match response.status() {
            StatusCode::OK => Ok(true),
            StatusCode::NOT_FOUND => Ok(false),
            status => Err(Error::UnexpectedResponse(format!(
                "exists probe for {name} returned {status}"
            ))),
        }
    }

    /// Create an index from the given structure.
    ///
    /// The index name travels in the URL path, never in the creation body.
    /// `wait_for_active_shards` blocks the store until that many shard
    /// copies are up.
    pub async fn create(
        &self,
        structure: &IndexStructure,
        wait_for_active_shards: Option<u32>,
    ) -> Result<()> {
        info!("creating index {}", structure.name);
        let mut endpoint = format!("/{}", structure.name);
        if let Some(shards) = wait_for_active_shards {
            endpoint.push_str(&format!("?wait_for_active_shards={shards}"));
        }

        let body = serde_json::to_string(structure)?;
        let result = self
            .client
            .request(Method::PUT, &endpoint, Some(body), false)
            .await?;

        match result.get("index").and_then(Value::as_str) {
            Some(index) if index == structure.name => Ok(()),
            _ => Err(server_error(&result).unwrap_or_else(|| {
                Error::UnexpectedResponse(format!("unacknowledged index creation: {result}"))
            })),
        }
    }

    /// Delete an index.
    pub async fn delete(&self, name: &str) -> Result<()> {
        info!("deleting index {}", name);
        let result = self
            .client
            .request(Method::DELETE, &format!("/{name}"), None, false)
            .await?;

        if result.get("acknowledged").and_then(Value::as_bool) == Some(true) {
            return Ok(());
        }
        Err(server_error(&result).unwrap_or_else(|| {
            Error::UnexpectedResponse(format!("unacknowledged index deletion: {result}"))
        }))
    }

    /// Fetch the mappings of an index, optionally scoped to one field.
    pub async fn get_mapping(&self, name: &str, field: Option<&str>) -> Result<Value> {
        debug!("getting mapping for index {}", name);
        let mut endpoint = format!("/{name}/_mapping");
        if let Some(field) = field {
            endpoint.push_str(&format!("/field/{field}"));
        }

        let body = self
            .client
            .request(Method::GET, &endpoint, None, false)
            .await?;

        if let Some(error) = server_error(&body) {
            return Err(error);
        }
        let mappings = body
            .get(name)
            .and_then(|index| index.get("mappings"))
            .ok_or_else(|| {
                Error::UnexpectedResponse(format!("no mappings for {name} in response: {body}"))
            })?;

        match field {
            Some(field) => mappings.get(field).cloned().ok_or_else(|| {
                Error::UnexpectedResponse(format!(
                    "no mapping for field {field} in response: {body}"
                ))
            }),
            None => Ok(mappings.clone()),
        }
    }

    /// Replace the mappings of an index.
    ///
    /// The payload must carry a `properties` key; without one the call
    /// fails before any request is issued.
    pub async fn update_mapping(&self, name: &str, mappings: &Value) -> Result<()> {
        if mappings.get("properties").is_none() {
            return Err(Error::Validation(format!(
                "no properties key in mapping update: {mappings}"
            )));
        }

        info!("updating mapping for index {}", name);
        let body = serde_json::to_string(mappings)?;
        let result = self
            .client
            .request(Method::PUT, &format!("/{name}/_mapping"), Some(body), false)
            .await?;

        if result.get("acknowledged").and_then(Value::as_bool) == Some(true) {
            return Ok(());
        }
        Err(server_error(&result).unwrap_or_else(|| {
            Error::UnexpectedResponse(format!("unacknowledged mapping update: {result}"))
        }))
    }

    /// List index snapshots from the cat API, optionally narrowed to one
    /// target index or pattern.
    pub async fn list(&self, target: Option<&str>) -> Result<Vec<Indice>> {
        debug!("listing indices");
        let mut endpoint = String::from("/_cat/indices");
        if let Some(target) = target {
            endpoint.push('/');
            endpoint.push_str(target);
        }
        endpoint.push_str("?format=json");

        let body = self
            .client
            .request(Method::GET, &endpoint, None, false)
            .await?;

        let rows = body.as_array().ok_or_else(|| {
            server_error(&body).unwrap_or_else(|| {
                Error::UnexpectedResponse(format!("cat indices did not return rows: {body}"))
            })
        })?;

        rows.iter().map(Indice::from_row).collect()
    }
}

/// One row of the cat-indices listing.
///
/// A read-only snapshot; fetch a fresh listing rather than holding on to
/// these.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Indice {
    /// Index name.
    pub index: String,
    /// Health color (green, yellow, red).
    pub health: String,
    /// Open or closed.
    pub status: String,
    /// Index UUID.
    pub uuid: String,
    /// Number of primary shards.
    pub primaries: u64,
    /// Number of replica shards.
    pub replicas: u64,
    /// Live document count.
    pub docs_count: u64,
    /// Deleted document count.
    pub docs_deleted: u64,
    /// Total store size, as reported (e.g. "1.2mb").
    pub store_size: String,
    /// Primary shard store size, as reported.
    pub primary_store_size: String,
}

/// Raw cat-indices row. Every column arrives as a string.
#[derive(Debug, Deserialize)]
struct CatIndicesRow {
    index: String,
    health: String,
    status: String,
    uuid: String,
    pri: String,
    rep: String,
    #[serde(rename = "docs.count")]
    docs_count: String,
    #[serde(rename = "docs.deleted")]
    docs_deleted: String,
    #[serde(rename = "store.size")]
    store_size: String,
    #[serde(rename = "pri.store.size")]
    primary_store_size: String,
}

impl Indice {
    fn from_row(row: &Value) -> Result<Self> {
        let raw: CatIndicesRow = serde_json::from_value(row.clone())?;

        Ok(Self {
            index: raw.index,
            health: raw.health,
            status: raw.status,
            uuid: raw.uuid,
            primaries: parse_count(&raw.pri, "pri")?,
            replicas: parse_count(&raw.rep, "rep")?,
            docs_count: parse_count(&raw.docs_count, "docs.count")?,
            docs_deleted: parse_count(&raw.docs_deleted, "docs.deleted")?,
            store_size: raw.store_size,
            primary_store_size: raw.primary_store_size,
        })
    }
}

fn parse_count(value: &str, column: &str) -> Result<u64> {
    value.parse().map_err(|_| {
        Error::UnexpectedResponse(format!("non-numeric {column} in cat indices row: {value}"))
    })
}

/// Structure of an index: the payload for creating one and the shape
/// handed back when fetching one.
///
/// The name is not serialized; it addresses the index through the URL.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct IndexStructure {
    /// Index name.
    #[serde(skip)]
    pub name: String,
    /// Alias definitions.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub aliases: Option<Value>,
    /// Field mappings.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mappings: Option<Value>,
    /// Index settings.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub settings: Option<Value>,
}

impl IndexStructure {
    /// Create a structure for the named index.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    /// Set alias definitions.
    pub fn with_aliases(mut self, aliases: Value) -> Self {
        self.aliases = Some(aliases);
        self
    }

    /// Set field mappings.
    pub fn with_mappings(mut self, mappings: Value) -> Self {
        self.mappings = Some(mappings);
        self
    }

    /// Set index settings.
    pub fn with_settings(mut self, settings: Value) -> Self {
        self.settings = Some(settings);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn sample_row() -> Value {
        json!({
            "health": "yellow",
            "status": "open",
            "index": "articles",
            "uuid": "u8FNjxh8Rfy_awN11oDKYQ",
            "pri": "1",
            "rep": "2",
            "docs.count": "1200",
            "docs.deleted": "3",
            "store.size": "88.1kb",
            "pri.store.size": "44kb",
        })
    }

    #[test]
    fn test_indice_from_row() {
        let indice = Indice::from_row(&sample_row()).unwrap();
        assert_eq!(indice.index, "articles");
        assert_eq!(indice.health, "yellow");
        assert_eq!(indice.primaries, 1);
        assert_eq!(indice.replicas, 2);
        assert_eq!(indice.docs_count, 1200);
        assert_eq!(indice.docs_deleted, 3);
        assert_eq!(indice.store_size, "88.1kb");
        assert_eq!(indice.primary_store_size, "44kb");
    }

    #[test]
    fn test_indice_from_row_rejects_non_numeric_count() {
        let mut row = sample_row();
        row["docs.count"] = json!("many");
        let err = Indice::from_row(&row).unwrap_err();
        assert!(err.to_string().contains("docs.count"));
    }

    #[test]
    fn test_indice_from_row_rejects_missing_column() {
        let mut row = sample_row();
        row.as_object_mut().unwrap().remove("uuid");
        assert!(matches!(Indice::from_row(&row).unwrap_err(), Error::Decode(_)));
    }

    #[test]
    fn test_index_structure_serializes_without_name() {
        let structure = IndexStructure::new("articles")
            .with_mappings(json!({"properties": {"name": {"type": "text"}}}));

        let body: Value = serde_json::to_value(&structure).unwrap();
        assert_eq!(
            body,
            json!({"mappings": {"properties": {"name": {"type": "text"}}}})
        );
    }

    #[test]
    fn test_index_structure_deserializes_partial_payload() {
        let structure: IndexStructure =
            serde_json::from_value(json!({"settings": {"number_of_shards": "1"}})).unwrap();
        assert_eq!(structure.name, "");
        assert!(structure.aliases.is_none());
        assert!(structure.mappings.is_none());
        assert!(structure.settings.is_some());
    }
}
