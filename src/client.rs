//! Request dispatch against the store's REST API.

use std::sync::Arc;

use parking_lot::Mutex;
use reqwest::Method;
use reqwest::header::CONTENT_TYPE;
use serde_json::Value;
use tracing::{debug, info};

use crate::{config::ClientConfig, document::Documents, error::Result, index::Indices};

/// Client for an Elasticsearch-compatible store.
///
/// Cheap to clone; clones share the HTTP transport and the last-query
/// diagnostic. Reconfiguration means constructing a new client.
#[derive(Clone)]
pub struct Client {
    http: reqwest::Client,
    config: Arc<ClientConfig>,
    base_url: String,
    last_query: Arc<Mutex<Option<String>>>,
}

impl Client {
    /// Create a new client from the given configuration.
    pub fn new(config: ClientConfig) -> Result<Self> {
        let base_url = config.base_url()?;
        info!("Initializing store client for {}", config.host);

        let http = reqwest::Client::builder().build()?;

        Ok(Self {
            http,
            config: Arc::new(config),
            base_url,
            last_query: Arc::new(Mutex::new(None)),
        })
    }

    /// Get the configuration.
    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    /// Get a handle for document operations.
    pub fn documents(&self) -> Documents {
        Documents::new(self.clone())
    }

    /// Get a handle for index operations.
    pub fn indices(&self) -> Indices {
        Indices::new(self.clone())
    }

    /// The URL and body of the most recent request that carried a body,
    /// joined by a newline. Useful when debugging rejected queries.
    pub fn last_query(&self) -> Option<String> {
        self.last_query.lock().clone()
    }

    /// Issue one request and decode the response body as JSON.
    ///
    /// The body is decoded whatever the HTTP status; server-side failures
    /// surface as parsed `error` payloads for the caller to classify.
    pub(crate) async fn request(
        &self,
        method: Method,
        endpoint: &str,
        body: Option<String>,
        wait_for_refresh: bool,
    ) -> Result<Value> {
        let response = self.send(method, endpoint, body, wait_for_refresh).await?;
        let bytes = response.bytes().await?;
        Ok(serde_json::from_slice(&bytes)?)
    }

    /// Issue one request and hand back the raw response.
    pub(crate) async fn send(
        &self,
        method: Method,
        endpoint: &str,
        body: Option<String>,
        wait_for_refresh: bool,
    ) -> Result<reqwest::Response> {
        let url = self.request_url(endpoint, wait_for_refresh);
        debug!(%method, %url, "dispatching request");

        // Credentials travel as userinfo in the URL; the transport turns
        // them into the single Authorization header.
        let mut request = self
            .http
            .request(method, &url)
            .header(CONTENT_TYPE, "application/json");
        if let Some(body) = body {
            if !body.is_empty() {
                *self.last_query.lock() = Some(format!("{url}\n{body}"));
            }
            request = request.body(body);
        }

        Ok(request.send().await?)
    }

    /// Join the base URL with an endpoint path, normalizing the leading
    /// slash and appending the refresh flag when requested.
    fn request_url(&self, endpoint: &str, wait_for_refresh: bool) -> String {
        let mut url = if endpoint.starts_with('/') {
            format!("{}{}", self.base_url, endpoint)
        } else {
            format!("{}/{}", self.base_url, endpoint)
        };
        if wait_for_refresh {
            url.push(if url.contains('?') { '&' } else { '?' });
            url.push_str("refresh=wait_for");
        }
        url
    }
}

impl std::fmt::Debug for Client {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Client")
            .field("host", &self.config.host)
            .field("port", &self.config.port)
            .finish()
    }
}
