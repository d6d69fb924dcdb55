//! Thin async client for Elasticsearch-compatible document stores.
//!
//! Wraps the HTTP/JSON REST API of Elasticsearch and OpenSearch with typed
//! operations for document CRUD, search, and bulk indexing. The store owns
//! index lifecycle, sharding, and ranking; this crate builds requests and
//! parses responses, nothing more.
//!
//! # Example
//!
//! ```rust,no_run
//! use elastic_client::{Client, ClientConfig, Entity, SetParams};
//! use serde_json::json;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = ClientConfig::new("localhost")
//!         .with_port(9200)
//!         .with_user("reader")
//!         .with_password("sesame");
//!     let client = Client::new(config)?;
//!
//!     // Look up one document.
//!     let docs = client.documents();
//!     if let Some(article) = docs.get("article-1", "articles").await? {
//!         println!("title: {}", article["title"]);
//!     }
//!
//!     // Batch changes through the bulk API.
//!     let mut fresh = Entity::new();
//!     fresh.insert("title".to_string(), json!("Hello search"));
//!     let outcome = docs
//!         .set(
//!             &SetParams {
//!                 to_add: vec![fresh],
//!                 ..Default::default()
//!             },
//!             "articles",
//!             true,
//!         )
//!         .await;
//!     println!("added {} documents", outcome.added);
//!
//!     Ok(())
//! }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

mod bulk;
mod client;
mod config;
mod dates;
mod document;
mod error;
mod index;
mod search;

pub use client::Client;
pub use config::ClientConfig;
pub use dates::{from_elastic_date, to_elastic_date};
pub use document::{Documents, Entity, SetParams, SetResult};
pub use error::{Error, Result};
pub use index::{Indice, IndexStructure, Indices};
pub use search::SearchResult;

/// Prelude for common imports.
pub mod prelude {
    pub use crate::{
        Client, ClientConfig, Entity, Error, Result, SearchResult, SetParams, SetResult,
    };
}
