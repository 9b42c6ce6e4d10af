//! Quad-store adapter: a thin async contract over a transactional
//! multi-graph RDF store, with embedded and remote backends.

mod embedded;
mod remote;

pub use embedded::EmbeddedQuadStore;
pub use remote::RemoteQuadStore;

use crate::config::Config;
use async_trait::async_trait;
use oxrdf::{Quad, Term};
use std::collections::HashMap;
use std::sync::Arc;
use thiserror::Error;
use tracing::info;

/// Quad-store errors
#[derive(Error, Debug)]
pub enum StoreError {
    /// Backend failure (query evaluation, storage, transaction)
    #[error("Backend error: {0}")]
    Backend(String),

    /// Network failure reaching a remote endpoint
    #[error("Network error: {0}")]
    Network(String),

    /// Protocol-level failure from a remote endpoint
    #[error("Protocol error: {0}")]
    Protocol(String),

    /// The store handle has been closed
    #[error("Store is closed")]
    Closed,
}

pub type StoreResult<T> = Result<T, StoreError>;

/// One row of a SELECT result: variable name → RDF term bindings.
#[derive(Debug, Clone, Default)]
pub struct Row {
    bindings: HashMap<String, Term>,
}

impl Row {
    /// Create a row from variable/term pairs
    pub fn from_bindings(bindings: impl IntoIterator<Item = (String, Term)>) -> Self {
        Self {
            bindings: bindings.into_iter().collect(),
        }
    }

    /// Get the binding of a variable, if any
    pub fn get(&self, variable: &str) -> Option<&Term> {
        self.bindings.get(variable)
    }
}

/// Contract over a transactional SPARQL-capable quad store.
///
/// `update` requests MUST be applied atomically: either every operation
/// in the request takes effect or none does. The concrete backend may be
/// in-process, embedded on-disk, or remote.
#[async_trait]
pub trait QuadStore: Send + Sync {
    /// Evaluate a SPARQL SELECT query and return its rows
    async fn select(&self, query: &str) -> StoreResult<Vec<Row>>;

    /// Apply a SPARQL UPDATE request as a single transaction
    async fn update(&self, request: &str) -> StoreResult<()>;

    /// Atomically add a set of quads to the dataset
    async fn load_dataset(&self, quads: Vec<Quad>) -> StoreResult<()>;

    /// Whether the handle is open
    fn is_open(&self) -> bool;

    /// Release the handle; later operations fail with [`StoreError::Closed`]
    async fn close(&self) -> StoreResult<()>;
}

/// Open the quad store selected by the configuration's `rdf_location`:
/// absent for in-memory, `http(s)://` for a remote SPARQL endpoint,
/// anything else for an on-disk dataset at that path.
pub fn connect(config: &Config) -> StoreResult<Arc<dyn QuadStore>> {
    match config.rdf_location.as_deref() {
        None => {
            info!("Opening in-memory RDF dataset");
            Ok(Arc::new(EmbeddedQuadStore::in_memory()?))
        }
        Some(location) if location.starts_with("http://") || location.starts_with("https://") => {
            info!("Connecting to remote SPARQL endpoint: {}", location);
            Ok(Arc::new(RemoteQuadStore::new(location)?))
        }
        Some(path) => {
            info!("Opening on-disk RDF dataset at: {}", path);
            Ok(Arc::new(EmbeddedQuadStore::open(path)?))
        }
    }
}
