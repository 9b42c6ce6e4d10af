//! Ashraya Linked Data Platform resource service
//!
//! A Linked Data Platform (LDP) resource service backed by an RDF quad
//! store. Resources are persisted as named graphs inside a single
//! multi-graph dataset and exposed through a uniform asynchronous API;
//! the service maintains the containment and membership relationships
//! the LDP specification prescribes.
//!
//! # Architecture
//!
//! - `store`: async adapter over a transactional SPARQL-capable quad
//!   store, with an embedded (in-memory or on-disk) backend and a remote
//!   SPARQL 1.1 Protocol backend
//! - `graphs`: the calculus mapping a resource IRI to its named graphs
//! - `resource`: materialization of resources and their per-category
//!   quad streams, including containment and membership inference
//! - `planner`: compilation of mutations into single-transaction SPARQL
//!   UPDATE requests with modification-time propagation
//! - `service`: the public resource API and the idempotent root
//!   bootstrap
//!
//! # Example Usage
//!
//! ```rust
//! use ashraya::{Config, ResourceService};
//!
//! # #[tokio::main]
//! # async fn main() -> Result<(), Box<dyn std::error::Error>> {
//! // In-memory dataset; point rdf_location at a path or a SPARQL
//! // endpoint for persistent or remote storage.
//! let config = Config::default();
//! let store = ashraya::store::connect(&config)?;
//! let service = ResourceService::new(store, &config)?;
//!
//! // Bootstrap the root container (safe to call repeatedly).
//! service.initialize().await?;
//!
//! let root = service.get(service.root()).await?;
//! assert!(root.resource().is_some());
//! # Ok(())
//! # }
//! ```

#![warn(clippy::all)]

pub mod config;
pub mod graphs;
pub mod health;
pub mod model;
pub mod planner;
pub mod resource;
pub mod service;
pub mod store;
pub mod vocab;

// Re-export main types for convenience
pub use config::Config;

pub use model::{BinaryMetadata, GraphCategory, InteractionModel, Metadata};

pub use resource::{Resource, ResourceState};

pub use service::{ResourceService, ServiceError, ServiceResult};

pub use store::{QuadStore, Row, StoreError, StoreResult};

pub use health::HealthStatus;

/// Version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Get version string
pub fn version() -> &'static str {
    VERSION
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version() {
        let ver = version();
        assert!(!ver.is_empty());
        assert_eq!(ver, "0.1.0");
    }
}
