//! In-process quad store backed by an `oxigraph` dataset, either
//! transient in memory or persisted on disk.

use super::{QuadStore, Row, StoreError, StoreResult};
use async_trait::async_trait;
use oxigraph::sparql::QueryResults;
use oxigraph::store::Store;
use oxrdf::Quad;
use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::task;
use tracing::debug;

/// Embedded quad store. `Store` handles are cheap to clone and share one
/// underlying dataset; blocking SPARQL evaluation runs on the tokio
/// blocking pool.
pub struct EmbeddedQuadStore {
    store: Store,
    open: Arc<AtomicBool>,
}

impl EmbeddedQuadStore {
    /// Create a transient in-memory dataset
    pub fn in_memory() -> StoreResult<Self> {
        let store = Store::new().map_err(|e| StoreError::Backend(e.to_string()))?;
        Ok(Self {
            store,
            open: Arc::new(AtomicBool::new(true)),
        })
    }

    /// Open (creating if needed) an on-disk dataset at the given path
    pub fn open(path: impl AsRef<Path>) -> StoreResult<Self> {
        let store = Store::open(path).map_err(|e| StoreError::Backend(e.to_string()))?;
        Ok(Self {
            store,
            open: Arc::new(AtomicBool::new(true)),
        })
    }

    fn ensure_open(&self) -> StoreResult<()> {
        if self.open.load(Ordering::SeqCst) {
            Ok(())
        } else {
            Err(StoreError::Closed)
        }
    }
}

#[async_trait]
impl QuadStore for EmbeddedQuadStore {
    async fn select(&self, query: &str) -> StoreResult<Vec<Row>> {
        self.ensure_open()?;
        let store = self.store.clone();
        let query = query.to_owned();
        task::spawn_blocking(move || {
            debug!("Evaluating query: {}", query);
            let results = store
                .query(query.as_str())
                .map_err(|e| StoreError::Backend(e.to_string()))?;
            let mut rows = Vec::new();
            if let QueryResults::Solutions(solutions) = results {
                for solution in solutions {
                    let solution = solution.map_err(|e| StoreError::Backend(e.to_string()))?;
                    rows.push(Row::from_bindings(
                        solution
                            .iter()
                            .map(|(variable, term)| (variable.as_str().to_string(), term.clone())),
                    ));
                }
            }
            Ok(rows)
        })
        .await
        .map_err(|e| StoreError::Backend(e.to_string()))?
    }

    async fn update(&self, request: &str) -> StoreResult<()> {
        self.ensure_open()?;
        let store = self.store.clone();
        let request = request.to_owned();
        task::spawn_blocking(move || {
            debug!("Applying update: {}", request);
            store
                .update(request.as_str())
                .map_err(|e| StoreError::Backend(e.to_string()))
        })
        .await
        .map_err(|e| StoreError::Backend(e.to_string()))?
    }

    async fn load_dataset(&self, quads: Vec<Quad>) -> StoreResult<()> {
        self.ensure_open()?;
        let store = self.store.clone();
        task::spawn_blocking(move || {
            store
                .extend(quads)
                .map_err(|e| StoreError::Backend(e.to_string()))
        })
        .await
        .map_err(|e| StoreError::Backend(e.to_string()))?
    }

    fn is_open(&self) -> bool {
        self.open.load(Ordering::SeqCst)
    }

    async fn close(&self) -> StoreResult<()> {
        self.open.store(false, Ordering::SeqCst);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use oxrdf::{GraphName, NamedNode, Term};

    fn quad(s: &str, p: &str, o: &str, g: &str) -> Quad {
        Quad::new(
            NamedNode::new(s).unwrap(),
            NamedNode::new(p).unwrap(),
            NamedNode::new(o).unwrap(),
            GraphName::NamedNode(NamedNode::new(g).unwrap()),
        )
    }

    #[tokio::test]
    async fn test_load_and_select() {
        let store = EmbeddedQuadStore::in_memory().unwrap();
        store
            .load_dataset(vec![quad(
                "http://example.com/s",
                "http://example.com/p",
                "http://example.com/o",
                "http://example.com/g",
            )])
            .await
            .unwrap();

        let rows = store
            .select("SELECT ?o WHERE { GRAPH <http://example.com/g> { <http://example.com/s> <http://example.com/p> ?o } }")
            .await
            .unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(
            rows[0].get("o"),
            Some(&Term::from(NamedNode::new("http://example.com/o").unwrap()))
        );
    }

    #[tokio::test]
    async fn test_update_is_applied() {
        let store = EmbeddedQuadStore::in_memory().unwrap();
        store
            .update("INSERT DATA { GRAPH <http://example.com/g> { <http://example.com/s> <http://example.com/p> \"v\" } }")
            .await
            .unwrap();
        let rows = store
            .select("SELECT ?s WHERE { GRAPH ?g { ?s ?p ?o } }")
            .await
            .unwrap();
        assert_eq!(rows.len(), 1);
    }

    #[tokio::test]
    async fn test_malformed_update_is_backend_error() {
        let store = EmbeddedQuadStore::in_memory().unwrap();
        let err = store.update("THIS IS NOT SPARQL").await.unwrap_err();
        assert!(matches!(err, StoreError::Backend(_)));
    }

    #[tokio::test]
    async fn test_closed_store_rejects_operations() {
        let store = EmbeddedQuadStore::in_memory().unwrap();
        store.close().await.unwrap();
        let err = store.select("SELECT ?s WHERE { ?s ?p ?o }").await.unwrap_err();
        assert!(matches!(err, StoreError::Closed));
    }
}
