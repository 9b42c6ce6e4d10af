//! Remote quad store speaking the SPARQL 1.1 Protocol over HTTP.

use super::{QuadStore, Row, StoreError, StoreResult};
use async_trait::async_trait;
use oxrdf::{BlankNode, GraphName, Literal, NamedNode, Quad, Term};
use serde::Deserialize;
use std::collections::HashMap;
use std::fmt::Write as _;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;
use tracing::debug;

/// Client for a remote SPARQL 1.1 endpoint accepting queries and updates
/// at a single URL.
pub struct RemoteQuadStore {
    client: reqwest::Client,
    endpoint: String,
    open: AtomicBool,
}

#[derive(Deserialize)]
struct SparqlJsonResults {
    results: SparqlJsonBindings,
}

#[derive(Deserialize)]
struct SparqlJsonBindings {
    bindings: Vec<HashMap<String, SparqlJsonTerm>>,
}

#[derive(Deserialize)]
struct SparqlJsonTerm {
    #[serde(rename = "type")]
    kind: String,
    value: String,
    datatype: Option<String>,
    #[serde(rename = "xml:lang")]
    lang: Option<String>,
}

impl SparqlJsonTerm {
    fn into_term(self) -> StoreResult<Term> {
        match self.kind.as_str() {
            "uri" => NamedNode::new(self.value)
                .map(Term::from)
                .map_err(|e| StoreError::Protocol(e.to_string())),
            "bnode" => BlankNode::new(self.value)
                .map(Term::from)
                .map_err(|e| StoreError::Protocol(e.to_string())),
            "literal" | "typed-literal" => {
                if let Some(lang) = self.lang {
                    Literal::new_language_tagged_literal(self.value, lang)
                        .map(Term::from)
                        .map_err(|e| StoreError::Protocol(e.to_string()))
                } else if let Some(datatype) = self.datatype {
                    let datatype = NamedNode::new(datatype)
                        .map_err(|e| StoreError::Protocol(e.to_string()))?;
                    Ok(Term::from(Literal::new_typed_literal(self.value, datatype)))
                } else {
                    Ok(Term::from(Literal::new_simple_literal(self.value)))
                }
            }
            other => Err(StoreError::Protocol(format!(
                "Unknown term type in results: {other}"
            ))),
        }
    }
}

impl RemoteQuadStore {
    /// Create a client for the given endpoint URL
    pub fn new(endpoint: &str) -> StoreResult<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(30))
            .build()
            .map_err(|e| StoreError::Network(e.to_string()))?;
        Ok(Self {
            client,
            endpoint: endpoint.to_string(),
            open: AtomicBool::new(true),
        })
    }

    fn ensure_open(&self) -> StoreResult<()> {
        if self.open.load(Ordering::SeqCst) {
            Ok(())
        } else {
            Err(StoreError::Closed)
        }
    }

    async fn post(
        &self,
        content_type: &'static str,
        accept: &'static str,
        body: String,
    ) -> StoreResult<reqwest::Response> {
        let resp = self
            .client
            .post(&self.endpoint)
            .header("Content-Type", content_type)
            .header("Accept", accept)
            .body(body)
            .send()
            .await
            .map_err(|e| StoreError::Network(e.to_string()))?;
        if !resp.status().is_success() {
            let status = resp.status();
            let text = resp.text().await.unwrap_or_default();
            return Err(StoreError::Protocol(format!(
                "Endpoint returned {status}: {text}"
            )));
        }
        Ok(resp)
    }
}

#[async_trait]
impl QuadStore for RemoteQuadStore {
    async fn select(&self, query: &str) -> StoreResult<Vec<Row>> {
        self.ensure_open()?;
        debug!("Sending query to {}: {}", self.endpoint, query);
        let resp = self
            .post(
                "application/sparql-query",
                "application/sparql-results+json",
                query.to_string(),
            )
            .await?;
        let body = resp
            .bytes()
            .await
            .map_err(|e| StoreError::Network(e.to_string()))?;
        let decoded: SparqlJsonResults =
            serde_json::from_slice(&body).map_err(|e| StoreError::Protocol(e.to_string()))?;
        let mut rows = Vec::with_capacity(decoded.results.bindings.len());
        for binding in decoded.results.bindings {
            let mut pairs = Vec::with_capacity(binding.len());
            for (variable, term) in binding {
                pairs.push((variable, term.into_term()?));
            }
            rows.push(Row::from_bindings(pairs));
        }
        Ok(rows)
    }

    async fn update(&self, request: &str) -> StoreResult<()> {
        self.ensure_open()?;
        debug!("Sending update to {}: {}", self.endpoint, request);
        self.post(
            "application/sparql-update",
            "*/*",
            request.to_string(),
        )
        .await?;
        Ok(())
    }

    async fn load_dataset(&self, quads: Vec<Quad>) -> StoreResult<()> {
        if quads.is_empty() {
            return Ok(());
        }
        let mut request = String::from("INSERT DATA {\n");
        for quad in &quads {
            match &quad.graph_name {
                GraphName::DefaultGraph => {
                    let _ = writeln!(
                        request,
                        "{} {} {} .",
                        quad.subject, quad.predicate, quad.object
                    );
                }
                graph => {
                    let _ = writeln!(
                        request,
                        "GRAPH {} {{ {} {} {} . }}",
                        graph, quad.subject, quad.predicate, quad.object
                    );
                }
            }
        }
        request.push('}');
        self.update(&request).await
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

    #[test]
    fn test_json_term_decoding() {
        let term = SparqlJsonTerm {
            kind: "uri".to_string(),
            value: "http://example.com/s".to_string(),
            datatype: None,
            lang: None,
        };
        assert_eq!(
            term.into_term().unwrap(),
            Term::from(NamedNode::new("http://example.com/s").unwrap())
        );

        let term = SparqlJsonTerm {
            kind: "literal".to_string(),
            value: "bonjour".to_string(),
            datatype: None,
            lang: Some("fr".to_string()),
        };
        assert_eq!(
            term.into_term().unwrap(),
            Term::from(Literal::new_language_tagged_literal("bonjour", "fr").unwrap())
        );

        let term = SparqlJsonTerm {
            kind: "literal".to_string(),
            value: "10".to_string(),
            datatype: Some("http://www.w3.org/2001/XMLSchema#long".to_string()),
            lang: None,
        };
        assert_eq!(
            term.into_term().unwrap(),
            Term::from(Literal::new_typed_literal(
                "10",
                NamedNode::new("http://www.w3.org/2001/XMLSchema#long").unwrap()
            ))
        );
    }

    #[test]
    fn test_unknown_term_type_is_protocol_error() {
        let term = SparqlJsonTerm {
            kind: "triple".to_string(),
            value: String::new(),
            datatype: None,
            lang: None,
        };
        assert!(matches!(
            term.into_term().unwrap_err(),
            StoreError::Protocol(_)
        ));
    }

    #[tokio::test]
    async fn test_unreachable_endpoint_is_network_error() {
        let store = RemoteQuadStore::new("http://127.0.0.1:1/sparql").unwrap();
        let err = store.select("SELECT ?s WHERE { ?s ?p ?o }").await.unwrap_err();
        assert!(matches!(err, StoreError::Network(_)));
    }
}
