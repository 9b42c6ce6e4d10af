//! Service configuration.

use oxrdf::NamedNode;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tracing::warn;

/// Default root resource identifier.
pub const DEFAULT_ROOT: &str = "trellis:data";

/// Resource service configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Backend location: absent for an in-memory dataset, an `http(s)://`
    /// URL for a remote SPARQL endpoint, any other value for an on-disk
    /// dataset at that filesystem path.
    pub rdf_location: Option<String>,
    /// Include the synthetic LDP-type quad in the server-managed stream.
    pub include_ldp_type: bool,
    /// Comma-separated `name=IRI` pairs registering extension graphs.
    /// Malformed pairs are dropped, never an error.
    pub extension_graphs: Option<String>,
    /// Root resource identifier, bootstrapped by `initialize`.
    pub root: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            rdf_location: None,
            include_ldp_type: true,
            extension_graphs: None,
            root: DEFAULT_ROOT.to_string(),
        }
    }
}

impl Config {
    /// Create a configuration with defaults
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a configuration from flat `key=value` pairs, recognizing the
    /// hyphenated keys `rdf-location`, `include-ldp-type`,
    /// `extension-graphs` and `root`. Unknown keys are ignored.
    pub fn from_pairs<'a>(pairs: impl IntoIterator<Item = (&'a str, &'a str)>) -> Self {
        let mut config = Self::default();
        for (key, value) in pairs {
            match key.trim() {
                "rdf-location" => config.rdf_location = Some(value.trim().to_string()),
                "include-ldp-type" => {
                    config.include_ldp_type = value.trim().eq_ignore_ascii_case("true");
                }
                "extension-graphs" => config.extension_graphs = Some(value.to_string()),
                "root" => config.root = value.trim().to_string(),
                other => warn!("Ignoring unrecognized configuration key: {}", other),
            }
        }
        config
    }

    /// Parse the registered extension graphs into a `name -> IRI` map.
    ///
    /// Whitespace around names and IRIs is trimmed. Pairs without an `=`,
    /// with an empty name, with an invalid IRI, or shadowing the built-in
    /// `audit`/`acl` extensions are dropped with a warning.
    pub fn extensions(&self) -> BTreeMap<String, NamedNode> {
        let mut extensions = BTreeMap::new();
        let Some(raw) = self.extension_graphs.as_deref() else {
            return extensions;
        };
        for item in raw.split(',') {
            let item = item.trim();
            if item.is_empty() {
                continue;
            }
            let Some((name, iri)) = item.split_once('=') else {
                warn!("Dropping malformed extension graph entry: {}", item);
                continue;
            };
            let name = name.trim();
            let iri = iri.trim();
            if name.is_empty() {
                warn!("Dropping extension graph entry with empty name: {}", item);
                continue;
            }
            if name == "audit" || name == "acl" {
                warn!("Extension graph name {} is built in; dropping", name);
                continue;
            }
            match NamedNode::new(iri) {
                Ok(node) => {
                    extensions.insert(name.to_string(), node);
                }
                Err(e) => warn!("Dropping extension graph {} with invalid IRI: {}", name, e),
            }
        }
        extensions
    }
}
