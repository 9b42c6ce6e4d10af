//! The resource service facade: orchestrates the materializer, the
//! update planner, and the quad-store adapter.

use crate::config::Config;
use crate::graphs::{ext_graph, normalize, normalize_str, server_graph};
use crate::health::HealthStatus;
use crate::model::{InteractionModel, Metadata};
use crate::planner::{self, Operation};
use crate::resource::{Resource, ResourceState};
use crate::store::{QuadStore, StoreError};
use crate::vocab::{acl, dc, foaf, ldp, trellis};
use chrono::Utc;
use oxrdf::vocab::{rdf, xsd};
use oxrdf::{Dataset, GraphNameRef, Literal, NamedNode, NamedNodeRef, QuadRef, SubjectRef, TermRef};
use std::collections::BTreeMap;
use std::fmt::Write as _;
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, info};
use uuid::Uuid;

/// Resource service errors
#[derive(Error, Debug)]
pub enum ServiceError {
    /// Backend failure, never retried
    #[error("Backend failure: {0}")]
    Backend(#[from] StoreError),

    /// Invalid construction input
    #[error("Invalid configuration: {0}")]
    Configuration(String),
}

pub type ServiceResult<T> = Result<T, ServiceError>;

/// Asynchronous LDP resource service over a transactional quad store.
///
/// The service holds exactly one adapter handle for its lifetime. Every
/// mutating method compiles one UPDATE request and resolves when the
/// backend transaction completes; reads return eagerly with lazy
/// quad-producing handles.
pub struct ResourceService {
    store: Arc<dyn QuadStore>,
    root: NamedNode,
    include_ldp_type: bool,
    extensions: BTreeMap<String, NamedNode>,
}

impl ResourceService {
    /// Create a service over an open quad store
    pub fn new(store: Arc<dyn QuadStore>, config: &Config) -> ServiceResult<Self> {
        let root = NamedNode::new(normalize_str(&config.root))
            .map_err(|e| ServiceError::Configuration(format!("Invalid root identifier: {e}")))?;
        Ok(Self {
            store,
            root,
            include_ldp_type: config.include_ldp_type,
            extensions: config.extensions(),
        })
    }

    /// The configured root resource identifier
    pub fn root(&self) -> &NamedNode {
        &self.root
    }

    /// Bring a resource into existence.
    ///
    /// The input dataset is partitioned by category graph; user, acl,
    /// audit, and extension subsets are installed verbatim while the
    /// server-managed subset is augmented with the interaction model,
    /// parent, membership config, and binary descriptor from the
    /// metadata.
    pub async fn create(&self, metadata: Metadata, dataset: Dataset) -> ServiceResult<()> {
        self.mutate(metadata, dataset, Operation::Create).await
    }

    /// Overwrite the state of a resource
    pub async fn replace(&self, metadata: Metadata, dataset: Dataset) -> ServiceResult<()> {
        self.mutate(metadata, dataset, Operation::Replace).await
    }

    /// Tombstone a resource. All of its graphs are cleared; the
    /// server-managed record is reduced to the tombstone pair and a fresh
    /// `dc:modified`. The deleted state is persistent and observable.
    pub async fn delete(&self, metadata: Metadata, mut dataset: Dataset) -> ServiceResult<()> {
        let identifier = normalize(metadata.identifier.as_ref());
        insert_server(&mut dataset, identifier.as_ref(), dc::TYPE, trellis::DELETED_RESOURCE);
        insert_server(&mut dataset, identifier.as_ref(), rdf::TYPE, ldp::RESOURCE);
        let request = planner::plan(
            &identifier,
            Utc::now(),
            &mut dataset,
            Operation::Delete,
            &self.extensions,
        );
        self.store.update(&request).await?;
        info!("Deleted resource: {}", identifier);
        Ok(())
    }

    /// Advance a resource's `dc:modified` without any other change
    pub async fn touch(&self, identifier: &NamedNode) -> ServiceResult<()> {
        let identifier = normalize(identifier.as_ref());
        let request = planner::touch_request(&identifier, Utc::now());
        self.store.update(&request).await?;
        debug!("Touched resource: {}", identifier);
        Ok(())
    }

    /// Resolve an identifier to its current state. Absent and deleted
    /// resources are sentinels, not errors.
    pub async fn get(&self, identifier: &NamedNode) -> ServiceResult<ResourceState> {
        let identifier = normalize(identifier.as_ref());
        Ok(Resource::fetch(
            self.store.clone(),
            &identifier,
            self.extensions.clone(),
            self.include_ldp_type,
        )
        .await?)
    }

    /// Append the dataset's audit subset to the resource's audit graph
    pub async fn add(&self, identifier: &NamedNode, dataset: Dataset) -> ServiceResult<()> {
        let identifier = normalize(identifier.as_ref());
        let mut triples = String::new();
        for quad in dataset.quads_for_graph_name(trellis::PREFER_AUDIT) {
            let _ = writeln!(
                triples,
                "{} {} {} .",
                quad.subject, quad.predicate, quad.object
            );
        }
        if triples.is_empty() {
            return Ok(());
        }
        let graph = ext_graph(identifier.as_ref(), "audit");
        let request = format!("INSERT DATA {{ GRAPH {graph} {{\n{triples}}} }}");
        self.store.update(&request).await?;
        debug!("Added audit quads to: {}", identifier);
        Ok(())
    }

    /// Generate a fresh unique identifier suffix
    pub fn generate_identifier(&self) -> String {
        Uuid::new_v4().to_string()
    }

    /// The fixed set of interaction models this service supports
    pub fn supported_interaction_models(&self) -> &'static [InteractionModel] {
        &InteractionModel::ALL
    }

    /// Idempotent bootstrap: install the root basic container with the
    /// default ACL if no root record exists yet.
    pub async fn initialize(&self) -> ServiceResult<()> {
        let probe = format!(
            "SELECT ?type WHERE {{ GRAPH {server} {{ {root} {type_} ?type }} }} LIMIT 1",
            server = server_graph(),
            root = self.root,
            type_ = rdf::TYPE,
        );
        if !self.store.select(&probe).await?.is_empty() {
            debug!("Root container already initialized: {}", self.root);
            return Ok(());
        }

        let modified = planner::time_literal(Utc::now());
        let auth = NamedNode::new_unchecked(format!("{}#auth", self.root.as_str()));
        let acl_graph = ext_graph(self.root.as_ref(), "acl");
        let request = format!(
            "INSERT DATA {{\n\
             GRAPH {server} {{\n\
             {root} {type_} {basic_container} .\n\
             {root} {modified_p} {modified} .\n\
             }}\n\
             GRAPH {acl_graph} {{\n\
             {auth} {mode} {read} .\n\
             {auth} {mode} {write} .\n\
             {auth} {mode} {control} .\n\
             {auth} {agent_class} {agent} .\n\
             {auth} {access_to} {root} .\n\
             }}\n}}",
            server = server_graph(),
            root = self.root,
            type_ = rdf::TYPE,
            basic_container = ldp::BASIC_CONTAINER,
            modified_p = dc::MODIFIED,
            mode = acl::MODE,
            read = acl::READ,
            write = acl::WRITE,
            control = acl::CONTROL,
            agent_class = acl::AGENT_CLASS,
            agent = foaf::AGENT,
            access_to = acl::ACCESS_TO,
        );
        self.store.update(&request).await?;
        info!("Initialized root container: {}", self.root);
        Ok(())
    }

    /// Connectivity state of the backend adapter; no I/O.
    pub fn health(&self) -> HealthStatus {
        if self.store.is_open() {
            HealthStatus::Up
        } else {
            HealthStatus::Down
        }
    }

    async fn mutate(
        &self,
        metadata: Metadata,
        mut dataset: Dataset,
        operation: Operation,
    ) -> ServiceResult<()> {
        let identifier = normalize(metadata.identifier.as_ref());
        let model = metadata.interaction_model;
        insert_server(&mut dataset, identifier.as_ref(), rdf::TYPE, model.iri());

        if matches!(
            model,
            InteractionModel::DirectContainer | InteractionModel::IndirectContainer
        ) {
            self.install_membership_config(&metadata, &identifier, &mut dataset);
        }

        if let Some(container) = &metadata.container {
            let parent = normalize(container.as_ref());
            insert_server(&mut dataset, identifier.as_ref(), dc::IS_PART_OF, parent.as_ref());
        }

        if model == InteractionModel::NonRdfSource {
            if let Some(binary) = &metadata.binary {
                insert_server(
                    &mut dataset,
                    identifier.as_ref(),
                    dc::HAS_PART,
                    binary.identifier.as_ref(),
                );
                let mime = Literal::new_simple_literal(&binary.mime_type);
                insert_server(
                    &mut dataset,
                    binary.identifier.as_ref(),
                    dc::FORMAT,
                    mime.as_ref(),
                );
                if let Some(size) = binary.size {
                    let extent = Literal::new_typed_literal(size.to_string(), xsd::LONG);
                    insert_server(
                        &mut dataset,
                        binary.identifier.as_ref(),
                        dc::EXTENT,
                        extent.as_ref(),
                    );
                }
                if let Some(modified) = binary.modified {
                    let stamp = planner::time_literal(modified);
                    insert_server(
                        &mut dataset,
                        binary.identifier.as_ref(),
                        dc::MODIFIED,
                        stamp.as_ref(),
                    );
                }
            }
        }

        let request = planner::plan(
            &identifier,
            Utc::now(),
            &mut dataset,
            operation,
            &self.extensions,
        );
        self.store.update(&request).await?;
        match operation {
            Operation::Create => info!("Created resource: {}", identifier),
            Operation::Replace => info!("Replaced resource: {}", identifier),
            Operation::Delete => {}
        }
        Ok(())
    }

    /// Install the membership configuration of a direct/indirect container
    /// into the server-managed subset: caller metadata wins, the
    /// user-managed input graph supplies the rest, and the
    /// inserted-content relation defaults to `ldp:MemberSubject`.
    fn install_membership_config(
        &self,
        metadata: &Metadata,
        identifier: &NamedNode,
        dataset: &mut Dataset,
    ) {
        let membership_resource = metadata.membership_resource.clone().or_else(|| {
            harvest(dataset, metadata.identifier.as_ref(), ldp::MEMBERSHIP_RESOURCE)
        });
        let member_relation = metadata
            .member_relation
            .clone()
            .or_else(|| harvest(dataset, metadata.identifier.as_ref(), ldp::HAS_MEMBER_RELATION));
        let member_of_relation = metadata.member_of_relation.clone().or_else(|| {
            harvest(dataset, metadata.identifier.as_ref(), ldp::IS_MEMBER_OF_RELATION)
        });
        let inserted_content = metadata
            .inserted_content_relation
            .clone()
            .or_else(|| {
                harvest(
                    dataset,
                    metadata.identifier.as_ref(),
                    ldp::INSERTED_CONTENT_RELATION,
                )
            })
            .unwrap_or_else(|| ldp::MEMBER_SUBJECT.into_owned());

        if let Some(resource) = &membership_resource {
            insert_server(
                dataset,
                identifier.as_ref(),
                ldp::MEMBERSHIP_RESOURCE,
                resource.as_ref(),
            );
            insert_server(
                dataset,
                identifier.as_ref(),
                ldp::MEMBER,
                normalize(resource.as_ref()).as_ref(),
            );
        }
        if let Some(relation) = &member_relation {
            insert_server(
                dataset,
                identifier.as_ref(),
                ldp::HAS_MEMBER_RELATION,
                relation.as_ref(),
            );
        }
        if let Some(relation) = &member_of_relation {
            insert_server(
                dataset,
                identifier.as_ref(),
                ldp::IS_MEMBER_OF_RELATION,
                relation.as_ref(),
            );
        }
        insert_server(
            dataset,
            identifier.as_ref(),
            ldp::INSERTED_CONTENT_RELATION,
            inserted_content.as_ref(),
        );
    }
}

fn insert_server<'a>(
    dataset: &mut Dataset,
    subject: NamedNodeRef<'a>,
    predicate: NamedNodeRef<'a>,
    object: impl Into<TermRef<'a>>,
) {
    dataset.insert(QuadRef::new(
        subject,
        predicate,
        object,
        GraphNameRef::NamedNode(server_graph()),
    ));
}

/// Find an IRI-valued triple `(subject, predicate, ?o)` in the
/// user-managed subset of an input dataset.
fn harvest(
    dataset: &Dataset,
    subject: NamedNodeRef<'_>,
    predicate: NamedNodeRef<'_>,
) -> Option<NamedNode> {
    dataset
        .quads_for_graph_name(trellis::PREFER_USER_MANAGED)
        .find(|quad| {
            quad.subject == SubjectRef::NamedNode(subject) && quad.predicate == predicate
        })
        .and_then(|quad| match quad.object {
            TermRef::NamedNode(node) => Some(node.into_owned()),
            _ => None,
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::connect;

    fn service() -> ResourceService {
        let config = Config::default();
        let store = connect(&config).unwrap();
        ResourceService::new(store, &config).unwrap()
    }

    #[test]
    fn test_invalid_root_is_configuration_error() {
        let config = Config {
            root: "not a valid iri".to_string(),
            ..Config::default()
        };
        let store = connect(&Config::default()).unwrap();
        let err = ResourceService::new(store, &config).unwrap_err();
        assert!(matches!(err, ServiceError::Configuration(_)));
    }

    #[test]
    fn test_root_is_normalized() {
        let config = Config {
            root: "http://example.com/root/".to_string(),
            ..Config::default()
        };
        let store = connect(&Config::default()).unwrap();
        let service = ResourceService::new(store, &config).unwrap();
        assert_eq!(service.root().as_str(), "http://example.com/root");
    }

    #[test]
    fn test_generated_identifiers_are_unique() {
        let service = service();
        let a = service.generate_identifier();
        let b = service.generate_identifier();
        assert_ne!(a, b);
        assert!(!a.is_empty());
    }

    #[test]
    fn test_supported_interaction_models() {
        let service = service();
        let models = service.supported_interaction_models();
        assert_eq!(models.len(), 7);
        assert!(models.contains(&InteractionModel::IndirectContainer));
    }

    #[tokio::test]
    async fn test_health_follows_store_state() {
        let config = Config::default();
        let store = connect(&config).unwrap();
        let service = ResourceService::new(store.clone(), &config).unwrap();
        assert_eq!(service.health(), HealthStatus::Up);
        store.close().await.unwrap();
        assert_eq!(service.health(), HealthStatus::Down);
    }
}
