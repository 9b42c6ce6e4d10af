//! Resource materialization: assembling a resource's metadata and its
//! per-category quad streams from the backing quad store.
//!
//! Containment and membership triples are never stored; they are inferred
//! here from server-managed metadata at read time.

use crate::graphs::{adjust_container_iri, ext_graph, server_graph};
use crate::model::{BinaryMetadata, GraphCategory, InteractionModel};
use crate::store::{QuadStore, Row, StoreResult};
use crate::vocab::{dc, ldp, trellis};
use chrono::{DateTime, Utc};
use oxrdf::vocab::rdf;
use oxrdf::{GraphName, NamedNode, Quad, Subject, Term};
use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

/// Outcome of resolving an identifier.
#[derive(Clone)]
pub enum ResourceState {
    /// No server-managed record exists for the identifier
    Missing,
    /// A record exists but the resource has been deleted
    Deleted,
    /// The resource exists
    Present(Resource),
}

impl ResourceState {
    /// Whether no record exists
    pub fn is_missing(&self) -> bool {
        matches!(self, ResourceState::Missing)
    }

    /// Whether the resource has been deleted
    pub fn is_deleted(&self) -> bool {
        matches!(self, ResourceState::Deleted)
    }

    /// The materialized resource, if present
    pub fn resource(&self) -> Option<&Resource> {
        match self {
            ResourceState::Present(resource) => Some(resource),
            _ => None,
        }
    }
}

/// A materialized resource handle.
///
/// Metadata accessors read from the snapshot taken by [`Resource::fetch`];
/// the quad stream producers are lazy and re-query the store on every
/// invocation.
#[derive(Clone)]
pub struct Resource {
    identifier: NamedNode,
    store: Arc<dyn QuadStore>,
    extensions: BTreeMap<String, NamedNode>,
    include_ldp_type: bool,
    data: HashMap<NamedNode, Term>,
    binary_data: HashMap<NamedNode, Term>,
}

impl Resource {
    /// Resolve an identifier against the server-managed graph.
    ///
    /// A resource exists iff its server-managed record carries both an
    /// `rdf:type` and a `dc:modified` quad; a record whose `dc:type` is
    /// the deletion tombstone resolves to [`ResourceState::Deleted`].
    pub async fn fetch(
        store: Arc<dyn QuadStore>,
        identifier: &NamedNode,
        extensions: BTreeMap<String, NamedNode>,
        include_ldp_type: bool,
    ) -> StoreResult<ResourceState> {
        let query = format!(
            "SELECT ?predicate ?object ?binarySubject ?binaryPredicate ?binaryObject\n\
             WHERE {{ GRAPH {server} {{\n\
             {identifier} ?predicate ?object .\n\
             OPTIONAL {{ {identifier} {has_part} ?binarySubject .\n\
             {identifier} {type_} {non_rdf} .\n\
             ?binarySubject ?binaryPredicate ?binaryObject }}\n\
             }} }}",
            server = server_graph(),
            has_part = dc::HAS_PART,
            type_ = rdf::TYPE,
            non_rdf = ldp::NON_RDF_SOURCE,
        );

        let mut data = HashMap::new();
        let mut binary_data = HashMap::new();
        for row in store.select(&query).await? {
            if let (Some(Term::NamedNode(predicate)), Some(object)) =
                (row.get("predicate"), row.get("object"))
            {
                data.insert(predicate.clone(), object.clone());
            }
            if let (Some(Term::NamedNode(predicate)), Some(object)) =
                (row.get("binaryPredicate"), row.get("binaryObject"))
            {
                binary_data.insert(predicate.clone(), object.clone());
            }
        }

        let type_key = rdf::TYPE.into_owned();
        let modified_key = dc::MODIFIED.into_owned();
        if !data.contains_key(&type_key) || !data.contains_key(&modified_key) {
            return Ok(ResourceState::Missing);
        }
        let tombstone = Term::from(trellis::DELETED_RESOURCE.into_owned());
        if data.get(&dc::TYPE.into_owned()) == Some(&tombstone) {
            return Ok(ResourceState::Deleted);
        }

        Ok(ResourceState::Present(Resource {
            identifier: identifier.clone(),
            store,
            extensions,
            include_ldp_type,
            data,
            binary_data,
        }))
    }

    /// The resource identifier
    pub fn identifier(&self) -> &NamedNode {
        &self.identifier
    }

    /// The LDP interaction model of the resource
    pub fn interaction_model(&self) -> InteractionModel {
        self.object_iri(rdf::TYPE.into_owned())
            .and_then(|iri| InteractionModel::from_iri(iri.as_ref()))
            .unwrap_or(InteractionModel::Resource)
    }

    /// Whether the resource can contain children
    pub fn is_container(&self) -> bool {
        self.interaction_model().is_container()
    }

    /// The most recent modification instant
    pub fn modified(&self) -> Option<DateTime<Utc>> {
        match self.data.get(&dc::MODIFIED.into_owned()) {
            Some(Term::Literal(literal)) => DateTime::parse_from_rfc3339(literal.value())
                .ok()
                .map(|instant| instant.with_timezone(&Utc)),
            _ => None,
        }
    }

    /// The parent container, if any
    pub fn container(&self) -> Option<NamedNode> {
        self.object_iri(dc::IS_PART_OF.into_owned())
    }

    /// The `ldp:membershipResource` of a direct/indirect container
    pub fn membership_resource(&self) -> Option<NamedNode> {
        self.object_iri(ldp::MEMBERSHIP_RESOURCE.into_owned())
    }

    /// The `ldp:hasMemberRelation` of a direct/indirect container
    pub fn member_relation(&self) -> Option<NamedNode> {
        self.object_iri(ldp::HAS_MEMBER_RELATION.into_owned())
    }

    /// The `ldp:isMemberOfRelation` of a direct container
    pub fn member_of_relation(&self) -> Option<NamedNode> {
        self.object_iri(ldp::IS_MEMBER_OF_RELATION.into_owned())
    }

    /// The `ldp:insertedContentRelation` of a direct/indirect container
    pub fn inserted_content_relation(&self) -> Option<NamedNode> {
        self.object_iri(ldp::INSERTED_CONTENT_RELATION.into_owned())
    }

    /// The binary descriptor of an `ldp:NonRDFSource`
    pub fn binary(&self) -> Option<BinaryMetadata> {
        if self.interaction_model() != InteractionModel::NonRdfSource {
            return None;
        }
        let identifier = self.object_iri(dc::HAS_PART.into_owned())?;
        let mime_type = match self.binary_data.get(&dc::FORMAT.into_owned()) {
            Some(Term::Literal(literal)) => literal.value().to_string(),
            _ => return None,
        };
        let size = match self.binary_data.get(&dc::EXTENT.into_owned()) {
            Some(Term::Literal(literal)) => literal.value().parse::<i64>().ok(),
            _ => None,
        };
        let modified = match self.binary_data.get(&dc::MODIFIED.into_owned()) {
            Some(Term::Literal(literal)) => DateTime::parse_from_rfc3339(literal.value())
                .ok()
                .map(|instant| instant.with_timezone(&Utc)),
            _ => None,
        };
        Some(BinaryMetadata {
            identifier,
            mime_type,
            size,
            modified,
        })
    }

    /// The identifier as projected outward: with a trailing slash iff the
    /// resource is a container.
    pub fn adjusted_identifier(&self) -> NamedNode {
        adjust_container_iri(self.identifier.as_ref(), self.interaction_model())
    }

    /// All quads of the resource across every category, concatenated.
    pub async fn stream_all(&self) -> StoreResult<Vec<Quad>> {
        let mut categories = vec![
            GraphCategory::UserManaged,
            GraphCategory::ServerManaged,
            GraphCategory::Audit,
            GraphCategory::AccessControl,
            GraphCategory::Containment,
            GraphCategory::Membership,
        ];
        for iri in self.extensions.values() {
            categories.push(GraphCategory::Extension(iri.clone()));
        }
        self.stream(&categories).await
    }

    /// The quads of the selected categories, concatenated. Each invocation
    /// re-queries the store.
    pub async fn stream(&self, categories: &[GraphCategory]) -> StoreResult<Vec<Quad>> {
        let mut quads = Vec::new();
        for category in categories {
            match category {
                GraphCategory::UserManaged => {
                    let graph = self.identifier.clone();
                    quads.extend(self.fetch_graph(&graph, category).await?);
                }
                GraphCategory::ServerManaged => quads.extend(self.ldp_type_quads()),
                GraphCategory::Audit => {
                    let graph = ext_graph(self.identifier.as_ref(), "audit");
                    quads.extend(self.fetch_graph(&graph, category).await?);
                }
                GraphCategory::AccessControl => {
                    let graph = ext_graph(self.identifier.as_ref(), "acl");
                    quads.extend(self.fetch_graph(&graph, category).await?);
                }
                GraphCategory::Containment => quads.extend(self.containment_quads().await?),
                GraphCategory::Membership => quads.extend(self.membership_quads().await?),
                GraphCategory::Extension(iri) => {
                    if let Some(name) = self.extension_name(iri) {
                        let graph = ext_graph(self.identifier.as_ref(), &name);
                        quads.extend(self.fetch_graph(&graph, category).await?);
                    }
                }
            }
        }
        Ok(quads)
    }

    /// Probe whether a category has any quad, without materializing the
    /// full stream.
    pub async fn has_metadata(&self, category: &GraphCategory) -> StoreResult<bool> {
        match category {
            GraphCategory::UserManaged => {
                let graph = self.identifier.clone();
                self.probe(&graph_query(&graph)).await
            }
            GraphCategory::ServerManaged => Ok(self.include_ldp_type),
            GraphCategory::Audit => {
                let graph = ext_graph(self.identifier.as_ref(), "audit");
                self.probe(&graph_query(&graph)).await
            }
            GraphCategory::AccessControl => {
                let graph = ext_graph(self.identifier.as_ref(), "acl");
                self.probe(&graph_query(&graph)).await
            }
            GraphCategory::Containment => {
                if !self.is_container() {
                    return Ok(false);
                }
                self.probe(&self.containment_query()).await
            }
            GraphCategory::Membership => {
                for query in self.membership_queries() {
                    if self.probe(&query).await? {
                        return Ok(true);
                    }
                }
                Ok(false)
            }
            GraphCategory::Extension(iri) => match self.extension_name(iri) {
                Some(name) => {
                    let graph = ext_graph(self.identifier.as_ref(), &name);
                    self.probe(&graph_query(&graph)).await
                }
                None => Ok(false),
            },
        }
    }

    fn extension_name(&self, iri: &NamedNode) -> Option<String> {
        self.extensions
            .iter()
            .find(|(_, registered)| *registered == iri)
            .map(|(name, _)| name.clone())
    }

    async fn probe(&self, query: &str) -> StoreResult<bool> {
        let rows = self.store.select(&format!("{query} LIMIT 1")).await?;
        Ok(!rows.is_empty())
    }

    /// Fetch all quads of a concrete named graph, re-labeled into the
    /// category graph.
    async fn fetch_graph(
        &self,
        graph: &NamedNode,
        category: &GraphCategory,
    ) -> StoreResult<Vec<Quad>> {
        let rows = self.store.select(&graph_query(graph)).await?;
        let category_graph = GraphName::NamedNode(category.iri().into_owned());
        Ok(rows
            .iter()
            .filter_map(|row| {
                let subject = term_to_subject(row.get("subject")?)?;
                let predicate = term_to_named_node(row.get("predicate")?)?;
                let object = row.get("object")?.clone();
                Some(Quad::new(subject, predicate, object, category_graph.clone()))
            })
            .collect())
    }

    /// The synthetic server-managed quad exposing the LDP type.
    fn ldp_type_quads(&self) -> Vec<Quad> {
        if !self.include_ldp_type {
            return Vec::new();
        }
        vec![Quad::new(
            self.adjusted_identifier(),
            rdf::TYPE.into_owned(),
            self.interaction_model().iri().into_owned(),
            GraphName::NamedNode(trellis::PREFER_SERVER_MANAGED.into_owned()),
        )]
    }

    fn containment_query(&self) -> String {
        format!(
            "SELECT ?object ?type WHERE {{ GRAPH {server} {{\n\
             ?object {is_part_of} {identifier} .\n\
             ?object {type_} ?type }} }}",
            server = server_graph(),
            is_part_of = dc::IS_PART_OF,
            identifier = self.identifier,
            type_ = rdf::TYPE,
        )
    }

    /// Inferred `ldp:contains` triples, one per child; empty for
    /// non-containers.
    async fn containment_quads(&self) -> StoreResult<Vec<Quad>> {
        if !self.is_container() {
            return Ok(Vec::new());
        }
        let subject = self.adjusted_identifier();
        let rows = self.store.select(&self.containment_query()).await?;
        Ok(rows
            .iter()
            .filter_map(|row| {
                let child = term_to_named_node(row.get("object")?)?;
                let child = adjust_container_iri(child.as_ref(), row_model(row, "type"));
                Some(Quad::new(
                    subject.clone(),
                    ldp::CONTAINS.into_owned(),
                    child,
                    GraphName::NamedNode(ldp::PREFER_CONTAINMENT.into_owned()),
                ))
            })
            .collect())
    }

    /// The three membership sub-queries: indirect, direct forward, and
    /// direct inverse.
    fn membership_queries(&self) -> [String; 3] {
        let indirect = format!(
            "SELECT ?subject ?predicate ?object WHERE {{\n\
             GRAPH {server} {{\n\
             ?s {member} {identifier} .\n\
             ?s {type_} {indirect_container} .\n\
             ?s {membership} ?subject .\n\
             ?s {relation} ?predicate .\n\
             ?s {inserted} ?icr .\n\
             ?res {is_part_of} ?s }}\n\
             GRAPH ?res {{ ?res ?icr ?object }} }}",
            server = server_graph(),
            member = ldp::MEMBER,
            identifier = self.identifier,
            type_ = rdf::TYPE,
            indirect_container = ldp::INDIRECT_CONTAINER,
            membership = ldp::MEMBERSHIP_RESOURCE,
            relation = ldp::HAS_MEMBER_RELATION,
            inserted = ldp::INSERTED_CONTENT_RELATION,
            is_part_of = dc::IS_PART_OF,
        );
        let direct_forward = format!(
            "SELECT ?subject ?predicate ?object ?type WHERE {{ GRAPH {server} {{\n\
             ?s {member} {identifier} .\n\
             ?s {membership} ?subject .\n\
             ?s {relation} ?predicate .\n\
             ?s {inserted} {member_subject} .\n\
             ?object {is_part_of} ?s .\n\
             ?object {type_} ?type }} }}",
            server = server_graph(),
            member = ldp::MEMBER,
            identifier = self.identifier,
            membership = ldp::MEMBERSHIP_RESOURCE,
            relation = ldp::HAS_MEMBER_RELATION,
            inserted = ldp::INSERTED_CONTENT_RELATION,
            member_subject = ldp::MEMBER_SUBJECT,
            is_part_of = dc::IS_PART_OF,
            type_ = rdf::TYPE,
        );
        let direct_inverse = format!(
            "SELECT ?predicate ?object ?type WHERE {{ GRAPH {server} {{\n\
             {identifier} {is_part_of} ?s .\n\
             ?s {inverse_relation} ?predicate .\n\
             ?s {membership} ?object .\n\
             ?s {inserted} {member_subject} .\n\
             ?object {type_} ?type }} }}",
            server = server_graph(),
            identifier = self.identifier,
            is_part_of = dc::IS_PART_OF,
            inverse_relation = ldp::IS_MEMBER_OF_RELATION,
            membership = ldp::MEMBERSHIP_RESOURCE,
            inserted = ldp::INSERTED_CONTENT_RELATION,
            member_subject = ldp::MEMBER_SUBJECT,
            type_ = rdf::TYPE,
        );
        [indirect, direct_forward, direct_inverse]
    }

    /// Inferred membership triples: the concatenation of the indirect,
    /// direct forward, and direct inverse sub-queries. Duplicates are
    /// permitted.
    async fn membership_quads(&self) -> StoreResult<Vec<Quad>> {
        let membership_graph = GraphName::NamedNode(ldp::PREFER_MEMBERSHIP.into_owned());
        let [indirect, direct_forward, direct_inverse] = self.membership_queries();
        let mut quads = Vec::new();

        for row in self.store.select(&indirect).await? {
            let Some(subject) = row.get("subject").and_then(term_to_subject) else {
                continue;
            };
            let Some(predicate) = row.get("predicate").and_then(term_to_named_node) else {
                continue;
            };
            let Some(object) = row.get("object") else {
                continue;
            };
            quads.push(Quad::new(
                subject,
                predicate,
                object.clone(),
                membership_graph.clone(),
            ));
        }

        for row in self.store.select(&direct_forward).await? {
            let Some(subject) = row.get("subject").and_then(term_to_subject) else {
                continue;
            };
            let Some(predicate) = row.get("predicate").and_then(term_to_named_node) else {
                continue;
            };
            let Some(child) = row.get("object").and_then(term_to_named_node) else {
                continue;
            };
            let child = adjust_container_iri(child.as_ref(), row_model(&row, "type"));
            quads.push(Quad::new(
                subject,
                predicate,
                child,
                membership_graph.clone(),
            ));
        }

        for row in self.store.select(&direct_inverse).await? {
            let Some(predicate) = row.get("predicate").and_then(term_to_named_node) else {
                continue;
            };
            let Some(member) = row.get("object").and_then(term_to_named_node) else {
                continue;
            };
            let member = adjust_container_iri(member.as_ref(), row_model(&row, "type"));
            quads.push(Quad::new(
                self.adjusted_identifier(),
                predicate,
                member,
                membership_graph.clone(),
            ));
        }

        Ok(quads)
    }

    fn object_iri(&self, predicate: NamedNode) -> Option<NamedNode> {
        match self.data.get(&predicate) {
            Some(Term::NamedNode(iri)) => Some(iri.clone()),
            _ => None,
        }
    }
}

fn graph_query(graph: &NamedNode) -> String {
    format!("SELECT ?subject ?predicate ?object WHERE {{ GRAPH {graph} {{ ?subject ?predicate ?object }} }}")
}

/// The interaction model bound to a row variable, defaulting to the
/// generic resource model when absent or unknown.
fn row_model(row: &Row, variable: &str) -> InteractionModel {
    row.get(variable)
        .and_then(term_to_named_node)
        .and_then(|iri| InteractionModel::from_iri(iri.as_ref()))
        .unwrap_or(InteractionModel::Resource)
}

fn term_to_subject(term: &Term) -> Option<Subject> {
    match term {
        Term::NamedNode(node) => Some(Subject::NamedNode(node.clone())),
        Term::BlankNode(node) => Some(Subject::BlankNode(node.clone())),
        _ => None,
    }
}

fn term_to_named_node(term: &Term) -> Option<NamedNode> {
    match term {
        Term::NamedNode(node) => Some(node.clone()),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::EmbeddedQuadStore;
    use oxrdf::Literal;

    fn iri(value: &str) -> NamedNode {
        NamedNode::new(value).unwrap()
    }

    async fn seeded_store(quads: Vec<Quad>) -> Arc<dyn QuadStore> {
        let store = EmbeddedQuadStore::in_memory().unwrap();
        store.load_dataset(quads).await.unwrap();
        Arc::new(store)
    }

    fn record(identifier: &NamedNode, model: InteractionModel) -> Vec<Quad> {
        let server = GraphName::NamedNode(trellis::PREFER_SERVER_MANAGED.into_owned());
        vec![
            Quad::new(
                identifier.clone(),
                rdf::TYPE.into_owned(),
                model.iri().into_owned(),
                server.clone(),
            ),
            Quad::new(
                identifier.clone(),
                dc::MODIFIED.into_owned(),
                Literal::new_typed_literal(
                    "2024-03-01T10:00:00.000Z",
                    oxrdf::vocab::xsd::DATE_TIME,
                ),
                server,
            ),
        ]
    }

    #[tokio::test]
    async fn test_fetch_missing() {
        let store = seeded_store(Vec::new()).await;
        let state = Resource::fetch(store, &iri("http://example.com/absent"), BTreeMap::new(), true)
            .await
            .unwrap();
        assert!(state.is_missing());
    }

    #[tokio::test]
    async fn test_type_alone_is_not_existence() {
        let identifier = iri("http://example.com/partial");
        let mut quads = record(&identifier, InteractionModel::RdfSource);
        quads.remove(1); // drop dc:modified
        let store = seeded_store(quads).await;
        let state = Resource::fetch(store, &identifier, BTreeMap::new(), true)
            .await
            .unwrap();
        assert!(state.is_missing());
    }

    #[tokio::test]
    async fn test_fetch_deleted() {
        let identifier = iri("http://example.com/gone");
        let mut quads = record(&identifier, InteractionModel::Resource);
        quads.push(Quad::new(
            identifier.clone(),
            dc::TYPE.into_owned(),
            trellis::DELETED_RESOURCE.into_owned(),
            GraphName::NamedNode(trellis::PREFER_SERVER_MANAGED.into_owned()),
        ));
        let store = seeded_store(quads).await;
        let state = Resource::fetch(store, &identifier, BTreeMap::new(), true)
            .await
            .unwrap();
        assert!(state.is_deleted());
    }

    #[tokio::test]
    async fn test_fetch_present_with_metadata() {
        let identifier = iri("http://example.com/c");
        let store = seeded_store(record(&identifier, InteractionModel::BasicContainer)).await;
        let state = Resource::fetch(store, &identifier, BTreeMap::new(), true)
            .await
            .unwrap();
        let resource = state.resource().expect("resource should exist");
        assert_eq!(
            resource.interaction_model(),
            InteractionModel::BasicContainer
        );
        assert!(resource.is_container());
        assert_eq!(resource.adjusted_identifier().as_str(), "http://example.com/c/");
        assert_eq!(
            resource.modified().unwrap().to_rfc3339(),
            "2024-03-01T10:00:00+00:00"
        );
    }

    #[tokio::test]
    async fn test_ldp_type_quad_toggle() {
        let identifier = iri("http://example.com/r");
        let store = seeded_store(record(&identifier, InteractionModel::RdfSource)).await;
        let state = Resource::fetch(store.clone(), &identifier, BTreeMap::new(), false)
            .await
            .unwrap();
        let resource = state.resource().unwrap();
        let quads = resource.stream(&[GraphCategory::ServerManaged]).await.unwrap();
        assert!(quads.is_empty());
        assert!(!resource.has_metadata(&GraphCategory::ServerManaged).await.unwrap());

        let state = Resource::fetch(store, &identifier, BTreeMap::new(), true)
            .await
            .unwrap();
        let resource = state.resource().unwrap();
        let quads = resource.stream(&[GraphCategory::ServerManaged]).await.unwrap();
        assert_eq!(quads.len(), 1);
        assert_eq!(quads[0].predicate, rdf::TYPE.into_owned());
    }

    #[tokio::test]
    async fn test_user_stream_relabels_into_category() {
        let identifier = iri("http://example.com/r");
        let mut quads = record(&identifier, InteractionModel::RdfSource);
        quads.push(Quad::new(
            identifier.clone(),
            iri("http://purl.org/dc/terms/title"),
            Literal::new_simple_literal("a title"),
            GraphName::NamedNode(identifier.clone()),
        ));
        let store = seeded_store(quads).await;
        let state = Resource::fetch(store, &identifier, BTreeMap::new(), true)
            .await
            .unwrap();
        let resource = state.resource().unwrap();
        let quads = resource.stream(&[GraphCategory::UserManaged]).await.unwrap();
        assert_eq!(quads.len(), 1);
        assert_eq!(
            quads[0].graph_name,
            GraphName::NamedNode(trellis::PREFER_USER_MANAGED.into_owned())
        );
        assert!(resource.has_metadata(&GraphCategory::UserManaged).await.unwrap());
        assert!(!resource.has_metadata(&GraphCategory::Audit).await.unwrap());
    }
}
