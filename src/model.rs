//! LDP model types: interaction models, binary descriptors, resource
//! metadata inputs, and the closed set of named-graph categories.

use crate::vocab::{ldp, trellis};
use chrono::{DateTime, Utc};
use oxrdf::{NamedNode, NamedNodeRef};

/// LDP interaction model of a resource.
///
/// Stored as the object of an `rdf:type` triple in the server-managed graph
/// and controlling containment/membership semantics.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum InteractionModel {
    /// `ldp:Resource`
    Resource,
    /// `ldp:RDFSource`
    RdfSource,
    /// `ldp:NonRDFSource`
    NonRdfSource,
    /// `ldp:Container`
    Container,
    /// `ldp:BasicContainer`
    BasicContainer,
    /// `ldp:DirectContainer`
    DirectContainer,
    /// `ldp:IndirectContainer`
    IndirectContainer,
}

impl InteractionModel {
    /// All interaction models the service supports.
    pub const ALL: [InteractionModel; 7] = [
        InteractionModel::Resource,
        InteractionModel::RdfSource,
        InteractionModel::NonRdfSource,
        InteractionModel::Container,
        InteractionModel::BasicContainer,
        InteractionModel::DirectContainer,
        InteractionModel::IndirectContainer,
    ];

    /// Get the LDP class IRI for this interaction model.
    pub fn iri(self) -> NamedNodeRef<'static> {
        match self {
            InteractionModel::Resource => ldp::RESOURCE,
            InteractionModel::RdfSource => ldp::RDF_SOURCE,
            InteractionModel::NonRdfSource => ldp::NON_RDF_SOURCE,
            InteractionModel::Container => ldp::CONTAINER,
            InteractionModel::BasicContainer => ldp::BASIC_CONTAINER,
            InteractionModel::DirectContainer => ldp::DIRECT_CONTAINER,
            InteractionModel::IndirectContainer => ldp::INDIRECT_CONTAINER,
        }
    }

    /// Resolve an LDP class IRI back to an interaction model.
    pub fn from_iri(iri: NamedNodeRef<'_>) -> Option<Self> {
        InteractionModel::ALL.into_iter().find(|im| im.iri() == iri)
    }

    /// Whether this model can acquire children via `dc:isPartOf`.
    pub fn is_container(self) -> bool {
        matches!(
            self,
            InteractionModel::Container
                | InteractionModel::BasicContainer
                | InteractionModel::DirectContainer
                | InteractionModel::IndirectContainer
        )
    }
}

/// Descriptor for the binary content of an `ldp:NonRDFSource`.
///
/// Persisted in the server-managed graph keyed off the binary IRI rather
/// than the resource IRI.
#[derive(Debug, Clone, PartialEq)]
pub struct BinaryMetadata {
    /// IRI of the binary content
    pub identifier: NamedNode,
    /// MIME type of the content
    pub mime_type: String,
    /// Size in bytes, if known
    pub size: Option<i64>,
    /// Modification instant of the content, if known
    pub modified: Option<DateTime<Utc>>,
}

impl BinaryMetadata {
    /// Create a new binary descriptor
    pub fn new(identifier: NamedNode, mime_type: impl Into<String>) -> Self {
        Self {
            identifier,
            mime_type: mime_type.into(),
            size: None,
            modified: None,
        }
    }
}

/// Caller-supplied metadata for a create/replace/delete operation.
#[derive(Debug, Clone)]
pub struct Metadata {
    /// Resource identifier (absolute IRI, trailing-slash-free)
    pub identifier: NamedNode,
    /// Interaction model to install
    pub interaction_model: InteractionModel,
    /// Parent container, if the resource is a child
    pub container: Option<NamedNode>,
    /// `ldp:membershipResource` for direct/indirect containers
    pub membership_resource: Option<NamedNode>,
    /// `ldp:hasMemberRelation` for direct/indirect containers
    pub member_relation: Option<NamedNode>,
    /// `ldp:isMemberOfRelation` for direct containers
    pub member_of_relation: Option<NamedNode>,
    /// `ldp:insertedContentRelation`; defaults to `ldp:MemberSubject`
    pub inserted_content_relation: Option<NamedNode>,
    /// Binary descriptor for `ldp:NonRDFSource` resources
    pub binary: Option<BinaryMetadata>,
}

impl Metadata {
    /// Create metadata for a resource with the given interaction model
    pub fn new(identifier: NamedNode, interaction_model: InteractionModel) -> Self {
        Self {
            identifier,
            interaction_model,
            container: None,
            membership_resource: None,
            member_relation: None,
            member_of_relation: None,
            inserted_content_relation: None,
            binary: None,
        }
    }
}

/// The closed set of named-graph categories the service understands.
///
/// Input datasets are partitioned by tagging each quad with a category
/// graph IRI; materialized streams re-label store rows back into these
/// categories.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum GraphCategory {
    /// User-authored triples, stored in `<rid>`
    UserManaged,
    /// Per-resource metadata, stored in the global server-managed graph
    ServerManaged,
    /// Provenance triples, stored in `<rid>?ext=audit`
    Audit,
    /// Authorization triples, stored in `<rid>?ext=acl`
    AccessControl,
    /// Inferred `ldp:contains` triples; never stored
    Containment,
    /// Inferred membership triples; never stored
    Membership,
    /// A registered extension category, identified by its configured IRI
    Extension(NamedNode),
}

impl GraphCategory {
    /// The category graph IRI under which quads of this category are emitted.
    pub fn iri(&self) -> NamedNodeRef<'_> {
        match self {
            GraphCategory::UserManaged => trellis::PREFER_USER_MANAGED,
            GraphCategory::ServerManaged => trellis::PREFER_SERVER_MANAGED,
            GraphCategory::Audit => trellis::PREFER_AUDIT,
            GraphCategory::AccessControl => trellis::PREFER_ACCESS_CONTROL,
            GraphCategory::Containment => ldp::PREFER_CONTAINMENT,
            GraphCategory::Membership => ldp::PREFER_MEMBERSHIP,
            GraphCategory::Extension(iri) => iri.as_ref(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_interaction_model_round_trip() {
        for im in InteractionModel::ALL {
            assert_eq!(InteractionModel::from_iri(im.iri()), Some(im));
        }
    }

    #[test]
    fn test_unknown_iri_is_none() {
        let other = NamedNode::new("http://example.com/Thing").unwrap();
        assert_eq!(InteractionModel::from_iri(other.as_ref()), None);
    }

    #[test]
    fn test_container_predicate() {
        assert!(InteractionModel::BasicContainer.is_container());
        assert!(InteractionModel::DirectContainer.is_container());
        assert!(InteractionModel::IndirectContainer.is_container());
        assert!(InteractionModel::Container.is_container());
        assert!(!InteractionModel::RdfSource.is_container());
        assert!(!InteractionModel::NonRdfSource.is_container());
        assert!(!InteractionModel::Resource.is_container());
    }

    #[test]
    fn test_binary_metadata_defaults() {
        let binary = BinaryMetadata::new(
            NamedNode::new("http://example.com/binary/1").unwrap(),
            "text/plain",
        );
        assert_eq!(binary.mime_type, "text/plain");
        assert!(binary.size.is_none());
        assert!(binary.modified.is_none());
    }

    #[test]
    fn test_category_iri_projection() {
        let ext = NamedNode::new("http://example.com/ns#PreferProvenance").unwrap();
        assert_eq!(
            GraphCategory::Extension(ext.clone()).iri(),
            ext.as_ref()
        );
        assert_eq!(
            GraphCategory::ServerManaged.iri(),
            trellis::PREFER_SERVER_MANAGED
        );
    }
}
