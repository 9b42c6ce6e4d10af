//! Named-node constants for the vocabularies the service emits and reads.

pub mod ldp {
    //! [Linked Data Platform](https://www.w3.org/TR/ldp/) vocabulary.
    use oxrdf::NamedNodeRef;

    /// The generic LDP resource class.
    pub const RESOURCE: NamedNodeRef<'_> =
        NamedNodeRef::new_unchecked("http://www.w3.org/ns/ldp#Resource");
    /// An LDP resource whose state is represented as RDF.
    pub const RDF_SOURCE: NamedNodeRef<'_> =
        NamedNodeRef::new_unchecked("http://www.w3.org/ns/ldp#RDFSource");
    /// An LDP resource whose state is not represented as RDF.
    pub const NON_RDF_SOURCE: NamedNodeRef<'_> =
        NamedNodeRef::new_unchecked("http://www.w3.org/ns/ldp#NonRDFSource");
    /// The generic LDP container class.
    pub const CONTAINER: NamedNodeRef<'_> =
        NamedNodeRef::new_unchecked("http://www.w3.org/ns/ldp#Container");
    /// An LDP basic container.
    pub const BASIC_CONTAINER: NamedNodeRef<'_> =
        NamedNodeRef::new_unchecked("http://www.w3.org/ns/ldp#BasicContainer");
    /// An LDP direct container.
    pub const DIRECT_CONTAINER: NamedNodeRef<'_> =
        NamedNodeRef::new_unchecked("http://www.w3.org/ns/ldp#DirectContainer");
    /// An LDP indirect container.
    pub const INDIRECT_CONTAINER: NamedNodeRef<'_> =
        NamedNodeRef::new_unchecked("http://www.w3.org/ns/ldp#IndirectContainer");
    /// Links a container to its contained resources.
    pub const CONTAINS: NamedNodeRef<'_> =
        NamedNodeRef::new_unchecked("http://www.w3.org/ns/ldp#contains");
    /// Convenience edge from a direct/indirect container to its membership resource.
    pub const MEMBER: NamedNodeRef<'_> =
        NamedNodeRef::new_unchecked("http://www.w3.org/ns/ldp#member");
    /// The resource at which membership triples materialize.
    pub const MEMBERSHIP_RESOURCE: NamedNodeRef<'_> =
        NamedNodeRef::new_unchecked("http://www.w3.org/ns/ldp#membershipResource");
    /// The forward membership predicate of a direct/indirect container.
    pub const HAS_MEMBER_RELATION: NamedNodeRef<'_> =
        NamedNodeRef::new_unchecked("http://www.w3.org/ns/ldp#hasMemberRelation");
    /// The inverse membership predicate of a direct container.
    pub const IS_MEMBER_OF_RELATION: NamedNodeRef<'_> =
        NamedNodeRef::new_unchecked("http://www.w3.org/ns/ldp#isMemberOfRelation");
    /// Selects which triple of a child contributes the member value.
    pub const INSERTED_CONTENT_RELATION: NamedNodeRef<'_> =
        NamedNodeRef::new_unchecked("http://www.w3.org/ns/ldp#insertedContentRelation");
    /// The inserted-content-relation default: the member is the child itself.
    pub const MEMBER_SUBJECT: NamedNodeRef<'_> =
        NamedNodeRef::new_unchecked("http://www.w3.org/ns/ldp#MemberSubject");
    /// Preference token / category graph for containment triples.
    pub const PREFER_CONTAINMENT: NamedNodeRef<'_> =
        NamedNodeRef::new_unchecked("http://www.w3.org/ns/ldp#PreferContainment");
    /// Preference token / category graph for membership triples.
    pub const PREFER_MEMBERSHIP: NamedNodeRef<'_> =
        NamedNodeRef::new_unchecked("http://www.w3.org/ns/ldp#PreferMembership");
}

pub mod dc {
    //! [DCMI Metadata Terms](http://purl.org/dc/terms/) vocabulary.
    use oxrdf::NamedNodeRef;

    /// The most recent modification instant of a resource.
    pub const MODIFIED: NamedNodeRef<'_> =
        NamedNodeRef::new_unchecked("http://purl.org/dc/terms/modified");
    /// Links a child resource to its parent container.
    pub const IS_PART_OF: NamedNodeRef<'_> =
        NamedNodeRef::new_unchecked("http://purl.org/dc/terms/isPartOf");
    /// Links a resource to its binary content.
    pub const HAS_PART: NamedNodeRef<'_> =
        NamedNodeRef::new_unchecked("http://purl.org/dc/terms/hasPart");
    /// The nature of a resource; carries the deletion tombstone.
    pub const TYPE: NamedNodeRef<'_> =
        NamedNodeRef::new_unchecked("http://purl.org/dc/terms/type");
    /// The MIME type of a binary.
    pub const FORMAT: NamedNodeRef<'_> =
        NamedNodeRef::new_unchecked("http://purl.org/dc/terms/format");
    /// The size in bytes of a binary.
    pub const EXTENT: NamedNodeRef<'_> =
        NamedNodeRef::new_unchecked("http://purl.org/dc/terms/extent");
    /// A name given to a resource.
    pub const TITLE: NamedNodeRef<'_> =
        NamedNodeRef::new_unchecked("http://purl.org/dc/terms/title");
}

pub mod trellis {
    //! [Trellis](http://www.trellisldp.org/ns/trellis#) vocabulary: category
    //! graph names and server-managed markers.
    use oxrdf::NamedNodeRef;

    /// The single process-wide server-managed named graph.
    pub const PREFER_SERVER_MANAGED: NamedNodeRef<'_> =
        NamedNodeRef::new_unchecked("http://www.trellisldp.org/ns/trellis#PreferServerManaged");
    /// Category graph for user-managed triples.
    pub const PREFER_USER_MANAGED: NamedNodeRef<'_> =
        NamedNodeRef::new_unchecked("http://www.trellisldp.org/ns/trellis#PreferUserManaged");
    /// Category graph for audit triples.
    pub const PREFER_AUDIT: NamedNodeRef<'_> =
        NamedNodeRef::new_unchecked("http://www.trellisldp.org/ns/trellis#PreferAudit");
    /// Category graph for access-control triples.
    pub const PREFER_ACCESS_CONTROL: NamedNodeRef<'_> =
        NamedNodeRef::new_unchecked("http://www.trellisldp.org/ns/trellis#PreferAccessControl");
    /// Tombstone marker for deleted resources.
    pub const DELETED_RESOURCE: NamedNodeRef<'_> =
        NamedNodeRef::new_unchecked("http://www.trellisldp.org/ns/trellis#DeletedResource");
}

pub mod acl {
    //! [WebAC](http://www.w3.org/ns/auth/acl#) vocabulary, used by the root
    //! bootstrap only.
    use oxrdf::NamedNodeRef;

    /// The authorization class.
    pub const AUTHORIZATION: NamedNodeRef<'_> =
        NamedNodeRef::new_unchecked("http://www.w3.org/ns/auth/acl#Authorization");
    /// Links an authorization to a granted access mode.
    pub const MODE: NamedNodeRef<'_> =
        NamedNodeRef::new_unchecked("http://www.w3.org/ns/auth/acl#mode");
    /// Read access mode.
    pub const READ: NamedNodeRef<'_> =
        NamedNodeRef::new_unchecked("http://www.w3.org/ns/auth/acl#Read");
    /// Write access mode.
    pub const WRITE: NamedNodeRef<'_> =
        NamedNodeRef::new_unchecked("http://www.w3.org/ns/auth/acl#Write");
    /// Control access mode.
    pub const CONTROL: NamedNodeRef<'_> =
        NamedNodeRef::new_unchecked("http://www.w3.org/ns/auth/acl#Control");
    /// The class of agents an authorization applies to.
    pub const AGENT_CLASS: NamedNodeRef<'_> =
        NamedNodeRef::new_unchecked("http://www.w3.org/ns/auth/acl#agentClass");
    /// The resource an authorization grants access to.
    pub const ACCESS_TO: NamedNodeRef<'_> =
        NamedNodeRef::new_unchecked("http://www.w3.org/ns/auth/acl#accessTo");
}

pub mod foaf {
    //! [FOAF](http://xmlns.com/foaf/0.1/) vocabulary, used by the root
    //! bootstrap only.
    use oxrdf::NamedNodeRef;

    /// The class of all agents.
    pub const AGENT: NamedNodeRef<'_> =
        NamedNodeRef::new_unchecked("http://xmlns.com/foaf/0.1/Agent");
}

#[cfg(test)]
mod tests {
    use super::*;
    use oxrdf::NamedNode;

    #[test]
    fn test_constants_are_valid_iris() {
        for iri in [
            ldp::RESOURCE,
            ldp::INDIRECT_CONTAINER,
            ldp::PREFER_MEMBERSHIP,
            dc::MODIFIED,
            dc::IS_PART_OF,
            trellis::PREFER_SERVER_MANAGED,
            trellis::DELETED_RESOURCE,
            acl::ACCESS_TO,
            foaf::AGENT,
        ] {
            assert!(NamedNode::new(iri.as_str()).is_ok());
        }
    }

    #[test]
    fn test_category_graphs_are_distinct() {
        let categories = [
            trellis::PREFER_SERVER_MANAGED.as_str(),
            trellis::PREFER_USER_MANAGED.as_str(),
            trellis::PREFER_AUDIT.as_str(),
            trellis::PREFER_ACCESS_CONTROL.as_str(),
            ldp::PREFER_CONTAINMENT.as_str(),
            ldp::PREFER_MEMBERSHIP.as_str(),
        ];
        for (i, a) in categories.iter().enumerate() {
            for b in &categories[i + 1..] {
                assert_ne!(a, b);
            }
        }
    }
}
