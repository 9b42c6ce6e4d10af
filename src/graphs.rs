//! Graph-name calculus: pure, total functions mapping a resource
//! identifier to the named graphs that hold its data.

use crate::model::InteractionModel;
use crate::vocab::trellis;
use oxrdf::{NamedNode, NamedNodeRef};
use percent_encoding::{utf8_percent_encode, AsciiSet, CONTROLS};

/// Characters escaped when an extension name lands in an IRI query string.
const EXT_NAME_SET: &AsciiSet = &CONTROLS
    .add(b' ')
    .add(b'"')
    .add(b'<')
    .add(b'>')
    .add(b'#')
    .add(b'%')
    .add(b'&')
    .add(b'=')
    .add(b'?');

/// The named graph holding a resource's user-managed triples: the
/// resource IRI itself.
pub fn user_graph(identifier: NamedNodeRef<'_>) -> NamedNode {
    identifier.into_owned()
}

/// The single process-wide named graph holding server-managed metadata
/// for all resources.
pub fn server_graph() -> NamedNodeRef<'static> {
    trellis::PREFER_SERVER_MANAGED
}

/// The named graph holding the `name` extension facet of a resource:
/// `<rid>?ext=name`.
pub fn ext_graph(identifier: NamedNodeRef<'_>, name: &str) -> NamedNode {
    let encoded = utf8_percent_encode(name, EXT_NAME_SET);
    NamedNode::new_unchecked(format!("{}?ext={}", identifier.as_str(), encoded))
}

/// Strip a single trailing slash from an IRI string.
pub fn normalize_str(iri: &str) -> &str {
    iri.strip_suffix('/').unwrap_or(iri)
}

/// The trailing-slash-free form of an identifier, under which all
/// server-managed state is keyed.
pub fn normalize(identifier: NamedNodeRef<'_>) -> NamedNode {
    NamedNode::new_unchecked(normalize_str(identifier.as_str()))
}

/// Append a trailing slash iff the interaction model is a container type
/// and the IRI does not already end in one. Applied when projecting
/// stored identifiers outward in containment and membership streams.
pub fn adjust_container_iri(identifier: NamedNodeRef<'_>, model: InteractionModel) -> NamedNode {
    let iri = identifier.as_str();
    if model.is_container() && !iri.ends_with('/') {
        NamedNode::new_unchecked(format!("{iri}/"))
    } else {
        identifier.into_owned()
    }
}
