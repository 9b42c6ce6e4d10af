//! Update planner: compiles a resource mutation into one ordered SPARQL
//! UPDATE request, executed by the backend as a single transaction.

use crate::graphs::{ext_graph, server_graph};
use crate::model::GraphCategory;
use crate::vocab::{dc, ldp};
use chrono::{DateTime, SecondsFormat, Utc};
use oxrdf::vocab::{rdf, xsd};
use oxrdf::{Dataset, GraphNameRef, Literal, NamedNode, QuadRef};
use std::collections::BTreeMap;
use std::fmt::Write as _;

/// The mutation kinds the planner compiles.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
    /// Bring a missing resource into existence
    Create,
    /// Overwrite the state of an existing resource
    Replace,
    /// Tombstone a resource, clearing all of its graphs
    Delete,
}

/// `xsd:dateTime` literal for an instant.
pub fn time_literal(time: DateTime<Utc>) -> Literal {
    Literal::new_typed_literal(
        time.to_rfc3339_opts(SecondsFormat::Millis, true),
        xsd::DATE_TIME,
    )
}

/// Compile an ordered UPDATE request for the given mutation.
///
/// The input dataset is partitioned by category graph ([`GraphCategory`]);
/// the planner stamps the new `dc:modified` quad into it, emits the
/// delete clauses for the old state, rewrites each category subset into
/// its concrete named graph, and appends the modification-time
/// propagation clauses at the position the operation requires:
/// propagation precedes the deletes for `Delete`, and follows the
/// inserts for `Create` and `Replace`.
pub fn plan(
    identifier: &NamedNode,
    time: DateTime<Utc>,
    dataset: &mut Dataset,
    operation: Operation,
    extensions: &BTreeMap<String, NamedNode>,
) -> String {
    let modified = time_literal(time);
    dataset.insert(QuadRef::new(
        identifier.as_ref(),
        dc::MODIFIED,
        modified.as_ref(),
        GraphNameRef::NamedNode(server_graph()),
    ));

    let mut operations = Vec::new();
    if operation == Operation::Delete {
        operations.push(parent_propagation(identifier, &modified));
        operations.push(direct_member_propagation(identifier, &modified));
    }
    operations.extend(delete_clauses(identifier, extensions));
    if let Some(insert) = insert_data(identifier, dataset, operation, extensions) {
        operations.push(insert);
    }
    match operation {
        Operation::Create => {
            operations.push(parent_propagation(identifier, &modified));
            operations.push(direct_member_propagation(identifier, &modified));
        }
        Operation::Replace => {
            operations.push(indirect_member_propagation(identifier, &modified));
        }
        Operation::Delete => {}
    }
    operations.join(";\n")
}

/// The delete clauses clearing the old state of a resource, in order:
/// user graph, every extension graph (always including audit and acl),
/// the self-guarded binary descriptor, per-resource server metadata.
fn delete_clauses(identifier: &NamedNode, extensions: &BTreeMap<String, NamedNode>) -> Vec<String> {
    let mut clauses = Vec::new();
    clauses.push(format!(
        "DELETE WHERE {{ GRAPH {identifier} {{ ?s ?p ?o }} }}"
    ));
    for name in extension_names(extensions) {
        let graph = ext_graph(identifier.as_ref(), &name);
        clauses.push(format!("DELETE WHERE {{ GRAPH {graph} {{ ?s ?p ?o }} }}"));
    }
    clauses.push(format!(
        "DELETE WHERE {{ GRAPH {server} {{ {identifier} {type_} {non_rdf} . {identifier} {has_part} ?s . ?s ?p ?o }} }}",
        server = server_graph(),
        type_ = rdf::TYPE,
        non_rdf = ldp::NON_RDF_SOURCE,
        has_part = dc::HAS_PART,
    ));
    clauses.push(format!(
        "DELETE WHERE {{ GRAPH {server} {{ {identifier} ?p ?o }} }}",
        server = server_graph(),
    ));
    clauses
}

/// All extension graph names the service manages: the built-in audit and
/// acl graphs plus the registered extensions.
pub fn extension_names(extensions: &BTreeMap<String, NamedNode>) -> Vec<String> {
    let mut names = vec!["acl".to_string(), "audit".to_string()];
    names.extend(extensions.keys().cloned());
    names
}

/// The `INSERT DATA` block installing the new state, with each category
/// subset rewritten into its concrete named graph. Delete operations
/// install only the server-managed tombstone subset and the audit subset.
fn insert_data(
    identifier: &NamedNode,
    dataset: &Dataset,
    operation: Operation,
    extensions: &BTreeMap<String, NamedNode>,
) -> Option<String> {
    let mut targets: Vec<(GraphCategory, NamedNode)> = vec![
        (
            GraphCategory::ServerManaged,
            server_graph().into_owned(),
        ),
        (
            GraphCategory::Audit,
            ext_graph(identifier.as_ref(), "audit"),
        ),
    ];
    if operation != Operation::Delete {
        targets.push((GraphCategory::UserManaged, identifier.clone()));
        targets.push((
            GraphCategory::AccessControl,
            ext_graph(identifier.as_ref(), "acl"),
        ));
        for (name, iri) in extensions {
            targets.push((
                GraphCategory::Extension(iri.clone()),
                ext_graph(identifier.as_ref(), name),
            ));
        }
    }

    let mut body = String::new();
    for (category, target) in targets {
        let mut triples = String::new();
        for quad in dataset.quads_for_graph_name(category.iri()) {
            let _ = writeln!(
                triples,
                "{} {} {} .",
                quad.subject, quad.predicate, quad.object
            );
        }
        if !triples.is_empty() {
            let _ = writeln!(body, "GRAPH {target} {{\n{triples}}}");
        }
    }
    if body.is_empty() {
        None
    } else {
        Some(format!("INSERT DATA {{\n{body}}}"))
    }
}

/// Advance the parent container's `dc:modified`; the MINUS clauses
/// suppress propagation to non-container parents.
fn parent_propagation(identifier: &NamedNode, modified: &Literal) -> String {
    format!(
        "WITH {server}\n\
         DELETE {{ ?parent {modified_p} ?modified }}\n\
         INSERT {{ ?parent {modified_p} {time} }}\n\
         WHERE {{ {identifier} {is_part_of} ?parent .\n\
         ?parent {modified_p} ?modified .\n\
         MINUS {{ ?parent {type_} {rdf_source} }}\n\
         MINUS {{ ?parent {type_} {non_rdf_source} }} }}",
        server = server_graph(),
        modified_p = dc::MODIFIED,
        time = modified,
        is_part_of = dc::IS_PART_OF,
        type_ = rdf::TYPE,
        rdf_source = ldp::RDF_SOURCE,
        non_rdf_source = ldp::NON_RDF_SOURCE,
    )
}

/// Advance the membership resource's `dc:modified` when the parent is a
/// direct container with a forward member relation.
fn direct_member_propagation(identifier: &NamedNode, modified: &Literal) -> String {
    format!(
        "WITH {server}\n\
         DELETE {{ ?member {modified_p} ?modified }}\n\
         INSERT {{ ?member {modified_p} {time} }}\n\
         WHERE {{ {identifier} {is_part_of} ?parent .\n\
         ?parent {membership} ?member .\n\
         ?parent {relation} ?any .\n\
         ?member {modified_p} ?modified }}",
        server = server_graph(),
        modified_p = dc::MODIFIED,
        time = modified,
        is_part_of = dc::IS_PART_OF,
        membership = ldp::MEMBERSHIP_RESOURCE,
        relation = ldp::HAS_MEMBER_RELATION,
    )
}

/// Advance the membership resource's `dc:modified` when the parent is an
/// indirect container; indirect members are always considered stale on a
/// child replace.
fn indirect_member_propagation(identifier: &NamedNode, modified: &Literal) -> String {
    format!(
        "WITH {server}\n\
         DELETE {{ ?member {modified_p} ?modified }}\n\
         INSERT {{ ?member {modified_p} {time} }}\n\
         WHERE {{ {identifier} {is_part_of} ?parent .\n\
         ?parent {membership} ?member .\n\
         ?parent {type_} {indirect} .\n\
         ?member {modified_p} ?modified }}",
        server = server_graph(),
        modified_p = dc::MODIFIED,
        time = modified,
        is_part_of = dc::IS_PART_OF,
        membership = ldp::MEMBERSHIP_RESOURCE,
        type_ = rdf::TYPE,
        indirect = ldp::INDIRECT_CONTAINER,
    )
}

/// The bare re-stamp update used by `touch`.
pub fn touch_request(identifier: &NamedNode, time: DateTime<Utc>) -> String {
    let modified = time_literal(time);
    format!(
        "WITH {server}\n\
         DELETE {{ {identifier} {modified_p} ?modified }}\n\
         INSERT {{ {identifier} {modified_p} {time} }}\n\
         WHERE {{ {identifier} {modified_p} ?modified }}",
        server = server_graph(),
        modified_p = dc::MODIFIED,
        time = modified,
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::vocab::trellis;
    use oxrdf::{GraphName, Quad};

    fn identifier() -> NamedNode {
        NamedNode::new("http://example.com/resource").unwrap()
    }

    fn dataset_with_user_triple() -> Dataset {
        let mut dataset = Dataset::new();
        dataset.insert(&Quad::new(
            identifier(),
            NamedNode::new("http://purl.org/dc/terms/title").unwrap(),
            Literal::new_simple_literal("a title"),
            GraphName::NamedNode(trellis::PREFER_USER_MANAGED.into_owned()),
        ));
        dataset
    }

    fn parse(request: &str) {
        spargebra::Update::parse(request, None).expect("emitted request must be valid SPARQL");
    }

    #[test]
    fn test_create_request_parses_as_sparql() {
        let mut dataset = dataset_with_user_triple();
        let request = plan(
            &identifier(),
            Utc::now(),
            &mut dataset,
            Operation::Create,
            &BTreeMap::new(),
        );
        parse(&request);
    }

    #[test]
    fn test_replace_and_delete_requests_parse_as_sparql() {
        for operation in [Operation::Replace, Operation::Delete] {
            let mut dataset = dataset_with_user_triple();
            let request = plan(
                &identifier(),
                Utc::now(),
                &mut dataset,
                operation,
                &BTreeMap::new(),
            );
            parse(&request);
        }
    }

    #[test]
    fn test_touch_request_parses_as_sparql() {
        parse(&touch_request(&identifier(), Utc::now()));
    }

    #[test]
    fn test_modified_stamp_is_added_to_dataset() {
        let mut dataset = Dataset::new();
        plan(
            &identifier(),
            Utc::now(),
            &mut dataset,
            Operation::Create,
            &BTreeMap::new(),
        );
        let stamped = dataset
            .quads_for_graph_name(server_graph())
            .any(|quad| quad.predicate == dc::MODIFIED);
        assert!(stamped);
    }

    #[test]
    fn test_deletes_precede_insert_for_create() {
        let mut dataset = dataset_with_user_triple();
        let request = plan(
            &identifier(),
            Utc::now(),
            &mut dataset,
            Operation::Create,
            &BTreeMap::new(),
        );
        let delete_at = request.find("DELETE WHERE").unwrap();
        let insert_at = request.find("INSERT DATA").unwrap();
        assert!(delete_at < insert_at);
        // propagation comes after the insert on create
        let with_at = request.find("WITH").unwrap();
        assert!(insert_at < with_at);
    }

    #[test]
    fn test_propagation_precedes_deletes_for_delete() {
        let mut dataset = Dataset::new();
        let request = plan(
            &identifier(),
            Utc::now(),
            &mut dataset,
            Operation::Delete,
            &BTreeMap::new(),
        );
        let with_at = request.find("WITH").unwrap();
        let delete_at = request.find("DELETE WHERE").unwrap();
        assert!(with_at < delete_at);
    }

    #[test]
    fn test_delete_skips_user_and_acl_subsets() {
        let mut dataset = dataset_with_user_triple();
        dataset.insert(&Quad::new(
            identifier(),
            NamedNode::new("http://example.com/p").unwrap(),
            Literal::new_simple_literal("secret"),
            GraphName::NamedNode(trellis::PREFER_ACCESS_CONTROL.into_owned()),
        ));
        let request = plan(
            &identifier(),
            Utc::now(),
            &mut dataset,
            Operation::Delete,
            &BTreeMap::new(),
        );
        assert!(!request.contains("a title"));
        assert!(!request.contains("secret"));
    }

    #[test]
    fn test_registered_extension_graphs_are_cleared() {
        let mut extensions = BTreeMap::new();
        extensions.insert(
            "prov".to_string(),
            NamedNode::new("http://example.com/ns#PreferProvenance").unwrap(),
        );
        let mut dataset = Dataset::new();
        let request = plan(
            &identifier(),
            Utc::now(),
            &mut dataset,
            Operation::Replace,
            &extensions,
        );
        assert!(request.contains("http://example.com/resource?ext=prov"));
        assert!(request.contains("http://example.com/resource?ext=acl"));
        assert!(request.contains("http://example.com/resource?ext=audit"));
        parse(&request);
    }

    #[test]
    fn test_extension_subset_is_rewritten_to_its_graph() {
        let ext_iri = NamedNode::new("http://example.com/ns#PreferProvenance").unwrap();
        let mut extensions = BTreeMap::new();
        extensions.insert("prov".to_string(), ext_iri.clone());
        let mut dataset = Dataset::new();
        dataset.insert(&Quad::new(
            identifier(),
            NamedNode::new("http://example.com/derived").unwrap(),
            NamedNode::new("http://example.com/source").unwrap(),
            GraphName::NamedNode(ext_iri),
        ));
        let request = plan(
            &identifier(),
            Utc::now(),
            &mut dataset,
            Operation::Create,
            &extensions,
        );
        assert!(request.contains("GRAPH <http://example.com/resource?ext=prov>"));
        parse(&request);
    }
}
