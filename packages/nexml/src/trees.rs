//! Tree-block builder.
//!
//! Parses `trees` blocks into tree lists. A tree element is a general
//! node/edge list that could describe a cyclic graph if malformed, so
//! construction is deliberately staged: a node pass, an edge-collection
//! pass (edges may precede or follow their nodes in document order), a
//! linking pass, root determination, and a root-edge pass.

use std::collections::HashMap;

use roxmltree::Node as XmlNode;
use tracing::debug;

use phylodata_model::{Annotation, DataSet, EdgeLength, Node, NodeId, Tree, TreeList};

use crate::annotations::{annotate, parse_meta};
use crate::config::ReaderConfig;
use crate::error::{NexmlError, Result};
use crate::registry::DocumentRegistries;
use crate::xml::{declared_type, find_child, find_children, get_attribute, require_attribute};

/// Numeric type shared by every edge length of one tree.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum LengthType {
    Integer,
    Real,
}

impl LengthType {
    fn from_declared(declared: &str, context: &str) -> Result<Self> {
        match declared {
            "IntTree" => Ok(Self::Integer),
            "FloatTree" => Ok(Self::Real),
            other => Err(NexmlError::UnsupportedType {
                declared: other.to_string(),
                context: context.to_string(),
            }),
        }
    }

    fn parse(self, raw: &str, context: &str) -> Result<EdgeLength> {
        match self {
            Self::Integer => raw
                .trim()
                .parse::<i64>()
                .map(EdgeLength::Integer)
                .map_err(|_| NexmlError::InvalidValue {
                    value: raw.to_string(),
                    expected: "integer",
                    context: context.to_string(),
                }),
            Self::Real => raw
                .trim()
                .parse::<f64>()
                .map(EdgeLength::Real)
                .map_err(|_| NexmlError::InvalidValue {
                    value: raw.to_string(),
                    expected: "real number",
                    context: context.to_string(),
                }),
        }
    }
}

/// An unlinked edge record collected during the edge pass.
struct EdgeInfo {
    id: Option<String>,
    source: Option<String>,
    target: String,
    length: Option<EdgeLength>,
    annotations: Vec<Annotation>,
}

/// Parse every `trees` block of a document.
pub fn parse_tree_lists(
    root: XmlNode<'_, '_>,
    dataset: &mut DataSet,
    registries: &DocumentRegistries,
    config: &ReaderConfig,
) -> Result<()> {
    let ns = config.namespace();
    for block in find_children(root, "trees", ns) {
        let block_id = require_attribute(block, "id", "trees block")?;
        let context = format!("trees block '{block_id}'");
        let label = get_attribute(block, "label").map(str::to_string);

        let otus_id = require_attribute(block, "otus", &context)?;
        let namespace_index = *registries.taxon_namespaces.get(otus_id).ok_or_else(|| {
            NexmlError::UnresolvedReference {
                kind: "taxon namespace",
                id: otus_id.to_string(),
                context: context.clone(),
            }
        })?;

        let mut list = TreeList::new(namespace_index, label);
        annotate(&mut list, block, &registries.namespaces, ns)?;

        for tree_el in find_children(block, "tree", ns) {
            list.trees.push(parse_tree(tree_el, otus_id, registries, config)?);
        }

        debug!(block = block_id, trees = list.trees.len(), "parsed tree block");
        dataset.tree_lists.push(list);
    }
    Ok(())
}

/// Parse a single `tree` element against the taxa registered under
/// `otus_id`.
///
/// Public so a caller can consume trees one at a time from a document it
/// navigates itself.
pub fn parse_tree(
    tree_el: XmlNode<'_, '_>,
    otus_id: &str,
    registries: &DocumentRegistries,
    config: &ReaderConfig,
) -> Result<Tree> {
    let ns = config.namespace();
    let tree_id = require_attribute(tree_el, "id", "tree element")?;
    let label = get_attribute(tree_el, "label").map(str::to_string);
    let tree_name = label.clone().unwrap_or_else(|| tree_id.to_string());
    let context = format!("tree '{tree_name}'");

    let declared = declared_type(tree_el, &context)?;
    let length_type = LengthType::from_declared(declared, &context)?;

    let mut tree = Tree::new(label);
    annotate(&mut tree, tree_el, &registries.namespaces, ns)?;

    // Node pass: create nodes, record them by declared id, note the
    // explicitly flagged root.
    let mut node_ids: HashMap<String, NodeId> = HashMap::new();
    let mut explicit_root: Option<NodeId> = None;
    for node_el in find_children(tree_el, "node", ns) {
        let node_xml_id = require_attribute(node_el, "id", &context)?;
        let node_label = get_attribute(node_el, "label").map(str::to_string);

        let taxon = match get_attribute(node_el, "otu") {
            Some(otu_id) => Some(*registries.taxa.resolve(otus_id, otu_id).ok_or_else(|| {
                NexmlError::UnresolvedReference {
                    kind: "taxon",
                    id: otu_id.to_string(),
                    context: format!("node '{node_xml_id}' of {context}"),
                }
            })?),
            None => None,
        };

        let mut node = Node::new(node_label, taxon);
        node.annotations = parse_meta(node_el, &registries.namespaces, ns)?;
        let handle = tree.add_node(node);

        if node_ids.insert(node_xml_id.to_string(), handle).is_some() {
            return Err(NexmlError::DuplicateId {
                id: node_xml_id.to_string(),
                context: context.clone(),
            });
        }

        if get_attribute(node_el, "root") == Some("true") {
            if explicit_root.is_some() {
                return Err(NexmlError::ConflictingRoot {
                    tree: tree_name,
                    detail: "more than one node flagged as root".to_string(),
                });
            }
            explicit_root = Some(handle);
        }
    }

    // Edge pass: collect unlinked edge records; no resolution yet, since
    // edges may reference nodes in any document order.
    let mut edges: Vec<EdgeInfo> = Vec::new();
    for edge_el in find_children(tree_el, "edge", ns) {
        let id = get_attribute(edge_el, "id").map(str::to_string);
        let edge_context = format!(
            "edge '{}' of {context}",
            id.as_deref().unwrap_or("<unnamed>")
        );
        let target = require_attribute(edge_el, "target", &edge_context)?.to_string();
        let source = get_attribute(edge_el, "source").map(str::to_string);
        let length = match get_attribute(edge_el, "length") {
            Some(raw) => Some(length_type.parse(raw, &edge_context)?),
            None => None,
        };
        let annotations = parse_meta(edge_el, &registries.namespaces, ns)?;
        edges.push(EdgeInfo {
            id,
            source,
            target,
            length,
            annotations,
        });
    }

    // Linking pass: resolve both endpoints and link children to parents.
    for edge in edges {
        let edge_context = format!(
            "edge '{}' of {context}",
            edge.id.as_deref().unwrap_or("<unnamed>")
        );
        let head = *node_ids
            .get(&edge.target)
            .ok_or_else(|| NexmlError::UnresolvedReference {
                kind: "target node",
                id: edge.target.clone(),
                context: edge_context.clone(),
            })?;

        if let Some(source) = &edge.source {
            let tail = *node_ids
                .get(source)
                .ok_or_else(|| NexmlError::UnresolvedReference {
                    kind: "source node",
                    id: source.clone(),
                    context: edge_context.clone(),
                })?;
            if !tree.set_parent(head, tail) {
                return Err(NexmlError::MultipleParents {
                    node: edge.target.clone(),
                    tree: tree_name,
                });
            }
        }
        // An edge with no source subtends the root directly; its length
        // still belongs to the head node.

        if let Some(node) = tree.node_mut(head) {
            node.edge_length = edge.length;
            node.edge_annotations.extend(edge.annotations);
        }
    }

    // Root determination by parentless-node analysis.
    let unparented: Vec<NodeId> = tree
        .iter()
        .filter(|(_, node)| node.parent().is_none())
        .map(|(handle, _)| handle)
        .collect();

    let root = match unparented.as_slice() {
        [] => {
            return Err(NexmlError::CyclicTree { tree: tree_name });
        }
        [single] => {
            if let Some(flagged) = explicit_root {
                if flagged != *single {
                    return Err(NexmlError::ConflictingRoot {
                        tree: tree_name,
                        detail: "explicitly flagged root differs from the parentless node"
                            .to_string(),
                    });
                }
            }
            *single
        }
        [first, extra @ ..] => {
            if explicit_root.is_some() || config.strict_acyclicity {
                return Err(NexmlError::MultipleRootCandidates {
                    tree: tree_name,
                    count: unparented.len(),
                });
            }
            // Legacy permissiveness: a forest in a single tree element ends
            // up reparented under the first root candidate.
            let root = *first;
            for &orphan in extra {
                tree.set_parent(orphan, root);
            }
            root
        }
    };
    tree.set_root(root);

    // Root-edge pass: a distinguished edge above the root.
    if let Some(rootedge_el) = find_child(tree_el, "rootedge", ns) {
        let rootedge_context = format!("rootedge of {context}");
        let target = require_attribute(rootedge_el, "target", &rootedge_context)?;
        let head = *node_ids
            .get(target)
            .ok_or_else(|| NexmlError::UnresolvedReference {
                kind: "target node",
                id: target.to_string(),
                context: rootedge_context.clone(),
            })?;
        if head != root {
            return Err(NexmlError::ConflictingRoot {
                tree: tree_name.clone(),
                detail: format!("root edge targets '{target}', which is not the root"),
            });
        }
        if let Some(raw) = get_attribute(rootedge_el, "length") {
            let length = length_type.parse(raw, &rootedge_context)?;
            if let Some(node) = tree.node_mut(root) {
                node.edge_length = Some(length);
            }
        }
        let mut annotations = parse_meta(rootedge_el, &registries.namespaces, ns)?;
        if let Some(node) = tree.node_mut(root) {
            node.edge_annotations.append(&mut annotations);
        }
    }

    Ok(tree)
}

#[cfg(test)]
mod tests {
    use super::*;
    use phylodata_model::TaxonNamespace;
    use roxmltree::Document;

    /// Parse one tree from a minimal document with taxa t1/t2 under "tax1".
    fn parse_one(tree_xml: &str, config: &ReaderConfig) -> Result<Tree> {
        let xml = format!(
            r#"<nexml xmlns="http://www.nexml.org/2009"
                      xmlns:xsi="http://www.w3.org/2001/XMLSchema-instance">
                {tree_xml}
            </nexml>"#
        );
        let doc = Document::parse(&xml).unwrap();
        let mut registries = DocumentRegistries::new();
        let mut namespace = TaxonNamespace::new(None);
        let s1 = namespace.add_taxon(phylodata_model::Taxon::new("s1"));
        let s2 = namespace.add_taxon(phylodata_model::Taxon::new("s2"));
        registries.taxon_namespaces.insert("tax1".to_string(), 0);
        registries.taxa.register("tax1", "t1", s1);
        registries.taxa.register("tax1", "t2", s2);

        let tree_el = find_child(
            doc.root_element(),
            "tree",
            "http://www.nexml.org/2009",
        )
        .unwrap();
        parse_tree(tree_el, "tax1", &registries, config)
    }

    #[test]
    fn test_two_leaf_tree() {
        let tree = parse_one(
            r#"<tree id="tr1" xsi:type="nex:FloatTree">
                <node id="n1" otu="t1"/>
                <node id="n2" otu="t2"/>
                <node id="n3"/>
                <edge id="e1" source="n3" target="n1" length="0.1"/>
                <edge id="e2" source="n3" target="n2" length="0.2"/>
            </tree>"#,
            &ReaderConfig::default(),
        )
        .unwrap();

        let root = tree.root().unwrap();
        let root_node = tree.node(root).unwrap();
        assert!(root_node.parent().is_none());
        assert_eq!(root_node.children().len(), 2);

        let n1 = root_node.children()[0];
        assert_eq!(tree.node(n1).unwrap().edge_length, Some(EdgeLength::Real(0.1)));
        assert_eq!(tree.node(n1).unwrap().taxon, Some(0));
    }

    #[test]
    fn test_edges_before_nodes() {
        // Edges may precede the nodes they reference.
        let tree = parse_one(
            r#"<tree id="tr1" xsi:type="nex:IntTree">
                <edge id="e1" source="n3" target="n1" length="4"/>
                <node id="n1" otu="t1"/>
                <node id="n3"/>
            </tree>"#,
            &ReaderConfig::default(),
        )
        .unwrap();
        let root = tree.root().unwrap();
        assert_eq!(tree.node(root).unwrap().children().len(), 1);
        let child = tree.node(root).unwrap().children()[0];
        assert_eq!(
            tree.node(child).unwrap().edge_length,
            Some(EdgeLength::Integer(4))
        );
    }

    #[test]
    fn test_dangling_target_rejected() {
        let err = parse_one(
            r#"<tree id="tr1" xsi:type="nex:FloatTree">
                <node id="n1"/>
                <edge id="e1" source="n1" target="n9" length="0.5"/>
            </tree>"#,
            &ReaderConfig::default(),
        )
        .unwrap_err();
        assert!(
            matches!(err, NexmlError::UnresolvedReference { kind: "target node", ref id, .. } if id == "n9")
        );
    }

    #[test]
    fn test_cycle_rejected() {
        let err = parse_one(
            r#"<tree id="tr1" xsi:type="nex:FloatTree">
                <node id="n1"/>
                <node id="n2"/>
                <edge id="e1" source="n1" target="n2"/>
                <edge id="e2" source="n2" target="n1"/>
            </tree>"#,
            &ReaderConfig::default(),
        )
        .unwrap_err();
        assert!(matches!(err, NexmlError::CyclicTree { .. }));
    }

    #[test]
    fn test_forest_reparented_by_default() {
        let tree = parse_one(
            r#"<tree id="tr1" xsi:type="nex:FloatTree">
                <node id="n1"/>
                <node id="n2"/>
                <node id="n3"/>
                <edge id="e1" source="n1" target="n2"/>
            </tree>"#,
            &ReaderConfig::default(),
        )
        .unwrap();
        // n3 was parentless and got attached under the first candidate n1.
        let root = tree.root().unwrap();
        assert_eq!(tree.node(root).unwrap().children().len(), 2);
    }

    #[test]
    fn test_forest_rejected_in_strict_mode() {
        let config = ReaderConfig {
            strict_acyclicity: true,
            ..ReaderConfig::default()
        };
        let err = parse_one(
            r#"<tree id="tr1" xsi:type="nex:FloatTree">
                <node id="n1"/>
                <node id="n2"/>
                <node id="n3"/>
                <edge id="e1" source="n1" target="n2"/>
            </tree>"#,
            &config,
        )
        .unwrap_err();
        assert!(matches!(
            err,
            NexmlError::MultipleRootCandidates { count: 2, .. }
        ));
    }

    #[test]
    fn test_explicit_root_conflict() {
        let err = parse_one(
            r#"<tree id="tr1" xsi:type="nex:FloatTree">
                <node id="n1" root="true"/>
                <node id="n2"/>
                <edge id="e1" source="n2" target="n1"/>
            </tree>"#,
            &ReaderConfig::default(),
        )
        .unwrap_err();
        assert!(matches!(err, NexmlError::ConflictingRoot { .. }));
    }

    #[test]
    fn test_rootedge() {
        let tree = parse_one(
            r#"<tree id="tr1" xsi:type="nex:FloatTree">
                <node id="n1" root="true"/>
                <node id="n2" otu="t1"/>
                <edge id="e1" source="n1" target="n2" length="0.3"/>
                <rootedge id="re1" target="n1" length="0.05"/>
            </tree>"#,
            &ReaderConfig::default(),
        )
        .unwrap();
        let root = tree.root().unwrap();
        assert_eq!(
            tree.node(root).unwrap().edge_length,
            Some(EdgeLength::Real(0.05))
        );
    }

    #[test]
    fn test_rootedge_target_mismatch() {
        let err = parse_one(
            r#"<tree id="tr1" xsi:type="nex:FloatTree">
                <node id="n1"/>
                <node id="n2"/>
                <edge id="e1" source="n1" target="n2"/>
                <rootedge id="re1" target="n2"/>
            </tree>"#,
            &ReaderConfig::default(),
        )
        .unwrap_err();
        assert!(matches!(err, NexmlError::ConflictingRoot { .. }));
    }

    #[test]
    fn test_unknown_tree_type() {
        let err = parse_one(
            r#"<tree id="tr1" xsi:type="nex:FloatNetwork">
                <node id="n1"/>
            </tree>"#,
            &ReaderConfig::default(),
        )
        .unwrap_err();
        assert!(matches!(err, NexmlError::UnsupportedType { .. }));
    }

    #[test]
    fn test_second_parent_rejected() {
        let err = parse_one(
            r#"<tree id="tr1" xsi:type="nex:FloatTree">
                <node id="n1"/>
                <node id="n2"/>
                <node id="n3"/>
                <edge id="e1" source="n1" target="n3"/>
                <edge id="e2" source="n2" target="n3"/>
            </tree>"#,
            &ReaderConfig::default(),
        )
        .unwrap_err();
        assert!(matches!(err, NexmlError::MultipleParents { .. }));
    }
}
