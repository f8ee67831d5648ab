//! Trees of nodes and edges, stored as an arena.
//!
//! Nodes live in a contiguous vector and reference each other by [`NodeId`],
//! avoiding shared-ownership cycles and giving good locality for traversal.
//! The incoming edge of each node (the branch to its parent, or the root
//! edge) is stored on the node itself: its length and its annotations.

use crate::annotation::{Annotated, Annotation};
use crate::taxon::TaxonId;

/// Handle of a node within its owning [`Tree`] (arena index).
pub type NodeId = usize;

/// Length of an edge; all edges of one tree share one numeric type.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum EdgeLength {
    /// Integer-typed length.
    Integer(i64),

    /// Real-typed length.
    Real(f64),
}

impl EdgeLength {
    /// Length as a real number regardless of declared type.
    #[must_use]
    pub fn as_f64(&self) -> f64 {
        match self {
            Self::Integer(v) => *v as f64,
            Self::Real(v) => *v,
        }
    }
}

/// A node of a tree, including its incoming edge.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Node {
    /// Node label.
    pub label: Option<String>,

    /// Taxon this node stands for, if any (leaf nodes usually; handle into
    /// the tree's taxon namespace).
    pub taxon: Option<TaxonId>,

    /// Parent node; `None` only for the root.
    parent: Option<NodeId>,

    /// Child nodes in attachment order.
    children: Vec<NodeId>,

    /// Length of the incoming edge (or of the root edge for the root).
    pub edge_length: Option<EdgeLength>,

    /// Annotations attached to the node.
    pub annotations: Vec<Annotation>,

    /// Annotations attached to the incoming edge.
    pub edge_annotations: Vec<Annotation>,
}

impl Node {
    /// Create an unlinked node.
    #[must_use]
    pub fn new(label: Option<String>, taxon: Option<TaxonId>) -> Self {
        Self {
            label,
            taxon,
            ..Self::default()
        }
    }

    /// Parent of this node.
    #[must_use]
    pub fn parent(&self) -> Option<NodeId> {
        self.parent
    }

    /// Children of this node in attachment order.
    #[must_use]
    pub fn children(&self) -> &[NodeId] {
        &self.children
    }

    /// Whether this node has no children.
    #[must_use]
    pub fn is_leaf(&self) -> bool {
        self.children.is_empty()
    }
}

impl Annotated for Node {
    fn annotations(&self) -> &[Annotation] {
        &self.annotations
    }

    fn annotations_mut(&mut self) -> &mut Vec<Annotation> {
        &mut self.annotations
    }
}

/// A taxon-namespace-scoped tree.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Tree {
    /// Tree label.
    pub label: Option<String>,

    nodes: Vec<Node>,
    root: Option<NodeId>,

    /// Annotations attached to the tree.
    pub annotations: Vec<Annotation>,
}

impl Tree {
    /// Create an empty tree.
    #[must_use]
    pub fn new(label: Option<String>) -> Self {
        Self {
            label,
            ..Self::default()
        }
    }

    /// Add a node, returning its handle.
    pub fn add_node(&mut self, node: Node) -> NodeId {
        self.nodes.push(node);
        self.nodes.len() - 1
    }

    /// Get a node by handle.
    #[must_use]
    pub fn node(&self, id: NodeId) -> Option<&Node> {
        self.nodes.get(id)
    }

    /// Get a node by handle, mutably.
    pub fn node_mut(&mut self, id: NodeId) -> Option<&mut Node> {
        self.nodes.get_mut(id)
    }

    /// Link `child` under `parent`, recording both directions.
    ///
    /// Returns `false` if either handle is invalid or the child already has
    /// a parent.
    pub fn set_parent(&mut self, child: NodeId, parent: NodeId) -> bool {
        if child >= self.nodes.len() || parent >= self.nodes.len() {
            return false;
        }
        if self.nodes[child].parent.is_some() {
            return false;
        }
        self.nodes[child].parent = Some(parent);
        self.nodes[parent].children.push(child);
        true
    }

    /// Mark a node as the root.
    pub fn set_root(&mut self, id: NodeId) {
        self.root = Some(id);
    }

    /// The root node handle, once linking is complete.
    #[must_use]
    pub fn root(&self) -> Option<NodeId> {
        self.root
    }

    /// Number of nodes.
    #[must_use]
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Whether the tree has no nodes.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Iterate over `(handle, node)` pairs in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (NodeId, &Node)> {
        self.nodes.iter().enumerate()
    }

    /// Handles of all leaf nodes.
    #[must_use]
    pub fn leaves(&self) -> Vec<NodeId> {
        self.nodes
            .iter()
            .enumerate()
            .filter(|(_, n)| n.is_leaf())
            .map(|(id, _)| id)
            .collect()
    }

    /// Walk parent links from a node up to the root.
    ///
    /// The walk is bounded by the node count, so it terminates even on a
    /// malformed structure.
    #[must_use]
    pub fn ancestors(&self, id: NodeId) -> Vec<NodeId> {
        let mut out = Vec::new();
        let mut current = self.node(id).and_then(Node::parent);
        while let Some(next) = current {
            out.push(next);
            if out.len() > self.nodes.len() {
                break;
            }
            current = self.node(next).and_then(Node::parent);
        }
        out
    }
}

impl Annotated for Tree {
    fn annotations(&self) -> &[Annotation] {
        &self.annotations
    }

    fn annotations_mut(&mut self) -> &mut Vec<Annotation> {
        &mut self.annotations
    }
}

/// An ordered collection of trees sharing one taxon namespace.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TreeList {
    /// Collection label.
    pub label: Option<String>,

    /// Index of the owning taxon namespace in the enclosing data set.
    pub taxon_namespace: usize,

    /// Trees in document order.
    pub trees: Vec<Tree>,

    /// Annotations attached to the collection.
    pub annotations: Vec<Annotation>,
}

impl TreeList {
    /// Create an empty tree list.
    #[must_use]
    pub fn new(taxon_namespace: usize, label: Option<String>) -> Self {
        Self {
            label,
            taxon_namespace,
            trees: Vec::new(),
            annotations: Vec::new(),
        }
    }
}

impl Annotated for TreeList {
    fn annotations(&self) -> &[Annotation] {
        &self.annotations
    }

    fn annotations_mut(&mut self) -> &mut Vec<Annotation> {
        &mut self.annotations
    }
}
