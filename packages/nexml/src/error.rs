//! Error types for the NeXML reader.
//!
//! Every structural problem is fatal to the current document parse and
//! carries the offending id plus the smallest enclosing context. Only
//! annotation value coercion is best-effort and never reaches this type.

use thiserror::Error;

/// Main error type for the NeXML reader.
#[derive(Debug, Error)]
pub enum NexmlError {
    /// XML parsing failed.
    #[error("XML parsing failed: {0}")]
    XmlParse(#[from] roxmltree::Error),

    /// IO error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Model construction error.
    #[error("Model error: {0}")]
    Model(#[from] phylodata_model::ModelError),

    /// The document root is not a nexml element.
    #[error("Unexpected document root <{found}>: expected <nexml>")]
    UnexpectedRoot { found: String },

    /// Missing required attribute.
    #[error("Missing required attribute '{attribute}' in {context}")]
    MissingAttribute { attribute: String, context: String },

    /// A polymorphic element carries no xsi:type declaration.
    #[error("Missing xsi:type declaration in {context}")]
    MissingTypeDeclaration { context: String },

    /// A declared concrete type is not recognized.
    #[error("Unsupported declared type '{declared}' in {context}")]
    UnsupportedType { declared: String, context: String },

    /// A referenced id cannot be resolved.
    #[error("Unresolved {kind} reference '{id}' in {context}")]
    UnresolvedReference {
        kind: &'static str,
        id: String,
        context: String,
    },

    /// The same id was declared twice within one scope.
    #[error("Duplicate id '{id}' in {context}")]
    DuplicateId { id: String, context: String },

    /// A CURIE prefix has no namespace declaration.
    #[error("Unknown namespace prefix '{prefix}' in {context}")]
    UnknownPrefix { prefix: String, context: String },

    /// A column names no state alphabet and the matrix declares several.
    #[error("No default state alphabet in {context}: multiple alphabets are declared and none is referenced")]
    NoDefaultAlphabet { context: String },

    /// A sequence symbol is absent from the governing state alphabet.
    #[error("Unknown state symbol '{symbol}' in {context}")]
    UnknownStateSymbol { symbol: String, context: String },

    /// A value does not parse as its declared type.
    #[error("Invalid value '{value}' in {context}: expected {expected}")]
    InvalidValue {
        value: String,
        expected: &'static str,
        context: String,
    },

    /// Linking consumed every node as some other node's child.
    #[error("Tree '{tree}' has no parentless node: structure must be acyclic")]
    CyclicTree { tree: String },

    /// Root declarations disagree.
    #[error("Conflicting root in tree '{tree}': {detail}")]
    ConflictingRoot { tree: String, detail: String },

    /// More than one parentless node after linking while strict acyclicity
    /// is requested or a root was explicitly flagged.
    #[error("Tree '{tree}' has {count} parentless nodes after linking")]
    MultipleRootCandidates { tree: String, count: usize },

    /// A node is the target of more than one edge.
    #[error("Node '{node}' in tree '{tree}' is the target of more than one edge")]
    MultipleParents { node: String, tree: String },

    /// A second taxon-namespace block was declared in single-namespace mode.
    #[error("Document declares {count} taxon-namespace blocks but a single shared namespace was requested")]
    MultipleTaxonNamespaces { count: usize },

    /// Matrix extraction offset is past the end of the parsed matrices.
    #[error("Matrix offset {offset} out of range: document has {count} character matrices")]
    MatrixOffsetOutOfRange { offset: usize, count: usize },

    /// Annotation nesting exceeds the defensive depth bound.
    #[error("Annotation nesting exceeds maximum depth of {limit}")]
    AnnotationDepthExceeded { limit: usize },

    /// Conflicting reader options.
    #[error("Configuration error: {0}")]
    Config(String),
}

/// Result type alias for reader operations.
pub type Result<T> = std::result::Result<T, NexmlError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unresolved_reference_display() {
        let err = NexmlError::UnresolvedReference {
            kind: "taxon",
            id: "t9".to_string(),
            context: "row 'r1' of characters block 'c1'".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "Unresolved taxon reference 't9' in row 'r1' of characters block 'c1'"
        );
    }

    #[test]
    fn test_cyclic_tree_display() {
        let err = NexmlError::CyclicTree {
            tree: "tree1".to_string(),
        };
        assert!(err.to_string().contains("acyclic"));
    }

    #[test]
    fn test_matrix_offset_display() {
        let err = NexmlError::MatrixOffsetOutOfRange {
            offset: 5,
            count: 2,
        };
        assert!(err.to_string().contains('5'));
        assert!(err.to_string().contains('2'));
    }
}
