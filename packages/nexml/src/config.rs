//! Configuration constants and reader options.

/// The NeXML namespace URI.
pub const NEXML_NAMESPACE: &str = "http://www.nexml.org/2009";

/// The XML-Schema-instance namespace URI (`xsi:type` declarations).
pub const XSI_NAMESPACE: &str = "http://www.w3.org/2001/XMLSchema-instance";

/// The XML-Schema datatype namespace URI (literal value coercion).
pub const XSD_NAMESPACE: &str = "http://www.w3.org/2001/XMLSchema";

/// Maximum nesting depth of annotation (`meta`) elements.
///
/// Annotations are recursive; documents are not always trusted, so the
/// recursion is bounded instead of tied to the call stack limit.
pub const MAX_ANNOTATION_DEPTH: usize = 64;

/// Options governing a document parse.
#[derive(Debug, Clone)]
pub struct ReaderConfig {
    /// Overrides the document's assumed namespace when matching tags.
    /// Defaults to [`NEXML_NAMESPACE`].
    pub default_namespace: Option<String>,

    /// Whether taxon label matching in single-namespace reuse mode is case
    /// sensitive.
    pub case_sensitive_taxon_labels: bool,

    /// Skip the character-block builder stage entirely.
    pub exclude_chars: bool,

    /// Skip the tree-block builder stage entirely.
    pub exclude_trees: bool,

    /// When extracting a single matrix from a multi-matrix document, the
    /// 0-based index of the matrix to return. Out of range is a hard error.
    pub matrix_offset: usize,

    /// Reject trees that resolve to more than one parentless node after
    /// linking, instead of reparenting the extras under the root.
    pub strict_acyclicity: bool,
}

impl Default for ReaderConfig {
    fn default() -> Self {
        Self {
            default_namespace: None,
            case_sensitive_taxon_labels: false,
            exclude_chars: false,
            exclude_trees: false,
            matrix_offset: 0,
            strict_acyclicity: false,
        }
    }
}

impl ReaderConfig {
    /// The namespace used to qualify document tags.
    #[must_use]
    pub fn namespace(&self) -> &str {
        self.default_namespace.as_deref().unwrap_or(NEXML_NAMESPACE)
    }
}
