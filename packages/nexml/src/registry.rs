//! Document-scoped registries: CURIE prefix table and id resolution maps.
//!
//! Element ids in a document are only unique within their declaring block,
//! so object registration uses a composite `(scope, id)` key. All registries
//! live for one document parse and are discarded with it.

use std::collections::HashMap;

use roxmltree::Document;

use phylodata_model::TaxonId;

/// Mapping from declared XML namespace prefixes to URIs, plus the reverse.
///
/// Populated once from the document's namespace declarations; immutable
/// afterward. The default (unprefixed) namespace is registered under the
/// empty prefix.
#[derive(Debug, Clone, Default)]
pub struct NamespaceRegistry {
    prefix_to_uri: HashMap<String, String>,
    uri_to_prefixes: HashMap<String, Vec<String>>,
}

impl NamespaceRegistry {
    /// Create an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Scan every element of a document for namespace declarations.
    ///
    /// The first declaration of a prefix wins; nested re-declarations of the
    /// same prefix are not tracked per scope.
    #[must_use]
    pub fn from_document(doc: &Document<'_>) -> Self {
        let mut registry = Self::new();
        for node in doc.descendants().filter(|n| n.is_element()) {
            for ns in node.namespaces() {
                registry.insert(ns.name().unwrap_or(""), ns.uri());
            }
        }
        registry
    }

    /// Register a prefix → URI mapping unless the prefix is already known.
    pub fn insert(&mut self, prefix: &str, uri: &str) {
        if self.prefix_to_uri.contains_key(prefix) {
            return;
        }
        self.prefix_to_uri
            .insert(prefix.to_string(), uri.to_string());
        self.uri_to_prefixes
            .entry(uri.to_string())
            .or_default()
            .push(prefix.to_string());
    }

    /// Resolve a prefix to its namespace URI.
    #[must_use]
    pub fn resolve_prefix(&self, prefix: &str) -> Option<&str> {
        self.prefix_to_uri.get(prefix).map(String::as_str)
    }

    /// All prefixes declared for a URI, in declaration order.
    #[must_use]
    pub fn prefixes_for(&self, uri: &str) -> &[String] {
        self.uri_to_prefixes
            .get(uri)
            .map(Vec::as_slice)
            .unwrap_or_default()
    }
}

/// Composite-key registry from `(scope, id)` to constructed objects.
///
/// `scope` is the id of the enclosing block, preventing collisions between
/// the independently numbered ids of sibling blocks.
#[derive(Debug, Clone)]
pub struct ScopedRegistry<T> {
    entries: HashMap<(String, String), T>,
}

impl<T> ScopedRegistry<T> {
    /// Create an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self {
            entries: HashMap::new(),
        }
    }

    /// Register an object, returning the previous entry if the key was
    /// already taken.
    pub fn register(&mut self, scope: &str, id: &str, value: T) -> Option<T> {
        self.entries
            .insert((scope.to_string(), id.to_string()), value)
    }

    /// Resolve an id within a scope.
    #[must_use]
    pub fn resolve(&self, scope: &str, id: &str) -> Option<&T> {
        self.entries.get(&(scope.to_string(), id.to_string()))
    }

    /// Number of registered entries.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the registry is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl<T> Default for ScopedRegistry<T> {
    fn default() -> Self {
        Self::new()
    }
}

/// All document-scoped registries, owned by the orchestrator and passed by
/// reference to the builders.
#[derive(Debug, Default)]
pub struct DocumentRegistries {
    /// Declared namespace prefixes.
    pub namespaces: NamespaceRegistry,

    /// Taxon-namespace block id → index into the data set's namespaces.
    pub taxon_namespaces: HashMap<String, usize>,

    /// `(otus block id, otu id)` → taxon handle within that namespace.
    pub taxa: ScopedRegistry<TaxonId>,
}

impl DocumentRegistries {
    /// Create empty registries for a fresh document.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_namespace_scan() {
        let xml = r#"<nexml xmlns="http://www.nexml.org/2009"
                            xmlns:dc="http://purl.org/dc/elements/1.1/">
            <otus id="t1" xmlns:local="urn:local"/>
        </nexml>"#;
        let doc = Document::parse(xml).unwrap();
        let registry = NamespaceRegistry::from_document(&doc);

        assert_eq!(
            registry.resolve_prefix("dc"),
            Some("http://purl.org/dc/elements/1.1/")
        );
        assert_eq!(registry.resolve_prefix("local"), Some("urn:local"));
        assert_eq!(registry.resolve_prefix(""), Some("http://www.nexml.org/2009"));
        assert_eq!(registry.resolve_prefix("missing"), None);
    }

    #[test]
    fn test_reverse_lookup() {
        let mut registry = NamespaceRegistry::new();
        registry.insert("a", "urn:x");
        registry.insert("b", "urn:x");
        assert_eq!(registry.prefixes_for("urn:x"), &["a", "b"]);
        assert!(registry.prefixes_for("urn:y").is_empty());
    }

    #[test]
    fn test_first_declaration_wins() {
        let mut registry = NamespaceRegistry::new();
        registry.insert("p", "urn:first");
        registry.insert("p", "urn:second");
        assert_eq!(registry.resolve_prefix("p"), Some("urn:first"));
    }

    #[test]
    fn test_scoped_registry_prevents_cross_block_collision() {
        let mut registry: ScopedRegistry<usize> = ScopedRegistry::new();
        assert!(registry.register("ns_a", "t1", 0).is_none());
        assert!(registry.register("ns_b", "t1", 7).is_none());

        assert_eq!(registry.resolve("ns_a", "t1"), Some(&0));
        assert_eq!(registry.resolve("ns_b", "t1"), Some(&7));
        assert_eq!(registry.resolve("ns_c", "t1"), None);
    }

    #[test]
    fn test_scoped_registry_duplicate_returns_previous() {
        let mut registry: ScopedRegistry<usize> = ScopedRegistry::new();
        registry.register("s", "x", 1);
        assert_eq!(registry.register("s", "x", 2), Some(1));
    }
}
