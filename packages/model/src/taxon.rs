//! Taxa and taxon namespaces.
//!
//! A taxon namespace is a labeled, ordered collection of taxon identities.
//! Within a namespace, identity is by handle, not label: two taxa may share
//! a label. Taxa are referenced from matrices and trees by [`TaxonId`]
//! handles into their owning namespace.

use crate::annotation::{Annotated, Annotation};

/// Handle of a taxon within its owning [`TaxonNamespace`] (arena index).
pub type TaxonId = usize;

/// A single operational taxonomic unit.
#[derive(Debug, Clone, PartialEq)]
pub struct Taxon {
    /// Taxon label.
    pub label: String,

    /// Annotations attached to this taxon.
    pub annotations: Vec<Annotation>,
}

impl Taxon {
    /// Create a new taxon with the given label.
    #[must_use]
    pub fn new(label: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            annotations: Vec::new(),
        }
    }
}

impl Annotated for Taxon {
    fn annotations(&self) -> &[Annotation] {
        &self.annotations
    }

    fn annotations_mut(&mut self) -> &mut Vec<Annotation> {
        &mut self.annotations
    }
}

/// An ordered collection of taxa shared by the matrices and trees that
/// reference it.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TaxonNamespace {
    /// Namespace label.
    pub label: Option<String>,

    /// Taxa in declaration order.
    taxa: Vec<Taxon>,

    /// Annotations attached to this namespace.
    pub annotations: Vec<Annotation>,
}

impl TaxonNamespace {
    /// Create a new, empty taxon namespace.
    #[must_use]
    pub fn new(label: Option<String>) -> Self {
        Self {
            label,
            taxa: Vec::new(),
            annotations: Vec::new(),
        }
    }

    /// Add a taxon, returning its handle.
    pub fn add_taxon(&mut self, taxon: Taxon) -> TaxonId {
        self.taxa.push(taxon);
        self.taxa.len() - 1
    }

    /// Get a taxon by handle.
    #[must_use]
    pub fn taxon(&self, id: TaxonId) -> Option<&Taxon> {
        self.taxa.get(id)
    }

    /// Get a taxon by handle, mutably.
    pub fn taxon_mut(&mut self, id: TaxonId) -> Option<&mut Taxon> {
        self.taxa.get_mut(id)
    }

    /// Find the first taxon with a matching label.
    ///
    /// # Arguments
    /// * `label` - Label to search for
    /// * `case_sensitive` - Whether the comparison is case sensitive
    #[must_use]
    pub fn find_by_label(&self, label: &str, case_sensitive: bool) -> Option<TaxonId> {
        self.taxa.iter().position(|t| {
            if case_sensitive {
                t.label == label
            } else {
                t.label.eq_ignore_ascii_case(label)
            }
        })
    }

    /// Number of taxa in the namespace.
    #[must_use]
    pub fn len(&self) -> usize {
        self.taxa.len()
    }

    /// Whether the namespace contains no taxa.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.taxa.is_empty()
    }

    /// Iterate over `(handle, taxon)` pairs in declaration order.
    pub fn iter(&self) -> impl Iterator<Item = (TaxonId, &Taxon)> {
        self.taxa.iter().enumerate()
    }
}

impl Annotated for TaxonNamespace {
    fn annotations(&self) -> &[Annotation] {
        &self.annotations
    }

    fn annotations_mut(&mut self) -> &mut Vec<Annotation> {
        &mut self.annotations
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_add_and_get_taxon() {
        let mut ns = TaxonNamespace::new(Some("primates".to_string()));
        let id = ns.add_taxon(Taxon::new("Homo sapiens"));
        assert_eq!(ns.taxon(id).map(|t| t.label.as_str()), Some("Homo sapiens"));
        assert_eq!(ns.len(), 1);
    }

    #[test]
    fn test_find_by_label_case_insensitive() {
        let mut ns = TaxonNamespace::new(None);
        let id = ns.add_taxon(Taxon::new("Pan troglodytes"));
        assert_eq!(ns.find_by_label("pan TROGLODYTES", false), Some(id));
        assert_eq!(ns.find_by_label("pan TROGLODYTES", true), None);
        assert_eq!(ns.find_by_label("missing", false), None);
    }

    #[test]
    fn test_duplicate_labels_are_distinct_taxa() {
        let mut ns = TaxonNamespace::new(None);
        let a = ns.add_taxon(Taxon::new("sp."));
        let b = ns.add_taxon(Taxon::new("sp."));
        assert_ne!(a, b);
        assert_eq!(ns.len(), 2);
    }
}
