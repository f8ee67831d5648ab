//! The assembled product of a document parse.

use crate::annotation::{Annotated, Annotation};
use crate::matrix::CharacterMatrix;
use crate::taxon::{Taxon, TaxonId, TaxonNamespace};
use crate::tree::TreeList;

/// A complete phylogenetic data document: taxon namespaces, character
/// matrices, and tree collections, cross-referenced by arena indices.
#[derive(Debug, Clone, Default)]
pub struct DataSet {
    /// Taxon namespaces in document order. Matrices and tree lists refer to
    /// these by index.
    pub taxon_namespaces: Vec<TaxonNamespace>,

    /// Character matrices in document order.
    pub char_matrices: Vec<CharacterMatrix>,

    /// Tree collections in document order.
    pub tree_lists: Vec<TreeList>,

    /// Document-level annotations.
    pub annotations: Vec<Annotation>,
}

impl DataSet {
    /// Create an empty data set.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Resolve a taxon through its namespace index.
    #[must_use]
    pub fn taxon(&self, namespace: usize, taxon: TaxonId) -> Option<&Taxon> {
        self.taxon_namespaces.get(namespace)?.taxon(taxon)
    }
}

impl Annotated for DataSet {
    fn annotations(&self) -> &[Annotation] {
        &self.annotations
    }

    fn annotations_mut(&mut self) -> &mut Vec<Annotation> {
        &mut self.annotations
    }
}
