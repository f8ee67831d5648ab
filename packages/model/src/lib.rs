//! Phylodata Model
//!
//! The in-memory data model for phylogenetic documents: taxa, character
//! matrices, and trees, plus the generic annotation model shared by all of
//! them. Cross-references are arena handles (`usize` indices) into the
//! owning collection rather than shared pointers, so a parsed document is
//! plain owned data.
//!
//! # Example
//!
//! ```
//! use phylodata_model::{state, Taxon, TaxonNamespace};
//!
//! let mut ns = TaxonNamespace::new(Some("birds".to_string()));
//! let t = ns.add_taxon(Taxon::new("Corvus corax"));
//! assert_eq!(ns.taxon(t).unwrap().label, "Corvus corax");
//!
//! // Fixed alphabets are process-wide singletons.
//! let a = state::dna().state_for_symbol("A").unwrap();
//! assert_eq!(state::dna().symbol(a), Some("A"));
//! ```

pub mod annotation;
pub mod dataset;
pub mod error;
pub mod matrix;
pub mod state;
pub mod taxon;
pub mod tree;

// Re-export commonly used items
pub use annotation::{Annotated, Annotation, AnnotationValue};
pub use dataset::DataSet;
pub use error::{ModelError, Result};
pub use matrix::{
    Cell, CellValue, CharacterMatrix, CharacterSequence, CharacterType, CharacterTypeId, DataType,
    MatrixRow,
};
pub use state::{State, StateAlphabet, StateAlphabetBuilder, StateId, StateKind};
pub use taxon::{Taxon, TaxonId, TaxonNamespace};
pub use tree::{EdgeLength, Node, NodeId, Tree, TreeList};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reexports() {
        let _dt = DataType::Dna;
        let _ds = DataSet::new();
        let _tree = Tree::new(None);
    }
}
