//! Phylodata NeXML Reader
//!
//! Deserializes NeXML phylogenetic data documents into the
//! [`phylodata_model`] data model. A NeXML document is hierarchical but
//! cross-referencing: tree nodes reference taxa declared in an earlier
//! block, character cells reference column and state declarations in a
//! sibling block, and annotations reference CURIE prefixes declared at the
//! document root. This crate resolves all of those references into arena
//! handles, rejecting dangling, duplicate, or inconsistent ids, and links
//! general node/edge lists into rooted acyclic trees.
//!
//! # Example
//!
//! ```
//! use phylodata_nexml::NexmlReader;
//!
//! let xml = r#"<nexml xmlns="http://www.nexml.org/2009">
//!     <otus id="tax1">
//!         <otu id="t1" label="Corvus corax"/>
//!     </otus>
//! </nexml>"#;
//!
//! let dataset = NexmlReader::new().read_str(xml).unwrap();
//! assert_eq!(dataset.taxon_namespaces[0].len(), 1);
//! ```
//!
//! # Architecture
//!
//! - [`xml`]: namespace-aware element access over the generic XML tree
//! - [`registry`]: per-document prefix and id registries
//! - [`annotations`]: recursive metadata resolver with CURIE handling
//! - [`taxa`]: taxon-namespace builder
//! - [`chars`]: character-block builder
//! - [`trees`]: tree-block builder (staged node/edge/link passes)
//! - [`reader`]: document orchestrator
//! - [`config`]: reader options
//! - [`error`]: error types and Result alias
//! - [`cli`]: command-line interface

pub mod annotations;
pub mod chars;
pub mod cli;
pub mod config;
pub mod error;
pub mod reader;
pub mod registry;
pub mod taxa;
pub mod trees;
pub mod xml;

// Re-export commonly used items
pub use config::{ReaderConfig, NEXML_NAMESPACE, XSD_NAMESPACE, XSI_NAMESPACE};
pub use error::{NexmlError, Result};
pub use reader::NexmlReader;
pub use trees::parse_tree;

// The data model this crate constructs into.
pub use phylodata_model as model;

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reexports() {
        let _config = ReaderConfig::default();
        let _reader = NexmlReader::new();
        assert_eq!(NEXML_NAMESPACE, "http://www.nexml.org/2009");
    }
}
