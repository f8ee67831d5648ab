//! Document orchestrator.
//!
//! Drives the builders in sequence: taxon namespaces first (both downstream
//! stages depend on them), then character blocks, then tree blocks, then
//! document-level annotations. Owns the per-document registries; a hard
//! error anywhere aborts the whole parse and drops everything built so far.

use std::path::Path;

use roxmltree::Document;
use tracing::debug;

use phylodata_model::{CharacterMatrix, DataSet, TaxonNamespace};

use crate::annotations::annotate;
use crate::chars::parse_char_matrices;
use crate::config::ReaderConfig;
use crate::error::{NexmlError, Result};
use crate::registry::{DocumentRegistries, NamespaceRegistry};
use crate::taxa::parse_taxon_namespaces;
use crate::trees::parse_tree_lists;
use crate::xml::local_name;

/// Parses NeXML documents into [`DataSet`]s.
///
/// A reader is reusable: every call to [`NexmlReader::read_str`] parses one
/// independent document with its own registries, so separate documents may
/// be parsed in parallel by separate readers (the only shared state is the
/// read-only fixed-alphabet singletons). With an attached taxon namespace
/// the reads of one reader are no longer independent: the namespace grows
/// with each successfully parsed document.
#[derive(Debug, Default)]
pub struct NexmlReader {
    config: ReaderConfig,
    attached: Option<TaxonNamespace>,
}

impl NexmlReader {
    /// Create a reader with default options.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a reader with the given options.
    #[must_use]
    pub fn with_config(config: ReaderConfig) -> Self {
        Self {
            config,
            attached: None,
        }
    }

    /// The reader's options.
    #[must_use]
    pub fn config(&self) -> &ReaderConfig {
        &self.config
    }

    /// Force single-namespace mode: every `otus` block of every document
    /// read by this reader unifies into the given namespace, matching taxa
    /// by label. A document declaring more than one block is then rejected.
    ///
    /// The namespace is shared across reads: taxa added while parsing one
    /// document are visible to every later read of this reader.
    pub fn attach_taxon_namespace(&mut self, namespace: TaxonNamespace) {
        self.attached = Some(namespace);
    }

    /// The attached namespace in its current (possibly grown) state.
    #[must_use]
    pub fn attached_taxon_namespace(&self) -> Option<&TaxonNamespace> {
        self.attached.as_ref()
    }

    /// Parse a complete document from a string.
    pub fn read_str(&mut self, xml: &str) -> Result<DataSet> {
        let doc = Document::parse(xml)?;
        let root = doc.root_element();
        if local_name(root) != "nexml" {
            return Err(NexmlError::UnexpectedRoot {
                found: local_name(root).to_string(),
            });
        }
        let ns = self.config.namespace();

        let mut registries = DocumentRegistries::new();
        registries.namespaces = NamespaceRegistry::from_document(&doc);

        let mut dataset = DataSet::new();
        let attached_index = self.attached.as_ref().map(|namespace| {
            dataset.taxon_namespaces.push(namespace.clone());
            dataset.taxon_namespaces.len() - 1
        });

        // Taxon namespaces always parse first; characters and trees both
        // resolve against them.
        parse_taxon_namespaces(root, &mut dataset, &mut registries, &self.config, attached_index)?;

        if !self.config.exclude_chars {
            parse_char_matrices(root, &mut dataset, &registries, &self.config)?;
        }
        if !self.config.exclude_trees {
            parse_tree_lists(root, &mut dataset, &registries, &self.config)?;
        }

        annotate(&mut dataset, root, &registries.namespaces, ns)?;

        // Carry the unified namespace forward to the next read. Only on
        // success: an aborted parse leaves the attachment untouched.
        if let Some(index) = attached_index {
            self.attached = dataset.taxon_namespaces.get(index).cloned();
        }

        debug!(
            taxon_namespaces = dataset.taxon_namespaces.len(),
            matrices = dataset.char_matrices.len(),
            tree_lists = dataset.tree_lists.len(),
            "parsed document"
        );
        Ok(dataset)
    }

    /// Parse a complete document from a file.
    pub fn read_path(&mut self, path: impl AsRef<Path>) -> Result<DataSet> {
        let xml = std::fs::read_to_string(path)?;
        self.read_str(&xml)
    }

    /// Extract a single character matrix from a document, honoring the
    /// configured `matrix_offset`.
    ///
    /// An offset past the last parsed matrix is a hard error, never an
    /// empty default.
    pub fn read_matrix(&mut self, xml: &str) -> Result<CharacterMatrix> {
        if self.config.exclude_chars {
            return Err(NexmlError::Config(
                "cannot extract a matrix while exclude_chars is set".to_string(),
            ));
        }
        let mut dataset = self.read_str(xml)?;
        let offset = self.config.matrix_offset;
        let count = dataset.char_matrices.len();
        if offset >= count {
            return Err(NexmlError::MatrixOffsetOutOfRange { offset, count });
        }
        Ok(dataset.char_matrices.swap_remove(offset))
    }
}
