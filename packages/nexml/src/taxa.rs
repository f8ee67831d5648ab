//! Taxon-namespace builder.
//!
//! Parses `otus` blocks into taxon namespaces and populates the document
//! registries. In single-namespace (attached) mode every block unifies into
//! the caller-supplied namespace by label instead of creating new taxa, and
//! a document declaring more than one block is rejected.

use roxmltree::Node;
use tracing::debug;

use phylodata_model::{DataSet, Taxon, TaxonNamespace};

use crate::annotations::annotate;
use crate::config::ReaderConfig;
use crate::error::{NexmlError, Result};
use crate::registry::DocumentRegistries;
use crate::xml::{find_children, get_attribute, require_attribute};

/// Parse every `otus` block of a document.
///
/// # Arguments
/// * `root` - Document root element
/// * `dataset` - Data set receiving the namespaces
/// * `registries` - Document registries to populate
/// * `config` - Reader options
/// * `attached` - Index of a caller-pre-attached namespace in `dataset`,
///   forcing single-namespace mode
pub fn parse_taxon_namespaces(
    root: Node<'_, '_>,
    dataset: &mut DataSet,
    registries: &mut DocumentRegistries,
    config: &ReaderConfig,
    attached: Option<usize>,
) -> Result<()> {
    let ns = config.namespace();
    let blocks: Vec<_> = find_children(root, "otus", ns).collect();

    if attached.is_some() && blocks.len() > 1 {
        return Err(NexmlError::MultipleTaxonNamespaces {
            count: blocks.len(),
        });
    }

    for block in blocks {
        parse_block(block, dataset, registries, config, attached)?;
    }
    Ok(())
}

/// Parse one `otus` block.
fn parse_block(
    block: Node<'_, '_>,
    dataset: &mut DataSet,
    registries: &mut DocumentRegistries,
    config: &ReaderConfig,
    attached: Option<usize>,
) -> Result<()> {
    let ns = config.namespace();
    let block_id = require_attribute(block, "id", "otus block")?;
    let label = get_attribute(block, "label").map(str::to_string);

    let index = match attached {
        Some(index) => {
            // Reuse the caller-supplied namespace; adopt the block label if
            // the namespace has none.
            if let Some(namespace) = dataset.taxon_namespaces.get_mut(index) {
                if namespace.label.is_none() {
                    namespace.label = label;
                }
            }
            index
        }
        None => {
            dataset.taxon_namespaces.push(TaxonNamespace::new(label));
            dataset.taxon_namespaces.len() - 1
        }
    };

    if registries
        .taxon_namespaces
        .insert(block_id.to_string(), index)
        .is_some()
    {
        return Err(NexmlError::DuplicateId {
            id: block_id.to_string(),
            context: "otus blocks".to_string(),
        });
    }

    if let Some(namespace) = dataset.taxon_namespaces.get_mut(index) {
        annotate(namespace, block, &registries.namespaces, ns)?;
    }

    let mut count = 0;
    for otu in find_children(block, "otu", ns) {
        let otu_id = require_attribute(otu, "id", &format!("otus block '{block_id}'"))?;
        let namespace = dataset
            .taxon_namespaces
            .get_mut(index)
            .ok_or_else(|| NexmlError::UnresolvedReference {
                kind: "taxon namespace",
                id: block_id.to_string(),
                context: "otus block".to_string(),
            })?;

        // Placeholder numbering is block-local, independent of how many
        // taxa a reused namespace already holds.
        let label = get_attribute(otu, "label")
            .map(str::to_string)
            .unwrap_or_else(|| format!("Taxon{}", count + 1));

        // In reuse mode, unify with an existing taxon by label before
        // creating a new one.
        let taxon_id = attached
            .and_then(|_| namespace.find_by_label(&label, config.case_sensitive_taxon_labels))
            .unwrap_or_else(|| namespace.add_taxon(Taxon::new(label)));

        if registries.taxa.register(block_id, otu_id, taxon_id).is_some() {
            return Err(NexmlError::DuplicateId {
                id: otu_id.to_string(),
                context: format!("otus block '{block_id}'"),
            });
        }

        if let Some(taxon) = namespace.taxon_mut(taxon_id) {
            annotate(taxon, otu, &registries.namespaces, ns)?;
        }
        count += 1;
    }

    debug!(block = block_id, taxa = count, "parsed taxon namespace");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use roxmltree::Document;

    fn parse(xml: &str, attached: Option<TaxonNamespace>) -> Result<(DataSet, DocumentRegistries)> {
        let doc = Document::parse(xml).unwrap();
        let mut dataset = DataSet::new();
        let attached_index = attached.map(|namespace| {
            dataset.taxon_namespaces.push(namespace);
            dataset.taxon_namespaces.len() - 1
        });
        let mut registries = DocumentRegistries::new();
        let config = ReaderConfig::default();
        parse_taxon_namespaces(
            doc.root_element(),
            &mut dataset,
            &mut registries,
            &config,
            attached_index,
        )?;
        Ok((dataset, registries))
    }

    #[test]
    fn test_basic_block() {
        let (dataset, registries) = parse(
            r#"<nexml xmlns="http://www.nexml.org/2009">
                <otus id="tax1" label="mammals">
                    <otu id="t1" label="s1"/>
                    <otu id="t2" label="s2"/>
                </otus>
            </nexml>"#,
            None,
        )
        .unwrap();

        assert_eq!(dataset.taxon_namespaces.len(), 1);
        let namespace = &dataset.taxon_namespaces[0];
        assert_eq!(namespace.label.as_deref(), Some("mammals"));
        assert_eq!(namespace.len(), 2);

        let t1 = *registries.taxa.resolve("tax1", "t1").unwrap();
        assert_eq!(namespace.taxon(t1).unwrap().label, "s1");
    }

    #[test]
    fn test_placeholder_labels() {
        let (dataset, _) = parse(
            r#"<nexml xmlns="http://www.nexml.org/2009">
                <otus id="tax1"><otu id="t1"/><otu id="t2"/></otus>
            </nexml>"#,
            None,
        )
        .unwrap();
        let namespace = &dataset.taxon_namespaces[0];
        assert_eq!(namespace.taxon(0).unwrap().label, "Taxon1");
        assert_eq!(namespace.taxon(1).unwrap().label, "Taxon2");
    }

    #[test]
    fn test_two_blocks_are_independent() {
        let (dataset, registries) = parse(
            r#"<nexml xmlns="http://www.nexml.org/2009">
                <otus id="tax1"><otu id="t1" label="a"/></otus>
                <otus id="tax2"><otu id="t1" label="b"/></otus>
            </nexml>"#,
            None,
        )
        .unwrap();

        assert_eq!(dataset.taxon_namespaces.len(), 2);
        let a = *registries.taxa.resolve("tax1", "t1").unwrap();
        let b = *registries.taxa.resolve("tax2", "t1").unwrap();
        assert_eq!(dataset.taxon_namespaces[0].taxon(a).unwrap().label, "a");
        assert_eq!(dataset.taxon_namespaces[1].taxon(b).unwrap().label, "b");
    }

    #[test]
    fn test_attached_mode_unifies_by_label() {
        let mut seed = TaxonNamespace::new(Some("shared".to_string()));
        seed.add_taxon(Taxon::new("s1"));

        let (dataset, registries) = parse(
            r#"<nexml xmlns="http://www.nexml.org/2009">
                <otus id="tax1">
                    <otu id="t1" label="S1"/>
                    <otu id="t2" label="s2"/>
                </otus>
            </nexml>"#,
            Some(seed),
        )
        .unwrap();

        // "S1" unified case-insensitively with the pre-attached "s1".
        let namespace = &dataset.taxon_namespaces[0];
        assert_eq!(namespace.len(), 2);
        assert_eq!(*registries.taxa.resolve("tax1", "t1").unwrap(), 0);
        assert_eq!(namespace.taxon(1).unwrap().label, "s2");
    }

    #[test]
    fn test_placeholder_numbering_is_block_local_in_reuse_mode() {
        let mut seed = TaxonNamespace::new(None);
        seed.add_taxon(Taxon::new("s1"));
        seed.add_taxon(Taxon::new("s2"));

        let (dataset, _) = parse(
            r#"<nexml xmlns="http://www.nexml.org/2009">
                <otus id="tax1"><otu id="t1"/><otu id="t2"/></otus>
            </nexml>"#,
            Some(seed),
        )
        .unwrap();

        // Numbering restarts at 1 per block, not after the seeded taxa.
        let namespace = &dataset.taxon_namespaces[0];
        assert_eq!(namespace.taxon(2).unwrap().label, "Taxon1");
        assert_eq!(namespace.taxon(3).unwrap().label, "Taxon2");
    }

    #[test]
    fn test_attached_mode_rejects_second_block() {
        let err = parse(
            r#"<nexml xmlns="http://www.nexml.org/2009">
                <otus id="tax1"><otu id="t1"/></otus>
                <otus id="tax2"><otu id="t1"/></otus>
            </nexml>"#,
            Some(TaxonNamespace::new(None)),
        )
        .unwrap_err();
        assert!(matches!(
            err,
            NexmlError::MultipleTaxonNamespaces { count: 2 }
        ));
    }

    #[test]
    fn test_duplicate_otu_id_rejected() {
        let err = parse(
            r#"<nexml xmlns="http://www.nexml.org/2009">
                <otus id="tax1"><otu id="t1"/><otu id="t1"/></otus>
            </nexml>"#,
            None,
        )
        .unwrap_err();
        assert!(matches!(err, NexmlError::DuplicateId { ref id, .. } if id == "t1"));
    }

    #[test]
    fn test_missing_otu_id_rejected() {
        let err = parse(
            r#"<nexml xmlns="http://www.nexml.org/2009">
                <otus id="tax1"><otu label="x"/></otus>
            </nexml>"#,
            None,
        )
        .unwrap_err();
        assert!(matches!(err, NexmlError::MissingAttribute { .. }));
    }
}
