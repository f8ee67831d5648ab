//! Element access layer over the generic XML tree.
//!
//! Namespace-aware navigation and attribute helpers over `roxmltree` nodes.
//! Tag lookups qualify the local tag with the document's default namespace;
//! no cross-referencing logic lives here.

use roxmltree::Node;

use crate::config::XSI_NAMESPACE;
use crate::error::{NexmlError, Result};

/// Get the tag name without its namespace.
///
/// # Examples
/// ```
/// use roxmltree::Document;
/// use phylodata_nexml::xml::local_name;
///
/// let xml = r#"<nex:nexml xmlns:nex="http://www.nexml.org/2009"/>"#;
/// let doc = Document::parse(xml).unwrap();
/// assert_eq!(local_name(doc.root_element()), "nexml");
/// ```
pub fn local_name<'a>(node: Node<'a, '_>) -> &'a str {
    node.tag_name().name()
}

/// Whether a node is an element with the given namespace-qualified tag.
fn matches_tag(node: Node<'_, '_>, tag: &str, ns: &str) -> bool {
    node.is_element()
        && node.tag_name().name() == tag
        && node.tag_name().namespace().is_none_or(|n| n == ns)
}

/// Find the first child element with the given namespace-qualified tag.
///
/// Children in no namespace at all also match, so documents that omit the
/// namespace declaration still parse.
pub fn find_child<'a, 'input>(
    node: Node<'a, 'input>,
    tag: &str,
    ns: &str,
) -> Option<Node<'a, 'input>> {
    node.children().find(|child| matches_tag(*child, tag, ns))
}

/// Find all child elements with the given namespace-qualified tag.
pub fn find_children<'a, 'input>(
    node: Node<'a, 'input>,
    tag: &'a str,
    ns: &'a str,
) -> impl Iterator<Item = Node<'a, 'input>> {
    node.children()
        .filter(move |child| matches_tag(*child, tag, ns))
}

/// Find all descendant elements with the given namespace-qualified tag, at
/// any depth.
pub fn find_descendants<'a, 'input>(
    node: Node<'a, 'input>,
    tag: &'a str,
    ns: &'a str,
) -> impl Iterator<Item = Node<'a, 'input>> {
    node.descendants()
        .filter(move |d| matches_tag(*d, tag, ns))
}

/// Get an attribute value from a node.
pub fn get_attribute<'a>(node: Node<'a, '_>, name: &str) -> Option<&'a str> {
    node.attribute(name)
}

/// Get a required attribute, with the enclosing context for diagnostics.
///
/// # Arguments
/// * `node` - Node to read from
/// * `name` - Attribute name
/// * `context` - Smallest enclosing context (block id, row label, ...)
pub fn require_attribute<'a>(node: Node<'a, '_>, name: &str, context: &str) -> Result<&'a str> {
    node.attribute(name)
        .ok_or_else(|| NexmlError::MissingAttribute {
            attribute: name.to_string(),
            context: context.to_string(),
        })
}

/// Get the text content of a node, trimmed.
pub fn get_text(node: Node<'_, '_>) -> String {
    node.text()
        .map(|s| s.trim().to_string())
        .unwrap_or_default()
}

/// Read the XML-Schema-instance type declaration of a polymorphic element
/// and return the bare local type name.
///
/// Strips any namespace-prefix portion ("nex:DnaSeqs" becomes "DnaSeqs").
/// Every polymorphic element (characters blocks, trees, meta elements) must
/// carry this attribute; its absence is an error.
///
/// # Examples
/// ```
/// use roxmltree::Document;
/// use phylodata_nexml::xml::declared_type;
///
/// let xml = r#"<root xmlns:xsi="http://www.w3.org/2001/XMLSchema-instance"
///                    xsi:type="nex:DnaSeqs"/>"#;
/// let doc = Document::parse(xml).unwrap();
/// assert_eq!(declared_type(doc.root_element(), "root").unwrap(), "DnaSeqs");
/// ```
pub fn declared_type<'a>(node: Node<'a, '_>, context: &str) -> Result<&'a str> {
    let value = node.attribute((XSI_NAMESPACE, "type")).ok_or_else(|| {
        NexmlError::MissingTypeDeclaration {
            context: context.to_string(),
        }
    })?;
    Ok(match value.split_once(':') {
        Some((_, bare)) => bare,
        None => value,
    })
}
