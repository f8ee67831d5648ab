//! Annotation resolver.
//!
//! Parses `meta` elements into the generic annotation model: literal
//! annotations carry `property`/`content` pairs, resource annotations carry
//! `rel`/`href` pairs. Property names are CURIEs resolved against the
//! document's namespace registry; unresolvable property prefixes are fatal.
//! Literal values are coerced according to their declared datatype on a
//! best-effort basis: a value that fails coercion stays a string.

use roxmltree::Node;
use tracing::debug;

use phylodata_model::{Annotated, Annotation, AnnotationValue};

use crate::config::{MAX_ANNOTATION_DEPTH, XSD_NAMESPACE};
use crate::error::{NexmlError, Result};
use crate::registry::NamespaceRegistry;
use crate::xml::{declared_type, find_children, get_attribute, get_text, require_attribute};

/// Parse all `meta` children of an element into annotations.
///
/// # Arguments
/// * `parent` - Element whose `meta` children are read
/// * `registry` - Document prefix table
/// * `ns` - Default document namespace for tag matching
pub fn parse_meta(
    parent: Node<'_, '_>,
    registry: &NamespaceRegistry,
    ns: &str,
) -> Result<Vec<Annotation>> {
    find_children(parent, "meta", ns)
        .map(|meta| parse_one(meta, registry, ns, 0))
        .collect()
}

/// Parse all `meta` children of an element onto an annotation owner.
///
/// The resolver only knows the owner through the [`Annotated`] capability.
pub fn annotate<T: Annotated>(
    owner: &mut T,
    parent: Node<'_, '_>,
    registry: &NamespaceRegistry,
    ns: &str,
) -> Result<()> {
    let mut parsed = parse_meta(parent, registry, ns)?;
    owner.annotations_mut().append(&mut parsed);
    Ok(())
}

/// Parse a single `meta` element, recursing into nested annotations.
fn parse_one(
    meta: Node<'_, '_>,
    registry: &NamespaceRegistry,
    ns: &str,
    depth: usize,
) -> Result<Annotation> {
    if depth >= MAX_ANNOTATION_DEPTH {
        return Err(NexmlError::AnnotationDepthExceeded {
            limit: MAX_ANNOTATION_DEPTH,
        });
    }

    let declared = declared_type(meta, "meta element")?;
    let (key, value, datatype) = match declared {
        "LiteralMeta" => {
            let property = require_attribute(meta, "property", "literal meta element")?;
            // Content may sit in the attribute or in the element body.
            let content = get_attribute(meta, "content")
                .map(str::to_string)
                .unwrap_or_else(|| get_text(meta));
            let datatype = get_attribute(meta, "datatype").map(str::to_string);
            let value = match &datatype {
                Some(hint) => coerce_literal(content, hint, registry),
                None => AnnotationValue::String(content),
            };
            (property, value, datatype)
        }
        "ResourceMeta" => {
            let rel = require_attribute(meta, "rel", "resource meta element")?;
            let href = require_attribute(meta, "href", "resource meta element")?;
            (rel, AnnotationValue::Resource(href.to_string()), None)
        }
        other => {
            return Err(NexmlError::UnsupportedType {
                declared: other.to_string(),
                context: "meta element".to_string(),
            });
        }
    };

    let (prefix, name) = split_curie(key);
    let namespace = registry.resolve_prefix(prefix).map(str::to_string);
    if namespace.is_none() {
        return Err(NexmlError::UnknownPrefix {
            prefix: prefix.to_string(),
            context: format!("meta property '{key}'"),
        });
    }

    let mut annotation = Annotation::new(prefix, name, namespace, value);
    annotation.datatype = datatype;

    // Annotations nest arbitrarily.
    for nested in find_children(meta, "meta", ns) {
        annotation
            .annotations
            .push(parse_one(nested, registry, ns, depth + 1)?);
    }

    Ok(annotation)
}

/// Split a CURIE-style key into `(prefix, local name)`.
///
/// A key without a colon belongs to the default (empty) prefix.
fn split_curie(key: &str) -> (&str, &str) {
    match key.split_once(':') {
        Some((prefix, name)) => (prefix, name),
        None => ("", key),
    }
}

/// Coerce a literal value according to its declared datatype.
///
/// Best-effort: unresolvable datatype prefixes, unknown datatypes, and
/// values that fail to parse all degrade to the original string.
fn coerce_literal(raw: String, datatype: &str, registry: &NamespaceRegistry) -> AnnotationValue {
    let (prefix, local) = split_curie(datatype);
    let Some(namespace) = registry.resolve_prefix(prefix) else {
        debug!(datatype, "unresolvable datatype prefix, keeping string value");
        return AnnotationValue::String(raw);
    };

    if namespace == XSD_NAMESPACE {
        return coerce_xsd(raw, local);
    }

    // Custom range-style datatypes: whitespace-delimited real numbers.
    if local.to_ascii_lowercase().contains("range") {
        let parsed: std::result::Result<Vec<f64>, _> =
            raw.split_whitespace().map(str::parse).collect();
        if let Ok(values) = parsed {
            if !values.is_empty() {
                return AnnotationValue::RealList(values);
            }
        }
    }

    AnnotationValue::String(raw)
}

/// Coerce an XML-Schema primitive.
fn coerce_xsd(raw: String, local: &str) -> AnnotationValue {
    match local {
        "boolean" => match raw.trim() {
            "true" | "1" => AnnotationValue::Boolean(true),
            "false" | "0" => AnnotationValue::Boolean(false),
            _ => AnnotationValue::String(raw),
        },
        "integer" | "int" | "long" | "short" | "byte" | "nonNegativeInteger"
        | "nonPositiveInteger" | "positiveInteger" | "negativeInteger" | "unsignedLong"
        | "unsignedInt" | "unsignedShort" | "unsignedByte" => match raw.trim().parse::<i64>() {
            Ok(v) => AnnotationValue::Integer(v),
            Err(_) => AnnotationValue::String(raw),
        },
        "float" | "double" | "decimal" => match raw.trim().parse::<f64>() {
            Ok(v) => AnnotationValue::Real(v),
            Err(_) => AnnotationValue::String(raw),
        },
        _ => AnnotationValue::String(raw),
    }
}
