//! Generic annotation model.
//!
//! Annotations are metadata statements attached to any element of the data
//! model: a CURIE-named property with either a literal value or a resource
//! reference, plus arbitrarily nested sub-annotations.

use serde::Serialize;

/// Value carried by an annotation.
///
/// Literal values are coerced from their declared datatype where possible;
/// a value that fails coercion stays a [`AnnotationValue::String`].
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum AnnotationValue {
    /// Uninterpreted string literal.
    String(String),

    /// Boolean literal.
    Boolean(bool),

    /// Integer literal.
    Integer(i64),

    /// Real-number literal.
    Real(f64),

    /// Whitespace-delimited list of real numbers (range-style datatypes).
    RealList(Vec<f64>),

    /// Resource reference (href of a resource annotation).
    Resource(String),
}

impl AnnotationValue {
    /// Return the value as a display string.
    #[must_use]
    pub fn as_display_string(&self) -> String {
        match self {
            Self::String(s) | Self::Resource(s) => s.clone(),
            Self::Boolean(b) => b.to_string(),
            Self::Integer(i) => i.to_string(),
            Self::Real(r) => r.to_string(),
            Self::RealList(v) => v
                .iter()
                .map(ToString::to_string)
                .collect::<Vec<_>>()
                .join(" "),
        }
    }
}

/// A single annotation: a namespaced property with a value and optional
/// nested sub-annotations.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Annotation {
    /// Local part of the CURIE property name (after the colon).
    pub name: String,

    /// CURIE prefix of the property name (before the colon; empty for the
    /// default prefix).
    pub prefix: String,

    /// Namespace URI the prefix resolved to.
    pub namespace: Option<String>,

    /// Annotation value.
    pub value: AnnotationValue,

    /// Raw datatype hint as written in the document (e.g. "xsd:integer").
    pub datatype: Option<String>,

    /// Nested sub-annotations.
    pub annotations: Vec<Annotation>,
}

impl Annotation {
    /// Create a new annotation with no nested sub-annotations.
    #[must_use]
    pub fn new(
        prefix: impl Into<String>,
        name: impl Into<String>,
        namespace: Option<String>,
        value: AnnotationValue,
    ) -> Self {
        Self {
            name: name.into(),
            prefix: prefix.into(),
            namespace,
            value,
            datatype: None,
            annotations: Vec::new(),
        }
    }

    /// Reconstruct the CURIE form of the property name.
    #[must_use]
    pub fn qualified_name(&self) -> String {
        if self.prefix.is_empty() {
            self.name.clone()
        } else {
            format!("{}:{}", self.prefix, self.name)
        }
    }
}

/// Capability of carrying an annotation collection.
///
/// The annotation parser only knows its target through this trait; it has no
/// knowledge of which domain object it is annotating.
pub trait Annotated {
    /// Annotations attached to this object.
    fn annotations(&self) -> &[Annotation];

    /// Mutable access to the annotation collection.
    fn annotations_mut(&mut self) -> &mut Vec<Annotation>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_qualified_name() {
        let ann = Annotation::new(
            "dc",
            "title",
            Some("http://purl.org/dc/elements/1.1/".to_string()),
            AnnotationValue::String("a title".to_string()),
        );
        assert_eq!(ann.qualified_name(), "dc:title");
    }

    #[test]
    fn test_qualified_name_without_prefix() {
        let ann = Annotation::new("", "title", None, AnnotationValue::Boolean(true));
        assert_eq!(ann.qualified_name(), "title");
    }

    #[test]
    fn test_value_display() {
        assert_eq!(
            AnnotationValue::RealList(vec![1.0, 2.5]).as_display_string(),
            "1 2.5"
        );
        assert_eq!(AnnotationValue::Integer(42).as_display_string(), "42");
    }
}
