//! Quick alignment check of property/object pairs against a shape, without
//! building star patterns.

use crate::shape::Shape;
use crate::term::QueryTerm;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PropertyObject {
    pub property_iri: String,
    pub object: QueryTerm,
}

impl PropertyObject {
    pub fn new(property_iri: impl Into<String>, object: QueryTerm) -> Self {
        PropertyObject {
            property_iri: property_iri.into(),
            object,
        }
    }

    /// An open shape accepts every property; a closed one only the properties it
    /// declares and does not forbid.
    pub fn is_aligned_with_shape(&self, shape: &Shape) -> bool {
        if !shape.is_closed() {
            return true;
        }
        if shape
            .negative_predicates()
            .iter()
            .any(|p| *p == self.property_iri)
        {
            return false;
        }
        shape
            .positive_predicates()
            .iter()
            .any(|p| *p == self.property_iri)
    }
}

/// Whether at least one property aligns with the shape; `None` without properties.
pub fn has_one_align(query_properties: &[PropertyObject], shape: &Shape) -> Option<bool> {
    if query_properties.is_empty() {
        return None;
    }
    Some(
        query_properties
            .iter()
            .any(|property| property.is_aligned_with_shape(shape)),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn object() -> QueryTerm {
        QueryTerm::named_node("http://example.com/object")
    }

    fn closed(predicates: &[&str]) -> Shape {
        Shape::builder("foo")
            .closed(true)
            .predicates(predicates.iter().copied())
            .build()
            .unwrap()
    }

    #[test]
    fn aligned_with_the_right_predicate() {
        let property = PropertyObject::new("foo", object());
        assert!(property.is_aligned_with_shape(&closed(&["foo"])));
        assert!(property.is_aligned_with_shape(&closed(&["1", "foo", "2"])));
    }

    #[test]
    fn not_aligned_with_wrong_or_missing_predicates() {
        let property = PropertyObject::new("foo", object());
        assert!(!property.is_aligned_with_shape(&closed(&["wrong predicate"])));
        assert!(!property.is_aligned_with_shape(&closed(&[])));
        assert!(!property.is_aligned_with_shape(&closed(&["1", "2", "3", "4"])));
    }

    #[test]
    fn open_shape_aligns_everything() {
        let shape = Shape::builder("foo").build().unwrap();
        assert!(PropertyObject::new("anything", object()).is_aligned_with_shape(&shape));
    }

    #[test]
    fn forbidden_predicate_does_not_align() {
        let shape = Shape::builder("foo")
            .closed(true)
            .predicate("bar")
            .negative_predicate("foo")
            .build()
            .unwrap();
        assert!(!PropertyObject::new("foo", object()).is_aligned_with_shape(&shape));
    }

    #[test]
    fn has_one_align_over_several_properties() {
        let shape = closed(&["foo", "bar", "boo", "1", "2"]);
        let properties = |names: &[&str]| -> Vec<PropertyObject> {
            names
                .iter()
                .map(|name| PropertyObject::new(*name, object()))
                .collect()
        };
        assert_eq!(has_one_align(&[], &shape), None);
        assert_eq!(has_one_align(&properties(&["foo"]), &shape), Some(true));
        assert_eq!(
            has_one_align(&properties(&["a", "b", "foo"]), &shape),
            Some(true)
        );
        assert_eq!(has_one_align(&properties(&["a", "b", "c"]), &shape), Some(false));
    }
}
