use serde::Serialize;
use std::fmt;

/// Name of a star pattern inside a query, i.e. the subject shared by its triples.
pub type StarPatternName = String;

/// Name (usually the IRI) of a shape.
pub type ShapeName = String;

/// Occurrence bounds of a predicate. `max == None` means unbounded.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct Cardinality {
    pub min: u32,
    pub max: Option<u32>,
}

impl Cardinality {
    pub fn new(min: u32, max: u32) -> Self {
        Cardinality {
            min,
            max: Some(max),
        }
    }

    pub fn unbounded(min: u32) -> Self {
        Cardinality { min, max: None }
    }

    /// A predicate with a zero lower bound does not have to be present.
    pub fn is_optional(&self) -> bool {
        self.min == 0
    }
}

impl fmt::Display for Cardinality {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.max {
            Some(max) => write!(f, "{{{},{}}}", self.min, max),
            None => write!(f, "{{{},*}}", self.min),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zero_lower_bound_is_optional() {
        assert!(Cardinality::unbounded(0).is_optional());
        assert!(Cardinality::new(0, 1).is_optional());
        assert!(!Cardinality::new(1, 1).is_optional());
    }

    #[test]
    fn display_marks_unbounded_upper_limit() {
        assert_eq!(Cardinality::new(1, 3).to_string(), "{1,3}");
        assert_eq!(Cardinality::unbounded(1).to_string(), "{1,*}");
    }
}
