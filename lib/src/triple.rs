use crate::term::{QueryTerm, TripleObject};
use crate::types::{Cardinality, StarPatternName};
use std::collections::BTreeSet;
use std::fmt;

/// Reserved predicate of a triple standing for "any predicate not in the negated set".
pub const NEGATED_SET_MARKER: &str = "urn:shape-containment:negated-property-set";

/// A triple of a star pattern. Immutable once built.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Triple {
    subject: StarPatternName,
    predicate: String,
    object: TripleObject,
    cardinality: Option<Cardinality>,
    negated_set: Option<BTreeSet<String>>,
}

impl Triple {
    pub fn new(
        subject: impl Into<StarPatternName>,
        predicate: impl Into<String>,
        object: impl Into<TripleObject>,
    ) -> Self {
        Triple {
            subject: subject.into(),
            predicate: predicate.into(),
            object: object.into(),
            cardinality: None,
            negated_set: None,
        }
    }

    /// A triple matching any predicate except the ones in `negated_set`.
    pub fn negated(
        subject: impl Into<StarPatternName>,
        negated_set: impl IntoIterator<Item = impl Into<String>>,
        object: impl Into<TripleObject>,
    ) -> Self {
        Triple {
            subject: subject.into(),
            predicate: NEGATED_SET_MARKER.to_string(),
            object: object.into(),
            cardinality: None,
            negated_set: Some(negated_set.into_iter().map(Into::into).collect()),
        }
    }

    pub fn with_cardinality(mut self, cardinality: Cardinality) -> Self {
        self.cardinality = Some(cardinality);
        self
    }

    pub fn subject(&self) -> &str {
        &self.subject
    }

    pub fn predicate(&self) -> &str {
        &self.predicate
    }

    pub fn object(&self) -> &TripleObject {
        &self.object
    }

    pub fn cardinality(&self) -> Option<&Cardinality> {
        self.cardinality.as_ref()
    }

    pub fn negated_set(&self) -> Option<&BTreeSet<String>> {
        self.negated_set.as_ref()
    }

    pub fn is_negated_set(&self) -> bool {
        self.predicate == NEGATED_SET_MARKER
    }

    /// Name of the star pattern the object may refer to: the variable name of a
    /// variable object or the IRI of a named-node object. Whether such a star
    /// pattern exists is up to the query holding the triple.
    pub fn linked_star_pattern(&self) -> Option<&str> {
        match &self.object {
            TripleObject::Single(QueryTerm::Variable(var)) => Some(var.as_str()),
            TripleObject::Single(QueryTerm::NamedNode(nn)) => Some(nn.as_str()),
            _ => None,
        }
    }

    /// Canonical string identity, used to deduplicate triples.
    pub fn identity(&self) -> String {
        self.to_string()
    }
}

impl fmt::Display for Triple {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} <{}> {}", self.subject, self.predicate, self.object)?;
        if let Some(cardinality) = &self.cardinality {
            write!(f, " card{}", cardinality)?;
        }
        if let Some(negated_set) = &self.negated_set {
            let joined: Vec<&str> = negated_set.iter().map(String::as_str).collect();
            write!(f, " not{{{}}}", joined.join(" "))?;
        }
        Ok(())
    }
}

/// Alternative predicates sharing one subject and object; exactly one option has
/// to match for the group to be satisfied.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OneOf {
    options: Vec<Triple>,
    dependencies: Option<StarPatternName>,
}

impl OneOf {
    pub fn new(options: Vec<Triple>) -> Self {
        OneOf {
            options,
            dependencies: None,
        }
    }

    pub fn options(&self) -> &[Triple] {
        &self.options
    }

    /// The star pattern the shared object links to, when the owning query resolved one.
    pub fn dependencies(&self) -> Option<&str> {
        self.dependencies.as_deref()
    }

    pub(crate) fn set_dependencies(&mut self, name: StarPatternName) {
        self.dependencies = Some(name);
    }

    /// Star pattern name the shared object may refer to, taken from the first option.
    pub fn linked_star_pattern(&self) -> Option<&str> {
        self.options.first().and_then(Triple::linked_star_pattern)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const P: &str = "http://example.com/p";

    #[test]
    fn identity_includes_cardinality_and_negated_set() {
        let plain = Triple::new("x", P, QueryTerm::variable("y"));
        let with_card = plain.clone().with_cardinality(Cardinality::unbounded(0));
        assert_eq!(plain.identity(), "x <http://example.com/p> ?y");
        assert_eq!(with_card.identity(), "x <http://example.com/p> ?y card{0,*}");
        assert_ne!(plain.identity(), with_card.identity());

        let negated = Triple::negated(
            "x",
            ["http://example.com/b", "http://example.com/a"],
            QueryTerm::variable("y"),
        );
        assert!(negated.is_negated_set());
        assert!(negated
            .identity()
            .ends_with("not{http://example.com/a http://example.com/b}"));
    }

    #[test]
    fn linked_star_pattern_only_for_single_variable_or_iri() {
        assert_eq!(
            Triple::new("x", P, QueryTerm::variable("y")).linked_star_pattern(),
            Some("y")
        );
        assert_eq!(
            Triple::new("x", P, QueryTerm::named_node("http://example.com/y"))
                .linked_star_pattern(),
            Some("http://example.com/y")
        );
        assert_eq!(
            Triple::new("x", P, QueryTerm::simple_literal("y")).linked_star_pattern(),
            None
        );
        assert_eq!(
            Triple::new("x", P, vec![QueryTerm::variable("y")]).linked_star_pattern(),
            None
        );
    }
}
