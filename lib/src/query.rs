//! A query split into star patterns.
//!
//! Star patterns reference each other by name only; the `Query` owns every
//! pattern and resolves the handles. Dependency graphs may therefore contain
//! cycles (`?x -> ?y -> ?x`) without any ownership issue.

use crate::triple::{OneOf, Triple};
use crate::types::StarPatternName;
use std::collections::{BTreeMap, BTreeSet};

/// A triple of a star pattern together with the star pattern its object refers to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TripleWithDependencies {
    pub triple: Triple,
    pub dependencies: Option<StarPatternName>,
}

/// The triples sharing one subject, indexed by predicate.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StarPattern {
    name: StarPatternName,
    is_variable: bool,
    star_pattern: BTreeMap<String, TripleWithDependencies>,
    one_ofs: Vec<OneOf>,
}

impl StarPattern {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn is_variable(&self) -> bool {
        self.is_variable
    }

    pub fn get(&self, predicate: &str) -> Option<&TripleWithDependencies> {
        self.star_pattern.get(predicate)
    }

    pub fn triples(&self) -> impl Iterator<Item = &TripleWithDependencies> {
        self.star_pattern.values()
    }

    pub fn one_ofs(&self) -> &[OneOf] {
        &self.one_ofs
    }

    pub fn len(&self) -> usize {
        self.star_pattern.len()
    }

    pub fn is_empty(&self) -> bool {
        self.star_pattern.is_empty()
    }

    /// Names of the star patterns this one directly depends on.
    pub fn dependency_names(&self) -> impl Iterator<Item = &str> {
        self.star_pattern
            .values()
            .filter_map(|t| t.dependencies.as_deref())
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Query {
    star_patterns: BTreeMap<StarPatternName, StarPattern>,
    union: Option<Vec<Vec<Query>>>,
    filter_expression: Option<String>,
}

impl Query {
    pub fn builder() -> QueryBuilder {
        QueryBuilder::default()
    }

    pub fn star_patterns(&self) -> &BTreeMap<StarPatternName, StarPattern> {
        &self.star_patterns
    }

    pub fn get(&self, name: &str) -> Option<&StarPattern> {
        self.star_patterns.get(name)
    }

    /// Resolves the dependency handle of a triple against this query.
    pub fn dependency_of(&self, triple: &TripleWithDependencies) -> Option<&StarPattern> {
        triple
            .dependencies
            .as_deref()
            .and_then(|name| self.star_patterns.get(name))
    }

    pub fn union(&self) -> Option<&[Vec<Query>]> {
        self.union.as_deref()
    }

    pub fn filter_expression(&self) -> Option<&str> {
        self.filter_expression.as_deref()
    }

    /// Every triple of every star pattern, in star pattern then predicate order.
    pub fn triples(&self) -> impl Iterator<Item = &Triple> {
        self.star_patterns
            .values()
            .flat_map(|sp| sp.triples().map(|t| &t.triple))
    }
}

/// Groups triples by subject and links every triple whose object names another
/// star pattern of the same query.
#[derive(Debug, Default)]
pub struct QueryBuilder {
    triples: Vec<Triple>,
    one_ofs: Vec<(StarPatternName, OneOf)>,
    constant_subjects: BTreeSet<StarPatternName>,
    union: Vec<Vec<Query>>,
    filter_expression: Option<String>,
}

impl QueryBuilder {
    pub fn triple(mut self, triple: Triple) -> Self {
        self.triples.push(triple);
        self
    }

    pub fn triples(mut self, triples: impl IntoIterator<Item = Triple>) -> Self {
        self.triples.extend(triples);
        self
    }

    pub fn one_of(mut self, subject: impl Into<StarPatternName>, one_of: OneOf) -> Self {
        self.one_ofs.push((subject.into(), one_of));
        self
    }

    /// Marks a subject as a constant (IRI) rather than a variable.
    pub fn constant_subject(mut self, subject: impl Into<StarPatternName>) -> Self {
        self.constant_subjects.insert(subject.into());
        self
    }

    pub fn union(mut self, branches: Vec<Query>) -> Self {
        self.union.push(branches);
        self
    }

    pub fn filter_expression(mut self, expression: impl Into<String>) -> Self {
        self.filter_expression = Some(expression.into());
        self
    }

    pub fn build(self) -> Query {
        let QueryBuilder {
            triples,
            one_ofs,
            constant_subjects,
            union,
            filter_expression,
        } = self;

        let mut star_patterns: BTreeMap<StarPatternName, StarPattern> = BTreeMap::new();
        let new_star_pattern = |name: &str| StarPattern {
            name: name.to_string(),
            is_variable: !constant_subjects.contains(name),
            star_pattern: BTreeMap::new(),
            one_ofs: Vec::new(),
        };

        for triple in triples {
            let star_pattern = star_patterns
                .entry(triple.subject().to_string())
                .or_insert_with(|| new_star_pattern(triple.subject()));
            star_pattern.star_pattern.insert(
                triple.predicate().to_string(),
                TripleWithDependencies {
                    triple,
                    dependencies: None,
                },
            );
        }
        for (subject, one_of) in one_ofs {
            star_patterns
                .entry(subject.clone())
                .or_insert_with(|| new_star_pattern(&subject))
                .one_ofs
                .push(one_of);
        }

        let names: BTreeSet<StarPatternName> = star_patterns.keys().cloned().collect();
        for star_pattern in star_patterns.values_mut() {
            for triple in star_pattern.star_pattern.values_mut() {
                if let Some(linked) = triple.triple.linked_star_pattern() {
                    if names.contains(linked) {
                        triple.dependencies = Some(linked.to_string());
                    }
                }
            }
            for one_of in star_pattern.one_ofs.iter_mut() {
                if let Some(linked) = one_of.linked_star_pattern() {
                    if names.contains(linked) {
                        let linked = linked.to_string();
                        one_of.set_dependencies(linked);
                    }
                }
            }
        }

        Query {
            star_patterns,
            union: if union.is_empty() { None } else { Some(union) },
            filter_expression,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::term::QueryTerm;

    const P: &str = "http://example.com/p";
    const Q: &str = "http://example.com/q";

    #[test]
    fn groups_triples_by_subject() {
        let query = Query::builder()
            .triple(Triple::new("x", P, QueryTerm::variable("z")))
            .triple(Triple::new("x", Q, QueryTerm::simple_literal("a")))
            .triple(Triple::new("y", P, QueryTerm::variable("z")))
            .build();
        assert_eq!(query.star_patterns().len(), 2);
        assert_eq!(query.get("x").map(StarPattern::len), Some(2));
        assert!(query.get("x").map(StarPattern::is_variable).unwrap_or(false));
        assert_eq!(query.triples().count(), 3);
    }

    #[test]
    fn links_objects_naming_another_star_pattern() {
        let query = Query::builder()
            .triple(Triple::new("x", P, QueryTerm::variable("z")))
            .triple(Triple::new("y", P, QueryTerm::variable("x")))
            .build();
        let y = query.get("y").unwrap();
        let linked = y.get(P).unwrap();
        assert_eq!(linked.dependencies.as_deref(), Some("x"));
        assert_eq!(query.dependency_of(linked).map(StarPattern::name), Some("x"));
        // ?z carries no triple of its own
        assert!(query.get("x").unwrap().get(P).unwrap().dependencies.is_none());
    }

    #[test]
    fn cyclic_dependencies_are_representable() {
        let query = Query::builder()
            .triple(Triple::new("x", P, QueryTerm::variable("y")))
            .triple(Triple::new("y", P, QueryTerm::variable("x")))
            .build();
        let x_deps: Vec<&str> = query.get("x").unwrap().dependency_names().collect();
        let y_deps: Vec<&str> = query.get("y").unwrap().dependency_names().collect();
        assert_eq!(x_deps, vec!["y"]);
        assert_eq!(y_deps, vec!["x"]);
    }

    #[test]
    fn one_of_only_subject_gets_an_empty_star_pattern() {
        let one_of = OneOf::new(vec![
            Triple::new("w", P, QueryTerm::variable("x")),
            Triple::new("w", Q, QueryTerm::variable("x")),
        ]);
        let query = Query::builder()
            .triple(Triple::new("x", P, QueryTerm::simple_literal("a")))
            .one_of("w", one_of)
            .constant_subject("w")
            .filter_expression("?x > 2")
            .build();
        let w = query.get("w").unwrap();
        assert!(w.is_empty());
        assert!(!w.is_variable());
        assert_eq!(w.one_ofs()[0].dependencies(), Some("x"));
        assert_eq!(query.filter_expression(), Some("?x > 2"));
        assert!(query.union().is_none());
    }
}
