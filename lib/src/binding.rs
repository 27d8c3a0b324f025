//! Matching of one star pattern against one shape.
//!
//! A closed shape binds a triple when one of its declarations (direct or inside
//! a one-of group) accepts the predicate and, if constrained, the object. Shape
//! constraints are checked by evaluating the dependent star pattern against the
//! referenced shape, recursively. An open shape binds every triple.

use crate::query::{Query, StarPattern, TripleWithDependencies};
use crate::shape::{Constraint, OneOfPathIndexed, Predicate, Shape};
use crate::term::{QueryTerm, TripleObject};
use crate::triple::Triple;
use crate::types::{ShapeName, StarPatternName};
use log::{debug, trace};
use std::collections::{BTreeMap, BTreeSet, HashMap, HashSet};

/// Shapes available to resolve shape constraints, indexed by name.
pub type LinkedShapes<'a> = HashMap<&'a str, &'a Shape>;

/// A star pattern contained through a dependency of a contained star pattern,
/// with the shapes that contain it when a shape constraint was involved.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DependentStarPattern {
    pub star_pattern: StarPatternName,
    pub shape: Option<Vec<ShapeName>>,
}

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
enum Outcome {
    Bound,
    Unbound,
    Undecided,
}

/// The (shape, star pattern) pairs on the current evaluation path. Passed by
/// value down the recursion so sibling branches do not see each other.
#[derive(Debug, Clone, Default)]
pub(crate) struct VisitedPairs(HashSet<(ShapeName, StarPatternName)>);

impl VisitedPairs {
    pub(crate) fn contains(&self, shape: &str, star_pattern: &str) -> bool {
        self.0
            .contains(&(shape.to_string(), star_pattern.to_string()))
    }

    pub(crate) fn with(mut self, shape: &str, star_pattern: &str) -> Self {
        self.0.insert((shape.to_string(), star_pattern.to_string()));
        self
    }
}

/// Lookup of a predicate across the paths of one one-of group.
pub struct OneOfBinding<'a> {
    paths: &'a [OneOfPathIndexed],
}

impl<'a> OneOfBinding<'a> {
    pub fn new(paths: &'a [OneOfPathIndexed]) -> Self {
        OneOfBinding { paths }
    }

    /// Declarations of `predicate` in every path mentioning it.
    pub fn get(&self, predicate: &str) -> Vec<&'a Predicate> {
        self.paths
            .iter()
            .filter_map(|path| path.get(predicate))
            .collect()
    }
}

/// The binding of one star pattern to one shape.
#[derive(Debug, Clone)]
pub struct Bindings {
    bindings: BTreeMap<String, Option<Triple>>,
    unbound_triple: Vec<Triple>,
    fully_bounded: bool,
    nested_contained_star_pattern_name: Vec<DependentStarPattern>,
    nested_shapes: BTreeMap<StarPatternName, Vec<ShapeName>>,
}

impl Bindings {
    /// Binds `star_pattern` to `shape`. `query` resolves dependency handles and
    /// `linked_shapes` resolves shape constraints naming other shapes.
    pub fn new(
        shape: &Shape,
        star_pattern: &StarPattern,
        query: &Query,
        linked_shapes: &LinkedShapes<'_>,
    ) -> Self {
        Self::evaluate(
            shape,
            star_pattern,
            query,
            linked_shapes,
            VisitedPairs::default(),
        )
    }

    fn evaluate(
        shape: &Shape,
        star_pattern: &StarPattern,
        query: &Query,
        linked_shapes: &LinkedShapes<'_>,
        visited: VisitedPairs,
    ) -> Self {
        let visited = visited.with(shape.name(), star_pattern.name());
        let mut bindings = Bindings {
            bindings: star_pattern
                .triples()
                .map(|t| (t.triple.predicate().to_string(), None))
                .collect(),
            unbound_triple: Vec::new(),
            fully_bounded: false,
            nested_contained_star_pattern_name: Vec::new(),
            nested_shapes: BTreeMap::new(),
        };
        bindings.calculate_binding(shape, star_pattern, query, linked_shapes, &visited);

        let mut seen = HashSet::new();
        bindings
            .unbound_triple
            .retain(|triple| seen.insert(triple.identity()));
        bindings
    }

    fn calculate_binding(
        &mut self,
        shape: &Shape,
        star_pattern: &StarPattern,
        query: &Query,
        linked_shapes: &LinkedShapes<'_>,
        visited: &VisitedPairs,
    ) {
        let one_ofs: Vec<OneOfBinding<'_>> = shape
            .one_of_indexed()
            .iter()
            .map(|paths| OneOfBinding::new(paths))
            .collect();

        for triple_with_dependencies in star_pattern.triples() {
            let triple = &triple_with_dependencies.triple;
            if !shape.is_closed() {
                self.bind(triple);
                continue;
            }

            let mut declarations: Vec<&Predicate> = one_ofs
                .iter()
                .flat_map(|one_of| one_of.get(triple.predicate()))
                .collect();
            if let Some(declaration) = shape.get(triple.predicate()) {
                declarations.push(declaration);
            }
            if declarations.is_empty() {
                trace!("{} has no declaration in shape {}", triple, shape.name());
                self.unbound_triple.push(triple.clone());
                continue;
            }

            let mut bound = false;
            let mut rejected = false;
            for declaration in declarations {
                match self.classify(
                    declaration,
                    triple_with_dependencies,
                    shape,
                    query,
                    linked_shapes,
                    visited,
                ) {
                    Outcome::Bound => bound = true,
                    Outcome::Unbound => rejected = true,
                    Outcome::Undecided => {}
                }
            }
            // Declarations act independently: a rejection is reported even when
            // another declaration binds the triple.
            if bound {
                self.bind(triple);
            }
            if rejected {
                trace!("{} rejected by shape {}", triple, shape.name());
                self.unbound_triple.push(triple.clone());
            }
        }

        self.fully_bounded = if shape.is_closed() {
            self.unbound_triple.is_empty() && !star_pattern.is_empty()
        } else {
            !star_pattern.is_empty()
        };

        if self.fully_bounded {
            let mut walk = DependencyWalk::new(star_pattern.name());
            walk.visit(star_pattern, query);
            self.nested_contained_star_pattern_name = walk
                .contained()
                .into_iter()
                .map(|name| DependentStarPattern {
                    shape: self.nested_shapes.get(&name).cloned(),
                    star_pattern: name,
                })
                .collect();
        }
    }

    fn bind(&mut self, triple: &Triple) {
        trace!("{} bound", triple);
        self.bindings
            .insert(triple.predicate().to_string(), Some(triple.clone()));
    }

    fn classify(
        &mut self,
        declaration: &Predicate,
        triple: &TripleWithDependencies,
        shape: &Shape,
        query: &Query,
        linked_shapes: &LinkedShapes<'_>,
        visited: &VisitedPairs,
    ) -> Outcome {
        match declaration.constraint() {
            None => Outcome::Bound,
            Some(Constraint::Shape(values)) => {
                self.handle_shape_constraint(values, triple, shape, query, linked_shapes, visited)
            }
            Some(Constraint::Type(values)) => handle_type_constraint(values, &triple.triple),
        }
    }

    fn handle_shape_constraint(
        &mut self,
        values: &BTreeSet<ShapeName>,
        triple: &TripleWithDependencies,
        current_shape: &Shape,
        query: &Query,
        linked_shapes: &LinkedShapes<'_>,
        visited: &VisitedPairs,
    ) -> Outcome {
        // Only a single shape reference on an object linking to another star
        // pattern can be checked; anything else is accepted as is.
        let Some(dependency) = query.dependency_of(triple) else {
            return Outcome::Bound;
        };
        let (Some(shape_name), 1) = (values.iter().next(), values.len()) else {
            return Outcome::Bound;
        };

        let linked_shape = if shape_name == current_shape.name() {
            Some(current_shape)
        } else {
            linked_shapes.get(shape_name.as_str()).copied()
        };
        let Some(linked_shape) = linked_shape else {
            debug!(
                "Shape {} referenced by {} is not available, assuming it is satisfiable",
                shape_name, triple.triple
            );
            return Outcome::Bound;
        };
        if visited.contains(linked_shape.name(), dependency.name()) {
            debug!(
                "Star pattern {} is already being bound to shape {}, stopping the recursion",
                dependency.name(),
                linked_shape.name()
            );
            return Outcome::Bound;
        }

        let nested = Bindings::evaluate(
            linked_shape,
            dependency,
            query,
            linked_shapes,
            visited.clone(),
        );
        for (star_pattern, shapes) in &nested.nested_shapes {
            for shape in shapes {
                self.record_nested_shape(star_pattern, shape);
            }
        }
        if nested.is_fully_bounded() {
            self.record_nested_shape(dependency.name(), linked_shape.name());
            Outcome::Bound
        } else {
            Outcome::Unbound
        }
    }

    fn record_nested_shape(&mut self, star_pattern: &str, shape: &str) {
        let shapes = self
            .nested_shapes
            .entry(star_pattern.to_string())
            .or_default();
        if !shapes.iter().any(|s| s == shape) {
            shapes.push(shape.to_string());
        }
    }

    /// Whether every triple of the star pattern is bound to the shape.
    pub fn is_fully_bounded(&self) -> bool {
        self.fully_bounded
    }

    /// Whether the documents associated with the shape are worth visiting, i.e.
    /// whether at least one triple is bound.
    pub fn should_visit_shape(&self) -> bool {
        self.bindings.values().any(Option::is_some)
    }

    pub fn unbounded_triples(&self) -> Vec<Triple> {
        self.unbound_triple.clone()
    }

    /// Predicate to bound triple; `None` when the triple could not be bound.
    pub fn bindings(&self) -> BTreeMap<String, Option<Triple>> {
        self.bindings.clone()
    }

    pub fn bound_triples(&self) -> Vec<Triple> {
        self.bindings.values().flatten().cloned().collect()
    }

    pub fn nested_contained_star_patterns(&self) -> &[DependentStarPattern] {
        &self.nested_contained_star_pattern_name
    }
}

fn handle_type_constraint(values: &BTreeSet<String>, triple: &Triple) -> Outcome {
    let accepted = |found: bool| {
        if found {
            Outcome::Bound
        } else {
            Outcome::Unbound
        }
    };
    match triple.object() {
        TripleObject::Single(QueryTerm::Literal(lit)) => {
            accepted(values.contains(lit.datatype().as_str()))
        }
        TripleObject::Single(QueryTerm::NamedNode(nn)) => accepted(values.contains(nn.as_str())),
        TripleObject::Single(_) => Outcome::Bound,
        // A list without any accepted candidate is left undecided: the triple
        // is neither bound nor reported as unbound.
        TripleObject::List(terms) => {
            let any = terms.iter().any(|term| {
                values.contains(term.value())
                    || term.datatype().map_or(false, |dt| values.contains(dt))
            });
            if any {
                Outcome::Bound
            } else {
                Outcome::Undecided
            }
        }
    }
}

/// Depth-first walk over the dependency edges of a contained star pattern.
///
/// Records, per visited star pattern, its direct dependencies. A star pattern
/// already recorded is never entered twice. A pair cycling straight back to the
/// starting pattern is dropped from the result.
pub(crate) struct DependencyWalk<'a> {
    root: &'a str,
    cycle: HashSet<StarPatternName>,
    rejected: HashSet<StarPatternName>,
    branches: BTreeMap<StarPatternName, Vec<StarPatternName>>,
}

impl<'a> DependencyWalk<'a> {
    pub(crate) fn new(root: &'a str) -> Self {
        DependencyWalk {
            root,
            cycle: HashSet::new(),
            rejected: HashSet::new(),
            branches: BTreeMap::new(),
        }
    }

    pub(crate) fn visit(&mut self, star_pattern: &StarPattern, query: &Query) {
        for dependency in star_pattern.dependency_names() {
            self.branches
                .entry(star_pattern.name().to_string())
                .or_default()
                .push(dependency.to_string());
            if self.branches.contains_key(dependency) {
                self.cycle.insert(dependency.to_string());
                self.cycle.insert(star_pattern.name().to_string());
                if dependency == self.root {
                    self.rejected.insert(dependency.to_string());
                    self.rejected.insert(star_pattern.name().to_string());
                }
                debug!(
                    "Dependency cycle between {} and {}",
                    star_pattern.name(),
                    dependency
                );
            }
            if !self.cycle.contains(dependency) {
                if let Some(next) = query.get(dependency) {
                    self.visit(next, query);
                }
            }
        }
    }

    /// Deduplicated names reached by the walk, minus the rejected branches.
    pub(crate) fn contained(self) -> Vec<StarPatternName> {
        let DependencyWalk {
            rejected,
            branches,
            ..
        } = self;
        let mut seen = HashSet::new();
        branches
            .into_iter()
            .filter(|(name, _)| !rejected.contains(name))
            .flat_map(|(_, dependencies)| dependencies)
            .filter(|name| seen.insert(name.clone()))
            .collect()
    }
}
