//! Containment of a query's star patterns in a set of shapes.
//!
//! Every shape is bound to every star pattern. The bindings are folded into one
//! verdict per star pattern, one visit flag per shape, and the links of the
//! triples no shape could explain.

use crate::binding::{Bindings, LinkedShapes};
use crate::query::Query;
use crate::shape::Shape;
use crate::trace::{ContainmentEvent, NullTraceSink, TraceSink};
use crate::triple::Triple;
use crate::types::{ShapeName, StarPatternName};
use log::{debug, info};
use serde::Serialize;
use std::collections::{BTreeMap, HashSet};

#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ContainmentVerdict {
    /// Every triple is bound by at least one shape.
    Contain,
    /// Some triples are bound by a shape, others are not.
    Aligned,
    /// No triple is bound by any shape.
    Rejected,
}

/// Containment of one star pattern, accumulated over every shape tried.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ContainmentResult {
    pub result: ContainmentVerdict,
    /// Shapes the star pattern is aligned with or contained in. `None` when no
    /// shape binds any of its triples.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub target: Option<Vec<ShapeName>>,
}

impl ContainmentResult {
    fn rejected() -> Self {
        ContainmentResult {
            result: ContainmentVerdict::Rejected,
            target: None,
        }
    }

    fn with_target(&self, result: ContainmentVerdict, shape: &str) -> Self {
        let mut target = self.target.clone().unwrap_or_default();
        target.push(shape.to_string());
        ContainmentResult {
            result,
            target: Some(target),
        }
    }
}

/// The object of a triple no shape explains: a resource worth dereferencing.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ConditionalLink {
    pub link: String,
    pub star_pattern_name: StarPatternName,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ContainmentReport {
    /// Links from the objects of triples not bound by any shape.
    pub conditional_link: Vec<ConditionalLink>,
    /// Whether the documents associated with each shape should be visited.
    pub visit_shape_bounded_resource: BTreeMap<ShapeName, bool>,
    pub star_patterns_containment: BTreeMap<StarPatternName, ContainmentResult>,
}

/// Inputs of [`solve_shape_query_containment`].
pub struct ContainmentArgs<'a> {
    query: &'a Query,
    shapes: &'a [Shape],
    dependent_shapes: &'a [Shape],
    trace_sink: &'a dyn TraceSink,
}

impl<'a> ContainmentArgs<'a> {
    pub fn new(query: &'a Query, shapes: &'a [Shape]) -> Self {
        ContainmentArgs {
            query,
            shapes,
            dependent_shapes: &[],
            trace_sink: &NullTraceSink,
        }
    }

    /// Shapes only used to resolve shape constraints; they are not bound to
    /// the star patterns themselves.
    pub fn with_dependent_shapes(mut self, dependent_shapes: &'a [Shape]) -> Self {
        self.dependent_shapes = dependent_shapes;
        self
    }

    pub fn with_trace_sink(mut self, trace_sink: &'a dyn TraceSink) -> Self {
        self.trace_sink = trace_sink;
        self
    }
}

/// Determines how far every star pattern of the query is contained in the
/// shapes, which shapes are worth visiting and which links remain to follow.
pub fn solve_shape_query_containment(args: &ContainmentArgs<'_>) -> ContainmentReport {
    let ContainmentArgs {
        query,
        shapes,
        dependent_shapes,
        trace_sink,
    } = *args;
    info!(
        "Solving containment of {} star patterns against {} shapes",
        query.star_patterns().len(),
        shapes.len()
    );

    let mut star_patterns_containment: BTreeMap<StarPatternName, ContainmentResult> = query
        .star_patterns()
        .keys()
        .map(|name| (name.clone(), ContainmentResult::rejected()))
        .collect();

    let mut query_triples: Vec<&Triple> = Vec::new();
    let mut seen = HashSet::new();
    for triple in query.triples() {
        if seen.insert(triple.identity()) {
            query_triples.push(triple);
        }
    }
    let mut explained: HashSet<String> = HashSet::new();

    let mut binding_result: BTreeMap<ShapeName, Vec<Bindings>> = BTreeMap::new();
    for (shape, dependencies) in group_shape_by_dependencies(shapes, dependent_shapes) {
        let shape_bindings = binding_result.entry(shape.name().to_string()).or_default();
        for (star_pattern_name, star_pattern) in query.star_patterns() {
            let bindings = Bindings::new(shape, star_pattern, query, &dependencies);
            let bound = bindings.bound_triples();
            let unbound = bindings.unbounded_triples();
            debug!(
                "Shape {} binds {} and leaves {} triples of star pattern {} unbound",
                shape.name(),
                bound.len(),
                unbound.len(),
                star_pattern_name
            );
            trace_sink.record(ContainmentEvent::BindingComputed {
                shape: shape.name().to_string(),
                star_pattern: star_pattern_name.clone(),
                bound: bound.len(),
                unbound: unbound.len(),
                fully_bounded: bindings.is_fully_bounded(),
            });

            if let Some(previous) = star_patterns_containment.get_mut(star_pattern_name) {
                if let Some(updated) = update_star_pattern_containment(previous, &bindings, shape) {
                    trace_sink.record(ContainmentEvent::VerdictUpdated {
                        star_pattern: star_pattern_name.clone(),
                        shape: shape.name().to_string(),
                        verdict: updated.result,
                    });
                    *previous = updated;
                }
            }
            explained.extend(bound.iter().map(Triple::identity));
            shape_bindings.push(bindings);
        }
    }

    let conditional_link: Vec<ConditionalLink> = if shapes.is_empty() {
        Vec::new()
    } else {
        query_triples
            .into_iter()
            .filter(|triple| !explained.contains(&triple.identity()))
            .filter_map(|triple| {
                let link = triple.object().as_single()?.as_named_node()?;
                Some(ConditionalLink {
                    link: link.as_str().to_string(),
                    star_pattern_name: triple.subject().to_string(),
                })
            })
            .collect()
    };
    for link in &conditional_link {
        trace_sink.record(ContainmentEvent::ConditionalLink {
            link: link.link.clone(),
            star_pattern: link.star_pattern_name.clone(),
        });
    }

    ContainmentReport {
        conditional_link,
        visit_shape_bounded_resource: generate_visit_status(&binding_result, shapes),
        star_patterns_containment,
    }
}

/// Folds one binding into the running verdict of its star pattern. A `Contain`
/// verdict is never downgraded. Returns the new verdict when it changes.
fn update_star_pattern_containment(
    previous: &ContainmentResult,
    bindings: &Bindings,
    shape: &Shape,
) -> Option<ContainmentResult> {
    if !bindings.should_visit_shape() {
        return None;
    }
    if bindings.unbounded_triples().is_empty() {
        Some(previous.with_target(ContainmentVerdict::Contain, shape.name()))
    } else if previous.result != ContainmentVerdict::Contain {
        Some(previous.with_target(ContainmentVerdict::Aligned, shape.name()))
    } else {
        None
    }
}

/// Pairs every shape with the shapes it may reference: every other candidate
/// shape plus the dependent shapes.
fn group_shape_by_dependencies<'a>(
    shapes: &'a [Shape],
    dependent_shapes: &'a [Shape],
) -> Vec<(&'a Shape, LinkedShapes<'a>)> {
    shapes
        .iter()
        .enumerate()
        .map(|(i, target)| {
            let others: LinkedShapes<'a> = shapes
                .iter()
                .enumerate()
                .filter(|(j, _)| *j != i)
                .map(|(_, shape)| shape)
                .chain(dependent_shapes.iter())
                .map(|shape| (shape.name(), shape))
                .collect();
            (target, others)
        })
        .collect()
}

fn generate_visit_status(
    bindings: &BTreeMap<ShapeName, Vec<Bindings>>,
    shapes: &[Shape],
) -> BTreeMap<ShapeName, bool> {
    shapes
        .iter()
        .map(|shape| {
            let visit = bindings
                .get(shape.name())
                .map_or(false, |b| b.iter().any(Bindings::should_visit_shape));
            (shape.name().to_string(), visit)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shape::{Constraint, Predicate};
    use crate::term::QueryTerm;
    use crate::trace::MemoryTraceSink;

    const P: &str = "http://example.com/p";
    const Q: &str = "http://example.com/q";

    fn shape(name: &str, predicates: &[&str]) -> Shape {
        Shape::builder(name)
            .closed(true)
            .predicates(predicates.iter().copied())
            .build()
            .unwrap()
    }

    #[test]
    fn contain_is_never_downgraded() {
        let query = Query::builder()
            .triple(Triple::new("x", P, QueryTerm::simple_literal("a")))
            .triple(Triple::new("x", Q, QueryTerm::simple_literal("b")))
            .build();
        let shapes = vec![shape("A", &[P, Q]), shape("B", &[P])];
        let report = solve_shape_query_containment(&ContainmentArgs::new(&query, &shapes));
        assert_eq!(
            report.star_patterns_containment["x"],
            ContainmentResult {
                result: ContainmentVerdict::Contain,
                target: Some(vec!["A".to_string()]),
            }
        );
    }

    #[test]
    fn aligned_is_upgraded_to_contain() {
        let query = Query::builder()
            .triple(Triple::new("x", P, QueryTerm::simple_literal("a")))
            .triple(Triple::new("x", Q, QueryTerm::simple_literal("b")))
            .build();
        let shapes = vec![shape("B", &[P]), shape("A", &[P, Q])];
        let report = solve_shape_query_containment(&ContainmentArgs::new(&query, &shapes));
        assert_eq!(
            report.star_patterns_containment["x"],
            ContainmentResult {
                result: ContainmentVerdict::Contain,
                target: Some(vec!["B".to_string(), "A".to_string()]),
            }
        );
    }

    #[test]
    fn dependent_shapes_resolve_references_without_being_bound() {
        let query = Query::builder()
            .triple(Triple::new("x", P, QueryTerm::variable("y")))
            .triple(Triple::new("y", Q, QueryTerm::simple_literal("a")))
            .build();
        let foo = Shape::builder("Foo")
            .closed(true)
            .predicate(Predicate::new(P).with_constraint(Constraint::shape("Bar")))
            .build()
            .unwrap();
        let bar = Shape::builder("Bar")
            .closed(true)
            .predicate("http://example.com/r")
            .build()
            .unwrap();
        let shapes = vec![foo];
        let dependent = vec![bar];

        let without = solve_shape_query_containment(&ContainmentArgs::new(&query, &shapes));
        // Bar unknown: the reference is assumed satisfiable
        assert_eq!(
            without.star_patterns_containment["x"].result,
            ContainmentVerdict::Contain
        );

        let with = solve_shape_query_containment(
            &ContainmentArgs::new(&query, &shapes).with_dependent_shapes(&dependent),
        );
        assert_eq!(
            with.star_patterns_containment["x"].result,
            ContainmentVerdict::Rejected
        );
        assert!(!with.visit_shape_bounded_resource.contains_key("Bar"));
    }

    #[test]
    fn trace_sink_receives_binding_and_verdict_events() {
        let query = Query::builder()
            .triple(Triple::new("x", P, QueryTerm::named_node("http://example.com/o")))
            .triple(Triple::new("x", Q, QueryTerm::named_node("http://example.com/l")))
            .build();
        let shapes = vec![shape("A", &[P])];
        let sink = MemoryTraceSink::new();
        let report = solve_shape_query_containment(
            &ContainmentArgs::new(&query, &shapes).with_trace_sink(&sink),
        );
        let events = sink.events();
        assert_eq!(
            events[0],
            ContainmentEvent::BindingComputed {
                shape: "A".to_string(),
                star_pattern: "x".to_string(),
                bound: 1,
                unbound: 1,
                fully_bounded: false,
            }
        );
        assert_eq!(
            events[1],
            ContainmentEvent::VerdictUpdated {
                star_pattern: "x".to_string(),
                shape: "A".to_string(),
                verdict: ContainmentVerdict::Aligned,
            }
        );
        assert_eq!(
            events[2],
            ContainmentEvent::ConditionalLink {
                link: "http://example.com/l".to_string(),
                star_pattern: "x".to_string(),
            }
        );
        assert_eq!(report.conditional_link.len(), 1);
    }

    #[test]
    fn report_serializes_to_json() {
        let query = Query::builder()
            .triple(Triple::new("x", P, QueryTerm::simple_literal("a")))
            .build();
        let shapes = vec![shape("A", &[P])];
        let report = solve_shape_query_containment(&ContainmentArgs::new(&query, &shapes));
        let json = serde_json::to_value(&report).unwrap();
        assert_eq!(
            json,
            serde_json::json!({
                "conditionalLink": [],
                "visitShapeBoundedResource": {"A": true},
                "starPatternsContainment": {"x": {"result": "CONTAIN", "target": ["A"]}},
            })
        );
    }
}
