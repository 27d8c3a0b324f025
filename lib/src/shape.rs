use crate::error::{ContainmentError, Result};
use crate::types::{Cardinality, ShapeName};
use log::debug;
use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet, HashMap, HashSet};

#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ConstraintType {
    /// Objects must conform to another shape.
    Shape,
    /// Objects must be of an RDF type or datatype.
    Type,
}

/// Constraint on the objects of a predicate.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Constraint {
    Shape(BTreeSet<ShapeName>),
    Type(BTreeSet<String>),
}

impl Constraint {
    pub fn shape(name: impl Into<ShapeName>) -> Self {
        Constraint::Shape(BTreeSet::from([name.into()]))
    }

    pub fn types(iris: impl IntoIterator<Item = impl Into<String>>) -> Self {
        Constraint::Type(iris.into_iter().map(Into::into).collect())
    }

    pub fn constraint_type(&self) -> ConstraintType {
        match self {
            Constraint::Shape(_) => ConstraintType::Shape,
            Constraint::Type(_) => ConstraintType::Type,
        }
    }

    pub fn values(&self) -> &BTreeSet<String> {
        match self {
            Constraint::Shape(values) | Constraint::Type(values) => values,
        }
    }

    pub fn to_json(&self) -> ConstraintJson {
        ConstraintJson {
            constraint_type: self.constraint_type(),
            value: self.values().iter().cloned().collect(),
        }
    }
}

/// A predicate declaration of a shape.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Predicate {
    name: String,
    constraint: Option<Constraint>,
    cardinality: Option<Cardinality>,
    negative: bool,
    optional: bool,
}

impl Predicate {
    pub fn new(name: impl Into<String>) -> Self {
        Predicate {
            name: name.into(),
            constraint: None,
            cardinality: None,
            negative: false,
            optional: false,
        }
    }

    pub fn with_constraint(mut self, constraint: Constraint) -> Self {
        self.constraint = Some(constraint);
        self
    }

    pub fn with_cardinality(mut self, cardinality: Cardinality) -> Self {
        self.cardinality = Some(cardinality);
        self.optional = cardinality.is_optional();
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn constraint(&self) -> Option<&Constraint> {
        self.constraint.as_ref()
    }

    pub fn cardinality(&self) -> Option<&Cardinality> {
        self.cardinality.as_ref()
    }

    pub fn is_negative(&self) -> bool {
        self.negative
    }

    pub fn is_optional(&self) -> bool {
        self.optional
    }

    pub fn to_json(&self) -> PredicateJson {
        PredicateJson {
            name: self.name.clone(),
            constraint: self.constraint.as_ref().map(Constraint::to_json),
            cardinality: self.cardinality,
            negative: self.negative,
            optional: self.optional,
        }
    }

    fn normalized(mut self) -> Self {
        self.optional = self.cardinality.map_or(false, |c| c.is_optional());
        self
    }

    fn shape_references(&self) -> impl Iterator<Item = &ShapeName> {
        match &self.constraint {
            Some(Constraint::Shape(values)) => Some(values.iter()),
            _ => None,
        }
        .into_iter()
        .flatten()
    }
}

impl From<&str> for Predicate {
    fn from(name: &str) -> Self {
        Predicate::new(name)
    }
}

impl From<String> for Predicate {
    fn from(name: String) -> Self {
        Predicate::new(name)
    }
}

/// One alternative of a one-of group: predicates that have to hold together.
pub type OneOfPath = Vec<Predicate>;
/// A group of alternative paths; satisfying one of them satisfies the group.
pub type ShapeOneOf = Vec<OneOfPath>;
/// A one-of path indexed by predicate IRI.
pub type OneOfPathIndexed = BTreeMap<String, Predicate>;

/// Structural snapshot of a shape.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShapeObject {
    pub name: ShapeName,
    pub closed: bool,
    pub positive_predicates: Vec<String>,
    pub negative_predicates: Vec<String>,
    pub one_of: Vec<ShapeOneOf>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ConstraintJson {
    #[serde(rename = "type")]
    pub constraint_type: ConstraintType,
    pub value: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PredicateJson {
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub constraint: Option<ConstraintJson>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cardinality: Option<Cardinality>,
    pub negative: bool,
    pub optional: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ShapeJson {
    pub name: ShapeName,
    pub closed: bool,
    pub positive_predicates: Vec<PredicateJson>,
    pub negative_predicates: Vec<PredicateJson>,
    pub one_of: Vec<Vec<Vec<PredicateJson>>>,
}

/// Immutable description of a shape: which predicates a subject may or must
/// carry and what their objects have to look like.
#[derive(Debug, Clone)]
pub struct Shape {
    name: ShapeName,
    closed: bool,
    positive_predicates: Vec<String>,
    negative_predicates: Vec<String>,
    predicates: HashMap<String, Predicate>,
    one_of: Vec<ShapeOneOf>,
    one_of_indexed: Vec<Vec<OneOfPathIndexed>>,
    linked_shape_iri: BTreeSet<ShapeName>,
}

impl Shape {
    pub fn builder(name: impl Into<ShapeName>) -> ShapeBuilder {
        ShapeBuilder {
            name: name.into(),
            closed: false,
            positive: Vec::new(),
            negative: Vec::new(),
            one_of: Vec::new(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn is_closed(&self) -> bool {
        self.closed
    }

    pub fn positive_predicates(&self) -> &[String] {
        &self.positive_predicates
    }

    pub fn negative_predicates(&self) -> &[String] {
        &self.negative_predicates
    }

    pub fn one_of(&self) -> &[ShapeOneOf] {
        &self.one_of
    }

    pub fn one_of_indexed(&self) -> &[Vec<OneOfPathIndexed>] {
        &self.one_of_indexed
    }

    pub fn get(&self, predicate: &str) -> Option<&Predicate> {
        self.predicates.get(predicate)
    }

    /// Every declaration, positive ones first, in declaration order.
    pub fn get_all(&self) -> Vec<&Predicate> {
        self.positive_predicates
            .iter()
            .chain(self.negative_predicates.iter())
            .filter_map(|name| self.predicates.get(name))
            .collect()
    }

    /// Names of the other shapes referenced by a shape constraint.
    pub fn linked_shape_iri(&self) -> &BTreeSet<ShapeName> {
        &self.linked_shape_iri
    }

    pub fn to_object(&self) -> ShapeObject {
        ShapeObject {
            name: self.name.clone(),
            closed: self.closed,
            positive_predicates: self.positive_predicates.clone(),
            negative_predicates: self.negative_predicates.clone(),
            one_of: self.one_of.clone(),
        }
    }

    pub fn to_json(&self) -> ShapeJson {
        let detailed = |names: &[String]| -> Vec<PredicateJson> {
            names
                .iter()
                .filter_map(|name| self.predicates.get(name))
                .map(Predicate::to_json)
                .collect()
        };
        ShapeJson {
            name: self.name.clone(),
            closed: self.closed,
            positive_predicates: detailed(&self.positive_predicates),
            negative_predicates: detailed(&self.negative_predicates),
            one_of: self
                .one_of
                .iter()
                .map(|group| {
                    group
                        .iter()
                        .map(|path| path.iter().map(Predicate::to_json).collect())
                        .collect()
                })
                .collect(),
        }
    }

    pub fn to_json_string(&self) -> serde_json::Result<String> {
        serde_json::to_string(&self.to_json())
    }
}

pub struct ShapeBuilder {
    name: ShapeName,
    closed: bool,
    positive: Vec<Predicate>,
    negative: Vec<Predicate>,
    one_of: Vec<ShapeOneOf>,
}

impl ShapeBuilder {
    pub fn closed(mut self, closed: bool) -> Self {
        self.closed = closed;
        self
    }

    pub fn predicate(mut self, predicate: impl Into<Predicate>) -> Self {
        self.positive.push(predicate.into());
        self
    }

    pub fn predicates(
        mut self,
        predicates: impl IntoIterator<Item = impl Into<Predicate>>,
    ) -> Self {
        self.positive.extend(predicates.into_iter().map(Into::into));
        self
    }

    pub fn negative_predicate(mut self, predicate: impl Into<Predicate>) -> Self {
        self.negative.push(predicate.into());
        self
    }

    pub fn one_of(mut self, one_of: ShapeOneOf) -> Self {
        self.one_of.push(one_of);
        self
    }

    /// Fails when a predicate is declared both positive and negative.
    pub fn build(self) -> Result<Shape> {
        let ShapeBuilder {
            name,
            closed,
            positive,
            negative,
            one_of,
        } = self;

        let positive_predicates = unique_names(&positive);
        let negative_predicates = unique_names(&negative);
        let negative_set: HashSet<&str> = negative_predicates.iter().map(String::as_str).collect();
        if let Some(predicate) = positive_predicates
            .iter()
            .find(|p| negative_set.contains(p.as_str()))
        {
            return Err(ContainmentError::InconsistentPredicate {
                shape: name,
                predicate: predicate.clone(),
            });
        }

        let mut linked_shape_iri = BTreeSet::new();
        let mut predicates = HashMap::new();
        for predicate in positive {
            let predicate = predicate.normalized();
            linked_shape_iri.extend(predicate.shape_references().filter(|s| **s != name).cloned());
            predicates.insert(predicate.name.clone(), predicate);
        }
        for predicate in one_of.iter().flatten().flatten() {
            linked_shape_iri.extend(predicate.shape_references().filter(|s| **s != name).cloned());
        }
        for predicate in negative {
            let mut predicate = predicate.normalized();
            predicate.negative = true;
            predicates.insert(predicate.name.clone(), predicate);
        }

        let one_of_indexed = one_of
            .iter()
            .map(|group| {
                group
                    .iter()
                    .map(|path| {
                        path.iter()
                            .map(|p| (p.name.clone(), p.clone()))
                            .collect::<OneOfPathIndexed>()
                    })
                    .collect()
            })
            .collect();

        debug!(
            "Built shape {} (closed: {}, {} predicates, {} one-of groups, {} linked shapes)",
            name,
            closed,
            predicates.len(),
            one_of.len(),
            linked_shape_iri.len()
        );

        Ok(Shape {
            name,
            closed,
            positive_predicates,
            negative_predicates,
            predicates,
            one_of,
            one_of_indexed,
            linked_shape_iri,
        })
    }
}

fn unique_names(predicates: &[Predicate]) -> Vec<String> {
    let mut seen = HashSet::new();
    predicates
        .iter()
        .filter(|p| seen.insert(p.name.as_str()))
        .map(|p| p.name.clone())
        .collect()
}
