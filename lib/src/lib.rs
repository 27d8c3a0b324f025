//! Decides whether the data a query needs is guaranteed to exist under a set of
//! shapes and, if not, which linked resources still have to be fetched.
//!
//! A query is split into star patterns (triples sharing a subject). Each star
//! pattern is bound to each shape; the bindings are folded into a containment
//! verdict per star pattern by [`solve_shape_query_containment`].

pub mod alignment;
pub mod binding;
pub mod containment;
pub mod error;
pub mod query;
pub mod shape;
pub mod term;
pub mod trace;
pub mod triple;
pub mod types;

pub use binding::{Bindings, DependentStarPattern, LinkedShapes};
pub use containment::{
    solve_shape_query_containment, ConditionalLink, ContainmentArgs, ContainmentReport,
    ContainmentResult, ContainmentVerdict,
};
pub use error::{ContainmentError, Result};
pub use query::{Query, QueryBuilder, StarPattern, TripleWithDependencies};
pub use shape::{Constraint, ConstraintType, Predicate, Shape, ShapeBuilder};
pub use term::{QueryTerm, TripleObject};
pub use triple::{OneOf, Triple, NEGATED_SET_MARKER};
pub use types::{Cardinality, ShapeName, StarPatternName};
