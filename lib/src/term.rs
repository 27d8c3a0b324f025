//! Terms appearing in the object position of query triples.

use oxigraph::model::{BlankNode, Literal, NamedNode, Variable};
use std::fmt;

/// A value in a query triple: either a concrete RDF term or a variable.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum QueryTerm {
    NamedNode(NamedNode),
    BlankNode(BlankNode),
    Literal(Literal),
    Variable(Variable),
}

impl QueryTerm {
    pub fn named_node(iri: impl Into<String>) -> Self {
        QueryTerm::NamedNode(NamedNode::new_unchecked(iri))
    }

    pub fn variable(name: impl Into<String>) -> Self {
        QueryTerm::Variable(Variable::new_unchecked(name))
    }

    pub fn simple_literal(value: impl Into<String>) -> Self {
        QueryTerm::Literal(Literal::new_simple_literal(value))
    }

    pub fn typed_literal(value: impl Into<String>, datatype: impl Into<String>) -> Self {
        QueryTerm::Literal(Literal::new_typed_literal(
            value,
            NamedNode::new_unchecked(datatype),
        ))
    }

    /// The lexical value of the term: the IRI, the literal value, the blank node
    /// identifier or the variable name.
    pub fn value(&self) -> &str {
        match self {
            QueryTerm::NamedNode(nn) => nn.as_str(),
            QueryTerm::BlankNode(bn) => bn.as_str(),
            QueryTerm::Literal(lit) => lit.value(),
            QueryTerm::Variable(var) => var.as_str(),
        }
    }

    /// Datatype IRI of a literal, `None` for every other kind of term.
    pub fn datatype(&self) -> Option<&str> {
        match self {
            QueryTerm::Literal(lit) => Some(lit.datatype().as_str()),
            _ => None,
        }
    }

    pub fn as_named_node(&self) -> Option<&NamedNode> {
        match self {
            QueryTerm::NamedNode(nn) => Some(nn),
            _ => None,
        }
    }
}

impl fmt::Display for QueryTerm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            QueryTerm::NamedNode(nn) => fmt::Display::fmt(nn, f),
            QueryTerm::BlankNode(bn) => fmt::Display::fmt(bn, f),
            QueryTerm::Literal(lit) => fmt::Display::fmt(lit, f),
            QueryTerm::Variable(var) => fmt::Display::fmt(var, f),
        }
    }
}

impl From<NamedNode> for QueryTerm {
    fn from(nn: NamedNode) -> Self {
        QueryTerm::NamedNode(nn)
    }
}

impl From<BlankNode> for QueryTerm {
    fn from(bn: BlankNode) -> Self {
        QueryTerm::BlankNode(bn)
    }
}

impl From<Literal> for QueryTerm {
    fn from(lit: Literal) -> Self {
        QueryTerm::Literal(lit)
    }
}

impl From<Variable> for QueryTerm {
    fn from(var: Variable) -> Self {
        QueryTerm::Variable(var)
    }
}

/// Object of a query triple. A `List` is produced when a variable was bound
/// upstream to several candidate values (e.g. through a `VALUES` clause).
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum TripleObject {
    Single(QueryTerm),
    List(Vec<QueryTerm>),
}

impl TripleObject {
    pub fn as_single(&self) -> Option<&QueryTerm> {
        match self {
            TripleObject::Single(term) => Some(term),
            TripleObject::List(_) => None,
        }
    }
}

impl fmt::Display for TripleObject {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TripleObject::Single(term) => fmt::Display::fmt(term, f),
            TripleObject::List(terms) => {
                write!(f, "[")?;
                for (i, term) in terms.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    fmt::Display::fmt(term, f)?;
                }
                write!(f, "]")
            }
        }
    }
}

impl From<QueryTerm> for TripleObject {
    fn from(term: QueryTerm) -> Self {
        TripleObject::Single(term)
    }
}

impl From<Vec<QueryTerm>> for TripleObject {
    fn from(terms: Vec<QueryTerm>) -> Self {
        TripleObject::List(terms)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const XSD_INTEGER: &str = "http://www.w3.org/2001/XMLSchema#integer";

    #[test]
    fn literal_exposes_its_datatype() {
        let term = QueryTerm::typed_literal("1", XSD_INTEGER);
        assert_eq!(term.datatype(), Some(XSD_INTEGER));
        assert_eq!(term.value(), "1");
        assert!(QueryTerm::named_node("http://example.com/a")
            .datatype()
            .is_none());
        assert!(term.as_named_node().is_none());
        assert_eq!(
            QueryTerm::named_node("http://example.com/a")
                .as_named_node()
                .map(|nn| nn.as_str()),
            Some("http://example.com/a")
        );
    }

    #[test]
    fn list_object_renders_every_candidate() {
        let object = TripleObject::from(vec![
            QueryTerm::named_node("http://example.com/a"),
            QueryTerm::named_node("http://example.com/b"),
        ]);
        assert_eq!(
            object.to_string(),
            "[<http://example.com/a>, <http://example.com/b>]"
        );
        assert!(object.as_single().is_none());
    }
}
