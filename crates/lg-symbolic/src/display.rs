//! Infix rendering of expressions.

use std::fmt;

use crate::expr::{ExprGraph, ExprId, Node};

/// Borrowing display adapter returned by [`ExprGraph::display`].
pub struct ExprDisplay<'a> {
    graph: &'a ExprGraph,
    expr: ExprId,
}

impl ExprGraph {
    pub fn display(&self, expr: ExprId) -> ExprDisplay<'_> {
        ExprDisplay { graph: self, expr }
    }
}

impl fmt::Display for ExprDisplay<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write_expr(self.graph, self.expr, f)
    }
}

fn write_expr(g: &ExprGraph, e: ExprId, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match g.node(e) {
        Node::Const(c) => write!(f, "{}", c.value()),
        Node::Time | Node::Symbol(_) | Node::Coord { .. } => write!(f, "{}", g.atom_name(e)),
        Node::Add(terms) => {
            for (i, &t) in terms.iter().enumerate() {
                let (negative, magnitude) = split_sign(g, t);
                match (i, negative) {
                    (0, true) => write!(f, "-")?,
                    (0, false) => {}
                    (_, true) => write!(f, " - ")?,
                    (_, false) => write!(f, " + ")?,
                }
                write_term(g, t, magnitude, f)?;
            }
            Ok(())
        }
        Node::Mul(factors) => {
            for (i, &x) in factors.iter().enumerate() {
                if i > 0 {
                    write!(f, "*")?;
                }
                write_operand(g, x, f)?;
            }
            Ok(())
        }
        Node::Pow(base, exponent) => {
            write_operand(g, *base, f)?;
            write!(f, "^")?;
            write_operand(g, *exponent, f)
        }
        Node::Sin(u) => write_call("sin", g, *u, f),
        Node::Cos(u) => write_call("cos", g, *u, f),
        Node::Exp(u) => write_call("exp", g, *u, f),
        Node::Ln(u) => write_call("ln", g, *u, f),
    }
}

/// Sign of a sum term and, for negative terms, the magnitude of its coefficient.
fn split_sign(g: &ExprGraph, term: ExprId) -> (bool, Option<f64>) {
    let coeff = match g.node(term) {
        Node::Const(c) => Some(c.value()),
        Node::Mul(factors) => g.as_const(factors[0]),
        _ => None,
    };
    match coeff {
        Some(c) if c < 0.0 => (true, Some(-c)),
        _ => (false, None),
    }
}

fn write_term(
    g: &ExprGraph,
    term: ExprId,
    magnitude: Option<f64>,
    f: &mut fmt::Formatter<'_>,
) -> fmt::Result {
    let Some(m) = magnitude else {
        return write_expr(g, term, f);
    };
    match g.node(term) {
        Node::Mul(factors) => {
            let rest = &factors[1..];
            if m != 1.0 {
                write!(f, "{}*", m)?;
            }
            for (i, &x) in rest.iter().enumerate() {
                if i > 0 {
                    write!(f, "*")?;
                }
                write_operand(g, x, f)?;
            }
            Ok(())
        }
        _ => write!(f, "{}", m),
    }
}

fn write_operand(g: &ExprGraph, e: ExprId, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    let needs_parens = match g.node(e) {
        Node::Add(_) | Node::Mul(_) | Node::Pow(..) => true,
        Node::Const(c) => c.value() < 0.0,
        _ => false,
    };
    if needs_parens {
        write!(f, "(")?;
        write_expr(g, e, f)?;
        write!(f, ")")
    } else {
        write_expr(g, e, f)
    }
}

fn write_call(name: &str, g: &ExprGraph, u: ExprId, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "{}(", name)?;
    write_expr(g, u, f)?;
    write!(f, ")")
}
