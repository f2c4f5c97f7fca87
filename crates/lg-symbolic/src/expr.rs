//! Hash-consed expression graph.
//!
//! Every node is interned: building the same expression twice yields the same
//! `ExprId`. Sums and products are n-ary and kept in a canonical form (flattened,
//! constants folded into one leading coefficient, operands sorted by id, like
//! terms and like bases collected), so structural equality is cheap and exact
//! cancellations such as `x - x` collapse to zero at construction time.

use std::collections::{BTreeMap, HashMap};
use std::fmt;

use crate::error::{SymbolicError, SymbolicResult};

/// Default upper bound on interned nodes before derivation is declared failed.
pub const DEFAULT_MAX_NODES: usize = 4_000_000;

/// Handle to a node in an [`ExprGraph`].
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Debug)]
pub struct ExprId(u32);

impl ExprId {
    /// Position of the node inside its graph.
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

/// A floating point constant with bitwise equality, so it can be hashed.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct Constant(u64);

impl Constant {
    pub fn new(value: f64) -> Self {
        // Fold -0.0 into 0.0 so both intern to the same node
        let value = if value == 0.0 { 0.0 } else { value };
        Self(value.to_bits())
    }

    pub fn value(self) -> f64 {
        f64::from_bits(self.0)
    }
}

impl fmt::Debug for Constant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.value())
    }
}

/// Expression node.
///
/// `Add` and `Mul` hold at least two operands. A constant operand, if any, is
/// stored first; the remaining operands are sorted by id.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum Node {
    Const(Constant),
    /// The independent time variable `t`.
    Time,
    /// Algebraic symbol (time independent).
    Symbol(u32),
    /// The `order`-th time derivative of coordinate function `q_index(t)`.
    Coord { index: u32, order: u8 },
    Add(Vec<ExprId>),
    Mul(Vec<ExprId>),
    Pow(ExprId, ExprId),
    Sin(ExprId),
    Cos(ExprId),
    Exp(ExprId),
    Ln(ExprId),
}

impl Node {
    /// Atoms are the leaves that can be bound to values or differentiated against.
    pub fn is_atom(&self) -> bool {
        matches!(self, Node::Time | Node::Symbol(_) | Node::Coord { .. })
    }
}

/// Arena of interned expression nodes.
pub struct ExprGraph {
    nodes: Vec<Node>,
    interned: HashMap<Node, ExprId>,
    symbol_names: Vec<String>,
    max_nodes: usize,
}

impl fmt::Debug for ExprGraph {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ExprGraph")
            .field("nodes", &self.nodes.len())
            .field("symbols", &self.symbol_names.len())
            .field("max_nodes", &self.max_nodes)
            .finish()
    }
}

impl Default for ExprGraph {
    fn default() -> Self {
        Self::new()
    }
}

impl ExprGraph {
    pub fn new() -> Self {
        Self::with_node_limit(DEFAULT_MAX_NODES)
    }

    /// Create a graph that reports [`SymbolicError::CapacityExceeded`] once it
    /// holds more than `max_nodes` nodes.
    pub fn with_node_limit(max_nodes: usize) -> Self {
        Self {
            nodes: Vec::new(),
            interned: HashMap::new(),
            symbol_names: Vec::new(),
            max_nodes,
        }
    }

    /// Number of interned nodes.
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Constructors never fail; callers check the budget at phase boundaries.
    pub fn check_capacity(&self) -> SymbolicResult<()> {
        if self.nodes.len() > self.max_nodes {
            Err(SymbolicError::CapacityExceeded {
                limit: self.max_nodes,
            })
        } else {
            Ok(())
        }
    }

    pub fn node(&self, id: ExprId) -> &Node {
        &self.nodes[id.index()]
    }

    pub(crate) fn intern(&mut self, node: Node) -> ExprId {
        if let Some(&id) = self.interned.get(&node) {
            return id;
        }
        let id = ExprId(self.nodes.len() as u32);
        self.nodes.push(node.clone());
        self.interned.insert(node, id);
        id
    }

    // ------------------------------------------------------------------
    // Queries
    // ------------------------------------------------------------------

    pub fn as_const(&self, id: ExprId) -> Option<f64> {
        match self.node(id) {
            Node::Const(c) => Some(c.value()),
            _ => None,
        }
    }

    pub fn is_zero(&self, id: ExprId) -> bool {
        self.as_const(id) == Some(0.0)
    }

    pub fn is_one(&self, id: ExprId) -> bool {
        self.as_const(id) == Some(1.0)
    }

    pub fn is_atom(&self, id: ExprId) -> bool {
        self.node(id).is_atom()
    }

    /// `(index, order)` if `id` is a coordinate time-function atom.
    pub fn coord_of(&self, id: ExprId) -> Option<(usize, u8)> {
        match self.node(id) {
            Node::Coord { index, order } => Some((*index as usize, *order)),
            _ => None,
        }
    }

    pub fn symbol_name(&self, id: ExprId) -> Option<&str> {
        match self.node(id) {
            Node::Symbol(s) => Some(self.symbol_names[*s as usize].as_str()),
            _ => None,
        }
    }

    /// Human readable name of an atom; used by errors and the printer.
    pub fn atom_name(&self, id: ExprId) -> String {
        match self.node(id) {
            Node::Time => "t".to_string(),
            Node::Symbol(s) => self.symbol_names[*s as usize].clone(),
            Node::Coord { index, order } => {
                format!("q{}{}(t)", index, "'".repeat(*order as usize))
            }
            other => format!("{:?}", other),
        }
    }

    // ------------------------------------------------------------------
    // Leaves
    // ------------------------------------------------------------------

    pub fn constant(&mut self, value: f64) -> ExprId {
        self.intern(Node::Const(Constant::new(value)))
    }

    pub fn zero(&mut self) -> ExprId {
        self.constant(0.0)
    }

    pub fn one(&mut self) -> ExprId {
        self.constant(1.0)
    }

    pub fn time(&mut self) -> ExprId {
        self.intern(Node::Time)
    }

    /// Create a fresh algebraic symbol. Two calls never return the same atom,
    /// even with equal names.
    pub fn symbol(&mut self, name: impl Into<String>) -> ExprId {
        let slot = self.symbol_names.len() as u32;
        self.symbol_names.push(name.into());
        self.intern(Node::Symbol(slot))
    }

    /// The `order`-th time derivative of the coordinate function `q_index(t)`.
    pub fn coord(&mut self, index: usize, order: u8) -> ExprId {
        self.intern(Node::Coord {
            index: index as u32,
            order,
        })
    }

    // ------------------------------------------------------------------
    // Sums
    // ------------------------------------------------------------------

    pub fn add(&mut self, a: ExprId, b: ExprId) -> ExprId {
        self.add_all([a, b])
    }

    pub fn sub(&mut self, a: ExprId, b: ExprId) -> ExprId {
        let nb = self.neg(b);
        self.add_all([a, nb])
    }

    /// Canonical n-ary sum with like-term collection.
    pub fn add_all<I>(&mut self, terms: I) -> ExprId
    where
        I: IntoIterator<Item = ExprId>,
    {
        let mut constant = 0.0;
        let mut collected: BTreeMap<ExprId, f64> = BTreeMap::new();
        let mut stack: Vec<ExprId> = terms.into_iter().collect();

        while let Some(term) = stack.pop() {
            match self.nodes[term.index()].clone() {
                Node::Const(c) => constant += c.value(),
                Node::Add(children) => stack.extend(children),
                _ => {
                    let (coeff, base) = self.split_coefficient(term);
                    *collected.entry(base).or_insert(0.0) += coeff;
                }
            }
        }

        let mut parts = Vec::with_capacity(collected.len() + 1);
        for (base, coeff) in collected {
            if coeff == 0.0 {
                continue;
            }
            parts.push(if coeff == 1.0 {
                base
            } else {
                self.scale_term(coeff, base)
            });
        }
        parts.sort();

        if parts.is_empty() {
            return self.constant(constant);
        }
        if constant == 0.0 {
            if parts.len() == 1 {
                return parts[0];
            }
        } else {
            let c = self.constant(constant);
            parts.insert(0, c);
        }
        self.intern(Node::Add(parts))
    }

    /// Split `c * rest` into `(c, rest)`; terms without a coefficient give `(1, term)`.
    fn split_coefficient(&mut self, term: ExprId) -> (f64, ExprId) {
        if let Node::Mul(factors) = self.nodes[term.index()].clone() {
            if let Some(c) = self.as_const(factors[0]) {
                let rest = &factors[1..];
                let base = if rest.len() == 1 {
                    rest[0]
                } else {
                    self.intern(Node::Mul(rest.to_vec()))
                };
                return (c, base);
            }
        }
        (1.0, term)
    }

    /// `coeff * base` for a coefficient-free `base`, without re-collecting.
    fn scale_term(&mut self, coeff: f64, base: ExprId) -> ExprId {
        let c = self.constant(coeff);
        let factors = match self.nodes[base.index()].clone() {
            Node::Mul(mut factors) => {
                factors.insert(0, c);
                factors
            }
            _ => vec![c, base],
        };
        self.intern(Node::Mul(factors))
    }

    // ------------------------------------------------------------------
    // Products and powers
    // ------------------------------------------------------------------

    pub fn mul(&mut self, a: ExprId, b: ExprId) -> ExprId {
        self.mul_all([a, b])
    }

    pub fn neg(&mut self, a: ExprId) -> ExprId {
        self.scale(-1.0, a)
    }

    pub fn scale(&mut self, factor: f64, a: ExprId) -> ExprId {
        let c = self.constant(factor);
        self.mul_all([c, a])
    }

    pub fn div(&mut self, a: ExprId, b: ExprId) -> ExprId {
        let inv = self.powi(b, -1);
        self.mul_all([a, inv])
    }

    /// Canonical n-ary product with like-base collection.
    pub fn mul_all<I>(&mut self, factors: I) -> ExprId
    where
        I: IntoIterator<Item = ExprId>,
    {
        self.collect_product(factors.into_iter().collect(), 0)
    }

    fn collect_product(&mut self, factors: Vec<ExprId>, depth: u8) -> ExprId {
        let mut coeff = 1.0;
        let mut powers: BTreeMap<ExprId, f64> = BTreeMap::new();
        let mut stack = factors;

        while let Some(factor) = stack.pop() {
            match self.nodes[factor.index()].clone() {
                Node::Const(c) => coeff *= c.value(),
                Node::Mul(children) => stack.extend(children),
                Node::Pow(base, exponent) => match self.as_const(exponent) {
                    Some(k) => *powers.entry(base).or_insert(0.0) += k,
                    None => *powers.entry(factor).or_insert(0.0) += 1.0,
                },
                _ => *powers.entry(factor).or_insert(0.0) += 1.0,
            }
        }

        if coeff == 0.0 {
            return self.zero();
        }

        let mut parts = Vec::with_capacity(powers.len() + 1);
        let mut renormalize = false;
        for (base, k) in powers {
            if k == 0.0 {
                continue;
            }
            let part = if k == 1.0 {
                base
            } else {
                let e = self.constant(k);
                self.pow(base, e)
            };
            match self.nodes[part.index()] {
                Node::Const(c) => {
                    coeff *= c.value();
                    continue;
                }
                Node::Mul(_) => renormalize = true,
                _ => {}
            }
            parts.push(part);
        }

        // A power may have re-exposed a product, e.g. sqrt(a*b)^2
        if renormalize && depth < 2 {
            let c = self.constant(coeff);
            parts.push(c);
            return self.collect_product(parts, depth + 1);
        }

        parts.sort();
        if parts.is_empty() {
            return self.constant(coeff);
        }
        if coeff == 1.0 {
            if parts.len() == 1 {
                return parts[0];
            }
        } else {
            let c = self.constant(coeff);
            parts.insert(0, c);
        }
        self.intern(Node::Mul(parts))
    }

    pub fn pow(&mut self, base: ExprId, exponent: ExprId) -> ExprId {
        if let Some(k) = self.as_const(exponent) {
            if k == 0.0 {
                return self.one();
            }
            if k == 1.0 {
                return base;
            }
            let integral = k.fract() == 0.0;
            match self.nodes[base.index()].clone() {
                Node::Const(c) => {
                    let v = c.value().powf(k);
                    if v.is_finite() && (c.value() >= 0.0 || integral) {
                        return self.constant(v);
                    }
                }
                Node::Pow(inner, inner_exp) if integral => {
                    if let Some(j) = self.as_const(inner_exp) {
                        let e = self.constant(j * k);
                        return self.pow(inner, e);
                    }
                }
                Node::Mul(factors) if integral => {
                    let parts: Vec<ExprId> =
                        factors.iter().map(|&f| self.pow(f, exponent)).collect();
                    return self.mul_all(parts);
                }
                _ => {}
            }
        } else if self.is_one(base) {
            return base;
        }
        self.intern(Node::Pow(base, exponent))
    }

    pub fn powi(&mut self, base: ExprId, n: i32) -> ExprId {
        let e = self.constant(f64::from(n));
        self.pow(base, e)
    }

    pub fn square(&mut self, a: ExprId) -> ExprId {
        self.powi(a, 2)
    }

    pub fn sqrt(&mut self, a: ExprId) -> ExprId {
        let half = self.constant(0.5);
        self.pow(a, half)
    }

    // ------------------------------------------------------------------
    // Elementary functions
    // ------------------------------------------------------------------

    pub fn sin(&mut self, a: ExprId) -> ExprId {
        match self.as_const(a) {
            Some(v) => self.constant(v.sin()),
            None => self.intern(Node::Sin(a)),
        }
    }

    pub fn cos(&mut self, a: ExprId) -> ExprId {
        match self.as_const(a) {
            Some(v) => self.constant(v.cos()),
            None => self.intern(Node::Cos(a)),
        }
    }

    pub fn exp(&mut self, a: ExprId) -> ExprId {
        match self.as_const(a) {
            Some(v) => self.constant(v.exp()),
            None => self.intern(Node::Exp(a)),
        }
    }

    pub fn ln(&mut self, a: ExprId) -> ExprId {
        match self.as_const(a) {
            Some(v) if v > 0.0 => self.constant(v.ln()),
            _ => self.intern(Node::Ln(a)),
        }
    }

    // ------------------------------------------------------------------
    // Structural helpers
    // ------------------------------------------------------------------

    /// Rebuild `expr` with each direct child mapped through `f`.
    ///
    /// Atoms and constants are returned unchanged; unchanged children return
    /// `expr` itself without touching the interner.
    pub(crate) fn rebuild<F>(&mut self, expr: ExprId, mut f: F) -> ExprId
    where
        F: FnMut(&mut Self, ExprId) -> ExprId,
    {
        match self.nodes[expr.index()].clone() {
            Node::Const(_) | Node::Time | Node::Symbol(_) | Node::Coord { .. } => expr,
            Node::Add(terms) => {
                let mapped: Vec<ExprId> = terms.iter().map(|&t| f(self, t)).collect();
                if mapped == terms {
                    expr
                } else {
                    self.add_all(mapped)
                }
            }
            Node::Mul(factors) => {
                let mapped: Vec<ExprId> = factors.iter().map(|&t| f(self, t)).collect();
                if mapped == factors {
                    expr
                } else {
                    self.mul_all(mapped)
                }
            }
            Node::Pow(base, exponent) => {
                let b = f(self, base);
                let e = f(self, exponent);
                if b == base && e == exponent {
                    expr
                } else {
                    self.pow(b, e)
                }
            }
            Node::Sin(u) => {
                let v = f(self, u);
                if v == u { expr } else { self.sin(v) }
            }
            Node::Cos(u) => {
                let v = f(self, u);
                if v == u { expr } else { self.cos(v) }
            }
            Node::Exp(u) => {
                let v = f(self, u);
                if v == u { expr } else { self.exp(v) }
            }
            Node::Ln(u) => {
                let v = f(self, u);
                if v == u { expr } else { self.ln(v) }
            }
        }
    }

    /// Direct children of a node, in storage order.
    pub fn children(&self, expr: ExprId) -> Vec<ExprId> {
        match self.node(expr) {
            Node::Const(_) | Node::Time | Node::Symbol(_) | Node::Coord { .. } => Vec::new(),
            Node::Add(items) | Node::Mul(items) => items.clone(),
            Node::Pow(b, e) => vec![*b, *e],
            Node::Sin(u) | Node::Cos(u) | Node::Exp(u) | Node::Ln(u) => vec![*u],
        }
    }
}
