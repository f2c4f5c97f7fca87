//! Best-effort simplification.
//!
//! Canonical construction already collects like terms inside a single sum or
//! product. This module goes one step further: it distributes products over
//! sums so that terms hidden in different factors can meet, then merges
//! `c·r·sin²u + c·r·cos²u` into `c·r`. Expansion is bounded by a term budget;
//! when the budget is exceeded the input is returned unchanged.

use std::collections::HashMap;

use crate::expr::{ExprGraph, ExprId, Node};

/// Largest integer power of a sum that is expanded by repeated multiplication.
const MAX_EXPANDED_POWER: f64 = 8.0;

/// Result of [`ExprGraph::simplify`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Simplified {
    pub expr: ExprId,
    /// False when the term budget was exceeded and `expr` is the input.
    pub expanded: bool,
}

struct Expander {
    max_terms: usize,
    memo: HashMap<ExprId, Vec<ExprId>>,
}

impl ExprGraph {
    /// Simplify `expr`, expanding at most `max_terms` terms.
    pub fn simplify(&mut self, expr: ExprId, max_terms: usize) -> Simplified {
        match self.expand(expr, max_terms) {
            Some(expanded) => Simplified {
                expr: self.merge_trig_squares(expanded),
                expanded: true,
            },
            None => Simplified {
                expr,
                expanded: false,
            },
        }
    }

    /// Fully distribute products over sums.
    ///
    /// Returns `None` when an intermediate sum would hold more than `max_terms`
    /// terms.
    pub fn expand(&mut self, expr: ExprId, max_terms: usize) -> Option<ExprId> {
        let mut ex = Expander {
            max_terms,
            memo: HashMap::new(),
        };
        let terms = self.expand_terms(expr, &mut ex)?;
        Some(self.add_all(terms))
    }

    fn expand_terms(&mut self, expr: ExprId, ex: &mut Expander) -> Option<Vec<ExprId>> {
        if let Some(terms) = ex.memo.get(&expr) {
            return Some(terms.clone());
        }
        let terms = match self.node(expr).clone() {
            Node::Const(_) | Node::Time | Node::Symbol(_) | Node::Coord { .. } => vec![expr],
            Node::Add(children) => {
                let mut out = Vec::new();
                for c in children {
                    out.extend(self.expand_terms(c, ex)?);
                    if out.len() > ex.max_terms {
                        return None;
                    }
                }
                out
            }
            Node::Mul(factors) => {
                let mut acc = vec![self.one()];
                for f in factors {
                    let f_terms = self.expand_terms(f, ex)?;
                    acc = self.distribute(&acc, &f_terms, ex.max_terms)?;
                }
                acc
            }
            Node::Pow(base, exponent) => {
                let base_terms = self.expand_terms(base, ex)?;
                match self.as_const(exponent) {
                    Some(k)
                        if base_terms.len() > 1
                            && k.fract() == 0.0
                            && (2.0..=MAX_EXPANDED_POWER).contains(&k) =>
                    {
                        let mut acc = base_terms.clone();
                        for _ in 1..(k as usize) {
                            acc = self.distribute(&acc, &base_terms, ex.max_terms)?;
                        }
                        acc
                    }
                    _ => {
                        let b = self.add_all(base_terms);
                        let e = self.expand_argument(exponent, ex);
                        vec![self.pow(b, e)]
                    }
                }
            }
            Node::Sin(u) => {
                let a = self.expand_argument(u, ex);
                vec![self.sin(a)]
            }
            Node::Cos(u) => {
                let a = self.expand_argument(u, ex);
                vec![self.cos(a)]
            }
            Node::Exp(u) => {
                let a = self.expand_argument(u, ex);
                vec![self.exp(a)]
            }
            Node::Ln(u) => {
                let a = self.expand_argument(u, ex);
                vec![self.ln(a)]
            }
        };
        ex.memo.insert(expr, terms.clone());
        Some(terms)
    }

    /// Function arguments are expanded independently; a failure keeps the argument.
    fn expand_argument(&mut self, arg: ExprId, ex: &mut Expander) -> ExprId {
        match self.expand_terms(arg, ex) {
            Some(terms) => self.add_all(terms),
            None => arg,
        }
    }

    fn distribute(
        &mut self,
        left: &[ExprId],
        right: &[ExprId],
        max_terms: usize,
    ) -> Option<Vec<ExprId>> {
        if left.len().saturating_mul(right.len()) > max_terms {
            return None;
        }
        let mut out = Vec::with_capacity(left.len() * right.len());
        for &a in left {
            for &b in right {
                let p = self.mul(a, b);
                if !self.is_zero(p) {
                    out.push(p);
                }
            }
        }
        Some(out)
    }

    /// Merge `c·r·sin²(u) + c·r·cos²(u)` into `c·r` throughout `expr`.
    pub fn merge_trig_squares(&mut self, expr: ExprId) -> ExprId {
        let mut memo = HashMap::new();
        self.merge_trig_memo(expr, &mut memo)
    }

    fn merge_trig_memo(&mut self, expr: ExprId, memo: &mut HashMap<ExprId, ExprId>) -> ExprId {
        if let Some(&r) = memo.get(&expr) {
            return r;
        }
        let inner = self.rebuild(expr, |g, child| g.merge_trig_memo(child, memo));
        let r = match self.node(inner).clone() {
            Node::Add(terms) => self.merge_sum(&terms).unwrap_or(inner),
            _ => inner,
        };
        memo.insert(expr, r);
        r
    }

    /// One merge pass over the terms of a sum; `None` when nothing merged.
    fn merge_sum(&mut self, terms: &[ExprId]) -> Option<ExprId> {
        // (argument, remainder) -> (term index, coefficient) for sin² and cos²
        let mut sines: HashMap<(ExprId, ExprId), (usize, f64)> = HashMap::new();
        let mut cosines: HashMap<(ExprId, ExprId), (usize, f64)> = HashMap::new();

        for (i, &term) in terms.iter().enumerate() {
            let (coeff, factors) = self.coefficient_and_factors(term);
            for (j, &f) in factors.iter().enumerate() {
                let Some((is_sin, u)) = self.trig_square(f) else {
                    continue;
                };
                let rest: Vec<ExprId> = factors
                    .iter()
                    .enumerate()
                    .filter(|(k, _)| *k != j)
                    .map(|(_, &x)| x)
                    .collect();
                let rest = self.mul_all(rest);
                let table = if is_sin { &mut sines } else { &mut cosines };
                table.entry((u, rest)).or_insert((i, coeff));
            }
        }

        let mut used = vec![false; terms.len()];
        let mut merged = Vec::new();
        let mut keys: Vec<_> = sines.keys().copied().collect();
        keys.sort();
        for key in keys {
            let (si, sc) = sines[&key];
            let Some(&(ci, cc)) = cosines.get(&key) else {
                continue;
            };
            if sc != cc || si == ci || used[si] || used[ci] {
                continue;
            }
            used[si] = true;
            used[ci] = true;
            merged.push(self.scale(sc, key.1));
        }

        if merged.is_empty() {
            return None;
        }
        merged.extend(
            terms
                .iter()
                .zip(&used)
                .filter(|(_, u)| !**u)
                .map(|(&t, _)| t),
        );
        Some(self.add_all(merged))
    }

    fn coefficient_and_factors(&self, term: ExprId) -> (f64, Vec<ExprId>) {
        match self.node(term) {
            Node::Mul(factors) => match self.as_const(factors[0]) {
                Some(c) => (c, factors[1..].to_vec()),
                None => (1.0, factors.clone()),
            },
            _ => (1.0, vec![term]),
        }
    }

    /// `Some((true, u))` for `sin(u)^2`, `Some((false, u))` for `cos(u)^2`.
    fn trig_square(&self, f: ExprId) -> Option<(bool, ExprId)> {
        let Node::Pow(base, exponent) = self.node(f) else {
            return None;
        };
        if self.as_const(*exponent) != Some(2.0) {
            return None;
        }
        match self.node(*base) {
            Node::Sin(u) => Some((true, *u)),
            Node::Cos(u) => Some((false, *u)),
            _ => None,
        }
    }
}
