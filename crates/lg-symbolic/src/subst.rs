//! Substitution, atom queries and direct (tree-walking) evaluation.

use std::collections::{BTreeSet, HashMap};

use crate::error::{SymbolicError, SymbolicResult};
use crate::expr::{ExprGraph, ExprId, Node};

impl ExprGraph {
    /// Replace every occurrence of the keys of `map` inside `expr`.
    ///
    /// Keys are matched structurally (by id), so any subexpression can be
    /// replaced, not only atoms.
    pub fn substitute(&mut self, expr: ExprId, map: &HashMap<ExprId, ExprId>) -> ExprId {
        let mut memo = HashMap::new();
        self.substitute_memo(expr, map, &mut memo)
    }

    /// Substitute into several roots sharing one memo table.
    pub fn substitute_all(
        &mut self,
        exprs: &[ExprId],
        map: &HashMap<ExprId, ExprId>,
    ) -> Vec<ExprId> {
        let mut memo = HashMap::new();
        exprs
            .iter()
            .map(|&e| self.substitute_memo(e, map, &mut memo))
            .collect()
    }

    fn substitute_memo(
        &mut self,
        expr: ExprId,
        map: &HashMap<ExprId, ExprId>,
        memo: &mut HashMap<ExprId, ExprId>,
    ) -> ExprId {
        if let Some(&r) = map.get(&expr) {
            return r;
        }
        if let Some(&r) = memo.get(&expr) {
            return r;
        }
        let r = self.rebuild(expr, |g, child| g.substitute_memo(child, map, memo));
        memo.insert(expr, r);
        r
    }

    /// Bind atoms to numeric values and fold the result.
    ///
    /// Returns a constant when every atom of `expr` is bound.
    pub fn substitute_values(&mut self, expr: ExprId, values: &HashMap<ExprId, f64>) -> ExprId {
        let map: HashMap<ExprId, ExprId> = values
            .iter()
            .map(|(&atom, &v)| (atom, self.constant(v)))
            .collect();
        self.substitute(expr, &map)
    }

    /// All atoms reachable from `expr`, in id order.
    pub fn free_atoms(&self, expr: ExprId) -> BTreeSet<ExprId> {
        self.free_atoms_all(&[expr])
    }

    pub fn free_atoms_all(&self, roots: &[ExprId]) -> BTreeSet<ExprId> {
        let mut atoms = BTreeSet::new();
        let mut seen = vec![false; self.len()];
        let mut stack: Vec<ExprId> = roots.to_vec();
        while let Some(e) = stack.pop() {
            if std::mem::replace(&mut seen[e.index()], true) {
                continue;
            }
            if self.is_atom(e) {
                atoms.insert(e);
            } else {
                stack.extend(self.children(e));
            }
        }
        atoms
    }

    /// True when `atom` occurs anywhere inside `expr`.
    pub fn depends_on(&self, expr: ExprId, atom: ExprId) -> bool {
        self.free_atoms(expr).contains(&atom)
    }

    /// Number of distinct nodes reachable from `expr`.
    pub fn size(&self, expr: ExprId) -> usize {
        let mut seen = vec![false; self.len()];
        let mut stack = vec![expr];
        let mut count = 0;
        while let Some(e) = stack.pop() {
            if std::mem::replace(&mut seen[e.index()], true) {
                continue;
            }
            count += 1;
            stack.extend(self.children(e));
        }
        count
    }

    /// Evaluate `expr` by walking the graph with the given atom bindings.
    ///
    /// This is the reference semantics the compiled tapes are checked against.
    pub fn evaluate(&self, expr: ExprId, bindings: &HashMap<ExprId, f64>) -> SymbolicResult<f64> {
        let mut memo = HashMap::new();
        self.evaluate_memo(expr, bindings, &mut memo)
    }

    fn evaluate_memo(
        &self,
        expr: ExprId,
        bindings: &HashMap<ExprId, f64>,
        memo: &mut HashMap<ExprId, f64>,
    ) -> SymbolicResult<f64> {
        if let Some(&v) = memo.get(&expr) {
            return Ok(v);
        }
        let v = match self.node(expr) {
            Node::Const(c) => c.value(),
            Node::Time | Node::Symbol(_) | Node::Coord { .. } => {
                *bindings
                    .get(&expr)
                    .ok_or_else(|| SymbolicError::UnboundAtom {
                        name: self.atom_name(expr),
                    })?
            }
            Node::Add(terms) => {
                let mut acc = 0.0;
                for &t in terms {
                    acc += self.evaluate_memo(t, bindings, memo)?;
                }
                acc
            }
            Node::Mul(factors) => {
                let mut acc = 1.0;
                for &f in factors {
                    acc *= self.evaluate_memo(f, bindings, memo)?;
                }
                acc
            }
            Node::Pow(b, e) => {
                let b = self.evaluate_memo(*b, bindings, memo)?;
                let e = self.evaluate_memo(*e, bindings, memo)?;
                b.powf(e)
            }
            Node::Sin(u) => self.evaluate_memo(*u, bindings, memo)?.sin(),
            Node::Cos(u) => self.evaluate_memo(*u, bindings, memo)?.cos(),
            Node::Exp(u) => self.evaluate_memo(*u, bindings, memo)?.exp(),
            Node::Ln(u) => self.evaluate_memo(*u, bindings, memo)?.ln(),
        };
        memo.insert(expr, v);
        Ok(v)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn substitution_replaces_time_functions() {
        let mut g = ExprGraph::new();
        let q = g.coord(0, 0);
        let dq = g.coord(0, 1);
        let s = g.sin(q);
        let e = g.mul(s, dq);

        let big_q = g.symbol("Q0");
        let big_dq = g.symbol("dQ0");
        let map = HashMap::from([(q, big_q), (dq, big_dq)]);
        let r = g.substitute(e, &map);

        assert!(!g.depends_on(r, q));
        assert!(!g.depends_on(r, dq));
        let atoms: Vec<_> = g.free_atoms(r).into_iter().collect();
        assert_eq!(atoms, vec![big_q, big_dq]);
    }

    #[test]
    fn substituting_values_folds_to_constant() {
        let mut g = ExprGraph::new();
        let x = g.symbol("x");
        let y = g.symbol("y");
        let sum = g.add(x, y);
        let e = g.square(sum);
        let r = g.substitute_values(e, &HashMap::from([(x, 1.0), (y, 2.0)]));
        assert_eq!(g.as_const(r), Some(9.0));
    }

    #[test]
    fn evaluate_reports_unbound_atoms() {
        let mut g = ExprGraph::new();
        let q = g.coord(2, 1);
        let e = g.cos(q);
        match g.evaluate(e, &HashMap::new()) {
            Err(SymbolicError::UnboundAtom { name }) => assert_eq!(name, "q2'(t)"),
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn size_counts_shared_nodes_once() {
        let mut g = ExprGraph::new();
        let x = g.symbol("x");
        let s = g.sin(x);
        let e = g.mul(s, s);
        // Pow(sin x, 2): pow node, sin node, x, constant 2
        assert_eq!(g.size(e), 4);
    }
}
