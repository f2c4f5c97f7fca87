//! Partial differentiation against an atom and total differentiation in time.

use std::collections::HashMap;

use crate::error::{SymbolicError, SymbolicResult};
use crate::expr::{ExprGraph, ExprId, Node};

/// Which derivative a traversal computes.
#[derive(Clone, Copy)]
enum Wrt {
    /// Partial derivative; every atom other than the variable is held constant.
    Atom(ExprId),
    /// Total derivative d/dt; coordinate functions advance one order.
    Time,
}

impl ExprGraph {
    /// Partial derivative of `expr` with respect to the atom `var`.
    ///
    /// `var` may be `t`, a symbol or any coordinate function `q_i^(k)(t)`. The
    /// different orders of one coordinate are independent atoms here, which is
    /// exactly what `∂L/∂q` and `∂L/∂q̇` require.
    pub fn diff(&mut self, expr: ExprId, var: ExprId) -> SymbolicResult<ExprId> {
        if !self.is_atom(var) {
            return Err(SymbolicError::NotAnAtom {
                what: format!("{}", self.display(var)),
            });
        }
        let mut memo = HashMap::new();
        Ok(self.derive(expr, Wrt::Atom(var), &mut memo))
    }

    /// Total time derivative of `expr`.
    ///
    /// Applies the chain rule through every coordinate function:
    /// `d/dt q_i^(k) = q_i^(k+1)`, `d/dt t = 1`, symbols are constant.
    pub fn diff_time(&mut self, expr: ExprId) -> ExprId {
        let mut memo = HashMap::new();
        self.derive(expr, Wrt::Time, &mut memo)
    }

    fn derive(&mut self, expr: ExprId, wrt: Wrt, memo: &mut HashMap<ExprId, ExprId>) -> ExprId {
        if let Some(&d) = memo.get(&expr) {
            return d;
        }
        let d = match self.node(expr).clone() {
            Node::Const(_) => self.zero(),
            Node::Symbol(_) => match wrt {
                Wrt::Atom(v) if v == expr => self.one(),
                _ => self.zero(),
            },
            Node::Time => match wrt {
                Wrt::Atom(v) if v != expr => self.zero(),
                _ => self.one(),
            },
            Node::Coord { index, order } => match wrt {
                Wrt::Atom(v) if v == expr => self.one(),
                Wrt::Atom(_) => self.zero(),
                Wrt::Time => self.coord(index as usize, order + 1),
            },
            Node::Add(terms) => {
                let parts: Vec<ExprId> = terms.iter().map(|&t| self.derive(t, wrt, memo)).collect();
                self.add_all(parts)
            }
            Node::Mul(factors) => {
                // Product rule: sum over i of (d f_i) * prod_{j != i} f_j
                let mut terms = Vec::with_capacity(factors.len());
                for (i, &f) in factors.iter().enumerate() {
                    let df = self.derive(f, wrt, memo);
                    if self.is_zero(df) {
                        continue;
                    }
                    let mut product = Vec::with_capacity(factors.len());
                    product.push(df);
                    product.extend(
                        factors
                            .iter()
                            .enumerate()
                            .filter(|(j, _)| *j != i)
                            .map(|(_, &g)| g),
                    );
                    terms.push(self.mul_all(product));
                }
                self.add_all(terms)
            }
            Node::Pow(base, exponent) => {
                let db = self.derive(base, wrt, memo);
                match self.as_const(exponent) {
                    Some(k) => {
                        if self.is_zero(db) {
                            self.zero()
                        } else {
                            let km1 = self.constant(k - 1.0);
                            let reduced = self.pow(base, km1);
                            let kc = self.constant(k);
                            self.mul_all([kc, reduced, db])
                        }
                    }
                    None => {
                        // d(b^e) = b^e * (de * ln b + e * db / b)
                        let de = self.derive(exponent, wrt, memo);
                        let ln_b = self.ln(base);
                        let left = self.mul(de, ln_b);
                        let ratio = self.div(db, base);
                        let right = self.mul(exponent, ratio);
                        let inner = self.add(left, right);
                        self.mul(expr, inner)
                    }
                }
            }
            Node::Sin(u) => {
                let du = self.derive(u, wrt, memo);
                let c = self.cos(u);
                self.mul(c, du)
            }
            Node::Cos(u) => {
                let du = self.derive(u, wrt, memo);
                let s = self.sin(u);
                let m = self.mul(s, du);
                self.neg(m)
            }
            Node::Exp(u) => {
                let du = self.derive(u, wrt, memo);
                self.mul(expr, du)
            }
            Node::Ln(u) => {
                let du = self.derive(u, wrt, memo);
                self.div(du, u)
            }
        };
        memo.insert(expr, d);
        d
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_holds_other_atoms_constant() {
        let mut g = ExprGraph::new();
        let q = g.coord(0, 0);
        let dq = g.coord(0, 1);
        // L = dq^2 * q
        let dq2 = g.square(dq);
        let l = g.mul(dq2, q);

        let dl_dq = g.diff(l, q).unwrap();
        assert_eq!(dl_dq, dq2);

        let dl_ddq = g.diff(l, dq).unwrap();
        let expected = {
            let p = g.mul(dq, q);
            g.scale(2.0, p)
        };
        assert_eq!(dl_ddq, expected);
    }

    #[test]
    fn total_derivative_advances_coordinate_order() {
        let mut g = ExprGraph::new();
        let dq = g.coord(1, 1);
        let d = g.diff_time(dq);
        assert_eq!(g.coord_of(d), Some((1, 2)));
    }

    #[test]
    fn total_derivative_of_time_and_symbols() {
        let mut g = ExprGraph::new();
        let t = g.time();
        let w = g.symbol("w");
        let wt = g.mul(w, t);
        let s = g.sin(wt);
        let ds = g.diff_time(s);

        let c = g.cos(wt);
        let expected = g.mul(c, w);
        assert_eq!(ds, expected);
    }

    #[test]
    fn chain_rule_through_cosine() {
        let mut g = ExprGraph::new();
        let q = g.coord(0, 0);
        let c = g.cos(q);
        let d = g.diff_time(c);

        let s = g.sin(q);
        let dq = g.coord(0, 1);
        let p = g.mul(s, dq);
        let expected = g.neg(p);
        assert_eq!(d, expected);
    }

    #[test]
    fn symbolic_exponent_uses_logarithm() {
        let mut g = ExprGraph::new();
        let x = g.symbol("x");
        let y = g.symbol("y");
        let p = g.pow(x, y);
        let d = g.diff(p, y).unwrap();

        let ln_x = g.ln(x);
        let expected = g.mul(p, ln_x);
        assert_eq!(d, expected);
    }

    #[test]
    fn differentiating_against_compound_is_rejected() {
        let mut g = ExprGraph::new();
        let x = g.symbol("x");
        let s = g.sin(x);
        assert!(matches!(
            g.diff(s, s),
            Err(SymbolicError::NotAnAtom { .. })
        ));
    }
}
