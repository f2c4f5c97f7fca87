//! Solving systems of equations that are affine in a set of unknowns.

use std::collections::HashMap;

use crate::error::{SymbolicError, SymbolicResult};
use crate::expr::{ExprGraph, ExprId};

/// Solution of `equations == 0` for a set of unknowns.
#[derive(Clone, Debug, PartialEq)]
pub struct LinearSolution {
    /// One entry per unknown; `None` when no pivot was available for it.
    pub values: Vec<Option<ExprId>>,
    /// Equations that never became a pivot row (redundant or inconsistent).
    pub dropped_rows: Vec<usize>,
}

impl LinearSolution {
    /// Unknowns that could not be solved for.
    pub fn unsolved(&self) -> impl Iterator<Item = usize> + '_ {
        self.values
            .iter()
            .enumerate()
            .filter(|(_, v)| v.is_none())
            .map(|(i, _)| i)
    }
}

impl ExprGraph {
    /// Solve `equations[i] == 0` for `unknowns` by symbolic Gauss-Jordan
    /// elimination.
    ///
    /// Each equation must be affine in the unknowns: the coefficient
    /// `∂eq_i/∂u_j` may not itself contain any unknown. Pivots prefer constant
    /// entries, then the smallest expression; a structurally zero column gets
    /// no pivot and reports `None`. Intermediate entries are simplified within
    /// `max_terms`. Unpivoted unknowns are taken as zero in the other values.
    pub fn solve_linear(
        &mut self,
        equations: &[ExprId],
        unknowns: &[ExprId],
        max_terms: usize,
    ) -> SymbolicResult<LinearSolution> {
        let rows = equations.len();
        let cols = unknowns.len();

        let zero = self.zero();
        let zero_unknowns: HashMap<ExprId, ExprId> = unknowns.iter().map(|&u| (u, zero)).collect();

        let mut a = vec![vec![zero; cols]; rows];
        let mut rhs = vec![zero; rows];
        for (i, &eq) in equations.iter().enumerate() {
            for (j, &u) in unknowns.iter().enumerate() {
                let coeff = self.diff(eq, u)?;
                if unknowns.iter().any(|&v| self.depends_on(coeff, v)) {
                    return Err(SymbolicError::Nonlinear { equation: i });
                }
                a[i][j] = coeff;
            }
            let constant_part = self.substitute(eq, &zero_unknowns);
            rhs[i] = self.neg(constant_part);
        }

        let mut pivot_row: Vec<Option<usize>> = vec![None; cols];
        let mut used = vec![false; rows];

        for j in 0..cols {
            let Some(p) = self.choose_pivot(&a, &used, j) else {
                continue;
            };
            used[p] = true;
            pivot_row[j] = Some(p);

            let pivot = a[p][j];
            for r in 0..rows {
                if r == p || self.is_zero(a[r][j]) {
                    continue;
                }
                let ratio = self.div(a[r][j], pivot);
                for k in 0..cols {
                    if k == j {
                        continue;
                    }
                    if self.is_zero(a[p][k]) {
                        continue;
                    }
                    let t = self.mul(ratio, a[p][k]);
                    let updated = self.sub(a[r][k], t);
                    a[r][k] = self.simplify(updated, max_terms).expr;
                }
                let t = self.mul(ratio, rhs[p]);
                let updated = self.sub(rhs[r], t);
                rhs[r] = self.simplify(updated, max_terms).expr;
                a[r][j] = zero;
            }
        }

        let values = pivot_row
            .iter()
            .enumerate()
            .map(|(j, row)| row.map(|p| self.div(rhs[p], a[p][j])))
            .collect();
        let dropped_rows = (0..rows).filter(|&r| !used[r]).collect();

        Ok(LinearSolution {
            values,
            dropped_rows,
        })
    }

    fn choose_pivot(&self, a: &[Vec<ExprId>], used: &[bool], col: usize) -> Option<usize> {
        (0..a.len())
            .filter(|&r| !used[r] && !self.is_zero(a[r][col]))
            .min_by_key(|&r| {
                let entry = a[r][col];
                let non_constant = self.as_const(entry).is_none();
                (non_constant, self.size(entry), r)
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn solves_two_by_two_numeric_system() {
        let mut g = ExprGraph::new();
        let x = g.symbol("x");
        let y = g.symbol("y");
        // x + 2y - 5 = 0 ; 3x - y - 1 = 0  => x = 1, y = 2
        let two_y = g.scale(2.0, y);
        let m5 = g.constant(-5.0);
        let e1 = g.add_all([x, two_y, m5]);
        let three_x = g.scale(3.0, x);
        let ny = g.neg(y);
        let m1 = g.constant(-1.0);
        let e2 = g.add_all([three_x, ny, m1]);

        let sol = g.solve_linear(&[e1, e2], &[x, y], 1000).unwrap();
        let vx = sol.values[0].and_then(|v| g.as_const(v)).unwrap();
        let vy = sol.values[1].and_then(|v| g.as_const(v)).unwrap();
        assert!((vx - 1.0).abs() < 1e-12);
        assert!((vy - 2.0).abs() < 1e-12);
        assert!(sol.dropped_rows.is_empty());
    }

    #[test]
    fn symbolic_coefficient_divides_out() {
        let mut g = ExprGraph::new();
        let a = g.symbol("a");
        let m = g.symbol("m");
        let f = g.symbol("f");
        // m a - f = 0 => a = f / m
        let ma = g.mul(m, a);
        let e = g.sub(ma, f);
        let sol = g.solve_linear(&[e], &[a], 1000).unwrap();
        let expected = g.div(f, m);
        assert_eq!(sol.values[0], Some(expected));
    }

    #[test]
    fn missing_unknown_has_no_pivot() {
        let mut g = ExprGraph::new();
        let x = g.symbol("x");
        let y = g.symbol("y");
        let two = g.constant(2.0);
        let e1 = g.sub(x, two);
        let zero = g.zero();

        let sol = g.solve_linear(&[e1, zero], &[x, y], 1000).unwrap();
        assert_eq!(sol.values[0], Some(two));
        assert_eq!(sol.values[1], None);
        assert_eq!(sol.unsolved().collect::<Vec<_>>(), vec![1]);
        assert_eq!(sol.dropped_rows, vec![1]);
    }

    #[test]
    fn nonlinear_equation_is_rejected() {
        let mut g = ExprGraph::new();
        let x = g.symbol("x");
        let e = g.square(x);
        assert!(matches!(
            g.solve_linear(&[e], &[x], 1000),
            Err(SymbolicError::Nonlinear { equation: 0 })
        ));
    }
}
