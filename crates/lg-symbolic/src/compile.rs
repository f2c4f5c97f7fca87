//! Compilation of expressions into flat numeric tapes.
//!
//! A tape is a topologically ordered list of instructions, one per distinct
//! reachable node, so subexpressions shared between outputs are evaluated once.

use std::collections::HashMap;

use crate::error::{SymbolicError, SymbolicResult};
use crate::expr::{ExprGraph, ExprId, Node};

/// Integer exponents up to this magnitude are evaluated with `powi`.
const MAX_POWI: f64 = 64.0;

#[derive(Clone, Debug, PartialEq)]
enum Instr {
    Const(f64),
    Input(usize),
    Add(Vec<usize>),
    Mul(Vec<usize>),
    PowI(usize, i32),
    Powf(usize, f64),
    Pow(usize, usize),
    Sin(usize),
    Cos(usize),
    Exp(usize),
    Ln(usize),
}

/// A compiled multi-output function of a fixed input vector.
#[derive(Clone, Debug)]
pub struct CompiledFn {
    tape: Vec<Instr>,
    outputs: Vec<usize>,
    n_inputs: usize,
}

impl CompiledFn {
    pub fn n_inputs(&self) -> usize {
        self.n_inputs
    }

    pub fn n_outputs(&self) -> usize {
        self.outputs.len()
    }

    /// Number of tape instructions.
    pub fn len(&self) -> usize {
        self.tape.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tape.is_empty()
    }

    /// Evaluate into `out`, reusing `scratch` for the tape registers.
    pub fn eval_into(
        &self,
        inputs: &[f64],
        scratch: &mut Vec<f64>,
        out: &mut [f64],
    ) -> SymbolicResult<()> {
        if inputs.len() != self.n_inputs {
            return Err(SymbolicError::InputLength {
                expected: self.n_inputs,
                actual: inputs.len(),
            });
        }
        if out.len() != self.outputs.len() {
            return Err(SymbolicError::OutputLength {
                expected: self.outputs.len(),
                actual: out.len(),
            });
        }

        scratch.clear();
        scratch.reserve(self.tape.len());
        for instr in &self.tape {
            let v = match instr {
                Instr::Const(c) => *c,
                Instr::Input(i) => inputs[*i],
                Instr::Add(args) => args.iter().map(|&a| scratch[a]).sum(),
                Instr::Mul(args) => args.iter().map(|&a| scratch[a]).product(),
                Instr::PowI(b, k) => scratch[*b].powi(*k),
                Instr::Powf(b, k) => scratch[*b].powf(*k),
                Instr::Pow(b, e) => scratch[*b].powf(scratch[*e]),
                Instr::Sin(u) => scratch[*u].sin(),
                Instr::Cos(u) => scratch[*u].cos(),
                Instr::Exp(u) => scratch[*u].exp(),
                Instr::Ln(u) => scratch[*u].ln(),
            };
            scratch.push(v);
        }

        for (o, &slot) in out.iter_mut().zip(&self.outputs) {
            *o = scratch[slot];
        }
        Ok(())
    }

    /// Allocating convenience wrapper around [`CompiledFn::eval_into`].
    pub fn eval(&self, inputs: &[f64]) -> SymbolicResult<Vec<f64>> {
        let mut scratch = Vec::with_capacity(self.tape.len());
        let mut out = vec![0.0; self.outputs.len()];
        self.eval_into(inputs, &mut scratch, &mut out)?;
        Ok(out)
    }
}

struct TapeBuilder<'a> {
    inputs: &'a HashMap<ExprId, usize>,
    slots: HashMap<ExprId, usize>,
    tape: Vec<Instr>,
}

impl TapeBuilder<'_> {
    fn push(&mut self, expr: ExprId, instr: Instr) -> usize {
        let slot = self.tape.len();
        self.tape.push(instr);
        self.slots.insert(expr, slot);
        slot
    }
}

impl ExprGraph {
    /// Compile `outputs` into a tape whose input vector is bound to `inputs`
    /// (atoms, in order).
    ///
    /// Fails with [`SymbolicError::UnboundAtom`] when an output depends on an
    /// atom missing from `inputs`.
    pub fn compile(&self, outputs: &[ExprId], inputs: &[ExprId]) -> SymbolicResult<CompiledFn> {
        let input_slots: HashMap<ExprId, usize> =
            inputs.iter().enumerate().map(|(i, &a)| (a, i)).collect();
        let mut builder = TapeBuilder {
            inputs: &input_slots,
            slots: HashMap::new(),
            tape: Vec::new(),
        };
        let outputs = outputs
            .iter()
            .map(|&o| self.emit(o, &mut builder))
            .collect::<SymbolicResult<Vec<_>>>()?;

        Ok(CompiledFn {
            tape: builder.tape,
            outputs,
            n_inputs: inputs.len(),
        })
    }

    fn emit(&self, expr: ExprId, b: &mut TapeBuilder<'_>) -> SymbolicResult<usize> {
        if let Some(&slot) = b.slots.get(&expr) {
            return Ok(slot);
        }
        let instr = match self.node(expr) {
            Node::Const(c) => {
                let value = c.value();
                if !value.is_finite() {
                    return Err(SymbolicError::NonFiniteConstant { value });
                }
                Instr::Const(value)
            }
            Node::Time | Node::Symbol(_) | Node::Coord { .. } => match b.inputs.get(&expr) {
                Some(&i) => Instr::Input(i),
                None => {
                    return Err(SymbolicError::UnboundAtom {
                        name: self.atom_name(expr),
                    });
                }
            },
            Node::Add(terms) => Instr::Add(self.emit_all(terms, b)?),
            Node::Mul(factors) => Instr::Mul(self.emit_all(factors, b)?),
            Node::Pow(base, exponent) => {
                let base_slot = self.emit(*base, b)?;
                match self.as_const(*exponent) {
                    Some(k) if k.fract() == 0.0 && k.abs() <= MAX_POWI => {
                        Instr::PowI(base_slot, k as i32)
                    }
                    Some(k) if k.is_finite() => Instr::Powf(base_slot, k),
                    _ => Instr::Pow(base_slot, self.emit(*exponent, b)?),
                }
            }
            Node::Sin(u) => Instr::Sin(self.emit(*u, b)?),
            Node::Cos(u) => Instr::Cos(self.emit(*u, b)?),
            Node::Exp(u) => Instr::Exp(self.emit(*u, b)?),
            Node::Ln(u) => Instr::Ln(self.emit(*u, b)?),
        };
        Ok(b.push(expr, instr))
    }

    fn emit_all(&self, items: &[ExprId], b: &mut TapeBuilder<'_>) -> SymbolicResult<Vec<usize>> {
        items.iter().map(|&i| self.emit(i, b)).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn shared_subexpressions_are_emitted_once() {
        let mut g = ExprGraph::new();
        let x = g.symbol("x");
        let s = g.sin(x);
        let a = g.scale(2.0, s);
        let b = g.add(s, x);
        let f = g.compile(&[a, b], &[x]).unwrap();

        // x, sin x, 2, 2 sin x, sin x + x
        assert_eq!(f.len(), 5);
        let out = f.eval(&[0.5]).unwrap();
        assert!((out[0] - 2.0 * 0.5f64.sin()).abs() < 1e-15);
        assert!((out[1] - (0.5f64.sin() + 0.5)).abs() < 1e-15);
    }

    #[test]
    fn unbound_atom_fails() {
        let mut g = ExprGraph::new();
        let x = g.symbol("x");
        let q = g.coord(0, 0);
        let e = g.mul(x, q);
        assert!(matches!(
            g.compile(&[e], &[x]),
            Err(SymbolicError::UnboundAtom { .. })
        ));
    }

    #[test]
    fn non_finite_constant_fails() {
        let mut g = ExprGraph::new();
        let x = g.symbol("x");
        let inf = g.constant(f64::INFINITY);
        let e = g.add(x, inf);
        assert!(matches!(
            g.compile(&[e], &[x]),
            Err(SymbolicError::NonFiniteConstant { .. })
        ));
    }

    #[test]
    fn length_checks() {
        let mut g = ExprGraph::new();
        let x = g.symbol("x");
        let f = g.compile(&[x], &[x]).unwrap();
        assert!(matches!(
            f.eval(&[1.0, 2.0]),
            Err(SymbolicError::InputLength { expected: 1, actual: 2 })
        ));
        let mut scratch = Vec::new();
        let mut out = [0.0; 2];
        assert!(matches!(
            f.eval_into(&[1.0], &mut scratch, &mut out),
            Err(SymbolicError::OutputLength { .. })
        ));
    }

    #[test]
    fn constant_output_needs_no_inputs() {
        let mut g = ExprGraph::new();
        let c = g.constant(3.5);
        let f = g.compile(&[c], &[]).unwrap();
        assert_eq!(f.eval(&[]).unwrap(), vec![3.5]);
    }
}
