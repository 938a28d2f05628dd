//! Witness and rank-1 constraint types.

use crate::error::{ErrorCode, OracleResult};
use crate::field::Fr;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Witness slot holding the constant-one signal. Circuits built by circom
/// always place it first, which is what makes it usable as a validity flag.
pub const VALIDITY_SLOT: usize = 0;

/// Witness slot holding the circuit's (single) output signal.
pub const OUTPUT_SLOT: usize = 1;

/// Full assignment of field values to circuit signals, indexed by signal id.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Witness(Vec<Fr>);

impl Witness {
    /// Wrap signal values.
    pub fn new(values: Vec<Fr>) -> Self {
        Self(values)
    }

    /// Value of signal `index`.
    pub fn get(&self, index: usize) -> Option<Fr> {
        self.0.get(index).copied()
    }

    /// Value of signal `index`, or `WitnessTooShort`.
    pub fn slot(&self, index: usize) -> OracleResult<Fr> {
        self.get(index).ok_or(ErrorCode::WitnessTooShort {
            needed: index + 1,
            len: self.0.len(),
        })
    }

    /// Number of signals.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// True if the witness has no signals.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// All signal values.
    pub fn as_slice(&self) -> &[Fr] {
        &self.0
    }

    /// Overwrite one signal. Used to build tampered witnesses in tests and
    /// fault-injection runs.
    pub fn set(&mut self, index: usize, value: Fr) -> OracleResult<()> {
        let len = self.0.len();
        let slot = self.0.get_mut(index).ok_or(ErrorCode::WitnessTooShort {
            needed: index + 1,
            len,
        })?;
        *slot = value;
        Ok(())
    }
}

impl From<Vec<Fr>> for Witness {
    fn from(values: Vec<Fr>) -> Self {
        Self(values)
    }
}

/// Sparse linear combination `sum(coeff_i * w[signal_i])`.
///
/// Zero coefficients are never stored.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct LinearCombination {
    terms: BTreeMap<usize, Fr>,
}

impl LinearCombination {
    /// The empty combination (evaluates to zero).
    pub fn zero() -> Self {
        Self::default()
    }

    /// `1 * w[signal]`.
    pub fn signal(signal: usize) -> Self {
        let mut lc = Self::zero();
        lc.add_term(signal, Fr::ONE);
        lc
    }

    /// A constant, expressed against the constant-one signal.
    pub fn constant(value: Fr) -> Self {
        let mut lc = Self::zero();
        lc.add_term(VALIDITY_SLOT, value);
        lc
    }

    /// Build from `(signal, coefficient)` pairs; repeated signals are summed.
    pub fn from_terms<I: IntoIterator<Item = (usize, Fr)>>(terms: I) -> Self {
        let mut lc = Self::zero();
        for (signal, coeff) in terms {
            lc.add_term(signal, coeff);
        }
        lc
    }

    /// Add `coeff * w[signal]`.
    pub fn add_term(&mut self, signal: usize, coeff: Fr) {
        let entry = self.terms.entry(signal).or_insert(Fr::ZERO);
        *entry = *entry + coeff;
        if entry.is_zero() {
            self.terms.remove(&signal);
        }
    }

    /// Add `scale * other` to this combination.
    pub fn add_scaled(&mut self, other: &LinearCombination, scale: Fr) {
        for (&signal, &coeff) in &other.terms {
            self.add_term(signal, coeff * scale);
        }
    }

    /// Iterate `(signal, coefficient)` in signal order.
    pub fn terms(&self) -> impl Iterator<Item = (usize, Fr)> + '_ {
        self.terms.iter().map(|(&s, &c)| (s, c))
    }

    /// Number of non-zero terms.
    pub fn len(&self) -> usize {
        self.terms.len()
    }

    /// True if no terms are present.
    pub fn is_empty(&self) -> bool {
        self.terms.is_empty()
    }

    /// Highest referenced signal.
    pub fn max_signal(&self) -> Option<usize> {
        self.terms.keys().next_back().copied()
    }

    /// Evaluate against a witness. Returns the first out-of-range signal on
    /// failure.
    pub fn evaluate(&self, witness: &Witness) -> Result<Fr, usize> {
        self.terms
            .iter()
            .map(|(&signal, &coeff)| witness.get(signal).map(|v| v * coeff).ok_or(signal))
            .sum()
    }
}

/// One rank-1 constraint `(A.w) * (B.w) = C.w`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Constraint {
    /// Left factor.
    pub a: LinearCombination,
    /// Right factor.
    pub b: LinearCombination,
    /// Product.
    pub c: LinearCombination,
}

impl Constraint {
    /// Build a constraint.
    pub fn new(a: LinearCombination, b: LinearCombination, c: LinearCombination) -> Self {
        Self { a, b, c }
    }

    /// Check the constraint. `index` is only used for error context.
    pub fn is_satisfied(&self, witness: &Witness, index: usize) -> OracleResult<bool> {
        let eval = |lc: &LinearCombination| {
            lc.evaluate(witness)
                .map_err(|signal| ErrorCode::SignalOutOfRange {
                    constraint: index,
                    signal,
                })
        };
        Ok(eval(&self.a)? * eval(&self.b)? == eval(&self.c)?)
    }
}

/// Immutable set of rank-1 constraints for one circuit.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ConstraintSystem {
    constraints: Vec<Constraint>,
    num_signals: Option<usize>,
}

impl ConstraintSystem {
    /// Wrap a list of constraints.
    pub fn new(constraints: Vec<Constraint>) -> Self {
        Self {
            constraints,
            num_signals: None,
        }
    }

    /// Record the declared signal count (as exported by the compiler).
    pub fn with_num_signals(mut self, num_signals: usize) -> Self {
        self.num_signals = Some(num_signals);
        self
    }

    /// Declared signal count, if known.
    pub fn num_signals(&self) -> Option<usize> {
        self.num_signals
    }

    /// All constraints in order.
    pub fn constraints(&self) -> &[Constraint] {
        &self.constraints
    }

    /// Number of constraints.
    pub fn len(&self) -> usize {
        self.constraints.len()
    }

    /// True if the system has no constraints.
    pub fn is_empty(&self) -> bool {
        self.constraints.is_empty()
    }

    /// Satisfaction predicate over the full witness.
    pub fn is_satisfied(&self, witness: &Witness) -> OracleResult<bool> {
        for (index, constraint) in self.constraints.iter().enumerate() {
            if !constraint.is_satisfied(witness, index)? {
                return Ok(false);
            }
        }
        Ok(true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn w(values: &[u64]) -> Witness {
        Witness::new(values.iter().map(|&v| Fr::from_u64(v)).collect())
    }

    #[test]
    fn test_lc_merges_and_drops_zero() {
        let mut lc = LinearCombination::from_terms([(2, Fr::from_u64(3)), (2, Fr::from_u64(4))]);
        assert_eq!(lc.terms().collect::<Vec<_>>(), vec![(2, Fr::from_u64(7))]);
        lc.add_term(2, -Fr::from_u64(7));
        assert!(lc.is_empty());
    }

    #[test]
    fn test_lc_evaluate() {
        let lc = LinearCombination::from_terms([(0, Fr::from_u64(5)), (2, Fr::from_u64(2))]);
        assert_eq!(lc.evaluate(&w(&[1, 9, 10])), Ok(Fr::from_u64(25)));
        assert_eq!(lc.evaluate(&w(&[1])), Err(2));
    }

    #[test]
    fn test_constraint_satisfaction() {
        // w2 * w2 = w3
        let c = Constraint::new(
            LinearCombination::signal(2),
            LinearCombination::signal(2),
            LinearCombination::signal(3),
        );
        assert!(c.is_satisfied(&w(&[1, 0, 4, 16]), 0).unwrap());
        assert!(!c.is_satisfied(&w(&[1, 0, 4, 15]), 0).unwrap());
        assert_eq!(
            c.is_satisfied(&w(&[1, 0, 4]), 7),
            Err(ErrorCode::SignalOutOfRange {
                constraint: 7,
                signal: 3
            })
        );
    }

    #[test]
    fn test_witness_slots() {
        let mut witness = w(&[1, 2]);
        assert_eq!(witness.slot(OUTPUT_SLOT), Ok(Fr::from_u64(2)));
        assert!(witness.slot(5).is_err());
        witness.set(VALIDITY_SLOT, Fr::ZERO).unwrap();
        assert_eq!(witness.get(VALIDITY_SLOT), Some(Fr::ZERO));
        assert!(witness.set(9, Fr::ONE).is_err());
    }
}
