//! Fixed-arity Poseidon hash.
//!
//! Matches circomlib's `Poseidon(N)` template: the state is
//! `[capacity, in_0, .., in_{N-1}]` with the capacity cell set to
//! [`DOMAIN_CAPACITY`], one permutation runs, and the digest is read from
//! [`OUTPUT_CELL`].

use super::{permute, PermutationState, PoseidonParameters};
use crate::error::{ErrorCode, OracleResult};
use crate::field::Fr;
use std::sync::Arc;

/// Initial value of the capacity cell.
pub const DOMAIN_CAPACITY: Fr = Fr::ZERO;

/// State cell holding the digest after the permutation.
pub const OUTPUT_CELL: usize = 0;

/// Poseidon hash of exactly `arity` field elements.
///
/// Cheap to clone: the parameter set is shared.
#[derive(Debug, Clone)]
pub struct PoseidonHash {
    params: Arc<PoseidonParameters>,
}

impl PoseidonHash {
    /// Hash instance over a loaded parameter set; arity is `width - 1`.
    pub fn new(params: Arc<PoseidonParameters>) -> Self {
        Self { params }
    }

    /// circomlib-compatible hash of `arity` inputs.
    pub fn circom(arity: usize) -> OracleResult<Self> {
        Ok(Self::new(Arc::new(PoseidonParameters::circom(arity)?)))
    }

    /// Number of inputs this instance accepts.
    pub fn arity(&self) -> usize {
        self.params.arity()
    }

    /// The parameter set in use.
    pub fn params(&self) -> &Arc<PoseidonParameters> {
        &self.params
    }

    /// Hash `inputs`. Fails with `ArityMismatch` unless exactly `arity`
    /// inputs are given; inputs are never padded or truncated.
    pub fn hash(&self, inputs: &[Fr]) -> OracleResult<Fr> {
        let state = self.initial_state(inputs)?;
        let state = permute(&self.params, state)?;
        let out = state.get(OUTPUT_CELL).ok_or_else(|| {
            ErrorCode::MalformedParameters("state has no output cell".to_string())
        })?;
        tracing::trace!(arity = self.arity(), output = %out, "poseidon hash");
        Ok(out)
    }

    /// Hash of two inputs (the circomlib `Poseidon(2)` case).
    pub fn hash_two(&self, a: Fr, b: Fr) -> OracleResult<Fr> {
        self.hash(&[a, b])
    }

    /// Sponge state before the permutation: capacity cell then inputs in
    /// positional order.
    pub fn initial_state(&self, inputs: &[Fr]) -> OracleResult<PermutationState> {
        if inputs.len() != self.arity() {
            return Err(ErrorCode::ArityMismatch {
                expected: self.arity(),
                got: inputs.len(),
            });
        }
        let mut cells = Vec::with_capacity(self.params.width());
        cells.push(DOMAIN_CAPACITY);
        cells.extend_from_slice(inputs);
        PermutationState::new(&self.params, cells)
    }
}
