//! Poseidon permutation implementation.
//!
//! For circomlib's t = 3 set the permutation applies 65 rounds:
//! - 4 full rounds (all elements get S-box)
//! - 57 partial rounds (only first element gets S-box)
//! - 4 full rounds
//!
//! Each round consists of:
//! 1. Round constant addition
//! 2. S-box (x^5)
//! 3. MDS matrix multiplication

use super::PoseidonParameters;
use crate::error::{ErrorCode, OracleResult};
use crate::field::Fr;

/// State vector of one permutation run.
///
/// Owned by a single call; rounds mutate it in place and the caller reads
/// the output cell before dropping it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PermutationState {
    cells: Vec<Fr>,
}

impl PermutationState {
    /// Wrap `cells` as a state for `params`.
    pub fn new(params: &PoseidonParameters, cells: Vec<Fr>) -> OracleResult<Self> {
        if cells.len() != params.width() {
            return Err(ErrorCode::MalformedParameters(format!(
                "state has {} cells, parameter set width is {}",
                cells.len(),
                params.width()
            )));
        }
        Ok(Self { cells })
    }

    /// All-zero state.
    pub fn zero(params: &PoseidonParameters) -> Self {
        Self {
            cells: vec![Fr::ZERO; params.width()],
        }
    }

    /// Cell at `index`, if in range.
    pub fn get(&self, index: usize) -> Option<Fr> {
        self.cells.get(index).copied()
    }

    /// All cells.
    pub fn cells(&self) -> &[Fr] {
        &self.cells
    }

    /// Consume the state and return its cells.
    pub fn into_cells(self) -> Vec<Fr> {
        self.cells
    }
}

/// Add round constants to state.
fn add_round_constants(params: &PoseidonParameters, state: &mut [Fr], round: usize) {
    for (cell, &c) in state.iter_mut().zip(params.round_constants(round)) {
        *cell = *cell + c;
    }
}

/// S-box on every cell in full rounds, on cell 0 only in partial rounds.
fn apply_sbox(params: &PoseidonParameters, state: &mut [Fr], round: usize) {
    if params.is_full_round(round) {
        for cell in state.iter_mut() {
            *cell = cell.pow5();
        }
    } else {
        state[0] = state[0].pow5();
    }
}

/// Apply MDS matrix multiplication: state' = MDS * state
fn apply_mds(params: &PoseidonParameters, state: &mut [Fr]) {
    let mixed: Vec<Fr> = params
        .mds()
        .iter()
        .map(|row| row.iter().zip(state.iter()).map(|(&m, &s)| m * s).sum())
        .collect();
    state.copy_from_slice(&mixed);
}

fn round(params: &PoseidonParameters, state: &mut [Fr], round: usize) {
    add_round_constants(params, state, round);
    apply_sbox(params, state, round);
    apply_mds(params, state);
}

fn check_width(params: &PoseidonParameters, state: &PermutationState) -> OracleResult<()> {
    if state.cells.len() != params.width() {
        return Err(ErrorCode::MalformedParameters(format!(
            "state has {} cells, parameter set width is {}",
            state.cells.len(),
            params.width()
        )));
    }
    Ok(())
}

/// Complete Poseidon permutation.
///
/// Runs RF/2 full rounds, RP partial rounds, then RF/2 full rounds.
pub fn permute(
    params: &PoseidonParameters,
    mut state: PermutationState,
) -> OracleResult<PermutationState> {
    check_width(params, &state)?;
    for r in 0..params.total_rounds() {
        round(params, &mut state.cells, r);
    }
    Ok(state)
}

/// Poseidon permutation that also returns the state after every round, for
/// localising where two implementations diverge.
pub fn permute_with_trace(
    params: &PoseidonParameters,
    mut state: PermutationState,
) -> OracleResult<(PermutationState, Vec<Vec<Fr>>)> {
    check_width(params, &state)?;
    let mut traces = Vec::with_capacity(params.total_rounds());
    for r in 0..params.total_rounds() {
        round(params, &mut state.cells, r);
        traces.push(state.cells.clone());
    }
    Ok((state, traces))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn params() -> PoseidonParameters {
        PoseidonParameters::circom_t3().unwrap()
    }

    #[test]
    fn test_permute_deterministic() {
        let p = params();
        let cells = vec![Fr::ZERO, Fr::ONE, Fr::from_u64(2)];
        let a = permute(&p, PermutationState::new(&p, cells.clone()).unwrap()).unwrap();
        let b = permute(&p, PermutationState::new(&p, cells).unwrap()).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_permute_with_trace_length() {
        let p = params();
        let (last, traces) = permute_with_trace(&p, PermutationState::zero(&p)).unwrap();
        assert_eq!(traces.len(), p.total_rounds());
        assert_eq!(traces.last().map(Vec::as_slice), Some(last.cells()));
    }

    #[test]
    fn test_trace_matches_plain_permutation() {
        let p = params();
        let plain = permute(&p, PermutationState::zero(&p)).unwrap();
        let (traced, _) = permute_with_trace(&p, PermutationState::zero(&p)).unwrap();
        assert_eq!(plain, traced);
    }

    #[test]
    fn test_wrong_width_rejected() {
        let p = params();
        assert!(PermutationState::new(&p, vec![Fr::ZERO; 2]).is_err());
    }

    #[test]
    fn test_first_round_by_hand() {
        // Round 0 on the zero state: ARK gives the constants, then x^5 on
        // every cell, then MDS.
        let p = params();
        let (_, traces) = permute_with_trace(&p, PermutationState::zero(&p)).unwrap();
        let after_sbox: Vec<Fr> = p.round_constants(0).iter().map(Fr::pow5).collect();
        let expected: Vec<Fr> = p
            .mds()
            .iter()
            .map(|row| row.iter().zip(&after_sbox).map(|(&m, &s)| m * s).sum())
            .collect();
        assert_eq!(traces[0], expected);
    }
}
