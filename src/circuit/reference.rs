//! In-process synthesis of circomlib's `Poseidon(N)` circuit.
//!
//! Signal layout follows the circom compiler: `0` is the constant one,
//! `1` the output, `2..2+N` the inputs, then intermediates in allocation
//! order. Each S-box costs three multiplication constraints
//! (`x*x = x2`, `x2*x2 = x4`, `x4*x = y`); round constants and MDS mixing
//! stay linear and are folded into the next constraint.

use super::{CircuitEvaluator, Evaluation, InputAssignment};
use crate::error::{ErrorCode, OracleResult};
use crate::field::Fr;
use crate::poseidon::PoseidonParameters;
use crate::r1cs::{
    Constraint, ConstraintSystem, LinearCombination, Witness, OUTPUT_SLOT, VALIDITY_SLOT,
};
use std::sync::Arc;

/// First input signal.
const FIRST_INPUT: usize = 2;

/// State cell during synthesis: its linear form over allocated signals and
/// the concrete value that form takes for the current inputs.
#[derive(Debug, Clone)]
struct Cell {
    lc: LinearCombination,
    value: Fr,
}

/// Signal allocator that records constraints and witness values together.
struct Synthesizer {
    values: Vec<Fr>,
    constraints: Vec<Constraint>,
}

impl Synthesizer {
    fn new(inputs: &[Fr]) -> Self {
        let mut values = Vec::with_capacity(FIRST_INPUT + inputs.len());
        values.push(Fr::ONE);
        // Output is assigned once the permutation has run.
        values.push(Fr::ZERO);
        values.extend_from_slice(inputs);
        Self {
            values,
            constraints: Vec::new(),
        }
    }

    fn alloc(&mut self, value: Fr) -> usize {
        self.values.push(value);
        self.values.len() - 1
    }

    /// Allocate `a * b` and constrain it.
    fn mul(&mut self, a: &Cell, b: &Cell) -> Cell {
        let value = a.value * b.value;
        let signal = self.alloc(value);
        let lc = LinearCombination::signal(signal);
        self.constraints
            .push(Constraint::new(a.lc.clone(), b.lc.clone(), lc.clone()));
        Cell { lc, value }
    }

    fn sbox(&mut self, x: &Cell) -> Cell {
        let x2 = self.mul(x, x);
        let x4 = self.mul(&x2, &x2);
        self.mul(&x4, x)
    }
}

fn add_round_constants(state: &mut [Cell], constants: &[Fr]) {
    for (cell, &c) in state.iter_mut().zip(constants) {
        cell.lc.add_term(VALIDITY_SLOT, c);
        cell.value = cell.value + c;
    }
}

fn mix(state: &[Cell], mds: &[Vec<Fr>]) -> Vec<Cell> {
    mds.iter()
        .map(|row| {
            let mut lc = LinearCombination::zero();
            let mut value = Fr::ZERO;
            for (cell, &m) in state.iter().zip(row) {
                lc.add_scaled(&cell.lc, m);
                value = value + cell.value * m;
            }
            Cell { lc, value }
        })
        .collect()
}

/// Run the constrained permutation. `inputs.len()` must equal the arity.
fn synthesize(params: &PoseidonParameters, inputs: &[Fr]) -> (Witness, ConstraintSystem) {
    let mut synth = Synthesizer::new(inputs);

    let mut state: Vec<Cell> = Vec::with_capacity(params.width());
    state.push(Cell {
        lc: LinearCombination::zero(),
        value: Fr::ZERO,
    });
    state.extend(inputs.iter().enumerate().map(|(i, &value)| Cell {
        lc: LinearCombination::signal(FIRST_INPUT + i),
        value,
    }));

    for round in 0..params.total_rounds() {
        add_round_constants(&mut state, params.round_constants(round));
        let sboxed = if params.is_full_round(round) {
            state.len()
        } else {
            1
        };
        for cell in state.iter_mut().take(sboxed) {
            *cell = synth.sbox(cell);
        }
        state = mix(&state, params.mds());
    }

    // out <== state[0]
    let digest = &state[0];
    synth.values[OUTPUT_SLOT] = digest.value;
    synth.constraints.push(Constraint::new(
        digest.lc.clone(),
        LinearCombination::signal(VALIDITY_SLOT),
        LinearCombination::signal(OUTPUT_SLOT),
    ));

    let num_signals = synth.values.len();
    (
        Witness::new(synth.values),
        ConstraintSystem::new(synth.constraints).with_num_signals(num_signals),
    )
}

/// Reference evaluator for the Poseidon circuit.
///
/// The constraint system depends only on the parameter set, so it is
/// synthesized once and shared by every evaluation.
#[derive(Debug, Clone)]
pub struct PoseidonCircuit {
    params: Arc<PoseidonParameters>,
    constraints: Arc<ConstraintSystem>,
}

impl PoseidonCircuit {
    /// Circuit over `params`.
    pub fn new(params: Arc<PoseidonParameters>) -> Self {
        let zeros = vec![Fr::ZERO; params.arity()];
        let (_, constraints) = synthesize(&params, &zeros);
        Self {
            params,
            constraints: Arc::new(constraints),
        }
    }

    /// circomlib `Poseidon(arity)`.
    pub fn circom(arity: usize) -> OracleResult<Self> {
        Ok(Self::new(Arc::new(PoseidonParameters::circom(arity)?)))
    }

    /// Number of inputs.
    pub fn arity(&self) -> usize {
        self.params.arity()
    }

    /// The circuit's constraints.
    pub fn constraint_system(&self) -> &Arc<ConstraintSystem> {
        &self.constraints
    }

    /// Compute the witness for `inputs`.
    pub fn witness(&self, inputs: &[Fr]) -> OracleResult<Witness> {
        if inputs.len() != self.arity() {
            return Err(ErrorCode::ArityMismatch {
                expected: self.arity(),
                got: inputs.len(),
            });
        }
        let (witness, _) = synthesize(&self.params, inputs);
        Ok(witness)
    }
}

impl CircuitEvaluator for PoseidonCircuit {
    fn evaluate(&self, input: &InputAssignment) -> OracleResult<Evaluation> {
        let witness = self.witness(&input.values)?;
        tracing::debug!(
            evaluator = self.name(),
            signals = witness.len(),
            "synthesized witness"
        );
        Ok(Evaluation {
            witness,
            constraints: Arc::clone(&self.constraints),
        })
    }

    fn name(&self) -> &str {
        "reference"
    }
}
