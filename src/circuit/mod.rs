//! Circuit evaluators.
//!
//! An evaluator turns an input assignment into a witness plus the constraint
//! system that witness is meant to satisfy. The oracle treats evaluation as
//! an opaque, blocking, fallible call.

mod command;
mod reference;

pub use command::CommandEvaluator;
pub use reference::PoseidonCircuit;

use crate::error::OracleResult;
use crate::field::Fr;
use crate::r1cs::{ConstraintSystem, Witness};
use serde_json::json;
use std::sync::Arc;

/// Input signal name used by the Poseidon test circuit.
pub const DEFAULT_INPUT_NAME: &str = "inputs";

/// Named input assignment: one array-valued input signal.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InputAssignment {
    /// Declared input signal name.
    pub name: String,
    /// Values in positional order.
    pub values: Vec<Fr>,
}

impl InputAssignment {
    /// Assignment to the default `inputs` signal.
    pub fn new(values: Vec<Fr>) -> Self {
        Self {
            name: DEFAULT_INPUT_NAME.to_string(),
            values,
        }
    }

    /// Assignment to a named signal.
    pub fn named(name: &str, values: Vec<Fr>) -> Self {
        Self {
            name: name.to_string(),
            values,
        }
    }

    /// circom input JSON, e.g. `{"inputs": ["7777777", "1"]}`.
    pub fn to_json(&self) -> String {
        let values: Vec<String> = self.values.iter().map(Fr::to_decimal).collect();
        let mut object = serde_json::Map::new();
        object.insert(self.name.clone(), json!(values));
        serde_json::Value::Object(object).to_string()
    }
}

/// Result of one circuit evaluation.
#[derive(Debug, Clone)]
pub struct Evaluation {
    /// Signal values for this input.
    pub witness: Witness,
    /// Constraints of the evaluated circuit (shared across evaluations).
    pub constraints: Arc<ConstraintSystem>,
}

/// Trait for anything that can evaluate the circuit under test.
///
/// Evaluators are shared read-only between scenarios, possibly across
/// threads.
pub trait CircuitEvaluator: Send + Sync {
    /// Produce a witness and constraint system for `input`.
    fn evaluate(&self, input: &InputAssignment) -> OracleResult<Evaluation>;

    /// Get the evaluator name for reporting.
    fn name(&self) -> &str;
}
