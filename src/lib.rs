//! Poseidon Oracle - reference Poseidon hash over BN254 and a witness
//! verification harness for circuits that implement it.
//!
//! The crate answers one question: does an arithmetic-circuit
//! implementation of circomlib's Poseidon produce the same result as a
//! direct computation, with a witness that satisfies its own constraints?
//!
//! # Architecture
//!
//! - [`field`] - BN254 scalar field arithmetic (Fr)
//! - [`poseidon`] - Parameter sets, permutation and fixed-arity hash
//! - [`r1cs`] - Witnesses, rank-1 constraints and snarkjs JSON interchange
//! - [`circuit`] - Evaluators producing witnesses (in-process or external)
//! - [`verifier`] - Validity, output and constraint checks on a witness
//! - [`conformance`] - Scenario oracle and test-vector corpus
//! - [`config`] - JSON configuration for oracle runs
//! - [`error`] - Error codes
//!
//! # Parameters
//!
//! The build.rs script generates the t = 3 constant table from
//! `params/poseidon_bn254_t3.json`; other circomlib widths are derived with
//! the Grain LFSR at load time.

// Verification code must report failures, not abort on them.
// Tests are checked separately with `cargo test`.
#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]
#![deny(clippy::panic)]
#![warn(missing_docs)]

pub mod circuit;
pub mod config;
pub mod conformance;
pub mod error;
pub mod field;
pub mod poseidon;
pub mod r1cs;
pub mod verifier;

// Re-export commonly used types
pub use circuit::{CircuitEvaluator, CommandEvaluator, Evaluation, InputAssignment, PoseidonCircuit};
pub use config::OracleConfig;
pub use conformance::{BatchResult, Scenario, TestOracle};
pub use error::{ErrorCode, OracleResult};
pub use field::Fr;
pub use poseidon::{PoseidonHash, PoseidonParameters};
pub use r1cs::{ConstraintSystem, Witness};
pub use verifier::{Check, CheckSet, VerificationReport, ViolationMode, WitnessVerifier};
