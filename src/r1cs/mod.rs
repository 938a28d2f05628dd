//! Rank-1 constraint systems and witnesses.
//!
//! The oracle never solves constraints; it only evaluates a fixed circuit's
//! constraints against a witness produced elsewhere.

mod snarkjs;
mod types;

pub use types::{
    Constraint, ConstraintSystem, LinearCombination, Witness, OUTPUT_SLOT, VALIDITY_SLOT,
};
