//! Poseidon hash function (circomlib variant over BN254).
//!
//! - Parameters: t = N + 1, RF = 8, RP per circomlib's schedule (57 for t = 3)
//! - Rounds: RF/2 full, RP partial, RF/2 full
//! - S-box: x^5
//! - Constants: embedded table for t = 3, Grain LFSR derivation otherwise

mod grain;
mod hash;
mod params;
mod permute;

pub use grain::{generate as generate_grain_constants, GrainLfsr, FIELD_BITS};
pub use hash::{PoseidonHash, DOMAIN_CAPACITY, OUTPUT_CELL};
pub use params::{
    ConstantEncoding, ParamSource, ParamTable, PoseidonParameters, CIRCOM_FULL_ROUNDS,
    CIRCOM_MAX_ARITY, CIRCOM_PARTIAL_ROUNDS,
};
pub use permute::{permute, permute_with_trace, PermutationState};

// Include generated parameters
include!(concat!(env!("OUT_DIR"), "/params_generated.rs"));
