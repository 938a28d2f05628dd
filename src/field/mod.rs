//! BN254 scalar field (Fr) operations.
//!
//! This module provides the Fr type used throughout the oracle for field
//! arithmetic, Poseidon hashing and witness evaluation. The modulus is the
//! one circom compiles against:
//! p = 21888242871839275222246405745257275088548364400416034343698204186575808495617.

mod fr;

pub use fr::Fr;

// Include generated modulus constants
include!(concat!(env!("OUT_DIR"), "/modulus_generated.rs"));

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_modulus_reduces_to_zero() {
        assert_eq!(Fr::from_decimal(MODULUS_DECIMAL).unwrap(), Fr::ZERO);
        assert!(Fr::from_hex_be(MODULUS_HEX).is_err());
    }
}
