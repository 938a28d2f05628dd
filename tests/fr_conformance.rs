//! Fr field conformance tests.
//!
//! Checks the BN254 scalar field wrapper against values computed with
//! arbitrary-precision integers.

use poseidon_oracle::error::ErrorCode;
use poseidon_oracle::field::{MODULUS_DECIMAL, MODULUS_HEX};
use poseidon_oracle::Fr;
use proptest::prelude::*;

const P_PLUS_ONE: &str =
    "21888242871839275222246405745257275088548364400416034343698204186575808495618";
const TWO_P: &str =
    "43776485743678550444492811490514550177096728800832068687396408373151616991234";
const TWO_P_PLUS_FIVE: &str =
    "43776485743678550444492811490514550177096728800832068687396408373151616991239";
const P_MINUS_ONE: &str =
    "21888242871839275222246405745257275088548364400416034343698204186575808495616";

// =============================================================================
// Reduction
// =============================================================================

#[test]
fn reduction_boundaries() {
    assert_eq!(Fr::from_decimal(MODULUS_DECIMAL).unwrap(), Fr::ZERO);
    assert_eq!(Fr::from_decimal(P_PLUS_ONE).unwrap(), Fr::ONE);
    assert_eq!(Fr::from_decimal(TWO_P).unwrap(), Fr::ZERO);
    assert_eq!(Fr::from_decimal(TWO_P_PLUS_FIVE).unwrap(), Fr::from_u64(5));
    assert_eq!(Fr::from_decimal(P_MINUS_ONE).unwrap().to_decimal(), P_MINUS_ONE);
}

#[test]
fn reduction_of_u256_max() {
    let max = "115792089237316195423570985008687907853269984665640564039457584007913129639935";
    assert_eq!(
        Fr::from_decimal(max).unwrap().to_decimal(),
        "6350874878119819312338956282401532410528162663560392320966563075034087161850"
    );
    assert_eq!(
        Fr::from_be_bytes_mod_order(&[0xff; 32]),
        Fr::from_decimal(max).unwrap()
    );
}

#[test]
fn negative_decimal_is_additive_inverse() {
    assert_eq!(Fr::from_decimal("-1").unwrap().to_decimal(), P_MINUS_ONE);
    assert_eq!(Fr::from_decimal("-0").unwrap(), Fr::ZERO);
}

#[test]
fn invalid_decimal_rejected() {
    for bad in ["", "-", "12a", "1 2", "0x10"] {
        assert!(
            matches!(Fr::from_decimal(bad), Err(ErrorCode::InvalidDecimal(_))),
            "accepted {:?}",
            bad
        );
    }
}

// =============================================================================
// Encoding
// =============================================================================

#[test]
fn canonical_le_encoding() {
    let mut one = [0u8; 32];
    one[0] = 1;
    assert_eq!(Fr::ONE.to_bytes_le(), one);
    assert_eq!(Fr::from_bytes_le(&one).unwrap(), Fr::ONE);
    assert_eq!(Fr::ZERO.to_bytes_le(), [0u8; 32]);
}

#[test]
fn non_canonical_bytes_rejected() {
    let mut p_le = hex::decode(MODULUS_HEX).unwrap();
    p_le.reverse();
    let bytes: [u8; 32] = p_le.try_into().unwrap();
    assert!(matches!(
        Fr::from_bytes_le(&bytes),
        Err(ErrorCode::NonCanonicalFr(_))
    ));
    assert!(matches!(
        Fr::from_bytes_le(&[0xff; 32]),
        Err(ErrorCode::NonCanonicalFr(_))
    ));
}

#[test]
fn hex_be_encoding() {
    assert_eq!(
        Fr::from_u64(255).to_hex_be(),
        "00000000000000000000000000000000000000000000000000000000000000ff"
    );
    assert_eq!(Fr::from_hex_be("0xff").unwrap(), Fr::from_u64(255));
    assert_eq!("0x10".parse::<Fr>().unwrap(), Fr::from_u64(16));
    assert!(matches!(
        Fr::from_hex_be(MODULUS_HEX),
        Err(ErrorCode::NonCanonicalFr(_))
    ));
    assert!(matches!(Fr::from_hex_be("0xzz"), Err(ErrorCode::InvalidHex(_))));
    assert!(matches!(
        Fr::from_hex_be(&"1".repeat(65)),
        Err(ErrorCode::WrongLength { .. })
    ));
}

#[test]
fn serde_as_decimal_string() {
    let x = Fr::from_u64(7_777_777);
    assert_eq!(serde_json::to_string(&x).unwrap(), "\"7777777\"");
    let back: Fr = serde_json::from_str("\"7777777\"").unwrap();
    assert_eq!(back, x);
    let number: Fr = serde_json::from_str("42").unwrap();
    assert_eq!(number, Fr::from_u64(42));
}

// =============================================================================
// Arithmetic
// =============================================================================

#[test]
fn inverse_of_zero_fails() {
    assert_eq!(Fr::ZERO.inverse(), Err(ErrorCode::DivisionByZero));
    assert_eq!(
        Fr::from_decimal(MODULUS_DECIMAL).unwrap().inverse(),
        Err(ErrorCode::DivisionByZero)
    );
}

#[test]
fn known_inverses() {
    assert_eq!(
        Fr::from_u64(7).inverse().unwrap().to_decimal(),
        "3126891838834182174606629392179610726935480628630862049099743455225115499374"
    );
    assert_eq!(
        Fr::from_u64(2).inverse().unwrap().to_decimal(),
        "10944121435919637611123202872628637544274182200208017171849102093287904247809"
    );
    assert_eq!((-Fr::ONE).inverse().unwrap(), -Fr::ONE);
}

#[test]
fn wraparound() {
    let p_minus_one = Fr::from_decimal(P_MINUS_ONE).unwrap();
    assert_eq!(p_minus_one + Fr::ONE, Fr::ZERO);
    assert_eq!(Fr::ZERO - Fr::ONE, p_minus_one);
    assert_eq!(p_minus_one * p_minus_one, Fr::ONE);
}

#[test]
fn pow5_matches_repeated_multiplication() {
    let x = Fr::from_u64(123_456_789);
    assert_eq!(x.pow5(), x * x * x * x * x);
    assert_eq!(x.pow(5), x.pow5());
    assert_eq!(x.square(), x * x);
}

fn arb_fr() -> impl Strategy<Value = Fr> {
    prop::array::uniform32(any::<u8>()).prop_map(|bytes| Fr::from_be_bytes_mod_order(&bytes))
}

proptest! {
    #[test]
    fn prop_inverse(x in arb_fr()) {
        prop_assume!(!x.is_zero());
        prop_assert_eq!(x * x.inverse().unwrap(), Fr::ONE);
    }

    #[test]
    fn prop_decimal_roundtrip(x in arb_fr()) {
        prop_assert_eq!(Fr::from_decimal(&x.to_decimal()).unwrap(), x);
        prop_assert_eq!(Fr::from_hex_be(&x.to_hex_be()).unwrap(), x);
    }

    #[test]
    fn prop_u128_reduction(v in any::<u128>()) {
        prop_assert_eq!(Fr::from_u128(v).to_decimal(), v.to_string());
        prop_assert_eq!(Fr::from_decimal(&v.to_string()).unwrap(), Fr::from_u128(v));
    }

    #[test]
    fn prop_adding_modulus_is_identity(v in any::<u64>()) {
        let shifted = Fr::from_decimal(MODULUS_DECIMAL).unwrap() + Fr::from_u64(v);
        prop_assert_eq!(shifted, Fr::from_u64(v));
    }
}
