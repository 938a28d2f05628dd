//! BN254 scalar field element (Fr).
//!
//! Wraps `halo2curves::bn256::Fr` so every value the oracle touches is
//! reduced modulo p by construction.

use crate::error::{ErrorCode, OracleResult};
use ff::{Field, PrimeField};
use halo2curves::bn256::Fr as Scalar;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::iter::Sum;
use std::ops::{Add, Mul, Neg, Sub};
use std::str::FromStr;

/// A BN254 scalar field element.
///
/// This is a newtype wrapper around `halo2curves::bn256::Fr`. The inner
/// representation is always canonical, so derived equality is value
/// equality.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Fr(Scalar);

impl Fr {
    /// The additive identity (zero).
    pub const ZERO: Fr = Fr(Scalar::ZERO);

    /// The multiplicative identity (one).
    pub const ONE: Fr = Fr(Scalar::ONE);

    /// Create an Fr from a u64 value.
    pub fn from_u64(val: u64) -> Fr {
        Fr(Scalar::from(val))
    }

    /// Create an Fr from a u128 value.
    pub fn from_u128(val: u128) -> Fr {
        Fr(Scalar::from_u128(val))
    }

    /// Create an Fr from canonical little-endian bytes.
    ///
    /// Returns `NonCanonicalFr` if the value is >= p.
    pub fn from_bytes_le(bytes: &[u8; 32]) -> OracleResult<Fr> {
        let mut repr = <Scalar as PrimeField>::Repr::default();
        repr.as_mut().copy_from_slice(bytes);
        Option::<Scalar>::from(Scalar::from_repr(repr))
            .map(Fr)
            .ok_or_else(|| ErrorCode::NonCanonicalFr(hex::encode(bytes)))
    }

    /// Convert to canonical 32-byte little-endian representation.
    pub fn to_bytes_le(&self) -> [u8; 32] {
        let mut out = [0u8; 32];
        out.copy_from_slice(self.0.to_repr().as_ref());
        out
    }

    /// Interpret big-endian bytes of any length as an integer and reduce it
    /// modulo p.
    pub fn from_be_bytes_mod_order(bytes: &[u8]) -> Fr {
        let radix = Fr::from_u64(256);
        bytes
            .iter()
            .fold(Fr::ZERO, |acc, &b| acc * radix + Fr::from_u64(b as u64))
    }

    /// Parse a decimal integer of any size and reduce it modulo p.
    ///
    /// A leading `-` yields the additive inverse.
    pub fn from_decimal(s: &str) -> OracleResult<Fr> {
        let trimmed = s.trim();
        let (negative, digits) = match trimmed.strip_prefix('-') {
            Some(rest) => (true, rest),
            None => (false, trimmed),
        };
        if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
            return Err(ErrorCode::InvalidDecimal(s.to_string()));
        }

        // Horner over 18-digit chunks; 10^18 fits in a u64.
        let mut acc = Fr::ZERO;
        for chunk in digits.as_bytes().chunks(18) {
            let mut limb = 0u64;
            for &b in chunk {
                limb = limb * 10 + (b - b'0') as u64;
            }
            let scale = Fr::from_u64(10u64.pow(chunk.len() as u32));
            acc = acc * scale + Fr::from_u64(limb);
        }

        Ok(if negative { -acc } else { acc })
    }

    /// Parse a big-endian hex string (optional `0x` prefix, up to 64 digits).
    ///
    /// Unlike [`Fr::from_decimal`] this is strict: values >= p are rejected
    /// with `NonCanonicalFr`, because hex is how parameter tables are
    /// published and a non-canonical constant means a corrupted table.
    pub fn from_hex_be(hex_str: &str) -> OracleResult<Fr> {
        let digits = hex_str
            .strip_prefix("0x")
            .or_else(|| hex_str.strip_prefix("0X"))
            .unwrap_or(hex_str);
        if digits.is_empty() || digits.len() > 64 {
            return Err(ErrorCode::WrongLength {
                expected: 64,
                got: digits.len() as u64,
            });
        }

        let padded = format!("{:0>64}", digits);
        let bytes = hex::decode(&padded).map_err(|_| ErrorCode::InvalidHex(hex_str.to_string()))?;

        let mut le = [0u8; 32];
        for (dst, src) in le.iter_mut().zip(bytes.iter().rev()) {
            *dst = *src;
        }
        Self::from_bytes_le(&le)
    }

    /// Convert to a 64-character lowercase big-endian hex string.
    pub fn to_hex_be(&self) -> String {
        let mut be = self.to_bytes_le();
        be.reverse();
        hex::encode(be)
    }

    /// Multiplicative inverse.
    ///
    /// Zero has no inverse and yields `DivisionByZero`.
    pub fn inverse(&self) -> OracleResult<Fr> {
        Option::<Scalar>::from(self.0.invert())
            .map(Fr)
            .ok_or(ErrorCode::DivisionByZero)
    }

    /// True if this is the additive identity.
    pub fn is_zero(&self) -> bool {
        bool::from(self.0.is_zero())
    }

    /// Compute x^5 (the Poseidon S-box).
    pub fn pow5(&self) -> Fr {
        let x2 = self.0.square();
        let x4 = x2.square();
        Fr(x4 * self.0)
    }

    /// Square the field element.
    pub fn square(&self) -> Fr {
        Fr(self.0.square())
    }

    /// Raise to a u64 power.
    pub fn pow(&self, exp: u64) -> Fr {
        Fr(self.0.pow_vartime([exp]))
    }

    /// Convert to decimal string representation.
    pub fn to_decimal(&self) -> String {
        let bytes = self.to_bytes_le();

        let mut limbs = [0u64; 4];
        for (limb, chunk) in limbs.iter_mut().zip(bytes.chunks_exact(8)) {
            let mut buf = [0u8; 8];
            buf.copy_from_slice(chunk);
            *limb = u64::from_le_bytes(buf);
        }

        if limbs == [0, 0, 0, 0] {
            return "0".to_string();
        }

        let mut digits = Vec::new();
        while limbs != [0, 0, 0, 0] {
            digits.push(b'0' + div_by_10(&mut limbs));
        }
        digits.reverse();
        String::from_utf8_lossy(&digits).into_owned()
    }
}

/// Divide a 256-bit number (as 4 u64 limbs, little-endian) by 10 in place.
/// Returns the remainder.
fn div_by_10(limbs: &mut [u64; 4]) -> u8 {
    let mut carry: u128 = 0;
    for limb in limbs.iter_mut().rev() {
        let cur = (carry << 64) | *limb as u128;
        *limb = (cur / 10) as u64;
        carry = cur % 10;
    }
    carry as u8
}

impl From<u64> for Fr {
    fn from(val: u64) -> Self {
        Fr::from_u64(val)
    }
}

impl FromStr for Fr {
    type Err = ErrorCode;

    /// Accepts decimal (reduced mod p) or `0x`-prefixed hex (strict).
    fn from_str(s: &str) -> OracleResult<Fr> {
        let s = s.trim();
        if s.starts_with("0x") || s.starts_with("0X") {
            Fr::from_hex_be(s)
        } else {
            Fr::from_decimal(s)
        }
    }
}

impl Add for Fr {
    type Output = Fr;
    fn add(self, rhs: Fr) -> Fr {
        Fr(self.0 + rhs.0)
    }
}

impl Sub for Fr {
    type Output = Fr;
    fn sub(self, rhs: Fr) -> Fr {
        Fr(self.0 - rhs.0)
    }
}

impl Mul for Fr {
    type Output = Fr;
    fn mul(self, rhs: Fr) -> Fr {
        Fr(self.0 * rhs.0)
    }
}

impl Neg for Fr {
    type Output = Fr;
    fn neg(self) -> Fr {
        Fr(-self.0)
    }
}

impl Sum for Fr {
    fn sum<I: Iterator<Item = Fr>>(iter: I) -> Fr {
        iter.fold(Fr::ZERO, |acc, x| acc + x)
    }
}

impl fmt::Display for Fr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_decimal())
    }
}

impl Serialize for Fr {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_decimal())
    }
}

/// Witness and R1CS exports carry field elements either as decimal strings
/// or, for small values, as bare JSON numbers.
#[derive(Deserialize)]
#[serde(untagged)]
enum FrRepr {
    Text(String),
    Number(u64),
}

impl<'de> Deserialize<'de> for Fr {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        match FrRepr::deserialize(deserializer)? {
            FrRepr::Text(s) => s.parse().map_err(serde::de::Error::custom),
            FrRepr::Number(n) => Ok(Fr::from_u64(n)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_zero_one() {
        assert_eq!(
            Fr::ZERO.to_hex_be(),
            "0000000000000000000000000000000000000000000000000000000000000000"
        );
        assert_eq!(
            Fr::ONE.to_hex_be(),
            "0000000000000000000000000000000000000000000000000000000000000001"
        );
        assert_eq!(Fr::ONE.to_bytes_le()[0], 1);
    }

    #[test]
    fn test_from_u64() {
        let fr = Fr::from_u64(42);
        assert_eq!(fr.to_decimal(), "42");
        assert_eq!(fr, Fr::from_decimal("42").unwrap());
    }

    #[test]
    fn test_roundtrip() {
        let original = Fr::from_u64(12345);
        let bytes = original.to_bytes_le();
        let recovered = Fr::from_bytes_le(&bytes).unwrap();
        assert_eq!(original, recovered);
    }

    #[test]
    fn test_arithmetic() {
        let a = Fr::from_u64(100);
        let b = Fr::from_u64(200);
        assert_eq!(a + b, Fr::from_u64(300));
        assert_eq!(b - a, Fr::from_u64(100));
        assert_eq!(Fr::from_u64(7) * Fr::from_u64(11), Fr::from_u64(77));
        assert_eq!(a - b, -Fr::from_u64(100));
    }

    #[test]
    fn test_pow5_matches_pow() {
        let x = Fr::from_u64(3);
        assert_eq!(x.pow5(), Fr::from_u64(243));
        assert_eq!(x.pow5(), x.pow(5));
    }

    #[test]
    fn test_inverse() {
        assert_eq!(Fr::ZERO.inverse(), Err(ErrorCode::DivisionByZero));
        let x = Fr::from_u64(7);
        assert_eq!(x * x.inverse().unwrap(), Fr::ONE);
    }

    #[test]
    fn test_decimal_rejects_garbage() {
        assert!(Fr::from_decimal("").is_err());
        assert!(Fr::from_decimal("12a").is_err());
        assert!(Fr::from_decimal("-").is_err());
        assert_eq!(Fr::from_decimal("-1").unwrap(), -Fr::ONE);
    }

    #[test]
    fn test_be_bytes_mod_order() {
        assert_eq!(Fr::from_be_bytes_mod_order(&[0x01, 0x00]), Fr::from_u64(256));
        assert_eq!(Fr::from_be_bytes_mod_order(&[]), Fr::ZERO);
    }

    #[test]
    fn test_serde_decimal_string() {
        let fr = Fr::from_u64(7777777);
        let json = serde_json::to_string(&fr).unwrap();
        assert_eq!(json, "\"7777777\"");
        let back: Fr = serde_json::from_str(&json).unwrap();
        assert_eq!(back, fr);
        let num: Fr = serde_json::from_str("5").unwrap();
        assert_eq!(num, Fr::from_u64(5));
    }
}
