//! Grain LFSR parameter derivation.
//!
//! Reproduces the round-constant and MDS generation of the Poseidon
//! reference scripts (`generate_parameters_grain`), which is how circomlib's
//! published tables were produced. The LFSR is seeded with the parameter
//! description, so every (t, RF, RP) triple yields its own deterministic
//! constants.

use crate::error::{ErrorCode, OracleResult};
use crate::field::Fr;

/// Bit length of the BN254 scalar field modulus.
pub const FIELD_BITS: u16 = 254;

/// Grain field tag for a prime field.
const FIELD_PRIME: u8 = 1;

/// Grain S-box tag for x^alpha with positive alpha.
const SBOX_POW: u8 = 0;

/// Number of initial outputs thrown away after seeding.
const WARMUP: usize = 160;

/// 80-bit self-shrinking Grain LFSR.
///
/// Bit `i` of `reg` is the `i`-th oldest bit of the sequence.
#[derive(Debug, Clone)]
pub struct GrainLfsr {
    reg: u128,
}

impl GrainLfsr {
    /// Seed the LFSR with the parameter description and run the warm-up.
    pub fn new(width: usize, full_rounds: usize, partial_rounds: usize) -> OracleResult<Self> {
        let fits = |v: usize, bits: u32| (v as u128) < (1u128 << bits);
        if !fits(width, 12) || !fits(full_rounds, 10) || !fits(partial_rounds, 10) {
            return Err(ErrorCode::MalformedParameters(format!(
                "t={} RF={} RP={} does not fit the Grain seed layout",
                width, full_rounds, partial_rounds
            )));
        }

        let fields: [(u64, u32); 7] = [
            (FIELD_PRIME as u64, 2),
            (SBOX_POW as u64, 4),
            (FIELD_BITS as u64, 12),
            (width as u64, 12),
            (full_rounds as u64, 10),
            (partial_rounds as u64, 10),
            ((1u64 << 30) - 1, 30),
        ];

        let mut reg = 0u128;
        let mut pos = 0;
        for (value, bits) in fields {
            for i in (0..bits).rev() {
                let bit = ((value >> i) & 1) as u128;
                reg |= bit << pos;
                pos += 1;
            }
        }

        let mut lfsr = Self { reg };
        for _ in 0..WARMUP {
            lfsr.step();
        }
        Ok(lfsr)
    }

    /// Advance the register by one bit and return the new bit.
    fn step(&mut self) -> u8 {
        let r = self.reg;
        let new_bit = ((r >> 62) ^ (r >> 51) ^ (r >> 38) ^ (r >> 23) ^ (r >> 13) ^ r) & 1;
        self.reg = (r >> 1) | (new_bit << 79);
        new_bit as u8
    }

    /// Next output bit of the self-shrinking generator: bits are consumed in
    /// pairs and the second bit is emitted only when the first is 1.
    pub fn next_bit(&mut self) -> u8 {
        loop {
            if self.step() == 1 {
                return self.step();
            }
            self.step();
        }
    }

    /// Next `FIELD_BITS`-bit integer, most significant bit first, as
    /// big-endian bytes.
    fn next_bits_be(&mut self) -> [u8; 32] {
        let mut out = [0u8; 32];
        for i in 0..FIELD_BITS as usize {
            let pos = FIELD_BITS as usize - 1 - i;
            if self.next_bit() == 1 {
                out[31 - pos / 8] |= 1 << (pos % 8);
            }
        }
        out
    }

    /// Next field element by rejection sampling (values >= p are redrawn).
    pub fn next_field_element(&mut self) -> Fr {
        loop {
            let mut le = self.next_bits_be();
            le.reverse();
            if let Ok(fr) = Fr::from_bytes_le(&le) {
                return fr;
            }
        }
    }

    /// Next field element reduced modulo p (no rejection).
    ///
    /// The MDS sampling step of the reference scripts reduces instead of
    /// rejecting, and the tables depend on that.
    pub fn next_field_element_reduced(&mut self) -> Fr {
        Fr::from_be_bytes_mod_order(&self.next_bits_be())
    }
}

/// Derive round constants (one row of `width` per round) and the Cauchy MDS
/// matrix for the given parameter triple.
pub fn generate(
    width: usize,
    full_rounds: usize,
    partial_rounds: usize,
) -> OracleResult<(Vec<Vec<Fr>>, Vec<Vec<Fr>>)> {
    let mut lfsr = GrainLfsr::new(width, full_rounds, partial_rounds)?;

    let round_constants = (0..full_rounds + partial_rounds)
        .map(|_| (0..width).map(|_| lfsr.next_field_element()).collect())
        .collect();

    let mds = cauchy_mds(&mut lfsr, width);
    Ok((round_constants, mds))
}

/// Sample distinct xs, ys and build M[i][j] = 1 / (x_i + y_j).
fn cauchy_mds(lfsr: &mut GrainLfsr, width: usize) -> Vec<Vec<Fr>> {
    loop {
        let mut samples = sample_distinct(lfsr, 2 * width);
        let ys = samples.split_off(width);
        let xs = samples;

        let matrix: Option<Vec<Vec<Fr>>> = xs
            .iter()
            .map(|&x| ys.iter().map(|&y| (x + y).inverse().ok()).collect())
            .collect();

        if let Some(matrix) = matrix {
            return matrix;
        }
    }
}

fn sample_distinct(lfsr: &mut GrainLfsr, count: usize) -> Vec<Fr> {
    loop {
        let samples: Vec<Fr> = (0..count)
            .map(|_| lfsr.next_field_element_reduced())
            .collect();
        let distinct = samples
            .iter()
            .enumerate()
            .all(|(i, a)| samples[i + 1..].iter().all(|b| a != b));
        if distinct {
            return samples;
        }
    }
}
