//! Poseidon parameter sets.
//!
//! A [`PoseidonParameters`] value is immutable once loaded and is shared by
//! reference (`Arc`) between every permutation that uses it. Loading is the
//! only place shape invariants are checked; the permutation trusts them.

use super::grain;
use super::{FULL_ROUNDS, MDS_MATRIX, PARTIAL_ROUNDS, ROUND_CONSTANTS, SBOX_ALPHA, WIDTH};
use crate::error::{ErrorCode, OracleResult};
use crate::field::Fr;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Partial round counts circomlib uses for t = 2..=17 (RF is always 8).
pub const CIRCOM_PARTIAL_ROUNDS: [usize; 16] =
    [56, 57, 56, 60, 60, 63, 64, 63, 60, 66, 60, 65, 70, 60, 64, 68];

/// Full round count circomlib uses for every width.
pub const CIRCOM_FULL_ROUNDS: usize = 8;

/// Largest hash arity with a circomlib parameter set.
pub const CIRCOM_MAX_ARITY: usize = CIRCOM_PARTIAL_ROUNDS.len();

/// How constants in a [`ParamTable`] are written.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConstantEncoding {
    /// Big-endian hex, optional `0x` prefix (circomlib's JSON layout).
    #[default]
    HexBe,
    /// Decimal integers.
    Decimal,
}

/// A published constant table: round constants (one row per round) and the
/// MDS matrix, as strings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParamTable {
    /// State width t.
    pub width: usize,
    /// Total number of full rounds.
    pub full_rounds: usize,
    /// Number of partial rounds.
    pub partial_rounds: usize,
    /// S-box exponent; only 5 is supported.
    #[serde(default = "default_alpha")]
    pub sbox_alpha: usize,
    /// Encoding of every constant string.
    #[serde(default)]
    pub encoding: ConstantEncoding,
    /// Round constants, `full_rounds + partial_rounds` rows of `width`.
    pub round_constants: Vec<Vec<String>>,
    /// MDS matrix, `width` rows of `width`.
    pub mds_matrix: Vec<Vec<String>>,
}

fn default_alpha() -> usize {
    5
}

/// On-disk parameter file: the table lives under a `poseidon` key, next to
/// descriptive metadata that the loader ignores.
#[derive(Debug, Deserialize)]
struct ParamFile {
    poseidon: ParamTable,
}

impl ParamTable {
    /// The circomlib t = 3 table compiled into the crate.
    pub fn embedded() -> Self {
        Self {
            width: WIDTH,
            full_rounds: FULL_ROUNDS,
            partial_rounds: PARTIAL_ROUNDS,
            sbox_alpha: SBOX_ALPHA,
            encoding: ConstantEncoding::HexBe,
            round_constants: ROUND_CONSTANTS
                .iter()
                .map(|row| row.iter().map(|s| s.to_string()).collect())
                .collect(),
            mds_matrix: MDS_MATRIX
                .iter()
                .map(|row| row.iter().map(|s| s.to_string()).collect())
                .collect(),
        }
    }

    /// Load a table from a JSON file, either a bare table or a file with the
    /// table under a `poseidon` key (the layout of `params/*.json`).
    pub fn from_json_file<P: AsRef<Path>>(path: P) -> OracleResult<Self> {
        let content = std::fs::read_to_string(path.as_ref())?;
        Self::from_json_str(&content)
    }

    /// Parse a table from JSON text.
    pub fn from_json_str(content: &str) -> OracleResult<Self> {
        let value: serde_json::Value = serde_json::from_str(content)?;
        if value.get("poseidon").is_some() {
            let file: ParamFile = serde_json::from_value(value)?;
            Ok(file.poseidon)
        } else {
            Ok(serde_json::from_value(value)?)
        }
    }

    fn parse(&self, s: &str) -> OracleResult<Fr> {
        let parsed = match self.encoding {
            ConstantEncoding::HexBe => Fr::from_hex_be(s),
            ConstantEncoding::Decimal => Fr::from_decimal(s),
        };
        parsed.map_err(|e| malformed(format!("constant '{}': {}", s, e)))
    }
}

/// Where [`PoseidonParameters::load`] takes its constants from.
#[derive(Debug, Clone, Copy)]
pub enum ParamSource<'a> {
    /// Explicit published table.
    Table(&'a ParamTable),
    /// Derive with the Grain LFSR from the (t, RF, RP) triple.
    Grain,
}

/// Immutable Poseidon parameter set for one state width.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PoseidonParameters {
    width: usize,
    full_rounds: usize,
    partial_rounds: usize,
    round_constants: Vec<Vec<Fr>>,
    mds: Vec<Vec<Fr>>,
}

impl PoseidonParameters {
    /// Load and validate a parameter set.
    ///
    /// Fails with `MalformedParameters` if the table's declared or actual
    /// shape disagrees with `(width, full_rounds, partial_rounds)`, if the
    /// full rounds cannot be split evenly around the partial rounds, or if
    /// the MDS matrix is singular.
    pub fn load(
        width: usize,
        full_rounds: usize,
        partial_rounds: usize,
        source: ParamSource<'_>,
    ) -> OracleResult<Self> {
        if width < 2 {
            return Err(malformed(format!("width {} leaves no room for inputs", width)));
        }
        if full_rounds == 0 || full_rounds % 2 != 0 {
            return Err(malformed(format!(
                "full rounds must be a positive even number, got {}",
                full_rounds
            )));
        }

        let (round_constants, mds) = match source {
            ParamSource::Table(table) => {
                if (table.width, table.full_rounds, table.partial_rounds)
                    != (width, full_rounds, partial_rounds)
                {
                    return Err(malformed(format!(
                        "table declares t={} RF={} RP={}, requested t={} RF={} RP={}",
                        table.width,
                        table.full_rounds,
                        table.partial_rounds,
                        width,
                        full_rounds,
                        partial_rounds
                    )));
                }
                if table.sbox_alpha != 5 {
                    return Err(malformed(format!(
                        "unsupported S-box exponent {}",
                        table.sbox_alpha
                    )));
                }
                let parse_rows = |rows: &[Vec<String>]| -> OracleResult<Vec<Vec<Fr>>> {
                    rows.iter()
                        .map(|row| row.iter().map(|s| table.parse(s)).collect())
                        .collect()
                };
                (
                    parse_rows(&table.round_constants)?,
                    parse_rows(&table.mds_matrix)?,
                )
            }
            ParamSource::Grain => grain::generate(width, full_rounds, partial_rounds)?,
        };

        let params = Self {
            width,
            full_rounds,
            partial_rounds,
            round_constants,
            mds,
        };
        params.validate()?;
        Ok(params)
    }

    /// Load a table using the shape it declares.
    pub fn from_table(table: &ParamTable) -> OracleResult<Self> {
        Self::load(
            table.width,
            table.full_rounds,
            table.partial_rounds,
            ParamSource::Table(table),
        )
    }

    /// The circomlib t = 3 set (two inputs) from the embedded table.
    pub fn circom_t3() -> OracleResult<Self> {
        Self::from_table(&ParamTable::embedded())
    }

    /// The circomlib set for a hash of `arity` inputs (1..=16).
    ///
    /// t = 3 comes from the embedded table; other widths are derived with
    /// the Grain LFSR, which is how circomlib produced its tables.
    pub fn circom(arity: usize) -> OracleResult<Self> {
        if arity == 0 || arity > CIRCOM_MAX_ARITY {
            return Err(malformed(format!(
                "no circomlib parameter set for arity {} (supported: 1..={})",
                arity, CIRCOM_MAX_ARITY
            )));
        }
        if arity + 1 == WIDTH {
            return Self::circom_t3();
        }
        Self::load(
            arity + 1,
            CIRCOM_FULL_ROUNDS,
            CIRCOM_PARTIAL_ROUNDS[arity - 1],
            ParamSource::Grain,
        )
    }

    fn validate(&self) -> OracleResult<()> {
        let rounds = self.total_rounds();
        if self.round_constants.len() != rounds {
            return Err(malformed(format!(
                "expected {} round-constant rows, got {}",
                rounds,
                self.round_constants.len()
            )));
        }
        if let Some((round, row)) = self
            .round_constants
            .iter()
            .enumerate()
            .find(|(_, row)| row.len() != self.width)
        {
            return Err(malformed(format!(
                "round {} has {} constants, expected {}",
                round,
                row.len(),
                self.width
            )));
        }
        if self.mds.len() != self.width || self.mds.iter().any(|row| row.len() != self.width) {
            return Err(malformed(format!(
                "MDS matrix is not {}x{}",
                self.width, self.width
            )));
        }
        if determinant(&self.mds).is_zero() {
            return Err(malformed("MDS matrix is singular".to_string()));
        }
        Ok(())
    }

    /// State width t.
    pub fn width(&self) -> usize {
        self.width
    }

    /// Number of hash inputs this set supports (t - 1).
    pub fn arity(&self) -> usize {
        self.width - 1
    }

    /// Total full rounds (split evenly before and after the partial rounds).
    pub fn full_rounds(&self) -> usize {
        self.full_rounds
    }

    /// Number of partial rounds.
    pub fn partial_rounds(&self) -> usize {
        self.partial_rounds
    }

    /// Full plus partial rounds.
    pub fn total_rounds(&self) -> usize {
        self.full_rounds + self.partial_rounds
    }

    /// True if `round` applies the S-box to every cell.
    pub fn is_full_round(&self, round: usize) -> bool {
        let half = self.full_rounds / 2;
        round < half || round >= half + self.partial_rounds
    }

    /// Round constants for one round; empty past the last round.
    pub fn round_constants(&self, round: usize) -> &[Fr] {
        self.round_constants.get(round).map_or(&[], Vec::as_slice)
    }

    /// All round constants, one row per round.
    pub fn all_round_constants(&self) -> &[Vec<Fr>] {
        &self.round_constants
    }

    /// The MDS matrix.
    pub fn mds(&self) -> &[Vec<Fr>] {
        &self.mds
    }

    /// Short identifier, e.g. `bn254-t3-rf8-rp57`.
    pub fn id(&self) -> String {
        format!(
            "bn254-t{}-rf{}-rp{}",
            self.width, self.full_rounds, self.partial_rounds
        )
    }

    /// Export as a hex table (the inverse of [`PoseidonParameters::from_table`]).
    pub fn to_table(&self) -> ParamTable {
        let hex_rows = |rows: &[Vec<Fr>]| -> Vec<Vec<String>> {
            rows.iter()
                .map(|r| r.iter().map(Fr::to_hex_be).collect())
                .collect()
        };
        ParamTable {
            width: self.width,
            full_rounds: self.full_rounds,
            partial_rounds: self.partial_rounds,
            sbox_alpha: 5,
            encoding: ConstantEncoding::HexBe,
            round_constants: hex_rows(&self.round_constants),
            mds_matrix: hex_rows(&self.mds),
        }
    }
}

fn malformed(reason: String) -> ErrorCode {
    ErrorCode::MalformedParameters(reason)
}

/// Determinant by Gaussian elimination over Fr.
fn determinant(matrix: &[Vec<Fr>]) -> Fr {
    let n = matrix.len();
    let mut m: Vec<Vec<Fr>> = matrix.to_vec();
    let mut det = Fr::ONE;

    for col in 0..n {
        let pivot = match (col..n).find(|&r| !m[r][col].is_zero()) {
            Some(r) => r,
            None => return Fr::ZERO,
        };
        if pivot != col {
            m.swap(pivot, col);
            det = -det;
        }

        let pivot_value = m[col][col];
        det = det * pivot_value;
        let pivot_inv = match pivot_value.inverse() {
            Ok(inv) => inv,
            Err(_) => return Fr::ZERO,
        };

        for row in col + 1..n {
            let factor = m[row][col] * pivot_inv;
            if factor.is_zero() {
                continue;
            }
            for k in col..n {
                let delta = factor * m[col][k];
                m[row][k] = m[row][k] - delta;
            }
        }
    }

    det
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_embedded_table_loads() {
        let params = PoseidonParameters::circom_t3().unwrap();
        assert_eq!(params.width(), 3);
        assert_eq!(params.arity(), 2);
        assert_eq!(params.total_rounds(), 65);
        assert_eq!(params.id(), "bn254-t3-rf8-rp57");
    }

    #[test]
    fn test_grain_matches_embedded_table() {
        let embedded = PoseidonParameters::circom_t3().unwrap();
        let derived = PoseidonParameters::load(3, 8, 57, ParamSource::Grain).unwrap();
        assert_eq!(embedded, derived);
    }

    #[test]
    fn test_round_schedule() {
        let params = PoseidonParameters::circom_t3().unwrap();
        let full: Vec<usize> = (0..params.total_rounds())
            .filter(|&r| params.is_full_round(r))
            .collect();
        assert_eq!(full, vec![0, 1, 2, 3, 61, 62, 63, 64]);
    }

    #[test]
    fn test_round_constants_past_last_round() {
        let params = PoseidonParameters::circom_t3().unwrap();
        assert_eq!(params.round_constants(64).len(), 3);
        assert!(params.round_constants(65).is_empty());
        assert!(params.round_constants(usize::MAX).is_empty());
    }

    #[test]
    fn test_declared_shape_mismatch() {
        let table = ParamTable::embedded();
        let err = PoseidonParameters::load(3, 8, 56, ParamSource::Table(&table)).unwrap_err();
        assert!(matches!(err, ErrorCode::MalformedParameters(_)));
    }

    #[test]
    fn test_missing_round_row() {
        let mut table = ParamTable::embedded();
        table.round_constants.pop();
        assert!(matches!(
            PoseidonParameters::from_table(&table),
            Err(ErrorCode::MalformedParameters(_))
        ));
    }

    #[test]
    fn test_singular_mds_rejected() {
        let mut table = ParamTable::embedded();
        table.mds_matrix[1] = table.mds_matrix[0].clone();
        assert!(matches!(
            PoseidonParameters::from_table(&table),
            Err(ErrorCode::MalformedParameters(_))
        ));
    }

    #[test]
    fn test_odd_full_rounds_rejected() {
        assert!(PoseidonParameters::load(3, 7, 57, ParamSource::Grain).is_err());
    }

    #[test]
    fn test_determinant_small() {
        let m = vec![
            vec![Fr::from_u64(2), Fr::from_u64(1)],
            vec![Fr::from_u64(1), Fr::from_u64(3)],
        ];
        assert_eq!(determinant(&m), Fr::from_u64(5));
        let identity = vec![vec![Fr::ONE, Fr::ZERO], vec![Fr::ZERO, Fr::ONE]];
        assert_eq!(determinant(&identity), Fr::ONE);
    }

    #[test]
    fn test_table_json_roundtrip_through_file_layout() {
        let params = PoseidonParameters::circom_t3().unwrap();
        let json = serde_json::json!({ "version": "1", "poseidon": params.to_table() });
        let table = ParamTable::from_json_str(&json.to_string()).unwrap();
        assert_eq!(PoseidonParameters::from_table(&table).unwrap(), params);
    }

    #[test]
    fn test_circom_arity_bounds() {
        assert!(PoseidonParameters::circom(0).is_err());
        assert!(PoseidonParameters::circom(17).is_err());
        assert_eq!(PoseidonParameters::circom(1).unwrap().partial_rounds(), 56);
    }
}
