//! snarkjs JSON interchange.
//!
//! Reads and writes the two files the circom toolchain produces for a
//! witness check:
//! - `snarkjs wtns export json`: a JSON array of decimal strings;
//! - `snarkjs r1cs export json`: an object whose `constraints` entry is a
//!   list of `[A, B, C]`, each a map from decimal signal index to decimal
//!   coefficient.

use super::{Constraint, ConstraintSystem, LinearCombination, Witness};
use crate::error::{ErrorCode, OracleResult};
use crate::field::{Fr, MODULUS_DECIMAL};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;

type SparseRow = BTreeMap<String, Fr>;

#[derive(Debug, Serialize, Deserialize)]
struct R1csJson {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    prime: Option<String>,
    #[serde(rename = "nVars", default, skip_serializing_if = "Option::is_none")]
    n_vars: Option<usize>,
    #[serde(rename = "nConstraints", default, skip_serializing_if = "Option::is_none")]
    n_constraints: Option<usize>,
    constraints: Vec<[SparseRow; 3]>,
}

fn row_to_lc(row: &SparseRow) -> OracleResult<LinearCombination> {
    let mut terms = Vec::with_capacity(row.len());
    for (key, &coeff) in row {
        let signal = key
            .parse::<usize>()
            .map_err(|_| ErrorCode::Json(format!("signal index '{}' is not an integer", key)))?;
        terms.push((signal, coeff));
    }
    Ok(LinearCombination::from_terms(terms))
}

fn lc_to_row(lc: &LinearCombination) -> SparseRow {
    lc.terms().map(|(s, c)| (s.to_string(), c)).collect()
}

impl ConstraintSystem {
    /// Parse an R1CS exported by `snarkjs r1cs export json`.
    ///
    /// A `prime` other than the BN254 scalar modulus is rejected: the
    /// constraints would be checked in the wrong field.
    pub fn from_snarkjs_json(content: &str) -> OracleResult<Self> {
        let doc: R1csJson = serde_json::from_str(content)?;

        if let Some(prime) = &doc.prime {
            if prime.trim() != MODULUS_DECIMAL {
                return Err(ErrorCode::Json(format!(
                    "R1CS is over prime {}, expected {}",
                    prime, MODULUS_DECIMAL
                )));
            }
        }
        if let Some(declared) = doc.n_constraints {
            if declared != doc.constraints.len() {
                return Err(ErrorCode::Json(format!(
                    "R1CS declares {} constraints but lists {}",
                    declared,
                    doc.constraints.len()
                )));
            }
        }

        let constraints = doc
            .constraints
            .iter()
            .map(|[a, b, c]| -> OracleResult<Constraint> {
                Ok(Constraint::new(row_to_lc(a)?, row_to_lc(b)?, row_to_lc(c)?))
            })
            .collect::<OracleResult<Vec<_>>>()?;

        let cs = ConstraintSystem::new(constraints);
        Ok(match doc.n_vars {
            Some(n) => cs.with_num_signals(n),
            None => cs,
        })
    }

    /// Load an R1CS JSON file.
    pub fn from_snarkjs_file<P: AsRef<Path>>(path: P) -> OracleResult<Self> {
        let content = std::fs::read_to_string(path.as_ref())?;
        Self::from_snarkjs_json(&content)
    }

    /// Serialize in the snarkjs layout.
    pub fn to_snarkjs_json(&self) -> OracleResult<String> {
        let doc = R1csJson {
            prime: Some(MODULUS_DECIMAL.to_string()),
            n_vars: self.num_signals(),
            n_constraints: Some(self.len()),
            constraints: self
                .constraints()
                .iter()
                .map(|c| [lc_to_row(&c.a), lc_to_row(&c.b), lc_to_row(&c.c)])
                .collect(),
        };
        Ok(serde_json::to_string_pretty(&doc)?)
    }
}

impl Witness {
    /// Parse a witness exported by `snarkjs wtns export json`.
    pub fn from_snarkjs_json(content: &str) -> OracleResult<Self> {
        Ok(serde_json::from_str(content)?)
    }

    /// Load a witness JSON file.
    pub fn from_snarkjs_file<P: AsRef<Path>>(path: P) -> OracleResult<Self> {
        let content = std::fs::read_to_string(path.as_ref())?;
        Self::from_snarkjs_json(&content)
    }

    /// Serialize as a JSON array of decimal strings.
    pub fn to_snarkjs_json(&self) -> OracleResult<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}
