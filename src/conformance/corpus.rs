//! Corpus-based conformance testing.
//!
//! Loads test vectors from `corpus.json` and runs them against this crate.
//! Each vector names an operation, its input and either the expected `ok`
//! fields or the expected `err` code:
//!
//! ```json
//! {"id": "fr_inverse_zero", "op": "fr_inverse",
//!  "input": {"value": "0"}, "expected": {"err": {"code": 300}}}
//! ```
//!
//! Only the keys listed under `ok` are compared, so a vector can pin a
//! single field of a larger result.

use crate::circuit::PoseidonCircuit;
use crate::error::{ErrorCode, OracleResult};
use crate::field::{Fr, MODULUS_DECIMAL};
use crate::poseidon::{PoseidonHash, PoseidonParameters};
use crate::r1cs::OUTPUT_SLOT;
use serde::Deserialize;
use serde_json::{json, Value};
use std::fs;
use std::path::Path;

/// Corpus manifest with metadata.
#[derive(Debug, Deserialize)]
pub struct CorpusManifest {
    /// Format version of the corpus file.
    pub format_version: String,
    /// Field modulus in decimal.
    pub modulus_decimal: String,
    /// Parameter set the hash vectors were produced with.
    pub parameter_set: String,
    /// Where the expected values come from.
    #[serde(default)]
    pub source: String,
}

/// A corpus containing test vectors.
#[derive(Debug, Deserialize)]
pub struct Corpus {
    /// Corpus metadata.
    pub manifest: CorpusManifest,
    /// List of test vectors.
    pub vectors: Vec<TestVector>,
}

/// A single test vector.
#[derive(Debug, Deserialize)]
pub struct TestVector {
    /// Unique identifier for the test.
    pub id: String,
    /// Operation to test (e.g., "fr_reduce", "poseidon_hash").
    pub op: String,
    /// Input parameters for the operation.
    pub input: Value,
    /// Expected result (success or error).
    pub expected: Value,
}

/// Result of running a single test vector.
#[derive(Debug)]
pub enum TestResult {
    /// Test passed.
    Pass,
    /// Test failed with mismatch.
    Fail {
        /// Expected result from the corpus.
        expected: String,
        /// Actual result from this implementation.
        actual: String,
    },
    /// Test was skipped (operation not implemented).
    Skip {
        /// Reason for skipping.
        reason: String,
    },
    /// Test errored during execution.
    Error {
        /// Error message.
        message: String,
    },
}

impl TestResult {
    /// Returns true if this is a passing result.
    pub fn is_pass(&self) -> bool {
        matches!(self, Self::Pass)
    }

    /// Returns true if this is a failing result.
    pub fn is_fail(&self) -> bool {
        matches!(self, Self::Fail { .. })
    }
}

/// Results from running the corpus.
#[derive(Debug, Default)]
pub struct CorpusResults {
    /// Number of tests that passed.
    pub passed: usize,
    /// Number of tests that failed.
    pub failed: usize,
    /// Number of tests that were skipped.
    pub skipped: usize,
    /// Number of tests that errored.
    pub errors: usize,
    /// Detailed results for each test.
    pub details: Vec<(String, TestResult)>,
}

impl CorpusResults {
    /// Create a new empty results container.
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a test result.
    pub fn record(&mut self, id: &str, result: TestResult) {
        match &result {
            TestResult::Pass => self.passed += 1,
            TestResult::Fail { .. } => self.failed += 1,
            TestResult::Skip { .. } => self.skipped += 1,
            TestResult::Error { .. } => self.errors += 1,
        }
        self.details.push((id.to_string(), result));
    }

    /// Get total number of tests run.
    pub fn total(&self) -> usize {
        self.passed + self.failed + self.skipped + self.errors
    }

    /// Returns true if all tests passed (no failures or errors).
    pub fn all_passed(&self) -> bool {
        self.failed == 0 && self.errors == 0
    }

    /// Get a summary string of the results.
    pub fn summary(&self) -> String {
        format!(
            "{} passed, {} failed, {} skipped, {} errors (total: {})",
            self.passed,
            self.failed,
            self.skipped,
            self.errors,
            self.total()
        )
    }

    /// Failures and errors, in corpus order.
    pub fn problems(&self) -> impl Iterator<Item = &(String, TestResult)> {
        self.details
            .iter()
            .filter(|(_, r)| matches!(r, TestResult::Fail { .. } | TestResult::Error { .. }))
    }
}

/// Corpus runner that executes test vectors.
pub struct CorpusRunner {
    corpus: Corpus,
}

impl CorpusRunner {
    /// Load corpus from a file path.
    pub fn load<P: AsRef<Path>>(path: P) -> OracleResult<Self> {
        let content = fs::read_to_string(path.as_ref())?;
        Self::from_json(&content)
    }

    /// Parse a corpus document.
    ///
    /// A corpus built for another field is rejected outright rather than
    /// reported vector by vector.
    pub fn from_json(content: &str) -> OracleResult<Self> {
        let corpus: Corpus = serde_json::from_str(content)?;
        if corpus.manifest.modulus_decimal != MODULUS_DECIMAL {
            return Err(ErrorCode::Json(format!(
                "corpus is for modulus {}, expected {}",
                corpus.manifest.modulus_decimal, MODULUS_DECIMAL
            )));
        }
        Ok(Self { corpus })
    }

    /// Get the corpus manifest.
    pub fn manifest(&self) -> &CorpusManifest {
        &self.corpus.manifest
    }

    /// Get the number of test vectors.
    pub fn vector_count(&self) -> usize {
        self.corpus.vectors.len()
    }

    /// Run all test vectors and return results.
    pub fn run_all(&self) -> CorpusResults {
        let mut results = CorpusResults::new();

        for vector in &self.corpus.vectors {
            let result = self.run_vector(vector);
            if !result.is_pass() {
                tracing::debug!(id = %vector.id, ?result, "corpus vector did not pass");
            }
            results.record(&vector.id, result);
        }

        tracing::info!(summary = %results.summary(), "corpus finished");
        results
    }

    /// Run a single test vector.
    fn run_vector(&self, vector: &TestVector) -> TestResult {
        let outcome = match vector.op.as_str() {
            "fr_reduce" => run_fr_reduce(&vector.input),
            "fr_inverse" => run_fr_inverse(&vector.input),
            "poseidon_hash" => run_poseidon_hash(&vector.input),
            "poseidon_params" => run_poseidon_params(&vector.input),
            "circuit_witness" => run_circuit_witness(&vector.input),
            _ => {
                return TestResult::Skip {
                    reason: format!("Unknown operation: {}", vector.op),
                }
            }
        };
        match outcome {
            Ok(actual) => judge(&vector.expected, actual),
            Err(message) => TestResult::Error { message },
        }
    }
}

/// What an operation produced: a result object or an error. The outer
/// `Result` of each runner is for malformed vectors.
type OpOutcome = Result<OracleResult<Value>, String>;

fn input_str<'a>(input: &'a Value, key: &str) -> Result<&'a str, String> {
    input
        .get(key)
        .and_then(Value::as_str)
        .ok_or_else(|| format!("Missing '{}' in input", key))
}

fn input_elements(input: &Value) -> Result<Vec<Fr>, String> {
    let elements = input
        .get("elements")
        .and_then(Value::as_array)
        .ok_or_else(|| "Missing 'elements' in input".to_string())?;
    elements
        .iter()
        .map(|e| {
            let s = e
                .as_str()
                .ok_or_else(|| "Element is not a string".to_string())?;
            s.parse::<Fr>().map_err(|e| format!("Invalid element '{}': {}", s, e))
        })
        .collect()
}

fn input_arity(input: &Value, default: usize) -> usize {
    input
        .get("arity")
        .and_then(Value::as_u64)
        .map_or(default, |a| a as usize)
}

fn run_fr_reduce(input: &Value) -> OpOutcome {
    let value = input_str(input, "value")?;
    Ok(value
        .parse::<Fr>()
        .map(|fr| json!({ "decimal": fr.to_decimal(), "hex": fr.to_hex_be() })))
}

fn run_fr_inverse(input: &Value) -> OpOutcome {
    let value = input_str(input, "value")?;
    let fr = value
        .parse::<Fr>()
        .map_err(|e| format!("Invalid value '{}': {}", value, e))?;
    Ok(fr.inverse().map(|inv| {
        json!({ "decimal": inv.to_decimal(), "roundtrip": (inv * fr).to_decimal() })
    }))
}

fn run_poseidon_hash(input: &Value) -> OpOutcome {
    let elements = input_elements(input)?;
    let arity = input_arity(input, elements.len());
    Ok(PoseidonHash::circom(arity)
        .and_then(|h| h.hash(&elements))
        .map(|out| json!({ "hash": out.to_decimal() })))
}

fn run_poseidon_params(input: &Value) -> OpOutcome {
    let arity = input
        .get("arity")
        .and_then(Value::as_u64)
        .ok_or_else(|| "Missing 'arity' in input".to_string())? as usize;
    Ok(PoseidonParameters::circom(arity).map(|p| {
        let c0 = p.round_constants(0).first().map(Fr::to_hex_be);
        let m00 = p.mds().first().and_then(|row| row.first()).map(Fr::to_hex_be);
        json!({
            "id": p.id(),
            "width": p.width(),
            "full_rounds": p.full_rounds(),
            "partial_rounds": p.partial_rounds(),
            "c0": c0,
            "m00": m00,
        })
    }))
}

fn run_circuit_witness(input: &Value) -> OpOutcome {
    let elements = input_elements(input)?;
    let arity = input_arity(input, elements.len());
    Ok(PoseidonCircuit::circom(arity).and_then(|circuit| {
        let witness = circuit.witness(&elements)?;
        let satisfied = circuit.constraint_system().is_satisfied(&witness)?;
        Ok(json!({
            "output": witness.slot(OUTPUT_SLOT)?.to_decimal(),
            "signals": witness.len(),
            "constraints": circuit.constraint_system().len(),
            "satisfied": satisfied,
        }))
    }))
}

/// Compare an operation's outcome with the vector's expectation.
fn judge(expected: &Value, actual: OracleResult<Value>) -> TestResult {
    if let Some(ok) = expected.get("ok").and_then(Value::as_object) {
        let actual = match actual {
            Ok(v) => v,
            Err(e) => {
                return TestResult::Fail {
                    expected: format!("ok: {}", Value::Object(ok.clone())),
                    actual: format!("err: {}", e),
                }
            }
        };
        for (key, want) in ok {
            let got = actual.get(key).unwrap_or(&Value::Null);
            if got != want {
                return TestResult::Fail {
                    expected: format!("{} = {}", key, want),
                    actual: format!("{} = {}", key, got),
                };
            }
        }
        TestResult::Pass
    } else if let Some(err) = expected.get("err") {
        let expected_code = err.get("code").and_then(Value::as_u64).unwrap_or(0);
        match actual {
            Ok(v) => TestResult::Fail {
                expected: format!("err: {}", err),
                actual: format!("ok: {}", v),
            },
            Err(e) if u64::from(e.code()) == expected_code => TestResult::Pass,
            Err(e) => TestResult::Fail {
                expected: format!("E{}", expected_code),
                actual: format!("E{} {}", e.code(), e),
            },
        }
    } else {
        TestResult::Error {
            message: "Invalid expected format".to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn corpus(vectors: &str) -> String {
        format!(
            r#"{{"manifest": {{"format_version": "1", "modulus_decimal": "{}",
                "parameter_set": "bn254-t3-rf8-rp57"}}, "vectors": {}}}"#,
            MODULUS_DECIMAL, vectors
        )
    }

    #[test]
    fn test_runs_vectors() {
        let runner = CorpusRunner::from_json(&corpus(
            r#"[
            {"id": "p", "op": "fr_reduce", "input": {"value": "21888242871839275222246405745257275088548364400416034343698204186575808495617"}, "expected": {"ok": {"decimal": "0"}}},
            {"id": "inv0", "op": "fr_inverse", "input": {"value": "0"}, "expected": {"err": {"code": 300}}},
            {"id": "h00", "op": "poseidon_hash", "input": {"elements": ["0", "0"]}, "expected": {"ok": {"hash": "14744269619966411208579211824598458697587494354926760081771325075741142829156"}}},
            {"id": "bad", "op": "fr_reduce", "input": {"value": "7"}, "expected": {"ok": {"decimal": "8"}}},
            {"id": "new", "op": "sponge_squeeze", "input": {}, "expected": {}}
        ]"#,
        ))
        .unwrap();
        let results = runner.run_all();
        assert_eq!(results.passed, 3);
        assert_eq!(results.failed, 1);
        assert_eq!(results.skipped, 1);
        assert_eq!(results.problems().count(), 1);
        assert!(!results.all_passed());
    }

    #[test]
    fn test_wrong_modulus_rejected() {
        let json = corpus("[]").replace("21888242871839275222", "52435875175126190479");
        assert!(CorpusRunner::from_json(&json).is_err());
    }

    #[test]
    fn test_malformed_vector_is_error() {
        let runner = CorpusRunner::from_json(&corpus(
            r#"[{"id": "x", "op": "poseidon_hash", "input": {}, "expected": {"ok": {}}}]"#,
        ))
        .unwrap();
        assert_eq!(runner.run_all().errors, 1);
    }

    #[test]
    fn test_corpus_results() {
        let mut results = CorpusResults::new();
        results.record("test1", TestResult::Pass);
        results.record(
            "test2",
            TestResult::Fail {
                expected: "a".to_string(),
                actual: "b".to_string(),
            },
        );
        results.record(
            "test3",
            TestResult::Skip {
                reason: "not implemented".to_string(),
            },
        );

        assert_eq!(results.passed, 1);
        assert_eq!(results.failed, 1);
        assert_eq!(results.skipped, 1);
        assert_eq!(results.total(), 3);
        assert!(!results.all_passed());
    }
}
