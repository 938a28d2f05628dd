//! Oracle configuration.
//!
//! A JSON file selecting the evaluator under test, the parameter set and
//! the scenarios to run. Every field is optional; an empty object `{}`
//! reproduces the built-in suite against the in-process reference circuit.
//!
//! ```json
//! {
//!   "evaluator": {"kind": "command", "program": "./witness.sh", "r1cs": "poseidon.r1cs.json"},
//!   "seed": 42,
//!   "runs": 1000,
//!   "violation_mode": "all",
//!   "input_name": "inputs"
//! }
//! ```

use crate::circuit::{CircuitEvaluator, CommandEvaluator, PoseidonCircuit, DEFAULT_INPUT_NAME};
use crate::conformance::{Scenario, TestOracle};
use crate::error::OracleResult;
use crate::poseidon::{ParamTable, PoseidonParameters};
use crate::verifier::ViolationMode;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Which circuit evaluator the oracle checks.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum EvaluatorConfig {
    /// In-process reference circuit.
    #[default]
    Reference,
    /// External witness generator.
    Command {
        /// Program to run.
        program: PathBuf,
        /// Arguments placed before the input file path.
        #[serde(default)]
        args: Vec<String>,
        /// snarkjs R1CS JSON export of the circuit.
        r1cs: PathBuf,
    },
}

/// Top-level configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct OracleConfig {
    /// Evaluator under test.
    pub evaluator: EvaluatorConfig,
    /// Hash arity (circomlib parameter set), ignored when `params` is set.
    pub arity: usize,
    /// External parameter table instead of the circomlib set.
    pub params: Option<PathBuf>,
    /// Seed for random scenarios; OS entropy when absent.
    pub seed: Option<u64>,
    /// Override the case count of every random scenario.
    pub runs: Option<usize>,
    /// Override the bound of every random scenario.
    pub bound: Option<u64>,
    /// Constraint violation reporting.
    pub violation_mode: ViolationMode,
    /// Signal name the inputs are written under in the evaluator's input
    /// file.
    pub input_name: String,
    /// Scenarios to run.
    pub scenarios: Vec<Scenario>,
    /// File this config was loaded from.
    #[serde(skip)]
    pub source: Option<PathBuf>,
}

impl Default for OracleConfig {
    fn default() -> Self {
        Self {
            evaluator: EvaluatorConfig::default(),
            arity: 2,
            params: None,
            seed: None,
            runs: None,
            bound: None,
            violation_mode: ViolationMode::default(),
            input_name: DEFAULT_INPUT_NAME.to_string(),
            scenarios: Scenario::builtin_suite(),
            source: None,
        }
    }
}

impl OracleConfig {
    /// Load from a JSON file.
    pub fn from_json_file<P: AsRef<Path>>(path: P) -> OracleResult<Self> {
        let content = std::fs::read_to_string(path.as_ref())?;
        let mut config = Self::from_json_str(&content)?;
        config.source = Some(path.as_ref().to_path_buf());
        Ok(config)
    }

    /// Parse from JSON text.
    pub fn from_json_str(content: &str) -> OracleResult<Self> {
        Ok(serde_json::from_str(content)?)
    }

    /// Scenarios with the random overrides applied.
    pub fn scenarios(&self) -> Vec<Scenario> {
        self.scenarios
            .iter()
            .cloned()
            .map(|s| s.with_random_overrides(self.runs, self.bound))
            .collect()
    }

    /// Load the parameter set.
    pub fn build_params(&self) -> OracleResult<Arc<PoseidonParameters>> {
        let params = match &self.params {
            Some(path) => PoseidonParameters::from_table(&ParamTable::from_json_file(path)?)?,
            None => PoseidonParameters::circom(self.arity)?,
        };
        Ok(Arc::new(params))
    }

    /// Build the configured evaluator.
    pub fn build_evaluator(
        &self,
        params: &Arc<PoseidonParameters>,
    ) -> OracleResult<Box<dyn CircuitEvaluator>> {
        let evaluator: Box<dyn CircuitEvaluator> = match &self.evaluator {
            EvaluatorConfig::Reference => Box::new(PoseidonCircuit::new(Arc::clone(params))),
            EvaluatorConfig::Command {
                program,
                args,
                r1cs,
            } => Box::new(CommandEvaluator::with_r1cs_file(program, args.clone(), r1cs)?),
        };
        Ok(evaluator)
    }

    /// Build the oracle described by this configuration.
    pub fn build_oracle(&self) -> OracleResult<TestOracle> {
        let params = self.build_params()?;
        let evaluator = self.build_evaluator(&params)?;
        tracing::debug!(
            params = %params.id(),
            evaluator = evaluator.name(),
            "oracle configured"
        );
        Ok(TestOracle::new(params, evaluator)
            .with_violation_mode(self.violation_mode)
            .with_input_name(self.input_name.as_str())
            .with_config_path(self.source.clone()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::conformance::InputSource;

    #[test]
    fn test_empty_object_is_default() {
        let config = OracleConfig::from_json_str("{}").unwrap();
        assert_eq!(config, OracleConfig::default());
        assert_eq!(config.scenarios().len(), 2);
    }

    #[test]
    fn test_command_evaluator_config() {
        let config = OracleConfig::from_json_str(
            r#"{"evaluator": {"kind": "command", "program": "./gen.sh", "r1cs": "c.json"},
                "seed": 9, "runs": 5, "violation_mode": "all"}"#,
        )
        .unwrap();
        assert_eq!(
            config.evaluator,
            EvaluatorConfig::Command {
                program: PathBuf::from("./gen.sh"),
                args: Vec::new(),
                r1cs: PathBuf::from("c.json"),
            }
        );
        assert_eq!(config.violation_mode, ViolationMode::All);
        let random = config
            .scenarios()
            .into_iter()
            .find(|s| matches!(s.input, InputSource::Random { .. }))
            .unwrap();
        assert_eq!(random.input.cases(), 5);
    }

    #[test]
    fn test_build_reference_oracle() {
        let oracle = OracleConfig::default().build_oracle().unwrap();
        assert_eq!(oracle.evaluator_name(), "reference");
        assert_eq!(oracle.hasher().arity(), 2);
    }

    #[test]
    fn test_missing_r1cs_file() {
        let config = OracleConfig {
            evaluator: EvaluatorConfig::Command {
                program: PathBuf::from("true"),
                args: Vec::new(),
                r1cs: PathBuf::from("/nonexistent/circuit.r1cs.json"),
            },
            ..OracleConfig::default()
        };
        assert!(matches!(
            config.build_oracle(),
            Err(crate::error::ErrorCode::Io(_))
        ));
    }

    #[test]
    fn test_input_name_config() {
        let config = OracleConfig::from_json_str(r#"{"input_name": "in"}"#).unwrap();
        assert_eq!(config.input_name, "in");
        assert_eq!(config.build_oracle().unwrap().input_name(), "in");
        assert_eq!(OracleConfig::default().input_name, DEFAULT_INPUT_NAME);
    }

    #[test]
    fn test_file_config_records_source() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("oracle.json");
        std::fs::write(&path, "{}").unwrap();
        let config = OracleConfig::from_json_file(&path).unwrap();
        assert_eq!(config.source.as_deref(), Some(path.as_path()));
        assert!(!serde_json::to_string(&config).unwrap().contains("source"));
    }

    #[test]
    fn test_empty_check_list_rejected() {
        let result = OracleConfig::from_json_str(
            r#"{"scenarios": [{"name": "none", "input": {"fixed": ["1", "2"]}, "checks": []}]}"#,
        );
        assert!(matches!(result, Err(crate::error::ErrorCode::Json(_))));
    }

    #[test]
    fn test_unknown_field_value_rejected() {
        assert!(OracleConfig::from_json_str(r#"{"violation_mode": "some"}"#).is_err());
    }
}
