//! Reproduction bundle for failed scenario cases.

use crate::error::OracleResult;
use crate::field::Fr;
use crate::r1cs::{Witness, OUTPUT_SLOT, VALIDITY_SLOT};
use crate::verifier::VerificationReport;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Everything needed to rerun one failing case.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReproBundle {
    /// Scenario that failed.
    pub scenario: String,
    /// Case number within the scenario.
    pub case: usize,
    /// Evaluator that produced the witness.
    pub evaluator: String,
    /// Inputs of the case.
    pub inputs: Vec<Fr>,
    /// Reference hash of the inputs.
    pub reference: Fr,
    /// Witness validity slot, if present.
    pub validity_slot: Option<Fr>,
    /// Witness output slot, if present.
    pub output_slot: Option<Fr>,
    /// Rendered failures, one per entry.
    pub failures: Vec<String>,
    /// Seed of the random stream, when reproducible.
    pub seed: Option<u64>,
    /// Config file the scenario came from.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub config: Option<PathBuf>,
}

impl ReproBundle {
    /// Capture a failing case.
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        scenario: &str,
        case: usize,
        evaluator: &str,
        inputs: &[Fr],
        reference: Fr,
        witness: &Witness,
        report: &VerificationReport,
        seed: Option<u64>,
    ) -> Self {
        Self {
            scenario: scenario.to_string(),
            case,
            evaluator: evaluator.to_string(),
            inputs: inputs.to_vec(),
            reference,
            validity_slot: witness.get(VALIDITY_SLOT),
            output_slot: witness.get(OUTPUT_SLOT),
            failures: report.failures().map(|e| e.to_string()).collect(),
            seed,
            config: None,
        }
    }

    /// Record the config file the failing scenario was loaded from.
    pub fn with_config(mut self, config: Option<&Path>) -> Self {
        self.config = config.map(Path::to_path_buf);
        self
    }

    /// File name for the JSON bundle: `<scenario>-<case>.json`, with every
    /// character outside `[A-Za-z0-9_-]` in the scenario name replaced by `_`.
    pub fn file_name(&self) -> String {
        let scenario: String = self
            .scenario
            .chars()
            .map(|c| {
                if c.is_ascii_alphanumeric() || c == '-' || c == '_' {
                    c
                } else {
                    '_'
                }
            })
            .collect();
        format!("{}-{}.json", scenario, self.case)
    }

    fn rerun_command(&self) -> String {
        match (self.seed, &self.config) {
            (Some(seed), Some(config)) => {
                format!("oracle run --config {} --seed {}", config.display(), seed)
            }
            (Some(seed), None) => format!("oracle run --seed {}", seed),
            (None, _) => {
                let inputs: Vec<String> = self.inputs.iter().map(Fr::to_decimal).collect();
                format!("oracle hash {}", inputs.join(" "))
            }
        }
    }

    /// Format as a human-readable report.
    pub fn to_report(&self) -> String {
        let inputs: Vec<String> = self.inputs.iter().map(Fr::to_decimal).collect();
        let show = |v: &Option<Fr>| v.map_or_else(|| "<missing>".to_string(), |f| f.to_decimal());
        format!(
            r#"=== Witness Verification Failure ===
Scenario: {} (case {})
Evaluator: {}
Inputs: [{}]
Reference: {}
w[0]: {}
w[1]: {}

Failures:
  {}

To reproduce:
  {}
"#,
            self.scenario,
            self.case,
            self.evaluator,
            inputs.join(", "),
            self.reference,
            show(&self.validity_slot),
            show(&self.output_slot),
            self.failures.join("\n  "),
            self.rerun_command(),
        )
    }

    /// Save the human-readable report to a file.
    pub fn save<P: AsRef<Path>>(&self, path: P) -> OracleResult<()> {
        std::fs::write(path, self.to_report())?;
        Ok(())
    }

    /// Format as JSON for machine parsing.
    pub fn to_json(&self) -> OracleResult<String> {
        Ok(serde_json::to_string(self)?)
    }
}
