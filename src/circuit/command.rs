//! Subprocess circuit evaluator.
//!
//! Runs an external witness generator (for example a wrapper around the
//! circom-generated `generate_witness.js` plus `snarkjs wtns export json`).
//! The program receives the path of a temporary input JSON file as its last
//! argument and must print the witness as a JSON array of decimal strings
//! on stdout.

use super::{CircuitEvaluator, Evaluation, InputAssignment};
use crate::error::{ErrorCode, OracleResult};
use crate::r1cs::{ConstraintSystem, Witness};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::process::Command;
use std::sync::Arc;

/// Evaluator backed by an external program.
#[derive(Debug, Clone)]
pub struct CommandEvaluator {
    program: PathBuf,
    args: Vec<String>,
    constraints: Arc<ConstraintSystem>,
    name: String,
}

impl CommandEvaluator {
    /// Evaluator running `program args.. <input.json>`, checked against an
    /// already loaded constraint system.
    pub fn new<P: AsRef<Path>>(
        program: P,
        args: Vec<String>,
        constraints: Arc<ConstraintSystem>,
    ) -> Self {
        let program = program.as_ref().to_path_buf();
        let name = program
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| "command".to_string());
        Self {
            program,
            args,
            constraints,
            name,
        }
    }

    /// Like [`CommandEvaluator::new`], loading constraints from a snarkjs
    /// R1CS JSON export.
    pub fn with_r1cs_file<P: AsRef<Path>, R: AsRef<Path>>(
        program: P,
        args: Vec<String>,
        r1cs_path: R,
    ) -> OracleResult<Self> {
        let constraints = ConstraintSystem::from_snarkjs_file(r1cs_path)?;
        Ok(Self::new(program, args, Arc::new(constraints)))
    }

    /// True if the program path exists, or it is a bare name (resolved
    /// through `PATH` at spawn time).
    pub fn is_available(&self) -> bool {
        self.program.components().count() == 1 || self.program.exists()
    }

    fn create_input_file(&self, input: &InputAssignment) -> OracleResult<tempfile::NamedTempFile> {
        let mut file = tempfile::NamedTempFile::with_suffix(".json")?;
        file.write_all(input.to_json().as_bytes())?;
        file.flush()?;
        Ok(file)
    }
}

impl CircuitEvaluator for CommandEvaluator {
    fn evaluate(&self, input: &InputAssignment) -> OracleResult<Evaluation> {
        let input_file = self.create_input_file(input)?;

        tracing::debug!(program = %self.program.display(), "running witness generator");
        let output = Command::new(&self.program)
            .args(&self.args)
            .arg(input_file.path())
            .output()
            .map_err(|e| {
                ErrorCode::EvaluatorFailed(format!("{}: {}", self.program.display(), e))
            })?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            tracing::warn!(
                program = %self.program.display(),
                status = %output.status,
                "witness generator failed"
            );
            return Err(ErrorCode::EvaluatorFailed(format!(
                "{} exited with {}: {}",
                self.program.display(),
                output.status,
                stderr.trim()
            )));
        }

        let stdout = String::from_utf8_lossy(&output.stdout);
        let witness = Witness::from_snarkjs_json(&stdout).map_err(|e| {
            ErrorCode::EvaluatorFailed(format!("unreadable witness output: {}", e))
        })?;

        Ok(Evaluation {
            witness,
            constraints: Arc::clone(&self.constraints),
        })
    }

    fn name(&self) -> &str {
        &self.name
    }
}
