//! Scenario harness: reference hash vs circuit witness.

use super::random::RandomSource;
use super::repro::ReproBundle;
use super::scenario::Scenario;
use crate::circuit::{CircuitEvaluator, InputAssignment, PoseidonCircuit, DEFAULT_INPUT_NAME};
use crate::error::{ErrorCode, OracleResult};
use crate::field::Fr;
use crate::poseidon::{PoseidonHash, PoseidonParameters};
use crate::r1cs::Witness;
use crate::verifier::{CheckSet, VerificationReport, ViolationMode, WitnessVerifier};
use std::path::PathBuf;
use std::sync::Arc;

/// Outcome of one case.
#[derive(Debug)]
pub enum CaseResult {
    /// Every requested check held.
    Pass,
    /// At least one check failed.
    Fail {
        /// Per-check outcomes.
        report: VerificationReport,
        /// Repro bundle for debugging.
        repro: Box<ReproBundle>,
    },
}

impl CaseResult {
    /// Check if the case passed.
    pub fn is_pass(&self) -> bool {
        matches!(self, Self::Pass)
    }
}

/// Drives scenarios through the reference hash, an evaluator and the
/// verifier.
///
/// Holds no per-scenario state: one oracle can run any number of
/// scenarios, from several threads at once.
pub struct TestOracle {
    hasher: PoseidonHash,
    evaluator: Box<dyn CircuitEvaluator>,
    verifier: WitnessVerifier,
    input_name: String,
    config_path: Option<PathBuf>,
}

impl TestOracle {
    /// Oracle over `params`, checking witnesses from `evaluator`.
    pub fn new(params: Arc<PoseidonParameters>, evaluator: Box<dyn CircuitEvaluator>) -> Self {
        Self {
            hasher: PoseidonHash::new(params),
            evaluator,
            verifier: WitnessVerifier::default(),
            input_name: DEFAULT_INPUT_NAME.to_string(),
            config_path: None,
        }
    }

    /// Oracle checking the in-process reference circuit (for testing without
    /// an external toolchain).
    pub fn reference(params: Arc<PoseidonParameters>) -> Self {
        let circuit = PoseidonCircuit::new(Arc::clone(&params));
        Self::new(params, Box::new(circuit))
    }

    /// Set how constraint violations are collected.
    pub fn with_violation_mode(mut self, mode: ViolationMode) -> Self {
        self.verifier = WitnessVerifier::new(mode);
        self
    }

    /// Set the signal name the inputs are written under.
    pub fn with_input_name(mut self, name: impl Into<String>) -> Self {
        self.input_name = name.into();
        self
    }

    /// Record the config file this oracle was built from; repro bundles
    /// name it in their rerun command.
    pub fn with_config_path(mut self, path: Option<PathBuf>) -> Self {
        self.config_path = path;
        self
    }

    /// Signal name of the input array.
    pub fn input_name(&self) -> &str {
        &self.input_name
    }

    /// The reference hash in use.
    pub fn hasher(&self) -> &PoseidonHash {
        &self.hasher
    }

    /// Name of the evaluator under test.
    pub fn evaluator_name(&self) -> &str {
        self.evaluator.name()
    }

    /// Hash `inputs`, evaluate the circuit on them and verify.
    ///
    /// Errors are setup failures (wrong arity, evaluator crash, ..);
    /// verification failures are reported in the returned report.
    pub fn check(
        &self,
        inputs: &[Fr],
        checks: &CheckSet,
    ) -> OracleResult<(Fr, Witness, VerificationReport)> {
        let reference = self.hasher.hash(inputs)?;
        let evaluation = self
            .evaluator
            .evaluate(&InputAssignment::named(&self.input_name, inputs.to_vec()))?;
        let report = self.verifier.verify(
            &evaluation.witness,
            reference,
            &evaluation.constraints,
            checks,
        );
        Ok((reference, evaluation.witness, report))
    }

    fn run_case(
        &self,
        scenario: &Scenario,
        case: usize,
        inputs: &[Fr],
        seed: Option<u64>,
    ) -> OracleResult<CaseResult> {
        let (reference, witness, report) = self.check(inputs, &scenario.checks)?;
        if report.passed() {
            return Ok(CaseResult::Pass);
        }
        let repro = ReproBundle::new(
            &scenario.name,
            case,
            self.evaluator.name(),
            inputs,
            reference,
            &witness,
            &report,
            seed,
        )
        .with_config(self.config_path.as_deref());
        Ok(CaseResult::Fail {
            report,
            repro: Box::new(repro),
        })
    }

    /// Run every case of `scenario`.
    pub fn run(&self, scenario: &Scenario, rng: &mut dyn RandomSource) -> BatchResult {
        let mut results = BatchResult::new(&scenario.name);
        let seed = rng.seed();

        for case in 0..scenario.input.cases() {
            let inputs = scenario.input.draw(rng);
            match self.run_case(scenario, case, &inputs, seed) {
                Ok(CaseResult::Pass) => results.record_pass(),
                Ok(CaseResult::Fail { report, repro }) => {
                    tracing::warn!(
                        scenario = %scenario.name,
                        case,
                        failures = %report.summary(),
                        "witness verification failed"
                    );
                    results.record_fail(case, inputs, report, *repro);
                }
                Err(error) => {
                    tracing::warn!(scenario = %scenario.name, case, %error, "case errored");
                    results.record_error(case, inputs, error);
                }
            }
        }

        tracing::info!(
            scenario = %scenario.name,
            evaluator = self.evaluator.name(),
            summary = %results.summary(),
            "scenario finished"
        );
        results
    }

    /// Run scenarios in order. A failing scenario never stops the next.
    pub fn run_suite(&self, scenarios: &[Scenario], rng: &mut dyn RandomSource) -> Vec<BatchResult> {
        scenarios.iter().map(|s| self.run(s, rng)).collect()
    }
}

/// Results from running one scenario.
#[derive(Debug)]
pub struct BatchResult {
    /// Scenario name.
    pub scenario: String,
    /// Number of cases that passed.
    pub passed: usize,
    /// Number of cases that failed verification.
    pub failed: usize,
    /// Number of cases that errored before verification.
    pub errors: usize,
    /// Details of failures.
    pub failures: Vec<FailureDetail>,
    /// Details of errors.
    pub error_details: Vec<ErrorDetail>,
}

/// Details about a failed case.
#[derive(Debug)]
pub struct FailureDetail {
    /// Case number.
    pub case: usize,
    /// Inputs of the case.
    pub inputs: Vec<Fr>,
    /// Per-check outcomes.
    pub report: VerificationReport,
    /// Repro bundle.
    pub repro: ReproBundle,
}

/// Details about an errored case.
#[derive(Debug)]
pub struct ErrorDetail {
    /// Case number.
    pub case: usize,
    /// Inputs of the case.
    pub inputs: Vec<Fr>,
    /// Error that occurred.
    pub error: ErrorCode,
}

impl BatchResult {
    /// Create a new empty batch result.
    pub fn new(scenario: &str) -> Self {
        Self {
            scenario: scenario.to_string(),
            passed: 0,
            failed: 0,
            errors: 0,
            failures: Vec::new(),
            error_details: Vec::new(),
        }
    }

    /// Record a passing case.
    pub fn record_pass(&mut self) {
        self.passed += 1;
    }

    /// Record a failing case.
    pub fn record_fail(
        &mut self,
        case: usize,
        inputs: Vec<Fr>,
        report: VerificationReport,
        repro: ReproBundle,
    ) {
        self.failed += 1;
        self.failures.push(FailureDetail {
            case,
            inputs,
            report,
            repro,
        });
    }

    /// Record a case error.
    pub fn record_error(&mut self, case: usize, inputs: Vec<Fr>, error: ErrorCode) {
        self.errors += 1;
        self.error_details.push(ErrorDetail {
            case,
            inputs,
            error,
        });
    }

    /// Check if all cases passed.
    pub fn all_passed(&self) -> bool {
        self.failed == 0 && self.errors == 0
    }

    /// Get total number of cases run.
    pub fn total(&self) -> usize {
        self.passed + self.failed + self.errors
    }

    /// Format a summary string.
    pub fn summary(&self) -> String {
        format!(
            "{}: {} passed, {} failed, {} errors (total: {})",
            self.scenario,
            self.passed,
            self.failed,
            self.errors,
            self.total()
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::circuit::Evaluation;
    use crate::conformance::random::{ChaChaSource, SequenceSource};
    use crate::conformance::scenario::{InputSlot, InputSource};
    use crate::r1cs::VALIDITY_SLOT;

    fn params() -> Arc<PoseidonParameters> {
        Arc::new(PoseidonParameters::circom_t3().unwrap())
    }

    /// Reference circuit with the validity slot zeroed.
    struct BrokenValidity(PoseidonCircuit);

    impl CircuitEvaluator for BrokenValidity {
        fn evaluate(&self, input: &InputAssignment) -> OracleResult<Evaluation> {
            let mut eval = self.0.evaluate(input)?;
            eval.witness.set(VALIDITY_SLOT, Fr::ZERO)?;
            Ok(eval)
        }

        fn name(&self) -> &str {
            "broken-validity"
        }
    }

    /// Reference circuit that only accepts inputs under one signal name.
    struct NamedInput(PoseidonCircuit, &'static str);

    impl CircuitEvaluator for NamedInput {
        fn evaluate(&self, input: &InputAssignment) -> OracleResult<Evaluation> {
            if input.name != self.1 {
                return Err(ErrorCode::EvaluatorFailed(format!(
                    "unknown input signal {}",
                    input.name
                )));
            }
            self.0.evaluate(input)
        }

        fn name(&self) -> &str {
            "named-input"
        }
    }

    #[test]
    fn test_builtin_suite_passes_on_reference() {
        let oracle = TestOracle::reference(params());
        let mut rng = ChaChaSource::seeded(1);
        let results = oracle.run_suite(&Scenario::builtin_suite(), &mut rng);
        assert_eq!(results.len(), 2);
        assert!(results.iter().all(BatchResult::all_passed));
        assert_eq!(results[0].total(), 1);
        assert_eq!(results[1].total(), 100);
    }

    #[test]
    fn test_failures_recorded_with_repro() {
        let p = params();
        let oracle = TestOracle::new(
            Arc::clone(&p),
            Box::new(BrokenValidity(PoseidonCircuit::new(p))),
        );
        let result = oracle.run(&Scenario::deterministic_7777777(), &mut ChaChaSource::seeded(3));
        assert_eq!(result.failed, 1);
        let detail = &result.failures[0];
        assert_eq!(detail.repro.evaluator, "broken-validity");
        assert_eq!(detail.repro.validity_slot, Some(Fr::ZERO));
        assert_eq!(detail.repro.seed, Some(3));
        // w[0] is also the constant signal, so a constraint breaks too;
        // the output slot is untouched.
        assert_eq!(detail.report.failures().count(), 2);
        assert!(detail
            .report
            .outcome(crate::verifier::Check::OutputEquivalence)
            .unwrap()
            .passed());
    }

    #[test]
    fn test_input_name_reaches_evaluator() {
        let p = params();
        let named = |oracle: TestOracle| {
            oracle.run(
                &Scenario::deterministic_7777777(),
                &mut SequenceSource::new(vec![0]),
            )
        };
        let circuit = || Box::new(NamedInput(PoseidonCircuit::new(params()), "in"));

        let default = named(TestOracle::new(Arc::clone(&p), circuit()));
        assert_eq!(default.errors, 1);

        let oracle = TestOracle::new(p, circuit()).with_input_name("in");
        assert_eq!(oracle.input_name(), "in");
        assert!(named(oracle).all_passed());
    }

    #[test]
    fn test_repro_names_config_path() {
        let p = params();
        let oracle = TestOracle::new(
            Arc::clone(&p),
            Box::new(BrokenValidity(PoseidonCircuit::new(p))),
        )
        .with_config_path(Some(PathBuf::from("oracle.json")));
        let result = oracle.run(&Scenario::deterministic_7777777(), &mut ChaChaSource::seeded(3));
        let repro = &result.failures[0].repro;
        assert_eq!(repro.config, Some(PathBuf::from("oracle.json")));
        assert!(repro
            .to_report()
            .contains("oracle run --config oracle.json --seed 3"));
    }

    #[test]
    fn test_errors_do_not_stop_suite() {
        let oracle = TestOracle::reference(params());
        let bad = Scenario::fixed("wrong_arity", vec![Fr::ONE]);
        let results = oracle.run_suite(
            &[bad, Scenario::deterministic_7777777()],
            &mut SequenceSource::new(vec![0]),
        );
        assert_eq!(results[0].errors, 1);
        assert!(matches!(
            results[0].error_details[0].error,
            ErrorCode::ArityMismatch { .. }
        ));
        assert!(results[1].all_passed());
    }

    #[test]
    fn test_random_scenario_uses_source() {
        let oracle = TestOracle::reference(params());
        let scenario = Scenario {
            name: "two".to_string(),
            input: InputSource::Random {
                slots: vec![InputSlot::Random, InputSlot::Random],
                bound: 1000,
                runs: 2,
            },
            checks: CheckSet::all(),
        };
        let result = oracle.run(&scenario, &mut SequenceSource::new(vec![1, 2]));
        assert_eq!(result.passed, 2);
    }
}
