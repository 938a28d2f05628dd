//! Witness verification.
//!
//! Three independent checks against an externally produced witness:
//!
//! | Check | Holds when | Failure |
//! |-------|------------|---------|
//! | validity | `w[0] == 1` | `ValiditySlotMismatch` |
//! | output | `w[1] == reference` | `OutputMismatch` |
//! | constraints | `(A.w)(B.w) == C.w` for every constraint | `ConstraintViolation` |
//!
//! [`WitnessVerifier::verify`] runs any subset and reports every requested
//! check on its own; one failing check never hides another.

use crate::error::{ErrorCode, OracleResult};
use crate::field::Fr;
use crate::r1cs::{ConstraintSystem, Witness, OUTPUT_SLOT, VALIDITY_SLOT};
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

/// One of the three witness checks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Check {
    /// `w[0]` is the field element 1.
    #[serde(rename = "validity")]
    ValiditySlot,
    /// `w[1]` equals the reference hash.
    #[serde(rename = "output")]
    OutputEquivalence,
    /// Every constraint holds.
    #[serde(rename = "constraints")]
    ConstraintSatisfaction,
}

impl Check {
    /// All checks, in reporting order.
    pub const ALL: [Check; 3] = [
        Check::ValiditySlot,
        Check::OutputEquivalence,
        Check::ConstraintSatisfaction,
    ];

    /// Short name used in config files and on the command line.
    pub fn as_str(&self) -> &'static str {
        match self {
            Check::ValiditySlot => "validity",
            Check::OutputEquivalence => "output",
            Check::ConstraintSatisfaction => "constraints",
        }
    }
}

impl fmt::Display for Check {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Check {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "validity" | "validity_slot" => Ok(Check::ValiditySlot),
            "output" | "output_equivalence" => Ok(Check::OutputEquivalence),
            "constraints" | "constraint_satisfaction" => Ok(Check::ConstraintSatisfaction),
            other => Err(format!(
                "unknown check '{}' (expected validity, output or constraints)",
                other
            )),
        }
    }
}

/// Non-empty subset of checks to run.
///
/// Parsing and deserialization reject an empty selection.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "BTreeSet<Check>", into = "BTreeSet<Check>")]
pub struct CheckSet(BTreeSet<Check>);

impl CheckSet {
    /// All three checks.
    pub fn all() -> Self {
        Self(Check::ALL.into_iter().collect())
    }

    /// Only the validity slot.
    pub fn validity_only() -> Self {
        Self::only(&[Check::ValiditySlot])
    }

    /// Exactly the listed checks.
    pub fn only(checks: &[Check]) -> Self {
        Self(checks.iter().copied().collect())
    }

    /// True if `check` is selected.
    pub fn contains(&self, check: Check) -> bool {
        self.0.contains(&check)
    }

    /// Selected checks in reporting order.
    pub fn iter(&self) -> impl Iterator<Item = Check> + '_ {
        self.0.iter().copied()
    }

    /// True if nothing is selected.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl Default for CheckSet {
    fn default() -> Self {
        Self::all()
    }
}

impl TryFrom<BTreeSet<Check>> for CheckSet {
    type Error = String;

    fn try_from(checks: BTreeSet<Check>) -> Result<Self, Self::Error> {
        if checks.is_empty() {
            return Err(
                "no checks selected (expected validity, output or constraints)".to_string(),
            );
        }
        Ok(Self(checks))
    }
}

impl From<CheckSet> for BTreeSet<Check> {
    fn from(set: CheckSet) -> Self {
        set.0
    }
}

impl FromStr for CheckSet {
    type Err = String;

    /// Comma-separated list, e.g. `validity,output`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let checks = s
            .split(',')
            .filter(|part| !part.trim().is_empty())
            .map(Check::from_str)
            .collect::<Result<BTreeSet<_>, _>>()?;
        Self::try_from(checks)
    }
}

/// How many constraint violations to collect.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ViolationMode {
    /// Stop at the first failing constraint.
    #[default]
    FirstOnly,
    /// Report every failing constraint.
    All,
}

/// Result of one check.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CheckOutcome {
    /// Which check ran.
    pub check: Check,
    /// Failures found; empty on pass.
    pub failures: Vec<ErrorCode>,
}

impl CheckOutcome {
    fn pass(check: Check) -> Self {
        Self {
            check,
            failures: Vec::new(),
        }
    }

    fn fail(check: Check, error: ErrorCode) -> Self {
        Self {
            check,
            failures: vec![error],
        }
    }

    /// True if the check held.
    pub fn passed(&self) -> bool {
        self.failures.is_empty()
    }

    /// First failure, if any.
    pub fn first_failure(&self) -> Option<&ErrorCode> {
        self.failures.first()
    }

    /// `Ok(())` on pass, the first failure otherwise.
    pub fn into_result(self) -> OracleResult<()> {
        match self.failures.into_iter().next() {
            None => Ok(()),
            Some(e) => Err(e),
        }
    }
}

/// Per-check outcomes of one verification, in [`Check::ALL`] order.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct VerificationReport {
    /// One entry per requested check.
    pub outcomes: Vec<CheckOutcome>,
}

impl VerificationReport {
    /// True if at least one check ran and every check passed.
    pub fn passed(&self) -> bool {
        !self.outcomes.is_empty() && self.outcomes.iter().all(CheckOutcome::passed)
    }

    /// Outcome of `check`, if it was requested.
    pub fn outcome(&self, check: Check) -> Option<&CheckOutcome> {
        self.outcomes.iter().find(|o| o.check == check)
    }

    /// All failures across checks.
    pub fn failures(&self) -> impl Iterator<Item = &ErrorCode> {
        self.outcomes.iter().flat_map(|o| o.failures.iter())
    }

    /// One line per check, e.g. `validity: ok`.
    pub fn summary(&self) -> String {
        self.outcomes
            .iter()
            .map(|o| match o.first_failure() {
                None => format!("{}: ok", o.check),
                Some(e) if o.failures.len() == 1 => format!("{}: FAIL {}", o.check, e),
                Some(e) => format!(
                    "{}: FAIL {} (+{} more)",
                    o.check,
                    e,
                    o.failures.len() - 1
                ),
            })
            .collect::<Vec<_>>()
            .join("\n")
    }

    /// Machine-readable form.
    pub fn to_json(&self) -> serde_json::Value {
        let checks: Vec<serde_json::Value> = self
            .outcomes
            .iter()
            .map(|o| {
                let failures: Vec<serde_json::Value> = o
                    .failures
                    .iter()
                    .map(|e| json!({ "code": e.code(), "name": e.name(), "message": e.to_string() }))
                    .collect();
                json!({ "check": o.check.as_str(), "passed": o.passed(), "failures": failures })
            })
            .collect();
        json!({ "passed": self.passed(), "checks": checks })
    }
}

/// Checks witnesses against a reference output and a constraint system.
#[derive(Debug, Clone, Copy, Default)]
pub struct WitnessVerifier {
    mode: ViolationMode,
}

impl WitnessVerifier {
    /// Verifier with the given constraint-violation mode.
    pub fn new(mode: ViolationMode) -> Self {
        Self { mode }
    }

    /// Constraint-violation mode in use.
    pub fn mode(&self) -> ViolationMode {
        self.mode
    }

    /// `w[0]` must be 1.
    pub fn check_validity_slot(&self, witness: &Witness) -> CheckOutcome {
        let check = Check::ValiditySlot;
        match witness.slot(VALIDITY_SLOT) {
            Err(e) => CheckOutcome::fail(check, e),
            Ok(v) if v == Fr::ONE => CheckOutcome::pass(check),
            Ok(v) => CheckOutcome::fail(
                check,
                ErrorCode::ValiditySlotMismatch {
                    found: v.to_decimal(),
                },
            ),
        }
    }

    /// `w[1]` must equal `reference`.
    pub fn check_output(&self, witness: &Witness, reference: Fr) -> CheckOutcome {
        let check = Check::OutputEquivalence;
        match witness.slot(OUTPUT_SLOT) {
            Err(e) => CheckOutcome::fail(check, e),
            Ok(v) if v == reference => CheckOutcome::pass(check),
            Ok(v) => CheckOutcome::fail(
                check,
                ErrorCode::OutputMismatch {
                    expected: reference.to_decimal(),
                    found: v.to_decimal(),
                },
            ),
        }
    }

    /// Every constraint must hold. Collects one failure or all of them
    /// depending on the verifier's [`ViolationMode`].
    pub fn check_constraints(&self, witness: &Witness, cs: &ConstraintSystem) -> CheckOutcome {
        let mut outcome = CheckOutcome::pass(Check::ConstraintSatisfaction);
        for (index, constraint) in cs.constraints().iter().enumerate() {
            let failure = match constraint.is_satisfied(witness, index) {
                Ok(true) => continue,
                Ok(false) => ErrorCode::ConstraintViolation { index },
                Err(e) => e,
            };
            tracing::debug!(index, error = %failure, "constraint check failed");
            outcome.failures.push(failure);
            if self.mode == ViolationMode::FirstOnly {
                break;
            }
        }
        outcome
    }

    /// Run the selected checks.
    pub fn verify(
        &self,
        witness: &Witness,
        reference: Fr,
        cs: &ConstraintSystem,
        checks: &CheckSet,
    ) -> VerificationReport {
        let outcomes: Vec<CheckOutcome> = checks
            .iter()
            .map(|check| match check {
                Check::ValiditySlot => self.check_validity_slot(witness),
                Check::OutputEquivalence => self.check_output(witness, reference),
                Check::ConstraintSatisfaction => self.check_constraints(witness, cs),
            })
            .collect();
        let report = VerificationReport { outcomes };
        tracing::debug!(
            passed = report.passed(),
            checks = report.outcomes.len(),
            "witness verified"
        );
        report
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::r1cs::{Constraint, LinearCombination};

    /// out = in^2 with layout [1, out, in].
    fn square_system() -> ConstraintSystem {
        ConstraintSystem::new(vec![Constraint::new(
            LinearCombination::signal(2),
            LinearCombination::signal(2),
            LinearCombination::signal(1),
        )])
    }

    fn w(values: &[u64]) -> Witness {
        Witness::new(values.iter().map(|&v| Fr::from_u64(v)).collect())
    }

    #[test]
    fn test_all_checks_pass() {
        let report = WitnessVerifier::default().verify(
            &w(&[1, 49, 7]),
            Fr::from_u64(49),
            &square_system(),
            &CheckSet::all(),
        );
        assert!(report.passed());
        assert_eq!(report.outcomes.len(), 3);
    }

    #[test]
    fn test_checks_reported_independently() {
        // Bad validity slot and wrong reference, constraints still hold.
        let report = WitnessVerifier::default().verify(
            &w(&[0, 49, 7]),
            Fr::from_u64(50),
            &square_system(),
            &CheckSet::all(),
        );
        assert!(!report.passed());
        assert_eq!(
            report.outcome(Check::ValiditySlot).unwrap().failures,
            vec![ErrorCode::ValiditySlotMismatch {
                found: "0".to_string()
            }]
        );
        assert_eq!(
            report.outcome(Check::OutputEquivalence).unwrap().failures,
            vec![ErrorCode::OutputMismatch {
                expected: "50".to_string(),
                found: "49".to_string()
            }]
        );
        assert!(report.outcome(Check::ConstraintSatisfaction).unwrap().passed());
    }

    #[test]
    fn test_subset_only() {
        let report = WitnessVerifier::default().verify(
            &w(&[1, 48, 7]),
            Fr::from_u64(1234),
            &square_system(),
            &CheckSet::validity_only(),
        );
        assert!(report.passed());
        assert!(report.outcome(Check::OutputEquivalence).is_none());
    }

    #[test]
    fn test_violation_modes() {
        let cs = ConstraintSystem::new(vec![
            Constraint::new(
                LinearCombination::signal(2),
                LinearCombination::signal(2),
                LinearCombination::signal(1),
            ),
            Constraint::new(
                LinearCombination::signal(2),
                LinearCombination::signal(0),
                LinearCombination::signal(2),
            ),
            Constraint::new(
                LinearCombination::signal(1),
                LinearCombination::signal(0),
                LinearCombination::signal(2),
            ),
        ]);
        let witness = w(&[1, 48, 7]);
        let first = WitnessVerifier::new(ViolationMode::FirstOnly).check_constraints(&witness, &cs);
        assert_eq!(
            first.failures,
            vec![ErrorCode::ConstraintViolation { index: 0 }]
        );
        let all = WitnessVerifier::new(ViolationMode::All).check_constraints(&witness, &cs);
        assert_eq!(
            all.failures,
            vec![
                ErrorCode::ConstraintViolation { index: 0 },
                ErrorCode::ConstraintViolation { index: 2 }
            ]
        );
    }

    #[test]
    fn test_short_witness() {
        let verifier = WitnessVerifier::default();
        assert_eq!(
            verifier.check_output(&w(&[1]), Fr::ONE).failures,
            vec![ErrorCode::WitnessTooShort { needed: 2, len: 1 }]
        );
        assert_eq!(
            verifier.check_validity_slot(&Witness::default()).into_result(),
            Err(ErrorCode::WitnessTooShort { needed: 1, len: 0 })
        );
        let outcome = verifier.check_constraints(&w(&[1, 0]), &square_system());
        assert_eq!(
            outcome.failures,
            vec![ErrorCode::SignalOutOfRange {
                constraint: 0,
                signal: 2
            }]
        );
    }

    #[test]
    fn test_check_set_parsing() {
        let set: CheckSet = "validity, constraints".parse().unwrap();
        assert!(set.contains(Check::ValiditySlot));
        assert!(!set.contains(Check::OutputEquivalence));
        assert!(set.contains(Check::ConstraintSatisfaction));
        assert!("validity,bogus".parse::<CheckSet>().is_err());
        assert_eq!(
            serde_json::to_string(&CheckSet::all()).unwrap(),
            r#"["validity","output","constraints"]"#
        );
        let back: CheckSet = serde_json::from_str(r#"["output"]"#).unwrap();
        assert_eq!(back, CheckSet::only(&[Check::OutputEquivalence]));
    }

    #[test]
    fn test_empty_check_set_rejected() {
        assert!("".parse::<CheckSet>().is_err());
        assert!(" , ".parse::<CheckSet>().is_err());
        assert!(serde_json::from_str::<CheckSet>("[]").is_err());
    }

    #[test]
    fn test_empty_report_does_not_pass() {
        let report = WitnessVerifier::default().verify(
            &w(&[0]),
            Fr::ONE,
            &square_system(),
            &CheckSet::only(&[]),
        );
        assert!(report.outcomes.is_empty());
        assert!(!report.passed());
    }

    #[test]
    fn test_report_json() {
        let report = WitnessVerifier::default().verify(
            &w(&[2, 49, 7]),
            Fr::from_u64(49),
            &square_system(),
            &CheckSet::validity_only(),
        );
        let value = report.to_json();
        assert_eq!(value["passed"], false);
        assert_eq!(value["checks"][0]["check"], "validity");
        assert_eq!(value["checks"][0]["failures"][0]["code"], 500);
        assert_eq!(report.summary(), "validity: FAIL ValiditySlotMismatch(found 2)");
    }
}
