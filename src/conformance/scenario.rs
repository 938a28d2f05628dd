//! Test scenarios: where inputs come from and which checks apply.

use super::random::RandomSource;
use crate::field::Fr;
use crate::verifier::CheckSet;
use serde::{Deserialize, Serialize};

/// Upper bound (exclusive) for random inputs in the built-in suite.
pub const DEFAULT_RANDOM_BOUND: u64 = 10_000_000_000;

/// Number of random cases in the built-in suite.
pub const DEFAULT_RANDOM_RUNS: usize = 100;

/// One input position of a randomized scenario.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InputSlot {
    /// Fresh bounded random integer per case.
    Random,
    /// Same value in every case.
    Fixed(Fr),
}

/// Where a scenario's inputs come from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InputSource {
    /// A single case with literal inputs.
    Fixed(Vec<Fr>),
    /// `runs` cases, random slots drawn from `[0, bound)`.
    Random {
        /// Per-position input template.
        slots: Vec<InputSlot>,
        /// Exclusive upper bound for random slots.
        bound: u64,
        /// Number of cases.
        runs: usize,
    },
}

impl InputSource {
    /// Number of cases this source produces.
    pub fn cases(&self) -> usize {
        match self {
            InputSource::Fixed(_) => 1,
            InputSource::Random { runs, .. } => *runs,
        }
    }

    /// Inputs for one case.
    pub fn draw(&self, rng: &mut dyn RandomSource) -> Vec<Fr> {
        match self {
            InputSource::Fixed(values) => values.clone(),
            InputSource::Random { slots, bound, .. } => slots
                .iter()
                .map(|slot| match slot {
                    InputSlot::Random => Fr::from_u64(rng.next_bounded(*bound)),
                    InputSlot::Fixed(v) => *v,
                })
                .collect(),
        }
    }
}

/// Named input source plus the checks asserted for every case.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Scenario {
    /// Name used in reports.
    pub name: String,
    /// Input generation.
    pub input: InputSource,
    /// Checks asserted per case.
    #[serde(default)]
    pub checks: CheckSet,
}

impl Scenario {
    /// Scenario with literal inputs and all checks.
    pub fn fixed(name: &str, inputs: Vec<Fr>) -> Self {
        Self {
            name: name.to_string(),
            input: InputSource::Fixed(inputs),
            checks: CheckSet::all(),
        }
    }

    /// `(7777777, 1)` with all three checks.
    pub fn deterministic_7777777() -> Self {
        Self::fixed(
            "deterministic_7777777",
            vec![Fr::from_u64(7_777_777), Fr::ONE],
        )
    }

    /// `(r, 1)` for 100 random `r < 10^10`, asserting only the validity
    /// slot.
    pub fn random_salt() -> Self {
        Self {
            name: "random_salt".to_string(),
            input: InputSource::Random {
                slots: vec![InputSlot::Random, InputSlot::Fixed(Fr::ONE)],
                bound: DEFAULT_RANDOM_BOUND,
                runs: DEFAULT_RANDOM_RUNS,
            },
            checks: CheckSet::validity_only(),
        }
    }

    /// The default suite.
    pub fn builtin_suite() -> Vec<Scenario> {
        vec![Self::deterministic_7777777(), Self::random_salt()]
    }

    /// Override run count and bound of a randomized scenario.
    pub fn with_random_overrides(mut self, runs: Option<usize>, bound: Option<u64>) -> Self {
        if let InputSource::Random {
            runs: r, bound: b, ..
        } = &mut self.input
        {
            if let Some(runs) = runs {
                *r = runs;
            }
            if let Some(bound) = bound {
                *b = bound;
            }
        }
        self
    }
}
