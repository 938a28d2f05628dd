//! Conformance testing: scenario oracle and vector corpus.
//!
//! Two ways of checking the crate against the outside world:
//!
//! - [`TestOracle`] runs [`Scenario`]s: each case is hashed with the
//!   reference Poseidon, evaluated by a [`crate::circuit::CircuitEvaluator`],
//!   and the resulting witness verified. Failing cases carry a
//!   [`ReproBundle`].
//! - [`CorpusRunner`] replays fixed vectors from `corpus/corpus.json`
//!   (field reduction, inverses, hashes, parameter sets, circuit witnesses).

pub mod corpus;
mod harness;
mod random;
mod repro;
mod scenario;

pub use corpus::{Corpus, CorpusResults, CorpusRunner, TestResult, TestVector};
pub use harness::{BatchResult, CaseResult, ErrorDetail, FailureDetail, TestOracle};
pub use random::{ChaChaSource, RandomSource, SequenceSource};
pub use repro::ReproBundle;
pub use scenario::{
    InputSlot, InputSource, Scenario, DEFAULT_RANDOM_BOUND, DEFAULT_RANDOM_RUNS,
};
