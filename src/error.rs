//! Error handling for the Poseidon oracle.
//!
//! Every fallible operation in the crate reports one of these codes. Codes
//! are stable: the numeric value is part of the corpus format and of the
//! CLI's JSON output, so new variants get new numbers and old numbers are
//! never reused.

use thiserror::Error;

/// All error codes reported by the oracle.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Error)]
pub enum ErrorCode {
    /// Inverse of the additive identity was requested.
    #[error("DivisionByZero")]
    DivisionByZero,

    /// Bytes do not encode a canonical field element (value >= p).
    #[error("NonCanonicalFr({0})")]
    NonCanonicalFr(String),

    /// Input was not valid hex.
    #[error("InvalidHex({0})")]
    InvalidHex(String),

    /// Input was not a valid decimal integer.
    #[error("InvalidDecimal({0})")]
    InvalidDecimal(String),

    /// Input had the wrong length.
    #[error("WrongLength(expected {expected}, got {got})")]
    WrongLength {
        /// Expected length.
        expected: u64,
        /// Actual length.
        got: u64,
    },

    /// Parameter set violates its shape invariants.
    #[error("MalformedParameters({0})")]
    MalformedParameters(String),

    /// Wrong number of inputs presented to a fixed-arity hash.
    #[error("ArityMismatch(expected {expected}, got {got})")]
    ArityMismatch {
        /// Arity the hash instance was built for.
        expected: usize,
        /// Number of inputs presented.
        got: usize,
    },

    /// Witness slot 0 is not the field element 1.
    #[error("ValiditySlotMismatch(found {found})")]
    ValiditySlotMismatch {
        /// Value found in slot 0 (decimal).
        found: String,
    },

    /// Witness output slot differs from the reference hash.
    #[error("OutputMismatch(expected {expected}, found {found})")]
    OutputMismatch {
        /// Reference hash output (decimal).
        expected: String,
        /// Value found in the witness output slot (decimal).
        found: String,
    },

    /// A rank-1 constraint does not hold for the witness.
    #[error("ConstraintViolation(index {index})")]
    ConstraintViolation {
        /// Index of the violated constraint.
        index: usize,
    },

    /// Witness is too short to contain a required slot.
    #[error("WitnessTooShort(need {needed}, have {len})")]
    WitnessTooShort {
        /// Minimum number of signals required.
        needed: usize,
        /// Actual witness length.
        len: usize,
    },

    /// A constraint references a signal outside the witness.
    #[error("SignalOutOfRange(constraint {constraint}, signal {signal})")]
    SignalOutOfRange {
        /// Constraint index.
        constraint: usize,
        /// Referenced signal index.
        signal: usize,
    },

    /// The external circuit evaluator failed.
    #[error("EvaluatorFailed({0})")]
    EvaluatorFailed(String),

    /// File or process I/O failed.
    #[error("Io({0})")]
    Io(String),

    /// JSON document could not be parsed or had the wrong shape.
    #[error("Json({0})")]
    Json(String),
}

impl ErrorCode {
    /// Get the numeric error code.
    pub fn code(&self) -> u32 {
        match self {
            ErrorCode::DivisionByZero => 300,
            ErrorCode::NonCanonicalFr(_) => 301,
            ErrorCode::InvalidHex(_) => 302,
            ErrorCode::InvalidDecimal(_) => 303,
            ErrorCode::WrongLength { .. } => 304,
            ErrorCode::MalformedParameters(_) => 400,
            ErrorCode::ArityMismatch { .. } => 401,
            ErrorCode::ValiditySlotMismatch { .. } => 500,
            ErrorCode::OutputMismatch { .. } => 501,
            ErrorCode::ConstraintViolation { .. } => 502,
            ErrorCode::WitnessTooShort { .. } => 503,
            ErrorCode::SignalOutOfRange { .. } => 504,
            ErrorCode::EvaluatorFailed(_) => 600,
            ErrorCode::Io(_) => 700,
            ErrorCode::Json(_) => 701,
        }
    }

    /// Get the error name as a string.
    pub fn name(&self) -> &'static str {
        match self {
            ErrorCode::DivisionByZero => "DivisionByZero",
            ErrorCode::NonCanonicalFr(_) => "NonCanonicalFr",
            ErrorCode::InvalidHex(_) => "InvalidHex",
            ErrorCode::InvalidDecimal(_) => "InvalidDecimal",
            ErrorCode::WrongLength { .. } => "WrongLength",
            ErrorCode::MalformedParameters(_) => "MalformedParameters",
            ErrorCode::ArityMismatch { .. } => "ArityMismatch",
            ErrorCode::ValiditySlotMismatch { .. } => "ValiditySlotMismatch",
            ErrorCode::OutputMismatch { .. } => "OutputMismatch",
            ErrorCode::ConstraintViolation { .. } => "ConstraintViolation",
            ErrorCode::WitnessTooShort { .. } => "WitnessTooShort",
            ErrorCode::SignalOutOfRange { .. } => "SignalOutOfRange",
            ErrorCode::EvaluatorFailed(_) => "EvaluatorFailed",
            ErrorCode::Io(_) => "Io",
            ErrorCode::Json(_) => "Json",
        }
    }

    /// True for the three verification failures reported by the witness
    /// verifier (as opposed to setup or I/O errors).
    pub fn is_verification_failure(&self) -> bool {
        matches!(
            self,
            ErrorCode::ValiditySlotMismatch { .. }
                | ErrorCode::OutputMismatch { .. }
                | ErrorCode::ConstraintViolation { .. }
        )
    }
}

impl From<std::io::Error> for ErrorCode {
    fn from(e: std::io::Error) -> Self {
        ErrorCode::Io(e.to_string())
    }
}

impl From<serde_json::Error> for ErrorCode {
    fn from(e: serde_json::Error) -> Self {
        ErrorCode::Json(e.to_string())
    }
}

/// Result type for oracle operations.
pub type OracleResult<T> = Result<T, ErrorCode>;
