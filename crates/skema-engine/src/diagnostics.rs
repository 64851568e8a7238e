//! Structured errors for construction and evaluation.
//!
//! Two families, matching the two phases:
//!
//! - [`ConstructionError`]: building a shape, pattern, or definition failed.
//!   Fatal and immediate; no partially-valid shape is ever produced.
//! - [`EvalError`]: a transform could not be applied. Propagates as an
//!   ordinary result value up to the top-level `evaluate` call; the engine
//!   never returns a best-effort guess.
//!
//! "No match" is deliberately not here: it is a legitimate branch outcome,
//! modeled as `Option` by the matcher.
//!
//! Errors carry rendered shape/name strings so `Display` needs no interner;
//! rendering happens once, on the cold path.

use std::fmt;

/// A shape, pattern, or named definition could not be built.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConstructionError {
    /// A `Ref` cycle with no intervening structural constructor.
    MalformedRecursion { name: String },
    /// The same capture name appears twice in one pattern.
    DuplicateCapture { name: String },
    /// A record was given two fields with the same name.
    DuplicateKey { key: String },
    /// A name was defined twice in the same registry.
    DuplicateDefinition { name: String },
    /// A frozen named record was extended after first use.
    FrozenDefinition { name: String },
    /// A shape spec could not be understood by the builder.
    InvalidSpec { reason: String },
}

impl fmt::Display for ConstructionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MalformedRecursion { name } => write!(
                f,
                "definition of '{name}' recurs without passing through a tuple, record, array, or function"
            ),
            Self::DuplicateCapture { name } => {
                write!(f, "capture '{name}' appears more than once in the same pattern")
            }
            Self::DuplicateKey { key } => {
                write!(f, "record declares field '{key}' more than once")
            }
            Self::DuplicateDefinition { name } => {
                write!(f, "shape '{name}' is already defined")
            }
            Self::FrozenDefinition { name } => {
                write!(f, "shape '{name}' is frozen and can no longer be extended")
            }
            Self::InvalidSpec { reason } => write!(f, "invalid shape spec: {reason}"),
        }
    }
}

impl std::error::Error for ConstructionError {}

/// A transform could not be applied to a shape.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EvalError {
    /// A field-oriented transform was applied to a non-record shape.
    ExpectedRecord {
        operation: &'static str,
        actual: String,
    },
    /// Two fields renamed to the same output key.
    KeyCollision { key: String },
    /// The recursion guard tripped: depth, iteration budget, distribution
    /// width, or mapped-key count. Carries the offending transform/shape
    /// pair for diagnostics.
    RecursionLimitExceeded { transform: String, shape: String },
    /// A shape constant mentioned a capture with no binding in scope.
    UnboundCapture { name: String },
    /// `RecurseSelf` was evaluated outside any named transform.
    RecurseOutsideNamed,
}

impl fmt::Display for EvalError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ExpectedRecord { operation, actual } => {
                write!(f, "{operation} expects a record shape, got {actual}")
            }
            Self::KeyCollision { key } => {
                write!(f, "field rename produced duplicate key '{key}'")
            }
            Self::RecursionLimitExceeded { transform, shape } => {
                write!(f, "recursion limit exceeded evaluating {transform} on {shape}")
            }
            Self::UnboundCapture { name } => {
                write!(f, "capture '{name}' is not bound in the current environment")
            }
            Self::RecurseOutsideNamed => {
                write!(f, "RecurseSelf used outside a named transform")
            }
        }
    }
}

impl std::error::Error for EvalError {}
