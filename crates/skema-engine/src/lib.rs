//! Structural shape algebra.
//!
//! A value-level engine for describing structural shapes and computing
//! derived shapes from them:
//!
//! - **Interned shapes**: structural descriptions (primitives, literals,
//!   tuples, records, unions, functions, named references) hash-consed to
//!   copyable [`ShapeId`]s
//! - **Matching**: structural pattern matching with named capture slots,
//!   including binding distribution over union values
//! - **Transforms**: conditional dispatch, mapped-field comprehension with
//!   key remapping, key selection, and guarded recursive self-application
//! - **Catalog**: make-optional/required/read-only, pick/omit, exclusion,
//!   deep variants, key remaps, all composed from the primitives
//!
//! Shapes are immutable once interned; every operation produces a new
//! shape and sub-shapes are structurally shared across outputs. Recursive
//! shapes go through [`registry::ShapeRegistry`] and are unfolded under a
//! recursion guard with cycle detection.

pub mod builder;
pub mod catalog;
pub mod diagnostics;
pub mod equality;
pub mod evaluate;
pub mod format;
pub mod intern;
pub mod pattern;
pub mod recursion;
pub mod registry;
mod substitute;
pub mod types;

pub use skema_common::interner::Atom;

pub use builder::{FieldSpec, LiteralSpec, ShapeSpec, build_shape, shape_from_json};
pub use diagnostics::{ConstructionError, EvalError};
pub use equality::{contains, structurally_equal};
pub use evaluate::{
    FIELD_BINDING, FieldFilter, KeyRename, NamedTransform, Toggle, Transform, TransformEvaluator,
};
pub use format::ShapeFormatter;
pub use intern::ShapeInterner;
pub use pattern::{Bindings, Pattern, compile_pattern, match_shape};
pub use recursion::{RecursionGuard, RecursionProfile, RecursionResult};
pub use registry::ShapeRegistry;
pub use substitute::substitute;
pub use types::{
    FieldFlags, FieldInfo, LiteralValue, PrimitiveKind, RecordShape, RecordShapeId, ShapeData,
    ShapeId, ShapeListId,
};

// Test modules: comprehensive suites live in ../tests and are loaded here so
// they can exercise crate internals. Unit tests for intern, equality,
// registry, builder, and recursion are inline in their source files.
#[cfg(test)]
mod test_util;
#[cfg(test)]
#[path = "../tests/matcher_tests.rs"]
mod matcher_tests;
#[cfg(test)]
#[path = "../tests/conditional_tests.rs"]
mod conditional_tests;
#[cfg(test)]
#[path = "../tests/mapped_tests.rs"]
mod mapped_tests;
#[cfg(test)]
#[path = "../tests/catalog_tests.rs"]
mod catalog_tests;
#[cfg(test)]
#[path = "../tests/law_tests.rs"]
mod law_tests;
#[cfg(test)]
#[path = "../tests/recursive_shape_tests.rs"]
mod recursive_shape_tests;
