//! Centralized limits and thresholds for the shape engine.
//!
//! Shared constants for capacity and work budgets used throughout the
//! workspace. Centralizing them prevents duplicate definitions with
//! inconsistent values and documents the rationale for each limit.
//!
//! Recursion limits for the evaluator itself (depth, iteration budget) live
//! in `skema_engine::recursion::RecursionProfile` rather than here; the
//! profiles are the single source of truth for guarded recursion.

/// Inline capacity for shape lists (union members, tuple elements, params).
///
/// Lists backed by `SmallVec<[ShapeId; 8]>` hold up to 8 elements without
/// heap allocation. Most unions and tuples in real schemas have fewer than 8
/// members, so this avoids allocation overhead in the common case.
pub const SHAPE_LIST_INLINE: usize = 8;

/// Maximum union members when distributing a conditional transform.
///
/// Evaluating a conditional over a union re-evaluates the whole conditional
/// once per member. This caps the member count to prevent combinatorial
/// blowup when distributed conditionals nest; exceeding it surfaces the
/// engine's resource-limit error instead of hanging.
pub const MAX_DISTRIBUTION_SIZE: usize = 100;

/// Maximum fields a mapped-field transform will iterate.
///
/// A `MapFields` transform walks every field of its source record. Schemas
/// produced by generators can carry absurd field counts; past this limit the
/// evaluator refuses rather than chewing through them.
pub const MAX_MAPPED_KEYS: usize = 500;

/// Maximum keys in the recursion guard's visiting set.
///
/// A runaway transform that keeps producing fresh shapes would otherwise
/// grow the cycle-detection set without bound before the depth limit trips.
pub const MAX_VISITING_SET_SIZE: u32 = 10_000;
