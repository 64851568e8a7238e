//! Unified recursion guard for cycle detection, depth limiting, and
//! iteration bounding in recursive shape computations.
//!
//! The guard combines three safety mechanisms:
//! 1. Cycle detection via a visiting set
//! 2. Depth limiting to prevent stack overflow
//! 3. Iteration bounding to prevent infinite loops
//!
//! [`RecursionProfile`] provides named presets so call sites say what kind
//! of recursion they are guarding instead of repeating magic numbers.

use rustc_hash::FxHashSet;
use skema_common::limits::MAX_VISITING_SET_SIZE;
use std::hash::Hash;

/// Named recursion limit presets.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecursionProfile {
    /// Transform evaluation: conditionals, mapped fields, named-transform
    /// re-entry through `RecurseSelf`. Needs the deepest limit because
    /// recursive shapes legitimately nest before a cycle is found.
    ///
    /// depth = 50, iterations = 100,000
    TransformEvaluation,

    /// Shallow shape traversal: productivity checks, capture collection.
    ///
    /// depth = 20, iterations = 100,000
    ShallowTraversal,

    /// Custom limits for one-off or test scenarios.
    Custom { max_depth: u32, max_iterations: u32 },
}

impl RecursionProfile {
    pub const fn max_depth(self) -> u32 {
        match self {
            Self::TransformEvaluation => 50,
            Self::ShallowTraversal => 20,
            Self::Custom { max_depth, .. } => max_depth,
        }
    }

    pub const fn max_iterations(self) -> u32 {
        match self {
            Self::TransformEvaluation => 100_000,
            Self::ShallowTraversal => 100_000,
            Self::Custom { max_iterations, .. } => max_iterations,
        }
    }
}

/// Result of attempting to enter a recursive computation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecursionResult {
    /// Proceed with the computation.
    Entered,
    /// The key is already in the visiting set, so this is a cycle.
    Cycle,
    /// Maximum recursion depth exceeded.
    DepthExceeded,
    /// Maximum iteration count exceeded.
    IterationExceeded,
}

impl RecursionResult {
    #[inline]
    pub fn is_entered(self) -> bool {
        matches!(self, Self::Entered)
    }

    #[inline]
    pub fn is_cycle(self) -> bool {
        matches!(self, Self::Cycle)
    }

    /// True if any limit was exceeded (depth or iterations).
    #[inline]
    pub fn is_exceeded(self) -> bool {
        matches!(self, Self::DepthExceeded | Self::IterationExceeded)
    }
}

/// Tracks recursion state for cycle detection, depth limiting, and
/// iteration bounding.
///
/// After every successful [`enter`](Self::enter) the caller must call
/// [`leave`](Self::leave) with the same key. In debug builds, leaving a key
/// that is not in the visiting set panics.
pub struct RecursionGuard<K: Hash + Eq + Copy> {
    visiting: FxHashSet<K>,
    depth: u32,
    iterations: u32,
    max_depth: u32,
    max_iterations: u32,
    exceeded: bool,
}

impl<K: Hash + Eq + Copy> RecursionGuard<K> {
    /// Create a guard with explicit limits. Prefer
    /// [`with_profile`](Self::with_profile) outside tests.
    pub fn new(max_depth: u32, max_iterations: u32) -> Self {
        Self {
            visiting: FxHashSet::default(),
            depth: 0,
            iterations: 0,
            max_depth,
            max_iterations,
            exceeded: false,
        }
    }

    pub fn with_profile(profile: RecursionProfile) -> Self {
        Self::new(profile.max_depth(), profile.max_iterations())
    }

    /// Try to enter a recursive computation for `key`.
    pub fn enter(&mut self, key: K) -> RecursionResult {
        self.iterations = self.iterations.saturating_add(1);

        if self.iterations > self.max_iterations {
            self.exceeded = true;
            return RecursionResult::IterationExceeded;
        }
        if self.depth >= self.max_depth {
            self.exceeded = true;
            return RecursionResult::DepthExceeded;
        }
        if self.visiting.contains(&key) {
            return RecursionResult::Cycle;
        }
        if self.visiting.len() as u32 >= MAX_VISITING_SET_SIZE {
            self.exceeded = true;
            return RecursionResult::DepthExceeded;
        }

        self.visiting.insert(key);
        self.depth += 1;
        RecursionResult::Entered
    }

    /// Leave a recursive computation for `key`. Must pair with a successful
    /// [`enter`](Self::enter).
    pub fn leave(&mut self, key: K) {
        let was_present = self.visiting.remove(&key);
        debug_assert!(
            was_present,
            "RecursionGuard::leave() called with a key that is not in the visiting set"
        );
        self.depth = self.depth.saturating_sub(1);
    }

    /// Check if `key` is currently being visited, without entering.
    #[inline]
    pub fn is_visiting(&self, key: &K) -> bool {
        self.visiting.contains(key)
    }

    #[inline]
    pub fn depth(&self) -> u32 {
        self.depth
    }

    #[inline]
    pub fn iterations(&self) -> u32 {
        self.iterations
    }

    /// True once any limit has tripped; sticky until [`reset`](Self::reset).
    #[inline]
    pub fn is_exceeded(&self) -> bool {
        self.exceeded
    }

    /// Mark the guard exceeded from an external condition (distribution or
    /// mapped-key overflow) so later entries bail out fast.
    #[inline]
    pub fn mark_exceeded(&mut self) {
        self.exceeded = true;
    }

    /// Clear all state for reuse across top-level calls.
    pub fn reset(&mut self) {
        self.visiting.clear();
        self.depth = 0;
        self.iterations = 0;
        self.exceeded = false;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn enter_leave_tracks_depth() {
        let mut guard: RecursionGuard<u32> = RecursionGuard::new(10, 100);
        assert!(guard.enter(1).is_entered());
        assert!(guard.enter(2).is_entered());
        assert_eq!(guard.depth(), 2);
        guard.leave(2);
        guard.leave(1);
        assert_eq!(guard.depth(), 0);
    }

    #[test]
    fn revisiting_a_key_is_a_cycle() {
        let mut guard: RecursionGuard<u32> = RecursionGuard::new(10, 100);
        assert!(guard.enter(7).is_entered());
        assert!(guard.enter(7).is_cycle());
        assert!(!guard.is_exceeded());
    }

    #[test]
    fn depth_limit_trips_and_sticks() {
        let mut guard: RecursionGuard<u32> = RecursionGuard::new(2, 100);
        assert!(guard.enter(1).is_entered());
        assert!(guard.enter(2).is_entered());
        assert!(guard.enter(3).is_exceeded());
        assert!(guard.is_exceeded());
        guard.reset();
        assert!(!guard.is_exceeded());
        assert!(guard.enter(1).is_entered());
    }

    #[test]
    fn iteration_budget_trips() {
        let mut guard: RecursionGuard<u32> = RecursionGuard::new(10, 3);
        for key in 0..3u32 {
            assert!(guard.enter(key).is_entered());
            guard.leave(key);
        }
        assert!(guard.enter(99).is_exceeded());
    }
}
