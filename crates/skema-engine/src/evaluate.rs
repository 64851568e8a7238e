//! Transform evaluation.
//!
//! A [`Transform`] is the program: a tree of conditional dispatch,
//! mapped-field comprehension, key selection, and recursive self-application
//! that derives one shape from another. [`TransformEvaluator`] walks it
//! against a concrete input shape and a capture environment.
//!
//! Evaluation is a pure function of its explicit arguments. The only state
//! the evaluator owns is the recursion guard, which is reset at every
//! top-level call.
//!
//! ## Union distribution
//!
//! A conditional whose evaluated scrutinee is a union is re-evaluated
//! independently per member and the results re-unioned. This happens before
//! any single combined match: matching a pattern against a union as a whole
//! and matching per-member can land in different branches.

use rustc_hash::FxHashSet;
use skema_common::interner::Atom;
use skema_common::limits::{MAX_DISTRIBUTION_SIZE, MAX_MAPPED_KEYS};
use tracing::{debug, trace};

use crate::diagnostics::{ConstructionError, EvalError};
use crate::format::ShapeFormatter;
use crate::intern::ShapeInterner;
use crate::pattern::{Bindings, compile_pattern, match_shape, pattern_matches};
use crate::recursion::{RecursionGuard, RecursionProfile, RecursionResult};
use crate::registry::ShapeRegistry;
use crate::substitute::substitute;
use crate::types::{FieldInfo, FieldFlags, RecordShape, ShapeData, ShapeId};

/// Reserved binding name carrying the current field's shape inside a
/// `MapFields` per-field transform.
pub const FIELD_BINDING: &str = "$field";

/// Direction of an optional/readonly modifier toggle.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Toggle {
    Add,
    Remove,
}

/// Keep-predicate applied to each field's shape during `MapFields`.
/// Fields failing the filter are dropped from the output.
#[derive(Copy, Clone, Debug)]
pub enum FieldFilter {
    /// Keep fields whose shape is structurally equal to the given shape.
    ShapeEquals(ShapeId),
    /// Keep fields whose shape matches the given pattern.
    ShapeMatches(ShapeId),
}

/// Key rewrite rule applied to field names during `MapFields`.
#[derive(Clone, Debug)]
pub enum KeyRename {
    Prefix(String),
    /// Strip a prefix; names without it pass through unchanged.
    StripPrefix(String),
    Capitalize,
    Uncapitalize,
    Uppercase,
    Lowercase,
}

impl KeyRename {
    /// Apply the rule to one key.
    pub fn apply(&self, name: &str) -> String {
        match self {
            Self::Prefix(prefix) => format!("{prefix}{name}"),
            Self::StripPrefix(prefix) => {
                name.strip_prefix(prefix.as_str()).unwrap_or(name).to_string()
            }
            Self::Capitalize => recase_first(name, true),
            Self::Uncapitalize => recase_first(name, false),
            Self::Uppercase => name.to_uppercase(),
            Self::Lowercase => name.to_lowercase(),
        }
    }
}

/// Recase only the first character, leaving the tail untouched.
fn recase_first(s: &str, upper: bool) -> String {
    let mut chars = s.chars();
    match chars.next() {
        Some(first) => {
            let head: String = if upper {
                first.to_uppercase().collect()
            } else {
                first.to_lowercase().collect()
            };
            head + chars.as_str()
        }
        None => s.to_string(),
    }
}

/// A transformation expression.
#[derive(Clone, Debug)]
pub enum Transform {
    /// Return the input unchanged.
    Identity,
    /// A shape constant. Captures inside it are substituted from the
    /// environment at evaluation time.
    Shape(ShapeId),
    /// Pattern dispatch with capture binding and union distribution.
    Conditional {
        scrutinee: Box<Transform>,
        pattern: ShapeId,
        then_branch: Box<Transform>,
        else_branch: Box<Transform>,
    },
    /// Per-field comprehension over a record.
    MapFields {
        source: Box<Transform>,
        per_field: Box<Transform>,
        key_filter: Option<FieldFilter>,
        key_rename: Option<KeyRename>,
        optional: Option<Toggle>,
        readonly: Option<Toggle>,
    },
    /// Keep only the named fields; absent names are ignored.
    PickKeys {
        source: Box<Transform>,
        keys: Vec<Atom>,
    },
    /// Drop the named fields; absent names are ignored.
    OmitKeys {
        source: Box<Transform>,
        keys: Vec<Atom>,
    },
    /// Re-apply the enclosing named transform to each structural child
    /// (record field, tuple element, array element) of the result.
    RecurseSelf(Box<Transform>),
}

impl Transform {
    /// Build a conditional, validating the pattern (duplicate captures are
    /// rejected here, at construction time, not during evaluation).
    pub fn conditional(
        interner: &ShapeInterner,
        scrutinee: Transform,
        pattern: ShapeId,
        then_branch: Transform,
        else_branch: Transform,
    ) -> Result<Self, ConstructionError> {
        compile_pattern(interner, pattern)?;
        Ok(Self::Conditional {
            scrutinee: Box::new(scrutinee),
            pattern,
            then_branch: Box::new(then_branch),
            else_branch: Box::new(else_branch),
        })
    }

    /// A `MapFields` over the input itself with everything defaulted.
    pub fn map_fields(per_field: Transform) -> Self {
        Self::MapFields {
            source: Box::new(Transform::Identity),
            per_field: Box::new(per_field),
            key_filter: None,
            key_rename: None,
            optional: None,
            readonly: None,
        }
    }

    fn kind(&self) -> &'static str {
        match self {
            Self::Identity => "Identity",
            Self::Shape(_) => "Shape",
            Self::Conditional { .. } => "Conditional",
            Self::MapFields { .. } => "MapFields",
            Self::PickKeys { .. } => "PickKeys",
            Self::OmitKeys { .. } => "OmitKeys",
            Self::RecurseSelf(_) => "RecurseSelf",
        }
    }
}

/// A transform with a stable name. The name is what `RecurseSelf` re-enters
/// and what the recursion guard keys on.
#[derive(Clone, Debug)]
pub struct NamedTransform {
    pub name: Atom,
    pub body: Transform,
}

impl NamedTransform {
    pub fn new(interner: &ShapeInterner, name: &str, body: Transform) -> Self {
        Self {
            name: interner.intern_string(name),
            body,
        }
    }
}

/// Evaluates transforms against shapes.
///
/// Borrows the interner and registry; owns only per-call recursion state.
/// Create one per logical evaluation context and reuse it freely; every
/// top-level call resets the guard.
pub struct TransformEvaluator<'a> {
    interner: &'a ShapeInterner,
    registry: &'a ShapeRegistry,
    guard: RecursionGuard<(Atom, ShapeId)>,
}

impl<'a> TransformEvaluator<'a> {
    pub fn new(interner: &'a ShapeInterner, registry: &'a ShapeRegistry) -> Self {
        Self::with_profile(interner, registry, RecursionProfile::TransformEvaluation)
    }

    /// Evaluator with custom recursion limits.
    pub fn with_profile(
        interner: &'a ShapeInterner,
        registry: &'a ShapeRegistry,
        profile: RecursionProfile,
    ) -> Self {
        Self {
            interner,
            registry,
            guard: RecursionGuard::with_profile(profile),
        }
    }

    pub fn interner(&self) -> &'a ShapeInterner {
        self.interner
    }

    /// Evaluate a bare transform. `RecurseSelf` is not legal here: wrap
    /// the transform in a [`NamedTransform`] and use [`apply`](Self::apply)
    /// for recursive derivations.
    pub fn evaluate(
        &mut self,
        transform: &Transform,
        input: ShapeId,
        env: &Bindings,
    ) -> Result<ShapeId, EvalError> {
        self.guard.reset();
        self.eval(transform, input, env, None)
    }

    /// Apply a named transform to a shape with a fresh environment.
    pub fn apply(&mut self, named: &NamedTransform, input: ShapeId) -> Result<ShapeId, EvalError> {
        self.guard.reset();
        self.apply_named(named, input)
    }

    fn apply_named(
        &mut self,
        named: &NamedTransform,
        input: ShapeId,
    ) -> Result<ShapeId, EvalError> {
        let key = (named.name, input);
        match self.guard.enter(key) {
            RecursionResult::Entered => {
                let result = self.eval(&named.body, input, &Bindings::new(), Some(named));
                self.guard.leave(key);
                result
            }
            RecursionResult::Cycle => {
                // Coinductive cut-off: the same transform is already being
                // applied to this shape further up the stack, so leave the
                // sub-shape as it stands.
                trace!(shape = input.0, "cycle detected, leaving shape in place");
                Ok(input)
            }
            RecursionResult::DepthExceeded | RecursionResult::IterationExceeded => {
                debug!(shape = input.0, "recursion limit exceeded");
                Err(self.limit_error(&self.interner.resolve_atom(named.name), input))
            }
        }
    }

    fn eval(
        &mut self,
        transform: &Transform,
        input: ShapeId,
        env: &Bindings,
        enclosing: Option<&NamedTransform>,
    ) -> Result<ShapeId, EvalError> {
        trace!(kind = transform.kind(), input = input.0, "evaluate");
        // Deep transform trees over deep shapes can outrun the native
        // stack; grow it rather than crash.
        stacker::maybe_grow(64 * 1024, 1024 * 1024, || {
            self.eval_inner(transform, input, env, enclosing)
        })
    }

    fn eval_inner(
        &mut self,
        transform: &Transform,
        input: ShapeId,
        env: &Bindings,
        enclosing: Option<&NamedTransform>,
    ) -> Result<ShapeId, EvalError> {
        match transform {
            Transform::Identity => Ok(input),
            Transform::Shape(shape) => substitute(self.interner, *shape, env),
            Transform::Conditional {
                scrutinee,
                pattern,
                then_branch,
                else_branch,
            } => {
                let subject = self.eval(scrutinee, input, env, enclosing)?;

                if let Some(ShapeData::Union(members)) = self.interner.lookup(subject) {
                    let members = self.interner.shape_list(members);
                    if members.len() > MAX_DISTRIBUTION_SIZE {
                        self.guard.mark_exceeded();
                        debug!(members = members.len(), "distribution width exceeded");
                        return Err(self.limit_error("Conditional", subject));
                    }
                    let mut results = Vec::with_capacity(members.len());
                    for &member in members.iter() {
                        results.push(self.eval_conditional_arm(
                            *pattern,
                            member,
                            member,
                            then_branch,
                            else_branch,
                            env,
                            enclosing,
                        )?);
                    }
                    return Ok(self.interner.union(results));
                }

                self.eval_conditional_arm(
                    *pattern,
                    subject,
                    input,
                    then_branch,
                    else_branch,
                    env,
                    enclosing,
                )
            }
            Transform::MapFields {
                source,
                per_field,
                key_filter,
                key_rename,
                optional,
                readonly,
            } => {
                let source_shape = self.eval(source, input, env, enclosing)?;
                let record = self.expect_record("MapFields", source_shape)?;
                if record.fields.len() > MAX_MAPPED_KEYS {
                    self.guard.mark_exceeded();
                    debug!(fields = record.fields.len(), "mapped key count exceeded");
                    return Err(self.limit_error("MapFields", source_shape));
                }

                let field_binding = self.interner.intern_string(FIELD_BINDING);
                let mut out_fields = Vec::with_capacity(record.fields.len());
                let mut seen = FxHashSet::default();
                for field in &record.fields {
                    if let Some(filter) = key_filter {
                        if !self.field_kept(*filter, field.shape) {
                            continue;
                        }
                    }

                    let field_env = env.extended(field_binding, field.shape);
                    let new_shape = self.eval(per_field, field.shape, &field_env, enclosing)?;

                    let name = match key_rename {
                        Some(rule) => {
                            let renamed = rule.apply(&self.interner.resolve_atom(field.name));
                            self.interner.intern_string(&renamed)
                        }
                        None => field.name,
                    };
                    if !seen.insert(name) {
                        return Err(EvalError::KeyCollision {
                            key: self.interner.resolve_atom(name).to_string(),
                        });
                    }

                    let mut flags = field.flags;
                    apply_toggle(&mut flags, FieldFlags::OPTIONAL, *optional);
                    apply_toggle(&mut flags, FieldFlags::READONLY, *readonly);
                    out_fields.push(FieldInfo::with_flags(name, new_shape, flags));
                }
                Ok(self.interner.record_from_parts(out_fields, record.closed))
            }
            Transform::PickKeys { source, keys } => {
                let source_shape = self.eval(source, input, env, enclosing)?;
                let record = self.expect_record("PickKeys", source_shape)?;
                let kept = record
                    .fields
                    .iter()
                    .filter(|f| keys.contains(&f.name))
                    .copied()
                    .collect();
                Ok(self.interner.record_from_parts(kept, record.closed))
            }
            Transform::OmitKeys { source, keys } => {
                let source_shape = self.eval(source, input, env, enclosing)?;
                let record = self.expect_record("OmitKeys", source_shape)?;
                let kept = record
                    .fields
                    .iter()
                    .filter(|f| !keys.contains(&f.name))
                    .copied()
                    .collect();
                Ok(self.interner.record_from_parts(kept, record.closed))
            }
            Transform::RecurseSelf(on) => {
                let Some(named) = enclosing else {
                    return Err(EvalError::RecurseOutsideNamed);
                };
                let base = self.eval(on, input, env, Some(named))?;
                match self.interner.lookup(base) {
                    Some(ShapeData::Record(record_id)) => {
                        let record = self.interner.record_shape(record_id);
                        let mut fields = Vec::with_capacity(record.fields.len());
                        for field in &record.fields {
                            let child = self.recurse_child(named, field.shape)?;
                            fields.push(FieldInfo::with_flags(field.name, child, field.flags));
                        }
                        Ok(self.interner.record_from_parts(fields, record.closed))
                    }
                    Some(ShapeData::Tuple(list, rest)) => {
                        let elements = self.interner.shape_list(list);
                        let mut new_elements = Vec::with_capacity(elements.len());
                        for &element in elements.iter() {
                            new_elements.push(self.recurse_child(named, element)?);
                        }
                        Ok(match rest {
                            Some(rest) => {
                                let new_rest = self.recurse_child(named, rest)?;
                                self.interner.tuple_with_rest(new_elements, new_rest)
                            }
                            None => self.interner.tuple(new_elements),
                        })
                    }
                    Some(ShapeData::Array(element)) => {
                        let new_element = self.recurse_child(named, element)?;
                        Ok(self.interner.array(new_element))
                    }
                    // Scalar leaves are left untouched.
                    _ => Ok(base),
                }
            }
        }
    }

    fn eval_conditional_arm(
        &mut self,
        pattern: ShapeId,
        subject: ShapeId,
        branch_input: ShapeId,
        then_branch: &Transform,
        else_branch: &Transform,
        env: &Bindings,
        enclosing: Option<&NamedTransform>,
    ) -> Result<ShapeId, EvalError> {
        match match_shape(self.interner, pattern, subject) {
            Some(bound) => {
                let extended = env.merged(&bound);
                self.eval(then_branch, branch_input, &extended, enclosing)
            }
            None => self.eval(else_branch, branch_input, env, enclosing),
        }
    }

    /// Apply the enclosing named transform to one structural child. `Ref`
    /// children are resolved through the registry first; a child already on
    /// the guard stack is left in place.
    fn recurse_child(
        &mut self,
        named: &NamedTransform,
        child: ShapeId,
    ) -> Result<ShapeId, EvalError> {
        match self.interner.lookup(child) {
            Some(ShapeData::Record(_) | ShapeData::Tuple(..) | ShapeData::Array(_)) => {
                self.apply_named(named, child)
            }
            Some(ShapeData::Ref(name)) => {
                let Some(resolved) = self.registry.resolve(name) else {
                    return Ok(child);
                };
                if self.guard.is_visiting(&(named.name, resolved)) {
                    trace!(reference = &*self.interner.resolve_atom(name), "recursive reference left in place");
                    return Ok(child);
                }
                match self.interner.lookup(resolved) {
                    Some(ShapeData::Record(_) | ShapeData::Tuple(..) | ShapeData::Array(_)) => {
                        self.apply_named(named, resolved)
                    }
                    _ => Ok(child),
                }
            }
            _ => Ok(child),
        }
    }

    fn field_kept(&self, filter: FieldFilter, shape: ShapeId) -> bool {
        match filter {
            FieldFilter::ShapeEquals(expected) => {
                crate::equality::structurally_equal(self.interner, expected, shape)
            }
            FieldFilter::ShapeMatches(pattern) => pattern_matches(self.interner, pattern, shape),
        }
    }

    fn expect_record(
        &self,
        operation: &'static str,
        shape: ShapeId,
    ) -> Result<std::sync::Arc<RecordShape>, EvalError> {
        match self.interner.lookup(shape) {
            Some(ShapeData::Record(record)) => Ok(self.interner.record_shape(record)),
            _ => Err(EvalError::ExpectedRecord {
                operation,
                actual: ShapeFormatter::new(self.interner).format(shape),
            }),
        }
    }

    fn limit_error(&self, transform: &str, shape: ShapeId) -> EvalError {
        EvalError::RecursionLimitExceeded {
            transform: transform.to_string(),
            shape: ShapeFormatter::new(self.interner).format(shape),
        }
    }
}

fn apply_toggle(flags: &mut FieldFlags, flag: FieldFlags, toggle: Option<Toggle>) {
    match toggle {
        Some(Toggle::Add) => flags.insert(flag),
        Some(Toggle::Remove) => flags.remove(flag),
        None => {}
    }
}
