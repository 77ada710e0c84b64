//! Exact subtype inference.
//!
//! Given an instantiation of an ancestor declaration and a candidate
//! descendant, infer the unique instantiation of the candidate that has the
//! ancestor instantiation as a supertype. This is the inverse direction of
//! [`crate::bindings::instantiate_as_ancestor`]: the candidate's view of the
//! ancestor is unified against the actual arguments to solve for the
//! candidate's own parameters.

use tracing::trace;

use crate::annotated::{annotate, AnnotatedKind, AnnotatedType, AnnotatedWildcard};
use crate::bindings::{
    apply, generic_self, instantiate_as_ancestor, is_erased_ancestor, type_vars, VarMap,
};
use crate::store::TypeEnv;
use crate::ty::{ClassId, Type, TypeVarId};

/// The exact instantiation of `candidate` that is a subtype of `parent`, or
/// `None` when no instantiation of `candidate` is.
///
/// The candidate's erasure must descend from the parent's erasure before any
/// argument is looked at; an unrelated candidate is never returned, not even
/// raw. When the parent carries no arguments the result is the raw candidate.
/// A candidate parameter the arguments leave open is filled from its declared
/// bound; only a parameter with no bound, or whose bound stays entangled with
/// other open parameters, keeps the candidate raw.
pub fn exact_subtype(
    env: &dyn TypeEnv,
    parent: &AnnotatedType,
    candidate: &Type,
) -> Option<AnnotatedType> {
    match (candidate, &parent.kind) {
        (Type::Array(component), AnnotatedKind::Array(parent_component)) => {
            let inner = exact_subtype(env, parent_component, component)?;
            let mut out = AnnotatedType::array(inner);
            out.add_annotations(&parent.annotations);
            Some(out)
        }
        (Type::Class(class), AnnotatedKind::Class(_)) => {
            class_subtype(env, parent, class.def).map(|mut out| {
                out.add_annotations(&parent.annotations);
                out
            })
        }
        // An array is a descendant of the top type only.
        (Type::Array(_), AnnotatedKind::Class(parent_class))
            if parent_class.def == env.well_known().object =>
        {
            Some(annotate(candidate))
        }
        (Type::Primitive(p), AnnotatedKind::Primitive(q)) if p == q => Some(annotate(candidate)),
        (Type::Void, AnnotatedKind::Void) => Some(annotate(candidate)),
        _ => None,
    }
}

fn class_subtype(
    env: &dyn TypeEnv,
    parent: &AnnotatedType,
    candidate: ClassId,
) -> Option<AnnotatedType> {
    let AnnotatedKind::Class(parent_class) = &parent.kind else {
        return None;
    };
    if !is_erased_ancestor(env, candidate, parent_class.def) {
        trace!(
            candidate = candidate.0,
            parent = parent_class.def.0,
            "candidate erasure does not descend from the parent"
        );
        return None;
    }
    let params = env.class(candidate)?.type_params.clone();
    if parent_class.args.is_empty() {
        return Some(AnnotatedType::raw(candidate));
    }

    // The candidate's own view of the parent declaration, expressed in the
    // candidate's parameters, unified against the actual arguments. A
    // parameterless candidate still has to match the arguments structurally.
    let pattern = instantiate_as_ancestor(env, &generic_self(env, candidate), parent_class.def)?;
    let mut solved = VarMap::new();
    if !unify(env, &pattern, parent, &params, &mut solved) {
        return None;
    }

    // Parameters the arguments leave open fall back to their declared bound,
    // rewritten through what unification did solve. A parameter without a
    // bound, or whose rewritten bound still mentions an open parameter, means
    // no single instantiation is exact and the raw candidate is returned.
    for param in &params {
        if solved.contains_key(param) {
            continue;
        }
        let Some(bound) = env
            .type_param(*param)
            .and_then(|tp| tp.upper_bounds.first())
            .cloned()
        else {
            return Some(AnnotatedType::raw(candidate));
        };
        let value = apply(env, &annotate(&bound), &solved);
        let mut open = Vec::new();
        type_vars(&value, &mut open);
        if open
            .iter()
            .any(|v| params.contains(v) && !solved.contains_key(v))
        {
            return Some(AnnotatedType::raw(candidate));
        }
        solved.insert(*param, value);
    }
    Some(apply(env, &generic_self(env, candidate), &solved))
}

/// Match `pattern` (which may mention the candidate's `params`) against
/// `actual`, recording solutions in `out`. A parameter matched twice must
/// resolve to the same underlying type; its annotation sets are unioned.
fn unify(
    env: &dyn TypeEnv,
    pattern: &AnnotatedType,
    actual: &AnnotatedType,
    params: &[TypeVarId],
    out: &mut VarMap,
) -> bool {
    match (&pattern.kind, &actual.kind) {
        (AnnotatedKind::TypeVar(id), _) if params.contains(id) => {
            match out.get_mut(id) {
                Some(existing) => {
                    if existing.strip() != actual.strip() {
                        return false;
                    }
                    existing.add_annotations(&actual.annotations);
                }
                None => {
                    out.insert(*id, actual.clone());
                }
            }
            true
        }
        (AnnotatedKind::Class(p), AnnotatedKind::Class(a)) => {
            if p.def != a.def || p.args.len() != a.args.len() {
                return false;
            }
            if !p
                .args
                .iter()
                .zip(&a.args)
                .all(|(x, y)| unify(env, x, y, params, out))
            {
                return false;
            }
            match (&p.owner, &a.owner) {
                (Some(x), Some(y)) => unify(env, x, y, params, out),
                _ => true,
            }
        }
        (AnnotatedKind::Array(p), AnnotatedKind::Array(a)) => unify(env, p, a, params, out),
        (AnnotatedKind::Wildcard(p), AnnotatedKind::Wildcard(a)) => match (p, a) {
            (AnnotatedWildcard::Unbounded, AnnotatedWildcard::Unbounded) => true,
            (AnnotatedWildcard::Extends(x), AnnotatedWildcard::Extends(y))
            | (AnnotatedWildcard::Super(x), AnnotatedWildcard::Super(y)) => {
                unify(env, x, y, params, out)
            }
            _ => false,
        },
        _ => pattern.strip() == actual.strip(),
    }
}
