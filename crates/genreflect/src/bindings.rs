//! Hierarchy walking and variable binding.
//!
//! [`instantiate_as_ancestor`] views a type as an instantiation of one of its
//! ancestor declarations by walking superclass, interface, and owner edges,
//! substituting type arguments along the way. [`bindings_for`] turns that
//! instantiation into a variable binding map, and [`apply`] pushes a binding
//! map through an arbitrary annotated type expression.

use std::collections::{HashMap, HashSet, VecDeque};

use tracing::trace;

use crate::annotated::{annotate, AnnotatedClass, AnnotatedKind, AnnotatedType, AnnotatedWildcard};
use crate::store::{ClassKind, TypeEnv};
use crate::ty::{ClassId, Type, TypeVarId, WildcardBound};

/// Per-call mapping from type-parameter identity to its resolved argument.
pub type VarMap = HashMap<TypeVarId, AnnotatedType>;

/// Return `ty` viewed as an instantiation of `target`, or `None` when `target`
/// is not an ancestor of `ty`'s declaration.
///
/// Superclass edges are walked before interface edges, and interfaces in
/// declaration order; when a declaration reaches `target` through more than
/// one edge with different instantiations, the first declared edge wins. A
/// context naming a generic declaration without arguments is walked as the
/// declaration instantiated with its own parameters, so concrete arguments on
/// declared edges are still recovered.
pub fn instantiate_as_ancestor(
    env: &dyn TypeEnv,
    ty: &AnnotatedType,
    target: ClassId,
) -> Option<AnnotatedType> {
    let mut seen_vars = HashSet::new();
    let found = walk(env, ty, target, &mut seen_vars);
    if found.is_none() {
        trace!(target = target.0, "declaration is not an ancestor of the context type");
    }
    found
}

fn walk(
    env: &dyn TypeEnv,
    ty: &AnnotatedType,
    target: ClassId,
    seen_vars: &mut HashSet<TypeVarId>,
) -> Option<AnnotatedType> {
    let object = env.well_known().object;
    match &ty.kind {
        AnnotatedKind::Array(_) => (target == object).then(|| AnnotatedType::raw(object)),
        AnnotatedKind::TypeVar(id) => {
            // A self-referential bound must not re-enter the same variable.
            if !seen_vars.insert(*id) {
                return None;
            }
            let bounds = env
                .type_param(*id)
                .map(|tp| tp.upper_bounds.clone())
                .unwrap_or_default();
            let mut found = None;
            for bound in &bounds {
                if let Some(inst) = walk(env, &annotate(bound), target, seen_vars) {
                    found = Some(inst);
                    break;
                }
            }
            seen_vars.remove(id);
            found.or_else(|| (target == object).then(|| AnnotatedType::raw(object)))
        }
        AnnotatedKind::Wildcard(AnnotatedWildcard::Extends(bound)) => {
            walk(env, bound, target, seen_vars)
        }
        AnnotatedKind::Wildcard(_) => (target == object).then(|| AnnotatedType::raw(object)),
        AnnotatedKind::Primitive(_) | AnnotatedKind::Void => None,
        AnnotatedKind::Class(_) => walk_class(env, ty, target),
    }
}

fn walk_class(env: &dyn TypeEnv, ty: &AnnotatedType, target: ClassId) -> Option<AnnotatedType> {
    let mut queue: VecDeque<AnnotatedType> = VecDeque::new();
    let mut seen: HashSet<Type> = HashSet::new();
    queue.push_back(ty.clone());

    while let Some(mut current) = queue.pop_front() {
        let def = match &current.kind {
            AnnotatedKind::Class(class) => class.def,
            _ => continue,
        };
        let Some(class_def) = env.class(def) else {
            continue;
        };

        // A raw reference to a generic declaration is walked as its generic
        // self, so edges like `implements O<String, T>` keep their concrete
        // arguments.
        let is_raw = matches!(&current.kind, AnnotatedKind::Class(class) if class.args.is_empty())
            && !class_def.type_params.is_empty();
        if is_raw {
            let mut generic = generic_self(env, def);
            generic.add_annotations(&current.annotations);
            current = generic;
        }
        if !seen.insert(current.strip()) {
            continue;
        }
        if def == target {
            return Some(current);
        }

        let mut subst = VarMap::new();
        collect_bindings(env, &current, &mut subst);

        if let Some(super_class) = &class_def.super_class {
            queue.push_back(apply(env, &annotate(super_class), &subst));
        }
        for iface in &class_def.interfaces {
            queue.push_back(apply(env, &annotate(iface), &subst));
        }
        // Every interface implicitly has the top type as a supertype.
        if class_def.kind == ClassKind::Interface {
            queue.push_back(AnnotatedType::raw(env.well_known().object));
        }
        // The enclosing-declaration chain is walked independently of the
        // supertype chain.
        if let AnnotatedKind::Class(class) = &current.kind {
            if let Some(owner) = &class.owner {
                queue.push_back((**owner).clone());
            }
        }
    }

    None
}

/// The declaration instantiated with its own parameters, owner chain included
/// for member declarations.
pub(crate) fn generic_self(env: &dyn TypeEnv, def: ClassId) -> AnnotatedType {
    let Some(class_def) = env.class(def) else {
        return AnnotatedType::raw(def);
    };
    let args = class_def
        .type_params
        .iter()
        .map(|p| AnnotatedType::type_var(*p))
        .collect();
    let owner = match (class_def.is_inner, class_def.enclosing) {
        (true, Some(enclosing)) => Some(Box::new(generic_self(env, enclosing))),
        _ => None,
    };
    AnnotatedType::new(AnnotatedKind::Class(AnnotatedClass { def, args, owner }))
}

/// Record parameter bindings for an instantiation, following the owner chain.
///
/// Two chains can never bind the same parameter identity, since parameters are
/// declaration-scoped.
pub(crate) fn collect_bindings(env: &dyn TypeEnv, ty: &AnnotatedType, map: &mut VarMap) {
    let AnnotatedKind::Class(class) = &ty.kind else {
        return;
    };
    if let Some(def) = env.class(class.def) {
        for (idx, param) in def.type_params.iter().enumerate() {
            if let Some(arg) = class.args.get(idx) {
                map.insert(*param, arg.clone());
            }
        }
    }
    if let Some(owner) = &class.owner {
        collect_bindings(env, owner, map);
    }
}

/// Variable bindings that let `target`'s declared types be rewritten in terms
/// of `ctx`. `None` when `target` is not in `ctx`'s hierarchy.
pub fn bindings_for(env: &dyn TypeEnv, ctx: &AnnotatedType, target: ClassId) -> Option<VarMap> {
    let inst = instantiate_as_ancestor(env, ctx, target)?;
    let mut map = VarMap::new();
    collect_bindings(env, &inst, &mut map);
    Some(map)
}

/// Structural substitution of `map` through `ty`.
///
/// Unbound variables are left in place; exactness enforcement and bound
/// rewriting live in [`crate::ResolveContext::substitute`]. Annotations are
/// carried per the propagation rules: a substituted variable unions the
/// value's markers, the use-site markers, and the variable's declaration-site
/// markers, and each argument of a parameterized node unions the markers
/// declared on the parameter position it fills.
pub(crate) fn apply(env: &dyn TypeEnv, ty: &AnnotatedType, map: &VarMap) -> AnnotatedType {
    match &ty.kind {
        AnnotatedKind::TypeVar(id) => {
            let decl_annotations = env
                .type_param(*id)
                .map(|tp| tp.annotations.clone())
                .unwrap_or_default();
            let mut out = match map.get(id) {
                Some(value) => {
                    let mut out = value.clone();
                    out.add_annotations(&ty.annotations);
                    out
                }
                None => ty.clone(),
            };
            out.add_annotations(&decl_annotations);
            out
        }
        AnnotatedKind::Class(class) => {
            let params = env
                .class(class.def)
                .map(|d| d.type_params.clone())
                .unwrap_or_default();
            let args = class
                .args
                .iter()
                .enumerate()
                .map(|(idx, arg)| {
                    let mut out = apply(env, arg, map);
                    if let Some(annos) = params
                        .get(idx)
                        .and_then(|p| env.type_param(*p))
                        .map(|tp| tp.annotations.clone())
                    {
                        out.add_annotations(&annos);
                    }
                    out
                })
                .collect();
            let owner = class.owner.as_ref().map(|o| Box::new(apply(env, o, map)));
            AnnotatedType::with_annotations(
                AnnotatedKind::Class(AnnotatedClass {
                    def: class.def,
                    args,
                    owner,
                }),
                ty.annotations.clone(),
            )
        }
        AnnotatedKind::Array(component) => AnnotatedType::with_annotations(
            AnnotatedKind::Array(Box::new(apply(env, component, map))),
            ty.annotations.clone(),
        ),
        AnnotatedKind::Wildcard(wildcard) => AnnotatedType::with_annotations(
            AnnotatedKind::Wildcard(match wildcard {
                AnnotatedWildcard::Unbounded => AnnotatedWildcard::Unbounded,
                AnnotatedWildcard::Extends(b) => {
                    AnnotatedWildcard::Extends(Box::new(apply(env, b, map)))
                }
                AnnotatedWildcard::Super(b) => {
                    AnnotatedWildcard::Super(Box::new(apply(env, b, map)))
                }
            }),
            ty.annotations.clone(),
        ),
        AnnotatedKind::Primitive(_) | AnnotatedKind::Void => ty.clone(),
    }
}

/// Whether `candidate`'s erasure extends or implements `target`, ignoring all
/// type arguments.
pub(crate) fn is_erased_ancestor(env: &dyn TypeEnv, candidate: ClassId, target: ClassId) -> bool {
    if target == env.well_known().object {
        return true;
    }
    let mut queue = vec![candidate];
    let mut seen = HashSet::new();
    while let Some(id) = queue.pop() {
        if !seen.insert(id) {
            continue;
        }
        if id == target {
            return true;
        }
        let Some(def) = env.class(id) else {
            continue;
        };
        for edge in def.super_class.iter().chain(def.interfaces.iter()) {
            if let Type::Class(c) = edge {
                queue.push(c.def);
            }
        }
    }
    false
}

/// Whether `ty` mentions any variable bound in `map`.
pub(crate) fn mentions_any(ty: &Type, map: &VarMap) -> bool {
    match ty {
        Type::TypeVar(id) => map.contains_key(id),
        Type::Class(c) => {
            c.args.iter().any(|a| mentions_any(a, map))
                || c.owner.as_deref().is_some_and(|o| mentions_any(o, map))
        }
        Type::Array(c) => mentions_any(c, map),
        Type::Wildcard(WildcardBound::Extends(b)) | Type::Wildcard(WildcardBound::Super(b)) => {
            mentions_any(b, map)
        }
        Type::Wildcard(WildcardBound::Unbounded) | Type::Primitive(_) | Type::Void => false,
    }
}

/// Collect every type-variable occurrence in `ty`, deduplicated.
pub(crate) fn type_vars(ty: &AnnotatedType, out: &mut Vec<TypeVarId>) {
    match &ty.kind {
        AnnotatedKind::TypeVar(id) => {
            if !out.contains(id) {
                out.push(*id);
            }
        }
        AnnotatedKind::Class(c) => {
            for arg in &c.args {
                type_vars(arg, out);
            }
            if let Some(owner) = &c.owner {
                type_vars(owner, out);
            }
        }
        AnnotatedKind::Array(c) => type_vars(c, out),
        AnnotatedKind::Wildcard(AnnotatedWildcard::Extends(b))
        | AnnotatedKind::Wildcard(AnnotatedWildcard::Super(b)) => type_vars(b, out),
        AnnotatedKind::Wildcard(AnnotatedWildcard::Unbounded)
        | AnnotatedKind::Primitive(_)
        | AnnotatedKind::Void => {}
    }
}
