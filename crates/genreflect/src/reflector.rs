//! Facade operations.
//!
//! Member-type resolution, exact and partial whole-type resolution, and the
//! erasure-level helpers. The stateful operations hang off
//! [`ResolveContext`], since they may allocate capture variables; the
//! erasure-level helpers are free functions over any [`TypeEnv`].

use std::collections::HashSet;

use crate::annotated::{AnnotatedClass, AnnotatedKind, AnnotatedType, AnnotatedWildcard};
use crate::bindings::{bindings_for, instantiate_as_ancestor, type_vars, VarMap};
use crate::context::ResolveContext;
use crate::error::{Error, Result};
use crate::infer;
use crate::store::{MethodDef, TypeEnv};
use crate::ty::{ClassId, ConstructorId, FieldId, MethodId, Type, TypeVarId, WildcardBound};

impl ResolveContext<'_> {
    /// The exact type of `field` as a member of `ctx`.
    ///
    /// Fails with [`Error::NotAMember`] when the declaring declaration is not
    /// in `ctx`'s hierarchy — a same-named field that shadows the queried one
    /// does not make it a member — and with [`Error::UnresolvedVariable`]
    /// when `ctx` does not determine every variable in the field's type.
    pub fn exact_field_type(&mut self, field: FieldId, ctx: &AnnotatedType) -> Result<AnnotatedType> {
        let def = self.field(field).cloned().ok_or(Error::MissingDeclaration)?;
        let mut map = self.member_bindings(ctx, field.class, &def.name)?;
        if def.is_static {
            map.clear();
        }
        let out = self.substitute(&def.ty, &map, true)?;
        self.ensure_grounded(&out, &[])?;
        Ok(out)
    }

    /// Partial variant of [`Self::exact_field_type`]: variables `ctx` does not
    /// determine stay in the result, with their bounds rewritten.
    pub fn field_type(&mut self, field: FieldId, ctx: &AnnotatedType) -> Result<AnnotatedType> {
        let def = self.field(field).cloned().ok_or(Error::MissingDeclaration)?;
        let mut map = self.member_bindings(ctx, field.class, &def.name)?;
        if def.is_static {
            map.clear();
        }
        self.substitute(&def.ty, &map, false)
    }

    /// The exact return type of `method` as a member of `ctx`. The method's
    /// own type parameters are left free; they belong to the call site, not
    /// the context.
    pub fn exact_return_type(&mut self, method: MethodId, ctx: &AnnotatedType) -> Result<AnnotatedType> {
        let def = self.method(method).cloned().ok_or(Error::MissingDeclaration)?;
        let map = self.method_bindings(ctx, method.class, &def)?;
        let out = self.substitute_with(&def.return_type, &map, Some(&def.type_params))?;
        self.ensure_grounded(&out, &def.type_params)?;
        Ok(out)
    }

    /// Partial variant of [`Self::exact_return_type`].
    pub fn return_type(&mut self, method: MethodId, ctx: &AnnotatedType) -> Result<AnnotatedType> {
        let def = self.method(method).cloned().ok_or(Error::MissingDeclaration)?;
        let map = self.method_bindings(ctx, method.class, &def)?;
        self.substitute(&def.return_type, &map, false)
    }

    /// The exact parameter types of `method` as a member of `ctx`, in
    /// declared order.
    pub fn exact_parameter_types(
        &mut self,
        method: MethodId,
        ctx: &AnnotatedType,
    ) -> Result<Vec<AnnotatedType>> {
        let def = self.method(method).cloned().ok_or(Error::MissingDeclaration)?;
        let map = self.method_bindings(ctx, method.class, &def)?;
        let out = def
            .params
            .iter()
            .map(|p| self.substitute_with(p, &map, Some(&def.type_params)))
            .collect::<Result<Vec<_>>>()?;
        for p in &out {
            self.ensure_grounded(p, &def.type_params)?;
        }
        Ok(out)
    }

    /// Partial variant of [`Self::exact_parameter_types`].
    pub fn parameter_types(
        &mut self,
        method: MethodId,
        ctx: &AnnotatedType,
    ) -> Result<Vec<AnnotatedType>> {
        let def = self.method(method).cloned().ok_or(Error::MissingDeclaration)?;
        let map = self.method_bindings(ctx, method.class, &def)?;
        def.params
            .iter()
            .map(|p| self.substitute(p, &map, false))
            .collect()
    }

    /// The exact parameter types of `ctor` as a member of `ctx`.
    pub fn exact_constructor_parameter_types(
        &mut self,
        ctor: ConstructorId,
        ctx: &AnnotatedType,
    ) -> Result<Vec<AnnotatedType>> {
        let def = self
            .constructor(ctor)
            .cloned()
            .ok_or(Error::MissingDeclaration)?;
        let map = self.member_bindings(ctx, ctor.class, "<init>")?;
        let out = def
            .params
            .iter()
            .map(|p| self.substitute(p, &map, true))
            .collect::<Result<Vec<_>>>()?;
        for p in &out {
            self.ensure_grounded(p, &[])?;
        }
        Ok(out)
    }

    /// Rewrite `ty` in terms of `ctx`: every variable whose declaring
    /// declaration is in `ctx`'s hierarchy is substituted with its argument
    /// there. Variables `ctx` says nothing about stay free, with their bounds
    /// rewritten where those bounds mention substituted variables.
    pub fn resolve_type(&mut self, ty: &AnnotatedType, ctx: &AnnotatedType) -> Result<AnnotatedType> {
        let map = self.context_bindings(ty, ctx);
        self.substitute(ty, &map, false)
    }

    /// Like [`Self::resolve_type`], but fails with
    /// [`Error::UnresolvedVariable`] when any non-capture variable stays free.
    pub fn resolve_exact_type(
        &mut self,
        ty: &AnnotatedType,
        ctx: &AnnotatedType,
    ) -> Result<AnnotatedType> {
        let map = self.context_bindings(ty, ctx);
        let out = self.substitute(ty, &map, true)?;
        self.ensure_grounded(&out, &[])?;
        Ok(out)
    }

    /// `ty` viewed as an instantiation of `ancestor`, after capture
    /// conversion. `None` when `ancestor` is not in `ty`'s hierarchy.
    pub fn exact_supertype(&mut self, ty: &AnnotatedType, ancestor: ClassId) -> Option<AnnotatedType> {
        let captured = self.capture(ty);
        instantiate_as_ancestor(self, &captured, ancestor)
    }

    /// The exact instantiation of `candidate` that is a subtype of `parent`;
    /// see [`crate::infer::exact_subtype`].
    pub fn exact_subtype(&mut self, parent: &AnnotatedType, candidate: &Type) -> Option<AnnotatedType> {
        infer::exact_subtype(self, parent, candidate)
    }

    /// The argument `ctx` supplies for the class-level type parameter `var`,
    /// or `None` when `var`'s declaring declaration is not in `ctx`'s
    /// hierarchy (method-level variables included).
    pub fn type_parameter(&mut self, ctx: &AnnotatedType, var: TypeVarId) -> Option<AnnotatedType> {
        let declared_in = self.type_param(var)?.declared_in?;
        let captured = self.capture(ctx);
        bindings_for(self, &captured, declared_in)?.get(&var).cloned()
    }

    /// Bindings supplied by `ctx` for every variable occurring in `ty`.
    fn context_bindings(&mut self, ty: &AnnotatedType, ctx: &AnnotatedType) -> VarMap {
        let captured = self.capture(ctx);
        let mut vars = Vec::new();
        type_vars(ty, &mut vars);
        let mut map = VarMap::new();
        for var in vars {
            if map.contains_key(&var) {
                continue;
            }
            let Some(declared_in) = self.type_param(var).and_then(|tp| tp.declared_in) else {
                continue;
            };
            if let Some(bindings) = bindings_for(self, &captured, declared_in) {
                map.extend(bindings);
            }
        }
        map
    }

    fn member_bindings(
        &mut self,
        ctx: &AnnotatedType,
        declaring: ClassId,
        member: &str,
    ) -> Result<VarMap> {
        let captured = self.capture(ctx);
        bindings_for(self, &captured, declaring).ok_or_else(|| Error::NotAMember {
            member: member.to_string(),
            context: ctx.strip().label(self),
        })
    }

    fn method_bindings(
        &mut self,
        ctx: &AnnotatedType,
        declaring: ClassId,
        def: &MethodDef,
    ) -> Result<VarMap> {
        let mut map = self.member_bindings(ctx, declaring, &def.name)?;
        if def.is_static {
            map.clear();
        }
        Ok(map)
    }

    /// Exactness check on a substituted result: any remaining non-capture
    /// variable outside `allowed` means the context did not determine the
    /// type. Catches variables smuggled in through binding values, which the
    /// substitution itself never revisits.
    fn ensure_grounded(&self, ty: &AnnotatedType, allowed: &[TypeVarId]) -> Result<()> {
        let mut vars = Vec::new();
        type_vars(ty, &mut vars);
        for var in vars {
            if var.is_capture() || allowed.contains(&var) {
                continue;
            }
            return Err(Error::UnresolvedVariable {
                name: self
                    .type_param(var)
                    .map(|tp| tp.name.clone())
                    .unwrap_or_else(|| format!("T#{}", var.0)),
            });
        }
        Ok(())
    }
}

/// The erasure of `ty`: raw class for parameterized types, first upper bound
/// for variables and upper-bounded wildcards, the top type for everything
/// else bounded only from below. Self-referential bounds erase to the top
/// type instead of recursing.
pub fn erase(env: &dyn TypeEnv, ty: &Type) -> Type {
    fn inner(env: &dyn TypeEnv, ty: &Type, seen: &mut HashSet<TypeVarId>) -> Type {
        let object = env.well_known().object;
        match ty {
            Type::Class(c) => Type::raw(c.def),
            Type::Array(c) => Type::array(inner(env, c, seen)),
            Type::TypeVar(id) => {
                if !seen.insert(*id) {
                    return Type::raw(object);
                }
                match env.type_param(*id).and_then(|tp| tp.upper_bounds.first().cloned()) {
                    Some(bound) => inner(env, &bound, seen),
                    None => Type::raw(object),
                }
            }
            Type::Wildcard(WildcardBound::Extends(b)) => inner(env, b, seen),
            Type::Wildcard(_) => Type::raw(object),
            Type::Primitive(_) | Type::Void => ty.clone(),
        }
    }
    inner(env, ty, &mut HashSet::new())
}

/// The component of an array type, or `None` for anything else.
pub fn array_component(ty: &AnnotatedType) -> Option<&AnnotatedType> {
    match &ty.kind {
        AnnotatedKind::Array(c) => Some(c),
        _ => None,
    }
}

/// Display-only simplification: every upper-bounded wildcard is replaced by
/// its bound, recursively. Lower-bounded and unbounded wildcards are kept.
/// Not semantics-preserving under substitution. Idempotent.
pub fn reduce_bounded(ty: &AnnotatedType) -> AnnotatedType {
    match &ty.kind {
        AnnotatedKind::Wildcard(AnnotatedWildcard::Extends(bound)) => {
            let mut out = reduce_bounded(bound);
            out.add_annotations(&ty.annotations);
            out
        }
        AnnotatedKind::Wildcard(AnnotatedWildcard::Super(bound)) => AnnotatedType::with_annotations(
            AnnotatedKind::Wildcard(AnnotatedWildcard::Super(Box::new(reduce_bounded(bound)))),
            ty.annotations.clone(),
        ),
        AnnotatedKind::Wildcard(AnnotatedWildcard::Unbounded) => ty.clone(),
        AnnotatedKind::Class(class) => AnnotatedType::with_annotations(
            AnnotatedKind::Class(AnnotatedClass {
                def: class.def,
                args: class.args.iter().map(reduce_bounded).collect(),
                owner: class.owner.as_ref().map(|o| Box::new(reduce_bounded(o))),
            }),
            ty.annotations.clone(),
        ),
        AnnotatedKind::Array(c) => AnnotatedType::with_annotations(
            AnnotatedKind::Array(Box::new(reduce_bounded(c))),
            ty.annotations.clone(),
        ),
        AnnotatedKind::TypeVar(_) | AnnotatedKind::Primitive(_) | AnnotatedKind::Void => ty.clone(),
    }
}

/// The erased classes of `ty`'s upper bounds, deduplicated in first-seen
/// order. A plain class reference is its own single upper bound.
pub fn upper_bound_classes(env: &dyn TypeEnv, ty: &Type) -> Vec<ClassId> {
    fn inner(env: &dyn TypeEnv, ty: &Type, seen: &mut HashSet<TypeVarId>, out: &mut Vec<ClassId>) {
        let push = |id: ClassId, out: &mut Vec<ClassId>| {
            if !out.contains(&id) {
                out.push(id);
            }
        };
        match ty {
            Type::Class(c) => push(c.def, out),
            Type::Array(_) => push(env.well_known().object, out),
            Type::TypeVar(id) => {
                if !seen.insert(*id) {
                    return;
                }
                let bounds = env
                    .type_param(*id)
                    .map(|tp| tp.upper_bounds.clone())
                    .unwrap_or_default();
                if bounds.is_empty() {
                    push(env.well_known().object, out);
                }
                for bound in &bounds {
                    inner(env, bound, seen, out);
                }
            }
            Type::Wildcard(WildcardBound::Extends(b)) => inner(env, b, seen, out),
            Type::Wildcard(_) => push(env.well_known().object, out),
            Type::Primitive(_) | Type::Void => {}
        }
    }
    let mut out = Vec::new();
    inner(env, ty, &mut HashSet::new(), &mut out);
    out
}
