//! Per-call resolution context.
//!
//! [`ResolveContext`] wraps a read-only [`TypeEnv`] and owns the arena of
//! capture variables allocated while resolving. Captures stand in for
//! wildcards (and for partially-resolved variables whose bounds were
//! rewritten) so a bound that mentions the capturing declaration does not
//! re-expand forever; they behave as fresh opaque variables and count as
//! grounded for exactness. The context is side-effect free with respect to
//! the backing store and is meant to be created fresh per resolution call.

use tracing::trace;

use crate::annotated::{annotate, AnnotatedClass, AnnotatedKind, AnnotatedType, AnnotatedWildcard};
use crate::bindings::{apply, mentions_any, VarMap};
use crate::error::{Error, Result};
use crate::store::{ClassDef, TypeEnv, TypeParamDef, WellKnownTypes};
use crate::ty::{AnnotationId, ClassId, Type, TypeVarId};

pub struct ResolveContext<'env> {
    env: &'env dyn TypeEnv,
    captures: Vec<TypeParamDef>,
}

impl<'env> ResolveContext<'env> {
    pub fn new(env: &'env dyn TypeEnv) -> Self {
        Self {
            env,
            captures: Vec::new(),
        }
    }

    fn fresh_capture(
        &mut self,
        name: String,
        upper_bounds: Vec<Type>,
        annotations: Vec<AnnotationId>,
    ) -> TypeVarId {
        let index: u32 = self
            .captures
            .len()
            .try_into()
            .expect("too many capture variables");
        let id = TypeVarId::new_capture(index);
        trace!(capture = %name, "allocating capture variable");
        self.captures.push(TypeParamDef {
            name,
            declared_in: None,
            upper_bounds,
            annotations,
        });
        id
    }

    /// Capture conversion: replace every wildcard argument of a parameterized
    /// type with a fresh capture variable whose upper bounds are the explicit
    /// wildcard bound (if any) followed by the parameter's declared bounds
    /// with the instantiation substituted through.
    ///
    /// Capture ids are allocated before bounds are computed, so bounds that
    /// mention sibling parameters (`U extends T`) capture correctly.
    pub fn capture(&mut self, ty: &AnnotatedType) -> AnnotatedType {
        let AnnotatedKind::Class(class) = &ty.kind else {
            return ty.clone();
        };
        let owner = class
            .owner
            .as_ref()
            .map(|o| Box::new(self.capture(o)));
        let has_wildcard = class
            .args
            .iter()
            .any(|a| matches!(a.kind, AnnotatedKind::Wildcard(_)));
        if !has_wildcard {
            return AnnotatedType::with_annotations(
                AnnotatedKind::Class(AnnotatedClass {
                    def: class.def,
                    args: class.args.clone(),
                    owner,
                }),
                ty.annotations.clone(),
            );
        }
        let Some(params) = self.env.class(class.def).map(|d| d.type_params.clone()) else {
            return ty.clone();
        };

        // Pass 1: allocate captures and assemble the substitution that maps
        // every parameter to its (possibly captured) argument.
        let mut captured = Vec::with_capacity(class.args.len());
        let mut subst = VarMap::new();
        for (idx, arg) in class.args.iter().enumerate() {
            let node = match &arg.kind {
                AnnotatedKind::Wildcard(_) => {
                    let name = params
                        .get(idx)
                        .and_then(|p| self.env.type_param(*p))
                        .map(|tp| format!("CAP({})", tp.name))
                        .unwrap_or_else(|| "CAP(?)".to_string());
                    let id = self.fresh_capture(name, Vec::new(), Vec::new());
                    AnnotatedType::with_annotations(
                        AnnotatedKind::TypeVar(id),
                        arg.annotations.clone(),
                    )
                }
                _ => arg.clone(),
            };
            if let Some(param) = params.get(idx) {
                subst.insert(*param, node.clone());
            }
            captured.push(node);
        }

        // Pass 2: fill in capture bounds.
        for (idx, arg) in class.args.iter().enumerate() {
            let AnnotatedKind::Wildcard(wildcard) = &arg.kind else {
                continue;
            };
            let AnnotatedKind::TypeVar(id) = captured[idx].kind else {
                continue;
            };
            let mut bounds = Vec::new();
            if let AnnotatedWildcard::Extends(explicit) = wildcard {
                bounds.push(explicit.strip());
            }
            if let Some(tp) = params.get(idx).and_then(|p| self.env.type_param(*p)) {
                let declared = tp.upper_bounds.clone();
                for bound in &declared {
                    bounds.push(apply(self, &annotate(bound), &subst).strip());
                }
            }
            if let Some(index) = id.capture_index() {
                self.captures[index].upper_bounds = bounds;
            }
        }

        AnnotatedType::with_annotations(
            AnnotatedKind::Class(AnnotatedClass {
                def: class.def,
                args: captured,
                owner,
            }),
            ty.annotations.clone(),
        )
    }

    /// Rewrite `ty` through `map`.
    ///
    /// With `exact` set, an unbound non-capture variable fails with
    /// [`Error::UnresolvedVariable`]. Without it, an unbound variable whose
    /// bounds mention bound variables is replaced by a fresh capture with the
    /// substituted bounds, so callers can observe `S extends T` as
    /// `S extends String` once `T` resolves.
    pub fn substitute(
        &mut self,
        ty: &AnnotatedType,
        map: &VarMap,
        exact: bool,
    ) -> Result<AnnotatedType> {
        self.substitute_with(ty, map, exact.then_some(&[][..]))
    }

    /// Like [`Self::substitute`], but in exact mode (`Some`) the listed
    /// variables may stay free. Member operations use this for the queried
    /// method's own type parameters, which belong to the call site.
    pub(crate) fn substitute_with(
        &mut self,
        ty: &AnnotatedType,
        map: &VarMap,
        exact: Option<&[TypeVarId]>,
    ) -> Result<AnnotatedType> {
        match &ty.kind {
            AnnotatedKind::TypeVar(id) => {
                let decl = self.type_param(*id).cloned();
                let decl_annotations = decl
                    .as_ref()
                    .map(|tp| tp.annotations.clone())
                    .unwrap_or_default();
                if let Some(value) = map.get(id) {
                    let mut out = value.clone();
                    out.add_annotations(&ty.annotations);
                    out.add_annotations(&decl_annotations);
                    return Ok(out);
                }
                if id.is_capture() {
                    return Ok(ty.clone());
                }
                if let Some(allowed) = exact {
                    if allowed.contains(id) {
                        let mut out = ty.clone();
                        out.add_annotations(&decl_annotations);
                        return Ok(out);
                    }
                    return Err(Error::UnresolvedVariable {
                        name: decl.map(|tp| tp.name).unwrap_or_else(|| format!("T#{}", id.0)),
                    });
                }
                let Some(decl) = decl else {
                    return Ok(ty.clone());
                };
                if !decl.upper_bounds.iter().any(|b| mentions_any(b, map)) {
                    let mut out = ty.clone();
                    out.add_annotations(&decl_annotations);
                    return Ok(out);
                }
                // Allocate the capture before rewriting the bounds and route
                // the variable's own occurrences to it, so a self-referential
                // bound closes over the capture instead of re-expanding.
                let capture =
                    self.fresh_capture(decl.name.clone(), Vec::new(), decl.annotations.clone());
                let mut inner = map.clone();
                inner.insert(*id, AnnotatedType::type_var(capture));
                let mut bounds = Vec::with_capacity(decl.upper_bounds.len());
                for bound in &decl.upper_bounds {
                    bounds.push(self.substitute(&annotate(bound), &inner, false)?.strip());
                }
                if let Some(index) = capture.capture_index() {
                    self.captures[index].upper_bounds = bounds;
                }
                let mut out =
                    AnnotatedType::with_annotations(AnnotatedKind::TypeVar(capture), ty.annotations.clone());
                out.add_annotations(&decl_annotations);
                Ok(out)
            }
            AnnotatedKind::Class(class) => {
                let params = self
                    .env
                    .class(class.def)
                    .map(|d| d.type_params.clone())
                    .unwrap_or_default();
                let mut args = Vec::with_capacity(class.args.len());
                for (idx, arg) in class.args.iter().enumerate() {
                    let mut out = self.substitute_with(arg, map, exact)?;
                    let position_annotations = params
                        .get(idx)
                        .and_then(|p| self.type_param(*p))
                        .map(|tp| tp.annotations.clone())
                        .unwrap_or_default();
                    out.add_annotations(&position_annotations);
                    args.push(out);
                }
                let owner = match &class.owner {
                    Some(owner) => Some(Box::new(self.substitute_with(owner, map, exact)?)),
                    None => None,
                };
                Ok(AnnotatedType::with_annotations(
                    AnnotatedKind::Class(AnnotatedClass {
                        def: class.def,
                        args,
                        owner,
                    }),
                    ty.annotations.clone(),
                ))
            }
            AnnotatedKind::Array(component) => Ok(AnnotatedType::with_annotations(
                AnnotatedKind::Array(Box::new(self.substitute_with(component, map, exact)?)),
                ty.annotations.clone(),
            )),
            AnnotatedKind::Wildcard(wildcard) => {
                let rewritten = match wildcard {
                    AnnotatedWildcard::Unbounded => AnnotatedWildcard::Unbounded,
                    AnnotatedWildcard::Extends(b) => {
                        AnnotatedWildcard::Extends(Box::new(self.substitute_with(b, map, exact)?))
                    }
                    AnnotatedWildcard::Super(b) => {
                        AnnotatedWildcard::Super(Box::new(self.substitute_with(b, map, exact)?))
                    }
                };
                Ok(AnnotatedType::with_annotations(
                    AnnotatedKind::Wildcard(rewritten),
                    ty.annotations.clone(),
                ))
            }
            AnnotatedKind::Primitive(_) | AnnotatedKind::Void => Ok(ty.clone()),
        }
    }
}

impl TypeEnv for ResolveContext<'_> {
    fn class(&self, id: ClassId) -> Option<&ClassDef> {
        self.env.class(id)
    }

    fn type_param(&self, id: TypeVarId) -> Option<&TypeParamDef> {
        if let Some(index) = id.capture_index() {
            return self.captures.get(index);
        }
        self.env.type_param(id)
    }

    fn lookup_class(&self, name: &str) -> Option<ClassId> {
        self.env.lookup_class(name)
    }

    fn well_known(&self) -> &WellKnownTypes {
        self.env.well_known()
    }
}
