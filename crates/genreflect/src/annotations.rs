//! Merging and canonicalizing annotated type expressions.

use crate::annotated::{AnnotatedClass, AnnotatedKind, AnnotatedType, AnnotatedWildcard};
use crate::error::{Error, Result};
use crate::store::TypeEnv;
use crate::ty::ClassId;

/// Zip two structurally identical annotated types, unioning the marker sets at
/// every node. `a`'s markers come first at each node.
///
/// Fails with [`Error::ShapeMismatch`] when the underlying type expressions
/// differ anywhere in the tree.
pub fn merge_annotations(a: &AnnotatedType, b: &AnnotatedType) -> Result<AnnotatedType> {
    let kind = match (&a.kind, &b.kind) {
        (AnnotatedKind::Class(ca), AnnotatedKind::Class(cb)) => {
            if ca.def != cb.def || ca.args.len() != cb.args.len() {
                return Err(Error::ShapeMismatch);
            }
            let args = ca
                .args
                .iter()
                .zip(&cb.args)
                .map(|(x, y)| merge_annotations(x, y))
                .collect::<Result<Vec<_>>>()?;
            let owner = match (&ca.owner, &cb.owner) {
                (Some(x), Some(y)) => Some(Box::new(merge_annotations(x, y)?)),
                (None, None) => None,
                _ => return Err(Error::ShapeMismatch),
            };
            AnnotatedKind::Class(AnnotatedClass {
                def: ca.def,
                args,
                owner,
            })
        }
        (AnnotatedKind::Array(x), AnnotatedKind::Array(y)) => {
            AnnotatedKind::Array(Box::new(merge_annotations(x, y)?))
        }
        (AnnotatedKind::Wildcard(wa), AnnotatedKind::Wildcard(wb)) => {
            AnnotatedKind::Wildcard(match (wa, wb) {
                (AnnotatedWildcard::Unbounded, AnnotatedWildcard::Unbounded) => {
                    AnnotatedWildcard::Unbounded
                }
                (AnnotatedWildcard::Extends(x), AnnotatedWildcard::Extends(y)) => {
                    AnnotatedWildcard::Extends(Box::new(merge_annotations(x, y)?))
                }
                (AnnotatedWildcard::Super(x), AnnotatedWildcard::Super(y)) => {
                    AnnotatedWildcard::Super(Box::new(merge_annotations(x, y)?))
                }
                _ => return Err(Error::ShapeMismatch),
            })
        }
        (AnnotatedKind::TypeVar(x), AnnotatedKind::TypeVar(y)) if x == y => {
            AnnotatedKind::TypeVar(*x)
        }
        (AnnotatedKind::Primitive(x), AnnotatedKind::Primitive(y)) if x == y => {
            AnnotatedKind::Primitive(*x)
        }
        (AnnotatedKind::Void, AnnotatedKind::Void) => AnnotatedKind::Void,
        _ => return Err(Error::ShapeMismatch),
    };
    let mut out = AnnotatedType::with_annotations(kind, a.annotations.clone());
    out.add_annotations(&b.annotations);
    Ok(out)
}

/// Canonical form of an annotated type: declaration-site markers of every
/// referenced class are unioned onto the corresponding nodes, and nested
/// classes get their owner chain materialized from the enclosing-declaration
/// metadata when the use site omitted it.
///
/// Canonicalizing twice is the same as canonicalizing once.
pub fn to_canonical(env: &dyn TypeEnv, ty: &AnnotatedType) -> AnnotatedType {
    match &ty.kind {
        AnnotatedKind::Class(class) => {
            let args = class.args.iter().map(|a| to_canonical(env, a)).collect();
            let owner = match &class.owner {
                Some(owner) => Some(Box::new(to_canonical(env, owner))),
                None => owner_chain(env, class.def),
            };
            let mut out = AnnotatedType::with_annotations(
                AnnotatedKind::Class(AnnotatedClass {
                    def: class.def,
                    args,
                    owner,
                }),
                ty.annotations.clone(),
            );
            if let Some(def) = env.class(class.def) {
                out.add_annotations(&def.annotations);
            }
            out
        }
        AnnotatedKind::Array(component) => AnnotatedType::with_annotations(
            AnnotatedKind::Array(Box::new(to_canonical(env, component))),
            ty.annotations.clone(),
        ),
        AnnotatedKind::Wildcard(wildcard) => AnnotatedType::with_annotations(
            AnnotatedKind::Wildcard(match wildcard {
                AnnotatedWildcard::Unbounded => AnnotatedWildcard::Unbounded,
                AnnotatedWildcard::Extends(b) => {
                    AnnotatedWildcard::Extends(Box::new(to_canonical(env, b)))
                }
                AnnotatedWildcard::Super(b) => {
                    AnnotatedWildcard::Super(Box::new(to_canonical(env, b)))
                }
            }),
            ty.annotations.clone(),
        ),
        AnnotatedKind::TypeVar(id) => {
            let mut out = ty.clone();
            if let Some(tp) = env.type_param(*id) {
                out.add_annotations(&tp.annotations);
            }
            out
        }
        AnnotatedKind::Primitive(_) | AnnotatedKind::Void => ty.clone(),
    }
}

/// Raw owner chain for a nested declaration, annotated with each enclosing
/// declaration's own markers.
fn owner_chain(env: &dyn TypeEnv, def: ClassId) -> Option<Box<AnnotatedType>> {
    let enclosing = env.class(def)?.enclosing?;
    let mut node = AnnotatedType::raw(enclosing);
    if let Some(encl_def) = env.class(enclosing) {
        node.add_annotations(&encl_def.annotations);
    }
    if let AnnotatedKind::Class(class) = &mut node.kind {
        class.owner = owner_chain(env, enclosing);
    }
    Some(Box::new(node))
}
