//! Checked construction of type expressions.
//!
//! Everything here validates against declaration metadata before building a
//! node, so a type produced by this module is well formed with respect to its
//! [`TypeEnv`]: argument counts match the declaration, and owner chains are
//! only attached to declarations that actually nest.

use crate::annotated::{AnnotatedClass, AnnotatedKind, AnnotatedType, AnnotatedWildcard};
use crate::error::{Error, Result};
use crate::store::TypeEnv;
use crate::ty::ClassId;

/// A parameterized reference to `class`, with its natural owner chain.
///
/// Fails with [`Error::ArgumentCount`] when `args` does not match the
/// declared parameter count. Raw references (empty `args` on a generic
/// declaration) are allowed.
pub fn parameterized(
    env: &dyn TypeEnv,
    class: ClassId,
    args: Vec<AnnotatedType>,
) -> Result<AnnotatedType> {
    let def = env.class(class).ok_or(Error::MissingDeclaration)?;
    if !args.is_empty() && args.len() != def.type_params.len() {
        return Err(Error::ArgumentCount {
            class: def.name.clone(),
            expected: def.type_params.len(),
            found: args.len(),
        });
    }
    let owner = natural_owner(env, class);
    Ok(AnnotatedType::new(AnnotatedKind::Class(AnnotatedClass {
        def: class,
        args,
        owner,
    })))
}

/// A parameterized reference to the nested `class` with an explicit `owner`
/// instantiation.
///
/// The owner must be an instantiation of `class`'s enclosing declaration.
pub fn parameterized_in(
    env: &dyn TypeEnv,
    owner: AnnotatedType,
    class: ClassId,
    args: Vec<AnnotatedType>,
) -> Result<AnnotatedType> {
    let def = env.class(class).ok_or(Error::MissingDeclaration)?;
    let owner_def = match &owner.kind {
        AnnotatedKind::Class(c) => Some(c.def),
        _ => None,
    };
    if def.enclosing.is_none() || owner_def != def.enclosing {
        return Err(Error::NotAMember {
            member: def.name.clone(),
            context: owner.strip().label(env),
        });
    }
    if !args.is_empty() && args.len() != def.type_params.len() {
        return Err(Error::ArgumentCount {
            class: def.name.clone(),
            expected: def.type_params.len(),
            found: args.len(),
        });
    }
    Ok(AnnotatedType::new(AnnotatedKind::Class(AnnotatedClass {
        def: class,
        args,
        owner: Some(Box::new(owner)),
    })))
}

/// `? extends bound`.
pub fn wildcard_extends(bound: AnnotatedType) -> AnnotatedType {
    AnnotatedType::new(AnnotatedKind::Wildcard(AnnotatedWildcard::Extends(
        Box::new(bound),
    )))
}

/// `? super bound`.
pub fn wildcard_super(bound: AnnotatedType) -> AnnotatedType {
    AnnotatedType::new(AnnotatedKind::Wildcard(AnnotatedWildcard::Super(
        Box::new(bound),
    )))
}

/// The unbounded wildcard `?`.
pub fn unbounded_wildcard() -> AnnotatedType {
    AnnotatedType::new(AnnotatedKind::Wildcard(AnnotatedWildcard::Unbounded))
}

pub fn array_of(component: AnnotatedType) -> AnnotatedType {
    AnnotatedType::array(component)
}

/// `class` instantiated with an unbounded wildcard per declared parameter,
/// owner chain included and treated the same way. A non-generic declaration
/// comes back raw.
pub fn add_wildcard_parameters(env: &dyn TypeEnv, class: ClassId) -> AnnotatedType {
    let Some(def) = env.class(class) else {
        return AnnotatedType::raw(class);
    };
    let args = def
        .type_params
        .iter()
        .map(|_| unbounded_wildcard())
        .collect();
    let owner = match (def.is_inner, def.enclosing) {
        (true, Some(enclosing)) => Some(Box::new(add_wildcard_parameters(env, enclosing))),
        _ => natural_owner(env, class),
    };
    AnnotatedType::new(AnnotatedKind::Class(AnnotatedClass {
        def: class,
        args,
        owner,
    }))
}

/// Raw owner chain derived from the enclosing-declaration metadata.
fn natural_owner(env: &dyn TypeEnv, class: ClassId) -> Option<Box<AnnotatedType>> {
    let enclosing = env.class(class)?.enclosing?;
    let mut node = AnnotatedType::raw(enclosing);
    if let AnnotatedKind::Class(c) = &mut node.kind {
        c.owner = natural_owner(env, enclosing);
    }
    Some(Box::new(node))
}
