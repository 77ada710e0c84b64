#![forbid(unsafe_code)]

//! Resolution of generic type expressions against concrete contexts.
//!
//! Given read-only reflective metadata (a [`TypeEnv`]) and a context type,
//! this crate answers the questions generic instantiation leaves open at
//! runtime: what is the exact type of this field/method/constructor as a
//! member of that context, what instantiation of a declaration is the exact
//! sub- or supertype of a given parameterized type, and how do type-use
//! annotations flow through substitution. All operations are pure functions
//! of their inputs plus the metadata; per-call state (capture variables) lives
//! in a [`ResolveContext`].

mod annotated;
mod annotations;
mod bindings;
mod context;
mod error;
mod factory;
mod infer;
mod reflector;
mod store;
mod ty;

pub use crate::annotated::{
    annotate, AnnotatedClass, AnnotatedKind, AnnotatedType, AnnotatedWildcard,
};
pub use crate::annotations::{merge_annotations, to_canonical};
pub use crate::bindings::{bindings_for, instantiate_as_ancestor, VarMap};
pub use crate::context::ResolveContext;
pub use crate::error::{Error, Result};
pub use crate::factory::{
    add_wildcard_parameters, array_of, parameterized, parameterized_in, unbounded_wildcard,
    wildcard_extends, wildcard_super,
};
pub use crate::infer::exact_subtype;
pub use crate::reflector::{array_component, erase, reduce_bounded, upper_bound_classes};
pub use crate::store::{
    ClassDef, ClassKind, ConstructorDef, FieldDef, MethodDef, TypeEnv, TypeParamDef, TypeStore,
    WellKnownTypes,
};
pub use crate::ty::{
    AnnotationId, ClassId, ClassType, ConstructorId, FieldId, MethodId, PrimitiveType, Type,
    TypeVarId, WildcardBound,
};
