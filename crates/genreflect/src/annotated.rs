//! Annotated type expressions.
//!
//! An [`AnnotatedType`] pairs every node of a type expression with the set of
//! type-use markers attached to it, so resolution can carry annotations from
//! both use sites and declaration sites through substitution. The tree is
//! structurally parallel to [`Type`]: `strip` discards the markers and
//! [`annotate`] lifts a plain type into the annotated world with empty sets.

use crate::ty::{AnnotationId, ClassId, PrimitiveType, Type, TypeVarId, WildcardBound};

/// A type expression with per-node annotation sets.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AnnotatedType {
    /// Markers attached directly to this node, order-preserving and free of
    /// duplicates.
    pub annotations: Vec<AnnotationId>,
    pub kind: AnnotatedKind,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AnnotatedKind {
    Class(AnnotatedClass),
    Array(Box<AnnotatedType>),
    Wildcard(AnnotatedWildcard),
    TypeVar(TypeVarId),
    Primitive(PrimitiveType),
    Void,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AnnotatedClass {
    pub def: ClassId,
    pub args: Vec<AnnotatedType>,
    pub owner: Option<Box<AnnotatedType>>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AnnotatedWildcard {
    Unbounded,
    Extends(Box<AnnotatedType>),
    Super(Box<AnnotatedType>),
}

impl AnnotatedType {
    pub fn new(kind: AnnotatedKind) -> Self {
        Self {
            annotations: Vec::new(),
            kind,
        }
    }

    pub fn with_annotations(kind: AnnotatedKind, annotations: Vec<AnnotationId>) -> Self {
        Self { annotations, kind }
    }

    /// A class reference without an owner chain.
    pub fn class(def: ClassId, args: Vec<AnnotatedType>) -> Self {
        Self::new(AnnotatedKind::Class(AnnotatedClass {
            def,
            args,
            owner: None,
        }))
    }

    /// A raw class reference.
    pub fn raw(def: ClassId) -> Self {
        Self::class(def, Vec::new())
    }

    pub fn array(component: AnnotatedType) -> Self {
        Self::new(AnnotatedKind::Array(Box::new(component)))
    }

    pub fn type_var(id: TypeVarId) -> Self {
        Self::new(AnnotatedKind::TypeVar(id))
    }

    pub fn has_annotation(&self, id: AnnotationId) -> bool {
        self.annotations.contains(&id)
    }

    /// Union `extra` into this node's annotation set, preserving first-seen
    /// order.
    pub fn add_annotations(&mut self, extra: &[AnnotationId]) {
        union_annotations(&mut self.annotations, extra);
    }

    /// Discard all annotations, returning the underlying type expression.
    pub fn strip(&self) -> Type {
        match &self.kind {
            AnnotatedKind::Class(c) => Type::Class(crate::ty::ClassType {
                def: c.def,
                args: c.args.iter().map(AnnotatedType::strip).collect(),
                owner: c.owner.as_ref().map(|o| Box::new(o.strip())),
            }),
            AnnotatedKind::Array(c) => Type::Array(Box::new(c.strip())),
            AnnotatedKind::Wildcard(w) => Type::Wildcard(match w {
                AnnotatedWildcard::Unbounded => WildcardBound::Unbounded,
                AnnotatedWildcard::Extends(b) => WildcardBound::Extends(Box::new(b.strip())),
                AnnotatedWildcard::Super(b) => WildcardBound::Super(Box::new(b.strip())),
            }),
            AnnotatedKind::TypeVar(id) => Type::TypeVar(*id),
            AnnotatedKind::Primitive(p) => Type::Primitive(*p),
            AnnotatedKind::Void => Type::Void,
        }
    }
}

/// Lift a plain type expression into the annotated world with empty marker
/// sets on every node.
pub fn annotate(ty: &Type) -> AnnotatedType {
    match ty {
        Type::Class(c) => AnnotatedType::new(AnnotatedKind::Class(AnnotatedClass {
            def: c.def,
            args: c.args.iter().map(annotate).collect(),
            owner: c.owner.as_ref().map(|o| Box::new(annotate(o))),
        })),
        Type::Array(c) => AnnotatedType::array(annotate(c)),
        Type::Wildcard(w) => AnnotatedType::new(AnnotatedKind::Wildcard(match w {
            WildcardBound::Unbounded => AnnotatedWildcard::Unbounded,
            WildcardBound::Extends(b) => AnnotatedWildcard::Extends(Box::new(annotate(b))),
            WildcardBound::Super(b) => AnnotatedWildcard::Super(Box::new(annotate(b))),
        })),
        Type::TypeVar(id) => AnnotatedType::type_var(*id),
        Type::Primitive(p) => AnnotatedType::new(AnnotatedKind::Primitive(*p)),
        Type::Void => AnnotatedType::new(AnnotatedKind::Void),
    }
}

pub(crate) fn union_annotations(dst: &mut Vec<AnnotationId>, extra: &[AnnotationId]) {
    for a in extra {
        if !dst.contains(a) {
            dst.push(*a);
        }
    }
}
