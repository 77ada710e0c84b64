//! The plain type-expression model.
//!
//! A [`Type`] is a closed description of a (possibly parametric) type: a class
//! reference with optional arguments and owner chain, an array, a wildcard, a
//! type variable, a primitive, or `void`. Declarations themselves (parameter
//! lists, supertype edges, members) live behind the [`crate::TypeEnv`]
//! capability and are referenced from here by id.

use crate::store::TypeEnv;

/// Identifies a class-like declaration inside a [`TypeEnv`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ClassId(pub u32);

/// Identifies a type-parameter declaration.
///
/// Ids with the high bit set are context-local capture variables allocated by
/// [`crate::ResolveContext`]; they never resolve against the backing store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TypeVarId(pub(crate) u32);

impl TypeVarId {
    const CAPTURE_BIT: u32 = 1 << 31;

    pub fn new(index: u32) -> Self {
        Self(index)
    }

    pub(crate) fn new_capture(index: u32) -> Self {
        Self(Self::CAPTURE_BIT | index)
    }

    /// Whether this variable is a capture allocated during substitution rather
    /// than a declared type parameter.
    pub fn is_capture(self) -> bool {
        self.0 & Self::CAPTURE_BIT != 0
    }

    pub(crate) fn capture_index(self) -> Option<usize> {
        if !self.is_capture() {
            return None;
        }
        Some((self.0 & !Self::CAPTURE_BIT) as usize)
    }

    pub(crate) fn store_index(self) -> Option<usize> {
        if self.is_capture() {
            return None;
        }
        Some(self.0 as usize)
    }
}

/// Identifies an interned type-use annotation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct AnnotationId(pub u32);

/// A field handle. Carries the declaring class so exactness checks can reject
/// same-named fields declared on unrelated or shadowing types.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct FieldId {
    pub class: ClassId,
    pub index: usize,
}

/// A method handle; see [`FieldId`] for why the declaring class is part of the
/// identity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct MethodId {
    pub class: ClassId,
    pub index: usize,
}

/// A constructor handle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ConstructorId {
    pub class: ClassId,
    pub index: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PrimitiveType {
    Boolean,
    Byte,
    Char,
    Short,
    Int,
    Long,
    Float,
    Double,
}

impl PrimitiveType {
    pub fn name(self) -> &'static str {
        match self {
            PrimitiveType::Boolean => "boolean",
            PrimitiveType::Byte => "byte",
            PrimitiveType::Char => "char",
            PrimitiveType::Short => "short",
            PrimitiveType::Int => "int",
            PrimitiveType::Long => "long",
            PrimitiveType::Float => "float",
            PrimitiveType::Double => "double",
        }
    }
}

/// A type expression.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Type {
    /// A class or interface reference; raw when `args` is empty.
    Class(ClassType),
    Array(Box<Type>),
    Wildcard(WildcardBound),
    TypeVar(TypeVarId),
    Primitive(PrimitiveType),
    Void,
}

/// A class reference with optional type arguments and owner chain.
///
/// The owner is only populated for nested declarations; it matters when the
/// enclosing declaration is itself generic, because member types can mention
/// the enclosing declaration's parameters.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ClassType {
    pub def: ClassId,
    pub args: Vec<Type>,
    pub owner: Option<Box<Type>>,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum WildcardBound {
    Unbounded,
    Extends(Box<Type>),
    Super(Box<Type>),
}

impl Type {
    /// A class reference without an owner chain.
    pub fn class(def: ClassId, args: Vec<Type>) -> Self {
        Type::Class(ClassType {
            def,
            args,
            owner: None,
        })
    }

    /// A raw class reference.
    pub fn raw(def: ClassId) -> Self {
        Type::class(def, Vec::new())
    }

    pub fn array(component: Type) -> Self {
        Type::Array(Box::new(component))
    }

    /// Human-readable spelling, for diagnostics and test output.
    pub fn label(&self, env: &dyn TypeEnv) -> String {
        match self {
            Type::Class(c) => {
                let name = env
                    .class(c.def)
                    .map(|d| d.name.clone())
                    .unwrap_or_else(|| format!("#{}", c.def.0));
                if c.args.is_empty() {
                    name
                } else {
                    let args: Vec<String> = c.args.iter().map(|a| a.label(env)).collect();
                    format!("{}<{}>", name, args.join(", "))
                }
            }
            Type::Array(c) => format!("{}[]", c.label(env)),
            Type::Wildcard(WildcardBound::Unbounded) => "?".to_string(),
            Type::Wildcard(WildcardBound::Extends(b)) => format!("? extends {}", b.label(env)),
            Type::Wildcard(WildcardBound::Super(b)) => format!("? super {}", b.label(env)),
            Type::TypeVar(id) => env
                .type_param(*id)
                .map(|p| p.name.clone())
                .unwrap_or_else(|| format!("T#{}", id.0)),
            Type::Primitive(p) => p.name().to_string(),
            Type::Void => "void".to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn capture_ids_do_not_collide_with_store_ids() {
        let declared = TypeVarId::new(7);
        let capture = TypeVarId::new_capture(7);
        assert_ne!(declared, capture);
        assert!(!declared.is_capture());
        assert!(capture.is_capture());
        assert_eq!(declared.store_index(), Some(7));
        assert_eq!(capture.capture_index(), Some(7));
        assert_eq!(capture.store_index(), None);
    }
}
