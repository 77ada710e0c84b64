use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

/// Failures of the resolution engine.
///
/// Structural "no match" outcomes (a type is not an array, a candidate is not
/// a subtype, a declaration is unreachable from a context) are expressed as
/// `Option::None` by the relevant operations, never as an `Error`. The
/// variants here split into caller-contract violations (`NotAMember`,
/// `ArgumentCount`, `ShapeMismatch`), exactness failures
/// (`UnresolvedVariable`), and missing provider metadata.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum Error {
    /// The queried member is not reachable from the given context type. Also
    /// raised for same-named members that shadow rather than override: the
    /// declaring declaration's identity is what must be reachable.
    #[error("`{member}` is not a member of `{context}`")]
    NotAMember { member: String, context: String },

    /// Argument list handed to the type factory does not match the
    /// declaration's parameter count.
    #[error("`{class}` declares {expected} type parameters, got {found} arguments")]
    ArgumentCount {
        class: String,
        expected: usize,
        found: usize,
    },

    /// Annotation merge was asked to zip two structurally different trees.
    #[error("annotated types have different shapes and cannot be merged")]
    ShapeMismatch,

    /// Exact resolution left a free type variable: the context does not fully
    /// determine the type.
    #[error("type variable `{name}` is not bound by this context")]
    UnresolvedVariable { name: String },

    /// The metadata provider has no definition for a referenced declaration.
    #[error("the metadata provider has no definition for a referenced declaration")]
    MissingDeclaration,
}
