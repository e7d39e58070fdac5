//! Unresolved placeholders.
//!
//! A reference that cannot be resolved yields a [`Resolution::Unresolved`]
//! instead of an error return. The placeholder answers the same questions as
//! a resolved element with degenerate values (empty name, no type kind) and
//! always carries at least one [`EdmError`].
//!
//! Placeholders are built fresh by each failed lookup. The owning element's
//! cache cell keeps the one it built, so repeated reads of the same accessor
//! return the same `Arc`; two different referencers of the same missing name
//! hold distinct (but equal) placeholders.

use std::sync::Arc;

use super::diagnostics::{EdmError, EdmErrorCode};
use super::types::TypeKind;
use crate::base::Location;

/// Which capability a placeholder stands in for.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum UnresolvedKind {
    /// A named type whose kind was not declared.
    Type,
    PrimitiveType,
    EntityType,
    ComplexType,
    EnumType,
    EnumMember,
    EntitySet,
    /// An entity set that could not be inferred.
    BadEntitySet,
    EntityContainer,
    Association,
    AssociationEnd,
    LabeledElement,
    ValueTerm,
    TypeTerm,
    Property,
    CyclicEntityType,
    CyclicComplexType,
    CyclicEntityContainer,
    AnnotationTarget,
}

#[derive(Debug, PartialEq, Eq)]
pub struct Unresolved {
    kind: UnresolvedKind,
    reference: Arc<str>,
    errors: Vec<EdmError>,
}

impl Unresolved {
    /// A placeholder carrying one error.
    pub fn new(
        kind: UnresolvedKind,
        reference: impl Into<Arc<str>>,
        location: Location,
        code: EdmErrorCode,
        message: impl Into<Arc<str>>,
    ) -> Arc<Self> {
        Self::with_errors(
            kind,
            reference,
            EdmError::new(location, code, message),
            Vec::new(),
        )
    }

    /// A placeholder carrying `first` plus any further errors.
    pub fn with_errors(
        kind: UnresolvedKind,
        reference: impl Into<Arc<str>>,
        first: EdmError,
        more: Vec<EdmError>,
    ) -> Arc<Self> {
        let mut errors = Vec::with_capacity(1 + more.len());
        errors.push(first);
        errors.extend(more);
        Arc::new(Self {
            kind,
            reference: reference.into(),
            errors,
        })
    }

    pub fn kind(&self) -> UnresolvedKind {
        self.kind
    }

    /// The reference text that failed to resolve.
    pub fn reference(&self) -> &str {
        &self.reference
    }

    /// Always empty.
    pub fn name(&self) -> &str {
        ""
    }

    /// Always empty.
    pub fn namespace(&self) -> &str {
        ""
    }

    pub fn type_kind(&self) -> TypeKind {
        TypeKind::None
    }

    pub fn location(&self) -> &Location {
        &self.errors[0].location
    }

    /// Never empty.
    pub fn errors(&self) -> &[EdmError] {
        &self.errors
    }
}

/// A reference that either resolved to `T` or to a placeholder.
#[derive(Clone, Debug, PartialEq)]
pub enum Resolution<T> {
    Resolved(T),
    Unresolved(Arc<Unresolved>),
}

impl<T> Resolution<T> {
    pub fn is_unresolved(&self) -> bool {
        matches!(self, Self::Unresolved(_))
    }

    pub fn get(&self) -> Option<&T> {
        match self {
            Self::Resolved(value) => Some(value),
            Self::Unresolved(_) => None,
        }
    }

    pub fn resolved(self) -> Option<T> {
        match self {
            Self::Resolved(value) => Some(value),
            Self::Unresolved(_) => None,
        }
    }

    pub fn unresolved(&self) -> Option<&Arc<Unresolved>> {
        match self {
            Self::Resolved(_) => None,
            Self::Unresolved(placeholder) => Some(placeholder),
        }
    }

    /// Errors of the placeholder; empty when resolved.
    pub fn placeholder_errors(&self) -> &[EdmError] {
        match self {
            Self::Resolved(_) => &[],
            Self::Unresolved(placeholder) => placeholder.errors(),
        }
    }

    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> Resolution<U> {
        match self {
            Self::Resolved(value) => Resolution::Resolved(f(value)),
            Self::Unresolved(placeholder) => Resolution::Unresolved(placeholder),
        }
    }

    pub fn as_ref(&self) -> Resolution<&T> {
        match self {
            Self::Resolved(value) => Resolution::Resolved(value),
            Self::Unresolved(placeholder) => Resolution::Unresolved(Arc::clone(placeholder)),
        }
    }
}

impl<T: PartialEq> Resolution<T> {
    /// True when resolved to exactly `other`.
    pub fn is(&self, other: &T) -> bool {
        self.get() == Some(other)
    }
}
