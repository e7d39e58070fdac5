//! Diagnostic locations.

use std::fmt;
use std::sync::Arc;

use super::position::Span;

/// Where a diagnostic points.
///
/// Syntax nodes produced by a parser carry [`Location::Source`]. Elements
/// without one (parser omitted it, or the element was inferred) fall back to
/// [`Location::Object`], which names the element by its identity in the model
/// so a location is always available.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Location {
    /// A span inside a named schema document.
    Source { document: Arc<str>, span: Span },
    /// Synthetic location naming an in-memory element.
    Object(Arc<str>),
}

impl Location {
    pub fn source(document: impl Into<Arc<str>>, span: Span) -> Self {
        Self::Source {
            document: document.into(),
            span,
        }
    }

    pub fn object(identity: impl Into<Arc<str>>) -> Self {
        Self::Object(identity.into())
    }

    /// Returns true for locations synthesized from element identity.
    pub fn is_synthetic(&self) -> bool {
        matches!(self, Self::Object(_))
    }

    pub fn span(&self) -> Option<Span> {
        match self {
            Self::Source { span, .. } => Some(*span),
            Self::Object(_) => None,
        }
    }
}

impl fmt::Display for Location {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Source { document, span } => write!(f, "{}:{}", document, span.start),
            Self::Object(identity) => write!(f, "<{}>", identity),
        }
    }
}
