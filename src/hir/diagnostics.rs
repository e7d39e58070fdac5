//! Diagnostics: semantic error records.
//!
//! Resolution never fails with a `Result`. Every defect in a schema document
//! becomes an [`EdmError`] attached to the element that failed to resolve,
//! and is visible one hop up through each direct referencer's `errors()`.

use std::fmt;
use std::sync::Arc;

use thiserror::Error;

use crate::base::Location;

// ============================================================================
// ERROR CODES
// ============================================================================

macro_rules! error_codes {
    ($($(#[$doc:meta])* $name:ident,)*) => {
        /// Closed set of diagnostic codes produced by resolution.
        #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
        #[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
        pub enum EdmErrorCode {
            $($(#[$doc])* $name,)*
        }

        impl EdmErrorCode {
            /// The code's name, e.g. `"InvalidBinary"`.
            pub const fn as_str(self) -> &'static str {
                match self {
                    $(Self::$name => stringify!($name),)*
                }
            }
        }
    };
}

error_codes! {
    // ========================================================================
    // UNRESOLVED REFERENCES
    // ========================================================================

    /// A named type of undeclared kind was not found.
    BadUnresolvedType,
    /// A primitive type name is not a known `Edm` primitive.
    BadUnresolvedPrimitiveType,
    BadUnresolvedEntityType,
    BadUnresolvedComplexType,
    BadUnresolvedEnumType,
    BadUnresolvedEnumMember,
    BadUnresolvedEntityContainer,
    BadUnresolvedEntitySet,
    BadUnresolvedAssociation,
    /// A role name does not match either end of the association.
    BadNonComputableAssociationEnd,
    BadUnresolvedProperty,
    BadUnresolvedLabeledElement,
    BadUnresolvedTerm,
    /// An out-of-line annotation target path does not name an element.
    BadUnresolvedTarget,

    // ========================================================================
    // CYCLES
    // ========================================================================

    BadCyclicEntity,
    BadCyclicComplex,
    BadCyclicEntityContainer,
    BadCyclicLabeledElement,

    // ========================================================================
    // ENTITY SET INFERENCE
    // ========================================================================

    NoEntitySetsFoundForType,
    CannotInferEntitySetWithMultipleSetsPerType,

    // ========================================================================
    // STRUCTURAL CONSISTENCY
    // ========================================================================

    /// A qualified name is declared more than once.
    AlreadyDefined,
    /// A name matched more than one candidate.
    BadAmbiguousElementBinding,

    // ========================================================================
    // LITERALS
    // ========================================================================

    InvalidBinary,
    InvalidBoolean,
    InvalidDateTime,
    InvalidDateTimeOffset,
    InvalidDecimal,
    InvalidFloatingPoint,
    InvalidGuid,
    InvalidInteger,
    InvalidTime,
}

impl fmt::Display for EdmErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ============================================================================
// ERROR RECORD
// ============================================================================

/// An immutable `{location, code, message}` diagnostic.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Error)]
#[error("{location}: {code}: {message}")]
pub struct EdmError {
    pub location: Location,
    pub code: EdmErrorCode,
    pub message: Arc<str>,
}

impl EdmError {
    pub fn new(location: Location, code: EdmErrorCode, message: impl Into<Arc<str>>) -> Self {
        Self {
            location,
            code,
            message: message.into(),
        }
    }
}

/// Concatenate error lists gathered from an element's direct references.
pub(crate) fn concat<'a>(lists: impl IntoIterator<Item = &'a [EdmError]>) -> Vec<EdmError> {
    lists.into_iter().flatten().cloned().collect()
}
