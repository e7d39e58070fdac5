//! High-level IR (HIR): lazily resolved semantic model.
//!
//! A [`Model`] is built from a set of [`CsdlSchema`](crate::syntax::CsdlSchema)
//! trees. Construction only registers every declaration in a typed arena;
//! every reference (type names, base types, association ends, entity sets,
//! annotation terms, labels) is resolved the first time someone reads it and
//! cached in a write-once cell.
//!
//! Resolution never fails. A reference that matches nothing resolves to an
//! [`Unresolved`] placeholder of the kind that was expected, carrying the
//! [`EdmError`] that explains why.
//!
//! ## Key Types
//!
//! - [`Model`]: root of one resolution session, owns every arena
//! - [`Resolution`]: `Resolved(T)` or an [`Unresolved`] placeholder
//! - [`SemanticElement`]: shared surface: location, annotations, errors
//! - [`EntityType`], [`Property`], [`NavigationProperty`], [`EntitySet`]: views
//! - [`EdmError`] / [`EdmErrorCode`]: diagnostics
//!
//! ## Resolution Layers
//!
//! ```text
//! lower(schemas)              ← register declarations (no lookups)
//!     │
//!     ▼
//! name index                  ← qualified names and aliases, built on first lookup
//!     │
//!     ▼
//! type refs, base types, ends ← per-element cache cells
//!     │
//!     ▼
//! navigation targets          ← inferred from association sets
//!     │
//!     ▼
//! validate(model)             ← every element's errors, once
//! ```

mod annotations;
mod arena;
mod cache;
mod containers;
mod diagnostics;
mod element;
mod expressions;
mod functions;
mod ids;
mod lower;
mod model;
mod relationships;
mod resolve;
mod structured;
mod types;
mod unresolved;
mod validate;

pub use annotations::{AnnotationTerm, PropertyValue, PropertyValueOwner, ValueTerm, VocabularyAnnotation};
pub use cache::Cache;
pub use containers::{
    AssociationSet, AssociationSetAnnotations, AssociationSetEnd, AssociationSetMapping,
    EntityContainer, EntitySet, FunctionImport, NavigationTarget,
};
pub use diagnostics::{EdmError, EdmErrorCode};
pub use element::{DirectValueAnnotation, SemanticElement};
pub use expressions::{ConstantValue, Expression, ExpressionKind};
pub use functions::{Function, Parameter, ParameterOwner};
pub use ids::{
    AnnotationId, AssociationEndId, AssociationId, AssociationSetEndId, AssociationSetId,
    ComplexTypeId, ElementKey, End, EntityContainerId, EntitySetId, EntityTypeId, EnumMemberId,
    EnumTypeId, ExpressionId, FunctionId, FunctionImportId, NavigationPropertyId, ParameterId,
    PropertyId, PropertyValueId, RowTypeId, SchemaId, ValueTermId,
};
pub use model::{Model, Schema};
pub use relationships::{Association, AssociationEnd, NavigationProperty, ReferentialConstraint};
pub use structured::{ComplexType, EntityType, EnumMember, EnumType, Property, RowType};
pub use types::{
    DeclaringType, PrimitiveKind, SchemaType, StructuredTypeId, TypeDefinition, TypeKind, TypeRef,
};
pub use unresolved::{Resolution, Unresolved, UnresolvedKind};
pub use validate::{element_errors, validate};
