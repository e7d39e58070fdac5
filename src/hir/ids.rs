//! Typed arena indices for semantic elements.
//!
//! Every declared element is registered once in a [`Model`](super::Model)
//! arena, so an id is the element's identity: two lookups of the same
//! declaration yield equal ids.

use std::fmt;

macro_rules! arena_ids {
    ($($(#[$doc:meta])* $name:ident,)*) => {
        $(
            $(#[$doc])*
            #[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
            pub struct $name(pub(crate) u32);

            impl $name {
                pub(crate) fn from_index(index: usize) -> Self {
                    Self(index as u32)
                }

                pub(crate) fn index(self) -> usize {
                    self.0 as usize
                }
            }
        )*
    };
}

arena_ids! {
    SchemaId,
    EntityTypeId,
    ComplexTypeId,
    EnumTypeId,
    EnumMemberId,
    /// A structural property of an entity, complex or row type.
    PropertyId,
    NavigationPropertyId,
    AssociationId,
    FunctionId,
    /// A parameter of a function or function import.
    ParameterId,
    ValueTermId,
    EntityContainerId,
    EntitySetId,
    AssociationSetId,
    FunctionImportId,
    /// An inline or out-of-line vocabulary annotation.
    AnnotationId,
    ExpressionId,
    PropertyValueId,
    /// An anonymous row type introduced by a type reference.
    RowTypeId,
}

/// Which of the two ends of an association (or association set).
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum End {
    First,
    Second,
}

impl End {
    pub fn opposite(self) -> Self {
        match self {
            Self::First => Self::Second,
            Self::Second => Self::First,
        }
    }

    pub(crate) fn index(self) -> usize {
        match self {
            Self::First => 0,
            Self::Second => 1,
        }
    }

    pub(crate) const BOTH: [End; 2] = [End::First, End::Second];
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct AssociationEndId {
    pub association: AssociationId,
    pub end: End,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct AssociationSetEndId {
    pub association_set: AssociationSetId,
    pub end: End,
}

/// Identity of any semantic element in a model.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum ElementKey {
    Schema(SchemaId),
    EntityType(EntityTypeId),
    ComplexType(ComplexTypeId),
    EnumType(EnumTypeId),
    EnumMember(EnumMemberId),
    Property(PropertyId),
    NavigationProperty(NavigationPropertyId),
    Association(AssociationId),
    AssociationEnd(AssociationEndId),
    Function(FunctionId),
    Parameter(ParameterId),
    ValueTerm(ValueTermId),
    EntityContainer(EntityContainerId),
    EntitySet(EntitySetId),
    AssociationSet(AssociationSetId),
    AssociationSetEnd(AssociationSetEndId),
    FunctionImport(FunctionImportId),
    Annotation(AnnotationId),
    Expression(ExpressionId),
    PropertyValue(PropertyValueId),
    RowType(RowTypeId),
}

impl fmt::Display for ElementKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Schema(id) => write!(f, "Schema#{}", id.0),
            Self::EntityType(id) => write!(f, "EntityType#{}", id.0),
            Self::ComplexType(id) => write!(f, "ComplexType#{}", id.0),
            Self::EnumType(id) => write!(f, "EnumType#{}", id.0),
            Self::EnumMember(id) => write!(f, "EnumMember#{}", id.0),
            Self::Property(id) => write!(f, "Property#{}", id.0),
            Self::NavigationProperty(id) => write!(f, "NavigationProperty#{}", id.0),
            Self::Association(id) => write!(f, "Association#{}", id.0),
            Self::AssociationEnd(id) => write!(f, "Association#{}.{:?}", id.association.0, id.end),
            Self::Function(id) => write!(f, "Function#{}", id.0),
            Self::Parameter(id) => write!(f, "Parameter#{}", id.0),
            Self::ValueTerm(id) => write!(f, "ValueTerm#{}", id.0),
            Self::EntityContainer(id) => write!(f, "EntityContainer#{}", id.0),
            Self::EntitySet(id) => write!(f, "EntitySet#{}", id.0),
            Self::AssociationSet(id) => write!(f, "AssociationSet#{}", id.0),
            Self::AssociationSetEnd(id) => {
                write!(f, "AssociationSet#{}.{:?}", id.association_set.0, id.end)
            }
            Self::FunctionImport(id) => write!(f, "FunctionImport#{}", id.0),
            Self::Annotation(id) => write!(f, "Annotation#{}", id.0),
            Self::Expression(id) => write!(f, "Expression#{}", id.0),
            Self::PropertyValue(id) => write!(f, "PropertyValue#{}", id.0),
            Self::RowType(id) => write!(f, "RowType#{}", id.0),
        }
    }
}
