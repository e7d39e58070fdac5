//! Resolved type references.

use std::sync::Arc;

use super::diagnostics::EdmError;
use super::ids::{ComplexTypeId, EntityTypeId, EnumTypeId, RowTypeId};
use super::unresolved::{Resolution, Unresolved};
use crate::base::constants::EDM_NAMESPACE;
use crate::syntax::CsdlFacets;

/// Kind of a type definition, as consumers probe it.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum TypeKind {
    None,
    Primitive,
    Entity,
    Complex,
    Collection,
    EntityReference,
    Row,
    Enum,
}

macro_rules! primitive_kinds {
    ($($name:ident,)*) => {
        /// Built-in primitive types of the `Edm` namespace.
        #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
        pub enum PrimitiveKind {
            $($name,)*
        }

        impl PrimitiveKind {
            /// Local name, e.g. `"Int32"`.
            pub const fn name(self) -> &'static str {
                match self {
                    $(Self::$name => stringify!($name),)*
                }
            }

            fn from_local_name(name: &str) -> Option<Self> {
                match name {
                    $(stringify!($name) => Some(Self::$name),)*
                    _ => None,
                }
            }
        }
    };
}

primitive_kinds! {
    Binary,
    Boolean,
    Byte,
    DateTime,
    DateTimeOffset,
    Decimal,
    Double,
    Guid,
    Int16,
    Int32,
    Int64,
    SByte,
    Single,
    Stream,
    String,
    Time,
    Geography,
    Geometry,
}

impl PrimitiveKind {
    /// Parse `Edm.Int32`. Names outside the `Edm` namespace are not primitive.
    pub fn from_qualified_name(name: &str) -> Option<Self> {
        let local = name
            .strip_prefix(EDM_NAMESPACE)
            .and_then(|rest| rest.strip_prefix('.'))?;
        Self::from_local_name(local)
    }

    pub fn is_integral(self) -> bool {
        matches!(
            self,
            Self::Byte | Self::SByte | Self::Int16 | Self::Int32 | Self::Int64
        )
    }
}

/// A resolved type reference: what was referenced plus use-site facets.
#[derive(Clone, Debug, PartialEq)]
pub struct TypeRef {
    pub definition: TypeDefinition,
    pub is_nullable: bool,
    pub facets: CsdlFacets,
}

/// The referenced definition. Each named variant keeps the kind the reference
/// expected even when the name did not resolve.
#[derive(Clone, Debug, PartialEq)]
pub enum TypeDefinition {
    Primitive(Resolution<PrimitiveKind>),
    Entity(Resolution<EntityTypeId>),
    Complex(Resolution<ComplexTypeId>),
    Enum(Resolution<EnumTypeId>),
    Collection(Box<TypeRef>),
    EntityReference(Resolution<EntityTypeId>),
    Row(RowTypeId),
    /// A name of undeclared kind that matched nothing.
    Unknown(Arc<Unresolved>),
}

impl TypeRef {
    pub fn new(definition: TypeDefinition, is_nullable: bool) -> Self {
        Self {
            definition,
            is_nullable,
            facets: CsdlFacets::default(),
        }
    }

    pub fn kind(&self) -> TypeKind {
        match &self.definition {
            TypeDefinition::Primitive(_) => TypeKind::Primitive,
            TypeDefinition::Entity(_) => TypeKind::Entity,
            TypeDefinition::Complex(_) => TypeKind::Complex,
            TypeDefinition::Enum(_) => TypeKind::Enum,
            TypeDefinition::Collection(_) => TypeKind::Collection,
            TypeDefinition::EntityReference(_) => TypeKind::EntityReference,
            TypeDefinition::Row(_) => TypeKind::Row,
            TypeDefinition::Unknown(_) => TypeKind::None,
        }
    }

    pub fn is_collection(&self) -> bool {
        matches!(self.definition, TypeDefinition::Collection(_))
    }

    /// Element type of a collection.
    pub fn element_type(&self) -> Option<&TypeRef> {
        match &self.definition {
            TypeDefinition::Collection(element) => Some(element),
            _ => None,
        }
    }

    pub fn as_primitive(&self) -> Option<PrimitiveKind> {
        match &self.definition {
            TypeDefinition::Primitive(Resolution::Resolved(kind)) => Some(*kind),
            _ => None,
        }
    }

    pub fn as_entity(&self) -> Option<EntityTypeId> {
        match &self.definition {
            TypeDefinition::Entity(Resolution::Resolved(id)) => Some(*id),
            _ => None,
        }
    }

    pub fn as_complex(&self) -> Option<ComplexTypeId> {
        match &self.definition {
            TypeDefinition::Complex(Resolution::Resolved(id)) => Some(*id),
            _ => None,
        }
    }

    pub fn as_enum(&self) -> Option<EnumTypeId> {
        match &self.definition {
            TypeDefinition::Enum(Resolution::Resolved(id)) => Some(*id),
            _ => None,
        }
    }

    /// The placeholder this reference resolved to, looking through
    /// collections.
    pub fn unresolved(&self) -> Option<&Arc<Unresolved>> {
        match &self.definition {
            TypeDefinition::Primitive(r) => r.unresolved(),
            TypeDefinition::Entity(r) | TypeDefinition::EntityReference(r) => r.unresolved(),
            TypeDefinition::Complex(r) => r.unresolved(),
            TypeDefinition::Enum(r) => r.unresolved(),
            TypeDefinition::Collection(element) => element.unresolved(),
            TypeDefinition::Row(_) => None,
            TypeDefinition::Unknown(placeholder) => Some(placeholder),
        }
    }

    pub fn is_unresolved(&self) -> bool {
        self.unresolved().is_some()
    }

    /// Placeholder errors of this reference.
    pub fn errors(&self) -> &[EdmError] {
        self.unresolved().map(|u| u.errors()).unwrap_or(&[])
    }
}

/// A declared schema type.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum SchemaType {
    Entity(EntityTypeId),
    Complex(ComplexTypeId),
    Enum(EnumTypeId),
}

/// A structured type: entity or complex.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum StructuredTypeId {
    Entity(EntityTypeId),
    Complex(ComplexTypeId),
}

/// Owner of a structural property.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum DeclaringType {
    Entity(EntityTypeId),
    Complex(ComplexTypeId),
    Row(RowTypeId),
}
