//! Type references as written in a schema.

use std::sync::Arc;

use smol_str::SmolStr;

use super::ast::CsdlProperty;
use crate::base::Location;

/// A type reference attached to a property, parameter, term or return type.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct CsdlTypeReference {
    pub kind: CsdlTypeKind,
    pub is_nullable: bool,
    pub facets: CsdlFacets,
    pub location: Option<Location>,
}

/// The closed set of type reference shapes a parser can produce.
///
/// `Named` is used when the parser could not tell which kind of declared type a
/// name denotes; the resolver decides by lookup.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum CsdlTypeKind {
    Primitive(SmolStr),
    Entity(SmolStr),
    Complex(SmolStr),
    Enum(SmolStr),
    Named(SmolStr),
    Collection(Box<CsdlTypeReference>),
    EntityReference(SmolStr),
    Row(Vec<Arc<CsdlProperty>>),
}

/// Facets carried on primitive type references.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct CsdlFacets {
    pub max_length: Option<u32>,
    pub precision: Option<u32>,
    pub scale: Option<u32>,
    pub is_unicode: Option<bool>,
}

impl CsdlTypeReference {
    pub fn new(kind: CsdlTypeKind) -> Self {
        Self {
            kind,
            is_nullable: true,
            facets: CsdlFacets::default(),
            location: None,
        }
    }

    pub fn primitive(name: &str) -> Self {
        Self::new(CsdlTypeKind::Primitive(name.into()))
    }

    pub fn entity(name: &str) -> Self {
        Self::new(CsdlTypeKind::Entity(name.into()))
    }

    pub fn complex(name: &str) -> Self {
        Self::new(CsdlTypeKind::Complex(name.into()))
    }

    pub fn enumeration(name: &str) -> Self {
        Self::new(CsdlTypeKind::Enum(name.into()))
    }

    pub fn named(name: &str) -> Self {
        Self::new(CsdlTypeKind::Named(name.into()))
    }

    pub fn collection(element: CsdlTypeReference) -> Self {
        Self::new(CsdlTypeKind::Collection(Box::new(element)))
    }

    pub fn entity_reference(name: &str) -> Self {
        Self::new(CsdlTypeKind::EntityReference(name.into()))
    }

    pub fn row(properties: impl IntoIterator<Item = CsdlProperty>) -> Self {
        Self::new(CsdlTypeKind::Row(
            properties.into_iter().map(Arc::new).collect(),
        ))
    }

    pub fn not_null(mut self) -> Self {
        self.is_nullable = false;
        self
    }

    pub fn with_facets(mut self, facets: CsdlFacets) -> Self {
        self.facets = facets;
        self
    }

    pub fn at(mut self, location: Location) -> Self {
        self.location = Some(location);
        self
    }
}
