//! Structural entities: entity, complex, row and enum types and their
//! properties.
//!
//! Each view is a `(model, id)` pair; all computed properties live in cache
//! cells on the arena data and are resolved on first read.

use std::fmt;
use std::sync::Arc;

use rustc_hash::FxHashSet;

use super::cache::Cache;
use super::diagnostics::{EdmError, EdmErrorCode};
use super::element::{ElementCore, SemanticElement};
use super::ids::{
    ComplexTypeId, ElementKey, EntityTypeId, EnumMemberId, EnumTypeId, NavigationPropertyId,
    PropertyId, RowTypeId,
};
use super::model::Model;
use super::relationships::NavigationProperty;
use super::resolve::{RowCursor, wrap_type_reference};
use super::types::{DeclaringType, PrimitiveKind, TypeRef};
use super::unresolved::{Resolution, Unresolved, UnresolvedKind};
use crate::base::constants::DEFAULT_ENUM_UNDERLYING_TYPE;
use crate::syntax::{
    ConcurrencyMode, CsdlComplexType, CsdlEntityType, CsdlEnumMember, CsdlEnumType, CsdlProperty,
};

// ============================================================================
// ARENA DATA
// ============================================================================

#[derive(Debug)]
pub(crate) struct EntityTypeData {
    pub core: ElementCore,
    pub node: Arc<CsdlEntityType>,
    pub properties: Vec<PropertyId>,
    pub navigation_properties: Vec<NavigationPropertyId>,
    pub base_type: Cache<Option<Resolution<EntityTypeId>>>,
    pub declared_key: Cache<Option<Arc<[Resolution<PropertyId>]>>>,
}

#[derive(Debug)]
pub(crate) struct ComplexTypeData {
    pub core: ElementCore,
    pub node: Arc<CsdlComplexType>,
    pub properties: Vec<PropertyId>,
    pub base_type: Cache<Option<Resolution<ComplexTypeId>>>,
}

#[derive(Debug)]
pub(crate) struct RowTypeData {
    pub core: ElementCore,
    pub properties: Vec<PropertyId>,
}

#[derive(Debug)]
pub(crate) struct PropertyData {
    pub core: ElementCore,
    pub node: Arc<CsdlProperty>,
    pub declaring_type: DeclaringType,
    /// Row types nested in this property's type reference, in pre-order.
    pub rows: Vec<RowTypeId>,
    pub type_ref: Cache<TypeRef>,
}

#[derive(Debug)]
pub(crate) struct EnumTypeData {
    pub core: ElementCore,
    pub node: Arc<CsdlEnumType>,
    pub members: Vec<EnumMemberId>,
    pub underlying_type: Cache<Resolution<PrimitiveKind>>,
    pub member_values: Cache<Arc<[i64]>>,
}

#[derive(Debug)]
pub(crate) struct EnumMemberData {
    pub core: ElementCore,
    pub node: Arc<CsdlEnumMember>,
    pub enum_type: EnumTypeId,
    pub position: usize,
}

macro_rules! view_identity {
    ($view:ident, $id:ty) => {
        impl<'m> $view<'m> {
            pub(crate) fn new(model: &'m Model, id: $id) -> Self {
                Self { model, id }
            }

            pub fn id(&self) -> $id {
                self.id
            }
        }

        impl PartialEq for $view<'_> {
            fn eq(&self, other: &Self) -> bool {
                std::ptr::eq(self.model, other.model) && self.id == other.id
            }
        }

        impl Eq for $view<'_> {}
    };
}

pub(crate) use view_identity;

// ============================================================================
// ENTITY TYPE
// ============================================================================

#[derive(Clone, Copy)]
pub struct EntityType<'m> {
    model: &'m Model,
    id: EntityTypeId,
}

view_identity!(EntityType, EntityTypeId);

impl<'m> EntityType<'m> {
    fn data(&self) -> &'m EntityTypeData {
        &self.model.entity_types[self.id.index()]
    }

    pub fn name(&self) -> &'m str {
        &self.data().node.name
    }

    pub fn namespace(&self) -> &'m str {
        self.model.namespace_of(self.data().core.schema)
    }

    pub fn full_name(&self) -> String {
        crate::base::qualify(self.namespace(), self.name())
    }

    pub fn is_abstract(&self) -> bool {
        self.data().node.is_abstract
    }

    pub fn is_open(&self) -> bool {
        self.data().node.is_open
    }

    /// `None` when no base type is declared.
    pub fn base_type(&self) -> Option<Resolution<EntityType<'m>>> {
        let model = self.model;
        let id = self.id;
        self.data()
            .base_type
            .get_value(|| compute_entity_base_type(model, id), || None)
            .map(|r| r.map(|base| EntityType::new(model, base)))
    }

    /// Resolved ancestors, nearest first. Stops at an unresolved or cyclic
    /// base.
    pub fn base_chain(&self) -> Vec<EntityType<'m>> {
        let mut chain = Vec::new();
        let mut seen = FxHashSet::default();
        seen.insert(self.id);
        let mut current = *self;
        while let Some(Resolution::Resolved(base)) = current.base_type() {
            if !seen.insert(base.id) {
                break;
            }
            chain.push(base);
            current = base;
        }
        chain
    }

    /// True if `other` is this type or one of its ancestors.
    pub fn derives_from(&self, other: EntityTypeId) -> bool {
        self.id == other || self.base_chain().iter().any(|t| t.id == other)
    }

    pub fn declared_properties(&self) -> Vec<Property<'m>> {
        let model = self.model;
        self.data()
            .properties
            .iter()
            .map(|&id| Property::new(model, id))
            .collect()
    }

    pub fn declared_navigation_properties(&self) -> Vec<NavigationProperty<'m>> {
        let model = self.model;
        self.data()
            .navigation_properties
            .iter()
            .map(|&id| NavigationProperty::new(model, id))
            .collect()
    }

    /// Inherited properties first, then declared ones.
    pub fn properties(&self) -> Vec<Property<'m>> {
        let mut all: Vec<_> = self
            .base_chain()
            .iter()
            .rev()
            .flat_map(|t| t.declared_properties())
            .collect();
        all.extend(self.declared_properties());
        all
    }

    pub fn navigation_properties(&self) -> Vec<NavigationProperty<'m>> {
        let mut all: Vec<_> = self
            .base_chain()
            .iter()
            .rev()
            .flat_map(|t| t.declared_navigation_properties())
            .collect();
        all.extend(self.declared_navigation_properties());
        all
    }

    /// Exact-name lookup over declared properties, then inherited ones.
    pub fn find_property(&self, name: &str) -> Option<Property<'m>> {
        find_in_chain(
            std::iter::once(*self).chain(self.base_chain()),
            |t| t.declared_properties(),
            name,
        )
    }

    pub fn find_navigation_property(&self, name: &str) -> Option<NavigationProperty<'m>> {
        std::iter::once(*self)
            .chain(self.base_chain())
            .flat_map(|t| t.declared_navigation_properties())
            .find(|p| p.name() == name)
    }

    /// The key as declared on this type; `None` when it declares none.
    pub fn declared_key(&self) -> Option<Vec<Resolution<Property<'m>>>> {
        let model = self.model;
        let id = self.id;
        let key = self
            .data()
            .declared_key
            .get_value(|| compute_declared_key(model, id), || None)?;
        Some(
            key.iter()
                .map(|r| r.clone().map(|p| Property::new(model, p)))
                .collect(),
        )
    }

    /// The declared key of this type or its nearest ancestor declaring one.
    pub fn key_properties(&self) -> Vec<Resolution<Property<'m>>> {
        std::iter::once(*self)
            .chain(self.base_chain())
            .find_map(|t| t.declared_key())
            .unwrap_or_default()
    }

    /// Types deriving from this one, directly or transitively.
    pub fn derived_types(&self) -> Vec<EntityType<'m>> {
        self.model
            .find_all_derived_entity_types(self.id)
            .into_iter()
            .map(|id| EntityType::new(self.model, id))
            .collect()
    }
}

impl<'m> SemanticElement<'m> for EntityType<'m> {
    fn model(&self) -> &'m Model {
        self.model
    }

    fn key(&self) -> ElementKey {
        ElementKey::EntityType(self.id)
    }

    fn errors(&self) -> Vec<EdmError> {
        let mut errors = self.model.duplicate_errors(self.key());
        if let Some(base) = self.base_type() {
            errors.extend_from_slice(base.placeholder_errors());
        }
        for key_property in self.declared_key().unwrap_or_default() {
            errors.extend_from_slice(key_property.placeholder_errors());
        }
        errors
    }
}

impl fmt::Debug for EntityType<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "EntityType({})", self.full_name())
    }
}

/// Same surface on a possibly unresolved entity type.
impl<'m> Resolution<EntityType<'m>> {
    pub fn name(&self) -> &str {
        match self {
            Self::Resolved(ty) => ty.name(),
            Self::Unresolved(placeholder) => placeholder.name(),
        }
    }

    pub fn full_name(&self) -> String {
        match self {
            Self::Resolved(ty) => ty.full_name(),
            Self::Unresolved(_) => String::new(),
        }
    }

    pub fn properties(&self) -> Vec<Property<'m>> {
        self.get().map(EntityType::properties).unwrap_or_default()
    }

    pub fn navigation_properties(&self) -> Vec<NavigationProperty<'m>> {
        self.get()
            .map(EntityType::navigation_properties)
            .unwrap_or_default()
    }

    pub fn errors(&self) -> Vec<EdmError> {
        match self {
            Self::Resolved(ty) => ty.errors(),
            Self::Unresolved(placeholder) => placeholder.errors().to_vec(),
        }
    }
}

fn compute_entity_base_type(model: &Model, id: EntityTypeId) -> Option<Resolution<EntityTypeId>> {
    let data = &model.entity_types[id.index()];
    let name = data.node.base_type.as_ref()?;
    let Some(base) = model.find_entity_type_id(name) else {
        tracing::debug!("[RESOLVE] base type '{}' of '{}' not found", name, data.node.name);
        return Some(Resolution::Unresolved(Unresolved::new(
            UnresolvedKind::EntityType,
            name.as_str(),
            data.core.location(),
            EdmErrorCode::BadUnresolvedEntityType,
            format!("cannot find entity type '{}'", name),
        )));
    };
    let reaches_self = raw_base_chain_reaches(
        base,
        id,
        |t| model.entity_types[t.index()].node.base_type.clone(),
        |n| model.find_entity_type_id(n),
    );
    if reaches_self {
        return Some(Resolution::Unresolved(Unresolved::new(
            UnresolvedKind::CyclicEntityType,
            name.as_str(),
            data.core.location(),
            EdmErrorCode::BadCyclicEntity,
            format!(
                "entity type '{}' derives from itself through base type '{}'",
                data.node.name, name
            ),
        )));
    }
    Some(Resolution::Resolved(base))
}

/// Walk declared base names from `start`, by name lookup only, and report
/// whether `target` is reached.
fn raw_base_chain_reaches<Id: Copy + Eq + std::hash::Hash>(
    start: Id,
    target: Id,
    base_name: impl Fn(Id) -> Option<smol_str::SmolStr>,
    lookup: impl Fn(&str) -> Option<Id>,
) -> bool {
    let mut visited = FxHashSet::default();
    let mut current = start;
    loop {
        if current == target {
            return true;
        }
        if !visited.insert(current) {
            return false;
        }
        match base_name(current).and_then(|n| lookup(&n)) {
            Some(next) => current = next,
            None => return false,
        }
    }
}

fn compute_declared_key(
    model: &Model,
    id: EntityTypeId,
) -> Option<Arc<[Resolution<PropertyId>]>> {
    let data = &model.entity_types[id.index()];
    let names = data.node.key.as_ref()?;
    let ty = EntityType::new(model, id);
    let declared = ty.declared_properties();
    Some(
        names
            .iter()
            .map(|name| match declared.iter().find(|p| p.name() == name.as_str()) {
                Some(property) => Resolution::Resolved(property.id()),
                None => Resolution::Unresolved(Unresolved::new(
                    UnresolvedKind::Property,
                    name.as_str(),
                    data.core.location(),
                    EdmErrorCode::BadUnresolvedProperty,
                    format!(
                        "key property '{}' is not declared by '{}'",
                        name,
                        ty.full_name()
                    ),
                )),
            })
            .collect(),
    )
}

fn find_in_chain<'m, T>(
    chain: impl Iterator<Item = T>,
    declared: impl Fn(&T) -> Vec<Property<'m>>,
    name: &str,
) -> Option<Property<'m>> {
    chain
        .flat_map(|t| declared(&t))
        .find(|p| p.name() == name)
}

// ============================================================================
// COMPLEX TYPE
// ============================================================================

#[derive(Clone, Copy)]
pub struct ComplexType<'m> {
    model: &'m Model,
    id: ComplexTypeId,
}

view_identity!(ComplexType, ComplexTypeId);

impl<'m> ComplexType<'m> {
    fn data(&self) -> &'m ComplexTypeData {
        &self.model.complex_types[self.id.index()]
    }

    pub fn name(&self) -> &'m str {
        &self.data().node.name
    }

    pub fn namespace(&self) -> &'m str {
        self.model.namespace_of(self.data().core.schema)
    }

    pub fn full_name(&self) -> String {
        crate::base::qualify(self.namespace(), self.name())
    }

    pub fn is_abstract(&self) -> bool {
        self.data().node.is_abstract
    }

    pub fn base_type(&self) -> Option<Resolution<ComplexType<'m>>> {
        let model = self.model;
        let id = self.id;
        self.data()
            .base_type
            .get_value(|| compute_complex_base_type(model, id), || None)
            .map(|r| r.map(|base| ComplexType::new(model, base)))
    }

    pub fn base_chain(&self) -> Vec<ComplexType<'m>> {
        let mut chain = Vec::new();
        let mut seen = FxHashSet::default();
        seen.insert(self.id);
        let mut current = *self;
        while let Some(Resolution::Resolved(base)) = current.base_type() {
            if !seen.insert(base.id) {
                break;
            }
            chain.push(base);
            current = base;
        }
        chain
    }

    pub fn declared_properties(&self) -> Vec<Property<'m>> {
        let model = self.model;
        self.data()
            .properties
            .iter()
            .map(|&id| Property::new(model, id))
            .collect()
    }

    pub fn properties(&self) -> Vec<Property<'m>> {
        let mut all: Vec<_> = self
            .base_chain()
            .iter()
            .rev()
            .flat_map(|t| t.declared_properties())
            .collect();
        all.extend(self.declared_properties());
        all
    }

    pub fn find_property(&self, name: &str) -> Option<Property<'m>> {
        find_in_chain(
            std::iter::once(*self).chain(self.base_chain()),
            |t| t.declared_properties(),
            name,
        )
    }
}

impl<'m> SemanticElement<'m> for ComplexType<'m> {
    fn model(&self) -> &'m Model {
        self.model
    }

    fn key(&self) -> ElementKey {
        ElementKey::ComplexType(self.id)
    }

    fn errors(&self) -> Vec<EdmError> {
        let mut errors = self.model.duplicate_errors(self.key());
        if let Some(base) = self.base_type() {
            errors.extend_from_slice(base.placeholder_errors());
        }
        errors
    }
}

impl fmt::Debug for ComplexType<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ComplexType({})", self.full_name())
    }
}

fn compute_complex_base_type(
    model: &Model,
    id: ComplexTypeId,
) -> Option<Resolution<ComplexTypeId>> {
    let data = &model.complex_types[id.index()];
    let name = data.node.base_type.as_ref()?;
    let Some(base) = model.find_complex_type_id(name) else {
        return Some(Resolution::Unresolved(Unresolved::new(
            UnresolvedKind::ComplexType,
            name.as_str(),
            data.core.location(),
            EdmErrorCode::BadUnresolvedComplexType,
            format!("cannot find complex type '{}'", name),
        )));
    };
    let reaches_self = raw_base_chain_reaches(
        base,
        id,
        |t| model.complex_types[t.index()].node.base_type.clone(),
        |n| model.find_complex_type_id(n),
    );
    if reaches_self {
        return Some(Resolution::Unresolved(Unresolved::new(
            UnresolvedKind::CyclicComplexType,
            name.as_str(),
            data.core.location(),
            EdmErrorCode::BadCyclicComplex,
            format!(
                "complex type '{}' derives from itself through base type '{}'",
                data.node.name, name
            ),
        )));
    }
    Some(Resolution::Resolved(base))
}

// ============================================================================
// ROW TYPE
// ============================================================================

/// An anonymous structured type introduced by a row type reference.
#[derive(Clone, Copy)]
pub struct RowType<'m> {
    model: &'m Model,
    id: RowTypeId,
}

view_identity!(RowType, RowTypeId);

impl<'m> RowType<'m> {
    pub fn properties(&self) -> Vec<Property<'m>> {
        let model = self.model;
        model.row_types[self.id.index()]
            .properties
            .iter()
            .map(|&id| Property::new(model, id))
            .collect()
    }

    pub fn find_property(&self, name: &str) -> Option<Property<'m>> {
        self.properties().into_iter().find(|p| p.name() == name)
    }
}

impl<'m> SemanticElement<'m> for RowType<'m> {
    fn model(&self) -> &'m Model {
        self.model
    }

    fn key(&self) -> ElementKey {
        ElementKey::RowType(self.id)
    }

    fn errors(&self) -> Vec<EdmError> {
        Vec::new()
    }
}

impl fmt::Debug for RowType<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "RowType#{}", self.id.0)
    }
}

// ============================================================================
// PROPERTY
// ============================================================================

/// A structural property of an entity, complex or row type.
#[derive(Clone, Copy)]
pub struct Property<'m> {
    model: &'m Model,
    id: PropertyId,
}

view_identity!(Property, PropertyId);

impl<'m> Property<'m> {
    fn data(&self) -> &'m PropertyData {
        &self.model.properties[self.id.index()]
    }

    pub fn name(&self) -> &'m str {
        &self.data().node.name
    }

    pub fn declaring_type(&self) -> DeclaringType {
        self.data().declaring_type
    }

    pub fn declaring_entity_type(&self) -> Option<EntityType<'m>> {
        match self.declaring_type() {
            DeclaringType::Entity(id) => Some(EntityType::new(self.model, id)),
            _ => None,
        }
    }

    /// The resolved type; computed once.
    pub fn type_ref(&self) -> TypeRef {
        let data = self.data();
        let model = self.model;
        data.type_ref.get_value(
            || {
                let mut rows = RowCursor::new(&data.rows);
                wrap_type_reference(model, &data.core.location(), &data.node.type_ref, &mut rows)
            },
            || unreachable_type_cycle(data.core.location(), data.node.name.as_str()),
        )
    }

    pub fn default_value(&self) -> Option<&'m str> {
        self.data().node.default_value.as_deref()
    }

    pub fn concurrency_mode(&self) -> ConcurrencyMode {
        self.data().node.concurrency_mode
    }
}

/// Fallback for a reentrant type resolution. Type references resolve by name
/// lookup alone, so this is only reachable through a defect.
pub(crate) fn unreachable_type_cycle(location: crate::base::Location, name: &str) -> TypeRef {
    TypeRef::new(
        super::types::TypeDefinition::Unknown(Unresolved::new(
            UnresolvedKind::Type,
            name,
            location,
            EdmErrorCode::BadUnresolvedType,
            format!("type of '{}' depends on itself", name),
        )),
        true,
    )
}

impl<'m> SemanticElement<'m> for Property<'m> {
    fn model(&self) -> &'m Model {
        self.model
    }

    fn key(&self) -> ElementKey {
        ElementKey::Property(self.id)
    }

    fn errors(&self) -> Vec<EdmError> {
        self.type_ref().errors().to_vec()
    }
}

impl fmt::Debug for Property<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Property({})", self.name())
    }
}

// ============================================================================
// ENUM TYPE
// ============================================================================

#[derive(Clone, Copy)]
pub struct EnumType<'m> {
    model: &'m Model,
    id: EnumTypeId,
}

view_identity!(EnumType, EnumTypeId);

impl<'m> EnumType<'m> {
    fn data(&self) -> &'m EnumTypeData {
        &self.model.enum_types[self.id.index()]
    }

    pub fn name(&self) -> &'m str {
        &self.data().node.name
    }

    pub fn namespace(&self) -> &'m str {
        self.model.namespace_of(self.data().core.schema)
    }

    pub fn full_name(&self) -> String {
        crate::base::qualify(self.namespace(), self.name())
    }

    pub fn is_flags(&self) -> bool {
        self.data().node.is_flags
    }

    /// Integral primitive backing the members; `Int32` when undeclared.
    pub fn underlying_type(&self) -> Resolution<PrimitiveKind> {
        let data = self.data();
        data.underlying_type.get_value(
            || {
                let name = data
                    .node
                    .underlying_type
                    .as_deref()
                    .unwrap_or(DEFAULT_ENUM_UNDERLYING_TYPE);
                match PrimitiveKind::from_qualified_name(name) {
                    Some(kind) if kind.is_integral() => Resolution::Resolved(kind),
                    _ => Resolution::Unresolved(Unresolved::new(
                        UnresolvedKind::PrimitiveType,
                        name,
                        data.core.location(),
                        EdmErrorCode::BadUnresolvedPrimitiveType,
                        format!("'{}' is not an integral primitive type", name),
                    )),
                }
            },
            || Resolution::Resolved(PrimitiveKind::Int32),
        )
    }

    pub fn members(&self) -> Vec<EnumMember<'m>> {
        let model = self.model;
        self.data()
            .members
            .iter()
            .map(|&id| EnumMember::new(model, id))
            .collect()
    }

    pub fn find_member(&self, name: &str) -> Option<EnumMember<'m>> {
        self.members().into_iter().find(|m| m.name() == name)
    }

    /// Explicit values, or the previous value plus one starting at zero.
    fn member_values(&self) -> Arc<[i64]> {
        let data = self.data();
        let model = self.model;
        data.member_values.get_value(
            || {
                let mut next = 0i64;
                data.members
                    .iter()
                    .map(|&m| {
                        let value = model.enum_members[m.index()].node.value.unwrap_or(next);
                        next = value.saturating_add(1);
                        value
                    })
                    .collect()
            },
            || Arc::from(Vec::new()),
        )
    }
}

impl<'m> SemanticElement<'m> for EnumType<'m> {
    fn model(&self) -> &'m Model {
        self.model
    }

    fn key(&self) -> ElementKey {
        ElementKey::EnumType(self.id)
    }

    fn errors(&self) -> Vec<EdmError> {
        let mut errors = self.model.duplicate_errors(self.key());
        errors.extend_from_slice(self.underlying_type().placeholder_errors());
        errors
    }
}

impl fmt::Debug for EnumType<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "EnumType({})", self.full_name())
    }
}

#[derive(Clone, Copy)]
pub struct EnumMember<'m> {
    model: &'m Model,
    id: EnumMemberId,
}

view_identity!(EnumMember, EnumMemberId);

impl<'m> EnumMember<'m> {
    fn data(&self) -> &'m EnumMemberData {
        &self.model.enum_members[self.id.index()]
    }

    pub fn name(&self) -> &'m str {
        &self.data().node.name
    }

    pub fn declaring_type(&self) -> EnumType<'m> {
        EnumType::new(self.model, self.data().enum_type)
    }

    pub fn value(&self) -> i64 {
        let values = self.declaring_type().member_values();
        values.get(self.data().position).copied().unwrap_or_default()
    }
}

impl<'m> SemanticElement<'m> for EnumMember<'m> {
    fn model(&self) -> &'m Model {
        self.model
    }

    fn key(&self) -> ElementKey {
        ElementKey::EnumMember(self.id)
    }

    fn errors(&self) -> Vec<EdmError> {
        Vec::new()
    }
}

impl fmt::Debug for EnumMember<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "EnumMember({})", self.name())
    }
}
