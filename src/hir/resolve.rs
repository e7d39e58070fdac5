//! Type and expression resolution.
//!
//! Two dispatch functions over closed syntax tags:
//!
//! - [`wrap_type_reference`] turns a [`CsdlTypeReference`] into a [`TypeRef`],
//!   recursing into collection element types.
//! - [`resolve_expression`] computes the resolved part of one annotation
//!   expression (parsed constant, bound path, referenced label, entity set or
//!   enum member).
//!
//! Neither returns an error. A name that matches nothing yields an
//! [`Unresolved`] of the kind the reference expected, carrying one
//! [`EdmError`] that cites the name.

use std::sync::Arc;

use rustc_hash::FxHashSet;
use smol_str::SmolStr;

use super::diagnostics::{EdmError, EdmErrorCode};
use super::expressions::{ConstantValue, ExpressionData, ResolvedExpression};
use super::ids::{
    ElementKey, EntitySetId, EntityTypeId, EnumMemberId, ExpressionId, RowTypeId, SchemaId,
};
use super::model::Model;
use super::structured::{ComplexType, EntityType};
use super::types::{PrimitiveKind, SchemaType, StructuredTypeId, TypeDefinition, TypeRef};
use super::unresolved::{Resolution, Unresolved, UnresolvedKind};
use crate::base::{Location, TwoSegmentPath, literals};
use crate::syntax::{ConstantKind, CsdlExpression, CsdlExpressionKind, CsdlTypeKind, CsdlTypeReference};

// ============================================================================
// TYPE REFERENCES
// ============================================================================

/// Row types registered for one owner, consumed in the pre-order in which
/// they appear in the owner's type reference.
pub(crate) struct RowCursor<'a> {
    rows: &'a [RowTypeId],
    next: usize,
}

impl<'a> RowCursor<'a> {
    pub fn new(rows: &'a [RowTypeId]) -> Self {
        Self { rows, next: 0 }
    }

    fn take(&mut self) -> Option<RowTypeId> {
        let row = self.rows.get(self.next).copied();
        self.next += 1;
        row
    }
}

/// Build the semantic form of a type reference written at `owner`.
pub(crate) fn wrap_type_reference(
    model: &Model,
    owner: &Location,
    node: &CsdlTypeReference,
    rows: &mut RowCursor<'_>,
) -> TypeRef {
    let location = node.location.clone().unwrap_or_else(|| owner.clone());
    let definition = match &node.kind {
        CsdlTypeKind::Primitive(name) => TypeDefinition::Primitive(resolve_primitive(name, &location)),
        CsdlTypeKind::Entity(name) => {
            TypeDefinition::Entity(resolve_entity_type(model, name, &location))
        }
        CsdlTypeKind::Complex(name) => {
            TypeDefinition::Complex(resolve_complex_type(model, name, &location))
        }
        CsdlTypeKind::Enum(name) => TypeDefinition::Enum(resolve_enum_type(model, name, &location)),
        CsdlTypeKind::Named(name) => resolve_named_type(model, name, &location),
        CsdlTypeKind::Collection(element) => TypeDefinition::Collection(Box::new(
            wrap_type_reference(model, &location, element, rows),
        )),
        CsdlTypeKind::EntityReference(name) => {
            TypeDefinition::EntityReference(resolve_entity_type(model, name, &location))
        }
        CsdlTypeKind::Row(_) => match rows.take() {
            Some(row) => TypeDefinition::Row(row),
            None => TypeDefinition::Unknown(Unresolved::new(
                UnresolvedKind::Type,
                "",
                location.clone(),
                EdmErrorCode::BadUnresolvedType,
                "row type was not registered with the model",
            )),
        },
    };
    TypeRef {
        definition,
        is_nullable: node.is_nullable,
        facets: node.facets,
    }
}

fn resolve_primitive(name: &str, location: &Location) -> Resolution<PrimitiveKind> {
    match PrimitiveKind::from_qualified_name(name) {
        Some(kind) => Resolution::Resolved(kind),
        None => {
            tracing::debug!("[RESOLVE] unknown primitive type '{}'", name);
            Resolution::Unresolved(Unresolved::new(
                UnresolvedKind::PrimitiveType,
                name,
                location.clone(),
                EdmErrorCode::BadUnresolvedPrimitiveType,
                format!("'{}' is not a primitive type", name),
            ))
        }
    }
}

pub(crate) fn resolve_entity_type(
    model: &Model,
    name: &str,
    location: &Location,
) -> Resolution<EntityTypeId> {
    match model.find_entity_type_id(name) {
        Some(id) => Resolution::Resolved(id),
        None => {
            tracing::debug!("[RESOLVE] entity type '{}' not found", name);
            Resolution::Unresolved(Unresolved::new(
                UnresolvedKind::EntityType,
                name,
                location.clone(),
                EdmErrorCode::BadUnresolvedEntityType,
                format!("cannot find entity type '{}'", name),
            ))
        }
    }
}

fn resolve_complex_type(
    model: &Model,
    name: &str,
    location: &Location,
) -> Resolution<super::ids::ComplexTypeId> {
    match model.find_complex_type_id(name) {
        Some(id) => Resolution::Resolved(id),
        None => {
            tracing::debug!("[RESOLVE] complex type '{}' not found", name);
            Resolution::Unresolved(Unresolved::new(
                UnresolvedKind::ComplexType,
                name,
                location.clone(),
                EdmErrorCode::BadUnresolvedComplexType,
                format!("cannot find complex type '{}'", name),
            ))
        }
    }
}

fn resolve_enum_type(
    model: &Model,
    name: &str,
    location: &Location,
) -> Resolution<super::ids::EnumTypeId> {
    match model.find_enum_type_id(name) {
        Some(id) => Resolution::Resolved(id),
        None => {
            tracing::debug!("[RESOLVE] enum type '{}' not found", name);
            Resolution::Unresolved(Unresolved::new(
                UnresolvedKind::EnumType,
                name,
                location.clone(),
                EdmErrorCode::BadUnresolvedEnumType,
                format!("cannot find enum type '{}'", name),
            ))
        }
    }
}

/// A name whose kind the parser did not know: primitive first, then any
/// declared schema type.
fn resolve_named_type(model: &Model, name: &str, location: &Location) -> TypeDefinition {
    if let Some(kind) = PrimitiveKind::from_qualified_name(name) {
        return TypeDefinition::Primitive(Resolution::Resolved(kind));
    }
    match model.find_type(name) {
        Some(SchemaType::Entity(id)) => TypeDefinition::Entity(Resolution::Resolved(id)),
        Some(SchemaType::Complex(id)) => TypeDefinition::Complex(Resolution::Resolved(id)),
        Some(SchemaType::Enum(id)) => TypeDefinition::Enum(Resolution::Resolved(id)),
        None => {
            tracing::debug!("[RESOLVE] type '{}' not found", name);
            TypeDefinition::Unknown(Unresolved::new(
                UnresolvedKind::Type,
                name,
                location.clone(),
                EdmErrorCode::BadUnresolvedType,
                format!("cannot find type '{}'", name),
            ))
        }
    }
}

pub(crate) fn resolve_structured_type(
    model: &Model,
    name: &str,
    location: &Location,
    kind: UnresolvedKind,
    code: EdmErrorCode,
) -> Resolution<StructuredTypeId> {
    match model.find_structured_type_id(name) {
        Some(id) => Resolution::Resolved(id),
        None => {
            tracing::debug!("[RESOLVE] structured type '{}' not found", name);
            Resolution::Unresolved(Unresolved::new(
                kind,
                name,
                location.clone(),
                code,
                format!("cannot find structured type '{}'", name),
            ))
        }
    }
}

// ============================================================================
// EXPRESSIONS
// ============================================================================

/// Resolve the parts of expression `id` that depend on the rest of the
/// model.
pub(crate) fn resolve_expression(
    model: &Model,
    id: ExpressionId,
    data: &ExpressionData,
) -> ResolvedExpression {
    let location = data
        .node
        .location
        .clone()
        .unwrap_or_else(|| Location::object(ElementKey::Expression(id).to_string()));

    match &data.node.kind {
        CsdlExpressionKind::Constant { kind, literal } => {
            let (value, error) = parse_constant(*kind, literal, location);
            ResolvedExpression::Constant(value, error)
        }
        CsdlExpressionKind::Null
        | CsdlExpressionKind::Collection(_)
        | CsdlExpressionKind::If { .. } => ResolvedExpression::Inert,
        CsdlExpressionKind::Path(segments) => ResolvedExpression::Path(
            data.binding_context
                .map(|binding| resolve_path(model, binding, segments, &location)),
        ),
        CsdlExpressionKind::Record { type_name, .. } => {
            ResolvedExpression::Record(type_name.as_ref().map(|name| {
                resolve_structured_type(
                    model,
                    name,
                    &location,
                    UnresolvedKind::Type,
                    EdmErrorCode::BadUnresolvedType,
                )
            }))
        }
        CsdlExpressionKind::Labeled { label, .. } => {
            let count = model.label_count_in_schema(label, data.schema);
            let ambiguous = (count > 1).then(|| {
                EdmError::new(
                    location,
                    EdmErrorCode::BadAmbiguousElementBinding,
                    format!("label '{}' is declared {} times", label, count),
                )
            });
            ResolvedExpression::Labeled(ambiguous)
        }
        CsdlExpressionKind::LabeledReference(label) => ResolvedExpression::LabeledReference(
            resolve_labeled_reference(model, label, data.schema, location),
        ),
        CsdlExpressionKind::EntitySetReference(path) => {
            ResolvedExpression::EntitySet(resolve_entity_set_reference(model, path, location))
        }
        CsdlExpressionKind::EnumMemberReference(path) => {
            ResolvedExpression::EnumMember(resolve_enum_member_reference(model, path, location))
        }
    }
}

/// Parse a raw literal. A malformed literal yields the kind's default value
/// and one error.
pub(crate) fn parse_constant(
    kind: ConstantKind,
    literal: &str,
    location: Location,
) -> (ConstantValue, Option<EdmError>) {
    fn checked<T>(
        parsed: Option<T>,
        wrap: impl FnOnce(T) -> ConstantValue,
        fallback: ConstantValue,
        code: EdmErrorCode,
        literal: &str,
        location: Location,
    ) -> (ConstantValue, Option<EdmError>) {
        match parsed {
            Some(value) => (wrap(value), None),
            None => {
                tracing::debug!("[RESOLVE] invalid literal '{}' ({})", literal, code);
                let message = format!("'{}' is not a valid {} literal", literal, kind_name(code));
                (fallback, Some(EdmError::new(location, code, message)))
            }
        }
    }

    match kind {
        ConstantKind::Binary => checked(
            literals::try_parse_binary(literal),
            |bytes| ConstantValue::Binary(bytes.into()),
            ConstantValue::Binary(Arc::from(Vec::new())),
            EdmErrorCode::InvalidBinary,
            literal,
            location,
        ),
        ConstantKind::Boolean => checked(
            literals::try_parse_boolean(literal),
            ConstantValue::Boolean,
            ConstantValue::Boolean(false),
            EdmErrorCode::InvalidBoolean,
            literal,
            location,
        ),
        ConstantKind::DateTime => checked(
            literals::try_parse_date_time(literal),
            ConstantValue::DateTime,
            ConstantValue::DateTime(Default::default()),
            EdmErrorCode::InvalidDateTime,
            literal,
            location,
        ),
        ConstantKind::DateTimeOffset => checked(
            literals::try_parse_date_time_offset(literal),
            ConstantValue::DateTimeOffset,
            ConstantValue::DateTimeOffset(Default::default()),
            EdmErrorCode::InvalidDateTimeOffset,
            literal,
            location,
        ),
        ConstantKind::Decimal => checked(
            literals::try_parse_decimal(literal),
            ConstantValue::Decimal,
            ConstantValue::Decimal(rust_decimal::Decimal::ZERO),
            EdmErrorCode::InvalidDecimal,
            literal,
            location,
        ),
        ConstantKind::Floating => checked(
            literals::try_parse_floating(literal),
            ConstantValue::Floating,
            ConstantValue::Floating(0.0),
            EdmErrorCode::InvalidFloatingPoint,
            literal,
            location,
        ),
        ConstantKind::Guid => checked(
            literals::try_parse_guid(literal),
            ConstantValue::Guid,
            ConstantValue::Guid(uuid::Uuid::nil()),
            EdmErrorCode::InvalidGuid,
            literal,
            location,
        ),
        ConstantKind::Integer => checked(
            literals::try_parse_integer(literal),
            ConstantValue::Integer,
            ConstantValue::Integer(0),
            EdmErrorCode::InvalidInteger,
            literal,
            location,
        ),
        ConstantKind::String => (ConstantValue::String(Arc::from(literal)), None),
        ConstantKind::Time => checked(
            literals::try_parse_time(literal),
            ConstantValue::Time,
            ConstantValue::Time(chrono::NaiveTime::MIN),
            EdmErrorCode::InvalidTime,
            literal,
            location,
        ),
    }
}

fn kind_name(code: EdmErrorCode) -> &'static str {
    match code {
        EdmErrorCode::InvalidBinary => "binary",
        EdmErrorCode::InvalidBoolean => "boolean",
        EdmErrorCode::InvalidDateTime => "date-time",
        EdmErrorCode::InvalidDateTimeOffset => "date-time-offset",
        EdmErrorCode::InvalidDecimal => "decimal",
        EdmErrorCode::InvalidFloatingPoint => "floating point",
        EdmErrorCode::InvalidGuid => "guid",
        EdmErrorCode::InvalidInteger => "integer",
        EdmErrorCode::InvalidTime => "time",
        _ => "constant",
    }
}

/// Bind path segments to properties, starting at the binding entity type
/// and stepping through complex and navigation properties.
fn resolve_path(
    model: &Model,
    binding: EntityTypeId,
    segments: &[SmolStr],
    location: &Location,
) -> Resolution<ElementKey> {
    let unresolved = |segment: &str, message: String| {
        Resolution::Unresolved(Unresolved::new(
            UnresolvedKind::Property,
            segment,
            location.clone(),
            EdmErrorCode::BadUnresolvedProperty,
            message,
        ))
    };

    let mut current = Some(StructuredTypeId::Entity(binding));
    let mut found = None;
    for segment in segments {
        let Some(owner) = current else {
            return unresolved(
                segment,
                format!("path segment '{}' follows a property without structure", segment),
            );
        };
        let (key, next) = match owner {
            StructuredTypeId::Entity(id) => {
                let ty = EntityType::new(model, id);
                if let Some(property) = ty.find_property(segment) {
                    (Some(ElementKey::Property(property.id())), structure_of(&property.type_ref()))
                } else if let Some(navigation) = ty.find_navigation_property(segment) {
                    let next = navigation
                        .to_entity_type()
                        .resolved()
                        .map(|target| StructuredTypeId::Entity(target.id()));
                    (Some(ElementKey::NavigationProperty(navigation.id())), next)
                } else {
                    (None, None)
                }
            }
            StructuredTypeId::Complex(id) => match ComplexType::new(model, id).find_property(segment) {
                Some(property) => (
                    Some(ElementKey::Property(property.id())),
                    structure_of(&property.type_ref()),
                ),
                None => (None, None),
            },
        };
        let Some(key) = key else {
            tracing::debug!("[RESOLVE] path segment '{}' not found", segment);
            return unresolved(segment, format!("cannot resolve path segment '{}'", segment));
        };
        found = Some(key);
        current = next;
    }
    match found {
        Some(key) => Resolution::Resolved(key),
        None => unresolved("", "empty path".to_string()),
    }
}

pub(crate) fn structure_of(ty: &TypeRef) -> Option<StructuredTypeId> {
    let ty = ty.element_type().unwrap_or(ty);
    ty.as_entity()
        .map(StructuredTypeId::Entity)
        .or_else(|| ty.as_complex().map(StructuredTypeId::Complex))
}

/// Resolve a label, then follow the chain of labeled references it leads to.
/// A chain that comes back to a label already seen is cyclic.
fn resolve_labeled_reference(
    model: &Model,
    label: &str,
    schema: SchemaId,
    location: Location,
) -> Resolution<ExpressionId> {
    let target = match model.resolve_label(label, schema, location.clone()) {
        Resolution::Resolved(target) => target,
        unresolved => return unresolved,
    };

    // Labels are only unique per schema.
    let mut visited: FxHashSet<(SchemaId, SmolStr)> = FxHashSet::default();
    let first = model.expressions.get(target.index());
    let mut node: Arc<CsdlExpression> = Arc::clone(&first.node);
    let mut scope = first.schema;
    let cyclic = loop {
        let next = match &node.kind {
            CsdlExpressionKind::Labeled { label, expression } => {
                if !visited.insert((scope, label.clone())) {
                    break true;
                }
                Arc::clone(expression)
            }
            CsdlExpressionKind::LabeledReference(next) => {
                match model.resolve_label(next, scope, location.clone()) {
                    Resolution::Resolved(id) => {
                        let data = model.expressions.get(id.index());
                        scope = data.schema;
                        Arc::clone(&data.node)
                    }
                    Resolution::Unresolved(_) => break false,
                }
            }
            _ => break false,
        };
        node = next;
    };

    if cyclic {
        tracing::debug!("[RESOLVE] labeled element '{}' refers to itself", label);
        return Resolution::Unresolved(Unresolved::new(
            UnresolvedKind::LabeledElement,
            label,
            location,
            EdmErrorCode::BadCyclicLabeledElement,
            format!("labeled element '{}' refers to itself", label),
        ));
    }
    Resolution::Resolved(target)
}

fn resolve_entity_set_reference(
    model: &Model,
    path: &TwoSegmentPath,
    location: Location,
) -> Resolution<EntitySetId> {
    let Some(container) = model.find_entity_container(path.first()) else {
        tracing::debug!("[RESOLVE] entity container '{}' not found", path.first());
        return Resolution::Unresolved(Unresolved::new(
            UnresolvedKind::EntitySet,
            path.to_string(),
            location,
            EdmErrorCode::BadUnresolvedEntityContainer,
            format!("cannot find entity container '{}'", path.first()),
        ));
    };
    match container.find_entity_set(path.second()) {
        Some(set) => Resolution::Resolved(set.id()),
        None => {
            tracing::debug!("[RESOLVE] entity set '{}' not found", path);
            Resolution::Unresolved(Unresolved::new(
                UnresolvedKind::EntitySet,
                path.to_string(),
                location,
                EdmErrorCode::BadUnresolvedEntitySet,
                format!("cannot find entity set '{}'", path),
            ))
        }
    }
}

fn resolve_enum_member_reference(
    model: &Model,
    path: &TwoSegmentPath,
    location: Location,
) -> Resolution<EnumMemberId> {
    let Some(enum_type) = model.find_enum_type(path.first()) else {
        tracing::debug!("[RESOLVE] enum type '{}' not found", path.first());
        return Resolution::Unresolved(Unresolved::new(
            UnresolvedKind::EnumMember,
            path.to_string(),
            location,
            EdmErrorCode::BadUnresolvedEnumType,
            format!("cannot find enum type '{}'", path.first()),
        ));
    };
    match enum_type.find_member(path.second()) {
        Some(member) => Resolution::Resolved(member.id()),
        None => {
            tracing::debug!("[RESOLVE] enum member '{}' not found", path);
            Resolution::Unresolved(Unresolved::new(
                UnresolvedKind::EnumMember,
                path.to_string(),
                location,
                EdmErrorCode::BadUnresolvedEnumMember,
                format!("cannot find enum member '{}'", path),
            ))
        }
    }
}
