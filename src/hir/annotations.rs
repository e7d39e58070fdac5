//! Vocabulary annotations, value terms and property values.
//!
//! Annotations are not registered at model construction. The first read of
//! an element's inline annotations (or of the out-of-line index) allocates
//! them, with their expression trees and property values, in one batch into
//! the model's append-only arenas.

use std::fmt;
use std::sync::Arc;

use smol_str::SmolStr;

use super::cache::Cache;
use super::diagnostics::{EdmError, EdmErrorCode};
use super::element::{ElementCore, SemanticElement};
use super::expressions::{Expression, ExpressionData};
use super::ids::{
    AnnotationId, ElementKey, EntityTypeId, ExpressionId, PropertyId, PropertyValueId, RowTypeId,
    SchemaId, ValueTermId,
};
use super::model::{Model, Schema};
use super::resolve::{RowCursor, resolve_structured_type, structure_of, wrap_type_reference};
use super::structured::{ComplexType, EntityType, Property, unreachable_type_cycle};
use super::types::{StructuredTypeId, TypeRef};
use super::unresolved::{Resolution, Unresolved, UnresolvedKind};
use crate::base::Location;
use crate::syntax::{
    CsdlAnnotationKind, CsdlExpression, CsdlExpressionKind, CsdlPropertyValue, CsdlValueTerm,
    CsdlVocabularyAnnotation,
};

// ============================================================================
// VALUE TERM
// ============================================================================

#[derive(Debug)]
pub(crate) struct ValueTermData {
    pub core: ElementCore,
    pub node: Arc<CsdlValueTerm>,
    pub rows: Vec<RowTypeId>,
    pub type_ref: Cache<TypeRef>,
}

/// A term whose applications carry a single value.
#[derive(Clone, Copy)]
pub struct ValueTerm<'m> {
    model: &'m Model,
    id: ValueTermId,
}

super::structured::view_identity!(ValueTerm, ValueTermId);

impl<'m> ValueTerm<'m> {
    fn data(&self) -> &'m ValueTermData {
        &self.model.value_terms[self.id.index()]
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

    pub fn type_ref(&self) -> TypeRef {
        let data = self.data();
        let model = self.model;
        data.type_ref.get_value(
            || {
                let mut rows = RowCursor::new(&data.rows);
                wrap_type_reference(model, &data.core.location(), &data.node.type_ref, &mut rows)
            },
            || unreachable_type_cycle(data.core.location(), &data.node.name),
        )
    }
}

impl<'m> SemanticElement<'m> for ValueTerm<'m> {
    fn model(&self) -> &'m Model {
        self.model
    }

    fn key(&self) -> ElementKey {
        ElementKey::ValueTerm(self.id)
    }

    fn errors(&self) -> Vec<EdmError> {
        let mut errors = self.model.duplicate_errors(self.key());
        errors.extend_from_slice(self.type_ref().errors());
        errors
    }
}

impl fmt::Debug for ValueTerm<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ValueTerm({})", self.full_name())
    }
}

// ============================================================================
// ALLOCATION
// ============================================================================

/// Where a batch of annotations was written and what it applies to.
#[derive(Clone, Debug)]
pub(crate) struct AnnotationOrigin {
    pub target: Resolution<ElementKey>,
    pub schema: SchemaId,
    pub binding_context: Option<EntityTypeId>,
    /// Qualifier of the enclosing `Annotations` block.
    pub qualifier: Option<SmolStr>,
}

#[derive(Debug)]
pub(crate) struct AnnotationData {
    pub node: Arc<CsdlVocabularyAnnotation>,
    pub location: Option<Location>,
    pub target: Resolution<ElementKey>,
    pub schema: SchemaId,
    pub qualifier: Option<SmolStr>,
    pub value: Option<ExpressionId>,
    pub property_values: Vec<PropertyValueId>,
    pub term: Cache<AnnotationTerm>,
}

#[derive(Debug)]
pub(crate) struct PropertyValueData {
    pub node: Arc<CsdlPropertyValue>,
    pub owner: PropertyValueOwner,
    pub value: ExpressionId,
    pub bound_property: Cache<Option<Resolution<PropertyId>>>,
}

/// What a property value assigns into.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum PropertyValueOwner {
    Record(ExpressionId),
    TypeAnnotation(AnnotationId),
}

/// Allocate `nodes` and their expression trees as one batch.
///
/// Takes the annotation, expression and property value arenas for writing,
/// always in that order, and touches nothing else in the model while holding
/// them.
pub(crate) fn allocate_annotations(
    model: &Model,
    nodes: &[Arc<CsdlVocabularyAnnotation>],
    origin: AnnotationOrigin,
) -> Arc<[AnnotationId]> {
    let mut annotations = model.annotations.write();
    let mut expressions = model.expressions.write();
    let mut property_values = model.property_values.write();

    let mut batch = Batch {
        origin: &origin,
        annotation_base: annotations.next_index(),
        expression_base: expressions.next_index(),
        property_value_base: property_values.next_index(),
        annotations: Vec::with_capacity(nodes.len()),
        expressions: Vec::new(),
        property_values: Vec::new(),
    };
    let ids: Arc<[AnnotationId]> = nodes.iter().map(|node| batch.annotation(node)).collect();

    tracing::trace!(
        "[RESOLVE] allocated {} annotations, {} expressions",
        batch.annotations.len(),
        batch.expressions.len()
    );
    annotations.extend(batch.annotations);
    expressions.extend(batch.expressions);
    property_values.extend(batch.property_values);
    ids
}

struct Batch<'o> {
    origin: &'o AnnotationOrigin,
    annotation_base: usize,
    expression_base: usize,
    property_value_base: usize,
    annotations: Vec<AnnotationData>,
    expressions: Vec<ExpressionData>,
    property_values: Vec<PropertyValueData>,
}

impl Batch<'_> {
    fn next_expression(&self) -> ExpressionId {
        ExpressionId::from_index(self.expression_base + self.expressions.len())
    }

    fn next_property_value(&self) -> PropertyValueId {
        PropertyValueId::from_index(self.property_value_base + self.property_values.len())
    }

    fn annotation(&mut self, node: &Arc<CsdlVocabularyAnnotation>) -> AnnotationId {
        let id = AnnotationId::from_index(self.annotation_base + self.annotations.len());
        self.annotations.push(AnnotationData {
            node: Arc::clone(node),
            location: node.location.clone(),
            target: self.origin.target.clone(),
            schema: self.origin.schema,
            qualifier: node.qualifier.clone().or_else(|| self.origin.qualifier.clone()),
            value: None,
            property_values: Vec::new(),
            term: Cache::new(),
        });

        let (value, property_values) = match &node.kind {
            CsdlAnnotationKind::Value(expression) => {
                (Some(self.expression(expression, id, None, None)), Vec::new())
            }
            CsdlAnnotationKind::Type(values) => {
                let owner = PropertyValueOwner::TypeAnnotation(id);
                let ids = values
                    .iter()
                    .map(|value| self.property_value(value, owner, id, None))
                    .collect();
                (None, ids)
            }
        };
        let data = &mut self.annotations[id.index() - self.annotation_base];
        data.value = value;
        data.property_values = property_values;
        id
    }

    /// Pre-order: a node's id is taken before its children's.
    fn expression(
        &mut self,
        node: &Arc<CsdlExpression>,
        annotation: AnnotationId,
        parent: Option<ExpressionId>,
        property_value: Option<PropertyValueId>,
    ) -> ExpressionId {
        let id = self.next_expression();
        self.expressions.push(ExpressionData {
            node: Arc::clone(node),
            annotation,
            schema: self.origin.schema,
            binding_context: self.origin.binding_context,
            parent,
            property_value,
            children: Vec::new(),
            property_values: Vec::new(),
            resolved: Cache::new(),
        });

        let mut children = Vec::new();
        let mut values = Vec::new();
        match &node.kind {
            CsdlExpressionKind::Collection(elements) => {
                for element in elements {
                    children.push(self.expression(element, annotation, Some(id), None));
                }
            }
            CsdlExpressionKind::If {
                test,
                if_true,
                if_false,
            } => {
                for branch in [test, if_true, if_false] {
                    children.push(self.expression(branch, annotation, Some(id), None));
                }
            }
            CsdlExpressionKind::Labeled { expression, .. } => {
                children.push(self.expression(expression, annotation, Some(id), None));
            }
            CsdlExpressionKind::Record { properties, .. } => {
                let owner = PropertyValueOwner::Record(id);
                for value in properties {
                    values.push(self.property_value(value, owner, annotation, Some(id)));
                }
            }
            CsdlExpressionKind::Constant { .. }
            | CsdlExpressionKind::Null
            | CsdlExpressionKind::Path(_)
            | CsdlExpressionKind::LabeledReference(_)
            | CsdlExpressionKind::EntitySetReference(_)
            | CsdlExpressionKind::EnumMemberReference(_) => {}
        }

        let data = &mut self.expressions[id.index() - self.expression_base];
        data.children = children;
        data.property_values = values;
        id
    }

    fn property_value(
        &mut self,
        node: &Arc<CsdlPropertyValue>,
        owner: PropertyValueOwner,
        annotation: AnnotationId,
        record: Option<ExpressionId>,
    ) -> PropertyValueId {
        let id = self.next_property_value();
        // The value expression is the next one allocated.
        let value = self.next_expression();
        self.property_values.push(PropertyValueData {
            node: Arc::clone(node),
            owner,
            value,
            bound_property: Cache::new(),
        });
        self.expression(&node.value, annotation, record, Some(id));
        id
    }
}

// ============================================================================
// VOCABULARY ANNOTATION
// ============================================================================

/// The term an annotation applies.
#[derive(Clone, Debug, PartialEq)]
pub enum AnnotationTerm {
    /// A value term, for annotations carrying one value.
    Value(Resolution<ValueTermId>),
    /// A structured type used as a term, for annotations carrying property
    /// values.
    Type(Resolution<StructuredTypeId>),
}

impl AnnotationTerm {
    pub fn errors(&self) -> &[EdmError] {
        match self {
            Self::Value(term) => term.placeholder_errors(),
            Self::Type(term) => term.placeholder_errors(),
        }
    }
}

/// Term resolution never reads the annotation again; a reentrant read still
/// needs a value.
fn unreachable_term_cycle(term: &str) -> AnnotationTerm {
    AnnotationTerm::Value(Resolution::Unresolved(Unresolved::new(
        UnresolvedKind::ValueTerm,
        term,
        Location::object(term),
        EdmErrorCode::BadUnresolvedTerm,
        format!("term '{}' is cyclic", term),
    )))
}

#[derive(Clone, Copy)]
pub struct VocabularyAnnotation<'m> {
    model: &'m Model,
    id: AnnotationId,
}

super::structured::view_identity!(VocabularyAnnotation, AnnotationId);

impl<'m> VocabularyAnnotation<'m> {
    fn data(&self) -> Arc<AnnotationData> {
        self.model.annotations.get(self.id.index())
    }

    /// The term name as written.
    pub fn term_name(&self) -> SmolStr {
        self.data().node.term.clone()
    }

    pub fn qualifier(&self) -> Option<SmolStr> {
        self.data().qualifier.clone()
    }

    pub fn target(&self) -> Resolution<ElementKey> {
        self.data().target.clone()
    }

    /// The schema that declares this annotation, which for out-of-line
    /// annotations may differ from the target's schema. Labels inside the
    /// annotation resolve against it first.
    pub fn schema(&self) -> Schema<'m> {
        self.model.schema(self.data().schema)
    }

    pub fn is_type_annotation(&self) -> bool {
        matches!(self.data().node.kind, CsdlAnnotationKind::Type(_))
    }

    pub fn term(&self) -> AnnotationTerm {
        let data = self.data();
        let model = self.model;
        let location = self.location();
        data.term.get_value(
            || match &data.node.kind {
                CsdlAnnotationKind::Value(_) => {
                    AnnotationTerm::Value(match model.find_value_term(&data.node.term) {
                        Some(term) => Resolution::Resolved(term.id()),
                        None => {
                            tracing::debug!("[RESOLVE] value term '{}' not found", data.node.term);
                            Resolution::Unresolved(Unresolved::new(
                                UnresolvedKind::ValueTerm,
                                data.node.term.as_str(),
                                location,
                                EdmErrorCode::BadUnresolvedTerm,
                                format!("cannot find value term '{}'", data.node.term),
                            ))
                        }
                    })
                }
                CsdlAnnotationKind::Type(_) => AnnotationTerm::Type(resolve_structured_type(
                    model,
                    &data.node.term,
                    &location,
                    UnresolvedKind::TypeTerm,
                    EdmErrorCode::BadUnresolvedTerm,
                )),
            },
            || unreachable_term_cycle(&data.node.term),
        )
    }

    /// The resolved value term of a value annotation.
    pub fn value_term(&self) -> Option<Resolution<ValueTerm<'m>>> {
        match self.term() {
            AnnotationTerm::Value(term) => Some(term.map(|id| ValueTerm::new(self.model, id))),
            AnnotationTerm::Type(_) => None,
        }
    }

    /// The value expression of a value annotation.
    pub fn value(&self) -> Option<Expression<'m>> {
        self.data().value.map(|id| Expression::new(self.model, id))
    }

    /// Property values of a type annotation.
    pub fn property_values(&self) -> Vec<PropertyValue<'m>> {
        let model = self.model;
        self.data()
            .property_values
            .iter()
            .map(|&id| PropertyValue::new(model, id))
            .collect()
    }

    pub fn find_property_value(&self, name: &str) -> Option<PropertyValue<'m>> {
        self.property_values()
            .into_iter()
            .find(|value| value.property_name() == name)
    }
}

impl<'m> SemanticElement<'m> for VocabularyAnnotation<'m> {
    fn model(&self) -> &'m Model {
        self.model
    }

    fn key(&self) -> ElementKey {
        ElementKey::Annotation(self.id)
    }

    fn errors(&self) -> Vec<EdmError> {
        let mut errors = self.target().placeholder_errors().to_vec();
        errors.extend_from_slice(self.term().errors());
        errors
    }
}

impl fmt::Debug for VocabularyAnnotation<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "VocabularyAnnotation({})", self.term_name())
    }
}

// ============================================================================
// PROPERTY VALUE
// ============================================================================

/// One `property = expression` pair of a record or type annotation.
#[derive(Clone, Copy)]
pub struct PropertyValue<'m> {
    model: &'m Model,
    id: PropertyValueId,
}

super::structured::view_identity!(PropertyValue, PropertyValueId);

impl<'m> PropertyValue<'m> {
    fn data(&self) -> Arc<PropertyValueData> {
        self.model.property_values.get(self.id.index())
    }

    pub fn property_name(&self) -> SmolStr {
        self.data().node.property.clone()
    }

    pub fn owner(&self) -> PropertyValueOwner {
        self.data().owner
    }

    pub fn value(&self) -> Expression<'m> {
        Expression::new(self.model, self.data().value)
    }

    /// The property this value assigns, bound against the structured type of
    /// the enclosing record or type annotation. `None` when that type is not
    /// known.
    pub fn property(&self) -> Option<Resolution<Property<'m>>> {
        let data = self.data();
        let model = self.model;
        let location = self.location();
        data.bound_property
            .get_value(
                || bind_property(model, &data, location),
                || None,
            )
            .map(|bound| bound.map(|id| Property::new(model, id)))
    }
}

fn bind_property(
    model: &Model,
    data: &PropertyValueData,
    location: Location,
) -> Option<Resolution<PropertyId>> {
    let structure = match data.owner {
        PropertyValueOwner::TypeAnnotation(annotation) => {
            match VocabularyAnnotation::new(model, annotation).term() {
                AnnotationTerm::Type(Resolution::Resolved(structure)) => Some(structure),
                _ => None,
            }
        }
        PropertyValueOwner::Record(record) => record_structure(model, record),
    }?;

    let name = data.node.property.as_str();
    let found = match structure {
        StructuredTypeId::Entity(id) => EntityType::new(model, id).find_property(name),
        StructuredTypeId::Complex(id) => ComplexType::new(model, id).find_property(name),
    };
    Some(match found {
        Some(property) => Resolution::Resolved(property.id()),
        None => {
            tracing::debug!("[RESOLVE] property value '{}' binds to nothing", name);
            Resolution::Unresolved(Unresolved::new(
                UnresolvedKind::Property,
                name,
                location,
                EdmErrorCode::BadUnresolvedProperty,
                format!("'{}' is not a property of the annotated structure", name),
            ))
        }
    })
}

/// The declared type of a record, or the structure its position implies.
fn record_structure(model: &Model, record: ExpressionId) -> Option<StructuredTypeId> {
    let data = model.expressions.get(record.index());
    if let CsdlExpressionKind::Record {
        type_name: Some(_), ..
    } = &data.node.kind
    {
        return match Expression::new(model, record).kind() {
            super::expressions::ExpressionKind::Record {
                declared_type: Some(Resolution::Resolved(structure)),
                ..
            } => Some(structure),
            _ => None,
        };
    }
    expected_structure(model, record)
}

/// Structure expected at an expression's position: the type of the property
/// it is assigned to, or the enclosing value term's type.
fn expected_structure(model: &Model, id: ExpressionId) -> Option<StructuredTypeId> {
    let data = model.expressions.get(id.index());
    if let Some(value) = data.property_value {
        let property = PropertyValue::new(model, value).property()?.resolved()?;
        return structure_of(&property.type_ref());
    }
    match data.parent {
        Some(parent) => {
            let parent_data = model.expressions.get(parent.index());
            match parent_data.node.kind {
                CsdlExpressionKind::Collection(_)
                | CsdlExpressionKind::If { .. }
                | CsdlExpressionKind::Labeled { .. } => expected_structure(model, parent),
                _ => None,
            }
        }
        None => {
            let term = VocabularyAnnotation::new(model, data.annotation).value_term()?;
            structure_of(&term.resolved()?.type_ref())
        }
    }
}

impl<'m> SemanticElement<'m> for PropertyValue<'m> {
    fn model(&self) -> &'m Model {
        self.model
    }

    fn key(&self) -> ElementKey {
        ElementKey::PropertyValue(self.id)
    }

    fn errors(&self) -> Vec<EdmError> {
        self.property()
            .map(|bound| bound.placeholder_errors().to_vec())
            .unwrap_or_default()
    }
}

impl fmt::Debug for PropertyValue<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "PropertyValue({})", self.property_name())
    }
}
