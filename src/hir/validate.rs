//! Whole-model validation.
//!
//! Each element reports its own errors plus the placeholder errors of the
//! references it holds directly. Visiting every element once therefore
//! yields every defect of the document exactly once.

use super::diagnostics::EdmError;
use super::element::SemanticElement;
use super::ids::{ElementKey, ExpressionId, PropertyValueId};
use super::model::Model;

/// Collect the errors of every element of `model`, eagerly registered
/// elements first (in arena order), then annotations, their expressions and
/// property values.
pub fn validate(model: &Model) -> Vec<EdmError> {
    let annotations = model.all_vocabulary_annotations();

    let mut errors = Vec::new();
    let keys = model.element_keys();
    for &key in &keys {
        errors.extend(element_errors(model, key));
    }
    for annotation in &annotations {
        errors.extend(annotation.errors());
    }
    for i in 0..model.expressions.len() {
        errors.extend(model.expression(ExpressionId::from_index(i)).errors());
    }
    for i in 0..model.property_values.len() {
        errors.extend(model.property_value(PropertyValueId::from_index(i)).errors());
    }

    tracing::info!(
        "[VALIDATE] {} elements, {} annotations: {} errors",
        keys.len(),
        annotations.len(),
        errors.len()
    );
    errors
}

/// Errors reported by the element `key` denotes.
pub fn element_errors(model: &Model, key: ElementKey) -> Vec<EdmError> {
    match key {
        ElementKey::Schema(id) => model.schema(id).errors(),
        ElementKey::EntityType(id) => model.entity_type(id).errors(),
        ElementKey::ComplexType(id) => model.complex_type(id).errors(),
        ElementKey::EnumType(id) => model.enum_type(id).errors(),
        ElementKey::EnumMember(id) => model.enum_member(id).errors(),
        ElementKey::Property(id) => model.property(id).errors(),
        ElementKey::NavigationProperty(id) => model.navigation_property(id).errors(),
        ElementKey::Association(id) => model.association(id).errors(),
        ElementKey::AssociationEnd(id) => model.association(id.association).end(id.end).errors(),
        ElementKey::Function(id) => model.function(id).errors(),
        ElementKey::Parameter(id) => model.parameter(id).errors(),
        ElementKey::ValueTerm(id) => model.value_term(id).errors(),
        ElementKey::EntityContainer(id) => model.entity_container(id).errors(),
        ElementKey::EntitySet(id) => model.entity_set(id).errors(),
        ElementKey::AssociationSet(id) => model.association_set(id).errors(),
        ElementKey::AssociationSetEnd(id) => {
            model.association_set(id.association_set).end(id.end).errors()
        }
        ElementKey::FunctionImport(id) => model.function_import(id).errors(),
        ElementKey::RowType(id) => model.row_type(id).errors(),
        ElementKey::Annotation(id) => model.annotation(id).errors(),
        ElementKey::Expression(id) => model.expression(id).errors(),
        ElementKey::PropertyValue(id) => model.property_value(id).errors(),
    }
}
