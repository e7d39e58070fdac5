//! Vocabulary annotation, expression and labeled element tests.

use crate::helpers::catalog_fixtures::*;
use crate::helpers::model_assertions::*;
use edm::hir::{
    AnnotationTerm, ConstantValue, EdmErrorCode, ElementKey, ExpressionKind, Model, Resolution,
    SemanticElement, StructuredTypeId,
};
use edm::syntax::{
    CsdlAnnotationsBlock, CsdlComplexType, CsdlDirectValueAnnotation, CsdlEnumType,
    CsdlExpression, CsdlNode, CsdlProperty, CsdlPropertyValue, CsdlSchema, CsdlTypeReference,
    CsdlValueTerm, CsdlVocabularyAnnotation,
};
use edm::ContractViolation;

/// The catalog plus terms, with `annotate` applied to the schema.
fn annotated_catalog(annotate: impl FnOnce(CsdlSchema) -> CsdlSchema) -> Model {
    init_tracing();
    let schema = catalog_schema(
        bare_container().with_association_set(product_categories_set("ProductCategories")),
    )
    .with_value_term(CsdlValueTerm::new("Description", string()))
    .with_value_term(CsdlValueTerm::new(
        "Dimensions",
        CsdlTypeReference::complex("Catalog.Size"),
    ))
    .with_complex_type(
        CsdlComplexType::new("Size")
            .with_property(CsdlProperty::new("Width", int32()))
            .with_property(CsdlProperty::new("Height", int32())),
    )
    .with_complex_type(
        CsdlComplexType::new("Audit")
            .with_property(CsdlProperty::new("CreatedBy", string()))
            .with_property(CsdlProperty::new("Version", int32())),
    )
    .with_enum_type(
        CsdlEnumType::new("Color")
            .with_member("Red", Some(1))
            .with_member("Blue", Some(4)),
    );
    Model::new([annotate(schema)])
}

fn out_of_line(target: &str, annotation: CsdlVocabularyAnnotation) -> CsdlAnnotationsBlock {
    CsdlAnnotationsBlock::new(target).with_annotation(annotation)
}

fn description(text: &str) -> CsdlVocabularyAnnotation {
    CsdlVocabularyAnnotation::value("Catalog.Description", CsdlExpression::string(text))
}

/// The value expression of the model's only annotation.
fn only_value(model: &Model) -> edm::hir::Expression<'_> {
    let annotations = model.all_vocabulary_annotations();
    assert_eq!(annotations.len(), 1, "expected one annotation");
    annotations[0].value().expect("value annotation")
}

// =============================================================================
// TARGETS AND TERMS
// =============================================================================

#[test]
fn test_out_of_line_annotation_targets_property() {
    let model = annotated_catalog(|schema| {
        let mut block = out_of_line("Catalog.Product/Name", description("display name"));
        block.qualifier = Some("Short".into());
        schema.with_annotations_block(block)
    });
    let name = get_entity_type(&model, "Catalog.Product")
        .find_property("Name")
        .expect("Name property");

    let annotations = name.vocabulary_annotations();
    assert_eq!(annotations.len(), 1);
    let annotation = annotations[0];
    assert_eq!(annotation.target(), Resolution::Resolved(ElementKey::Property(name.id())));
    assert_eq!(annotation.qualifier().as_deref(), Some("Short"));
    assert!(name.inline_vocabulary_annotations().is_empty());
    assert_eq!(
        annotation.value().and_then(|v| v.value()),
        Some(ConstantValue::String("display name".into()))
    );
    assert_no_errors(&model);
}

#[test]
fn test_inline_and_out_of_line_annotations_combine() {
    init_tracing();
    let model = Model::new([CsdlSchema::new(NS)
        .with_entity_type(product_type())
        .with_entity_type(category_type().with_annotation(description("inner")))
        .with_association(product_category())
        .with_value_term(CsdlValueTerm::new("Description", string()))
        .with_annotations_block(out_of_line("Catalog.Category", description("outer")))]);

    let category = get_entity_type(&model, "Catalog.Category");
    let values: Vec<_> = category
        .vocabulary_annotations()
        .iter()
        .filter_map(|a| a.value().and_then(|v| v.value()))
        .collect();
    assert_eq!(
        values,
        vec![
            ConstantValue::String("inner".into()),
            ConstantValue::String("outer".into()),
        ]
    );
}

#[test]
fn test_unresolved_target_reported_once() {
    let model = annotated_catalog(|schema| {
        schema.with_annotations_block(out_of_line("Catalog.Product/Nope", description("lost")))
    });
    let annotation = model.all_vocabulary_annotations()[0];
    assert!(annotation.target().is_unresolved());
    assert_error_codes(&model, &[EdmErrorCode::BadUnresolvedTarget]);
}

#[test]
fn test_unresolved_value_term() {
    let model = annotated_catalog(|schema| {
        schema.with_annotations_block(out_of_line(
            "Catalog.Product",
            CsdlVocabularyAnnotation::value("Catalog.Unknown", CsdlExpression::string("x")),
        ))
    });
    let annotation = model.all_vocabulary_annotations()[0];
    assert!(annotation.value_term().is_some_and(|t| t.is_unresolved()));
    assert_error_codes(&model, &[EdmErrorCode::BadUnresolvedTerm]);
}

#[test]
fn test_value_term_type() {
    let model = annotated_catalog(|schema| schema);
    let term = model
        .find_value_term("Catalog.Dimensions")
        .expect("Dimensions term");
    assert_eq!(
        term.type_ref().as_complex(),
        model.find_complex_type("Catalog.Size").map(|t| t.id())
    );
}

// =============================================================================
// TYPE ANNOTATIONS AND PROPERTY VALUES
// =============================================================================

#[test]
fn test_type_annotation_binds_property_values() {
    let model = annotated_catalog(|schema| {
        schema.with_annotations_block(out_of_line(
            "Catalog.Product",
            CsdlVocabularyAnnotation::type_annotation(
                "Catalog.Audit",
                [
                    CsdlPropertyValue::new("CreatedBy", CsdlExpression::string("admin")),
                    CsdlPropertyValue::new("Version", CsdlExpression::integer("3")),
                ],
            ),
        ))
    });
    let annotation = model.all_vocabulary_annotations()[0];
    let audit = model.find_complex_type("Catalog.Audit").expect("Audit");
    assert!(annotation.is_type_annotation());
    assert_eq!(
        annotation.term(),
        AnnotationTerm::Type(Resolution::Resolved(StructuredTypeId::Complex(audit.id())))
    );

    let version = annotation.find_property_value("Version").expect("Version");
    assert_eq!(
        version.property(),
        audit.find_property("Version").map(Resolution::Resolved)
    );
    assert_eq!(version.value().value(), Some(ConstantValue::Integer(3)));
    assert_no_errors(&model);
}

#[test]
fn test_unknown_property_value() {
    let model = annotated_catalog(|schema| {
        schema.with_annotations_block(out_of_line(
            "Catalog.Product",
            CsdlVocabularyAnnotation::type_annotation(
                "Catalog.Audit",
                [CsdlPropertyValue::new("Bogus", CsdlExpression::null())],
            ),
        ))
    });
    assert_error_codes(&model, &[EdmErrorCode::BadUnresolvedProperty]);
}

#[test]
fn test_record_binds_against_value_term_type() {
    let model = annotated_catalog(|schema| {
        schema.with_annotations_block(out_of_line(
            "Catalog.Product",
            CsdlVocabularyAnnotation::value(
                "Catalog.Dimensions",
                CsdlExpression::record(
                    None,
                    [
                        CsdlPropertyValue::new("Width", CsdlExpression::integer("10")),
                        CsdlPropertyValue::new("Depth", CsdlExpression::integer("20")),
                    ],
                ),
            ),
        ))
    });
    let record = only_value(&model);
    let ExpressionKind::Record { properties, .. } = record.kind() else {
        panic!("expected a record");
    };
    let size = model.find_complex_type("Catalog.Size").expect("Size");
    assert_eq!(
        properties[0].property(),
        size.find_property("Width").map(Resolution::Resolved)
    );
    assert!(properties[1].property().is_some_and(|p| p.is_unresolved()));
    assert_error_codes(&model, &[EdmErrorCode::BadUnresolvedProperty]);
}

#[test]
fn test_record_with_unknown_declared_type() {
    let model = annotated_catalog(|schema| {
        schema.with_annotations_block(out_of_line(
            "Catalog.Product",
            CsdlVocabularyAnnotation::value(
                "Catalog.Dimensions",
                CsdlExpression::record(
                    Some("Catalog.Volume"),
                    [CsdlPropertyValue::new("Width", CsdlExpression::integer("1"))],
                ),
            ),
        ))
    });
    // The property value has nothing to bind against, so only the record
    // reports.
    assert_error_codes(&model, &[EdmErrorCode::BadUnresolvedType]);
}

// =============================================================================
// PATHS AND REFERENCES
// =============================================================================

#[test]
fn test_path_through_navigation_property() {
    let model = annotated_catalog(|schema| {
        schema.with_annotations_block(out_of_line(
            "Catalog.Product",
            CsdlVocabularyAnnotation::value(
                "Catalog.Description",
                CsdlExpression::path(["Category", "Title"]),
            ),
        ))
    });
    let title = get_entity_type(&model, "Catalog.Category")
        .find_property("Title")
        .expect("Title property");
    let ExpressionKind::Path { target, .. } = only_value(&model).kind() else {
        panic!("expected a path");
    };
    assert_eq!(target, Some(Resolution::Resolved(ElementKey::Property(title.id()))));
}

#[test]
fn test_entity_set_reference() {
    let model = annotated_catalog(|schema| {
        schema.with_annotations_block(out_of_line(
            "Catalog.Product",
            CsdlVocabularyAnnotation::value(
                "Catalog.Description",
                CsdlExpression::entity_set_reference("Catalog.Store/Products").expect("path"),
            ),
        ))
    });
    let products = get_entity_set(&model, "Catalog.Store", "Products");
    assert_eq!(
        only_value(&model).kind(),
        ExpressionKind::EntitySetReference(Resolution::Resolved(products))
    );
}

#[test]
fn test_unknown_entity_set_reference() {
    let model = annotated_catalog(|schema| {
        schema.with_annotations_block(out_of_line(
            "Catalog.Product",
            CsdlVocabularyAnnotation::value(
                "Catalog.Description",
                CsdlExpression::entity_set_reference("Catalog.Store/Suppliers").expect("path"),
            ),
        ))
    });
    assert_error_codes(&model, &[EdmErrorCode::BadUnresolvedEntitySet]);
}

#[test]
fn test_enum_member_reference() {
    let model = annotated_catalog(|schema| {
        schema.with_annotations_block(out_of_line(
            "Catalog.Product",
            CsdlVocabularyAnnotation::value(
                "Catalog.Description",
                CsdlExpression::enum_member_reference("Catalog.Color/Blue").expect("path"),
            ),
        ))
    });
    let ExpressionKind::EnumMemberReference(Resolution::Resolved(member)) =
        only_value(&model).kind()
    else {
        panic!("expected a resolved enum member");
    };
    assert_eq!(member.name(), "Blue");
    assert_eq!(member.value(), 4);
}

#[test]
fn test_malformed_reference_path_is_rejected() {
    assert_eq!(
        CsdlExpression::entity_set_reference("Catalog.Store").map(|_| ()),
        Err(ContractViolation::MalformedPath("Catalog.Store".into()))
    );
}

// =============================================================================
// LABELED ELEMENTS
// =============================================================================

#[test]
fn test_labeled_reference_dereferences() {
    let model = annotated_catalog(|schema| {
        schema
            .with_annotations_block(out_of_line(
                "Catalog.Product",
                CsdlVocabularyAnnotation::value(
                    "Catalog.Description",
                    CsdlExpression::labeled("Greeting", CsdlExpression::string("hello")),
                ),
            ))
            .with_annotations_block(out_of_line(
                "Catalog.Category",
                CsdlVocabularyAnnotation::value(
                    "Catalog.Description",
                    CsdlExpression::labeled_reference("Greeting"),
                ),
            ))
    });
    let category = get_entity_type(&model, "Catalog.Category");
    let reference = category.vocabulary_annotations()[0]
        .value()
        .expect("value annotation");
    let target = reference
        .dereference()
        .and_then(|r| r.resolved())
        .expect("resolved label");
    assert_eq!(target.value(), Some(ConstantValue::String("hello".into())));
    assert!(model
        .find_labeled_element("Greeting")
        .is_some_and(|label| !label.is_unresolved()));
    assert_eq!(model.find_labeled_element("Nobody"), None);
    assert_no_errors(&model);
}

#[test]
fn test_unknown_label() {
    let model = annotated_catalog(|schema| {
        schema.with_annotations_block(out_of_line(
            "Catalog.Product",
            CsdlVocabularyAnnotation::value(
                "Catalog.Description",
                CsdlExpression::labeled_reference("Missing"),
            ),
        ))
    });
    assert_error_codes(&model, &[EdmErrorCode::BadUnresolvedLabeledElement]);
}

#[test]
fn test_cyclic_labels() {
    let model = annotated_catalog(|schema| {
        schema
            .with_annotations_block(out_of_line(
                "Catalog.Product",
                CsdlVocabularyAnnotation::value(
                    "Catalog.Description",
                    CsdlExpression::labeled("A", CsdlExpression::labeled_reference("B")),
                ),
            ))
            .with_annotations_block(out_of_line(
                "Catalog.Category",
                CsdlVocabularyAnnotation::value(
                    "Catalog.Description",
                    CsdlExpression::labeled("B", CsdlExpression::labeled_reference("A")),
                ),
            ))
    });
    assert_error_codes(
        &model,
        &[
            EdmErrorCode::BadCyclicLabeledElement,
            EdmErrorCode::BadCyclicLabeledElement,
        ],
    );
}

#[test]
fn test_label_chain_across_schemas_prefers_target_schema() {
    init_tracing();
    let description = |expression| {
        CsdlVocabularyAnnotation::value("Catalog.Description", expression)
    };
    let catalog = catalog_schema(bare_container())
        .with_value_term(CsdlValueTerm::new("Description", string()))
        .with_annotations_block(out_of_line(
            "Catalog.Product",
            description(CsdlExpression::labeled_reference("X")),
        ))
        .with_annotations_block(out_of_line(
            "Catalog.Category",
            description(CsdlExpression::labeled("Y", CsdlExpression::labeled_reference("X"))),
        ));
    let other = CsdlSchema::new("Other")
        .with_annotations_block(out_of_line(
            "Catalog.Product/Name",
            description(CsdlExpression::labeled("X", CsdlExpression::labeled_reference("Y"))),
        ))
        .with_annotations_block(out_of_line(
            "Catalog.Category/Title",
            description(CsdlExpression::labeled("Y", CsdlExpression::string("other y"))),
        ));
    let model = Model::new([catalog, other]);
    assert_no_errors(&model);

    let product = get_entity_type(&model, "Catalog.Product");
    let annotation = product.vocabulary_annotations()[0];
    assert_eq!(annotation.schema().namespace(), "Catalog");
    let target = annotation
        .value()
        .and_then(|reference| reference.dereference())
        .and_then(|r| r.resolved())
        .expect("resolved label");
    let other_y = target
        .dereference()
        .and_then(|r| r.resolved())
        .expect("Other's own Y");
    assert_eq!(other_y.value(), Some(ConstantValue::String("other y".into())));
    let name = product.find_property("Name").expect("Name property");
    assert_eq!(name.vocabulary_annotations()[0].schema().namespace(), "Other");
}

#[test]
fn test_duplicate_label_is_ambiguous() {
    let model = annotated_catalog(|schema| {
        schema.with_annotations_block(
            CsdlAnnotationsBlock::new("Catalog.Product")
                .with_annotation(CsdlVocabularyAnnotation::value(
                    "Catalog.Description",
                    CsdlExpression::labeled("Twice", CsdlExpression::string("a")),
                ))
                .with_annotation(
                    CsdlVocabularyAnnotation::value(
                        "Catalog.Description",
                        CsdlExpression::labeled("Twice", CsdlExpression::string("b")),
                    )
                    .with_qualifier("Second"),
                ),
        )
    });
    let errors = model.validate();
    assert_eq!(
        codes(&errors),
        vec![
            EdmErrorCode::BadAmbiguousElementBinding,
            EdmErrorCode::BadAmbiguousElementBinding,
        ]
    );
    assert!(model
        .find_labeled_element("Twice")
        .is_some_and(|label| label.is_unresolved()));
}

// =============================================================================
// DIRECT VALUE ANNOTATIONS
// =============================================================================

#[test]
fn test_direct_value_annotations() {
    init_tracing();
    let model = Model::new([CsdlSchema::new(NS).with_entity_type(
        product_type()
            .with_direct_annotation(CsdlDirectValueAnnotation::new("urn:ui", "Hidden", "true")),
    )]);
    let product = get_entity_type(&model, "Catalog.Product");
    let direct = product.direct_value_annotations().expect("direct annotations");
    assert_eq!(direct.len(), 1);
    assert_eq!(direct[0].namespace, "urn:ui");
    assert_eq!(direct[0].name, "Hidden");
    let id = product.find_property("Id").expect("Id");
    assert!(id.direct_value_annotations().is_none());
}
