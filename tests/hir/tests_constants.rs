//! Constant expression tests.
//!
//! Literals are parsed on first read. A malformed literal yields the kind's
//! default value and exactly one error.

use std::sync::Arc;

use crate::helpers::catalog_fixtures::*;
use crate::helpers::model_assertions::*;
use chrono::NaiveTime;
use edm::hir::{ConstantValue, EdmErrorCode, Model, SemanticElement};
use edm::syntax::{
    ConstantKind, CsdlEntityType, CsdlExpression, CsdlNode, CsdlProperty, CsdlSchema,
    CsdlTypeReference, CsdlValueTerm, CsdlVocabularyAnnotation,
};
use rstest::rstest;

fn annotated_with(expression: CsdlExpression) -> Model {
    init_tracing();
    Model::new([CsdlSchema::new(NS)
        .with_value_term(CsdlValueTerm::new(
            "Sample",
            CsdlTypeReference::primitive("Edm.String"),
        ))
        .with_entity_type(
            CsdlEntityType::new("Item")
                .with_key(["Id"])
                .with_property(CsdlProperty::new("Id", int32()))
                .with_annotation(CsdlVocabularyAnnotation::value("Catalog.Sample", expression)),
        )])
}

#[rstest]
#[case(ConstantKind::Binary, "0A0B", ConstantValue::Binary(Arc::from(vec![0x0A, 0x0B])))]
#[case(ConstantKind::Boolean, "true", ConstantValue::Boolean(true))]
#[case(ConstantKind::Integer, "-17", ConstantValue::Integer(-17))]
#[case(ConstantKind::Floating, "2.5", ConstantValue::Floating(2.5))]
#[case(ConstantKind::Floating, "1.5D", ConstantValue::Floating(1.5))]
#[case(ConstantKind::Floating, "INF", ConstantValue::Floating(f64::INFINITY))]
#[case(ConstantKind::Floating, "-INF", ConstantValue::Floating(f64::NEG_INFINITY))]
#[case(ConstantKind::String, "", ConstantValue::String(Arc::from("")))]
#[case(
    ConstantKind::Time,
    "13:45:00",
    ConstantValue::Time(NaiveTime::from_hms_opt(13, 45, 0).unwrap())
)]
fn test_valid_constants(
    #[case] kind: ConstantKind,
    #[case] literal: &str,
    #[case] expected: ConstantValue,
) {
    let model = annotated_with(CsdlExpression::constant(kind, literal));
    let expression = model.all_vocabulary_annotations()[0]
        .value()
        .expect("value annotation");
    assert_eq!(expression.constant_kind(), Some(kind));
    assert_eq!(expression.value(), Some(expected));
    assert!(expression.errors().is_empty());
}

#[rstest]
#[case(ConstantKind::Binary, "ZZ", ConstantValue::Binary(Arc::from(Vec::new())), EdmErrorCode::InvalidBinary)]
#[case(ConstantKind::Boolean, "yes", ConstantValue::Boolean(false), EdmErrorCode::InvalidBoolean)]
#[case(ConstantKind::Integer, "12x", ConstantValue::Integer(0), EdmErrorCode::InvalidInteger)]
#[case(ConstantKind::Guid, "not-a-guid", ConstantValue::Guid(uuid::Uuid::nil()), EdmErrorCode::InvalidGuid)]
#[case(ConstantKind::Time, "25:99", ConstantValue::Time(NaiveTime::MIN), EdmErrorCode::InvalidTime)]
fn test_invalid_constants(
    #[case] kind: ConstantKind,
    #[case] literal: &str,
    #[case] fallback: ConstantValue,
    #[case] code: EdmErrorCode,
) {
    let model = annotated_with(CsdlExpression::constant(kind, literal));
    let expression = model.all_vocabulary_annotations()[0]
        .value()
        .expect("value annotation");
    assert_eq!(expression.value(), Some(fallback));
    assert_eq!(codes(&expression.errors()), vec![code]);
    assert_error_codes(&model, &[code]);
}
