//! Type reference and base type resolution tests.

use crate::helpers::catalog_fixtures::*;
use crate::helpers::model_assertions::*;
use edm::hir::{
    EdmErrorCode, ElementKey, Model, PrimitiveKind, SemanticElement, TypeKind, UnresolvedKind,
};
use edm::syntax::{
    CsdlComplexType, CsdlEntityType, CsdlEnumType, CsdlProperty, CsdlSchema, CsdlTypeReference,
};

fn model_with_property(type_ref: CsdlTypeReference) -> Model {
    init_tracing();
    Model::new([CsdlSchema::new(NS)
        .with_complex_type(
            CsdlComplexType::new("Address").with_property(CsdlProperty::new("City", string())),
        )
        .with_enum_type(
            CsdlEnumType::new("Color")
                .with_member("Red", None)
                .with_member("Green", None),
        )
        .with_entity_type(
            CsdlEntityType::new("Item")
                .with_key(["Id"])
                .with_property(CsdlProperty::new("Id", int32()))
                .with_property(CsdlProperty::new("Value", type_ref)),
        )])
}

fn value_property(model: &Model) -> edm::hir::Property<'_> {
    get_entity_type(model, "Catalog.Item")
        .find_property("Value")
        .expect("Value property")
}

// =============================================================================
// RESOLVED REFERENCES
// =============================================================================

#[test]
fn test_primitive_type_resolves() {
    let model = model_with_property(CsdlTypeReference::primitive("Edm.Int64"));
    let property = value_property(&model);
    assert_eq!(property.type_ref().as_primitive(), Some(PrimitiveKind::Int64));
    assert!(property.type_ref().is_nullable);
    assert!(property.errors().is_empty());
}

#[test]
fn test_named_type_resolves_to_declared_kind() {
    let model = model_with_property(CsdlTypeReference::named("Catalog.Address"));
    let ty = value_property(&model).type_ref();
    assert_eq!(ty.kind(), TypeKind::Complex);
    assert_eq!(
        ty.as_complex(),
        model.find_complex_type("Catalog.Address").map(|t| t.id())
    );
}

#[test]
fn test_named_enum_type_resolves() {
    let model = model_with_property(CsdlTypeReference::named("Catalog.Color"));
    let ty = value_property(&model).type_ref();
    assert_eq!(ty.kind(), TypeKind::Enum);
    let color = model.find_enum_type("Catalog.Color").expect("Color");
    assert_eq!(ty.as_enum(), Some(color.id()));
    assert_eq!(
        color.members().iter().map(|m| m.value()).collect::<Vec<_>>(),
        vec![0, 1]
    );
}

#[test]
fn test_collection_of_entity_type() {
    let model = model_with_property(CsdlTypeReference::collection(CsdlTypeReference::entity(
        "Catalog.Item",
    )));
    let ty = value_property(&model).type_ref();
    assert!(ty.is_collection());
    let element = ty.element_type().expect("element type");
    assert_eq!(element.as_entity(), model.find_entity_type("Catalog.Item").map(|t| t.id()));
}

#[test]
fn test_row_type_properties_are_registered() {
    let model = model_with_property(CsdlTypeReference::row([
        CsdlProperty::new("Left", int32()),
        CsdlProperty::new("Right", int32()),
    ]));
    let ty = value_property(&model).type_ref();
    assert_eq!(ty.kind(), TypeKind::Row);
    assert_no_errors(&model);
}

// =============================================================================
// UNRESOLVED REFERENCES
// =============================================================================

#[test]
fn test_missing_entity_type_yields_placeholder() {
    let model = model_with_property(CsdlTypeReference::entity("Catalog.Missing"));
    let ty = value_property(&model).type_ref();
    assert_eq!(ty.kind(), TypeKind::Entity);
    let placeholder = ty.unresolved().expect("placeholder");
    assert_eq!(placeholder.kind(), UnresolvedKind::EntityType);
    assert_eq!(placeholder.reference(), "Catalog.Missing");
    assert_eq!(placeholder.name(), "");
    assert_eq!(codes(placeholder.errors()), vec![EdmErrorCode::BadUnresolvedEntityType]);
}

#[test]
fn test_missing_type_reported_once() {
    let model = model_with_property(CsdlTypeReference::entity("Catalog.Missing"));
    assert_error_codes(&model, &[EdmErrorCode::BadUnresolvedEntityType]);
}

#[test]
fn test_unknown_primitive() {
    let model = model_with_property(CsdlTypeReference::primitive("Edm.Int128"));
    assert_error_codes(&model, &[EdmErrorCode::BadUnresolvedPrimitiveType]);
}

#[test]
fn test_unknown_named_type() {
    let model = model_with_property(CsdlTypeReference::named("Catalog.Nowhere"));
    let ty = value_property(&model).type_ref();
    assert_eq!(ty.kind(), TypeKind::None);
    assert_error_codes(&model, &[EdmErrorCode::BadUnresolvedType]);
}

#[test]
fn test_placeholder_is_stable_across_reads() {
    let model = model_with_property(CsdlTypeReference::complex("Catalog.Missing"));
    let property = value_property(&model);
    let first = property.type_ref();
    let second = property.type_ref();
    let (Some(a), Some(b)) = (first.unresolved(), second.unresolved()) else {
        panic!("expected placeholders");
    };
    assert!(std::sync::Arc::ptr_eq(a, b));
}

// =============================================================================
// BASE TYPES
// =============================================================================

#[test]
fn test_inherited_key_and_properties() {
    init_tracing();
    let model = Model::new([CsdlSchema::new(NS)
        .with_entity_type(product_type())
        .with_entity_type(
            CsdlEntityType::new("Book")
                .with_base_type("Catalog.Product")
                .with_property(CsdlProperty::new("Isbn", string())),
        )]);
    let book = get_entity_type(&model, "Catalog.Book");
    let product = get_entity_type(&model, "Catalog.Product");
    assert!(book.derives_from(product.id()));
    assert!(book.declared_key().is_none());
    assert_eq!(
        book.key_properties()
            .iter()
            .filter_map(|k| k.get().map(|p| p.name()))
            .collect::<Vec<_>>(),
        vec!["Id"]
    );
    let names: Vec<_> = book.properties().iter().map(|p| p.name()).collect();
    assert_eq!(names, vec!["Id", "Name", "CategoryId", "Isbn"]);
    assert_eq!(product.derived_types(), vec![book]);
    assert_eq!(book.key(), ElementKey::EntityType(book.id()));
}

#[test]
fn test_declared_key_ignores_inherited_properties() {
    init_tracing();
    let model = Model::new([CsdlSchema::new(NS)
        .with_entity_type(product_type())
        .with_entity_type(
            CsdlEntityType::new("Book")
                .with_base_type("Catalog.Product")
                .with_key(["Id", "Isbn"])
                .with_property(CsdlProperty::new("Isbn", string())),
        )]);
    let book = get_entity_type(&model, "Catalog.Book");
    let key = book.declared_key().expect("declared key");
    assert!(key[0].is_unresolved());
    assert_eq!(key[1].get().map(|p| p.name()), Some("Isbn"));
    assert_error_codes(&model, &[EdmErrorCode::BadUnresolvedProperty]);
}

#[test]
fn test_cyclic_base_types() {
    init_tracing();
    let model = Model::new([CsdlSchema::new(NS)
        .with_entity_type(CsdlEntityType::new("A").with_base_type("Catalog.B"))
        .with_entity_type(CsdlEntityType::new("B").with_base_type("Catalog.A"))]);
    let a = get_entity_type(&model, "Catalog.A");
    assert!(a.base_type().is_some_and(|base| base.is_unresolved()));
    assert!(a.base_chain().is_empty());
    assert_error_codes(
        &model,
        &[EdmErrorCode::BadCyclicEntity, EdmErrorCode::BadCyclicEntity],
    );
}

#[test]
fn test_duplicate_type_names() {
    init_tracing();
    let model = Model::new([CsdlSchema::new(NS)
        .with_entity_type(CsdlEntityType::new("Twin"))
        .with_complex_type(CsdlComplexType::new("Twin"))]);
    assert_error_codes(&model, &[EdmErrorCode::AlreadyDefined]);
}

#[test]
fn test_alias_resolves_like_namespace() {
    init_tracing();
    let model = Model::new([
        CsdlSchema::new(NS).with_entity_type(product_type()),
        CsdlSchema::new("Orders")
            .with_using(NS, "Cat")
            .with_entity_type(
                CsdlEntityType::new("Line")
                    .with_key(["Id"])
                    .with_property(CsdlProperty::new("Id", int32()))
                    .with_property(CsdlProperty::new(
                        "Product",
                        CsdlTypeReference::entity("Cat.Product"),
                    )),
            ),
    ]);
    let line = get_entity_type(&model, "Orders.Line");
    let product = line.find_property("Product").expect("Product");
    assert_eq!(
        product.type_ref().as_entity(),
        model.find_entity_type("Catalog.Product").map(|t| t.id())
    );
}
