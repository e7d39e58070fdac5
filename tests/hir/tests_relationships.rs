//! Association, association end and navigation property tests.

use crate::helpers::catalog_fixtures::*;
use crate::helpers::model_assertions::*;
use edm::hir::{EdmErrorCode, Model, Resolution, SemanticElement, TypeKind};
use edm::syntax::{
    CsdlAssociation, CsdlAssociationEnd, CsdlEntityType, CsdlNavigationProperty, CsdlProperty,
    CsdlReferentialConstraint, CsdlSchema, Multiplicity, OnDeleteAction,
};

fn constrained_catalog(constraint: CsdlReferentialConstraint) -> Model {
    init_tracing();
    Model::new([CsdlSchema::new(NS)
        .with_entity_type(product_type())
        .with_entity_type(category_type())
        .with_association(
            CsdlAssociation::new(
                "ProductCategory",
                CsdlAssociationEnd::new("Product", "Catalog.Product", Multiplicity::Many),
                CsdlAssociationEnd::new("Category", "Catalog.Category", Multiplicity::One)
                    .cascade_delete(),
            )
            .with_referential_constraint(constraint),
        )])
}

fn category_constraint() -> CsdlReferentialConstraint {
    CsdlReferentialConstraint::new("Category", ["Id"], "Product", ["CategoryId"])
}

// =============================================================================
// ASSOCIATIONS
// =============================================================================

#[test]
fn test_association_ends() {
    let model = catalog_model();
    let association = model
        .find_association("Catalog.ProductCategory")
        .expect("association");
    assert_eq!(association.end1().role(), "Product");
    assert_eq!(association.end2().role(), "Category");
    assert_eq!(association.end1().opposite(), association.end2());
    assert_eq!(association.find_end("Category"), Some(association.end2()));
    assert_eq!(association.find_end("Nobody"), None);
    assert_eq!(
        association.end2().entity_type(),
        Resolution::Resolved(get_entity_type(&model, "Catalog.Category"))
    );
}

#[test]
fn test_referential_constraint_resolves() {
    let model = constrained_catalog(category_constraint());
    let association = model
        .find_association("Catalog.ProductCategory")
        .expect("association");
    let constraint = association.referential_constraint().expect("constraint");
    assert_eq!(constraint.principal_end(), Resolution::Resolved(association.end2()));
    assert_eq!(constraint.dependent_end(), Resolution::Resolved(association.end1()));
    let dependent: Vec<_> = constraint
        .dependent_properties()
        .iter()
        .filter_map(|p| p.get().map(|p| p.name()))
        .collect();
    assert_eq!(dependent, vec!["CategoryId"]);
    assert!(constraint.errors().is_empty());
    assert_no_errors(&model);
}

#[test]
fn test_constraint_with_unknown_role() {
    let model = constrained_catalog(CsdlReferentialConstraint::new(
        "Supplier",
        ["Id"],
        "Product",
        ["CategoryId"],
    ));
    let association = model
        .find_association("Catalog.ProductCategory")
        .expect("association");
    let constraint = association.referential_constraint().expect("constraint");
    assert!(constraint.principal_end().is_unresolved());
    assert_eq!(
        codes(&association.errors()),
        vec![EdmErrorCode::BadNonComputableAssociationEnd]
    );
}

#[test]
fn test_constraint_with_unknown_property() {
    let model = constrained_catalog(CsdlReferentialConstraint::new(
        "Category",
        ["Id"],
        "Product",
        ["SupplierId"],
    ));
    assert_error_codes(&model, &[EdmErrorCode::BadUnresolvedProperty]);
}

// =============================================================================
// NAVIGATION PROPERTIES
// =============================================================================

#[test]
fn test_navigation_property_ends_and_type() {
    let model = catalog_model();
    let product = get_entity_type(&model, "Catalog.Product");
    let category = product
        .find_navigation_property("Category")
        .expect("Category navigation property");

    assert_eq!(category.declaring_type(), product);
    assert_eq!(category.from_end().get().map(|e| e.role()), Some("Product"));
    assert_eq!(category.to_end().get().map(|e| e.role()), Some("Category"));
    assert_eq!(category.multiplicity(), Some(Multiplicity::One));

    let target = category.target_type();
    assert_eq!(target.kind(), TypeKind::Entity);
    assert!(!target.is_nullable);
    assert_eq!(
        target.as_entity(),
        model.find_entity_type("Catalog.Category").map(|t| t.id())
    );
}

#[test]
fn test_collection_navigation_property() {
    let model = catalog_model();
    let products = get_entity_type(&model, "Catalog.Category")
        .find_navigation_property("Products")
        .expect("Products navigation property");
    assert_eq!(products.multiplicity(), Some(Multiplicity::Many));
    assert!(products.target_type().is_collection());
}

#[test]
fn test_partner_is_symmetric() {
    let model = catalog_model();
    let category = get_entity_type(&model, "Catalog.Product")
        .find_navigation_property("Category")
        .expect("Category navigation property");
    let products = get_entity_type(&model, "Catalog.Category")
        .find_navigation_property("Products")
        .expect("Products navigation property");
    assert_eq!(category.partner(), Some(products));
    assert_eq!(products.partner(), Some(category));
}

#[test]
fn test_principal_and_dependent_properties() {
    let model = constrained_catalog(category_constraint());
    let category = get_entity_type(&model, "Catalog.Product")
        .find_navigation_property("Category")
        .expect("Category navigation property");
    let products = get_entity_type(&model, "Catalog.Category")
        .find_navigation_property("Products")
        .expect("Products navigation property");

    assert!(!category.is_principal());
    assert!(products.is_principal());
    let foreign_keys: Vec<_> = category
        .dependent_properties()
        .iter()
        .filter_map(|p| p.get().map(|p| p.name()))
        .collect();
    assert_eq!(foreign_keys, vec!["CategoryId"]);
    assert!(products.dependent_properties().is_empty());
}

#[test]
fn test_on_delete_comes_from_own_end() {
    let model = constrained_catalog(category_constraint());
    let category = get_entity_type(&model, "Catalog.Product")
        .find_navigation_property("Category")
        .expect("Category navigation property");
    let products = get_entity_type(&model, "Catalog.Category")
        .find_navigation_property("Products")
        .expect("Products navigation property");
    assert_eq!(category.on_delete(), OnDeleteAction::None);
    assert_eq!(products.on_delete(), OnDeleteAction::Cascade);
}

#[test]
fn test_unresolved_association_reported_once() {
    init_tracing();
    let model = Model::new([CsdlSchema::new(NS).with_entity_type(
        CsdlEntityType::new("Orphan")
            .with_key(["Id"])
            .with_property(CsdlProperty::new("Id", int32()))
            .with_navigation_property(CsdlNavigationProperty::new(
                "Parent",
                "Catalog.Missing",
                "Child",
                "Parent",
            )),
    )]);
    let parent = get_entity_type(&model, "Catalog.Orphan")
        .find_navigation_property("Parent")
        .expect("Parent navigation property");
    assert!(parent.association().is_unresolved());
    assert!(parent.to_end().is_unresolved());
    assert!(parent.target_type().is_nullable);
    assert_eq!(parent.partner(), None);
    assert_error_codes(&model, &[EdmErrorCode::BadUnresolvedAssociation]);
}

#[test]
fn test_unknown_role_on_navigation_property() {
    init_tracing();
    let model = Model::new([CsdlSchema::new(NS)
        .with_entity_type(product_type())
        .with_entity_type(
            category_type().with_navigation_property(CsdlNavigationProperty::new(
                "Broken",
                "Catalog.ProductCategory",
                "Category",
                "Supplier",
            )),
        )
        .with_association(product_category())]);
    assert_error_codes(&model, &[EdmErrorCode::BadNonComputableAssociationEnd]);
}
