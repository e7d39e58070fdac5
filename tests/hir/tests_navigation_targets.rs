//! Navigation target inference tests.
//!
//! An entity set's navigation targets come from the association sets that
//! bind it. These tests cover the single-match, no-match, ambiguous and
//! derived-type cases.

use crate::helpers::catalog_fixtures::*;
use crate::helpers::model_assertions::*;
use edm::hir::{EdmErrorCode, Model, Resolution, SemanticElement, UnresolvedKind};
use edm::syntax::{
    CsdlAssociation, CsdlAssociationEnd, CsdlAssociationSet, CsdlAssociationSetEnd,
    CsdlDirectValueAnnotation, CsdlEntityContainer, CsdlEntitySet, CsdlEntityType,
    CsdlNavigationProperty, CsdlNode, CsdlProperty, Multiplicity,
};

// =============================================================================
// SINGLE ASSOCIATION SET
// =============================================================================

#[test]
fn test_navigation_target_from_association_set() {
    let model = catalog_model();
    let products = get_entity_set(&model, "Catalog.Store", "Products");
    let categories = get_entity_set(&model, "Catalog.Store", "Categories");
    let category = get_entity_type(&model, "Catalog.Product")
        .find_navigation_property("Category")
        .expect("Category navigation property");

    let target = products.find_navigation_target(category.id());
    assert_eq!(target, Some(Resolution::Resolved(categories)));
}

#[test]
fn test_navigation_targets_in_both_directions() {
    let model = catalog_model();
    let products = get_entity_set(&model, "Catalog.Store", "Products");
    let categories = get_entity_set(&model, "Catalog.Store", "Categories");

    let back = categories.navigation_targets();
    assert_eq!(back.len(), 1);
    assert_eq!(back[0].navigation_property.name(), "Products");
    assert_eq!(back[0].target, Resolution::Resolved(products));
    assert_no_errors(&model);
}

#[test]
fn test_inference_is_cached() {
    let model = catalog_model();
    let products = get_entity_set(&model, "Catalog.Store", "Products");
    assert_eq!(products.navigation_targets(), products.navigation_targets());
}

// =============================================================================
// NO ASSOCIATION SET
// =============================================================================

#[test]
fn test_no_association_set_means_no_target() {
    init_tracing();
    let model = Model::new([catalog_schema(bare_container())]);
    let products = get_entity_set(&model, "Catalog.Store", "Products");
    let category = get_entity_type(&model, "Catalog.Product")
        .find_navigation_property("Category")
        .expect("Category navigation property");

    assert!(products.navigation_targets().is_empty());
    assert_eq!(products.find_navigation_target(category.id()), None);
    assert!(products.errors().is_empty());
    assert_no_errors(&model);
}

// =============================================================================
// AMBIGUITY
// =============================================================================

#[test]
fn test_two_association_sets_cannot_be_inferred() {
    init_tracing();
    let model = Model::new([catalog_schema(
        bare_container()
            .with_association_set(product_categories_set("ProductCategories"))
            .with_association_set(product_categories_set("MoreProductCategories")),
    )]);
    let products = get_entity_set(&model, "Catalog.Store", "Products");
    let category = get_entity_type(&model, "Catalog.Product")
        .find_navigation_property("Category")
        .expect("Category navigation property");

    let Some(Resolution::Unresolved(placeholder)) =
        products.find_navigation_target(category.id())
    else {
        panic!("expected an ambiguous target");
    };
    assert_eq!(placeholder.kind(), UnresolvedKind::BadEntitySet);
    assert_eq!(
        codes(placeholder.errors()),
        vec![EdmErrorCode::CannotInferEntitySetWithMultipleSetsPerType]
    );
    assert_eq!(
        codes(&products.errors()),
        vec![EdmErrorCode::CannotInferEntitySetWithMultipleSetsPerType]
    );
}

#[test]
fn test_single_explicit_end_wins_over_inferred_end() {
    init_tracing();
    let inferred = CsdlAssociationSet::new("Inferred", "Catalog.ProductCategory").with_ends(
        CsdlAssociationSetEnd::role_only("Product"),
        CsdlAssociationSetEnd::new("Category", "Categories"),
    );
    let model = Model::new([catalog_schema(
        bare_container()
            .with_association_set(inferred)
            .with_association_set(product_categories_set("Explicit")),
    )]);
    let products = get_entity_set(&model, "Catalog.Store", "Products");
    let category = get_entity_type(&model, "Catalog.Product")
        .find_navigation_property("Category")
        .expect("Category navigation property");

    let mapping = model
        .association_set_mapping(products.id(), category.id())
        .expect("mapping");
    assert_eq!(mapping.association_set_name, "Explicit");
    assert!(products.errors().is_empty());
}

// =============================================================================
// DERIVED TYPES
// =============================================================================

fn premium_schema_container() -> CsdlEntityContainer {
    bare_container()
        .with_entity_set(CsdlEntitySet::new("Reviews", "Catalog.Review"))
        .with_association_set(product_categories_set("ProductCategories"))
        .with_association_set(
            CsdlAssociationSet::new("PremiumReviews", "Catalog.PremiumProductReview").with_ends(
                CsdlAssociationSetEnd::new("Product", "Products"),
                CsdlAssociationSetEnd::new("Review", "Reviews"),
            ),
        )
}

fn premium_model() -> Model {
    init_tracing();
    let schema = catalog_schema(premium_schema_container())
        .with_entity_type(
            CsdlEntityType::new("PremiumProduct")
                .with_base_type("Catalog.Product")
                .with_navigation_property(CsdlNavigationProperty::new(
                    "Reviews",
                    "Catalog.PremiumProductReview",
                    "Product",
                    "Review",
                )),
        )
        .with_entity_type(
            CsdlEntityType::new("Review")
                .with_key(["Id"])
                .with_property(CsdlProperty::new("Id", int32())),
        )
        .with_association(CsdlAssociation::new(
            "PremiumProductReview",
            CsdlAssociationEnd::new("Product", "Catalog.PremiumProduct", Multiplicity::One),
            CsdlAssociationEnd::new("Review", "Catalog.Review", Multiplicity::Many),
        ));
    Model::new([schema])
}

#[test]
fn test_derived_type_navigation_property_is_inferred() {
    let model = premium_model();
    let products = get_entity_set(&model, "Catalog.Store", "Products");
    let reviews = get_entity_set(&model, "Catalog.Store", "Reviews");
    let premium = get_entity_type(&model, "Catalog.PremiumProduct");
    let review_nav = premium
        .find_navigation_property("Reviews")
        .expect("Reviews navigation property");

    assert_eq!(
        products.find_navigation_target(review_nav.id()),
        Some(Resolution::Resolved(reviews))
    );
    let names: Vec<_> = products
        .navigation_targets()
        .iter()
        .map(|t| t.navigation_property.name())
        .collect();
    assert_eq!(names, vec!["Category", "Reviews"]);
}

#[test]
fn test_derived_navigation_property_target_type() {
    let model = premium_model();
    let premium = get_entity_type(&model, "Catalog.PremiumProduct");
    let reviews = premium
        .find_navigation_property("Reviews")
        .expect("Reviews navigation property");
    let target = reviews.target_type();
    assert!(target.is_collection());
    assert_eq!(
        target.element_type().and_then(|t| t.as_entity()),
        model.find_entity_type("Catalog.Review").map(|t| t.id())
    );
    // Inherited from Product.
    assert!(premium.find_navigation_property("Category").is_some());
}

// =============================================================================
// ASSOCIATION SET MAPPING
// =============================================================================

#[test]
fn test_mapping_carries_association_set_annotations() {
    init_tracing();
    let annotated = product_categories_set("ProductCategories")
        .with_direct_annotation(CsdlDirectValueAnnotation::new("urn:store", "Tag", "primary"));
    let model = Model::new([catalog_schema(bare_container().with_association_set(annotated))]);
    let products = get_entity_set(&model, "Catalog.Store", "Products");
    let category = get_entity_type(&model, "Catalog.Product")
        .find_navigation_property("Category")
        .expect("Category navigation property");

    let mapping = model
        .association_set_mapping(products.id(), category.id())
        .expect("mapping");
    let set = products
        .container()
        .find_association_set("ProductCategories")
        .expect("association set");
    assert_eq!(mapping.association_set, set.id());
    let tags = mapping.annotations.association_set.expect("set annotations");
    assert_eq!(tags.len(), 1);
    assert_eq!(tags[0].value, "primary");
    assert!(mapping.annotations.end1.is_none());
}

#[test]
fn test_mapping_is_first_writer_wins() {
    let model = catalog_model();
    let products = get_entity_set(&model, "Catalog.Store", "Products");
    let category = get_entity_type(&model, "Catalog.Product")
        .find_navigation_property("Category")
        .expect("Category navigation property");
    let recorded = model
        .association_set_mapping(products.id(), category.id())
        .expect("mapping");

    let mut replacement = recorded.clone();
    replacement.association_set_name = "Other".into();
    assert!(!model.set_association_set_mapping(products.id(), category.id(), replacement));
    assert_eq!(
        model.association_set_mapping(products.id(), category.id()),
        Some(recorded)
    );
}
