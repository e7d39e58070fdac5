//! Entity container, association set and function import tests.

use crate::helpers::catalog_fixtures::*;
use crate::helpers::model_assertions::*;
use edm::hir::{EdmErrorCode, Model, ParameterOwner, Resolution, SemanticElement, TypeKind};
use edm::syntax::{
    CsdlAssociationSet, CsdlAssociationSetEnd, CsdlEntityContainer, CsdlEntitySet, CsdlFunction,
    CsdlFunctionImport, CsdlParameter, CsdlSchema, CsdlTypeReference, ParameterMode,
};

// =============================================================================
// CONTAINER INHERITANCE
// =============================================================================

#[test]
fn test_extended_container_exposes_entity_sets() {
    init_tracing();
    let model = Model::new([catalog_schema(bare_container()).with_entity_container(
        CsdlEntityContainer::new("Outlet")
            .with_extends("Catalog.Store")
            .with_entity_set(CsdlEntitySet::new("Clearance", "Catalog.Product")),
    )]);
    let outlet = model
        .find_entity_container("Catalog.Outlet")
        .expect("Outlet container");
    let store = model
        .find_entity_container("Catalog.Store")
        .expect("Store container");

    assert_eq!(outlet.extends(), Some(Resolution::Resolved(store)));
    assert_eq!(store.extends(), None);
    let names: Vec<_> = outlet.all_entity_sets().iter().map(|s| s.name()).collect();
    assert_eq!(names, vec!["Clearance", "Products", "Categories"]);
    assert_eq!(
        outlet.find_entity_set("Categories").map(|s| s.container()),
        Some(store)
    );
    assert!(store.find_entity_set("Clearance").is_none());
}

#[test]
fn test_cyclic_container_extension() {
    init_tracing();
    let model = Model::new([CsdlSchema::new(NS)
        .with_entity_container(CsdlEntityContainer::new("Left").with_extends("Catalog.Right"))
        .with_entity_container(CsdlEntityContainer::new("Right").with_extends("Catalog.Left"))]);
    let left = model.find_entity_container("Catalog.Left").expect("Left");
    assert!(left.extends().is_some_and(|e| e.is_unresolved()));
    assert!(left.find_entity_set("Anything").is_none());
    assert_error_codes(
        &model,
        &[
            EdmErrorCode::BadCyclicEntityContainer,
            EdmErrorCode::BadCyclicEntityContainer,
        ],
    );
}

#[test]
fn test_missing_extended_container() {
    init_tracing();
    let model = Model::new([CsdlSchema::new(NS)
        .with_entity_container(CsdlEntityContainer::new("Lonely").with_extends("Catalog.Gone"))]);
    assert_error_codes(&model, &[EdmErrorCode::BadUnresolvedEntityContainer]);
}

// =============================================================================
// ENTITY SETS
// =============================================================================

#[test]
fn test_entity_set_with_missing_type() {
    init_tracing();
    let model = Model::new([catalog_schema(
        bare_container().with_entity_set(CsdlEntitySet::new("Ghosts", "Catalog.Ghost")),
    )]);
    let ghosts = get_entity_set(&model, "Catalog.Store", "Ghosts");
    assert!(ghosts.element_type().is_unresolved());
    assert!(ghosts.navigation_targets().is_empty());
    assert_error_codes(&model, &[EdmErrorCode::BadUnresolvedEntityType]);
}

// =============================================================================
// ASSOCIATION SET ENDS
// =============================================================================

#[test]
fn test_implicit_ends_take_roles_and_infer_sets() {
    init_tracing();
    let model = Model::new([catalog_schema(bare_container().with_association_set(
        CsdlAssociationSet::new("ProductCategories", "Catalog.ProductCategory"),
    ))]);
    let set = model
        .find_entity_container("Catalog.Store")
        .and_then(|c| c.find_association_set("ProductCategories"))
        .expect("association set");

    assert_eq!(set.end1().role(), "Product");
    assert_eq!(set.end2().role(), "Category");
    assert_eq!(
        set.end1().entity_set(),
        Resolution::Resolved(get_entity_set(&model, "Catalog.Store", "Products"))
    );
    assert_eq!(
        set.end2().entity_set(),
        Resolution::Resolved(get_entity_set(&model, "Catalog.Store", "Categories"))
    );
    assert_no_errors(&model);
}

#[test]
fn test_no_entity_set_for_role_type() {
    init_tracing();
    let container = CsdlEntityContainer::new("Store")
        .with_entity_set(CsdlEntitySet::new("Products", "Catalog.Product"))
        .with_association_set(
            CsdlAssociationSet::new("ProductCategories", "Catalog.ProductCategory").with_ends(
                CsdlAssociationSetEnd::new("Product", "Products"),
                CsdlAssociationSetEnd::role_only("Category"),
            ),
        );
    let model = Model::new([catalog_schema(container)]);
    assert_error_codes(&model, &[EdmErrorCode::NoEntitySetsFoundForType]);
}

#[test]
fn test_several_entity_sets_for_role_type() {
    init_tracing();
    let container = bare_container()
        .with_entity_set(CsdlEntitySet::new("ArchivedCategories", "Catalog.Category"))
        .with_association_set(
            CsdlAssociationSet::new("ProductCategories", "Catalog.ProductCategory").with_ends(
                CsdlAssociationSetEnd::new("Product", "Products"),
                CsdlAssociationSetEnd::role_only("Category"),
            ),
        );
    let model = Model::new([catalog_schema(container)]);
    let set = model
        .find_entity_container("Catalog.Store")
        .and_then(|c| c.find_association_set("ProductCategories"))
        .expect("association set");
    assert!(set.end2().entity_set().is_unresolved());
    assert_eq!(
        codes(&set.end2().errors()),
        vec![EdmErrorCode::CannotInferEntitySetWithMultipleSetsPerType]
    );
}

#[test]
fn test_unknown_role_in_association_set() {
    init_tracing();
    let container = bare_container().with_association_set(
        CsdlAssociationSet::new("ProductCategories", "Catalog.ProductCategory").with_ends(
            CsdlAssociationSetEnd::new("Product", "Products"),
            CsdlAssociationSetEnd::new("Supplier", "Categories"),
        ),
    );
    let model = Model::new([catalog_schema(container)]);
    let set = model
        .find_entity_container("Catalog.Store")
        .and_then(|c| c.find_association_set("ProductCategories"))
        .expect("association set");
    assert!(set.end2().association_end().is_unresolved());
    assert_eq!(
        codes(&set.end2().errors()),
        vec![EdmErrorCode::BadNonComputableAssociationEnd]
    );
}

#[test]
fn test_unknown_entity_set_in_association_set() {
    init_tracing();
    let container = bare_container().with_association_set(
        CsdlAssociationSet::new("ProductCategories", "Catalog.ProductCategory").with_ends(
            CsdlAssociationSetEnd::new("Product", "Products"),
            CsdlAssociationSetEnd::new("Category", "Departments"),
        ),
    );
    let model = Model::new([catalog_schema(container)]);
    assert_error_codes(&model, &[EdmErrorCode::BadUnresolvedEntitySet]);
}

#[test]
fn test_unresolved_association_reported_by_set_only() {
    init_tracing();
    let container = bare_container().with_association_set(
        CsdlAssociationSet::new("Dangling", "Catalog.Nothing").with_ends(
            CsdlAssociationSetEnd::new("Product", "Products"),
            CsdlAssociationSetEnd::role_only("Category"),
        ),
    );
    let model = Model::new([catalog_schema(container)]);
    let set = model
        .find_entity_container("Catalog.Store")
        .and_then(|c| c.find_association_set("Dangling"))
        .expect("association set");
    assert!(set.end1().association_end().is_unresolved());
    assert!(set.end1().errors().is_empty());
    assert_error_codes(&model, &[EdmErrorCode::BadUnresolvedAssociation]);
}

// =============================================================================
// FUNCTIONS AND FUNCTION IMPORTS
// =============================================================================

fn container_with_import(import: CsdlFunctionImport) -> Model {
    init_tracing();
    Model::new([catalog_schema(bare_container().with_function_import(import))])
}

#[test]
fn test_function_import_entity_set_and_parameters() {
    let model = container_with_import(
        CsdlFunctionImport::new("TopProducts")
            .returns(CsdlTypeReference::collection(CsdlTypeReference::entity(
                "Catalog.Product",
            )))
            .with_entity_set("Products")
            .with_parameter(CsdlParameter::new("count", int32())),
    );
    let store = model.find_entity_container("Catalog.Store").expect("Store");
    let import = store.find_function_import("TopProducts").expect("import");

    assert!(!import.is_side_effecting());
    assert_eq!(
        import.entity_set(),
        Some(Resolution::Resolved(get_entity_set(&model, "Catalog.Store", "Products")))
    );
    let returns = import.return_type().expect("return type");
    assert_eq!(returns.kind(), TypeKind::Collection);

    let count = import.find_parameter("count").expect("count");
    assert_eq!(count.mode(), ParameterMode::In);
    assert_eq!(count.owner(), ParameterOwner::FunctionImport(import.id()));
    assert_no_errors(&model);
}

#[test]
fn test_function_import_with_unknown_entity_set() {
    let model = container_with_import(
        CsdlFunctionImport::new("Purge")
            .side_effecting()
            .with_entity_set("Trash"),
    );
    assert_error_codes(&model, &[EdmErrorCode::BadUnresolvedEntitySet]);
}

#[test]
fn test_function_signature() {
    init_tracing();
    let model = Model::new([CsdlSchema::new(NS)
        .with_entity_type(product_type())
        .with_association(product_category())
        .with_entity_type(category_type())
        .with_function(
            CsdlFunction::new("Discount")
                .returns(CsdlTypeReference::primitive("Edm.Decimal"))
                .with_parameter(CsdlParameter::new(
                    "product",
                    CsdlTypeReference::entity("Catalog.Product"),
                ))
                .with_parameter(
                    CsdlParameter::new("rate", CsdlTypeReference::primitive("Edm.Double"))
                        .with_mode(ParameterMode::InOut),
                )
                .with_defining_expression("product.Price * rate"),
        )]);
    let functions = model.find_functions("Catalog.Discount");
    assert_eq!(functions.len(), 1);
    let discount = functions[0];
    assert_eq!(discount.defining_expression(), Some("product.Price * rate"));
    let names: Vec<_> = discount.parameters().iter().map(|p| p.name()).collect();
    assert_eq!(names, vec!["product", "rate"]);
    assert_eq!(
        discount.find_parameter("rate").map(|p| p.mode()),
        Some(ParameterMode::InOut)
    );
    assert_eq!(
        discount.find_parameter("product").map(|p| p.owner()),
        Some(ParameterOwner::Function(discount.id()))
    );
    assert_no_errors(&model);
}

#[test]
fn test_function_with_missing_parameter_type() {
    init_tracing();
    let model = Model::new([CsdlSchema::new(NS).with_function(
        CsdlFunction::new("Broken")
            .with_parameter(CsdlParameter::new("x", CsdlTypeReference::complex("Catalog.Nope"))),
    )]);
    assert_error_codes(&model, &[EdmErrorCode::BadUnresolvedComplexType]);
}
