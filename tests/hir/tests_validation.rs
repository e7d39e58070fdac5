//! Whole-model validation tests.

use std::sync::Arc;

use crate::helpers::catalog_fixtures::*;
use crate::helpers::model_assertions::*;
use edm::hir::{ElementKey, EdmErrorCode, Model, SemanticElement, element_errors, validate};
use edm::syntax::{CsdlEntitySet, CsdlNode, CsdlSchema};
use edm::{Location, Span};

#[test]
fn test_catalog_validates_clean() {
    let model = catalog_model();
    assert!(model.validate().is_empty());
}

#[test]
fn test_validate_is_repeatable() {
    init_tracing();
    let model = Model::new([catalog_schema(
        bare_container().with_entity_set(CsdlEntitySet::new("Ghosts", "Catalog.Ghost")),
    )]);
    let first = validate(&model);
    assert_eq!(codes(&first), vec![EdmErrorCode::BadUnresolvedEntityType]);
    assert_eq!(validate(&model), first);
    assert_eq!(model.validate(), first);
}

#[test]
fn test_error_points_at_referencing_node() {
    init_tracing();
    let at = Location::source("catalog.csdl", Span::from_coords(12, 4, 12, 52));
    let model = Model::new([catalog_schema(bare_container().with_entity_set(
        CsdlEntitySet::new("Ghosts", "Catalog.Ghost").at(at.clone()),
    ))]);
    let errors = model.validate();
    assert_eq!(errors.len(), 1);
    assert_eq!(errors[0].location, at);
    assert!(errors[0].message.contains("Catalog.Ghost"));
}

#[test]
fn test_elements_without_source_get_synthetic_location() {
    let model = catalog_model();
    let products = get_entity_set(&model, "Catalog.Store", "Products");
    assert!(products.location().is_synthetic());
}

#[test]
fn test_element_errors_by_key() {
    init_tracing();
    let model = Model::new([catalog_schema(
        bare_container().with_entity_set(CsdlEntitySet::new("Ghosts", "Catalog.Ghost")),
    )]);
    let ghosts = get_entity_set(&model, "Catalog.Store", "Ghosts");
    let products = get_entity_set(&model, "Catalog.Store", "Products");

    assert_eq!(
        codes(&element_errors(&model, ElementKey::EntitySet(ghosts.id()))),
        vec![EdmErrorCode::BadUnresolvedEntityType]
    );
    assert!(element_errors(&model, ElementKey::EntitySet(products.id())).is_empty());
    assert!(ghosts.has_errors());
}

#[test]
fn test_shared_schemas_build_equal_models() {
    init_tracing();
    let shared = Arc::new(catalog_schema(bare_container()));
    let first = Model::from_shared([shared.clone()]);
    let second = Model::from_shared([shared]);
    assert_eq!(first.element_keys(), second.element_keys());
    assert!(first.validate().is_empty());
}

#[test]
fn test_empty_model() {
    let model = Model::new(Vec::<CsdlSchema>::new());
    assert!(model.schemas().is_empty());
    assert!(model.validate().is_empty());
}

#[test]
fn test_model_is_shareable_across_threads() {
    fn assert_send_sync<T: Send + Sync>() {}
    assert_send_sync::<Model>();

    let model = catalog_model();
    let counts: Vec<usize> = std::thread::scope(|scope| {
        let handles: Vec<_> = (0..4)
            .map(|_| {
                scope.spawn(|| {
                    get_entity_set(&model, "Catalog.Store", "Products")
                        .navigation_targets()
                        .len()
                })
            })
            .collect();
        handles
            .into_iter()
            .map(|handle| handle.join().unwrap_or_default())
            .collect()
    });
    assert_eq!(counts, vec![1; 4]);
    assert_no_errors(&model);
}
