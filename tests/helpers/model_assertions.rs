//! Assertion helpers for semantic model tests.

use std::sync::Once;

use edm::hir::{EdmError, EdmErrorCode, EntitySet, EntityType, Model};

static TRACING: Once = Once::new();

/// Route `tracing` output to the test writer, filtered by `RUST_LOG`.
pub fn init_tracing() {
    TRACING.call_once(|| {
        let _ = tracing_subscriber::fmt()
            .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
            .with_test_writer()
            .try_init();
    });
}

/// Get an entity type by qualified name or panic.
pub fn get_entity_type<'m>(model: &'m Model, name: &str) -> EntityType<'m> {
    model
        .find_entity_type(name)
        .unwrap_or_else(|| panic!("Expected entity type '{}' to exist", name))
}

/// Get an entity set of the named container or panic.
pub fn get_entity_set<'m>(model: &'m Model, container: &str, name: &str) -> EntitySet<'m> {
    model
        .find_entity_container(container)
        .and_then(|c| c.find_entity_set(name))
        .unwrap_or_else(|| panic!("Expected entity set '{}/{}' to exist", container, name))
}

/// The codes of `errors`, in order.
pub fn codes(errors: &[EdmError]) -> Vec<EdmErrorCode> {
    errors.iter().map(|e| e.code).collect()
}

/// Assert a validation run reports nothing.
pub fn assert_no_errors(model: &Model) {
    let errors = model.validate();
    assert!(
        errors.is_empty(),
        "Expected no errors, got {} error(s):\n{}",
        errors.len(),
        errors
            .iter()
            .map(|e| format!("  {}", e))
            .collect::<Vec<_>>()
            .join("\n")
    );
}

/// Assert a validation run reports exactly `expected`, in order.
pub fn assert_error_codes(model: &Model, expected: &[EdmErrorCode]) {
    let errors = model.validate();
    assert_eq!(
        codes(&errors),
        expected,
        "Unexpected errors:\n{}",
        errors
            .iter()
            .map(|e| format!("  {}", e))
            .collect::<Vec<_>>()
            .join("\n")
    );
}
