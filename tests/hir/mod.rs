//! HIR layer tests
//!
//! Tests for the lazily resolved semantic model:
//! - Type reference and base type resolution
//! - Relationships (associations, navigation properties, constraints)
//! - Entity containers and navigation target inference
//! - Annotations, expressions and labeled elements
//! - Whole-model validation

pub mod tests_annotations;
pub mod tests_constants;
pub mod tests_containers;
pub mod tests_navigation_targets;
pub mod tests_relationships;
#[cfg(feature = "serde")]
pub mod tests_serde;
pub mod tests_type_resolution;
pub mod tests_validation;
