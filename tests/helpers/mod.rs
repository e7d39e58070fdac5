//! Shared test helpers.

pub mod model_assertions;
