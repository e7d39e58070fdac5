//! Foundation types for the edm toolchain.
//!
//! This module provides fundamental types used throughout the crate:
//! - [`Position`], [`Span`] - Line/column positions for syntax nodes
//! - [`Location`] - Diagnostic locations, with a synthetic identity fallback
//! - [`TwoSegmentPath`], [`ContractViolation`] - Qualified name handling
//! - [`literals`] - Total try-parsers for primitive literal text
//! - Domain constants (primitive namespace, separators)
//!
//! This module has NO dependencies on other edm modules.

pub mod constants;
pub mod literals;
mod location;
mod name;
mod position;

pub use location::Location;
pub use name::{ContractViolation, TwoSegmentPath, qualify, split_qualified_name};
pub use position::{Position, Span};
