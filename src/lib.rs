//! # edm-base
//!
//! Semantic resolution for entity data model schemas: turns parsed schema
//! documents into a validated, cross-linked type graph.
//!
//! ## Module Structure (dependency order)
//!
//! ```text
//! hir       → Lazily resolved semantic model, navigation inference, validation
//!   ↓
//! syntax    → Immutable schema trees (a parser's output)
//!   ↓
//! base      → Primitives (Location, qualified names, literal parsers)
//! ```

// ============================================================================
// MODULES (dependency order: base → syntax → hir)
// ============================================================================

/// Foundation types: Location, qualified names, literal parsers
pub mod base;

/// Syntax: immutable schema trees handed over by a parser
pub mod syntax;

/// High-level IR: lazily resolved semantic model
pub mod hir;

// Re-export foundation types
pub use base::{ContractViolation, Location, Position, Span};

// Re-export the model root
pub use hir::{EdmError, EdmErrorCode, Model, Resolution, SemanticElement};
