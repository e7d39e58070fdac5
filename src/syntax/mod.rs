//! Syntax: the immutable schema tree handed over by a parser.
//!
//! Parsing schema text is not done here. A parser (or a test) builds these
//! nodes, and the [`hir`](crate::hir) layer resolves them into a type graph.
//!
//! ## Key Types
//!
//! - [`CsdlSchema`]: one schema document (namespace + declarations)
//! - [`CsdlTypeReference`] / [`CsdlTypeKind`]: closed set of type reference shapes
//! - [`CsdlExpression`] / [`CsdlExpressionKind`]: closed set of expression shapes
//! - [`CsdlVocabularyAnnotation`]: term applications (inline or out-of-line)
//! - [`CsdlNode`]: shared location/annotation access and builder helpers

mod ast;
mod expr;
mod types;

pub use ast::{
    ConcurrencyMode, CsdlAnnotationsBlock, CsdlAssociation, CsdlAssociationEnd,
    CsdlAssociationSet, CsdlAssociationSetEnd, CsdlComplexType, CsdlConstraintRole,
    CsdlDirectValueAnnotation, CsdlEntityContainer, CsdlEntitySet, CsdlEntityType, CsdlEnumMember,
    CsdlEnumType, CsdlFunction, CsdlFunctionImport, CsdlMeta, CsdlNavigationProperty, CsdlNode,
    CsdlParameter, CsdlProperty, CsdlReferentialConstraint, CsdlSchema, CsdlUsing, CsdlValueTerm,
    Multiplicity, OnDeleteAction, ParameterMode,
};
pub use expr::{
    ConstantKind, CsdlAnnotationKind, CsdlExpression, CsdlExpressionKind, CsdlPropertyValue,
    CsdlVocabularyAnnotation,
};
pub use types::{CsdlFacets, CsdlTypeKind, CsdlTypeReference};
