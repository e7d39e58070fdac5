//! Annotation expressions.
//!
//! An [`Expression`] wraps one expression node of a vocabulary annotation.
//! [`Expression::kind`] is the exhaustive dispatch consumers match on; the
//! parts that depend on the rest of the model (constant values, bound paths,
//! referenced labels, entity sets, enum members) are resolved on first read.

use std::fmt;
use std::sync::Arc;

use chrono::{DateTime, FixedOffset, NaiveDateTime, NaiveTime};
use rust_decimal::Decimal;
use smol_str::SmolStr;
use uuid::Uuid;

use super::annotations::{PropertyValue, VocabularyAnnotation};
use super::cache::Cache;
use super::containers::EntitySet;
use super::diagnostics::EdmError;
use super::element::SemanticElement;
use super::ids::{
    AnnotationId, ElementKey, EntitySetId, EntityTypeId, EnumMemberId, ExpressionId,
    PropertyValueId, SchemaId,
};
use super::model::Model;
use super::resolve::resolve_expression;
use super::structured::EnumMember;
use super::types::StructuredTypeId;
use super::unresolved::Resolution;
use crate::syntax::{ConstantKind, CsdlExpression, CsdlExpressionKind};

/// Parsed value of a constant expression.
#[derive(Clone, Debug, PartialEq)]
pub enum ConstantValue {
    Binary(Arc<[u8]>),
    Boolean(bool),
    DateTime(NaiveDateTime),
    DateTimeOffset(DateTime<FixedOffset>),
    Decimal(Decimal),
    Floating(f64),
    Guid(Uuid),
    Integer(i64),
    String(Arc<str>),
    Time(NaiveTime),
}

#[derive(Debug)]
pub(crate) struct ExpressionData {
    pub node: Arc<CsdlExpression>,
    pub annotation: AnnotationId,
    pub schema: SchemaId,
    pub binding_context: Option<EntityTypeId>,
    pub parent: Option<ExpressionId>,
    /// Set when this expression is the value of a property value.
    pub property_value: Option<PropertyValueId>,
    pub children: Vec<ExpressionId>,
    pub property_values: Vec<PropertyValueId>,
    pub resolved: Cache<ResolvedExpression>,
}

/// The model-dependent part of an expression.
#[derive(Clone, Debug, PartialEq)]
pub(crate) enum ResolvedExpression {
    Constant(ConstantValue, Option<EdmError>),
    /// `None` when there is no binding entity type to resolve against.
    Path(Option<Resolution<ElementKey>>),
    Record(Option<Resolution<StructuredTypeId>>),
    /// Carries an error when the label is declared more than once.
    Labeled(Option<EdmError>),
    LabeledReference(Resolution<ExpressionId>),
    EntitySet(Resolution<EntitySetId>),
    EnumMember(Resolution<EnumMemberId>),
    Inert,
}

/// What an expression is, with its references resolved.
#[derive(Clone, Debug, PartialEq)]
pub enum ExpressionKind<'m> {
    Constant {
        kind: ConstantKind,
        value: ConstantValue,
    },
    Null,
    Path {
        segments: Vec<SmolStr>,
        /// The property the path ends at; `None` without a binding type.
        target: Option<Resolution<ElementKey>>,
    },
    Record {
        declared_type: Option<Resolution<StructuredTypeId>>,
        properties: Vec<PropertyValue<'m>>,
    },
    Collection(Vec<Expression<'m>>),
    If {
        test: Expression<'m>,
        if_true: Expression<'m>,
        if_false: Expression<'m>,
    },
    Labeled {
        label: SmolStr,
        expression: Expression<'m>,
    },
    LabeledReference(Resolution<Expression<'m>>),
    EntitySetReference(Resolution<EntitySet<'m>>),
    EnumMemberReference(Resolution<EnumMember<'m>>),
}

#[derive(Clone, Copy)]
pub struct Expression<'m> {
    model: &'m Model,
    id: ExpressionId,
}

super::structured::view_identity!(Expression, ExpressionId);

impl<'m> Expression<'m> {
    fn data(&self) -> Arc<ExpressionData> {
        self.model.expressions.get(self.id.index())
    }

    fn resolved(&self) -> ResolvedExpression {
        let data = self.data();
        let model = self.model;
        let id = self.id;
        data.resolved
            .get_value(|| resolve_expression(model, id, &data), || ResolvedExpression::Inert)
    }

    /// The annotation this expression belongs to.
    pub fn annotation(&self) -> VocabularyAnnotation<'m> {
        VocabularyAnnotation::new(self.model, self.data().annotation)
    }

    pub fn parent(&self) -> Option<Expression<'m>> {
        self.data().parent.map(|id| Expression::new(self.model, id))
    }

    pub fn constant_kind(&self) -> Option<ConstantKind> {
        match &self.data().node.kind {
            CsdlExpressionKind::Constant { kind, .. } => Some(*kind),
            _ => None,
        }
    }

    /// The parsed value of a constant expression; the kind's default when
    /// the literal is malformed.
    pub fn value(&self) -> Option<ConstantValue> {
        match self.resolved() {
            ResolvedExpression::Constant(value, _) => Some(value),
            _ => None,
        }
    }

    pub fn kind(&self) -> ExpressionKind<'m> {
        let model = self.model;
        let data = self.data();
        let child = |index: usize| Expression::new(model, data.children[index]);
        match &data.node.kind {
            CsdlExpressionKind::Constant { kind, .. } => ExpressionKind::Constant {
                kind: *kind,
                value: self.value().unwrap_or(ConstantValue::Boolean(false)),
            },
            CsdlExpressionKind::Null => ExpressionKind::Null,
            CsdlExpressionKind::Path(segments) => ExpressionKind::Path {
                segments: segments.clone(),
                target: match self.resolved() {
                    ResolvedExpression::Path(target) => target,
                    _ => None,
                },
            },
            CsdlExpressionKind::Record { .. } => ExpressionKind::Record {
                declared_type: match self.resolved() {
                    ResolvedExpression::Record(declared) => declared,
                    _ => None,
                },
                properties: data
                    .property_values
                    .iter()
                    .map(|&id| PropertyValue::new(model, id))
                    .collect(),
            },
            CsdlExpressionKind::Collection(_) => {
                ExpressionKind::Collection((0..data.children.len()).map(child).collect())
            }
            CsdlExpressionKind::If { .. } => ExpressionKind::If {
                test: child(0),
                if_true: child(1),
                if_false: child(2),
            },
            CsdlExpressionKind::Labeled { label, .. } => ExpressionKind::Labeled {
                label: label.clone(),
                expression: child(0),
            },
            CsdlExpressionKind::LabeledReference(_) => match self.resolved() {
                ResolvedExpression::LabeledReference(target) => ExpressionKind::LabeledReference(
                    target.map(|id| Expression::new(model, id)),
                ),
                other => unreachable_kind(other),
            },
            CsdlExpressionKind::EntitySetReference(_) => match self.resolved() {
                ResolvedExpression::EntitySet(set) => {
                    ExpressionKind::EntitySetReference(set.map(|id| EntitySet::new(model, id)))
                }
                other => unreachable_kind(other),
            },
            CsdlExpressionKind::EnumMemberReference(_) => match self.resolved() {
                ResolvedExpression::EnumMember(member) => ExpressionKind::EnumMemberReference(
                    member.map(|id| EnumMember::new(model, id)),
                ),
                other => unreachable_kind(other),
            },
        }
    }

    /// For a labeled reference, the expression the label wraps. Chains of
    /// labeled references were checked for cycles when the reference
    /// resolved.
    pub fn dereference(&self) -> Option<Resolution<Expression<'m>>> {
        match self.kind() {
            ExpressionKind::LabeledReference(target) => Some(target.map(|labeled| {
                match labeled.kind() {
                    ExpressionKind::Labeled { expression, .. } => expression,
                    _ => labeled,
                }
            })),
            _ => None,
        }
    }
}

/// A reentrant read of a reference cell lands here; the cycle was already
/// logged by the cache.
fn unreachable_kind<'m>(_: ResolvedExpression) -> ExpressionKind<'m> {
    ExpressionKind::Null
}

impl<'m> SemanticElement<'m> for Expression<'m> {
    fn model(&self) -> &'m Model {
        self.model
    }

    fn key(&self) -> ElementKey {
        ElementKey::Expression(self.id)
    }

    fn errors(&self) -> Vec<EdmError> {
        match self.resolved() {
            ResolvedExpression::Constant(_, error) | ResolvedExpression::Labeled(error) => {
                error.into_iter().collect()
            }
            ResolvedExpression::Path(Some(target)) => target.placeholder_errors().to_vec(),
            ResolvedExpression::Record(Some(declared)) => declared.placeholder_errors().to_vec(),
            ResolvedExpression::LabeledReference(target) => target.placeholder_errors().to_vec(),
            ResolvedExpression::EntitySet(set) => set.placeholder_errors().to_vec(),
            ResolvedExpression::EnumMember(member) => member.placeholder_errors().to_vec(),
            ResolvedExpression::Path(None)
            | ResolvedExpression::Record(None)
            | ResolvedExpression::Inert => Vec::new(),
        }
    }
}

impl fmt::Debug for Expression<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Expression#{}", self.id.0)
    }
}
