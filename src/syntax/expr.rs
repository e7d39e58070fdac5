//! Annotation expressions and vocabulary annotations.

use std::sync::Arc;

use smol_str::SmolStr;

use crate::base::{ContractViolation, Location, TwoSegmentPath};

/// Literal kinds of constant expressions. The literal text stays raw until a
/// semantic element reads it.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum ConstantKind {
    Binary,
    Boolean,
    DateTime,
    DateTimeOffset,
    Decimal,
    Floating,
    Guid,
    Integer,
    String,
    Time,
}

#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct CsdlExpression {
    pub kind: CsdlExpressionKind,
    pub location: Option<Location>,
}

/// The closed set of expression shapes.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum CsdlExpressionKind {
    Constant {
        kind: ConstantKind,
        literal: SmolStr,
    },
    Null,
    Path(Vec<SmolStr>),
    Record {
        type_name: Option<SmolStr>,
        properties: Vec<Arc<CsdlPropertyValue>>,
    },
    Collection(Vec<Arc<CsdlExpression>>),
    If {
        test: Arc<CsdlExpression>,
        if_true: Arc<CsdlExpression>,
        if_false: Arc<CsdlExpression>,
    },
    /// Declares `label` for `expression` so it can be referenced elsewhere.
    Labeled {
        label: SmolStr,
        expression: Arc<CsdlExpression>,
    },
    LabeledReference(SmolStr),
    /// `Namespace.Container/EntitySet`
    EntitySetReference(TwoSegmentPath),
    /// `Namespace.EnumType/Member`
    EnumMemberReference(TwoSegmentPath),
}

impl CsdlExpression {
    pub fn new(kind: CsdlExpressionKind) -> Self {
        Self {
            kind,
            location: None,
        }
    }

    pub fn constant(kind: ConstantKind, literal: &str) -> Self {
        Self::new(CsdlExpressionKind::Constant {
            kind,
            literal: literal.into(),
        })
    }

    pub fn string(value: &str) -> Self {
        Self::constant(ConstantKind::String, value)
    }

    pub fn integer(literal: &str) -> Self {
        Self::constant(ConstantKind::Integer, literal)
    }

    pub fn null() -> Self {
        Self::new(CsdlExpressionKind::Null)
    }

    pub fn path<'a>(segments: impl IntoIterator<Item = &'a str>) -> Self {
        Self::new(CsdlExpressionKind::Path(
            segments.into_iter().map(SmolStr::new).collect(),
        ))
    }

    pub fn record(
        type_name: Option<&str>,
        properties: impl IntoIterator<Item = CsdlPropertyValue>,
    ) -> Self {
        Self::new(CsdlExpressionKind::Record {
            type_name: type_name.map(SmolStr::new),
            properties: properties.into_iter().map(Arc::new).collect(),
        })
    }

    pub fn collection(elements: impl IntoIterator<Item = CsdlExpression>) -> Self {
        Self::new(CsdlExpressionKind::Collection(
            elements.into_iter().map(Arc::new).collect(),
        ))
    }

    pub fn if_else(test: CsdlExpression, if_true: CsdlExpression, if_false: CsdlExpression) -> Self {
        Self::new(CsdlExpressionKind::If {
            test: Arc::new(test),
            if_true: Arc::new(if_true),
            if_false: Arc::new(if_false),
        })
    }

    pub fn labeled(label: &str, expression: CsdlExpression) -> Self {
        Self::new(CsdlExpressionKind::Labeled {
            label: label.into(),
            expression: Arc::new(expression),
        })
    }

    pub fn labeled_reference(label: &str) -> Self {
        Self::new(CsdlExpressionKind::LabeledReference(label.into()))
    }

    /// `path` must be `Namespace.Container/EntitySet`.
    pub fn entity_set_reference(path: &str) -> Result<Self, ContractViolation> {
        Ok(Self::new(CsdlExpressionKind::EntitySetReference(
            TwoSegmentPath::parse(path)?,
        )))
    }

    /// `path` must be `Namespace.EnumType/Member`.
    pub fn enum_member_reference(path: &str) -> Result<Self, ContractViolation> {
        Ok(Self::new(CsdlExpressionKind::EnumMemberReference(
            TwoSegmentPath::parse(path)?,
        )))
    }

    pub fn at(mut self, location: Location) -> Self {
        self.location = Some(location);
        self
    }
}

/// `<PropertyValue Property="..." />` inside a record or type annotation.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct CsdlPropertyValue {
    pub property: SmolStr,
    pub value: Arc<CsdlExpression>,
    pub location: Option<Location>,
}

impl CsdlPropertyValue {
    pub fn new(property: &str, value: CsdlExpression) -> Self {
        Self {
            property: property.into(),
            value: Arc::new(value),
            location: None,
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct CsdlVocabularyAnnotation {
    /// Qualified name of the term.
    pub term: SmolStr,
    pub qualifier: Option<SmolStr>,
    pub kind: CsdlAnnotationKind,
    pub location: Option<Location>,
}

#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum CsdlAnnotationKind {
    /// A value term applied with one expression.
    Value(Arc<CsdlExpression>),
    /// A structured type used as a term, applied with property values.
    Type(Vec<Arc<CsdlPropertyValue>>),
}

impl CsdlVocabularyAnnotation {
    pub fn value(term: &str, expression: CsdlExpression) -> Self {
        Self {
            term: term.into(),
            qualifier: None,
            kind: CsdlAnnotationKind::Value(Arc::new(expression)),
            location: None,
        }
    }

    pub fn type_annotation(
        term: &str,
        properties: impl IntoIterator<Item = CsdlPropertyValue>,
    ) -> Self {
        Self {
            term: term.into(),
            qualifier: None,
            kind: CsdlAnnotationKind::Type(properties.into_iter().map(Arc::new).collect()),
            location: None,
        }
    }

    pub fn with_qualifier(mut self, qualifier: &str) -> Self {
        self.qualifier = Some(qualifier.into());
        self
    }

    pub fn at(mut self, location: Location) -> Self {
        self.location = Some(location);
        self
    }
}
