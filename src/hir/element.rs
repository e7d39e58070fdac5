//! Semantic element base.
//!
//! Every declared element owns an [`ElementCore`]: its identity, the schema
//! it was declared in, and the cache cells for the behaviour all elements
//! share. A view type only has to say which model it belongs to and which
//! element it wraps ([`SemanticElement::model`], [`SemanticElement::key`]);
//! location and annotations are derived from that.

use std::sync::Arc;

use smol_str::SmolStr;

use super::annotations::VocabularyAnnotation;
use super::cache::Cache;
use super::diagnostics::EdmError;
use super::ids::{AnnotationId, ElementKey, SchemaId};
use super::model::Model;
use crate::base::Location;
use crate::syntax::CsdlDirectValueAnnotation;

/// A lightweight annotation attached directly to an element.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct DirectValueAnnotation {
    pub namespace: SmolStr,
    pub name: SmolStr,
    pub value: SmolStr,
}

impl From<&CsdlDirectValueAnnotation> for DirectValueAnnotation {
    fn from(node: &CsdlDirectValueAnnotation) -> Self {
        Self {
            namespace: node.namespace.clone(),
            name: node.name.clone(),
            value: node.value.clone(),
        }
    }
}

/// State shared by every declared element.
#[derive(Debug)]
pub(crate) struct ElementCore {
    pub key: ElementKey,
    pub schema: SchemaId,
    pub location: Option<Location>,
    /// `None` when the node declares no direct annotations.
    pub direct_annotations: Cache<Option<Arc<[DirectValueAnnotation]>>>,
    pub inline_annotations: Cache<Arc<[AnnotationId]>>,
}

impl ElementCore {
    pub fn new(key: ElementKey, schema: SchemaId, location: Option<&Location>) -> Self {
        Self {
            key,
            schema,
            location: location.cloned(),
            direct_annotations: Cache::new(),
            inline_annotations: Cache::new(),
        }
    }

    /// The node's location, or a synthetic one naming this element.
    pub fn location(&self) -> Location {
        self.location
            .clone()
            .unwrap_or_else(|| Location::object(self.key.to_string()))
    }
}

/// Behaviour common to all declared elements.
pub trait SemanticElement<'m> {
    /// The model this element belongs to.
    fn model(&self) -> &'m Model;

    /// Identity of the wrapped declaration.
    fn key(&self) -> ElementKey;

    /// Errors of this element, including those of placeholders reachable
    /// through its own computed properties (one hop).
    fn errors(&self) -> Vec<EdmError>;

    /// Never fails: falls back to a synthetic location.
    fn location(&self) -> Location {
        self.model().location_of(self.key())
    }

    /// `None` when the declaration has no direct value annotations.
    fn direct_value_annotations(&self) -> Option<Arc<[DirectValueAnnotation]>> {
        self.model().direct_value_annotations(self.key())
    }

    /// Annotations written inside this element's declaration.
    fn inline_vocabulary_annotations(&self) -> Vec<VocabularyAnnotation<'m>> {
        let model = self.model();
        model
            .inline_annotation_ids(self.key())
            .iter()
            .map(|&id| model.annotation(id))
            .collect()
    }

    /// Inline annotations plus out-of-line annotations targeting this
    /// element.
    fn vocabulary_annotations(&self) -> Vec<VocabularyAnnotation<'m>> {
        self.model().find_vocabulary_annotations(self.key())
    }

    fn has_errors(&self) -> bool {
        !self.errors().is_empty()
    }
}
