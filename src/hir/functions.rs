//! Functions and parameters.

use std::fmt;
use std::sync::Arc;

use super::cache::Cache;
use super::diagnostics::EdmError;
use super::element::{ElementCore, SemanticElement};
use super::ids::{ElementKey, FunctionId, FunctionImportId, ParameterId, RowTypeId};
use super::model::Model;
use super::resolve::{RowCursor, wrap_type_reference};
use super::structured::unreachable_type_cycle;
use super::types::TypeRef;
use crate::syntax::{CsdlFunction, CsdlParameter, ParameterMode};

#[derive(Debug)]
pub(crate) struct FunctionData {
    pub core: ElementCore,
    pub node: Arc<CsdlFunction>,
    pub parameters: Vec<ParameterId>,
    pub rows: Vec<RowTypeId>,
    pub return_type: Cache<Option<TypeRef>>,
}

#[derive(Debug)]
pub(crate) struct ParameterData {
    pub core: ElementCore,
    pub node: Arc<CsdlParameter>,
    pub owner: ParameterOwner,
    pub rows: Vec<RowTypeId>,
    pub type_ref: Cache<TypeRef>,
}

/// The function or function import declaring a parameter.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ParameterOwner {
    Function(FunctionId),
    FunctionImport(FunctionImportId),
}

// ============================================================================
// FUNCTION
// ============================================================================

#[derive(Clone, Copy)]
pub struct Function<'m> {
    model: &'m Model,
    id: FunctionId,
}

super::structured::view_identity!(Function, FunctionId);

impl<'m> Function<'m> {
    fn data(&self) -> &'m FunctionData {
        &self.model.functions[self.id.index()]
    }

    pub fn name(&self) -> &'m str {
        &self.data().node.name
    }

    pub fn namespace(&self) -> &'m str {
        self.model.namespace_of(self.data().core.schema)
    }

    pub fn full_name(&self) -> String {
        crate::base::qualify(self.namespace(), self.name())
    }

    /// Raw text of the defining expression; not interpreted.
    pub fn defining_expression(&self) -> Option<&'m str> {
        self.data().node.defining_expression.as_deref()
    }

    pub fn return_type(&self) -> Option<TypeRef> {
        let data = self.data();
        let model = self.model;
        data.return_type.get_value(
            || {
                let node = data.node.return_type.as_ref()?;
                let mut rows = RowCursor::new(&data.rows);
                Some(wrap_type_reference(model, &data.core.location(), node, &mut rows))
            },
            || None,
        )
    }

    pub fn parameters(&self) -> Vec<Parameter<'m>> {
        let model = self.model;
        self.data()
            .parameters
            .iter()
            .map(|&id| Parameter::new(model, id))
            .collect()
    }

    pub fn find_parameter(&self, name: &str) -> Option<Parameter<'m>> {
        self.parameters().into_iter().find(|p| p.name() == name)
    }
}

impl<'m> SemanticElement<'m> for Function<'m> {
    fn model(&self) -> &'m Model {
        self.model
    }

    fn key(&self) -> ElementKey {
        ElementKey::Function(self.id)
    }

    fn errors(&self) -> Vec<EdmError> {
        self.return_type()
            .map(|ty| ty.errors().to_vec())
            .unwrap_or_default()
    }
}

impl fmt::Debug for Function<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Function({})", self.full_name())
    }
}

// ============================================================================
// PARAMETER
// ============================================================================

#[derive(Clone, Copy)]
pub struct Parameter<'m> {
    model: &'m Model,
    id: ParameterId,
}

super::structured::view_identity!(Parameter, ParameterId);

impl<'m> Parameter<'m> {
    fn data(&self) -> &'m ParameterData {
        &self.model.parameters[self.id.index()]
    }

    pub fn name(&self) -> &'m str {
        &self.data().node.name
    }

    pub fn mode(&self) -> ParameterMode {
        self.data().node.mode
    }

    pub fn owner(&self) -> ParameterOwner {
        self.data().owner
    }

    pub fn type_ref(&self) -> TypeRef {
        let data = self.data();
        let model = self.model;
        data.type_ref.get_value(
            || {
                let mut rows = RowCursor::new(&data.rows);
                wrap_type_reference(model, &data.core.location(), &data.node.type_ref, &mut rows)
            },
            || unreachable_type_cycle(data.core.location(), &data.node.name),
        )
    }
}

impl<'m> SemanticElement<'m> for Parameter<'m> {
    fn model(&self) -> &'m Model {
        self.model
    }

    fn key(&self) -> ElementKey {
        ElementKey::Parameter(self.id)
    }

    fn errors(&self) -> Vec<EdmError> {
        self.type_ref().errors().to_vec()
    }
}

impl fmt::Debug for Parameter<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Parameter({})", self.name())
    }
}
