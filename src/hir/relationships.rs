//! Associations, their ends and the navigation properties traversing them.

use std::fmt;
use std::sync::Arc;

use super::cache::Cache;
use super::diagnostics::{EdmError, EdmErrorCode, concat};
use super::element::{ElementCore, SemanticElement};
use super::ids::{
    AssociationEndId, AssociationId, ElementKey, End, EntityTypeId, NavigationPropertyId,
    PropertyId,
};
use super::model::Model;
use super::resolve::resolve_entity_type;
use super::structured::{EntityType, Property};
use super::types::{TypeDefinition, TypeRef};
use super::unresolved::{Resolution, Unresolved, UnresolvedKind};
use crate::syntax::{
    CsdlAssociation, CsdlAssociationEnd, CsdlConstraintRole, CsdlNavigationProperty, Multiplicity,
    OnDeleteAction,
};

// ============================================================================
// ARENA DATA
// ============================================================================

#[derive(Debug)]
pub(crate) struct AssociationData {
    pub core: ElementCore,
    pub node: Arc<CsdlAssociation>,
    pub ends: [AssociationEndData; 2],
    pub constraint: Cache<Option<Arc<ResolvedConstraint>>>,
}

#[derive(Debug)]
pub(crate) struct AssociationEndData {
    pub core: ElementCore,
    pub node: Arc<CsdlAssociationEnd>,
    pub entity_type: Cache<Resolution<EntityTypeId>>,
}

#[derive(Debug, PartialEq)]
pub(crate) struct ResolvedConstraint {
    principal: ResolvedConstraintRole,
    dependent: ResolvedConstraintRole,
}

#[derive(Debug, PartialEq)]
struct ResolvedConstraintRole {
    end: Resolution<AssociationEndId>,
    properties: Vec<Resolution<PropertyId>>,
}

#[derive(Debug)]
pub(crate) struct NavigationPropertyData {
    pub core: ElementCore,
    pub node: Arc<CsdlNavigationProperty>,
    pub declaring_type: EntityTypeId,
    pub association: Cache<Resolution<AssociationId>>,
    /// `(from, to)`
    pub ends: Cache<(Resolution<AssociationEndId>, Resolution<AssociationEndId>)>,
    pub partner: Cache<Option<NavigationPropertyId>>,
}

// ============================================================================
// ASSOCIATION
// ============================================================================

#[derive(Clone, Copy)]
pub struct Association<'m> {
    model: &'m Model,
    id: AssociationId,
}

super::structured::view_identity!(Association, AssociationId);

impl<'m> Association<'m> {
    fn data(&self) -> &'m AssociationData {
        &self.model.associations[self.id.index()]
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

    pub fn end(&self, end: End) -> AssociationEnd<'m> {
        AssociationEnd::new(
            self.model,
            AssociationEndId {
                association: self.id,
                end,
            },
        )
    }

    pub fn end1(&self) -> AssociationEnd<'m> {
        self.end(End::First)
    }

    pub fn end2(&self) -> AssociationEnd<'m> {
        self.end(End::Second)
    }

    pub fn find_end(&self, role: &str) -> Option<AssociationEnd<'m>> {
        End::BOTH
            .into_iter()
            .map(|end| self.end(end))
            .find(|end| end.role() == role)
    }

    /// The referential constraint, with its roles matched to ends and its
    /// property references resolved against each end's entity type.
    pub fn referential_constraint(&self) -> Option<ReferentialConstraint<'m>> {
        let data = self.data();
        let model = self.model;
        let id = self.id;
        let resolved = data
            .constraint
            .get_value(|| resolve_constraint(model, id).map(Arc::new), || None)?;
        Some(ReferentialConstraint {
            model,
            resolved,
        })
    }
}

fn resolve_constraint(model: &Model, id: AssociationId) -> Option<ResolvedConstraint> {
    let data = &model.associations[id.index()];
    let node = data.node.referential_constraint.as_ref()?;
    let location = node
        .location
        .clone()
        .unwrap_or_else(|| data.core.location());
    let association = Association::new(model, id);
    let role = |role: &CsdlConstraintRole| {
        let Some(end) = association.find_end(&role.role) else {
            tracing::debug!(
                "[RESOLVE] constraint role '{}' is not an end of '{}'",
                role.role,
                data.node.name
            );
            let placeholder = Unresolved::new(
                UnresolvedKind::AssociationEnd,
                role.role.as_str(),
                location.clone(),
                EdmErrorCode::BadNonComputableAssociationEnd,
                format!(
                    "role '{}' is not an end of association '{}'",
                    role.role, data.node.name
                ),
            );
            return ResolvedConstraintRole {
                end: Resolution::Unresolved(placeholder),
                properties: Vec::new(),
            };
        };
        let entity_type = end.entity_type().resolved();
        let properties = role
            .properties
            .iter()
            .map(|name| {
                match entity_type.and_then(|ty| ty.find_property(name)) {
                    Some(property) => Resolution::Resolved(property.id()),
                    None => Resolution::Unresolved(Unresolved::new(
                        UnresolvedKind::Property,
                        name.as_str(),
                        location.clone(),
                        EdmErrorCode::BadUnresolvedProperty,
                        format!("cannot find constraint property '{}' on role '{}'", name, role.role),
                    )),
                }
            })
            .collect();
        ResolvedConstraintRole {
            end: Resolution::Resolved(end.id()),
            properties,
        }
    };
    Some(ResolvedConstraint {
        principal: role(&node.principal),
        dependent: role(&node.dependent),
    })
}

impl<'m> SemanticElement<'m> for Association<'m> {
    fn model(&self) -> &'m Model {
        self.model
    }

    fn key(&self) -> ElementKey {
        ElementKey::Association(self.id)
    }

    fn errors(&self) -> Vec<EdmError> {
        let mut errors = self.model.duplicate_errors(self.key());
        if let Some(constraint) = self.referential_constraint() {
            errors.extend(constraint.errors());
        }
        errors
    }
}

impl fmt::Debug for Association<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Association({})", self.full_name())
    }
}

/// A resolved referential constraint.
#[derive(Clone)]
pub struct ReferentialConstraint<'m> {
    model: &'m Model,
    resolved: Arc<ResolvedConstraint>,
}

impl<'m> ReferentialConstraint<'m> {
    pub fn principal_end(&self) -> Resolution<AssociationEnd<'m>> {
        let model = self.model;
        self.resolved
            .principal
            .end
            .clone()
            .map(|id| AssociationEnd::new(model, id))
    }

    pub fn dependent_end(&self) -> Resolution<AssociationEnd<'m>> {
        let model = self.model;
        self.resolved
            .dependent
            .end
            .clone()
            .map(|id| AssociationEnd::new(model, id))
    }

    pub fn principal_properties(&self) -> Vec<Resolution<Property<'m>>> {
        properties(self.model, &self.resolved.principal)
    }

    pub fn dependent_properties(&self) -> Vec<Resolution<Property<'m>>> {
        properties(self.model, &self.resolved.dependent)
    }

    pub fn errors(&self) -> Vec<EdmError> {
        [&self.resolved.principal, &self.resolved.dependent]
            .into_iter()
            .flat_map(|role| {
                role.end
                    .placeholder_errors()
                    .iter()
                    .chain(role.properties.iter().flat_map(|p| p.placeholder_errors()))
            })
            .cloned()
            .collect()
    }
}

fn properties<'m>(model: &'m Model, role: &ResolvedConstraintRole) -> Vec<Resolution<Property<'m>>> {
    role.properties
        .iter()
        .map(|p| p.clone().map(|id| Property::new(model, id)))
        .collect()
}

impl fmt::Debug for ReferentialConstraint<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ReferentialConstraint")
            .field("principal", &self.resolved.principal.end)
            .field("dependent", &self.resolved.dependent.end)
            .finish()
    }
}

// ============================================================================
// ASSOCIATION END
// ============================================================================

#[derive(Clone, Copy)]
pub struct AssociationEnd<'m> {
    model: &'m Model,
    id: AssociationEndId,
}

super::structured::view_identity!(AssociationEnd, AssociationEndId);

impl<'m> AssociationEnd<'m> {
    fn data(&self) -> &'m AssociationEndData {
        &self.model.associations[self.id.association.index()].ends[self.id.end.index()]
    }

    pub fn role(&self) -> &'m str {
        &self.data().node.role
    }

    pub fn association(&self) -> Association<'m> {
        Association::new(self.model, self.id.association)
    }

    pub fn opposite(&self) -> AssociationEnd<'m> {
        self.association().end(self.id.end.opposite())
    }

    pub fn multiplicity(&self) -> Multiplicity {
        self.data().node.multiplicity
    }

    pub fn on_delete(&self) -> OnDeleteAction {
        self.data().node.on_delete
    }

    pub fn entity_type(&self) -> Resolution<EntityType<'m>> {
        let data = self.data();
        let model = self.model;
        let location = data.core.location();
        data.entity_type
            .get_value(
                || resolve_entity_type(model, &data.node.entity_type, &location),
                || resolve_entity_type(model, &data.node.entity_type, &location),
            )
            .map(|id| EntityType::new(model, id))
    }
}

impl<'m> SemanticElement<'m> for AssociationEnd<'m> {
    fn model(&self) -> &'m Model {
        self.model
    }

    fn key(&self) -> ElementKey {
        ElementKey::AssociationEnd(self.id)
    }

    fn errors(&self) -> Vec<EdmError> {
        match self.entity_type() {
            Resolution::Resolved(_) => Vec::new(),
            Resolution::Unresolved(placeholder) => placeholder.errors().to_vec(),
        }
    }
}

impl fmt::Debug for AssociationEnd<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "AssociationEnd({}.{})", self.association().name(), self.role())
    }
}

// ============================================================================
// NAVIGATION PROPERTY
// ============================================================================

/// A relationship end exposed as a property of an entity type.
#[derive(Clone, Copy)]
pub struct NavigationProperty<'m> {
    model: &'m Model,
    id: NavigationPropertyId,
}

super::structured::view_identity!(NavigationProperty, NavigationPropertyId);

impl<'m> NavigationProperty<'m> {
    fn data(&self) -> &'m NavigationPropertyData {
        &self.model.navigation_properties[self.id.index()]
    }

    pub fn name(&self) -> &'m str {
        &self.data().node.name
    }

    pub fn declaring_type(&self) -> EntityType<'m> {
        EntityType::new(self.model, self.data().declaring_type)
    }

    pub fn contains_target(&self) -> bool {
        self.data().node.contains_target
    }

    pub fn association(&self) -> Resolution<Association<'m>> {
        let data = self.data();
        let model = self.model;
        data.association
            .get_value(|| self.resolve_association(), || self.resolve_association())
            .map(|id| Association::new(model, id))
    }

    fn resolve_association(&self) -> Resolution<AssociationId> {
        let data = self.data();
        match self.model.find_association_id(&data.node.relationship) {
            Some(id) => Resolution::Resolved(id),
            None => {
                tracing::debug!(
                    "[RESOLVE] association '{}' of '{}' not found",
                    data.node.relationship,
                    data.node.name
                );
                Resolution::Unresolved(Unresolved::new(
                    UnresolvedKind::Association,
                    data.node.relationship.as_str(),
                    data.core.location(),
                    EdmErrorCode::BadUnresolvedAssociation,
                    format!("cannot find association '{}'", data.node.relationship),
                ))
            }
        }
    }

    fn ends(&self) -> (Resolution<AssociationEndId>, Resolution<AssociationEndId>) {
        let data = self.data();
        data.ends.get_value(|| self.resolve_ends(), || self.resolve_ends())
    }

    fn resolve_ends(&self) -> (Resolution<AssociationEndId>, Resolution<AssociationEndId>) {
        let data = self.data();
        let association = match self.association() {
            Resolution::Resolved(association) => association,
            Resolution::Unresolved(placeholder) => {
                let end = |role: &str| {
                    Resolution::Unresolved(Unresolved::with_errors(
                        UnresolvedKind::AssociationEnd,
                        role,
                        placeholder.errors()[0].clone(),
                        Vec::new(),
                    ))
                };
                return (end(&data.node.from_role), end(&data.node.to_role));
            }
        };
        let location = data.core.location();
        let end = |role: &str| match association.find_end(role) {
            Some(end) => Resolution::Resolved(end.id()),
            None => {
                tracing::debug!(
                    "[RESOLVE] role '{}' is not an end of '{}'",
                    role,
                    association.name()
                );
                Resolution::Unresolved(Unresolved::new(
                    UnresolvedKind::AssociationEnd,
                    role,
                    location.clone(),
                    EdmErrorCode::BadNonComputableAssociationEnd,
                    format!(
                        "role '{}' is not an end of association '{}'",
                        role,
                        association.name()
                    ),
                ))
            }
        };
        (end(&data.node.from_role), end(&data.node.to_role))
    }

    pub fn from_end(&self) -> Resolution<AssociationEnd<'m>> {
        let model = self.model;
        self.ends().0.map(|id| AssociationEnd::new(model, id))
    }

    pub fn to_end(&self) -> Resolution<AssociationEnd<'m>> {
        let model = self.model;
        self.ends().1.map(|id| AssociationEnd::new(model, id))
    }

    /// The entity type at the end this property points to.
    pub fn to_entity_type(&self) -> Resolution<EntityType<'m>> {
        match self.to_end() {
            Resolution::Resolved(end) => end.entity_type(),
            Resolution::Unresolved(placeholder) => Resolution::Unresolved(placeholder),
        }
    }

    pub fn multiplicity(&self) -> Option<Multiplicity> {
        self.to_end().resolved().map(|end| end.multiplicity())
    }

    /// `Many` yields a collection of the target entity type; `One` a
    /// non-nullable and `ZeroOrOne` a nullable reference to it.
    pub fn target_type(&self) -> TypeRef {
        let target = self.to_entity_type().map(|ty| ty.id());
        let entity = |nullable| TypeRef::new(TypeDefinition::Entity(target.clone()), nullable);
        match self.multiplicity() {
            Some(Multiplicity::Many) => {
                TypeRef::new(TypeDefinition::Collection(Box::new(entity(false))), false)
            }
            Some(Multiplicity::One) => entity(false),
            Some(Multiplicity::ZeroOrOne) | None => entity(true),
        }
    }

    /// The navigation property on the target type traversing the same
    /// association in the opposite direction.
    pub fn partner(&self) -> Option<NavigationProperty<'m>> {
        let data = self.data();
        let model = self.model;
        data.partner
            .get_value(|| self.find_partner(), || None)
            .map(|id| NavigationProperty::new(model, id))
    }

    fn find_partner(&self) -> Option<NavigationPropertyId> {
        let (Resolution::Resolved(from), Resolution::Resolved(to)) = self.ends() else {
            return None;
        };
        let target = AssociationEnd::new(self.model, to).entity_type().resolved()?;
        target
            .navigation_properties()
            .into_iter()
            .find(|candidate| {
                candidate.id != self.id
                    && candidate.ends() == (Resolution::Resolved(to), Resolution::Resolved(from))
            })
            .map(|partner| partner.id)
    }

    /// Delete behavior declared on this property's own end.
    pub fn on_delete(&self) -> OnDeleteAction {
        self.from_end()
            .resolved()
            .map(|end| end.on_delete())
            .unwrap_or_default()
    }

    /// True when the association's constraint names this property's own end
    /// as principal.
    pub fn is_principal(&self) -> bool {
        let Some(association) = self.association().resolved() else {
            return false;
        };
        let Some(constraint) = association.referential_constraint() else {
            return false;
        };
        match (constraint.principal_end(), self.to_end()) {
            (Resolution::Resolved(principal), Resolution::Resolved(to)) => principal != to,
            _ => false,
        }
    }

    /// Foreign-key properties on the declaring side, when the target is the
    /// principal of the association's constraint.
    pub fn dependent_properties(&self) -> Vec<Resolution<Property<'m>>> {
        let Some(constraint) = self
            .association()
            .resolved()
            .and_then(|association| association.referential_constraint())
        else {
            return Vec::new();
        };
        match (constraint.principal_end(), self.to_end()) {
            (Resolution::Resolved(principal), Resolution::Resolved(to)) if principal == to => {
                constraint.dependent_properties()
            }
            _ => Vec::new(),
        }
    }
}

impl<'m> SemanticElement<'m> for NavigationProperty<'m> {
    fn model(&self) -> &'m Model {
        self.model
    }

    fn key(&self) -> ElementKey {
        ElementKey::NavigationProperty(self.id)
    }

    /// An unresolved association already explains the unresolved ends, so
    /// end errors only count once the association is known.
    fn errors(&self) -> Vec<EdmError> {
        if let Resolution::Unresolved(placeholder) = self.association() {
            return placeholder.errors().to_vec();
        }
        let (from, to) = self.ends();
        concat([from.placeholder_errors(), to.placeholder_errors()])
    }
}

impl fmt::Debug for NavigationProperty<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "NavigationProperty({})", self.name())
    }
}
