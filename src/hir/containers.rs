//! Entity containers and what they declare: entity sets, association sets and
//! function imports.
//!
//! This is where relationship resolution happens. An association set end
//! binds a role of an association to an entity set, either explicitly or by
//! inference from the role's entity type. Navigation targets of an entity set
//! are inferred from the association sets that bind it, for navigation
//! properties of its element type and of every type deriving from it.
//!
//! A matched navigation target is recorded on the model through
//! [`Model::set_association_set_mapping`] so writers can find the
//! association set that realized it.

use std::fmt;
use std::sync::Arc;

use rustc_hash::FxHashSet;
use smol_str::SmolStr;

use super::cache::Cache;
use super::diagnostics::{EdmError, EdmErrorCode};
use super::element::{DirectValueAnnotation, ElementCore, SemanticElement};
use super::functions::Parameter;
use super::ids::{
    AssociationEndId, AssociationId, AssociationSetEndId, AssociationSetId, ElementKey, End,
    EntityContainerId, EntitySetId, EntityTypeId, FunctionImportId, NavigationPropertyId,
    ParameterId, RowTypeId,
};
use super::model::Model;
use super::relationships::{Association, AssociationEnd, NavigationProperty};
use super::resolve::{RowCursor, resolve_entity_type, wrap_type_reference};
use super::structured::EntityType;
use super::types::TypeRef;
use super::unresolved::{Resolution, Unresolved, UnresolvedKind};
use crate::syntax::{
    CsdlAssociationSet, CsdlAssociationSetEnd, CsdlEntityContainer, CsdlEntitySet,
    CsdlFunctionImport,
};

// ============================================================================
// ARENA DATA
// ============================================================================

#[derive(Debug)]
pub(crate) struct EntityContainerData {
    pub core: ElementCore,
    pub node: Arc<CsdlEntityContainer>,
    pub entity_sets: Vec<EntitySetId>,
    pub association_sets: Vec<AssociationSetId>,
    pub function_imports: Vec<FunctionImportId>,
    pub extends: Cache<Option<Resolution<EntityContainerId>>>,
}

#[derive(Debug)]
pub(crate) struct EntitySetData {
    pub core: ElementCore,
    pub node: Arc<CsdlEntitySet>,
    pub container: EntityContainerId,
    pub element_type: Cache<Resolution<EntityTypeId>>,
    pub navigation_targets: Cache<Arc<[NavigationTargetData]>>,
}

#[derive(Clone, Debug, PartialEq)]
pub(crate) struct NavigationTargetData {
    navigation_property: NavigationPropertyId,
    target: Resolution<EntitySetId>,
    /// False when the placeholder belongs to the association set end.
    owns_placeholder: bool,
}

#[derive(Debug)]
pub(crate) struct AssociationSetData {
    pub core: ElementCore,
    pub node: Arc<CsdlAssociationSet>,
    pub container: EntityContainerId,
    pub association: Cache<Resolution<AssociationId>>,
    pub ends: [AssociationSetEndData; 2],
}

#[derive(Debug)]
pub(crate) struct AssociationSetEndData {
    pub core: ElementCore,
    /// `None` when the association set leaves this end implicit.
    pub node: Option<Arc<CsdlAssociationSetEnd>>,
    pub association_end: Cache<Resolution<AssociationEndId>>,
    pub entity_set: Cache<Resolution<EntitySetId>>,
}

#[derive(Debug)]
pub(crate) struct FunctionImportData {
    pub core: ElementCore,
    pub node: Arc<CsdlFunctionImport>,
    pub container: EntityContainerId,
    pub parameters: Vec<ParameterId>,
    pub rows: Vec<RowTypeId>,
    pub return_type: Cache<Option<TypeRef>>,
    pub entity_set: Cache<Option<Resolution<EntitySetId>>>,
}

/// What navigation-target inference recorded for one
/// `(entity set, navigation property)` pair.
#[derive(Clone, Debug, PartialEq)]
pub struct AssociationSetMapping {
    pub association_set: AssociationSetId,
    pub association_set_name: SmolStr,
    pub annotations: AssociationSetAnnotations,
}

/// Direct value annotations of an association set and of each of its ends.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct AssociationSetAnnotations {
    pub association_set: Option<Arc<[DirectValueAnnotation]>>,
    pub end1: Option<Arc<[DirectValueAnnotation]>>,
    pub end2: Option<Arc<[DirectValueAnnotation]>>,
}

// ============================================================================
// ENTITY CONTAINER
// ============================================================================

#[derive(Clone, Copy)]
pub struct EntityContainer<'m> {
    model: &'m Model,
    id: EntityContainerId,
}

super::structured::view_identity!(EntityContainer, EntityContainerId);

impl<'m> EntityContainer<'m> {
    fn data(&self) -> &'m EntityContainerData {
        &self.model.entity_containers[self.id.index()]
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

    /// The container this one extends. A chain leading back to this
    /// container yields a cyclic placeholder.
    pub fn extends(&self) -> Option<Resolution<EntityContainer<'m>>> {
        let data = self.data();
        let model = self.model;
        let id = self.id;
        data.extends
            .get_value(|| compute_extends(model, id), || None)
            .map(|extends| extends.map(|id| EntityContainer::new(model, id)))
    }

    /// This container followed by the containers it extends, transitively.
    fn chain(&self) -> Vec<EntityContainer<'m>> {
        let mut chain = vec![*self];
        let mut seen = FxHashSet::default();
        seen.insert(self.id);
        let mut current = *self;
        while let Some(Resolution::Resolved(next)) = current.extends() {
            if !seen.insert(next.id) {
                break;
            }
            chain.push(next);
            current = next;
        }
        chain
    }

    pub fn entity_sets(&self) -> Vec<EntitySet<'m>> {
        let model = self.model;
        self.data()
            .entity_sets
            .iter()
            .map(|&id| EntitySet::new(model, id))
            .collect()
    }

    pub fn association_sets(&self) -> Vec<AssociationSet<'m>> {
        let model = self.model;
        self.data()
            .association_sets
            .iter()
            .map(|&id| AssociationSet::new(model, id))
            .collect()
    }

    pub fn function_imports(&self) -> Vec<FunctionImport<'m>> {
        let model = self.model;
        self.data()
            .function_imports
            .iter()
            .map(|&id| FunctionImport::new(model, id))
            .collect()
    }

    /// Declared entity sets, then those of extended containers.
    pub fn all_entity_sets(&self) -> Vec<EntitySet<'m>> {
        self.chain()
            .iter()
            .flat_map(EntityContainer::entity_sets)
            .collect()
    }

    pub fn find_entity_set(&self, name: &str) -> Option<EntitySet<'m>> {
        self.chain()
            .iter()
            .flat_map(EntityContainer::entity_sets)
            .find(|set| set.name() == name)
    }

    pub fn find_association_set(&self, name: &str) -> Option<AssociationSet<'m>> {
        self.chain()
            .iter()
            .flat_map(EntityContainer::association_sets)
            .find(|set| set.name() == name)
    }

    pub fn find_function_import(&self, name: &str) -> Option<FunctionImport<'m>> {
        self.chain()
            .iter()
            .flat_map(EntityContainer::function_imports)
            .find(|import| import.name() == name)
    }
}

fn compute_extends(model: &Model, id: EntityContainerId) -> Option<Resolution<EntityContainerId>> {
    let data = &model.entity_containers[id.index()];
    let name = data.node.extends.as_ref()?;
    let Some(extended) = model.find_entity_container(name) else {
        tracing::debug!("[RESOLVE] extended container '{}' not found", name);
        return Some(Resolution::Unresolved(Unresolved::new(
            UnresolvedKind::EntityContainer,
            name.as_str(),
            data.core.location(),
            EdmErrorCode::BadUnresolvedEntityContainer,
            format!("cannot find entity container '{}'", name),
        )));
    };

    // Walk raw `extends` names so no other container's cell is entered.
    let mut seen = FxHashSet::default();
    let mut current = extended.id();
    let cyclic = loop {
        if current == id {
            break true;
        }
        if !seen.insert(current) {
            break false;
        }
        let next = model.entity_containers[current.index()]
            .node
            .extends
            .as_ref()
            .and_then(|name| model.find_entity_container(name));
        match next {
            Some(next) => current = next.id(),
            None => break false,
        }
    };
    if cyclic {
        tracing::debug!("[RESOLVE] container '{}' extends itself", data.node.name);
        return Some(Resolution::Unresolved(Unresolved::new(
            UnresolvedKind::CyclicEntityContainer,
            name.as_str(),
            data.core.location(),
            EdmErrorCode::BadCyclicEntityContainer,
            format!(
                "entity container '{}' extends itself through '{}'",
                data.node.name, name
            ),
        )));
    }
    Some(Resolution::Resolved(extended.id()))
}

impl<'m> SemanticElement<'m> for EntityContainer<'m> {
    fn model(&self) -> &'m Model {
        self.model
    }

    fn key(&self) -> ElementKey {
        ElementKey::EntityContainer(self.id)
    }

    fn errors(&self) -> Vec<EdmError> {
        let mut errors = self.model.duplicate_errors(self.key());
        if let Some(Resolution::Unresolved(placeholder)) = self.extends() {
            errors.extend_from_slice(placeholder.errors());
        }
        errors
    }
}

impl fmt::Debug for EntityContainer<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "EntityContainer({})", self.full_name())
    }
}

// ============================================================================
// ENTITY SET
// ============================================================================

#[derive(Clone, Copy)]
pub struct EntitySet<'m> {
    model: &'m Model,
    id: EntitySetId,
}

super::structured::view_identity!(EntitySet, EntitySetId);

/// One inferred navigation target of an entity set.
#[derive(Clone, Debug, PartialEq)]
pub struct NavigationTarget<'m> {
    pub navigation_property: NavigationProperty<'m>,
    /// A bad-entity-set placeholder when several association sets matched.
    pub target: Resolution<EntitySet<'m>>,
}

impl<'m> EntitySet<'m> {
    fn data(&self) -> &'m EntitySetData {
        &self.model.entity_sets[self.id.index()]
    }

    pub fn name(&self) -> &'m str {
        &self.data().node.name
    }

    pub fn container(&self) -> EntityContainer<'m> {
        EntityContainer::new(self.model, self.data().container)
    }

    pub fn element_type(&self) -> Resolution<EntityType<'m>> {
        let data = self.data();
        let model = self.model;
        let location = data.core.location();
        data.element_type
            .get_value(
                || resolve_entity_type(model, &data.node.entity_type, &location),
                || resolve_entity_type(model, &data.node.entity_type, &location),
            )
            .map(|id| EntityType::new(model, id))
    }

    /// Navigation targets for every navigation property of the element type
    /// and of types deriving from it that an association set binds. Inferred
    /// once.
    pub fn navigation_targets(&self) -> Vec<NavigationTarget<'m>> {
        let model = self.model;
        self.target_data()
            .iter()
            .map(|target| NavigationTarget {
                navigation_property: NavigationProperty::new(model, target.navigation_property),
                target: target.target.clone().map(|id| EntitySet::new(model, id)),
            })
            .collect()
    }

    /// The entity set `property` leads to from this set. `None` when no
    /// association set binds it.
    pub fn find_navigation_target(
        &self,
        property: NavigationPropertyId,
    ) -> Option<Resolution<EntitySet<'m>>> {
        self.navigation_targets()
            .into_iter()
            .find(|target| target.navigation_property.id() == property)
            .map(|target| target.target)
    }

    fn target_data(&self) -> Arc<[NavigationTargetData]> {
        let model = self.model;
        let id = self.id;
        self.data().navigation_targets.get_value(
            || Arc::from(infer_navigation_targets(model, id)),
            || Arc::from(Vec::new()),
        )
    }
}

fn infer_navigation_targets(model: &Model, set: EntitySetId) -> Vec<NavigationTargetData> {
    let entity_set = EntitySet::new(model, set);
    let Resolution::Resolved(element_type) = entity_set.element_type() else {
        return Vec::new();
    };

    let mut properties = element_type.navigation_properties();
    for derived in model.find_all_derived_entity_types(element_type.id()) {
        properties.extend(EntityType::new(model, derived).declared_navigation_properties());
    }

    let mut targets = Vec::new();
    for property in properties {
        if let Some((target, owns_placeholder)) =
            infer_navigation_target(model, entity_set, property)
        {
            targets.push(NavigationTargetData {
                navigation_property: property.id(),
                target,
                owns_placeholder,
            });
        }
    }
    tracing::trace!(
        "[NAV] entity set '{}': {} navigation targets",
        entity_set.name(),
        targets.len()
    );
    targets
}

fn infer_navigation_target(
    model: &Model,
    set: EntitySet<'_>,
    property: NavigationProperty<'_>,
) -> Option<(Resolution<EntitySetId>, bool)> {
    let association = property.association().resolved()?;
    let to = property.to_end().resolved()?;

    // Association sets realizing the association with `set` at one end and
    // the property's target role at the other.
    let mut candidates: Vec<AssociationSetEnd<'_>> = Vec::new();
    for container in model.entity_containers() {
        for association_set in container.association_sets() {
            if !association_set.association().is(&association) {
                continue;
            }
            for end in End::BOTH {
                let near = association_set.end(end);
                let far = association_set.end(end.opposite());
                if near.entity_set().is(&set) && far.association_end().is(&to) {
                    candidates.push(near);
                }
            }
        }
    }

    let chosen = match candidates.as_slice() {
        [] => {
            tracing::trace!(
                "[NAV] no association set binds '{}' from '{}'",
                property.name(),
                set.name()
            );
            return None;
        }
        [single] => *single,
        _ => {
            let explicit: Vec<_> = candidates
                .iter()
                .filter(|end| end.has_explicit_entity_set())
                .collect();
            match explicit.as_slice() {
                [single] => **single,
                _ => {
                    tracing::debug!(
                        "[NAV] {} association sets bind '{}' from '{}'",
                        candidates.len(),
                        property.name(),
                        set.name()
                    );
                    let placeholder = Unresolved::new(
                        UnresolvedKind::BadEntitySet,
                        property.name(),
                        set.location(),
                        EdmErrorCode::CannotInferEntitySetWithMultipleSetsPerType,
                        format!(
                            "cannot infer the target of '{}' from entity set '{}': {} association sets match",
                            property.name(),
                            set.name(),
                            candidates.len()
                        ),
                    );
                    return Some((Resolution::Unresolved(placeholder), true));
                }
            }
        }
    };

    let association_set = chosen.association_set();
    let target = association_set
        .end(chosen.id().end.opposite())
        .entity_set()
        .map(|target| target.id());
    model.set_association_set_mapping(
        set.id(),
        property.id(),
        AssociationSetMapping {
            association_set: association_set.id(),
            association_set_name: SmolStr::new(association_set.name()),
            annotations: association_set.direct_annotations(),
        },
    );
    tracing::trace!(
        "[NAV] '{}' from '{}' via association set '{}'",
        property.name(),
        set.name(),
        association_set.name()
    );
    Some((target, false))
}

impl<'m> SemanticElement<'m> for EntitySet<'m> {
    fn model(&self) -> &'m Model {
        self.model
    }

    fn key(&self) -> ElementKey {
        ElementKey::EntitySet(self.id)
    }

    /// Navigation targets the far association set end failed to resolve
    /// are reported by that end.
    fn errors(&self) -> Vec<EdmError> {
        let mut errors = self.element_type().placeholder_errors().to_vec();
        for target in self.target_data().iter().filter(|t| t.owns_placeholder) {
            errors.extend_from_slice(target.target.placeholder_errors());
        }
        errors
    }
}

impl fmt::Debug for EntitySet<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "EntitySet({})", self.name())
    }
}

// ============================================================================
// ASSOCIATION SET
// ============================================================================

#[derive(Clone, Copy)]
pub struct AssociationSet<'m> {
    model: &'m Model,
    id: AssociationSetId,
}

super::structured::view_identity!(AssociationSet, AssociationSetId);

impl<'m> AssociationSet<'m> {
    fn data(&self) -> &'m AssociationSetData {
        &self.model.association_sets[self.id.index()]
    }

    pub fn name(&self) -> &'m str {
        &self.data().node.name
    }

    pub fn container(&self) -> EntityContainer<'m> {
        EntityContainer::new(self.model, self.data().container)
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
        match self.model.find_association_id(&data.node.association) {
            Some(id) => Resolution::Resolved(id),
            None => {
                tracing::debug!(
                    "[RESOLVE] association '{}' of set '{}' not found",
                    data.node.association,
                    data.node.name
                );
                Resolution::Unresolved(Unresolved::new(
                    UnresolvedKind::Association,
                    data.node.association.as_str(),
                    data.core.location(),
                    EdmErrorCode::BadUnresolvedAssociation,
                    format!("cannot find association '{}'", data.node.association),
                ))
            }
        }
    }

    pub fn end(&self, end: End) -> AssociationSetEnd<'m> {
        AssociationSetEnd::new(
            self.model,
            AssociationSetEndId {
                association_set: self.id,
                end,
            },
        )
    }

    pub fn end1(&self) -> AssociationSetEnd<'m> {
        self.end(End::First)
    }

    pub fn end2(&self) -> AssociationSetEnd<'m> {
        self.end(End::Second)
    }

    fn direct_annotations(&self) -> AssociationSetAnnotations {
        let model = self.model;
        AssociationSetAnnotations {
            association_set: model.direct_value_annotations(self.key()),
            end1: model.direct_value_annotations(self.end1().key()),
            end2: model.direct_value_annotations(self.end2().key()),
        }
    }
}

impl<'m> SemanticElement<'m> for AssociationSet<'m> {
    fn model(&self) -> &'m Model {
        self.model
    }

    fn key(&self) -> ElementKey {
        ElementKey::AssociationSet(self.id)
    }

    fn errors(&self) -> Vec<EdmError> {
        self.association().placeholder_errors().to_vec()
    }
}

impl fmt::Debug for AssociationSet<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "AssociationSet({})", self.name())
    }
}

// ============================================================================
// ASSOCIATION SET END
// ============================================================================

/// One end of an association set: a role bound to an entity set.
#[derive(Clone, Copy)]
pub struct AssociationSetEnd<'m> {
    model: &'m Model,
    id: AssociationSetEndId,
}

super::structured::view_identity!(AssociationSetEnd, AssociationSetEndId);

impl<'m> AssociationSetEnd<'m> {
    fn data(&self) -> &'m AssociationSetEndData {
        &self.model.association_sets[self.id.association_set.index()].ends[self.id.end.index()]
    }

    pub fn association_set(&self) -> AssociationSet<'m> {
        AssociationSet::new(self.model, self.id.association_set)
    }

    /// The role as written, or the role of the association end at the same
    /// position.
    pub fn role(&self) -> SmolStr {
        if let Some(role) = self.data().node.as_ref().and_then(|node| node.role.clone()) {
            return role;
        }
        match self.association_set().association() {
            Resolution::Resolved(association) => SmolStr::new(association.end(self.id.end).role()),
            Resolution::Unresolved(_) => SmolStr::default(),
        }
    }

    fn has_explicit_entity_set(&self) -> bool {
        self.data()
            .node
            .as_ref()
            .is_some_and(|node| node.entity_set.is_some())
    }

    pub fn association_end(&self) -> Resolution<AssociationEnd<'m>> {
        let data = self.data();
        let model = self.model;
        data.association_end
            .get_value(
                || self.resolve_association_end(),
                || self.resolve_association_end(),
            )
            .map(|id| AssociationEnd::new(model, id))
    }

    fn resolve_association_end(&self) -> Resolution<AssociationEndId> {
        let association = match self.association_set().association() {
            Resolution::Resolved(association) => association,
            Resolution::Unresolved(placeholder) => {
                return Resolution::Unresolved(Unresolved::with_errors(
                    UnresolvedKind::AssociationEnd,
                    self.role().as_str(),
                    placeholder.errors()[0].clone(),
                    Vec::new(),
                ));
            }
        };
        let Some(role) = self.data().node.as_ref().and_then(|node| node.role.as_ref()) else {
            return Resolution::Resolved(association.end(self.id.end).id());
        };
        match association.find_end(role) {
            Some(end) => Resolution::Resolved(end.id()),
            None => {
                tracing::debug!(
                    "[RESOLVE] role '{}' is not an end of '{}'",
                    role,
                    association.name()
                );
                Resolution::Unresolved(Unresolved::new(
                    UnresolvedKind::AssociationEnd,
                    role.as_str(),
                    self.location(),
                    EdmErrorCode::BadNonComputableAssociationEnd,
                    format!(
                        "role '{}' is not an end of association '{}'",
                        role,
                        association.name()
                    ),
                ))
            }
        }
    }

    /// The explicitly named entity set, or the single set of the container
    /// whose element type is the role's entity type.
    pub fn entity_set(&self) -> Resolution<EntitySet<'m>> {
        let data = self.data();
        let model = self.model;
        data.entity_set
            .get_value(|| self.resolve_entity_set(), || self.resolve_entity_set())
            .map(|id| EntitySet::new(model, id))
    }

    fn resolve_entity_set(&self) -> Resolution<EntitySetId> {
        let container = self.association_set().container();
        if let Some(name) = self.data().node.as_ref().and_then(|node| node.entity_set.as_ref()) {
            return match container.find_entity_set(name) {
                Some(set) => Resolution::Resolved(set.id()),
                None => {
                    tracing::debug!("[RESOLVE] entity set '{}' not found", name);
                    Resolution::Unresolved(Unresolved::new(
                        UnresolvedKind::EntitySet,
                        name.as_str(),
                        self.location(),
                        EdmErrorCode::BadUnresolvedEntitySet,
                        format!(
                            "cannot find entity set '{}' in container '{}'",
                            name,
                            container.name()
                        ),
                    ))
                }
            };
        }

        let end = match self.association_end() {
            Resolution::Resolved(end) => end,
            Resolution::Unresolved(placeholder) => return Resolution::Unresolved(placeholder),
        };
        let entity_type = match end.entity_type() {
            Resolution::Resolved(entity_type) => entity_type,
            Resolution::Unresolved(placeholder) => return Resolution::Unresolved(placeholder),
        };
        let candidates: Vec<_> = container
            .all_entity_sets()
            .into_iter()
            .filter(|set| set.element_type().is(&entity_type))
            .collect();
        let (code, message) = match candidates.as_slice() {
            [single] => {
                tracing::trace!(
                    "[NAV] inferred entity set '{}' for role '{}'",
                    single.name(),
                    end.role()
                );
                return Resolution::Resolved(single.id());
            }
            [] => (
                EdmErrorCode::NoEntitySetsFoundForType,
                format!(
                    "no entity set of type '{}' in container '{}' for role '{}'",
                    entity_type.full_name(),
                    container.name(),
                    end.role()
                ),
            ),
            _ => (
                EdmErrorCode::CannotInferEntitySetWithMultipleSetsPerType,
                format!(
                    "{} entity sets of type '{}' in container '{}' could play role '{}'",
                    candidates.len(),
                    entity_type.full_name(),
                    container.name(),
                    end.role()
                ),
            ),
        };
        tracing::debug!("[NAV] {}", message);
        Resolution::Unresolved(Unresolved::new(
            UnresolvedKind::BadEntitySet,
            end.role(),
            self.location(),
            code,
            message,
        ))
    }
}

impl<'m> SemanticElement<'m> for AssociationSetEnd<'m> {
    fn model(&self) -> &'m Model {
        self.model
    }

    fn key(&self) -> ElementKey {
        ElementKey::AssociationSetEnd(self.id)
    }

    /// Placeholders inherited from the association set or the association
    /// end are only counted where they originated.
    fn errors(&self) -> Vec<EdmError> {
        if self.association_set().association().is_unresolved() {
            return Vec::new();
        }
        let end = self.association_end();
        let mut errors = end.placeholder_errors().to_vec();
        if let Resolution::Unresolved(set) = self.entity_set() {
            let inherited = match &end {
                Resolution::Unresolved(placeholder) => Arc::ptr_eq(placeholder, &set),
                Resolution::Resolved(end) => end
                    .entity_type()
                    .unresolved()
                    .is_some_and(|placeholder| Arc::ptr_eq(placeholder, &set)),
            };
            if !inherited {
                errors.extend_from_slice(set.errors());
            }
        }
        errors
    }
}

impl fmt::Debug for AssociationSetEnd<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "AssociationSetEnd({}.{})",
            self.association_set().name(),
            self.role()
        )
    }
}

// ============================================================================
// FUNCTION IMPORT
// ============================================================================

/// A function exposed by an entity container.
#[derive(Clone, Copy)]
pub struct FunctionImport<'m> {
    model: &'m Model,
    id: FunctionImportId,
}

super::structured::view_identity!(FunctionImport, FunctionImportId);

impl<'m> FunctionImport<'m> {
    fn data(&self) -> &'m FunctionImportData {
        &self.model.function_imports[self.id.index()]
    }

    pub fn name(&self) -> &'m str {
        &self.data().node.name
    }

    pub fn container(&self) -> EntityContainer<'m> {
        EntityContainer::new(self.model, self.data().container)
    }

    pub fn is_side_effecting(&self) -> bool {
        self.data().node.is_side_effecting
    }

    pub fn is_composable(&self) -> bool {
        self.data().node.is_composable
    }

    pub fn is_bindable(&self) -> bool {
        self.data().node.is_bindable
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

    /// The entity set results are drawn from, looked up in the declaring
    /// container and the containers it extends.
    pub fn entity_set(&self) -> Option<Resolution<EntitySet<'m>>> {
        let data = self.data();
        let model = self.model;
        data.entity_set
            .get_value(
                || {
                    let name = data.node.entity_set.as_ref()?;
                    Some(match self.container().find_entity_set(name) {
                        Some(set) => Resolution::Resolved(set.id()),
                        None => {
                            tracing::debug!("[RESOLVE] entity set '{}' not found", name);
                            Resolution::Unresolved(Unresolved::new(
                                UnresolvedKind::EntitySet,
                                name.as_str(),
                                data.core.location(),
                                EdmErrorCode::BadUnresolvedEntitySet,
                                format!("cannot find entity set '{}'", name),
                            ))
                        }
                    })
                },
                || None,
            )
            .map(|set| set.map(|id| EntitySet::new(model, id)))
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

impl<'m> SemanticElement<'m> for FunctionImport<'m> {
    fn model(&self) -> &'m Model {
        self.model
    }

    fn key(&self) -> ElementKey {
        ElementKey::FunctionImport(self.id)
    }

    fn errors(&self) -> Vec<EdmError> {
        let mut errors = self
            .return_type()
            .map(|ty| ty.errors().to_vec())
            .unwrap_or_default();
        if let Some(Resolution::Unresolved(placeholder)) = self.entity_set() {
            errors.extend_from_slice(placeholder.errors());
        }
        errors
    }
}

impl fmt::Debug for FunctionImport<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "FunctionImport({})", self.name())
    }
}
