//! Model root: arenas, qualified-name index and lookup authority.
//!
//! A [`Model`] is built from a set of parsed schemas. Construction registers
//! an empty wrapper for every declared element in a typed arena; everything
//! else (type references, base types, navigation targets, annotations) is
//! computed on first read through [`Cache`] cells.
//!
//! ## Key Types
//!
//! - [`Model`]: root of one resolution session, `Send + Sync`
//! - [`Schema`]: view over one registered schema
//!
//! Lookups by qualified name always return the same arena id for the same
//! declaration, which is what the navigation-target inference compares.

use std::fmt;
use std::sync::Arc;

use indexmap::IndexMap;
use indexmap::map::Entry;
use parking_lot::Mutex;
use rustc_hash::{FxHashMap, FxHashSet};
use smol_str::SmolStr;

use super::annotations::{
    AnnotationData, AnnotationOrigin, PropertyValue, PropertyValueData, ValueTerm, ValueTermData,
    VocabularyAnnotation, allocate_annotations,
};
use super::arena::Arena;
use super::cache::Cache;
use super::containers::{
    AssociationSet, AssociationSetData, AssociationSetMapping, EntityContainer,
    EntityContainerData, EntitySet, EntitySetData, FunctionImport, FunctionImportData,
};
use super::diagnostics::{EdmError, EdmErrorCode};
use super::element::{DirectValueAnnotation, ElementCore, SemanticElement};
use super::expressions::{Expression, ExpressionData};
use super::functions::{Function, FunctionData, Parameter, ParameterData};
use super::ids::{
    AnnotationId, AssociationId, ComplexTypeId, ElementKey, EntityContainerId, EntitySetId,
    EntityTypeId, EnumTypeId, ExpressionId, FunctionId, NavigationPropertyId, SchemaId,
    ValueTermId,
};
use super::relationships::{Association, AssociationData, NavigationProperty, NavigationPropertyData};
use super::structured::{
    ComplexType, ComplexTypeData, EntityType, EntityTypeData, EnumMember, EnumMemberData,
    EnumType, EnumTypeData, Property, PropertyData, RowType, RowTypeData,
};
use super::types::{DeclaringType, SchemaType, StructuredTypeId};
use super::unresolved::{Resolution, Unresolved, UnresolvedKind};
use crate::base::{Location, qualify, split_qualified_name};
use crate::syntax::{CsdlExpressionKind, CsdlMeta, CsdlSchema};

// ============================================================================
// MODEL
// ============================================================================

/// Root aggregate of one resolution session.
#[derive(Default)]
pub struct Model {
    pub(crate) schemas: Vec<SchemaData>,
    pub(crate) entity_types: Vec<EntityTypeData>,
    pub(crate) complex_types: Vec<ComplexTypeData>,
    pub(crate) row_types: Vec<RowTypeData>,
    pub(crate) properties: Vec<PropertyData>,
    pub(crate) enum_types: Vec<EnumTypeData>,
    pub(crate) enum_members: Vec<EnumMemberData>,
    pub(crate) navigation_properties: Vec<NavigationPropertyData>,
    pub(crate) associations: Vec<AssociationData>,
    pub(crate) functions: Vec<FunctionData>,
    pub(crate) parameters: Vec<ParameterData>,
    pub(crate) value_terms: Vec<ValueTermData>,
    pub(crate) entity_containers: Vec<EntityContainerData>,
    pub(crate) entity_sets: Vec<EntitySetData>,
    pub(crate) association_sets: Vec<AssociationSetData>,
    pub(crate) function_imports: Vec<FunctionImportData>,

    pub(crate) annotations: Arena<AnnotationData>,
    pub(crate) expressions: Arena<ExpressionData>,
    pub(crate) property_values: Arena<PropertyValueData>,

    names: Cache<Arc<NameIndex>>,
    derived_types: Cache<Arc<FxHashMap<EntityTypeId, Vec<EntityTypeId>>>>,
    out_of_line: Cache<Arc<OutOfLineAnnotations>>,
    labels: Cache<Arc<FxHashMap<SmolStr, Vec<ExpressionId>>>>,

    /// Written once per `(entity set, navigation property)` by navigation
    /// target inference, read by writers.
    association_set_mappings:
        Mutex<FxHashMap<(EntitySetId, NavigationPropertyId), AssociationSetMapping>>,
}

#[derive(Debug)]
pub(crate) struct SchemaData {
    pub core: ElementCore,
    pub node: Arc<CsdlSchema>,
    pub entity_types: Vec<EntityTypeId>,
    pub complex_types: Vec<ComplexTypeId>,
    pub enum_types: Vec<EnumTypeId>,
    pub associations: Vec<AssociationId>,
    pub functions: Vec<FunctionId>,
    pub value_terms: Vec<ValueTermId>,
    pub entity_containers: Vec<EntityContainerId>,
}

impl Model {
    /// Register every declaration of `schemas`. Nothing is resolved yet.
    pub fn new(schemas: impl IntoIterator<Item = CsdlSchema>) -> Self {
        Self::from_shared(schemas.into_iter().map(Arc::new))
    }

    /// Like [`Model::new`] for syntax trees already shared with a parser.
    pub fn from_shared(schemas: impl IntoIterator<Item = Arc<CsdlSchema>>) -> Self {
        super::lower::lower(schemas)
    }

    pub fn schemas(&self) -> Vec<Schema<'_>> {
        (0..self.schemas.len())
            .map(|i| Schema::new(self, SchemaId::from_index(i)))
            .collect()
    }

    pub(crate) fn namespace_of(&self, schema: SchemaId) -> &str {
        &self.schemas[schema.index()].node.namespace
    }

    // ========================================================================
    // VIEWS BY ID
    // ========================================================================

    pub fn schema(&self, id: SchemaId) -> Schema<'_> {
        Schema::new(self, id)
    }

    pub fn entity_type(&self, id: EntityTypeId) -> EntityType<'_> {
        EntityType::new(self, id)
    }

    pub fn complex_type(&self, id: ComplexTypeId) -> ComplexType<'_> {
        ComplexType::new(self, id)
    }

    pub fn row_type(&self, id: super::ids::RowTypeId) -> RowType<'_> {
        RowType::new(self, id)
    }

    pub fn enum_type(&self, id: EnumTypeId) -> EnumType<'_> {
        EnumType::new(self, id)
    }

    pub fn enum_member(&self, id: super::ids::EnumMemberId) -> EnumMember<'_> {
        EnumMember::new(self, id)
    }

    pub fn property(&self, id: super::ids::PropertyId) -> Property<'_> {
        Property::new(self, id)
    }

    pub fn navigation_property(&self, id: NavigationPropertyId) -> NavigationProperty<'_> {
        NavigationProperty::new(self, id)
    }

    pub fn association(&self, id: AssociationId) -> Association<'_> {
        Association::new(self, id)
    }

    pub fn function(&self, id: FunctionId) -> Function<'_> {
        Function::new(self, id)
    }

    pub fn parameter(&self, id: super::ids::ParameterId) -> Parameter<'_> {
        Parameter::new(self, id)
    }

    pub fn value_term(&self, id: ValueTermId) -> ValueTerm<'_> {
        ValueTerm::new(self, id)
    }

    pub fn entity_container(&self, id: EntityContainerId) -> EntityContainer<'_> {
        EntityContainer::new(self, id)
    }

    pub fn entity_set(&self, id: EntitySetId) -> EntitySet<'_> {
        EntitySet::new(self, id)
    }

    pub fn association_set(&self, id: super::ids::AssociationSetId) -> AssociationSet<'_> {
        AssociationSet::new(self, id)
    }

    pub fn function_import(&self, id: super::ids::FunctionImportId) -> FunctionImport<'_> {
        FunctionImport::new(self, id)
    }

    pub fn annotation(&self, id: AnnotationId) -> VocabularyAnnotation<'_> {
        VocabularyAnnotation::new(self, id)
    }

    pub fn expression(&self, id: ExpressionId) -> Expression<'_> {
        Expression::new(self, id)
    }

    pub fn property_value(&self, id: super::ids::PropertyValueId) -> PropertyValue<'_> {
        PropertyValue::new(self, id)
    }

    pub fn entity_containers(&self) -> Vec<EntityContainer<'_>> {
        (0..self.entity_containers.len())
            .map(|i| EntityContainer::new(self, EntityContainerId::from_index(i)))
            .collect()
    }

    // ========================================================================
    // QUALIFIED-NAME LOOKUP
    // ========================================================================

    fn names(&self) -> Arc<NameIndex> {
        self.names.get_value(
            || Arc::new(self.build_name_index()),
            || Arc::new(NameIndex::default()),
        )
    }

    fn build_name_index(&self) -> NameIndex {
        let mut index = NameIndex::default();
        for schema in &self.schemas {
            let namespace = &schema.node.namespace;
            if let Some(alias) = &schema.node.alias {
                index.aliases.insert(alias.clone(), namespace.clone());
            }
            for using in &schema.node.usings {
                index
                    .aliases
                    .insert(using.alias.clone(), using.namespace.clone());
            }
        }

        for schema in &self.schemas {
            let namespace = schema.node.namespace.as_str();
            for &id in &schema.entity_types {
                let data = &self.entity_types[id.index()];
                index.declare(
                    qualify(namespace, &data.node.name),
                    NamedElement::Type(SchemaType::Entity(id)),
                    &data.core,
                );
            }
            for &id in &schema.complex_types {
                let data = &self.complex_types[id.index()];
                index.declare(
                    qualify(namespace, &data.node.name),
                    NamedElement::Type(SchemaType::Complex(id)),
                    &data.core,
                );
            }
            for &id in &schema.enum_types {
                let data = &self.enum_types[id.index()];
                index.declare(
                    qualify(namespace, &data.node.name),
                    NamedElement::Type(SchemaType::Enum(id)),
                    &data.core,
                );
            }
            for &id in &schema.associations {
                let data = &self.associations[id.index()];
                index.declare(
                    qualify(namespace, &data.node.name),
                    NamedElement::Association(id),
                    &data.core,
                );
            }
            for &id in &schema.value_terms {
                let data = &self.value_terms[id.index()];
                index.declare(
                    qualify(namespace, &data.node.name),
                    NamedElement::ValueTerm(id),
                    &data.core,
                );
            }
            for &id in &schema.entity_containers {
                let data = &self.entity_containers[id.index()];
                index.declare(
                    qualify(namespace, &data.node.name),
                    NamedElement::EntityContainer(id),
                    &data.core,
                );
            }
            for &id in &schema.functions {
                let data = &self.functions[id.index()];
                index
                    .functions
                    .entry(qualify(namespace, &data.node.name))
                    .or_default()
                    .push(id);
            }
        }

        tracing::trace!(
            "[RESOLVE] name index: {} elements, {} duplicates",
            index.elements.len(),
            index.duplicates.len()
        );
        index
    }

    /// Look up a qualified name, accepting a namespace alias in place of the
    /// namespace.
    fn lookup(&self, name: &str) -> Option<NamedElement> {
        let names = self.names();
        if let Some(found) = names.elements.get(name) {
            return Some(*found);
        }
        names
            .dealias(name)
            .and_then(|qualified| names.elements.get(&qualified).copied())
    }

    pub(crate) fn find_entity_type_id(&self, name: &str) -> Option<EntityTypeId> {
        match self.lookup(name)? {
            NamedElement::Type(SchemaType::Entity(id)) => Some(id),
            _ => None,
        }
    }

    pub(crate) fn find_complex_type_id(&self, name: &str) -> Option<ComplexTypeId> {
        match self.lookup(name)? {
            NamedElement::Type(SchemaType::Complex(id)) => Some(id),
            _ => None,
        }
    }

    pub(crate) fn find_enum_type_id(&self, name: &str) -> Option<EnumTypeId> {
        match self.lookup(name)? {
            NamedElement::Type(SchemaType::Enum(id)) => Some(id),
            _ => None,
        }
    }

    pub(crate) fn find_structured_type_id(&self, name: &str) -> Option<StructuredTypeId> {
        match self.lookup(name)? {
            NamedElement::Type(SchemaType::Entity(id)) => Some(StructuredTypeId::Entity(id)),
            NamedElement::Type(SchemaType::Complex(id)) => Some(StructuredTypeId::Complex(id)),
            _ => None,
        }
    }

    pub(crate) fn find_association_id(&self, name: &str) -> Option<AssociationId> {
        match self.lookup(name)? {
            NamedElement::Association(id) => Some(id),
            _ => None,
        }
    }

    /// Any schema type (entity, complex or enum) by qualified name.
    pub fn find_type(&self, name: &str) -> Option<SchemaType> {
        match self.lookup(name)? {
            NamedElement::Type(ty) => Some(ty),
            _ => None,
        }
    }

    pub fn find_entity_type(&self, name: &str) -> Option<EntityType<'_>> {
        self.find_entity_type_id(name)
            .map(|id| EntityType::new(self, id))
    }

    pub fn find_complex_type(&self, name: &str) -> Option<ComplexType<'_>> {
        self.find_complex_type_id(name)
            .map(|id| ComplexType::new(self, id))
    }

    pub fn find_enum_type(&self, name: &str) -> Option<EnumType<'_>> {
        self.find_enum_type_id(name).map(|id| EnumType::new(self, id))
    }

    pub fn find_association(&self, name: &str) -> Option<Association<'_>> {
        self.find_association_id(name)
            .map(|id| Association::new(self, id))
    }

    pub fn find_value_term(&self, name: &str) -> Option<ValueTerm<'_>> {
        match self.lookup(name)? {
            NamedElement::ValueTerm(id) => Some(ValueTerm::new(self, id)),
            _ => None,
        }
    }

    /// By qualified name, or by simple name when the container is referenced
    /// from a `Container/Set` path.
    pub fn find_entity_container(&self, name: &str) -> Option<EntityContainer<'_>> {
        if let Some(NamedElement::EntityContainer(id)) = self.lookup(name) {
            return Some(EntityContainer::new(self, id));
        }
        self.entity_containers
            .iter()
            .position(|data| data.node.name == name)
            .map(|i| EntityContainer::new(self, EntityContainerId::from_index(i)))
    }

    /// All overloads declared under `name`.
    pub fn find_functions(&self, name: &str) -> Vec<Function<'_>> {
        let names = self.names();
        let ids = names.functions.get(name).or_else(|| {
            names
                .dealias(name)
                .and_then(|qualified| names.functions.get(&qualified))
        });
        ids.map(|ids| ids.iter().map(|&id| Function::new(self, id)).collect())
            .unwrap_or_default()
    }

    /// `AlreadyDefined` error for a declaration shadowed by an earlier one.
    pub(crate) fn duplicate_errors(&self, key: ElementKey) -> Vec<EdmError> {
        self.names().duplicates.get(&key).cloned().into_iter().collect()
    }

    // ========================================================================
    // DERIVED TYPES
    // ========================================================================

    fn derived_types(&self) -> Arc<FxHashMap<EntityTypeId, Vec<EntityTypeId>>> {
        self.derived_types.get_value(
            || {
                let mut derived: FxHashMap<EntityTypeId, Vec<EntityTypeId>> = FxHashMap::default();
                for i in 0..self.entity_types.len() {
                    let id = EntityTypeId::from_index(i);
                    if let Some(Resolution::Resolved(base)) = EntityType::new(self, id).base_type() {
                        derived.entry(base.id()).or_default().push(id);
                    }
                }
                Arc::new(derived)
            },
            || Arc::new(FxHashMap::default()),
        )
    }

    pub fn find_direct_derived_types(&self, id: EntityTypeId) -> Vec<EntityTypeId> {
        self.derived_types().get(&id).cloned().unwrap_or_default()
    }

    /// Every type deriving from `id`, transitively, breadth first. Does not
    /// include `id` itself.
    pub fn find_all_derived_entity_types(&self, id: EntityTypeId) -> Vec<EntityTypeId> {
        let derived = self.derived_types();
        let mut seen = FxHashSet::default();
        seen.insert(id);
        let mut result = Vec::new();
        let mut cursor = 0;
        let mut frontier = vec![id];
        while cursor < frontier.len() {
            let current = frontier[cursor];
            cursor += 1;
            for &child in derived.get(&current).map(Vec::as_slice).unwrap_or_default() {
                if seen.insert(child) {
                    result.push(child);
                    frontier.push(child);
                }
            }
        }
        result
    }

    // ========================================================================
    // ELEMENT STATE
    // ========================================================================

    /// Shared state of an eagerly registered element.
    pub(crate) fn core(&self, key: ElementKey) -> Option<&ElementCore> {
        Some(match key {
            ElementKey::Schema(id) => &self.schemas[id.index()].core,
            ElementKey::EntityType(id) => &self.entity_types[id.index()].core,
            ElementKey::ComplexType(id) => &self.complex_types[id.index()].core,
            ElementKey::EnumType(id) => &self.enum_types[id.index()].core,
            ElementKey::EnumMember(id) => &self.enum_members[id.index()].core,
            ElementKey::Property(id) => &self.properties[id.index()].core,
            ElementKey::NavigationProperty(id) => &self.navigation_properties[id.index()].core,
            ElementKey::Association(id) => &self.associations[id.index()].core,
            ElementKey::AssociationEnd(id) => {
                &self.associations[id.association.index()].ends[id.end.index()].core
            }
            ElementKey::Function(id) => &self.functions[id.index()].core,
            ElementKey::Parameter(id) => &self.parameters[id.index()].core,
            ElementKey::ValueTerm(id) => &self.value_terms[id.index()].core,
            ElementKey::EntityContainer(id) => &self.entity_containers[id.index()].core,
            ElementKey::EntitySet(id) => &self.entity_sets[id.index()].core,
            ElementKey::AssociationSet(id) => &self.association_sets[id.index()].core,
            ElementKey::AssociationSetEnd(id) => {
                &self.association_sets[id.association_set.index()].ends[id.end.index()].core
            }
            ElementKey::FunctionImport(id) => &self.function_imports[id.index()].core,
            ElementKey::RowType(id) => &self.row_types[id.index()].core,
            ElementKey::Annotation(_) | ElementKey::Expression(_) | ElementKey::PropertyValue(_) => {
                return None;
            }
        })
    }

    /// Syntax metadata of elements whose node can carry annotations.
    fn meta(&self, key: ElementKey) -> Option<&CsdlMeta> {
        Some(match key {
            ElementKey::Schema(id) => &self.schemas[id.index()].node.meta,
            ElementKey::EntityType(id) => &self.entity_types[id.index()].node.meta,
            ElementKey::ComplexType(id) => &self.complex_types[id.index()].node.meta,
            ElementKey::EnumType(id) => &self.enum_types[id.index()].node.meta,
            ElementKey::EnumMember(id) => &self.enum_members[id.index()].node.meta,
            ElementKey::Property(id) => &self.properties[id.index()].node.meta,
            ElementKey::NavigationProperty(id) => &self.navigation_properties[id.index()].node.meta,
            ElementKey::Association(id) => &self.associations[id.index()].node.meta,
            ElementKey::AssociationEnd(id) => {
                &self.associations[id.association.index()].ends[id.end.index()]
                    .node
                    .meta
            }
            ElementKey::Function(id) => &self.functions[id.index()].node.meta,
            ElementKey::Parameter(id) => &self.parameters[id.index()].node.meta,
            ElementKey::ValueTerm(id) => &self.value_terms[id.index()].node.meta,
            ElementKey::EntityContainer(id) => &self.entity_containers[id.index()].node.meta,
            ElementKey::EntitySet(id) => &self.entity_sets[id.index()].node.meta,
            ElementKey::AssociationSet(id) => &self.association_sets[id.index()].node.meta,
            ElementKey::AssociationSetEnd(id) => {
                let end = &self.association_sets[id.association_set.index()].ends[id.end.index()];
                return end.node.as_deref().map(|node| &node.meta);
            }
            ElementKey::FunctionImport(id) => &self.function_imports[id.index()].node.meta,
            ElementKey::RowType(_)
            | ElementKey::Annotation(_)
            | ElementKey::Expression(_)
            | ElementKey::PropertyValue(_) => return None,
        })
    }

    /// Never fails: elements without a source location get a synthetic one.
    pub(crate) fn location_of(&self, key: ElementKey) -> Location {
        if let Some(core) = self.core(key) {
            return core.location();
        }
        let location = match key {
            ElementKey::Annotation(id) => self.annotations.get(id.index()).location.clone(),
            ElementKey::Expression(id) => self.expressions.get(id.index()).node.location.clone(),
            ElementKey::PropertyValue(id) => {
                self.property_values.get(id.index()).node.location.clone()
            }
            _ => None,
        };
        location.unwrap_or_else(|| Location::object(key.to_string()))
    }

    /// `None` when the declaration has none; the list is only allocated for
    /// nodes that declare direct annotations.
    pub(crate) fn direct_value_annotations(
        &self,
        key: ElementKey,
    ) -> Option<Arc<[DirectValueAnnotation]>> {
        let core = self.core(key)?;
        let meta = self.meta(key)?;
        core.direct_annotations.get_value(
            || {
                (!meta.direct_annotations.is_empty())
                    .then(|| meta.direct_annotations.iter().map(Into::into).collect())
            },
            || None,
        )
    }

    // ========================================================================
    // VOCABULARY ANNOTATIONS
    // ========================================================================

    /// Entity type that path expressions inside annotations of `key` are
    /// resolved against.
    pub(crate) fn binding_context(&self, key: ElementKey) -> Option<EntityTypeId> {
        match key {
            ElementKey::EntityType(id) => Some(id),
            ElementKey::Property(id) => match self.properties[id.index()].declaring_type {
                DeclaringType::Entity(ty) => Some(ty),
                DeclaringType::Complex(_) | DeclaringType::Row(_) => None,
            },
            ElementKey::NavigationProperty(id) => {
                Some(self.navigation_properties[id.index()].declaring_type)
            }
            ElementKey::EntitySet(id) => EntitySet::new(self, id)
                .element_type()
                .resolved()
                .map(|ty| ty.id()),
            _ => None,
        }
    }

    /// Inline annotations of `target`, wrapped once and bound to it.
    ///
    /// `binding_context` is the entity type path expressions resolve against;
    /// it only matters on the first call for a given target.
    pub fn wrap_inline_vocabulary_annotations(
        &self,
        target: ElementKey,
        binding_context: Option<EntityTypeId>,
    ) -> Vec<VocabularyAnnotation<'_>> {
        self.inline_annotation_ids_with(target, || binding_context)
            .iter()
            .map(|&id| VocabularyAnnotation::new(self, id))
            .collect()
    }

    pub(crate) fn inline_annotation_ids(&self, key: ElementKey) -> Arc<[AnnotationId]> {
        self.inline_annotation_ids_with(key, || self.binding_context(key))
    }

    fn inline_annotation_ids_with(
        &self,
        key: ElementKey,
        binding_context: impl FnOnce() -> Option<EntityTypeId>,
    ) -> Arc<[AnnotationId]> {
        let (Some(core), Some(meta)) = (self.core(key), self.meta(key)) else {
            return Arc::from(Vec::new());
        };
        core.inline_annotations.get_value(
            || {
                if meta.vocabulary_annotations.is_empty() {
                    return Arc::from(Vec::new());
                }
                let origin = AnnotationOrigin {
                    target: Resolution::Resolved(key),
                    schema: core.schema,
                    binding_context: binding_context(),
                    qualifier: None,
                };
                allocate_annotations(self, &meta.vocabulary_annotations, origin)
            },
            || Arc::from(Vec::new()),
        )
    }

    fn out_of_line_annotations(&self) -> Arc<OutOfLineAnnotations> {
        self.out_of_line.get_value(
            || Arc::new(self.build_out_of_line_annotations()),
            || Arc::new(OutOfLineAnnotations::default()),
        )
    }

    fn build_out_of_line_annotations(&self) -> OutOfLineAnnotations {
        let mut index = OutOfLineAnnotations::default();
        for (i, schema) in self.schemas.iter().enumerate() {
            for block in &schema.node.annotation_blocks {
                let location = block
                    .location
                    .clone()
                    .unwrap_or_else(|| schema.core.location());
                let target = self.resolve_annotation_target(&block.target, location);
                let origin = AnnotationOrigin {
                    binding_context: target.get().and_then(|&key| self.binding_context(key)),
                    target: target.clone(),
                    schema: SchemaId::from_index(i),
                    qualifier: block.qualifier.clone(),
                };
                let ids = allocate_annotations(self, &block.annotations, origin);
                if let Some(&key) = target.get() {
                    index.by_target.entry(key).or_default().extend(ids.iter().copied());
                }
            }
        }
        index
    }

    /// Resolve an `Annotations` block target such as `Ns.Type/Property` or
    /// `Ns.Container/Set`.
    fn resolve_annotation_target(&self, path: &str, location: Location) -> Resolution<ElementKey> {
        let (head, member) = match path.split_once(crate::base::constants::PATH_SEPARATOR) {
            Some((head, member)) => (head, Some(member)),
            None => (path, None),
        };
        let found = match (self.lookup(head), member) {
            (Some(element), None) => Some(element.key()),
            (Some(NamedElement::Type(SchemaType::Entity(id))), Some(member)) => {
                let ty = EntityType::new(self, id);
                ty.find_property(member)
                    .map(|p| ElementKey::Property(p.id()))
                    .or_else(|| {
                        ty.find_navigation_property(member)
                            .map(|p| ElementKey::NavigationProperty(p.id()))
                    })
            }
            (Some(NamedElement::Type(SchemaType::Complex(id))), Some(member)) => {
                ComplexType::new(self, id)
                    .find_property(member)
                    .map(|p| ElementKey::Property(p.id()))
            }
            (Some(NamedElement::Type(SchemaType::Enum(id))), Some(member)) => EnumType::new(self, id)
                .find_member(member)
                .map(|m| ElementKey::EnumMember(m.id())),
            (Some(NamedElement::EntityContainer(id)), Some(member)) => {
                let container = EntityContainer::new(self, id);
                container
                    .find_entity_set(member)
                    .map(|s| ElementKey::EntitySet(s.id()))
                    .or_else(|| {
                        container
                            .find_association_set(member)
                            .map(|s| ElementKey::AssociationSet(s.id()))
                    })
                    .or_else(|| {
                        container
                            .find_function_import(member)
                            .map(|f| ElementKey::FunctionImport(f.id()))
                    })
            }
            (None, None) => self
                .find_functions(head)
                .first()
                .map(|f| ElementKey::Function(f.id())),
            _ => None,
        };
        match found {
            Some(key) => Resolution::Resolved(key),
            None => {
                tracing::debug!("[RESOLVE] annotation target '{}' not found", path);
                Resolution::Unresolved(Unresolved::new(
                    UnresolvedKind::AnnotationTarget,
                    path,
                    location,
                    EdmErrorCode::BadUnresolvedTarget,
                    format!("cannot find annotation target '{}'", path),
                ))
            }
        }
    }

    /// Inline annotations of `target` plus out-of-line annotations naming
    /// it.
    pub fn find_vocabulary_annotations(&self, target: ElementKey) -> Vec<VocabularyAnnotation<'_>> {
        let inline = self.inline_annotation_ids(target);
        let out_of_line = self.out_of_line_annotations();
        inline
            .iter()
            .chain(out_of_line.by_target.get(&target).into_iter().flatten())
            .map(|&id| VocabularyAnnotation::new(self, id))
            .collect()
    }

    /// Every vocabulary annotation in the model, allocating any not yet
    /// materialized.
    pub fn all_vocabulary_annotations(&self) -> Vec<VocabularyAnnotation<'_>> {
        self.materialize_annotations();
        (0..self.annotations.len())
            .map(|i| VocabularyAnnotation::new(self, AnnotationId::from_index(i)))
            .collect()
    }

    fn materialize_annotations(&self) {
        for key in self.element_keys() {
            self.inline_annotation_ids(key);
        }
        self.out_of_line_annotations();
    }

    // ========================================================================
    // LABELED ELEMENTS
    // ========================================================================

    fn labels(&self) -> Arc<FxHashMap<SmolStr, Vec<ExpressionId>>> {
        self.labels.get_value(
            || {
                self.materialize_annotations();
                let mut labels: FxHashMap<SmolStr, Vec<ExpressionId>> = FxHashMap::default();
                for (i, expression) in self.expressions.snapshot().iter().enumerate() {
                    if let CsdlExpressionKind::Labeled { label, .. } = &expression.node.kind {
                        labels
                            .entry(label.clone())
                            .or_default()
                            .push(ExpressionId::from_index(i));
                    }
                }
                Arc::new(labels)
            },
            || Arc::new(FxHashMap::default()),
        )
    }

    /// A labeled expression by label, across all schemas. `None` when no
    /// expression carries the label; a placeholder when several do.
    pub fn find_labeled_element(&self, label: &str) -> Option<Resolution<Expression<'_>>> {
        let labels = self.labels();
        let candidates = labels.get(label)?;
        let location = self.location_of(ElementKey::Expression(*candidates.last()?));
        Some(
            pick_label(label, candidates, location)
                .map(|id| Expression::new(self, id)),
        )
    }

    /// Resolve a label from inside `schema`: labels declared in the same
    /// schema win over labels from other schemas.
    pub(crate) fn resolve_label(
        &self,
        label: &str,
        schema: SchemaId,
        location: Location,
    ) -> Resolution<ExpressionId> {
        let labels = self.labels();
        let all = labels.get(label).map(Vec::as_slice).unwrap_or_default();
        let local: Vec<_> = all
            .iter()
            .copied()
            .filter(|&id| self.expressions.get(id.index()).schema == schema)
            .collect();
        let candidates: &[ExpressionId] = if local.is_empty() { all } else { &local };
        if candidates.is_empty() {
            tracing::debug!("[RESOLVE] label '{}' not found", label);
            return Resolution::Unresolved(Unresolved::new(
                UnresolvedKind::LabeledElement,
                label,
                location,
                EdmErrorCode::BadUnresolvedLabeledElement,
                format!("cannot find labeled element '{}'", label),
            ));
        }
        pick_label(label, candidates, location)
    }

    /// Labeled expressions in the same schema sharing `label`.
    pub(crate) fn label_count_in_schema(&self, label: &str, schema: SchemaId) -> usize {
        self.labels()
            .get(label)
            .map(|ids| {
                ids.iter()
                    .filter(|id| self.expressions.get(id.index()).schema == schema)
                    .count()
            })
            .unwrap_or_default()
    }

    // ========================================================================
    // ASSOCIATION SET SIDE CHANNEL
    // ========================================================================

    /// Association set and annotations recorded for navigating `property`
    /// from `set`. Runs navigation-target inference for `set` first.
    pub fn association_set_mapping(
        &self,
        set: EntitySetId,
        property: NavigationPropertyId,
    ) -> Option<AssociationSetMapping> {
        EntitySet::new(self, set).navigation_targets();
        self.association_set_mappings
            .lock()
            .get(&(set, property))
            .cloned()
    }

    /// Record a mapping. Returns false, leaving the existing entry, when the
    /// pair already has one.
    pub fn set_association_set_mapping(
        &self,
        set: EntitySetId,
        property: NavigationPropertyId,
        mapping: AssociationSetMapping,
    ) -> bool {
        match self.association_set_mappings.lock().entry((set, property)) {
            std::collections::hash_map::Entry::Occupied(_) => false,
            std::collections::hash_map::Entry::Vacant(slot) => {
                tracing::trace!(
                    "[NAV] mapped {} via association set '{}'",
                    ElementKey::NavigationProperty(property),
                    mapping.association_set_name
                );
                slot.insert(mapping);
                true
            }
        }
    }

    // ========================================================================
    // ENUMERATION
    // ========================================================================

    /// Every eagerly registered element, grouped by kind in arena order.
    pub fn element_keys(&self) -> Vec<ElementKey> {
        use super::ids::{
            AssociationEndId, AssociationSetEndId, AssociationSetId, End, EnumMemberId,
            FunctionImportId, ParameterId, PropertyId, RowTypeId,
        };

        fn ids<T>(len: usize, make: impl Fn(usize) -> T) -> impl Iterator<Item = T> {
            (0..len).map(make)
        }

        let mut keys = Vec::new();
        keys.extend(ids(self.schemas.len(), |i| ElementKey::Schema(SchemaId::from_index(i))));
        keys.extend(ids(self.entity_types.len(), |i| {
            ElementKey::EntityType(EntityTypeId::from_index(i))
        }));
        keys.extend(ids(self.complex_types.len(), |i| {
            ElementKey::ComplexType(ComplexTypeId::from_index(i))
        }));
        keys.extend(ids(self.row_types.len(), |i| {
            ElementKey::RowType(RowTypeId::from_index(i))
        }));
        keys.extend(ids(self.properties.len(), |i| {
            ElementKey::Property(PropertyId::from_index(i))
        }));
        keys.extend(ids(self.enum_types.len(), |i| {
            ElementKey::EnumType(EnumTypeId::from_index(i))
        }));
        keys.extend(ids(self.enum_members.len(), |i| {
            ElementKey::EnumMember(EnumMemberId::from_index(i))
        }));
        keys.extend(ids(self.navigation_properties.len(), |i| {
            ElementKey::NavigationProperty(NavigationPropertyId::from_index(i))
        }));
        for i in 0..self.associations.len() {
            let association = AssociationId::from_index(i);
            keys.push(ElementKey::Association(association));
            keys.extend(
                End::BOTH.map(|end| ElementKey::AssociationEnd(AssociationEndId { association, end })),
            );
        }
        keys.extend(ids(self.functions.len(), |i| {
            ElementKey::Function(FunctionId::from_index(i))
        }));
        keys.extend(ids(self.parameters.len(), |i| {
            ElementKey::Parameter(ParameterId::from_index(i))
        }));
        keys.extend(ids(self.value_terms.len(), |i| {
            ElementKey::ValueTerm(ValueTermId::from_index(i))
        }));
        keys.extend(ids(self.entity_containers.len(), |i| {
            ElementKey::EntityContainer(EntityContainerId::from_index(i))
        }));
        keys.extend(ids(self.entity_sets.len(), |i| {
            ElementKey::EntitySet(EntitySetId::from_index(i))
        }));
        for i in 0..self.association_sets.len() {
            let association_set = AssociationSetId::from_index(i);
            keys.push(ElementKey::AssociationSet(association_set));
            keys.extend(End::BOTH.map(|end| {
                ElementKey::AssociationSetEnd(AssociationSetEndId {
                    association_set,
                    end,
                })
            }));
        }
        keys.extend(ids(self.function_imports.len(), |i| {
            ElementKey::FunctionImport(FunctionImportId::from_index(i))
        }));
        keys
    }

    /// Collect the errors of every element in the model.
    pub fn validate(&self) -> Vec<EdmError> {
        super::validate::validate(self)
    }
}

impl fmt::Debug for Model {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Model")
            .field("schemas", &self.schemas.len())
            .field("entity_types", &self.entity_types.len())
            .field("associations", &self.associations.len())
            .field("entity_containers", &self.entity_containers.len())
            .field("annotations", &self.annotations.len())
            .finish_non_exhaustive()
    }
}

fn pick_label(label: &str, candidates: &[ExpressionId], location: Location) -> Resolution<ExpressionId> {
    match candidates {
        [single] => Resolution::Resolved(*single),
        _ => Resolution::Unresolved(Unresolved::new(
            UnresolvedKind::LabeledElement,
            label,
            location,
            EdmErrorCode::BadAmbiguousElementBinding,
            format!("label '{}' is declared {} times", label, candidates.len()),
        )),
    }
}

// ============================================================================
// INDEXES
// ============================================================================

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum NamedElement {
    Type(SchemaType),
    Association(AssociationId),
    ValueTerm(ValueTermId),
    EntityContainer(EntityContainerId),
}

impl NamedElement {
    fn key(self) -> ElementKey {
        match self {
            Self::Type(SchemaType::Entity(id)) => ElementKey::EntityType(id),
            Self::Type(SchemaType::Complex(id)) => ElementKey::ComplexType(id),
            Self::Type(SchemaType::Enum(id)) => ElementKey::EnumType(id),
            Self::Association(id) => ElementKey::Association(id),
            Self::ValueTerm(id) => ElementKey::ValueTerm(id),
            Self::EntityContainer(id) => ElementKey::EntityContainer(id),
        }
    }
}

#[derive(Debug, Default)]
struct NameIndex {
    /// First declaration of each qualified name.
    elements: IndexMap<String, NamedElement>,
    functions: IndexMap<String, Vec<FunctionId>>,
    /// Alias → namespace, from schema aliases and `Using` declarations.
    aliases: FxHashMap<SmolStr, SmolStr>,
    duplicates: FxHashMap<ElementKey, EdmError>,
}

impl NameIndex {
    fn declare(&mut self, name: String, element: NamedElement, core: &ElementCore) {
        match self.elements.entry(name) {
            Entry::Occupied(existing) => {
                tracing::debug!("[RESOLVE] '{}' declared more than once", existing.key());
                let error = EdmError::new(
                    core.location(),
                    EdmErrorCode::AlreadyDefined,
                    format!("'{}' is already defined", existing.key()),
                );
                self.duplicates.insert(element.key(), error);
            }
            Entry::Vacant(slot) => {
                slot.insert(element);
            }
        }
    }

    /// Replace an alias prefix with the namespace it stands for.
    fn dealias(&self, name: &str) -> Option<String> {
        let (prefix, local) = split_qualified_name(name)?;
        self.aliases
            .get(prefix)
            .map(|namespace| qualify(namespace, local))
    }
}

#[derive(Debug, Default)]
struct OutOfLineAnnotations {
    by_target: FxHashMap<ElementKey, Vec<AnnotationId>>,
}

// ============================================================================
// SCHEMA VIEW
// ============================================================================

#[derive(Clone, Copy)]
pub struct Schema<'m> {
    model: &'m Model,
    id: SchemaId,
}

super::structured::view_identity!(Schema, SchemaId);

impl<'m> Schema<'m> {
    fn data(&self) -> &'m SchemaData {
        &self.model.schemas[self.id.index()]
    }

    pub fn namespace(&self) -> &'m str {
        &self.data().node.namespace
    }

    pub fn alias(&self) -> Option<&'m str> {
        self.data().node.alias.as_deref()
    }

    pub fn entity_types(&self) -> Vec<EntityType<'m>> {
        let model = self.model;
        self.data()
            .entity_types
            .iter()
            .map(|&id| EntityType::new(model, id))
            .collect()
    }

    pub fn complex_types(&self) -> Vec<ComplexType<'m>> {
        let model = self.model;
        self.data()
            .complex_types
            .iter()
            .map(|&id| ComplexType::new(model, id))
            .collect()
    }

    pub fn enum_types(&self) -> Vec<EnumType<'m>> {
        let model = self.model;
        self.data()
            .enum_types
            .iter()
            .map(|&id| EnumType::new(model, id))
            .collect()
    }

    pub fn associations(&self) -> Vec<Association<'m>> {
        let model = self.model;
        self.data()
            .associations
            .iter()
            .map(|&id| Association::new(model, id))
            .collect()
    }

    pub fn functions(&self) -> Vec<Function<'m>> {
        let model = self.model;
        self.data()
            .functions
            .iter()
            .map(|&id| Function::new(model, id))
            .collect()
    }

    pub fn value_terms(&self) -> Vec<ValueTerm<'m>> {
        let model = self.model;
        self.data()
            .value_terms
            .iter()
            .map(|&id| ValueTerm::new(model, id))
            .collect()
    }

    pub fn entity_containers(&self) -> Vec<EntityContainer<'m>> {
        let model = self.model;
        self.data()
            .entity_containers
            .iter()
            .map(|&id| EntityContainer::new(model, id))
            .collect()
    }
}

impl<'m> SemanticElement<'m> for Schema<'m> {
    fn model(&self) -> &'m Model {
        self.model
    }

    fn key(&self) -> ElementKey {
        ElementKey::Schema(self.id)
    }

    fn errors(&self) -> Vec<EdmError> {
        Vec::new()
    }
}

impl fmt::Debug for Schema<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Schema({})", self.namespace())
    }
}
