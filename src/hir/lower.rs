//! Model construction: register every declaration of a set of schemas.
//!
//! Lowering only allocates arena entries and records parent/child ids. No
//! name is looked up and no cache cell is filled, so construction cannot
//! fail and its cost is linear in the size of the syntax trees.

use std::sync::Arc;

use super::annotations::ValueTermData;
use super::cache::Cache;
use super::containers::{
    AssociationSetData, AssociationSetEndData, EntityContainerData, EntitySetData,
    FunctionImportData,
};
use super::element::ElementCore;
use super::functions::{FunctionData, ParameterData, ParameterOwner};
use super::ids::{
    AssociationEndId, AssociationId, AssociationSetEndId, AssociationSetId, ComplexTypeId,
    ElementKey, End, EntityContainerId, EntitySetId, EntityTypeId, EnumMemberId, EnumTypeId,
    FunctionId, FunctionImportId, NavigationPropertyId, ParameterId, PropertyId, RowTypeId,
    SchemaId, ValueTermId,
};
use super::model::{Model, SchemaData};
use super::relationships::{AssociationData, AssociationEndData, NavigationPropertyData};
use super::structured::{
    ComplexTypeData, EntityTypeData, EnumMemberData, EnumTypeData, PropertyData, RowTypeData,
};
use super::types::DeclaringType;
use crate::base::Location;
use crate::syntax::{
    CsdlAssociation, CsdlComplexType, CsdlEntityContainer, CsdlEntityType, CsdlEnumType,
    CsdlFunction, CsdlParameter, CsdlProperty, CsdlSchema, CsdlTypeKind, CsdlTypeReference,
    CsdlValueTerm,
};

pub(super) fn lower(schemas: impl IntoIterator<Item = Arc<CsdlSchema>>) -> Model {
    let mut lowering = Lowering {
        model: Model::default(),
    };
    for schema in schemas {
        lowering.schema(schema);
    }
    let model = lowering.model;
    tracing::debug!(
        "[RESOLVE] registered {} schemas: {} entity types, {} associations, {} containers",
        model.schemas.len(),
        model.entity_types.len(),
        model.associations.len(),
        model.entity_containers.len()
    );
    model
}

struct Lowering {
    model: Model,
}

impl Lowering {
    fn schema(&mut self, node: Arc<CsdlSchema>) {
        let id = SchemaId::from_index(self.model.schemas.len());
        let mut data = SchemaData {
            core: ElementCore::new(ElementKey::Schema(id), id, node.meta.location.as_ref()),
            node: Arc::clone(&node),
            entity_types: Vec::new(),
            complex_types: Vec::new(),
            enum_types: Vec::new(),
            associations: Vec::new(),
            functions: Vec::new(),
            value_terms: Vec::new(),
            entity_containers: Vec::new(),
        };
        data.entity_types = node
            .entity_types
            .iter()
            .map(|ty| self.entity_type(id, ty))
            .collect();
        data.complex_types = node
            .complex_types
            .iter()
            .map(|ty| self.complex_type(id, ty))
            .collect();
        data.enum_types = node
            .enum_types
            .iter()
            .map(|ty| self.enum_type(id, ty))
            .collect();
        data.associations = node
            .associations
            .iter()
            .map(|association| self.association(id, association))
            .collect();
        data.functions = node
            .functions
            .iter()
            .map(|function| self.function(id, function))
            .collect();
        data.value_terms = node
            .value_terms
            .iter()
            .map(|term| self.value_term(id, term))
            .collect();
        data.entity_containers = node
            .entity_containers
            .iter()
            .map(|container| self.entity_container(id, container))
            .collect();
        self.model.schemas.push(data);
    }

    fn entity_type(&mut self, schema: SchemaId, node: &Arc<CsdlEntityType>) -> EntityTypeId {
        let id = EntityTypeId::from_index(self.model.entity_types.len());
        let declaring = DeclaringType::Entity(id);
        let location = node.meta.location.as_ref();
        let properties = node
            .properties
            .iter()
            .map(|property| self.property(schema, declaring, property, location))
            .collect();
        let navigation_properties = node
            .navigation_properties
            .iter()
            .map(|property| {
                let nav = NavigationPropertyId::from_index(self.model.navigation_properties.len());
                self.model
                    .navigation_properties
                    .push(NavigationPropertyData {
                        core: ElementCore::new(
                            ElementKey::NavigationProperty(nav),
                            schema,
                            property.meta.location.as_ref().or(location),
                        ),
                        node: Arc::clone(property),
                        declaring_type: id,
                        association: Cache::new(),
                        ends: Cache::new(),
                        partner: Cache::new(),
                    });
                nav
            })
            .collect();
        self.model.entity_types.push(EntityTypeData {
            core: ElementCore::new(ElementKey::EntityType(id), schema, location),
            node: Arc::clone(node),
            properties,
            navigation_properties,
            base_type: Cache::new(),
            declared_key: Cache::new(),
        });
        id
    }

    fn complex_type(&mut self, schema: SchemaId, node: &Arc<CsdlComplexType>) -> ComplexTypeId {
        let id = ComplexTypeId::from_index(self.model.complex_types.len());
        let location = node.meta.location.as_ref();
        let properties = node
            .properties
            .iter()
            .map(|property| self.property(schema, DeclaringType::Complex(id), property, location))
            .collect();
        self.model.complex_types.push(ComplexTypeData {
            core: ElementCore::new(ElementKey::ComplexType(id), schema, location),
            node: Arc::clone(node),
            properties,
            base_type: Cache::new(),
        });
        id
    }

    fn enum_type(&mut self, schema: SchemaId, node: &Arc<CsdlEnumType>) -> EnumTypeId {
        let id = EnumTypeId::from_index(self.model.enum_types.len());
        let location = node.meta.location.as_ref();
        let members = node
            .members
            .iter()
            .enumerate()
            .map(|(position, member)| {
                let member_id = EnumMemberId::from_index(self.model.enum_members.len());
                self.model.enum_members.push(EnumMemberData {
                    core: ElementCore::new(
                        ElementKey::EnumMember(member_id),
                        schema,
                        member.meta.location.as_ref().or(location),
                    ),
                    node: Arc::clone(member),
                    enum_type: id,
                    position,
                });
                member_id
            })
            .collect();
        self.model.enum_types.push(EnumTypeData {
            core: ElementCore::new(ElementKey::EnumType(id), schema, location),
            node: Arc::clone(node),
            members,
            underlying_type: Cache::new(),
            member_values: Cache::new(),
        });
        id
    }

    /// Register a property and the row types nested in its type reference.
    fn property(
        &mut self,
        schema: SchemaId,
        declaring_type: DeclaringType,
        node: &Arc<CsdlProperty>,
        owner: Option<&Location>,
    ) -> PropertyId {
        let id = PropertyId::from_index(self.model.properties.len());
        let location = node.meta.location.as_ref().or(owner).cloned();
        // Reserve the id before nested rows register their own properties.
        self.model.properties.push(PropertyData {
            core: ElementCore::new(ElementKey::Property(id), schema, location.as_ref()),
            node: Arc::clone(node),
            declaring_type,
            rows: Vec::new(),
            type_ref: Cache::new(),
        });
        let rows = self.rows(schema, &node.type_ref, location.as_ref());
        self.model.properties[id.index()].rows = rows;
        id
    }

    /// Row types at the top level of `type_ref`, in pre-order. Rows nested
    /// inside a row's own properties belong to those properties.
    fn rows(
        &mut self,
        schema: SchemaId,
        type_ref: &CsdlTypeReference,
        owner: Option<&Location>,
    ) -> Vec<RowTypeId> {
        let mut rows = Vec::new();
        self.collect_rows(schema, type_ref, owner, &mut rows);
        rows
    }

    fn collect_rows(
        &mut self,
        schema: SchemaId,
        type_ref: &CsdlTypeReference,
        owner: Option<&Location>,
        rows: &mut Vec<RowTypeId>,
    ) {
        let location = type_ref.location.as_ref().or(owner);
        match &type_ref.kind {
            CsdlTypeKind::Collection(element) => self.collect_rows(schema, element, location, rows),
            CsdlTypeKind::Row(properties) => {
                let id = RowTypeId::from_index(self.model.row_types.len());
                self.model.row_types.push(RowTypeData {
                    core: ElementCore::new(ElementKey::RowType(id), schema, location),
                    properties: Vec::new(),
                });
                rows.push(id);
                let properties = properties
                    .iter()
                    .map(|property| self.property(schema, DeclaringType::Row(id), property, location))
                    .collect();
                self.model.row_types[id.index()].properties = properties;
            }
            CsdlTypeKind::Primitive(_)
            | CsdlTypeKind::Entity(_)
            | CsdlTypeKind::Complex(_)
            | CsdlTypeKind::Enum(_)
            | CsdlTypeKind::Named(_)
            | CsdlTypeKind::EntityReference(_) => {}
        }
    }

    fn association(&mut self, schema: SchemaId, node: &Arc<CsdlAssociation>) -> AssociationId {
        let id = AssociationId::from_index(self.model.associations.len());
        let location = node.meta.location.as_ref();
        let end = |end: End| {
            let end_node = match end {
                End::First => &node.end1,
                End::Second => &node.end2,
            };
            AssociationEndData {
                core: ElementCore::new(
                    ElementKey::AssociationEnd(AssociationEndId {
                        association: id,
                        end,
                    }),
                    schema,
                    end_node.meta.location.as_ref().or(location),
                ),
                node: Arc::clone(end_node),
                entity_type: Cache::new(),
            }
        };
        self.model.associations.push(AssociationData {
            core: ElementCore::new(ElementKey::Association(id), schema, location),
            node: Arc::clone(node),
            ends: End::BOTH.map(end),
            constraint: Cache::new(),
        });
        id
    }

    fn function(&mut self, schema: SchemaId, node: &Arc<CsdlFunction>) -> FunctionId {
        let id = FunctionId::from_index(self.model.functions.len());
        let location = node.meta.location.as_ref();
        let parameters = node
            .parameters
            .iter()
            .map(|parameter| self.parameter(schema, ParameterOwner::Function(id), parameter, location))
            .collect();
        let rows = match &node.return_type {
            Some(return_type) => self.rows(schema, return_type, location),
            None => Vec::new(),
        };
        self.model.functions.push(FunctionData {
            core: ElementCore::new(ElementKey::Function(id), schema, location),
            node: Arc::clone(node),
            parameters,
            rows,
            return_type: Cache::new(),
        });
        id
    }

    fn parameter(
        &mut self,
        schema: SchemaId,
        owner: ParameterOwner,
        node: &Arc<CsdlParameter>,
        owner_location: Option<&Location>,
    ) -> ParameterId {
        let location = node.meta.location.as_ref().or(owner_location);
        let rows = self.rows(schema, &node.type_ref, location);
        let id = ParameterId::from_index(self.model.parameters.len());
        self.model.parameters.push(ParameterData {
            core: ElementCore::new(ElementKey::Parameter(id), schema, location),
            node: Arc::clone(node),
            owner,
            rows,
            type_ref: Cache::new(),
        });
        id
    }

    fn value_term(&mut self, schema: SchemaId, node: &Arc<CsdlValueTerm>) -> ValueTermId {
        let location = node.meta.location.as_ref();
        let rows = self.rows(schema, &node.type_ref, location);
        let id = ValueTermId::from_index(self.model.value_terms.len());
        self.model.value_terms.push(ValueTermData {
            core: ElementCore::new(ElementKey::ValueTerm(id), schema, location),
            node: Arc::clone(node),
            rows,
            type_ref: Cache::new(),
        });
        id
    }

    fn entity_container(
        &mut self,
        schema: SchemaId,
        node: &Arc<CsdlEntityContainer>,
    ) -> EntityContainerId {
        let id = EntityContainerId::from_index(self.model.entity_containers.len());
        let location = node.meta.location.as_ref();

        let entity_sets = node
            .entity_sets
            .iter()
            .map(|set| {
                let set_id = EntitySetId::from_index(self.model.entity_sets.len());
                self.model.entity_sets.push(EntitySetData {
                    core: ElementCore::new(
                        ElementKey::EntitySet(set_id),
                        schema,
                        set.meta.location.as_ref().or(location),
                    ),
                    node: Arc::clone(set),
                    container: id,
                    element_type: Cache::new(),
                    navigation_targets: Cache::new(),
                });
                set_id
            })
            .collect();

        let association_sets = node
            .association_sets
            .iter()
            .map(|set| {
                let set_id = AssociationSetId::from_index(self.model.association_sets.len());
                let set_location = set.meta.location.as_ref().or(location);
                let end = |end: End| {
                    let end_node = match end {
                        End::First => set.end1.clone(),
                        End::Second => set.end2.clone(),
                    };
                    let end_location = end_node
                        .as_ref()
                        .and_then(|node| node.meta.location.as_ref())
                        .or(set_location);
                    AssociationSetEndData {
                        core: ElementCore::new(
                            ElementKey::AssociationSetEnd(AssociationSetEndId {
                                association_set: set_id,
                                end,
                            }),
                            schema,
                            end_location,
                        ),
                        node: end_node,
                        association_end: Cache::new(),
                        entity_set: Cache::new(),
                    }
                };
                self.model.association_sets.push(AssociationSetData {
                    core: ElementCore::new(ElementKey::AssociationSet(set_id), schema, set_location),
                    node: Arc::clone(set),
                    container: id,
                    association: Cache::new(),
                    ends: End::BOTH.map(end),
                });
                set_id
            })
            .collect();

        let function_imports = node
            .function_imports
            .iter()
            .map(|import| {
                let import_id = FunctionImportId::from_index(self.model.function_imports.len());
                let import_location = import.meta.location.as_ref().or(location);
                let parameters = import
                    .parameters
                    .iter()
                    .map(|parameter| {
                        self.parameter(
                            schema,
                            ParameterOwner::FunctionImport(import_id),
                            parameter,
                            import_location,
                        )
                    })
                    .collect();
                let rows = match &import.return_type {
                    Some(return_type) => self.rows(schema, return_type, import_location),
                    None => Vec::new(),
                };
                self.model.function_imports.push(FunctionImportData {
                    core: ElementCore::new(
                        ElementKey::FunctionImport(import_id),
                        schema,
                        import_location,
                    ),
                    node: Arc::clone(import),
                    container: id,
                    parameters,
                    rows,
                    return_type: Cache::new(),
                    entity_set: Cache::new(),
                });
                import_id
            })
            .collect();

        self.model.entity_containers.push(EntityContainerData {
            core: ElementCore::new(ElementKey::EntityContainer(id), schema, location),
            node: Arc::clone(node),
            entity_sets,
            association_sets,
            function_imports,
            extends: Cache::new(),
        });
        id
    }
}
