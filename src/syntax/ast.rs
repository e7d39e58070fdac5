//! Declaration nodes of a schema document.
//!
//! The tree is produced by a parser outside this crate and is read-only here.
//! Child declarations are `Arc`-shared so semantic elements can hold a
//! back-reference to exactly the node they wrap.
//!
//! The `new`/`with_*` constructors exist for parsers and tests; they do not
//! validate anything beyond what the types enforce.

use std::sync::Arc;

use smol_str::SmolStr;

use super::expr::CsdlVocabularyAnnotation;
use super::types::CsdlTypeReference;
use crate::base::Location;

// ============================================================================
// SHARED NODE DATA
// ============================================================================

/// A lightweight `namespace:name = value` annotation attached directly to a
/// declaration (an XML attribute or element outside the schema namespace).
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct CsdlDirectValueAnnotation {
    pub namespace: SmolStr,
    pub name: SmolStr,
    pub value: SmolStr,
    pub location: Option<Location>,
}

impl CsdlDirectValueAnnotation {
    pub fn new(namespace: &str, name: &str, value: &str) -> Self {
        Self {
            namespace: namespace.into(),
            name: name.into(),
            value: value.into(),
            location: None,
        }
    }
}

/// Data every declaration carries besides its own fields.
#[derive(Clone, Debug, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct CsdlMeta {
    pub location: Option<Location>,
    pub direct_annotations: Vec<CsdlDirectValueAnnotation>,
    pub vocabulary_annotations: Vec<Arc<CsdlVocabularyAnnotation>>,
}

/// Access to the shared node data, with builder helpers.
pub trait CsdlNode: Sized {
    fn meta(&self) -> &CsdlMeta;
    fn meta_mut(&mut self) -> &mut CsdlMeta;

    fn at(mut self, location: Location) -> Self {
        self.meta_mut().location = Some(location);
        self
    }

    fn with_direct_annotation(mut self, annotation: CsdlDirectValueAnnotation) -> Self {
        self.meta_mut().direct_annotations.push(annotation);
        self
    }

    fn with_annotation(mut self, annotation: CsdlVocabularyAnnotation) -> Self {
        self.meta_mut()
            .vocabulary_annotations
            .push(Arc::new(annotation));
        self
    }
}

macro_rules! csdl_node {
    ($($ty:ty),* $(,)?) => {
        $(
            impl CsdlNode for $ty {
                fn meta(&self) -> &CsdlMeta {
                    &self.meta
                }

                fn meta_mut(&mut self) -> &mut CsdlMeta {
                    &mut self.meta
                }
            }
        )*
    };
}

csdl_node!(
    CsdlSchema,
    CsdlEntityType,
    CsdlComplexType,
    CsdlEnumType,
    CsdlEnumMember,
    CsdlProperty,
    CsdlNavigationProperty,
    CsdlAssociation,
    CsdlAssociationEnd,
    CsdlFunction,
    CsdlParameter,
    CsdlValueTerm,
    CsdlEntityContainer,
    CsdlEntitySet,
    CsdlAssociationSet,
    CsdlAssociationSetEnd,
    CsdlFunctionImport,
);

// ============================================================================
// ENUMERATIONS
// ============================================================================

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Multiplicity {
    ZeroOrOne,
    #[default]
    One,
    Many,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum OnDeleteAction {
    #[default]
    None,
    Cascade,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum ConcurrencyMode {
    #[default]
    None,
    Fixed,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum ParameterMode {
    #[default]
    In,
    Out,
    InOut,
}

// ============================================================================
// SCHEMA
// ============================================================================

/// One schema document: a namespace and everything declared in it.
#[derive(Clone, Debug, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct CsdlSchema {
    pub namespace: SmolStr,
    pub alias: Option<SmolStr>,
    pub usings: Vec<CsdlUsing>,
    pub entity_types: Vec<Arc<CsdlEntityType>>,
    pub complex_types: Vec<Arc<CsdlComplexType>>,
    pub enum_types: Vec<Arc<CsdlEnumType>>,
    pub associations: Vec<Arc<CsdlAssociation>>,
    pub functions: Vec<Arc<CsdlFunction>>,
    pub value_terms: Vec<Arc<CsdlValueTerm>>,
    pub entity_containers: Vec<Arc<CsdlEntityContainer>>,
    pub annotation_blocks: Vec<Arc<CsdlAnnotationsBlock>>,
    pub meta: CsdlMeta,
}

/// `Using Namespace="..." Alias="..."`.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct CsdlUsing {
    pub namespace: SmolStr,
    pub alias: SmolStr,
}

impl CsdlSchema {
    pub fn new(namespace: &str) -> Self {
        Self {
            namespace: namespace.into(),
            ..Self::default()
        }
    }

    pub fn with_alias(mut self, alias: &str) -> Self {
        self.alias = Some(alias.into());
        self
    }

    pub fn with_using(mut self, namespace: &str, alias: &str) -> Self {
        self.usings.push(CsdlUsing {
            namespace: namespace.into(),
            alias: alias.into(),
        });
        self
    }

    pub fn with_entity_type(mut self, ty: CsdlEntityType) -> Self {
        self.entity_types.push(Arc::new(ty));
        self
    }

    pub fn with_complex_type(mut self, ty: CsdlComplexType) -> Self {
        self.complex_types.push(Arc::new(ty));
        self
    }

    pub fn with_enum_type(mut self, ty: CsdlEnumType) -> Self {
        self.enum_types.push(Arc::new(ty));
        self
    }

    pub fn with_association(mut self, association: CsdlAssociation) -> Self {
        self.associations.push(Arc::new(association));
        self
    }

    pub fn with_function(mut self, function: CsdlFunction) -> Self {
        self.functions.push(Arc::new(function));
        self
    }

    pub fn with_value_term(mut self, term: CsdlValueTerm) -> Self {
        self.value_terms.push(Arc::new(term));
        self
    }

    pub fn with_entity_container(mut self, container: CsdlEntityContainer) -> Self {
        self.entity_containers.push(Arc::new(container));
        self
    }

    pub fn with_annotations_block(mut self, block: CsdlAnnotationsBlock) -> Self {
        self.annotation_blocks.push(Arc::new(block));
        self
    }
}

// ============================================================================
// STRUCTURED TYPES
// ============================================================================

#[derive(Clone, Debug, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct CsdlEntityType {
    pub name: SmolStr,
    pub base_type: Option<SmolStr>,
    pub is_abstract: bool,
    pub is_open: bool,
    pub key: Option<Vec<SmolStr>>,
    pub properties: Vec<Arc<CsdlProperty>>,
    pub navigation_properties: Vec<Arc<CsdlNavigationProperty>>,
    pub meta: CsdlMeta,
}

impl CsdlEntityType {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    pub fn with_base_type(mut self, base: &str) -> Self {
        self.base_type = Some(base.into());
        self
    }

    pub fn with_key<'a>(mut self, names: impl IntoIterator<Item = &'a str>) -> Self {
        self.key = Some(names.into_iter().map(SmolStr::new).collect());
        self
    }

    pub fn abstract_type(mut self) -> Self {
        self.is_abstract = true;
        self
    }

    pub fn open_type(mut self) -> Self {
        self.is_open = true;
        self
    }

    pub fn with_property(mut self, property: CsdlProperty) -> Self {
        self.properties.push(Arc::new(property));
        self
    }

    pub fn with_navigation_property(mut self, property: CsdlNavigationProperty) -> Self {
        self.navigation_properties.push(Arc::new(property));
        self
    }
}

#[derive(Clone, Debug, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct CsdlComplexType {
    pub name: SmolStr,
    pub base_type: Option<SmolStr>,
    pub is_abstract: bool,
    pub properties: Vec<Arc<CsdlProperty>>,
    pub meta: CsdlMeta,
}

impl CsdlComplexType {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    pub fn with_base_type(mut self, base: &str) -> Self {
        self.base_type = Some(base.into());
        self
    }

    pub fn with_property(mut self, property: CsdlProperty) -> Self {
        self.properties.push(Arc::new(property));
        self
    }
}

#[derive(Clone, Debug, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct CsdlEnumType {
    pub name: SmolStr,
    pub underlying_type: Option<SmolStr>,
    pub is_flags: bool,
    pub members: Vec<Arc<CsdlEnumMember>>,
    pub meta: CsdlMeta,
}

impl CsdlEnumType {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    pub fn with_underlying_type(mut self, name: &str) -> Self {
        self.underlying_type = Some(name.into());
        self
    }

    pub fn flags(mut self) -> Self {
        self.is_flags = true;
        self
    }

    pub fn with_member(mut self, name: &str, value: Option<i64>) -> Self {
        self.members.push(Arc::new(CsdlEnumMember {
            name: name.into(),
            value,
            meta: CsdlMeta::default(),
        }));
        self
    }
}

#[derive(Clone, Debug, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct CsdlEnumMember {
    pub name: SmolStr,
    pub value: Option<i64>,
    pub meta: CsdlMeta,
}

#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct CsdlProperty {
    pub name: SmolStr,
    pub type_ref: CsdlTypeReference,
    pub default_value: Option<SmolStr>,
    pub concurrency_mode: ConcurrencyMode,
    pub meta: CsdlMeta,
}

impl CsdlProperty {
    pub fn new(name: &str, type_ref: CsdlTypeReference) -> Self {
        Self {
            name: name.into(),
            type_ref,
            default_value: None,
            concurrency_mode: ConcurrencyMode::None,
            meta: CsdlMeta::default(),
        }
    }

    pub fn with_default_value(mut self, value: &str) -> Self {
        self.default_value = Some(value.into());
        self
    }

    pub fn fixed_concurrency(mut self) -> Self {
        self.concurrency_mode = ConcurrencyMode::Fixed;
        self
    }
}

#[derive(Clone, Debug, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct CsdlNavigationProperty {
    pub name: SmolStr,
    /// Qualified name of the association traversed.
    pub relationship: SmolStr,
    pub from_role: SmolStr,
    pub to_role: SmolStr,
    pub contains_target: bool,
    pub meta: CsdlMeta,
}

impl CsdlNavigationProperty {
    pub fn new(name: &str, relationship: &str, from_role: &str, to_role: &str) -> Self {
        Self {
            name: name.into(),
            relationship: relationship.into(),
            from_role: from_role.into(),
            to_role: to_role.into(),
            ..Self::default()
        }
    }

    pub fn containment(mut self) -> Self {
        self.contains_target = true;
        self
    }
}

// ============================================================================
// ASSOCIATIONS
// ============================================================================

#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct CsdlAssociation {
    pub name: SmolStr,
    pub end1: Arc<CsdlAssociationEnd>,
    pub end2: Arc<CsdlAssociationEnd>,
    pub referential_constraint: Option<CsdlReferentialConstraint>,
    pub meta: CsdlMeta,
}

impl CsdlAssociation {
    pub fn new(name: &str, end1: CsdlAssociationEnd, end2: CsdlAssociationEnd) -> Self {
        Self {
            name: name.into(),
            end1: Arc::new(end1),
            end2: Arc::new(end2),
            referential_constraint: None,
            meta: CsdlMeta::default(),
        }
    }

    pub fn with_referential_constraint(mut self, constraint: CsdlReferentialConstraint) -> Self {
        self.referential_constraint = Some(constraint);
        self
    }
}

#[derive(Clone, Debug, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct CsdlAssociationEnd {
    pub role: SmolStr,
    /// Qualified name of the entity type playing this role.
    pub entity_type: SmolStr,
    pub multiplicity: Multiplicity,
    pub on_delete: OnDeleteAction,
    pub meta: CsdlMeta,
}

impl CsdlAssociationEnd {
    pub fn new(role: &str, entity_type: &str, multiplicity: Multiplicity) -> Self {
        Self {
            role: role.into(),
            entity_type: entity_type.into(),
            multiplicity,
            ..Self::default()
        }
    }

    pub fn cascade_delete(mut self) -> Self {
        self.on_delete = OnDeleteAction::Cascade;
        self
    }
}

#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct CsdlReferentialConstraint {
    pub principal: CsdlConstraintRole,
    pub dependent: CsdlConstraintRole,
    pub location: Option<Location>,
}

#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct CsdlConstraintRole {
    pub role: SmolStr,
    pub properties: Vec<SmolStr>,
}

impl CsdlReferentialConstraint {
    pub fn new<'a>(
        principal_role: &str,
        principal_properties: impl IntoIterator<Item = &'a str>,
        dependent_role: &str,
        dependent_properties: impl IntoIterator<Item = &'a str>,
    ) -> Self {
        Self {
            principal: CsdlConstraintRole {
                role: principal_role.into(),
                properties: principal_properties.into_iter().map(SmolStr::new).collect(),
            },
            dependent: CsdlConstraintRole {
                role: dependent_role.into(),
                properties: dependent_properties.into_iter().map(SmolStr::new).collect(),
            },
            location: None,
        }
    }
}

// ============================================================================
// FUNCTIONS AND TERMS
// ============================================================================

#[derive(Clone, Debug, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct CsdlFunction {
    pub name: SmolStr,
    pub return_type: Option<CsdlTypeReference>,
    pub parameters: Vec<Arc<CsdlParameter>>,
    pub defining_expression: Option<SmolStr>,
    pub meta: CsdlMeta,
}

impl CsdlFunction {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    pub fn returns(mut self, type_ref: CsdlTypeReference) -> Self {
        self.return_type = Some(type_ref);
        self
    }

    pub fn with_parameter(mut self, parameter: CsdlParameter) -> Self {
        self.parameters.push(Arc::new(parameter));
        self
    }

    pub fn with_defining_expression(mut self, text: &str) -> Self {
        self.defining_expression = Some(text.into());
        self
    }
}

#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct CsdlParameter {
    pub name: SmolStr,
    pub type_ref: CsdlTypeReference,
    pub mode: ParameterMode,
    pub meta: CsdlMeta,
}

impl CsdlParameter {
    pub fn new(name: &str, type_ref: CsdlTypeReference) -> Self {
        Self {
            name: name.into(),
            type_ref,
            mode: ParameterMode::In,
            meta: CsdlMeta::default(),
        }
    }

    pub fn with_mode(mut self, mode: ParameterMode) -> Self {
        self.mode = mode;
        self
    }
}

#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct CsdlValueTerm {
    pub name: SmolStr,
    pub type_ref: CsdlTypeReference,
    pub meta: CsdlMeta,
}

impl CsdlValueTerm {
    pub fn new(name: &str, type_ref: CsdlTypeReference) -> Self {
        Self {
            name: name.into(),
            type_ref,
            meta: CsdlMeta::default(),
        }
    }
}

// ============================================================================
// CONTAINERS
// ============================================================================

#[derive(Clone, Debug, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct CsdlEntityContainer {
    pub name: SmolStr,
    pub extends: Option<SmolStr>,
    pub entity_sets: Vec<Arc<CsdlEntitySet>>,
    pub association_sets: Vec<Arc<CsdlAssociationSet>>,
    pub function_imports: Vec<Arc<CsdlFunctionImport>>,
    pub meta: CsdlMeta,
}

impl CsdlEntityContainer {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    pub fn with_extends(mut self, container: &str) -> Self {
        self.extends = Some(container.into());
        self
    }

    pub fn with_entity_set(mut self, set: CsdlEntitySet) -> Self {
        self.entity_sets.push(Arc::new(set));
        self
    }

    pub fn with_association_set(mut self, set: CsdlAssociationSet) -> Self {
        self.association_sets.push(Arc::new(set));
        self
    }

    pub fn with_function_import(mut self, import: CsdlFunctionImport) -> Self {
        self.function_imports.push(Arc::new(import));
        self
    }
}

#[derive(Clone, Debug, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct CsdlEntitySet {
    pub name: SmolStr,
    /// Qualified name of the element type.
    pub entity_type: SmolStr,
    pub meta: CsdlMeta,
}

impl CsdlEntitySet {
    pub fn new(name: &str, entity_type: &str) -> Self {
        Self {
            name: name.into(),
            entity_type: entity_type.into(),
            meta: CsdlMeta::default(),
        }
    }
}

#[derive(Clone, Debug, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct CsdlAssociationSet {
    pub name: SmolStr,
    /// Qualified name of the association realized.
    pub association: SmolStr,
    pub end1: Option<Arc<CsdlAssociationSetEnd>>,
    pub end2: Option<Arc<CsdlAssociationSetEnd>>,
    pub meta: CsdlMeta,
}

impl CsdlAssociationSet {
    pub fn new(name: &str, association: &str) -> Self {
        Self {
            name: name.into(),
            association: association.into(),
            ..Self::default()
        }
    }

    pub fn with_ends(mut self, end1: CsdlAssociationSetEnd, end2: CsdlAssociationSetEnd) -> Self {
        self.end1 = Some(Arc::new(end1));
        self.end2 = Some(Arc::new(end2));
        self
    }
}

/// One end of an association set. Both attributes are optional: the role
/// defaults to the matching association end, the entity set is inferred from
/// the role's entity type.
#[derive(Clone, Debug, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct CsdlAssociationSetEnd {
    pub role: Option<SmolStr>,
    pub entity_set: Option<SmolStr>,
    pub meta: CsdlMeta,
}

impl CsdlAssociationSetEnd {
    pub fn new(role: &str, entity_set: &str) -> Self {
        Self {
            role: Some(role.into()),
            entity_set: Some(entity_set.into()),
            meta: CsdlMeta::default(),
        }
    }

    /// An end naming only its role; the entity set is inferred.
    pub fn role_only(role: &str) -> Self {
        Self {
            role: Some(role.into()),
            ..Self::default()
        }
    }
}

#[derive(Clone, Debug, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct CsdlFunctionImport {
    pub name: SmolStr,
    pub return_type: Option<CsdlTypeReference>,
    pub entity_set: Option<SmolStr>,
    pub parameters: Vec<Arc<CsdlParameter>>,
    pub is_side_effecting: bool,
    pub is_composable: bool,
    pub is_bindable: bool,
    pub meta: CsdlMeta,
}

impl CsdlFunctionImport {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    pub fn returns(mut self, type_ref: CsdlTypeReference) -> Self {
        self.return_type = Some(type_ref);
        self
    }

    pub fn with_entity_set(mut self, name: &str) -> Self {
        self.entity_set = Some(name.into());
        self
    }

    pub fn with_parameter(mut self, parameter: CsdlParameter) -> Self {
        self.parameters.push(Arc::new(parameter));
        self
    }

    pub fn side_effecting(mut self) -> Self {
        self.is_side_effecting = true;
        self
    }
}

// ============================================================================
// OUT-OF-LINE ANNOTATIONS
// ============================================================================

/// `<Annotations Target="...">` block applying annotations to an element
/// declared elsewhere.
#[derive(Clone, Debug, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct CsdlAnnotationsBlock {
    pub target: SmolStr,
    pub qualifier: Option<SmolStr>,
    pub annotations: Vec<Arc<CsdlVocabularyAnnotation>>,
    pub location: Option<Location>,
}

impl CsdlAnnotationsBlock {
    pub fn new(target: &str) -> Self {
        Self {
            target: target.into(),
            ..Self::default()
        }
    }

    pub fn with_annotation(mut self, annotation: CsdlVocabularyAnnotation) -> Self {
        self.annotations.push(Arc::new(annotation));
        self
    }
}
