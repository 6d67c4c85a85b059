pub mod base;
pub mod type_node;

use std::fmt::Display;

use graphql_parser::schema as input;
use indexmap::IndexMap;
use serde::Serialize;
use tracing::instrument;

use crate::utils::parsing::SchemaDocument;

pub use type_node::TypeNode;

pub static BUILTIN_SCALARS: [&str; 5] = ["String", "Int", "Float", "Boolean", "ID"];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum OperationKind {
    #[serde(rename = "query")]
    Query,
    #[serde(rename = "mutation")]
    Mutation,
    #[serde(rename = "subscription")]
    Subscription,
}

impl OperationKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            OperationKind::Query => "query",
            OperationKind::Mutation => "mutation",
            OperationKind::Subscription => "subscription",
        }
    }
}

impl Display for OperationKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Executable locations a directive can be placed on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DirectivePlacement {
    Query,
    Mutation,
    Subscription,
    Field,
    FragmentSpread,
    InlineFragment,
    VariableDefinition,
    TypeSystem,
}

impl DirectivePlacement {
    pub fn for_operation(kind: OperationKind) -> Self {
        match kind {
            OperationKind::Query => DirectivePlacement::Query,
            OperationKind::Mutation => DirectivePlacement::Mutation,
            OperationKind::Subscription => DirectivePlacement::Subscription,
        }
    }

    fn from_location(location: &input::DirectiveLocation) -> Self {
        match location.as_str() {
            "QUERY" => DirectivePlacement::Query,
            "MUTATION" => DirectivePlacement::Mutation,
            "SUBSCRIPTION" => DirectivePlacement::Subscription,
            "FIELD" => DirectivePlacement::Field,
            "FRAGMENT_SPREAD" => DirectivePlacement::FragmentSpread,
            "INLINE_FRAGMENT" => DirectivePlacement::InlineFragment,
            "VARIABLE_DEFINITION" => DirectivePlacement::VariableDefinition,
            _ => DirectivePlacement::TypeSystem,
        }
    }
}

#[derive(Debug, Clone)]
pub struct InputValueDefinition {
    pub name: String,
    pub value_type: TypeNode,
}

#[derive(Debug, Clone)]
pub struct FieldDefinition {
    pub name: String,
    pub field_type: TypeNode,
    pub arguments: IndexMap<String, InputValueDefinition>,
}

#[derive(Debug, Clone)]
pub struct CompositeTypeDefinition {
    pub name: String,
    pub fields: IndexMap<String, FieldDefinition>,
    pub implements_interfaces: Vec<String>,
}

#[derive(Debug, Clone)]
pub enum TypeDefinition {
    Object(CompositeTypeDefinition),
    Interface(CompositeTypeDefinition),
    Union { name: String, types: Vec<String> },
    Enum { name: String },
    Scalar { name: String },
    InputObject {
        name: String,
        fields: IndexMap<String, InputValueDefinition>,
    },
}

impl TypeDefinition {
    pub fn name(&self) -> &str {
        match self {
            TypeDefinition::Object(t) | TypeDefinition::Interface(t) => &t.name,
            TypeDefinition::Union { name, .. }
            | TypeDefinition::Enum { name }
            | TypeDefinition::Scalar { name }
            | TypeDefinition::InputObject { name, .. } => name,
        }
    }

    pub fn is_abstract(&self) -> bool {
        matches!(
            self,
            TypeDefinition::Interface(_) | TypeDefinition::Union { .. }
        )
    }

    pub fn is_composite(&self) -> bool {
        matches!(
            self,
            TypeDefinition::Object(_) | TypeDefinition::Interface(_) | TypeDefinition::Union { .. }
        )
    }

    fn fields(&self) -> Option<&IndexMap<String, FieldDefinition>> {
        match self {
            TypeDefinition::Object(t) | TypeDefinition::Interface(t) => Some(&t.fields),
            _ => None,
        }
    }
}

#[derive(Debug, Clone)]
pub struct DirectiveDefinition {
    pub name: String,
    pub locations: Vec<DirectivePlacement>,
}

/// A read-only lookup index over a parsed schema document.
///
/// Built once per schema and shared by every planning pass that resolves against it.
#[derive(Debug)]
pub struct SchemaIndex {
    /// All named types in declaration order, including the built-in scalars.
    pub definitions: IndexMap<String, TypeDefinition>,
    pub directives: IndexMap<String, DirectiveDefinition>,
    pub query_type: String,
    pub mutation_type: Option<String>,
    pub subscription_type: Option<String>,
}

impl SchemaIndex {
    #[instrument(level = "trace", skip(schema), name = "new_schema_index")]
    pub fn new(schema: &SchemaDocument) -> Self {
        let mut definitions = IndexMap::new();
        let mut directives = IndexMap::new();
        let mut query_type = None;
        let mut mutation_type = None;
        let mut subscription_type = None;

        for definition in &schema.definitions {
            match definition {
                input::Definition::SchemaDefinition(schema_definition) => {
                    query_type = schema_definition.query.clone();
                    mutation_type = schema_definition.mutation.clone();
                    subscription_type = schema_definition.subscription.clone();
                }
                input::Definition::TypeDefinition(type_definition) => {
                    let built = Self::build_type_definition(type_definition);
                    definitions.insert(built.name().to_string(), built);
                }
                input::Definition::TypeExtension(extension) => {
                    Self::apply_type_extension(&mut definitions, extension);
                }
                input::Definition::DirectiveDefinition(directive) => {
                    directives.insert(
                        directive.name.clone(),
                        DirectiveDefinition {
                            name: directive.name.clone(),
                            locations: directive
                                .locations
                                .iter()
                                .map(DirectivePlacement::from_location)
                                .collect(),
                        },
                    );
                }
            }
        }

        for scalar in BUILTIN_SCALARS {
            definitions
                .entry(scalar.to_string())
                .or_insert_with(|| TypeDefinition::Scalar {
                    name: scalar.to_string(),
                });
        }

        for (name, locations) in base::BUILTIN_DIRECTIVES {
            directives
                .entry(name.to_string())
                .or_insert_with(|| DirectiveDefinition {
                    name: name.to_string(),
                    locations: locations.to_vec(),
                });
        }

        let root_or_default = |explicit: Option<String>, default: &str| {
            explicit.or_else(|| {
                definitions
                    .contains_key(default)
                    .then(|| default.to_string())
            })
        };

        Self {
            query_type: root_or_default(query_type, "Query").unwrap_or_else(|| "Query".to_string()),
            mutation_type: root_or_default(mutation_type, "Mutation"),
            subscription_type: root_or_default(subscription_type, "Subscription"),
            definitions,
            directives,
        }
    }

    fn build_type_definition(
        type_definition: &input::TypeDefinition<'static, String>,
    ) -> TypeDefinition {
        match type_definition {
            input::TypeDefinition::Object(object_type) => {
                TypeDefinition::Object(CompositeTypeDefinition {
                    name: object_type.name.clone(),
                    fields: Self::build_fields(&object_type.fields),
                    implements_interfaces: object_type.implements_interfaces.clone(),
                })
            }
            input::TypeDefinition::Interface(interface_type) => {
                TypeDefinition::Interface(CompositeTypeDefinition {
                    name: interface_type.name.clone(),
                    fields: Self::build_fields(&interface_type.fields),
                    implements_interfaces: interface_type.implements_interfaces.clone(),
                })
            }
            input::TypeDefinition::Union(union_type) => TypeDefinition::Union {
                name: union_type.name.clone(),
                types: union_type.types.clone(),
            },
            input::TypeDefinition::Enum(enum_type) => TypeDefinition::Enum {
                name: enum_type.name.clone(),
            },
            input::TypeDefinition::Scalar(scalar_type) => TypeDefinition::Scalar {
                name: scalar_type.name.clone(),
            },
            input::TypeDefinition::InputObject(input_object_type) => TypeDefinition::InputObject {
                name: input_object_type.name.clone(),
                fields: Self::build_input_values(&input_object_type.fields),
            },
        }
    }

    fn apply_type_extension(
        definitions: &mut IndexMap<String, TypeDefinition>,
        extension: &input::TypeExtension<'static, String>,
    ) {
        match extension {
            input::TypeExtension::Object(object_extension) => {
                let entry = definitions
                    .entry(object_extension.name.clone())
                    .or_insert_with(|| {
                        TypeDefinition::Object(CompositeTypeDefinition {
                            name: object_extension.name.clone(),
                            fields: IndexMap::new(),
                            implements_interfaces: vec![],
                        })
                    });

                if let TypeDefinition::Object(object_type) = entry {
                    object_type
                        .fields
                        .extend(Self::build_fields(&object_extension.fields));
                    object_type
                        .implements_interfaces
                        .extend(object_extension.implements_interfaces.iter().cloned());
                }
            }
            input::TypeExtension::Interface(interface_extension) => {
                let entry = definitions
                    .entry(interface_extension.name.clone())
                    .or_insert_with(|| {
                        TypeDefinition::Interface(CompositeTypeDefinition {
                            name: interface_extension.name.clone(),
                            fields: IndexMap::new(),
                            implements_interfaces: vec![],
                        })
                    });

                if let TypeDefinition::Interface(interface_type) = entry {
                    interface_type
                        .fields
                        .extend(Self::build_fields(&interface_extension.fields));
                }
            }
            input::TypeExtension::Union(union_extension) => {
                if let Some(TypeDefinition::Union { types, .. }) =
                    definitions.get_mut(&union_extension.name)
                {
                    types.extend(union_extension.types.iter().cloned());
                }
            }
            input::TypeExtension::InputObject(input_extension) => {
                if let Some(TypeDefinition::InputObject { fields, .. }) =
                    definitions.get_mut(&input_extension.name)
                {
                    fields.extend(Self::build_input_values(&input_extension.fields));
                }
            }
            input::TypeExtension::Scalar(_) | input::TypeExtension::Enum(_) => {}
        }
    }

    fn build_fields(
        fields: &[input::Field<'static, String>],
    ) -> IndexMap<String, FieldDefinition> {
        fields
            .iter()
            .map(|field| {
                (
                    field.name.clone(),
                    FieldDefinition {
                        name: field.name.clone(),
                        field_type: (&field.field_type).into(),
                        arguments: Self::build_input_values(&field.arguments),
                    },
                )
            })
            .collect()
    }

    fn build_input_values(
        values: &[input::InputValue<'static, String>],
    ) -> IndexMap<String, InputValueDefinition> {
        values
            .iter()
            .map(|value| {
                (
                    value.name.clone(),
                    InputValueDefinition {
                        name: value.name.clone(),
                        value_type: (&value.value_type).into(),
                    },
                )
            })
            .collect()
    }

    pub fn type_definition(&self, name: &str) -> Option<&TypeDefinition> {
        self.definitions.get(name)
    }

    pub fn root_type(&self, kind: OperationKind) -> Option<&str> {
        match kind {
            OperationKind::Query => Some(self.query_type.as_str()),
            OperationKind::Mutation => self.mutation_type.as_deref(),
            OperationKind::Subscription => self.subscription_type.as_deref(),
        }
    }

    pub fn field(&self, type_name: &str, field_name: &str) -> Option<&FieldDefinition> {
        self.definitions
            .get(type_name)
            .and_then(|definition| definition.fields())
            .and_then(|fields| fields.get(field_name))
    }

    pub fn field_argument(
        &self,
        type_name: &str,
        field_name: &str,
        argument_name: &str,
    ) -> Option<&InputValueDefinition> {
        self.field(type_name, field_name)
            .and_then(|field| field.arguments.get(argument_name))
    }

    pub fn is_abstract(&self, type_name: &str) -> bool {
        self.definitions
            .get(type_name)
            .is_some_and(TypeDefinition::is_abstract)
    }

    pub fn is_interface(&self, type_name: &str) -> bool {
        matches!(
            self.definitions.get(type_name),
            Some(TypeDefinition::Interface(_))
        )
    }

    /// Object types implementing the interface, in declaration order.
    pub fn implementations(&self, interface_name: &str) -> Vec<&str> {
        self.definitions
            .values()
            .filter_map(|definition| match definition {
                TypeDefinition::Object(object_type)
                    if object_type
                        .implements_interfaces
                        .iter()
                        .any(|name| name == interface_name) =>
                {
                    Some(object_type.name.as_str())
                }
                _ => None,
            })
            .collect()
    }

    /// Concrete object types a value of the given type can have at runtime.
    pub fn possible_types(&self, type_name: &str) -> Vec<&str> {
        match self.definitions.get(type_name) {
            Some(TypeDefinition::Union { types, .. }) => {
                types.iter().map(String::as_str).collect()
            }
            Some(TypeDefinition::Interface(_)) => self.implementations(type_name),
            Some(TypeDefinition::Object(object_type)) => vec![object_type.name.as_str()],
            _ => vec![],
        }
    }

    pub fn directive_allowed(&self, directive_name: &str, placement: DirectivePlacement) -> bool {
        self.directives
            .get(directive_name)
            .is_some_and(|directive| directive.locations.contains(&placement))
    }
}
