use graphql_parser::query::Selection;
use hive_router_composer_config::federation::FederationFieldConfig;
use tracing::{instrument, trace};

use crate::{
    federation::{parse_field_set, FederationMetadata, FieldSet},
    representation::{
        node::{
            ArrayNode, ObjectNode, RepresentationField, RepresentationNode, ScalarKind,
            ScalarNode, StaticStringNode,
        },
        RepresentationError,
    },
    schema::{SchemaIndex, TypeDefinition, TypeNode},
};

const TYPENAME: &str = "__typename";

/// Builds the representation template of one key, requires or provides field set.
pub struct RepresentationBuilder<'a> {
    schema: &'a SchemaIndex,
    federation: &'a FederationMetadata,
    /// Prepends a `__typename` leaf to the root object.
    pub add_typename: bool,
    /// Guards every root-level field with the entity type names.
    pub add_on_type: bool,
}

impl<'a> RepresentationBuilder<'a> {
    pub fn new(schema: &'a SchemaIndex, federation: &'a FederationMetadata) -> Self {
        Self {
            schema,
            federation,
            add_typename: true,
            add_on_type: true,
        }
    }

    #[instrument(level = "trace", skip_all, fields(
        type_name = %config.type_name,
        field_set = %config.selection_set,
    ))]
    pub fn build(&self, config: &FederationFieldConfig) -> Result<ObjectNode, RepresentationError> {
        self.build_for(&config.type_name, &config.selection_set)
    }

    pub fn build_for(
        &self,
        type_name: &str,
        field_set: &str,
    ) -> Result<ObjectNode, RepresentationError> {
        if self.schema.type_definition(type_name).is_none() {
            return Err(RepresentationError::UnknownType(type_name.to_string()));
        }

        let selection_set = parse_field_set(type_name, field_set)?;
        let interface_object = self
            .federation
            .interface_object_for(type_name)
            .map(|interface| interface.interface_type_name.clone());
        let root_guard = self.federation.on_type_names(type_name);

        let mut fields = Vec::with_capacity(selection_set.items.len() + 1);
        if self.add_typename {
            let value = match &interface_object {
                Some(interface_name) => RepresentationNode::StaticString(StaticStringNode {
                    path: vec![TYPENAME.to_string()],
                    value: interface_name.clone(),
                }),
                None => RepresentationNode::Scalar(ScalarNode {
                    path: vec![TYPENAME.to_string()],
                    nullable: false,
                    scalar: ScalarKind::String,
                }),
            };

            fields.push(RepresentationField {
                name: TYPENAME.to_string(),
                value,
                on_type_names: if self.add_on_type {
                    root_guard.clone()
                } else {
                    vec![]
                },
            });
        }

        let scope = Scope {
            type_name,
            on_type_names: None,
            root_guard: self.add_on_type.then_some(root_guard.as_slice()),
        };
        self.build_fields(&scope, &selection_set, &mut fields)?;
        trace!("built {} root fields", fields.len());

        Ok(ObjectNode {
            path: vec![],
            nullable: true,
            fields,
        })
    }

    fn build_fields(
        &self,
        scope: &Scope<'_>,
        selection_set: &FieldSet,
        fields: &mut Vec<RepresentationField>,
    ) -> Result<(), RepresentationError> {
        for item in &selection_set.items {
            match item {
                Selection::Field(field) => {
                    let field_type = if field.name == TYPENAME {
                        TypeNode::NonNull(Box::new(TypeNode::named("String")))
                    } else {
                        self.schema
                            .field(scope.type_name, &field.name)
                            .map(|definition| definition.field_type.clone())
                            .ok_or_else(|| {
                                RepresentationError::UnknownField(
                                    scope.type_name.to_string(),
                                    field.name.clone(),
                                )
                            })?
                    };

                    let value = self.resolve_value(
                        &field_type,
                        true,
                        vec![field.name.clone()],
                        &field.selection_set,
                    )?;

                    let on_type_names = match scope.root_guard {
                        Some(guard) => guard.to_vec(),
                        None => scope.on_type_names.clone().unwrap_or_default(),
                    };

                    fields.push(RepresentationField {
                        name: field.name.clone(),
                        value,
                        on_type_names,
                    });
                }
                Selection::InlineFragment(fragment) => {
                    let condition = match &fragment.type_condition {
                        Some(graphql_parser::query::TypeCondition::On(name)) => name.as_str(),
                        None => scope.type_name,
                    };

                    let nested = Scope {
                        type_name: condition,
                        on_type_names: Some(self.fragment_type_names(condition, scope.type_name)),
                        root_guard: scope.root_guard,
                    };
                    self.build_fields(&nested, &fragment.selection_set, fields)?;
                }
                Selection::FragmentSpread(spread) => {
                    return Err(RepresentationError::FragmentSpread(
                        spread.fragment_name.clone(),
                    ));
                }
            }
        }

        Ok(())
    }

    /// Runtime types a field inside `... on <condition>` applies to.
    /// Interfaces expand to their implementations, narrowed by the abstract type
    /// the fragment is nested in.
    fn fragment_type_names(&self, condition: &str, enclosing: &str) -> Vec<String> {
        if !self.schema.is_abstract(condition) {
            return vec![condition.to_string()];
        }

        let candidates = self.schema.possible_types(condition);
        let allowed = self
            .schema
            .is_abstract(enclosing)
            .then(|| self.schema.possible_types(enclosing));

        candidates
            .into_iter()
            .filter(|name| allowed.as_ref().map_or(true, |allowed| allowed.contains(name)))
            .map(str::to_string)
            .collect()
    }

    fn resolve_value(
        &self,
        field_type: &TypeNode,
        nullable: bool,
        path: Vec<String>,
        selection_set: &FieldSet,
    ) -> Result<RepresentationNode, RepresentationError> {
        match field_type {
            TypeNode::NonNull(inner) => self.resolve_value(inner, false, path, selection_set),
            TypeNode::List(inner) => Ok(RepresentationNode::Array(ArrayNode {
                path,
                nullable,
                item: Box::new(self.resolve_value(inner, true, vec![], selection_set)?),
            })),
            TypeNode::Named(type_name) => {
                let scalar = |scalar: ScalarKind| {
                    Ok::<_, RepresentationError>(RepresentationNode::Scalar(ScalarNode {
                        path: path.clone(),
                        nullable,
                        scalar,
                    }))
                };

                match self.schema.type_definition(type_name) {
                    Some(TypeDefinition::Scalar { name }) => match name.as_str() {
                        "String" => scalar(ScalarKind::String),
                        "Int" => scalar(ScalarKind::Integer),
                        "Float" => scalar(ScalarKind::Float),
                        "Boolean" => scalar(ScalarKind::Boolean),
                        _ => scalar(ScalarKind::Custom),
                    },
                    Some(TypeDefinition::Enum { .. }) => scalar(ScalarKind::String),
                    Some(definition) if definition.is_composite() => {
                        let mut fields = Vec::with_capacity(selection_set.items.len());
                        let scope = Scope {
                            type_name,
                            on_type_names: None,
                            root_guard: None,
                        };
                        self.build_fields(&scope, selection_set, &mut fields)?;

                        Ok(RepresentationNode::Object(ObjectNode {
                            path,
                            nullable,
                            fields,
                        }))
                    }
                    _ => Ok(RepresentationNode::Null),
                }
            }
        }
    }
}

struct Scope<'s> {
    type_name: &'s str,
    on_type_names: Option<Vec<String>>,
    root_guard: Option<&'s [String]>,
}

#[cfg(test)]
mod tests {
    use hive_router_composer_config::federation::{
        EntityInterfaceConfig, FederationFieldConfig, FederationMetadataConfig,
    };

    use super::RepresentationBuilder;
    use crate::{
        federation::FederationMetadata,
        representation::{RepresentationError, RepresentationNode},
        schema::SchemaIndex,
        utils::{parsing::parse_schema, pretty_display::PrettyDisplay},
    };

    fn key(type_name: &str, selection_set: &str) -> FederationFieldConfig {
        FederationFieldConfig {
            type_name: type_name.to_string(),
            selection_set: selection_set.to_string(),
            ..Default::default()
        }
    }

    fn schema() -> SchemaIndex {
        SchemaIndex::new(
            &parse_schema(
                r#"
                type Query { user: User }
                enum Status { ACTIVE BANNED }
                type User { id: ID! info: Info tags: [String!] status: Status account: Account }
                type Info { a: String b: Int! }
                interface Account { id: ID! }
                type Admin implements Account { id: ID! level: Int }
                type Member implements Account { id: ID! since: Float }
                "#,
            )
            .unwrap(),
        )
    }

    #[test]
    fn composite_key_nests_objects_under_entity_guard() {
        let schema = schema();
        let federation = FederationMetadata::default();
        let node = RepresentationBuilder::new(&schema, &federation)
            .build(&key("User", "id info { a b } tags status"))
            .unwrap();

        insta::assert_snapshot!(format!("{}", RepresentationNode::Object(node).pretty()), @r#"
        {
          __typename on [User]: String(__typename)
          id on [User]: Custom(id)
          info on [User]: Object(info)? {
            a: String(a)?
            b: Integer(b)
          }
          tags on [User]: Array(tags)? [String()]
          status on [User]: String(status)?
        }
        "#);
    }

    #[test]
    fn interface_object_typename_is_static() {
        let schema = schema();
        let federation = FederationMetadata::from(FederationMetadataConfig {
            interface_objects: vec![EntityInterfaceConfig {
                interface_type_name: "Account".to_string(),
                concrete_type_names: vec!["Admin".to_string()],
            }],
            ..Default::default()
        });
        let node = RepresentationBuilder::new(&schema, &federation)
            .build(&key("Admin", "id"))
            .unwrap();

        insta::assert_snapshot!(format!("{}", RepresentationNode::Object(node).pretty()), @r#"
        {
          __typename on [Admin, Account]: "Account"
          id on [Admin, Account]: Custom(id)
        }
        "#);
    }

    #[test]
    fn fragments_inside_nested_objects_carry_type_conditions() {
        let schema = schema();
        let federation = FederationMetadata::default();
        let mut builder = RepresentationBuilder::new(&schema, &federation);
        builder.add_typename = false;
        builder.add_on_type = false;
        let node = builder
            .build_for("User", "account { ... on Admin { level } ... on Account { id } }")
            .unwrap();

        insta::assert_snapshot!(format!("{}", RepresentationNode::Object(node).pretty()), @r#"
        {
          account: Object(account)? {
            level on [Admin]: Integer(level)?
            id on [Admin, Member]: Custom(id)
          }
        }
        "#);
    }

    #[test]
    fn unknown_fields_and_types_fail() {
        let schema = schema();
        let federation = FederationMetadata::default();
        let builder = RepresentationBuilder::new(&schema, &federation);

        assert!(matches!(
            builder.build(&key("User", "id missing")),
            Err(RepresentationError::UnknownField(t, f)) if t == "User" && f == "missing"
        ));
        assert!(matches!(
            builder.build(&key("Ghost", "id")),
            Err(RepresentationError::UnknownType(t)) if t == "Ghost"
        ));
        assert!(matches!(
            builder.build(&key("User", "id {")),
            Err(RepresentationError::FieldSetParse(..))
        ));
    }
}
