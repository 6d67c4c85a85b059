use graphql_parser::{schema as input, Pos};
use tracing::{instrument, trace};

use crate::{
    schema::{DirectivePlacement, SchemaIndex},
    utils::parsing::{parse_schema, SchemaDocument},
};

pub static BUILTIN_DIRECTIVES: [(&str, &[DirectivePlacement]); 3] = [
    (
        "skip",
        &[
            DirectivePlacement::Field,
            DirectivePlacement::FragmentSpread,
            DirectivePlacement::InlineFragment,
        ],
    ),
    (
        "include",
        &[
            DirectivePlacement::Field,
            DirectivePlacement::FragmentSpread,
            DirectivePlacement::InlineFragment,
        ],
    ),
    ("deprecated", &[DirectivePlacement::TypeSystem]),
];

static BASE_SCHEMA: &str = r#"
scalar Int
scalar Float
scalar String
scalar Boolean
scalar ID

directive @include(if: Boolean!) on FIELD | FRAGMENT_SPREAD | INLINE_FRAGMENT
directive @skip(if: Boolean!) on FIELD | FRAGMENT_SPREAD | INLINE_FRAGMENT
directive @deprecated(reason: String = "No longer supported") on FIELD_DEFINITION | ENUM_VALUE
"#;

static FEDERATION_TYPES: &str = r#"
scalar _Any

type _Service {
  sdl: String
}
"#;

fn definition_name<'a>(definition: &'a input::Definition<'static, String>) -> Option<&'a str> {
    match definition {
        input::Definition::TypeDefinition(type_definition) => Some(match type_definition {
            input::TypeDefinition::Scalar(t) => &t.name,
            input::TypeDefinition::Object(t) => &t.name,
            input::TypeDefinition::Interface(t) => &t.name,
            input::TypeDefinition::Union(t) => &t.name,
            input::TypeDefinition::Enum(t) => &t.name,
            input::TypeDefinition::InputObject(t) => &t.name,
        }),
        input::Definition::DirectiveDefinition(directive) => Some(&directive.name),
        _ => None,
    }
}

fn is_object_named(definition: &input::Definition<'static, String>, name: &str) -> bool {
    matches!(
        definition,
        input::Definition::TypeDefinition(input::TypeDefinition::Object(t)) if t.name == name
    )
}

/// Appends the definitions of `extra` whose names are not defined by `schema` yet.
fn append_missing_definitions(schema: &mut SchemaDocument, extra: SchemaDocument) {
    for definition in extra.definitions {
        let exists = definition_name(&definition).is_some_and(|name| {
            schema
                .definitions
                .iter()
                .any(|existing| definition_name(existing) == Some(name))
        });

        if !exists {
            schema.definitions.push(definition);
        }
    }
}

/// Replaces any schema definition with one naming the roots resolved by the index.
/// The validator only discovers mutation and subscription roots through it.
fn set_schema_definition(schema: &mut SchemaDocument, index: &SchemaIndex, query_type: &str) {
    schema
        .definitions
        .retain(|definition| !matches!(definition, input::Definition::SchemaDefinition(_)));

    schema
        .definitions
        .push(input::Definition::SchemaDefinition(input::SchemaDefinition {
            position: Pos::default(),
            directives: vec![],
            query: Some(query_type.to_string()),
            mutation: index.mutation_type.clone(),
            subscription: index.subscription_type.clone(),
        }));
}

/// The upstream schema merged with the built-in scalars and executable directives.
#[instrument(level = "trace", skip_all)]
pub fn build_base_validation_schema(
    upstream: &SchemaDocument,
    index: &SchemaIndex,
) -> Result<SchemaDocument, input::ParseError> {
    let mut schema = upstream.clone();
    append_missing_definitions(&mut schema, parse_schema(BASE_SCHEMA)?);
    set_schema_definition(&mut schema, index, &index.query_type);

    Ok(schema)
}

/// Type names carrying `@key` in the subgraph SDL, in declaration order.
pub fn entity_type_names(service_sdl: &SchemaDocument) -> Vec<String> {
    let mut names: Vec<String> = vec![];
    let mut push = |name: &str, directives: &[input::Directive<'static, String>]| {
        if directives.iter().any(|d| d.name == "key") && !names.iter().any(|n| n == name) {
            names.push(name.to_string());
        }
    };

    for definition in &service_sdl.definitions {
        match definition {
            input::Definition::TypeDefinition(input::TypeDefinition::Object(t)) => {
                push(&t.name, &t.directives)
            }
            input::Definition::TypeDefinition(input::TypeDefinition::Interface(t)) => {
                push(&t.name, &t.directives)
            }
            input::Definition::TypeExtension(input::TypeExtension::Object(t)) => {
                push(&t.name, &t.directives)
            }
            input::Definition::TypeExtension(input::TypeExtension::Interface(t)) => {
                push(&t.name, &t.directives)
            }
            _ => {}
        }
    }

    names
}

/// The upstream schema extended with the entity lookup machinery:
/// `_Any`, `_Service`, `_Entity` and the `_entities`/`_service` root fields.
#[instrument(level = "trace", skip_all)]
pub fn build_federation_validation_schema(
    upstream: &SchemaDocument,
    service_sdl: &SchemaDocument,
    index: &SchemaIndex,
) -> Result<SchemaDocument, input::ParseError> {
    let entities = entity_type_names(service_sdl)
        .into_iter()
        .filter(|name| index.type_definition(name).is_some())
        .collect::<Vec<_>>();
    trace!("entity types: {:?}", entities);

    let mut federation_sdl = FEDERATION_TYPES.to_string();
    let mut root_fields = String::from("_service: _Service!");
    if !entities.is_empty() {
        federation_sdl.push_str(&format!("union _Entity = {}\n", entities.join(" | ")));
        root_fields.push_str(" _entities(representations: [_Any!]!): [_Entity]!");
    }
    federation_sdl.push_str(&format!("type {} {{ {} }}\n", index.query_type, root_fields));

    let mut federation_definitions = parse_schema(&federation_sdl)?;
    let mut schema = upstream.clone();

    // Root fields are appended to the existing query type instead of defining a second one.
    let extra_root_fields = federation_definitions
        .definitions
        .iter()
        .position(|definition| is_object_named(definition, &index.query_type))
        .map(|position| federation_definitions.definitions.remove(position));

    let query_type = schema.definitions.iter_mut().find_map(|definition| match definition {
        input::Definition::TypeDefinition(input::TypeDefinition::Object(t))
            if t.name == index.query_type =>
        {
            Some(t)
        }
        _ => None,
    });

    match (query_type, extra_root_fields) {
        (
            Some(query_type),
            Some(input::Definition::TypeDefinition(input::TypeDefinition::Object(extra))),
        ) => {
            for field in extra.fields {
                if !query_type.fields.iter().any(|f| f.name == field.name) {
                    query_type.fields.push(field);
                }
            }
        }
        (None, Some(extra)) => schema.definitions.push(extra),
        _ => {}
    }

    append_missing_definitions(&mut schema, federation_definitions);
    append_missing_definitions(&mut schema, parse_schema(BASE_SCHEMA)?);
    set_schema_definition(&mut schema, index, &index.query_type);

    Ok(schema)
}

/// Validates nested, non-federated fetches whose root field lives on `root_type`:
/// the query type is dropped and `root_type` becomes the query root.
pub fn replace_query_type(
    schema: &SchemaDocument,
    index: &SchemaIndex,
    root_type: &str,
) -> SchemaDocument {
    let mut schema = schema.clone();
    schema
        .definitions
        .retain(|definition| !is_object_named(definition, &index.query_type));
    set_schema_definition(&mut schema, index, root_type);

    schema
}
