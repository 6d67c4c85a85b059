use std::error::Error;
use std::sync::Arc;

use graphql_tools::validation::{rules::default_rules_validation_plan, validate::validate};

use crate::{
    configuration::{DataSourceConfiguration, PathType},
    fetch::FetchKind,
    planner::PlannerError,
    representation::RepresentationError,
    tests::testkit::{
        client_schema, data_source, entity_fetch, init_logger, key, plan, plan_fetch, requires,
        upstream_query,
    },
    utils::{parsing::parse_validation_operation, pretty_display::PrettyDisplay},
    variables::Variable,
};

const CLIENT_SCHEMA: &str = r#"
    type Query {
      me: User
      users: [User]
      feed: [FeedItem]
    }
    type User {
      id: ID!
      username: String
      info: Info
      reviews: [Review]
      reviewCount: Int
      metadata: JSON
    }
    type Info {
      a: String
      b: Int
    }
    type Review {
      body: String
      author: User
    }
    union FeedItem = User | Review
    scalar JSON
"#;

fn reviews() -> Arc<DataSourceConfiguration> {
    data_source(
        r#"
fetch:
  url: http://reviews.svc/graphql
federation:
  enabled: true
  service_sdl: |
    scalar JSON
    type Query { topReviews: [Review] }
    type User @key(fields: "id") { id: ID! reviews: [Review] reviewCount: Int metadata: JSON }
    type Review @key(fields: "body") { body: String author: User }
upstream_schema:
  source: inline
  sdl: |
    scalar JSON
    type Query { topReviews: [Review] }
    type User { id: ID! reviews: [Review] reviewCount: Int metadata: JSON }
    type Review { body: String author: User }
custom_scalar_type_fields:
  - type_name: User
    field_name: metadata
"#,
    )
}

#[test]
fn single_entity_fetch_wraps_selection_in_entities() -> Result<(), Box<dyn Error>> {
    init_logger();
    let fetch = plan_fetch(
        &reviews(),
        &client_schema(CLIENT_SCHEMA),
        "{ me { username reviews { body } } }",
        entity_fetch("query.me", PathType::Object, vec![key("User", "id")]),
    )?;

    insta::assert_snapshot!(format!("{}", fetch.pretty()), @r#"
    Fetch(1) {
      kind: SingleEntity
      depends_on: [0]
      data_path: data._entities.[0]
      flags: null_on_variable_null
      input: {"method":"POST","url":"http://reviews.svc/graphql","body":{"query":"query($representations: [_Any!]!){_entities(representations: $representations){__typename ... on User {reviews {body}}}}","variables":{"representations":[$$0$$]}}}
    }
    "#);

    let template = fetch.representation.as_deref().ok_or("missing representation")?;
    insta::assert_snapshot!(format!("{}", template.pretty()), @r#"
    {
      __typename on [User]: String(__typename)
      id on [User]: Custom(id)
    }
    "#);
    assert!(matches!(
        fetch.variables.as_slice(),
        [Variable::ResolvableObject { .. }]
    ));

    Ok(())
}

#[test]
fn list_parent_turns_into_batch_fetch() -> Result<(), Box<dyn Error>> {
    init_logger();
    let fetch = plan_fetch(
        &reviews(),
        &client_schema(CLIENT_SCHEMA),
        "{ users { username reviewCount } }",
        entity_fetch("query.users", PathType::ArrayItem, vec![key("User", "id")]),
    )?;

    insta::assert_snapshot!(format!("{}", fetch.pretty()), @r#"
    Fetch(1) {
      kind: BatchEntity
      depends_on: [0]
      data_path: data._entities
      flags: requires_batch_fetch, null_on_variable_null
      input: {"method":"POST","url":"http://reviews.svc/graphql","body":{"query":"query($representations: [_Any!]!){_entities(representations: $representations){__typename ... on User {reviewCount}}}","variables":{"representations":[$$0$$]}}}
    }
    "#);

    Ok(())
}

#[test]
fn composite_key_builds_nested_template() -> Result<(), Box<dyn Error>> {
    init_logger();
    let planner = plan(
        &reviews(),
        &client_schema(CLIENT_SCHEMA),
        "{ me { reviewCount } }",
        entity_fetch("query.me", PathType::Object, vec![key("User", "id info { a b }")]),
    )?;

    let template = planner.representation().ok_or("missing representation")?;
    insta::assert_snapshot!(format!("{}", template.pretty()), @r#"
    {
      __typename on [User]: String(__typename)
      id on [User]: Custom(id)
      info on [User]: Object(info)? {
        a: String(a)?
        b: Integer(b)?
      }
    }
    "#);

    Ok(())
}

#[test]
fn requires_are_merged_and_fetched_serially() -> Result<(), Box<dyn Error>> {
    init_logger();
    let fetch = plan_fetch(
        &reviews(),
        &client_schema(CLIENT_SCHEMA),
        "{ me { reviewCount } }",
        entity_fetch(
            "query.me",
            PathType::Object,
            vec![
                key("User", "id"),
                requires("User", "reviewCount", "username"),
            ],
        ),
    )?;

    assert!(fetch.requires_serial_fetch);
    assert!(!fetch.requires_batch_fetch);
    let template = fetch.representation.as_deref().ok_or("missing representation")?;
    insta::assert_snapshot!(format!("{}", template.pretty()), @r#"
    {
      __typename on [User]: String(__typename)
      id on [User]: Custom(id)
      username on [User]: String(username)?
    }
    "#);

    Ok(())
}

#[test]
fn object_path_rejects_several_entity_types() {
    init_logger();
    let result = plan(
        &reviews(),
        &client_schema(CLIENT_SCHEMA),
        "{ me { reviewCount } }",
        entity_fetch(
            "query.me",
            PathType::Object,
            vec![key("User", "id"), key("Review", "body")],
        ),
    );

    match result {
        Err(PlannerError::RepresentationFailure(error)) => {
            assert!(matches!(
                *error,
                RepresentationError::MultipleEntityTypes(ref types) if types.len() == 2
            ));
        }
        Err(other) => panic!("expected a representation error, got {other}"),
        Ok(_) => panic!("expected a representation error"),
    }
}

#[test]
fn fields_of_one_type_share_a_single_fragment() -> Result<(), Box<dyn Error>> {
    init_logger();
    let data_source = reviews();
    let fetch = plan_fetch(
        &data_source,
        &client_schema(CLIENT_SCHEMA),
        "{ me { reviews { body } ... on User { reviewCount } } }",
        entity_fetch("query.me", PathType::Object, vec![key("User", "id")]),
    )?;

    let query = upstream_query(&fetch);
    insta::assert_snapshot!(query, @"query($representations: [_Any!]!){_entities(representations: $representations){__typename ... on User {reviews {body} reviewCount}}}");

    let document = parse_validation_operation(&query)?;
    let errors = validate(
        &data_source.validation_document,
        &document,
        &default_rules_validation_plan(),
    );
    let messages = errors.iter().map(|error| error.message.as_str()).collect::<Vec<_>>();
    assert!(messages.is_empty(), "{:?}", messages);

    Ok(())
}

#[test]
fn custom_scalar_first_in_entity_fetch_gets_its_fragment() -> Result<(), Box<dyn Error>> {
    init_logger();
    let fetch = plan_fetch(
        &reviews(),
        &client_schema(CLIENT_SCHEMA),
        "{ me { metadata reviewCount } }",
        entity_fetch("query.me", PathType::Object, vec![key("User", "id")]),
    )?;

    insta::assert_snapshot!(upstream_query(&fetch), @"query($representations: [_Any!]!){_entities(representations: $representations){__typename ... on User {metadata reviewCount}}}");

    Ok(())
}

#[test]
fn custom_scalar_after_another_field_joins_the_same_fragment() -> Result<(), Box<dyn Error>> {
    init_logger();
    let fetch = plan_fetch(
        &reviews(),
        &client_schema(CLIENT_SCHEMA),
        "{ me { reviewCount metadata } }",
        entity_fetch("query.me", PathType::Object, vec![key("User", "id")]),
    )?;

    insta::assert_snapshot!(upstream_query(&fetch), @"query($representations: [_Any!]!){_entities(representations: $representations){__typename ... on User {reviewCount metadata}}}");

    Ok(())
}

#[test]
fn list_of_two_entity_types_shares_one_entities_call() -> Result<(), Box<dyn Error>> {
    init_logger();
    let fetch = plan_fetch(
        &reviews(),
        &client_schema(CLIENT_SCHEMA),
        "{ feed { ... on User { reviewCount } ... on Review { author { id } } } }",
        entity_fetch(
            "query.feed",
            PathType::ArrayItem,
            vec![key("User", "id"), key("Review", "body")],
        ),
    )?;

    assert_eq!(fetch.kind, FetchKind::BatchEntity);
    insta::assert_snapshot!(upstream_query(&fetch), @"query($representations: [_Any!]!){_entities(representations: $representations){__typename ... on User {reviewCount} ... on Review {author {id}}}}");

    let template = fetch.representation.as_deref().ok_or("missing representation")?;
    insta::assert_snapshot!(format!("{}", template.pretty()), @r#"
    {
      __typename on [User]: String(__typename)
      id on [User]: Custom(id)
      __typename on [Review]: String(__typename)
      body on [Review]: String(body)?
    }
    "#);

    Ok(())
}

#[test]
fn list_nested_in_list_is_a_batch_fetch() -> Result<(), Box<dyn Error>> {
    init_logger();
    let fetch = plan_fetch(
        &reviews(),
        &client_schema(CLIENT_SCHEMA),
        "{ users { reviews { author { reviewCount } } } }",
        entity_fetch(
            "query.users.reviews.author",
            PathType::NestedInArray,
            vec![key("User", "id")],
        ),
    )?;

    insta::assert_snapshot!(format!("{}", fetch.pretty()), @r#"
    Fetch(1) {
      kind: BatchEntity
      depends_on: [0]
      data_path: data._entities
      flags: requires_batch_fetch, null_on_variable_null
      input: {"method":"POST","url":"http://reviews.svc/graphql","body":{"query":"query($representations: [_Any!]!){_entities(representations: $representations){__typename ... on User {reviewCount}}}","variables":{"representations":[$$0$$]}}}
    }
    "#);

    Ok(())
}
