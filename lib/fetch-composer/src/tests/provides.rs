use std::error::Error;
use std::sync::Arc;

use crate::{
    configuration::{DataSourceConfiguration, DataSourcePlannerConfiguration, ProvidedField},
    tests::testkit::{client_schema, data_source, init_logger, plan_fetch, upstream_query},
};

const CLIENT_SCHEMA: &str = r#"
    type Query {
      topReviews: [Review]
    }
    type Review {
      body: String
      author: User
    }
    type User {
      id: ID!
      username: String
    }
"#;

fn reviews() -> Arc<DataSourceConfiguration> {
    data_source(
        r#"
fetch:
  url: http://reviews.svc/graphql
federation:
  enabled: true
  service_sdl: |
    type Query { topReviews: [Review] }
    type Review { body: String author: User @provides(fields: "username") }
    type User @key(fields: "id") { id: ID! username: String @external }
upstream_schema:
  source: inline
  sdl: |
    type Query { topReviews: [Review] }
    type Review { body: String author: User }
    type User { id: ID! username: String }
federation_metadata:
  keys:
    - type_name: User
      selection_set: id
  provides:
    - type_name: Review
      field_name: author
      selection_set: username
  external_fields:
    - type_name: User
      field_name: username
"#,
    )
}

#[test]
fn external_fields_are_skipped_unless_provided() -> Result<(), Box<dyn Error>> {
    init_logger();
    let fetch = plan_fetch(
        &reviews(),
        &client_schema(CLIENT_SCHEMA),
        "{ topReviews { body author { id username } } }",
        DataSourcePlannerConfiguration::default(),
    )?;

    insta::assert_snapshot!(upstream_query(&fetch), @"{topReviews {body author {id}}}");

    Ok(())
}

#[test]
fn provided_fields_are_selected_below_the_providing_field() -> Result<(), Box<dyn Error>> {
    init_logger();
    let fetch = plan_fetch(
        &reviews(),
        &client_schema(CLIENT_SCHEMA),
        "{ topReviews { body author { id username } } }",
        DataSourcePlannerConfiguration {
            provided_fields: vec![ProvidedField {
                type_name: "User".to_string(),
                field_name: "username".to_string(),
                path: "query.topReviews.author".to_string(),
            }],
            ..Default::default()
        },
    )?;

    insta::assert_snapshot!(upstream_query(&fetch), @"{topReviews {body author {id username}}}");

    Ok(())
}

#[test]
fn field_left_without_selections_is_dropped() -> Result<(), Box<dyn Error>> {
    init_logger();
    let fetch = plan_fetch(
        &reviews(),
        &client_schema(CLIENT_SCHEMA),
        "{ topReviews { body author { username } } }",
        DataSourcePlannerConfiguration::default(),
    )?;

    insta::assert_snapshot!(upstream_query(&fetch), @"{topReviews {body}}");

    Ok(())
}
