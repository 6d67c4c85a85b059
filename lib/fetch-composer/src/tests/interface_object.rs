use std::error::Error;
use std::sync::Arc;

use crate::{
    configuration::{DataSourceConfiguration, PathType},
    tests::testkit::{
        client_schema, data_source, entity_fetch, init_logger, key, plan_fetch, root_fetch,
        upstream_query,
    },
    utils::pretty_display::PrettyDisplay,
};

const CLIENT_SCHEMA: &str = r#"
    type Query {
      me: Account
      accounts: [Account]
    }
    interface Account {
      id: ID!
      plan: String
    }
    type Admin implements Account {
      id: ID!
      plan: String
      level: Int
    }
    type Member implements Account {
      id: ID!
      plan: String
    }
"#;

fn billing() -> Arc<DataSourceConfiguration> {
    data_source(
        r#"
fetch:
  url: http://billing.svc/graphql
federation:
  enabled: true
  service_sdl: |
    type Query { accounts: [Account] }
    type Account @key(fields: "id") @interfaceObject { id: ID! plan: String }
upstream_schema:
  source: inline
  sdl: |
    type Query { accounts: [Account] }
    type Account { id: ID! plan: String }
types:
  - type_name: Admin
    rename_to: Account
metadata:
  root_nodes:
    - type_name: Query
      field_names: [accounts]
    - type_name: Account
      field_names: [id, plan]
    - type_name: Admin
      field_names: [id, plan]
federation_metadata:
  keys:
    - type_name: Account
      selection_set: id
  interface_objects:
    - interface_type_name: Account
      concrete_type_names: [Admin]
"#,
    )
}

#[test]
fn concrete_type_is_folded_into_interface_object() -> Result<(), Box<dyn Error>> {
    init_logger();
    let fetch = plan_fetch(
        &billing(),
        &client_schema(CLIENT_SCHEMA),
        "{ me { ... on Admin { level plan } } }",
        entity_fetch("query.me", PathType::Object, vec![key("Admin", "id")]),
    )?;

    insta::assert_snapshot!(upstream_query(&fetch), @"query($representations: [_Any!]!){_entities(representations: $representations){__typename ... on Account {plan}}}");

    let template = fetch.representation.as_deref().ok_or("missing representation")?;
    insta::assert_snapshot!(format!("{}", template.pretty()), @r#"
    {
      __typename on [Admin, Account]: "Account"
      id on [Admin, Account]: Custom(id)
    }
    "#);

    Ok(())
}

#[test]
fn interface_object_selections_request_typename() -> Result<(), Box<dyn Error>> {
    init_logger();
    let fetch = plan_fetch(
        &billing(),
        &client_schema(CLIENT_SCHEMA),
        "{ accounts { id plan } }",
        root_fetch(),
    )?;

    insta::assert_snapshot!(upstream_query(&fetch), @"{accounts {__typename id plan}}");
    assert!(fetch.representation.is_none());

    Ok(())
}

fn ranking() -> Arc<DataSourceConfiguration> {
    data_source(
        r#"
fetch:
  url: http://ranking.svc/graphql
federation:
  enabled: true
  service_sdl: |
    type Query { topAdmins: [Admin] }
    interface Account { id: ID! }
    type Admin implements Account @key(fields: "id") { id: ID! level: Int }
upstream_schema:
  source: inline
  sdl: |
    type Query { topAdmins: [Admin] }
    interface Account { id: ID! }
    type Admin implements Account { id: ID! level: Int }
federation_metadata:
  keys:
    - type_name: Admin
      selection_set: id
  entity_interfaces:
    - interface_type_name: Account
      concrete_type_names: [Admin]
"#,
    )
}

#[test]
fn entity_interface_guards_the_template_with_both_names() -> Result<(), Box<dyn Error>> {
    init_logger();
    let fetch = plan_fetch(
        &ranking(),
        &client_schema(CLIENT_SCHEMA),
        "{ me { ... on Admin { level } } }",
        entity_fetch("query.me", PathType::Object, vec![key("Admin", "id")]),
    )?;

    insta::assert_snapshot!(upstream_query(&fetch), @"query($representations: [_Any!]!){_entities(representations: $representations){__typename ... on Admin {level}}}");

    let template = fetch.representation.as_deref().ok_or("missing representation")?;
    insta::assert_snapshot!(format!("{}", template.pretty()), @r#"
    {
      __typename on [Admin, Account]: String(__typename)
      id on [Admin, Account]: Custom(id)
    }
    "#);

    Ok(())
}
