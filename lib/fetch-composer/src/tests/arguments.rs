use std::error::Error;

use crate::{
    configuration::DataSourcePlannerConfiguration,
    tests::testkit::{
        client_schema, data_source, init_logger, plan_fetch, root_fetch, upstream_query,
    },
    utils::pretty_display::PrettyDisplay,
    variables::{JsonRenderer, Variable},
};

const CLIENT_SCHEMA: &str = r#"
    type Query {
      product: Product
      search(filter: SearchFilter): [Product]
      stock(sku: String!): Int
    }
    input SearchFilter {
      term: String
      limit: Int
    }
    type Product {
      id: ID!
      sku: String!
      stock: Int
    }
"#;

#[test]
fn literal_arguments_keep_their_nested_variables() -> Result<(), Box<dyn Error>> {
    init_logger();
    let catalog = data_source(
        r#"
fetch:
  url: http://catalog.svc/graphql
upstream_schema:
  source: inline
  sdl: |
    type Query { search(filter: SearchFilter): [Product] }
    input SearchFilter { term: String limit: Int }
    type Product { id: ID! sku: String! }
fields:
  - type_name: Query
    field_name: search
    arguments:
      - name: filter
"#,
    );

    let fetch = plan_fetch(
        &catalog,
        &client_schema(CLIENT_SCHEMA),
        r#"
            query Search($term: String, $limit: Int = 10) {
              search(filter: { term: $term, limit: $limit }) { id }
            }
        "#,
        root_fetch(),
    )?;

    insta::assert_snapshot!(upstream_query(&fetch), @"query($limit: Int = 10, $term: String){search(filter: {limit: $limit, term: $term}){id}}");
    assert_eq!(
        fetch.variables,
        vec![
            Variable::Context {
                path: vec!["limit".to_string()],
                renderer: JsonRenderer::new("Int"),
            },
            Variable::Context {
                path: vec!["term".to_string()],
                renderer: JsonRenderer::new("String"),
            },
        ]
    );

    Ok(())
}

#[test]
fn unconfigured_arguments_are_not_forwarded() -> Result<(), Box<dyn Error>> {
    init_logger();
    let catalog = data_source(
        r#"
fetch:
  url: http://catalog.svc/graphql
upstream_schema:
  source: inline
  sdl: |
    type Query { search(filter: SearchFilter): [Product] }
    input SearchFilter { term: String limit: Int }
    type Product { id: ID! sku: String! }
"#,
    );

    let fetch = plan_fetch(
        &catalog,
        &client_schema(CLIENT_SCHEMA),
        r#"query($term: String) { search(filter: { term: $term }) { sku } }"#,
        root_fetch(),
    )?;

    insta::assert_snapshot!(upstream_query(&fetch), @"{search {sku}}");
    assert!(fetch.variables.is_empty());

    Ok(())
}

#[test]
fn object_field_argument_reads_from_parent_object() -> Result<(), Box<dyn Error>> {
    init_logger();
    let inventory = data_source(
        r#"
fetch:
  url: http://inventory.svc/graphql
upstream_schema:
  source: inline
  sdl: |
    type Query { stock(sku: String!): Int }
fields:
  - type_name: Product
    field_name: stock
    arguments:
      - name: sku
        source_type: object_field
        source_path: [sku]
metadata:
  root_nodes:
    - type_name: Product
      field_names: [stock]
"#,
    );

    let fetch = plan_fetch(
        &inventory,
        &client_schema(CLIENT_SCHEMA),
        "{ product { id stock } }",
        DataSourcePlannerConfiguration {
            parent_path: "query.product".to_string(),
            is_nested: true,
            fetch_id: 1,
            depends_on_fetch_ids: vec![0],
            ..Default::default()
        },
    )?;

    insta::assert_snapshot!(format!("{}", fetch.pretty()), @r#"
    Fetch(1) {
      kind: Plain
      depends_on: [0]
      data_path: data
      input: {"method":"POST","url":"http://inventory.svc/graphql","body":{"query":"query($a: String!){stock(sku: $a)}","variables":{"a":$$0$$}}}
    }
    "#);
    assert_eq!(
        fetch.variables,
        vec![Variable::Object {
            path: vec!["sku".to_string()],
            renderer: JsonRenderer::new("String!"),
        }]
    );

    Ok(())
}

#[test]
fn argument_types_follow_type_renames() -> Result<(), Box<dyn Error>> {
    init_logger();
    let catalog = data_source(
        r#"
fetch:
  url: http://catalog.svc/graphql
upstream_schema:
  source: inline
  sdl: |
    type Query { search(filter: CatalogFilter): [Product] }
    input CatalogFilter { term: String limit: Int }
    type Product { id: ID! }
types:
  - type_name: SearchFilter
    rename_to: CatalogFilter
fields:
  - type_name: Query
    field_name: search
    arguments:
      - name: filter
"#,
    );

    let fetch = plan_fetch(
        &catalog,
        &client_schema(CLIENT_SCHEMA),
        "query($filter: SearchFilter) { search(filter: $filter) { id } }",
        root_fetch(),
    )?;

    insta::assert_snapshot!(upstream_query(&fetch), @"query($filter: CatalogFilter){search(filter: $filter){id}}");
    assert_eq!(
        fetch.variables,
        vec![Variable::Context {
            path: vec!["filter".to_string()],
            renderer: JsonRenderer::new("SearchFilter"),
        }]
    );

    Ok(())
}
