use std::error::Error;

use crate::{
    configuration::DataSourcePlannerConfiguration,
    planner::PlannerError,
    tests::testkit::{client_schema, data_source, init_logger, plan},
};

const CLIENT_SCHEMA: &str = r#"
    type Query {
      latestReviews: [Review]
    }
    type Subscription {
      reviewAdded(productId: ID!): Review
      reviews: Review
    }
    type Review {
      body: String
    }
"#;

const UPSTREAM: &str = r#"
upstream_schema:
  source: inline
  sdl: |
    type Query { latestReviews: [Review] }
    type Subscription { reviewAdded(productId: ID!): Review reviews: Review }
    type Review { body: String }
fields:
  - type_name: Subscription
    field_name: reviewAdded
    arguments:
      - name: productId
"#;

fn subscription_root() -> DataSourcePlannerConfiguration {
    DataSourcePlannerConfiguration {
        parent_path: "subscription".to_string(),
        ..Default::default()
    }
}

#[test]
fn subscription_input_carries_transport_settings() -> Result<(), Box<dyn Error>> {
    init_logger();
    let reviews = data_source(&format!(
        r#"
fetch:
  url: http://reviews.svc/graphql
subscription:
  url: ws://reviews.svc/graphql
  forwarded_client_headers: [authorization]
  ws_subprotocol: graphql-transport-ws
{UPSTREAM}"#
    ));

    let mut planner = plan(
        &reviews,
        &client_schema(CLIENT_SCHEMA),
        "subscription($productId: ID!) { reviewAdded(productId: $productId) { body } }",
        subscription_root(),
    )?;
    let subscription = planner.configure_subscription()?;

    insta::assert_snapshot!(subscription.input, @r#"{"url":"ws://reviews.svc/graphql","body":{"query":"subscription($productId: ID!){reviewAdded(productId: $productId){body}}","variables":{"productId":$$0$$}},"forwarded_client_headers":["authorization"],"ws_sub_protocol":"graphql-transport-ws"}"#);
    assert_eq!(subscription.variables.len(), 1);
    assert_eq!(
        subscription.post_processing.select_response_data_path,
        vec!["data".to_string()]
    );

    Ok(())
}

#[test]
fn subscription_over_sse_without_variables() -> Result<(), Box<dyn Error>> {
    init_logger();
    let reviews = data_source(&format!(
        r#"
fetch:
  url: http://reviews.svc/graphql
subscription:
  url: http://reviews.svc/graphql/stream
  use_sse: true
  sse_method_post: true
{UPSTREAM}"#
    ));

    let mut planner = plan(
        &reviews,
        &client_schema(CLIENT_SCHEMA),
        "subscription { reviews { body } }",
        subscription_root(),
    )?;
    let subscription = planner.configure_subscription()?;

    insta::assert_snapshot!(subscription.input, @r#"{"url":"http://reviews.svc/graphql/stream","body":{"query":"subscription {reviews {body}}","variables":{}},"use_sse":true,"sse_method_post":true,"ws_sub_protocol":"auto"}"#);

    Ok(())
}

#[test]
fn subscription_needs_a_subscription_configuration() -> Result<(), Box<dyn Error>> {
    init_logger();
    let reviews = data_source(&format!(
        r#"
fetch:
  url: http://reviews.svc/graphql
{UPSTREAM}"#
    ));

    let mut planner = plan(
        &reviews,
        &client_schema(CLIENT_SCHEMA),
        "subscription { reviews { body } }",
        subscription_root(),
    )?;

    assert!(matches!(
        planner.configure_subscription(),
        Err(PlannerError::MissingSubscription)
    ));

    Ok(())
}
