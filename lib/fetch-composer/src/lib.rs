pub mod ast;
pub mod configuration;
pub mod federation;
pub mod fetch;
pub mod planner;
pub mod pool;
pub mod representation;
pub mod schema;
pub mod utils;
pub mod variables;
pub mod walker;

#[cfg(test)]
mod tests;

use tracing::instrument;

use crate::{
    configuration::DataSourcePlannerConfiguration,
    fetch::FetchConfiguration,
    planner::{PlannerError, PlannerFactory},
    schema::SchemaIndex,
    utils::parsing::OperationDocument,
};

/// Plans one fetch of a data source and assembles its descriptor.
#[instrument(level = "debug", skip_all, fields(parent_path = %planner_configuration.parent_path))]
pub fn compose_fetch(
    factory: &PlannerFactory,
    definition: &SchemaIndex,
    operation: &OperationDocument,
    operation_name: Option<&str>,
    planner_configuration: DataSourcePlannerConfiguration,
) -> Result<FetchConfiguration, PlannerError> {
    let mut planner = factory.planner(planner_configuration);
    planner.plan(definition, operation, operation_name)?;
    planner.configure_fetch()
}
