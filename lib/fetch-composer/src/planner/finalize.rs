use graphql_tools::validation::validate::validate;
use tracing::{debug, instrument, trace};

use crate::{
    ast::{normalization::normalize, printer::print_document},
    planner::{OperationError, PlannerError, UpstreamPlanner},
    schema::base::replace_query_type,
    utils::parsing::{
        parse_validation_operation, to_validation_schema, ValidationSchemaDocument,
    },
};

impl UpstreamPlanner {
    /// Normalizes and prints the upstream operation, then checks that it parses
    /// and validates against the upstream schema.
    #[instrument(level = "debug", skip_all)]
    pub(super) fn print_operation(&mut self) -> Result<String, PlannerError> {
        if self.document.operation.selection_set.is_none() {
            return Err(PlannerError::Internal(
                "the upstream operation has no root selection set".to_string(),
            ));
        }

        normalize(&mut self.document);

        let mut scratch = self.pool.checkout();
        print_document(&self.document, &mut scratch.printed);

        let operation = parse_validation_operation(&scratch.printed)
            .map_err(|error| OperationError::Parse(error.to_string()))?;

        let replaced = self.replaced_validation_schema()?;
        let schema: &ValidationSchemaDocument = match &replaced {
            Some(schema) => schema,
            None => self.configuration.validation_document.as_ref(),
        };

        let errors = validate(schema, &operation, &self.validation_plan);
        if !errors.is_empty() {
            debug!(
                errors = errors.len(),
                query = %scratch.printed,
                "upstream operation is invalid"
            );
            return Err(OperationError::Validation(
                errors.into_iter().map(|error| error.message).collect(),
            )
            .into());
        }

        trace!(query = %scratch.printed, "upstream operation printed");
        Ok(scratch.printed.clone())
    }

    /// Nested fetches of plain data sources may start below the query root. Their
    /// root field is then validated against its own type, promoted to query root.
    fn replaced_validation_schema(
        &self,
    ) -> Result<Option<ValidationSchemaDocument>, PlannerError> {
        if !self.planner_configuration.is_nested || self.configuration.federation_enabled {
            return Ok(None);
        }

        let Some(root_field) = self.root_field.as_ref() else {
            return Ok(None);
        };
        let schema = &self.configuration.upstream_schema;
        if schema
            .field(&schema.query_type, &root_field.field_name)
            .is_some()
        {
            return Ok(None);
        }

        let root_type = self.configuration.rename_type(&root_field.type_name);
        trace!(root_type, "validating against a replaced query type");
        let replaced =
            replace_query_type(&self.configuration.validation_schema, schema, root_type);
        to_validation_schema(&replaced)
            .map(Some)
            .map_err(|error| PlannerError::Internal(error.to_string()))
    }
}
