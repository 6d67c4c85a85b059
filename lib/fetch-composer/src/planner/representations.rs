use std::sync::Arc;

use tracing::{debug, instrument};

use crate::{
    configuration::PathType,
    planner::{PlannerError, UpstreamPlanner, REPRESENTATIONS},
    representation::{merge_representation_nodes, RepresentationBuilder, RepresentationError},
    schema::SchemaIndex,
    variables::Variable,
};

impl UpstreamPlanner {
    /// Builds the template of the `representations` variable out of the required
    /// field sets and binds the variable to its placeholder.
    #[instrument(level = "trace", skip_all)]
    pub(super) fn add_representations_variable(
        &mut self,
        definition: &SchemaIndex,
    ) -> Result<(), PlannerError> {
        let required_fields = &self.planner_configuration.required_fields;
        if required_fields.is_empty() {
            return Ok(());
        }

        let mut entity_types: Vec<&str> = vec![];
        for required in required_fields {
            if !entity_types.contains(&required.type_name.as_str()) {
                entity_types.push(&required.type_name);
            }
        }
        if entity_types.len() > 1 && self.planner_configuration.path_type == PathType::Object {
            return Err(RepresentationError::MultipleEntityTypes(
                entity_types.into_iter().map(str::to_string).collect(),
            )
            .into());
        }

        let builder = RepresentationBuilder::new(definition, &self.configuration.federation);
        let nodes = required_fields
            .iter()
            .map(|required| builder.build(required))
            .collect::<Result<Vec<_>, _>>()?;
        let template = Arc::new(merge_representation_nodes(nodes));

        let (placeholder, _) = self.variables.add(Variable::ResolvableObject {
            template: template.clone(),
        });
        self.upstream_variables.set(REPRESENTATIONS, format!("[{}]", placeholder));
        self.representation = Some(template);
        self.extract_entities = true;

        debug!(
            required_field_sets = required_fields.len(),
            "representations variable added"
        );
        Ok(())
    }
}
