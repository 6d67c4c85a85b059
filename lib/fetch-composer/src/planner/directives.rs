use graphql_parser::query::Value as ParsedValue;
use tracing::trace;

use crate::{
    ast::{Directive, Value, VariableDefinition},
    planner::{stack::Container, PlannerError, UpstreamPlanner, REMOVE_NULL_VARIABLES},
    schema::{DirectivePlacement, TypeNode},
    variables::{JsonRenderer, Variable},
    walker::{ParsedDirective, WalkContext},
};

fn attaches_to(placement: DirectivePlacement, container: Container) -> bool {
    matches!(
        (placement, container),
        (
            DirectivePlacement::Query
                | DirectivePlacement::Mutation
                | DirectivePlacement::Subscription,
            Container::Operation
        ) | (DirectivePlacement::Field, Container::Field(_))
            | (DirectivePlacement::InlineFragment, Container::InlineFragment(_))
    )
}

impl UpstreamPlanner {
    /// Copies a client directive onto the upstream node it belongs to, when both
    /// schemas allow it there, and registers the variables it references.
    pub(super) fn add_directive(
        &mut self,
        ctx: &WalkContext,
        directive: &ParsedDirective,
        placement: DirectivePlacement,
    ) -> Result<(), PlannerError> {
        if directive.name == REMOVE_NULL_VARIABLES {
            return Ok(());
        }

        let placement = match placement {
            DirectivePlacement::Query
            | DirectivePlacement::Mutation
            | DirectivePlacement::Subscription => {
                DirectivePlacement::for_operation(self.document.operation.kind)
            }
            other => other,
        };

        let target = self.stack.top()?;
        if !attaches_to(placement, target) {
            trace!(directive = %directive.name, "directive has no upstream node to attach to");
            return Ok(());
        }
        if !ctx.schema().directive_allowed(&directive.name, placement) {
            trace!(directive = %directive.name, "directive is not allowed by the client schema");
            return Ok(());
        }

        let configuration = self.configuration.clone();
        let upstream_name = configuration.rename_directive(&directive.name);
        if !configuration
            .upstream_schema
            .directive_allowed(upstream_name, placement)
        {
            trace!(directive = upstream_name, "directive is not allowed by the upstream schema");
            return Ok(());
        }

        let upstream_directive = Directive {
            name: upstream_name.to_string(),
            arguments: directive
                .arguments
                .iter()
                .map(|(name, value)| (name.clone(), Value::from(value)))
                .collect(),
        };
        match target {
            Container::Operation => self.document.operation.directives.push(upstream_directive),
            Container::Field(field) => self
                .document
                .field_mut(field)
                .directives
                .push(upstream_directive),
            Container::InlineFragment(fragment) => self
                .document
                .inline_fragment_mut(fragment)
                .directives
                .push(upstream_directive),
            Container::SelectionSet(_) => {}
        }

        for (_, value) in &directive.arguments {
            let ParsedValue::Variable(variable_name) = value else {
                continue;
            };
            let Some(definition) = ctx.variable_definition(variable_name) else {
                continue;
            };

            let var_type = TypeNode::from(&definition.var_type);
            let (placeholder, exists) = self.variables.add(Variable::Context {
                path: vec![variable_name.clone()],
                renderer: JsonRenderer::new(&var_type),
            });
            if exists {
                continue;
            }

            // Directives of the client variable definition are not carried over:
            // graphql-parser 0.4 does not parse them.
            self.document.add_variable_definition(VariableDefinition {
                name: variable_name.clone(),
                var_type: var_type
                    .with_inner_type(configuration.rename_type(var_type.inner_type())),
                default_value: None,
            });
            self.upstream_variables.set(variable_name.clone(), placeholder);
        }

        Ok(())
    }
}
