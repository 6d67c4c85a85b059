use graphql_parser::query::Value as ParsedValue;
use hive_router_composer_config::fields::{ArgumentConfig, ArgumentSourceType, FieldConfig};
use tracing::trace;

use crate::{
    ast::{FieldId, Value, VariableDefinition},
    planner::UpstreamPlanner,
    schema::TypeNode,
    variables::{JsonRenderer, Variable},
    walker::{ParsedField, WalkContext},
};

impl UpstreamPlanner {
    /// Binds the configured arguments of a field to upstream variables.
    pub(super) fn configure_arguments(
        &mut self,
        ctx: &WalkContext,
        upstream_field: FieldId,
        field: &ParsedField,
        field_configuration: Option<&FieldConfig>,
    ) {
        let Some(field_configuration) = field_configuration else {
            return;
        };

        for argument in &field_configuration.arguments {
            match argument.source_type {
                ArgumentSourceType::FieldArgument => {
                    self.configure_field_argument_source(ctx, upstream_field, field, argument)
                }
                ArgumentSourceType::ObjectField => self.configure_object_field_source(
                    ctx,
                    upstream_field,
                    field,
                    field_configuration,
                    argument,
                ),
            }
        }
    }

    /// The upstream name of a variable type: the configured override, or the
    /// type-rename table applied to the innermost named type.
    fn upstream_variable_type(
        &self,
        argument: Option<&ArgumentConfig>,
        var_type: &TypeNode,
    ) -> TypeNode {
        let override_name = argument
            .and_then(|argument| argument.rename_type_to.as_deref())
            .filter(|name| !name.is_empty());
        match override_name {
            Some(name) => var_type.with_inner_type(name),
            None => {
                var_type.with_inner_type(self.configuration.rename_type(var_type.inner_type()))
            }
        }
    }

    fn configure_field_argument_source(
        &mut self,
        ctx: &WalkContext,
        upstream_field: FieldId,
        field: &ParsedField,
        argument: &ArgumentConfig,
    ) {
        let Some((_, value)) = field.arguments.iter().find(|(name, _)| *name == argument.name)
        else {
            trace!(argument = %argument.name, "argument is not set on the client field");
            return;
        };

        let ParsedValue::Variable(variable_name) = value else {
            self.document
                .field_mut(upstream_field)
                .arguments
                .push((argument.name.clone(), Value::from(value)));
            self.add_nested_variables(ctx, value, &argument.source_path);
            return;
        };

        let Some(argument_definition) =
            ctx.schema()
                .field_argument(ctx.enclosing_type(), &field.name, &argument.name)
        else {
            trace!(argument = %argument.name, "argument is not defined by the client schema");
            return;
        };

        let (placeholder, exists) = self.variables.add(Variable::Context {
            path: vec![variable_name.clone()],
            renderer: JsonRenderer::new(&argument_definition.value_type),
        });
        self.document
            .field_mut(upstream_field)
            .arguments
            .push((argument.name.clone(), Value::Variable(variable_name.clone())));
        if exists {
            return;
        }

        if let Some(definition) = ctx.variable_definition(variable_name) {
            let var_type =
                self.upstream_variable_type(Some(argument), &TypeNode::from(&definition.var_type));
            self.document.add_variable_definition(VariableDefinition {
                name: variable_name.clone(),
                var_type,
                default_value: None,
            });
        }
        self.upstream_variables.set(variable_name.clone(), placeholder);
    }

    /// Registers the variables used inside a literal argument value. Each one is
    /// looked up under the source path of the argument.
    fn add_nested_variables(
        &mut self,
        ctx: &WalkContext,
        value: &ParsedValue<'static, String>,
        source_path: &[String],
    ) {
        match value {
            ParsedValue::Object(fields) => {
                for field_value in fields.values() {
                    self.add_nested_variables(ctx, field_value, source_path);
                }
            }
            ParsedValue::List(items) => {
                for item in items {
                    self.add_nested_variables(ctx, item, source_path);
                }
            }
            ParsedValue::Variable(variable_name) => {
                let Some(definition) = ctx.variable_definition(variable_name) else {
                    return;
                };
                let var_type = TypeNode::from(&definition.var_type);

                let mut path = source_path.to_vec();
                path.push(variable_name.clone());
                let (placeholder, exists) = self.variables.add(Variable::Context {
                    path,
                    renderer: JsonRenderer::new(&var_type),
                });
                if exists {
                    return;
                }

                let upstream_type = self.upstream_variable_type(None, &var_type);
                self.document.add_variable_definition(VariableDefinition {
                    name: variable_name.clone(),
                    var_type: upstream_type,
                    default_value: definition.default_value.as_ref().map(Value::from),
                });
                self.upstream_variables.set(variable_name.clone(), placeholder);
            }
            _ => {}
        }
    }

    fn configure_object_field_source(
        &mut self,
        ctx: &WalkContext,
        upstream_field: FieldId,
        field: &ParsedField,
        field_configuration: &FieldConfig,
        argument: &ArgumentConfig,
    ) {
        if argument.source_path.is_empty() {
            return;
        }

        let field_name = match field_configuration.path.as_slice() {
            [path] => path.as_str(),
            _ => field.name.as_str(),
        };
        let schema = ctx.schema();
        let Some(argument_definition) =
            schema.field_argument(&schema.query_type, field_name, &argument.name)
        else {
            trace!(
                field = field_name,
                argument = %argument.name,
                "object field argument has no definition"
            );
            return;
        };

        let variable_name = self.document.generate_unused_variable_name();
        self.document
            .field_mut(upstream_field)
            .arguments
            .push((argument.name.clone(), Value::Variable(variable_name.clone())));
        let upstream_type =
            self.upstream_variable_type(Some(argument), &argument_definition.value_type);
        self.document.add_variable_definition(VariableDefinition {
            name: variable_name.clone(),
            var_type: upstream_type,
            default_value: None,
        });

        let (placeholder, exists) = self.variables.add(Variable::Object {
            path: argument.source_path.clone(),
            renderer: JsonRenderer::new(&argument_definition.value_type),
        });
        if !exists {
            self.upstream_variables.set(variable_name, placeholder);
        }
    }
}
