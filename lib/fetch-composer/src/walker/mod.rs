mod context;
mod error;

use graphql_parser::query::{
    Definition, Directive, Field, FragmentDefinition, OperationDefinition, Selection,
    SelectionSet, TypeCondition, Value, VariableDefinition,
};
use tracing::{instrument, trace};

use crate::{
    configuration::DataSourcePlannerConfiguration,
    schema::{DirectivePlacement, OperationKind, SchemaIndex},
    utils::parsing::OperationDocument,
};

pub use context::{FieldRef, WalkContext};
pub use error::WalkerError;

pub type ParsedField = Field<'static, String>;
pub type ParsedSelectionSet = SelectionSet<'static, String>;
pub type ParsedDirective = Directive<'static, String>;
pub type ParsedVariableDefinition = VariableDefinition<'static, String>;

/// Whether the walker descends into a field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Visit {
    Children,
    /// Skips the arguments, directives, selection set and leave event of the field.
    Skip,
}

pub struct OperationView<'a> {
    pub kind: OperationKind,
    pub name: Option<&'a str>,
    pub variable_definitions: &'a [ParsedVariableDefinition],
    pub directives: &'a [ParsedDirective],
}

/// An inline fragment, or a fragment spread walked as the inline form of its definition.
pub struct InlineFragmentView<'a> {
    pub type_condition: Option<&'a str>,
    pub directives: &'a [ParsedDirective],
    pub selection_set: &'a ParsedSelectionSet,
}

/// Receives the events of a scoped operation walk, in document order.
pub trait OperationVisitor {
    type Error: From<WalkerError>;

    fn enter_document(&mut self, _ctx: &WalkContext) -> Result<(), Self::Error> {
        Ok(())
    }

    fn leave_document(&mut self, _ctx: &WalkContext) -> Result<(), Self::Error> {
        Ok(())
    }

    fn enter_operation(
        &mut self,
        _ctx: &WalkContext,
        _operation: &OperationView,
    ) -> Result<(), Self::Error> {
        Ok(())
    }

    fn leave_operation(&mut self, _ctx: &WalkContext) -> Result<(), Self::Error> {
        Ok(())
    }

    fn enter_variable_definition(
        &mut self,
        _ctx: &WalkContext,
        _definition: &ParsedVariableDefinition,
    ) -> Result<(), Self::Error> {
        Ok(())
    }

    fn enter_selection_set(&mut self, _ctx: &WalkContext) -> Result<(), Self::Error> {
        Ok(())
    }

    fn leave_selection_set(&mut self, _ctx: &WalkContext) -> Result<(), Self::Error> {
        Ok(())
    }

    fn enter_field(
        &mut self,
        _ctx: &WalkContext,
        _field_ref: FieldRef,
        _field: &ParsedField,
    ) -> Result<Visit, Self::Error> {
        Ok(Visit::Children)
    }

    fn leave_field(
        &mut self,
        _ctx: &WalkContext,
        _field_ref: FieldRef,
        _field: &ParsedField,
    ) -> Result<(), Self::Error> {
        Ok(())
    }

    fn enter_argument(
        &mut self,
        _ctx: &WalkContext,
        _field_ref: FieldRef,
        _name: &str,
        _value: &Value<'static, String>,
    ) -> Result<(), Self::Error> {
        Ok(())
    }

    fn enter_inline_fragment(
        &mut self,
        _ctx: &WalkContext,
        _fragment: &InlineFragmentView,
    ) -> Result<(), Self::Error> {
        Ok(())
    }

    fn leave_inline_fragment(
        &mut self,
        _ctx: &WalkContext,
        _fragment: &InlineFragmentView,
    ) -> Result<(), Self::Error> {
        Ok(())
    }

    fn enter_directive(
        &mut self,
        _ctx: &WalkContext,
        _directive: &ParsedDirective,
        _placement: DirectivePlacement,
    ) -> Result<(), Self::Error> {
        Ok(())
    }
}

struct Walker<'a, V: OperationVisitor> {
    ctx: WalkContext<'a>,
    document: &'a OperationDocument,
    scope: &'a DataSourcePlannerConfiguration,
    visitor: &'a mut V,
    fragment_stack: Vec<&'a str>,
}

/// Walks the selected operation of `document`, dispatching only the part of it
/// `scope` covers: fields strictly below the parent path that are planned, and the
/// selection sets owned by the parent path or by a dispatched field.
#[instrument(level = "trace", skip_all, fields(parent_path = %scope.parent_path))]
pub fn walk_operation<V: OperationVisitor>(
    definition: &SchemaIndex,
    document: &OperationDocument,
    operation_name: Option<&str>,
    scope: &DataSourcePlannerConfiguration,
    visitor: &mut V,
) -> Result<(), V::Error> {
    let (kind, name, variable_definitions, directives, selection_set) =
        find_operation(document, operation_name)?;

    let root_type = definition
        .root_type(kind)
        .ok_or(WalkerError::MissingRootType(kind))?;

    let mut walker = Walker {
        ctx: WalkContext::new(definition, variable_definitions),
        document,
        scope,
        visitor,
        fragment_stack: vec![],
    };

    walker.visitor.enter_document(&walker.ctx)?;
    walker.visitor.enter_operation(
        &walker.ctx,
        &OperationView {
            kind,
            name,
            variable_definitions,
            directives,
        },
    )?;
    for variable_definition in variable_definitions {
        walker
            .visitor
            .enter_variable_definition(&walker.ctx, variable_definition)?;
    }
    let placement = DirectivePlacement::for_operation(kind);
    for directive in directives {
        walker
            .visitor
            .enter_directive(&walker.ctx, directive, placement)?;
    }

    walker.ctx.push_path_segment(kind.as_str());
    walker.ctx.push_type(root_type);
    let dispatch = walker.ctx.path_string() == scope.parent_path;
    walker.walk_selection_set(selection_set, dispatch)?;
    walker.ctx.pop_type();
    walker.ctx.pop_path_segment();

    walker.visitor.leave_operation(&walker.ctx)?;
    walker.visitor.leave_document(&walker.ctx)?;

    Ok(())
}

type FoundOperation<'a> = (
    OperationKind,
    Option<&'a str>,
    &'a [ParsedVariableDefinition],
    &'a [ParsedDirective],
    &'a ParsedSelectionSet,
);

fn find_operation<'a>(
    document: &'a OperationDocument,
    operation_name: Option<&str>,
) -> Result<FoundOperation<'a>, WalkerError> {
    document
        .definitions
        .iter()
        .filter_map(|definition| match definition {
            Definition::Operation(operation) => Some(operation),
            Definition::Fragment(_) => None,
        })
        .map(|operation| -> FoundOperation<'a> {
            match operation {
                OperationDefinition::SelectionSet(selection_set) => {
                    (OperationKind::Query, None, &[], &[], selection_set)
                }
                OperationDefinition::Query(query) => (
                    OperationKind::Query,
                    query.name.as_deref(),
                    &query.variable_definitions,
                    &query.directives,
                    &query.selection_set,
                ),
                OperationDefinition::Mutation(mutation) => (
                    OperationKind::Mutation,
                    mutation.name.as_deref(),
                    &mutation.variable_definitions,
                    &mutation.directives,
                    &mutation.selection_set,
                ),
                OperationDefinition::Subscription(subscription) => (
                    OperationKind::Subscription,
                    subscription.name.as_deref(),
                    &subscription.variable_definitions,
                    &subscription.directives,
                    &subscription.selection_set,
                ),
            }
        })
        .find(|(_, name, ..)| operation_name.is_none() || *name == operation_name)
        .ok_or_else(|| WalkerError::OperationNotFound(operation_name.map(str::to_string)))
}

impl<'a, V: OperationVisitor> Walker<'a, V> {
    fn walk_selection_set(
        &mut self,
        selection_set: &'a ParsedSelectionSet,
        dispatch: bool,
    ) -> Result<(), V::Error> {
        if dispatch {
            self.visitor.enter_selection_set(&self.ctx)?;
        }
        self.ctx.enter_selection_set();

        for item in &selection_set.items {
            match item {
                Selection::Field(field) => self.walk_field(field)?,
                Selection::InlineFragment(fragment) => {
                    let view = InlineFragmentView {
                        type_condition: fragment.type_condition.as_ref().map(|condition| {
                            let TypeCondition::On(name) = condition;
                            name.as_str()
                        }),
                        directives: &fragment.directives,
                        selection_set: &fragment.selection_set,
                    };
                    self.walk_fragment(view, dispatch)?;
                }
                Selection::FragmentSpread(spread) => {
                    let definition = self.fragment_definition(&spread.fragment_name)?;
                    if self.fragment_stack.contains(&definition.name.as_str()) {
                        return Err(WalkerError::FragmentCycle(definition.name.clone()).into());
                    }

                    let TypeCondition::On(type_condition) = &definition.type_condition;
                    let view = InlineFragmentView {
                        type_condition: Some(type_condition.as_str()),
                        directives: &spread.directives,
                        selection_set: &definition.selection_set,
                    };
                    self.fragment_stack.push(&definition.name);
                    self.walk_fragment(view, dispatch)?;
                    self.fragment_stack.pop();
                }
            }
        }

        self.ctx.leave_selection_set();
        if dispatch {
            self.visitor.leave_selection_set(&self.ctx)?;
        }

        Ok(())
    }

    fn fragment_definition(
        &self,
        name: &str,
    ) -> Result<&'a FragmentDefinition<'static, String>, WalkerError> {
        self.document
            .definitions
            .iter()
            .find_map(|definition| match definition {
                Definition::Fragment(fragment) if fragment.name == name => Some(fragment),
                _ => None,
            })
            .ok_or_else(|| WalkerError::UnknownFragment(name.to_string()))
    }

    fn walk_fragment(
        &mut self,
        fragment: InlineFragmentView<'a>,
        parent_dispatched: bool,
    ) -> Result<(), V::Error> {
        let type_name = fragment
            .type_condition
            .unwrap_or(self.ctx.enclosing_type())
            .to_string();
        let dispatch = parent_dispatched
            && self.contains_dispatchable_field(fragment.selection_set, &mut vec![]);

        if dispatch {
            self.visitor.enter_inline_fragment(&self.ctx, &fragment)?;
            for directive in fragment.directives {
                self.visitor.enter_directive(
                    &self.ctx,
                    directive,
                    DirectivePlacement::InlineFragment,
                )?;
            }
        }

        self.ctx.push_type(&type_name);
        self.walk_selection_set(fragment.selection_set, dispatch)?;
        self.ctx.pop_type();

        if dispatch {
            self.visitor.leave_inline_fragment(&self.ctx, &fragment)?;
        }

        Ok(())
    }

    fn is_dispatchable(&self, path: &str) -> bool {
        path != self.scope.parent_path
            && self.scope.is_within_parent_path(path)
            && self.scope.is_planned(path)
    }

    /// Whether walking the selection set at the current path dispatches at least one field.
    fn contains_dispatchable_field(
        &self,
        selection_set: &'a ParsedSelectionSet,
        visited_fragments: &mut Vec<&'a str>,
    ) -> bool {
        let base = self.ctx.path_string();
        selection_set.items.iter().any(|item| match item {
            Selection::Field(field) => {
                let key = field.alias.as_deref().unwrap_or(&field.name);
                self.is_dispatchable(&format!("{}.{}", base, key))
            }
            Selection::InlineFragment(fragment) => {
                self.contains_dispatchable_field(&fragment.selection_set, visited_fragments)
            }
            Selection::FragmentSpread(spread) => {
                if visited_fragments.contains(&spread.fragment_name.as_str()) {
                    return false;
                }
                match self.fragment_definition(&spread.fragment_name) {
                    Ok(definition) => {
                        visited_fragments.push(&definition.name);
                        self.contains_dispatchable_field(
                            &definition.selection_set,
                            visited_fragments,
                        )
                    }
                    Err(_) => false,
                }
            }
        })
    }

    fn walk_field(&mut self, field: &'a ParsedField) -> Result<(), V::Error> {
        let response_key = field.alias.as_deref().unwrap_or(&field.name);
        let field_ref = self.ctx.next_field_ref();
        self.ctx.push_path_segment(response_key);
        let path = self.ctx.path_string();

        let result = if self.is_dispatchable(&path) {
            self.dispatch_field(field_ref, field)
        } else if path == self.scope.parent_path || self.scope.is_parent_path_ancestor(&path) {
            trace!(path = %path, "descending towards the parent path");
            match self.field_type(field)? {
                Some(field_type) => {
                    self.ctx.push_type(&field_type);
                    let dispatch = path == self.scope.parent_path;
                    let result = self.walk_selection_set(&field.selection_set, dispatch);
                    self.ctx.pop_type();
                    result
                }
                None => Ok(()),
            }
        } else {
            Ok(())
        };

        self.ctx.pop_path_segment();
        result
    }

    fn dispatch_field(
        &mut self,
        field_ref: FieldRef,
        field: &'a ParsedField,
    ) -> Result<(), V::Error> {
        trace!(path = %self.ctx.path_string(), "enter field");
        if self.visitor.enter_field(&self.ctx, field_ref, field)? == Visit::Skip {
            return Ok(());
        }

        for directive in &field.directives {
            self.visitor
                .enter_directive(&self.ctx, directive, DirectivePlacement::Field)?;
        }
        for (name, value) in &field.arguments {
            self.visitor
                .enter_argument(&self.ctx, field_ref, name, value)?;
        }

        if let Some(field_type) = self.field_type(field)? {
            self.ctx.push_type(&field_type);
            self.walk_selection_set(&field.selection_set, true)?;
            self.ctx.pop_type();
        }

        self.visitor.leave_field(&self.ctx, field_ref, field)
    }

    /// The named type of a field with a selection set, `None` for leaves.
    fn field_type(&self, field: &ParsedField) -> Result<Option<String>, WalkerError> {
        if field.selection_set.items.is_empty() {
            return Ok(None);
        }

        let enclosing = self.ctx.enclosing_type();
        self.ctx
            .schema()
            .field(enclosing, &field.name)
            .map(|definition| Some(definition.field_type.inner_type().to_string()))
            .ok_or_else(|| WalkerError::UnknownField(enclosing.to_string(), field.name.clone()))
    }
}
