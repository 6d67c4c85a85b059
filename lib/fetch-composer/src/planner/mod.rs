mod arguments;
mod directives;
pub mod error;
mod finalize;
mod representations;
mod stack;

use std::sync::Arc;

use graphql_tools::validation::{rules::default_rules_validation_plan, validate::ValidationPlan};
use rustc_hash::FxHashMap;
use tracing::{debug, instrument, trace};

use crate::{
    ast::{Field, InlineFragment, SelectionSetId, UpstreamDocument, Value, VariableDefinition},
    configuration::{DataSourceConfiguration, DataSourcePlannerConfiguration, PathType},
    fetch::{
        input::{write_fetch_input, write_subscription_input, FetchInput},
        FetchConfiguration, FetchKind, PostProcessing, SubscriptionFetchConfiguration,
    },
    pool::ScratchPool,
    representation::ObjectNode,
    schema::{DirectivePlacement, OperationKind, SchemaIndex, TypeNode},
    utils::parsing::OperationDocument,
    variables::{UpstreamVariables, Variables},
    walker::{
        walk_operation, FieldRef, InlineFragmentView, OperationView, OperationVisitor,
        ParsedDirective, ParsedField, Visit, WalkContext,
    },
};

pub use error::{OperationError, PlannerError};
use stack::{Container, ContainerStack};

const TYPENAME: &str = "__typename";
const ENTITIES_FIELD: &str = "_entities";
const REPRESENTATIONS: &str = "representations";
const REMOVE_NULL_VARIABLES: &str = "removeNullVariables";

/// Creates planners for one data source. The configuration and the scratch pool
/// are shared by every planner it creates.
#[derive(Debug, Clone)]
pub struct PlannerFactory {
    configuration: Arc<DataSourceConfiguration>,
    pool: Arc<ScratchPool>,
}

impl PlannerFactory {
    pub fn new(configuration: Arc<DataSourceConfiguration>) -> Self {
        Self::with_pool(configuration, Arc::new(ScratchPool::default()))
    }

    pub fn with_pool(configuration: Arc<DataSourceConfiguration>, pool: Arc<ScratchPool>) -> Self {
        Self {
            configuration,
            pool,
        }
    }

    pub fn configuration(&self) -> &Arc<DataSourceConfiguration> {
        &self.configuration
    }

    pub fn planner(
        &self,
        planner_configuration: DataSourcePlannerConfiguration,
    ) -> UpstreamPlanner {
        UpstreamPlanner {
            configuration: self.configuration.clone(),
            planner_configuration,
            pool: self.pool.clone(),
            document: UpstreamDocument::default(),
            stack: ContainerStack::default(),
            variables: Variables::default(),
            upstream_variables: UpstreamVariables::default(),
            on_type_fragments: FxHashMap::default(),
            entities_selection_set: None,
            root_field: None,
            representation: None,
            unnull_variables: false,
            disallow_single_flight: false,
            extract_entities: false,
            validation_plan: default_rules_validation_plan(),
        }
    }
}

#[derive(Debug, Clone)]
struct RootField {
    type_name: String,
    /// The upstream name, after path renames.
    field_name: String,
}

/// Builds the upstream operation of one fetch from the events of a scoped walk
/// over the client operation, then assembles the fetch descriptor.
///
/// A planner is driven by a single thread. Run [`UpstreamPlanner::plan`] first,
/// then [`UpstreamPlanner::configure_fetch`] or
/// [`UpstreamPlanner::configure_subscription`].
pub struct UpstreamPlanner {
    configuration: Arc<DataSourceConfiguration>,
    planner_configuration: DataSourcePlannerConfiguration,
    pool: Arc<ScratchPool>,
    document: UpstreamDocument,
    stack: ContainerStack,
    variables: Variables,
    upstream_variables: UpstreamVariables,
    /// `(type condition, selection set)` pairs that already got their on-type fragment.
    on_type_fragments: FxHashMap<(String, SelectionSetId), SelectionSetId>,
    entities_selection_set: Option<SelectionSetId>,
    root_field: Option<RootField>,
    representation: Option<Arc<ObjectNode>>,
    unnull_variables: bool,
    disallow_single_flight: bool,
    extract_entities: bool,
    validation_plan: ValidationPlan,
}

impl UpstreamPlanner {
    /// Walks the part of the client operation covered by the planner configuration
    /// and builds the upstream operation out of it.
    #[instrument(level = "trace", skip_all, fields(
        parent_path = %self.planner_configuration.parent_path,
        fetch_id = self.planner_configuration.fetch_id,
    ))]
    pub fn plan(
        &mut self,
        definition: &SchemaIndex,
        operation: &OperationDocument,
        operation_name: Option<&str>,
    ) -> Result<(), PlannerError> {
        let scope = self.planner_configuration.clone();
        walk_operation(definition, operation, operation_name, &scope, self)
    }

    #[instrument(level = "debug", skip_all, fields(fetch_id = self.planner_configuration.fetch_id))]
    pub fn configure_fetch(&mut self) -> Result<FetchConfiguration, PlannerError> {
        let query = self.print_operation()?;
        let kind = self.fetch_kind();
        let configuration = self.configuration.clone();

        let mut scratch = self.pool.checkout();
        write_fetch_input(
            &FetchInput {
                method: &configuration.fetch.method,
                url: &configuration.fetch.url,
                header: &configuration.fetch.header,
                query: &query,
                variables: &self.upstream_variables,
                unnull_variables: self.unnull_variables,
            },
            &mut scratch.input,
        );

        let caching = if self.extract_entities {
            configuration.federation.entity_caching()
        } else {
            configuration.federation.root_field_caching()
        };
        let has_required_fields = self.planner_configuration.has_required_fields();

        debug!(kind = %kind, variables = self.variables.len(), "fetch configured");

        Ok(FetchConfiguration {
            fetch_id: self.planner_configuration.fetch_id,
            depends_on_fetch_ids: self.planner_configuration.depends_on_fetch_ids.clone(),
            kind,
            input: scratch.input.clone(),
            variables: self.variables.iter().cloned().collect(),
            representation: self.representation.clone(),
            post_processing: PostProcessing::for_kind(kind),
            disallow_single_flight: self.disallow_single_flight,
            requires_serial_fetch: has_required_fields
                && self
                    .planner_configuration
                    .required_fields
                    .iter()
                    .any(|required| !required.field_name.is_empty()),
            requires_batch_fetch: has_required_fields
                && self.planner_configuration.path_type != PathType::Object,
            set_template_output_to_null_on_variable_null: self.extract_entities,
            caching: caching.to_vec(),
        })
    }

    #[instrument(level = "debug", skip_all, fields(fetch_id = self.planner_configuration.fetch_id))]
    pub fn configure_subscription(
        &mut self,
    ) -> Result<SubscriptionFetchConfiguration, PlannerError> {
        let configuration = self.configuration.clone();
        let subscription = configuration
            .subscription
            .as_ref()
            .ok_or(PlannerError::MissingSubscription)?;
        let query = self.print_operation()?;

        let mut scratch = self.pool.checkout();
        write_subscription_input(
            subscription,
            &configuration.fetch.header,
            &query,
            &self.upstream_variables,
            &mut scratch.input,
        );

        Ok(SubscriptionFetchConfiguration {
            input: scratch.input.clone(),
            variables: self.variables.iter().cloned().collect(),
            post_processing: PostProcessing::for_kind(FetchKind::Plain),
        })
    }

    pub fn upstream_document(&self) -> &UpstreamDocument {
        &self.document
    }

    pub fn representation(&self) -> Option<&Arc<ObjectNode>> {
        self.representation.as_ref()
    }

    fn reset(&mut self) {
        self.document.reset();
        self.stack.clear();
        self.variables.reset();
        self.upstream_variables.reset();
        self.on_type_fragments.clear();
        self.entities_selection_set = None;
        self.root_field = None;
        self.representation = None;
        self.unnull_variables = false;
        self.disallow_single_flight = false;
        self.extract_entities = false;
    }

    fn fetch_kind(&self) -> FetchKind {
        match (self.extract_entities, self.planner_configuration.path_type) {
            (false, _) => FetchKind::Plain,
            (true, PathType::Object) => FetchKind::SingleEntity,
            (true, _) => FetchKind::BatchEntity,
        }
    }

    fn requires_entities_root(&self) -> bool {
        self.planner_configuration.is_nested
            && self.configuration.federation_enabled
            && self.planner_configuration.has_required_fields()
    }

    /// A nested selection reached without a field on the way, as when a fragment
    /// sits directly in the root selection of a nested fetch.
    fn is_nested_request(&self, ctx: &WalkContext) -> bool {
        !self.stack.contains_field() && ctx.selection_set_depth() >= 2
    }

    fn allow_field(&self, ctx: &WalkContext, field: &ParsedField) -> bool {
        if field.name == TYPENAME {
            return true;
        }

        let enclosing = ctx.enclosing_type();
        if self
            .planner_configuration
            .is_provided(enclosing, &field.name, ctx.path())
        {
            return true;
        }

        // External fields are only resolvable where a parent field provides them.
        if self.configuration.federation.is_external(enclosing, &field.name) {
            return false;
        }

        self.configuration.is_root_node(enclosing, &field.name)
            || self.configuration.is_child_node(enclosing, &field.name)
    }

    /// The upstream form of a client field. A single-segment path mapping renames the
    /// field, with the client name kept as the alias when none is set.
    fn upstream_field(&self, enclosing: &str, field: &ParsedField) -> Field {
        let mut name = field.name.clone();
        let mut alias = field.alias.clone();

        if let Some(field_configuration) =
            self.configuration.field_configuration(enclosing, &field.name)
        {
            if let [path] = field_configuration.path.as_slice() {
                if *path != field.name && alias.is_none() {
                    alias = Some(field.name.clone());
                }
                name = path.clone();
            }
        }

        Field::new(name).with_alias(alias)
    }

    /// Declares `$representations` and wraps the root selection in `_entities`.
    fn add_entities_root(&mut self, root: SelectionSetId) {
        self.document.add_variable_definition(VariableDefinition {
            name: REPRESENTATIONS.to_string(),
            var_type: TypeNode::NonNull(Box::new(TypeNode::List(Box::new(TypeNode::NonNull(
                Box::new(TypeNode::named("_Any")),
            ))))),
            default_value: None,
        });

        let mut entities = Field::new(ENTITIES_FIELD);
        entities.arguments.push((
            REPRESENTATIONS.to_string(),
            Value::Variable(REPRESENTATIONS.to_string()),
        ));
        let entities = self.document.add_field(root, entities);
        let entities_set = self.document.field_selection_set(entities);

        self.stack.push(Container::Field(entities));
        self.stack.push(Container::SelectionSet(entities_set));
        self.entities_selection_set = Some(entities_set);
        trace!("added the _entities root");
    }

    /// The selection set a field attaches to. Fields selected directly on the
    /// `_entities` root go into an `... on Type` fragment, one per type.
    fn field_parent(&mut self, enclosing: &str) -> Result<SelectionSetId, PlannerError> {
        let current = self.stack.current_selection_set()?;
        if self.entities_selection_set != Some(current) {
            return Ok(current);
        }

        let type_condition = self.configuration.rename_type(enclosing).to_string();
        let key = (type_condition, current);
        if let Some(existing) = self.on_type_fragments.get(&key) {
            return Ok(*existing);
        }

        trace!(type_condition = %key.0, "adding on-type fragment");
        self.document.add_typename(current);
        let fragment = self.document.add_inline_fragment(
            current,
            InlineFragment {
                type_condition: Some(key.0.clone()),
                directives: vec![],
                selection_set: None,
            },
        );
        let fragment_set = self.document.inline_fragment_selection_set(fragment);
        self.on_type_fragments.insert(key, fragment_set);

        Ok(fragment_set)
    }
}

impl OperationVisitor for UpstreamPlanner {
    type Error = PlannerError;

    fn enter_document(&mut self, _ctx: &WalkContext) -> Result<(), PlannerError> {
        self.reset();
        Ok(())
    }

    fn leave_document(&mut self, ctx: &WalkContext) -> Result<(), PlannerError> {
        self.add_representations_variable(ctx.schema())
    }

    fn enter_operation(
        &mut self,
        _ctx: &WalkContext,
        operation: &OperationView,
    ) -> Result<(), PlannerError> {
        self.unnull_variables = operation
            .directives
            .iter()
            .any(|directive| directive.name == REMOVE_NULL_VARIABLES);

        let kind = if self.planner_configuration.is_nested {
            OperationKind::Query
        } else {
            operation.kind
        };
        self.document.operation.kind = kind;
        self.disallow_single_flight = kind == OperationKind::Mutation;
        self.stack.push(Container::Operation);

        trace!(kind = %kind, "entered operation");
        Ok(())
    }

    fn leave_operation(&mut self, _ctx: &WalkContext) -> Result<(), PlannerError> {
        self.stack.clear();
        Ok(())
    }

    fn enter_selection_set(&mut self, ctx: &WalkContext) -> Result<(), PlannerError> {
        self.stack.mark();

        let created = match self.stack.top()? {
            Container::SelectionSet(_) => None,
            Container::Operation => {
                let root = self.document.new_selection_set();
                self.document.operation.selection_set = Some(root);
                self.stack.push(Container::SelectionSet(root));
                if self.requires_entities_root() && self.entities_selection_set.is_none() {
                    self.add_entities_root(root);
                }
                Some(root)
            }
            Container::Field(field) => {
                let set = self.document.field_selection_set(field);
                self.stack.push(Container::SelectionSet(set));
                Some(set)
            }
            Container::InlineFragment(fragment) => {
                let set = self.document.inline_fragment_selection_set(fragment);
                self.stack.push(Container::SelectionSet(set));
                Some(set)
            }
        };

        let enclosing = ctx.enclosing_type();
        if created.is_some()
            && ctx.schema().is_interface(enclosing)
            && self.configuration.federation.is_interface_object(enclosing)
        {
            let current = self.stack.current_selection_set()?;
            self.document.add_typename(current);
        }

        Ok(())
    }

    fn leave_selection_set(&mut self, _ctx: &WalkContext) -> Result<(), PlannerError> {
        self.stack.unwind()
    }

    fn enter_field(
        &mut self,
        ctx: &WalkContext,
        _field_ref: FieldRef,
        field: &ParsedField,
    ) -> Result<Visit, PlannerError> {
        if !self.allow_field(ctx, field) {
            trace!(path = ctx.path(), "field is not resolvable by the data source");
            return Ok(Visit::Skip);
        }

        let configuration = self.configuration.clone();
        let enclosing = ctx.enclosing_type();
        let field_configuration = configuration.field_configuration(enclosing, &field.name);

        if configuration.is_custom_scalar_field(enclosing, &field.name) {
            let parent = self.field_parent(enclosing)?;
            let upstream_field = self.upstream_field(enclosing, field);
            let upstream_field = self.document.add_field(parent, upstream_field);
            self.configure_arguments(ctx, upstream_field, field, field_configuration);
            return Ok(Visit::Skip);
        }

        let upstream_field = self.upstream_field(enclosing, field);
        if self.root_field.is_none() && field.name != TYPENAME {
            self.root_field = Some(RootField {
                type_name: enclosing.to_string(),
                field_name: upstream_field.name.clone(),
            });
        }

        let parent = self.field_parent(enclosing)?;
        let upstream_field = self.document.add_field(parent, upstream_field);
        self.stack.mark();
        self.stack.push(Container::Field(upstream_field));
        self.configure_arguments(ctx, upstream_field, field, field_configuration);

        Ok(Visit::Children)
    }

    fn leave_field(
        &mut self,
        _ctx: &WalkContext,
        _field_ref: FieldRef,
        _field: &ParsedField,
    ) -> Result<(), PlannerError> {
        self.stack.unwind()
    }

    fn enter_inline_fragment(
        &mut self,
        ctx: &WalkContext,
        fragment: &InlineFragmentView,
    ) -> Result<(), PlannerError> {
        self.stack.mark();

        if self.configuration.federation_enabled
            && self.entities_selection_set.is_none()
            && self.is_nested_request(ctx)
        {
            trace!("skipping fragment of a nested request without an _entities root");
            return Ok(());
        }

        let enclosing = ctx.enclosing_type();
        let narrows = fragment
            .type_condition
            .is_some_and(|type_condition| type_condition != enclosing);
        if !narrows && fragment.directives.is_empty() {
            trace!("inlining fragment on the enclosing type");
            return Ok(());
        }

        let current = if narrows {
            self.stack.current_selection_set()?
        } else {
            self.field_parent(enclosing)?
        };
        let type_condition = match fragment.type_condition {
            Some(type_condition) if narrows => {
                let renamed = self.configuration.rename_type(type_condition);
                let folded = self.configuration.is_type_renamed(type_condition)
                    && self.configuration.federation.is_interface_object(renamed);
                let renamed = renamed.to_string();
                if !folded {
                    self.document.add_typename(current);
                }
                Some(renamed)
            }
            _ => None,
        };

        let upstream_fragment = self.document.add_inline_fragment(
            current,
            InlineFragment {
                type_condition,
                directives: vec![],
                selection_set: None,
            },
        );
        self.stack.push(Container::InlineFragment(upstream_fragment));

        Ok(())
    }

    fn leave_inline_fragment(
        &mut self,
        _ctx: &WalkContext,
        _fragment: &InlineFragmentView,
    ) -> Result<(), PlannerError> {
        self.stack.unwind()
    }

    fn enter_directive(
        &mut self,
        ctx: &WalkContext,
        directive: &ParsedDirective,
        placement: DirectivePlacement,
    ) -> Result<(), PlannerError> {
        self.add_directive(ctx, directive, placement)
    }
}
