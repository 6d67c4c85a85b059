use graphql_parser::query::VariableDefinition;

use crate::schema::SchemaIndex;

/// Document-order index of a field in the client operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct FieldRef(pub usize);

/// The position of the walk inside the client operation.
pub struct WalkContext<'a> {
    schema: &'a SchemaIndex,
    variable_definitions: &'a [VariableDefinition<'static, String>],
    path: String,
    path_marks: Vec<usize>,
    types: Vec<String>,
    selection_set_depth: usize,
    next_field: usize,
}

impl<'a> WalkContext<'a> {
    pub(crate) fn new(
        schema: &'a SchemaIndex,
        variable_definitions: &'a [VariableDefinition<'static, String>],
    ) -> Self {
        Self {
            schema,
            variable_definitions,
            path: String::new(),
            path_marks: vec![],
            types: vec![],
            selection_set_depth: 0,
            next_field: 0,
        }
    }

    pub fn schema(&self) -> &'a SchemaIndex {
        self.schema
    }

    pub fn path_string(&self) -> String {
        self.path.clone()
    }

    /// The dot-delimited response path, starting with the operation kind.
    pub fn path(&self) -> &str {
        &self.path
    }

    /// The client type of the innermost selection set.
    pub fn enclosing_type(&self) -> &str {
        self.types.last().map(String::as_str).unwrap_or_default()
    }

    /// Number of selection sets the walk is currently inside of.
    pub fn selection_set_depth(&self) -> usize {
        self.selection_set_depth
    }

    pub fn variable_definition(
        &self,
        name: &str,
    ) -> Option<&'a VariableDefinition<'static, String>> {
        self.variable_definitions
            .iter()
            .find(|definition| definition.name == name)
    }

    pub(crate) fn push_path_segment(&mut self, segment: &str) {
        self.path_marks.push(self.path.len());
        if !self.path.is_empty() {
            self.path.push('.');
        }
        self.path.push_str(segment);
    }

    pub(crate) fn pop_path_segment(&mut self) {
        if let Some(mark) = self.path_marks.pop() {
            self.path.truncate(mark);
        }
    }

    pub(crate) fn push_type(&mut self, type_name: &str) {
        self.types.push(type_name.to_string());
    }

    pub(crate) fn pop_type(&mut self) {
        self.types.pop();
    }

    pub(crate) fn enter_selection_set(&mut self) {
        self.selection_set_depth += 1;
    }

    pub(crate) fn leave_selection_set(&mut self) {
        self.selection_set_depth -= 1;
    }

    pub(crate) fn next_field_ref(&mut self) -> FieldRef {
        let field_ref = FieldRef(self.next_field);
        self.next_field += 1;
        field_ref
    }
}
