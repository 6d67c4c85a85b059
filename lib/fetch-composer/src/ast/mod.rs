pub mod normalization;
pub mod printer;
pub mod value;

use crate::schema::{OperationKind, TypeNode};

pub use value::Value;

macro_rules! arena_id {
    ($name:ident) => {
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
        pub struct $name(usize);

        impl $name {
            pub fn index(&self) -> usize {
                self.0
            }
        }
    };
}

arena_id!(SelectionSetId);
arena_id!(FieldId);
arena_id!(InlineFragmentId);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Selection {
    Field(FieldId),
    InlineFragment(InlineFragmentId),
}

#[derive(Debug, Clone, PartialEq)]
pub struct Directive {
    pub name: String,
    pub arguments: Vec<(String, Value)>,
}

#[derive(Debug, Clone, Default)]
pub struct SelectionSet {
    pub items: Vec<Selection>,
}

#[derive(Debug, Clone)]
pub struct Field {
    pub alias: Option<String>,
    pub name: String,
    pub arguments: Vec<(String, Value)>,
    pub directives: Vec<Directive>,
    pub selection_set: Option<SelectionSetId>,
}

impl Field {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            alias: None,
            name: name.into(),
            arguments: vec![],
            directives: vec![],
            selection_set: None,
        }
    }

    pub fn with_alias(mut self, alias: Option<String>) -> Self {
        self.alias = alias;
        self
    }

    pub fn response_key(&self) -> &str {
        self.alias.as_deref().unwrap_or(&self.name)
    }
}

#[derive(Debug, Clone)]
pub struct InlineFragment {
    pub type_condition: Option<String>,
    pub directives: Vec<Directive>,
    pub selection_set: Option<SelectionSetId>,
}

#[derive(Debug, Clone)]
pub struct VariableDefinition {
    pub name: String,
    pub var_type: TypeNode,
    pub default_value: Option<Value>,
}

#[derive(Debug, Clone)]
pub struct Operation {
    pub kind: OperationKind,
    pub variable_definitions: Vec<VariableDefinition>,
    pub directives: Vec<Directive>,
    pub selection_set: Option<SelectionSetId>,
}

impl Default for Operation {
    fn default() -> Self {
        Self {
            kind: OperationKind::Query,
            variable_definitions: vec![],
            directives: vec![],
            selection_set: None,
        }
    }
}

/// The upstream operation being built by a planning pass.
///
/// Nodes live in flat arenas and refer to each other through typed ids, so the
/// planner can keep cheap, copyable handles on its container stack. `reset` empties
/// the arenas but keeps their allocations for the next pass.
#[derive(Debug, Default)]
pub struct UpstreamDocument {
    pub operation: Operation,
    selection_sets: Vec<SelectionSet>,
    fields: Vec<Field>,
    inline_fragments: Vec<InlineFragment>,
}

impl UpstreamDocument {
    pub fn reset(&mut self) {
        self.operation.kind = OperationKind::Query;
        self.operation.variable_definitions.clear();
        self.operation.directives.clear();
        self.operation.selection_set = None;
        self.selection_sets.clear();
        self.fields.clear();
        self.inline_fragments.clear();
    }

    pub fn new_selection_set(&mut self) -> SelectionSetId {
        self.selection_sets.push(SelectionSet::default());
        SelectionSetId(self.selection_sets.len() - 1)
    }

    pub fn selection_set(&self, id: SelectionSetId) -> &SelectionSet {
        &self.selection_sets[id.0]
    }

    pub fn selection_set_mut(&mut self, id: SelectionSetId) -> &mut SelectionSet {
        &mut self.selection_sets[id.0]
    }

    pub fn field(&self, id: FieldId) -> &Field {
        &self.fields[id.0]
    }

    pub fn field_mut(&mut self, id: FieldId) -> &mut Field {
        &mut self.fields[id.0]
    }

    pub fn inline_fragment(&self, id: InlineFragmentId) -> &InlineFragment {
        &self.inline_fragments[id.0]
    }

    pub fn inline_fragment_mut(&mut self, id: InlineFragmentId) -> &mut InlineFragment {
        &mut self.inline_fragments[id.0]
    }

    pub fn add_field(&mut self, parent: SelectionSetId, field: Field) -> FieldId {
        self.fields.push(field);
        let id = FieldId(self.fields.len() - 1);
        self.selection_sets[parent.0].items.push(Selection::Field(id));
        id
    }

    pub fn add_inline_fragment(
        &mut self,
        parent: SelectionSetId,
        fragment: InlineFragment,
    ) -> InlineFragmentId {
        self.inline_fragments.push(fragment);
        let id = InlineFragmentId(self.inline_fragments.len() - 1);
        self.selection_sets[parent.0]
            .items
            .push(Selection::InlineFragment(id));
        id
    }

    /// Adds a `__typename` field unless the selection set already selects one.
    pub fn add_typename(&mut self, parent: SelectionSetId) {
        let exists = self.selection_sets[parent.0]
            .items
            .iter()
            .any(|item| match item {
                Selection::Field(id) => {
                    let field = &self.fields[id.0];
                    field.name == "__typename" && field.alias.is_none()
                }
                Selection::InlineFragment(_) => false,
            });

        if !exists {
            self.add_field(parent, Field::new("__typename"));
        }
    }

    pub fn field_selection_set(&mut self, id: FieldId) -> SelectionSetId {
        if let Some(existing) = self.fields[id.0].selection_set {
            return existing;
        }

        let created = self.new_selection_set();
        self.fields[id.0].selection_set = Some(created);
        created
    }

    pub fn inline_fragment_selection_set(&mut self, id: InlineFragmentId) -> SelectionSetId {
        if let Some(existing) = self.inline_fragments[id.0].selection_set {
            return existing;
        }

        let created = self.new_selection_set();
        self.inline_fragments[id.0].selection_set = Some(created);
        created
    }

    pub fn has_variable_definition(&self, name: &str) -> bool {
        self.operation
            .variable_definitions
            .iter()
            .any(|definition| definition.name == name)
    }

    /// Declares the variable once. Later declarations of the same name are ignored.
    pub fn add_variable_definition(&mut self, definition: VariableDefinition) {
        if !self.has_variable_definition(&definition.name) {
            self.operation.variable_definitions.push(definition);
        }
    }

    /// Picks the first name of the sequence `a`, `b`, ..., `z`, `aa`, `ab`, ...
    /// that is not declared by the operation yet.
    pub fn generate_unused_variable_name(&self) -> String {
        (0usize..)
            .map(variable_name_for)
            .find(|name| !self.has_variable_definition(name))
            .unwrap_or_default()
    }
}

fn variable_name_for(mut index: usize) -> String {
    let mut name = vec![];
    loop {
        name.push(b'a' + (index % 26) as u8);
        if index < 26 {
            break;
        }
        index = index / 26 - 1;
    }
    name.reverse();
    String::from_utf8_lossy(&name).into_owned()
}

#[cfg(test)]
mod tests {
    use super::{variable_name_for, Field, UpstreamDocument, VariableDefinition};
    use crate::schema::TypeNode;

    #[test]
    fn generated_variable_names_skip_declared_ones() {
        let mut document = UpstreamDocument::default();
        assert_eq!(document.generate_unused_variable_name(), "a");

        for name in ["a", "b"] {
            document.add_variable_definition(VariableDefinition {
                name: name.to_string(),
                var_type: TypeNode::named("ID"),
                default_value: None,
            });
        }
        assert_eq!(document.generate_unused_variable_name(), "c");
        assert_eq!(variable_name_for(25), "z");
        assert_eq!(variable_name_for(26), "aa");
        assert_eq!(variable_name_for(27), "ab");
    }

    #[test]
    fn reset_keeps_nothing_from_previous_pass() {
        let mut document = UpstreamDocument::default();
        let root = document.new_selection_set();
        document.operation.selection_set = Some(root);
        document.add_field(root, Field::new("me"));
        document.add_typename(root);
        document.add_typename(root);
        assert_eq!(document.selection_set(root).items.len(), 2);

        document.reset();
        assert!(document.operation.selection_set.is_none());
        let root = document.new_selection_set();
        assert_eq!(root.index(), 0);
        assert!(document.selection_set(root).items.is_empty());
    }
}
