use std::{fmt::Display, sync::Arc};

use indexmap::IndexMap;
use rustc_hash::FxHashMap;
use serde::Serialize;

use crate::representation::ObjectNode;

/// Renders a resolved value as JSON of the given GraphQL input type.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct JsonRenderer {
    pub input_type: String,
}

impl JsonRenderer {
    pub fn new(input_type: impl Display) -> Self {
        Self {
            input_type: input_type.to_string(),
        }
    }
}

/// A value the execution engine substitutes into the upstream request.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind")]
pub enum Variable {
    /// Read from the client request variables.
    Context {
        path: Vec<String>,
        renderer: JsonRenderer,
    },
    /// Read from the already resolved parent object.
    Object {
        path: Vec<String>,
        renderer: JsonRenderer,
    },
    /// Rendered from a representation template, once per entity.
    ResolvableObject { template: Arc<ObjectNode> },
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
enum VariableKey {
    Context(Vec<String>),
    Object(Vec<String>),
    ResolvableObject(Arc<ObjectNode>),
}

impl From<&Variable> for VariableKey {
    fn from(variable: &Variable) -> Self {
        match variable {
            Variable::Context { path, .. } => VariableKey::Context(path.clone()),
            Variable::Object { path, .. } => VariableKey::Object(path.clone()),
            Variable::ResolvableObject { template } => {
                VariableKey::ResolvableObject(template.clone())
            }
        }
    }
}

pub fn placeholder(index: usize) -> String {
    format!("$${}$$", index)
}

/// The variables of one fetch, deduplicated by the value they point at.
#[derive(Debug, Default)]
pub struct Variables {
    variables: Vec<Variable>,
    index: FxHashMap<VariableKey, usize>,
}

impl Variables {
    /// Registers the variable and returns its placeholder, together with whether it
    /// was registered already.
    pub fn add(&mut self, variable: Variable) -> (String, bool) {
        let key = VariableKey::from(&variable);
        if let Some(existing) = self.index.get(&key) {
            return (placeholder(*existing), true);
        }

        let position = self.variables.len();
        self.variables.push(variable);
        self.index.insert(key, position);
        (placeholder(position), false)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Variable> {
        self.variables.iter()
    }

    pub fn len(&self) -> usize {
        self.variables.len()
    }

    pub fn is_empty(&self) -> bool {
        self.variables.is_empty()
    }

    pub fn reset(&mut self) {
        self.variables.clear();
        self.index.clear();
    }
}

/// The `body.variables` object of the upstream request.
/// Values are raw JSON fragments which may contain placeholders.
#[derive(Debug, Default, Clone)]
pub struct UpstreamVariables {
    values: IndexMap<String, String>,
}

impl UpstreamVariables {
    pub fn set(&mut self, name: impl Into<String>, raw_json: impl Into<String>) {
        self.values.insert(name.into(), raw_json.into());
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &String)> {
        self.values.iter()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn reset(&mut self) {
        self.values.clear();
    }
}
