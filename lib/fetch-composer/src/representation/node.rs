use std::fmt::{Formatter as FmtFormatter, Result as FmtResult};

use serde::Serialize;
use sonic_rs::{JsonContainerTrait, JsonValueTrait};

use crate::utils::{
    json_writer::{write_and_escape_string, write_key},
    pretty_display::{get_indent, PrettyDisplay},
};

/// A template that renders one entity representation out of already resolved data.
///
/// Built once while planning and evaluated for every item the fetch depends on.
/// Evaluation only reads the node, so one template can be rendered from many threads.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(tag = "kind")]
pub enum RepresentationNode {
    Object(ObjectNode),
    Array(ArrayNode),
    Scalar(ScalarNode),
    StaticString(StaticStringNode),
    Null,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct RepresentationField {
    pub name: String,
    pub value: RepresentationNode,
    /// Rendered only when the `__typename` of the enclosing data is one of these.
    /// Empty means unconditional.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub on_type_names: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Default)]
pub struct ObjectNode {
    pub path: Vec<String>,
    pub nullable: bool,
    pub fields: Vec<RepresentationField>,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct ArrayNode {
    pub path: Vec<String>,
    pub nullable: bool,
    pub item: Box<RepresentationNode>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum ScalarKind {
    String,
    Integer,
    Float,
    Boolean,
    /// `ID` and custom scalars, passed through as they are.
    Custom,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct ScalarNode {
    pub path: Vec<String>,
    pub nullable: bool,
    pub scalar: ScalarKind,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct StaticStringNode {
    pub path: Vec<String>,
    pub value: String,
}

fn resolve_path<'a>(data: &'a sonic_rs::Value, path: &[String]) -> Option<&'a sonic_rs::Value> {
    path.iter().try_fold(data, |current, segment| current.get(segment.as_str()))
}

impl RepresentationNode {
    /// Renders the JSON value of this node, reading from `data`.
    /// Missing values render as `null`.
    pub fn render(&self, data: &sonic_rs::Value, out: &mut String) {
        match self {
            RepresentationNode::Object(object) => object.render(data, out),
            RepresentationNode::Array(array) => {
                let items = resolve_path(data, &array.path).and_then(|value| value.as_array());
                match items {
                    Some(items) => {
                        out.push('[');
                        for (i, item) in items.iter().enumerate() {
                            if i > 0 {
                                out.push(',');
                            }
                            array.item.render(item, out);
                        }
                        out.push(']');
                    }
                    None => out.push_str("null"),
                }
            }
            RepresentationNode::Scalar(scalar) => match resolve_path(data, &scalar.path) {
                Some(value) if !value.is_null() => match value.as_str() {
                    Some(text) => write_and_escape_string(out, text),
                    None => out.push_str(
                        &sonic_rs::to_string(value).unwrap_or_else(|_| "null".to_string()),
                    ),
                },
                _ => out.push_str("null"),
            },
            RepresentationNode::StaticString(static_string) => {
                write_and_escape_string(out, &static_string.value)
            }
            RepresentationNode::Null => out.push_str("null"),
        }
    }
}

impl ObjectNode {
    pub fn render(&self, data: &sonic_rs::Value, out: &mut String) {
        let Some(object) = resolve_path(data, &self.path).filter(|value| value.is_object()) else {
            out.push_str("null");
            return;
        };

        let typename = object.get("__typename").and_then(|value| value.as_str());

        out.push('{');
        let mut first = true;
        for field in &self.fields {
            let applies = field.on_type_names.is_empty()
                || typename.is_some_and(|typename| {
                    field.on_type_names.iter().any(|name| name == typename)
                });
            if !applies {
                continue;
            }

            if !first {
                out.push(',');
            }
            first = false;
            write_key(out, &field.name);
            field.value.render(object, out);
        }
        out.push('}');
    }
}

impl PrettyDisplay for RepresentationNode {
    fn pretty_fmt(&self, f: &mut FmtFormatter<'_>, depth: usize) -> FmtResult {
        match self {
            RepresentationNode::Object(object) => object.pretty_fmt(f, depth),
            RepresentationNode::Array(array) => {
                write!(f, "Array({})", array.path.join("."))?;
                if array.nullable {
                    write!(f, "?")?;
                }
                write!(f, " [")?;
                array.item.pretty_fmt(f, depth)?;
                write!(f, "]")
            }
            RepresentationNode::Scalar(scalar) => {
                write!(f, "{:?}({})", scalar.scalar, scalar.path.join("."))?;
                if scalar.nullable {
                    write!(f, "?")?;
                }
                Ok(())
            }
            RepresentationNode::StaticString(static_string) => {
                write!(f, "{:?}", static_string.value)
            }
            RepresentationNode::Null => write!(f, "null"),
        }
    }
}

impl PrettyDisplay for ObjectNode {
    fn pretty_fmt(&self, f: &mut FmtFormatter<'_>, depth: usize) -> FmtResult {
        let indent = get_indent(depth);
        if !self.path.is_empty() {
            write!(f, "Object({})", self.path.join("."))?;
            if self.nullable {
                write!(f, "?")?;
            }
            write!(f, " ")?;
        }

        writeln!(f, "{{")?;
        for field in &self.fields {
            write!(f, "{}  {}", indent, field.name)?;
            if !field.on_type_names.is_empty() {
                write!(f, " on [{}]", field.on_type_names.join(", "))?;
            }
            write!(f, ": ")?;
            field.value.pretty_fmt(f, depth + 1)?;
            writeln!(f)?;
        }
        write!(f, "{}}}", indent)
    }
}
