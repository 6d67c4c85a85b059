use std::{collections::BTreeMap, fmt::Write};

use graphql_parser::query::Value as ParserValue;
use serde::Serialize;

#[derive(Clone, Debug, PartialEq, Serialize)]
pub enum Value {
    Variable(String),
    Int(i64),
    Float(f64),
    String(String),
    Boolean(bool),
    Null,
    Enum(String),
    List(Vec<Value>),
    Object(BTreeMap<String, Value>),
}

impl From<&ParserValue<'_, String>> for Value {
    fn from(value: &ParserValue<'_, String>) -> Self {
        match value {
            ParserValue::Variable(name) => Value::Variable(name.to_owned()),
            ParserValue::Int(i) => Value::Int(i.as_i64().unwrap_or_default()),
            ParserValue::Float(f) => Value::Float(f.to_owned()),
            ParserValue::String(s) => Value::String(s.to_owned()),
            ParserValue::Boolean(b) => Value::Boolean(b.to_owned()),
            ParserValue::Null => Value::Null,
            ParserValue::Enum(e) => Value::Enum(e.to_owned()),
            ParserValue::List(l) => Value::List(l.iter().map(Value::from).collect()),
            ParserValue::Object(o) => Value::Object(
                o.iter()
                    .map(|(k, v)| (k.to_string(), Value::from(v)))
                    .collect(),
            ),
        }
    }
}

impl Value {
    /// Names of the variables referenced anywhere inside the value.
    pub fn collect_variables<'a>(&'a self, out: &mut Vec<&'a str>) {
        match self {
            Value::Variable(name) => out.push(name),
            Value::List(items) => items.iter().for_each(|item| item.collect_variables(out)),
            Value::Object(fields) => fields
                .values()
                .for_each(|value| value.collect_variables(out)),
            _ => {}
        }
    }

    pub fn write_to(&self, out: &mut String) {
        match self {
            Value::Variable(name) => {
                out.push('$');
                out.push_str(name);
            }
            Value::Int(i) => {
                let _ = write!(out, "{}", i);
            }
            Value::Float(f) => {
                let _ = write!(out, "{:?}", f);
            }
            Value::String(s) => write_quoted(s, out),
            Value::Boolean(b) => out.push_str(if *b { "true" } else { "false" }),
            Value::Null => out.push_str("null"),
            Value::Enum(e) => out.push_str(e),
            Value::List(items) => {
                out.push('[');
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        out.push_str(", ");
                    }
                    item.write_to(out);
                }
                out.push(']');
            }
            Value::Object(fields) => {
                out.push('{');
                for (i, (key, value)) in fields.iter().enumerate() {
                    if i > 0 {
                        out.push_str(", ");
                    }
                    out.push_str(key);
                    out.push_str(": ");
                    value.write_to(out);
                }
                out.push('}');
            }
        }
    }
}

fn write_quoted(value: &str, out: &mut String) {
    out.push('"');
    for c in value.chars() {
        match c {
            '"' => out.push_str("\\\""),
            '\\' => out.push_str("\\\\"),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            c if (c as u32) < 0x20 => {
                let _ = write!(out, "\\u{:04x}", c as u32);
            }
            c => out.push(c),
        }
    }
    out.push('"');
}

impl std::fmt::Display for Value {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut out = String::new();
        self.write_to(&mut out);
        f.write_str(&out)
    }
}

#[cfg(test)]
mod tests {
    use super::Value;
    use crate::utils::parsing::parse_operation;
    use graphql_parser::query::{Definition, OperationDefinition, Selection};

    #[test]
    fn prints_nested_literals_and_collects_variables() {
        let document = parse_operation(
            r#"{ search(filter: {name: "a\"b", tags: [$first, RED], limit: 2.5, nested: {id: $id}}) }"#,
        )
        .unwrap();
        let Definition::Operation(OperationDefinition::SelectionSet(set)) = &document.definitions[0]
        else {
            panic!("expected a selection set");
        };
        let Selection::Field(field) = &set.items[0] else {
            panic!("expected a field");
        };
        let value = Value::from(&field.arguments[0].1);

        insta::assert_snapshot!(value.to_string(), @r#"{limit: 2.5, name: "a\"b", nested: {id: $id}, tags: [$first, RED]}"#);

        let mut variables = vec![];
        value.collect_variables(&mut variables);
        assert_eq!(variables, vec!["id", "first"]);
    }
}
