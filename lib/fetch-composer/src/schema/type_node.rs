use std::fmt::Display;

use graphql_parser::schema as input;
use serde::Serialize;

/// A GraphQL type reference, as written in field, argument and variable definitions.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub enum TypeNode {
    List(Box<TypeNode>),
    NonNull(Box<TypeNode>),
    Named(String),
}

impl TypeNode {
    pub fn named(name: impl Into<String>) -> Self {
        TypeNode::Named(name.into())
    }

    pub fn is_non_null(&self) -> bool {
        matches!(self, TypeNode::NonNull(_))
    }

    pub fn is_list(&self) -> bool {
        match self {
            TypeNode::List(_) => true,
            TypeNode::NonNull(inner) => inner.as_ref().is_list(),
            TypeNode::Named(_) => false,
        }
    }

    pub fn inner_type(&self) -> &str {
        match self {
            TypeNode::List(inner) => inner.as_ref().inner_type(),
            TypeNode::NonNull(inner) => inner.as_ref().inner_type(),
            TypeNode::Named(name) => name,
        }
    }

    /// Keeps the list and non-null wrappers, replacing the innermost named type.
    pub fn with_inner_type(&self, name: &str) -> TypeNode {
        match self {
            TypeNode::List(inner) => TypeNode::List(Box::new(inner.with_inner_type(name))),
            TypeNode::NonNull(inner) => TypeNode::NonNull(Box::new(inner.with_inner_type(name))),
            TypeNode::Named(_) => TypeNode::Named(name.to_string()),
        }
    }

    /// Strips the outer non-null wrapper and one list level, the type of a list item.
    pub fn list_item_type(&self) -> Option<&TypeNode> {
        match self {
            TypeNode::NonNull(inner) => inner.list_item_type(),
            TypeNode::List(item) => Some(item),
            TypeNode::Named(_) => None,
        }
    }
}

impl Display for TypeNode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TypeNode::List(inner) => write!(f, "[{}]", inner),
            TypeNode::NonNull(inner) => write!(f, "{}!", inner),
            TypeNode::Named(name) => write!(f, "{}", name),
        }
    }
}

impl<'a, T: input::Text<'a>> From<&input::Type<'a, T>> for TypeNode {
    fn from(input_type: &input::Type<'a, T>) -> Self {
        match input_type {
            input::Type::ListType(inner) => TypeNode::List(Box::new(inner.as_ref().into())),
            input::Type::NonNullType(inner) => TypeNode::NonNull(Box::new(inner.as_ref().into())),
            input::Type::NamedType(name) => TypeNode::Named(name.as_ref().to_string()),
        }
    }
}
