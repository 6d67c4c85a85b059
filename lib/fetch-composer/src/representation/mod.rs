mod builder;
mod merge;
mod node;

pub use builder::RepresentationBuilder;
pub use merge::merge_representation_nodes;
pub use node::{
    ArrayNode, ObjectNode, RepresentationField, RepresentationNode, ScalarKind, ScalarNode,
    StaticStringNode,
};

#[derive(Debug, Clone, thiserror::Error)]
pub enum RepresentationError {
    #[error("Failed to parse field set '{0}': {1}")]
    FieldSetParse(String, String),
    #[error("Type '{0}' is not defined in the schema")]
    UnknownType(String),
    #[error("Field '{1}' is not defined on type '{0}'")]
    UnknownField(String, String),
    #[error("Fragment spreads are not supported in field sets: '{0}'")]
    FragmentSpread(String),
    #[error("Expected a single entity type on an object path, found: {0:?}")]
    MultipleEntityTypes(Vec<String>),
}
