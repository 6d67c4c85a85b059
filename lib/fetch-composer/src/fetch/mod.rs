pub mod input;

use std::{fmt::Display, sync::Arc};

use serde::Serialize;

use crate::{
    representation::ObjectNode,
    utils::pretty_display::{get_indent, PrettyDisplay},
    variables::Variable,
};

/// How the response of the fetch must be unwrapped.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum FetchKind {
    /// A root fetch. Data is read from `data`.
    Plain,
    /// An entity lookup for one parent object. Data is read from `data._entities[0]`.
    SingleEntity,
    /// An entity lookup for a list of parent objects. Data is read from `data._entities`.
    BatchEntity,
}

impl Display for FetchKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FetchKind::Plain => write!(f, "Plain"),
            FetchKind::SingleEntity => write!(f, "SingleEntity"),
            FetchKind::BatchEntity => write!(f, "BatchEntity"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PostProcessing {
    pub select_response_data_path: Vec<String>,
    pub select_response_errors_path: Vec<String>,
}

impl PostProcessing {
    fn with_data_path(path: &[&str]) -> Self {
        Self {
            select_response_data_path: path.iter().map(|s| s.to_string()).collect(),
            select_response_errors_path: vec!["errors".to_string()],
        }
    }

    pub fn for_kind(kind: FetchKind) -> Self {
        match kind {
            FetchKind::Plain => Self::with_data_path(&["data"]),
            FetchKind::SingleEntity => Self::with_data_path(&["data", "_entities", "[0]"]),
            FetchKind::BatchEntity => Self::with_data_path(&["data", "_entities"]),
        }
    }
}

/// The fetch descriptor handed to the execution engine.
#[derive(Debug, Clone, Serialize)]
pub struct FetchConfiguration {
    pub fetch_id: usize,
    pub depends_on_fetch_ids: Vec<usize>,
    pub kind: FetchKind,
    /// The serialized transport input, see [`input::write_fetch_input`].
    pub input: String,
    pub variables: Vec<Variable>,
    /// The merged template of the `representations` variable, for entity fetches.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub representation: Option<Arc<ObjectNode>>,
    pub post_processing: PostProcessing,
    pub disallow_single_flight: bool,
    pub requires_serial_fetch: bool,
    pub requires_batch_fetch: bool,
    /// Renders the whole input as `null` when a representation variable resolves to null.
    pub set_template_output_to_null_on_variable_null: bool,
    /// Caching settings passed through from the federation metadata.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub caching: Vec<serde_json::Value>,
}

/// The subscription-start descriptor handed to the streaming transport.
#[derive(Debug, Clone, Serialize)]
pub struct SubscriptionFetchConfiguration {
    /// The serialized start payload, see [`input::write_subscription_input`].
    pub input: String,
    pub variables: Vec<Variable>,
    pub post_processing: PostProcessing,
}

impl PrettyDisplay for FetchConfiguration {
    fn pretty_fmt(&self, f: &mut std::fmt::Formatter<'_>, depth: usize) -> std::fmt::Result {
        let indent = get_indent(depth);
        writeln!(f, "{indent}Fetch({}) {{", self.fetch_id)?;
        writeln!(f, "{indent}  kind: {}", self.kind)?;
        if !self.depends_on_fetch_ids.is_empty() {
            writeln!(f, "{indent}  depends_on: {:?}", self.depends_on_fetch_ids)?;
        }
        writeln!(
            f,
            "{indent}  data_path: {}",
            self.post_processing.select_response_data_path.join(".")
        )?;
        let flags = [
            ("disallow_single_flight", self.disallow_single_flight),
            ("requires_serial_fetch", self.requires_serial_fetch),
            ("requires_batch_fetch", self.requires_batch_fetch),
            (
                "null_on_variable_null",
                self.set_template_output_to_null_on_variable_null,
            ),
        ]
        .iter()
        .filter(|(_, enabled)| *enabled)
        .map(|(name, _)| *name)
        .collect::<Vec<_>>();
        if !flags.is_empty() {
            writeln!(f, "{indent}  flags: {}", flags.join(", "))?;
        }
        writeln!(f, "{indent}  input: {}", self.input)?;
        write!(f, "{indent}}}")
    }
}

#[cfg(test)]
mod tests {
    use super::{FetchKind, PostProcessing};

    #[test]
    fn post_processing_follows_the_fetch_kind() {
        assert_eq!(
            PostProcessing::for_kind(FetchKind::Plain).select_response_data_path,
            vec!["data"]
        );
        assert_eq!(
            PostProcessing::for_kind(FetchKind::SingleEntity).select_response_data_path,
            vec!["data", "_entities", "[0]"]
        );
        let batch = PostProcessing::for_kind(FetchKind::BatchEntity);
        assert_eq!(batch.select_response_data_path, vec!["data", "_entities"]);
        assert_eq!(batch.select_response_errors_path, vec!["errors"]);
    }
}
