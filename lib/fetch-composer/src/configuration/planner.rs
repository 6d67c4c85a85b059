use hive_router_composer_config::federation::FederationFieldConfig;
use serde::Serialize;

/// Where the fetch sits relative to the data it depends on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub enum PathType {
    /// A single parent object.
    #[default]
    Object,
    /// Each item of a parent list.
    ArrayItem,
    /// Items of a list nested in another list.
    NestedInArray,
}

/// A field another fetch already selects through `@provides`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProvidedField {
    pub type_name: String,
    pub field_name: String,
    /// The dot-delimited client path the provision applies at. Empty applies everywhere.
    pub path: String,
}

fn is_same_or_ancestor(ancestor: &str, path: &str) -> bool {
    path == ancestor
        || (path.len() > ancestor.len()
            && path.starts_with(ancestor)
            && path.as_bytes()[ancestor.len()] == b'.')
}

/// Describes one planner invocation: which part of the client operation it covers
/// and how its fetch relates to the rest of the plan.
#[derive(Debug, Clone)]
pub struct DataSourcePlannerConfiguration {
    /// The dot-delimited client path the fetch attaches at, for example `query.me.reviews`.
    pub parent_path: String,
    pub path_type: PathType,
    /// Set when the fetch depends on data resolved by another fetch.
    pub is_nested: bool,
    /// Keys and requirements that must be resolved through `_entities`.
    pub required_fields: Vec<FederationFieldConfig>,
    pub provided_fields: Vec<ProvidedField>,
    /// Client paths assigned to this data source. Empty plans every admitted field.
    pub planned_paths: Vec<String>,
    pub fetch_id: usize,
    pub depends_on_fetch_ids: Vec<usize>,
}

impl Default for DataSourcePlannerConfiguration {
    fn default() -> Self {
        Self {
            parent_path: "query".to_string(),
            path_type: PathType::default(),
            is_nested: false,
            required_fields: vec![],
            provided_fields: vec![],
            planned_paths: vec![],
            fetch_id: 0,
            depends_on_fetch_ids: vec![],
        }
    }
}

impl DataSourcePlannerConfiguration {
    pub fn has_required_fields(&self) -> bool {
        !self.required_fields.is_empty()
    }

    pub fn is_provided(&self, type_name: &str, field_name: &str, current_path: &str) -> bool {
        self.provided_fields.iter().any(|provided| {
            provided.type_name == type_name
                && provided.field_name == field_name
                && (provided.path.is_empty() || is_same_or_ancestor(&provided.path, current_path))
        })
    }

    /// Whether the path or one of its descendants was assigned to this data source.
    pub fn is_planned(&self, path: &str) -> bool {
        self.planned_paths.is_empty()
            || self
                .planned_paths
                .iter()
                .any(|planned| is_same_or_ancestor(path, planned))
    }

    /// Whether the path lies at or below the parent path.
    pub fn is_within_parent_path(&self, path: &str) -> bool {
        is_same_or_ancestor(&self.parent_path, path)
    }

    /// Whether the path lies above the parent path.
    pub fn is_parent_path_ancestor(&self, path: &str) -> bool {
        path != self.parent_path && is_same_or_ancestor(path, &self.parent_path)
    }
}
