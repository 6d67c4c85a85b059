use crate::{
    configuration::ConfigurationError, representation::RepresentationError, walker::WalkerError,
};

/// Failures of the synthesized upstream operation, detected while finalizing it.
#[derive(Debug, Clone, thiserror::Error)]
pub enum OperationError {
    #[error("Failed to parse the printed upstream operation: {0}")]
    Parse(String),
    #[error("Upstream operation is invalid: {}", .0.join("; "))]
    Validation(Vec<String>),
}

#[derive(Debug, thiserror::Error)]
pub enum PlannerError {
    #[error("Configuration error: {0}")]
    ConfigurationFailure(Box<ConfigurationError>),
    #[error("Walker error: {0}")]
    WalkFailure(Box<WalkerError>),
    #[error("Representation error: {0}")]
    RepresentationFailure(Box<RepresentationError>),
    #[error("Operation error: {0}")]
    OperationFailure(Box<OperationError>),
    #[error("The data source has no subscription configuration")]
    MissingSubscription,
    #[error("Internal Error: {0}")]
    Internal(String),
}

impl From<ConfigurationError> for PlannerError {
    fn from(error: ConfigurationError) -> Self {
        PlannerError::ConfigurationFailure(Box::new(error))
    }
}

impl From<WalkerError> for PlannerError {
    fn from(error: WalkerError) -> Self {
        PlannerError::WalkFailure(Box::new(error))
    }
}

impl From<RepresentationError> for PlannerError {
    fn from(error: RepresentationError) -> Self {
        PlannerError::RepresentationFailure(Box::new(error))
    }
}

impl From<OperationError> for PlannerError {
    fn from(error: OperationError) -> Self {
        PlannerError::OperationFailure(Box::new(error))
    }
}
