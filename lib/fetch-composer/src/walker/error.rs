use crate::schema::OperationKind;

#[derive(Debug, Clone, thiserror::Error)]
pub enum WalkerError {
    #[error("Operation {} not found in the document", .0.as_deref().unwrap_or("<anonymous>"))]
    OperationNotFound(Option<String>),
    #[error("Schema has no {0} root type")]
    MissingRootType(OperationKind),
    #[error("Field '{1}' is not defined on type '{0}'")]
    UnknownField(String, String),
    #[error("Fragment '{0}' is not defined in the document")]
    UnknownFragment(String),
    #[error("Fragment '{0}' spreads itself")]
    FragmentCycle(String),
}
