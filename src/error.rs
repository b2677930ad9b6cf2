use crate::validation::Reason;

/// Failure of a call against the remote service.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum TransportError {
    #[error("{0}")]
    Network(String),
    #[error("{0}")]
    Rejected(String),
    #[error("Error: {0} not found")]
    NotFound(String),
    #[error("storage failure: {0}")]
    Storage(String),
    #[error("codec failure: {0}")]
    Codec(String),
}

#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum DraftError {
    #[error("Draft is frozen while a submission is in flight")]
    Frozen,
    #[error("Product {0} is not part of the draft")]
    UnknownLineItem(String),
}

#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum SessionError {
    #[error("Draft is not submittable: {0:?}")]
    Validation(Reason),
    #[error(transparent)]
    Transport(#[from] TransportError),
    #[error("A submission for this draft is already in flight")]
    SubmissionInFlight,
}

impl TransportError {
    /// The message handed to the view layer, with the server's leading error
    /// prefix removed.
    pub fn display_message(&self, prefix: &str) -> String {
        crate::utils::strip_error_prefix(&self.to_string(), prefix).to_string()
    }
}

impl From<sled::Error> for TransportError {
    fn from(value: sled::Error) -> Self {
        TransportError::Storage(value.to_string())
    }
}

impl From<minicbor::decode::Error> for TransportError {
    fn from(value: minicbor::decode::Error) -> Self {
        TransportError::Codec(value.to_string())
    }
}

impl<E: std::fmt::Display> From<minicbor::encode::Error<E>> for TransportError {
    fn from(value: minicbor::encode::Error<E>) -> Self {
        TransportError::Codec(value.to_string())
    }
}
