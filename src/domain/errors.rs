// Error taxonomy shared by the identity and analytics layers
use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq)]
pub enum AuthError {
    /// Credentials rejected; the message is shown to the operator as-is.
    #[error("{0}")]
    InvalidCredentials(String),

    #[error("identity provider unreachable: {0}")]
    Transport(String),

    #[error("unexpected identity provider response: {0}")]
    Protocol(String),
}

#[derive(Debug, Error, Clone, PartialEq)]
pub enum FetchError {
    #[error("request for {procedure} failed: {reason}")]
    Transport { procedure: String, reason: String },

    #[error("{procedure} returned status {status}: {body}")]
    Status {
        procedure: String,
        status: u16,
        body: String,
    },

    #[error("{procedure} returned an unreadable body: {reason}")]
    Decode { procedure: String, reason: String },

    #[error("{procedure} returned no result")]
    Absent { procedure: String },
}

#[derive(Debug, Error, Clone, PartialEq)]
#[error("no usable rows: {reason}")]
pub struct MalformedDataError {
    pub reason: String,
}
