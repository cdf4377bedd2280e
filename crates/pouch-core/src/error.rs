//! Error types for the Pouch library

use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

/// A piece of recovered authentication state a command needs before it may
/// run. Checked against the persisted record, never against the server.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Requirement {
    /// An identity must have been recorded by a credential logon.
    Identity,
    /// An activation secret must be installed.
    ActivationSecret,
    /// A session id and bearer token must both be present.
    ActiveSession,
}

impl std::fmt::Display for Requirement {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Requirement::Identity => write!(f, "an identity (run `login` first)"),
            Requirement::ActivationSecret => {
                write!(f, "an activation secret (run `activation` first)")
            }
            Requirement::ActiveSession => {
                write!(f, "an active session (run `relogin` or `activation` first)")
            }
        }
    }
}

#[derive(Error, Debug)]
pub enum Error {
    #[error("operation requires {0}")]
    Precondition(Requirement),

    #[error("logon refused by server: {0}")]
    Logon(String),

    #[error("server error: {0}")]
    Protocol(String),

    #[error("transport error: {0}")]
    Transport(String),

    #[error("malformed response envelope: {0}")]
    Envelope(String),

    #[error("activation secret is not valid base64: {0}")]
    SecretDecode(#[from] base64::DecodeError),

    #[error("cryptographic error: {0}")]
    Crypto(String),

    #[error("invalid amount: {0}")]
    Amount(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}
