//! Client error taxonomy.

use recordbase_common::CodecError;
use recordbase_config::ConfigError;

/// Errors surfaced by the record store client.
///
/// Only one condition is recovered locally: a `NOT_FOUND` answer to a get,
/// which becomes an empty entry. Everything else reaches the caller as is.
/// Nothing here is retried automatically.
#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    /// Setup, authentication or transport failure while connecting.
    #[error("connection failed: {0}")]
    Connect(String),

    /// The call's time budget (in milliseconds) ran out.
    #[error("deadline of {0} ms exceeded")]
    DeadlineExceeded(i64),

    /// A malformed or incomplete entry, caught before any network call.
    #[error("invalid entry: {0}")]
    Codec(#[from] CodecError),

    #[error("invalid configuration: {0}")]
    Config(#[from] ConfigError),

    /// Any other status reported by the store, unmodified.
    #[error("store error: {0}")]
    Store(tonic::Status),

    /// The blocking facade could not start its runtime.
    #[error("runtime error: {0}")]
    Runtime(#[from] std::io::Error),
}

impl ClientError {
    /// Map a status returned by the store. A store-side deadline is the
    /// same condition as a local one.
    pub(crate) fn from_status(status: tonic::Status, timeout_ms: i64) -> Self {
        match status.code() {
            tonic::Code::DeadlineExceeded => ClientError::DeadlineExceeded(timeout_ms),
            _ => ClientError::Store(status),
        }
    }

    pub fn is_deadline_exceeded(&self) -> bool {
        matches!(self, ClientError::DeadlineExceeded(_))
    }

    /// The store status, for store-reported failures.
    pub fn status(&self) -> Option<&tonic::Status> {
        match self {
            ClientError::Store(status) => Some(status),
            _ => None,
        }
    }

    /// Short label used for metrics and logs.
    pub fn kind(&self) -> &'static str {
        match self {
            ClientError::Connect(_) => "connect",
            ClientError::DeadlineExceeded(_) => "deadline_exceeded",
            ClientError::Codec(_) => "encoding",
            ClientError::Config(_) => "config",
            ClientError::Store(_) => "store",
            ClientError::Runtime(_) => "runtime",
        }
    }
}

pub type Result<T> = std::result::Result<T, ClientError>;
