use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum Error {
    /// A required collaborator is missing or a setting is invalid.
    #[error("Config Error - {0}")]
    Config(String),

    /// The store rejected some or all of the requests in a bulk.
    #[error("Bulk Write Error - {0}")]
    BulkWrite(String),

    /// The store could not be reached while executing a bulk.
    #[error("Transport Error - {0}")]
    Transport(String),

    /// Opening or releasing the client connection failed.
    #[error("Connection Error - {0}")]
    Connection(String),
}

impl Error {
    pub fn is_config(&self) -> bool {
        matches!(self, Error::Config(_))
    }

    /// Whether the pending requests were retained and a later flush can resend them.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Error::BulkWrite(_) | Error::Transport(_))
    }
}
