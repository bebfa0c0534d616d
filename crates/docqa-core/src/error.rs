use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("Missing credential: enter an API key or set OPENAI_API_KEY")]
    MissingCredential,

    #[error("Invalid credential: {0}")]
    InvalidCredential(String),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Provider returned {status}: {body}")]
    Provider { status: u16, body: String },

    #[error("Operation failed: {0}")]
    Operation(String),
}

impl Error {
    /// True for errors caused by an absent or unusable API key.
    pub fn is_credential(&self) -> bool {
        matches!(self, Error::MissingCredential | Error::InvalidCredential(_))
    }
}

pub type Result<T> = std::result::Result<T, Error>;
