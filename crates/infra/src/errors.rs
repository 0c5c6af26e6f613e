//! Infrastructure error type and conversions

use bibops_common::auth::TokenClientError;
use bibops_domain::errors::BibopsError;
use thiserror::Error;

/// Error type for the infrastructure layer
#[derive(Debug, Error)]
pub enum InfraError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("token error: {0}")]
    Token(#[from] TokenClientError),

    #[error("invalid URL: {0}")]
    Url(String),

    #[error("configuration error: {0}")]
    Config(String),
}

impl From<InfraError> for BibopsError {
    fn from(err: InfraError) -> Self {
        match err {
            InfraError::Http(e) => BibopsError::Network(e.to_string()),
            InfraError::Io(e) => BibopsError::Output(e.to_string()),
            InfraError::Token(e) => BibopsError::Auth(e.to_string()),
            InfraError::Url(msg) => BibopsError::Input(msg),
            InfraError::Config(msg) => BibopsError::Config(msg),
        }
    }
}
