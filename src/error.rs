use thiserror::Error;

#[derive(Error, Debug)]
pub enum BmxError {
    #[error("{0}")]
    IdentityProvider(String),

    #[error("{0}")]
    ServiceProvider(String),

    #[error("SAML error: {0}")]
    Saml(String),

    #[error("{0}")]
    Console(String),

    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("Cache error: {0}")]
    CacheError(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON serialization error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("invalid selection")]
    InvalidSelection,

    #[error("no roles available")]
    NoRolesAvailable,
}

pub type Result<T> = std::result::Result<T, BmxError>;
