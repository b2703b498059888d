use thiserror::Error;

#[derive(Error, Debug)]
pub enum ClearlagError {
    #[error("World unavailable: {0}")]
    WorldUnavailable(String),

    #[error("Mutation domain is no longer accepting work")]
    DomainClosed,

    #[error("Coordinator has not been started")]
    NotStarted,

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("TOML error: {0}")]
    TomlError(#[from] toml::de::Error),

    #[error("Serialization error: {0}")]
    SerdeError(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, ClearlagError>;
