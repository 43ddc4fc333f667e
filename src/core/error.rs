use thiserror::Error;

#[derive(Error, Debug)]
pub enum EphError {
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Unknown scenario: {0}")]
    UnknownScenario(String),

    #[error("Unknown controller: {0}")]
    UnknownController(String),

    #[error("Unknown haze deposit mode: {0}")]
    UnknownDepositMode(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Config parse error: {0}")]
    TomlError(#[from] toml::de::Error),

    #[error("Serialization error: {0}")]
    SerdeError(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, EphError>;
