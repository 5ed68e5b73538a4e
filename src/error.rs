use thiserror::Error;

#[derive(Error, Debug)]
pub enum SkkError {
    #[error("Some kind of error: {0}")]
    Error(String),
    #[error(transparent)]
    IoError(#[from] std::io::Error),
    #[error("Failed to parse: {0}")]
    ParseError(String),
    #[error("Rule error: {0}")]
    RuleError(String),
    #[error("Encoding error: {0}")]
    EncodingError(String),
    #[error(transparent)]
    TomlError(#[from] toml::de::Error),
    #[error(transparent)]
    XdgError(#[from] xdg::BaseDirectoriesError),
}
