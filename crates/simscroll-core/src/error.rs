use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Platform error: {0}")]
    Platform(String),

    #[error("Failed to create synthetic {0} event")]
    EventInjection(&'static str),

    #[error("Window enumeration failed: {0}")]
    WindowEnumeration(String),
}

pub type Result<T> = std::result::Result<T, Error>;
