use thiserror::Error;

#[derive(Error, Debug)]
pub enum CardError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Settings error: {0}")]
    Settings(String),

    #[error("Effect error: {0}")]
    Effect(String),

    #[error("{0}")]
    Other(String),
}

pub type Result<T> = std::result::Result<T, CardError>;
