use ionnet::{
    IonNetError,
    ModelError,
};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum CliError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON parsing error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Ion networking error: {0}")]
    IonNet(#[from] IonNetError),

    #[error("Invalid configuration: {0}")]
    Config(String),

    #[error("Data processing error: {0}")]
    DataProcessing(String),
}

impl From<ModelError> for CliError {
    fn from(value: ModelError) -> Self {
        CliError::IonNet(value.into())
    }
}
