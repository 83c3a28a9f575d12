use thiserror::Error;

/// Domain errors for Tiller. Most application code propagates `anyhow`
/// errors; these are the cases worth matching on.
#[derive(Error, Debug)]
pub enum TillerError {
    #[error("Invalid model identifier: {0}")]
    InvalidModel(String),

    #[error("Could not determine home directory")]
    MissingHome,
}
