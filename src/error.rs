use thiserror::Error;

/// Crate-wide result alias.
pub type Result<T> = std::result::Result<T, DecoderError>;

/// Errors produced by the beam search decoder.
///
/// Construction-time misconfiguration and unsupported-feature requests are
/// grouped under [`DecoderError::Config`]; failures from the external
/// predictor/joint/LM collaborators propagate through the matching variant
/// unchanged (the core never retries or reinterprets them).
#[derive(Debug, Error)]
pub enum DecoderError {
    #[error("invalid decoder configuration: {0}")]
    Config(String),

    #[error("prediction network call failed: {0}")]
    Predictor(String),

    #[error("joint network call failed: {0}")]
    Joint(String),

    #[error("language model call failed: {0}")]
    LanguageModel(String),
}

impl DecoderError {
    pub fn config(msg: impl Into<String>) -> Self {
        DecoderError::Config(msg.into())
    }
}
