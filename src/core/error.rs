use thiserror::Error;

/// Errors surfaced by the tokenizer engine.
///
/// Training and codec failures propagate to the caller; segmentation is
/// total over well-formed input and never produces one of these.
#[derive(Debug, Error)]
pub enum TokenizerError {
    #[error("Target vocabulary size {target} cannot hold the {required} reserved and single-character pieces.")]
    InsufficientCoverage { required: usize, target: usize },

    #[error("Model file format version {found} is not supported (supported: {supported}).")]
    UnsupportedFormatVersion { found: u32, supported: u32 },

    #[error("Special token '{token}' resolves to trained vocabulary id {id}; the model was not prepared with a reserved slot for it.")]
    SpecialTokenCollision { token: String, id: u32 },

    #[error("Malformed model file: {reason}")]
    MalformedModelFile { reason: String },

    #[error("Token id {id} is out of range for vocabulary of size {vocab_size}.")]
    UnknownTokenId { id: u32, vocab_size: usize },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl TokenizerError {
    /// Shorthand for codec validation failures.
    pub(crate) fn malformed(reason: impl Into<String>) -> Self {
        TokenizerError::MalformedModelFile {
            reason: reason.into(),
        }
    }
}
