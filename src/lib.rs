//! SentencePiece-style subword tokenizer engine.
//!
//! Train a unigram subword vocabulary from a raw text corpus, segment
//! text into the maximum-likelihood piece sequence, and persist the
//! trained model in a versioned binary format. Special tokens (begin/end
//! of sequence, unknown, pad) live in an explicit registry that is
//! consulted before the trained vocabulary and validated against it at
//! load time.

pub mod core;
pub mod model_codec;
pub mod segmenter;
pub mod specials;
pub mod tokenizer;
pub mod trainer;
pub mod vocab;

pub use crate::core::error::TokenizerError;
pub use crate::core::types::{
    CoveragePolicy, Piece, ScoreEncoding, SegmentPiece, Segmentation, SpecialRole,
    SpecialTokenSpec, TrainedModel, TrainerConfig,
};
pub use crate::specials::{SpecialOverrides, SpecialTokenRegistry};
pub use crate::tokenizer::Tokenizer;
pub use crate::trainer::Trainer;
pub use crate::vocab::Vocabulary;
