/// Tokenizer module for converting text to token IDs and vice versa
///
/// This module provides a unified interface for tokenization operations,
/// binding the vocabulary store, the special-token registry, and the
/// Viterbi segmenter behind one encode/decode surface.
pub mod unigram;

pub use unigram::Tokenizer;
