use std::path::Path;

use crate::core::error::TokenizerError;
use crate::core::types::{CoveragePolicy, SegmentPiece, Segmentation, SpecialRole, TrainedModel};
use crate::model_codec;
use crate::segmenter::segment;
use crate::specials::{SpecialOverrides, SpecialTokenRegistry};
use crate::vocab::Vocabulary;

/// Unigram tokenizer for trained subword models
///
/// This struct provides a simple interface for encoding text to token IDs
/// and decoding token IDs back to text. It owns an immutable `Vocabulary`
/// and `SpecialTokenRegistry` pair; there is no hidden global state.
///
/// # Thread Safety
/// Nothing mutates after construction, so a `Tokenizer` is `Send + Sync`
/// and can serve concurrent encode/decode calls across multiple threads.
#[derive(Debug)]
pub struct Tokenizer {
    vocabulary: Vocabulary,
    registry: SpecialTokenRegistry,
    /// Unknown-token id, resolved once at construction
    unk_id: u32,
    coverage: CoveragePolicy,
    /// Prepend the begin-of-sequence id to every encoding
    add_bos: bool,
}

impl Tokenizer {
    /// Load a tokenizer from a model file
    ///
    /// # Arguments
    /// * `path` - Path to the model file produced by training
    ///
    /// # Errors
    /// Returns an error if the file cannot be read, is malformed, has an
    /// unsupported format version, or defines no unknown token.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, TokenizerError> {
        Self::from_file_with_specials(path, &SpecialOverrides::default())
    }

    /// Load a tokenizer from a model file with special-token renames
    ///
    /// Overrides change a role's display string while keeping its
    /// reserved id. Construction fails fast with `SpecialTokenCollision`
    /// if a configured string resolves to an ordinary trained piece.
    pub fn from_file_with_specials<P: AsRef<Path>>(
        path: P,
        overrides: &SpecialOverrides,
    ) -> Result<Self, TokenizerError> {
        let model = model_codec::load(path)?;
        Self::from_model_with_specials(model, overrides)
    }

    /// Build a tokenizer from a freshly trained model
    pub fn from_model(model: TrainedModel) -> Result<Self, TokenizerError> {
        Self::from_model_with_specials(model, &SpecialOverrides::default())
    }

    pub fn from_model_with_specials(
        model: TrainedModel,
        overrides: &SpecialOverrides,
    ) -> Result<Self, TokenizerError> {
        let registry = SpecialTokenRegistry::new(&model.specials, &model.vocabulary, overrides)?;
        let unk_id = registry.resolve(SpecialRole::Unk).ok_or_else(|| {
            TokenizerError::malformed("model defines no unknown token; segmentation needs one")
        })?;
        Ok(Self {
            vocabulary: model.vocabulary,
            registry,
            unk_id,
            coverage: CoveragePolicy::Codepoint,
            add_bos: true,
        })
    }

    /// Set the unknown-fallback granularity (default: codepoint)
    pub fn with_coverage(mut self, coverage: CoveragePolicy) -> Self {
        self.coverage = coverage;
        self
    }

    /// Enable or disable begin-of-sequence injection (default: on)
    pub fn with_add_bos(mut self, add_bos: bool) -> Self {
        self.add_bos = add_bos;
        self
    }

    /// Encode text into a sequence of token IDs
    ///
    /// Segmentation itself is total; when begin-of-sequence injection is
    /// active and the model defines a bos token, its id is prepended as a
    /// post-processing step after the search.
    pub fn encode(&self, text: &str) -> Vec<u32> {
        self.encode_pieces(text).iter().map(|p| p.id).collect()
    }

    /// Encode text into (piece text, id) pairs
    ///
    /// Unknown spans keep their original text under the unknown id, so
    /// concatenating the non-special pieces reproduces the input exactly.
    /// An injected begin-of-sequence piece carries its display string.
    pub fn encode_pieces(&self, text: &str) -> Segmentation {
        let mut pieces = segment(text, &self.vocabulary, self.unk_id, self.coverage);
        if self.add_bos {
            if let Some(bos_id) = self.registry.resolve(SpecialRole::Bos) {
                let bos_text = self
                    .registry
                    .string_for_id(bos_id)
                    .unwrap_or_default()
                    .to_string();
                pieces.insert(
                    0,
                    SegmentPiece {
                        text: bos_text,
                        id: bos_id,
                    },
                );
            }
        }
        pieces
    }

    /// Decode a sequence of token IDs back into text
    ///
    /// Begin/end/pad ids are skipped; the unknown id renders as its
    /// display string (the original text of an unknown span is not
    /// recoverable from ids alone).
    ///
    /// # Errors
    /// `UnknownTokenId` if an id is neither reserved nor a trained piece.
    pub fn decode(&self, ids: &[u32]) -> Result<String, TokenizerError> {
        let mut out = String::new();
        for &id in ids {
            if self.registry.contains_id(id) {
                if id == self.unk_id {
                    if let Some(text) = self.registry.string_for_id(id) {
                        out.push_str(text);
                    }
                }
                continue;
            }
            match self.vocabulary.lookup_piece(id) {
                Some(text) => out.push_str(text),
                None => {
                    return Err(TokenizerError::UnknownTokenId {
                        id,
                        vocab_size: self.vocab_size(),
                    });
                }
            }
        }
        Ok(out)
    }

    /// Total id-space size: reserved special slots plus trained pieces
    pub fn vocab_size(&self) -> usize {
        self.vocabulary.id_offset() as usize + self.vocabulary.size()
    }

    /// Dump the full vocabulary as (string, id) pairs, specials first
    pub fn get_vocab(&self) -> Vec<(String, u32)> {
        let mut entries: Vec<(String, u32)> = self
            .registry
            .specs()
            .iter()
            .map(|s| (s.text.clone(), s.id))
            .collect();
        entries.extend(
            self.vocabulary
                .pieces()
                .iter()
                .map(|p| (p.text.clone(), p.id)),
        );
        entries
    }

    /// String-to-id lookup; the registry takes precedence over the
    /// trained vocabulary
    pub fn piece_to_id(&self, piece: &str) -> Option<u32> {
        self.registry
            .id_for_string(piece)
            .or_else(|| self.vocabulary.lookup_id(piece))
    }

    /// Id-to-string lookup; the registry takes precedence over the
    /// trained vocabulary
    pub fn id_to_piece(&self, id: u32) -> Option<&str> {
        self.registry
            .string_for_id(id)
            .or_else(|| self.vocabulary.lookup_piece(id))
    }

    pub fn vocabulary(&self) -> &Vocabulary {
        &self.vocabulary
    }

    pub fn registry(&self) -> &SpecialTokenRegistry {
        &self.registry
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::types::{Piece, ScoreEncoding, SpecialTokenSpec};

    fn sample_model() -> TrainedModel {
        let specials = vec![
            SpecialTokenSpec {
                role: SpecialRole::Bos,
                id: 0,
                text: "<bos>".to_string(),
            },
            SpecialTokenSpec {
                role: SpecialRole::Eos,
                id: 1,
                text: "<eos>".to_string(),
            },
            SpecialTokenSpec {
                role: SpecialRole::Unk,
                id: 2,
                text: "<unk>".to_string(),
            },
        ];
        let vocabulary = Vocabulary::from_pieces(vec![
            Piece {
                text: "a".to_string(),
                id: 3,
                score: -1.0,
            },
            Piece {
                text: "b".to_string(),
                id: 4,
                score: -1.0,
            },
            Piece {
                text: "ab".to_string(),
                id: 5,
                score: -1.5,
            },
        ])
        .expect("Failed to build vocabulary");
        TrainedModel {
            vocabulary,
            specials,
        }
    }

    fn tokenizer() -> Tokenizer {
        Tokenizer::from_model(sample_model()).expect("Failed to build tokenizer")
    }

    #[test]
    fn test_encode_prepends_bos_by_default() {
        let tok = tokenizer();
        assert_eq!(tok.encode("ab"), vec![0, 5]);
        // The injected piece carries the display string
        let pieces = tok.encode_pieces("ab");
        assert_eq!(pieces[0].text, "<bos>");
    }

    #[test]
    fn test_encode_without_bos_injection() {
        let tok = tokenizer().with_add_bos(false);
        assert_eq!(tok.encode("ab"), vec![5]);
    }

    #[test]
    fn test_empty_input_encodes_to_bos_only() {
        let tok = tokenizer();
        assert_eq!(tok.encode(""), vec![0]);
        assert!(tok.with_add_bos(false).encode("").is_empty());
    }

    #[test]
    fn test_decode_skips_specials_and_renders_unknown() {
        let tok = tokenizer();
        // bos + "ab" + unk + eos
        let text = tok.decode(&[0, 5, 2, 1]).expect("Failed to decode");
        assert_eq!(text, "ab<unk>");
    }

    #[test]
    fn test_decode_rejects_out_of_range_id() {
        let tok = tokenizer();
        let err = tok.decode(&[42]).unwrap_err();
        assert!(matches!(
            err,
            TokenizerError::UnknownTokenId {
                id: 42,
                vocab_size: 6
            }
        ));
    }

    #[test]
    fn test_encode_decode_roundtrip() {
        let tok = tokenizer();
        let ids = tok.encode("abab");
        let decoded = tok.decode(&ids).expect("Failed to decode");
        assert_eq!(decoded, "abab");
    }

    #[test]
    fn test_unknown_span_keeps_text_in_pieces() {
        let tok = tokenizer().with_add_bos(false);
        let pieces = tok.encode_pieces("axb");
        let joined: String = pieces.iter().map(|p| p.text.as_str()).collect();
        assert_eq!(joined, "axb");
        assert_eq!(pieces[1].id, 2);
    }

    #[test]
    fn test_registry_precedence_in_lookups() {
        let tok = tokenizer();
        assert_eq!(tok.piece_to_id("<bos>"), Some(0));
        assert_eq!(tok.id_to_piece(0), Some("<bos>"));
        assert_eq!(tok.piece_to_id("ab"), Some(5));
        assert_eq!(tok.id_to_piece(5), Some("ab"));
        assert_eq!(tok.piece_to_id("missing"), None);
    }

    #[test]
    fn test_vocab_size_and_dump() {
        let tok = tokenizer();
        assert_eq!(tok.vocab_size(), 6);
        let vocab = tok.get_vocab();
        assert_eq!(vocab.len(), 6);
        assert_eq!(vocab[0], ("<bos>".to_string(), 0));
        assert_eq!(vocab[5], ("ab".to_string(), 5));
    }

    #[test]
    fn test_model_without_unknown_token_is_rejected() {
        let mut model = sample_model();
        model.specials.retain(|s| s.role != SpecialRole::Unk);
        let err = Tokenizer::from_model(model).unwrap_err();
        assert!(matches!(err, TokenizerError::MalformedModelFile { .. }));
    }

    #[test]
    fn test_save_load_encode_agree() {
        let model = sample_model();
        let path = std::env::temp_dir().join(format!(
            "tokenizer_engine_{}_facade_roundtrip.swtk",
            std::process::id()
        ));
        crate::model_codec::save(&model, &path, ScoreEncoding::F32).expect("Failed to save");
        let loaded = Tokenizer::from_file(&path).expect("Failed to load");
        std::fs::remove_file(&path).ok();

        let fresh = Tokenizer::from_model(sample_model()).expect("Failed to build");
        for text in ["", "a", "ab", "abba", "xyz"] {
            assert_eq!(loaded.encode(text), fresh.encode(text));
        }
    }

    #[test]
    fn test_concurrent_encoding_is_consistent() {
        let tok = std::sync::Arc::new(tokenizer());
        let expected = tok.encode("ababab");
        let handles: Vec<_> = (0..4)
            .map(|_| {
                let tok = tok.clone();
                let expected = expected.clone();
                std::thread::spawn(move || {
                    for _ in 0..100 {
                        assert_eq!(tok.encode("ababab"), expected);
                    }
                })
            })
            .collect();
        for handle in handles {
            handle.join().expect("Worker thread panicked");
        }
    }

    #[test]
    fn test_renamed_bos_keeps_id() {
        let overrides = SpecialOverrides {
            bos: Some("<|start|>".to_string()),
            ..SpecialOverrides::default()
        };
        let tok = Tokenizer::from_model_with_specials(sample_model(), &overrides)
            .expect("Failed to build tokenizer");
        assert_eq!(tok.encode("ab"), vec![0, 5]);
        assert_eq!(tok.id_to_piece(0), Some("<|start|>"));
    }
}
