use serde::Deserialize;

use crate::vocab::Vocabulary;

/// A trained subword unit: string fragment, dense vocabulary id, and
/// log-probability score.
///
/// Ids are unique and contiguous over the trained range; the lowest ids
/// of the overall id space are reserved for special tokens and never
/// appear on a `Piece`.
#[derive(Debug, Clone, PartialEq)]
pub struct Piece {
    /// UTF-8 text of the subword unit
    pub text: String,
    /// Dense id, stable after training
    pub id: u32,
    /// Log probability under the unigram model
    pub score: f32,
}

/// One element of a segmentation: the covered text span and the id it
/// resolved to.
///
/// For unknown spans the id is the unknown-token id while `text` keeps the
/// original input bytes, so concatenating the texts of a segmentation
/// always reconstructs the input exactly.
#[derive(Debug, Clone, PartialEq)]
pub struct SegmentPiece {
    pub text: String,
    pub id: u32,
}

/// Ordered decomposition of an input string into pieces, no gaps or
/// overlaps. Owned by the caller, discarded after use.
pub type Segmentation = Vec<SegmentPiece>;

/// Logical role of a reserved special token.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SpecialRole {
    /// Begin-of-sequence marker
    Bos,
    /// End-of-sequence marker
    Eos,
    /// Unknown-token fallback
    Unk,
    /// Padding
    Pad,
}

impl SpecialRole {
    /// Role code used in the binary model format.
    pub fn code(self) -> u8 {
        match self {
            SpecialRole::Bos => 0,
            SpecialRole::Eos => 1,
            SpecialRole::Unk => 2,
            SpecialRole::Pad => 3,
        }
    }

    /// Inverse of `code`. Returns None for codes this version does not know.
    pub fn from_code(code: u8) -> Option<Self> {
        match code {
            0 => Some(SpecialRole::Bos),
            1 => Some(SpecialRole::Eos),
            2 => Some(SpecialRole::Unk),
            3 => Some(SpecialRole::Pad),
            _ => None,
        }
    }
}

/// A special token as persisted in the model: role, reserved id, display
/// string. Disjoint from the trained piece table.
#[derive(Debug, Clone, PartialEq)]
pub struct SpecialTokenSpec {
    pub role: SpecialRole,
    pub id: u32,
    pub text: String,
}

/// A trained tokenizer model: the vocabulary plus its special-token
/// table. Produced by the trainer, persisted and restored by the model
/// codec.
#[derive(Debug, Clone, PartialEq)]
pub struct TrainedModel {
    pub vocabulary: Vocabulary,
    pub specials: Vec<SpecialTokenSpec>,
}

/// Granularity of the unknown-token fallback in the segmenter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum CoveragePolicy {
    /// One unknown piece per uncovered Unicode codepoint
    #[default]
    Codepoint,
    /// One unknown piece per UTF-8 byte of an uncovered codepoint
    Byte,
}

/// Score representation used by the model codec.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScoreEncoding {
    /// 4-byte IEEE 754 single precision (lossless round-trip)
    F32,
    /// 2-byte IEEE 754 half precision (compact, lossy)
    F16,
}

impl ScoreEncoding {
    pub fn code(self) -> u8 {
        match self {
            ScoreEncoding::F32 => 0,
            ScoreEncoding::F16 => 1,
        }
    }

    pub fn from_code(code: u8) -> Option<Self> {
        match code {
            0 => Some(ScoreEncoding::F32),
            1 => Some(ScoreEncoding::F16),
            _ => None,
        }
    }
}

/// Display strings for the reserved special tokens of a freshly trained
/// model. `unk` is mandatory (the segmenter needs a fallback id); the
/// others can be disabled by setting them to null in a JSON config.
#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(default)]
pub struct SpecialsConfig {
    pub bos: Option<String>,
    pub eos: Option<String>,
    pub unk: String,
    pub pad: Option<String>,
}

impl Default for SpecialsConfig {
    fn default() -> Self {
        Self {
            bos: Some("<bos>".to_string()),
            eos: Some("<eos>".to_string()),
            unk: "<unk>".to_string(),
            pad: Some("<pad>".to_string()),
        }
    }
}

impl SpecialsConfig {
    /// Materialize the special-token table, assigning reserved ids from 0
    /// in fixed role order (bos, eos, unk, pad) over the roles present.
    pub fn to_specs(&self) -> Vec<SpecialTokenSpec> {
        let roles = [
            (SpecialRole::Bos, self.bos.as_deref()),
            (SpecialRole::Eos, self.eos.as_deref()),
            (SpecialRole::Unk, Some(self.unk.as_str())),
            (SpecialRole::Pad, self.pad.as_deref()),
        ];
        let mut specs = Vec::with_capacity(4);
        for (role, text) in roles {
            if let Some(text) = text {
                specs.push(SpecialTokenSpec {
                    role,
                    id: specs.len() as u32,
                    text: text.to_string(),
                });
            }
        }
        specs
    }
}

/// Training configuration. All fields have defaults so a JSON config file
/// only needs to name what it changes.
#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(default)]
pub struct TrainerConfig {
    /// Total vocabulary size, special tokens included
    pub target_vocab_size: usize,
    /// Maximum piece length in codepoints
    pub max_piece_len: usize,
    /// Fraction of multi-character candidates pruned per EM iteration
    pub prune_fraction: f64,
    /// Minimum corpus frequency for a multi-character candidate to be seeded
    pub min_candidate_freq: u64,
    /// Cap on the seeded candidate count (single characters not counted)
    pub seed_size: usize,
    /// Upper bound on EM iterations
    pub em_iterations: usize,
    /// Unknown-token fallback granularity recorded for the model's users
    pub coverage: CoveragePolicy,
    /// Special-token display strings
    pub specials: SpecialsConfig,
}

impl Default for TrainerConfig {
    fn default() -> Self {
        Self {
            target_vocab_size: 8000,
            max_piece_len: 16,
            prune_fraction: 0.2,
            min_candidate_freq: 2,
            seed_size: 1_000_000,
            em_iterations: 10,
            coverage: CoveragePolicy::Codepoint,
            specials: SpecialsConfig::default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_specials_config_assigns_dense_ids_in_role_order() {
        let specs = SpecialsConfig::default().to_specs();
        let roles: Vec<SpecialRole> = specs.iter().map(|s| s.role).collect();
        let ids: Vec<u32> = specs.iter().map(|s| s.id).collect();
        assert_eq!(
            roles,
            vec![
                SpecialRole::Bos,
                SpecialRole::Eos,
                SpecialRole::Unk,
                SpecialRole::Pad
            ]
        );
        assert_eq!(ids, vec![0, 1, 2, 3]);
    }

    #[test]
    fn test_specials_config_skips_disabled_roles() {
        let cfg = SpecialsConfig {
            bos: None,
            eos: None,
            unk: "<unk>".to_string(),
            pad: None,
        };
        let specs = cfg.to_specs();
        assert_eq!(specs.len(), 1);
        assert_eq!(specs[0].role, SpecialRole::Unk);
        assert_eq!(specs[0].id, 0);
    }

    #[test]
    fn test_trainer_config_from_partial_json() {
        let cfg: TrainerConfig =
            serde_json::from_str(r#"{"target_vocab_size": 300, "coverage": "byte"}"#)
                .expect("Failed to parse config");
        assert_eq!(cfg.target_vocab_size, 300);
        assert_eq!(cfg.coverage, CoveragePolicy::Byte);
        // Untouched fields keep their defaults
        assert_eq!(cfg.max_piece_len, TrainerConfig::default().max_piece_len);
    }

    #[test]
    fn test_role_codes_roundtrip() {
        for role in [
            SpecialRole::Bos,
            SpecialRole::Eos,
            SpecialRole::Unk,
            SpecialRole::Pad,
        ] {
            assert_eq!(SpecialRole::from_code(role.code()), Some(role));
        }
        assert_eq!(SpecialRole::from_code(9), None);
    }
}
