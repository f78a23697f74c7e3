use std::collections::HashMap;

use crate::core::error::TokenizerError;
use crate::core::types::{SpecialRole, SpecialTokenSpec};
use crate::vocab::Vocabulary;

/// Caller-supplied display-string renames, applied over the model's
/// special-token table at registry construction. A rename keeps the
/// role's reserved id and only changes the string; renames for roles the
/// model does not define are ignored.
#[derive(Debug, Clone, Default)]
pub struct SpecialOverrides {
    pub bos: Option<String>,
    pub eos: Option<String>,
    pub unk: Option<String>,
    pub pad: Option<String>,
}

impl SpecialOverrides {
    fn for_role(&self, role: SpecialRole) -> Option<&str> {
        match role {
            SpecialRole::Bos => self.bos.as_deref(),
            SpecialRole::Eos => self.eos.as_deref(),
            SpecialRole::Unk => self.unk.as_deref(),
            SpecialRole::Pad => self.pad.as_deref(),
        }
    }
}

/// Immutable role/string/id mapping for the reserved special tokens.
///
/// Built once at load time from the model's special-token table merged
/// with caller overrides. Registry lookups take precedence over
/// Vocabulary Store lookups; the tokenizer facade enforces that ordering.
///
/// Construction checks the disjointness invariant eagerly: a configured
/// special string that resolves to a trained (non-reserved) vocabulary id
/// means the model was not prepared with a reserved slot for it, and
/// construction fails fast with `SpecialTokenCollision`.
#[derive(Debug, Clone, PartialEq)]
pub struct SpecialTokenRegistry {
    specs: Vec<SpecialTokenSpec>,
    role_to_id: HashMap<SpecialRole, u32>,
    text_to_id: HashMap<String, u32>,
    id_to_text: HashMap<u32, String>,
}

impl SpecialTokenRegistry {
    pub fn new(
        table: &[SpecialTokenSpec],
        vocabulary: &Vocabulary,
        overrides: &SpecialOverrides,
    ) -> Result<Self, TokenizerError> {
        let mut specs = Vec::with_capacity(table.len());
        let mut role_to_id = HashMap::with_capacity(table.len());
        let mut text_to_id = HashMap::with_capacity(table.len());
        let mut id_to_text = HashMap::with_capacity(table.len());

        for entry in table {
            let text = overrides
                .for_role(entry.role)
                .unwrap_or(&entry.text)
                .to_string();

            // The string must not independently resolve inside the trained
            // vocabulary; any hit there is a non-reserved id.
            if let Some(trained_id) = vocabulary.lookup_id(&text) {
                return Err(TokenizerError::SpecialTokenCollision {
                    token: text,
                    id: trained_id,
                });
            }
            if let Some(&existing) = text_to_id.get(&text) {
                return Err(TokenizerError::SpecialTokenCollision {
                    token: text,
                    id: existing,
                });
            }
            if id_to_text.contains_key(&entry.id) {
                return Err(TokenizerError::SpecialTokenCollision {
                    token: text,
                    id: entry.id,
                });
            }

            role_to_id.insert(entry.role, entry.id);
            text_to_id.insert(text.clone(), entry.id);
            id_to_text.insert(entry.id, text.clone());
            specs.push(SpecialTokenSpec {
                role: entry.role,
                id: entry.id,
                text,
            });
        }

        Ok(Self {
            specs,
            role_to_id,
            text_to_id,
            id_to_text,
        })
    }

    /// Reserved id for a role, None if the model does not define it.
    pub fn resolve(&self, role: SpecialRole) -> Option<u32> {
        self.role_to_id.get(&role).copied()
    }

    /// Reserved id for a display string.
    pub fn id_for_string(&self, s: &str) -> Option<u32> {
        self.text_to_id.get(s).copied()
    }

    /// Display string for a reserved id.
    pub fn string_for_id(&self, id: u32) -> Option<&str> {
        self.id_to_text.get(&id).map(String::as_str)
    }

    pub fn contains_id(&self, id: u32) -> bool {
        self.id_to_text.contains_key(&id)
    }

    /// The effective table, overrides applied, in the model's order.
    pub fn specs(&self) -> &[SpecialTokenSpec] {
        &self.specs
    }

    pub fn len(&self) -> usize {
        self.specs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.specs.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::types::Piece;

    fn table() -> Vec<SpecialTokenSpec> {
        vec![
            SpecialTokenSpec {
                role: SpecialRole::Bos,
                id: 0,
                text: "<bos>".to_string(),
            },
            SpecialTokenSpec {
                role: SpecialRole::Unk,
                id: 1,
                text: "<unk>".to_string(),
            },
        ]
    }

    fn trained_vocab() -> Vocabulary {
        Vocabulary::from_pieces(vec![
            Piece {
                text: "a".to_string(),
                id: 2,
                score: -1.0,
            },
            Piece {
                text: "<s>".to_string(),
                id: 3,
                score: -4.0,
            },
        ])
        .expect("Failed to build vocabulary")
    }

    #[test]
    fn test_resolve_and_string_lookups() {
        let registry =
            SpecialTokenRegistry::new(&table(), &trained_vocab(), &SpecialOverrides::default())
                .expect("Failed to build registry");
        assert_eq!(registry.resolve(SpecialRole::Bos), Some(0));
        assert_eq!(registry.resolve(SpecialRole::Unk), Some(1));
        assert_eq!(registry.resolve(SpecialRole::Pad), None);
        assert_eq!(registry.id_for_string("<unk>"), Some(1));
        assert_eq!(registry.string_for_id(0), Some("<bos>"));
        assert!(registry.contains_id(1));
        assert!(!registry.contains_id(2));
    }

    #[test]
    fn test_override_renames_string_but_keeps_id() {
        let overrides = SpecialOverrides {
            bos: Some("<|begin|>".to_string()),
            ..SpecialOverrides::default()
        };
        let registry = SpecialTokenRegistry::new(&table(), &trained_vocab(), &overrides)
            .expect("Failed to build registry");
        assert_eq!(registry.resolve(SpecialRole::Bos), Some(0));
        assert_eq!(registry.id_for_string("<|begin|>"), Some(0));
        assert_eq!(registry.id_for_string("<bos>"), None);
        assert_eq!(registry.string_for_id(0), Some("<|begin|>"));
    }

    #[test]
    fn test_collision_with_trained_piece_fails_fast() {
        // "<s>" exists as an ordinary trained piece (id 3)
        let overrides = SpecialOverrides {
            bos: Some("<s>".to_string()),
            ..SpecialOverrides::default()
        };
        let err = SpecialTokenRegistry::new(&table(), &trained_vocab(), &overrides).unwrap_err();
        assert!(matches!(
            err,
            TokenizerError::SpecialTokenCollision { id: 3, .. }
        ));
    }

    #[test]
    fn test_duplicate_strings_across_roles_fail() {
        let overrides = SpecialOverrides {
            bos: Some("<unk>".to_string()),
            ..SpecialOverrides::default()
        };
        let err = SpecialTokenRegistry::new(&table(), &trained_vocab(), &overrides).unwrap_err();
        assert!(matches!(err, TokenizerError::SpecialTokenCollision { .. }));
    }

    #[test]
    fn test_override_for_absent_role_is_ignored() {
        let overrides = SpecialOverrides {
            pad: Some("<pad>".to_string()),
            ..SpecialOverrides::default()
        };
        let registry = SpecialTokenRegistry::new(&table(), &trained_vocab(), &overrides)
            .expect("Failed to build registry");
        assert_eq!(registry.resolve(SpecialRole::Pad), None);
        assert_eq!(registry.id_for_string("<pad>"), None);
    }
}
