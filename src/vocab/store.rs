use std::collections::HashMap;

use crate::core::error::TokenizerError;
use crate::core::types::Piece;

/// Immutable table of trained subword pieces.
///
/// Ids are dense and contiguous over `[id_offset, id_offset + size)`; the
/// ids below `id_offset` are reserved for special tokens and never appear
/// here. All fields are private and nothing mutates after construction,
/// so a `Vocabulary` is safely shared (`Send + Sync`) across unlimited
/// concurrent segmentations without locking.
#[derive(Debug, Clone, PartialEq)]
pub struct Vocabulary {
    /// Pieces ordered by id
    pieces: Vec<Piece>,
    /// Reverse index: piece text -> id
    text_to_id: HashMap<String, u32>,
    /// First trained id (== number of reserved special slots)
    id_offset: u32,
    /// Longest piece length in codepoints, cached for the segmenter's
    /// inner loop bound
    max_piece_chars: usize,
}

impl Vocabulary {
    /// Build a vocabulary from pieces ordered by id.
    ///
    /// Validates the data-model invariants: ids must be contiguous from
    /// the first piece's id, and no two pieces may share a string. The
    /// trainer constructs conforming input; the codec relies on this
    /// check to reject tampered model files.
    pub fn from_pieces(pieces: Vec<Piece>) -> Result<Self, TokenizerError> {
        let id_offset = pieces.first().map(|p| p.id).unwrap_or(0);
        let mut text_to_id = HashMap::with_capacity(pieces.len());
        let mut max_piece_chars = 0;

        for (idx, piece) in pieces.iter().enumerate() {
            let expected = id_offset + idx as u32;
            if piece.id != expected {
                return Err(TokenizerError::malformed(format!(
                    "piece ids are not dense: expected {} at position {}, found {}",
                    expected, idx, piece.id
                )));
            }
            if piece.text.is_empty() {
                return Err(TokenizerError::malformed(format!(
                    "piece {} has an empty string",
                    piece.id
                )));
            }
            if text_to_id.insert(piece.text.clone(), piece.id).is_some() {
                return Err(TokenizerError::malformed(format!(
                    "duplicate piece string '{}'",
                    piece.text
                )));
            }
            max_piece_chars = max_piece_chars.max(piece.text.chars().count());
        }

        Ok(Self {
            pieces,
            text_to_id,
            id_offset,
            max_piece_chars,
        })
    }

    /// Id for a piece string, None if the string is not a trained piece.
    /// Callers translate None to the unknown-token id.
    pub fn lookup_id(&self, piece: &str) -> Option<u32> {
        self.text_to_id.get(piece).copied()
    }

    /// Piece string for an id, None if the id is outside the trained range.
    pub fn lookup_piece(&self, id: u32) -> Option<&str> {
        self.index_of(id).map(|i| self.pieces[i].text.as_str())
    }

    /// Log probability for an id, None if the id is outside the trained range.
    pub fn score(&self, id: u32) -> Option<f32> {
        self.index_of(id).map(|i| self.pieces[i].score)
    }

    /// Number of trained pieces (special tokens not included).
    pub fn size(&self) -> usize {
        self.pieces.len()
    }

    /// First trained id; ids below this are reserved for special tokens.
    pub fn id_offset(&self) -> u32 {
        self.id_offset
    }

    /// Longest piece length in codepoints.
    pub fn max_piece_chars(&self) -> usize {
        self.max_piece_chars
    }

    /// Pieces in id order.
    pub fn pieces(&self) -> &[Piece] {
        &self.pieces
    }

    fn index_of(&self, id: u32) -> Option<usize> {
        if id < self.id_offset {
            return None;
        }
        let idx = (id - self.id_offset) as usize;
        (idx < self.pieces.len()).then_some(idx)
    }
}
