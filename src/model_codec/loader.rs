use std::collections::HashSet;
use std::fs::File;
use std::io::BufReader;
use std::path::Path;

use half::f16;
use log::info;

use super::io::Reader;
use super::{FORMAT_VERSION, MAGIC};
use crate::core::error::TokenizerError;
use crate::core::types::{Piece, ScoreEncoding, SpecialRole, SpecialTokenSpec, TrainedModel};
use crate::vocab::Vocabulary;

/// Refuse piece counts beyond this; a count larger than any plausible
/// vocabulary means the header was read from a corrupt file.
const MAX_PIECE_COUNT: u64 = 16_000_000;

/// Load a trained model from `path`.
///
/// Rejects wrong magic and any truncation or decoding failure with
/// `MalformedModelFile`, and unknown format versions with
/// `UnsupportedFormatVersion` rather than attempting best-effort parsing.
pub fn load<P: AsRef<Path>>(path: P) -> Result<TrainedModel, TokenizerError> {
    let file = File::open(&path)?;
    let mut reader = Reader::new(BufReader::new(file));

    let magic = reader.read_bytes(MAGIC.len())?;
    if magic != MAGIC {
        return Err(TokenizerError::malformed(format!(
            "bad magic bytes {:02X?}, expected {:02X?}",
            magic, MAGIC
        )));
    }

    let version = reader.read_u32()?;
    if version != FORMAT_VERSION {
        return Err(TokenizerError::UnsupportedFormatVersion {
            found: version,
            supported: FORMAT_VERSION,
        });
    }

    let encoding_code = reader.read_u8()?;
    let encoding = ScoreEncoding::from_code(encoding_code).ok_or_else(|| {
        TokenizerError::malformed(format!("unknown score encoding code {}", encoding_code))
    })?;

    let piece_count = reader.read_u64()?;
    if piece_count > MAX_PIECE_COUNT {
        return Err(TokenizerError::malformed(format!(
            "piece count {} exceeds the {} limit",
            piece_count, MAX_PIECE_COUNT
        )));
    }

    // Piece ids are implicit in record order; the base offset is fixed up
    // after the special-token table is read.
    let mut records: Vec<(String, f32)> = Vec::with_capacity(piece_count as usize);
    for _ in 0..piece_count {
        let text = reader.read_string()?;
        let score = match encoding {
            ScoreEncoding::F32 => reader.read_f32()?,
            ScoreEncoding::F16 => f16::from_bits(reader.read_u16()?).to_f32(),
        };
        records.push((text, score));
    }

    let specials = read_special_table(&mut reader)?;
    reader.expect_eof()?;

    let id_offset = specials.iter().map(|s| s.id + 1).max().unwrap_or(0);
    let pieces = records
        .into_iter()
        .enumerate()
        .map(|(idx, (text, score))| Piece {
            text,
            id: id_offset + idx as u32,
            score,
        })
        .collect();
    let vocabulary = Vocabulary::from_pieces(pieces)?;

    info!(
        "Loaded model: {} pieces, {} special tokens (format v{}, {:?} scores)",
        vocabulary.size(),
        specials.len(),
        version,
        encoding
    );
    Ok(TrainedModel {
        vocabulary,
        specials,
    })
}

fn read_special_table<R: std::io::Read>(
    reader: &mut Reader<R>,
) -> Result<Vec<SpecialTokenSpec>, TokenizerError> {
    let count = reader.read_u32()?;
    if count > 256 {
        return Err(TokenizerError::malformed(format!(
            "special-token count {} exceeds the 256 limit",
            count
        )));
    }

    let mut specials = Vec::with_capacity(count as usize);
    let mut seen_roles = HashSet::new();
    let mut seen_ids = HashSet::new();
    let mut seen_texts = HashSet::new();
    for _ in 0..count {
        let role_code = reader.read_u8()?;
        let role = SpecialRole::from_code(role_code).ok_or_else(|| {
            TokenizerError::malformed(format!("unknown special-token role code {}", role_code))
        })?;
        let id = reader.read_u32()?;
        let text = reader.read_string()?;

        if !seen_roles.insert(role) {
            return Err(TokenizerError::malformed(format!(
                "duplicate special-token role {:?}",
                role
            )));
        }
        if !seen_ids.insert(id) {
            return Err(TokenizerError::malformed(format!(
                "duplicate special-token id {}",
                id
            )));
        }
        if !seen_texts.insert(text.clone()) {
            return Err(TokenizerError::malformed(format!(
                "duplicate special-token string '{}'",
                text
            )));
        }
        specials.push(SpecialTokenSpec { role, id, text });
    }
    Ok(specials)
}
