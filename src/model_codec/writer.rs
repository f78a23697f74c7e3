use std::fs::File;
use std::io::BufWriter;
use std::path::Path;

use half::f16;
use log::info;

use super::io::Writer;
use super::{FORMAT_VERSION, MAGIC};
use crate::core::error::TokenizerError;
use crate::core::types::{ScoreEncoding, TrainedModel};

/// Persist a trained model to `path` in format v1.
///
/// Layout (little-endian): magic, format version, score-encoding code,
/// piece count, per-piece length-prefixed UTF-8 text + fixed-width score,
/// special-token table (role code, id, display string). See the module
/// documentation for the exact byte offsets.
///
/// The file handle is scoped to this call and released on every exit
/// path, error paths included.
pub fn save<P: AsRef<Path>>(
    model: &TrainedModel,
    path: P,
    encoding: ScoreEncoding,
) -> Result<(), TokenizerError> {
    let file = File::create(&path)?;
    let mut writer = Writer::new(BufWriter::new(file));

    writer.write_bytes(&MAGIC)?;
    writer.write_u32(FORMAT_VERSION)?;
    writer.write_u8(encoding.code())?;

    writer.write_u64(model.vocabulary.size() as u64)?;
    for piece in model.vocabulary.pieces() {
        writer.write_string(&piece.text)?;
        match encoding {
            ScoreEncoding::F32 => writer.write_f32(piece.score)?,
            ScoreEncoding::F16 => writer.write_u16(f16::from_f32(piece.score).to_bits())?,
        }
    }

    writer.write_u32(model.specials.len() as u32)?;
    for special in &model.specials {
        writer.write_u8(special.role.code())?;
        writer.write_u32(special.id)?;
        writer.write_string(&special.text)?;
    }

    writer.flush()?;
    info!(
        "Saved model: {} pieces, {} special tokens ({:?} scores)",
        model.vocabulary.size(),
        model.specials.len(),
        encoding
    );
    Ok(())
}
