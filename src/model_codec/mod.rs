//! Model Codec: versioned binary persistence for trained models.
//!
//! Format v1, all integers little-endian:
//!
//! | offset | field          | type                                   |
//! |--------|----------------|----------------------------------------|
//! | 0      | magic          | 4 bytes, `b"SWTK"`                     |
//! | 4      | format version | u32 (current = 1)                      |
//! | 8      | score encoding | u8 (0 = f32, 1 = f16)                  |
//! | 9      | piece count    | u64                                    |
//! | 17     | piece records  | piece count × record                   |
//! | …      | special count  | u32                                    |
//! | …      | special records| special count × record                 |
//!
//! Piece record: u32 byte length + UTF-8 bytes + score (4 bytes f32 or
//! 2 bytes IEEE 754 half, per the header's score-encoding code). Piece
//! ids are implicit in record order, starting just above the highest
//! reserved special id.
//!
//! Special record: u8 role code (0 bos, 1 eos, 2 unk, 3 pad) + u32 id +
//! u32 byte length + UTF-8 display string.

pub mod io;
pub mod loader;
pub mod writer;

pub use loader::load;
pub use writer::save;

/// Magic bytes at the start of every model file.
pub const MAGIC: [u8; 4] = *b"SWTK";

/// The only format version this codec reads or writes.
pub const FORMAT_VERSION: u32 = 1;
