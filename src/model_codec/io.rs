use std::io::{Read, Write};

use crate::core::error::TokenizerError;

/// Longest string record the codec will accept; anything larger means the
/// length prefix was read from a corrupt file.
const MAX_STRING_LEN: u32 = 1 << 20;

pub struct Reader<R: Read> {
    inner: R,
}

impl<R: Read> Reader<R> {
    pub fn new(inner: R) -> Self {
        Reader { inner }
    }

    pub fn read_bytes(&mut self, size: usize) -> Result<Vec<u8>, TokenizerError> {
        let mut vec = vec![0u8; size];
        self.inner.read_exact(&mut vec).map_err(|e| {
            if e.kind() == std::io::ErrorKind::UnexpectedEof {
                TokenizerError::malformed("unexpected end of file")
            } else {
                TokenizerError::Io(e)
            }
        })?;
        Ok(vec)
    }

    // Type-specific read methods, all little-endian
    pub fn read_u8(&mut self) -> Result<u8, TokenizerError> {
        let mut buf = [0u8; 1];
        self.read_into(&mut buf)?;
        Ok(buf[0])
    }

    pub fn read_u16(&mut self) -> Result<u16, TokenizerError> {
        let mut buf = [0u8; 2];
        self.read_into(&mut buf)?;
        Ok(u16::from_le_bytes(buf))
    }

    pub fn read_u32(&mut self) -> Result<u32, TokenizerError> {
        let mut buf = [0u8; 4];
        self.read_into(&mut buf)?;
        Ok(u32::from_le_bytes(buf))
    }

    pub fn read_u64(&mut self) -> Result<u64, TokenizerError> {
        let mut buf = [0u8; 8];
        self.read_into(&mut buf)?;
        Ok(u64::from_le_bytes(buf))
    }

    pub fn read_f32(&mut self) -> Result<f32, TokenizerError> {
        let mut buf = [0u8; 4];
        self.read_into(&mut buf)?;
        Ok(f32::from_le_bytes(buf))
    }

    /// Length-prefixed UTF-8 string: u32 byte count, then the bytes.
    pub fn read_string(&mut self) -> Result<String, TokenizerError> {
        let len = self.read_u32()?;
        if len > MAX_STRING_LEN {
            return Err(TokenizerError::malformed(format!(
                "string record of {} bytes exceeds the {} byte limit",
                len, MAX_STRING_LEN
            )));
        }
        let bytes = self.read_bytes(len as usize)?;
        String::from_utf8(bytes)
            .map_err(|e| TokenizerError::malformed(format!("invalid UTF-8 in string record: {}", e)))
    }

    /// Succeeds only if the underlying stream is exhausted.
    pub fn expect_eof(&mut self) -> Result<(), TokenizerError> {
        let mut buf = [0u8; 1];
        match self.inner.read(&mut buf) {
            Ok(0) => Ok(()),
            Ok(_) => Err(TokenizerError::malformed(
                "trailing bytes after the special-token table",
            )),
            Err(e) => Err(TokenizerError::Io(e)),
        }
    }

    fn read_into(&mut self, buf: &mut [u8]) -> Result<(), TokenizerError> {
        self.inner.read_exact(buf).map_err(|e| {
            if e.kind() == std::io::ErrorKind::UnexpectedEof {
                TokenizerError::malformed("unexpected end of file")
            } else {
                TokenizerError::Io(e)
            }
        })
    }
}

pub struct Writer<W: Write> {
    inner: W,
}

impl<W: Write> Writer<W> {
    pub fn new(inner: W) -> Self {
        Writer { inner }
    }

    pub fn write_bytes(&mut self, bytes: &[u8]) -> Result<(), TokenizerError> {
        self.inner.write_all(bytes)?;
        Ok(())
    }

    pub fn write_u8(&mut self, v: u8) -> Result<(), TokenizerError> {
        self.write_bytes(&[v])
    }

    pub fn write_u16(&mut self, v: u16) -> Result<(), TokenizerError> {
        self.write_bytes(&v.to_le_bytes())
    }

    pub fn write_u32(&mut self, v: u32) -> Result<(), TokenizerError> {
        self.write_bytes(&v.to_le_bytes())
    }

    pub fn write_u64(&mut self, v: u64) -> Result<(), TokenizerError> {
        self.write_bytes(&v.to_le_bytes())
    }

    pub fn write_f32(&mut self, v: f32) -> Result<(), TokenizerError> {
        self.write_bytes(&v.to_le_bytes())
    }

    /// Length-prefixed UTF-8 string: u32 byte count, then the bytes.
    pub fn write_string(&mut self, s: &str) -> Result<(), TokenizerError> {
        self.write_u32(s.len() as u32)?;
        self.write_bytes(s.as_bytes())
    }

    pub fn flush(&mut self) -> Result<(), TokenizerError> {
        self.inner.flush()?;
        Ok(())
    }
}
