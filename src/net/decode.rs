//! Incremental UTF-8 decoding of raw read chunks.
//!
//! A fixed-size read can end in the middle of a multi-byte character. Those
//! trailing bytes (at most 3) are held back and prefixed to the next chunk.
//! Bytes that can never form valid UTF-8 are an error; the text decoded
//! before them travels with the error so it is not lost.

use thiserror::Error;

/// Error produced when a connection's byte stream is not valid UTF-8.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DecodeError {
    #[error("invalid UTF-8 sequence at byte {offset} of chunk")]
    Invalid {
        /// Offset of the bad sequence in the chunk (including carried bytes).
        offset: usize,
        /// The offending bytes.
        bytes: Vec<u8>,
        /// Text preceding the bad sequence in the same chunk.
        decoded: String,
    },

    #[error("stream ended inside a {len}-byte partial UTF-8 sequence")]
    Truncated { len: usize },
}

/// Stateful decoder, one per connection.
#[derive(Debug, Default)]
pub struct TextDecoder {
    pending: Vec<u8>,
}

impl TextDecoder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Decode one chunk. May return an empty string if the chunk only
    /// completed part of a character.
    pub fn decode(&mut self, chunk: &[u8]) -> Result<String, DecodeError> {
        let mut bytes = std::mem::take(&mut self.pending);
        bytes.extend_from_slice(chunk);

        match std::str::from_utf8(&bytes) {
            Ok(text) => Ok(text.to_owned()),
            Err(err) => {
                let valid = err.valid_up_to();
                match err.error_len() {
                    // Incomplete sequence at the very end: keep it for later.
                    None => {
                        self.pending = bytes.split_off(valid);
                        // from_utf8 already vouched for bytes[..valid].
                        Ok(String::from_utf8_lossy(&bytes).into_owned())
                    }
                    Some(len) => Err(DecodeError::Invalid {
                        offset: valid,
                        bytes: bytes[valid..valid + len].to_vec(),
                        decoded: String::from_utf8_lossy(&bytes[..valid]).into_owned(),
                    }),
                }
            }
        }
    }

    /// Signal end of stream. Fails if a partial character is still pending.
    pub fn finish(&mut self) -> Result<(), DecodeError> {
        if self.pending.is_empty() {
            Ok(())
        } else {
            let len = self.pending.len();
            self.pending.clear();
            Err(DecodeError::Truncated { len })
        }
    }

    /// Number of bytes held back from the last chunk.
    #[cfg(test)]
    fn pending_len(&self) -> usize {
        self.pending.len()
    }
}
