//! Framing for IPC streams, which carry JSON objects back to back with no
//! length prefix or mandatory delimiter.

use bytes::{BufMut, BytesMut};
use std::io;
use tokio_util::codec::{Decoder, Encoder};

/// Frames larger than this are treated as a broken stream.
pub const MAX_FRAME_SIZE: usize = 16 * 1024 * 1024;

/// Splits a byte stream at JSON object boundaries.
///
/// Braces inside string literals (including escaped quotes) are ignored,
/// whitespace between objects is skipped, and a frame may arrive over any
/// number of reads. Scanning resumes where the previous read stopped.
#[derive(Debug, Default)]
pub struct JsonObjectCodec {
    scanned: usize,
    depth: usize,
    in_string: bool,
    escaped: bool,
}

impl JsonObjectCodec {
    pub fn new() -> Self {
        Self::default()
    }

    fn reset(&mut self) {
        *self = Self::default();
    }
}

impl Decoder for JsonObjectCodec {
    type Item = BytesMut;
    type Error = io::Error;

    fn decode(&mut self, src: &mut BytesMut) -> Result<Option<Self::Item>, Self::Error> {
        if self.depth == 0 {
            let leading = src
                .iter()
                .take_while(|b| b.is_ascii_whitespace())
                .count();
            let _ = src.split_to(leading);
            self.scanned = 0;

            match src.first() {
                None => return Ok(None),
                Some(b'{') => {}
                Some(other) => {
                    return Err(io::Error::new(
                        io::ErrorKind::InvalidData,
                        format!("expected a JSON object, found byte {other:#04x}"),
                    ));
                }
            }
        }

        while self.scanned < src.len() {
            let byte = src[self.scanned];
            self.scanned += 1;

            if self.in_string {
                match byte {
                    _ if self.escaped => self.escaped = false,
                    b'\\' => self.escaped = true,
                    b'"' => self.in_string = false,
                    _ => {}
                }
                continue;
            }

            match byte {
                b'"' => self.in_string = true,
                b'{' | b'[' => self.depth += 1,
                b'}' | b']' => {
                    self.depth = self.depth.saturating_sub(1);
                    if self.depth == 0 {
                        let frame = src.split_to(self.scanned);
                        self.reset();
                        return Ok(Some(frame));
                    }
                }
                _ => {}
            }
        }

        if src.len() > MAX_FRAME_SIZE {
            return Err(io::Error::new(
                io::ErrorKind::InvalidData,
                format!("frame exceeds {MAX_FRAME_SIZE} bytes"),
            ));
        }
        Ok(None)
    }
}

impl Encoder<Vec<u8>> for JsonObjectCodec {
    type Error = io::Error;

    fn encode(&mut self, item: Vec<u8>, dst: &mut BytesMut) -> Result<(), Self::Error> {
        dst.reserve(item.len() + 1);
        dst.extend_from_slice(&item);
        dst.put_u8(b'\n');
        Ok(())
    }
}
