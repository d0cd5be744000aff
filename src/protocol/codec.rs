use std::io;

use bytes::{Buf, Bytes, BytesMut};
use tokio_util::codec::Decoder;

/// Line delimiter. Only `\n` terminates a line; a preceding `\r` is kept.
pub const LINE_DELIMITER: u8 = b'\n';

/// Codec for the client-to-server direction of the chat protocol.
///
/// Each decoded item is one line with its delimiter stripped. Lines are raw
/// bytes and are never checked for any encoding, so whatever a client sends
/// is relayed as is.
///
/// NOTE: There is no maximum line length. A client that never sends a
/// delimiter makes the read buffer grow without bound. Capping it would
/// change what long lines look like to other clients, so it is left as is.
#[derive(Debug, Default)]
pub struct LineCodec {
    /// Index in the buffer up to which no delimiter has been found yet.
    /// Avoids rescanning the same bytes when a long line arrives in pieces.
    next_index: usize,
}

impl LineCodec {
    /// Creates a new line codec.
    pub fn new() -> Self {
        Self::default()
    }
}

impl Decoder for LineCodec {
    type Item = Bytes;
    type Error = io::Error;

    fn decode(&mut self, src: &mut BytesMut) -> Result<Option<Self::Item>, Self::Error> {
        let Some(offset) = src[self.next_index..]
            .iter()
            .position(|&b| b == LINE_DELIMITER)
        else {
            self.next_index = src.len();
            return Ok(None);
        };

        let end = self.next_index + offset;
        self.next_index = 0;

        let line = src.split_to(end).freeze();
        src.advance(1);
        Ok(Some(line))
    }

    fn decode_eof(&mut self, src: &mut BytesMut) -> Result<Option<Self::Item>, Self::Error> {
        if let Some(line) = self.decode(src)? {
            return Ok(Some(line));
        }
        // An unterminated tail is never a line; drop it with the connection.
        src.clear();
        self.next_index = 0;
        Ok(None)
    }
}
