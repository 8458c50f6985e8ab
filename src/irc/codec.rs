//! IRC line codec for tokio.
//!
//! Splits the byte stream on `\n`, tolerates `\r\n` and bare `\n`, and turns
//! each line into a [`Message`]. Lines that are too long or cannot be parsed
//! are logged and skipped; a single bad line should not end the session.

use bytes::{BufMut, BytesMut};
use tokio_util::codec::{Decoder, Encoder};
use tracing::{trace, warn};

use super::message::{Message, ProtocolError};

/// Longest accepted line: 8191 bytes of IRCv3 tags plus a 512 byte message.
pub const MAX_LINE_LEN: usize = 8191 + 512;

/// Tokio codec for encoding/decoding IRC [`Message`]s.
pub struct IrcCodec {
    /// Index of next byte to check for newline
    next_index: usize,
    /// Set while skipping the rest of an overlong line
    discarding: bool,
    max_len: usize,
}

impl IrcCodec {
    pub fn new() -> Self {
        Self::with_max_len(MAX_LINE_LEN)
    }

    pub fn with_max_len(max_len: usize) -> Self {
        Self {
            next_index: 0,
            discarding: false,
            max_len,
        }
    }

    /// Cut outgoing data at the first line break so a parameter can never
    /// smuggle a second command onto the wire.
    pub fn sanitize(mut data: String) -> String {
        if let Some(pos) = data.find(['\r', '\n']) {
            data.truncate(pos);
        }
        data
    }
}

impl Default for IrcCodec {
    fn default() -> Self {
        Self::new()
    }
}

impl Decoder for IrcCodec {
    type Item = Message;
    type Error = ProtocolError;

    fn decode(&mut self, src: &mut BytesMut) -> Result<Option<Message>, ProtocolError> {
        loop {
            let Some(offset) = src[self.next_index..].iter().position(|b| *b == b'\n') else {
                if src.len() > self.max_len {
                    // No newline in sight; drop what we have and keep skipping.
                    if !self.discarding {
                        warn!(limit = self.max_len, "Discarding overlong line");
                    }
                    self.discarding = true;
                    src.clear();
                    self.next_index = 0;
                } else {
                    self.next_index = src.len();
                }
                return Ok(None);
            };

            let line = src.split_to(self.next_index + offset + 1);
            self.next_index = 0;

            if std::mem::take(&mut self.discarding) {
                continue;
            }
            if line.len() > self.max_len {
                warn!(len = line.len(), limit = self.max_len, "Discarding overlong line");
                continue;
            }

            let text = String::from_utf8_lossy(&line);
            let text = text.trim_end_matches(['\r', '\n']);
            if text.is_empty() {
                continue;
            }

            match text.parse::<Message>() {
                Ok(msg) => {
                    trace!(line = %text, "<-");
                    return Ok(Some(msg));
                }
                Err(e) => warn!(line = %text, error = %e, "Skipping unparseable line"),
            }
        }
    }
}

impl Encoder<Message> for IrcCodec {
    type Error = ProtocolError;

    fn encode(&mut self, msg: Message, dst: &mut BytesMut) -> Result<(), ProtocolError> {
        let line = Self::sanitize(msg.to_string());
        trace!(line = %line, "->");
        dst.reserve(line.len() + 2);
        dst.put_slice(line.as_bytes());
        dst.put_slice(b"\r\n");
        Ok(())
    }
}
