// Newline-delimited framing for inbound JSON-RPC messages

use bytes::{Buf, Bytes, BytesMut};
use std::io;
use tokio_util::codec::Decoder;

/// One decoded inbound frame
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Frame {
    /// A complete line, without its terminator
    Message(Bytes),
    /// A line longer than the limit; its bytes were discarded
    Oversized,
}

/// Buffers partial reads and yields one frame per `\n`-terminated line.
///
/// Bytes are not interpreted, so invalid UTF-8 reaches the JSON parser and becomes a
/// parse error instead of a transport failure. Blank lines are skipped.
#[derive(Debug, Clone)]
pub struct JsonLineCodec {
    max_length: usize,
    /// Offset already scanned for a newline
    next_index: usize,
    /// Dropping the rest of an oversized line
    discarding: bool,
}

impl JsonLineCodec {
    pub fn new(max_length: usize) -> Self {
        Self {
            max_length,
            next_index: 0,
            discarding: false,
        }
    }
}

impl Decoder for JsonLineCodec {
    type Item = Frame;
    type Error = io::Error;

    fn decode(&mut self, buf: &mut BytesMut) -> Result<Option<Frame>, io::Error> {
        loop {
            if self.discarding {
                match buf.iter().position(|b| *b == b'\n') {
                    Some(pos) => {
                        buf.advance(pos + 1);
                        self.discarding = false;
                        return Ok(Some(Frame::Oversized));
                    }
                    None => {
                        buf.clear();
                        return Ok(None);
                    }
                }
            }

            match buf[self.next_index..].iter().position(|b| *b == b'\n') {
                Some(offset) => {
                    let end = self.next_index + offset;
                    self.next_index = 0;

                    let mut line = buf.split_to(end + 1);
                    line.truncate(end);
                    if line.last() == Some(&b'\r') {
                        line.truncate(end - 1);
                    }

                    if line.len() > self.max_length {
                        return Ok(Some(Frame::Oversized));
                    }
                    if line.iter().all(u8::is_ascii_whitespace) {
                        continue;
                    }
                    return Ok(Some(Frame::Message(line.freeze())));
                }
                // A trailing `\r` may still be followed by its `\n`
                None if buf.len() > self.max_length + usize::from(buf.last() == Some(&b'\r')) => {
                    self.discarding = true;
                    self.next_index = 0;
                }
                None => {
                    self.next_index = buf.len();
                    return Ok(None);
                }
            }
        }
    }

    fn decode_eof(&mut self, buf: &mut BytesMut) -> Result<Option<Frame>, io::Error> {
        if let Some(frame) = self.decode(buf)? {
            return Ok(Some(frame));
        }

        self.next_index = 0;
        if self.discarding {
            self.discarding = false;
            buf.clear();
            return Ok(Some(Frame::Oversized));
        }
        if buf.iter().all(u8::is_ascii_whitespace) {
            buf.clear();
            return Ok(None);
        }

        // Unterminated trailing fragment: hand it over as a final message
        let line = buf.split_to(buf.len());
        Ok(Some(Frame::Message(line.freeze())))
    }
}
