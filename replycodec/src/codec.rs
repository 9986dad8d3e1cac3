//
// Copyright 2017-2026 Hans W. Uhlig. All Rights Reserved.
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//      http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.
//

use super::{CodecError, LineClass, Reply, consts};
use bytes::{BufMut, BytesMut};
use tokio_util::codec::{Decoder, Encoder};
use tracing::{trace, warn};

/// A codec for the hypervisor control protocol.
///
/// `ReplyCodec` frames outgoing commands as single newline terminated lines and reassembles
/// incoming bytes into complete [`Reply`] values. A reply may arrive split across any number
/// of reads; only the last line received decides whether the reply is complete.
///
/// The codec is stateful and holds the lines of the reply currently being assembled, so
/// each connection needs its own instance.
#[derive(Debug, Clone)]
pub struct ReplyCodec {
    pending: Vec<String>,
    max_lines: usize,
}

impl ReplyCodec {
    /// Creates a new `ReplyCodec` with the default line limit.
    ///
    /// # Example
    /// ```
    /// use dynalink_replycodec::ReplyCodec;
    ///
    /// let codec = ReplyCodec::new();
    /// assert_eq!(codec.pending_lines(), 0);
    /// ```
    pub fn new() -> ReplyCodec {
        ReplyCodec::default()
    }

    /// Creates a codec that fails once a single reply grows beyond `max_lines` lines.
    pub fn with_max_lines(max_lines: usize) -> ReplyCodec {
        ReplyCodec {
            pending: Vec::new(),
            max_lines: max_lines.max(1),
        }
    }

    /// Number of lines assembled so far for the reply in progress
    pub fn pending_lines(&self) -> usize {
        self.pending.len()
    }

    /// Configured line limit
    pub fn max_lines(&self) -> usize {
        self.max_lines
    }

    /// Discard any partially assembled reply.
    pub fn reset(&mut self) {
        self.pending.clear();
    }

    fn encode_command(&mut self, command: &str, dst: &mut BytesMut) -> Result<(), CodecError> {
        let command = command.trim();
        if command.contains(['\r', '\n']) {
            return Err(CodecError::MultilineCommand(command.to_string()));
        }
        dst.reserve(command.len() + 1);
        dst.put_slice(command.as_bytes());
        dst.put_u8(consts::LF);
        Ok(())
    }
}

impl Default for ReplyCodec {
    fn default() -> Self {
        ReplyCodec {
            pending: Vec::new(),
            max_lines: consts::DEFAULT_MAX_LINES,
        }
    }
}

impl Decoder for ReplyCodec {
    type Item = Reply;
    type Error = CodecError;

    /// Accumulates reply lines from `src` and yields a [`Reply`] once the last line received
    /// is a terminator.
    ///
    /// # Behavior
    /// - A buffer that does not end in a line feed holds a partial line. Nothing is consumed
    ///   and `Ok(None)` is returned so the caller reads more data.
    /// - Otherwise the whole buffer is consumed and split on line feeds. A trailing carriage
    ///   return is stripped from each line and the single trailing empty artifact is dropped.
    /// - Only the final line of the assembled reply is classified. `100-` completes a
    ///   successful reply and `2xx-` completes an error reply. Both are returned as values so
    ///   the stream stays usable after a backend error.
    /// - Any other final line means more data is on its way.
    ///
    /// # Errors
    /// [`CodecError::ReplyTooLong`] once more than `max_lines` lines are pending.
    fn decode(&mut self, src: &mut BytesMut) -> Result<Option<Reply>, Self::Error> {
        if src.last() != Some(&consts::LF) {
            return Ok(None);
        }

        let chunk = src.split();
        let text = String::from_utf8_lossy(&chunk);
        let mut lines: Vec<&str> = text
            .split(consts::LF as char)
            .map(|line| line.strip_suffix(consts::CR as char).unwrap_or(line))
            .collect();
        if lines.last() == Some(&"") {
            lines.pop();
        }
        trace!(lines = lines.len(), bytes = chunk.len(), "Decoded reply chunk");
        self.pending.extend(lines.into_iter().map(str::to_string));

        if self.pending.len() > self.max_lines {
            warn!(limit = self.max_lines, "Reply exceeded line limit");
            self.pending.clear();
            return Err(CodecError::ReplyTooLong {
                limit: self.max_lines,
            });
        }

        let complete = self
            .pending
            .last()
            .is_some_and(|line| LineClass::classify(line).is_terminal());
        if complete {
            Ok(Some(Reply::from_lines(std::mem::take(&mut self.pending))))
        } else {
            Ok(None)
        }
    }

    fn decode_eof(&mut self, src: &mut BytesMut) -> Result<Option<Reply>, Self::Error> {
        if let Some(reply) = self.decode(src)? {
            return Ok(Some(reply));
        }
        if src.is_empty() && self.pending.is_empty() {
            return Ok(None);
        }
        let error = CodecError::TruncatedReply {
            pending_lines: self.pending.len(),
            buffered_bytes: src.len(),
        };
        self.pending.clear();
        src.clear();
        Err(error)
    }
}

impl Encoder<&str> for ReplyCodec {
    type Error = CodecError;

    fn encode(&mut self, item: &str, dst: &mut BytesMut) -> Result<(), Self::Error> {
        self.encode_command(item, dst)
    }
}

impl Encoder<String> for ReplyCodec {
    type Error = CodecError;

    fn encode(&mut self, item: String, dst: &mut BytesMut) -> Result<(), Self::Error> {
        self.encode_command(&item, dst)
    }
}
