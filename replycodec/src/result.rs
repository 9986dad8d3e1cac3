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

/// Result Type for Codec Operations
pub type CodecResult<T> = Result<T, CodecError>;

/// Represents possible errors that can occur while framing hypervisor traffic.
#[derive(Debug, thiserror::Error)]
pub enum CodecError {
    /// An I/O error occurred while reading from or writing to the underlying stream.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The backend kept sending lines without ever terminating the reply.
    #[error("reply exceeded {limit} lines without a terminator")]
    ReplyTooLong {
        /// Configured line limit
        limit: usize,
    },

    /// The stream ended while a reply was still being assembled.
    #[error("stream ended with an unterminated reply ({pending_lines} lines, {buffered_bytes} bytes buffered)")]
    TruncatedReply {
        /// Lines already assembled for the reply
        pending_lines: usize,
        /// Bytes of an incomplete trailing line
        buffered_bytes: usize,
    },

    /// A command contained an embedded line break and would desynchronize the exchange.
    #[error("command contains an embedded line break: {0:?}")]
    MultilineCommand(String),
}

impl CodecError {
    /// Check if the error originated in the underlying transport
    pub fn is_io(&self) -> bool {
        matches!(self, CodecError::Io(_))
    }
}
