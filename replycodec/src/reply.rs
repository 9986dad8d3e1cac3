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

use crate::consts;

/// Classification of a single reply line.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LineClass {
    /// `100-…` terminates a successful reply.
    Success,
    /// `2xx-…` terminates a reply with a backend error.
    Error,
    /// Anything else. Payload if it is not the last line received.
    Payload,
}

impl LineClass {
    /// Classify a reply line by its status code prefix.
    ///
    /// Only the exact `100-` prefix is a success terminator. Any three digit code in the
    /// `200`–`299` range followed by `-` is an error terminator.
    ///
    /// # Example
    /// ```
    /// use dynalink_replycodec::LineClass;
    ///
    /// assert_eq!(LineClass::classify("100-OK"), LineClass::Success);
    /// assert_eq!(LineClass::classify("206-unable to create VM instance 'R1'"), LineClass::Error);
    /// assert_eq!(LineClass::classify("101 nio_udp0"), LineClass::Payload);
    /// ```
    pub fn classify(line: &str) -> LineClass {
        let bytes = line.as_bytes();
        if bytes.len() < consts::CODE_PREFIX_LEN {
            return LineClass::Payload;
        }
        if line.starts_with(consts::SUCCESS_TERMINATOR) {
            return LineClass::Success;
        }
        let is_error = bytes[0] == b'2'
            && bytes[1].is_ascii_digit()
            && bytes[2].is_ascii_digit()
            && bytes[3] == consts::CODE_SEPARATOR;
        if is_error {
            LineClass::Error
        } else {
            LineClass::Payload
        }
    }

    /// Returns `true` for either kind of terminator
    pub fn is_terminal(self) -> bool {
        !matches!(self, LineClass::Payload)
    }
}

/// Outcome signalled by the final line of a reply.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ReplyStatus {
    /// Reply ended with a `100-` line
    Success,
    /// Reply ended with a `2xx-` line
    Error,
    /// Reply was synthesized without consulting the backend (dry run)
    Empty,
}

/// A complete reply to exactly one command.
///
/// Lines are stored without their record separator, in the order the backend sent them,
/// including the terminating line.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Reply {
    lines: Vec<String>,
    status: ReplyStatus,
}

impl Reply {
    /// Assemble a reply from its lines. The status is derived from the last line; a reply
    /// whose last line is not an error terminator counts as successful.
    pub fn from_lines(lines: Vec<String>) -> Reply {
        let status = match lines.last().map(|line| LineClass::classify(line)) {
            Some(LineClass::Error) => ReplyStatus::Error,
            Some(_) => ReplyStatus::Success,
            None => ReplyStatus::Empty,
        };
        Reply { lines, status }
    }

    /// An empty reply, returned when nothing was sent to the backend.
    pub fn empty() -> Reply {
        Reply {
            lines: Vec::new(),
            status: ReplyStatus::Empty,
        }
    }

    /// The outcome of this reply
    pub fn status(&self) -> ReplyStatus {
        self.status
    }

    /// `true` when the reply ended with a success terminator
    pub fn is_success(&self) -> bool {
        self.status == ReplyStatus::Success
    }

    /// `true` when the reply ended with an error terminator
    pub fn is_error(&self) -> bool {
        self.status == ReplyStatus::Error
    }

    /// `true` when the reply carries no lines at all
    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    /// All lines, terminator included
    pub fn lines(&self) -> &[String] {
        &self.lines
    }

    /// Consume the reply and return its lines
    pub fn into_lines(self) -> Vec<String> {
        self.lines
    }

    /// The terminating line, if any
    pub fn terminator(&self) -> Option<&str> {
        self.lines.last().map(String::as_str)
    }

    /// Lines preceding the terminator
    pub fn payload(&self) -> &[String] {
        match self.lines.split_last() {
            Some((_, payload)) => payload,
            None => &[],
        }
    }

    /// Text of the terminator after its status code, e.g. `"0.2.8-RC2"` for `"100-0.2.8-RC2"`.
    pub fn message(&self) -> Option<&str> {
        self.terminator()
            .and_then(|line| line.get(consts::CODE_PREFIX_LEN..))
    }
}
