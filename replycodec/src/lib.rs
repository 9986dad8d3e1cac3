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

//! # Dynalink Reply Codec
//!
//! Framing for the text based control protocol spoken by network-device emulation
//! hypervisors. The protocol is strictly half-duplex: the client writes one command line,
//! then the hypervisor answers with one or more reply lines.
//!
//! ## Wire Format
//!
//! Commands are single ASCII lines terminated by a line feed:
//!
//! ```text
//! hypervisor version
//! nio create_udp nio_udp0 10000 127.0.0.1 10001
//! ```
//!
//! Replies are one or more lines terminated by `\r\n`. The final line carries a status code:
//!
//! ```text
//! 101 nio_udp0
//! 101 nio_udp1
//! 100-OK
//! ```
//!
//! - `100-…` ends a successful reply.
//! - `2xx-…` (any code from `200` to `299`) ends a reply with an error. The whole line is the
//!   error message.
//! - Every preceding line is payload regardless of its own prefix.
//!
//! There is no length prefix. Reply boundaries are discovered only by matching the last line
//! received against the terminator patterns, and a read that ends mid-line is never
//! interpreted.
//!
//! ## Usage Example
//!
//! ```rust
//! use dynalink_replycodec::{ReplyCodec, ReplyStatus};
//! use tokio_util::codec::{Decoder, Encoder};
//! use bytes::BytesMut;
//!
//! # fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let mut codec = ReplyCodec::new();
//!
//! let mut out = BytesMut::new();
//! codec.encode("hypervisor version", &mut out)?;
//! assert_eq!(&out[..], b"hypervisor version\n");
//!
//! let mut input = BytesMut::from(&b"100-0.2.8"[..]);
//! assert!(codec.decode(&mut input)?.is_none());
//! input.extend_from_slice(b"\r\n");
//! let reply = codec.decode(&mut input)?.expect("complete reply");
//! assert_eq!(reply.status(), ReplyStatus::Success);
//! assert_eq!(reply.message(), Some("0.2.8"));
//! # Ok(())
//! # }
//! ```
//!
//! ## Thread Safety
//!
//! `ReplyCodec` holds the lines of the reply in progress and must not be shared between
//! connections.

#![warn(
    clippy::cargo,
    missing_docs,
    clippy::pedantic,
    future_incompatible,
    rust_2018_idioms
)]
#![allow(
    clippy::option_if_let_else,
    clippy::module_name_repetitions,
    clippy::missing_errors_doc
)]

mod codec;
pub mod consts;
mod reply;
mod result;

pub use self::codec::ReplyCodec;
pub use self::reply::{LineClass, Reply, ReplyStatus};
pub use self::result::{CodecError, CodecResult};
