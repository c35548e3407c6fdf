// Copyright 2025 Dustin McAfee
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! Client events that can be received by the application.

use crate::framebuffer::Region;
use crate::protocol::{ProtocolVersion, SecurityType};
use thiserror::Error;

/// Events emitted by the VNC client.
///
/// Observers receive these over an unbounded channel; they must not call back
/// into the client's read path from the handler.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ClientEvent {
    /// The connection to the server was established or lost.
    ConnectionChanged {
        /// True when the transport came up, false when it went away.
        connected: bool,
    },

    /// The protocol version was negotiated.
    ProtocolVersionChanged {
        /// The version both sides agreed on.
        version: ProtocolVersion,
    },

    /// A security type was selected.
    SecurityTypeChanged {
        /// The type the client selected from the server's offer.
        security_type: SecurityType,
    },

    /// `ServerInit` reported the framebuffer dimensions.
    FramebufferSizeChanged {
        /// Width in pixels.
        width: u16,
        /// Height in pixels.
        height: u16,
    },

    /// A rectangle of the framebuffer was repainted.
    ImageChanged {
        /// The repainted region.
        region: Region,
    },

    /// The server demanded VNC authentication but no password is configured.
    ///
    /// The challenge is held until `set_password` supplies one.
    PasswordRequested,
}

/// Protocol failures surfaced by the client.
///
/// These are reported through log records and state transitions, never by
/// unwinding out of a parser. Most of them mean the server is about to close
/// the connection, or already has.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ProtocolError {
    /// The handshake banner was outside the known version set.
    #[error("unsupported protocol version {0:?}")]
    UnsupportedProtocolVersion(String),

    /// The security list was empty or no offered type is usable.
    #[error("security negotiation failed: {0}")]
    SecurityNegotiationFailed(String),

    /// The server rejected the authentication response.
    #[error("authentication failed: {0}")]
    AuthenticationFailed(String),

    /// A rectangle used an encoding this client does not implement.
    #[error("unsupported encoding {0}")]
    UnsupportedEncoding(i32),

    /// The server insists on a pixel format the decoders cannot render.
    #[error("unsupported pixel format ({bits_per_pixel} bpp)")]
    UnsupportedPixelFormat {
        /// Bits per pixel of the offending format.
        bits_per_pixel: u8,
    },

    /// zlib reported an error while inflating rectangle data.
    #[error("decompression failed: {0}")]
    DecompressionFailed(String),

    /// The server sent a message type other than `FramebufferUpdate`.
    #[error("unknown server message type {0}")]
    UnknownServerMessage(u8),
}
