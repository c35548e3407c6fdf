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

//! VNC Remote Framebuffer (RFB) protocol constants and structures.
//!
//! This module provides the fundamental building blocks for VNC protocol
//! communication from the client side: protocol version negotiation, message
//! types, security handshakes, encodings, and pixel format definitions, as
//! specified in RFC 6143.
//!
//! # Protocol Overview
//!
//! The VNC RFB protocol operates in the following phases:
//! 1. **Protocol Version** - Server and client agree on a protocol version
//! 2. **Security Handshake** - Authentication method selection and execution
//! 3. **Initialization** - Exchange of framebuffer parameters
//! 4. **Normal Operation** - Framebuffer updates in, input events out

use bytes::{Buf, BufMut, BytesMut};

// Client-to-Server Message Types

/// Message type: Client requests to change the pixel format.
///
/// This client echoes the server's advertised format back unchanged so both
/// sides agree on the layout of all subsequent pixel payloads.
pub const CLIENT_MSG_SET_PIXEL_FORMAT: u8 = 0;

/// Message type: Client specifies supported encodings.
///
/// The client sends a list of encoding types it supports, ordered by
/// preference. The server will use the first mutually supported encoding.
pub const CLIENT_MSG_SET_ENCODINGS: u8 = 2;

/// Message type: Client requests a framebuffer update.
///
/// The client can request either an incremental update (changes only) or
/// a full refresh of a specified rectangular region.
pub const CLIENT_MSG_FRAMEBUFFER_UPDATE_REQUEST: u8 = 3;

/// Message type: Client sends a keyboard event.
pub const CLIENT_MSG_KEY_EVENT: u8 = 4;

/// Message type: Client sends a pointer (mouse) event.
pub const CLIENT_MSG_POINTER_EVENT: u8 = 5;

// Server-to-Client Message Types

/// Message type: Server sends a framebuffer update.
///
/// Contains one or more rectangles of pixel data representing screen changes.
/// This is the only server message this client handles; anything else is
/// treated as a protocol failure.
pub const SERVER_MSG_FRAMEBUFFER_UPDATE: u8 = 0;

// Encoding Types

/// Encoding type: Raw (uncompressed pixel data).
pub const ENCODING_RAW: i32 = 0;

/// Encoding type: Hextile (16x16 tiles with inherited colors).
pub const ENCODING_HEXTILE: i32 = 5;

/// Encoding type: Tight (zlib/JPEG with palette and gradient filters).
pub const ENCODING_TIGHT: i32 = 7;

/// Encoding type: ZRLE (zlib run-length encoding over 64x64 tiles).
pub const ENCODING_ZRLE: i32 = 16;

// Hextile subencoding flags

/// Hextile flag: tile is raw pixel data.
pub const HEXTILE_RAW: u8 = 1;

/// Hextile flag: a background pixel precedes the tile body.
pub const HEXTILE_BACKGROUND_SPECIFIED: u8 = 2;

/// Hextile flag: a foreground pixel precedes the subrectangles.
pub const HEXTILE_FOREGROUND_SPECIFIED: u8 = 4;

/// Hextile flag: a subrectangle count and subrectangles follow.
pub const HEXTILE_ANY_SUBRECTS: u8 = 8;

/// Hextile flag: each subrectangle carries its own pixel.
pub const HEXTILE_SUBRECTS_COLOURED: u8 = 16;

// Security Types

/// Security type: Invalid/Unknown.
///
/// Indicates an error or unsupported security mechanism.
pub const SECURITY_TYPE_INVALID: u8 = 0;

/// Security type: None (no authentication).
pub const SECURITY_TYPE_NONE: u8 = 1;

/// Security type: VNC Authentication.
///
/// Standard VNC authentication using DES-encrypted challenge-response.
/// The server sends a 16-byte challenge, which the client encrypts with
/// the password and returns.
pub const SECURITY_TYPE_VNC_AUTH: u8 = 2;

/// Security result: Authentication successful.
pub const SECURITY_RESULT_OK: u32 = 0;

/// Negotiated RFB protocol version.
///
/// Immutable once the handshake banner has been parsed. Versions outside the
/// known set are reported as `Unknown` and abort the handshake.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProtocolVersion {
    /// RFB 3.3: the server dictates the security type as a 32-bit word.
    Rfb33,
    /// RFB 3.7: the server offers a security list; no result after `None`.
    Rfb37,
    /// RFB 3.8: like 3.7 plus a SecurityResult after every security type.
    Rfb38,
    /// Anything else. The connection cannot proceed.
    Unknown,
}

impl ProtocolVersion {
    /// Parses the 12-byte version banner (`RFB 003.XXX\n`).
    pub fn from_banner(banner: &[u8]) -> Self {
        match banner {
            b"RFB 003.003\n" => ProtocolVersion::Rfb33,
            b"RFB 003.007\n" => ProtocolVersion::Rfb37,
            b"RFB 003.008\n" => ProtocolVersion::Rfb38,
            _ => ProtocolVersion::Unknown,
        }
    }

    /// The exact 12 bytes the client echoes back for this version.
    pub fn banner(self) -> Option<&'static [u8; 12]> {
        match self {
            ProtocolVersion::Rfb33 => Some(b"RFB 003.003\n"),
            ProtocolVersion::Rfb37 => Some(b"RFB 003.007\n"),
            ProtocolVersion::Rfb38 => Some(b"RFB 003.008\n"),
            ProtocolVersion::Unknown => None,
        }
    }
}

/// Security type selected during the handshake.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SecurityType {
    /// No mutually supported type; the connection is failing.
    Invalid,
    /// No authentication.
    None,
    /// DES challenge-response authentication.
    VncAuthentication,
    /// A type this client does not implement.
    Unknown(u8),
}

impl SecurityType {
    /// Maps a wire security type number to the enum.
    pub fn from_wire(value: u8) -> Self {
        match value {
            SECURITY_TYPE_INVALID => SecurityType::Invalid,
            SECURITY_TYPE_NONE => SecurityType::None,
            SECURITY_TYPE_VNC_AUTH => SecurityType::VncAuthentication,
            other => SecurityType::Unknown(other),
        }
    }

    /// The wire number for the client's selection byte.
    pub fn to_wire(self) -> u8 {
        match self {
            SecurityType::Invalid => SECURITY_TYPE_INVALID,
            SecurityType::None => SECURITY_TYPE_NONE,
            SecurityType::VncAuthentication => SECURITY_TYPE_VNC_AUTH,
            SecurityType::Unknown(other) => other,
        }
    }
}

/// Describes the layout of a pixel on the wire.
///
/// The server advertises its format in `ServerInit`; this client echoes it
/// back via `SetPixelFormat` and decodes every subsequent pixel payload
/// against it. Full support is limited to 32 bits per pixel true-color with
/// 8-bit channels; other formats are decoded on a best-effort basis.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PixelFormat {
    /// Bits per pixel on the wire (8, 16 or 32).
    pub bits_per_pixel: u8,
    /// Color depth in significant bits.
    pub depth: u8,
    /// True if multi-byte pixels are big-endian.
    pub big_endian_flag: bool,
    /// True if channels are encoded directly rather than via a color map.
    pub true_colour_flag: bool,
    /// Maximum value of the red channel.
    pub red_max: u16,
    /// Maximum value of the green channel.
    pub green_max: u16,
    /// Maximum value of the blue channel.
    pub blue_max: u16,
    /// Right shift of the red channel within the pixel value.
    pub red_shift: u8,
    /// Right shift of the green channel within the pixel value.
    pub green_shift: u8,
    /// Right shift of the blue channel within the pixel value.
    pub blue_shift: u8,
}

impl PixelFormat {
    /// The common 32-bit little-endian true-color format with 8-bit channels.
    pub fn rgb32() -> Self {
        Self {
            bits_per_pixel: 32,
            depth: 24,
            big_endian_flag: false,
            true_colour_flag: true,
            red_max: 255,
            green_max: 255,
            blue_max: 255,
            red_shift: 16,
            green_shift: 8,
            blue_shift: 0,
        }
    }

    /// Reads the 16-byte wire representation. The caller must have verified
    /// that 16 bytes are available.
    pub fn from_bytes(buf: &mut BytesMut) -> Self {
        let bits_per_pixel = buf.get_u8();
        let depth = buf.get_u8();
        let big_endian_flag = buf.get_u8() != 0;
        let true_colour_flag = buf.get_u8() != 0;
        let red_max = buf.get_u16();
        let green_max = buf.get_u16();
        let blue_max = buf.get_u16();
        let red_shift = buf.get_u8();
        let green_shift = buf.get_u8();
        let blue_shift = buf.get_u8();
        buf.advance(3); // padding
        Self {
            bits_per_pixel,
            depth,
            big_endian_flag,
            true_colour_flag,
            red_max,
            green_max,
            blue_max,
            red_shift,
            green_shift,
            blue_shift,
        }
    }

    /// Serializes the 16-byte wire representation.
    pub fn write_to(&self, buf: &mut BytesMut) {
        buf.put_u8(self.bits_per_pixel);
        buf.put_u8(self.depth);
        buf.put_u8(u8::from(self.big_endian_flag));
        buf.put_u8(u8::from(self.true_colour_flag));
        buf.put_u16(self.red_max);
        buf.put_u16(self.green_max);
        buf.put_u16(self.blue_max);
        buf.put_u8(self.red_shift);
        buf.put_u8(self.green_shift);
        buf.put_u8(self.blue_shift);
        buf.put_slice(&[0u8; 3]); // padding
    }

    /// Bytes occupied by one pixel on the wire.
    pub fn bytes_per_pixel(&self) -> usize {
        usize::from(self.bits_per_pixel) / 8
    }

    /// Whether this is a format the decoders render exactly: 32 bits per
    /// pixel, true-color, channels no wider than 8 bits.
    pub fn is_supported(&self) -> bool {
        self.bits_per_pixel == 32
            && self.true_colour_flag
            && self.red_max <= 255
            && self.green_max <= 255
            && self.blue_max <= 255
    }
}

/// The `ServerInit` message received at the end of the handshake.
///
/// Provides the framebuffer dimensions, the server's native pixel format and
/// the desktop name.
#[derive(Debug, Clone)]
pub struct ServerInit {
    /// The width of the framebuffer in pixels.
    pub framebuffer_width: u16,
    /// The height of the framebuffer in pixels.
    pub framebuffer_height: u16,
    /// The pixel format used by the framebuffer.
    pub pixel_format: PixelFormat,
    /// The name of the desktop.
    pub name: String,
}

/// A rectangle header within a framebuffer update message.
///
/// Each framebuffer update can contain multiple rectangles, each with its own
/// encoding type. The header specifies the position, dimensions, and encoding
/// of the pixel data that follows.
#[derive(Debug, Clone, Copy)]
pub struct Rectangle {
    /// X coordinate of the top-left corner.
    pub x: u16,
    /// Y coordinate of the top-left corner.
    pub y: u16,
    /// Width of the rectangle in pixels.
    pub width: u16,
    /// Height of the rectangle in pixels.
    pub height: u16,
    /// The encoding type used for this rectangle's pixel data.
    pub encoding: i32,
}

impl Rectangle {
    /// Reads the 12-byte rectangle header. The caller must have verified that
    /// 12 bytes are available.
    pub fn read_header(buf: &mut BytesMut) -> Self {
        // VNC protocol requires big-endian (network byte order) for all
        // multi-byte integers.
        let x = buf.get_u16();
        let y = buf.get_u16();
        let width = buf.get_u16();
        let height = buf.get_u16();
        let encoding = buf.get_i32();
        Self {
            x,
            y,
            width,
            height,
            encoding,
        }
    }

    /// Number of pixels covered by the rectangle.
    pub fn area(&self) -> usize {
        usize::from(self.width) * usize::from(self.height)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn version_banner_round_trip() {
        for v in [
            ProtocolVersion::Rfb33,
            ProtocolVersion::Rfb37,
            ProtocolVersion::Rfb38,
        ] {
            let banner = v.banner().unwrap();
            assert_eq!(ProtocolVersion::from_banner(banner), v);
        }
        assert_eq!(
            ProtocolVersion::from_banner(b"RFB 004.000\n"),
            ProtocolVersion::Unknown
        );
        assert!(ProtocolVersion::Unknown.banner().is_none());
    }

    #[test]
    fn pixel_format_wire_round_trip() {
        let format = PixelFormat::rgb32();
        let mut buf = BytesMut::new();
        format.write_to(&mut buf);
        assert_eq!(buf.len(), 16);
        let parsed = PixelFormat::from_bytes(&mut buf);
        assert!(buf.is_empty());
        assert_eq!(parsed, format);
    }

    #[test]
    fn rectangle_header_parses_big_endian() {
        let mut buf = BytesMut::new();
        buf.put_u16(10);
        buf.put_u16(20);
        buf.put_u16(300);
        buf.put_u16(200);
        buf.put_i32(ENCODING_ZRLE);
        let rect = Rectangle::read_header(&mut buf);
        assert_eq!(rect.x, 10);
        assert_eq!(rect.y, 20);
        assert_eq!(rect.width, 300);
        assert_eq!(rect.height, 200);
        assert_eq!(rect.encoding, ENCODING_ZRLE);
        assert_eq!(rect.area(), 60_000);
    }
}
