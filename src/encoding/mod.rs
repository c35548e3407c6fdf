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

//! VNC framebuffer encoding decoders.
//!
//! Each decoder consumes the pixel payload of one update rectangle and
//! paints the framebuffer. Decoders are transactional: a decoder either
//! consumes a complete unit of work (for some encodings the whole rectangle,
//! for Hextile a single tile) or consumes nothing and reports that it needs
//! more bytes, so a partial read can be retried without loss.
//!
//! # Supported Encodings
//!
//! - **Raw**: Uncompressed pixel data. Simple but bandwidth-intensive.
//! - **Hextile**: 16x16 tiles with inherited background/foreground colors.
//! - **ZRLE**: Zlib Run-Length Encoding with 64x64 tiles and CPIXEL format.
//! - **Tight**: Fill/JPEG/zlib paths with palette and gradient filters.
//!
//! ZRLE keeps one persistent zlib stream per connection and Tight keeps four;
//! their LZ77 windows survive across rectangles, so the session owns the
//! decoder values and resets them only on disconnect or explicit request.

pub mod common;
pub mod hextile;
pub mod raw;
pub mod tight;
pub mod zrle;

/// Outcome of feeding buffered bytes to a rectangle decoder.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DecodeResult {
    /// The rectangle is fully consumed. Decoders also report this after
    /// abandoning a rectangle whose payload was framed but undecodable
    /// (for example a zlib error), since the connection itself survives.
    Done,
    /// More bytes are required; nothing past the decoder's resume point was
    /// consumed.
    Incomplete,
    /// The record cannot be framed at all; the session must give up on the
    /// connection.
    Fatal,
}
