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

//! Pixel reading shared by all decoders.
//!
//! Every decoder funnels wire pixels through this module so none of them
//! branch on bits-per-pixel internally. Three wire forms exist:
//!
//! - **PIXEL**: `bits-per-pixel / 8` bytes in the server's declared
//!   endianness, channels extracted via the per-channel shift/max pairs.
//! - **CPIXEL** (ZRLE): 3 bytes when the format is 32 bpp true-color with
//!   every channel max at most 255; the known-zero byte of the pixel value is
//!   dropped, honoring the big-endian flag.
//! - **TPIXEL** (Tight): 3 bytes of red, green, blue in that order when the
//!   format is 32 bpp true-color with every channel max exactly 255.

use crate::framebuffer::Rgb;
use crate::protocol::PixelFormat;
use bytes::{Buf, BufMut, BytesMut};

/// Scales a channel value with range `0..=max` to 8 bits.
fn channel_to_8(value: u32, max: u16) -> u8 {
    if max == 0 {
        0
    } else if max == 255 {
        value as u8
    } else {
        ((value * 255 + u32::from(max / 2)) / u32::from(max)) as u8
    }
}

/// Scales an 8-bit channel value back to range `0..=max`.
fn channel_from_8(value: u8, max: u16) -> u32 {
    if max == 255 {
        u32::from(value)
    } else {
        (u32::from(value) * u32::from(max) + 127) / 255
    }
}

/// Extracts canonical RGB from a raw pixel value.
pub(crate) fn rgb_from_value(value: u32, format: &PixelFormat) -> Rgb {
    Rgb {
        r: channel_to_8(
            (value >> format.red_shift) & u32::from(format.red_max),
            format.red_max,
        ),
        g: channel_to_8(
            (value >> format.green_shift) & u32::from(format.green_max),
            format.green_max,
        ),
        b: channel_to_8(
            (value >> format.blue_shift) & u32::from(format.blue_max),
            format.blue_max,
        ),
    }
}

/// Packs canonical RGB back into a raw pixel value.
pub(crate) fn value_from_rgb(color: Rgb, format: &PixelFormat) -> u32 {
    (channel_from_8(color.r, format.red_max) << format.red_shift)
        | (channel_from_8(color.g, format.green_max) << format.green_shift)
        | (channel_from_8(color.b, format.blue_max) << format.blue_shift)
}

/// Reads one full wire pixel from the buffer and converts it to RGB.
///
/// The caller must have verified that `format.bytes_per_pixel()` bytes are
/// available. Unsupported pixel widths consume their bytes, log a warning
/// and come back black rather than failing the connection.
pub(crate) fn read_pixel(buf: &mut BytesMut, format: &PixelFormat) -> Rgb {
    let value = match format.bits_per_pixel {
        8 => u32::from(buf.get_u8()),
        16 => {
            if format.big_endian_flag {
                u32::from(buf.get_u16())
            } else {
                u32::from(buf.get_u16_le())
            }
        }
        32 => {
            if format.big_endian_flag {
                buf.get_u32()
            } else {
                buf.get_u32_le()
            }
        }
        other => {
            log::warn!("unsupported pixel format: {other} bits per pixel, painting black");
            let skip = usize::from(other / 8).min(buf.len());
            buf.advance(skip);
            return Rgb::BLACK;
        }
    };
    rgb_from_value(value, format)
}

/// Serializes canonical RGB as one full wire pixel.
pub(crate) fn write_pixel(buf: &mut BytesMut, format: &PixelFormat, color: Rgb) {
    let value = value_from_rgb(color, format);
    match format.bits_per_pixel {
        8 => buf.put_u8(value as u8),
        16 => {
            if format.big_endian_flag {
                buf.put_u16(value as u16);
            } else {
                buf.put_u16_le(value as u16);
            }
        }
        _ => {
            if format.big_endian_flag {
                buf.put_u32(value);
            } else {
                buf.put_u32_le(value);
            }
        }
    }
}

/// Whether ZRLE compacts pixels to 3 bytes for this format.
pub(crate) fn is_compact_cpixel(format: &PixelFormat) -> bool {
    format.bits_per_pixel == 32
        && format.true_colour_flag
        && format.red_max <= 255
        && format.green_max <= 255
        && format.blue_max <= 255
}

/// Bytes per ZRLE CPIXEL for this format.
pub(crate) fn cpixel_len(format: &PixelFormat) -> usize {
    if is_compact_cpixel(format) {
        3
    } else {
        format.bytes_per_pixel()
    }
}

/// Whether Tight compacts pixels to 3 bytes for this format.
pub(crate) fn is_compact_tpixel(format: &PixelFormat) -> bool {
    format.bits_per_pixel == 32
        && format.true_colour_flag
        && format.red_max == 255
        && format.green_max == 255
        && format.blue_max == 255
}

/// Bytes per Tight TPIXEL for this format.
pub(crate) fn tpixel_len(format: &PixelFormat) -> usize {
    if is_compact_tpixel(format) {
        3
    } else {
        format.bytes_per_pixel()
    }
}

/// A cursor over decompressed rectangle data.
///
/// ZRLE and Tight decode from an in-memory buffer after inflation; this
/// reader returns `None` at end of data so callers can handle truncated
/// streams without panicking.
pub(crate) struct ByteReader<'a> {
    data: &'a [u8],
    pos: usize,
}

impl<'a> ByteReader<'a> {
    pub fn new(data: &'a [u8]) -> Self {
        Self { data, pos: 0 }
    }

    pub fn remaining(&self) -> usize {
        self.data.len() - self.pos
    }

    pub fn u8(&mut self) -> Option<u8> {
        let b = *self.data.get(self.pos)?;
        self.pos += 1;
        Some(b)
    }

    pub fn take(&mut self, n: usize) -> Option<&'a [u8]> {
        if self.remaining() < n {
            return None;
        }
        let slice = &self.data[self.pos..self.pos + n];
        self.pos += n;
        Some(slice)
    }

    /// Reads one full wire pixel.
    pub fn pixel(&mut self, format: &PixelFormat) -> Option<Rgb> {
        let mut bytes = BytesMut::from(self.take(format.bytes_per_pixel())?);
        Some(read_pixel(&mut bytes, format))
    }

    /// Reads one ZRLE CPIXEL.
    ///
    /// In compact form the known-zero byte of the 32-bit value is dropped:
    /// the three remaining bytes are the low 24 bits of the pixel value in
    /// the declared endianness.
    pub fn cpixel(&mut self, format: &PixelFormat) -> Option<Rgb> {
        if !is_compact_cpixel(format) {
            return self.pixel(format);
        }
        let bytes = self.take(3)?;
        let value = if format.big_endian_flag {
            (u32::from(bytes[0]) << 16) | (u32::from(bytes[1]) << 8) | u32::from(bytes[2])
        } else {
            u32::from(bytes[0]) | (u32::from(bytes[1]) << 8) | (u32::from(bytes[2]) << 16)
        };
        Some(rgb_from_value(value, format))
    }

    /// Reads one Tight TPIXEL.
    ///
    /// In compact form the three bytes are the red, green and blue components
    /// directly, independent of shifts and endianness.
    pub fn tpixel(&mut self, format: &PixelFormat) -> Option<Rgb> {
        if !is_compact_tpixel(format) {
            return self.pixel(format);
        }
        let bytes = self.take(3)?;
        Some(Rgb::new(bytes[0], bytes[1], bytes[2]))
    }
}
