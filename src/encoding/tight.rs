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

//! VNC Tight encoding decoder.
//!
//! Every Tight rectangle starts with a compression-control byte. Bits 0..3
//! are reset flags for the four persistent zlib streams; a set bit ends and
//! reinitializes that stream before anything else happens. Bits 4..7 select
//! the mode:
//!
//! - `0x08`: Fill, a single TPIXEL covering the whole rectangle.
//! - `0x09`: JPEG, a compact length and then a JPEG image blitted at the
//!   rectangle origin.
//! - `0x00..=0x07`: Basic, where the low two bits select a zlib stream and bit 2
//!   says an explicit filter byte follows (Copy, Palette or Gradient).
//!
//! Basic payloads shorter than 12 bytes are sent raw, without a compact
//! length or compression. The decoder peeks enough bytes to size the whole
//! record before consuming anything, so a short read never leaves a zlib
//! stream half-fed. Reserved modes `0x0A..=0x0F` are a hard protocol error.

use crate::encoding::common::{tpixel_len, ByteReader};
use crate::encoding::DecodeResult;
use crate::events::ProtocolError;
use crate::framebuffer::{Framebuffer, Region, Rgb};
use crate::protocol::{PixelFormat, Rectangle};
use bytes::{Buf, BytesMut};
use flate2::{Decompress, FlushDecompress, Status};

/// Mode nibble: solid fill.
const MODE_FILL: u8 = 0x08;
/// Mode nibble: JPEG image.
const MODE_JPEG: u8 = 0x09;

/// Filter id: pixels sent as-is.
const FILTER_COPY: u8 = 0;
/// Filter id: palette plus indices.
const FILTER_PALETTE: u8 = 1;
/// Filter id: per-channel prediction error terms.
const FILTER_GRADIENT: u8 = 2;

/// Payloads below this size are sent raw, with no compact length and no
/// compression.
const MIN_BYTES_TO_COMPRESS: usize = 12;

/// Tight rectangle decoder owning the four persistent inflate streams.
pub(crate) struct TightDecoder {
    streams: [Option<Decompress>; 4],
}

impl Default for TightDecoder {
    fn default() -> Self {
        Self::new()
    }
}

impl TightDecoder {
    pub fn new() -> Self {
        Self {
            streams: [None, None, None, None],
        }
    }

    /// Discards every stream's dictionary. Called on disconnect.
    pub fn reset(&mut self) {
        self.streams = [None, None, None, None];
    }

    /// Decodes a Tight rectangle once the complete record is buffered.
    pub fn decode(
        &mut self,
        buf: &mut BytesMut,
        rect: &Rectangle,
        format: &PixelFormat,
        framebuffer: &mut Framebuffer,
    ) -> DecodeResult {
        if buf.is_empty() {
            return DecodeResult::Incomplete;
        }
        let control = buf[0];
        let mode = control >> 4;

        match mode {
            MODE_FILL => self.decode_fill(buf, control, rect, format, framebuffer),
            MODE_JPEG => self.decode_jpeg(buf, control, rect, framebuffer),
            0x00..=0x07 => self.decode_basic(buf, control, rect, format, framebuffer),
            reserved => {
                log::error!(
                    "Tight control byte {control:#04x} uses reserved compression type {reserved:#x}"
                );
                DecodeResult::Fatal
            }
        }
    }

    /// Applies the control byte's stream-reset bits.
    fn apply_resets(&mut self, control: u8) {
        for (i, stream) in self.streams.iter_mut().enumerate() {
            if control & (1 << i) != 0 {
                *stream = None;
            }
        }
    }

    fn decode_fill(
        &mut self,
        buf: &mut BytesMut,
        control: u8,
        rect: &Rectangle,
        format: &PixelFormat,
        framebuffer: &mut Framebuffer,
    ) -> DecodeResult {
        let pixel_len = tpixel_len(format);
        if buf.len() < 1 + pixel_len {
            return DecodeResult::Incomplete;
        }
        self.apply_resets(control);
        buf.advance(1);
        let pixel = buf.split_to(pixel_len);
        let color = ByteReader::new(&pixel)
            .tpixel(format)
            .unwrap_or(Rgb::BLACK);
        framebuffer.fill_region(Region::new(rect.x, rect.y, rect.width, rect.height), color);
        DecodeResult::Done
    }

    fn decode_jpeg(
        &mut self,
        buf: &mut BytesMut,
        control: u8,
        rect: &Rectangle,
        framebuffer: &mut Framebuffer,
    ) -> DecodeResult {
        let Some((jpeg_len, len_bytes)) = peek_compact_len(buf, 1) else {
            return DecodeResult::Incomplete;
        };
        let total = 1 + len_bytes + jpeg_len;
        if buf.len() < total {
            return DecodeResult::Incomplete;
        }
        self.apply_resets(control);
        buf.advance(1 + len_bytes);
        let jpeg = buf.split_to(jpeg_len);

        match image::load_from_memory_with_format(&jpeg, image::ImageFormat::Jpeg) {
            Ok(decoded) => {
                let rgb = decoded.to_rgb8();
                for (px, py, pixel) in rgb.enumerate_pixels() {
                    if px < u32::from(rect.width) && py < u32::from(rect.height) {
                        framebuffer.set_pixel(
                            rect.x.saturating_add(px as u16),
                            rect.y.saturating_add(py as u16),
                            Rgb::new(pixel[0], pixel[1], pixel[2]),
                        );
                    }
                }
            }
            Err(e) => {
                log::error!("Tight JPEG decode failed: {e}, abandoning rectangle");
            }
        }
        DecodeResult::Done
    }

    #[allow(clippy::too_many_lines)]
    fn decode_basic(
        &mut self,
        buf: &mut BytesMut,
        control: u8,
        rect: &Rectangle,
        format: &PixelFormat,
        framebuffer: &mut Framebuffer,
    ) -> DecodeResult {
        let mode = control >> 4;
        let stream_id = usize::from(mode & 0x03);
        let explicit_filter = mode & 0x04 != 0;

        let filter = if explicit_filter {
            match buf.get(1) {
                Some(&f) => f,
                None => return DecodeResult::Incomplete,
            }
        } else {
            FILTER_COPY
        };
        let header_len = if explicit_filter { 2 } else { 1 };

        let pixel_len = tpixel_len(format);
        let width = usize::from(rect.width);
        let height = usize::from(rect.height);

        // Sizing pass: how many palette bytes precede the data, and how large
        // the uncompressed payload is.
        let (palette_colors, data_start, uncompressed_len) = match filter {
            FILTER_COPY | FILTER_GRADIENT => (0, header_len, rect.area() * pixel_len),
            FILTER_PALETTE => {
                let Some(&colors_byte) = buf.get(header_len) else {
                    return DecodeResult::Incomplete;
                };
                let colors = usize::from(colors_byte) + 1;
                let row_bytes = if colors <= 2 { (width + 7) / 8 } else { width };
                (
                    colors,
                    header_len + 1 + colors * pixel_len,
                    row_bytes * height,
                )
            }
            unknown => {
                log::error!("Tight filter {unknown} is not defined");
                return DecodeResult::Fatal;
            }
        };

        let (payload_len, payload_start, compressed) = if uncompressed_len < MIN_BYTES_TO_COMPRESS {
            (uncompressed_len, data_start, false)
        } else {
            let Some((len, len_bytes)) = peek_compact_len(buf, data_start) else {
                return DecodeResult::Incomplete;
            };
            (len, data_start + len_bytes, true)
        };

        if buf.len() < payload_start + payload_len {
            return DecodeResult::Incomplete;
        }

        // The whole record is buffered: commit.
        self.apply_resets(control);
        buf.advance(header_len);

        let palette = if filter == FILTER_PALETTE {
            buf.advance(1); // color count
            let palette_bytes = buf.split_to(palette_colors * pixel_len);
            let mut reader = ByteReader::new(&palette_bytes);
            let mut palette = Vec::with_capacity(palette_colors);
            for _ in 0..palette_colors {
                palette.push(reader.tpixel(format).unwrap_or(Rgb::BLACK));
            }
            palette
        } else {
            Vec::new()
        };

        buf.advance(payload_start - header_len - if filter == FILTER_PALETTE {
            1 + palette_colors * pixel_len
        } else {
            0
        });
        let payload = buf.split_to(payload_len);

        let data = if compressed {
            match self.inflate(stream_id, &payload, uncompressed_len) {
                Ok(data) => data,
                Err(message) => {
                    log::error!(
                        "Tight: {}, abandoning rectangle",
                        ProtocolError::DecompressionFailed(message)
                    );
                    return DecodeResult::Done;
                }
            }
        } else {
            payload.to_vec()
        };

        match filter {
            FILTER_PALETTE => apply_palette(&data, &palette, rect, framebuffer),
            FILTER_GRADIENT => apply_gradient(&data, rect, format, framebuffer),
            _ => apply_copy(&data, rect, format, framebuffer),
        }
        DecodeResult::Done
    }

    /// Inflates one payload on the selected persistent stream.
    fn inflate(
        &mut self,
        stream_id: usize,
        compressed: &[u8],
        expected: usize,
    ) -> Result<Vec<u8>, String> {
        let stream = self.streams[stream_id].get_or_insert_with(|| Decompress::new(true));
        let mut out = vec![0u8; expected];
        let mut in_pos = 0;
        let mut out_pos = 0;

        while in_pos < compressed.len() && out_pos < expected {
            let before_in = stream.total_in();
            let before_out = stream.total_out();

            let status = stream
                .decompress(&compressed[in_pos..], &mut out[out_pos..], FlushDecompress::Sync)
                .map_err(|e| e.to_string())?;

            let consumed = (stream.total_in() - before_in) as usize;
            let produced = (stream.total_out() - before_out) as usize;
            in_pos += consumed;
            out_pos += produced;

            match status {
                Status::Ok => {
                    if consumed == 0 && produced == 0 {
                        return Err("inflate made no progress".to_string());
                    }
                }
                Status::BufError | Status::StreamEnd => break,
            }
        }

        if out_pos < expected {
            log::warn!("Tight stream {stream_id} produced {out_pos} of {expected} bytes");
            out.truncate(out_pos);
        }
        Ok(out)
    }
}

/// Parses a Tight compact length without consuming: 1 to 3 bytes, 7 bits per
/// byte little-endian, high bit flags continuation.
fn peek_compact_len(buf: &BytesMut, at: usize) -> Option<(usize, usize)> {
    let b0 = *buf.get(at)?;
    let mut len = usize::from(b0 & 0x7F);
    if b0 & 0x80 == 0 {
        return Some((len, 1));
    }
    let b1 = *buf.get(at + 1)?;
    len |= usize::from(b1 & 0x7F) << 7;
    if b1 & 0x80 == 0 {
        return Some((len, 2));
    }
    let b2 = *buf.get(at + 2)?;
    len |= usize::from(b2) << 14;
    Some((len, 3))
}

/// Copy filter: TPIXELs row-major.
fn apply_copy(data: &[u8], rect: &Rectangle, format: &PixelFormat, framebuffer: &mut Framebuffer) {
    let mut reader = ByteReader::new(data);
    'rows: for row in 0..rect.height {
        for col in 0..rect.width {
            let Some(color) = reader.tpixel(format) else {
                log::warn!("Tight copy payload truncated at row {row}");
                break 'rows;
            };
            framebuffer.set_pixel(
                rect.x.saturating_add(col),
                rect.y.saturating_add(row),
                color,
            );
        }
    }
}

/// Palette filter: 1-bit indices (rows byte-padded) for two colors, 8-bit
/// indices otherwise.
fn apply_palette(data: &[u8], palette: &[Rgb], rect: &Rectangle, framebuffer: &mut Framebuffer) {
    let width = usize::from(rect.width);
    if palette.len() <= 2 {
        let row_bytes = (width + 7) / 8;
        for row in 0..usize::from(rect.height) {
            for col in 0..width {
                let Some(&byte) = data.get(row * row_bytes + col / 8) else {
                    return;
                };
                let index = usize::from((byte >> (7 - col % 8)) & 1);
                let color = palette.get(index).copied().unwrap_or(Rgb::BLACK);
                framebuffer.set_pixel(
                    rect.x.saturating_add(col as u16),
                    rect.y.saturating_add(row as u16),
                    color,
                );
            }
        }
    } else {
        for row in 0..usize::from(rect.height) {
            for col in 0..width {
                let Some(&index) = data.get(row * width + col) else {
                    return;
                };
                let color = palette.get(usize::from(index)).copied().unwrap_or(Rgb::BLACK);
                framebuffer.set_pixel(
                    rect.x.saturating_add(col as u16),
                    rect.y.saturating_add(row as u16),
                    color,
                );
            }
        }
    }
}

/// Gradient filter: each TPIXEL is a per-channel error term added to a
/// prediction from the left, upper and upper-left neighbors (zero outside
/// the rectangle).
fn apply_gradient(
    data: &[u8],
    rect: &Rectangle,
    format: &PixelFormat,
    framebuffer: &mut Framebuffer,
) {
    let width = usize::from(rect.width);
    let mut reader = ByteReader::new(data);
    let mut prev_row = vec![[0i16; 3]; width];

    for row in 0..rect.height {
        let mut current_row = vec![[0i16; 3]; width];
        for col in 0..width {
            let Some(error) = reader.tpixel(format) else {
                log::warn!("Tight gradient payload truncated at row {row}");
                return;
            };
            let error = [i16::from(error.r), i16::from(error.g), i16::from(error.b)];
            for channel in 0..3 {
                let left = if col > 0 { current_row[col - 1][channel] } else { 0 };
                let upper = prev_row[col][channel];
                let diagonal = if col > 0 { prev_row[col - 1][channel] } else { 0 };
                let predicted = (left + upper - diagonal).clamp(0, 255);
                current_row[col][channel] = (predicted + error[channel]) & 0xFF;
            }
            framebuffer.set_pixel(
                rect.x.saturating_add(col as u16),
                rect.y.saturating_add(row),
                Rgb::new(
                    current_row[col][0] as u8,
                    current_row[col][1] as u8,
                    current_row[col][2] as u8,
                ),
            );
        }
        prev_row = current_row;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::protocol::ENCODING_TIGHT;
    use bytes::BufMut;
    use flate2::{Compress, Compression, FlushCompress};

    const RED: Rgb = Rgb::new(0xFF, 0, 0);
    const GREEN: Rgb = Rgb::new(0, 0xFF, 0);
    const BLUE: Rgb = Rgb::new(0, 0, 0xFF);

    fn rect(w: u16, h: u16) -> Rectangle {
        Rectangle {
            x: 0,
            y: 0,
            width: w,
            height: h,
            encoding: ENCODING_TIGHT,
        }
    }

    fn compact_len(buf: &mut BytesMut, mut len: usize) {
        loop {
            let mut byte = (len & 0x7F) as u8;
            len >>= 7;
            if len != 0 {
                byte |= 0x80;
            }
            buf.put_u8(byte);
            if len == 0 {
                break;
            }
        }
    }

    fn deflate(compressor: &mut Compress, data: &[u8]) -> Vec<u8> {
        let mut out = vec![0u8; data.len() + 128];
        let before = compressor.total_out();
        compressor
            .compress(data, &mut out, FlushCompress::Sync)
            .unwrap();
        out.truncate((compressor.total_out() - before) as usize);
        out
    }

    #[test]
    fn fill_mode_floods_the_rectangle() {
        let mut fb = Framebuffer::new(8, 8);
        let mut buf = BytesMut::from(&[0x80u8, 0x00, 0x00, 0xFF][..]);
        let mut decoder = TightDecoder::new();
        let result = decoder.decode(&mut buf, &rect(8, 8), &PixelFormat::rgb32(), &mut fb);
        assert_eq!(result, DecodeResult::Done);
        assert!(buf.is_empty());
        assert_eq!(fb.pixel(0, 0), Some(BLUE));
        assert_eq!(fb.pixel(7, 7), Some(BLUE));
    }

    #[test]
    fn small_copy_payload_is_raw() {
        // 2x1 rectangle: 6 TPIXEL bytes < 12, so no compact length and no
        // zlib involvement.
        let mut fb = Framebuffer::new(4, 4);
        let mut buf = BytesMut::new();
        buf.put_u8(0x00); // basic, stream 0, no filter byte
        buf.put_slice(&[0xFF, 0x00, 0x00]); // red
        buf.put_slice(&[0x00, 0xFF, 0x00]); // green
        let mut decoder = TightDecoder::new();
        let result = decoder.decode(&mut buf, &rect(2, 1), &PixelFormat::rgb32(), &mut fb);
        assert_eq!(result, DecodeResult::Done);
        assert_eq!(fb.pixel(0, 0), Some(RED));
        assert_eq!(fb.pixel(1, 0), Some(GREEN));
    }

    #[test]
    fn compressed_copy_payload_round_trips() {
        let mut pixels = Vec::new();
        for _ in 0..8 {
            pixels.extend_from_slice(&[0x00, 0x00, 0xFF]);
        }
        let mut compressor = Compress::new(Compression::default(), true);
        let compressed = deflate(&mut compressor, &pixels);

        let mut buf = BytesMut::new();
        buf.put_u8(0x00);
        compact_len(&mut buf, compressed.len());
        buf.put_slice(&compressed);

        let mut fb = Framebuffer::new(8, 8);
        let mut decoder = TightDecoder::new();
        let result = decoder.decode(&mut buf, &rect(4, 2), &PixelFormat::rgb32(), &mut fb);
        assert_eq!(result, DecodeResult::Done);
        assert_eq!(fb.pixel(0, 0), Some(BLUE));
        assert_eq!(fb.pixel(3, 1), Some(BLUE));
    }

    #[test]
    fn palette_filter_with_one_bit_indices() {
        // 9x2 rectangle, two colors: rows are padded to 2 bytes.
        let indices = [0b1010_1010u8, 0b1000_0000, 0b0101_0101, 0b0000_0000];
        // 18 index pixels but payload is 4 bytes < 12: raw.
        let mut buf = BytesMut::new();
        buf.put_u8(0x40); // basic, stream 0, explicit filter
        buf.put_u8(FILTER_PALETTE);
        buf.put_u8(1); // two colors
        buf.put_slice(&[0xFF, 0x00, 0x00]); // palette[0] red
        buf.put_slice(&[0x00, 0xFF, 0x00]); // palette[1] green
        buf.put_slice(&indices);

        let mut fb = Framebuffer::new(9, 2);
        let mut decoder = TightDecoder::new();
        let result = decoder.decode(&mut buf, &rect(9, 2), &PixelFormat::rgb32(), &mut fb);
        assert_eq!(result, DecodeResult::Done);
        assert_eq!(fb.pixel(0, 0), Some(GREEN));
        assert_eq!(fb.pixel(1, 0), Some(RED));
        assert_eq!(fb.pixel(8, 0), Some(GREEN));
        assert_eq!(fb.pixel(0, 1), Some(RED));
        assert_eq!(fb.pixel(1, 1), Some(GREEN));
        assert_eq!(fb.pixel(8, 1), Some(RED));
    }

    #[test]
    fn palette_filter_with_byte_indices() {
        // Three colors -> 8-bit indices. 4x3 = 12 bytes, compressed path.
        let indices = [0u8, 1, 2, 0, 1, 2, 0, 1, 2, 0, 1, 2];
        let mut compressor = Compress::new(Compression::default(), true);
        let compressed = deflate(&mut compressor, &indices);

        let mut buf = BytesMut::new();
        buf.put_u8(0x40);
        buf.put_u8(FILTER_PALETTE);
        buf.put_u8(2); // three colors
        buf.put_slice(&[0xFF, 0x00, 0x00]);
        buf.put_slice(&[0x00, 0xFF, 0x00]);
        buf.put_slice(&[0x00, 0x00, 0xFF]);
        compact_len(&mut buf, compressed.len());
        buf.put_slice(&compressed);

        let mut fb = Framebuffer::new(4, 3);
        let mut decoder = TightDecoder::new();
        let result = decoder.decode(&mut buf, &rect(4, 3), &PixelFormat::rgb32(), &mut fb);
        assert_eq!(result, DecodeResult::Done);
        assert_eq!(fb.pixel(0, 0), Some(RED));
        assert_eq!(fb.pixel(1, 0), Some(GREEN));
        assert_eq!(fb.pixel(2, 0), Some(BLUE));
        assert_eq!(fb.pixel(3, 2), Some(BLUE));
    }

    #[test]
    fn gradient_filter_reconstructs_from_errors() {
        // 2x2 gradient: errors chosen so the true values are
        // (10,0,0) (20,0,0) / (30,0,0) (40,0,0).
        // Predictions: (0,0,0), left=(10..), up=(10..), clamp(20+30-10)=40.
        let errors: &[u8] = &[
            10, 0, 0, // (0,0): predicted 0 -> 10
            10, 0, 0, // (1,0): predicted 10 -> 20
            20, 0, 0, // (0,1): predicted 10 -> 30
            0, 0, 0, // (1,1): predicted clamp(30+20-10)=40 -> 40
        ];
        let mut compressor = Compress::new(Compression::default(), true);
        let compressed = deflate(&mut compressor, errors);

        let mut buf = BytesMut::new();
        buf.put_u8(0x40);
        buf.put_u8(FILTER_GRADIENT);
        compact_len(&mut buf, compressed.len());
        buf.put_slice(&compressed);

        let mut fb = Framebuffer::new(2, 2);
        let mut decoder = TightDecoder::new();
        let result = decoder.decode(&mut buf, &rect(2, 2), &PixelFormat::rgb32(), &mut fb);
        assert_eq!(result, DecodeResult::Done);
        assert_eq!(fb.pixel(0, 0), Some(Rgb::new(10, 0, 0)));
        assert_eq!(fb.pixel(1, 0), Some(Rgb::new(20, 0, 0)));
        assert_eq!(fb.pixel(0, 1), Some(Rgb::new(30, 0, 0)));
        assert_eq!(fb.pixel(1, 1), Some(Rgb::new(40, 0, 0)));
    }

    #[test]
    fn stream_reset_bit_reinitializes_the_dictionary() {
        // Compress two payloads on independent deflate streams. Without the
        // reset bit the second payload (with its fresh zlib header) would be
        // garbage to the persistent inflater; with bit 0 set it must decode.
        let mut pixels_a = Vec::new();
        let mut pixels_b = Vec::new();
        for _ in 0..8 {
            pixels_a.extend_from_slice(&[0xFF, 0x00, 0x00]);
            pixels_b.extend_from_slice(&[0x00, 0xFF, 0x00]);
        }
        let mut compressor_a = Compress::new(Compression::default(), true);
        let compressed_a = deflate(&mut compressor_a, &pixels_a);
        let mut compressor_b = Compress::new(Compression::default(), true);
        let compressed_b = deflate(&mut compressor_b, &pixels_b);

        let mut fb = Framebuffer::new(8, 8);
        let mut decoder = TightDecoder::new();

        let mut buf = BytesMut::new();
        buf.put_u8(0x00);
        compact_len(&mut buf, compressed_a.len());
        buf.put_slice(&compressed_a);
        assert_eq!(
            decoder.decode(&mut buf, &rect(4, 2), &PixelFormat::rgb32(), &mut fb),
            DecodeResult::Done
        );
        assert_eq!(fb.pixel(0, 0), Some(RED));

        let mut buf = BytesMut::new();
        buf.put_u8(0x01); // reset stream 0, then basic on stream 0
        compact_len(&mut buf, compressed_b.len());
        buf.put_slice(&compressed_b);
        assert_eq!(
            decoder.decode(&mut buf, &rect(4, 2), &PixelFormat::rgb32(), &mut fb),
            DecodeResult::Done
        );
        assert_eq!(fb.pixel(0, 0), Some(GREEN));
    }

    #[test]
    fn persistent_dictionary_spans_rectangles() {
        // Two rectangles on one deflate stream decode on one inflate stream.
        let mut pixels_a = Vec::new();
        let mut pixels_b = Vec::new();
        for _ in 0..8 {
            pixels_a.extend_from_slice(&[0xFF, 0x00, 0x00]);
            pixels_b.extend_from_slice(&[0x00, 0xFF, 0x00]);
        }
        let mut compressor = Compress::new(Compression::default(), true);
        let compressed_a = deflate(&mut compressor, &pixels_a);
        let compressed_b = deflate(&mut compressor, &pixels_b);

        let mut fb = Framebuffer::new(8, 8);
        let mut decoder = TightDecoder::new();
        for (compressed, expected) in [(compressed_a, RED), (compressed_b, GREEN)] {
            let mut buf = BytesMut::new();
            buf.put_u8(0x00);
            compact_len(&mut buf, compressed.len());
            buf.put_slice(&compressed);
            assert_eq!(
                decoder.decode(&mut buf, &rect(4, 2), &PixelFormat::rgb32(), &mut fb),
                DecodeResult::Done
            );
            assert_eq!(fb.pixel(0, 0), Some(expected));
        }
    }

    #[test]
    fn reserved_compression_type_is_fatal() {
        let mut fb = Framebuffer::new(4, 4);
        let mut buf = BytesMut::from(&[0xA0u8, 0x00][..]);
        let mut decoder = TightDecoder::new();
        assert_eq!(
            decoder.decode(&mut buf, &rect(4, 4), &PixelFormat::rgb32(), &mut fb),
            DecodeResult::Fatal
        );
    }

    #[test]
    fn incomplete_record_consumes_nothing() {
        let mut fb = Framebuffer::new(8, 8);
        let mut decoder = TightDecoder::new();

        // Fill missing its pixel.
        let mut buf = BytesMut::from(&[0x80u8, 0x00][..]);
        assert_eq!(
            decoder.decode(&mut buf, &rect(8, 8), &PixelFormat::rgb32(), &mut fb),
            DecodeResult::Incomplete
        );
        assert_eq!(buf.len(), 2);

        // Basic with a compact length promising more bytes than buffered.
        let mut buf = BytesMut::new();
        buf.put_u8(0x00);
        compact_len(&mut buf, 50);
        buf.put_slice(&[0u8; 10]);
        assert_eq!(
            decoder.decode(&mut buf, &rect(4, 2), &PixelFormat::rgb32(), &mut fb),
            DecodeResult::Incomplete
        );
        assert_eq!(buf.len(), 12);
        assert_eq!(fb.pixel(0, 0), Some(Rgb::WHITE));
    }

    #[test]
    fn compact_length_encoding_boundaries() {
        let mut buf = BytesMut::from(&[0x7Fu8][..]);
        assert_eq!(peek_compact_len(&buf, 0), Some((127, 1)));
        buf = BytesMut::from(&[0x80u8, 0x01][..]);
        assert_eq!(peek_compact_len(&buf, 0), Some((128, 2)));
        buf = BytesMut::from(&[0xFFu8, 0xFF, 0x03][..]);
        assert_eq!(peek_compact_len(&buf, 0), Some((0xFFFF, 3)));
        buf = BytesMut::from(&[0x80u8][..]);
        assert_eq!(peek_compact_len(&buf, 0), None);
    }
}
