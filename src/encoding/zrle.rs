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

//! VNC ZRLE encoding decoder.
//!
//! A ZRLE rectangle carries a 4-byte big-endian length followed by that many
//! bytes of zlib data. The inflate stream is persistent: one stream per
//! connection whose LZ77 window carries over from rectangle to rectangle, so
//! only the first rectangle starts with a zlib header. The decompressed
//! stream holds 64x64 tiles in row-major order, each introduced by a
//! subencoding byte:
//!
//! - `0`: raw CPIXELs
//! - `1`: solid, one CPIXEL
//! - `2..=16`: packed palette, 1/2/4-bit indices with rows padded to a byte
//! - `128`: plain RLE
//! - `130..=255`: palette RLE
//!
//! Values 17..=127 and 129 are reserved; a tile using one is logged and the
//! rest of the rectangle is abandoned. A truncated stream paints the
//! remainder of the current tile black rather than failing the connection,
//! matching long-standing client behavior.

use crate::encoding::common::ByteReader;
use crate::encoding::DecodeResult;
use crate::events::ProtocolError;
use crate::framebuffer::{Framebuffer, Region, Rgb};
use crate::protocol::{PixelFormat, Rectangle};
use bytes::{Buf, BytesMut};
use flate2::{Decompress, FlushDecompress, Status};

/// ZRLE tiles are 64x64 pixels, smaller at the rectangle edges.
const TILE_SIZE: u16 = 64;

/// ZRLE rectangle decoder owning the connection's persistent inflate stream.
pub(crate) struct ZrleDecoder {
    inflater: Decompress,
}

impl Default for ZrleDecoder {
    fn default() -> Self {
        Self::new()
    }
}

impl ZrleDecoder {
    pub fn new() -> Self {
        Self {
            // true = expect a zlib header on the stream.
            inflater: Decompress::new(true),
        }
    }

    /// Ends the stream and reinitializes it, discarding the dictionary.
    /// Called on disconnect only; the stream persists across rectangles.
    pub fn reset(&mut self) {
        self.inflater.reset(true);
    }

    /// Decodes a ZRLE rectangle once its complete compressed payload is
    /// buffered.
    ///
    /// The whole record must be present before anything is consumed, so a
    /// retry after a short read never double-feeds the inflate stream.
    pub fn decode(
        &mut self,
        buf: &mut BytesMut,
        rect: &Rectangle,
        format: &PixelFormat,
        framebuffer: &mut Framebuffer,
    ) -> DecodeResult {
        if buf.len() < 4 {
            return DecodeResult::Incomplete;
        }
        let compressed_len =
            u32::from_be_bytes([buf[0], buf[1], buf[2], buf[3]]) as usize;
        if buf.len() < 4 + compressed_len {
            return DecodeResult::Incomplete;
        }
        buf.advance(4);
        let compressed = buf.split_to(compressed_len);
        if compressed_len == 0 {
            return DecodeResult::Done;
        }

        let data = match self.inflate(&compressed) {
            Ok(data) => data,
            Err(message) => {
                log::error!(
                    "ZRLE: {}, abandoning rectangle",
                    ProtocolError::DecompressionFailed(message)
                );
                return DecodeResult::Done;
            }
        };

        decode_tiles(&data, rect, format, framebuffer);
        DecodeResult::Done
    }

    /// Feeds one rectangle's compressed bytes through the persistent stream.
    fn inflate(&mut self, compressed: &[u8]) -> Result<Vec<u8>, String> {
        let mut decompressed = Vec::new();
        let mut out_buf = vec![0u8; 64 * 1024];
        let mut in_pos = 0;

        while in_pos < compressed.len() {
            let before_in = self.inflater.total_in();
            let before_out = self.inflater.total_out();

            let status = self
                .inflater
                .decompress(&compressed[in_pos..], &mut out_buf, FlushDecompress::Sync)
                .map_err(|e| e.to_string())?;

            let consumed = (self.inflater.total_in() - before_in) as usize;
            let produced = (self.inflater.total_out() - before_out) as usize;
            in_pos += consumed;
            decompressed.extend_from_slice(&out_buf[..produced]);

            match status {
                Status::Ok | Status::BufError => {
                    if consumed == 0 && produced == 0 {
                        return Err("inflate made no progress".to_string());
                    }
                }
                Status::StreamEnd => break,
            }
        }
        Ok(decompressed)
    }
}

/// Walks the 64x64 tile grid over the decompressed stream.
fn decode_tiles(data: &[u8], rect: &Rectangle, format: &PixelFormat, framebuffer: &mut Framebuffer) {
    let mut reader = ByteReader::new(data);
    let mut ty: u32 = 0;
    while ty < u32::from(rect.height) {
        let tile_h = TILE_SIZE.min(rect.height - ty as u16);
        let mut tx: u32 = 0;
        while tx < u32::from(rect.width) {
            let tile_w = TILE_SIZE.min(rect.width - tx as u16);
            let tile = Region::new(
                rect.x.saturating_add(tx as u16),
                rect.y.saturating_add(ty as u16),
                tile_w,
                tile_h,
            );
            if !decode_tile(&mut reader, tile, format, framebuffer) {
                return;
            }
            tx += u32::from(TILE_SIZE);
        }
        ty += u32::from(TILE_SIZE);
    }
}

/// Decodes one tile. Returns false when the rest of the rectangle must be
/// abandoned (truncated stream or a reserved subencoding).
fn decode_tile(
    reader: &mut ByteReader<'_>,
    tile: Region,
    format: &PixelFormat,
    framebuffer: &mut Framebuffer,
) -> bool {
    let Some(subencoding) = reader.u8() else {
        log::warn!("ZRLE stream truncated at tile ({}, {})", tile.x, tile.y);
        framebuffer.fill_region(tile, Rgb::BLACK);
        return false;
    };

    match subencoding {
        0 => decode_raw(reader, tile, format, framebuffer),
        1 => decode_solid(reader, tile, format, framebuffer),
        2..=16 => decode_packed_palette(reader, tile, usize::from(subencoding), format, framebuffer),
        128 => decode_plain_rle(reader, tile, format, framebuffer),
        130..=255 => decode_palette_rle(
            reader,
            tile,
            usize::from(subencoding) - 128,
            format,
            framebuffer,
        ),
        reserved => {
            log::warn!("ZRLE reserved subencoding {reserved}, abandoning rectangle");
            false
        }
    }
}

fn truncated(tile: Region, framebuffer: &mut Framebuffer) -> bool {
    log::warn!("ZRLE tile data truncated at ({}, {})", tile.x, tile.y);
    framebuffer.fill_region(tile, Rgb::BLACK);
    false
}

fn decode_raw(
    reader: &mut ByteReader<'_>,
    tile: Region,
    format: &PixelFormat,
    framebuffer: &mut Framebuffer,
) -> bool {
    for row in 0..tile.height {
        for col in 0..tile.width {
            let Some(color) = reader.cpixel(format) else {
                return truncated(tile, framebuffer);
            };
            framebuffer.set_pixel(tile.x.saturating_add(col), tile.y.saturating_add(row), color);
        }
    }
    true
}

fn decode_solid(
    reader: &mut ByteReader<'_>,
    tile: Region,
    format: &PixelFormat,
    framebuffer: &mut Framebuffer,
) -> bool {
    let Some(color) = reader.cpixel(format) else {
        return truncated(tile, framebuffer);
    };
    framebuffer.fill_region(tile, color);
    true
}

fn read_palette(
    reader: &mut ByteReader<'_>,
    size: usize,
    format: &PixelFormat,
) -> Option<Vec<Rgb>> {
    let mut palette = Vec::with_capacity(size);
    for _ in 0..size {
        palette.push(reader.cpixel(format)?);
    }
    Some(palette)
}

fn decode_packed_palette(
    reader: &mut ByteReader<'_>,
    tile: Region,
    palette_size: usize,
    format: &PixelFormat,
    framebuffer: &mut Framebuffer,
) -> bool {
    let Some(palette) = read_palette(reader, palette_size, format) else {
        return truncated(tile, framebuffer);
    };
    let bits = if palette_size == 2 {
        1
    } else if palette_size <= 4 {
        2
    } else {
        4
    };
    let row_bytes = (usize::from(tile.width) * bits + 7) / 8;

    for row in 0..tile.height {
        let Some(packed) = reader.take(row_bytes) else {
            return truncated(tile, framebuffer);
        };
        for col in 0..usize::from(tile.width) {
            let bit_offset = col * bits;
            let byte = packed[bit_offset / 8];
            // Indices are packed most-significant-bits first.
            let shift = 8 - bits - (bit_offset % 8);
            let index = usize::from(byte >> shift) & ((1usize << bits) - 1);
            let color = palette.get(index).copied().unwrap_or(Rgb::BLACK);
            framebuffer.set_pixel(
                tile.x.saturating_add(col as u16),
                tile.y.saturating_add(row),
                color,
            );
        }
    }
    true
}

/// Reads a run length: one plus the sum of a 255-prolongable byte sequence.
fn read_run_length(reader: &mut ByteReader<'_>) -> Option<usize> {
    let mut length = 1usize;
    loop {
        let byte = reader.u8()?;
        length += usize::from(byte);
        if byte != 255 {
            return Some(length);
        }
    }
}

fn decode_plain_rle(
    reader: &mut ByteReader<'_>,
    tile: Region,
    format: &PixelFormat,
    framebuffer: &mut Framebuffer,
) -> bool {
    let area = usize::from(tile.width) * usize::from(tile.height);
    let mut filled = 0usize;
    while filled < area {
        let Some(color) = reader.cpixel(format) else {
            return truncated(tile, framebuffer);
        };
        let Some(run) = read_run_length(reader) else {
            return truncated(tile, framebuffer);
        };
        let run = run.min(area - filled);
        fill_run(tile, &mut filled, run, color, framebuffer);
    }
    true
}

fn decode_palette_rle(
    reader: &mut ByteReader<'_>,
    tile: Region,
    palette_size: usize,
    format: &PixelFormat,
    framebuffer: &mut Framebuffer,
) -> bool {
    let Some(palette) = read_palette(reader, palette_size, format) else {
        return truncated(tile, framebuffer);
    };
    let area = usize::from(tile.width) * usize::from(tile.height);
    let mut filled = 0usize;
    while filled < area {
        let Some(byte) = reader.u8() else {
            return truncated(tile, framebuffer);
        };
        let index = usize::from(byte & 0x7F);
        let run = if byte & 0x80 != 0 {
            let Some(run) = read_run_length(reader) else {
                return truncated(tile, framebuffer);
            };
            run
        } else {
            1
        };
        let color = palette.get(index).copied().unwrap_or(Rgb::BLACK);
        let run = run.min(area - filled);
        fill_run(tile, &mut filled, run, color, framebuffer);
    }
    true
}

/// Paints `run` pixels starting at the tile-relative raster position
/// `*filled`, advancing the position.
fn fill_run(tile: Region, filled: &mut usize, run: usize, color: Rgb, framebuffer: &mut Framebuffer) {
    for _ in 0..run {
        let col = (*filled % usize::from(tile.width)) as u16;
        let row = (*filled / usize::from(tile.width)) as u16;
        framebuffer.set_pixel(tile.x.saturating_add(col), tile.y.saturating_add(row), color);
        *filled += 1;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::protocol::ENCODING_ZRLE;
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
            encoding: ENCODING_ZRLE,
        }
    }

    /// CPIXEL bytes for the rgb32 little-endian format: B, G, R.
    fn cpixel(color: Rgb) -> [u8; 3] {
        [color.b, color.g, color.r]
    }

    /// Compresses one rectangle's tile stream on a (possibly shared)
    /// deflate stream and frames it with the length prefix.
    fn frame(compressor: &mut Compress, tile_stream: &[u8]) -> BytesMut {
        let mut out = vec![0u8; tile_stream.len() + 128];
        let before_out = compressor.total_out();
        compressor
            .compress(tile_stream, &mut out, FlushCompress::Sync)
            .unwrap();
        let produced = (compressor.total_out() - before_out) as usize;
        let mut framed = BytesMut::new();
        framed.put_u32(produced as u32);
        framed.put_slice(&out[..produced]);
        framed
    }

    #[test]
    fn solid_tile_fills_the_rectangle() {
        let mut stream = Vec::new();
        stream.push(1u8); // solid
        stream.extend_from_slice(&cpixel(BLUE));

        let mut compressor = Compress::new(Compression::default(), true);
        let mut buf = frame(&mut compressor, &stream);

        let mut fb = Framebuffer::new(80, 80);
        let mut decoder = ZrleDecoder::new();
        let result = decoder.decode(&mut buf, &rect(10, 10), &PixelFormat::rgb32(), &mut fb);
        assert_eq!(result, DecodeResult::Done);
        assert_eq!(fb.pixel(0, 0), Some(BLUE));
        assert_eq!(fb.pixel(9, 9), Some(BLUE));
        assert_eq!(fb.pixel(10, 0), Some(Rgb::WHITE));
    }

    #[test]
    fn raw_tile_decodes_cpixels() {
        let mut stream = Vec::new();
        stream.push(0u8); // raw
        stream.extend_from_slice(&cpixel(RED));
        stream.extend_from_slice(&cpixel(GREEN));

        let mut compressor = Compress::new(Compression::default(), true);
        let mut buf = frame(&mut compressor, &stream);

        let mut fb = Framebuffer::new(4, 4);
        let mut decoder = ZrleDecoder::new();
        decoder.decode(&mut buf, &rect(2, 1), &PixelFormat::rgb32(), &mut fb);
        assert_eq!(fb.pixel(0, 0), Some(RED));
        assert_eq!(fb.pixel(1, 0), Some(GREEN));
    }

    #[test]
    fn packed_palette_tile_uses_one_bit_indices() {
        // 2-color palette over a 3x2 tile: rows are padded to a byte.
        let mut stream = Vec::new();
        stream.push(2u8);
        stream.extend_from_slice(&cpixel(RED));
        stream.extend_from_slice(&cpixel(GREEN));
        stream.push(0b0100_0000); // row 0: red, green, red
        stream.push(0b1110_0000); // row 1: green, green, green

        let mut compressor = Compress::new(Compression::default(), true);
        let mut buf = frame(&mut compressor, &stream);

        let mut fb = Framebuffer::new(4, 4);
        let mut decoder = ZrleDecoder::new();
        decoder.decode(&mut buf, &rect(3, 2), &PixelFormat::rgb32(), &mut fb);
        assert_eq!(fb.pixel(0, 0), Some(RED));
        assert_eq!(fb.pixel(1, 0), Some(GREEN));
        assert_eq!(fb.pixel(2, 0), Some(RED));
        assert_eq!(fb.pixel(0, 1), Some(GREEN));
        assert_eq!(fb.pixel(2, 1), Some(GREEN));
    }

    #[test]
    fn plain_rle_runs_wrap_rows() {
        let mut stream = Vec::new();
        stream.push(128u8);
        stream.extend_from_slice(&cpixel(RED));
        stream.push(4); // run of 5
        stream.extend_from_slice(&cpixel(BLUE));
        stream.push(0); // run of 1

        let mut compressor = Compress::new(Compression::default(), true);
        let mut buf = frame(&mut compressor, &stream);

        let mut fb = Framebuffer::new(3, 2);
        let mut decoder = ZrleDecoder::new();
        decoder.decode(&mut buf, &rect(3, 2), &PixelFormat::rgb32(), &mut fb);
        assert_eq!(fb.pixel(0, 0), Some(RED));
        assert_eq!(fb.pixel(2, 0), Some(RED));
        assert_eq!(fb.pixel(1, 1), Some(RED));
        assert_eq!(fb.pixel(2, 1), Some(BLUE));
    }

    #[test]
    fn palette_rle_mixes_runs_and_single_pixels() {
        let mut stream = Vec::new();
        stream.push(130u8); // palette RLE, 2 colors
        stream.extend_from_slice(&cpixel(RED));
        stream.extend_from_slice(&cpixel(GREEN));
        stream.push(0x80); // index 0 with run
        stream.push(2); // run of 3
        stream.push(0x01); // single green pixel

        let mut compressor = Compress::new(Compression::default(), true);
        let mut buf = frame(&mut compressor, &stream);

        let mut fb = Framebuffer::new(4, 1);
        let mut decoder = ZrleDecoder::new();
        decoder.decode(&mut buf, &rect(4, 1), &PixelFormat::rgb32(), &mut fb);
        assert_eq!(fb.pixel(0, 0), Some(RED));
        assert_eq!(fb.pixel(2, 0), Some(RED));
        assert_eq!(fb.pixel(3, 0), Some(GREEN));
    }

    #[test]
    fn empty_compressed_payload_is_an_empty_rectangle() {
        let mut buf = BytesMut::new();
        buf.put_u32(0);
        let mut fb = Framebuffer::new(4, 4);
        let mut decoder = ZrleDecoder::new();
        assert_eq!(
            decoder.decode(&mut buf, &rect(4, 4), &PixelFormat::rgb32(), &mut fb),
            DecodeResult::Done
        );
        assert_eq!(fb.pixel(0, 0), Some(Rgb::WHITE));
    }

    #[test]
    fn short_record_consumes_nothing() {
        let mut buf = BytesMut::new();
        buf.put_u32(100);
        buf.put_slice(&[0u8; 10]);
        let mut fb = Framebuffer::new(4, 4);
        let mut decoder = ZrleDecoder::new();
        assert_eq!(
            decoder.decode(&mut buf, &rect(4, 4), &PixelFormat::rgb32(), &mut fb),
            DecodeResult::Incomplete
        );
        assert_eq!(buf.len(), 14);
    }

    #[test]
    fn inflate_dictionary_persists_across_rectangles() {
        // Two rectangles compressed on one deflate stream must decode on one
        // inflate stream; the second chunk has no zlib header and depends on
        // the dictionary established by the first.
        let mut tile_a = vec![1u8];
        tile_a.extend_from_slice(&cpixel(RED));
        let mut tile_b = vec![1u8];
        tile_b.extend_from_slice(&cpixel(GREEN));

        let mut compressor = Compress::new(Compression::default(), true);
        let mut first = frame(&mut compressor, &tile_a);
        let mut second = frame(&mut compressor, &tile_b);

        let mut fb = Framebuffer::new(8, 8);
        let mut decoder = ZrleDecoder::new();
        assert_eq!(
            decoder.decode(&mut first, &rect(4, 4), &PixelFormat::rgb32(), &mut fb),
            DecodeResult::Done
        );
        assert_eq!(
            decoder.decode(&mut second, &rect(4, 4), &PixelFormat::rgb32(), &mut fb),
            DecodeResult::Done
        );
        assert_eq!(fb.pixel(0, 0), Some(GREEN));
    }

    #[test]
    fn truncated_tile_paints_black() {
        // Raw subencoding with no pixel data at all.
        let stream = vec![0u8];
        let mut compressor = Compress::new(Compression::default(), true);
        let mut buf = frame(&mut compressor, &stream);

        let mut fb = Framebuffer::new(4, 4);
        let mut decoder = ZrleDecoder::new();
        assert_eq!(
            decoder.decode(&mut buf, &rect(2, 2), &PixelFormat::rgb32(), &mut fb),
            DecodeResult::Done
        );
        assert_eq!(fb.pixel(0, 0), Some(Rgb::BLACK));
        assert_eq!(fb.pixel(1, 1), Some(Rgb::BLACK));
    }
}
