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

//! VNC Hextile encoding decoder.
//!
//! The rectangle is divided into 16x16 tiles in row-major order (the trailing
//! row and column may be narrower). Background and foreground colors persist
//! across tiles within the rectangle unless a tile's subencoding byte
//! overrides them.
//!
//! The decoder computes the exact byte length of a tile from its subencoding
//! byte before consuming anything, so a rectangle split across reads resumes
//! mid-rectangle without repainting completed tiles. The resume cursor is the
//! next tile position plus the inherited colors.

use crate::encoding::common::read_pixel;
use crate::encoding::DecodeResult;
use crate::framebuffer::{Framebuffer, Region, Rgb};
use crate::protocol::{
    PixelFormat, Rectangle, HEXTILE_ANY_SUBRECTS, HEXTILE_BACKGROUND_SPECIFIED,
    HEXTILE_FOREGROUND_SPECIFIED, HEXTILE_RAW, HEXTILE_SUBRECTS_COLOURED,
};
use bytes::{Buf, BytesMut};

/// Hextile tiles are 16x16 pixels, smaller at the rectangle edges.
const TILE_SIZE: u16 = 16;

/// Mid-rectangle resume state: the next tile and the inherited colors.
#[derive(Debug, Clone, Copy)]
struct TileCursor {
    tx: u16,
    ty: u16,
    background: Rgb,
    foreground: Rgb,
}

/// Resumable Hextile rectangle decoder.
///
/// The cursor lives only while a rectangle is split across reads; it is
/// cleared when the rectangle completes, so each new rectangle starts with
/// fresh (black) background and foreground colors.
#[derive(Debug, Default)]
pub(crate) struct HextileDecoder {
    cursor: Option<TileCursor>,
}

impl HextileDecoder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Drops any mid-rectangle state.
    pub fn reset(&mut self) {
        self.cursor = None;
    }

    /// Decodes as many complete tiles as the buffer holds.
    pub fn decode(
        &mut self,
        buf: &mut BytesMut,
        rect: &Rectangle,
        format: &PixelFormat,
        framebuffer: &mut Framebuffer,
    ) -> DecodeResult {
        let mut cursor = self.cursor.take().unwrap_or(TileCursor {
            tx: 0,
            ty: 0,
            background: Rgb::BLACK,
            foreground: Rgb::BLACK,
        });
        let bpp = format.bytes_per_pixel();

        while cursor.ty < rect.height {
            let tile_w = TILE_SIZE.min(rect.width - cursor.tx);
            let tile_h = TILE_SIZE.min(rect.height - cursor.ty);

            match tile_len(buf, tile_w, tile_h, bpp) {
                Some(len) if buf.len() >= len => {}
                _ => {
                    // Tiles completed so far stay painted; resume here.
                    self.cursor = Some(cursor);
                    return DecodeResult::Incomplete;
                }
            }

            self.decode_tile(buf, rect, &mut cursor, tile_w, tile_h, format, framebuffer);

            cursor.tx = cursor.tx.saturating_add(TILE_SIZE);
            if cursor.tx >= rect.width {
                cursor.tx = 0;
                cursor.ty = cursor.ty.saturating_add(TILE_SIZE);
            }
        }
        DecodeResult::Done
    }

    #[allow(clippy::too_many_arguments)]
    fn decode_tile(
        &mut self,
        buf: &mut BytesMut,
        rect: &Rectangle,
        cursor: &mut TileCursor,
        tile_w: u16,
        tile_h: u16,
        format: &PixelFormat,
        framebuffer: &mut Framebuffer,
    ) {
        let x0 = rect.x.saturating_add(cursor.tx);
        let y0 = rect.y.saturating_add(cursor.ty);
        let subencoding = buf.get_u8();

        if subencoding & HEXTILE_RAW != 0 {
            for row in 0..tile_h {
                for col in 0..tile_w {
                    let color = read_pixel(buf, format);
                    framebuffer.set_pixel(x0.saturating_add(col), y0.saturating_add(row), color);
                }
            }
            return;
        }

        if subencoding & HEXTILE_BACKGROUND_SPECIFIED != 0 {
            cursor.background = read_pixel(buf, format);
        }
        framebuffer.fill_region(Region::new(x0, y0, tile_w, tile_h), cursor.background);

        if subencoding & HEXTILE_ANY_SUBRECTS == 0 {
            return;
        }

        if subencoding & HEXTILE_FOREGROUND_SPECIFIED != 0 {
            cursor.foreground = read_pixel(buf, format);
        }

        let count = buf.get_u8();
        for _ in 0..count {
            let color = if subencoding & HEXTILE_SUBRECTS_COLOURED != 0 {
                read_pixel(buf, format)
            } else {
                cursor.foreground
            };
            // xy packs 4-bit x and y offsets; wh packs (w-1, h-1).
            let xy = buf.get_u8();
            let wh = buf.get_u8();
            let sx = u16::from(xy >> 4);
            let sy = u16::from(xy & 0x0F);
            let sw = u16::from(wh >> 4) + 1;
            let sh = u16::from(wh & 0x0F) + 1;
            let sw = sw.min(tile_w.saturating_sub(sx));
            let sh = sh.min(tile_h.saturating_sub(sy));
            framebuffer.fill_region(
                Region::new(x0.saturating_add(sx), y0.saturating_add(sy), sw, sh),
                color,
            );
        }
    }
}

/// Computes the exact byte length of the next tile, or `None` when even the
/// length cannot be determined yet.
fn tile_len(buf: &BytesMut, tile_w: u16, tile_h: u16, bpp: usize) -> Option<usize> {
    let subencoding = *buf.first()?;
    let tile_area = usize::from(tile_w) * usize::from(tile_h);

    if subencoding & HEXTILE_RAW != 0 {
        return Some(1 + tile_area * bpp);
    }

    let mut len = 1usize;
    if subencoding & HEXTILE_BACKGROUND_SPECIFIED != 0 {
        len += bpp;
    }
    if subencoding & HEXTILE_ANY_SUBRECTS != 0 {
        if subencoding & HEXTILE_FOREGROUND_SPECIFIED != 0 {
            len += bpp;
        }
        let count = usize::from(*buf.get(len)?);
        len += 1;
        let per_subrect = if subencoding & HEXTILE_SUBRECTS_COLOURED != 0 {
            bpp + 2
        } else {
            2
        };
        len += count * per_subrect;
    }
    Some(len)
}
