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

//! VNC Raw encoding decoder.
//!
//! Raw sends every pixel of the rectangle uncompressed in row-major order.

use crate::encoding::common::read_pixel;
use crate::encoding::DecodeResult;
use crate::framebuffer::Framebuffer;
use crate::protocol::{PixelFormat, Rectangle};
use bytes::BytesMut;

/// Decodes a Raw rectangle.
///
/// The payload size is known up front (`w * h * bytes_per_pixel`), so the
/// whole rectangle is decoded in one step once enough bytes are buffered.
pub(crate) fn decode(
    buf: &mut BytesMut,
    rect: &Rectangle,
    format: &PixelFormat,
    framebuffer: &mut Framebuffer,
) -> DecodeResult {
    let needed = rect.area() * format.bytes_per_pixel();
    if buf.len() < needed {
        return DecodeResult::Incomplete;
    }

    for row in 0..rect.height {
        for col in 0..rect.width {
            let color = read_pixel(buf, format);
            framebuffer.set_pixel(
                rect.x.saturating_add(col),
                rect.y.saturating_add(row),
                color,
            );
        }
    }
    DecodeResult::Done
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::framebuffer::Rgb;
    use crate::protocol::ENCODING_RAW;

    fn rect(x: u16, y: u16, w: u16, h: u16) -> Rectangle {
        Rectangle {
            x,
            y,
            width: w,
            height: h,
            encoding: ENCODING_RAW,
        }
    }

    #[test]
    fn short_buffer_consumes_nothing() {
        let mut fb = Framebuffer::new(4, 4);
        let mut buf = BytesMut::from(&[0u8; 7][..]);
        let result = decode(&mut buf, &rect(0, 0, 2, 1), &PixelFormat::rgb32(), &mut fb);
        assert_eq!(result, DecodeResult::Incomplete);
        assert_eq!(buf.len(), 7);
        assert_eq!(fb.pixel(0, 0), Some(Rgb::WHITE));
    }

    #[test]
    fn two_by_one_little_endian_rectangle() {
        // Blue then green in BGRA byte order (shifts 16/8/0, little-endian).
        let mut fb = Framebuffer::new(4, 4);
        let mut buf = BytesMut::from(&[0xFF, 0x00, 0x00, 0x00, 0x00, 0xFF, 0x00, 0x00][..]);
        let result = decode(&mut buf, &rect(0, 0, 2, 1), &PixelFormat::rgb32(), &mut fb);
        assert_eq!(result, DecodeResult::Done);
        assert!(buf.is_empty());
        assert_eq!(fb.pixel(0, 0), Some(Rgb::new(0, 0, 0xFF)));
        assert_eq!(fb.pixel(1, 0), Some(Rgb::new(0, 0xFF, 0)));
        assert_eq!(fb.pixel(2, 0), Some(Rgb::WHITE));
    }

    #[test]
    fn rectangle_offset_is_respected() {
        let mut fb = Framebuffer::new(4, 4);
        let mut buf = BytesMut::from(&[0x00, 0x00, 0xFF, 0x00][..]);
        decode(&mut buf, &rect(2, 3, 1, 1), &PixelFormat::rgb32(), &mut fb);
        assert_eq!(fb.pixel(2, 3), Some(Rgb::new(0xFF, 0, 0)));
        assert_eq!(fb.pixel(0, 0), Some(Rgb::WHITE));
    }
}
