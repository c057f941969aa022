//! Copying images between formats and bounds.

use super::color::{ycbcr_to_rgb, Nrgba};
use super::geometry::Rect;
use super::image::{Image, Paletted, PixelBuffer, YCbCr};

/// Copy `img` into an 8-bit non-premultiplied RGBA buffer whose bounds start
/// at the origin.
pub fn to_nrgba(img: &Image) -> PixelBuffer {
    let src_rect = img.bounds();
    let mut dst = PixelBuffer::new(src_rect.sub(src_rect.min), 4);
    let (w, h) = (src_rect.dx(), src_rect.dy());
    let row_len = w as usize * 4;
    let min = src_rect.min;

    for y in 0..h {
        let row_start = dst.offset_unchecked(0, y);
        let row = &mut dst.pix_mut()[row_start..row_start + row_len];
        let sy = min.y + y;
        match img {
            Image::Nrgba(src) => {
                let i = src.offset_unchecked(min.x, sy);
                row.copy_from_slice(&src.pix()[i..i + row_len]);
            }
            Image::Nrgba64(src) => {
                let i = src.offset_unchecked(min.x, sy);
                let s = &src.pix()[i..i + w as usize * 8];
                for (d, s) in row.chunks_exact_mut(4).zip(s.chunks_exact(8)) {
                    d.copy_from_slice(&[s[0], s[2], s[4], s[6]]);
                }
            }
            Image::Rgba(src) => {
                let i = src.offset_unchecked(min.x, sy);
                let s = &src.pix()[i..i + row_len];
                for (d, s) in row.chunks_exact_mut(4).zip(s.chunks_exact(4)) {
                    unpremultiply(d, s[0], s[1], s[2], s[3]);
                }
            }
            Image::Rgba64(src) => {
                let i = src.offset_unchecked(min.x, sy);
                let s = &src.pix()[i..i + w as usize * 8];
                for (d, s) in row.chunks_exact_mut(4).zip(s.chunks_exact(8)) {
                    unpremultiply(d, s[0], s[2], s[4], s[6]);
                }
            }
            Image::Gray(src) => {
                let i = src.offset_unchecked(min.x, sy);
                let s = &src.pix()[i..i + w as usize];
                for (d, &c) in row.chunks_exact_mut(4).zip(s) {
                    d.copy_from_slice(&[c, c, c, 0xff]);
                }
            }
            Image::Gray16(src) => {
                let i = src.offset_unchecked(min.x, sy);
                let s = &src.pix()[i..i + w as usize * 2];
                for (d, s) in row.chunks_exact_mut(4).zip(s.chunks_exact(2)) {
                    d.copy_from_slice(&[s[0], s[0], s[0], 0xff]);
                }
            }
            Image::YCbCr(src) => {
                for (x, d) in row.chunks_exact_mut(4).enumerate() {
                    if let Some((yy, cb, cr)) = src.ycbcr_at(min.x + x as i32, sy) {
                        let (r, g, b) = ycbcr_to_rgb(yy, cb, cr);
                        d.copy_from_slice(&[r, g, b, 0xff]);
                    }
                }
            }
            Image::Paletted(src) => {
                let palette = nrgba_palette(src);
                for (x, d) in row.chunks_exact_mut(4).enumerate() {
                    let c = src
                        .color_index_at(min.x + x as i32, sy)
                        .and_then(|i| palette.get(i as usize).copied())
                        .unwrap_or(Nrgba::TRANSPARENT);
                    d.copy_from_slice(&[c.r, c.g, c.b, c.a]);
                }
            }
            Image::Alpha(_) | Image::Alpha16(_) => {
                for (x, d) in row.chunks_exact_mut(4).enumerate() {
                    let c = img.nrgba_at(min.x + x as i32, sy).unwrap_or(Nrgba::TRANSPARENT);
                    d.copy_from_slice(&[c.r, c.g, c.b, c.a]);
                }
            }
        }
    }
    dst
}

fn unpremultiply(d: &mut [u8], r: u8, g: u8, b: u8, a: u8) {
    match a {
        0 => d.copy_from_slice(&[0, 0, 0, 0]),
        0xff => d.copy_from_slice(&[r, g, b, 0xff]),
        _ => {
            let un = |c: u8| (c as u16 * 0xff / a as u16) as u8;
            d.copy_from_slice(&[un(r), un(g), un(b), a]);
        }
    }
}

fn nrgba_palette(img: &Paletted) -> Vec<Nrgba> {
    img.palette()
        .iter()
        .map(|c| Nrgba::from_rgba64(c.to_rgba64()))
        .collect()
}

/// Copy of `img` in the same format with its bounds moved to the origin.
pub fn clone_kind(img: &Image) -> Image {
    let bounds = img.bounds();
    match img {
        Image::Paletted(src) => Image::Paletted(Paletted::from_parts(
            src.indices().copy_region(bounds).rebase(),
            src.palette().to_vec(),
        )),
        Image::YCbCr(src) => {
            let mut out = YCbCr::new(bounds.sub(bounds.min), src.ratio());
            copy_ycbcr(src, &mut out, bounds, bounds.min.x, bounds.min.y);
            Image::YCbCr(out)
        }
        _ => copy_buffer(img, bounds, true),
    }
}

/// The part of `img` inside `rect`, in the same format and at the same
/// coordinates.
pub fn sub_image_kind(img: &Image, rect: Rect) -> Image {
    let region = rect.intersect(&img.bounds());
    match img {
        Image::Paletted(src) => Image::Paletted(Paletted::from_parts(
            src.indices().copy_region(region),
            src.palette().to_vec(),
        )),
        Image::YCbCr(src) => {
            let mut out = YCbCr::new(region, src.ratio());
            copy_ycbcr(src, &mut out, region, 0, 0);
            Image::YCbCr(out)
        }
        _ => copy_buffer(img, region, false),
    }
}

fn copy_buffer(img: &Image, region: Rect, rebase: bool) -> Image {
    match img.as_buffer() {
        Some((format, src)) => {
            let buf = src.copy_region(region);
            Image::from_buffer(format, if rebase { buf.rebase() } else { buf })
        }
        None => img.clone(),
    }
}

fn copy_ycbcr(src: &YCbCr, dst: &mut YCbCr, region: Rect, shift_x: i32, shift_y: i32) {
    for y in region.min.y..region.max.y {
        for x in region.min.x..region.max.x {
            if let Some(v) = src.ycbcr_at(x, y) {
                dst.set_ycbcr(x - shift_x, y - shift_y, v);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::imaging::color::Rgba;
    use crate::imaging::image::{ImageKind, PixelFormat, SubsampleRatio};

    fn filled(format: PixelFormat, rect: Rect, bytes: &[u8]) -> Image {
        let mut img = Image::new(format, rect);
        let buf = img.as_buffer_mut().unwrap();
        for px in buf.pix_mut().chunks_exact_mut(bytes.len()) {
            px.copy_from_slice(bytes);
        }
        img
    }

    #[test]
    fn nrgba_output_starts_at_origin() {
        let img = filled(PixelFormat::Nrgba, Rect::new(5, 5, 7, 6), &[1, 2, 3, 4]);
        let out = to_nrgba(&img);
        assert_eq!(out.rect(), Rect::sized(2, 1));
        assert_eq!(out.pix(), &[1, 2, 3, 4, 1, 2, 3, 4]);
    }

    #[test]
    fn sixteen_bit_formats_take_the_high_byte() {
        let img = filled(PixelFormat::Nrgba64, Rect::sized(1, 1), &[0xab, 0x01, 0xcd, 0x02, 0xef, 0x03, 0x80, 0x04]);
        assert_eq!(to_nrgba(&img).pix(), &[0xab, 0xcd, 0xef, 0x80]);

        let img = filled(PixelFormat::Gray16, Rect::sized(1, 1), &[0x7f, 0xff]);
        assert_eq!(to_nrgba(&img).pix(), &[0x7f, 0x7f, 0x7f, 0xff]);
    }

    #[test]
    fn rgba_is_unpremultiplied() {
        let img = filled(PixelFormat::Rgba, Rect::sized(1, 1), &[64, 32, 0, 128]);
        assert_eq!(to_nrgba(&img).pix(), &[127, 63, 0, 128]);

        let clear = filled(PixelFormat::Rgba, Rect::sized(1, 1), &[9, 9, 9, 0]);
        assert_eq!(to_nrgba(&clear).pix(), &[0, 0, 0, 0]);
    }

    #[test]
    fn gray_and_alpha() {
        let img = filled(PixelFormat::Gray, Rect::sized(2, 1), &[200]);
        assert_eq!(to_nrgba(&img).pix(), &[200, 200, 200, 255, 200, 200, 200, 255]);

        let img = filled(PixelFormat::Alpha, Rect::sized(1, 1), &[0x40]);
        assert_eq!(to_nrgba(&img).pix(), &[255, 255, 255, 0x40]);
    }

    #[test]
    fn paletted_uses_converted_palette() {
        let mut pal = Paletted::new(Rect::sized(2, 1), vec![Rgba::new(0, 0, 0, 255), Rgba::new(64, 32, 0, 128)]);
        pal.set_color_index(1, 0, 1);
        let out = to_nrgba(&Image::Paletted(pal));
        assert_eq!(out.pix(), &[0, 0, 0, 255, 127, 63, 0, 128]);
    }

    #[test]
    fn ycbcr_converts_to_opaque_rgb() {
        let mut img = YCbCr::new(Rect::sized(2, 2), SubsampleRatio::R444);
        img.set_ycbcr(0, 0, (255, 128, 128));
        let out = to_nrgba(&Image::YCbCr(img));
        assert_eq!(&out.pix()[..4], &[255, 255, 255, 255]);
        assert_eq!(&out.pix()[4..8], &[0, 135, 0, 255]);
    }

    #[test]
    fn clone_moves_bounds_and_keeps_format() {
        let img = filled(PixelFormat::Gray, Rect::new(3, 4, 5, 6), &[77]);
        let copy = clone_kind(&img);
        assert_eq!(copy.kind(), ImageKind::Interleaved(PixelFormat::Gray));
        assert_eq!(copy.bounds(), Rect::sized(2, 2));
        assert_eq!(copy.rgba64_at(1, 1), img.rgba64_at(4, 5));

        let ycc = Image::YCbCr(YCbCr::new(Rect::new(1, 1, 3, 3), SubsampleRatio::R422));
        assert_eq!(clone_kind(&ycc).kind(), ImageKind::YCbCr(SubsampleRatio::R422));
    }

    #[test]
    fn sub_image_keeps_coordinates_and_clips() {
        let mut img = Image::new(PixelFormat::Gray, Rect::sized(4, 4));
        img.as_buffer_mut().unwrap().pixel_mut(2, 2).unwrap()[0] = 9;
        let sub = sub_image_kind(&img, Rect::new(2, 2, 10, 10));
        assert_eq!(sub.bounds(), Rect::new(2, 2, 4, 4));
        assert_eq!(sub.nrgba_at(2, 2), Some(Nrgba::new(9, 9, 9, 255)));

        let outside = sub_image_kind(&img, Rect::new(8, 8, 10, 10));
        assert!(outside.bounds().is_empty());
    }
}
