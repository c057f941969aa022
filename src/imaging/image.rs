//! In-memory images.
//!
//! Interleaved formats share [`PixelBuffer`]: a row-major byte buffer with a
//! stride and a bounds rectangle that need not start at the origin. Sixteen-bit
//! channels are stored big-endian.

use super::color::{widen, ycbcr_to_rgb, Nrgba, Rgba, Rgba64};
use super::geometry::{Point, Rect};

/// Error constructing an image from raw parts.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum ImagingError {
    #[error("stride {stride} is shorter than a row of {row_len} bytes")]
    StrideTooSmall { stride: usize, row_len: usize },
    #[error("pixel buffer holds {actual} bytes, bounds need {needed}")]
    BufferTooSmall { needed: usize, actual: usize },
}

/// Layout of an interleaved pixel buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PixelFormat {
    Rgba,
    Rgba64,
    Nrgba,
    Nrgba64,
    Gray,
    Gray16,
    Alpha,
    Alpha16,
}

impl PixelFormat {
    pub fn bytes_per_pixel(&self) -> usize {
        match self {
            PixelFormat::Rgba | PixelFormat::Nrgba => 4,
            PixelFormat::Rgba64 | PixelFormat::Nrgba64 => 8,
            PixelFormat::Gray | PixelFormat::Alpha => 1,
            PixelFormat::Gray16 | PixelFormat::Alpha16 => 2,
        }
    }
}

/// Format tag for any [`Image`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ImageKind {
    Interleaved(PixelFormat),
    Paletted,
    YCbCr(SubsampleRatio),
}

/// Row-major interleaved pixel storage.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PixelBuffer {
    pix: Vec<u8>,
    stride: usize,
    rect: Rect,
    bytes_per_pixel: usize,
}

impl PixelBuffer {
    /// Zeroed buffer covering `rect`.
    pub fn new(rect: Rect, bytes_per_pixel: usize) -> Self {
        let rect = rect.canon();
        let stride = rect.dx() as usize * bytes_per_pixel;
        Self {
            pix: vec![0; stride * rect.dy() as usize],
            stride,
            rect,
            bytes_per_pixel,
        }
    }

    /// Wrap existing bytes; `pix[0]` is the pixel at `rect.min`.
    pub fn from_raw(rect: Rect, bytes_per_pixel: usize, stride: usize, pix: Vec<u8>) -> Result<Self, ImagingError> {
        let rect = rect.canon();
        let row_len = rect.dx() as usize * bytes_per_pixel;
        if stride < row_len {
            return Err(ImagingError::StrideTooSmall { stride, row_len });
        }
        let needed = match rect.dy() as usize {
            0 => 0,
            rows => (rows - 1) * stride + row_len,
        };
        if pix.len() < needed {
            return Err(ImagingError::BufferTooSmall {
                needed,
                actual: pix.len(),
            });
        }
        Ok(Self {
            pix,
            stride,
            rect,
            bytes_per_pixel,
        })
    }

    pub fn rect(&self) -> Rect {
        self.rect
    }

    pub fn stride(&self) -> usize {
        self.stride
    }

    pub fn bytes_per_pixel(&self) -> usize {
        self.bytes_per_pixel
    }

    pub fn pix(&self) -> &[u8] {
        &self.pix
    }

    pub fn pix_mut(&mut self) -> &mut [u8] {
        &mut self.pix
    }

    /// Byte offset of `(x, y)`, or `None` outside the bounds.
    pub fn offset(&self, x: i32, y: i32) -> Option<usize> {
        self.rect
            .contains(Point::new(x, y))
            .then(|| self.offset_unchecked(x, y))
    }

    pub(crate) fn offset_unchecked(&self, x: i32, y: i32) -> usize {
        (y - self.rect.min.y) as usize * self.stride + (x - self.rect.min.x) as usize * self.bytes_per_pixel
    }

    pub fn pixel(&self, x: i32, y: i32) -> Option<&[u8]> {
        let i = self.offset(x, y)?;
        Some(&self.pix[i..i + self.bytes_per_pixel])
    }

    pub fn pixel_mut(&mut self, x: i32, y: i32) -> Option<&mut [u8]> {
        let i = self.offset(x, y)?;
        let bpp = self.bytes_per_pixel;
        Some(&mut self.pix[i..i + bpp])
    }

    /// Copy of the pixels inside `region`, which must lie within the bounds.
    /// The copy keeps `region`'s coordinates.
    pub(crate) fn copy_region(&self, region: Rect) -> PixelBuffer {
        let mut out = PixelBuffer::new(region, self.bytes_per_pixel);
        let row_len = region.dx() as usize * self.bytes_per_pixel;
        for y in region.min.y..region.max.y {
            let src = self.offset_unchecked(region.min.x, y);
            let dst = out.offset_unchecked(region.min.x, y);
            out.pix[dst..dst + row_len].copy_from_slice(&self.pix[src..src + row_len]);
        }
        out
    }

    /// Move the bounds so they start at the origin.
    pub(crate) fn rebase(mut self) -> PixelBuffer {
        self.rect = self.rect.sub(self.rect.min);
        self
    }
}

/// Palette-indexed image.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Paletted {
    indices: PixelBuffer,
    palette: Vec<Rgba>,
}

impl Paletted {
    pub fn new(rect: Rect, palette: Vec<Rgba>) -> Self {
        Self {
            indices: PixelBuffer::new(rect, 1),
            palette,
        }
    }

    pub(crate) fn from_parts(indices: PixelBuffer, palette: Vec<Rgba>) -> Self {
        Self { indices, palette }
    }

    pub fn rect(&self) -> Rect {
        self.indices.rect()
    }

    pub fn palette(&self) -> &[Rgba] {
        &self.palette
    }

    pub fn indices(&self) -> &PixelBuffer {
        &self.indices
    }

    pub fn color_index_at(&self, x: i32, y: i32) -> Option<u8> {
        self.indices.pixel(x, y).map(|p| p[0])
    }

    pub fn set_color_index(&mut self, x: i32, y: i32, index: u8) {
        if let Some(p) = self.indices.pixel_mut(x, y) {
            p[0] = index;
        }
    }
}

/// Chroma subsampling of a [`YCbCr`] image.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SubsampleRatio {
    /// Full-resolution chroma.
    R444,
    /// Half horizontal chroma resolution.
    R422,
    /// Half horizontal and vertical chroma resolution.
    R420,
    /// Half vertical chroma resolution.
    R440,
}

/// Planar Y'CbCr image.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct YCbCr {
    y: Vec<u8>,
    cb: Vec<u8>,
    cr: Vec<u8>,
    y_stride: usize,
    c_stride: usize,
    ratio: SubsampleRatio,
    rect: Rect,
}

impl YCbCr {
    pub fn new(rect: Rect, ratio: SubsampleRatio) -> Self {
        let rect = rect.canon();
        let (w, h) = (rect.dx(), rect.dy());
        let half_w = (rect.max.x + 1) / 2 - rect.min.x / 2;
        let half_h = (rect.max.y + 1) / 2 - rect.min.y / 2;
        let (cw, ch) = match ratio {
            SubsampleRatio::R444 => (w, h),
            SubsampleRatio::R422 => (half_w, h),
            SubsampleRatio::R420 => (half_w, half_h),
            SubsampleRatio::R440 => (w, half_h),
        };
        let (cw, ch) = (cw.max(0) as usize, ch.max(0) as usize);
        Self {
            y: vec![0; w as usize * h as usize],
            cb: vec![0; cw * ch],
            cr: vec![0; cw * ch],
            y_stride: w as usize,
            c_stride: cw,
            ratio,
            rect,
        }
    }

    pub fn rect(&self) -> Rect {
        self.rect
    }

    pub fn ratio(&self) -> SubsampleRatio {
        self.ratio
    }

    fn y_offset(&self, x: i32, y: i32) -> usize {
        (y - self.rect.min.y) as usize * self.y_stride + (x - self.rect.min.x) as usize
    }

    fn c_offset(&self, x: i32, y: i32) -> usize {
        let min = self.rect.min;
        let (row, col) = match self.ratio {
            SubsampleRatio::R444 => (y - min.y, x - min.x),
            SubsampleRatio::R422 => (y - min.y, x / 2 - min.x / 2),
            SubsampleRatio::R420 => (y / 2 - min.y / 2, x / 2 - min.x / 2),
            SubsampleRatio::R440 => (y / 2 - min.y / 2, x - min.x),
        };
        row as usize * self.c_stride + col as usize
    }

    /// `(y, cb, cr)` at `(x, y)`.
    pub fn ycbcr_at(&self, x: i32, y: i32) -> Option<(u8, u8, u8)> {
        if !self.rect.contains(Point::new(x, y)) {
            return None;
        }
        let (yi, ci) = (self.y_offset(x, y), self.c_offset(x, y));
        Some((self.y[yi], self.cb[ci], self.cr[ci]))
    }

    /// Set luma and the chroma sample shared by `(x, y)`.
    pub fn set_ycbcr(&mut self, x: i32, y: i32, value: (u8, u8, u8)) {
        if !self.rect.contains(Point::new(x, y)) {
            return;
        }
        let (yi, ci) = (self.y_offset(x, y), self.c_offset(x, y));
        self.y[yi] = value.0;
        self.cb[ci] = value.1;
        self.cr[ci] = value.2;
    }
}

/// An image in one of the supported storage formats.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Image {
    /// 8-bit premultiplied RGBA.
    Rgba(PixelBuffer),
    /// 16-bit premultiplied RGBA.
    Rgba64(PixelBuffer),
    /// 8-bit non-premultiplied RGBA.
    Nrgba(PixelBuffer),
    /// 16-bit non-premultiplied RGBA.
    Nrgba64(PixelBuffer),
    Gray(PixelBuffer),
    Gray16(PixelBuffer),
    Alpha(PixelBuffer),
    Alpha16(PixelBuffer),
    Paletted(Paletted),
    YCbCr(YCbCr),
}

impl Image {
    /// Zeroed interleaved image.
    pub fn new(format: PixelFormat, rect: Rect) -> Self {
        Self::from_buffer(format, PixelBuffer::new(rect, format.bytes_per_pixel()))
    }

    pub(crate) fn from_buffer(format: PixelFormat, buf: PixelBuffer) -> Self {
        match format {
            PixelFormat::Rgba => Image::Rgba(buf),
            PixelFormat::Rgba64 => Image::Rgba64(buf),
            PixelFormat::Nrgba => Image::Nrgba(buf),
            PixelFormat::Nrgba64 => Image::Nrgba64(buf),
            PixelFormat::Gray => Image::Gray(buf),
            PixelFormat::Gray16 => Image::Gray16(buf),
            PixelFormat::Alpha => Image::Alpha(buf),
            PixelFormat::Alpha16 => Image::Alpha16(buf),
        }
    }

    pub fn kind(&self) -> ImageKind {
        match self {
            Image::Rgba(_) => ImageKind::Interleaved(PixelFormat::Rgba),
            Image::Rgba64(_) => ImageKind::Interleaved(PixelFormat::Rgba64),
            Image::Nrgba(_) => ImageKind::Interleaved(PixelFormat::Nrgba),
            Image::Nrgba64(_) => ImageKind::Interleaved(PixelFormat::Nrgba64),
            Image::Gray(_) => ImageKind::Interleaved(PixelFormat::Gray),
            Image::Gray16(_) => ImageKind::Interleaved(PixelFormat::Gray16),
            Image::Alpha(_) => ImageKind::Interleaved(PixelFormat::Alpha),
            Image::Alpha16(_) => ImageKind::Interleaved(PixelFormat::Alpha16),
            Image::Paletted(_) => ImageKind::Paletted,
            Image::YCbCr(img) => ImageKind::YCbCr(img.ratio()),
        }
    }

    /// The interleaved buffer and its format, for every kind but paletted
    /// and Y'CbCr images.
    pub fn as_buffer(&self) -> Option<(PixelFormat, &PixelBuffer)> {
        let format = match self.kind() {
            ImageKind::Interleaved(format) => format,
            ImageKind::Paletted | ImageKind::YCbCr(_) => return None,
        };
        match self {
            Image::Rgba(buf)
            | Image::Rgba64(buf)
            | Image::Nrgba(buf)
            | Image::Nrgba64(buf)
            | Image::Gray(buf)
            | Image::Gray16(buf)
            | Image::Alpha(buf)
            | Image::Alpha16(buf) => Some((format, buf)),
            Image::Paletted(_) | Image::YCbCr(_) => None,
        }
    }

    pub fn as_buffer_mut(&mut self) -> Option<&mut PixelBuffer> {
        match self {
            Image::Rgba(buf)
            | Image::Rgba64(buf)
            | Image::Nrgba(buf)
            | Image::Nrgba64(buf)
            | Image::Gray(buf)
            | Image::Gray16(buf)
            | Image::Alpha(buf)
            | Image::Alpha16(buf) => Some(buf),
            Image::Paletted(_) | Image::YCbCr(_) => None,
        }
    }

    pub fn bounds(&self) -> Rect {
        match self {
            Image::Paletted(img) => img.rect(),
            Image::YCbCr(img) => img.rect(),
            _ => self.as_buffer().map(|(_, buf)| buf.rect()).unwrap_or(Rect::EMPTY),
        }
    }

    /// The colour at `(x, y)` as premultiplied 16-bit RGBA.
    ///
    /// Palette indices past the end of the palette read as transparent.
    pub fn rgba64_at(&self, x: i32, y: i32) -> Option<Rgba64> {
        let be16 = |p: &[u8], i: usize| u16::from_be_bytes([p[i], p[i + 1]]);
        match self {
            Image::Rgba(buf) => buf.pixel(x, y).map(|p| Rgba::new(p[0], p[1], p[2], p[3]).to_rgba64()),
            Image::Rgba64(buf) => buf
                .pixel(x, y)
                .map(|p| Rgba64::new(be16(p, 0), be16(p, 2), be16(p, 4), be16(p, 6))),
            Image::Nrgba(buf) => buf.pixel(x, y).map(|p| Nrgba::new(p[0], p[1], p[2], p[3]).to_rgba64()),
            Image::Nrgba64(buf) => buf.pixel(x, y).map(|p| {
                let a = be16(p, 6) as u32;
                let premul = |c: u16| ((c as u32 * a) / 0xffff) as u16;
                Rgba64::new(premul(be16(p, 0)), premul(be16(p, 2)), premul(be16(p, 4)), a as u16)
            }),
            Image::Gray(buf) => buf.pixel(x, y).map(|p| Rgba64::gray(widen(p[0]))),
            Image::Gray16(buf) => buf.pixel(x, y).map(|p| Rgba64::gray(be16(p, 0))),
            Image::Alpha(buf) => buf.pixel(x, y).map(|p| Rgba64::alpha(widen(p[0]))),
            Image::Alpha16(buf) => buf.pixel(x, y).map(|p| Rgba64::alpha(be16(p, 0))),
            Image::Paletted(img) => img.color_index_at(x, y).map(|i| {
                img.palette()
                    .get(i as usize)
                    .map(|c| c.to_rgba64())
                    .unwrap_or(Rgba64::TRANSPARENT)
            }),
            Image::YCbCr(img) => img.ycbcr_at(x, y).map(|(yy, cb, cr)| {
                let (r, g, b) = ycbcr_to_rgb(yy, cb, cr);
                Rgba64::new(widen(r), widen(g), widen(b), 0xffff)
            }),
        }
    }

    /// The colour at `(x, y)` as 8-bit non-premultiplied RGBA.
    pub fn nrgba_at(&self, x: i32, y: i32) -> Option<Nrgba> {
        match self {
            Image::Nrgba(buf) => buf.pixel(x, y).map(|p| Nrgba::new(p[0], p[1], p[2], p[3])),
            Image::Nrgba64(buf) => buf.pixel(x, y).map(|p| Nrgba::new(p[0], p[2], p[4], p[6])),
            _ => self.rgba64_at(x, y).map(Nrgba::from_rgba64),
        }
    }
}
