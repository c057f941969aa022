//! Raster images and format conversion.
//!
//! # Data Flow
//! ```text
//! Image (any storage format)
//!     → rgba64_at (premultiplied 16-bit interchange)
//!     → convert.rs (to_nrgba / clone_kind / sub_image_kind)
//! ```

pub mod color;
pub mod convert;
pub mod geometry;
pub mod image;

pub use color::{ycbcr_to_rgb, Nrgba, Rgba, Rgba64};
pub use convert::{clone_kind, sub_image_kind, to_nrgba};
pub use geometry::{Point, Rect};
pub use image::{Image, ImageKind, ImagingError, Paletted, PixelBuffer, PixelFormat, SubsampleRatio, YCbCr};
