//! Colour values and conversions.
//!
//! [`Rgba64`] (16-bit, alpha-premultiplied) is the interchange form every
//! pixel format can be read as.

/// 8-bit alpha-premultiplied colour.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Rgba {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

/// 8-bit non-premultiplied colour.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Nrgba {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

/// 16-bit alpha-premultiplied colour.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Rgba64 {
    pub r: u16,
    pub g: u16,
    pub b: u16,
    pub a: u16,
}

impl Rgba {
    pub const fn new(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self { r, g, b, a }
    }

    pub fn to_rgba64(self) -> Rgba64 {
        Rgba64 {
            r: widen(self.r),
            g: widen(self.g),
            b: widen(self.b),
            a: widen(self.a),
        }
    }
}

impl Nrgba {
    pub const TRANSPARENT: Nrgba = Nrgba::new(0, 0, 0, 0);

    pub const fn new(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self { r, g, b, a }
    }

    pub fn to_rgba64(self) -> Rgba64 {
        let a = self.a as u32;
        let premul = |c: u8| ((widen(c) as u32 * a) / 0xff) as u16;
        Rgba64 {
            r: premul(self.r),
            g: premul(self.g),
            b: premul(self.b),
            a: widen(self.a),
        }
    }

    /// Convert from premultiplied 16-bit colour.
    pub fn from_rgba64(c: Rgba64) -> Self {
        match c.a {
            0xffff => Nrgba::new(narrow(c.r), narrow(c.g), narrow(c.b), 0xff),
            0 => Nrgba::TRANSPARENT,
            a => {
                let unpremul = |v: u16| ((v as u32 * 0xffff) / a as u32) as u16;
                Nrgba::new(
                    narrow(unpremul(c.r)),
                    narrow(unpremul(c.g)),
                    narrow(unpremul(c.b)),
                    narrow(a),
                )
            }
        }
    }
}

impl Rgba64 {
    pub const TRANSPARENT: Rgba64 = Rgba64::new(0, 0, 0, 0);

    pub const fn new(r: u16, g: u16, b: u16, a: u16) -> Self {
        Self { r, g, b, a }
    }

    /// Opaque grey.
    pub const fn gray(y: u16) -> Self {
        Self::new(y, y, y, 0xffff)
    }

    /// White at coverage `a`.
    pub const fn alpha(a: u16) -> Self {
        Self::new(a, a, a, a)
    }
}

/// Widen an 8-bit channel to 16 bits (`0xab` becomes `0xabab`).
pub(crate) const fn widen(c: u8) -> u16 {
    (c as u16) << 8 | c as u16
}

/// High byte of a 16-bit channel.
pub(crate) const fn narrow(c: u16) -> u8 {
    (c >> 8) as u8
}

/// JFIF Y'CbCr to 8-bit RGB, in 16.16 fixed point.
pub fn ycbcr_to_rgb(y: u8, cb: u8, cr: u8) -> (u8, u8, u8) {
    let yy1 = y as i32 * 0x10101;
    let cb1 = cb as i32 - 128;
    let cr1 = cr as i32 - 128;

    let r = clamp_fixed(yy1 + 91881 * cr1);
    let g = clamp_fixed(yy1 - 22554 * cb1 - 46802 * cr1);
    let b = clamp_fixed(yy1 + 116130 * cb1);
    (r, g, b)
}

/// Clamp a 16.16 fixed-point value to `0..=255`.
fn clamp_fixed(v: i32) -> u8 {
    if (v as u32) & 0xff00_0000 == 0 {
        (v >> 16) as u8
    } else {
        // Negative values clamp to 0, overflow to 255.
        !(v >> 31) as u8
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ycbcr_extremes() {
        assert_eq!(ycbcr_to_rgb(0, 128, 128), (0, 0, 0));
        assert_eq!(ycbcr_to_rgb(255, 128, 128), (255, 255, 255));
        assert_eq!(ycbcr_to_rgb(128, 128, 128), (128, 128, 128));
    }

    #[test]
    fn ycbcr_clamps_out_of_gamut() {
        let (r, _, b) = ycbcr_to_rgb(255, 255, 255);
        assert_eq!(r, 255);
        assert_eq!(b, 255);
        let (r, _, _) = ycbcr_to_rgb(0, 128, 0);
        assert_eq!(r, 0);
    }

    #[test]
    fn nrgba_round_trips_through_rgba64_when_opaque() {
        let c = Nrgba::new(12, 200, 77, 0xff);
        assert_eq!(Nrgba::from_rgba64(c.to_rgba64()), c);
    }

    #[test]
    fn unpremultiplies_translucent() {
        let premul = Rgba::new(64, 32, 0, 128).to_rgba64();
        let c = Nrgba::from_rgba64(premul);
        assert_eq!(c.a, 128);
        assert_eq!(c.r, 127);
        assert_eq!(c.g, 63);
        assert_eq!(c.b, 0);
    }

    #[test]
    fn transparent_and_alpha_only() {
        assert_eq!(Nrgba::from_rgba64(Rgba64::TRANSPARENT), Nrgba::TRANSPARENT);
        assert_eq!(Nrgba::from_rgba64(Rgba64::alpha(widen(0x40))), Nrgba::new(255, 255, 255, 0x40));
    }
}
