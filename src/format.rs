//! Core data types for the IconVG file format: rectangles, colors,
//! palettes and paints.

/// The ViewBox used when a file carries no ViewBox metadata.
pub const DEFAULT_VIEWBOX: Rectangle = Rectangle::new(-32.0, -32.0, 32.0, 32.0);

/// An axis-aligned rectangle with `f32` coordinates.
///
/// It is valid for a minimum coordinate to be greater than or equal to the
/// corresponding maximum, or for any coordinate to be NaN, in which case the
/// rectangle is empty. There are multiple ways to represent an empty
/// rectangle but the canonical representation has all fields set to
/// positive zero.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Rectangle {
    pub min_x: f32,
    pub min_y: f32,
    pub max_x: f32,
    pub max_y: f32,
}

impl Rectangle {
    /// Creates a rectangle from its four corner coordinates.
    pub const fn new(min_x: f32, min_y: f32, max_x: f32, max_y: f32) -> Self {
        Rectangle {
            min_x,
            min_y,
            max_x,
            max_y,
        }
    }

    /// The rectangle's width as an `f64`, or zero if it is empty.
    ///
    /// Fields may be NaN, so `(min < max)` is not the same as
    /// `!(min >= max)`.
    pub fn width(&self) -> f64 {
        if self.max_x > self.min_x {
            f64::from(self.max_x) - f64::from(self.min_x)
        } else {
            0.0
        }
    }

    /// The rectangle's height as an `f64`, or zero if it is empty.
    pub fn height(&self) -> f64 {
        if self.max_y > self.min_y {
            f64::from(self.max_y) - f64::from(self.min_y)
        } else {
            0.0
        }
    }

    /// Returns whether all four coordinates are finite and both extents
    /// are strictly positive.
    pub fn is_finite_and_not_empty(&self) -> bool {
        (f32::NEG_INFINITY < self.min_x)
            && (self.min_x < self.max_x)
            && (self.max_x < f32::INFINITY)
            && (f32::NEG_INFINITY < self.min_y)
            && (self.min_y < self.max_y)
            && (self.max_y < f32::INFINITY)
    }
}

/// A non-alpha-premultiplied RGBA color. `(0x00, 0xFF, 0x00, 0xC0)` is a
/// 75%-opaque, fully saturated green.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct NonpremulColor(pub [u8; 4]);

/// An alpha-premultiplied RGBA color. `(0x00, 0xC0, 0x00, 0xC0)` is a
/// 75%-opaque, fully saturated green.
///
/// Every color held in a register or palette is premultiplied.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PremulColor(pub [u8; 4]);

impl PremulColor {
    /// Fully opaque black, the color every palette slot starts out as.
    pub const OPAQUE_BLACK: PremulColor = PremulColor([0x00, 0x00, 0x00, 0xFF]);

    /// Converts to non-premultiplied form. Fully transparent maps to the
    /// zero color; otherwise each channel is re-scaled by `0xFF / alpha`.
    pub fn to_nonpremul(self) -> NonpremulColor {
        let [r, g, b, a] = self.0;
        match a {
            0x00 => NonpremulColor([0x00, 0x00, 0x00, 0x00]),
            0xFF => NonpremulColor(self.0),
            _ => {
                let a32 = u32::from(a);
                let scale = |c: u8| (u32::from(c) * 0xFF / a32) as u8;
                NonpremulColor([scale(r), scale(g), scale(b), a])
            }
        }
    }

    /// Expands the two bytes of a 16-bit color, one hex nibble per
    /// channel, so that nibble `x` becomes byte `0x11 * x`.
    pub(crate) fn from_nibbles(rg: u8, ba: u8) -> PremulColor {
        PremulColor([
            0x11 * (rg >> 4),
            0x11 * (rg & 0x0F),
            0x11 * (ba >> 4),
            0x11 * (ba & 0x0F),
        ])
    }
}

/// A list of 64 alpha-premultiplied RGBA colors.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Palette {
    pub colors: [PremulColor; 64],
}

impl Default for Palette {
    /// The default palette: 64 fully-opaque blacks.
    fn default() -> Self {
        Palette {
            colors: [PremulColor::OPAQUE_BLACK; 64],
        }
    }
}

/// What is painted when a drawn path is filled.
///
/// The styling opcodes specified here only ever produce flat colors.
/// Gradient paints belong to the extended styling opcode space and are
/// reserved as future variants.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[non_exhaustive]
pub enum Paint {
    /// A single alpha-premultiplied color.
    FlatColor(PremulColor),
}

impl Paint {
    /// Interprets a color register as a paint.
    ///
    /// A register holds a flat color when it is valid premultiplied RGBA,
    /// i.e. each of R, G and B is at most A. Anything else is either a
    /// gradient configuration (alpha zero, high bit of the blue channel
    /// set) or nonsense; neither is a paint this decoder can enter
    /// drawing mode with.
    pub(crate) fn from_register(color: PremulColor) -> Option<Paint> {
        let [r, g, b, a] = color.0;
        if (r <= a) && (g <= a) && (b <= a) {
            Some(Paint::FlatColor(color))
        } else {
            None
        }
    }

    /// The paint's color in premultiplied form.
    pub fn as_premul_color(&self) -> PremulColor {
        match *self {
            Paint::FlatColor(color) => color,
        }
    }

    /// The paint's color in non-premultiplied form.
    pub fn as_nonpremul_color(&self) -> NonpremulColor {
        self.as_premul_color().to_nonpremul()
    }
}

/// The quantized channel values used by the built-in one-byte colors.
const QUINTET: [u8; 5] = [0x00, 0x40, 0x80, 0xC0, 0xFF];

/// The 128 built-in one-byte colors, all premultiplied.
///
/// Codes 0x00..=0x7C are the 5x5x5 opaque RGB cube over `QUINTET`, with
/// code `25*r + 5*g + b`. The last three codes are transparent black,
/// 50%-opaque gray and 75%-opaque white.
pub(crate) const ONE_BYTE_COLORS: [PremulColor; 128] = {
    let mut table = [PremulColor([0x00, 0x00, 0x00, 0x00]); 128];
    let mut i = 0;
    while i < 125 {
        table[i] = PremulColor([
            QUINTET[i / 25],
            QUINTET[(i / 5) % 5],
            QUINTET[i % 5],
            0xFF,
        ]);
        i += 1;
    }
    table[125] = PremulColor([0x00, 0x00, 0x00, 0x00]);
    table[126] = PremulColor([0x80, 0x80, 0x80, 0x80]);
    table[127] = PremulColor([0xC0, 0xC0, 0xC0, 0xC0]);
    table
};

/// Resolves a one-byte color payload against the current palette and
/// color registers.
///
/// Codes below 0x80 index the built-in table, 0x80..=0xBF reference the
/// custom palette and 0xC0..=0xFF reference CREG, each through their low
/// six bits.
pub(crate) fn resolve_one_byte_color(
    u: u8,
    custom_palette: &Palette,
    creg: &Palette,
) -> PremulColor {
    if u < 0x80 {
        ONE_BYTE_COLORS[usize::from(u)]
    } else if u < 0xC0 {
        custom_palette.colors[usize::from(u & 0x3F)]
    } else {
        creg.colors[usize::from(u & 0x3F)]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rectangle_extents() {
        let r = Rectangle::new(-32.0, -32.0, 32.0, 32.0);
        assert_eq!(r.width(), 64.0);
        assert_eq!(r.height(), 64.0);
        assert!(r.is_finite_and_not_empty());

        let empty = Rectangle::default();
        assert_eq!(empty.width(), 0.0);
        assert!(!empty.is_finite_and_not_empty());

        let nan = Rectangle::new(f32::NAN, 0.0, 1.0, 1.0);
        assert_eq!(nan.width(), 1.0);
        assert!(!nan.is_finite_and_not_empty());

        let inverted = Rectangle::new(8.0, 0.0, -8.0, 1.0);
        assert_eq!(inverted.width(), 0.0);
    }

    #[test]
    fn nonpremul_round_trip_points() {
        let premul = PremulColor([0x00, 0xC0, 0x00, 0xC0]);
        assert_eq!(
            premul.to_nonpremul(),
            NonpremulColor([0x00, 0xFF, 0x00, 0xC0])
        );
        assert_eq!(
            PremulColor([0x10, 0x20, 0x30, 0x00]).to_nonpremul(),
            NonpremulColor([0x00, 0x00, 0x00, 0x00])
        );
        assert_eq!(
            PremulColor([0x12, 0x34, 0x56, 0xFF]).to_nonpremul(),
            NonpremulColor([0x12, 0x34, 0x56, 0xFF])
        );
    }

    #[test]
    fn nibble_expansion() {
        assert_eq!(
            PremulColor::from_nibbles(0x12, 0x34),
            PremulColor([0x11, 0x22, 0x33, 0x44])
        );
        assert_eq!(
            PremulColor::from_nibbles(0xF0, 0x0F),
            PremulColor([0xFF, 0x00, 0x00, 0xFF])
        );
    }

    #[test]
    fn one_byte_color_table() {
        // Corners of the 5x5x5 cube.
        assert_eq!(ONE_BYTE_COLORS[0], PremulColor([0x00, 0x00, 0x00, 0xFF]));
        assert_eq!(ONE_BYTE_COLORS[124], PremulColor([0xFF, 0xFF, 0xFF, 0xFF]));
        assert_eq!(ONE_BYTE_COLORS[4], PremulColor([0x00, 0x00, 0xFF, 0xFF]));
        assert_eq!(ONE_BYTE_COLORS[100], PremulColor([0xFF, 0x00, 0x00, 0xFF]));
        // The three non-cube entries.
        assert_eq!(ONE_BYTE_COLORS[125], PremulColor([0x00, 0x00, 0x00, 0x00]));
        assert_eq!(ONE_BYTE_COLORS[126], PremulColor([0x80, 0x80, 0x80, 0x80]));
        assert_eq!(ONE_BYTE_COLORS[127], PremulColor([0xC0, 0xC0, 0xC0, 0xC0]));
    }

    #[test]
    fn one_byte_color_resolution() {
        let mut custom = Palette::default();
        custom.colors[2] = PremulColor([0x10, 0x10, 0x10, 0xFF]);
        let mut creg = Palette::default();
        creg.colors[2] = PremulColor([0x20, 0x20, 0x20, 0xFF]);

        assert_eq!(
            resolve_one_byte_color(0x00, &custom, &creg),
            PremulColor::OPAQUE_BLACK
        );
        assert_eq!(
            resolve_one_byte_color(0x82, &custom, &creg),
            custom.colors[2]
        );
        assert_eq!(resolve_one_byte_color(0xC2, &custom, &creg), creg.colors[2]);
    }

    #[test]
    fn paint_from_register() {
        let flat = PremulColor([0x00, 0xC0, 0x00, 0xC0]);
        assert_eq!(Paint::from_register(flat), Some(Paint::FlatColor(flat)));

        // Alpha zero with the blue channel's high bit set is gradient
        // configuration space, not a flat color.
        assert_eq!(
            Paint::from_register(PremulColor([0x02, 0x00, 0x80, 0x00])),
            None
        );
        // Channels exceeding alpha are not valid premultiplied colors.
        assert_eq!(
            Paint::from_register(PremulColor([0xFF, 0x00, 0x00, 0x80])),
            None
        );
    }
}
