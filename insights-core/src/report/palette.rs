//! Report colors: the 20-entry bar palette and the RdYlGn diverging scale.
//!
//! # Bar palette
//! One color per ranked bar, cycling by rank index. Entries 10 and 20 are
//! both light blue; the repeat is part of the published palette.
//!
//! # Diverging scale
//! Red (low) → yellow (middle) → green (high), the eleven ColorBrewer RdYlGn
//! anchors with linear interpolation between neighbors. Values are
//! normalized against the column's min and max; a constant column maps to
//! the midpoint.

use std::fmt;

/// 8-bit RGB color.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Rgb {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Rgb {
    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    /// `#RRGGBB` form.
    pub fn hex(self) -> String {
        format!("#{:02X}{:02X}{:02X}", self.r, self.g, self.b)
    }

    /// WCAG relative luminance in `[0, 1]`.
    pub fn relative_luminance(self) -> f64 {
        fn channel(c: u8) -> f64 {
            let c = f64::from(c) / 255.0;
            if c <= 0.03928 {
                c / 12.92
            } else {
                ((c + 0.055) / 1.055).powf(2.4)
            }
        }
        0.2126 * channel(self.r) + 0.7152 * channel(self.g) + 0.0722 * channel(self.b)
    }

    /// Readable text color on this background: light on dark, black on light.
    pub fn contrast_text(self) -> Rgb {
        if self.relative_luminance() < TEXT_LUMINANCE_THRESHOLD {
            LIGHT_TEXT
        } else {
            DARK_TEXT
        }
    }

    fn lerp(self, other: Rgb, t: f64) -> Rgb {
        let mix = |a: u8, b: u8| -> u8 {
            let v = f64::from(a) + (f64::from(b) - f64::from(a)) * t;
            v.round().clamp(0.0, 255.0) as u8
        };
        Rgb::new(mix(self.r, other.r), mix(self.g, other.g), mix(self.b, other.b))
    }
}

impl fmt::Display for Rgb {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{:02X}{:02X}{:02X}", self.r, self.g, self.b)
    }
}

const TEXT_LUMINANCE_THRESHOLD: f64 = 0.408;
pub const LIGHT_TEXT: Rgb = Rgb::new(0xF1, 0xF1, 0xF1);
pub const DARK_TEXT: Rgb = Rgb::new(0x00, 0x00, 0x00);

/// Bar colors, indexed by rank modulo 20.
pub const BAR_PALETTE: [Rgb; 20] = [
    Rgb::new(0xFF, 0x6B, 0x6B),
    Rgb::new(0x4E, 0xCD, 0xC4),
    Rgb::new(0x45, 0xB7, 0xD1),
    Rgb::new(0x96, 0xCE, 0xB4),
    Rgb::new(0xFF, 0xEA, 0xA7),
    Rgb::new(0xDD, 0xA0, 0xDD),
    Rgb::new(0x98, 0xD8, 0xC8),
    Rgb::new(0xF7, 0xDC, 0x6F),
    Rgb::new(0xBB, 0x8F, 0xCE),
    Rgb::new(0x85, 0xC1, 0xE9),
    Rgb::new(0xF8, 0xC4, 0x71),
    Rgb::new(0x82, 0xE0, 0xAA),
    Rgb::new(0xF1, 0x94, 0x8A),
    Rgb::new(0xAE, 0xD6, 0xF1),
    Rgb::new(0xD7, 0xBD, 0xE2),
    Rgb::new(0xF9, 0xE7, 0x9F),
    Rgb::new(0xA9, 0xDF, 0xBF),
    Rgb::new(0xF5, 0xB7, 0xB1),
    Rgb::new(0xD2, 0xB4, 0xDE),
    Rgb::new(0xAE, 0xD6, 0xF1),
];

/// Palette color for the bar at `rank` (0-based).
pub fn bar_color(rank: usize) -> Rgb {
    BAR_PALETTE[rank % BAR_PALETTE.len()]
}

const RD_YL_GN: [Rgb; 11] = [
    Rgb::new(0xA5, 0x00, 0x26),
    Rgb::new(0xD7, 0x30, 0x27),
    Rgb::new(0xF4, 0x6D, 0x43),
    Rgb::new(0xFD, 0xAE, 0x61),
    Rgb::new(0xFE, 0xE0, 0x8B),
    Rgb::new(0xFF, 0xFF, 0xBF),
    Rgb::new(0xD9, 0xEF, 0x8B),
    Rgb::new(0xA6, 0xD9, 0x6A),
    Rgb::new(0x66, 0xBD, 0x63),
    Rgb::new(0x1A, 0x98, 0x50),
    Rgb::new(0x00, 0x68, 0x37),
];

/// Red-yellow-green color at position `t` in `[0, 1]` (clamped; NaN → midpoint).
pub fn rd_yl_gn(t: f64) -> Rgb {
    let t = if t.is_nan() { 0.5 } else { t.clamp(0.0, 1.0) };
    let scaled = t * (RD_YL_GN.len() - 1) as f64;
    let lower = scaled.floor() as usize;
    if lower >= RD_YL_GN.len() - 1 {
        return RD_YL_GN[RD_YL_GN.len() - 1];
    }
    RD_YL_GN[lower].lerp(RD_YL_GN[lower + 1], scaled - lower as f64)
}

/// Min/max normalization for a gradient column.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GradientScale {
    pub min: f64,
    pub max: f64,
}

impl GradientScale {
    /// Scale spanning the finite values of a column; `None` if there are none.
    pub fn from_values<I: IntoIterator<Item = f64>>(values: I) -> Option<Self> {
        values
            .into_iter()
            .filter(|v| v.is_finite())
            .fold(None, |acc, v| match acc {
                None => Some(Self { min: v, max: v }),
                Some(s) => Some(Self {
                    min: s.min.min(v),
                    max: s.max.max(v),
                }),
            })
    }

    /// Position of `value` in `[0, 1]`; constant columns sit at 0.5.
    pub fn normalize(&self, value: f64) -> f64 {
        let span = self.max - self.min;
        if span <= 0.0 {
            0.5
        } else {
            ((value - self.min) / span).clamp(0.0, 1.0)
        }
    }

    /// Background color for `value`.
    pub fn color(&self, value: f64) -> Rgb {
        rd_yl_gn(self.normalize(value))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn palette_cycles_every_twenty() {
        assert_eq!(bar_color(0), Rgb::new(0xFF, 0x6B, 0x6B));
        assert_eq!(bar_color(20), bar_color(0));
        assert_eq!(bar_color(19).hex(), "#AED6F1");
        assert_eq!(bar_color(21), bar_color(1));
    }

    #[test]
    fn hex_and_display_agree() {
        let c = Rgb::new(0x0A, 0xBC, 0xFF);
        assert_eq!(c.hex(), "#0ABCFF");
        assert_eq!(c.to_string(), c.hex());
    }

    #[test]
    fn scale_endpoints() {
        assert_eq!(rd_yl_gn(0.0), Rgb::new(0xA5, 0x00, 0x26));
        assert_eq!(rd_yl_gn(0.5), Rgb::new(0xFF, 0xFF, 0xBF));
        assert_eq!(rd_yl_gn(1.0), Rgb::new(0x00, 0x68, 0x37));
        assert_eq!(rd_yl_gn(-3.0), rd_yl_gn(0.0));
        assert_eq!(rd_yl_gn(7.0), rd_yl_gn(1.0));
        assert_eq!(rd_yl_gn(f64::NAN), rd_yl_gn(0.5));
    }

    #[test]
    fn scale_interpolates_between_anchors() {
        // Halfway between the first two anchors.
        let c = rd_yl_gn(0.05);
        assert_eq!((c.r, c.g), (0xBE, 0x18));
        assert!(c.b == 0x26 || c.b == 0x27);
    }

    #[test]
    fn gradient_scale_normalizes() {
        let scale = GradientScale::from_values([-10.0, 0.0, 30.0, f64::NAN]).unwrap();
        assert_eq!(scale.min, -10.0);
        assert_eq!(scale.max, 30.0);
        assert_eq!(scale.normalize(-10.0), 0.0);
        assert_eq!(scale.normalize(30.0), 1.0);
        assert_eq!(scale.normalize(10.0), 0.5);
        assert_eq!(scale.color(-10.0), rd_yl_gn(0.0));
        assert_eq!(scale.color(30.0), rd_yl_gn(1.0));
    }

    #[test]
    fn constant_column_maps_to_midpoint() {
        let scale = GradientScale::from_values([4.0, 4.0]).unwrap();
        assert_eq!(scale.normalize(4.0), 0.5);
        assert!(GradientScale::from_values(Vec::<f64>::new()).is_none());
    }

    #[test]
    fn text_contrast_flips_on_dark_backgrounds() {
        assert_eq!(rd_yl_gn(0.0).contrast_text(), LIGHT_TEXT);
        assert_eq!(rd_yl_gn(0.5).contrast_text(), DARK_TEXT);
        assert_eq!(rd_yl_gn(1.0).contrast_text(), LIGHT_TEXT);
    }
}
