//! Color space conversion routines
//!
//! All numeric routines are pure functions, grouped under the `ColorConverter`
//! namespace in the same style as the conversion helpers this crate grew out of.

use super::{Lab, Rgb8, Xyz};
use crate::error::{SwatchError, SwatchResult};

/// CIE epsilon (216/24389) used by the Lab<->XYZ piecewise functions
const EPSILON: f64 = 216.0 / 24389.0;
/// CIE kappa (24389/27) used by the Lab<->XYZ piecewise functions
const KAPPA: f64 = 24389.0 / 27.0;

/// D50 reference white
const D50_WHITE: (f64, f64, f64) = (0.9642, 1.0000, 0.8251);
/// D65 reference white
const D65_WHITE: (f64, f64, f64) = (0.95047, 1.0, 1.08883);

/// Namespace for the color conversion routines
pub struct ColorConverter;

impl ColorConverter {
    /// Round and clamp a float channel value to `[0, 255]`
    pub fn clamp8(value: f64) -> u8 {
        value.round().clamp(0.0, 255.0) as u8
    }

    /// Format an RGB triple as uppercase `#RRGGBB`
    pub fn rgb_to_hex(rgb: Rgb8) -> String {
        format!("#{:02X}{:02X}{:02X}", rgb.0, rgb.1, rgb.2)
    }

    /// Parse `#RGB` or `#RRGGBB` (leading `#` optional) into an RGB triple
    pub fn hex_to_rgb(value: &str) -> SwatchResult<Rgb8> {
        let mut normalized = value.trim().to_ascii_uppercase();
        if let Some(stripped) = normalized.strip_prefix('#') {
            normalized = stripped.to_string();
        }

        if normalized.len() == 3 && normalized.chars().all(|c| c.is_ascii_hexdigit()) {
            normalized = normalized.chars().flat_map(|c| [c, c]).collect();
        }

        if normalized.len() != 6 || !normalized.chars().all(|c| c.is_ascii_hexdigit()) {
            return Err(SwatchError::InvalidColorInput(format!(
                "invalid HEX color: {value}"
            )));
        }

        let r = u8::from_str_radix(&normalized[0..2], 16).unwrap();
        let g = u8::from_str_radix(&normalized[2..4], 16).unwrap();
        let b = u8::from_str_radix(&normalized[4..6], 16).unwrap();
        Ok((r, g, b))
    }

    /// CMYK (fractions in `[0,1]`) to sRGB
    pub fn cmyk_to_rgb(c: f64, m: f64, y: f64, k: f64) -> Rgb8 {
        let c = c.clamp(0.0, 1.0);
        let m = m.clamp(0.0, 1.0);
        let y = y.clamp(0.0, 1.0);
        let k = k.clamp(0.0, 1.0);

        let r = 255.0 * (1.0 - c) * (1.0 - k);
        let g = 255.0 * (1.0 - m) * (1.0 - k);
        let b = 255.0 * (1.0 - y) * (1.0 - k);
        (Self::clamp8(r), Self::clamp8(g), Self::clamp8(b))
    }

    /// CMYK stored as `255 - value` bytes (the ACB on-disk encoding) to sRGB
    pub fn cmyk_bytes_to_rgb(c: u8, m: u8, y: u8, k: u8) -> Rgb8 {
        let frac = |v: u8| (255 - v) as f64 / 255.0;
        Self::cmyk_to_rgb(frac(c), frac(m), frac(y), frac(k))
    }

    /// sRGB to CMYK fractions, used for the ExpertIndex's `cmyk_approx` field
    pub fn rgb_to_cmyk(rgb: Rgb8) -> (f64, f64, f64, f64) {
        let r = rgb.0 as f64 / 255.0;
        let g = rgb.1 as f64 / 255.0;
        let b = rgb.2 as f64 / 255.0;

        let k = 1.0 - r.max(g).max(b);
        if k >= 1.0 {
            return (0.0, 0.0, 0.0, 1.0);
        }

        let denom = (1.0 - k).max(1e-9);
        let c = ((1.0 - r - k) / denom).clamp(0.0, 1.0);
        let m = ((1.0 - g - k) / denom).clamp(0.0, 1.0);
        let y = ((1.0 - b - k) / denom).clamp(0.0, 1.0);
        (c, m, y, k.clamp(0.0, 1.0))
    }

    /// Gray fraction (`[0,1]`) to sRGB
    pub fn gray_to_rgb(gray: f64) -> Rgb8 {
        let value = Self::clamp8(gray.clamp(0.0, 1.0) * 255.0);
        (value, value, value)
    }

    /// CIELAB (D50) to XYZ (D50), using the standard CIE inverse
    pub fn lab_to_xyz_d50(lab: Lab) -> Xyz {
        let fy = (lab.l + 16.0) / 116.0;
        let fx = fy + lab.a / 500.0;
        let fz = fy - lab.b / 200.0;

        let f_inv = |t: f64| {
            let t3 = t * t * t;
            if t3 > EPSILON {
                t3
            } else {
                (116.0 * t - 16.0) / KAPPA
            }
        };

        Xyz::new(
            D50_WHITE.0 * f_inv(fx),
            D50_WHITE.1 * f_inv(fy),
            D50_WHITE.2 * f_inv(fz),
        )
    }

    /// XYZ (D65) to XYZ (D50), Bradford chromatic adaptation
    pub fn adapt_xyz_d65_to_d50(xyz: Xyz) -> Xyz {
        Xyz::new(
            1.0478112 * xyz.x + 0.0228866 * xyz.y - 0.0501270 * xyz.z,
            0.0295424 * xyz.x + 0.9904844 * xyz.y - 0.0170491 * xyz.z,
            -0.0092345 * xyz.x + 0.0150436 * xyz.y + 0.7521316 * xyz.z,
        )
    }

    /// XYZ (D50) to XYZ (D65), Bradford chromatic adaptation (inverse matrix)
    pub fn adapt_xyz_d50_to_d65(xyz: Xyz) -> Xyz {
        Xyz::new(
            0.9555766 * xyz.x - 0.0230393 * xyz.y + 0.0631636 * xyz.z,
            -0.0282895 * xyz.x + 1.0099416 * xyz.y + 0.0210077 * xyz.z,
            0.0122982 * xyz.x - 0.0204830 * xyz.y + 1.3299098 * xyz.z,
        )
    }

    /// XYZ (D65) to sRGB
    pub fn xyz_to_srgb(xyz: Xyz) -> Rgb8 {
        let r_linear = 3.2404542 * xyz.x - 1.5371385 * xyz.y - 0.4985314 * xyz.z;
        let g_linear = -0.9692660 * xyz.x + 1.8760108 * xyz.y + 0.0415560 * xyz.z;
        let b_linear = 0.0556434 * xyz.x - 0.2040259 * xyz.y + 1.0572252 * xyz.z;

        let gamma_encode = |channel: f64| {
            if channel <= 0.0 {
                0.0
            } else if channel <= 0.0031308 {
                12.92 * channel
            } else {
                1.055 * channel.powf(1.0 / 2.4) - 0.055
            }
        };

        (
            Self::clamp8(gamma_encode(r_linear) * 255.0),
            Self::clamp8(gamma_encode(g_linear) * 255.0),
            Self::clamp8(gamma_encode(b_linear) * 255.0),
        )
    }

    /// sRGB to XYZ (D65)
    pub fn srgb_to_xyz_d65(rgb: Rgb8) -> Xyz {
        let inv_gamma = |channel: f64| {
            if channel <= 0.04045 {
                channel / 12.92
            } else {
                ((channel + 0.055) / 1.055).powf(2.4)
            }
        };

        let r = inv_gamma(rgb.0 as f64 / 255.0);
        let g = inv_gamma(rgb.1 as f64 / 255.0);
        let b = inv_gamma(rgb.2 as f64 / 255.0);

        Xyz::new(
            0.4124564 * r + 0.3575761 * g + 0.1804375 * b,
            0.2126729 * r + 0.7151522 * g + 0.0721750 * b,
            0.0193339 * r + 0.1191920 * g + 0.9503041 * b,
        )
    }

    /// XYZ to Lab against an arbitrary reference white
    fn xyz_to_lab(xyz: Xyz, white: (f64, f64, f64)) -> Lab {
        let xr = xyz.x / white.0;
        let yr = xyz.y / white.1;
        let zr = xyz.z / white.2;

        let f = |t: f64| {
            if t > EPSILON {
                t.cbrt()
            } else {
                (KAPPA * t + 16.0) / 116.0
            }
        };

        let fx = f(xr);
        let fy = f(yr);
        let fz = f(zr);

        Lab::new(
            (116.0 * fy - 16.0).max(0.0),
            500.0 * (fx - fy),
            200.0 * (fy - fz),
        )
    }

    /// XYZ (D50) to Lab, using the D50 reference white
    pub fn xyz_to_lab_d50(xyz: Xyz) -> Lab {
        Self::xyz_to_lab(xyz, D50_WHITE)
    }

    /// XYZ (D65) to Lab, using the D65 reference white
    pub fn xyz_to_lab_d65(xyz: Xyz) -> Lab {
        Self::xyz_to_lab(xyz, D65_WHITE)
    }

    /// sRGB straight to Lab(D65)
    pub fn rgb_to_lab_d65(rgb: Rgb8) -> Lab {
        Self::xyz_to_lab_d65(Self::srgb_to_xyz_d65(rgb))
    }

    /// sRGB straight to Lab(D50), via XYZ(D65) Bradford-adapted to D50
    pub fn rgb_to_lab_d50(rgb: Rgb8) -> Lab {
        let xyz_d65 = Self::srgb_to_xyz_d65(rgb);
        let xyz_d50 = Self::adapt_xyz_d65_to_d50(xyz_d65);
        Self::xyz_to_lab_d50(xyz_d50)
    }

    /// Lab(D50) straight to sRGB, via adaptation to D65
    pub fn lab_to_rgb(lab: Lab) -> Rgb8 {
        let xyz_d50 = Self::lab_to_xyz_d50(lab);
        let xyz_d65 = Self::adapt_xyz_d50_to_d65(xyz_d50);
        Self::xyz_to_srgb(xyz_d65)
    }

    /// Lab bytes as stored in ACB Lab records (`L'`, `a'`, `b'` in `0..=255`)
    /// to sRGB: `L = L'/255*100`, `a = a'-128`, `b = b'-128`
    pub fn lab_bytes_to_rgb(l_byte: u8, a_byte: u8, b_byte: u8) -> Rgb8 {
        let lab = Lab::new(
            l_byte as f64 / 255.0 * 100.0,
            a_byte as f64 - 128.0,
            b_byte as f64 - 128.0,
        );
        Self::lab_to_rgb(lab)
    }

    /// HSL (`h` in degrees, `s`/`l` in `[0,1]`) to sRGB
    pub fn hsl_to_rgb(h: f64, s: f64, l: f64) -> Rgb8 {
        let c = (1.0 - (2.0 * l - 1.0).abs()) * s;
        let x = c * (1.0 - ((h / 60.0) % 2.0 - 1.0).abs());
        let m = l - c / 2.0;

        let (rp, gp, bp) = match h {
            h if (0.0..60.0).contains(&h) => (c, x, 0.0),
            h if (60.0..120.0).contains(&h) => (x, c, 0.0),
            h if (120.0..180.0).contains(&h) => (0.0, c, x),
            h if (180.0..240.0).contains(&h) => (0.0, x, c),
            h if (240.0..300.0).contains(&h) => (x, 0.0, c),
            _ => (c, 0.0, x),
        };

        (
            Self::clamp8((rp + m) * 255.0),
            Self::clamp8((gp + m) * 255.0),
            Self::clamp8((bp + m) * 255.0),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hex_round_trip_is_idempotent() {
        let rgb = (170, 187, 204);
        let hex = ColorConverter::rgb_to_hex(rgb);
        assert_eq!(hex, "#AABBCC");
        assert_eq!(ColorConverter::hex_to_rgb(&hex).unwrap(), rgb);
    }

    #[test]
    fn short_hex_expands_by_channel_duplication() {
        assert_eq!(ColorConverter::hex_to_rgb("#abc").unwrap(), (170, 187, 204));
    }

    #[test]
    fn invalid_hex_is_rejected() {
        assert!(ColorConverter::hex_to_rgb("#zzzzzz").is_err());
        assert!(ColorConverter::hex_to_rgb("#abcd").is_err());
    }

    #[test]
    fn cmyk_bytes_invariants() {
        assert_eq!(
            ColorConverter::cmyk_bytes_to_rgb(255, 255, 255, 255),
            (255, 255, 255)
        );
        assert_eq!(
            ColorConverter::cmyk_bytes_to_rgb(255, 255, 255, 0),
            (0, 0, 0)
        );
        assert_eq!(
            ColorConverter::cmyk_bytes_to_rgb(255, 0, 0, 255),
            (255, 0, 0)
        );
    }

    #[test]
    fn lab_rgb_round_trip_stays_close() {
        let rgb = (228, 48, 48);
        let lab = ColorConverter::rgb_to_lab_d50(rgb);
        let back = ColorConverter::lab_to_rgb(lab);
        assert!((back.0 as i32 - rgb.0 as i32).abs() <= 1);
        assert!((back.1 as i32 - rgb.1 as i32).abs() <= 1);
        assert!((back.2 as i32 - rgb.2 as i32).abs() <= 1);
    }
}
