//! CIEDE2000 perceptual color difference

use super::Lab;

/// Guard added inside the two `sqrt(c^7 / (c^7 + 25^7))` terms to avoid a
/// division that is technically well-defined but numerically unstable at `C=0`.
const EPSILON_GUARD: f64 = 1e-12;

/// Sharma-style CIEDE2000 with `kL = kC = kH = 1`.
///
/// Guaranteed to return exactly `0.0` when `lab1 == lab2`.
pub fn delta_e_ciede2000(lab1: Lab, lab2: Lab) -> f64 {
    let (l1, a1, b1) = (lab1.l, lab1.a, lab1.b);
    let (l2, a2, b2) = (lab2.l, lab2.a, lab2.b);

    let c1 = (a1 * a1 + b1 * b1).sqrt();
    let c2 = (a2 * a2 + b2 * b2).sqrt();
    let c_mean = (c1 + c2) / 2.0;
    let c7 = c_mean.powi(7);
    let g = 0.5 * (1.0 - (c7 / (c7 + 25.0_f64.powi(7) + EPSILON_GUARD)).sqrt());

    let a1p = (1.0 + g) * a1;
    let a2p = (1.0 + g) * a2;
    let c1p = (a1p * a1p + b1 * b1).sqrt();
    let c2p = (a2p * a2p + b2 * b2).sqrt();

    let hue = |ap: f64, bb: f64| -> f64 {
        if ap == 0.0 && bb == 0.0 {
            return 0.0;
        }
        let h = bb.atan2(ap).to_degrees();
        if h < 0.0 {
            h + 360.0
        } else {
            h
        }
    };

    let h1p = hue(a1p, b1);
    let h2p = hue(a2p, b2);
    let dlp = l2 - l1;
    let dcp = c2p - c1p;

    let dhp = if c1p * c2p != 0.0 {
        let diff = h2p - h1p;
        if diff.abs() <= 180.0 {
            diff
        } else if h2p <= h1p {
            diff + 360.0
        } else {
            diff - 360.0
        }
    } else {
        0.0
    };
    let dhp_term = 2.0 * (c1p * c2p).sqrt() * (dhp / 2.0).to_radians().sin();

    let lpm = (l1 + l2) / 2.0;
    let cpm = (c1p + c2p) / 2.0;
    let hpm = if c1p * c2p != 0.0 {
        if (h1p - h2p).abs() > 180.0 {
            if h1p + h2p < 360.0 {
                (h1p + h2p + 360.0) / 2.0
            } else {
                (h1p + h2p - 360.0) / 2.0
            }
        } else {
            (h1p + h2p) / 2.0
        }
    } else {
        h1p + h2p
    };

    let t = 1.0 - 0.17 * (hpm - 30.0).to_radians().cos()
        + 0.24 * (2.0 * hpm).to_radians().cos()
        + 0.32 * (3.0 * hpm + 6.0).to_radians().cos()
        - 0.20 * (4.0 * hpm - 63.0).to_radians().cos();

    let sl = 1.0 + (0.015 * (lpm - 50.0).powi(2)) / (20.0 + (lpm - 50.0).powi(2)).sqrt();
    let sc = 1.0 + 0.045 * cpm;
    let sh = 1.0 + 0.015 * cpm * t;
    let dt = 30.0 * (-(((hpm - 275.0) / 25.0).powi(2))).exp();
    let rc = 2.0 * (cpm.powi(7) / (cpm.powi(7) + 25.0_f64.powi(7) + EPSILON_GUARD)).sqrt();
    let rt = -(2.0 * dt).to_radians().sin() * rc;

    let dl = dlp / sl;
    let dc = dcp / sc;
    let dh = dhp_term / sh;

    (dl * dl + dc * dc + dh * dh + rt * dc * dh).sqrt()
}

/// Human-facing reliability band for a ΔE00 value
pub fn reliability_label(delta_e: f64) -> &'static str {
    if delta_e <= 1.0 {
        "Excelente"
    } else if delta_e <= 2.5 {
        "Bueno"
    } else {
        "Dudoso"
    }
}
