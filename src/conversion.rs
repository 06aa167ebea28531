//! RGB ↔ CIELAB conversion.
//!
//! The pipeline is `sRGB → linear sRGB → XYZ (×100) → LAB` and back again.
//! Vector types come from `palette`, but the arithmetic is done here with
//! fixed four-digit matrices so results are reproducible independently of
//! `palette`'s own (higher precision) conversion tables.
//!
//! Device RGB is treated as sRGB; no color management is applied.

use palette::{Lab, LinSrgb, Srgb, Xyz};

/// D65 reference white, on the same 0–100 scale as [`linear_to_xyz`] output.
pub const D65_TRISTIMULUS: [f32; 3] = [95.047, 100.0, 108.883];

/// Linear sRGB → XYZ, row-major, applied as `M × v`.
const LINEAR_SRGB_TO_XYZ: [[f32; 3]; 3] = [
    [0.4124, 0.3576, 0.1805],
    [0.2126, 0.7152, 0.0722],
    [0.0193, 0.1192, 0.9505],
];

/// XYZ → linear sRGB, inverse of [`LINEAR_SRGB_TO_XYZ`].
const XYZ_TO_LINEAR_SRGB: [[f32; 3]; 3] = [
    [3.2406, -1.5372, -0.4986],
    [-0.9689, 1.8758, 0.0415],
    [0.0557, -0.2040, 1.0570],
];

const EPSILON: f32 = 6.0 / 29.0;

#[inline(always)]
fn mul(m: &[[f32; 3]; 3], v: [f32; 3]) -> [f32; 3] {
    [
        m[0][0] * v[0] + m[0][1] * v[1] + m[0][2] * v[2],
        m[1][0] * v[0] + m[1][1] * v[1] + m[1][2] * v[2],
        m[2][0] * v[0] + m[2][1] * v[1] + m[2][2] * v[2],
    ]
}

// ------------------------------------------------------------
// Transfer functions
// ------------------------------------------------------------

#[inline(always)]
fn decode_channel(c: f32) -> f32 {
    if c <= 0.04045 {
        c / 12.92
    } else {
        ((c + 0.055) / 1.055).powf(2.4)
    }
}

#[inline(always)]
fn encode_channel(c: f32) -> f32 {
    if c <= 0.003_130_8 {
        c * 12.92
    } else {
        1.055 * c.powf(1.0 / 2.4) - 0.055
    }
}

/// Gamma-decode each sRGB channel.
pub fn srgb_to_linear(rgb: Srgb) -> LinSrgb {
    LinSrgb::new(
        decode_channel(rgb.red),
        decode_channel(rgb.green),
        decode_channel(rgb.blue),
    )
}

/// Gamma-encode each linear channel.
pub fn linear_to_srgb(linear: LinSrgb) -> Srgb {
    Srgb::new(
        encode_channel(linear.red),
        encode_channel(linear.green),
        encode_channel(linear.blue),
    )
}

// ------------------------------------------------------------
// XYZ
// ------------------------------------------------------------

/// Linear sRGB → XYZ scaled to 0–100.
pub fn linear_to_xyz(linear: LinSrgb) -> Xyz {
    let [x, y, z] = mul(
        &LINEAR_SRGB_TO_XYZ,
        [linear.red, linear.green, linear.blue],
    );
    Xyz::new(x * 100.0, y * 100.0, z * 100.0)
}

/// XYZ on the 0–100 scale → linear sRGB.
pub fn xyz_to_linear(xyz: Xyz) -> LinSrgb {
    let [r, g, b] = mul(
        &XYZ_TO_LINEAR_SRGB,
        [xyz.x / 100.0, xyz.y / 100.0, xyz.z / 100.0],
    );
    LinSrgb::new(r, g, b)
}

// ------------------------------------------------------------
// LAB
// ------------------------------------------------------------

#[inline(always)]
fn lab_f(t: f32) -> f32 {
    if t > EPSILON * EPSILON * EPSILON {
        t.cbrt()
    } else {
        (1.0 / 3.0) * (29.0 / 6.0) * (29.0 / 6.0) * t + 4.0 / 29.0
    }
}

#[inline(always)]
fn lab_f_inverse(t: f32) -> f32 {
    if t > EPSILON {
        t * t * t
    } else {
        3.0 * EPSILON * EPSILON * (t - 4.0 / 29.0)
    }
}

/// XYZ (0–100) → LAB against the given white point.
pub fn xyz_to_lab(xyz: Xyz, white: [f32; 3]) -> Lab {
    let fx = lab_f(xyz.x / white[0]);
    let fy = lab_f(xyz.y / white[1]);
    let fz = lab_f(xyz.z / white[2]);

    Lab::new(116.0 * fy - 16.0, 500.0 * (fx - fy), 200.0 * (fy - fz))
}

/// LAB → XYZ (0–100) against the given white point.
pub fn lab_to_xyz(lab: Lab, white: [f32; 3]) -> Xyz {
    let c = (lab.l + 16.0) / 116.0;

    Xyz::new(
        white[0] * lab_f_inverse(c + lab.a / 500.0),
        white[1] * lab_f_inverse(c),
        white[2] * lab_f_inverse(c - lab.b / 200.0),
    )
}

// ------------------------------------------------------------
// Full pipeline
// ------------------------------------------------------------

/// Convert an RGB vector (channels in `[0, 1]`) to LAB under D65.
pub fn rgb_to_lab(rgb: Srgb) -> Lab {
    xyz_to_lab(linear_to_xyz(srgb_to_linear(rgb)), D65_TRISTIMULUS)
}

/// Convert a LAB vector back to RGB. The result is not clamped; LAB
/// values outside the sRGB gamut map to channels outside `[0, 1]`.
pub fn lab_to_rgb(lab: Lab) -> Srgb {
    linear_to_srgb(xyz_to_linear(lab_to_xyz(lab, D65_TRISTIMULUS)))
}

/// Convert an 8-bit sample to an RGB vector by dividing each channel by 255.
#[inline]
pub fn rgb_from_u8(r: u8, g: u8, b: u8) -> Srgb {
    Srgb::new(r as f32 / 255.0, g as f32 / 255.0, b as f32 / 255.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn assert_close(actual: f32, expected: f32, tolerance: f32) {
        assert!(
            (actual - expected).abs() <= tolerance,
            "expected {expected}, got {actual}"
        );
    }

    #[test]
    fn black_maps_to_origin() {
        let lab = rgb_to_lab(Srgb::new(0.0, 0.0, 0.0));
        assert_close(lab.l, 0.0, 1e-4);
        assert_close(lab.a, 0.0, 1e-4);
        assert_close(lab.b, 0.0, 1e-4);
    }

    #[test]
    fn white_is_full_lightness_and_neutral() {
        let lab = rgb_to_lab(Srgb::new(1.0, 1.0, 1.0));
        assert_close(lab.l, 100.0, 1e-3);
        assert!(lab.a.abs() < 0.1, "a = {}", lab.a);
        assert!(lab.b.abs() < 0.1, "b = {}", lab.b);
    }

    #[test]
    fn pure_red_matches_reference() {
        let lab = rgb_to_lab(Srgb::new(1.0, 0.0, 0.0));
        assert_close(lab.l, 53.23, 0.05);
        assert_close(lab.a, 80.11, 0.1);
        assert_close(lab.b, 67.22, 0.1);
    }

    #[test]
    fn xyz_of_white_uses_row_sums() {
        let xyz = linear_to_xyz(LinSrgb::new(1.0, 1.0, 1.0));
        assert_close(xyz.x, 95.05, 1e-3);
        assert_close(xyz.y, 100.0, 1e-3);
        assert_close(xyz.z, 108.9, 1e-3);
    }

    #[test]
    fn transfer_functions_invert_each_other() {
        for i in 0..=100 {
            let c = i as f32 / 100.0;
            assert_close(encode_channel(decode_channel(c)), c, 1e-5);
        }
    }

    #[test]
    fn lab_round_trip_over_rgb_cube() {
        let steps = [0.0, 0.02, 0.1, 0.25, 0.5, 0.75, 0.9, 1.0];
        for &r in &steps {
            for &g in &steps {
                for &b in &steps {
                    let back = lab_to_rgb(rgb_to_lab(Srgb::new(r, g, b)));
                    assert_close(back.red, r, 1e-3);
                    assert_close(back.green, g, 1e-3);
                    assert_close(back.blue, b, 1e-3);
                }
            }
        }
    }

    #[test]
    fn greys_have_no_chroma() {
        for v in [0.2_f32, 0.5, 0.8] {
            let lab = rgb_to_lab(Srgb::new(v, v, v));
            assert!(lab.a.abs() < 0.1 && lab.b.abs() < 0.1, "{lab:?}");
        }
    }

    #[test]
    fn u8_samples_are_normalized() {
        let rgb = rgb_from_u8(255, 0, 51);
        assert_eq!(rgb.red, 1.0);
        assert_eq!(rgb.green, 0.0);
        assert_close(rgb.blue, 0.2, 1e-6);
    }
}
