//! Perceptual color difference in CIELAB.
//!
//! Every function here returns the **squared** difference. Clustering only
//! needs relative ordering, so the square root is left to callers that want
//! an actual ΔE (see [`ColorDifference::delta_e`]).
//!
//! Formulas follow Bruce Lindbloom's reference pages for ΔE76, ΔE94 and ΔE2000.

use palette::Lab;

use crate::options::Accuracy;

/// Chroma of an (a, b) pair.
#[inline(always)]
fn chroma(a: f32, b: f32) -> f32 {
    (a * a + b * b).sqrt()
}

/// CIE76: plain squared Euclidean distance in LAB.
#[inline]
pub fn cie76_squared(lab1: &Lab, lab2: &Lab) -> f32 {
    let dl = lab2.l - lab1.l;
    let da = lab2.a - lab1.a;
    let db = lab2.b - lab1.b;
    dl * dl + da * da + db * db
}

/// CIE94 weighting parameters (graphic-arts defaults).
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Cie94 {
    pub k_l: f32,
    pub k_c: f32,
    pub k_h: f32,
    pub k1: f32,
    pub k2: f32,
}

impl Default for Cie94 {
    fn default() -> Self {
        Self {
            k_l: 1.0,
            k_c: 1.0,
            k_h: 1.0,
            k1: 0.045,
            k2: 0.015,
        }
    }
}

impl Cie94 {
    /// Squared ΔE94. Not symmetric: `lab1` is the reference color whose
    /// chroma weights the chroma and hue terms.
    pub fn squared(&self, lab1: &Lab, lab2: &Lab) -> f32 {
        let dl = lab1.l - lab2.l;

        let c1 = chroma(lab1.a, lab1.b);
        let c2 = chroma(lab2.a, lab2.b);
        let dc = c1 - c2;

        let da = lab1.a - lab2.a;
        let db = lab1.b - lab2.b;
        // Float error can push this slightly below zero for near-identical hues.
        let dh = (da * da + db * db - dc * dc).max(0.0).sqrt();

        let sl = 1.0;
        let sc = 1.0 + self.k1 * c1;
        let sh = 1.0 + self.k2 * c1;

        let l_term = dl / (self.k_l * sl);
        let c_term = dc / (self.k_c * sc);
        let h_term = dh / (self.k_h * sh);
        l_term * l_term + c_term * c_term + h_term * h_term
    }
}

/// CIEDE2000 weighting parameters.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Cie2000 {
    pub k_l: f32,
    pub k_c: f32,
    pub k_h: f32,
}

impl Default for Cie2000 {
    fn default() -> Self {
        Self {
            k_l: 1.0,
            k_c: 1.0,
            k_h: 1.0,
        }
    }
}

/// Hue angle in degrees, `[0, 360)`. Zero when both components are zero.
#[inline]
fn hue_degrees(a: f32, b: f32) -> f32 {
    if a == 0.0 && b == 0.0 {
        return 0.0;
    }
    let theta = b.atan2(a).to_degrees();
    let positive = if theta < 0.0 { theta + 360.0 } else { theta };
    positive % 360.0
}

#[inline(always)]
fn pow7_ratio(c: f32) -> f32 {
    const TWENTY_FIVE_POW_7: f32 = 6_103_515_625.0;
    let c7 = c.powi(7);
    (c7 / (c7 + TWENTY_FIVE_POW_7)).sqrt()
}

impl Cie2000 {
    /// Squared ΔE2000. Angles are kept in degrees and only converted to
    /// radians inside trigonometric calls.
    pub fn squared(&self, lab1: &Lab, lab2: &Lab) -> f32 {
        let dl_p = lab2.l - lab1.l;
        let l_bar_p = (lab1.l + lab2.l) / 2.0;

        let c_bar = (chroma(lab1.a, lab1.b) + chroma(lab2.a, lab2.b)) / 2.0;
        let g = (1.0 - pow7_ratio(c_bar)) / 2.0;
        let a1_p = lab1.a * (1.0 + g);
        let a2_p = lab2.a * (1.0 + g);

        let c1_p = chroma(a1_p, lab1.b);
        let c2_p = chroma(a2_p, lab2.b);
        let dc_p = c2_p - c1_p;
        let c_bar_p = (c1_p + c2_p) / 2.0;

        let h1_p = hue_degrees(a1_p, lab1.b);
        let h2_p = hue_degrees(a2_p, lab2.b);
        let dh_abs = (h1_p - h2_p).abs();
        let achromatic = c1_p == 0.0 || c2_p == 0.0;

        let dh_p = if achromatic {
            0.0
        } else if dh_abs <= 180.0 {
            h2_p - h1_p
        } else if h2_p <= h1_p {
            h2_p - h1_p + 360.0
        } else {
            h2_p - h1_p - 360.0
        };

        let d_big_h_p = 2.0 * (c1_p * c2_p).sqrt() * (dh_p / 2.0).to_radians().sin();

        let h_bar_p = if achromatic {
            h1_p + h2_p
        } else if dh_abs > 180.0 {
            (h1_p + h2_p + 360.0) / 2.0
        } else {
            (h1_p + h2_p) / 2.0
        };

        let t = 1.0 - 0.17 * (h_bar_p - 30.0).to_radians().cos()
            + 0.24 * (2.0 * h_bar_p).to_radians().cos()
            + 0.32 * (3.0 * h_bar_p + 6.0).to_radians().cos()
            - 0.20 * (4.0 * h_bar_p - 63.0).to_radians().cos();

        let l50 = (l_bar_p - 50.0) * (l_bar_p - 50.0);
        let sl = 1.0 + (0.015 * l50) / (20.0 + l50).sqrt();
        let sc = 1.0 + 0.045 * c_bar_p;
        let sh = 1.0 + 0.015 * c_bar_p * t;

        let d_theta = 30.0 * (-((h_bar_p - 275.0) / 25.0).powi(2)).exp();
        let rc = 2.0 * pow7_ratio(c_bar_p);
        let rt = -rc * (2.0 * d_theta).to_radians().sin();

        let l_term = dl_p / (self.k_l * sl);
        let c_term = dc_p / (self.k_c * sc);
        let h_term = d_big_h_p / (self.k_h * sh);
        l_term * l_term + c_term * c_term + h_term * h_term + rt * c_term * h_term
    }
}

/// A squared color-difference metric, chosen once per pipeline run.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum ColorDifference {
    Cie76,
    Cie94(Cie94),
    Cie2000(Cie2000),
}

impl ColorDifference {
    #[inline]
    pub fn squared(&self, lab1: &Lab, lab2: &Lab) -> f32 {
        match self {
            ColorDifference::Cie76 => cie76_squared(lab1, lab2),
            ColorDifference::Cie94(params) => params.squared(lab1, lab2),
            ColorDifference::Cie2000(params) => params.squared(lab1, lab2),
        }
    }

    /// The non-squared ΔE.
    pub fn delta_e(&self, lab1: &Lab, lab2: &Lab) -> f32 {
        self.squared(lab1, lab2).max(0.0).sqrt()
    }
}

impl From<Accuracy> for ColorDifference {
    fn from(accuracy: Accuracy) -> Self {
        match accuracy {
            Accuracy::Low => ColorDifference::Cie76,
            Accuracy::Medium => ColorDifference::Cie94(Cie94::default()),
            Accuracy::High => ColorDifference::Cie2000(Cie2000::default()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lab(l: f32, a: f32, b: f32) -> Lab {
        Lab::new(l, a, b)
    }

    #[test]
    fn identical_colors_have_zero_difference() {
        let samples = [
            lab(0.0, 0.0, 0.0),
            lab(50.0, 2.6772, -79.7751),
            lab(53.23, 80.11, 67.22),
            lab(100.0, 0.0, 0.0),
        ];
        for c in &samples {
            for metric in [Accuracy::Low, Accuracy::Medium, Accuracy::High] {
                let d = ColorDifference::from(metric).squared(c, c);
                assert!(d.abs() < 1e-6, "{metric:?} gave {d} for {c:?}");
            }
        }
    }

    #[test]
    fn cie76_is_squared_euclidean() {
        assert_eq!(cie76_squared(&lab(0.0, 0.0, 0.0), &lab(1.0, 2.0, 2.0)), 9.0);
        let d = ColorDifference::Cie76.delta_e(&lab(0.0, 0.0, 0.0), &lab(1.0, 2.0, 2.0));
        assert!((d - 3.0).abs() < 1e-6);
    }

    #[test]
    fn cie94_lightness_only_difference_is_unweighted() {
        let d = Cie94::default().squared(&lab(50.0, 0.0, 0.0), &lab(60.0, 0.0, 0.0));
        assert!((d - 100.0).abs() < 1e-3);
    }

    #[test]
    fn cie94_reference_pair() {
        // Lindbloom calculator: ΔE94 ≈ 1.3950 (graphic arts).
        let d = Cie94::default()
            .squared(&lab(50.0, 2.6772, -79.7751), &lab(50.0, 0.0, -82.7485))
            .sqrt();
        assert!((d - 1.3950).abs() < 1e-3, "got {d}");
    }

    // Pairs from Sharma, Wu & Dalal, "The CIEDE2000 Color-Difference Formula".
    #[test]
    fn cie2000_matches_sharma_test_data() {
        let cases = [
            ((50.0, 2.6772, -79.7751), (50.0, 0.0, -82.7485), 2.0425),
            ((50.0, 3.1571, -77.2803), (50.0, 0.0, -82.7485), 2.8615),
            ((50.0, 0.0, 0.0), (50.0, -1.0, 2.0), 2.3669),
            ((50.0, 2.49, -0.001), (50.0, -2.49, 0.0011), 7.2195),
            ((50.0, 2.5, 0.0), (73.0, 25.0, -18.0), 27.1492),
            ((60.2574, -34.0099, 36.2677), (60.4626, -34.1751, 39.4387), 1.2644),
            ((22.7233, 20.0904, -46.694), (23.0331, 14.973, -42.5619), 2.0373),
        ];
        for ((l1, a1, b1), (l2, a2, b2), expected) in cases {
            let d = Cie2000::default()
                .squared(&lab(l1, a1, b1), &lab(l2, a2, b2))
                .sqrt();
            assert!((d - expected).abs() < 2e-3, "expected {expected}, got {d}");
        }
    }

    #[test]
    fn cie2000_is_symmetric() {
        let a = lab(60.2574, -34.0099, 36.2677);
        let b = lab(22.7233, 20.0904, -46.694);
        let m = Cie2000::default();
        let (ab, ba) = (m.squared(&a, &b), m.squared(&b, &a));
        assert!((ab - ba).abs() <= 1e-4 * ab, "{ab} vs {ba}");
    }

    #[test]
    fn accuracy_selects_metric() {
        assert_eq!(ColorDifference::from(Accuracy::Low), ColorDifference::Cie76);
        assert!(matches!(
            ColorDifference::from(Accuracy::Medium),
            ColorDifference::Cie94(_)
        ));
        assert!(matches!(
            ColorDifference::from(Accuracy::High),
            ColorDifference::Cie2000(_)
        ));
    }
}
