//! Easing curves mapping linear progress in [0, 1] to eased progress in [0, 1].
//!
//! - Linear: `t`
//! - EaseOutQuad: `t * (2 - t)`
//! - CubicBezier: CSS-style timing function, x inverted by bisection
//! - Custom: host-supplied function pointer

use serde::{Deserialize, Serialize};

/// Pluggable easing policy for a counter.
#[derive(Clone, Copy, Debug, Default, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Easing {
    #[default]
    Linear,
    EaseOutQuad,
    /// Control points (x1, y1, x2, y2) as in CSS `cubic-bezier()`.
    CubicBezier { ctrl: [f32; 4] },
    /// Not serializable; install from Rust.
    #[serde(skip)]
    Custom(fn(f64) -> f64),
}

impl Easing {
    /// Apply the curve. Input and output are clamped to [0, 1].
    #[inline]
    pub fn apply(&self, t: f64) -> f64 {
        let t = if t.is_nan() { 0.0 } else { t.clamp(0.0, 1.0) };
        let eased = match self {
            Easing::Linear => t,
            Easing::EaseOutQuad => ease_out_quad(t),
            Easing::CubicBezier { ctrl } => solve_cubic_bezier(t, *ctrl),
            Easing::Custom(f) => f(t),
        };
        if eased.is_nan() {
            0.0
        } else {
            eased.clamp(0.0, 1.0)
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Easing::Linear => "linear",
            Easing::EaseOutQuad => "ease_out_quad",
            Easing::CubicBezier { .. } => "cubic_bezier",
            Easing::Custom(_) => "custom",
        }
    }
}

#[inline]
pub fn ease_out_quad(t: f64) -> f64 {
    t * (2.0 - t)
}

/// One axis of a bezier running from 0 to 1 with inner control values `c1`, `c2`.
#[inline]
fn bezier_axis(c1: f64, c2: f64, s: f64) -> f64 {
    let r = 1.0 - s;
    3.0 * r * r * s * c1 + 3.0 * r * s * s * c2 + s * s * s
}

const BEZIER_STEPS: usize = 32;
const BEZIER_TOLERANCE: f64 = 1e-7;

/// CSS `cubic-bezier(x1, y1, x2, y2)` at time `t`.
///
/// Finds the curve parameter whose x equals `t` by bisection, then returns y
/// at that parameter. x is monotonic while x1 and x2 stay in [0, 1].
fn solve_cubic_bezier(t: f64, [x1, y1, x2, y2]: [f32; 4]) -> f64 {
    let (x1, y1, x2, y2) = (x1 as f64, y1 as f64, x2 as f64, y2 as f64);
    if t <= 0.0 || t >= 1.0 || (x1 == y1 && x2 == y2) {
        return t;
    }
    let (mut lo, mut hi) = (0.0, 1.0);
    let mut s = t;
    for _ in 0..BEZIER_STEPS {
        let x = bezier_axis(x1, x2, s);
        if (x - t).abs() < BEZIER_TOLERANCE {
            break;
        }
        if x < t {
            lo = s;
        } else {
            hi = s;
        }
        s = (lo + hi) / 2.0;
    }
    bezier_axis(y1, y2, s)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    fn all() -> Vec<Easing> {
        vec![
            Easing::Linear,
            Easing::EaseOutQuad,
            Easing::CubicBezier {
                ctrl: [0.25, 0.1, 0.25, 1.0],
            },
            Easing::Custom(|t| t * t),
        ]
    }

    #[test]
    fn boundaries() {
        for easing in all() {
            assert_abs_diff_eq!(easing.apply(0.0), 0.0, epsilon = 1e-4);
            assert_abs_diff_eq!(easing.apply(1.0), 1.0, epsilon = 1e-4);
        }
    }

    #[test]
    fn monotonic() {
        for easing in all() {
            let mut prev = 0.0;
            for i in 0..=20 {
                let v = easing.apply(i as f64 / 20.0);
                assert!(v + 1e-6 >= prev, "{} not monotonic at {}", easing.name(), i);
                prev = v;
            }
        }
    }

    #[test]
    fn ease_out_quad_midpoint() {
        assert_abs_diff_eq!(Easing::EaseOutQuad.apply(0.5), 0.75);
    }

    #[test]
    fn out_of_range_input_is_clamped() {
        assert_eq!(Easing::Linear.apply(-3.0), 0.0);
        assert_eq!(Easing::Linear.apply(7.5), 1.0);
        assert_eq!(Easing::Linear.apply(f64::NAN), 0.0);
        // Overshooting custom curves still land in [0, 1].
        let overshoot = Easing::Custom(|t| t * 1.5);
        assert_eq!(overshoot.apply(0.9), 1.0);
    }

    #[test]
    fn linear_bezier_fast_path() {
        let e = Easing::CubicBezier {
            ctrl: [0.0, 0.0, 1.0, 1.0],
        };
        assert_abs_diff_eq!(e.apply(0.37), 0.37, epsilon = 1e-6);
    }

    #[test]
    fn css_ease_curve_matches_reference_points() {
        // cubic-bezier(0.25, 0.1, 0.25, 1.0) is CSS `ease`.
        let ease = Easing::CubicBezier {
            ctrl: [0.25, 0.1, 0.25, 1.0],
        };
        assert_abs_diff_eq!(ease.apply(0.5), 0.8024, epsilon = 1e-3);
    }

    #[test]
    fn serde_tags() {
        let json = serde_json::to_string(&Easing::EaseOutQuad).unwrap();
        assert_eq!(json, r#"{"type":"ease_out_quad"}"#);
        let back: Easing = serde_json::from_str(r#"{"type":"cubic_bezier","ctrl":[0.4,0.0,0.2,1.0]}"#)
            .unwrap();
        assert_eq!(back.name(), "cubic_bezier");
    }
}
