//! Named easing curves used by phase controllers.
//!
//! Every curve maps progress in `0.0..=1.0` onto an eased value; inputs outside
//! that range are clamped first so callers can pass raw ratios.

use std::f32::consts::PI;

/// Easing curves available to entity animations.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Easing {
    /// Identity curve.
    Linear,
    /// Fast start that settles smoothly (`1 - (1 - t)^4`).
    OutQuart,
    /// Symmetric sinusoidal acceleration and deceleration.
    InOutSine,
    /// Overshooting bounce that settles at one.
    OutBounce,
}

impl Easing {
    /// Evaluates the curve at the provided progress.
    #[must_use]
    pub fn apply(self, t: f32) -> f32 {
        let t = t.clamp(0.0, 1.0);
        match self {
            Self::Linear => t,
            Self::OutQuart => ease_out_quart(t),
            Self::InOutSine => ease_in_out_sine(t),
            Self::OutBounce => ease_out_bounce(t),
        }
    }
}

/// Linear interpolation between `start` and `end`.
#[must_use]
pub fn lerp(start: f32, end: f32, factor: f32) -> f32 {
    start + (end - start) * factor
}

fn ease_out_quart(t: f32) -> f32 {
    1.0 - (1.0 - t).powi(4)
}

fn ease_in_out_sine(t: f32) -> f32 {
    -((PI * t).cos() - 1.0) / 2.0
}

fn ease_out_bounce(t: f32) -> f32 {
    const N1: f32 = 7.5625;
    const D1: f32 = 2.75;

    if t < 1.0 / D1 {
        N1 * t * t
    } else if t < 2.0 / D1 {
        let t = t - 1.5 / D1;
        N1 * t * t + 0.75
    } else if t < 2.5 / D1 {
        let t = t - 2.25 / D1;
        N1 * t * t + 0.9375
    } else {
        let t = t - 2.625 / D1;
        N1 * t * t + 0.984_375
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const CURVES: [Easing; 4] = [
        Easing::Linear,
        Easing::OutQuart,
        Easing::InOutSine,
        Easing::OutBounce,
    ];

    #[test]
    fn curves_start_at_zero_and_end_at_one() {
        for curve in CURVES {
            assert!(curve.apply(0.0).abs() < 1e-6, "{curve:?} at 0");
            assert!((curve.apply(1.0) - 1.0).abs() < 1e-6, "{curve:?} at 1");
        }
    }

    #[test]
    fn out_of_range_progress_is_clamped() {
        for curve in CURVES {
            assert_eq!(curve.apply(-3.0), curve.apply(0.0));
            assert_eq!(curve.apply(7.0), curve.apply(1.0));
        }
    }

    #[test]
    fn in_out_sine_is_half_way_at_midpoint() {
        assert!((Easing::InOutSine.apply(0.5) - 0.5).abs() < 1e-6);
    }

    #[test]
    fn out_quart_front_loads_progress() {
        assert!(Easing::OutQuart.apply(0.5) > 0.9);
    }

    #[test]
    fn lerp_interpolates_endpoints() {
        assert_eq!(lerp(2.0, 6.0, 0.0), 2.0);
        assert_eq!(lerp(2.0, 6.0, 1.0), 6.0);
        assert_eq!(lerp(2.0, 6.0, 0.25), 3.0);
    }
}
