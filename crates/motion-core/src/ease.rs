//! Temporal easing between two keyframes.
//!
//! A bezier segment is a cubic curve in the (time, value) plane. Its inner
//! control points sit `influence`% of the segment duration away from each
//! keyframe, along a tangent whose slope is the keyframe's `speed`.

use motion_data::{InterpolationType, TemporalEase};

/// Root-finding tolerance, as a fraction of the segment duration.
pub const SOLVER_TOLERANCE: f64 = 1e-5;

const NEWTON_ITERATIONS: usize = 8;
const BISECTION_ITERATIONS: usize = 64;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SegmentInterpolation {
    Linear,
    Bezier,
    Hold,
}

impl SegmentInterpolation {
    /// Resolve a segment from the start keyframe's outgoing type and the end
    /// keyframe's incoming type. HOLD on either side wins, then BEZIER.
    /// UNKNOWN is read as BEZIER.
    pub fn resolve(out_type: InterpolationType, in_type: InterpolationType) -> Self {
        let bezier_like = |t: InterpolationType| {
            matches!(t, InterpolationType::Bezier | InterpolationType::Unknown)
        };

        if out_type == InterpolationType::Hold || in_type == InterpolationType::Hold {
            SegmentInterpolation::Hold
        } else if bezier_like(out_type) || bezier_like(in_type) {
            SegmentInterpolation::Bezier
        } else {
            SegmentInterpolation::Linear
        }
    }
}

/// One scalar segment between two keyframes.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EaseSegment {
    pub start_time: f64,
    pub end_time: f64,
    pub start_value: f64,
    pub end_value: f64,
    /// Outgoing ease of the start keyframe.
    pub out_ease: TemporalEase,
    /// Incoming ease of the end keyframe.
    pub in_ease: TemporalEase,
    pub interpolation: SegmentInterpolation,
}

/// Value of `segment` at `time`.
///
/// Keyframe times return their keyframe values exactly, whatever the
/// interpolation. A zero-length segment always yields the start value.
pub fn solve_ease(segment: &EaseSegment, time: f64) -> f64 {
    let duration = segment.end_time - segment.start_time;
    if !(duration > 0.0) || time.is_nan() {
        return segment.start_value;
    }
    if time <= segment.start_time {
        return segment.start_value;
    }
    if time >= segment.end_time {
        return segment.end_value;
    }

    match segment.interpolation {
        SegmentInterpolation::Hold => segment.start_value,
        SegmentInterpolation::Linear => {
            let frac = (time - segment.start_time) / duration;
            segment.start_value + (segment.end_value - segment.start_value) * frac
        }
        SegmentInterpolation::Bezier => bezier_value(segment, duration, time),
    }
}

fn influence_fraction(ease: &TemporalEase) -> f64 {
    if ease.influence.is_finite() {
        (ease.influence / 100.0).clamp(0.0, 1.0)
    } else {
        0.0
    }
}

fn finite_or_zero(v: f64) -> f64 {
    if v.is_finite() {
        v
    } else {
        0.0
    }
}

fn bezier_value(segment: &EaseSegment, duration: f64, time: f64) -> f64 {
    let out_len = duration * influence_fraction(&segment.out_ease);
    let in_len = duration * influence_fraction(&segment.in_ease);

    let x0 = segment.start_time;
    let x1 = segment.start_time + out_len;
    let x2 = segment.end_time - in_len;
    let x3 = segment.end_time;

    let y0 = segment.start_value;
    let y1 = segment.start_value + finite_or_zero(segment.out_ease.speed) * out_len;
    let y2 = segment.end_value - finite_or_zero(segment.in_ease.speed) * in_len;
    let y3 = segment.end_value;

    let u = solve_parameter([x0, x1, x2, x3], time, duration * SOLVER_TOLERANCE);
    eval_cubic(y0, y1, y2, y3, u)
}

/// Find `u` in [0, 1] with `x(u) == target`. The time coordinate of an
/// authored ease curve is non-decreasing, so bisection always converges.
fn solve_parameter(x: [f64; 4], target: f64, tolerance: f64) -> f64 {
    let [x0, x1, x2, x3] = x;
    let mut u = ((target - x0) / (x3 - x0)).clamp(0.0, 1.0);

    for _ in 0..NEWTON_ITERATIONS {
        let err = eval_cubic(x0, x1, x2, x3, u) - target;
        if err.abs() <= tolerance {
            return u;
        }
        let slope = eval_cubic_derivative(x0, x1, x2, x3, u);
        if slope.abs() < 1e-12 {
            break;
        }
        let next = u - err / slope;
        if !(0.0..=1.0).contains(&next) {
            break;
        }
        u = next;
    }

    let mut lo = 0.0_f64;
    let mut hi = 1.0_f64;
    for _ in 0..BISECTION_ITERATIONS {
        u = (lo + hi) * 0.5;
        let x_est = eval_cubic(x0, x1, x2, x3, u);
        if (x_est - target).abs() <= tolerance {
            break;
        }
        if x_est < target {
            lo = u;
        } else {
            hi = u;
        }
    }
    u
}

/// B(u) = (1-u)^3*p0 + 3*(1-u)^2*u*p1 + 3*(1-u)*u^2*p2 + u^3*p3
fn eval_cubic(p0: f64, p1: f64, p2: f64, p3: f64, u: f64) -> f64 {
    let one_minus_u = 1.0 - u;
    let omu2 = one_minus_u * one_minus_u;
    let u2 = u * u;
    omu2 * one_minus_u * p0 + 3.0 * omu2 * u * p1 + 3.0 * one_minus_u * u2 * p2 + u2 * u * p3
}

fn eval_cubic_derivative(p0: f64, p1: f64, p2: f64, p3: f64, u: f64) -> f64 {
    let one_minus_u = 1.0 - u;
    3.0 * one_minus_u * one_minus_u * (p1 - p0)
        + 6.0 * one_minus_u * u * (p2 - p1)
        + 3.0 * u * u * (p3 - p2)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn segment(interpolation: SegmentInterpolation) -> EaseSegment {
        EaseSegment {
            start_time: 1.0,
            end_time: 3.0,
            start_value: 10.0,
            end_value: 50.0,
            out_ease: TemporalEase::new(0.0, 33.333),
            in_ease: TemporalEase::new(0.0, 33.333),
            interpolation,
        }
    }

    #[test]
    fn test_resolve_segment_precedence() {
        use InterpolationType::*;
        assert_eq!(
            SegmentInterpolation::resolve(Linear, Hold),
            SegmentInterpolation::Hold
        );
        assert_eq!(
            SegmentInterpolation::resolve(Bezier, Hold),
            SegmentInterpolation::Hold
        );
        assert_eq!(
            SegmentInterpolation::resolve(Linear, Bezier),
            SegmentInterpolation::Bezier
        );
        assert_eq!(
            SegmentInterpolation::resolve(Unknown, Linear),
            SegmentInterpolation::Bezier
        );
        assert_eq!(
            SegmentInterpolation::resolve(Linear, Linear),
            SegmentInterpolation::Linear
        );
    }

    #[test]
    fn test_boundaries_are_exact_for_every_mode() {
        for mode in [
            SegmentInterpolation::Linear,
            SegmentInterpolation::Bezier,
            SegmentInterpolation::Hold,
        ] {
            let seg = segment(mode);
            assert_eq!(solve_ease(&seg, 1.0), 10.0, "{mode:?} start");
            assert_eq!(solve_ease(&seg, 3.0), 50.0, "{mode:?} end");
        }
    }

    #[test]
    fn test_hold_is_a_step() {
        let seg = segment(SegmentInterpolation::Hold);
        assert_eq!(solve_ease(&seg, 1.5), 10.0);
        assert_eq!(solve_ease(&seg, 2.999_999), 10.0);
        assert_eq!(solve_ease(&seg, 3.0), 50.0);
    }

    #[test]
    fn test_linear_midpoint() {
        let seg = segment(SegmentInterpolation::Linear);
        assert_eq!(solve_ease(&seg, 2.0), 30.0);
        assert!((solve_ease(&seg, 1.5) - 20.0).abs() < 1e-12);
    }

    #[test]
    fn test_zero_duration_returns_start() {
        let mut seg = segment(SegmentInterpolation::Bezier);
        seg.end_time = seg.start_time;
        for t in [0.0, 1.0, 2.0] {
            let v = solve_ease(&seg, t);
            assert_eq!(v, 10.0);
        }
        seg.interpolation = SegmentInterpolation::Linear;
        assert_eq!(solve_ease(&seg, 1.0), 10.0);
    }

    #[test]
    fn test_symmetric_ease_passes_through_midpoint() {
        // Zero-speed ease on both sides is symmetric about the segment centre
        let seg = segment(SegmentInterpolation::Bezier);
        let mid = solve_ease(&seg, 2.0);
        assert!((mid - 30.0).abs() < 1e-3, "got {mid}");

        // Easing in starts slower than linear
        let early = solve_ease(&seg, 1.2);
        let linear_early = 10.0 + 40.0 * 0.1;
        assert!(early < linear_early, "{early} should lag {linear_early}");
    }

    #[test]
    fn test_zero_influence_degenerates_to_linear() {
        let mut seg = segment(SegmentInterpolation::Bezier);
        seg.out_ease = TemporalEase::new(0.0, 0.0);
        seg.in_ease = TemporalEase::new(0.0, 0.0);
        for i in 1..10 {
            let t = 1.0 + 2.0 * i as f64 / 10.0;
            let expected = 10.0 + 40.0 * (t - 1.0) / 2.0;
            assert!((solve_ease(&seg, t) - expected).abs() < 1e-3);
        }
    }

    #[test]
    fn test_speed_matching_linear_slope_is_linear() {
        // slope of the straight line through both keyframes is 20 units/s
        let mut seg = segment(SegmentInterpolation::Bezier);
        seg.out_ease = TemporalEase::new(20.0, 50.0);
        seg.in_ease = TemporalEase::new(20.0, 50.0);
        assert!((solve_ease(&seg, 1.5) - 20.0).abs() < 1e-3);
        assert!((solve_ease(&seg, 2.5) - 40.0).abs() < 1e-3);
    }

    #[test]
    fn test_bezier_is_monotonic_for_zero_speed() {
        let seg = segment(SegmentInterpolation::Bezier);
        let mut prev = solve_ease(&seg, 1.0);
        for i in 1..=200 {
            let t = 1.0 + 2.0 * i as f64 / 200.0;
            let v = solve_ease(&seg, t);
            assert!(v >= prev - 1e-9, "not monotonic at t={t}: {prev} -> {v}");
            prev = v;
        }
    }

    #[test]
    fn test_nan_time_is_safe() {
        let seg = segment(SegmentInterpolation::Bezier);
        assert_eq!(solve_ease(&seg, f64::NAN), 10.0);
    }
}
