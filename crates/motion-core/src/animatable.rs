use crate::ease::{solve_ease, EaseSegment, SegmentInterpolation};
use motion_data::{Easing, Keyframe, MaskPath, Point2, Property, RawPathKeyframe};
use tracing::warn;

/// A value that can be eased one scalar component at a time.
///
/// The kind of value (scalar or path) is fixed by the track's type when the
/// document is loaded, so evaluation never inspects the shape of a value.
pub trait Animatable: Clone {
    /// Build a value of the same shape by combining matching components.
    fn zip_with(&self, other: &Self, f: impl FnMut(f64, f64) -> f64) -> Self;
}

impl Animatable for f64 {
    fn zip_with(&self, other: &Self, mut f: impl FnMut(f64, f64) -> f64) -> Self {
        f(*self, *other)
    }
}

fn zip_points(
    a: &[Point2],
    b: &[Point2],
    len: usize,
    f: &mut impl FnMut(f64, f64) -> f64,
) -> Vec<Point2> {
    (0..len)
        .map(|i| {
            let pa = a.get(i).copied().unwrap_or([0.0, 0.0]);
            let pb = b.get(i).copied().unwrap_or([0.0, 0.0]);
            [f(pa[0], pb[0]), f(pa[1], pb[1])]
        })
        .collect()
}

impl Animatable for MaskPath {
    fn zip_with(&self, other: &Self, mut f: impl FnMut(f64, f64) -> f64) -> Self {
        // Match vertex counts by using the minimum
        let count = self.vertices.len().min(other.vertices.len());

        // Tangents missing on one side ease from/to a zero offset
        let in_count = self.in_tangents.len().max(other.in_tangents.len()).min(count);
        let out_count = self
            .out_tangents
            .len()
            .max(other.out_tangents.len())
            .min(count);

        MaskPath {
            vertices: zip_points(&self.vertices, &other.vertices, count, &mut f),
            in_tangents: zip_points(&self.in_tangents, &other.in_tangents, in_count, &mut f),
            out_tangents: zip_points(&self.out_tangents, &other.out_tangents, out_count, &mut f),
            closed: self.closed,
        }
    }
}

/// Anything that can stand in for a keyframe during the bracketing search.
pub trait TimedKey {
    type Value;

    fn time(&self) -> f64;
    fn value(&self) -> &Self::Value;
    fn easing(&self) -> Easing;
}

impl<T> TimedKey for Keyframe<T> {
    type Value = T;

    fn time(&self) -> f64 {
        self.time
    }
    fn value(&self) -> &T {
        &self.value
    }
    fn easing(&self) -> Easing {
        self.easing
    }
}

impl<K: TimedKey> TimedKey for &K {
    type Value = K::Value;

    fn time(&self) -> f64 {
        (**self).time()
    }
    fn value(&self) -> &K::Value {
        (**self).value()
    }
    fn easing(&self) -> Easing {
        (**self).easing()
    }
}

/// Raw path keyframes carry no easing and are always linear.
impl TimedKey for RawPathKeyframe {
    type Value = MaskPath;

    fn time(&self) -> f64 {
        self.time
    }
    fn value(&self) -> &MaskPath {
        &self.value
    }
    fn easing(&self) -> Easing {
        Easing::default()
    }
}

pub fn is_time_ordered<K: TimedKey>(keys: &[K]) -> bool {
    keys.windows(2).all(|w| w[0].time() <= w[1].time())
}

pub struct Animator;

impl Animator {
    /// Value of `prop` at `time` (seconds). Falls back to `prop.value` when
    /// the property has no keyframes.
    pub fn resolve<T: Animatable>(prop: &Property<T>, time: f64) -> T {
        if prop.keyframes.is_empty() {
            return prop.value.clone();
        }
        if !is_time_ordered(&prop.keyframes) {
            warn!(
                property = %prop.name,
                "keyframes are out of time order; evaluating a sorted copy"
            );
        }
        Self::resolve_keys(&prop.keyframes, time).unwrap_or_else(|| prop.value.clone())
    }

    /// Evaluate an arbitrary keyframe sequence. Returns `None` only for an
    /// empty sequence.
    ///
    /// Out-of-order input is tolerated by evaluating a stably sorted view, so
    /// among keyframes sharing a time the later-indexed one wins.
    pub fn resolve_keys<K>(keys: &[K], time: f64) -> Option<K::Value>
    where
        K: TimedKey,
        K::Value: Animatable,
    {
        if keys.is_empty() {
            return None;
        }
        if is_time_ordered(keys) {
            return Some(Self::resolve_ordered(keys, time));
        }

        let mut sorted: Vec<&K> = keys.iter().collect();
        sorted.sort_by(|a, b| a.time().total_cmp(&b.time()));
        Some(Self::resolve_ordered(&sorted, time))
    }

    fn resolve_ordered<K>(keys: &[K], time: f64) -> K::Value
    where
        K: TimedKey,
        K::Value: Animatable,
    {
        let first = &keys[0];
        if time.is_nan() || time < first.time() {
            return first.value().clone();
        }
        let last = &keys[keys.len() - 1];
        if time >= last.time() {
            return last.value().clone();
        }

        // First keyframe strictly after `time`; the segment is [idx-1, idx].
        // first.time <= time < last.time keeps idx within 1..len.
        let idx = keys.partition_point(|k| k.time() <= time);
        let kf_start = &keys[idx - 1];
        let kf_end = &keys[idx];

        let start_easing = kf_start.easing();
        let end_easing = kf_end.easing();
        let interpolation =
            SegmentInterpolation::resolve(start_easing.out_type, end_easing.in_type);

        if interpolation == SegmentInterpolation::Hold || time <= kf_start.time() {
            return kf_start.value().clone();
        }

        kf_start.value().zip_with(kf_end.value(), |start_value, end_value| {
            solve_ease(
                &EaseSegment {
                    start_time: kf_start.time(),
                    end_time: kf_end.time(),
                    start_value,
                    end_value,
                    out_ease: start_easing.out_ease,
                    in_ease: end_easing.in_ease,
                    interpolation,
                },
                time,
            )
        })
    }
}

/// Evaluate a scalar track at `time` (seconds).
pub fn evaluate(track: &Property, time: f64) -> f64 {
    Animator::resolve(track, time)
}
