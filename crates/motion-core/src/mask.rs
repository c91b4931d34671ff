//! Mask path resolution and geometry building.

use crate::animatable::{evaluate, Animator};
use crate::config::{EvalConfig, FallbackRect};
use kurbo::{BezPath, Point};
use motion_data::{Clip, Mask, MaskMode, MaskPath, Point2};
use serde::Serialize;
use tracing::{debug, warn};

/// Which of a mask's path sources produced its geometry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum PathSource {
    /// Keyframed "Mask Path" property.
    Keyframed,
    /// Raw path keyframes without easing.
    Raw,
    Static,
    /// No vertices anywhere; the configured rectangle stands in.
    Fallback,
}

#[derive(Debug, Clone)]
pub struct MaskGeometry {
    pub name: Option<String>,
    pub path: BezPath,
    pub mode: MaskMode,
    pub inverted: bool,
    /// 0..1
    pub opacity: f64,
    pub source: PathSource,
}

impl MaskGeometry {
    pub fn is_fallback(&self) -> bool {
        self.source == PathSource::Fallback
    }
}

/// Pick the path `mask` shows at `time`, in source priority order.
pub fn resolve_mask_path(mask: &Mask, time: f64) -> (MaskPath, PathSource) {
    if let Some(prop) = mask.mask_path.as_ref().filter(|p| p.is_animated()) {
        return (Animator::resolve(prop, time), PathSource::Keyframed);
    }
    if let Some(path) = Animator::resolve_keys(&mask.path_keyframes, time) {
        return (path, PathSource::Raw);
    }
    let path = mask
        .path
        .clone()
        .or_else(|| mask.mask_path.as_ref().map(|p| p.value.clone()))
        .unwrap_or_default();
    (path, PathSource::Static)
}

fn to_point(p: Point2) -> Point {
    Point::new(p[0], p[1])
}

fn offset(p: Point2, d: Point2) -> Point {
    Point::new(p[0] + d[0], p[1] + d[1])
}

fn is_trivial(t: Point2, epsilon: f64) -> bool {
    t[0].abs() <= epsilon && t[1].abs() <= epsilon
}

fn push_segment(bp: &mut BezPath, path: &MaskPath, from: usize, to: usize, epsilon: f64) {
    let p0 = path.vertices[from];
    let p1 = path.vertices[to];
    match (path.out_tangents.get(from), path.in_tangents.get(to)) {
        // A one-sided handle still bends the segment
        (Some(&out), Some(&inc)) if !is_trivial(out, epsilon) || !is_trivial(inc, epsilon) => {
            bp.curve_to(offset(p0, out), offset(p1, inc), to_point(p1));
        }
        _ => bp.line_to(to_point(p1)),
    }
}

/// Geometry for a resolved path, or `None` when it has no vertices.
///
/// A segment is a cubic when the previous vertex's out tangent and the next
/// vertex's in tangent are both present and at least one of them is longer
/// than `tangent_epsilon`; otherwise it is a straight line.
pub fn build_bez_path(path: &MaskPath, config: &EvalConfig) -> Option<BezPath> {
    let first = *path.vertices.first()?;
    let count = path.vertices.len();
    let mut bp = BezPath::new();
    bp.move_to(to_point(first));

    for i in 1..count {
        push_segment(&mut bp, path, i - 1, i, config.tangent_epsilon);
    }
    if path.closed {
        if count > 1 {
            push_segment(&mut bp, path, count - 1, 0, config.tangent_epsilon);
        }
        bp.close_path();
    }
    Some(bp)
}

pub fn fallback_path(rect: &FallbackRect) -> BezPath {
    let (x0, y0) = (rect.x, rect.y);
    let (x1, y1) = (rect.x + rect.width, rect.y + rect.height);
    let mut bp = BezPath::new();
    bp.move_to((x0, y0));
    bp.line_to((x1, y0));
    bp.line_to((x1, y1));
    bp.line_to((x0, y1));
    bp.line_to((x0, y0));
    bp.close_path();
    bp
}

fn mask_opacity(mask: &Mask, time: f64) -> f64 {
    mask.opacity
        .as_ref()
        .map(|p| (evaluate(p, time) / 100.0).clamp(0.0, 1.0))
        .unwrap_or(1.0)
}

pub fn build_mask(mask: &Mask, time: f64, config: &EvalConfig) -> MaskGeometry {
    let (resolved, mut source) = resolve_mask_path(mask, time);
    let path = match build_bez_path(&resolved, config) {
        Some(bp) => bp,
        None => {
            debug!(mask = ?mask.name, "mask path has no vertices, using fallback rectangle");
            source = PathSource::Fallback;
            fallback_path(&config.fallback_mask)
        }
    };

    MaskGeometry {
        name: mask.name.clone(),
        path,
        mode: mask.mode,
        inverted: mask.inverted,
        opacity: mask_opacity(mask, time),
        source,
    }
}

/// Geometry for every mask of `clip`, in stacking order.
pub fn build_clip_masks(clip: &Clip, time: f64, config: &EvalConfig) -> Vec<MaskGeometry> {
    let mut masks = Vec::with_capacity(clip.masks.len());
    for mask in &clip.masks {
        if mask.mode == MaskMode::Unknown {
            warn!(clip = %clip.id, mask = ?mask.name, "skipping mask with unrecognized mode");
            continue;
        }
        masks.push(build_mask(mask, time, config));
    }
    masks
}
