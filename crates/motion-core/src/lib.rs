pub mod animatable;
pub mod cache;
pub mod config;
pub mod ease;
pub mod error;
pub mod extract;
pub mod mask;
pub mod transform;
pub mod validate;

pub use animatable::{evaluate, Animatable, Animator};
pub use cache::MaskGeometryCache;
pub use config::{EvalConfig, FallbackRect};
pub use ease::{solve_ease, EaseSegment, SegmentInterpolation};
pub use error::{EngineError, SourceError};
pub use mask::{build_clip_masks, build_mask, MaskGeometry, PathSource};
pub use transform::{compose, world_matrix, Transform};
pub use validate::{validate_document, IntegrityIssue};

use glam::{DMat4, DVec3};
use motion_data::ExportDocument;
use tracing::debug;

/// Parse an export document.
pub fn load_document(data: &[u8]) -> Result<ExportDocument, EngineError> {
    let doc = ExportDocument::from_slice(data)?;
    debug!(clips = doc.clips.len(), "loaded export document");
    Ok(doc)
}

/// Everything a renderer needs to draw one clip at one instant.
#[derive(Debug, Clone)]
pub struct ClipSample {
    pub clip_id: String,
    pub time: f64,
    pub transform: Transform,
    pub world_matrix: DMat4,
    /// Where the clip's anchor point lands in world space.
    pub world_position: DVec3,
    pub masks: Vec<MaskGeometry>,
}

pub fn sample_clip(
    doc: &ExportDocument,
    clip_id: &str,
    time: f64,
    config: &EvalConfig,
) -> Result<ClipSample, EngineError> {
    let clip = doc.clip(clip_id).ok_or_else(|| EngineError::ClipNotFound {
        clip_id: clip_id.to_string(),
    })?;

    let local = compose(clip, time);
    let world = world_matrix(doc, clip, time)?;

    Ok(ClipSample {
        clip_id: clip.id.clone(),
        time,
        transform: local,
        world_matrix: world,
        world_position: world.transform_point3(local.anchor_point),
        masks: build_clip_masks(clip, time, config),
    })
}

/// Like [`sample_clip`], with mask geometry served from `cache`.
pub fn sample_clip_cached(
    doc: &ExportDocument,
    clip_id: &str,
    time: f64,
    config: &EvalConfig,
    cache: &mut MaskGeometryCache,
) -> Result<ClipSample, EngineError> {
    let clip = doc.clip(clip_id).ok_or_else(|| EngineError::ClipNotFound {
        clip_id: clip_id.to_string(),
    })?;

    let local = compose(clip, time);
    let world = world_matrix(doc, clip, time)?;

    Ok(ClipSample {
        clip_id: clip.id.clone(),
        time,
        transform: local,
        world_matrix: world,
        world_position: world.transform_point3(local.anchor_point),
        masks: cache.get_or_build(clip, time, config).to_vec(),
    })
}
