//! Batch sampling of clips over time.

use anyhow::{bail, Result};
use motion_core::{
    sample_clip, ClipSample, EngineError, EvalConfig, MaskGeometry, PathSource, Transform,
};
use motion_data::{ExportDocument, MaskMode};
use rayon::prelude::*;
use serde::Serialize;
use tracing::warn;

const DEFAULT_FPS: f64 = 30.0;
const MAX_SAMPLES: usize = 1_000_000;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MaskRecord {
    pub name: Option<String>,
    pub mode: MaskMode,
    pub inverted: bool,
    pub opacity: f64,
    pub source: PathSource,
    /// SVG path data.
    pub path: String,
}

impl From<&MaskGeometry> for MaskRecord {
    fn from(geom: &MaskGeometry) -> Self {
        MaskRecord {
            name: geom.name.clone(),
            mode: geom.mode,
            inverted: geom.inverted,
            opacity: geom.opacity,
            source: geom.source,
            path: geom.path.to_svg(),
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SampleRecord {
    pub clip_id: String,
    pub time: f64,
    pub transform: Transform,
    /// Column-major.
    pub world_matrix: [f64; 16],
    pub world_position: [f64; 3],
    pub masks: Vec<MaskRecord>,
}

impl From<ClipSample> for SampleRecord {
    fn from(sample: ClipSample) -> Self {
        SampleRecord {
            masks: sample.masks.iter().map(MaskRecord::from).collect(),
            clip_id: sample.clip_id,
            time: sample.time,
            transform: sample.transform,
            world_matrix: sample.world_matrix.to_cols_array(),
            world_position: sample.world_position.to_array(),
        }
    }
}

/// Explicit times win. Otherwise sample `start..=end` at `fps`, or just
/// `start` when there is no end.
pub fn sample_times(
    explicit: &[f64],
    start: f64,
    end: Option<f64>,
    fps: Option<f64>,
) -> Result<Vec<f64>> {
    if !explicit.is_empty() {
        return Ok(explicit.to_vec());
    }
    let Some(end) = end else {
        return Ok(vec![start]);
    };

    let fps = fps.unwrap_or(DEFAULT_FPS);
    if !(fps > 0.0) || !fps.is_finite() {
        bail!("frame rate must be positive, got {fps}");
    }
    if !start.is_finite() || !end.is_finite() {
        bail!("range bounds must be finite, got {start}..={end}");
    }
    if !(end >= start) {
        bail!("range end {end} is before start {start}");
    }

    let span = (end - start) * fps;
    if !(span < MAX_SAMPLES as f64) {
        bail!("range {start}..={end} at {fps} fps exceeds {MAX_SAMPLES} samples");
    }

    // Small slack so an end time on a frame boundary is not lost to rounding
    let frames = (span + 1e-9).floor() as usize;
    Ok((0..=frames).map(|i| start + i as f64 / fps).collect())
}

/// Sample every requested clip at every time. Output is clip-major and in
/// request order; evaluation runs in parallel.
///
/// Clips caught in a parent cycle are skipped with a warning. Any other
/// failure, such as an unknown clip id, aborts the batch.
pub fn sample_document(
    doc: &ExportDocument,
    clip_ids: &[String],
    times: &[f64],
    config: &EvalConfig,
) -> Result<Vec<SampleRecord>> {
    let ids: Vec<&str> = if clip_ids.is_empty() {
        doc.clips.iter().map(|c| c.id.as_str()).collect()
    } else {
        clip_ids.iter().map(String::as_str).collect()
    };

    let jobs: Vec<(&str, f64)> = ids
        .iter()
        .flat_map(|id| times.iter().map(move |&t| (*id, t)))
        .collect();

    let records = jobs
        .par_iter()
        .map(|&(id, time)| match sample_clip(doc, id, time, config) {
            Ok(sample) => Ok(Some(SampleRecord::from(sample))),
            Err(err @ EngineError::ParentCycle { .. }) => {
                warn!(clip = %id, time, %err, "skipping clip");
                Ok(None)
            }
            Err(err) => Err(err),
        })
        .collect::<Result<Vec<_>, _>>()?;
    Ok(records.into_iter().flatten().collect())
}
