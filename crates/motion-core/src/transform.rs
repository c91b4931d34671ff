//! Layer transform composition.

use crate::animatable::evaluate;
use crate::error::EngineError;
use glam::{DMat4, DVec3};
use motion_data::{Clip, ExportDocument};
use serde::Serialize;
use std::collections::HashSet;
use tracing::warn;

pub const ANCHOR_POINT: [&str; 3] = ["X Anchor Point", "Y Anchor Point", "Z Anchor Point"];
pub const POSITION: [&str; 3] = ["X Position", "Y Position", "Z Position"];
pub const SCALE: [&str; 3] = ["X Scale", "Y Scale", "Z Scale"];
pub const ROTATION: [&str; 3] = ["X Rotation", "Y Rotation", "Z Rotation"];
pub const RELATIVE_POSITION: [&str; 3] = [
    "Relative X Position",
    "Relative Y Position",
    "Relative Z Position",
];
pub const RELATIVE_SCALE: [&str; 3] = ["Relative X Scale", "Relative Y Scale", "Relative Z Scale"];
pub const RELATIVE_ROTATION: [&str; 3] = [
    "Relative X Rotation",
    "Relative Y Rotation",
    "Relative Z Rotation",
];

/// 2D layers export their only rotation under this name.
const LEGACY_ROTATION: &str = "Rotation";

/// A clip's local transform at one instant.
///
/// Scale fields are unit multipliers (authored percent / 100). Rotations are
/// in degrees.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Transform {
    pub anchor_point: DVec3,
    pub position: DVec3,
    pub scale: DVec3,
    pub rotation: DVec3,
    pub relative_position: DVec3,
    /// Zero on an axis means no override on that axis.
    pub relative_scale: DVec3,
    pub relative_rotation: DVec3,
}

impl Default for Transform {
    fn default() -> Self {
        Transform {
            anchor_point: DVec3::ZERO,
            position: DVec3::ZERO,
            scale: DVec3::ONE,
            rotation: DVec3::ZERO,
            relative_position: DVec3::ZERO,
            relative_scale: DVec3::ZERO,
            relative_rotation: DVec3::ZERO,
        }
    }
}

fn track(clip: &Clip, name: &str, time: f64) -> Option<f64> {
    clip.property(name).map(|p| evaluate(p, time))
}

fn vector(clip: &Clip, names: [&str; 3], time: f64, default: f64) -> DVec3 {
    let [x, y, z] = names.map(|name| track(clip, name, time).unwrap_or(default));
    DVec3::new(x, y, z)
}

/// Evaluate the transform tracks of `clip` at `time`. Missing tracks take
/// their identity value.
pub fn compose(clip: &Clip, time: f64) -> Transform {
    let mut rotation = vector(clip, ROTATION, time, 0.0);
    if clip.property(ROTATION[2]).is_none() {
        if let Some(z) = track(clip, LEGACY_ROTATION, time) {
            rotation.z = z;
        }
    }

    Transform {
        anchor_point: vector(clip, ANCHOR_POINT, time, 0.0),
        position: vector(clip, POSITION, time, 0.0),
        scale: vector(clip, SCALE, time, 100.0) / 100.0,
        rotation,
        relative_position: vector(clip, RELATIVE_POSITION, time, 0.0),
        relative_scale: vector(clip, RELATIVE_SCALE, time, 0.0) / 100.0,
        relative_rotation: vector(clip, RELATIVE_ROTATION, time, 0.0),
    }
}

impl Transform {
    pub fn effective_position(&self) -> DVec3 {
        self.position + self.relative_position
    }

    pub fn effective_rotation(&self) -> DVec3 {
        self.rotation + self.relative_rotation
    }

    pub fn effective_scale(&self) -> DVec3 {
        let pick = |authored: f64, relative: f64| {
            if relative == 0.0 {
                authored
            } else {
                authored * relative
            }
        };
        DVec3::new(
            pick(self.scale.x, self.relative_scale.x),
            pick(self.scale.y, self.relative_scale.y),
            pick(self.scale.z, self.relative_scale.z),
        )
    }

    /// T(position) * Rx * Ry * Rz * S(scale) * T(-anchor)
    pub fn local_matrix(&self) -> DMat4 {
        let rotation = self.effective_rotation();
        let rx = DMat4::from_rotation_x(rotation.x.to_radians());
        let ry = DMat4::from_rotation_y(rotation.y.to_radians());
        let rz = DMat4::from_rotation_z(rotation.z.to_radians());

        DMat4::from_translation(self.effective_position())
            * rx
            * ry
            * rz
            * DMat4::from_scale(self.effective_scale())
            * DMat4::from_translation(-self.anchor_point)
    }
}

/// `clip` followed by each of its ancestors, nearest first.
///
/// A parent id that names no clip ends the chain with a warning. A chain
/// that revisits a clip is an error.
pub fn parent_chain<'a>(
    doc: &'a ExportDocument,
    clip: &'a Clip,
) -> Result<Vec<&'a Clip>, EngineError> {
    let mut chain = vec![clip];
    let mut visited = HashSet::from([clip.id.as_str()]);
    let mut current = clip;

    while let Some(parent_id) = current.parent_clip.as_deref().filter(|id| !id.is_empty()) {
        if !visited.insert(parent_id) {
            let mut ids: Vec<String> = chain.iter().map(|c| c.id.clone()).collect();
            ids.push(parent_id.to_string());
            return Err(EngineError::ParentCycle {
                clip_id: clip.id.clone(),
                chain: ids,
            });
        }
        match doc.clip(parent_id) {
            Some(parent) => {
                chain.push(parent);
                current = parent;
            }
            None => {
                warn!(clip = %current.id, parent = %parent_id, "parent clip not found, treating as root");
                break;
            }
        }
    }
    Ok(chain)
}

/// Local-to-world matrix of `clip`, nesting every ancestor's frame.
pub fn world_matrix(doc: &ExportDocument, clip: &Clip, time: f64) -> Result<DMat4, EngineError> {
    let chain = parent_chain(doc, clip)?;
    Ok(chain
        .iter()
        .rev()
        .fold(DMat4::IDENTITY, |acc, c| acc * compose(c, time).local_matrix()))
}

/// World-space location of the clip's anchor point.
pub fn world_position(doc: &ExportDocument, clip: &Clip, time: f64) -> Result<DVec3, EngineError> {
    let local = compose(clip, time);
    Ok(world_matrix(doc, clip, time)?.transform_point3(local.anchor_point))
}
