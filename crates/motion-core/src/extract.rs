//! Authoring-side keyframe extraction.
//!
//! The authoring tool's object model is reached through [`SourceProperty`]
//! and [`SourceLayer`]; the functions here turn it into the interchange
//! schema. Key indices are zero-based.

use crate::error::SourceError;
use motion_data::{
    Clip, Easing, ExportDocument, InterpolationType, Keyframe, Mask, MaskMode, MaskPath,
    Property, TemporalEase,
};
use std::collections::HashSet;
use tracing::{debug, warn};

/// A property value as read from the authoring tool, classified once.
#[derive(Debug, Clone, PartialEq)]
pub enum SourceValue {
    Scalar(f64),
    Vector(Vec<f64>),
    Path(MaskPath),
}

impl SourceValue {
    fn component(&self, component: usize) -> Result<f64, SourceError> {
        match self {
            SourceValue::Scalar(v) => Ok(*v),
            SourceValue::Vector(values) => {
                values
                    .get(component)
                    .copied()
                    .ok_or(SourceError::MissingComponent {
                        component,
                        len: values.len(),
                    })
            }
            SourceValue::Path(_) => Err(SourceError::WrongKind { expected: "numeric" }),
        }
    }

    fn into_path(self) -> Result<MaskPath, SourceError> {
        match self {
            SourceValue::Path(p) => Ok(p),
            _ => Err(SourceError::WrongKind { expected: "path" }),
        }
    }
}

pub trait SourceProperty {
    fn name(&self) -> &str;
    fn property_index(&self) -> i32 {
        0
    }
    fn num_keys(&self) -> usize;
    /// Current (unkeyed) value.
    fn value(&self) -> Result<SourceValue, SourceError>;
    fn key_time(&self, key: usize) -> Result<f64, SourceError>;
    fn key_value(&self, key: usize) -> Result<SourceValue, SourceError>;
    /// Numeric interpolation constant (6612 linear, 6613 bezier, 6614 hold).
    fn key_in_interpolation(&self, key: usize) -> Result<i64, SourceError>;
    fn key_out_interpolation(&self, key: usize) -> Result<i64, SourceError>;
    /// One ease per value dimension; spatial properties report a single one.
    fn key_in_temporal_ease(&self, key: usize) -> Result<Vec<TemporalEase>, SourceError>;
    fn key_out_temporal_ease(&self, key: usize) -> Result<Vec<TemporalEase>, SourceError>;
    fn key_temporal_continuous(&self, key: usize) -> Result<bool, SourceError>;
    fn key_temporal_auto_bezier(&self, key: usize) -> Result<bool, SourceError>;
}

pub struct SourceMask<'a> {
    pub name: Option<String>,
    pub mode: MaskMode,
    pub inverted: bool,
    pub path: &'a dyn SourceProperty,
    pub opacity: Option<&'a dyn SourceProperty>,
}

pub trait SourceLayer {
    fn id(&self) -> String;
    fn name(&self) -> Option<String> {
        None
    }
    fn parent_id(&self) -> Option<String> {
        None
    }
    fn track_matte_id(&self) -> Option<String> {
        None
    }
    fn properties(&self) -> Vec<&dyn SourceProperty>;
    fn masks(&self) -> Vec<SourceMask<'_>> {
        Vec::new()
    }
    /// Layers of a nested composition this layer sources from.
    fn children(&self) -> Vec<&dyn SourceLayer> {
        Vec::new()
    }
}

/// Names of the scalar tracks a property is split into.
///
/// Transform vectors become "X Position", "Y Position", ...; a bare
/// "Rotation" is the Z rotation of a 2D layer.
pub fn component_names(name: &str, dimensions: usize) -> Vec<String> {
    const AXES: [&str; 3] = ["X", "Y", "Z"];
    match name {
        "Rotation" => vec!["Z Rotation".to_string()],
        _ if dimensions <= 1 => vec![name.to_string()],
        _ if dimensions <= AXES.len() => AXES[..dimensions]
            .iter()
            .map(|axis| format!("{axis} {name}"))
            .collect(),
        _ => (0..dimensions).map(|i| format!("{name} [{i}]")).collect(),
    }
}

fn pick_ease(eases: Vec<TemporalEase>, component: usize, key: usize) -> Result<TemporalEase, SourceError> {
    eases
        .get(component)
        .or_else(|| eases.first())
        .copied()
        .ok_or(SourceError::Unreadable {
            field: "temporal ease",
            key,
        })
}

fn read_easing(src: &dyn SourceProperty, key: usize, component: usize) -> Result<Easing, SourceError> {
    Ok(Easing {
        in_type: InterpolationType::from_code(src.key_in_interpolation(key)?),
        out_type: InterpolationType::from_code(src.key_out_interpolation(key)?),
        in_ease: pick_ease(src.key_in_temporal_ease(key)?, component, key)?,
        out_ease: pick_ease(src.key_out_temporal_ease(key)?, component, key)?,
        continuous: src.key_temporal_continuous(key)?,
        auto_bezier: src.key_temporal_auto_bezier(key)?,
    })
}

/// Read one keyframe of one component. Any failed field fails the record.
pub fn extract_key(
    src: &dyn SourceProperty,
    key: usize,
    component: usize,
) -> Result<Keyframe, SourceError> {
    let count = src.num_keys();
    if key >= count {
        return Err(SourceError::KeyOutOfRange { key, count });
    }
    Ok(Keyframe {
        time: src.key_time(key)?,
        value: src.key_value(key)?.component(component)?,
        easing: read_easing(src, key, component)?,
    })
}

/// Extract one scalar component of `src` as a track named `name`.
///
/// Keyframes that cannot be read completely are dropped; the rest of the
/// track is kept.
pub fn extract_scalar(src: &dyn SourceProperty, component: usize, name: &str) -> Property {
    let value = match src.value().and_then(|v| v.component(component)) {
        Ok(v) => v,
        Err(err) => {
            warn!(property = %name, %err, "unreadable current value, using 0");
            0.0
        }
    };

    let keyframes = (0..src.num_keys())
        .filter_map(|key| match extract_key(src, key, component) {
            Ok(kf) => Some(kf),
            Err(err) => {
                warn!(property = %name, key, %err, "dropping unreadable keyframe");
                None
            }
        })
        .collect();

    Property {
        name: name.to_string(),
        property_index: src.property_index(),
        value,
        keyframes,
    }
}

/// Split `src` into one scalar track per component. Path-valued or
/// unreadable properties yield nothing.
pub fn extract_property(src: &dyn SourceProperty) -> Vec<Property> {
    let dimensions = match src.value() {
        Ok(SourceValue::Scalar(_)) => 1,
        Ok(SourceValue::Vector(values)) => values.len(),
        Ok(SourceValue::Path(_)) => return Vec::new(),
        Err(err) => {
            warn!(property = %src.name(), %err, "skipping unreadable property");
            return Vec::new();
        }
    };

    component_names(src.name(), dimensions)
        .iter()
        .enumerate()
        .map(|(component, name)| extract_scalar(src, component, name))
        .collect()
}

fn extract_path_key(src: &dyn SourceProperty, key: usize) -> Result<Keyframe<MaskPath>, SourceError> {
    Ok(Keyframe {
        time: src.key_time(key)?,
        value: src.key_value(key)?.into_path()?,
        easing: read_easing(src, key, 0)?,
    })
}

/// Extract a path-valued property such as "Mask Path".
pub fn extract_path(src: &dyn SourceProperty) -> Property<MaskPath> {
    let value = src
        .value()
        .and_then(SourceValue::into_path)
        .unwrap_or_else(|err| {
            warn!(property = %src.name(), %err, "unreadable path value, using an empty path");
            MaskPath::default()
        });

    let keyframes = (0..src.num_keys())
        .filter_map(|key| match extract_path_key(src, key) {
            Ok(kf) => Some(kf),
            Err(err) => {
                warn!(property = %src.name(), key, %err, "dropping unreadable path keyframe");
                None
            }
        })
        .collect();

    Property {
        name: src.name().to_string(),
        property_index: src.property_index(),
        value,
        keyframes,
    }
}

/// Collects clips across a recursive project walk.
#[derive(Debug, Default)]
pub struct ExportAccumulator {
    clips: Vec<Clip>,
    seen: HashSet<String>,
    dropped_keyframes: usize,
}

impl ExportAccumulator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns false (and keeps the first) when the id was already recorded.
    pub fn push_clip(&mut self, clip: Clip) -> bool {
        if !self.seen.insert(clip.id.clone()) {
            warn!(clip = %clip.id, "duplicate clip id, keeping the first occurrence");
            return false;
        }
        self.clips.push(clip);
        true
    }

    pub fn clips(&self) -> &[Clip] {
        &self.clips
    }

    pub fn dropped_keyframes(&self) -> usize {
        self.dropped_keyframes
    }

    pub fn finish(self, name: Option<String>) -> ExportDocument {
        ExportDocument {
            name,
            clips: self.clips,
            ..ExportDocument::default()
        }
    }
}

fn extract_mask(mask: &SourceMask<'_>) -> (Mask, usize) {
    let path = extract_path(mask.path);
    let mut dropped = mask.path.num_keys().saturating_sub(path.keyframes.len());

    let opacity = mask.opacity.map(|src| {
        let prop = extract_scalar(src, 0, src.name());
        dropped += src.num_keys().saturating_sub(prop.keyframes.len());
        prop
    });

    let mask = Mask {
        name: mask.name.clone(),
        mode: mask.mode,
        inverted: mask.inverted,
        opacity,
        mask_path: Some(path),
        ..Mask::default()
    };
    (mask, dropped)
}

/// Extract `layer` and, depth first, every layer nested beneath it.
pub fn extract_layer(layer: &dyn SourceLayer, acc: &mut ExportAccumulator) {
    let id = layer.id();
    debug!(clip = %id, "extracting layer");

    let mut properties = Vec::new();
    for src in layer.properties() {
        let extracted = extract_property(src);
        let kept: usize = extracted.iter().map(|p| p.keyframes.len()).sum();
        let expected = src.num_keys() * extracted.len();
        acc.dropped_keyframes += expected.saturating_sub(kept);
        properties.extend(extracted);
    }

    let mut masks = Vec::new();
    for source_mask in layer.masks() {
        let (mask, dropped) = extract_mask(&source_mask);
        acc.dropped_keyframes += dropped;
        masks.push(mask);
    }

    acc.push_clip(Clip {
        id,
        name: layer.name(),
        parent_clip: layer.parent_id(),
        track_matte: layer.track_matte_id(),
        properties,
        masks,
    });

    for child in layer.children() {
        extract_layer(child, acc);
    }
}

/// Extract a whole project from its top-level layers.
pub fn extract_project(name: Option<String>, layers: &[&dyn SourceLayer]) -> ExportDocument {
    let mut acc = ExportAccumulator::new();
    for layer in layers {
        extract_layer(*layer, &mut acc);
    }
    if acc.dropped_keyframes() > 0 {
        warn!(
            dropped = acc.dropped_keyframes(),
            "some keyframes could not be read and were left out"
        );
    }
    acc.finish(name)
}
