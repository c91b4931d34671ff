use serde::{de::DeserializeOwned, Deserialize, Deserializer, Serialize};
use std::any::type_name;
use tracing::warn;

pub type Point2 = [f64; 2];

#[derive(Debug, Serialize, Deserialize, Clone, Default)]
#[serde(rename_all = "camelCase")]
pub struct ExportDocument {
    #[serde(default)]
    pub version: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub frame_rate: Option<f64>,
    #[serde(default)]
    pub duration: Option<f64>, // seconds
    #[serde(default)]
    pub width: Option<u32>,
    #[serde(default)]
    pub height: Option<u32>,
    #[serde(default, deserialize_with = "deserialize_lenient_vec")]
    pub clips: Vec<Clip>,
}

impl ExportDocument {
    pub fn from_json(data: &str) -> serde_json::Result<Self> {
        serde_json::from_str(data)
    }

    pub fn from_slice(data: &[u8]) -> serde_json::Result<Self> {
        serde_json::from_slice(data)
    }

    pub fn clip(&self, id: &str) -> Option<&Clip> {
        self.clips.iter().find(|c| c.id == id)
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, Default)]
#[serde(rename_all = "camelCase")]
pub struct Clip {
    pub id: String,
    #[serde(default)]
    pub name: Option<String>,
    /// Transform-inheritance parent. Unrelated to `track_matte`.
    #[serde(default)]
    pub parent_clip: Option<String>,
    #[serde(default)]
    pub track_matte: Option<String>, // Renderer-side compositing relation, carried through untouched
    #[serde(default, deserialize_with = "deserialize_lenient_vec")]
    pub properties: Vec<Property>,
    #[serde(default, deserialize_with = "deserialize_lenient_vec")]
    pub masks: Vec<Mask>,
}

impl Clip {
    pub fn property(&self, name: &str) -> Option<&Property> {
        self.properties.iter().find(|p| p.name == name)
    }
}

/// One animated channel. Vector quantities are stored as one `Property` per
/// component ("X Position", "Y Position", ...).
#[derive(Debug, Serialize, Deserialize, Clone, Default)]
#[serde(rename_all = "camelCase")]
#[serde(bound(deserialize = "T: DeserializeOwned + Default"))]
pub struct Property<T = f64> {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub property_index: i32,
    #[serde(default, deserialize_with = "deserialize_or_default")]
    pub value: T,
    #[serde(default, deserialize_with = "deserialize_lenient_vec")]
    pub keyframes: Vec<Keyframe<T>>,
}

impl<T> Property<T> {
    pub fn constant(name: impl Into<String>, value: T) -> Self {
        Property {
            name: name.into(),
            property_index: 0,
            value,
            keyframes: Vec::new(),
        }
    }

    pub fn animated(name: impl Into<String>, value: T, keyframes: Vec<Keyframe<T>>) -> Self {
        Property {
            name: name.into(),
            property_index: 0,
            value,
            keyframes,
        }
    }

    pub fn is_animated(&self) -> bool {
        !self.keyframes.is_empty()
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(bound(deserialize = "T: DeserializeOwned"))]
pub struct Keyframe<T = f64> {
    pub time: f64, // seconds
    pub value: T,
    #[serde(default)]
    pub easing: Easing,
}

impl<T> Keyframe<T> {
    pub fn new(time: f64, value: T, easing: Easing) -> Self {
        Keyframe {
            time,
            value,
            easing,
        }
    }

    pub fn linear(time: f64, value: T) -> Self {
        Self::new(time, value, Easing::uniform(InterpolationType::Linear))
    }

    pub fn hold(time: f64, value: T) -> Self {
        Self::new(time, value, Easing::uniform(InterpolationType::Hold))
    }

    pub fn bezier(time: f64, value: T, in_ease: TemporalEase, out_ease: TemporalEase) -> Self {
        Self::new(
            time,
            value,
            Easing {
                in_ease,
                out_ease,
                ..Easing::uniform(InterpolationType::Bezier)
            },
        )
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, Copy, Default, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Easing {
    #[serde(default)]
    pub in_type: InterpolationType,
    #[serde(default)]
    pub out_type: InterpolationType,
    #[serde(default)]
    pub in_ease: TemporalEase,
    #[serde(default)]
    pub out_ease: TemporalEase,
    // Authoring-time tangent flags, never consulted during evaluation
    #[serde(default)]
    pub continuous: bool,
    #[serde(default)]
    pub auto_bezier: bool,
}

impl Easing {
    pub fn uniform(kind: InterpolationType) -> Self {
        Easing {
            in_type: kind,
            out_type: kind,
            ..Easing::default()
        }
    }
}

/// Speed is in value units per second, influence is a percentage (0..=100)
/// of the segment duration.
#[derive(Debug, Serialize, Deserialize, Clone, Copy, Default, PartialEq)]
pub struct TemporalEase {
    #[serde(default)]
    pub speed: f64,
    #[serde(default)]
    pub influence: f64,
}

impl TemporalEase {
    pub fn new(speed: f64, influence: f64) -> Self {
        TemporalEase { speed, influence }
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, Copy, Default, PartialEq, Eq, Hash)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum InterpolationType {
    #[default]
    Linear,
    Bezier,
    Hold,
    #[serde(other)]
    Unknown,
}

impl InterpolationType {
    pub const CODE_LINEAR: i64 = 6612;
    pub const CODE_BEZIER: i64 = 6613;
    pub const CODE_HOLD: i64 = 6614;

    /// Map the authoring tool's numeric interpolation constant.
    pub fn from_code(code: i64) -> Self {
        match code {
            Self::CODE_LINEAR => InterpolationType::Linear,
            Self::CODE_BEZIER => InterpolationType::Bezier,
            Self::CODE_HOLD => InterpolationType::Hold,
            _ => InterpolationType::Unknown,
        }
    }
}

/// Tangents are offsets relative to the vertex they share an index with.
#[derive(Debug, Serialize, Deserialize, Clone, Default, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct MaskPath {
    #[serde(default)]
    pub vertices: Vec<Point2>,
    #[serde(default)]
    pub in_tangents: Vec<Point2>,
    #[serde(default)]
    pub out_tangents: Vec<Point2>,
    #[serde(default)]
    pub closed: bool,
}

impl MaskPath {
    pub fn polygon(vertices: Vec<Point2>, closed: bool) -> Self {
        MaskPath {
            vertices,
            in_tangents: Vec::new(),
            out_tangents: Vec::new(),
            closed,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.vertices.is_empty()
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, Copy, Default, PartialEq, Eq, Hash)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum MaskMode {
    None,
    #[default]
    Add,
    Subtract,
    Intersect,
    Lighten,
    Darken,
    Difference,
    #[serde(other)]
    Unknown,
}

/// A path keyframe exported without easing metadata; always interpolated
/// linearly.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct RawPathKeyframe {
    pub time: f64,
    pub value: MaskPath,
}

#[derive(Debug, Serialize, Deserialize, Clone, Default)]
#[serde(rename_all = "camelCase")]
pub struct Mask {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub mode: MaskMode,
    #[serde(default)]
    pub inverted: bool,
    #[serde(default, deserialize_with = "deserialize_or_default")]
    pub opacity: Option<Property>, // percent
    /// Keyframed "Mask Path" property. Takes priority over the other sources.
    #[serde(default, deserialize_with = "deserialize_or_default")]
    pub mask_path: Option<Property<MaskPath>>,
    #[serde(default, deserialize_with = "deserialize_lenient_vec")]
    pub path_keyframes: Vec<RawPathKeyframe>,
    /// Unreadable paths load as `None`, which renders as the fallback shape.
    #[serde(default, deserialize_with = "deserialize_or_default")]
    pub path: Option<MaskPath>,
}

/// Keeps every element that parses and skips the rest with a warning, so one
/// malformed entry cannot reject a whole document.
fn deserialize_lenient_vec<'de, D, T>(deserializer: D) -> Result<Vec<T>, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned,
{
    let v = serde_json::Value::deserialize(deserializer)?;
    match v {
        serde_json::Value::Array(items) => Ok(items
            .into_iter()
            .enumerate()
            .filter_map(|(index, item)| match serde_json::from_value(item) {
                Ok(parsed) => Some(parsed),
                Err(err) => {
                    warn!(index, %err, "dropping malformed {}", type_name::<T>());
                    None
                }
            })
            .collect()),
        serde_json::Value::Null => Ok(Vec::new()),
        _ => {
            warn!("expected an array of {}, ignoring", type_name::<T>());
            Ok(Vec::new())
        }
    }
}

/// Parses the field, or falls back to `T::default()` with a warning when the
/// value is unreadable. `null` is read as the default without a warning.
fn deserialize_or_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned + Default,
{
    let v = serde_json::Value::deserialize(deserializer)?;
    if v.is_null() {
        return Ok(T::default());
    }
    match serde_json::from_value(v) {
        Ok(parsed) => Ok(parsed),
        Err(err) => {
            warn!(%err, "unreadable {}, using the default", type_name::<T>());
            Ok(T::default())
        }
    }
}
