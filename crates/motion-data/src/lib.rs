//! Interchange schema for exported motion-graphics documents.

pub mod model;

pub use model::{
    Clip, Easing, ExportDocument, InterpolationType, Keyframe, Mask, MaskMode, MaskPath, Point2,
    Property, RawPathKeyframe, TemporalEase,
};
