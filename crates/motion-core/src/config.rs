use serde::{Deserialize, Serialize};

/// Rectangle drawn in place of a mask whose path resolved to no vertices.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FallbackRect {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl Default for FallbackRect {
    fn default() -> Self {
        FallbackRect {
            x: 0.0,
            y: 0.0,
            width: 100.0,
            height: 100.0,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct EvalConfig {
    pub fallback_mask: FallbackRect,
    /// Tangent offsets with both components at or below this magnitude are
    /// treated as absent.
    pub tangent_epsilon: f64,
}

impl Default for EvalConfig {
    fn default() -> Self {
        EvalConfig {
            fallback_mask: FallbackRect::default(),
            tangent_epsilon: 1e-9,
        }
    }
}

impl EvalConfig {
    pub fn from_json(data: &str) -> serde_json::Result<Self> {
        serde_json::from_str(data)
    }
}
