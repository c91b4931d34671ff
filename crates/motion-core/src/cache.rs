//! Memoized mask geometry.
//!
//! The engine itself holds no state. A renderer that samples the same clip
//! at the same time repeatedly owns one of these and decides when to drop it.

use crate::config::EvalConfig;
use crate::mask::{build_clip_masks, MaskGeometry};
use motion_data::{Clip, Easing, Keyframe, Mask, MaskPath, Property, TemporalEase};
use std::collections::hash_map::DefaultHasher;
use std::collections::HashMap;
use std::hash::{Hash, Hasher};

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
struct CacheKey {
    clip_id: String,
    masks: u64,
    time: u64,
}

#[derive(Debug, Default)]
pub struct MaskGeometryCache {
    entries: HashMap<CacheKey, Vec<MaskGeometry>>,
    limit: Option<usize>,
}

impl MaskGeometryCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// A cache that empties itself once it holds `limit` entries.
    pub fn with_limit(limit: usize) -> Self {
        Self {
            entries: HashMap::new(),
            limit: Some(limit),
        }
    }

    /// Geometry for every mask of `clip` at `time`, built on first request.
    ///
    /// Editing a clip's masks changes its fingerprint, so stale entries are
    /// never returned; they are only reclaimed by `invalidate_clip` or `clear`.
    pub fn get_or_build(&mut self, clip: &Clip, time: f64, config: &EvalConfig) -> &[MaskGeometry] {
        let key = CacheKey {
            clip_id: clip.id.clone(),
            masks: fingerprint(&clip.masks, config),
            time: time.to_bits(),
        };

        if let Some(limit) = self.limit {
            if self.entries.len() >= limit && !self.entries.contains_key(&key) {
                self.entries.clear();
            }
        }

        self.entries
            .entry(key)
            .or_insert_with(|| build_clip_masks(clip, time, config))
    }

    /// Drop every entry belonging to `clip_id`.
    pub fn invalidate_clip(&mut self, clip_id: &str) {
        self.entries.retain(|key, _| key.clip_id != clip_id);
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Identity of a mask set together with the config it is built under.
pub fn fingerprint(masks: &[Mask], config: &EvalConfig) -> u64 {
    let mut hasher = DefaultHasher::new();
    config.tangent_epsilon.to_bits().hash(&mut hasher);
    let rect = config.fallback_mask;
    for v in [rect.x, rect.y, rect.width, rect.height] {
        v.to_bits().hash(&mut hasher);
    }

    masks.len().hash(&mut hasher);
    for mask in masks {
        mask.name.hash(&mut hasher);
        mask.mode.hash(&mut hasher);
        mask.inverted.hash(&mut hasher);

        mask.opacity.is_some().hash(&mut hasher);
        if let Some(opacity) = &mask.opacity {
            hash_property(opacity, &mut hasher, |v, h| v.to_bits().hash(h));
        }
        mask.mask_path.is_some().hash(&mut hasher);
        if let Some(path) = &mask.mask_path {
            hash_property(path, &mut hasher, hash_path);
        }
        mask.path_keyframes.len().hash(&mut hasher);
        for key in &mask.path_keyframes {
            key.time.to_bits().hash(&mut hasher);
            hash_path(&key.value, &mut hasher);
        }
        mask.path.is_some().hash(&mut hasher);
        if let Some(path) = &mask.path {
            hash_path(path, &mut hasher);
        }
    }
    hasher.finish()
}

fn hash_points(points: &[[f64; 2]], hasher: &mut DefaultHasher) {
    points.len().hash(hasher);
    for p in points {
        p[0].to_bits().hash(hasher);
        p[1].to_bits().hash(hasher);
    }
}

fn hash_path(path: &MaskPath, hasher: &mut DefaultHasher) {
    path.closed.hash(hasher);
    hash_points(&path.vertices, hasher);
    hash_points(&path.in_tangents, hasher);
    hash_points(&path.out_tangents, hasher);
}

fn hash_ease(ease: &TemporalEase, hasher: &mut DefaultHasher) {
    ease.speed.to_bits().hash(hasher);
    ease.influence.to_bits().hash(hasher);
}

fn hash_easing(easing: &Easing, hasher: &mut DefaultHasher) {
    easing.in_type.hash(hasher);
    easing.out_type.hash(hasher);
    hash_ease(&easing.in_ease, hasher);
    hash_ease(&easing.out_ease, hasher);
}

fn hash_property<T>(
    prop: &Property<T>,
    hasher: &mut DefaultHasher,
    hash_value: fn(&T, &mut DefaultHasher),
) {
    hash_value(&prop.value, hasher);
    prop.keyframes.len().hash(hasher);
    for Keyframe { time, value, easing } in &prop.keyframes {
        time.to_bits().hash(hasher);
        hash_value(value, hasher);
        hash_easing(easing, hasher);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn clip(id: &str, size: f64) -> Clip {
        Clip {
            id: id.to_string(),
            masks: vec![Mask {
                path: Some(MaskPath::polygon(
                    vec![[0.0, 0.0], [size, 0.0], [size, size]],
                    true,
                )),
                ..Mask::default()
            }],
            ..Clip::default()
        }
    }

    #[test]
    fn test_repeat_lookup_hits() {
        let mut cache = MaskGeometryCache::new();
        let config = EvalConfig::default();
        let c = clip("a", 10.0);

        assert_eq!(cache.get_or_build(&c, 0.5, &config).len(), 1);
        assert_eq!(cache.len(), 1);
        cache.get_or_build(&c, 0.5, &config);
        assert_eq!(cache.len(), 1);

        cache.get_or_build(&c, 0.75, &config);
        assert_eq!(cache.len(), 2);
    }

    #[test]
    fn test_edited_masks_miss() {
        let mut cache = MaskGeometryCache::new();
        let config = EvalConfig::default();
        cache.get_or_build(&clip("a", 10.0), 0.0, &config);
        let rebuilt = cache.get_or_build(&clip("a", 20.0), 0.0, &config);
        assert_eq!(rebuilt[0].path.elements()[1], kurbo::PathEl::LineTo((20.0, 0.0).into()));
        assert_eq!(cache.len(), 2);
    }

    #[test]
    fn test_config_is_part_of_the_key() {
        let masks = clip("a", 10.0).masks;
        let mut other = EvalConfig::default();
        other.fallback_mask.width = 5.0;
        assert_ne!(
            fingerprint(&masks, &EvalConfig::default()),
            fingerprint(&masks, &other)
        );
        assert_eq!(
            fingerprint(&masks, &EvalConfig::default()),
            fingerprint(&masks, &EvalConfig::default())
        );
    }

    #[test]
    fn test_invalidate_and_clear() {
        let mut cache = MaskGeometryCache::new();
        let config = EvalConfig::default();
        cache.get_or_build(&clip("a", 1.0), 0.0, &config);
        cache.get_or_build(&clip("b", 1.0), 0.0, &config);
        cache.get_or_build(&clip("b", 1.0), 1.0, &config);

        cache.invalidate_clip("b");
        assert_eq!(cache.len(), 1);
        cache.clear();
        assert!(cache.is_empty());
    }

    #[test]
    fn test_limit_empties_cache() {
        let mut cache = MaskGeometryCache::with_limit(2);
        let config = EvalConfig::default();
        let c = clip("a", 1.0);
        cache.get_or_build(&c, 0.0, &config);
        cache.get_or_build(&c, 1.0, &config);
        assert_eq!(cache.len(), 2);
        // Hit does not evict
        cache.get_or_build(&c, 1.0, &config);
        assert_eq!(cache.len(), 2);
        cache.get_or_build(&c, 2.0, &config);
        assert_eq!(cache.len(), 1);
    }
}
