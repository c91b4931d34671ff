//! Export Document Audit Tests
//!
//! End-to-end checks of evaluation behaviour against JSON export documents.
//! Run with: cargo test -p motion-core --test export_audit

use motion_core::{
    compose, evaluate, sample_clip, EngineError, EvalConfig, MaskGeometryCache, PathSource,
};
use motion_data::{ExportDocument, Property};
use serde_json::json;

/// Test helper to build a single scalar track from (time, value, type) triples
fn track(keys: &[(f64, f64, &str)]) -> Property {
    let keyframes: Vec<serde_json::Value> = keys
        .iter()
        .map(|&(t, v, kind)| {
            json!({
                "time": t,
                "value": v,
                "easing": {
                    "inType": kind,
                    "outType": kind,
                    "inEase": { "speed": 0, "influence": 33.3333 },
                    "outEase": { "speed": 0, "influence": 33.3333 },
                    "continuous": false,
                    "autoBezier": false
                }
            })
        })
        .collect();

    serde_json::from_value(json!({
        "name": "Opacity",
        "propertyIndex": 1,
        "value": 0,
        "keyframes": keyframes
    }))
    .expect("Failed to parse test track")
}

fn document(clips: serde_json::Value) -> ExportDocument {
    serde_json::from_value(json!({
        "version": "1.0",
        "name": "Test",
        "frameRate": 30,
        "duration": 4,
        "width": 1920,
        "height": 1080,
        "clips": clips
    }))
    .expect("Failed to parse test document")
}

/// Evaluation properties of a single track
mod tracks {
    use super::*;

    #[test]
    fn test_boundary_exactness_every_mode() {
        for kind in ["LINEAR", "BEZIER", "HOLD", "UNKNOWN"] {
            let keys = [
                (0.0, 3.7, kind),
                (0.4, -12.25, kind),
                (1.3, 88.125, kind),
                (2.0, 0.1, kind),
            ];
            let t = track(&keys);
            for &(time, value, _) in &keys {
                assert_eq!(evaluate(&t, time), value, "{kind} at {time}");
            }
        }
    }

    #[test]
    fn test_hold_semantics() {
        let t = track(&[(1.0, 5.0, "HOLD"), (2.0, 9.0, "HOLD")]);
        for i in 0..100 {
            let time = 1.0 + i as f64 / 100.0;
            assert_eq!(evaluate(&t, time), 5.0, "at {time}");
        }
        assert_eq!(evaluate(&t, 2.0), 9.0);
    }

    #[test]
    fn test_linear_affinity() {
        let (t0, v0, t1, v1) = (0.5, -20.0, 2.5, 60.0);
        let t = track(&[(t0, v0, "LINEAR"), (t1, v1, "LINEAR")]);
        for i in 0..=20 {
            let f = i as f64 / 20.0;
            let expected = v0 + f * (v1 - v0);
            let got = evaluate(&t, t0 + f * (t1 - t0));
            assert!((got - expected).abs() < 1e-9, "f={f}: {got} vs {expected}");
        }
    }

    #[test]
    fn test_clamped_extrapolation() {
        let t = track(&[(1.0, 10.0, "BEZIER"), (2.0, 20.0, "BEZIER")]);
        assert_eq!(evaluate(&t, -100.0), 10.0);
        assert_eq!(evaluate(&t, 0.999), 10.0);
        assert_eq!(evaluate(&t, 2.001), 20.0);
        assert_eq!(evaluate(&t, 1e9), 20.0);
    }

    #[test]
    fn test_zero_duration_segment_is_finite() {
        for kind in ["LINEAR", "BEZIER", "HOLD"] {
            let t = track(&[(0.0, 0.0, kind), (1.0, 10.0, kind), (1.0, 20.0, kind), (2.0, 30.0, kind)]);
            for i in 0..=40 {
                let v = evaluate(&t, i as f64 / 20.0);
                assert!(v.is_finite(), "{kind} at step {i}");
            }
        }
    }

    #[test]
    fn test_scenario_a_linear() {
        let t = track(&[(0.0, 0.0, "LINEAR"), (1.0, 100.0, "LINEAR")]);
        assert_eq!(evaluate(&t, 0.5), 50.0);
    }

    #[test]
    fn test_scenario_b_hold() {
        let t = track(&[(0.0, 0.0, "HOLD"), (1.0, 100.0, "HOLD")]);
        assert_eq!(evaluate(&t, 0.999), 0.0);
        assert_eq!(evaluate(&t, 1.0), 100.0);
    }

    #[test]
    fn test_unknown_type_string_evaluates_as_bezier() {
        let unknown = track(&[(0.0, 0.0, "CONTINUOUS"), (1.0, 100.0, "CONTINUOUS")]);
        let bezier = track(&[(0.0, 0.0, "BEZIER"), (1.0, 100.0, "BEZIER")]);
        for i in 1..10 {
            let time = i as f64 / 10.0;
            assert_eq!(evaluate(&unknown, time), evaluate(&bezier, time));
        }
    }

    #[test]
    fn test_malformed_keyframe_dropped_at_load() {
        let t: Property = serde_json::from_value(json!({
            "name": "Opacity",
            "value": 0,
            "keyframes": [
                { "time": 0, "value": 0 },
                { "time": "soon", "value": 50 },
                { "time": 1, "value": 100 }
            ]
        }))
        .unwrap();
        assert_eq!(t.keyframes.len(), 2);
        assert_eq!(evaluate(&t, 0.5), 50.0);
    }

    #[test]
    fn test_out_of_order_keys_still_evaluate() {
        let t = track(&[(1.0, 100.0, "LINEAR"), (0.0, 0.0, "LINEAR")]);
        assert_eq!(evaluate(&t, 0.5), 50.0);
    }

    #[test]
    fn test_static_property_returns_value() {
        let t: Property = serde_json::from_value(json!({ "name": "Opacity", "value": 42 })).unwrap();
        assert_eq!(evaluate(&t, 3.0), 42.0);
    }
}

/// Transform composition across the clip hierarchy
mod transforms {
    use super::*;

    #[test]
    fn test_scale_normalization() {
        let doc = document(json!([
            { "id": "a", "properties": [ { "name": "X Scale", "value": 150 } ] }
        ]));
        assert_eq!(compose(&doc.clips[0], 0.0).scale.x, 1.5);
    }

    #[test]
    fn test_scenario_c_parenting() {
        let doc = document(json!([
            { "id": "parent", "properties": [
                { "name": "X Position", "value": 10 },
                { "name": "Y Position", "value": 0 },
                { "name": "Z Position", "value": 0 }
            ]},
            { "id": "child", "parentClip": "parent", "trackMatte": "parent", "properties": [
                { "name": "X Position", "value": 5 },
                { "name": "X Anchor Point", "value": 0 }
            ]}
        ]));
        let sample = sample_clip(&doc, "child", 0.0, &EvalConfig::default()).unwrap();
        assert_eq!(sample.world_position.x, 15.0);
        assert_eq!(sample.transform.position.x, 5.0);
    }

    #[test]
    fn test_parent_cycle_fails_fast() {
        let doc = document(json!([
            { "id": "a", "parentClip": "c" },
            { "id": "b", "parentClip": "a" },
            { "id": "c", "parentClip": "b" }
        ]));
        let err = sample_clip(&doc, "b", 0.0, &EvalConfig::default()).unwrap_err();
        assert!(matches!(err, EngineError::ParentCycle { .. }));
    }

    #[test]
    fn test_unknown_clip() {
        let doc = document(json!([]));
        let err = sample_clip(&doc, "missing", 0.0, &EvalConfig::default()).unwrap_err();
        assert!(matches!(err, EngineError::ClipNotFound { .. }));
    }

    #[test]
    fn test_animated_parent_moves_child() {
        let doc = document(json!([
            { "id": "parent", "properties": [
                { "name": "Y Position", "value": 0, "keyframes": [
                    { "time": 0, "value": 0 },
                    { "time": 2, "value": 200 }
                ]}
            ]},
            { "id": "child", "parentClip": "parent", "properties": [
                { "name": "Y Position", "value": 7 }
            ]}
        ]));
        let sample = sample_clip(&doc, "child", 1.0, &EvalConfig::default()).unwrap();
        assert_eq!(sample.world_position.y, 107.0);
    }
}

/// Mask geometry
mod masks {
    use super::*;
    use kurbo::{PathEl, Point};

    #[test]
    fn test_scenario_d_rectangle() {
        let doc = document(json!([
            { "id": "solid", "masks": [ { "path": {
                "vertices": [[0, 0], [100, 0], [100, 100], [0, 100]],
                "inTangents": [],
                "outTangents": [],
                "closed": true
            }}]}
        ]));
        let sample = sample_clip(&doc, "solid", 0.0, &EvalConfig::default()).unwrap();
        let els = sample.masks[0].path.elements();

        assert_eq!(els[0], PathEl::MoveTo(Point::new(0.0, 0.0)));
        let lines = els.iter().filter(|e| matches!(e, PathEl::LineTo(_))).count();
        assert_eq!(lines, 4);
        assert_eq!(els.last(), Some(&PathEl::ClosePath));
        assert!(!els.iter().any(|e| matches!(e, PathEl::CurveTo(..))));
    }

    #[test]
    fn test_keyframed_mask_path_per_coordinate() {
        let doc = document(json!([
            { "id": "solid", "masks": [ { "maskPath": {
                "name": "Mask Path",
                "value": { "vertices": [] },
                "keyframes": [
                    { "time": 0, "value": { "vertices": [[0, 0], [10, 0]], "closed": false } },
                    { "time": 1, "value": { "vertices": [[0, 0], [10, 40]], "closed": false },
                      "easing": { "inType": "HOLD", "outType": "HOLD" } }
                ]
            }}]}
        ]));
        let config = EvalConfig::default();
        let mid = sample_clip(&doc, "solid", 0.5, &config).unwrap();
        assert_eq!(mid.masks[0].source, PathSource::Keyframed);
        // Start key is linear out, end key is hold in: the segment holds
        assert_eq!(mid.masks[0].path.elements()[1], PathEl::LineTo(Point::new(10.0, 0.0)));

        let end = sample_clip(&doc, "solid", 1.0, &config).unwrap();
        assert_eq!(end.masks[0].path.elements()[1], PathEl::LineTo(Point::new(10.0, 40.0)));
    }

    #[test]
    fn test_empty_path_falls_back() {
        let doc = document(json!([
            { "id": "solid", "masks": [ { "mode": "ADD", "path": { "vertices": [] } } ] }
        ]));
        let config = EvalConfig::from_json(
            r#"{ "fallbackMask": { "x": 0, "y": 0, "width": 10, "height": 20 } }"#,
        )
        .unwrap();
        let sample = sample_clip(&doc, "solid", 0.0, &config).unwrap();
        let mask = &sample.masks[0];
        assert!(mask.is_fallback());
        assert!(mask.path.elements().contains(&PathEl::LineTo(Point::new(10.0, 20.0))));
    }

    #[test]
    fn test_cache_serves_same_geometry() {
        let doc = document(json!([
            { "id": "solid", "masks": [ { "path": {
                "vertices": [[0, 0], [5, 0], [5, 5]],
                "closed": true
            }}]}
        ]));
        let config = EvalConfig::default();
        let mut cache = MaskGeometryCache::new();
        let first = motion_core::sample_clip_cached(&doc, "solid", 0.0, &config, &mut cache).unwrap();
        let second = motion_core::sample_clip_cached(&doc, "solid", 0.0, &config, &mut cache).unwrap();
        assert_eq!(cache.len(), 1);
        assert_eq!(first.masks[0].path.elements(), second.masks[0].path.elements());
    }
    #[test]
    fn test_malformed_mask_path_falls_back_without_failing_the_document() {
        let data = serde_json::to_vec(&json!({
            "name": "Test",
            "frameRate": 30,
            "clips": [
                { "id": "good", "properties": [
                    { "name": "X Position", "value": 12 },
                    { "name": "Opacity", "value": null }
                ], "masks": [ { "path": {
                    "vertices": [[0, 0], [10, 0], [10, 10]],
                    "closed": true
                }}]},
                { "id": "bad", "masks": [
                    { "name": "Broken", "mode": "SUBTRACT", "path": { "vertices": "garbage" } }
                ]}
            ]
        }))
        .unwrap();

        let doc = motion_core::load_document(&data).unwrap();
        let config = EvalConfig::default();

        let good = sample_clip(&doc, "good", 0.0, &config).unwrap();
        assert_eq!(good.transform.position.x, 12.0);
        assert_eq!(good.masks[0].source, PathSource::Static);
        assert_eq!(good.masks[0].path.elements()[0], PathEl::MoveTo(Point::new(0.0, 0.0)));

        let bad = sample_clip(&doc, "bad", 0.0, &config).unwrap();
        assert_eq!(bad.masks.len(), 1);
        assert_eq!(bad.masks[0].name.as_deref(), Some("Broken"));
        assert_eq!(bad.masks[0].source, PathSource::Fallback);
        assert!(!bad.masks[0].path.elements().is_empty());
    }
}
