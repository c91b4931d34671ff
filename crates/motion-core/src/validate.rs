//! Document integrity checks that run without evaluating anything.

use crate::animatable::is_time_ordered;
use crate::error::EngineError;
use crate::transform::parent_chain;
use motion_data::ExportDocument;
use serde::Serialize;
use std::collections::HashSet;
use std::fmt;

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum IntegrityIssue {
    DuplicateClip { clip_id: String },
    UnorderedKeyframes { clip_id: String, property: String },
    UnorderedMaskPath { clip_id: String, mask: usize },
    MissingParent { clip_id: String, parent_id: String },
    ParentCycle { clip_id: String, chain: Vec<String> },
}

impl fmt::Display for IntegrityIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            IntegrityIssue::DuplicateClip { clip_id } => {
                write!(f, "clip id {clip_id} is used more than once")
            }
            IntegrityIssue::UnorderedKeyframes { clip_id, property } => {
                write!(f, "{clip_id}: keyframes of \"{property}\" are out of time order")
            }
            IntegrityIssue::UnorderedMaskPath { clip_id, mask } => {
                write!(f, "{clip_id}: path keyframes of mask {mask} are out of time order")
            }
            IntegrityIssue::MissingParent { clip_id, parent_id } => {
                write!(f, "{clip_id}: parent clip {parent_id} does not exist")
            }
            IntegrityIssue::ParentCycle { chain, .. } => {
                write!(f, "parent cycle: {}", chain.join(" -> "))
            }
        }
    }
}

/// Every integrity problem in `doc`, in clip order.
pub fn validate_document(doc: &ExportDocument) -> Vec<IntegrityIssue> {
    let mut issues = Vec::new();
    let mut seen = HashSet::new();

    for clip in &doc.clips {
        if !seen.insert(clip.id.as_str()) {
            issues.push(IntegrityIssue::DuplicateClip {
                clip_id: clip.id.clone(),
            });
        }

        for prop in &clip.properties {
            if !is_time_ordered(&prop.keyframes) {
                issues.push(IntegrityIssue::UnorderedKeyframes {
                    clip_id: clip.id.clone(),
                    property: prop.name.clone(),
                });
            }
        }

        for (index, mask) in clip.masks.iter().enumerate() {
            let keyed_unordered = mask
                .mask_path
                .as_ref()
                .is_some_and(|p| !is_time_ordered(&p.keyframes));
            if keyed_unordered || !is_time_ordered(&mask.path_keyframes) {
                issues.push(IntegrityIssue::UnorderedMaskPath {
                    clip_id: clip.id.clone(),
                    mask: index,
                });
            }
        }

        if let Some(parent_id) = clip.parent_clip.as_deref().filter(|id| !id.is_empty()) {
            if doc.clip(parent_id).is_none() {
                issues.push(IntegrityIssue::MissingParent {
                    clip_id: clip.id.clone(),
                    parent_id: parent_id.to_string(),
                });
            }
        }

        if let Err(EngineError::ParentCycle { clip_id, chain }) = parent_chain(doc, clip) {
            issues.push(IntegrityIssue::ParentCycle { clip_id, chain });
        }
    }
    issues
}
