use thiserror::Error;

/// Errors surfaced by whole-document operations. Data problems that still
/// allow a best-effort answer are logged instead.
#[derive(Error, Debug)]
pub enum EngineError {
    #[error("parent chain of clip {clip_id} loops back on itself: {}", chain.join(" -> "))]
    ParentCycle { clip_id: String, chain: Vec<String> },

    #[error("clip not found: {clip_id}")]
    ClipNotFound { clip_id: String },

    #[error("invalid export document: {0}")]
    Document(#[from] serde_json::Error),
}

/// A single field read that failed on the authoring side.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum SourceError {
    #[error("key {key} out of range ({count} keys)")]
    KeyOutOfRange { key: usize, count: usize },

    #[error("could not read {field} of key {key}")]
    Unreadable { field: &'static str, key: usize },

    #[error("component {component} missing from a {len}-component value")]
    MissingComponent { component: usize, len: usize },

    #[error("expected a {expected} value")]
    WrongKind { expected: &'static str },
}
