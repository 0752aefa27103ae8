use serde::{Deserialize, Serialize};

/// Minimal projection of a comment for the merge worker. Only what the
/// similarity pass needs crosses the concurrency boundary.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MergeItem {
    pub text: String,
    /// `time_seconds` of the source comment; items must be sorted by it.
    pub time: f64,
    /// Index into the caller's comment array.
    pub index: usize,
}

/// One merge request, sent whole to the background worker.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MergeRequest {
    pub items: Vec<MergeItem>,
    /// Similarity threshold, 0-100. Two texts merge when their normalized
    /// edit-distance similarity is at least this.
    pub threshold: u8,
    /// Only comments within this many seconds of each other are candidates.
    pub time_window_seconds: f64,
    /// Disabled requests short-circuit to a `None` response.
    pub enabled: bool,
}

/// Per-survivor merge outcome. `text` is set only where a merge occurred;
/// `None` means "keep the original text". Comments absorbed into an
/// earlier root are omitted entirely.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MergeEdit {
    pub index: usize,
    pub text: Option<String>,
}

/// Worker reply: `None` when merging was disabled or there was nothing to
/// do (the caller keeps its original array), otherwise the surviving
/// comments in source-index order.
pub type MergeResponse = Option<Vec<MergeEdit>>;
