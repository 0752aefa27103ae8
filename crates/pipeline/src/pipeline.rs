use crate::session::{SessionController, SessionToken};
use anyhow::Context;
use async_trait::async_trait;
use danmaku_feed::{normalize, plan_auto_filter, run_chain};
use danmaku_layout::LayoutOptions;
use danmaku_merge::MergeWorker;
use danmaku_protocol::{
    AutoFilterOverride, Comment, MergeEdit, MergeItem, MergeRequest, RawComment, Settings,
    SettingsError,
};
use once_cell::sync::OnceCell;
use std::sync::{Arc, Mutex};

/// Fetches the raw comment feed for a media reference. Owned by the
/// episode-matching/search subsystem; may query multiple ranked sources
/// with fallback. Implementations should abort outstanding requests for
/// superseded sessions when they can, but correctness never depends on
/// that abort succeeding.
#[async_trait]
pub trait CommentSource: Send + Sync {
    async fn fetch_raw(&self, media_reference: &str) -> anyhow::Result<Vec<RawComment>>;
}

/// Receives the final comment array. Owns the canvas/DOM and playback
/// clock sync; this core makes no paint calls.
pub trait RenderSink: Send + Sync {
    fn handoff(&self, comments: Vec<Comment>);
}

/// What happened to one load attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadOutcome {
    /// The renderer received this many comments.
    Delivered(usize),
    /// A newer load superseded this one; output was discarded silently.
    Superseded,
    /// The pipeline ran to completion but nothing survived filtering.
    NoComments,
}

/// Geometry of the video container at load time.
#[derive(Debug, Clone, Copy)]
pub struct ContainerGeometry {
    pub width: f32,
    pub height: f32,
}

/// The full load pipeline: fetch → normalize → filter chain → similarity
/// merge (off-thread) → lane scheduling → renderer handoff, with a
/// session-token re-check at every async boundary.
pub struct DanmakuPipeline {
    controller: SessionController,
    settings: Mutex<Settings>,
    auto_override: Mutex<Option<AutoFilterOverride>>,
    source: Arc<dyn CommentSource>,
    sink: Arc<dyn RenderSink>,
    // Spawned lazily on the first load so construction needs no runtime;
    // reused across loads afterwards.
    merge_worker: OnceCell<MergeWorker>,
}

impl DanmakuPipeline {
    #[must_use]
    pub fn new(source: Arc<dyn CommentSource>, sink: Arc<dyn RenderSink>, settings: Settings) -> Self {
        Self {
            controller: SessionController::new(),
            settings: Mutex::new(settings),
            auto_override: Mutex::new(None),
            source,
            sink,
            merge_worker: OnceCell::new(),
        }
    }

    /// The session controller, for collaborators that need to tag their
    /// own work with the current token.
    #[must_use]
    pub fn controller(&self) -> &SessionController {
        &self.controller
    }

    /// Flat option read, mirroring [`Settings::get_option`].
    #[must_use]
    pub fn get_option(&self, key: &str) -> Option<serde_json::Value> {
        self.settings.lock().expect("settings lock").get_option(key)
    }

    /// Flat option write, mirroring [`Settings::set_option`].
    pub fn set_option(&self, key: &str, value: serde_json::Value) -> Result<(), SettingsError> {
        self.settings
            .lock()
            .expect("settings lock")
            .set_option(key, value)
    }

    /// Run one load attempt end to end. Returns `Superseded` (not an
    /// error) whenever a newer `load` call overtakes this one at any
    /// stage boundary; the renderer is then never invoked for this token.
    pub async fn load(
        &self,
        media_reference: &str,
        geometry: ContainerGeometry,
    ) -> anyhow::Result<LoadOutcome> {
        let token = self.controller.begin_load();

        let raw = self
            .source
            .fetch_raw(media_reference)
            .await
            .with_context(|| format!("fetching comments for {media_reference}"))?;
        if !self.stage_guard(token, "fetch") {
            return Ok(LoadOutcome::Superseded);
        }
        log::debug!("fetched {} raw comments for {media_reference}", raw.len());

        // Auto-filter planning mutates live settings under the lock; the
        // rest of the pipeline works from an immutable snapshot.
        let settings = {
            let mut settings = self.settings.lock().expect("settings lock");
            if let Some(scope) = plan_auto_filter(raw.len(), &mut settings) {
                let mut slot = self.auto_override.lock().expect("override lock");
                // Keep the first scope: it holds the user's real prior
                // values. A nested engage captured already-tightened ones.
                if slot.is_none() {
                    *slot = Some(scope);
                }
            }
            settings.clone()
        };

        let comments = normalize(&raw, &settings);
        let comments = run_chain(comments, &settings);
        if !self.stage_guard(token, "filter chain") {
            return Ok(LoadOutcome::Superseded);
        }

        let comments = self.merge_stage(comments, &settings).await;
        if !self.stage_guard(token, "similarity merge") {
            return Ok(LoadOutcome::Superseded);
        }

        let layout = LayoutOptions::from_settings(&settings, geometry.width, geometry.height);
        let comments = danmaku_layout::schedule(comments, &layout);
        if !self.stage_guard(token, "lane scheduling") {
            return Ok(LoadOutcome::Superseded);
        }

        if comments.is_empty() {
            return Ok(LoadOutcome::NoComments);
        }
        let delivered = comments.len();
        self.sink.handoff(comments);
        Ok(LoadOutcome::Delivered(delivered))
    }

    /// Playback stop: invalidate the session and restore the auto-filter
    /// override exactly once.
    pub fn stop(&self) {
        self.controller.retire();
        let scope = self.auto_override.lock().expect("override lock").take();
        if let Some(scope) = scope {
            scope.restore(&mut self.settings.lock().expect("settings lock"));
            log::debug!("auto-filter override restored at stop");
        }
    }

    fn stage_guard(&self, token: SessionToken, stage: &str) -> bool {
        if self.controller.is_current(token) {
            return true;
        }
        log::debug!("discarding stale {stage} output for superseded load");
        false
    }

    async fn merge_stage(&self, comments: Vec<Comment>, settings: &Settings) -> Vec<Comment> {
        let request = MergeRequest {
            items: comments
                .iter()
                .enumerate()
                .map(|(index, c)| MergeItem {
                    text: c.text.clone(),
                    time: c.time_seconds,
                    index,
                })
                .collect(),
            threshold: settings.merge_threshold,
            time_window_seconds: settings.merge_time_window_seconds,
            enabled: settings.merge_enabled,
        };
        let worker = self.merge_worker.get_or_init(MergeWorker::spawn);
        match worker.merge(request).await {
            None => comments,
            Some(edits) => apply_edits(&comments, &edits),
        }
    }
}

/// Rebuild the comment array from the worker's survivor list. Merged
/// roots get the annotated text (and a parsed multiplicity); everything
/// else is a plain copy.
fn apply_edits(comments: &[Comment], edits: &[MergeEdit]) -> Vec<Comment> {
    edits
        .iter()
        .filter_map(|edit| {
            let original = comments.get(edit.index)?;
            Some(match &edit.text {
                None => original.clone(),
                Some(text) => Comment {
                    text: text.clone(),
                    merged_count: parse_merge_suffix(text),
                    ..original.clone()
                },
            })
        })
        .collect()
}

/// Extract N from a trailing `" [xN]"` multiplicity marker.
fn parse_merge_suffix(text: &str) -> Option<u32> {
    let inner = text.strip_suffix(']')?;
    let (_, count) = inner.rsplit_once(" [x")?;
    count.parse().ok()
}
