//! # Danmaku Pipeline
//!
//! Session-scoped orchestration of the comment overlay pipeline.
//!
//! ## Flow
//!
//! ```text
//! begin_load() token
//!     │
//!     ├──> fetch raw comments (CommentSource, external)
//!     ├──> normalize + filter chain        ── token re-check
//!     ├──> similarity merge (background)   ── token re-check
//!     ├──> anti-overlap lane scheduling    ── token re-check
//!     └──> RenderSink::handoff (external)
//! ```
//!
//! A newer `load` call supersedes any in-flight one: the older pipeline
//! runs to completion but every stage boundary re-validates its token and
//! discards stale output silently. No hard cancellation, no error.

mod pipeline;
mod session;

pub use pipeline::{
    CommentSource, ContainerGeometry, DanmakuPipeline, LoadOutcome, RenderSink,
};
pub use session::{SessionController, SessionToken};
