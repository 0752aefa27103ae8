//! # Danmaku Protocol
//!
//! Shared data model for the danmaku overlay pipeline.
//!
//! ## Contents
//!
//! ```text
//! Wire comment ("cid,p,m" tuple)
//!     │
//!     ├──> WireParams (time/mode/color/source/user decode)
//!     │      └─> Comment (normalized, immutable)
//!     │
//!     ├──> Settings (flat key-value options store)
//!     │
//!     └──> Merge worker protocol (MergeRequest / MergeEdit)
//! ```
//!
//! Every downstream crate (feed, merge, layout, pipeline) depends on these
//! types; none of them owns persistence or rendering.

mod comment;
mod merge;
mod settings;

pub use comment::{
    Comment, CommentStyle, DisplayMode, RawComment, SourcePlatform, WireParams, DEFAULT_COLOR,
};
pub use merge::{MergeEdit, MergeItem, MergeRequest, MergeResponse};
pub use settings::{AutoFilterOverride, Settings, SettingsError, AUTO_FILTER_DISPLAY_AREA_PERCENT};
