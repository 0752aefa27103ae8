//! # Danmaku Feed
//!
//! Comment normalization and the synchronous filter chain.
//!
//! ## Pipeline position
//!
//! ```text
//! RawComment[] ──> normalize ──> auto-filter plan ──> type ──> source
//!                                      │
//!                                      └─ density ──> keyword ──> (merge, layout)
//! ```
//!
//! Every stage is a pure pass over the comment collection and is
//! independently callable; [`run_chain`] applies them in the fixed order.
//! Nothing here touches the renderer, the network, or persistence.

mod chain;
mod keyword;
mod normalize;

pub use chain::{
    filter_density, filter_sources, filter_types, plan_auto_filter, run_chain,
    VERTICAL_BUCKET_CAP, VERTICAL_BUCKET_SECONDS,
};
pub use keyword::{compile_patterns, filter_keywords, Pattern};
pub use normalize::normalize;
