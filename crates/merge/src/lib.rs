//! # Danmaku Merge
//!
//! Similarity-based near-duplicate collapsing for comment feeds.
//!
//! The synchronous core ([`SimilarityEngine`]) groups comments whose
//! normalized edit-distance similarity clears a threshold within a short
//! time window, annotating survivors with a multiplicity marker. The
//! [`MergeWorker`] runs that core on one long-lived background task so a
//! 50k-comment feed never blocks the caller's loop.
//!
//! Cheap pre-filters (time window, length difference, character-presence
//! bitmask) keep the quadratic comparison off most pairs; a single
//! reusable work buffer keeps the inner loop allocation-free.

mod similarity;
mod worker;

pub use similarity::SimilarityEngine;
pub use worker::MergeWorker;
