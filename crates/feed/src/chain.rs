use crate::keyword::filter_keywords;
use danmaku_protocol::{AutoFilterOverride, Comment, DisplayMode, Settings};

/// Fixed-mode comments allowed per vertical bucket before the rest are
/// coerced to scrolling.
pub const VERTICAL_BUCKET_CAP: usize = 6;

/// Width of the vertical coercion bucket.
pub const VERTICAL_BUCKET_SECONDS: f64 = 3.0;

/// Decide whether the auto-filter heuristic should tighten settings for
/// this load. Returns the override scope when it fires; the caller owns
/// restoring it exactly once at playback stop.
///
/// The heuristic never drops comments itself; it only caps the display
/// area, excludes bottom-pinned comments, and force-enables the
/// similarity merge for oversized feeds.
pub fn plan_auto_filter(incoming: usize, settings: &mut Settings) -> Option<AutoFilterOverride> {
    if !settings.auto_filter_enabled || incoming <= settings.auto_filter_threshold {
        return None;
    }
    log::info!(
        "auto-filter engaged: {incoming} comments exceed threshold {}",
        settings.auto_filter_threshold
    );
    Some(AutoFilterOverride::engage(settings))
}

/// Remove comments by display mode, or by non-default color, in one pass.
#[must_use]
pub fn filter_types(comments: Vec<Comment>, settings: &Settings) -> Vec<Comment> {
    comments
        .into_iter()
        .filter(|c| {
            let mode_blocked = match c.mode {
                DisplayMode::ScrollLeft | DisplayMode::ScrollRight => settings.block_scroll,
                DisplayMode::Top => settings.block_top,
                DisplayMode::Bottom => settings.block_bottom,
            };
            let color_blocked = settings.block_colored && c.style.color != "#FFFFFF";
            !mode_blocked && !color_blocked
        })
        .collect()
}

/// Remove comments whose source platform is excluded.
#[must_use]
pub fn filter_sources(comments: Vec<Comment>, settings: &Settings) -> Vec<Comment> {
    if settings.blocked_sources.is_empty() {
        return comments;
    }
    comments
        .into_iter()
        .filter(|c| !settings.blocked_sources.contains(&c.source))
        .collect()
}

/// Density filter over time-sorted input, one linear pass.
///
/// Two independent mechanisms share the pass:
/// - per-1-second buckets keep at most `9 - 2 * level` comments; excess
///   is dropped outright (level 0 disables the cap);
/// - per-3-second buckets keep at most [`VERTICAL_BUCKET_CAP`] fixed-mode
///   comments; the rest are coerced to scrolling, not dropped.
///
/// A comment slated for drop still consumes its vertical-bucket slot;
/// the two counters never consult each other.
#[must_use]
pub fn filter_density(comments: Vec<Comment>, settings: &Settings) -> Vec<Comment> {
    let drop_limit = match settings.density_level {
        0 => usize::MAX,
        level => (9 - 2 * level.min(3)) as usize,
    };

    let mut out = Vec::with_capacity(comments.len());
    let mut second_key = i64::MIN;
    let mut second_count = 0usize;
    let mut vertical_key = i64::MIN;
    let mut vertical_count = 0usize;

    for comment in comments {
        let sk = comment.time_seconds.floor() as i64;
        if sk != second_key {
            second_key = sk;
            second_count = 0;
        }
        second_count += 1;
        let slated_for_drop = second_count > drop_limit;

        let mut comment = comment;
        if comment.mode.is_fixed() {
            let vk = (comment.time_seconds / VERTICAL_BUCKET_SECONDS).floor() as i64;
            if vk != vertical_key {
                vertical_key = vk;
                vertical_count = 0;
            }
            vertical_count += 1;
            if vertical_count > VERTICAL_BUCKET_CAP && !slated_for_drop {
                comment = Comment {
                    mode: DisplayMode::ScrollLeft,
                    ..comment
                };
            }
        }

        if !slated_for_drop {
            out.push(comment);
        }
    }
    out
}

/// Run the synchronous filter stages in their fixed order: type → source
/// → density → keyword. Auto-filter planning happens before this call so
/// the tightened settings are already in effect.
#[must_use]
pub fn run_chain(comments: Vec<Comment>, settings: &Settings) -> Vec<Comment> {
    let comments = filter_types(comments, settings);
    let comments = filter_sources(comments, settings);
    let comments = filter_density(comments, settings);
    filter_keywords(comments, settings)
}
