//! # Danmaku Layout
//!
//! Anti-overlap lane scheduling: assigns each comment a display lane so
//! simultaneously visible comments never collide, dropping the ones that
//! cannot be placed. Pure arithmetic over next-free-time tables; the
//! renderer owns actual painting.

use danmaku_protocol::{Comment, DisplayMode, Settings};

/// Lane height = font size * ratio + stroke padding.
pub const LINE_HEIGHT_RATIO: f32 = 1.35;
pub const STROKE_PADDING: f32 = 4.0;

/// Base scroll speed at `speed_percent = 100`, in pixels per second.
pub const BASE_SPEED_PX_PER_SEC: f32 = 144.0;

/// Width estimate used for scroll-lane occupancy. Scrolling comments only
/// hold a lane until fully on-screen; relative motion separates them
/// afterwards.
pub const AVERAGE_COMMENT_WIDTH_PX: f32 = 220.0;

/// Safety margin added to the scroll occupancy window, in seconds.
pub const SCROLL_LANE_BUFFER_SECS: f64 = 0.3;

/// Geometry and toggles for one scheduling pass.
#[derive(Debug, Clone, Copy)]
pub struct LayoutOptions {
    pub enabled: bool,
    pub container_width: f32,
    pub container_height: f32,
    pub font_size: f32,
    /// Vertical share of the container available to lanes, 1-100.
    pub display_area_percent: u32,
    /// Scroll speed as a percentage of [`BASE_SPEED_PX_PER_SEC`].
    pub speed_percent: u32,
}

impl LayoutOptions {
    /// Combine live settings with the current container geometry.
    #[must_use]
    pub fn from_settings(settings: &Settings, container_width: f32, container_height: f32) -> Self {
        Self {
            enabled: settings.lanes_enabled,
            container_width,
            container_height,
            font_size: settings.font_size,
            display_area_percent: settings.display_area_percent,
            speed_percent: settings.speed_percent,
        }
    }

    fn lane_count(&self) -> usize {
        let lane_height = self.font_size * LINE_HEIGHT_RATIO + STROKE_PADDING;
        let available = self.container_height * self.display_area_percent as f32 / 100.0;
        ((available / lane_height).floor() as usize).max(1)
    }

    fn speed(&self) -> f32 {
        BASE_SPEED_PX_PER_SEC * self.speed_percent as f32 / 100.0
    }
}

/// Assign lanes to time-sorted comments; drop the unplaceable ones.
///
/// Four independent lane tables (one per display mode) hold the time at
/// which each lane next frees up, built and discarded within this pass.
/// Fixed-mode comments occupy a lane for the full on-screen duration;
/// scrolling comments only until their tail clears the edge.
#[must_use]
pub fn schedule(comments: Vec<Comment>, options: &LayoutOptions) -> Vec<Comment> {
    if !options.enabled {
        return comments;
    }

    let lane_count = options.lane_count();
    let speed = options.speed();
    let duration = f64::from(options.container_width / speed);
    let scroll_occupancy = f64::from(AVERAGE_COMMENT_WIDTH_PX / speed) + SCROLL_LANE_BUFFER_SECS;

    // Next-free-time per lane, per mode.
    let mut tables: [Vec<f64>; 4] = std::array::from_fn(|_| vec![f64::NEG_INFINITY; lane_count]);

    let before = comments.len();
    let out: Vec<Comment> = comments
        .into_iter()
        .filter(|comment| {
            let occupancy = if comment.mode.is_fixed() {
                duration
            } else {
                scroll_occupancy
            };
            let table = &mut tables[table_index(comment.mode)];
            match table.iter_mut().find(|free_at| **free_at <= comment.time_seconds) {
                Some(free_at) => {
                    *free_at = comment.time_seconds + occupancy;
                    true
                }
                None => false,
            }
        })
        .collect();

    if out.len() != before {
        log::debug!(
            "lane scheduler dropped {} of {before} comments ({lane_count} lanes)",
            before - out.len()
        );
    }
    out
}

const fn table_index(mode: DisplayMode) -> usize {
    match mode {
        DisplayMode::ScrollLeft => 0,
        DisplayMode::ScrollRight => 1,
        DisplayMode::Top => 2,
        DisplayMode::Bottom => 3,
    }
}
