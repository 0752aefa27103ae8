use danmaku_protocol::{Comment, CommentStyle, DisplayMode, RawComment, Settings};

/// Parse raw wire comments into typed records, sorted ascending by
/// adjusted time.
///
/// Comments with an unparseable params tuple or an unrecognized mode code
/// are dropped, never defaulted; the batch itself cannot fail. The global
/// time offset (possibly negative) is applied here so every later stage
/// sees final timestamps.
#[must_use]
pub fn normalize(raw: &[RawComment], settings: &Settings) -> Vec<Comment> {
    let mut dropped = 0usize;
    let mut comments: Vec<Comment> = raw
        .iter()
        .filter_map(|rc| {
            let Some(params) = rc.decode_params() else {
                dropped += 1;
                return None;
            };
            let Some(mode) = DisplayMode::from_wire(params.mode_code) else {
                dropped += 1;
                return None;
            };

            let mut text = rc.text.clone();
            if settings.show_source {
                text.push_str(&format!(" [{}]", params.source.label()));
            }

            Some(Comment {
                text,
                mode,
                time_seconds: params.time + settings.time_offset_seconds,
                source: params.source,
                user_id: params.user_id,
                comment_id: rc.id.clone(),
                style: CommentStyle::from_packed(params.color),
                merged_count: None,
            })
        })
        .collect();

    if dropped > 0 {
        log::debug!("normalize: dropped {dropped} malformed/unknown-mode comments");
    }

    // Stable sort keeps wire order for equal timestamps.
    comments.sort_by(|a, b| {
        a.time_seconds
            .partial_cmp(&b.time_seconds)
            .unwrap_or(std::cmp::Ordering::Equal)
    });
    comments
}
