use serde::{Deserialize, Serialize};

/// Default comment color: white, packed as `0xFFFFFF`.
pub const DEFAULT_COLOR: u32 = 0xFF_FF_FF;

/// How a comment moves (or doesn't) across the video surface.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DisplayMode {
    /// Scrolls right-to-left across the screen (the common case).
    ScrollLeft,
    /// Scrolls left-to-right (reverse direction).
    ScrollRight,
    /// Pinned at the top for its whole lifetime.
    Top,
    /// Pinned at the bottom for its whole lifetime.
    Bottom,
}

impl DisplayMode {
    /// Decode a wire mode code. Codes 1-3 are all plain scrolling variants,
    /// 6 is reverse scroll, 4/5 are the fixed positions. Anything else is
    /// unrecognized and the comment must be dropped, never defaulted.
    #[must_use]
    pub const fn from_wire(code: u32) -> Option<Self> {
        match code {
            1 | 2 | 3 => Some(Self::ScrollLeft),
            4 => Some(Self::Bottom),
            5 => Some(Self::Top),
            6 => Some(Self::ScrollRight),
            _ => None,
        }
    }

    /// True for the two pinned (non-scrolling) modes.
    #[must_use]
    pub const fn is_fixed(self) -> bool {
        matches!(self, Self::Top | Self::Bottom)
    }
}

/// Platform a comment originated from, parsed from the square-bracket tag
/// in the wire params (e.g. `[BiliBili]12345`).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SourcePlatform {
    DanDanPlay,
    BiliBili,
    Gamer,
    AcFun,
    Other(String),
}

impl SourcePlatform {
    /// Parse a bracket tag, case-insensitively for the known platforms.
    /// Unknown tags are preserved verbatim rather than collapsed.
    #[must_use]
    pub fn from_tag(tag: &str) -> Self {
        match tag.to_ascii_lowercase().as_str() {
            "dandanplay" | "" => Self::DanDanPlay,
            "bilibili" => Self::BiliBili,
            "gamer" | "baha" => Self::Gamer,
            "acfun" => Self::AcFun,
            _ => Self::Other(tag.to_string()),
        }
    }

    /// Human-readable label, used for the show-source suffix and for
    /// keyword matching against the source field.
    #[must_use]
    pub fn label(&self) -> &str {
        match self {
            Self::DanDanPlay => "DanDanPlay",
            Self::BiliBili => "BiliBili",
            Self::Gamer => "Gamer",
            Self::AcFun => "AcFun",
            Self::Other(tag) => tag,
        }
    }
}

/// Text styling derived from the packed wire color.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommentStyle {
    /// `#RRGGBB` fill color.
    pub color: String,
    /// Auto-contrast shadow: white shadow under black text, black shadow
    /// under everything else.
    pub shadow_color: String,
}

impl CommentStyle {
    /// Decode a packed integer color into fill + contrast shadow.
    #[must_use]
    pub fn from_packed(color: u32) -> Self {
        let rgb = color & 0x00FF_FFFF;
        let shadow = if rgb == 0 { "#FFFFFF" } else { "#000000" };
        Self {
            color: format!("#{rgb:06X}"),
            shadow_color: shadow.to_string(),
        }
    }
}

/// A single comment as fetched from the comment provider, before
/// normalization. `params` packs time/mode/color/identity as a
/// comma-separated tuple, dandanplay style.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RawComment {
    /// Provider-side comment id.
    #[serde(rename = "cid")]
    pub id: String,
    /// Packed `"time,mode,color[,[Source]user]"` tuple.
    #[serde(rename = "p")]
    pub params: String,
    /// Comment text.
    #[serde(rename = "m")]
    pub text: String,
}

/// Decoded `params` tuple of a [`RawComment`].
#[derive(Debug, Clone, PartialEq)]
pub struct WireParams {
    pub time: f64,
    pub mode_code: u32,
    pub color: u32,
    pub source: SourcePlatform,
    pub user_id: String,
}

impl RawComment {
    /// Decode the packed params tuple. Returns `None` when any of the three
    /// leading fields fails to parse; the caller drops such comments from
    /// the batch without failing it.
    #[must_use]
    pub fn decode_params(&self) -> Option<WireParams> {
        let mut fields = self.params.split(',');
        let time: f64 = fields.next()?.trim().parse().ok()?;
        // "NaN" and "inf" parse as f64; a non-finite time is malformed.
        if !time.is_finite() {
            return None;
        }
        let mode_code: u32 = fields.next()?.trim().parse().ok()?;
        let color: u32 = fields.next()?.trim().parse().ok()?;

        // Fourth field is optional: "[Source]user", bare "user", or absent.
        let (source, user_id) = match fields.next() {
            Some(raw) => {
                let raw = raw.trim();
                if let Some(rest) = raw.strip_prefix('[') {
                    match rest.split_once(']') {
                        Some((tag, user)) => {
                            (SourcePlatform::from_tag(tag), user.to_string())
                        }
                        None => (SourcePlatform::DanDanPlay, raw.to_string()),
                    }
                } else {
                    (SourcePlatform::DanDanPlay, raw.to_string())
                }
            }
            None => (SourcePlatform::DanDanPlay, String::new()),
        };

        Some(WireParams {
            time,
            mode_code,
            color,
            source,
            user_id,
        })
    }
}

/// A normalized comment. Immutable once built; every downstream transform
/// (merge, coercion) emits copies instead of mutating in place.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Comment {
    /// Displayed text. May carry a show-source suffix or a merge
    /// multiplicity marker; identity lives in `comment_id`/`user_id`.
    pub text: String,

    /// Display mode (already validated against the wire code).
    pub mode: DisplayMode,

    /// Playback offset in seconds, global time offset already applied.
    pub time_seconds: f64,

    /// Originating platform.
    pub source: SourcePlatform,

    /// Provider-side user id (may be empty).
    pub user_id: String,

    /// Provider-side comment id.
    pub comment_id: String,

    /// Derived fill/shadow styling.
    pub style: CommentStyle,

    /// How many near-duplicates were collapsed into this comment, if any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub merged_count: Option<u32>,
}

impl Comment {
    /// Stable dedup key: composite of the platform comment id and user id.
    /// Deterministic across runs for identical inputs.
    #[must_use]
    pub fn cuid(&self) -> String {
        format!("{}:{}", self.comment_id, self.user_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_mode_codes() {
        assert_eq!(DisplayMode::from_wire(1), Some(DisplayMode::ScrollLeft));
        assert_eq!(DisplayMode::from_wire(2), Some(DisplayMode::ScrollLeft));
        assert_eq!(DisplayMode::from_wire(3), Some(DisplayMode::ScrollLeft));
        assert_eq!(DisplayMode::from_wire(4), Some(DisplayMode::Bottom));
        assert_eq!(DisplayMode::from_wire(5), Some(DisplayMode::Top));
        assert_eq!(DisplayMode::from_wire(6), Some(DisplayMode::ScrollRight));
        assert_eq!(DisplayMode::from_wire(0), None);
        assert_eq!(DisplayMode::from_wire(7), None);
        assert_eq!(DisplayMode::from_wire(99), None);
    }

    #[test]
    fn test_decode_full_params() {
        let raw = RawComment {
            id: "42".to_string(),
            params: "12.5,1,16777215,[BiliBili]user99".to_string(),
            text: "hello".to_string(),
        };
        let params = raw.decode_params().unwrap();
        assert_eq!(params.time, 12.5);
        assert_eq!(params.mode_code, 1);
        assert_eq!(params.color, 16_777_215);
        assert_eq!(params.source, SourcePlatform::BiliBili);
        assert_eq!(params.user_id, "user99");
    }

    #[test]
    fn test_decode_params_without_user() {
        let raw = RawComment {
            id: "1".to_string(),
            params: "3,5,255".to_string(),
            text: "top".to_string(),
        };
        let params = raw.decode_params().unwrap();
        assert_eq!(params.source, SourcePlatform::DanDanPlay);
        assert_eq!(params.user_id, "");
    }

    #[test]
    fn test_decode_params_bare_user() {
        let raw = RawComment {
            id: "1".to_string(),
            params: "3,1,255,abcdef".to_string(),
            text: "x".to_string(),
        };
        let params = raw.decode_params().unwrap();
        assert_eq!(params.source, SourcePlatform::DanDanPlay);
        assert_eq!(params.user_id, "abcdef");
    }

    #[test]
    fn test_decode_params_malformed() {
        for bad in [
            "",
            "1.0",
            "1.0,one,255",
            "abc,1,255",
            "1.0,1,red",
            "NaN,1,255",
            "inf,1,255",
            "-inf,1,255,[BiliBili]u1",
        ] {
            let raw = RawComment {
                id: "1".to_string(),
                params: bad.to_string(),
                text: "x".to_string(),
            };
            assert!(raw.decode_params().is_none(), "params {bad:?} should fail");
        }
    }

    #[test]
    fn test_style_contrast_shadow() {
        let white = CommentStyle::from_packed(0xFFFFFF);
        assert_eq!(white.color, "#FFFFFF");
        assert_eq!(white.shadow_color, "#000000");

        let black = CommentStyle::from_packed(0);
        assert_eq!(black.color, "#000000");
        assert_eq!(black.shadow_color, "#FFFFFF");

        let red = CommentStyle::from_packed(0xFF0000);
        assert_eq!(red.color, "#FF0000");
        assert_eq!(red.shadow_color, "#000000");
    }

    #[test]
    fn test_cuid_stable() {
        let style = CommentStyle::from_packed(DEFAULT_COLOR);
        let a = Comment {
            text: "one".to_string(),
            mode: DisplayMode::ScrollLeft,
            time_seconds: 1.0,
            source: SourcePlatform::DanDanPlay,
            user_id: "u1".to_string(),
            comment_id: "c1".to_string(),
            style: style.clone(),
            merged_count: None,
        };
        let b = Comment {
            text: "different text, same identity".to_string(),
            time_seconds: 99.0,
            ..a.clone()
        };
        assert_eq!(a.cuid(), "c1:u1");
        assert_eq!(a.cuid(), b.cuid());
    }

    #[test]
    fn test_source_tags() {
        assert_eq!(SourcePlatform::from_tag("BiliBili"), SourcePlatform::BiliBili);
        assert_eq!(SourcePlatform::from_tag("bilibili"), SourcePlatform::BiliBili);
        assert_eq!(SourcePlatform::from_tag("Gamer"), SourcePlatform::Gamer);
        assert_eq!(SourcePlatform::from_tag(""), SourcePlatform::DanDanPlay);
        assert_eq!(
            SourcePlatform::from_tag("Niconico"),
            SourcePlatform::Other("Niconico".to_string())
        );
        assert_eq!(SourcePlatform::Other("Niconico".to_string()).label(), "Niconico");
    }
}
