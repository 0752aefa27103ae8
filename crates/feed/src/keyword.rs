use danmaku_protocol::{Comment, Settings};
use regex::Regex;

/// A single blocklist pattern. Compiled as a regex when possible, with a
/// plain substring fallback so one bad pattern never aborts filtering.
#[derive(Debug, Clone)]
pub enum Pattern {
    Regex(Regex),
    Literal(String),
}

impl Pattern {
    /// Case-sensitive match against one field.
    #[must_use]
    pub fn matches(&self, haystack: &str) -> bool {
        match self {
            Self::Regex(re) => re.is_match(haystack),
            Self::Literal(needle) => haystack.contains(needle.as_str()),
        }
    }
}

/// Compile the newline-delimited blocklist once per filter invocation.
/// Blank lines are skipped; patterns that fail regex compilation fall
/// back to literal containment.
#[must_use]
pub fn compile_patterns(blocklist: &str) -> Vec<Pattern> {
    blocklist
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(|line| match Regex::new(line) {
            Ok(re) => Pattern::Regex(re),
            Err(err) => {
                log::debug!("keyword pattern {line:?} is not a valid regex ({err}); using literal match");
                Pattern::Literal(line.to_string())
            }
        })
        .collect()
}

/// Drop a comment when any pattern matches any of its text, source label,
/// user id, or comment id.
#[must_use]
pub fn filter_keywords(comments: Vec<Comment>, settings: &Settings) -> Vec<Comment> {
    let patterns = compile_patterns(&settings.keyword_blocklist);
    if patterns.is_empty() {
        return comments;
    }

    let before = comments.len();
    let out: Vec<Comment> = comments
        .into_iter()
        .filter(|c| {
            let fields = [
                c.text.as_str(),
                c.source.label(),
                c.user_id.as_str(),
                c.comment_id.as_str(),
            ];
            !patterns
                .iter()
                .any(|p| fields.iter().any(|field| p.matches(field)))
        })
        .collect();

    if out.len() != before {
        log::debug!("keyword filter removed {} comments", before - out.len());
    }
    out
}
