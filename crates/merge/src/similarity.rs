use danmaku_protocol::{MergeEdit, MergeItem};

/// How many leading chars feed the character-presence bitmask.
const MASK_PREFIX_CHARS: usize = 50;

/// Strings at or below this length skip the bitmask pre-filter; the mask
/// is too sparse to be meaningful there.
const MASK_MIN_CHARS: usize = 2;

/// Fold each char code into one of 32 bitmask buckets. Two strings can
/// only be similar if their masks intersect, which makes a disjoint mask
/// a free rejection.
fn char_mask(chars: &[char]) -> u32 {
    chars
        .iter()
        .take(MASK_PREFIX_CHARS)
        .fold(0u32, |mask, &c| mask | 1u32 << ((c as u32) & 31))
}

/// Windowed near-duplicate merge over time-sorted comment projections.
///
/// The engine owns one integer work buffer reused across every
/// edit-distance computation (grown geometrically, never shrunk), so a
/// whole merge pass performs no per-comparison allocation. Not safe to
/// share across concurrent calls without external synchronization; the
/// background worker owns exactly one.
#[derive(Debug, Default)]
pub struct SimilarityEngine {
    buffer: Vec<u32>,
}

impl SimilarityEngine {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Collapse near-duplicates within `time_window` seconds at the given
    /// similarity threshold (0-100).
    ///
    /// `items` must be sorted ascending by `time`; the early break on the
    /// forward scan depends on it. Survivors come back in source-index
    /// order with `text` set only for roots that absorbed neighbors
    /// (`"<original> [xN]"`). Source items are never mutated.
    #[must_use]
    pub fn merge(&mut self, items: &[MergeItem], threshold: u8, time_window: f64) -> Vec<MergeEdit> {
        let threshold = usize::from(threshold.min(100));
        let chars: Vec<Vec<char>> = items.iter().map(|i| i.text.chars().collect()).collect();
        let masks: Vec<u32> = chars.iter().map(|c| char_mask(c)).collect();

        let mut absorbed = vec![false; items.len()];
        let mut multiplicity = vec![1u32; items.len()];

        for root in 0..items.len() {
            if absorbed[root] {
                continue;
            }
            for candidate in root + 1..items.len() {
                // Sorted input: once out of the window, everything later is too.
                if items[candidate].time - items[root].time > time_window {
                    break;
                }
                if absorbed[candidate] {
                    continue;
                }

                let a = &chars[root];
                let b = &chars[candidate];
                let max_len = a.len().max(b.len());
                if max_len == 0 {
                    // Two empty texts are identical by definition.
                    absorbed[candidate] = true;
                    multiplicity[root] += 1;
                    continue;
                }

                let allowed = max_len * (100 - threshold) / 100;
                if a.len().abs_diff(b.len()) > allowed {
                    continue;
                }
                if a.len() > MASK_MIN_CHARS
                    && b.len() > MASK_MIN_CHARS
                    && masks[root] & masks[candidate] == 0
                {
                    continue;
                }

                let Some(distance) = self.levenshtein_bounded(a, b, allowed) else {
                    continue;
                };
                let similarity = 100 - distance * 100 / max_len;
                if similarity >= threshold {
                    absorbed[candidate] = true;
                    multiplicity[root] += 1;
                }
            }
        }

        items
            .iter()
            .enumerate()
            .filter(|(i, _)| !absorbed[*i])
            .map(|(i, item)| MergeEdit {
                index: item.index,
                text: (multiplicity[i] > 1)
                    .then(|| format!("{} [x{}]", item.text, multiplicity[i])),
            })
            .collect()
    }

    /// Single-row Levenshtein over chars with a distance bound. Returns
    /// `None` as soon as every entry of a row exceeds `max_dist`, since
    /// the final distance can then never come back under the bound.
    fn levenshtein_bounded(&mut self, a: &[char], b: &[char], max_dist: usize) -> Option<usize> {
        if a.is_empty() {
            return (b.len() <= max_dist).then_some(b.len());
        }
        if b.is_empty() {
            return (a.len() <= max_dist).then_some(a.len());
        }

        let width = b.len() + 1;
        self.ensure_buffer(width);
        let row = &mut self.buffer[..width];
        for (j, slot) in row.iter_mut().enumerate() {
            *slot = j as u32;
        }

        for (i, &ca) in a.iter().enumerate() {
            let mut prev_diag = row[0];
            row[0] = (i + 1) as u32;
            let mut row_min = row[0];
            for (j, &cb) in b.iter().enumerate() {
                let cost = u32::from(ca != cb);
                let value = (row[j + 1] + 1).min(row[j] + 1).min(prev_diag + cost);
                prev_diag = row[j + 1];
                row[j + 1] = value;
                row_min = row_min.min(value);
            }
            if row_min as usize > max_dist {
                return None;
            }
        }

        let distance = row[b.len()] as usize;
        (distance <= max_dist).then_some(distance)
    }

    /// Geometric growth keeps buffer resizes rare across a whole pass.
    fn ensure_buffer(&mut self, needed: usize) {
        if self.buffer.len() < needed {
            let target = needed.max(self.buffer.len().saturating_mul(2)).max(64);
            self.buffer.resize(target, 0);
        }
    }
}
