//! Text normalization for values read off the profile page.

use crate::error::ScraperError;

/// Characters the profile page uses as thousands separators across locales.
const THOUSANDS_SEPARATORS: [char; 6] = [',', '.', ' ', '\u{a0}', '\u{202f}', '\''];

/// Number of tally counters the profile header carries.
pub const TALLY_COUNTERS: usize = 3;

/// Strips thousands separators and surrounding whitespace: `"1,234"` becomes
/// `"1234"`.
#[must_use]
pub fn normalize_count(raw: &str) -> String {
    raw.trim()
        .chars()
        .filter(|c| !THOUSANDS_SEPARATORS.contains(c))
        .collect()
}

/// First whitespace-separated token of `raw`, with separators stripped.
///
/// Returns `None` for blank text.
#[must_use]
pub fn leading_count(raw: &str) -> Option<String> {
    raw.split_whitespace()
        .next()
        .map(normalize_count)
        .filter(|token| !token.is_empty())
}

/// `true` when `token` is a non-empty run of ASCII digits.
#[must_use]
pub fn is_count(token: &str) -> bool {
    !token.is_empty() && token.bytes().all(|b| b.is_ascii_digit())
}

/// The three header counters, by meaning.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TallyCounts {
    pub badges: String,
    pub points: String,
    pub trails: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Tally {
    Badges,
    Points,
    Trails,
}

impl Tally {
    fn from_label(label: &str) -> Option<Self> {
        let label = label.trim().to_ascii_lowercase();
        if label.starts_with("badge") {
            Some(Tally::Badges)
        } else if label.starts_with("point") {
            Some(Tally::Points)
        } else if label.starts_with("trail") {
            Some(Tally::Trails)
        } else {
            None
        }
    }
}

impl TallyCounts {
    /// Maps counter texts to badges, points and trails.
    ///
    /// When `labels` pairs one-to-one with `counts` and names all three
    /// tallies, the mapping follows the labels. Otherwise the first three
    /// counters are taken in page order: badges, points, trails.
    ///
    /// # Errors
    ///
    /// Returns [`ScraperError::CounterCount`] if fewer than three counters
    /// were found.
    pub fn from_page_texts(counts: &[String], labels: &[String]) -> Result<Self, ScraperError> {
        if counts.len() < TALLY_COUNTERS {
            return Err(ScraperError::CounterCount {
                expected: TALLY_COUNTERS,
                found: counts.len(),
            });
        }

        if let Some(labeled) = Self::by_label(counts, labels) {
            return Ok(labeled);
        }

        Ok(Self {
            badges: normalize_count(&counts[0]),
            points: normalize_count(&counts[1]),
            trails: normalize_count(&counts[2]),
        })
    }

    fn by_label(counts: &[String], labels: &[String]) -> Option<Self> {
        if labels.len() != counts.len() {
            return None;
        }

        let (mut badges, mut points, mut trails) = (None, None, None);
        for (count, label) in counts.iter().zip(labels) {
            let slot = match Tally::from_label(label)? {
                Tally::Badges => &mut badges,
                Tally::Points => &mut points,
                Tally::Trails => &mut trails,
            };
            if slot.is_some() {
                return None;
            }
            *slot = Some(normalize_count(count));
        }

        Some(Self {
            badges: badges?,
            points: points?,
            trails: trails?,
        })
    }
}

#[cfg(test)]
#[path = "normalize_test.rs"]
mod tests;
