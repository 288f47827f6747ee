//! Field-by-field reading of a loaded profile page.

use std::time::Duration;

use percent_encoding::{utf8_percent_encode, AsciiSet, CONTROLS};
use trailscrape_core::ProfileRecord;

use crate::error::ScraperError;
use crate::fetcher::ProfilePage;
use crate::normalize::{is_count, leading_count, TallyCounts};
use crate::selectors::ProfileSelectors;

/// Characters escaped when an identifier becomes a URL path segment.
const PATH_SEGMENT: &AsciiSet = &CONTROLS
    .add(b' ')
    .add(b'"')
    .add(b'<')
    .add(b'>')
    .add(b'`')
    .add(b'%')
    .add(b'{')
    .add(b'}');

/// Value stored for an optional count whose markup is missing.
const ABSENT_COUNT: &str = "0";

/// Timeouts applied while reading a page.
#[derive(Debug, Clone, Copy)]
pub struct Waits {
    pub required: Duration,
    pub optional: Duration,
}

/// How the leading token of an optional count is accepted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum TokenRule {
    /// Any token is kept as-is.
    AnyToken,
    /// Non-numeric tokens become `"0"`.
    DigitsOnly,
}

/// Builds the public profile URL for `id`.
///
/// # Errors
///
/// Returns [`ScraperError::InvalidIdentifier`] for blank identifiers and for
/// identifiers that would escape their path segment.
pub fn profile_url(base_url: &str, id: &str) -> Result<String, ScraperError> {
    let trimmed = id.trim();
    if trimmed.is_empty() {
        return Err(ScraperError::InvalidIdentifier {
            id: id.to_owned(),
            reason: "identifier is blank",
        });
    }
    if trimmed.contains(['/', '?', '#']) {
        return Err(ScraperError::InvalidIdentifier {
            id: id.to_owned(),
            reason: "identifier may not contain '/', '?' or '#'",
        });
    }
    let segment = utf8_percent_encode(trimmed, PATH_SEGMENT);
    Ok(format!("{}/{segment}", base_url.trim_end_matches('/')))
}

/// Navigates `page` to `url` and fills `record` in page order.
///
/// Fields are written into `record` as soon as they are read, so on error the
/// caller still holds everything extracted up to the failing step. Optional
/// counts never fail; they fall back through their selector list to `"0"`.
///
/// # Errors
///
/// Returns the first navigation, required-selector or counter error.
pub async fn read_profile(
    page: &dyn ProfilePage,
    url: &str,
    selectors: &ProfileSelectors,
    waits: Waits,
    record: &mut ProfileRecord,
) -> Result<(), ScraperError> {
    page.goto(url).await?;

    for selector in selectors.required() {
        page.wait_for_selector(selector, waits.required).await?;
    }

    record.name = Some(page.inner_text(&selectors.heading).await?.trim().to_owned());

    let counts = page.inner_texts(&selectors.tally_counts).await?;
    let labels = match page.inner_texts(&selectors.tally_labels).await {
        Ok(labels) => labels,
        Err(e) => {
            tracing::debug!(error = %e, "tally labels unavailable; mapping counters by position");
            Vec::new()
        }
    };
    let tally = TallyCounts::from_page_texts(&counts, &labels)?;
    record.badges = Some(tally.badges);
    record.points = Some(tally.points);
    record.trails = Some(tally.trails);

    record.level_text = Some(page.attribute(&selectors.level_image, "alt").await?);
    record.level_image = Some(page.attribute(&selectors.level_image, "src").await?);

    record.certifications = Some(
        read_optional_count(
            page,
            &selectors.certifications,
            waits.optional,
            TokenRule::AnyToken,
        )
        .await,
    );
    record.superbadges = Some(
        read_optional_count(
            page,
            &selectors.superbadges,
            waits.optional,
            TokenRule::DigitsOnly,
        )
        .await,
    );

    Ok(())
}

/// Tries each selector in turn and returns the leading token of the first one
/// that resolves to non-blank text.
async fn read_optional_count(
    page: &dyn ProfilePage,
    selectors: &[String],
    wait: Duration,
    rule: TokenRule,
) -> String {
    for selector in selectors {
        match read_leading_token(page, selector, wait).await {
            Ok(token) => {
                return match rule {
                    TokenRule::DigitsOnly if !is_count(&token) => {
                        tracing::debug!(selector = %selector, token = %token, "non-numeric count; storing 0");
                        ABSENT_COUNT.to_owned()
                    }
                    _ => token,
                };
            }
            Err(e) => tracing::debug!(selector = %selector, error = %e, "optional count selector missed"),
        }
    }
    ABSENT_COUNT.to_owned()
}

async fn read_leading_token(
    page: &dyn ProfilePage,
    selector: &str,
    wait: Duration,
) -> Result<String, ScraperError> {
    page.wait_for_selector(selector, wait).await?;
    let text = page.inner_text(selector).await?;
    leading_count(&text).ok_or_else(|| ScraperError::ElementMissing {
        selector: selector.to_owned(),
    })
}
