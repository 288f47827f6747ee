//! CSS selectors for the public profile page.

/// Selectors used by the extractor. Optional fields carry an ordered list of
/// fallbacks; the first selector that yields a value wins.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProfileSelectors {
    pub heading: String,
    pub tally_counts: String,
    pub tally_labels: String,
    pub level_image: String,
    pub certifications: Vec<String>,
    pub superbadges: Vec<String>,
}

impl Default for ProfileSelectors {
    fn default() -> Self {
        Self {
            heading: "lwc-tbui-card > div.heading > div.details > h1".to_string(),
            tally_counts: "span > span.tally__count.tally__count_success".to_string(),
            tally_labels: "span > span.tally__label".to_string(),
            level_image: "lwc-tds-theme-provider > lwc-tbui-card > div:nth-child(1) > img"
                .to_string(),
            certifications: vec![
                "#aura-directive-id-4 > c-lwc-certifications > c-lwc-card > article > \
                 c-lwc-card-header > div > header > div:nth-child(1) > div > h2"
                    .to_string(),
                "c-lwc-certifications c-lwc-card-header header h2".to_string(),
            ],
            superbadges: vec![
                "article > header > div:nth-child(1) > div > h2".to_string(),
                "c-lwc-superbadges header h2".to_string(),
            ],
        }
    }
}

impl ProfileSelectors {
    /// Selectors that must all appear before any field is read.
    #[must_use]
    pub fn required(&self) -> [&str; 3] {
        [
            self.heading.as_str(),
            self.tally_counts.as_str(),
            self.level_image.as_str(),
        ]
    }
}
