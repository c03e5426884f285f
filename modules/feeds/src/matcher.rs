use regex::{Regex, RegexBuilder};
use serde::Serialize;

use crate::{FeedEntry, FeedError};

/// Product label plus the regex that selects it; checked in list order.
pub const DEFAULT_PATTERNS: &[(&str, &str)] = &[
    ("iphone", "iPhone"),
    ("ipad", "iPad"),
    ("iwatch", "iWatch"),
    ("macos", "macOS"),
];

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FeedRow {
    pub product: String,
    pub title: String,
    pub link: String,
    pub date: String,
}

impl FeedRow {
    pub fn cells(&self) -> Vec<Option<String>> {
        vec![
            Some(self.product.clone()),
            Some(self.title.clone()),
            Some(self.link.clone()),
            Some(self.date.clone()),
        ]
    }
}

#[derive(Debug, Clone)]
pub struct ProductMatcher {
    patterns: Vec<(String, Regex)>,
}

impl ProductMatcher {
    pub fn new<P, R>(patterns: &[(P, R)]) -> Result<Self, FeedError>
    where
        P: AsRef<str>,
        R: AsRef<str>,
    {
        let mut compiled = Vec::with_capacity(patterns.len());
        for (product, pattern) in patterns {
            let re = RegexBuilder::new(pattern.as_ref()).case_insensitive(true).build()?;
            compiled.push((product.as_ref().to_string(), re));
        }
        Ok(ProductMatcher { patterns: compiled })
    }

    pub fn with_defaults() -> Result<Self, FeedError> {
        Self::new(DEFAULT_PATTERNS)
    }

    /// Label of the first pattern matching `title`, if any.
    pub fn product_for(&self, title: &str) -> Option<&str> {
        self.patterns
            .iter()
            .find(|(_, re)| re.is_match(title))
            .map(|(p, _)| p.as_str())
    }

    /// One row per entry whose title matches a pattern; others are dropped.
    pub fn rows(&self, entries: &[FeedEntry]) -> Vec<FeedRow> {
        entries
            .iter()
            .filter_map(|e| {
                self.product_for(&e.title).map(|product| FeedRow {
                    product: product.to_string(),
                    title: e.title.clone(),
                    link: e.link.clone(),
                    date: e.published.clone(),
                })
            })
            .collect()
    }
}
