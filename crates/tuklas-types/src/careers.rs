//! Tuklas-Connect career catalog.
//!
//! A fixed list of Philippine career paths, embedded from
//! `data/careers.json`, that the career panel shows next to the AI-written
//! personal insight. Entries are tagged so the panel can
//! filter them by theme.

use std::fmt;
use std::str::FromStr;
use std::sync::LazyLock;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// A career path shown on the Tuklas-Connect panel.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Career {
    pub id: String,
    pub name: String,
    pub description: String,
    pub tags: Vec<String>,
}

impl Career {
    pub fn has_tag(&self, tag: &str) -> bool {
        self.tags.iter().any(|t| t == tag)
    }
}

/// Returned when a string names no career filter.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("unknown career filter: {0}")]
pub struct UnknownFilter(pub String);

/// Theme filter for the career list.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CareerFilter {
    #[default]
    All,
    Stem,
    Technology,
    Innovation,
    Design,
}

impl CareerFilter {
    pub const ALL: [CareerFilter; 5] = [
        CareerFilter::All,
        CareerFilter::Stem,
        CareerFilter::Technology,
        CareerFilter::Innovation,
        CareerFilter::Design,
    ];

    pub fn label(self) -> &'static str {
        match self {
            CareerFilter::All => "All",
            CareerFilter::Stem => "STEM",
            CareerFilter::Technology => "Technology",
            CareerFilter::Innovation => "Innovation",
            CareerFilter::Design => "Design",
        }
    }
}

impl fmt::Display for CareerFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for CareerFilter {
    type Err = UnknownFilter;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        CareerFilter::ALL
            .into_iter()
            .find(|f| f.label().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| UnknownFilter(s.to_string()))
    }
}

const CATALOG_JSON: &str = include_str!("../data/careers.json");

static CATALOG: LazyLock<Vec<Career>> =
    LazyLock::new(|| serde_json::from_str(CATALOG_JSON).unwrap_or_default());

/// The whole catalog, in file order.
pub fn catalog() -> &'static [Career] {
    &CATALOG
}

/// Careers matching `filter`, in catalog order.
pub fn careers(filter: CareerFilter) -> Vec<&'static Career> {
    catalog()
        .iter()
        .filter(|c| filter == CareerFilter::All || c.has_tag(filter.label()))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn embedded_catalog_parses() {
        let parsed: Vec<Career> = serde_json::from_str(CATALOG_JSON).unwrap();
        assert_eq!(parsed.len(), 8);
        assert_eq!(catalog(), parsed.as_slice());
        assert!(parsed.iter().all(|c| !c.tags.is_empty()));
    }

    #[test]
    fn all_filter_returns_whole_catalog() {
        assert_eq!(careers(CareerFilter::All).len(), catalog().len());
    }

    #[test]
    fn tag_filter_only_returns_tagged_careers() {
        let design = careers(CareerFilter::Design);
        assert!(!design.is_empty());
        assert!(design.iter().all(|c| c.has_tag("Design")));
        assert!(design.len() < catalog().len());
    }

    #[test]
    fn every_filter_matches_something() {
        for filter in CareerFilter::ALL {
            assert!(!careers(filter).is_empty(), "{filter} matched nothing");
        }
    }

    #[test]
    fn catalog_ids_are_unique() {
        let mut ids: Vec<&str> = catalog().iter().map(|c| c.id.as_str()).collect();
        ids.sort_unstable();
        ids.dedup();
        assert_eq!(ids.len(), catalog().len());
    }

    #[test]
    fn filter_parses_case_insensitively() {
        assert_eq!("stem".parse::<CareerFilter>().unwrap(), CareerFilter::Stem);
        assert!("Cooking".parse::<CareerFilter>().is_err());
    }
}
