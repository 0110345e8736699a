//! Query → candidates → category filter → tone sort.

use crate::catalog::{Catalog, CatalogEntry, Emotion};
use crate::config::{CandidateOrder, RetrievalConfig};
use crate::constants::constants;
use crate::error::RetrievalError;
use crate::index::DescriptionIndex;
use log::debug;
use std::cmp::Ordering;
use std::collections::HashSet;
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum CategoryFilter {
    #[default]
    All,
    /// Exact match on `simple_categories`
    Only(String),
}

impl CategoryFilter {
    pub fn parse(label: &str) -> Self {
        let label = label.trim();
        if label.is_empty() || label == constants::ALL_SENTINEL {
            CategoryFilter::All
        } else {
            CategoryFilter::Only(label.to_string())
        }
    }

    pub fn matches(&self, entry: &CatalogEntry) -> bool {
        match self {
            CategoryFilter::All => true,
            CategoryFilter::Only(label) => entry.simple_categories == *label,
        }
    }
}

impl fmt::Display for CategoryFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CategoryFilter::All => f.write_str(constants::ALL_SENTINEL),
            CategoryFilter::Only(label) => f.write_str(label),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Tone {
    #[default]
    All,
    Happy,
    Surprising,
    Angry,
    Suspenseful,
    Sad,
}

impl Tone {
    pub const CHOICES: [Tone; 6] = [
        Tone::All,
        Tone::Happy,
        Tone::Surprising,
        Tone::Angry,
        Tone::Suspenseful,
        Tone::Sad,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            Tone::All => constants::ALL_SENTINEL,
            Tone::Happy => "Happy",
            Tone::Surprising => "Surprising",
            Tone::Angry => "Angry",
            Tone::Suspenseful => "Suspenseful",
            Tone::Sad => "Sad",
        }
    }

    /// Emotion score the tone sorts by; `None` keeps the incoming order.
    pub fn emotion(&self) -> Option<Emotion> {
        match self {
            Tone::All => None,
            Tone::Happy => Some(Emotion::Joy),
            Tone::Surprising => Some(Emotion::Surprise),
            Tone::Angry => Some(Emotion::Anger),
            Tone::Suspenseful => Some(Emotion::Fear),
            Tone::Sad => Some(Emotion::Sadness),
        }
    }
}

impl fmt::Display for Tone {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for Tone {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        Tone::CHOICES
            .iter()
            .copied()
            .find(|tone| tone.label().eq_ignore_ascii_case(s))
            .ok_or_else(|| {
                let labels: Vec<&str> = Tone::CHOICES.iter().map(|t| t.label()).collect();
                format!("unknown tone {:?} (expected one of {})", s, labels.join(", "))
            })
    }
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct QueryFilters {
    pub query: String,
    pub category: CategoryFilter,
    pub tone: Tone,
}

#[derive(Debug)]
pub struct Recommendations<'a> {
    pub entries: Vec<&'a CatalogEntry>,
    /// Catalog entries matched by the vector search, before filtering
    pub num_candidates: usize,
}

pub struct Recommender<'a> {
    catalog: &'a Catalog,
    index: &'a DescriptionIndex,
    config: RetrievalConfig,
}

impl<'a> Recommender<'a> {
    pub fn new(catalog: &'a Catalog, index: &'a DescriptionIndex, config: RetrievalConfig) -> Self {
        Self {
            catalog,
            index,
            config,
        }
    }

    pub fn recommend(&self, filters: &QueryFilters) -> Result<Recommendations<'a>, RetrievalError> {
        let initial_top_k = self.config.initial_top_k;
        let final_top_k = self.config.final_top_k;

        let hits = self.index.search(&filters.query, initial_top_k)?;
        let isbns: Vec<u64> = hits.iter().map(|hit| hit.isbn13).collect();

        let candidates = select_candidates(self.catalog, &isbns, self.config.order, initial_top_k);
        let num_candidates = candidates.len();

        let mut entries: Vec<&CatalogEntry> = candidates
            .into_iter()
            .filter(|entry| filters.category.matches(entry))
            .take(final_top_k)
            .collect();

        sort_by_tone(&mut entries, filters.tone);

        debug!(
            "{} hits, {} candidates, {} results (category: {}, tone: {})",
            hits.len(),
            num_candidates,
            entries.len(),
            filters.category,
            filters.tone
        );

        Ok(Recommendations {
            entries,
            num_candidates,
        })
    }
}

/// Catalog entries for the hit identifiers, without duplicates, truncated to
/// `limit`. Identifiers unknown to the catalog are dropped.
pub fn select_candidates<'a>(
    catalog: &'a Catalog,
    isbns: &[u64],
    order: CandidateOrder,
    limit: usize,
) -> Vec<&'a CatalogEntry> {
    match order {
        CandidateOrder::Similarity => {
            let mut seen = HashSet::new();
            isbns
                .iter()
                .filter(|isbn| seen.insert(**isbn))
                .filter_map(|isbn| catalog.get(*isbn))
                .take(limit)
                .collect()
        }
        CandidateOrder::Catalog => {
            let wanted: HashSet<u64> = isbns.iter().copied().collect();
            catalog
                .entries()
                .iter()
                .filter(|entry| wanted.contains(&entry.isbn13))
                .take(limit)
                .collect()
        }
    }
}

/// Stable sort, highest score first. NaN scores go last.
pub fn sort_by_tone(entries: &mut [&CatalogEntry], tone: Tone) {
    let Some(emotion) = tone.emotion() else {
        return;
    };

    entries.sort_by(|a, b| {
        let a = a.emotion_score(emotion);
        let b = b.emotion_score(emotion);
        match (a.is_nan(), b.is_nan()) {
            (true, true) => Ordering::Equal,
            (true, false) => Ordering::Greater,
            (false, true) => Ordering::Less,
            (false, false) => b.partial_cmp(&a).unwrap_or(Ordering::Equal),
        }
    });
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::large_thumbnail;

    fn entry(isbn13: u64, category: &str, joy: f64, fear: f64) -> CatalogEntry {
        CatalogEntry {
            isbn13,
            title: format!("Book {}", isbn13),
            authors: "Someone".to_string(),
            description: "A book.".to_string(),
            simple_categories: category.to_string(),
            thumbnail: None,
            large_thumbnail: large_thumbnail(None),
            joy,
            surprise: 0.0,
            anger: 0.0,
            fear,
            sadness: 0.0,
        }
    }

    fn catalog() -> Catalog {
        Catalog::from_entries(vec![
            entry(1, "Fiction", 0.2, 0.9),
            entry(2, "Nonfiction", 0.8, 0.1),
            entry(3, "Fiction", 0.5, f64::NAN),
            entry(4, "Fiction", 0.9, 0.3),
        ])
        .unwrap()
    }

    fn ids(entries: &[&CatalogEntry]) -> Vec<u64> {
        entries.iter().map(|e| e.isbn13).collect()
    }

    #[test]
    fn test_similarity_order_keeps_rank_and_dedupes() {
        let catalog = catalog();
        let selected = select_candidates(&catalog, &[4, 2, 4, 99, 1], CandidateOrder::Similarity, 50);
        assert_eq!(ids(&selected), vec![4, 2, 1]);
    }

    #[test]
    fn test_catalog_order_uses_file_order() {
        let catalog = catalog();
        let selected = select_candidates(&catalog, &[4, 2, 4, 99, 1], CandidateOrder::Catalog, 50);
        assert_eq!(ids(&selected), vec![1, 2, 4]);
    }

    #[test]
    fn test_candidates_truncated_to_limit() {
        let catalog = catalog();
        let selected = select_candidates(&catalog, &[3, 2, 1], CandidateOrder::Similarity, 2);
        assert_eq!(ids(&selected), vec![3, 2]);
    }

    #[test]
    fn test_sort_by_tone_descending_and_stable() {
        let catalog = catalog();
        let mut entries: Vec<&CatalogEntry> = catalog.entries().iter().collect();
        sort_by_tone(&mut entries, Tone::Happy);
        assert_eq!(ids(&entries), vec![4, 2, 3, 1]);

        let mut entries: Vec<&CatalogEntry> = catalog.entries().iter().collect();
        sort_by_tone(&mut entries, Tone::All);
        assert_eq!(ids(&entries), vec![1, 2, 3, 4]);
    }

    #[test]
    fn test_sort_by_tone_puts_nan_last() {
        let catalog = catalog();
        let mut entries: Vec<&CatalogEntry> = catalog.entries().iter().collect();
        sort_by_tone(&mut entries, Tone::Suspenseful);
        assert_eq!(ids(&entries), vec![1, 4, 2, 3]);
    }

    #[test]
    fn test_tone_parsing() {
        assert_eq!("Happy".parse::<Tone>().unwrap(), Tone::Happy);
        assert_eq!("suspenseful".parse::<Tone>().unwrap(), Tone::Suspenseful);
        assert_eq!("All".parse::<Tone>().unwrap(), Tone::All);
        assert!("Gloomy".parse::<Tone>().is_err());
        assert_eq!(Tone::Sad.emotion(), Some(Emotion::Sadness));
        assert_eq!(Tone::All.emotion(), None);
    }

    #[test]
    fn test_category_filter_parsing() {
        assert_eq!(CategoryFilter::parse("All"), CategoryFilter::All);
        assert_eq!(CategoryFilter::parse(""), CategoryFilter::All);
        assert_eq!(
            CategoryFilter::parse("Fiction"),
            CategoryFilter::Only("Fiction".to_string())
        );
        // exact, case-sensitive match
        let catalog = catalog();
        let fiction = catalog.get(1).unwrap();
        assert!(CategoryFilter::parse("Fiction").matches(fiction));
        assert!(!CategoryFilter::parse("fiction").matches(fiction));
    }
}
