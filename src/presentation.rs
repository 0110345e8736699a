use crate::catalog::CatalogEntry;
use crate::constants::constants;
use serde::{Deserialize, Serialize};

/// What the shell shows for one book: a cover and a caption.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Recommendation {
    pub isbn13: u64,
    pub image_url: String,
    pub caption: String,
}

impl From<&CatalogEntry> for Recommendation {
    fn from(entry: &CatalogEntry) -> Self {
        Self {
            isbn13: entry.isbn13,
            image_url: entry.large_thumbnail.clone(),
            caption: caption(entry),
        }
    }
}

/// "A", "A and B", "A, B, and C".
pub fn format_authors(authors: &str) -> String {
    let parts: Vec<&str> = authors.split(';').collect();
    match parts.as_slice() {
        [first, second] => format!("{} and {}", first, second),
        [init @ .., last] if init.len() >= 2 => format!("{}, and {}", init.join(", "), last),
        _ => authors.to_string(),
    }
}

/// First `max_words` words joined by single spaces, followed by "...".
pub fn truncate_description(description: &str, max_words: usize) -> String {
    let words: Vec<&str> = description.split_whitespace().take(max_words).collect();
    format!("{}...", words.join(" "))
}

pub fn caption(entry: &CatalogEntry) -> String {
    let description = truncate_description(&entry.description, constants::CAPTION_DESCRIPTION_WORDS);
    if entry.authors.trim().is_empty() {
        format!("{}: {}", entry.title, description)
    } else {
        format!(
            "{} by {}: {}",
            entry.title,
            format_authors(&entry.authors),
            description
        )
    }
}
