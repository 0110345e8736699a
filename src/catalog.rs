//! Read-only book catalog loaded from the emotions CSV.

use crate::constants::constants;
use crate::error::CatalogLoadError;
use log::debug;
use serde::Deserialize;
use std::collections::{BTreeSet, HashMap};
use std::fs::File;
use std::path::Path;

/// Emotion score columns carried by every catalog entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Emotion {
    Joy,
    Surprise,
    Anger,
    Fear,
    Sadness,
}

/// Columns the catalog CSV must carry. Empty cells are fine for the
/// optional ones; a missing column is not.
pub const REQUIRED_COLUMNS: [&str; 11] = [
    "isbn13",
    "title",
    "authors",
    "description",
    "simple_categories",
    "thumbnail",
    "joy",
    "surprise",
    "anger",
    "fear",
    "sadness",
];

/// One row of the catalog CSV as written by the upstream pipeline.
/// Columns we don't use are ignored.
#[derive(Debug, Deserialize)]
struct CatalogRow {
    isbn13: u64,
    title: String,
    authors: Option<String>,
    description: Option<String>,
    simple_categories: String,
    thumbnail: Option<String>,
    joy: f64,
    surprise: f64,
    anger: f64,
    fear: f64,
    sadness: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct CatalogEntry {
    pub isbn13: u64,
    pub title: String,
    /// Semicolon-delimited author list
    pub authors: String,
    pub description: String,
    pub simple_categories: String,
    pub thumbnail: Option<String>,
    pub large_thumbnail: String,
    pub joy: f64,
    pub surprise: f64,
    pub anger: f64,
    pub fear: f64,
    pub sadness: f64,
}

impl CatalogEntry {
    pub fn emotion_score(&self, emotion: Emotion) -> f64 {
        match emotion {
            Emotion::Joy => self.joy,
            Emotion::Surprise => self.surprise,
            Emotion::Anger => self.anger,
            Emotion::Fear => self.fear,
            Emotion::Sadness => self.sadness,
        }
    }
}

impl From<CatalogRow> for CatalogEntry {
    fn from(row: CatalogRow) -> Self {
        let thumbnail = row.thumbnail.filter(|t| !t.trim().is_empty());
        let large_thumbnail = large_thumbnail(thumbnail.as_deref());
        Self {
            isbn13: row.isbn13,
            title: row.title,
            authors: row.authors.unwrap_or_default(),
            description: row.description.unwrap_or_default(),
            simple_categories: row.simple_categories,
            thumbnail,
            large_thumbnail,
            joy: row.joy,
            surprise: row.surprise,
            anger: row.anger,
            fear: row.fear,
            sadness: row.sadness,
        }
    }
}

/// Cover URL shown for an entry: the large variant of the thumbnail, or the
/// placeholder image when there is none.
pub fn large_thumbnail(thumbnail: Option<&str>) -> String {
    match thumbnail {
        Some(url) if !url.is_empty() => format!("{}{}", url, constants::LARGE_THUMBNAIL_SUFFIX),
        _ => constants::COVER_NOT_FOUND.to_string(),
    }
}

pub struct Catalog {
    entries: Vec<CatalogEntry>,
    by_isbn: HashMap<u64, usize>,
}

impl Catalog {
    pub fn load(path: &Path) -> Result<Self, CatalogLoadError> {
        let file = File::open(path).map_err(|source| CatalogLoadError::Io {
            path: path.to_path_buf(),
            source,
        })?;

        let mut reader = csv::Reader::from_reader(file);
        let headers = reader.headers().map_err(|source| CatalogLoadError::Csv {
            path: path.to_path_buf(),
            source,
        })?;
        if let Some(column) = REQUIRED_COLUMNS
            .iter()
            .find(|column| !headers.iter().any(|h| h == **column))
        {
            return Err(CatalogLoadError::MissingColumn {
                path: path.to_path_buf(),
                column: column.to_string(),
            });
        }

        let mut entries = Vec::new();
        for row in reader.deserialize::<CatalogRow>() {
            let row = row.map_err(|source| CatalogLoadError::Csv {
                path: path.to_path_buf(),
                source,
            })?;
            entries.push(CatalogEntry::from(row));
        }

        let catalog = Self::from_entries(entries).map_err(|isbn13| {
            CatalogLoadError::DuplicateIsbn {
                path: path.to_path_buf(),
                isbn13,
            }
        })?;

        debug!(
            "Loaded {} catalog entries from {}",
            catalog.len(),
            path.display()
        );
        Ok(catalog)
    }

    /// Build a catalog from already-parsed entries, keeping their order.
    /// Returns the first duplicated isbn13 on failure.
    pub fn from_entries(entries: Vec<CatalogEntry>) -> Result<Self, u64> {
        let mut by_isbn = HashMap::with_capacity(entries.len());
        for (position, entry) in entries.iter().enumerate() {
            if by_isbn.insert(entry.isbn13, position).is_some() {
                return Err(entry.isbn13);
            }
        }
        Ok(Self { entries, by_isbn })
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Entries in file order.
    pub fn entries(&self) -> &[CatalogEntry] {
        &self.entries
    }

    pub fn get(&self, isbn13: u64) -> Option<&CatalogEntry> {
        self.by_isbn.get(&isbn13).map(|&i| &self.entries[i])
    }

    pub fn contains(&self, isbn13: u64) -> bool {
        self.by_isbn.contains_key(&isbn13)
    }

    /// Distinct category labels, sorted.
    pub fn categories(&self) -> Vec<String> {
        self.entries
            .iter()
            .map(|e| e.simple_categories.clone())
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect()
    }

    /// Category choices offered to the user: "All" first, then every label.
    pub fn category_choices(&self) -> Vec<String> {
        std::iter::once(constants::ALL_SENTINEL.to_string())
            .chain(self.categories())
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    const HEADER: &str =
        "isbn13,title,authors,description,simple_categories,thumbnail,joy,surprise,anger,fear,sadness";

    fn write_csv(rows: &[&str]) -> tempfile::NamedTempFile {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "{}", HEADER).unwrap();
        for row in rows {
            writeln!(file, "{}", row).unwrap();
        }
        file
    }

    #[test]
    fn test_load_derives_large_thumbnail() {
        let file = write_csv(&[
            "1001,Moby Dick,Herman Melville,A whale.,Fiction,http://books.google.com/x?id=1,0.9,0.1,0.2,0.3,0.4",
            "1002,Untitled,,,Nonfiction,,0.1,0.1,0.1,0.1,0.1",
        ]);
        let catalog = Catalog::load(file.path()).unwrap();

        assert_eq!(catalog.len(), 2);
        let moby = catalog.get(1001).unwrap();
        assert_eq!(
            moby.large_thumbnail,
            "http://books.google.com/x?id=1&fife=w800"
        );
        let untitled = catalog.get(1002).unwrap();
        assert_eq!(untitled.thumbnail, None);
        assert_eq!(untitled.large_thumbnail, "cover-not-found.jpg");
        assert_eq!(untitled.authors, "");
    }

    #[test]
    fn test_large_thumbnail_never_empty() {
        assert_eq!(large_thumbnail(None), "cover-not-found.jpg");
        assert_eq!(large_thumbnail(Some("")), "cover-not-found.jpg");
        assert_eq!(large_thumbnail(Some("u")), "u&fife=w800");
    }

    #[test]
    fn test_extra_columns_are_ignored() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "isbn10,{},title_and_subtitle", HEADER).unwrap();
        writeln!(file, "x,7,T,A,D,Fiction,,0,0,0,0,0,T: S").unwrap();
        let catalog = Catalog::load(file.path()).unwrap();
        assert!(catalog.contains(7));
    }

    #[test]
    fn test_duplicate_isbn_is_rejected() {
        let file = write_csv(&[
            "1,A,X,D,Fiction,,0,0,0,0,0",
            "1,B,Y,D,Fiction,,0,0,0,0,0",
        ]);
        let err = Catalog::load(file.path()).err().unwrap();
        assert!(matches!(err, CatalogLoadError::DuplicateIsbn { isbn13: 1, .. }));
    }

    #[test]
    fn test_malformed_row_is_rejected() {
        let file = write_csv(&["1,A,X,D,Fiction,,not-a-number,0,0,0,0"]);
        let err = Catalog::load(file.path()).err().unwrap();
        assert!(matches!(err, CatalogLoadError::Csv { .. }));
    }

    #[test]
    fn test_missing_column_is_rejected() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(
            file,
            "isbn13,title,authors,description,simple_categories,joy,surprise,anger,fear,sadness"
        )
        .unwrap();
        writeln!(file, "1001,Moby Dick,Herman Melville,A whale.,Fiction,0.9,0,0,0,0").unwrap();

        let err = Catalog::load(file.path()).err().unwrap();
        match err {
            CatalogLoadError::MissingColumn { column, .. } => assert_eq!(column, "thumbnail"),
            other => panic!("expected MissingColumn, got {:?}", other),
        }
    }

    #[test]
    fn test_missing_optional_columns_are_rejected() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "isbn13,title,simple_categories,joy,surprise,anger,fear,sadness").unwrap();
        writeln!(file, "1001,Moby Dick,Fiction,0.9,0,0,0,0").unwrap();

        let err = Catalog::load(file.path()).err().unwrap();
        assert!(matches!(
            err,
            CatalogLoadError::MissingColumn { ref column, .. } if column == "authors"
        ));
    }

    #[test]
    fn test_missing_file() {
        let err = Catalog::load(Path::new("/nonexistent/books.csv")).err().unwrap();
        assert!(matches!(err, CatalogLoadError::Io { .. }));
    }

    #[test]
    fn test_category_choices_sorted_with_all_first() {
        let file = write_csv(&[
            "1,A,X,D,Nonfiction,,0,0,0,0,0",
            "2,B,Y,D,Fiction,,0,0,0,0,0",
            "3,C,Z,D,Fiction,,0,0,0,0,0",
        ]);
        let catalog = Catalog::load(file.path()).unwrap();
        assert_eq!(
            catalog.category_choices(),
            vec!["All", "Fiction", "Nonfiction"]
        );
    }

    #[test]
    fn test_emotion_score_selects_field() {
        let file = write_csv(&["1,A,X,D,Fiction,,0.1,0.2,0.3,0.4,0.5"]);
        let catalog = Catalog::load(file.path()).unwrap();
        let entry = catalog.get(1).unwrap();
        assert_eq!(entry.emotion_score(Emotion::Joy), 0.1);
        assert_eq!(entry.emotion_score(Emotion::Surprise), 0.2);
        assert_eq!(entry.emotion_score(Emotion::Anger), 0.3);
        assert_eq!(entry.emotion_score(Emotion::Fear), 0.4);
        assert_eq!(entry.emotion_score(Emotion::Sadness), 0.5);
    }
}
