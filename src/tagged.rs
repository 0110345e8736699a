//! Tagged description lines: `<isbn13> <description text>`, one per book.

use crate::error::CatalogLoadError;
use log::debug;
use std::fs;
use std::path::Path;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaggedLine {
    pub isbn13: u64,
    /// The full line as it appears in the file; this is what gets embedded.
    pub text: String,
}

impl TaggedLine {
    /// Parse the leading identifier token. Upstream exports sometimes wrap a
    /// whole line in double quotes, so those are stripped first.
    pub fn parse(line: &str) -> Result<Self, String> {
        let text = line.trim();
        let token = text
            .trim_matches('"')
            .split_whitespace()
            .next()
            .ok_or_else(|| "line is empty".to_string())?;
        let isbn13 = token
            .parse::<u64>()
            .map_err(|e| format!("leading token {:?} is not an identifier: {}", token, e))?;

        Ok(Self {
            isbn13,
            text: text.to_string(),
        })
    }
}

/// Load every non-blank line of a tagged-description file.
pub fn load_tagged_lines(path: &Path) -> Result<Vec<TaggedLine>, CatalogLoadError> {
    let content = fs::read_to_string(path).map_err(|source| CatalogLoadError::Io {
        path: path.to_path_buf(),
        source,
    })?;

    let lines = parse_tagged_lines(&content).map_err(|(line_number, reason)| {
        CatalogLoadError::MalformedTaggedLine {
            path: path.to_path_buf(),
            line_number,
            reason,
        }
    })?;

    if lines.is_empty() {
        return Err(CatalogLoadError::EmptyTaggedFile(path.to_path_buf()));
    }

    debug!("Loaded {} tagged lines from {}", lines.len(), path.display());
    Ok(lines)
}

/// Errors carry the 1-based line number.
fn parse_tagged_lines(content: &str) -> Result<Vec<TaggedLine>, (usize, String)> {
    content
        .lines()
        .enumerate()
        .filter(|(_, line)| !line.trim().is_empty())
        .map(|(i, line)| TaggedLine::parse(line).map_err(|reason| (i + 1, reason)))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_leading_token() {
        let line = TaggedLine::parse("9780002005883 A NOVEL THAT READERS and critics").unwrap();
        assert_eq!(line.isbn13, 9780002005883);
        assert_eq!(line.text, "9780002005883 A NOVEL THAT READERS and critics");
    }

    #[test]
    fn test_parse_quoted_line() {
        let line = TaggedLine::parse("\"9780006178736 Lost in the wilds.\"").unwrap();
        assert_eq!(line.isbn13, 9780006178736);
    }

    #[test]
    fn test_parse_rejects_non_numeric_token() {
        assert!(TaggedLine::parse("abc some text").is_err());
        assert!(TaggedLine::parse("   ").is_err());
    }

    #[test]
    fn test_blank_lines_skipped_and_numbered() {
        let lines = parse_tagged_lines("1 one\n\n2 two\n   \n3 three\n").unwrap();
        let ids: Vec<u64> = lines.iter().map(|l| l.isbn13).collect();
        assert_eq!(ids, vec![1, 2, 3]);

        let err = parse_tagged_lines("1 one\n\nbad line\n").unwrap_err();
        assert_eq!(err.0, 3);
    }

    #[test]
    fn test_load_empty_file() {
        let file = tempfile::NamedTempFile::new().unwrap();
        let err = load_tagged_lines(file.path()).unwrap_err();
        assert!(matches!(err, CatalogLoadError::EmptyTaggedFile(_)));
    }
}
