//! Front matter parsing.
//!
//! Pages start with a block of `key: value` lines fenced by `---`:
//!
//! ```text
//! ---
//! title: Hello
//! page_type: blog_post
//! date: 2024-05-01
//! ---
//! # Markdown body
//! ```

use std::collections::BTreeMap;
use std::path::Path;

use crate::error::BuildError;

/// Front matter fence line.
const DELIMITER: &str = "---";

/// Parsed front matter fields.
pub type FrontMatter = BTreeMap<String, String>;

/// Split a page into its front matter and markdown body.
///
/// Keys and values are trimmed. Values may themselves contain `:`.
///
/// # Errors
///
/// Returns [`BuildError::FrontMatter`] if the opening or closing fence is
/// missing or a field line has no `:` separator.
pub fn parse_front_matter(path: &Path, content: &str) -> Result<(FrontMatter, String), BuildError> {
    let error = |message: &str| BuildError::FrontMatter {
        path: path.to_path_buf(),
        message: message.to_owned(),
    };

    let mut lines = content.lines();
    if lines.next() != Some(DELIMITER) {
        return Err(error("page is missing front matter"));
    }

    let mut front_matter = FrontMatter::new();
    loop {
        let line = lines
            .next()
            .ok_or_else(|| error("front matter is not closed with '---'"))?;
        if line == DELIMITER {
            break;
        }
        let (key, value) = line
            .split_once(':')
            .ok_or_else(|| error(&format!("expected 'key: value', got '{line}'")))?;
        front_matter.insert(key.trim().to_owned(), value.trim().to_owned());
    }

    let body = lines.collect::<Vec<_>>().join("\n");
    Ok((front_matter, body))
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn parse(content: &str) -> Result<(FrontMatter, String), BuildError> {
        parse_front_matter(Path::new("pages/index.md"), content)
    }

    #[test]
    fn test_parse_fields_and_body() {
        let (fm, body) = parse("---\ntitle: Home\npage_type: index\n---\n# Hi\n\nText").unwrap();

        assert_eq!(fm.get("title").map(String::as_str), Some("Home"));
        assert_eq!(fm.get("page_type").map(String::as_str), Some("index"));
        assert_eq!(body, "# Hi\n\nText");
    }

    #[test]
    fn test_value_may_contain_colon() {
        let (fm, _) = parse("---\ntitle: Rust: a retrospective\n---\n").unwrap();
        assert_eq!(
            fm.get("title").map(String::as_str),
            Some("Rust: a retrospective")
        );
    }

    #[test]
    fn test_keys_and_values_trimmed() {
        let (fm, _) = parse("---\n  title  :   Spaced   \n---\nbody").unwrap();
        assert_eq!(fm.get("title").map(String::as_str), Some("Spaced"));
    }

    #[test]
    fn test_empty_front_matter() {
        let (fm, body) = parse("---\n---\nbody").unwrap();
        assert!(fm.is_empty());
        assert_eq!(body, "body");
    }

    #[test]
    fn test_missing_opening_delimiter() {
        let err = parse("# Title\n").unwrap_err();
        assert!(err.to_string().contains("missing front matter"));
    }

    #[test]
    fn test_empty_file() {
        assert!(parse("").is_err());
    }

    #[test]
    fn test_missing_closing_delimiter() {
        let err = parse("---\ntitle: Home\n").unwrap_err();
        assert!(err.to_string().contains("not closed"));
    }

    #[test]
    fn test_line_without_separator() {
        let err = parse("---\ntitle Home\n---\n").unwrap_err();
        assert!(matches!(err, BuildError::FrontMatter { .. }));
        assert!(err.to_string().contains("title Home"));
    }
}
