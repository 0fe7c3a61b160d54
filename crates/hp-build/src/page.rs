//! Page metadata.

use std::path::Path;
use std::str::FromStr;
use std::sync::LazyLock;

use regex::Regex;
use serde::Serialize;

use crate::error::BuildError;
use crate::front_matter::FrontMatter;

static DATE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\d{4}-\d{2}-\d{2}$").expect("valid date regex"));

/// Kind of page, from the `page_type` front matter field.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PageType {
    /// Regular page.
    Index,
    /// Dated post listed on the blog index.
    BlogPost,
}

impl FromStr for PageType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "index" => Ok(Self::Index),
            "blog_post" => Ok(Self::BlogPost),
            other => Err(format!(
                "unknown page_type '{other}' (expected 'index' or 'blog_post')"
            )),
        }
    }
}

/// Validated metadata of a generated page.
///
/// Serialized into templates (`blog_posts` entries expose `href`, `page_type`,
/// `title` and `date`).
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct PageMetadata {
    /// Site-absolute URL with trailing slash (`/`, `/blog/first-post/`).
    pub href: String,
    /// Page kind.
    pub page_type: PageType,
    /// Page title (required).
    pub title: String,
    /// Publication date `YYYY-MM-DD` (required for blog posts).
    pub date: Option<String>,
}

impl PageMetadata {
    /// Build and validate metadata from front matter.
    ///
    /// # Errors
    ///
    /// Returns [`BuildError::InvalidPage`] when `title` or `page_type` is
    /// missing or invalid, or a blog post lacks a well-formed `date`.
    pub fn from_front_matter(
        path: &Path,
        href: String,
        front_matter: &FrontMatter,
    ) -> Result<Self, BuildError> {
        let invalid = |message: String| BuildError::InvalidPage {
            path: path.to_path_buf(),
            message,
        };

        let page_type = front_matter
            .get("page_type")
            .ok_or_else(|| invalid("missing page_type".to_owned()))?
            .parse::<PageType>()
            .map_err(invalid)?;

        let title = front_matter
            .get("title")
            .filter(|t| !t.is_empty())
            .ok_or_else(|| invalid("page must have a title".to_owned()))?
            .clone();

        let date = front_matter.get("date").cloned();

        if page_type == PageType::BlogPost {
            let Some(date) = &date else {
                return Err(invalid("blog post must have a date".to_owned()));
            };
            if !DATE_RE.is_match(date) {
                return Err(invalid(format!(
                    "blog post date must be in the format YYYY-MM-DD, got '{date}'"
                )));
            }
        }

        Ok(Self {
            href,
            page_type,
            title,
            date,
        })
    }
}

/// Site-absolute href for a page directory relative to the pages root.
pub(crate) fn href_for(relative_dir: &Path) -> String {
    let segments: Vec<_> = relative_dir
        .components()
        .filter_map(|c| match c {
            std::path::Component::Normal(s) => Some(s.to_string_lossy().into_owned()),
            _ => None,
        })
        .collect();

    if segments.is_empty() {
        "/".to_owned()
    } else {
        format!("/{}/", segments.join("/"))
    }
}
