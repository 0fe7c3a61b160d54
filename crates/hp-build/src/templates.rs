//! Page templates.
//!
//! `base.html` wraps every generated page; `blog_index.html` renders the list
//! of blog posts appended to the blog landing page. Both are minijinja
//! templates with HTML auto-escaping.

use std::path::{Path, PathBuf};

use minijinja::{Environment, Value, context};

use crate::error::BuildError;
use crate::page::PageMetadata;

const BASE_HTML: &str = "base.html";
const BLOG_INDEX_HTML: &str = "blog_index.html";

/// Variables passed to `base.html`.
pub(crate) struct PageContext<'a> {
    pub title: &'a str,
    pub env: &'a str,
    pub date: Option<&'a str>,
    /// Trusted HTML produced from markdown.
    pub content: String,
    /// Trusted HTML injected in dev builds; empty otherwise.
    pub reload_script: &'a str,
}

/// Template sources loaded once per build.
pub(crate) struct Templates {
    base: String,
    blog_index: Option<String>,
    blog_index_path: PathBuf,
}

impl Templates {
    /// Load templates from `dir`. `base.html` is required.
    pub fn load(dir: &Path) -> Result<Self, BuildError> {
        let base_path = dir.join(BASE_HTML);
        if !base_path.is_file() {
            return Err(BuildError::MissingTemplate(base_path));
        }
        let base = std::fs::read_to_string(&base_path).map_err(BuildError::io(&base_path))?;

        let blog_index_path = dir.join(BLOG_INDEX_HTML);
        let blog_index = if blog_index_path.is_file() {
            Some(std::fs::read_to_string(&blog_index_path).map_err(BuildError::io(&blog_index_path))?)
        } else {
            None
        };

        Ok(Self {
            base,
            blog_index,
            blog_index_path,
        })
    }

    /// Render a full page.
    pub fn render_page(&self, page: PageContext<'_>) -> Result<String, BuildError> {
        let ctx = context! {
            title => page.title,
            env => page.env,
            date => page.date,
            content => Value::from_safe_string(page.content),
            reload_script => Value::from_safe_string(page.reload_script.to_owned()),
        };
        render(BASE_HTML, &self.base, ctx)
    }

    /// Render the blog post listing.
    ///
    /// Fails if `blog_index.html` does not exist.
    pub fn render_blog_index(&self, posts: &[PageMetadata]) -> Result<String, BuildError> {
        let source = self
            .blog_index
            .as_deref()
            .ok_or_else(|| BuildError::MissingTemplate(self.blog_index_path.clone()))?;
        render(BLOG_INDEX_HTML, source, context! { blog_posts => posts })
    }
}

fn render(name: &str, source: &str, ctx: Value) -> Result<String, BuildError> {
    let to_error = |err: minijinja::Error| BuildError::Template {
        name: name.to_owned(),
        source: err,
    };

    let mut env = Environment::new();
    env.add_template(name, source).map_err(to_error)?;
    env.get_template(name)
        .and_then(|template| template.render(ctx))
        .map_err(to_error)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::page::PageType;
    use pretty_assertions::assert_eq;

    fn templates(base: &str, blog_index: Option<&str>) -> Templates {
        Templates {
            base: base.to_owned(),
            blog_index: blog_index.map(str::to_owned),
            blog_index_path: PathBuf::from("templates/blog_index.html"),
        }
    }

    fn page<'a>(content: &str) -> PageContext<'a> {
        PageContext {
            title: "A & B",
            env: "prod",
            date: None,
            content: content.to_owned(),
            reload_script: "",
        }
    }

    #[test]
    fn test_content_is_not_escaped_but_title_is() {
        let t = templates("<title>{{ title }}</title>{{ content }}", None);
        let html = t.render_page(page("<p>hi</p>")).unwrap();
        assert_eq!(html, "<title>A &amp; B</title><p>hi</p>");
    }

    #[test]
    fn test_optional_date() {
        let t = templates("{% if date %}<time>{{ date }}</time>{% endif %}{{ env }}", None);
        assert_eq!(t.render_page(page("")).unwrap(), "prod");

        let mut dated = page("");
        dated.date = Some("2024-05-01");
        assert_eq!(t.render_page(dated).unwrap(), "<time>2024-05-01</time>prod");
    }

    #[test]
    fn test_blog_index_lists_posts() {
        let t = templates(
            "",
            Some("{% for post in blog_posts %}<li>{{ post.date }} {{ post.title }}</li>{% endfor %}"),
        );
        let posts = vec![PageMetadata {
            href: "/blog/first/".to_owned(),
            page_type: PageType::BlogPost,
            title: "First".to_owned(),
            date: Some("2024-05-01".to_owned()),
        }];

        assert_eq!(
            t.render_blog_index(&posts).unwrap(),
            "<li>2024-05-01 First</li>"
        );
    }

    #[test]
    fn test_blog_index_missing_template() {
        let t = templates("", None);
        let err = t.render_blog_index(&[]).unwrap_err();
        assert!(matches!(err, BuildError::MissingTemplate(_)));
    }

    #[test]
    fn test_syntax_error_names_template() {
        let t = templates("{% if %}", None);
        let err = t.render_page(page("")).unwrap_err();
        assert!(err.to_string().contains("base.html"));
    }

    #[test]
    fn test_load_requires_base() {
        let dir = tempfile::tempdir().unwrap();
        assert!(matches!(
            Templates::load(dir.path()),
            Err(BuildError::MissingTemplate(_))
        ));
    }
}
