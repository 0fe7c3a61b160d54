//! Markdown to HTML.

use pulldown_cmark::{Options, Parser, html};

/// Render a markdown body to an HTML fragment.
///
/// Tables, strikethrough and footnotes are enabled.
#[must_use]
pub fn render_markdown(markdown: &str) -> String {
    let options = Options::ENABLE_TABLES | Options::ENABLE_STRIKETHROUGH | Options::ENABLE_FOOTNOTES;
    let parser = Parser::new_ext(markdown, options);

    let mut output = String::with_capacity(markdown.len() * 3 / 2);
    html::push_html(&mut output, parser);
    output
}
