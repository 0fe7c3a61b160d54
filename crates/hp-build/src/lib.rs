//! Static site generation for hp.
//!
//! Turns a site source tree into a deployable `dist/` directory:
//!
//! ```text
//! assets/      ──copy──────────────────────────────► dist/
//! pages/**/index.md ──front matter + markdown──► base.html ──► dist/**/index.html
//! pages/**/<other files> ──copy────────────────────► dist/**
//!                                     all rendered pages ──sha256──► dist/sha256.txt
//! ```
//!
//! The `sha256.txt` marker changes whenever any rendered page changes, which is
//! what reload watchers poll for.
//!
//! # Example
//!
//! ```ignore
//! use hp_build::SiteBuilder;
//! use hp_config::SiteConfig;
//!
//! let report = SiteBuilder::new(SiteConfig::with_base(Path::new("."))).build()?;
//! println!("{}", report.sha256);
//! ```

mod builder;
mod error;
mod front_matter;
mod markdown;
mod page;
mod templates;

pub use builder::{BuildReport, SiteBuilder};
pub use error::BuildError;
pub use front_matter::{FrontMatter, parse_front_matter};
pub use markdown::render_markdown;
pub use page::{PageMetadata, PageType};

/// Name of the version marker written to the output root.
pub const MARKER_FILENAME: &str = "sha256.txt";

/// URL path of the development reload client injected in `dev` builds.
pub const RELOAD_SCRIPT_PATH: &str = "/__hp/reload.js";
