//! Site build orchestration.
//!
//! A build runs in four steps: clean `dist/`, copy assets, generate pages,
//! write the content hash. Every copied file (by output path and bytes) and
//! every rendered page feeds the hash in build order, so the marker changes
//! iff some published file changes.

use std::fs;
use std::path::{Path, PathBuf};

use hp_config::{Environment, SiteConfig};
use sha2::{Digest, Sha256};

use crate::error::BuildError;
use crate::front_matter::parse_front_matter;
use crate::markdown::render_markdown;
use crate::page::{PageMetadata, PageType, href_for};
use crate::templates::{PageContext, Templates};
use crate::{MARKER_FILENAME, RELOAD_SCRIPT_PATH};

/// Page source file name.
const INDEX_MD: &str = "index.md";
/// Author scratch notes, never published.
const NOTES_MD: &str = "notes.md";
/// Generated page file name.
const INDEX_HTML: &str = "index.html";
/// Pages directory whose landing page lists blog posts.
const BLOG_DIR: &str = "blog";

/// Summary of a completed build.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuildReport {
    /// Number of generated pages.
    pub pages: usize,
    /// Number of files copied verbatim (assets and page-local files).
    pub copied: usize,
    /// Number of blog posts discovered.
    pub blog_posts: usize,
    /// Hex SHA-256 of all published files, as written to the marker.
    pub sha256: String,
}

/// Builds a site from its source layout.
#[derive(Debug, Clone)]
pub struct SiteBuilder {
    site: SiteConfig,
    live_reload: bool,
    /// Marker location relative to the output dir.
    marker: PathBuf,
}

impl SiteBuilder {
    /// Create a builder for the given layout.
    #[must_use]
    pub fn new(site: SiteConfig) -> Self {
        Self {
            site,
            live_reload: false,
            marker: PathBuf::from(MARKER_FILENAME),
        }
    }

    /// Inject the reload client into `dev` builds.
    #[must_use]
    pub fn with_live_reload(mut self, enabled: bool) -> Self {
        self.live_reload = enabled;
        self
    }

    /// Write the marker at the site path `marker_path` (`/sha256.txt` by
    /// default) so it is served where reload clients poll.
    #[must_use]
    pub fn with_marker_path(mut self, marker_path: &str) -> Self {
        self.marker = marker_path.trim_start_matches('/').split('/').collect();
        self
    }

    /// Run a full build.
    ///
    /// # Errors
    ///
    /// Returns an error if the layout is not a site root, a page is invalid,
    /// a template fails, or any filesystem operation fails.
    pub fn build(&self) -> Result<BuildReport, BuildError> {
        self.assert_project_root()?;

        tracing::info!(pages = %self.site.pages_dir.display(), env = %self.site.env, "Starting build");

        let mut ctx = BuildContext {
            site: &self.site,
            templates: Templates::load(&self.site.templates_dir)?,
            reload_script: self.reload_script(),
            hasher: Sha256::new(),
            blog_posts: Vec::new(),
            pages: 0,
            copied: 0,
        };

        tracing::info!(dist = %self.site.dist_dir.display(), "Setting up dist dir");
        clean_dist(&self.site.dist_dir)?;

        tracing::info!("Copying assets");
        ctx.copy_assets()?;

        tracing::info!("Generating pages");
        ctx.gen_pages(&self.site.pages_dir)?;

        let sha256 = ctx.write_sha(&self.marker)?;
        tracing::info!("Build complete.");

        Ok(BuildReport {
            pages: ctx.pages,
            copied: ctx.copied,
            blog_posts: ctx.blog_posts.len(),
            sha256,
        })
    }

    fn assert_project_root(&self) -> Result<(), BuildError> {
        if !self.site.pages_dir.is_dir() || !self.site.templates_dir.join("base.html").is_file() {
            let root = self
                .site
                .pages_dir
                .parent()
                .map_or_else(|| self.site.pages_dir.clone(), Path::to_path_buf);
            return Err(BuildError::NotProjectRoot(root));
        }
        Ok(())
    }

    fn reload_script(&self) -> String {
        if self.live_reload && self.site.env == Environment::Dev {
            format!("<script src=\"{RELOAD_SCRIPT_PATH}\" defer></script>")
        } else {
            String::new()
        }
    }
}

/// Mutable state of one build run.
struct BuildContext<'a> {
    site: &'a SiteConfig,
    templates: Templates,
    reload_script: String,
    hasher: Sha256,
    blog_posts: Vec<PageMetadata>,
    pages: usize,
    copied: usize,
}

impl BuildContext<'_> {
    fn copy_assets(&mut self) -> Result<(), BuildError> {
        let assets_dir = &self.site.assets_dir;
        if !assets_dir.is_dir() {
            tracing::debug!(assets = %assets_dir.display(), "No assets directory, skipping");
            return Ok(());
        }
        self.copy_tree(assets_dir, Path::new(""))
    }

    /// Copy `src_dir` into `<dist>/<rel>` in name order, skipping dotfiles.
    fn copy_tree(&mut self, src_dir: &Path, rel: &Path) -> Result<(), BuildError> {
        ensure_dir(&self.site.dist_dir.join(rel))?;

        for src_path in sorted_entries(src_dir)? {
            if is_dotfile(&src_path) {
                continue;
            }
            let Some(name) = src_path.file_name() else {
                continue;
            };
            let rel_path = rel.join(name);
            if src_path.is_dir() {
                self.copy_tree(&src_path, &rel_path)?;
            } else {
                self.copy_file(&src_path, &rel_path)?;
            }
        }
        Ok(())
    }

    /// Generate pages under `dir`, subdirectories first.
    fn gen_pages(&mut self, dir: &Path) -> Result<(), BuildError> {
        if !dir.is_dir() {
            return Err(BuildError::NotADirectory(dir.to_path_buf()));
        }

        let rel = self.relative_to_pages(dir);
        ensure_dir(&self.site.dist_dir.join(&rel))?;

        let mut files = Vec::new();
        for src_path in sorted_entries(dir)? {
            if is_dotfile(&src_path) {
                continue;
            }
            if src_path.is_dir() {
                self.gen_pages(&src_path)?;
            } else if src_path.is_file() {
                files.push(src_path);
            }
        }

        for src_path in files {
            match src_path.file_name().and_then(|n| n.to_str()) {
                Some(INDEX_MD) => self.gen_page(&src_path)?,
                Some(NOTES_MD) => {}
                _ => {
                    let rel_path = self.relative_to_pages(&src_path);
                    self.copy_file(&src_path, &rel_path)?;
                }
            }
        }
        Ok(())
    }

    fn gen_page(&mut self, src_path: &Path) -> Result<(), BuildError> {
        let site = self.site;
        let page_dir = src_path.parent().unwrap_or(&site.pages_dir);
        let rel_dir = self.relative_to_pages(page_dir);
        let dst_path = site.dist_dir.join(&rel_dir).join(INDEX_HTML);

        let raw = fs::read_to_string(src_path).map_err(BuildError::io(src_path))?;
        let (front_matter, markdown) = parse_front_matter(src_path, &raw)?;
        let meta = PageMetadata::from_front_matter(src_path, href_for(&rel_dir), &front_matter)?;

        let blog_dir = site.pages_dir.join(BLOG_DIR);
        if meta.page_type == PageType::BlogPost && page_dir.starts_with(&blog_dir) {
            self.blog_posts.push(meta.clone());
        }

        let mut content = render_markdown(&markdown);
        if page_dir == blog_dir {
            let mut posts = self.blog_posts.clone();
            // Newest first; titles break ties so output stays stable.
            posts.sort_by(|a, b| b.date.cmp(&a.date).then_with(|| a.title.cmp(&b.title)));
            content.push_str(&self.templates.render_blog_index(&posts)?);
        }

        let page = self.templates.render_page(PageContext {
            title: &meta.title,
            env: site.env.as_str(),
            date: meta.date.as_deref(),
            content,
            reload_script: &self.reload_script,
        })?;

        self.hasher.update(page.as_bytes());
        tracing::info!(src = %src_path.display(), dst = %dst_path.display(), "Generating page");
        fs::write(&dst_path, page).map_err(BuildError::io(&dst_path))?;
        self.pages += 1;
        Ok(())
    }

    fn write_sha(&mut self, marker: &Path) -> Result<String, BuildError> {
        let sha = hex::encode(std::mem::take(&mut self.hasher).finalize());
        tracing::info!(sha256 = %sha, "Computed content hash");

        let sha_path = self.site.dist_dir.join(marker);
        if let Some(parent) = sha_path.parent() {
            ensure_dir(parent)?;
        }
        fs::write(&sha_path, &sha).map_err(BuildError::io(&sha_path))?;
        Ok(sha)
    }

    /// Copy `src` to `<dist>/<rel>` and feed it into the content hash.
    fn copy_file(&mut self, src: &Path, rel: &Path) -> Result<(), BuildError> {
        let dst = self.site.dist_dir.join(rel);
        tracing::info!(src = %src.display(), dst = %dst.display(), "Copying file");

        let bytes = fs::read(src).map_err(BuildError::io(src))?;
        // Path and length framing keep a rename or a split file from hashing
        // the same as the original.
        self.hasher.update(rel.to_string_lossy().as_bytes());
        self.hasher.update((bytes.len() as u64).to_le_bytes());
        self.hasher.update(&bytes);

        fs::write(&dst, bytes).map_err(BuildError::io(&dst))?;
        self.copied += 1;
        Ok(())
    }

    fn relative_to_pages(&self, path: &Path) -> PathBuf {
        path.strip_prefix(&self.site.pages_dir)
            .map(Path::to_path_buf)
            .unwrap_or_default()
    }
}

fn clean_dist(dist_dir: &Path) -> Result<(), BuildError> {
    if !dist_dir.exists() {
        return Ok(());
    }
    if !dist_dir.is_dir() {
        return Err(BuildError::NotADirectory(dist_dir.to_path_buf()));
    }
    fs::remove_dir_all(dist_dir).map_err(BuildError::io(dist_dir))
}

fn ensure_dir(dir: &Path) -> Result<(), BuildError> {
    if !dir.exists() {
        fs::create_dir_all(dir).map_err(BuildError::io(dir))
    } else if !dir.is_dir() {
        Err(BuildError::NotADirectory(dir.to_path_buf()))
    } else {
        Ok(())
    }
}

fn is_dotfile(path: &Path) -> bool {
    path.file_name()
        .is_some_and(|name| name.to_string_lossy().starts_with('.'))
}

/// Directory entries in name order, so builds (and their hash) are reproducible.
fn sorted_entries(dir: &Path) -> Result<Vec<PathBuf>, BuildError> {
    let mut entries = fs::read_dir(dir)
        .map_err(BuildError::io(dir))?
        .map(|entry| entry.map(|e| e.path()))
        .collect::<Result<Vec<_>, _>>()
        .map_err(BuildError::io(dir))?;
    entries.sort();
    Ok(entries)
}
