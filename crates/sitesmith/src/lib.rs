//! Sitesmith - a form-driven static website generator
//!
//! Business details collected through a form are sanitized into a rendering
//! context, merged into page templates for live preview, and packaged as a
//! zip of static pages:
//! - Untrusted text is cleaned down to a small HTML allowlist
//! - An optional CSV product feed is fetched, decoded and cached per URL
//! - Missing page templates fall back to their siblings
//!
//! # Example
//!
//! ```rust,no_run
//! use sitesmith::{SiteBuilder, SiteInput};
//!
//! let builder = SiteBuilder::new("templates").unwrap().without_feed();
//! let input = SiteInput::from_json(r#"{"biz_name": "Red Hippo"}"#).unwrap();
//!
//! let home = builder.render_home(&input).unwrap();
//! let archive = builder.build_zip(&input).unwrap();
//! # let _ = (home, archive);
//! ```

// Public modules
pub mod context;
pub mod error;
pub mod export;
pub mod feed;
pub mod input;
pub mod preview;
pub mod renderer;
pub mod sanitizer;
pub mod template_loader;

pub use context::{SiteContext, sanitize};
pub use error::{FeedError, Result, SiteError};
pub use export::{ARCHIVE_ENTRIES, ArchiveEntry};
pub use feed::{FeedConfig, FeedSource, Product, ProductFeed};
pub use input::{SiteInput, Theme};
pub use preview::Page;
pub use renderer::{PageTemplate, SiteRenderer};
pub use template_loader::TemplateLoader;

use std::io::{Seek, Write};
use std::path::Path;

/// Renders previews and archives for site descriptions
pub struct SiteBuilder {
    renderer: SiteRenderer,
    feed: Option<ProductFeed>,
}

impl SiteBuilder {
    /// Create a builder for the templates under `template_root`, with an
    /// HTTP product feed using the default [`FeedConfig`]
    pub fn new(template_root: impl AsRef<Path>) -> Result<Self> {
        let renderer = SiteRenderer::new(template_root)?;
        let feed = match ProductFeed::new(&FeedConfig::default()) {
            Ok(feed) => Some(feed),
            Err(err) => {
                log::warn!("product feeds disabled: {err}");
                None
            }
        };
        Ok(Self { renderer, feed })
    }

    /// Create a builder from an existing renderer, without a product feed
    pub fn from_renderer(renderer: SiteRenderer) -> Self {
        Self {
            renderer,
            feed: None,
        }
    }

    /// Use `feed` for product feeds
    pub fn with_feed(mut self, feed: ProductFeed) -> Self {
        self.feed = Some(feed);
        self
    }

    /// Never fetch product feeds
    pub fn without_feed(mut self) -> Self {
        self.feed = None;
        self
    }

    /// Sanitize `input` into a rendering context
    pub fn sanitize(&self, input: &SiteInput) -> SiteContext {
        context::sanitize(input, self.feed.as_ref())
    }

    /// Render the home page from the index template
    pub fn render_home(&self, input: &SiteInput) -> Result<String> {
        self.renderer.render(PageTemplate::Index, &self.sanitize(input))
    }

    /// Render the about page, falling back to the home template
    pub fn render_about(&self, input: &SiteInput) -> Result<String> {
        self.renderer.render(PageTemplate::About, &self.sanitize(input))
    }

    /// Render the contact page, falling back to the about, then home template
    pub fn render_contact(&self, input: &SiteInput) -> Result<String> {
        self.renderer.render(PageTemplate::Contact, &self.sanitize(input))
    }

    /// Minimal standalone page around a cleaned body
    pub fn render_basic_wrapper(&self, title: &str, body_html: &str) -> String {
        renderer::wrap_basic(title, body_html)
    }

    /// Render a single page of the site as it will appear in the archive
    pub fn render_page(&self, page: Page, input: &SiteInput) -> Result<String> {
        let ctx = self.sanitize(input);
        match page {
            Page::Home => self.renderer.render(PageTemplate::Index, &ctx),
            Page::About => self.renderer.render(PageTemplate::About, &ctx),
            Page::Contact => self.renderer.render(PageTemplate::Contact, &ctx),
            Page::Privacy => Ok(renderer::wrap_basic(export::PRIVACY_TITLE, &ctx.privacy_html)),
            Page::Terms => Ok(renderer::wrap_basic(export::TERMS_TITLE, &ctx.terms_html)),
        }
    }

    /// Render `page` for preview; failures become an inline error document
    pub fn render_preview(&self, page: Page, input: &SiteInput) -> String {
        match self.render_page(page, input) {
            Ok(html) => html,
            Err(err) => {
                log::error!("preview of {page} page failed: {err}");
                preview::failure_document(page, &err)
            }
        }
    }

    /// Render every archive entry from one sanitized snapshot of `input`
    pub fn assemble(&self, input: &SiteInput) -> Result<Vec<ArchiveEntry>> {
        export::assemble(&self.renderer, &self.sanitize(input))
    }

    /// Build the zip archive of the whole site in memory
    pub fn build_zip(&self, input: &SiteInput) -> Result<Vec<u8>> {
        export::build_archive(&self.renderer, &self.sanitize(input))
    }

    /// Build the zip archive of the whole site into `writer`
    pub fn write_zip<W: Write + Seek>(&self, input: &SiteInput, writer: W) -> Result<W> {
        let entries = self.assemble(input)?;
        export::write_archive(&entries, writer)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_builder_reuse() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("index.html.j2"), "Hello, {{ biz_name }}!").unwrap();
        let builder = SiteBuilder::from_renderer(SiteRenderer::new(dir.path()).unwrap());

        let alice = SiteInput {
            biz_name: "Alice".to_string(),
            ..SiteInput::default()
        };
        let bob = SiteInput {
            biz_name: "Bob".to_string(),
            ..SiteInput::default()
        };

        assert_eq!(builder.render_home(&alice).unwrap(), "Hello, Alice!");
        assert_eq!(builder.render_home(&bob).unwrap(), "Hello, Bob!");
    }
}
