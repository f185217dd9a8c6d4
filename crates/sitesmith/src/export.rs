//! Static site archive.
//!
//! An archive always holds the same eight entries, in the order of
//! [`ARCHIVE_ENTRIES`], all rendered from a single sanitized context.

use std::io::{Cursor, Seek, Write};

use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, DateTime, ZipWriter};

use crate::context::SiteContext;
use crate::error::Result;
use crate::renderer::{wrap_basic, PageTemplate, SiteRenderer};
use crate::sanitizer::sanitize_filename;

/// Entry names of every exported archive, in archive order
pub const ARCHIVE_ENTRIES: [&str; 8] = [
    "index.html",
    "about.html",
    "contact.html",
    "privacy.html",
    "terms.html",
    "404.html",
    "robots.txt",
    "sitemap.xml",
];

pub const PRIVACY_TITLE: &str = "Privacy Policy";
pub const TERMS_TITLE: &str = "Terms & Conditions";
pub const NOT_FOUND_TITLE: &str = "404 - Not Found";
const NOT_FOUND_BODY: &str = "<h1>404</h1><p>Not Found</p>";

/// One named file of the archive
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArchiveEntry {
    pub name: &'static str,
    pub contents: String,
}

/// Render every archive entry from `ctx`
pub fn assemble(renderer: &SiteRenderer, ctx: &SiteContext) -> Result<Vec<ArchiveEntry>> {
    let contents = [
        renderer.render(PageTemplate::Index, ctx)?,
        renderer.render(PageTemplate::About, ctx)?,
        renderer.render(PageTemplate::Contact, ctx)?,
        wrap_basic(PRIVACY_TITLE, &ctx.privacy_html),
        wrap_basic(TERMS_TITLE, &ctx.terms_html),
        wrap_basic(NOT_FOUND_TITLE, NOT_FOUND_BODY),
        robots_txt(&ctx.prod_url),
        sitemap_xml(&ctx.prod_url),
    ];

    Ok(ARCHIVE_ENTRIES
        .into_iter()
        .zip(contents)
        .map(|(name, contents)| ArchiveEntry { name, contents })
        .collect())
}

/// Write `entries` as a deflated zip archive into `writer`
pub fn write_archive<W: Write + Seek>(entries: &[ArchiveEntry], writer: W) -> Result<W> {
    // A fixed timestamp keeps archives of the same context byte-identical.
    let options = SimpleFileOptions::default()
        .compression_method(CompressionMethod::Deflated)
        .last_modified_time(DateTime::default());

    let mut zip = ZipWriter::new(writer);
    for entry in entries {
        zip.start_file(entry.name, options)?;
        zip.write_all(entry.contents.as_bytes())?;
    }
    Ok(zip.finish()?)
}

/// Render and zip a whole site into memory
pub fn build_archive(renderer: &SiteRenderer, ctx: &SiteContext) -> Result<Vec<u8>> {
    let entries = assemble(renderer, ctx)?;
    let cursor = write_archive(&entries, Cursor::new(Vec::new()))?;
    Ok(cursor.into_inner())
}

/// `robots.txt` pointing crawlers at the sitemap below `prod_url`
pub fn robots_txt(prod_url: &str) -> String {
    format!("User-agent: *\nAllow: /\nSitemap: {prod_url}sitemap.xml")
}

/// Minimal sitemap listing the home and about pages below `prod_url`
pub fn sitemap_xml(prod_url: &str) -> String {
    let base = html_escape::encode_double_quoted_attribute(prod_url);
    format!(
        "<?xml version='1.0' encoding='UTF-8'?>\
         <urlset xmlns='http://www.sitemaps.org/schemas/sitemap/0.9'>\
         <url><loc>{base}index.html</loc></url>\
         <url><loc>{base}about.html</loc></url>\
         </urlset>"
    )
}

/// Download name for the archive of `biz_name`
pub fn archive_file_name(biz_name: &str) -> String {
    let stem = biz_name.trim().to_lowercase().replace(' ', "_");
    let stem = if stem.is_empty() { "site".to_string() } else { stem };
    sanitize_filename(&format!("{stem}_final.zip"))
}
