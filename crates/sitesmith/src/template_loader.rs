//! Template loader confined to a single template root directory.

use crate::error::{Result, SiteError};
use std::fs;
use std::path::{Path, PathBuf};

/// Loads template sources by relative name from a template root
#[derive(Debug, Clone)]
pub struct TemplateLoader {
    root: PathBuf,
}

impl TemplateLoader {
    /// Create a loader for the given template root directory
    pub fn new(root: impl AsRef<Path>) -> Result<Self> {
        let root = root
            .as_ref()
            .canonicalize()
            .map_err(|e| SiteError::TemplateRoot {
                message: format!("{}: {e}", root.as_ref().display()),
            })?;

        if !root.is_dir() {
            return Err(SiteError::TemplateRoot {
                message: format!("{} is not a directory", root.display()),
            });
        }

        Ok(Self { root })
    }

    /// The canonical template root
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Load the source of template `name`.
    ///
    /// Returns `Ok(None)` when no such template exists, so callers can fall
    /// back to another one.
    pub fn load(&self, name: &str) -> Result<Option<String>> {
        validate_template_name(name)?;

        let path = self.root.join(name);
        if !path.is_file() {
            return Ok(None);
        }
        self.ensure_within_root(name, &path)?;

        Ok(Some(fs::read_to_string(&path)?))
    }

    fn ensure_within_root(&self, name: &str, path: &Path) -> Result<()> {
        let resolved = path.canonicalize()?;
        if resolved.starts_with(&self.root) {
            return Ok(());
        }

        Err(SiteError::TemplateName {
            name: name.to_string(),
            message: format!("resolves outside the template root ({})", resolved.display()),
        })
    }
}

/// Validate a template name before touching the filesystem
fn validate_template_name(name: &str) -> Result<()> {
    let invalid = |message: &str| SiteError::TemplateName {
        name: name.to_string(),
        message: message.to_string(),
    };

    if name.is_empty() {
        return Err(invalid("empty name"));
    }

    if name.starts_with('/') {
        return Err(invalid("must be relative to the template root"));
    }

    if name.contains("..") || name.contains("//") || name.contains('\\') || name.contains(':') {
        return Err(invalid("path traversal"));
    }

    for segment in name.split('/') {
        if !is_valid_segment(segment) {
            return Err(invalid(&format!("invalid segment '{segment}'")));
        }
    }

    Ok(())
}

fn is_valid_segment(segment: &str) -> bool {
    let mut chars = segment.chars();
    match chars.next() {
        Some(c) if c.is_ascii_alphanumeric() || c == '_' => {}
        _ => return false,
    }
    chars.all(|c| c.is_ascii_alphanumeric() || matches!(c, '_' | '-' | '.'))
}
