//! Page rendering on top of a minijinja environment.
//!
//! The environment is owned by a [`SiteRenderer`] built from an explicit
//! template root; there is no process-wide template state.

use crate::context::SiteContext;
use crate::error::{Result, SiteError};
use crate::sanitizer::clean_html;
use crate::template_loader::TemplateLoader;
use minijinja::{AutoEscape, Environment, ErrorKind, Value};
use std::fmt;
use std::path::Path;

/// Named page templates of a site
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PageTemplate {
    Index,
    About,
    Contact,
}

impl PageTemplate {
    /// File name of the template below the template root
    pub fn file_name(self) -> &'static str {
        match self {
            PageTemplate::Index => "index.html.j2",
            PageTemplate::About => "about.html.j2",
            PageTemplate::Contact => "contact.html.j2",
        }
    }

    /// Template to use when this one is absent
    pub fn fallback(self) -> Option<PageTemplate> {
        match self {
            PageTemplate::Index => None,
            PageTemplate::About => Some(PageTemplate::Index),
            PageTemplate::Contact => Some(PageTemplate::About),
        }
    }
}

impl fmt::Display for PageTemplate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.file_name())
    }
}

/// Renderer for the named page templates
pub struct SiteRenderer {
    env: Environment<'static>,
}

impl SiteRenderer {
    /// Create a renderer loading templates from `template_root`
    pub fn new(template_root: impl AsRef<Path>) -> Result<Self> {
        Ok(Self::with_loader(TemplateLoader::new(template_root)?))
    }

    /// Create a renderer over an existing loader
    pub fn with_loader(loader: TemplateLoader) -> Self {
        let mut env = Environment::new();
        env.set_auto_escape_callback(auto_escape_for);
        env.add_filter("url_encode", url_encode);
        env.add_filter("quote_attr", quote_attr);
        env.set_loader(move |name| {
            loader.load(name).map_err(|e| {
                minijinja::Error::new(ErrorKind::InvalidOperation, "failed to load template")
                    .with_source(e)
            })
        });
        Self { env }
    }

    /// Render `page`, walking its fallback chain past absent templates.
    ///
    /// Only absence triggers a fallback; a template that exists but fails to
    /// parse or render is reported as an error.
    pub fn render(&self, page: PageTemplate, ctx: &SiteContext) -> Result<String> {
        let Some(resolved) = self.resolve(page)? else {
            return Err(SiteError::TemplateNotFound {
                name: PageTemplate::Index.file_name().to_string(),
            });
        };
        let template = self.env.get_template(resolved.file_name())?;
        Ok(template.render(ctx)?)
    }

    /// Which template `page` resolves to, or `None` if its whole chain is absent
    pub fn resolve(&self, page: PageTemplate) -> Result<Option<PageTemplate>> {
        let mut current = Some(page);
        while let Some(candidate) = current {
            match self.env.get_template(candidate.file_name()) {
                Ok(_) => return Ok(Some(candidate)),
                Err(err) if err.kind() == ErrorKind::TemplateNotFound => {
                    current = candidate.fallback();
                    if let Some(next) = current {
                        log::debug!("template {candidate} missing, falling back to {next}");
                    }
                }
                Err(err) => return Err(err.into()),
            }
        }
        Ok(None)
    }
}

fn auto_escape_for(name: &str) -> AutoEscape {
    let name = name.strip_suffix(".j2").unwrap_or(name);
    if name.ends_with(".html") || name.ends_with(".htm") || name.ends_with(".xml") {
        AutoEscape::Html
    } else {
        AutoEscape::None
    }
}

/// Form-encode a value for use inside a URL; none and undefined become empty
fn url_encode(value: Value) -> String {
    if value.is_none() || value.is_undefined() {
        return String::new();
    }
    let text = match value.as_str() {
        Some(s) => s.to_string(),
        None => value.to_string(),
    };
    urlencoding::encode(&text).replace("%20", "+")
}

/// Make a value safe inside a double or single quoted attribute.
///
/// Safe strings are already entity-escaped markup, so only quotes are
/// encoded; anything else is fully attribute-escaped.
fn quote_attr(value: Value) -> Value {
    if value.is_none() || value.is_undefined() {
        return Value::from_safe_string(String::new());
    }
    let text = match value.as_str() {
        Some(s) => s.to_string(),
        None => value.to_string(),
    };
    let escaped = if value.is_safe() {
        text.replace('"', "&quot;").replace('\'', "&#x27;")
    } else {
        html_escape::encode_quoted_attribute(&text).into_owned()
    };
    Value::from_safe_string(escaped)
}

/// Minimal standalone document around a cleaned body.
///
/// Used for the legal and error pages, which do not go through templates.
pub fn wrap_basic(title: &str, body_html: &str) -> String {
    let title = html_escape::encode_text(title);
    let body = clean_html(body_html);
    format!(
        "<!doctype html><html><head><meta charset='utf-8'><title>{title}</title></head>\
         <body><main><h1>{title}</h1><div>{body}</div></main></body></html>"
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::sanitize;
    use crate::input::SiteInput;
    use pretty_assertions::assert_eq;
    use std::fs;
    use tempfile::TempDir;

    fn template_root(files: &[(&str, &str)]) -> TempDir {
        let dir = TempDir::new().unwrap();
        for (name, source) in files {
            fs::write(dir.path().join(name), source).unwrap();
        }
        dir
    }

    fn context(name: &str) -> SiteContext {
        sanitize(
            &SiteInput {
                biz_name: name.to_string(),
                ..SiteInput::default()
            },
            None,
        )
    }

    #[test]
    fn test_render_index() {
        let dir = template_root(&[("index.html.j2", "<h1>{{ biz_name }}</h1>")]);
        let renderer = SiteRenderer::new(dir.path()).unwrap();
        let html = renderer.render(PageTemplate::Index, &context("Test Co")).unwrap();
        assert_eq!(html, "<h1>Test Co</h1>");
    }

    #[test]
    fn test_fallback_chain() {
        let dir = template_root(&[
            ("index.html.j2", "index:{{ biz_name }}"),
            ("about.html.j2", "about:{{ biz_name }}"),
        ]);
        let renderer = SiteRenderer::new(dir.path()).unwrap();
        let ctx = context("Co");

        assert_eq!(renderer.render(PageTemplate::About, &ctx).unwrap(), "about:Co");
        assert_eq!(renderer.render(PageTemplate::Contact, &ctx).unwrap(), "about:Co");
        assert_eq!(
            renderer.resolve(PageTemplate::Contact).unwrap(),
            Some(PageTemplate::About)
        );
    }

    #[test]
    fn test_fallback_to_index() {
        let dir = template_root(&[("index.html.j2", "index")]);
        let renderer = SiteRenderer::new(dir.path()).unwrap();
        assert_eq!(
            renderer.render(PageTemplate::Contact, &context("Co")).unwrap(),
            "index"
        );
    }

    #[test]
    fn test_missing_index_is_an_error() {
        let dir = template_root(&[]);
        let renderer = SiteRenderer::new(dir.path()).unwrap();
        let result = renderer.render(PageTemplate::About, &context("Co"));
        assert!(matches!(result, Err(SiteError::TemplateNotFound { name }) if name == "index.html.j2"));
        assert_eq!(renderer.resolve(PageTemplate::About).unwrap(), None);
    }

    #[test]
    fn test_broken_template_does_not_fall_back() {
        let dir = template_root(&[
            ("index.html.j2", "index"),
            ("about.html.j2", "{% if %}"),
        ]);
        let renderer = SiteRenderer::new(dir.path()).unwrap();
        assert!(matches!(
            renderer.render(PageTemplate::About, &context("Co")),
            Err(SiteError::Template(_))
        ));
    }

    #[test]
    fn test_autoescape_and_undefined() {
        let dir = template_root(&[(
            "index.html.j2",
            "{{ biz_hours }}|{{ about_txt }}|{{ not_a_key }}",
        )]);
        let renderer = SiteRenderer::new(dir.path()).unwrap();
        let ctx = sanitize(
            &SiteInput {
                biz_hours: "<b>9-5 & late".to_string(),
                about_txt: "<p>About</p>".to_string(),
                ..SiteInput::default()
            },
            None,
        );
        assert_eq!(
            renderer.render(PageTemplate::Index, &ctx).unwrap(),
            "&lt;b&gt;9-5 &amp; late|<p>About</p>|"
        );
    }

    #[test]
    fn test_cleaned_text_is_not_escaped_twice() {
        let dir = template_root(&[("index.html.j2", "<title>{{ biz_name }}</title>")]);
        let renderer = SiteRenderer::new(dir.path()).unwrap();
        assert_eq!(
            renderer.render(PageTemplate::Index, &context("Smith & Sons")).unwrap(),
            "<title>Smith &amp; Sons</title>"
        );
    }

    #[test]
    fn test_quote_attr_filter() {
        let dir = template_root(&[(
            "index.html.j2",
            r#"<img alt="{{ biz_name|quote_attr }}" title="{{ biz_hours|quote_attr }}">"#,
        )]);
        let renderer = SiteRenderer::new(dir.path()).unwrap();
        let ctx = sanitize(
            &SiteInput {
                biz_name: r#"Tom "T" & Co"#.to_string(),
                biz_hours: r#"9" onmouseover="x()"#.to_string(),
                ..SiteInput::default()
            },
            None,
        );
        let html = renderer.render(PageTemplate::Index, &ctx).unwrap();
        assert!(html.starts_with(r#"<img alt="Tom &quot;T&quot; &amp; Co" title="9&quot;"#));
        assert!(!html.contains(r#"" onmouseover"#));
    }

    #[test]
    fn test_url_encode_filter() {
        let dir = template_root(&[(
            "index.html.j2",
            "https://wa.me/{{ biz_phone_wa }}?text={{ \"Hi there & welcome\"|url_encode }}{{ none|url_encode }}",
        )]);
        let renderer = SiteRenderer::new(dir.path()).unwrap();
        let ctx = sanitize(
            &SiteInput {
                biz_phone: "+91 84540 02711".to_string(),
                ..SiteInput::default()
            },
            None,
        );
        assert_eq!(
            renderer.render(PageTemplate::Index, &ctx).unwrap(),
            "https://wa.me/918454002711?text=Hi+there+%26+welcome"
        );
    }

    #[test]
    fn test_wrap_basic() {
        let html = wrap_basic("Terms & Conditions", "<p>Fair</p><script>x()</script>");
        assert_eq!(
            html,
            "<!doctype html><html><head><meta charset='utf-8'><title>Terms &amp; Conditions</title></head>\
             <body><main><h1>Terms &amp; Conditions</h1><div><p>Fair</p></div></main></body></html>"
        );
    }
}
