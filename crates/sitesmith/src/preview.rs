//! Live preview pages.

use std::fmt;
use std::str::FromStr;

use crate::error::SiteError;

/// Pages that can be previewed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Page {
    Home,
    About,
    Contact,
    Privacy,
    Terms,
}

impl Page {
    pub const ALL: [Page; 5] = [Page::Home, Page::About, Page::Contact, Page::Privacy, Page::Terms];

    pub fn as_str(self) -> &'static str {
        match self {
            Page::Home => "home",
            Page::About => "about",
            Page::Contact => "contact",
            Page::Privacy => "privacy",
            Page::Terms => "terms",
        }
    }
}

impl fmt::Display for Page {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Page {
    type Err = SiteError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Page::ALL
            .into_iter()
            .find(|page| page.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| SiteError::UnknownPage {
                name: s.to_string(),
            })
    }
}

/// Document shown in place of a page that failed to render
pub fn failure_document(page: Page, err: &SiteError) -> String {
    let message = html_escape::encode_text(&err.to_string()).into_owned();
    format!(
        "<!doctype html><html><head><meta charset='utf-8'><title>Preview unavailable</title></head>\
         <body><div role='alert' style='padding:12px;border:1px solid #dc2626;color:#991b1b;'>\
         Rendering the {page} page failed: {message}</div>\
         <p>Preview unavailable.</p></body></html>"
    )
}
