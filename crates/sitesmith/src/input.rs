//! Raw site description as filled in through the form.

use std::collections::BTreeMap;

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value as JsonValue;

use crate::error::Result;

/// Everything the form collects for one business site.
///
/// Every field is optional. Keys that are not modelled here are kept in
/// [`SiteInput::extra`] and reach the templates untouched.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct SiteInput {
    // identity
    pub biz_name: String,
    pub biz_phone: String,
    pub biz_email: String,
    pub biz_cat: String,
    pub biz_hours: String,
    pub prod_url: String,
    pub biz_logo: String,
    pub biz_addr: String,
    #[serde(deserialize_with = "comma_list")]
    pub area_list: Vec<String>,
    pub map_iframe: String,

    // content and SEO
    pub hero_h: String,
    pub seo_d: String,
    pub biz_key: String,
    #[serde(deserialize_with = "line_list")]
    pub biz_serv: Vec<String>,
    pub about_txt: String,

    // assets
    pub custom_hero: String,
    pub custom_feat: String,
    pub custom_gall: String,

    // commerce
    pub sheet_url: String,

    // social proof
    pub testi_raw: String,
    pub faq_raw: String,

    // legal
    pub priv_body: String,
    pub terms_body: String,

    pub layout_dna: String,
    #[serde(flatten)]
    pub theme: Theme,
    #[serde(flatten)]
    pub extra: BTreeMap<String, JsonValue>,
}

impl SiteInput {
    /// Parse a site description from JSON text
    pub fn from_json(text: &str) -> Result<Self> {
        Ok(serde_json::from_str(text)?)
    }
}

/// Styling choices passed straight through to templates
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Theme {
    pub p_color: String,
    pub s_color: String,
    pub border_rad: String,
    pub h_font: String,
    pub b_font: String,
    pub h_weight: String,
    pub ls: String,
    pub gsc_tag_input: String,
}

impl Default for Theme {
    fn default() -> Self {
        Self {
            p_color: "#0f172a".to_string(),
            s_color: "#06b6d4".to_string(),
            border_rad: "24px".to_string(),
            h_font: "Montserrat".to_string(),
            b_font: "Inter".to_string(),
            h_weight: "900".to_string(),
            ls: "-0.02em".to_string(),
            gsc_tag_input: String::new(),
        }
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum TextOrList {
    Text(String),
    List(Vec<String>),
}

fn split_list<'de, D>(deserializer: D, separator: char) -> std::result::Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let items = match TextOrList::deserialize(deserializer)? {
        TextOrList::Text(text) => text.split(separator).map(str::to_string).collect(),
        TextOrList::List(items) => items,
    };
    Ok(items
        .into_iter()
        .map(|item| item.trim().to_string())
        .filter(|item| !item.is_empty())
        .collect())
}

/// One entry per line
fn line_list<'de, D>(deserializer: D) -> std::result::Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    split_list(deserializer, '\n')
}

/// Comma separated
fn comma_list<'de, D>(deserializer: D) -> std::result::Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    split_list(deserializer, ',')
}
