//! Sanitized rendering context.
//!
//! [`sanitize`] turns a raw [`SiteInput`] into the [`SiteContext`] that every
//! template and archive entry is rendered from. It never fails: unsafe
//! markup is dropped, missing images get stock fallbacks and an unreachable
//! product feed yields no products.

use std::collections::BTreeMap;

use minijinja::value::{serializing_for_value, Value};
use serde::{Serialize, Serializer};
use serde_json::Value as JsonValue;

use crate::feed::{Product, ProductFeed};
use crate::input::{SiteInput, Theme};
use crate::sanitizer::{clean_html, clean_iframe, ensure_trailing_slash, validate_url};

pub const DEFAULT_HERO_IMAGE: &str =
    "https://images.unsplash.com/photo-1519741497674-611481863552?auto=format&fit=crop&q=80&w=1600";
pub const DEFAULT_FEATURE_IMAGE: &str =
    "https://images.unsplash.com/photo-1511795409834-ef04bbd61622?auto=format&fit=crop&q=80&w=800";
pub const DEFAULT_GALLERY_IMAGE: &str =
    "https://images.unsplash.com/photo-1532712938310-34cb3982ef74?auto=format&fit=crop&q=80&w=1600";

pub const DEFAULT_LAYOUT: &str = "Default";
pub const DEFAULT_BUSINESS_NAME: &str = "Business Name";

/// Separator between a reviewer and their quote in `testi_raw`
const TESTIMONIAL_SEPARATOR: char = '|';
/// Separator between question and answer in `faq_raw`
const FAQ_SEPARATOR: &str = " ? ";

/// Keys computed here; same-named pass-through keys must not shadow them.
const DERIVED_KEYS: [&str; 6] = [
    "biz_phone_wa",
    "products",
    "testimonials",
    "faqs",
    "privacy_html",
    "terms_html",
];

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Testimonial {
    #[serde(serialize_with = "markup")]
    pub name: String,
    #[serde(serialize_with = "markup")]
    pub quote: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Faq {
    #[serde(serialize_with = "markup")]
    pub question: String,
    #[serde(serialize_with = "markup")]
    pub answer: String,
}

/// Normalized data for one render or export call
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SiteContext {
    #[serde(serialize_with = "markup")]
    pub biz_name: String,
    pub biz_phone: String,
    pub biz_phone_wa: String,
    #[serde(serialize_with = "markup")]
    pub biz_email: String,
    #[serde(serialize_with = "markup")]
    pub biz_cat: String,
    pub biz_hours: String,
    pub prod_url: String,
    pub biz_logo: String,
    #[serde(serialize_with = "markup")]
    pub biz_addr: String,
    pub area_list: Vec<String>,
    #[serde(serialize_with = "markup")]
    pub map_iframe: String,

    #[serde(serialize_with = "markup")]
    pub hero_h: String,
    #[serde(serialize_with = "markup")]
    pub seo_d: String,
    pub biz_key: String,
    #[serde(serialize_with = "markup_list")]
    pub biz_serv: Vec<String>,
    #[serde(serialize_with = "markup")]
    pub about_txt: String,

    pub custom_hero: String,
    pub custom_feat: String,
    pub custom_gall: String,

    pub sheet_url: String,
    pub products: Vec<Product>,

    pub testi_raw: String,
    pub faq_raw: String,
    pub testimonials: Vec<Testimonial>,
    pub faqs: Vec<Faq>,

    #[serde(serialize_with = "markup")]
    pub priv_body: String,
    #[serde(serialize_with = "markup")]
    pub terms_body: String,
    #[serde(serialize_with = "markup")]
    pub privacy_html: String,
    #[serde(serialize_with = "markup")]
    pub terms_html: String,

    pub layout_dna: String,
    #[serde(flatten)]
    pub theme: Theme,
    #[serde(flatten)]
    pub extra: BTreeMap<String, JsonValue>,
}

/// Serialize cleaned markup as a safe string for templates, plain text elsewhere
fn markup<S: Serializer>(html: &str, serializer: S) -> Result<S::Ok, S::Error> {
    if serializing_for_value() {
        Value::from_safe_string(html.to_string()).serialize(serializer)
    } else {
        serializer.serialize_str(html)
    }
}

fn markup_list<S: Serializer>(items: &[String], serializer: S) -> Result<S::Ok, S::Error> {
    if !serializing_for_value() {
        return items.serialize(serializer);
    }
    serializer.collect_seq(items.iter().map(|item| Value::from_safe_string(item.clone())))
}

/// Build the rendering context for `input`.
///
/// The only side effect is the product feed fetch, skipped when `feed` is
/// `None` or no feed URL was given.
pub fn sanitize(input: &SiteInput, feed: Option<&ProductFeed>) -> SiteContext {
    let biz_name = clean_html(&input.biz_name);
    let priv_body = clean_html(&input.priv_body);
    let terms_body = clean_html(&input.terms_body);

    let prod_url = input.prod_url.trim();
    if !prod_url.is_empty() && !validate_url(prod_url) {
        log::warn!("production URL {prod_url:?} is not an absolute http(s) URL");
    }

    SiteContext {
        biz_name: or_default(biz_name, DEFAULT_BUSINESS_NAME),
        biz_phone: input.biz_phone.clone(),
        biz_phone_wa: messaging_phone(&input.biz_phone),
        biz_email: clean_html(&input.biz_email),
        biz_cat: clean_html(&input.biz_cat),
        biz_hours: input.biz_hours.clone(),
        prod_url: ensure_trailing_slash(prod_url),
        biz_logo: input.biz_logo.clone(),
        biz_addr: clean_html(&input.biz_addr),
        area_list: input.area_list.clone(),
        map_iframe: clean_iframe(&input.map_iframe),

        hero_h: clean_html(&input.hero_h),
        seo_d: clean_html(&input.seo_d),
        biz_key: input.biz_key.clone(),
        biz_serv: input.biz_serv.iter().map(|s| clean_html(s)).collect(),
        about_txt: clean_html(&input.about_txt),

        custom_hero: or_default(input.custom_hero.trim().to_string(), DEFAULT_HERO_IMAGE),
        custom_feat: or_default(input.custom_feat.trim().to_string(), DEFAULT_FEATURE_IMAGE),
        custom_gall: or_default(input.custom_gall.trim().to_string(), DEFAULT_GALLERY_IMAGE),

        sheet_url: input.sheet_url.clone(),
        products: load_products(&input.sheet_url, feed),

        testi_raw: input.testi_raw.clone(),
        faq_raw: input.faq_raw.clone(),
        testimonials: parse_testimonials(&input.testi_raw),
        faqs: parse_faqs(&input.faq_raw),

        privacy_html: priv_body.clone(),
        terms_html: terms_body.clone(),
        priv_body,
        terms_body,

        layout_dna: or_default(input.layout_dna.trim().to_string(), DEFAULT_LAYOUT),
        theme: input.theme.clone(),
        extra: input
            .extra
            .iter()
            .filter(|(key, _)| !DERIVED_KEYS.contains(&key.as_str()))
            .map(|(key, value)| (key.clone(), value.clone()))
            .collect(),
    }
}

fn or_default(value: String, fallback: &str) -> String {
    if value.is_empty() {
        fallback.to_string()
    } else {
        value
    }
}

/// Digits of `phone`, suitable for `tel:` and WhatsApp links
pub fn messaging_phone(phone: &str) -> String {
    let kept: String = phone
        .trim()
        .chars()
        .filter(|c| c.is_ascii_digit() || *c == '+')
        .collect();
    kept.trim_start_matches('+')
        .chars()
        .filter(char::is_ascii_digit)
        .collect()
}

fn load_products(sheet_url: &str, feed: Option<&ProductFeed>) -> Vec<Product> {
    let sheet_url = sheet_url.trim();
    if sheet_url.is_empty() {
        return Vec::new();
    }
    let Some(feed) = feed else {
        log::debug!("product feed disabled, skipping {sheet_url}");
        return Vec::new();
    };

    match feed.fetch_products(sheet_url) {
        Ok(products) => products,
        Err(err) => {
            log::warn!("ignoring product feed {sheet_url}: {err}");
            Vec::new()
        }
    }
}

/// `Name | Quote`, one per line
pub fn parse_testimonials(raw: &str) -> Vec<Testimonial> {
    raw.lines()
        .filter_map(|line| line.split_once(TESTIMONIAL_SEPARATOR))
        .map(|(name, quote)| Testimonial {
            name: clean_html(name.trim()),
            quote: clean_html(quote.trim()),
        })
        .filter(|t| !t.name.is_empty() || !t.quote.is_empty())
        .collect()
}

/// `Question? ? Answer`, one per line
pub fn parse_faqs(raw: &str) -> Vec<Faq> {
    raw.lines()
        .filter_map(|line| line.split_once(FAQ_SEPARATOR))
        .map(|(question, answer)| Faq {
            question: clean_html(question.trim()),
            answer: clean_html(answer.trim()),
        })
        .filter(|f| !f.question.is_empty())
        .collect()
}
