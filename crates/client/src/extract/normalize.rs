//! Content normalization for extracted comics.
//!
//! Turns whatever a source's extractor produced into display-ready data:
//!
//! 1. validation: media without payload are dropped and an empty record
//!    gets a generic error
//! 2. every media `href` is resolved against the origin page
//! 3. `html` media are passed through an allow-list sanitizer, after which
//!    `img` `src` and `srcset` URLs are resolved the same way
//!
//! Normalization performs no I/O and never fails.

use std::borrow::Cow;
use std::collections::{HashMap, HashSet};

use ammonia::{Builder, UrlRelative};
use funnies_core::{ComicData, Media, MediaKind};
use url::Url;

use crate::fetch::{fix_srcset, fix_url};

/// Tags kept by the sanitizer.
const ALLOWED_TAGS: &[&str] = &[
    "a", "abbr", "address", "article", "aside", "b", "bdi", "bdo", "big", "blockquote", "br", "caption", "center",
    "cite", "code", "col", "colgroup", "dd", "del", "details", "div", "dl", "dt", "em", "figcaption", "figure",
    "footer", "h1", "h2", "h3", "h4", "h5", "h6", "header", "hr", "i", "img", "ins", "li", "mark", "ol", "p", "pre",
    "s", "section", "small", "span", "strike", "strong", "sub", "summary", "sup", "table", "tbody", "td", "tfoot",
    "th", "thead", "tr", "tt", "u", "ul",
];

/// Per-tag attributes kept by the sanitizer.
const TAG_ATTRIBUTES: &[(&str, &[&str])] = &[
    ("a", &["href", "target"]),
    ("img", &["src", "srcset", "alt", "title", "width", "height"]),
    ("td", &["colspan", "rowspan", "align", "valign", "width"]),
    ("th", &["colspan", "rowspan", "align", "valign", "width"]),
    ("col", &["span", "width", "align"]),
    ("colgroup", &["span", "width", "align"]),
    ("table", &["width", "border", "align"]),
    ("details", &["open"]),
];

/// Validate and rewrite extracted data relative to `origin`.
pub fn normalize(origin: &Url, mut data: ComicData) -> ComicData {
    data.validate();
    data.media = data.media.into_iter().map(|m| fix_media(origin, m)).collect();
    data
}

fn fix_media(origin: &Url, media: Media) -> Media {
    let href = media.href.map(|h| fix_url(origin, &h));
    let content = match media.kind {
        MediaKind::Html => media.content.map(|html| fix_html(origin, &html)),
        _ => media.content,
    };
    Media { href, content, ..media }
}

/// Sanitize untrusted markup and make image URLs absolute.
pub fn fix_html(origin: &Url, html: &str) -> String {
    if html.is_empty() {
        return String::new();
    }

    let tags: HashSet<&str> = ALLOWED_TAGS.iter().copied().collect();
    let tag_attributes: HashMap<&str, HashSet<&str>> = TAG_ATTRIBUTES
        .iter()
        .map(|(tag, attrs)| (*tag, attrs.iter().copied().collect()))
        .collect();

    let base = origin.clone();
    Builder::default()
        .tags(tags)
        .tag_attributes(tag_attributes)
        .url_relative(UrlRelative::PassThrough)
        .attribute_filter(move |element, attribute, value| match (element, attribute) {
            ("img", "src") => Some(Cow::Owned(fix_url(&base, value))),
            ("img", "srcset") => Some(Cow::Owned(fix_srcset(&base, value))),
            _ => Some(Cow::Borrowed(value)),
        })
        .clean(html)
        .to_string()
}
