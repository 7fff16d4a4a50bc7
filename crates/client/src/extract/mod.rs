//! Comic extraction from fetched pages.
//!
//! Source rules pick media out of a parsed document with CSS selectors; the
//! helpers here keep those rules short. Everything they return still goes
//! through [`normalize`] before it is cached.

pub mod normalize;

pub use normalize::{fix_html, normalize};

use funnies_core::{ComicData, Media};
use scraper::{ElementRef, Html, Selector};

/// Error recorded when a rule found nothing to show.
pub const NO_MEDIA_FOUND: &str = "No media found";

/// Parse a selector, logging instead of panicking on a malformed rule.
pub fn selector(css: &str) -> Option<Selector> {
    match Selector::parse(css) {
        Ok(sel) => Some(sel),
        Err(e) => {
            tracing::warn!(selector = css, error = %e, "invalid selector");
            None
        }
    }
}

/// First element in `doc` matching `css`.
pub fn first<'a>(doc: &'a Html, css: &str) -> Option<ElementRef<'a>> {
    let sel = selector(css)?;
    doc.select(&sel).next()
}

/// Attribute of the first element matching `css`, if present and non-empty.
pub fn attr(doc: &Html, css: &str, name: &str) -> Option<String> {
    first(doc, css).and_then(|el| element_attr(el, name))
}

/// Non-empty attribute of an element.
pub fn element_attr(el: ElementRef<'_>, name: &str) -> Option<String> {
    el.value()
        .attr(name)
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(String::from)
}

/// One image, or a "No media found" error.
pub fn single_image(href: Option<String>) -> ComicData {
    match href {
        Some(href) => ComicData::from_media(vec![Media::image(href)]),
        None => ComicData::error(NO_MEDIA_FOUND),
    }
}

/// An image followed by its caption; an error only when both are missing.
pub fn single_image_with_title(href: Option<String>, title: Option<String>) -> ComicData {
    if href.is_none() && title.is_none() {
        return ComicData::error(NO_MEDIA_FOUND);
    }
    let mut media = Vec::with_capacity(2);
    if let Some(href) = href {
        media.push(Media::image(href));
    }
    if let Some(title) = title {
        media.push(Media::text(title));
    }
    ComicData::from_media(media)
}

#[cfg(test)]
mod tests {
    use super::*;
    use funnies_core::MediaKind;

    const PAGE: &str = r#"
        <html><body>
            <div id="comic"><img src="/a.png" title="  Alt text "></div>
            <img class="empty" src="">
        </body></html>
    "#;

    #[test]
    fn test_attr() {
        let doc = Html::parse_document(PAGE);
        assert_eq!(attr(&doc, "#comic img", "src").as_deref(), Some("/a.png"));
        assert_eq!(attr(&doc, "#comic img", "title").as_deref(), Some("Alt text"));
        assert_eq!(attr(&doc, "#comic img", "alt"), None);
        assert_eq!(attr(&doc, "img.empty", "src"), None);
        assert_eq!(attr(&doc, "#missing img", "src"), None);
    }

    #[test]
    fn test_invalid_selector_is_none() {
        let doc = Html::parse_document(PAGE);
        assert!(selector("div[").is_none());
        assert_eq!(attr(&doc, "div[", "src"), None);
    }

    #[test]
    fn test_single_image() {
        let data = single_image(Some("a.png".into()));
        assert_eq!(data.media, vec![Media::image("a.png")]);

        let missing = single_image(None);
        assert!(missing.media.is_empty());
        assert_eq!(missing.errors, vec![NO_MEDIA_FOUND.to_string()]);
    }

    #[test]
    fn test_single_image_with_title() {
        let both = single_image_with_title(Some("a.png".into()), Some("caption".into()));
        let kinds: Vec<MediaKind> = both.media.iter().map(|m| m.kind).collect();
        assert_eq!(kinds, vec![MediaKind::Image, MediaKind::Text]);

        let title_only = single_image_with_title(None, Some("caption".into()));
        assert_eq!(title_only.media, vec![Media::text("caption")]);

        assert!(single_image_with_title(None, None).has_errors());
    }
}
