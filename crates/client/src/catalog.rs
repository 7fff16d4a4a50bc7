//! Built-in comic sources.
//!
//! Each rule reads the live markup of a third-party site, so breakage is
//! expected over time. A broken rule yields an error record for that comic
//! and nothing else.

use std::sync::LazyLock;

use funnies_core::{ComicData, Media};
use regex::Regex;
use scraper::Html;

use crate::extract::{attr, element_attr, first, selector, single_image, single_image_with_title};
use crate::source::ComicSource;

static VIDEO_ID: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"videoId: *"([^"]*)""#).expect("video id pattern is valid"));

static SUBSTACK_CROP: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"w_[0-9]+,h_[0-9]+,c_fill,").expect("crop pattern is valid"));

/// Every built-in source, in display order.
pub fn default_sources() -> Vec<ComicSource> {
    vec![
        ComicSource::direct("Lunch", "https://e24.no", lunch_image),
        ComicSource::parse("XKCD", "https://www.xkcd.com/", xkcd),
        ComicSource::parse("Spinnerette", "https://www.spinnyverse.com", comic_easel),
        ComicSource::parse("Cassiopeia Quinn", "https://www.cassiopeiaquinn.com/", comic_easel),
        ComicSource::parse("Ctrl-Alt-Del", "https://cad-comic.com/", ctrl_alt_del),
        ComicSource::parse("SMBC", "https://www.smbc-comics.com/", smbc),
        ComicSource::parse("MonkeyUser", "https://www.monkeyuser.com/?dir=last", monkey_user),
        ComicSource::navigate("Loading Artist", "https://loadingartist.com/", loading_artist_target, loading_artist),
        ComicSource::parse("War and Peas", "https://warandpeas.com/", war_and_peas),
        ComicSource::parse("Poorly Drawn Lines", "https://poorlydrawnlines.com/", poorly_drawn_lines),
        ComicSource::parse("ToonHole", "https://toonhole.com/", toonhole),
        ComicSource::navigate(
            "Work Chronicles",
            "https://workchronicles.substack.com/archive",
            work_chronicles_target,
            work_chronicles,
        ),
    ]
}

/// Today's strip, addressed by UTC date.
fn lunch_image(_link: &str) -> String {
    format!("https://api.e24.no/content/v1/comics/{}", chrono::Utc::now().format("%Y-%m-%d"))
}

fn xkcd(doc: &Html, _body: &str) -> ComicData {
    single_image_with_title(attr(doc, "#comic img", "src"), attr(doc, "#comic img", "title"))
}

/// Sites on the ComicControl theme.
fn comic_easel(doc: &Html, _body: &str) -> ComicData {
    single_image(attr(doc, "img#cc-comic", "src"))
}

fn ctrl_alt_del(doc: &Html, _body: &str) -> ComicData {
    single_image(attr(doc, "img.comic-display", "src"))
}

/// Strip, bonus panel, then the hover text.
fn smbc(doc: &Html, _body: &str) -> ComicData {
    let media = [
        attr(doc, "img#cc-comic", "src").map(Media::image),
        attr(doc, "div#aftercomic img", "src").map(Media::image),
        attr(doc, "img#cc-comic", "title").map(Media::text),
    ];
    ComicData::from_media(media.into_iter().flatten().collect())
}

fn monkey_user(doc: &Html, body: &str) -> ComicData {
    if let Some(src) = attr(doc, ".content img", "src") {
        return single_image_with_title(Some(src), attr(doc, ".content img", "title"));
    }
    match VIDEO_ID.captures(body).and_then(|c| c.get(1)) {
        Some(id) => ComicData::from_media(vec![Media::video(id.as_str())]),
        None => ComicData::default(),
    }
}

fn loading_artist_target(doc: &Html) -> Option<String> {
    attr(doc, "a.comic-thumb.wide", "href")
}

fn loading_artist(doc: &Html, _body: &str) -> ComicData {
    let media = [
        attr(doc, "div.main-image-container img", "src").map(Media::image),
        attr(doc, "div.main-image-container img", "title").map(Media::title),
    ];
    ComicData::from_media(media.into_iter().flatten().collect())
}

/// Last content image of the first post tagged as a webcomic.
fn war_and_peas(doc: &Html, _body: &str) -> ComicData {
    let href = first(doc, "article.tag-webcomic").and_then(|article| {
        let images = selector("div.entry-content img")?;
        article.select(&images).last().and_then(|img| element_attr(img, "data-orig-file"))
    });
    single_image(href)
}

fn poorly_drawn_lines(doc: &Html, _body: &str) -> ComicData {
    single_image(attr(doc, "div.entry-content img", "data-src"))
}

fn toonhole(doc: &Html, _body: &str) -> ComicData {
    single_image(attr(doc, "img.wp-post-image", "src"))
}

fn work_chronicles_target(doc: &Html) -> Option<String> {
    attr(doc, r#"a.pencraft[href^="https://workchronicles.substack.com/p/"]"#, "href")
}

/// Post image, with the thumbnail crop swapped for a wider render.
fn work_chronicles(doc: &Html, _body: &str) -> ComicData {
    let href = attr(doc, "article picture img", "src").map(|src| SUBSTACK_CROP.replace(&src, "w_800,").into_owned());
    single_image(href)
}
