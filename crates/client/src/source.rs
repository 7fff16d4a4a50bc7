//! Source descriptors: how each comic's content is obtained.
//!
//! A [`ComicSource`] pairs a name and link with one of three strategies:
//!
//! - [`Strategy::DirectUrl`]: the image URL is computed, no request is made
//! - [`Strategy::Parse`]: fetch the link page and run an extractor on it
//! - [`Strategy::NavigateParse`]: find a target URL on the link page, then
//!   fetch and extract that page with a [`ParsePage`]

use funnies_core::{ComicData, Error, Media};
use scraper::Html;
use url::Url;

use crate::fetch::{FetchClient, canonicalize, resolve};

/// Computes an image URL from the comic's link URL.
pub type ImageUrlFn = fn(&str) -> String;

/// Pulls comic data out of a parsed page. Also receives the raw body.
pub type ExtractFn = fn(&Html, &str) -> ComicData;

/// Finds the URL of the page holding the actual comic.
pub type TargetFn = fn(&Html) -> Option<String>;

/// Fetch one page and run an extractor on it.
#[derive(Clone, Copy)]
pub struct ParsePage {
    extract: ExtractFn,
}

impl ParsePage {
    pub fn new(extract: ExtractFn) -> Self {
        Self { extract }
    }

    /// Run the extractor over an already fetched body.
    pub fn extract(&self, body: &str) -> ComicData {
        let doc = Html::parse_document(body);
        (self.extract)(&doc, body)
    }

    pub async fn load(&self, http: &FetchClient, url: &Url) -> Result<ComicData, Error> {
        let response = http.get_text(url).await?;
        Ok(self.extract(&response.body))
    }
}

/// How a comic's content is obtained.
#[derive(Clone, Copy)]
pub enum Strategy {
    DirectUrl(ImageUrlFn),
    Parse(ParsePage),
    NavigateParse { target: TargetFn, page: ParsePage },
}

/// Failure while loading a source, with any pages already traversed.
#[derive(Debug)]
pub struct LoadError {
    pub error: Error,
    pub intermediate_urls: Vec<String>,
}

impl From<Error> for LoadError {
    fn from(error: Error) -> Self {
        Self { error, intermediate_urls: Vec::new() }
    }
}

/// Named, immutable description of one comic.
#[derive(Clone)]
pub struct ComicSource {
    name: String,
    link_url: String,
    strategy: Strategy,
}

impl std::fmt::Debug for ComicSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let strategy = match self.strategy {
            Strategy::DirectUrl(_) => "direct",
            Strategy::Parse(_) => "parse",
            Strategy::NavigateParse { .. } => "navigate",
        };
        f.debug_struct("ComicSource")
            .field("name", &self.name)
            .field("link_url", &self.link_url)
            .field("strategy", &strategy)
            .finish()
    }
}

impl ComicSource {
    pub fn new(name: impl Into<String>, link_url: impl Into<String>, strategy: Strategy) -> Self {
        Self { name: name.into(), link_url: link_url.into(), strategy }
    }

    pub fn direct(name: impl Into<String>, link_url: impl Into<String>, image: ImageUrlFn) -> Self {
        Self::new(name, link_url, Strategy::DirectUrl(image))
    }

    pub fn parse(name: impl Into<String>, link_url: impl Into<String>, extract: ExtractFn) -> Self {
        Self::new(name, link_url, Strategy::Parse(ParsePage::new(extract)))
    }

    pub fn navigate(
        name: impl Into<String>, link_url: impl Into<String>, target: TargetFn, extract: ExtractFn,
    ) -> Self {
        Self::new(name, link_url, Strategy::NavigateParse { target, page: ParsePage::new(extract) })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn link_url(&self) -> &str {
        &self.link_url
    }

    pub fn strategy(&self) -> &Strategy {
        &self.strategy
    }

    /// Obtain the raw, not yet normalized, comic data.
    ///
    /// For navigating sources the target is resolved against the listing page
    /// as served (after redirects) and appended to `intermediate_urls`, on
    /// success and on failure of the second request.
    pub async fn load(&self, http: &FetchClient) -> Result<ComicData, LoadError> {
        let origin = canonicalize(&self.link_url).map_err(|e| Error::InvalidUrl(e.to_string()))?;

        match &self.strategy {
            Strategy::DirectUrl(image) => Ok(ComicData::from_media(vec![Media::image(image(&self.link_url))])),
            Strategy::Parse(page) => Ok(page.load(http, &origin).await?),
            Strategy::NavigateParse { target, page } => {
                let listing = http.get_text(&origin).await?;
                let target_href = find_target(*target, &listing.body).ok_or_else(|| {
                    Error::ExtractFailed(format!("unable to find target URL; url={}", self.link_url))
                })?;
                let navigated = resolve(&listing.final_url, &target_href)
                    .map_err(|e| Error::InvalidUrl(format!("{target_href}: {e}")))?
                    .to_string();

                tracing::debug!(source = %self.name, target = %navigated, "navigated to comic page");

                let target_url = canonicalize(&navigated).map_err(|e| LoadError {
                    error: Error::InvalidUrl(e.to_string()),
                    intermediate_urls: vec![navigated.clone()],
                })?;
                let mut data = page
                    .load(http, &target_url)
                    .await
                    .map_err(|error| LoadError { error, intermediate_urls: vec![navigated.clone()] })?;
                data.push_intermediate(navigated);
                Ok(data)
            }
        }
    }
}

fn find_target(target: TargetFn, body: &str) -> Option<String> {
    let doc = Html::parse_document(body);
    target(&doc).filter(|t| !t.trim().is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::extract::{attr, single_image};
    use crate::fetch::FetchConfig;
    use mockito::Server;

    fn http() -> FetchClient {
        FetchClient::new(FetchConfig::default()).unwrap()
    }

    fn extract_comic_img(doc: &Html, _body: &str) -> ComicData {
        single_image(attr(doc, "#comic img", "src"))
    }

    fn latest_link(doc: &Html) -> Option<String> {
        attr(doc, "a.latest", "href")
    }

    #[tokio::test]
    async fn test_direct_url_makes_no_request() {
        let source = ComicSource::direct("Direct", "https://direct.test/", |link| format!("{link}today.png"));
        let data = source.load(&http()).await.unwrap();
        assert_eq!(data.media, vec![Media::image("https://direct.test/today.png")]);
    }

    #[tokio::test]
    async fn test_parse_extracts_from_page() {
        let mut server = Server::new_async().await;
        server
            .mock("GET", "/")
            .with_status(200)
            .with_body(r#"<div id="comic"><img src="/strip.png"></div>"#)
            .create_async()
            .await;

        let source = ComicSource::parse("Parse", server.url(), extract_comic_img);
        let data = source.load(&http()).await.unwrap();

        assert_eq!(data.media, vec![Media::image("/strip.png")]);
        assert!(data.intermediate_urls.is_none());
    }

    #[tokio::test]
    async fn test_parse_http_error() {
        let mut server = Server::new_async().await;
        server.mock("GET", "/").with_status(404).create_async().await;

        let source = ComicSource::parse("Parse", server.url(), extract_comic_img);
        let err = source.load(&http()).await.unwrap_err();

        assert!(matches!(err.error, Error::HttpError(_)));
        assert!(err.intermediate_urls.is_empty());
    }

    #[tokio::test]
    async fn test_navigate_records_intermediate_url() {
        let mut server = Server::new_async().await;
        server
            .mock("GET", "/archive")
            .with_status(200)
            .with_body(r#"<a class="latest" href="/p/42">latest</a>"#)
            .create_async()
            .await;
        server
            .mock("GET", "/p/42")
            .with_status(200)
            .with_body(r#"<div id="comic"><img src="strip42.png"></div>"#)
            .create_async()
            .await;

        let link = format!("{}/archive", server.url());
        let source = ComicSource::navigate("Nav", link, latest_link, extract_comic_img);
        let data = source.load(&http()).await.unwrap();

        assert_eq!(data.media, vec![Media::image("strip42.png")]);
        assert_eq!(data.intermediate_urls, Some(vec![format!("{}/p/42", server.url())]));
    }

    #[tokio::test]
    async fn test_navigate_resolves_target_after_redirect() {
        let mut server = Server::new_async().await;
        server
            .mock("GET", "/")
            .with_status(301)
            .with_header("location", "/archive/")
            .create_async()
            .await;
        server
            .mock("GET", "/archive/")
            .with_status(200)
            .with_body(r#"<a class="latest" href="42/">latest</a>"#)
            .create_async()
            .await;
        server
            .mock("GET", "/archive/42/")
            .with_status(200)
            .with_body(r#"<div id="comic"><img src="strip.png"></div>"#)
            .create_async()
            .await;

        let source = ComicSource::navigate("Nav", server.url(), latest_link, extract_comic_img);
        let data = source.load(&http()).await.unwrap();

        assert_eq!(data.intermediate_urls, Some(vec![format!("{}/archive/42/", server.url())]));
    }

    #[tokio::test]
    async fn test_navigate_missing_target() {
        let mut server = Server::new_async().await;
        server
            .mock("GET", "/")
            .with_status(200)
            .with_body("<p>nothing here</p>")
            .create_async()
            .await;

        let source = ComicSource::navigate("Nav", server.url(), latest_link, extract_comic_img);
        let err = source.load(&http()).await.unwrap_err();

        assert!(matches!(&err.error, Error::ExtractFailed(msg) if msg.contains("unable to find target URL")));
    }

    #[tokio::test]
    async fn test_navigate_second_hop_failure_keeps_intermediate_url() {
        let mut server = Server::new_async().await;
        server
            .mock("GET", "/")
            .with_status(200)
            .with_body(r#"<a class="latest" href="/gone">latest</a>"#)
            .create_async()
            .await;
        server.mock("GET", "/gone").with_status(500).create_async().await;

        let source = ComicSource::navigate("Nav", server.url(), latest_link, extract_comic_img);
        let err = source.load(&http()).await.unwrap_err();

        assert!(matches!(err.error, Error::HttpError(_)));
        assert_eq!(err.intermediate_urls, vec![format!("{}/gone", server.url())]);
    }

    #[tokio::test]
    async fn test_invalid_link_url() {
        let source = ComicSource::parse("Bad", "ftp://example.com/", extract_comic_img);
        let err = source.load(&http()).await.unwrap_err();
        assert!(matches!(err.error, Error::InvalidUrl(_)));
    }

    #[test]
    fn test_debug_hides_fn_pointers() {
        let source = ComicSource::navigate("Nav", "https://nav.test/", latest_link, extract_comic_img);
        let dbg = format!("{source:?}");
        assert!(dbg.contains("navigate"));
        assert!(dbg.contains("Nav"));
    }
}
