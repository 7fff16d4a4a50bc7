//! Client code for funnies.
//!
//! This crate provides the HTTP fetch pipeline, the content normalizer, the
//! comic source descriptors and the built-in catalog. It plugs into the sync
//! engine of `funnies-core` through [`SourceFetcher`].

pub mod catalog;
pub mod extract;
pub mod fetch;
pub mod orchestrator;
pub mod source;

pub use catalog::default_sources;
pub use extract::{fix_html, normalize, single_image, single_image_with_title};
pub use fetch::{FetchClient, FetchConfig, FetchResponse, fix_srcset, fix_url};
pub use orchestrator::{SourceFetcher, fetch_one, providers};
pub use source::{ComicSource, LoadError, ParsePage, Strategy};
