use scraper::Html;
use url::Url;

/// A parsed listing page paired with the URL it was requested from
///
/// The document does not carry its own cursors, so the request URL is kept
/// alongside it for the record extractor.
#[derive(Debug, Clone)]
pub struct PageFetchResult {
    /// The exact URL the page was requested from
    pub url: Url,

    /// The parsed document
    pub document: Html,
}

impl PageFetchResult {
    pub fn new(url: Url, document: Html) -> Self {
        Self { url, document }
    }
}
