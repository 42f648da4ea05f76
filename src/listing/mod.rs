//! Listing URL handling
//!
//! This module builds the seed URL of a dependents listing, reads the
//! pagination context carried on a page's request URL, and resolves the
//! "next page" href found on a page.

mod query;

pub use query::{PageContext, PARAM_AFTER, PARAM_BEFORE, PARAM_TYPE};

use crate::model::DependentKind;
use url::Url;

/// Default host serving dependents listings
pub const DEFAULT_BASE_URL: &str = "https://github.com";

/// Builds the seed URL of the dependents listing for `owner/name`
///
/// The listing lives at `<base>/<owner>/<name>/network/dependents`. When
/// `kind` is given, the listing is filtered with `dependent_type`.
///
/// # Example
///
/// ```
/// use dependents_crawler::listing::dependents_url;
/// use url::Url;
///
/// let base = Url::parse("https://github.com").unwrap();
/// let url = dependents_url(&base, "inconshreveable", "mousetrap", None).unwrap();
/// assert_eq!(
///     url.as_str(),
///     "https://github.com/inconshreveable/mousetrap/network/dependents"
/// );
/// ```
pub fn dependents_url(
    base: &Url,
    owner: &str,
    name: &str,
    kind: Option<DependentKind>,
) -> Result<Url, url::ParseError> {
    let mut url = base.clone();
    {
        let mut segments = url
            .path_segments_mut()
            .map_err(|_| url::ParseError::RelativeUrlWithCannotBeABaseBase)?;
        segments
            .pop_if_empty()
            .extend([owner, name, "network", "dependents"]);
    }

    if let Some(kind) = kind {
        url.query_pairs_mut()
            .append_pair(PARAM_TYPE, kind.as_query_value());
    }

    Ok(url)
}

/// Resolves a next-page href against the page it was found on
///
/// Returns None for hrefs that don't resolve to an http(s) URL.
pub fn resolve_href(href: &str, page_url: &Url) -> Option<Url> {
    let href = href.trim();
    if href.is_empty() || href.starts_with('#') {
        return None;
    }

    match page_url.join(href) {
        Ok(resolved) if resolved.scheme() == "http" || resolved.scheme() == "https" => {
            Some(resolved)
        }
        _ => None,
    }
}
