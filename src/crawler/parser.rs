//! Dependents page parser
//!
//! This module walks a parsed listing page to extract:
//! - One dependent record per record block
//! - The URL of the next listing page, if any
//!
//! Both walks are depth-first in document order. The structural
//! assumptions about the listing markup are named below; a markup change
//! fails at one of these lookups with a `MalformedPage` error instead of
//! producing wrong records.

use crate::listing::{resolve_href, PageContext};
use crate::model::{DependentRecord, PageFetchResult};
use crate::CrawlError;
use scraper::{ElementRef, Html, Selector};
use url::Url;

/// Attribute marking a record block
const RECORD_MARKER_ATTR: &str = "data-test-id";

/// Value of [`RECORD_MARKER_ATTR`] on a record block
const RECORD_MARKER_VALUE: &str = "dg-repo-pkg-dependent";

/// `class` value of the pagination control
const PAGINATION_CLASS: &str = "paginate-container";

/// Element holding both links of a record: the first `span` child of the block
const RECORD_LINKS_ELEMENT: &str = "span";

/// Owner link inside the links element
const OWNER_LINK: &str =
    r#"a[data-hovercard-type="user"], a[data-hovercard-type="organization"]"#;

/// Repository link inside the links element
const REPOSITORY_LINK: &str = r#"a[data-hovercard-type="repository"]"#;

/// Any link, used when the hovercard markers are absent
const ANY_LINK: &str = "a";

/// Link inside the pagination control that may lead to the next page
const PAGINATION_LINK: &str = "a[href]";

/// Text of the next-page link
const NEXT_LINK_TEXT: &str = "Next";

/// Compiled selectors used inside a record block
struct RecordSelectors {
    owner: Selector,
    repository: Selector,
    any: Selector,
}

impl RecordSelectors {
    fn new(page_url: &Url) -> Result<Self, CrawlError> {
        Ok(Self {
            owner: compile(OWNER_LINK, page_url)?,
            repository: compile(REPOSITORY_LINK, page_url)?,
            any: compile(ANY_LINK, page_url)?,
        })
    }
}

fn compile(css: &str, page_url: &Url) -> Result<Selector, CrawlError> {
    Selector::parse(css).map_err(|e| CrawlError::Parse {
        url: page_url.to_string(),
        message: format!("invalid selector '{}': {:?}", css, e),
    })
}

/// Extracts every dependent record from a listing page
///
/// The pagination context is read once from the page's request URL and
/// stamped onto every record. Record blocks are not descended into, so a
/// block nested inside another block is ignored.
///
/// # Errors
///
/// Returns `MalformedPage` when a record block lacks its links element,
/// its owner link, its repository link, or link text.
///
/// # Example
///
/// ```
/// use dependents_crawler::crawler::extract_dependents;
/// use dependents_crawler::PageFetchResult;
/// use scraper::Html;
/// use url::Url;
///
/// let html = r#"<div data-test-id="dg-repo-pkg-dependent">
///   <span><a data-hovercard-type="user" href="/spf13">spf13</a> /
///   <a data-hovercard-type="repository" href="/spf13/cobra">cobra</a></span>
/// </div>"#;
/// let url = Url::parse("https://github.com/a/b/network/dependents?dependents_after=X").unwrap();
/// let page = PageFetchResult::new(url, Html::parse_document(html));
///
/// let records = extract_dependents(&page).unwrap();
/// assert_eq!(records.len(), 1);
/// assert_eq!(records[0].full_name(), "spf13/cobra");
/// assert_eq!(records[0].after_cursor, "X");
/// ```
pub fn extract_dependents(page: &PageFetchResult) -> Result<Vec<DependentRecord>, CrawlError> {
    tracing::debug!("Parsing page for dependents: {}", page.url);

    let context = PageContext::from_url(&page.url);
    let selectors = RecordSelectors::new(&page.url)?;

    let blocks = find_blocks(page.document.root_element(), is_record_block);

    let records = blocks
        .into_iter()
        .enumerate()
        .map(|(index, block)| extract_record(block, index, &context, &selectors, &page.url))
        .collect::<Result<Vec<_>, _>>()?;

    tracing::debug!("Found {} dependents on {}", records.len(), page.url);

    Ok(records)
}

/// Extracts the URL of the next listing page
///
/// Returns `Ok(None)` when the page has no pagination control, or the
/// control has no enabled "Next" link. That is the normal end of a crawl.
///
/// # Errors
///
/// Returns `MalformedPage` when the "Next" href does not resolve to an
/// http(s) URL.
pub fn extract_next_page(document: &Html, page_url: &Url) -> Result<Option<Url>, CrawlError> {
    tracing::debug!("Parsing page for next URL: {}", page_url);

    let Some(control) = find_blocks(document.root_element(), is_pagination_control)
        .into_iter()
        .next()
    else {
        tracing::debug!("No pagination control on {}", page_url);
        return Ok(None);
    };

    let links = compile(PAGINATION_LINK, page_url)?;

    let Some(href) = control
        .select(&links)
        .find(|link| link_text(link).as_deref() == Some(NEXT_LINK_TEXT))
        .and_then(|link| link.value().attr("href"))
    else {
        tracing::debug!("No next link on {}", page_url);
        return Ok(None);
    };

    let next = resolve_href(href, page_url).ok_or_else(|| {
        CrawlError::malformed(
            page_url,
            format!("next-page href '{}' is not an http(s) URL", href),
        )
    })?;

    tracing::debug!("Next page URL: {}", next);

    Ok(Some(next))
}

/// Depth-first, document-order search for blocks matching `is_block`
///
/// Matching blocks are collected but not descended into.
fn find_blocks<'a>(
    root: ElementRef<'a>,
    is_block: fn(&ElementRef<'a>) -> bool,
) -> Vec<ElementRef<'a>> {
    let mut found = Vec::new();
    let mut stack = vec![root];

    while let Some(element) = stack.pop() {
        if is_block(&element) {
            found.push(element);
            continue;
        }

        // Reversed so children pop in document order
        let children: Vec<_> = element.children().filter_map(ElementRef::wrap).collect();
        stack.extend(children.into_iter().rev());
    }

    found
}

fn is_record_block(element: &ElementRef<'_>) -> bool {
    let value = element.value();
    value.name() == "div" && value.attr(RECORD_MARKER_ATTR) == Some(RECORD_MARKER_VALUE)
}

fn is_pagination_control(element: &ElementRef<'_>) -> bool {
    let value = element.value();
    value.name() == "div" && value.attr("class").map(str::trim) == Some(PAGINATION_CLASS)
}

/// Extracts one record from a record block
fn extract_record(
    block: ElementRef<'_>,
    index: usize,
    context: &PageContext,
    selectors: &RecordSelectors,
    page_url: &Url,
) -> Result<DependentRecord, CrawlError> {
    let links_element = block
        .children()
        .filter_map(ElementRef::wrap)
        .find(|child| child.value().name() == RECORD_LINKS_ELEMENT)
        .ok_or_else(|| {
            CrawlError::malformed(
                page_url,
                format!(
                    "record {}: no <span> holding the owner and repository links",
                    index
                ),
            )
        })?;

    let mut owner_link = links_element.select(&selectors.owner).next();
    let mut repository_link = links_element.select(&selectors.repository).next();

    // Without hovercard markers, fall back to the first two links
    if owner_link.is_none() && repository_link.is_none() {
        let mut links = links_element.select(&selectors.any);
        owner_link = links.next();
        repository_link = links.next();
    }

    let owner_link = owner_link.ok_or_else(|| {
        CrawlError::malformed(page_url, format!("record {}: owner link is missing", index))
    })?;
    let repository_link = repository_link.ok_or_else(|| {
        CrawlError::malformed(
            page_url,
            format!("record {}: repository link is missing", index),
        )
    })?;

    let owner = link_text(&owner_link).ok_or_else(|| {
        CrawlError::malformed(
            page_url,
            format!("record {}: owner link has no text", index),
        )
    })?;
    let name = link_text(&repository_link).ok_or_else(|| {
        CrawlError::malformed(
            page_url,
            format!("record {}: repository link has no text", index),
        )
    })?;

    tracing::trace!("Record {}: {}/{}", index, owner, name);

    Ok(context.record(owner, name))
}

/// Returns the first non-empty text node inside an element, trimmed
fn link_text(element: &ElementRef<'_>) -> Option<String> {
    element
        .text()
        .map(str::trim)
        .find(|text| !text.is_empty())
        .map(str::to_string)
}
