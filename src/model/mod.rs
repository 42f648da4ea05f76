//! Data model for crawled dependents
//!
//! This module defines the records produced by the extractors and the
//! fetched-page type passed between the fetcher and the extractors.

mod page;
mod record;

pub use page::PageFetchResult;
pub use record::{DependentKind, DependentRecord};
