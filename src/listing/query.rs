use crate::model::{DependentKind, DependentRecord};
use url::Url;

/// Query parameter holding the "after" pagination cursor
pub const PARAM_AFTER: &str = "dependents_after";

/// Query parameter holding the "before" pagination cursor
pub const PARAM_BEFORE: &str = "dependents_before";

/// Query parameter holding the dependent classification
pub const PARAM_TYPE: &str = "dependent_type";

/// Pagination context of one listing page
///
/// Read from the page's request URL, never from the document. Every record
/// extracted from the page is stamped with these values.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PageContext {
    pub after_cursor: String,
    pub before_cursor: String,
    pub kind: DependentKind,
}

impl PageContext {
    /// Parses the pagination context from a page URL's query string
    ///
    /// Each field reads its own parameter; when a parameter repeats, the
    /// first value wins. A missing or unrecognised `dependent_type` yields
    /// [`DependentKind::Repository`].
    pub fn from_url(url: &Url) -> Self {
        let mut after = None;
        let mut before = None;
        let mut kind = None;

        for (key, value) in url.query_pairs() {
            match &*key {
                PARAM_AFTER if after.is_none() => after = Some(value.into_owned()),
                PARAM_BEFORE if before.is_none() => before = Some(value.into_owned()),
                PARAM_TYPE if kind.is_none() => {
                    kind = Some(DependentKind::from_query_value(&value).unwrap_or_else(|| {
                        tracing::warn!(
                            "Unrecognised {} '{}' on {}, assuming {}",
                            PARAM_TYPE,
                            value,
                            url,
                            DependentKind::default()
                        );
                        DependentKind::default()
                    }));
                }
                _ => {}
            }
        }

        Self {
            after_cursor: after.unwrap_or_default(),
            before_cursor: before.unwrap_or_default(),
            kind: kind.unwrap_or_default(),
        }
    }

    /// Builds a record on this page for `owner/name`
    pub fn record(&self, owner: String, name: String) -> DependentRecord {
        DependentRecord {
            owner,
            name,
            after_cursor: self.after_cursor.clone(),
            before_cursor: self.before_cursor.clone(),
            kind: self.kind,
            stars: 0,
            forks: 0,
        }
    }
}
