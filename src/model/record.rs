//! Dependent record definitions
//!
//! A dependent record is one entry in a dependents listing page. Its kind
//! round-trips through the listing's `dependent_type` query value:
//!
//! ```
//! use dependents_crawler::DependentKind;
//!
//! let kind: DependentKind = "package".parse().unwrap();
//! assert_eq!(kind.as_query_value(), "PACKAGE");
//! assert_eq!(DependentKind::from_query_value("PACKAGE"), Some(kind));
//! ```

use std::fmt;
use std::str::FromStr;

/// Classification of a dependent as shown by the listing
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum DependentKind {
    /// A repository depending on the target
    #[default]
    Repository,

    /// A published package depending on the target
    Package,
}

impl DependentKind {
    /// Returns the value used by the `dependent_type` query parameter
    pub fn as_query_value(&self) -> &'static str {
        match self {
            Self::Repository => "REPOSITORY",
            Self::Package => "PACKAGE",
        }
    }

    /// Parses a `dependent_type` query value
    ///
    /// Returns None if the value doesn't match any known kind.
    pub fn from_query_value(s: &str) -> Option<Self> {
        match s {
            "REPOSITORY" => Some(Self::Repository),
            "PACKAGE" => Some(Self::Package),
            _ => None,
        }
    }

    /// Returns all dependent kinds
    pub fn all() -> [Self; 2] {
        [Self::Repository, Self::Package]
    }
}

impl fmt::Display for DependentKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Repository => "Repository",
            Self::Package => "Package",
        };
        write!(f, "{}", s)
    }
}

impl FromStr for DependentKind {
    type Err = String;

    /// Case-insensitive parse, accepting both the query spelling and the
    /// lowercase CLI spelling
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_query_value(&s.to_ascii_uppercase())
            .ok_or_else(|| format!("unknown dependent type '{}'", s))
    }
}

/// One dependent found on a listing page
///
/// The cursor fields and `kind` come from the request URL of the page the
/// record was found on, so every record from one page carries the same
/// three values.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct DependentRecord {
    /// Owning user or organization of the dependent
    pub owner: String,

    /// Repository name of the dependent
    pub name: String,

    /// `dependents_after` cursor of the page's request URL
    pub after_cursor: String,

    /// `dependents_before` cursor of the page's request URL
    pub before_cursor: String,

    /// Classification from the page's `dependent_type` parameter
    pub kind: DependentKind,

    /// Reserved, not populated by extraction
    pub stars: u32,

    /// Reserved, not populated by extraction
    pub forks: u32,
}

impl DependentRecord {
    /// Returns `owner/name`
    pub fn full_name(&self) -> String {
        format!("{}/{}", self.owner, self.name)
    }
}

impl fmt::Display for DependentRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.owner, self.name)
    }
}
