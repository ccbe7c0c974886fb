//! Filter set accumulation and wire-syntax rendering.
//!
//! A [`FilterSet`] maps each [`FilterName`] to one formatted value. Options
//! write into the set, and the set renders itself as a sequence of
//! `name value; ` clauses.

use crate::error::{Error, Result};
use crate::options::FilterOption;
use percent_encoding::{utf8_percent_encode, AsciiSet, NON_ALPHANUMERIC};
use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;
use tracing::debug;

/// Characters escaped when the query is embedded in a URL path segment.
const PATH_SEGMENT: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'_')
    .remove(b'.')
    .remove(b'~')
    .remove(b'$')
    .remove(b'&')
    .remove(b'+')
    .remove(b':')
    .remove(b'=')
    .remove(b'@');

/// Name of a filter supported by the query language.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum FilterName {
    /// Fields included in the results
    Fields,
    /// Fields excluded from the results
    Exclude,
    /// Custom predicates
    Where,
    /// Maximum number of results
    Limit,
    /// Index of the first result
    Offset,
    /// Sort field and direction
    Sort,
    /// Search term
    Search,
}

impl FilterName {
    /// Every filter name, in declaration order.
    pub const ALL: [Self; 7] = [
        Self::Fields,
        Self::Exclude,
        Self::Where,
        Self::Limit,
        Self::Offset,
        Self::Sort,
        Self::Search,
    ];

    /// Keyword used for this filter in the wire syntax.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Fields => "fields",
            Self::Exclude => "exclude",
            Self::Where => "where",
            Self::Limit => "limit",
            Self::Offset => "offset",
            Self::Sort => "sort",
            Self::Search => "search",
        }
    }
}

impl fmt::Display for FilterName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for FilterName {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::ALL
            .into_iter()
            .find(|name| name.as_str() == s)
            .ok_or_else(|| Error::ConfigError(format!("unknown filter name `{s}`")))
    }
}

/// How a [`FilterSet`] treats a write to a filter that is already set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OverlapPolicy {
    /// The later value replaces the earlier one.
    #[default]
    Overwrite,
    /// The write fails with [`Error::FilterOverlap`] and the earlier value is kept.
    Reject,
}

/// Accumulated filters for a single query.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FilterSet {
    filters: HashMap<FilterName, String>,
    policy: OverlapPolicy,
}

impl FilterSet {
    /// Create an empty filter set that overwrites repeated filters.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an empty filter set with the given overlap policy.
    #[must_use]
    pub fn with_policy(policy: OverlapPolicy) -> Self {
        Self {
            filters: HashMap::new(),
            policy,
        }
    }

    /// Build a fresh filter set from the provided options.
    ///
    /// # Errors
    ///
    /// Returns the first error raised by an option, or [`Error::NilOption`]
    /// if any option is absent.
    pub fn from_options<I>(options: I) -> Result<Self>
    where
        I: IntoIterator,
        I::Item: Into<Option<FilterOption>>,
    {
        let mut filters = Self::new();
        crate::options::apply_all(&mut filters, options)?;
        Ok(filters)
    }

    /// Overlap policy in effect for this set.
    #[must_use]
    pub const fn policy(&self) -> OverlapPolicy {
        self.policy
    }

    /// Store a formatted value for the filter.
    ///
    /// # Errors
    ///
    /// Returns [`Error::FilterOverlap`] when the filter is already set and the
    /// policy is [`OverlapPolicy::Reject`].
    pub fn set(&mut self, name: FilterName, value: impl Into<String>) -> Result<()> {
        if self.policy == OverlapPolicy::Reject && self.filters.contains_key(&name) {
            return Err(Error::FilterOverlap(name));
        }

        self.filters.insert(name, value.into());
        Ok(())
    }

    /// Formatted value stored for the filter, if any.
    #[must_use]
    pub fn get(&self, name: FilterName) -> Option<&str> {
        self.filters.get(&name).map(String::as_str)
    }

    /// Returns true if the filter has been set.
    #[must_use]
    pub fn contains(&self, name: FilterName) -> bool {
        self.filters.contains_key(&name)
    }

    /// Remove a filter, returning its value.
    pub fn remove(&mut self, name: FilterName) -> Option<String> {
        self.filters.remove(&name)
    }

    /// Remove every filter, keeping the overlap policy.
    pub fn clear(&mut self) {
        self.filters.clear();
    }

    /// Number of filters set.
    #[must_use]
    pub fn len(&self) -> usize {
        self.filters.len()
    }

    /// Returns true if no filters have been set.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.filters.is_empty()
    }

    /// Iterate over the filters in unspecified order.
    pub fn iter(&self) -> impl Iterator<Item = (FilterName, &str)> {
        self.filters
            .iter()
            .map(|(name, value)| (*name, value.as_str()))
    }

    /// Render the filters as `name value; ` clauses.
    ///
    /// An empty set renders as the empty string. Clause order is not
    /// guaranteed.
    #[must_use]
    pub fn render(&self) -> String {
        let mut out = String::new();
        for (name, value) in &self.filters {
            out.push_str(name.as_str());
            out.push(' ');
            out.push_str(value);
            out.push_str("; ");
        }

        debug!(filters = self.filters.len(), "rendered query");
        out
    }

    /// Render the filters and escape the result for use in a URL path segment.
    #[must_use]
    pub fn render_escaped(&self) -> String {
        escape_path_segment(&self.render())
    }
}

impl fmt::Display for FilterSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.render())
    }
}

/// Percent-encode a string using URL path segment rules.
#[must_use]
pub fn escape_path_segment(s: &str) -> String {
    utf8_percent_encode(s, PATH_SEGMENT).to_string()
}
