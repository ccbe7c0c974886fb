//! Page-by-page iteration over query results.

use crate::client::QueryExecutor;
use crate::Result;
use apicalypse_core::options::{limit, offset};
use apicalypse_core::{Error, FilterOption};
use serde_json::Value;
use tracing::debug;

/// Walks a result set with `limit` and `offset`.
///
/// The paginator appends its own `limit` and `offset` after the base
/// options, so any pagination in the base options is overridden. Iteration
/// stops after the first page shorter than the page size.
pub struct Paginator<'a, E: QueryExecutor + ?Sized> {
    executor: &'a E,
    endpoint: String,
    base: Vec<FilterOption>,
    page_size: i64,
    next_offset: i64,
    exhausted: bool,
}

impl<'a, E: QueryExecutor + ?Sized> Paginator<'a, E> {
    /// Create a paginator over `endpoint`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ConfigError`] if `page_size` is not positive.
    pub fn new(
        executor: &'a E,
        endpoint: impl Into<String>,
        base: Vec<FilterOption>,
        page_size: i64,
    ) -> Result<Self> {
        if page_size <= 0 {
            return Err(Error::ConfigError(format!(
                "page size must be positive (got {page_size})"
            )));
        }

        Ok(Self {
            executor,
            endpoint: endpoint.into(),
            base,
            page_size,
            next_offset: 0,
            exhausted: false,
        })
    }

    /// Offset the next page will be requested from.
    #[must_use]
    pub const fn next_offset(&self) -> i64 {
        self.next_offset
    }

    /// Returns true once the last page has been fetched.
    #[must_use]
    pub const fn is_exhausted(&self) -> bool {
        self.exhausted
    }

    /// Fetch the next page, or `None` when there are no more results.
    pub async fn next_page(&mut self) -> Result<Option<Vec<Value>>> {
        if self.exhausted {
            return Ok(None);
        }

        let mut options = self.base.clone();
        options.push(limit(self.page_size));
        options.push(offset(self.next_offset));

        let items = self.executor.execute(&self.endpoint, options).await?;
        debug!(
            endpoint = %self.endpoint,
            offset = self.next_offset,
            items = items.len(),
            "fetched page"
        );

        let full_page = i64::try_from(items.len()).map_or(false, |len| len >= self.page_size);
        if full_page {
            self.next_offset = self.next_offset.checked_add(self.page_size).ok_or_else(|| {
                Error::ConfigError("pagination offset overflowed".to_string())
            })?;
        } else {
            self.exhausted = true;
        }

        if items.is_empty() {
            Ok(None)
        } else {
            Ok(Some(items))
        }
    }

    /// Fetch every remaining page and concatenate the results.
    pub async fn collect_all(mut self) -> Result<Vec<Value>> {
        let mut all = Vec::new();
        while let Some(page) = self.next_page().await? {
            all.extend(page);
        }
        Ok(all)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::MockQueryExecutor;
    use apicalypse_core::options::fields;
    use apicalypse_core::{FilterName, FilterSet};
    use mockall::Sequence;
    use serde_json::json;

    fn page(ids: std::ops::Range<u64>) -> Vec<Value> {
        ids.map(|id| json!({ "id": id })).collect()
    }

    fn rendered(options: &[FilterOption], name: FilterName) -> Option<String> {
        FilterSet::from_options(options.to_vec())
            .ok()
            .and_then(|set| set.get(name).map(String::from))
    }

    #[test]
    fn rejects_non_positive_page_size() {
        let mock = MockQueryExecutor::new();
        assert!(matches!(
            Paginator::new(&mock, "games", vec![], 0),
            Err(Error::ConfigError(_))
        ));
        assert!(Paginator::new(&mock, "games", vec![], -5).is_err());
    }

    #[tokio::test]
    async fn walks_pages_until_short_page() {
        let mut mock = MockQueryExecutor::new();
        let mut seq = Sequence::new();

        for (expected_offset, result) in [("0", page(0..2)), ("2", page(2..4)), ("4", page(4..5))] {
            mock.expect_execute()
                .times(1)
                .in_sequence(&mut seq)
                .withf(move |endpoint, options| {
                    endpoint.to_string() == "games"
                        && rendered(options, FilterName::Limit).as_deref() == Some("2")
                        && rendered(options, FilterName::Offset).as_deref() == Some(expected_offset)
                        && rendered(options, FilterName::Fields).as_deref() == Some("id")
                })
                .returning(move |_, _| Ok(result.clone()));
        }

        let paginator = Paginator::new(&mock, "games", vec![fields(["id"])], 2).unwrap();
        let all = paginator.collect_all().await.unwrap();
        assert_eq!(all, page(0..5));
    }

    #[tokio::test]
    async fn empty_page_ends_iteration() {
        let mut mock = MockQueryExecutor::new();
        let mut seq = Sequence::new();
        mock.expect_execute()
            .times(1)
            .in_sequence(&mut seq)
            .returning(|_, _| Ok(page(0..3)));
        mock.expect_execute()
            .times(1)
            .in_sequence(&mut seq)
            .returning(|_, _| Ok(vec![]));

        let mut paginator = Paginator::new(&mock, "games", vec![], 3).unwrap();
        assert_eq!(paginator.next_page().await.unwrap().map(|p| p.len()), Some(3));
        assert_eq!(paginator.next_offset(), 3);
        assert!(paginator.next_page().await.unwrap().is_none());
        assert!(paginator.is_exhausted());
        assert!(paginator.next_page().await.unwrap().is_none());
    }

    #[tokio::test]
    async fn base_pagination_is_overridden() {
        let mut mock = MockQueryExecutor::new();
        mock.expect_execute()
            .times(1)
            .withf(|_, options| {
                rendered(options, FilterName::Limit).as_deref() == Some("10")
                    && rendered(options, FilterName::Offset).as_deref() == Some("0")
            })
            .returning(|_, _| Ok(page(0..1)));

        let paginator = Paginator::new(&mock, "games", vec![limit(500), offset(99)], 10).unwrap();
        assert_eq!(paginator.collect_all().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn executor_errors_propagate() {
        let mut mock = MockQueryExecutor::new();
        mock.expect_execute()
            .times(1)
            .returning(|_, _| Err(Error::Unauthorized("bad token".to_string())));

        let mut paginator = Paginator::new(&mock, "games", vec![], 10).unwrap();
        let err = paginator.next_page().await.unwrap_err();
        assert!(matches!(err, Error::Unauthorized(_)));
        assert!(!paginator.is_exhausted());
    }
}
