//! Request-scoped browse parameters.

use crate::{
    filter::{Membership, RatingFilter, SortKey},
    paginate::{PageRequest, DEFAULT_CATALOG_PAGE_SIZE, DEFAULT_LIST_PAGE_SIZE},
};

/// Parameters for browsing the catalog.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CatalogQuery {
    /// Case-insensitive title substring.
    pub search: Option<String>,
    /// Ordering; `None` keeps catalog order.
    pub sort: Option<SortKey>,
    /// On-list or off-list restriction.
    pub membership: Option<Membership>,
    /// Page to show.
    pub page: PageRequest,
}

impl Default for CatalogQuery {
    fn default() -> Self {
        Self {
            search: None,
            sort: None,
            membership: None,
            page: PageRequest::first(DEFAULT_CATALOG_PAGE_SIZE),
        }
    }
}

impl CatalogQuery {
    /// Build a query from raw request parameters. Unknown values are no-ops.
    pub fn from_params(
        search: Option<&str>,
        sort: Option<&str>,
        membership: Option<&str>,
        page: Option<i64>,
        size: Option<i64>,
    ) -> Self {
        Self {
            search: search.map(str::to_string),
            sort: sort.and_then(SortKey::parse),
            membership: membership.and_then(Membership::parse),
            page: PageRequest::new(
                page.unwrap_or(0),
                size.unwrap_or(DEFAULT_CATALOG_PAGE_SIZE as i64),
            ),
        }
    }
}

/// Parameters for browsing a personal list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListQuery {
    /// Case-insensitive title substring.
    pub search: Option<String>,
    /// Ordering; `None` keeps insertion order.
    pub sort: Option<SortKey>,
    /// Exact rating restriction.
    pub rating: RatingFilter,
    /// Page to show.
    pub page: PageRequest,
}

impl Default for ListQuery {
    fn default() -> Self {
        Self {
            search: None,
            sort: None,
            rating: RatingFilter::Any,
            page: PageRequest::first(DEFAULT_LIST_PAGE_SIZE),
        }
    }
}

impl ListQuery {
    /// Build a query from raw request parameters. Unknown values are no-ops.
    pub fn from_params(
        search: Option<&str>,
        sort: Option<&str>,
        rating: Option<i64>,
        page: Option<i64>,
        size: Option<i64>,
    ) -> Self {
        Self {
            search: search.map(str::to_string),
            sort: sort.and_then(SortKey::parse),
            rating: RatingFilter::from_raw(rating),
            page: PageRequest::new(page.unwrap_or(0), size.unwrap_or(DEFAULT_LIST_PAGE_SIZE as i64)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn catalog_defaults() {
        let query = CatalogQuery::from_params(None, None, None, None, None);
        assert_eq!(query, CatalogQuery::default());
        assert_eq!(query.page.size, 18);
    }

    #[test]
    fn unknown_values_become_no_ops() {
        let query = CatalogQuery::from_params(Some("ring"), Some("bogus"), Some("sometimes"), Some(-4), Some(6));
        assert_eq!(query.search.as_deref(), Some("ring"));
        assert_eq!(query.sort, None);
        assert_eq!(query.membership, None);
        assert_eq!(query.page, PageRequest { index: 0, size: 6 });

        let query = ListQuery::from_params(None, Some("rating"), Some(-1), Some(2), None);
        assert_eq!(query.sort, Some(SortKey::Rating));
        assert_eq!(query.rating, RatingFilter::Any);
        assert_eq!(query.page, PageRequest { index: 2, size: 9 });
    }
}
