//! State shared by every entity store.
//!
//! An [`EntityState`] holds the current page of records, the selected
//! record, loading and error flags, pagination and filters. Stores wrap
//! their API calls in [`EntityState::run`] and then reconcile the result
//! with one of the patch helpers.

use std::collections::HashMap;
use std::fmt;
use std::future::Future;
use std::hash::Hash;

use tracing::warn;

use crate::api::error::Result;
use crate::api::types::{Entity, Page, QueryParams};
use crate::pagination::Pagination;

/// Search text plus typed equality filters for one entity type.
pub trait Filters<T>: Default + Clone + fmt::Debug {
    /// Free-text search term; empty means no search.
    fn search(&self) -> &str;

    fn set_search(&mut self, term: String);

    /// The set equality filters as query parameters. Excludes the search.
    fn query_pairs(&self) -> Vec<(&'static str, String)>;

    /// Whether `item` passes the search and every set filter.
    fn matches(&self, item: &T) -> bool;

    /// Number of set filters, not counting the search.
    fn active_count(&self) -> usize {
        self.query_pairs().len()
    }

    /// Reset every filter and the search.
    fn clear(&mut self) {
        *self = Self::default();
    }
}

/// Search-only filters for entities without typed filters.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SearchFilter {
    pub search: String,
}

/// Text fields a [`SearchFilter`] looks at.
pub trait Searchable {
    fn search_fields(&self) -> Vec<&str>;
}

impl<T: Searchable> Filters<T> for SearchFilter {
    fn search(&self) -> &str {
        &self.search
    }

    fn set_search(&mut self, term: String) {
        self.search = term;
    }

    fn query_pairs(&self) -> Vec<(&'static str, String)> {
        Vec::new()
    }

    fn matches(&self, item: &T) -> bool {
        matches_search(&self.search, item.search_fields())
    }
}

/// Case-insensitive substring match of `term` against any field.
///
/// An empty term matches everything.
pub fn matches_search<'a>(term: &str, fields: impl IntoIterator<Item = &'a str>) -> bool {
    let term = term.trim();
    if term.is_empty() {
        return true;
    }
    let needle = term.to_lowercase();
    fields
        .into_iter()
        .any(|field| field.to_lowercase().contains(&needle))
}

/// Check an optional equality filter.
pub fn matches_opt<V: PartialEq>(filter: &Option<V>, value: &V) -> bool {
    filter.as_ref().map_or(true, |f| f == value)
}

/// List, selection and request state for one entity type.
#[derive(Debug, Clone)]
pub struct EntityState<T, F> {
    /// The current page, in server order.
    pub items: Vec<T>,
    /// The selected record.
    pub current: Option<T>,
    pub loading: bool,
    /// Message of the last failed action. Cleared when an action starts.
    pub error: Option<String>,
    pub pagination: Pagination,
    pub filters: F,
}

impl<T, F: Default> Default for EntityState<T, F> {
    fn default() -> Self {
        Self {
            items: Vec::new(),
            current: None,
            loading: false,
            error: None,
            pagination: Pagination::default(),
            filters: F::default(),
        }
    }
}

impl<T, F> EntityState<T, F>
where
    T: Entity + Clone,
    F: Filters<T>,
{
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_page_size(size: u32) -> Self {
        Self {
            pagination: Pagination::new(size),
            ..Self::default()
        }
    }

    /// Build list query parameters.
    ///
    /// Order of precedence, lowest first: pagination, `extra`, the search
    /// term, then the set filters.
    pub fn query(&self, extra: QueryParams) -> QueryParams {
        let mut params = QueryParams::new()
            .page(self.pagination.page)
            .size(self.pagination.size);
        params.extend_from(&extra);

        let search = self.filters.search().trim();
        if !search.is_empty() {
            params.set("search", search);
        }
        for (key, value) in self.filters.query_pairs() {
            params.set(key, value);
        }
        params
    }

    /// Await an API call with loading and error bookkeeping.
    ///
    /// `loading` is set for the duration and is always cleared afterwards.
    /// A failure is recorded in `error` and returned unchanged; the list,
    /// selection and pagination are left as they were.
    pub async fn run<R, Fut>(&mut self, call: Fut) -> Result<R>
    where
        Fut: Future<Output = Result<R>>,
    {
        self.loading = true;
        self.error = None;
        let result = call.await;
        self.loading = false;
        if let Err(e) = &result {
            warn!("Store action failed: {}", e);
            self.error = Some(e.to_string());
        }
        result
    }

    /// Replace the list and pagination with a server page.
    pub fn apply_page(&mut self, page: Page<T>) {
        self.pagination.apply(&page);
        self.items = page.items;
    }

    pub fn set_current(&mut self, item: T) {
        self.current = Some(item);
    }

    /// Prepend a newly created record and count it.
    pub fn insert_created(&mut self, item: T) {
        self.items.insert(0, item);
        self.pagination.total += 1;
    }

    /// Replace the record with the same id in the list and the selection.
    ///
    /// Records not on the current page are left alone.
    pub fn replace(&mut self, item: T) {
        let id = item.id();
        if let Some(slot) = self.items.iter_mut().find(|i| i.id() == id) {
            *slot = item.clone();
        }
        if self.current.as_ref().is_some_and(|c| c.id() == id) {
            self.current = Some(item);
        }
    }

    /// Drop a deleted record from the list and the selection.
    pub fn remove(&mut self, id: i64) {
        self.items.retain(|i| i.id() != id);
        self.pagination.total = self.pagination.total.saturating_sub(1);
        if self.current.as_ref().is_some_and(|c| c.id() == id) {
            self.current = None;
        }
    }

    pub fn find(&self, id: i64) -> Option<&T> {
        self.items.iter().find(|i| i.id() == id)
    }

    /// The current page filtered locally by search and filters.
    pub fn filtered(&self) -> Vec<&T> {
        self.items
            .iter()
            .filter(|item| self.filters.matches(item))
            .collect()
    }

    /// Items on the current page matching `predicate`.
    pub fn select(&self, predicate: impl Fn(&T) -> bool) -> Vec<&T> {
        self.items.iter().filter(|item| predicate(item)).collect()
    }

    /// Group the current page by a key, preserving order within groups.
    pub fn group_by<K, KF>(&self, key: KF) -> HashMap<K, Vec<&T>>
    where
        K: Eq + Hash,
        KF: Fn(&T) -> K,
    {
        let mut groups: HashMap<K, Vec<&T>> = HashMap::new();
        for item in &self.items {
            groups.entry(key(item)).or_default().push(item);
        }
        groups
    }

    pub fn has_items(&self) -> bool {
        !self.items.is_empty()
    }

    pub fn total_pages(&self) -> u32 {
        self.pagination.total_pages()
    }

    /// Set the search term and return to the first page.
    pub fn set_search(&mut self, term: impl Into<String>) {
        self.filters.set_search(term.into());
        self.pagination.first();
    }

    /// Mutate the filters and return to the first page.
    pub fn update_filters(&mut self, update: impl FnOnce(&mut F)) {
        update(&mut self.filters);
        self.pagination.first();
    }

    pub fn set_page(&mut self, page: u32) {
        self.pagination.set_page(page);
    }

    pub fn set_page_size(&mut self, size: u32) {
        self.pagination.set_size(size);
    }

    /// Reset filters and search and return to the first page.
    pub fn clear_filters(&mut self) {
        self.filters.clear();
        self.pagination.first();
    }

    pub fn clear_current(&mut self) {
        self.current = None;
    }

    /// Restore the initial state, keeping the configured page size.
    pub fn clear_all(&mut self) {
        let size = self.pagination.size;
        *self = Self::with_page_size(size);
    }
}
