//! Data-table state shared by every entity list: paging, filters, sort and
//! row selection, translated into [`ListParams`] for the resource client.

use std::collections::BTreeSet;

use serde_json::{Map, Value};

use crate::api::reports::{ReportFormat, ReportRequest};
use crate::api::{DEFAULT_PAGE_SIZE, ListParams, Resource, SortDirection, SortField};

pub const MAX_PAGE_SIZE: u32 = 100;

/// Pagination, filter, sort and selection state behind an entity table.
///
/// Every change that alters which rows match (filters, page size) moves
/// back to the first page. Row selection is by record id and survives
/// paging.
#[derive(Clone, Debug, PartialEq)]
pub struct TableState {
    pub resource: String,
    pub page_index: u32,
    page_size: u32,
    pub global_filter: String,
    pub column_filters: Map<String, Value>,
    pub sort: Vec<SortField>,
    pub selected: BTreeSet<String>,
    pub total_count: u64,
}

impl TableState {
    #[must_use]
    pub fn new(resource: &str) -> Self {
        Self {
            resource: resource.to_owned(),
            page_index: 0,
            page_size: DEFAULT_PAGE_SIZE,
            global_filter: String::new(),
            column_filters: Map::new(),
            sort: Vec::new(),
            selected: BTreeSet::new(),
            total_count: 0,
        }
    }

    #[must_use]
    pub fn for_resource<T: Resource>() -> Self {
        Self::new(T::NAME)
    }

    /// Rows per page, always within `1..=MAX_PAGE_SIZE`.
    #[must_use]
    pub fn page_size(&self) -> u32 {
        self.page_size
    }

    #[must_use]
    pub fn to_list_params(&self) -> ListParams {
        let query = self.global_filter.trim();
        ListParams {
            limit: self.page_size,
            offset: self.page_index.saturating_mul(self.page_size),
            query: (!query.is_empty()).then(|| query.to_owned()),
            filters: self.column_filters.clone(),
            sort: self.sort.clone(),
        }
    }

    /// Number of pages for the last known total; at least one.
    #[must_use]
    pub fn page_count(&self) -> u32 {
        let pages = self.total_count.div_ceil(u64::from(self.page_size.max(1))).max(1);
        u32::try_from(pages).unwrap_or(u32::MAX)
    }

    pub fn set_page(&mut self, index: u32) {
        self.page_index = index.min(self.page_count() - 1);
    }

    pub fn next_page(&mut self) -> bool {
        if self.page_index + 1 < self.page_count() {
            self.page_index += 1;
            true
        } else {
            false
        }
    }

    pub fn previous_page(&mut self) -> bool {
        if self.page_index > 0 {
            self.page_index -= 1;
            true
        } else {
            false
        }
    }

    pub fn set_page_size(&mut self, size: u32) {
        self.page_size = size.clamp(1, MAX_PAGE_SIZE);
        self.page_index = 0;
    }

    pub fn set_global_filter(&mut self, filter: &str) {
        self.global_filter = filter.to_owned();
        self.page_index = 0;
    }

    /// Set one column filter; `null` removes it.
    pub fn set_column_filter(&mut self, column: &str, value: Value) {
        if value.is_null() {
            self.column_filters.remove(column);
        } else {
            self.column_filters.insert(column.to_owned(), value);
        }
        self.page_index = 0;
    }

    /// Cycle a column through ascending, descending and unsorted. Clicking a
    /// new column replaces the existing sort.
    pub fn toggle_sort(&mut self, field: &str) {
        let next = match self.sort.iter().find(|s| s.field == field).map(|s| s.direction) {
            None => Some(SortDirection::Asc),
            Some(SortDirection::Asc) => Some(SortDirection::Desc),
            Some(SortDirection::Desc) => None,
        };
        self.sort.clear();
        if let Some(direction) = next {
            self.sort.push(SortField { field: field.to_owned(), direction });
        }
    }

    /// Flip selection of one row; returns whether it is now selected.
    pub fn toggle_row(&mut self, id: &str) -> bool {
        if self.selected.remove(id) {
            false
        } else {
            self.selected.insert(id.to_owned());
            true
        }
    }

    pub fn select_all<'a>(&mut self, ids: impl IntoIterator<Item = &'a str>) {
        self.selected.extend(ids.into_iter().map(str::to_owned));
    }

    pub fn clear_selection(&mut self) {
        self.selected.clear();
    }

    #[must_use]
    pub fn is_selected(&self, id: &str) -> bool {
        self.selected.contains(id)
    }

    /// Record the total from a fetched page and pull the page index back in
    /// range if rows disappeared.
    pub fn apply_page(&mut self, count: u64) {
        self.total_count = count;
        self.page_index = self.page_index.min(self.page_count() - 1);
    }

    /// Report request exporting every row matching the current filters.
    #[must_use]
    pub fn export_request(&self, format: ReportFormat, columns: &[&str]) -> ReportRequest {
        let query = self.global_filter.trim();
        ReportRequest {
            resource: self.resource.clone(),
            format,
            columns: columns.iter().map(|c| (*c).to_owned()).collect(),
            query: (!query.is_empty()).then(|| query.to_owned()),
            filters: self.column_filters.clone(),
            ..ReportRequest::default()
        }
    }
}

#[cfg(test)]
#[path = "table_test.rs"]
mod table_test;
