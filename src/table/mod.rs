//! Table presentation adapter.
//!
//! Binds rows, pagination and the committed sort to a paginated, sortable
//! table view, and turns header clicks, page buttons and page-size picks
//! into [`ParamsChange`] requests for the URL state synchronizer.

mod columns;

pub use columns::*;

use std::collections::BTreeMap;

use serde::Serialize;

use crate::location::ParamsChange;
use crate::models::PaginationInfo;
use crate::query::SortOrder;

/// Placeholder rows shown while loading.
pub const SKELETON_ROWS: usize = 5;

/// Page sizes offered by the rows-per-page control.
pub const ROWS_PER_PAGE_OPTIONS: [u32; 5] = [5, 10, 25, 50, 100];

/// Lifecycle of one table instance.
///
/// Every rendered location is a fresh instance: it mounts into `Loading` and
/// settles once. A parameter change or a retry re-enters `Loading` by
/// navigating to a location that is rendered anew.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "phase", rename_all = "camelCase")]
pub enum TablePhase {
    Idle,
    Loading,
    Populated,
    Empty,
    Errored { message: String },
}

impl TablePhase {
    /// First render starts the initial fetch.
    pub fn mount(self) -> Self {
        match self {
            TablePhase::Idle => TablePhase::Loading,
            other => other,
        }
    }

    /// Settle a fetch. Only a loading table accepts a result.
    pub fn resolve(self, outcome: Result<usize, String>) -> Self {
        match (self, outcome) {
            (TablePhase::Loading, Ok(0)) => TablePhase::Empty,
            (TablePhase::Loading, Ok(_)) => TablePhase::Populated,
            (TablePhase::Loading, Err(message)) => TablePhase::Errored { message },
            (other, _) => other,
        }
    }

    pub fn is_loading(&self) -> bool {
        matches!(self, TablePhase::Loading)
    }
}

/// Page navigation buttons.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PageControl {
    First,
    Previous,
    Next,
    Last,
}

/// Header cell of a rendered table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HeaderCell {
    pub id: &'static str,
    pub label: &'static str,
    pub sortable: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sorted: Option<SortOrder>,
}

/// Body of a rendered table.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum TableBody<T> {
    #[serde(rename_all = "camelCase")]
    Skeleton { rows: usize, columns: usize },
    Rows { rows: Vec<T> },
    #[serde(rename_all = "camelCase")]
    Empty { message: String, col_span: usize },
}

/// A page button and the page it leads to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct PageButton {
    pub page: u32,
    pub enabled: bool,
}

/// Pagination footer of a rendered table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PaginationControls {
    pub page: u32,
    pub total_pages: u32,
    pub limit: u32,
    pub total: u64,
    /// e.g. "Page 2 of 5"
    pub label: String,
    /// e.g. "Showing 11 to 20 of 42 results"
    pub summary: String,
    pub first: PageButton,
    pub previous: PageButton,
    pub next: PageButton,
    pub last: PageButton,
    pub rows_per_page_options: Vec<u32>,
}

/// Parameter change behind every interactive control of a rendered table.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TableActions {
    pub sort: BTreeMap<&'static str, ParamsChange>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub first: Option<ParamsChange>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub previous: Option<ParamsChange>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub next: Option<ParamsChange>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last: Option<ParamsChange>,
    pub page_size: BTreeMap<u32, ParamsChange>,
}

/// A rendered table.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TableView<T> {
    pub headers: Vec<HeaderCell>,
    pub body: TableBody<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pagination: Option<PaginationControls>,
    pub actions: TableActions,
}

/// Generic paginated, sortable table over rows of `T`.
#[derive(Debug, Clone)]
pub struct DataTable<T> {
    columns: &'static [Column],
    rows: Vec<T>,
    is_loading: bool,
    pagination: Option<PaginationInfo>,
    sorting: Option<(String, SortOrder)>,
    empty_message: String,
    rows_per_page_options: Vec<u32>,
}

impl<T> DataTable<T> {
    pub fn new(columns: &'static [Column], rows: Vec<T>) -> Self {
        Self {
            columns,
            rows,
            is_loading: false,
            pagination: None,
            sorting: None,
            empty_message: "No results found.".to_string(),
            rows_per_page_options: ROWS_PER_PAGE_OPTIONS.to_vec(),
        }
    }

    pub fn loading(mut self, is_loading: bool) -> Self {
        self.is_loading = is_loading;
        self
    }

    pub fn pagination(mut self, pagination: Option<PaginationInfo>) -> Self {
        self.pagination = pagination;
        self
    }

    /// Current sort, as committed in the location.
    pub fn sorting(mut self, sort_by: Option<&str>, sort_order: Option<SortOrder>) -> Self {
        self.sorting = sort_by.zip(sort_order).map(|(by, order)| (by.to_string(), order));
        self
    }

    pub fn empty_message(mut self, message: impl Into<String>) -> Self {
        self.empty_message = message.into();
        self
    }

    fn sorted(&self, column_id: &str) -> Option<SortOrder> {
        self.sorting
            .as_ref()
            .filter(|(by, _)| by == column_id)
            .map(|(_, order)| *order)
    }

    /// Header click: none → asc → desc → none. Switching columns starts at asc.
    pub fn toggle_sort(&self, column_id: &str) -> Option<ParamsChange> {
        let column = self.columns.iter().find(|c| c.id == column_id)?;
        if !column.sortable {
            return None;
        }

        let change = match self.sorted(column_id) {
            None => ParamsChange::new()
                .set("sortBy", column.id)
                .set("sortOrder", SortOrder::Asc.as_str()),
            Some(SortOrder::Asc) => ParamsChange::new()
                .set("sortBy", column.id)
                .set("sortOrder", SortOrder::Desc.as_str()),
            Some(SortOrder::Desc) => ParamsChange::new().clear("sortBy").clear("sortOrder"),
        };
        Some(change)
    }

    /// Target of a page button, and whether it is enabled.
    pub fn page_button(&self, control: PageControl) -> Option<PageButton> {
        let p = self.pagination?;
        let (page, enabled) = match control {
            PageControl::First => (1, p.page > 1),
            PageControl::Previous => (p.page.saturating_sub(1).max(1), p.page > 1),
            PageControl::Next => (p.page.saturating_add(1), p.page < p.total_pages),
            PageControl::Last => (p.total_pages.max(1), p.page < p.total_pages),
        };
        Some(PageButton {
            page,
            enabled: enabled && !self.is_loading,
        })
    }

    /// Page button click; disabled buttons emit nothing.
    pub fn go_to(&self, control: PageControl) -> Option<ParamsChange> {
        self.page_button(control)
            .filter(|b| b.enabled)
            .map(|b| ParamsChange::new().set("page", b.page))
    }

    /// Page-size pick always returns to page 1.
    pub fn change_page_size(&self, limit: u32) -> ParamsChange {
        ParamsChange::new().set("limit", limit).set("page", 1u32)
    }

    fn headers(&self) -> Vec<HeaderCell> {
        self.columns
            .iter()
            .map(|c| HeaderCell {
                id: c.id,
                label: c.header,
                sortable: c.sortable,
                sorted: self.sorted(c.id),
            })
            .collect()
    }

    fn controls(&self) -> Option<PaginationControls> {
        let p = self.pagination?;
        let button = |control| {
            self.page_button(control).unwrap_or(PageButton {
                page: 1,
                enabled: false,
            })
        };

        Some(PaginationControls {
            page: p.page,
            total_pages: p.total_pages,
            limit: p.limit,
            total: p.total,
            label: format!("Page {} of {}", p.page, p.total_pages),
            summary: format!(
                "Showing {} to {} of {} results",
                p.first_row(),
                p.last_row(),
                p.total
            ),
            first: button(PageControl::First),
            previous: button(PageControl::Previous),
            next: button(PageControl::Next),
            last: button(PageControl::Last),
            rows_per_page_options: self.rows_per_page_options.clone(),
        })
    }

    fn actions(&self) -> TableActions {
        let sort = self
            .columns
            .iter()
            .filter_map(|c| self.toggle_sort(c.id).map(|change| (c.id, change)))
            .collect();
        let page_size = self
            .rows_per_page_options
            .iter()
            .map(|&limit| (limit, self.change_page_size(limit)))
            .collect();

        TableActions {
            sort,
            first: self.go_to(PageControl::First),
            previous: self.go_to(PageControl::Previous),
            next: self.go_to(PageControl::Next),
            last: self.go_to(PageControl::Last),
            page_size,
        }
    }

    pub fn into_view(self) -> TableView<T> {
        let headers = self.headers();
        let pagination = self.controls();
        let actions = self.actions();

        let body = if self.is_loading {
            TableBody::Skeleton {
                rows: SKELETON_ROWS,
                columns: self.columns.len(),
            }
        } else if self.rows.is_empty() {
            TableBody::Empty {
                message: self.empty_message,
                col_span: self.columns.len(),
            }
        } else {
            TableBody::Rows { rows: self.rows }
        };

        TableView {
            headers,
            body,
            pagination,
            actions,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::fixtures::sample_robot;
    use crate::models::{Robot, RobotStatus};

    fn robots(n: usize) -> Vec<Robot> {
        (0..n)
            .map(|i| sample_robot(&format!("AR{}", i), RobotStatus::Active, 50.0))
            .collect()
    }

    fn table(rows: usize, page: u32, total: u64) -> DataTable<Robot> {
        DataTable::new(ROBOT_COLUMNS, robots(rows)).pagination(Some(PaginationInfo::new(page, 10, total)))
    }

    #[test]
    fn test_sort_cycle() {
        let t = table(1, 1, 1);
        assert_eq!(
            t.toggle_sort("charge"),
            Some(ParamsChange::new().set("sortBy", "charge").set("sortOrder", "asc"))
        );

        let t = t.sorting(Some("charge"), Some(SortOrder::Asc));
        assert_eq!(
            t.toggle_sort("charge"),
            Some(ParamsChange::new().set("sortBy", "charge").set("sortOrder", "desc"))
        );
        assert_eq!(
            t.toggle_sort("status"),
            Some(ParamsChange::new().set("sortBy", "status").set("sortOrder", "asc"))
        );

        let t = t.sorting(Some("charge"), Some(SortOrder::Desc));
        assert_eq!(
            t.toggle_sort("charge"),
            Some(ParamsChange::new().clear("sortBy").clear("sortOrder"))
        );

        assert_eq!(t.toggle_sort("nope"), None);
    }

    #[test]
    fn test_boundary_buttons() {
        let first = table(10, 1, 42);
        assert!(first.go_to(PageControl::First).is_none());
        assert!(first.go_to(PageControl::Previous).is_none());
        assert_eq!(
            first.go_to(PageControl::Next),
            Some(ParamsChange::new().set("page", 2u32))
        );
        assert_eq!(
            first.go_to(PageControl::Last),
            Some(ParamsChange::new().set("page", 5u32))
        );

        let last = table(2, 5, 42);
        assert!(last.go_to(PageControl::Next).is_none());
        assert!(last.go_to(PageControl::Last).is_none());
        assert_eq!(
            last.go_to(PageControl::Previous),
            Some(ParamsChange::new().set("page", 4u32))
        );
    }

    #[test]
    fn test_loading_disables_everything() {
        let t = table(0, 3, 42).loading(true);
        for control in [
            PageControl::First,
            PageControl::Previous,
            PageControl::Next,
            PageControl::Last,
        ] {
            assert!(t.go_to(control).is_none());
        }

        let view = t.into_view();
        assert_eq!(
            view.body,
            TableBody::Skeleton {
                rows: SKELETON_ROWS,
                columns: ROBOT_COLUMNS.len()
            }
        );
        let controls = view.pagination.unwrap();
        assert!(!controls.next.enabled);
        assert!(!controls.first.enabled);
    }

    #[test]
    fn test_page_size_resets_page() {
        let t = table(10, 4, 42);
        assert_eq!(
            t.change_page_size(25),
            ParamsChange::new().set("limit", 25u32).set("page", 1u32)
        );
    }

    #[test]
    fn test_empty_state() {
        let view = DataTable::<Robot>::new(ROBOT_COLUMNS, Vec::new())
            .empty_message("No robots found.")
            .into_view();

        assert_eq!(
            view.body,
            TableBody::Empty {
                message: "No robots found.".to_string(),
                col_span: ROBOT_COLUMNS.len()
            }
        );
        assert!(view.pagination.is_none());
    }

    #[test]
    fn test_populated_view() {
        let view = table(8, 2, 42)
            .sorting(Some("charge"), Some(SortOrder::Asc))
            .into_view();

        match &view.body {
            TableBody::Rows { rows } => assert_eq!(rows.len(), 8),
            other => panic!("expected rows, got {:?}", other),
        }

        let controls = view.pagination.as_ref().unwrap();
        assert_eq!(controls.label, "Page 2 of 5");
        assert_eq!(controls.summary, "Showing 11 to 20 of 42 results");
        assert!(controls.first.enabled && controls.previous.enabled);
        assert!(controls.next.enabled && controls.last.enabled);

        let charge = view.headers.iter().find(|h| h.id == "charge").unwrap();
        assert_eq!(charge.sorted, Some(SortOrder::Asc));

        assert_eq!(
            view.actions.sort["charge"],
            ParamsChange::new().set("sortBy", "charge").set("sortOrder", "desc")
        );
        assert_eq!(view.actions.next, Some(ParamsChange::new().set("page", 3u32)));
        assert_eq!(view.actions.page_size.len(), ROWS_PER_PAGE_OPTIONS.len());

        let json = serde_json::to_value(&view).unwrap();
        assert_eq!(json["body"]["kind"], "rows");
        assert_eq!(json["actions"]["pageSize"]["25"]["limit"], 25.0);
        assert_eq!(json["pagination"]["totalPages"], 5);
    }

    #[test]
    fn test_phase_transitions() {
        let phase = TablePhase::Idle.mount();
        assert!(phase.is_loading());

        let phase = phase.resolve(Ok(8));
        assert_eq!(phase, TablePhase::Populated);

        assert!(!phase.is_loading());

        let empty = TablePhase::Idle.mount().resolve(Ok(0));
        assert_eq!(empty, TablePhase::Empty);

        let errored = TablePhase::Idle.mount().resolve(Err("HTTP 500".to_string()));
        assert!(matches!(errored, TablePhase::Errored { .. }));

        // A settled table ignores late results and repeated mounts
        let still = errored.clone().mount().resolve(Ok(3));
        assert_eq!(still, errored);
    }
}
