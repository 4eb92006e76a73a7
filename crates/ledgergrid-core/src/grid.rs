//! # Grid Engine
//!
//! One generic grid instance, parameterized by the record type, its
//! [`GridDefinition`] and an optional layout store.
//!
//! ## Data flow
//!
//! ```text
//! rows ──► filter (search ∘ facets ∘ conditions) ──► sort ──► page ──► view
//!            ▲                                                          ▲
//!   column schema ◄── layout interaction (resize / reorder)      live widths
//! ```
//!
//! ## Derivations
//!
//! The filtered+sorted index list is memoized on
//! `(rows, filters, sort)` revisions; facet option lists per column on
//! `(rows, filters)`. Paging and layout changes never refilter or resort.
//!
//! ## Page resets
//!
//! Search, facet, condition and page-size changes return to page 1. Sort
//! changes keep the page. Replacing the rows clamps it.

use crate::definition::GridDefinition;
use crate::display::format_cell;
use crate::facet::{self, FacetPopover};
use crate::filter::FilterEngine;
use crate::layout::{DragEvent, LayoutCommit, LayoutInteraction, ResizeEvent};
use crate::memo::{Memo, Revision};
use crate::pagination::{PageInfo, page_range};
use crate::persistence::{LayoutPersistence, LayoutStore, PersistedState};
use crate::primitives::MAX_PAGE_SIZE;
use crate::schema::ColumnSchema;
use crate::{
    CellValue, ColumnDescriptor, ColumnFormat, FilterState, GridError, GridRecord,
    PaginationState, SortDirection, SortState, sort,
};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;

type OrderKey = (Revision, Revision, Revision);
type FacetKey = (Revision, Revision);

// =============================================================================
// VIEW TYPES
// =============================================================================

/// Which empty-body message to show.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EmptyState {
    /// At least one row passes the filters.
    HasRows,
    /// The row source is empty, or nothing passes with no filter active.
    NoRowsAvailable,
    /// Rows exist but the active filters exclude all of them.
    NoMatches,
}

/// A rendered column header.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ViewColumn {
    pub key: String,
    pub label: String,
    /// Live width while the column is being resized.
    pub width: u32,
    pub sortable: bool,
    pub filterable: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub format: Option<ColumnFormat>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sort: Option<SortDirection>,
    pub filtered: bool,
    pub drop_target: bool,
}

/// A rendered row of the current page.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ViewRow {
    /// Index into the row source.
    pub index: usize,
    /// Raw values, aligned with the view columns.
    pub cells: Vec<CellValue>,
    /// Display text, aligned with the view columns.
    pub display: Vec<String>,
}

/// Everything needed to render one grid instance.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GridView {
    pub grid: String,
    pub columns: Vec<ViewColumn>,
    pub rows: Vec<ViewRow>,
    pub page: PageInfo,
    pub empty_state: EmptyState,
    pub total_width: u32,
    pub filters: FilterState,
    pub sort: SortState,
}

// =============================================================================
// ROW ACTIONS
// =============================================================================

/// Row-level intents the grid forwards without interpreting.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RowAction {
    Edit,
    Delete,
    #[serde(rename = "audit", alias = "view_audit")]
    ViewAudit,
}

impl std::str::FromStr for RowAction {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "edit" => Ok(Self::Edit),
            "delete" => Ok(Self::Delete),
            "audit" | "view_audit" => Ok(Self::ViewAudit),
            other => Err(format!("unknown row action: {other}")),
        }
    }
}

/// Receiver of row actions.
pub trait RowActions<R> {
    fn on_edit(&mut self, row: &R);
    fn on_delete(&mut self, row: &R);
    fn on_view_audit(&mut self, row: &R);
}

// =============================================================================
// GRID
// =============================================================================

/// An interactive grid over rows of type `R`.
pub struct Grid<R: GridRecord> {
    definition: Arc<GridDefinition>,
    schema: ColumnSchema,
    rows: Arc<Vec<R>>,
    filters: FilterState,
    sort: SortState,
    pagination: PaginationState,
    interaction: LayoutInteraction,
    popover: Option<FacetPopover>,
    persistence: Option<LayoutPersistence>,

    rows_rev: Revision,
    filter_rev: Revision,
    sort_rev: Revision,
    ordered: Memo<OrderKey, Vec<usize>>,
    facet_options: BTreeMap<String, Memo<FacetKey, Vec<String>>>,
}

impl<R: GridRecord> std::fmt::Debug for Grid<R> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Grid")
            .field("grid", &self.definition.name)
            .field("rows", &self.rows.len())
            .field("filters", &self.filters)
            .field("sort", &self.sort)
            .field("pagination", &self.pagination)
            .finish_non_exhaustive()
    }
}

impl<R: GridRecord> Grid<R> {
    /// A grid with canonical layout and no persistence.
    #[must_use]
    pub fn new(definition: Arc<GridDefinition>, rows: Vec<R>) -> Self {
        Self::shared(definition, Arc::new(rows))
    }

    /// Like [`Grid::new`], over a row source shared with other instances.
    #[must_use]
    pub fn shared(definition: Arc<GridDefinition>, rows: Arc<Vec<R>>) -> Self {
        let schema = ColumnSchema::new(definition.columns.clone());
        let pagination = PaginationState::new(definition.default_page_size);
        Self {
            definition,
            schema,
            rows,
            filters: FilterState::default(),
            sort: SortState::default(),
            pagination,
            interaction: LayoutInteraction::default(),
            popover: None,
            persistence: None,
            rows_rev: Revision::default(),
            filter_rev: Revision::default(),
            sort_rev: Revision::default(),
            ordered: Memo::new(),
            facet_options: BTreeMap::new(),
        }
    }

    /// A grid whose layout is reconciled with, and saved to, `store`.
    ///
    /// Grids persisting state also restore filters, sort and page size.
    #[must_use]
    pub fn open(
        definition: Arc<GridDefinition>,
        rows: Arc<Vec<R>>,
        store: Arc<dyn LayoutStore>,
    ) -> Self {
        let persistence = LayoutPersistence::new(store, definition.storage_key.clone());
        let mut grid = Self::shared(definition, rows);

        let persisted = persistence.load_columns();
        grid.schema = ColumnSchema::reconciled(grid.definition.columns.clone(), &persisted);

        if grid.definition.persist_state {
            if let Some(state) = persistence.load_state() {
                grid.filters = state.filters;
                grid.sort = state.sort;
                if let Some(size) = state.page_size.filter(|s| (1..=MAX_PAGE_SIZE).contains(s)) {
                    grid.pagination.page_size = size;
                }
            }
        }

        tracing::debug!(
            grid = %grid.definition.name,
            persisted_columns = persisted.len(),
            "grid opened"
        );
        grid.persistence = Some(persistence);
        grid
    }

    /// Override the minimum column width for resizing.
    #[must_use]
    pub fn with_min_width(mut self, min_width: u32) -> Self {
        self.schema = self.schema.with_min_width(min_width);
        self.interaction = LayoutInteraction::new(self.schema.min_width());
        self
    }

    // -------------------------------------------------------------------------
    // Accessors
    // -------------------------------------------------------------------------

    #[must_use]
    pub fn definition(&self) -> &GridDefinition {
        &self.definition
    }

    #[must_use]
    pub fn schema(&self) -> &ColumnSchema {
        &self.schema
    }

    #[must_use]
    pub fn columns(&self) -> &[ColumnDescriptor] {
        self.schema.columns()
    }

    #[must_use]
    pub fn rows(&self) -> &[R] {
        &self.rows
    }

    #[must_use]
    pub fn filters(&self) -> &FilterState {
        &self.filters
    }

    #[must_use]
    pub fn sort_state(&self) -> &SortState {
        &self.sort
    }

    #[must_use]
    pub fn pagination(&self) -> PaginationState {
        self.pagination
    }

    #[must_use]
    pub fn interaction(&self) -> &LayoutInteraction {
        &self.interaction
    }

    #[must_use]
    pub fn popover(&self) -> Option<&FacetPopover> {
        self.popover.as_ref()
    }

    pub fn popover_mut(&mut self) -> Option<&mut FacetPopover> {
        self.popover.as_mut()
    }

    /// How many times the filtered+sorted order was derived.
    #[must_use]
    pub fn derivations(&self) -> u64 {
        self.ordered.computations()
    }

    // -------------------------------------------------------------------------
    // Row source
    // -------------------------------------------------------------------------

    /// Replace the row source and clamp the page.
    pub fn set_rows(&mut self, rows: Vec<R>) {
        self.set_shared_rows(Arc::new(rows));
    }

    /// Replace the row source with one shared by other instances.
    pub fn set_shared_rows(&mut self, rows: Arc<Vec<R>>) {
        self.rows = rows;
        self.rows_rev.bump();
        let total = self.filtered_len();
        self.pagination.clamp(total);
        tracing::debug!(grid = %self.definition.name, rows = self.rows.len(), "rows refreshed");
    }

    // -------------------------------------------------------------------------
    // Filtering
    // -------------------------------------------------------------------------

    pub fn set_search(&mut self, term: impl Into<String>) {
        let term = term.into();
        let changed = self.filters.search_term != term;
        self.filters.search_term = term;
        self.filters_changed(changed);
    }

    /// Commit a facet selection. An empty set removes the constraint.
    ///
    /// Returns `false` for a column that is not filterable.
    pub fn set_facet(&mut self, column: &str, values: BTreeSet<String>) -> Result<bool, GridError> {
        if !self.column(column)?.filterable {
            return Ok(false);
        }
        let changed = if values.is_empty() {
            self.filters.facets.remove(column).is_some_and(|old| !old.is_empty())
        } else {
            self.filters.facets.insert(column.to_string(), values.clone()) != Some(values)
        };
        self.filters_changed(changed);
        Ok(true)
    }

    pub fn clear_facet(&mut self, column: &str) -> Result<bool, GridError> {
        self.set_facet(column, BTreeSet::new())
    }

    /// Replace the selected conditions.
    pub fn set_conditions(&mut self, conditions: BTreeSet<String>) {
        let changed = self.filters.conditions != conditions;
        self.filters.conditions = conditions;
        self.filters_changed(changed);
    }

    /// Select or deselect one condition.
    pub fn toggle_condition(&mut self, name: &str) {
        if !self.filters.conditions.remove(name) {
            self.filters.conditions.insert(name.to_string());
        }
        self.filters_changed(true);
    }

    /// Drop search, facets and conditions.
    pub fn clear_filters(&mut self) {
        let changed = self.filters != FilterState::default();
        self.filters = FilterState::default();
        self.filters_changed(changed);
    }

    fn filters_changed(&mut self, changed: bool) {
        if changed {
            self.filter_rev.bump();
        }
        self.pagination.first();
        self.save_state();
    }

    // -------------------------------------------------------------------------
    // Facet popover
    // -------------------------------------------------------------------------

    /// Reachable options for `column` under every other active filter.
    pub fn facet_options(&mut self, column: &str) -> Result<&[String], GridError> {
        self.column(column)?;
        let key = (self.rows_rev, self.filter_rev);
        let engine = FilterEngine::new(
            self.schema.columns(),
            &self.definition.search,
            &self.definition.conditions,
        );
        let rows = self.rows.as_slice();
        let filters = &self.filters;
        let memo = self.facet_options.entry(column.to_string()).or_default();
        Ok(memo
            .get_or_compute(key, || facet::unique_values(&engine, rows, column, filters, true))
            .as_slice())
    }

    /// Open the popover of a filterable column, replacing any open one.
    pub fn open_facet(&mut self, column: &str) -> Result<Option<&mut FacetPopover>, GridError> {
        if !self.column(column)?.filterable {
            return Ok(None);
        }
        let options = self.facet_options(column)?.to_vec();
        let committed = self.filters.facets.get(column).cloned().unwrap_or_default();
        self.popover = Some(FacetPopover::open(column, options, committed));
        Ok(self.popover.as_mut())
    }

    /// Commit the open popover's selection and close it.
    pub fn apply_facet(&mut self) -> Result<bool, GridError> {
        let Some(popover) = self.popover.take() else {
            return Ok(false);
        };
        let column = popover.column().to_string();
        self.set_facet(&column, popover.apply())
    }

    /// Close the open popover, discarding its staged selection.
    pub fn cancel_facet(&mut self) {
        if let Some(popover) = self.popover.take() {
            let _ = popover.cancel();
        }
    }

    /// "Sort A to Z / Z to A" from the open popover.
    pub fn sort_from_popover(&mut self, direction: SortDirection) -> Result<bool, GridError> {
        let Some(intent) = self.popover.as_ref().map(|p| p.sort_intent(direction)) else {
            return Ok(false);
        };
        match intent.column {
            Some(column) => self.sort_by(&column, intent.direction),
            None => Ok(false),
        }
    }

    // -------------------------------------------------------------------------
    // Sorting
    // -------------------------------------------------------------------------

    /// Header click. Returns `false` for an unsortable column.
    pub fn toggle_sort(&mut self, column: &str) -> Result<bool, GridError> {
        if !self.column(column)?.sortable {
            return Ok(false);
        }
        self.sort.click(column);
        self.sort_changed();
        Ok(true)
    }

    /// Sort by `column` in an explicit direction, replacing the current sort.
    pub fn sort_by(&mut self, column: &str, direction: SortDirection) -> Result<bool, GridError> {
        if !self.column(column)?.sortable {
            return Ok(false);
        }
        self.sort = SortState::by(column, direction);
        self.sort_changed();
        Ok(true)
    }

    pub fn clear_sort(&mut self) {
        self.sort = SortState::default();
        self.sort_changed();
    }

    fn sort_changed(&mut self) {
        self.sort_rev.bump();
        self.save_state();
    }

    // -------------------------------------------------------------------------
    // Pagination
    // -------------------------------------------------------------------------

    pub fn first_page(&mut self) {
        self.pagination.first();
    }

    pub fn previous_page(&mut self) {
        self.pagination.previous();
    }

    pub fn next_page(&mut self) {
        let total = self.filtered_len();
        self.pagination.next(total);
    }

    pub fn last_page(&mut self) {
        let total = self.filtered_len();
        self.pagination.last(total);
    }

    /// Jump to a page, clamped into range.
    pub fn goto_page(&mut self, page: usize) {
        let total = self.filtered_len();
        self.pagination.goto(page, total);
    }

    pub fn set_page_size(&mut self, page_size: usize) -> Result<(), GridError> {
        self.pagination.set_page_size(page_size)?;
        self.save_state();
        Ok(())
    }

    // -------------------------------------------------------------------------
    // Column layout
    // -------------------------------------------------------------------------

    pub fn set_visible(&mut self, column: &str, visible: bool) -> Result<bool, GridError> {
        let changed = self.schema.set_visible(column, visible)?;
        if changed {
            tracing::debug!(grid = %self.definition.name, column, visible, "column visibility changed");
            self.save_columns();
        }
        Ok(changed)
    }

    /// Set a width, clamped to the minimum. Returns the applied width.
    pub fn set_width(&mut self, column: &str, px: u32) -> Result<u32, GridError> {
        let width = self.schema.set_width(column, px)?;
        tracing::debug!(grid = %self.definition.name, column, width, "column resized");
        self.save_columns();
        Ok(width)
    }

    /// Move the column at `from` to position `to`.
    pub fn reorder(&mut self, from: usize, to: usize) -> Result<bool, GridError> {
        let changed = self.schema.reorder(from, to)?;
        if changed {
            tracing::debug!(grid = %self.definition.name, from, to, "columns reordered");
            self.save_columns();
        }
        Ok(changed)
    }

    /// Move `source` to the current position of `target`.
    pub fn move_column(&mut self, source: &str, target: &str) -> Result<bool, GridError> {
        let from = self.position(source)?;
        let to = self.position(target)?;
        self.reorder(from, to)
    }

    /// Feed a resize pointer event; the final width is committed on `End`.
    pub fn resize(&mut self, event: ResizeEvent) -> Result<Option<LayoutCommit>, GridError> {
        let schema = &self.schema;
        let commit = self
            .interaction
            .handle_resize(event, |column| schema.get(column).map(|c| c.width));
        self.apply_commit(commit)
    }

    /// Feed a reorder pointer event; the splice happens on `Drop`.
    pub fn drag(&mut self, event: DragEvent) -> Result<Option<LayoutCommit>, GridError> {
        let commit = self.interaction.handle_drag(event);
        self.apply_commit(commit)
    }

    fn apply_commit(&mut self, commit: Option<LayoutCommit>) -> Result<Option<LayoutCommit>, GridError> {
        match &commit {
            Some(LayoutCommit::Width { column, width }) => {
                self.set_width(column, *width)?;
            }
            Some(LayoutCommit::Move { source, target }) => {
                self.move_column(source, target)?;
            }
            None => {}
        }
        Ok(commit)
    }

    /// Restore canonical columns and forget the persisted layout.
    pub fn reset_layout(&mut self) {
        self.schema.reset();
        self.interaction.reset();
        if let Some(persistence) = &self.persistence {
            persistence.clear();
        }
        tracing::debug!(grid = %self.definition.name, "layout reset");
    }

    // -------------------------------------------------------------------------
    // Derived views
    // -------------------------------------------------------------------------

    /// Source indices of the filtered rows, in sorted order.
    pub fn ordered_indices(&mut self) -> &[usize] {
        derive_order(
            &mut self.ordered,
            (self.rows_rev, self.filter_rev, self.sort_rev),
            self.rows.as_slice(),
            &self.schema,
            &self.definition,
            &self.filters,
            &self.sort,
        )
    }

    /// Number of rows passing the filters.
    pub fn filtered_len(&mut self) -> usize {
        self.ordered_indices().len()
    }

    /// Rows of the current page.
    pub fn page_rows(&mut self) -> Vec<&R> {
        let order = derive_order(
            &mut self.ordered,
            (self.rows_rev, self.filter_rev, self.sort_rev),
            self.rows.as_slice(),
            &self.schema,
            &self.definition,
            &self.filters,
            &self.sort,
        );
        let range = page_range(order.len(), self.pagination);
        order[range].iter().map(|&i| &self.rows[i]).collect()
    }

    #[must_use]
    pub fn empty_state(&mut self) -> EmptyState {
        if self.filtered_len() > 0 {
            EmptyState::HasRows
        } else if !self.rows.is_empty() && self.filters.is_active() {
            EmptyState::NoMatches
        } else {
            EmptyState::NoRowsAvailable
        }
    }

    /// Render the current page at a viewport width (`None`: unknown).
    pub fn view(&mut self, viewport: Option<u32>) -> GridView {
        let empty_state = self.empty_state();
        let order = derive_order(
            &mut self.ordered,
            (self.rows_rev, self.filter_rev, self.sort_rev),
            self.rows.as_slice(),
            &self.schema,
            &self.definition,
            &self.filters,
            &self.sort,
        );
        let total = order.len();
        let page_indices = &order[page_range(total, self.pagination)];

        let rendered: Vec<&ColumnDescriptor> = self.schema.rendered(viewport).collect();
        let resize = self.interaction.resize();
        let drop_target = self.interaction.drag().drop_target();

        let columns: Vec<ViewColumn> = rendered
            .iter()
            .map(|c| ViewColumn {
                key: c.key.clone(),
                label: c.label.clone(),
                width: resize.live_width(&c.key).unwrap_or(c.width),
                sortable: c.sortable,
                filterable: c.filterable,
                format: c.format,
                sort: self.sort.direction_for(&c.key),
                filtered: self.filters.facet(&c.key).is_some(),
                drop_target: drop_target == Some(c.key.as_str()),
            })
            .collect();

        let rows = page_indices
            .iter()
            .map(|&index| {
                let cells: Vec<CellValue> =
                    rendered.iter().map(|c| self.rows[index].cell(&c.key)).collect();
                let display = rendered
                    .iter()
                    .zip(&cells)
                    .map(|(c, value)| format_cell(value, c.format))
                    .collect();
                ViewRow {
                    index,
                    cells,
                    display,
                }
            })
            .collect();

        GridView {
            grid: self.definition.name.clone(),
            total_width: columns
                .iter()
                .fold(0u32, |acc, c| acc.saturating_add(c.width)),
            columns,
            rows,
            page: self.pagination.info(total),
            empty_state,
            filters: self.filters.clone(),
            sort: self.sort.clone(),
        }
    }

    // -------------------------------------------------------------------------
    // Row actions
    // -------------------------------------------------------------------------

    /// Forward `action` on the `row`-th row of the current page.
    ///
    /// Returns `false` when no such row is shown.
    pub fn dispatch(
        &mut self,
        row: usize,
        action: RowAction,
        handler: &mut impl RowActions<R>,
    ) -> bool {
        let page = self.page_rows();
        let Some(record) = page.get(row) else {
            return false;
        };
        match action {
            RowAction::Edit => handler.on_edit(record),
            RowAction::Delete => handler.on_delete(record),
            RowAction::ViewAudit => handler.on_view_audit(record),
        }
        true
    }

    // -------------------------------------------------------------------------
    // Internals
    // -------------------------------------------------------------------------

    fn column(&self, key: &str) -> Result<&ColumnDescriptor, GridError> {
        self.schema
            .get(key)
            .ok_or_else(|| GridError::UnknownColumn(key.to_string()))
    }

    fn position(&self, key: &str) -> Result<usize, GridError> {
        self.schema
            .position(key)
            .ok_or_else(|| GridError::UnknownColumn(key.to_string()))
    }

    fn save_columns(&self) {
        if let Some(persistence) = &self.persistence {
            persistence.save_columns(self.schema.columns());
        }
    }

    fn save_state(&self) {
        if !self.definition.persist_state {
            return;
        }
        if let Some(persistence) = &self.persistence {
            persistence.save_state(&PersistedState {
                filters: self.filters.clone(),
                sort: self.sort.clone(),
                page_size: Some(self.pagination.page_size),
            });
        }
    }
}

/// The memoized filter+sort derivation, over disjoint grid fields.
fn derive_order<'m, R: GridRecord>(
    memo: &'m mut Memo<OrderKey, Vec<usize>>,
    key: OrderKey,
    rows: &[R],
    schema: &ColumnSchema,
    definition: &GridDefinition,
    filters: &FilterState,
    sort_state: &SortState,
) -> &'m [usize] {
    memo.get_or_compute(key, || {
        let engine = FilterEngine::new(schema.columns(), &definition.search, &definition.conditions);
        let mut indices = engine.apply_indices(rows, filters, None);
        sort::sort_indices(rows, &mut indices, sort_state, schema.columns());
        indices
    })
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::condition::ConditionRegistry;
    use crate::filter::SearchSpec;
    use crate::persistence::MemoryLayoutStore;
    use crate::{Breakpoint, Row};

    fn definition() -> Arc<GridDefinition> {
        Arc::new(
            GridDefinition::new(
                "ledger",
                vec![
                    ColumnDescriptor::new("id", "ID", 60),
                    ColumnDescriptor::new("name", "Name", 150),
                    ColumnDescriptor::new("country", "Country", 120).from_breakpoint(Breakpoint::Md),
                    ColumnDescriptor::new("accrual", "Accrual", 100)
                        .with_format(ColumnFormat::Currency),
                    ColumnDescriptor::new("due", "Due", 100).hidden(),
                ],
            )
            .with_search(SearchSpec::keys(&["name", "country"]))
            .with_conditions(ConditionRegistry::ledger())
            .with_page_size(2)
            .persisting_state(),
        )
    }

    fn rows() -> Vec<Row> {
        (1..=5)
            .map(|i| {
                Row::new()
                    .with("id", i as f64)
                    .with("name", format!("Company {i}"))
                    .with("country", if i % 2 == 0 { "GE" } else { "AM" })
                    .with("accrual", if i > 3 { -5.0 } else { 5.0 })
                    .with("due", if i == 5 { -1.0 } else { 1.0 })
            })
            .collect()
    }

    fn ids(grid: &mut Grid<Row>) -> Vec<String> {
        grid.page_rows()
            .iter()
            .map(|r| r.cell("id").to_string())
            .collect()
    }

    #[derive(Default)]
    struct Recorder(Vec<(RowAction, String)>);

    impl RowActions<Row> for Recorder {
        fn on_edit(&mut self, row: &Row) {
            self.0.push((RowAction::Edit, row.cell("id").to_string()));
        }
        fn on_delete(&mut self, row: &Row) {
            self.0.push((RowAction::Delete, row.cell("id").to_string()));
        }
        fn on_view_audit(&mut self, row: &Row) {
            self.0.push((RowAction::ViewAudit, row.cell("id").to_string()));
        }
    }

    #[test]
    fn filter_change_resets_page_but_sort_does_not() {
        let mut grid = Grid::new(definition(), rows());
        grid.goto_page(2);
        assert_eq!(ids(&mut grid), vec!["3", "4"]);

        grid.sort_by("id", SortDirection::Desc).expect("sort");
        assert_eq!(grid.pagination().page, 2);
        assert_eq!(ids(&mut grid), vec!["3", "2"]);

        grid.set_search("company");
        assert_eq!(grid.pagination().page, 1);
    }

    #[test]
    fn paging_reuses_the_memoized_order() {
        let mut grid = Grid::new(definition(), rows());
        grid.view(None);
        grid.next_page();
        grid.view(None);
        grid.last_page();
        grid.view(None);
        assert_eq!(grid.derivations(), 1);

        grid.set_search("1");
        grid.view(None);
        assert_eq!(grid.derivations(), 2);
    }

    #[test]
    fn conditions_and_hidden_facets_filter() {
        let mut grid = Grid::new(definition(), rows());
        grid.set_conditions(BTreeSet::from(["Due<0".to_string()]));
        assert_eq!(ids(&mut grid), vec!["5"]);

        grid.set_conditions(BTreeSet::from(["ALL".to_string(), "Due<0".to_string()]));
        assert_eq!(grid.filtered_len(), 5);

        grid.set_facet("due", BTreeSet::from(["-1".to_string()]))
            .expect("facet on hidden column");
        assert_eq!(grid.filtered_len(), 1);
    }

    #[test]
    fn empty_states_are_distinguished() {
        let mut grid = Grid::new(definition(), Vec::<Row>::new());
        assert_eq!(grid.empty_state(), EmptyState::NoRowsAvailable);

        grid.set_rows(rows());
        assert_eq!(grid.empty_state(), EmptyState::HasRows);

        grid.set_search("nothing like this");
        assert_eq!(grid.empty_state(), EmptyState::NoMatches);
        assert_eq!(grid.view(None).empty_state, EmptyState::NoMatches);
    }

    #[test]
    fn set_rows_clamps_page() {
        let mut grid = Grid::new(definition(), rows());
        grid.last_page();
        assert_eq!(grid.pagination().page, 3);
        grid.set_rows(rows().into_iter().take(2).collect());
        assert_eq!(grid.pagination().page, 1);
    }

    #[test]
    fn view_respects_viewport_hidden_columns_and_formats() {
        let mut grid = Grid::new(definition(), rows());
        let narrow = grid.view(Some(500));
        let keys: Vec<_> = narrow.columns.iter().map(|c| c.key.as_str()).collect();
        assert_eq!(keys, vec!["id", "name", "accrual"]);
        assert_eq!(narrow.total_width, 310);
        assert_eq!(narrow.rows[0].display[2], "5.00");

        let wide = grid.view(Some(1400));
        assert_eq!(wide.columns.len(), 4);
        assert_eq!(wide.page.total_pages, 3);
    }

    #[test]
    fn popover_apply_and_cancel() {
        let mut grid = Grid::new(definition(), rows());
        {
            let popover = grid.open_facet("country").expect("open").expect("filterable");
            assert_eq!(popover.options(), &["AM".to_string(), "GE".to_string()]);
            popover.toggle("AM");
        }
        grid.cancel_facet();
        assert!(!grid.filters().has_facets());

        grid.open_facet("country")
            .expect("open")
            .expect("filterable")
            .toggle("AM");
        assert!(grid.apply_facet().expect("apply"));
        assert_eq!(grid.filtered_len(), 2);
        // own facet does not narrow its options
        assert_eq!(grid.facet_options("country").expect("options").len(), 2);
    }

    #[test]
    fn popover_sort_replaces_global_sort() {
        let mut grid = Grid::new(definition(), rows());
        grid.toggle_sort("id").expect("sort");
        grid.open_facet("name").expect("open");
        assert!(grid.sort_from_popover(SortDirection::Desc).expect("sort"));
        assert_eq!(grid.sort_state(), &SortState::by("name", SortDirection::Desc));
    }

    #[test]
    fn unknown_columns_are_errors_and_leave_state() {
        let mut grid = Grid::new(definition(), rows());
        assert!(matches!(
            grid.toggle_sort("nope"),
            Err(GridError::UnknownColumn(_))
        ));
        assert!(grid.set_facet("nope", BTreeSet::new()).is_err());
        assert!(grid.set_page_size(0).is_err());
        assert_eq!(grid.sort_state(), &SortState::default());
    }

    #[test]
    fn resize_commits_once_and_drag_splices() {
        let mut grid = Grid::new(definition(), rows());
        grid.resize(ResizeEvent::Begin {
            column: "name".into(),
            x: 0,
        })
        .expect("begin");
        grid.resize(ResizeEvent::Move { x: 50 }).expect("move");
        assert_eq!(grid.view(None).columns[1].width, 200);
        assert_eq!(grid.schema().get("name").map(|c| c.width), Some(150));

        grid.resize(ResizeEvent::End).expect("end");
        assert_eq!(grid.schema().get("name").map(|c| c.width), Some(200));

        grid.drag(DragEvent::Start { column: "id".into() }).expect("start");
        grid.drag(DragEvent::Drop {
            column: "accrual".into(),
        })
        .expect("drop");
        let keys: Vec<_> = grid.columns().iter().map(|c| c.key.as_str()).collect();
        assert_eq!(keys, vec!["name", "country", "accrual", "id", "due"]);
    }

    #[test]
    fn layout_and_state_persist_across_instances() {
        let store: Arc<dyn LayoutStore> = Arc::new(MemoryLayoutStore::new());
        {
            let mut grid = Grid::open(definition(), Arc::new(rows()), store.clone());
            grid.set_visible("due", true).expect("show");
            grid.reorder(4, 0).expect("reorder");
            grid.set_search("GE");
            grid.sort_by("accrual", SortDirection::Desc).expect("sort");
            grid.set_page_size(25).expect("page size");
        }

        let mut grid = Grid::open(definition(), Arc::new(rows()), store.clone());
        assert_eq!(grid.columns()[0].key, "due");
        assert!(grid.columns()[0].visible);
        assert_eq!(grid.filters().search_term, "GE");
        assert_eq!(grid.sort_state(), &SortState::by("accrual", SortDirection::Desc));
        assert_eq!(grid.pagination().page_size, 25);

        grid.reset_layout();
        assert_eq!(grid.columns(), grid.schema().canonical());
        let fresh: Grid<Row> = Grid::open(definition(), Arc::new(rows()), store);
        assert_eq!(fresh.columns(), fresh.schema().canonical());
        assert_eq!(fresh.filters(), &FilterState::default());
    }

    #[test]
    fn dispatch_targets_current_page() {
        let mut grid = Grid::new(definition(), rows());
        grid.next_page();
        let mut recorder = Recorder::default();
        assert!(grid.dispatch(1, RowAction::ViewAudit, &mut recorder));
        assert!(grid.dispatch(0, RowAction::Delete, &mut recorder));
        assert!(!grid.dispatch(2, RowAction::Edit, &mut recorder));
        assert_eq!(
            recorder.0,
            vec![
                (RowAction::ViewAudit, "4".to_string()),
                (RowAction::Delete, "3".to_string()),
            ]
        );
    }
}
