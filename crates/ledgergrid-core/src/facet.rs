//! # Facet Index
//!
//! Distinct stringified values per column, plus the staged popover editor.
//!
//! Options listed for a column reflect what is still reachable under every
//! *other* active filter: the column's own facet is excluded when deriving
//! them, so a selection never narrows its own option list.

use crate::filter::FilterEngine;
use crate::types::parse_number;
use crate::{FilterState, GridRecord, SortDirection, SortState};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::collections::BTreeSet;

// =============================================================================
// ORDERING
// =============================================================================

/// Facet option ordering.
///
/// Values parsing as numbers come first, numerically; the rest follow,
/// case-insensitively, with byte order breaking ties.
#[must_use]
pub fn compare_facet_values(a: &str, b: &str) -> Ordering {
    match (parse_number(a), parse_number(b)) {
        (Some(x), Some(y)) => x
            .partial_cmp(&y)
            .unwrap_or(Ordering::Equal)
            .then_with(|| a.cmp(b)),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => a
            .to_lowercase()
            .cmp(&b.to_lowercase())
            .then_with(|| a.cmp(b)),
    }
}

// =============================================================================
// UNIQUE VALUES
// =============================================================================

/// Sorted distinct values of `column` over the rows passing the filter.
///
/// With `exclude_self` the column's own facet selection is ignored.
pub fn unique_values<R: GridRecord>(
    engine: &FilterEngine<'_>,
    rows: &[R],
    column: &str,
    state: &FilterState,
    exclude_self: bool,
) -> Vec<String> {
    let exclude = exclude_self.then_some(column);
    let distinct: BTreeSet<String> = engine
        .apply_indices(rows, state, exclude)
        .into_iter()
        .map(|i| rows[i].cell(column).to_string())
        .collect();
    let mut values: Vec<String> = distinct.into_iter().collect();
    values.sort_by(|a, b| compare_facet_values(a, b));
    values
}

// =============================================================================
// FACET POPOVER
// =============================================================================

/// A column's filter popover with an uncommitted selection.
///
/// The committed selection only changes through [`FacetPopover::apply`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FacetPopover {
    column: String,
    options: Vec<String>,
    committed: BTreeSet<String>,
    staged: BTreeSet<String>,
    search: String,
}

impl FacetPopover {
    /// Open over the reachable `options` and the column's committed selection.
    ///
    /// An unconstrained column opens with every option checked.
    #[must_use]
    pub fn open(column: impl Into<String>, options: Vec<String>, committed: BTreeSet<String>) -> Self {
        let staged = if committed.is_empty() {
            options.iter().cloned().collect()
        } else {
            committed.clone()
        };
        Self {
            column: column.into(),
            options,
            committed,
            staged,
            search: String::new(),
        }
    }

    #[must_use]
    pub fn column(&self) -> &str {
        &self.column
    }

    #[must_use]
    pub fn options(&self) -> &[String] {
        &self.options
    }

    #[must_use]
    pub fn staged(&self) -> &BTreeSet<String> {
        &self.staged
    }

    #[must_use]
    pub fn search(&self) -> &str {
        &self.search
    }

    /// Narrow the listed options.
    pub fn set_search(&mut self, term: impl Into<String>) {
        self.search = term.into();
    }

    /// Options matching the popover search, in option order.
    pub fn visible_options(&self) -> impl Iterator<Item = &String> {
        let needle = self.search.trim().to_lowercase();
        self.options
            .iter()
            .filter(move |o| needle.is_empty() || o.to_lowercase().contains(&needle))
    }

    #[must_use]
    pub fn is_checked(&self, value: &str) -> bool {
        self.staged.contains(value)
    }

    /// Flip one value in the staged selection.
    pub fn toggle(&mut self, value: &str) {
        if !self.staged.remove(value) {
            self.staged.insert(value.to_string());
        }
    }

    /// Check every option currently listed.
    pub fn select_all(&mut self) {
        let listed: Vec<String> = self.visible_options().cloned().collect();
        self.staged.extend(listed);
    }

    /// Uncheck every option currently listed.
    pub fn clear(&mut self) {
        let listed: Vec<String> = self.visible_options().cloned().collect();
        for value in &listed {
            self.staged.remove(value);
        }
    }

    /// Discard staged edits; yields the committed selection unchanged.
    #[must_use]
    pub fn cancel(self) -> BTreeSet<String> {
        self.committed
    }

    /// Commit the staged selection.
    ///
    /// A selection covering every reachable option commits as empty
    /// (no constraint).
    #[must_use]
    pub fn apply(self) -> BTreeSet<String> {
        if self.options.iter().all(|o| self.staged.contains(o)) {
            BTreeSet::new()
        } else {
            self.staged
        }
    }

    /// The "Sort A to Z / Z to A" buttons: a grid-wide sort on this column.
    #[must_use]
    pub fn sort_intent(&self, direction: SortDirection) -> SortState {
        SortState::by(self.column.clone(), direction)
    }
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::condition::ConditionRegistry;
    use crate::filter::SearchSpec;
    use crate::{ColumnDescriptor, Row};

    #[test]
    fn numbers_before_text_then_case_insensitive() {
        let mut values = vec!["b", "10", "A", "9", "", "a", "-1.5"];
        values.sort_by(|a, b| compare_facet_values(a, b));
        assert_eq!(values, vec!["-1.5", "9", "10", "", "A", "a", "b"]);
    }

    #[test]
    fn unique_values_excludes_own_facet() {
        let cols = vec![
            ColumnDescriptor::new("country", "Country", 100),
            ColumnDescriptor::new("kind", "Kind", 100),
        ];
        let spec = SearchSpec::default();
        let registry = ConditionRegistry::new();
        let engine = FilterEngine::new(&cols, &spec, &registry);
        let rows = vec![
            Row::new().with("country", "GE").with("kind", "LLC"),
            Row::new().with("country", "AM").with("kind", "LLC"),
            Row::new().with("country", "GE").with("kind", "JSC"),
            Row::new().with("country", "TR").with("kind", "JSC"),
        ];

        let mut state = FilterState::default();
        state
            .facets
            .insert("country".into(), BTreeSet::from(["GE".to_string()]));

        assert_eq!(
            unique_values(&engine, &rows, "country", &state, true),
            vec!["AM", "GE", "TR"]
        );
        assert_eq!(
            unique_values(&engine, &rows, "country", &state, false),
            vec!["GE"]
        );
        assert_eq!(
            unique_values(&engine, &rows, "kind", &state, true),
            vec!["JSC", "LLC"]
        );

        state
            .facets
            .insert("kind".into(), BTreeSet::from(["JSC".to_string()]));
        assert_eq!(
            unique_values(&engine, &rows, "country", &state, true),
            vec!["GE", "TR"]
        );
    }

    fn popover() -> FacetPopover {
        FacetPopover::open(
            "country",
            vec!["Armenia".into(), "Georgia".into(), "Germany".into()],
            BTreeSet::new(),
        )
    }

    #[test]
    fn unconstrained_popover_opens_fully_checked_and_applies_empty() {
        let popover = popover();
        assert_eq!(popover.staged().len(), 3);
        assert!(popover.apply().is_empty());
    }

    #[test]
    fn select_all_and_clear_act_on_narrowed_list() {
        let mut popover = popover();
        popover.set_search("GE");
        let listed: Vec<_> = popover.visible_options().cloned().collect();
        assert_eq!(listed, vec!["Georgia", "Germany"]);

        popover.clear();
        assert_eq!(popover.staged(), &BTreeSet::from(["Armenia".to_string()]));

        popover.select_all();
        popover.toggle("Armenia");
        assert_eq!(
            popover.apply(),
            BTreeSet::from(["Georgia".to_string(), "Germany".to_string()])
        );
    }

    #[test]
    fn cancel_reverts_to_committed() {
        let committed = BTreeSet::from(["Georgia".to_string()]);
        let mut popover = FacetPopover::open(
            "country",
            vec!["Armenia".into(), "Georgia".into()],
            committed.clone(),
        );
        popover.toggle("Armenia");
        assert!(popover.is_checked("Armenia"));
        assert_eq!(popover.cancel(), committed);
    }

    #[test]
    fn sort_intent_targets_popover_column() {
        assert_eq!(
            popover().sort_intent(SortDirection::Desc),
            SortState::by("country", SortDirection::Desc)
        );
    }
}
