//! # Filter Engine
//!
//! Composes three filter kinds into one predicate:
//!
//! ```text
//! keep(row) = matches_search(row) && matches_facets(row) && matches_any_condition(row)
//! ```
//!
//! Search and facets are conjunctive; selected conditions are OR-combined
//! because they express alternative inclusion criteria.

use crate::condition::ConditionRegistry;
use crate::{CellValue, ColumnDescriptor, FilterState, GridRecord};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

// =============================================================================
// SEARCH SPEC
// =============================================================================

/// A field taking part in free-text search.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchField {
    pub key: String,
    /// Tokens used in place of `true`/`false` (e.g. `active`/`inactive`).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bool_tokens: Option<(String, String)>,
}

impl SearchField {
    #[must_use]
    pub fn new(key: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            bool_tokens: None,
        }
    }

    #[must_use]
    pub fn with_bool_tokens(mut self, yes: impl Into<String>, no: impl Into<String>) -> Self {
        self.bool_tokens = Some((yes.into(), no.into()));
        self
    }

    /// Lower-cased text this field contributes to search.
    #[must_use]
    pub fn search_text(&self, value: &CellValue) -> String {
        match (value, &self.bool_tokens) {
            (CellValue::Bool(true), Some((yes, _))) => yes.to_lowercase(),
            (CellValue::Bool(false), Some((_, no))) => no.to_lowercase(),
            _ => value.to_string().to_lowercase(),
        }
    }
}

/// The fixed, per-grid list of searchable fields.
///
/// An empty spec searches every schema column.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct SearchSpec {
    fields: Vec<SearchField>,
}

impl SearchSpec {
    #[must_use]
    pub fn new(fields: Vec<SearchField>) -> Self {
        Self { fields }
    }

    /// Plain fields, no boolean tokens.
    #[must_use]
    pub fn keys(keys: &[&str]) -> Self {
        Self::new(keys.iter().map(|k| SearchField::new(*k)).collect())
    }

    #[must_use]
    pub fn with(mut self, field: SearchField) -> Self {
        self.fields.push(field);
        self
    }

    #[must_use]
    pub fn fields(&self) -> &[SearchField] {
        &self.fields
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

// =============================================================================
// FILTER ENGINE
// =============================================================================

/// Row predicate built from a grid's schema, search spec and conditions.
#[derive(Debug, Clone, Copy)]
pub struct FilterEngine<'a> {
    columns: &'a [ColumnDescriptor],
    search: &'a SearchSpec,
    conditions: &'a ConditionRegistry,
}

impl<'a> FilterEngine<'a> {
    #[must_use]
    pub fn new(
        columns: &'a [ColumnDescriptor],
        search: &'a SearchSpec,
        conditions: &'a ConditionRegistry,
    ) -> Self {
        Self {
            columns,
            search,
            conditions,
        }
    }

    /// Free-text match. `term` must already be trimmed and lower-cased.
    pub fn matches_search<R: GridRecord>(&self, row: &R, term: &str) -> bool {
        if term.is_empty() {
            return true;
        }
        if self.search.is_empty() {
            return self
                .columns
                .iter()
                .any(|c| row.cell(&c.key).to_string().to_lowercase().contains(term));
        }
        self.search
            .fields()
            .iter()
            .any(|f| f.search_text(&row.cell(&f.key)).contains(term))
    }

    /// Facet match over schema columns, optionally skipping one column.
    ///
    /// Facets on keys absent from the schema are never consulted.
    pub fn matches_facets<R: GridRecord>(
        &self,
        row: &R,
        state: &FilterState,
        exclude: Option<&str>,
    ) -> bool {
        self.columns
            .iter()
            .filter(|c| exclude != Some(c.key.as_str()))
            .filter_map(|c| state.facet(&c.key).map(|set| (c, set)))
            .all(|(c, set)| set.contains(&row.cell(&c.key).to_string()))
    }

    /// Disjunction of selected conditions.
    ///
    /// Unregistered names are inert; a selection with no registered names
    /// does not constrain.
    pub fn matches_conditions<R: GridRecord>(&self, row: &R, selected: &BTreeSet<String>) -> bool {
        let mut rules = selected
            .iter()
            .filter_map(|name| self.conditions.get(name))
            .peekable();
        if rules.peek().is_none() {
            return true;
        }
        rules.any(|rule| rule.evaluate(row))
    }

    /// Full predicate, optionally skipping one column's facet.
    pub fn matches<R: GridRecord>(&self, row: &R, state: &FilterState, exclude: Option<&str>) -> bool {
        let term = state.search_term.trim().to_lowercase();
        self.matches_with_term(row, state, &term, exclude)
    }

    fn matches_with_term<R: GridRecord>(
        &self,
        row: &R,
        state: &FilterState,
        term: &str,
        exclude: Option<&str>,
    ) -> bool {
        self.matches_search(row, term)
            && self.matches_facets(row, state, exclude)
            && (!state.has_conditions() || self.matches_conditions(row, &state.conditions))
    }

    /// Indices of the rows passing the filter, in input order.
    pub fn apply_indices<R: GridRecord>(
        &self,
        rows: &[R],
        state: &FilterState,
        exclude: Option<&str>,
    ) -> Vec<usize> {
        let term = state.search_term.trim().to_lowercase();
        rows.iter()
            .enumerate()
            .filter(|(_, row)| self.matches_with_term(*row, state, &term, exclude))
            .map(|(i, _)| i)
            .collect()
    }

    /// Rows passing the filter, in input order.
    pub fn apply<'r, R: GridRecord>(&self, rows: &'r [R], state: &FilterState) -> Vec<&'r R> {
        self.apply_indices(rows, state, None)
            .into_iter()
            .map(|i| &rows[i])
            .collect()
    }
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Row;

    fn columns() -> Vec<ColumnDescriptor> {
        vec![
            ColumnDescriptor::new("name", "Name", 100),
            ColumnDescriptor::new("country", "Country", 100),
            ColumnDescriptor::new("active", "Active", 60),
            ColumnDescriptor::new("accrual", "Accrual", 80),
            ColumnDescriptor::new("due", "Due", 80),
        ]
    }

    fn rows() -> Vec<Row> {
        vec![
            Row::new()
                .with("name", "Alpha LLC")
                .with("country", "Georgia")
                .with("active", true)
                .with("accrual", 5.0)
                .with("due", 5.0),
            Row::new()
                .with("name", "Beta")
                .with("country", "Armenia")
                .with("active", false)
                .with("accrual", -5.0)
                .with("due", -5.0),
            Row::new()
                .with("name", "Gamma")
                .with("country", "Georgia")
                .with("active", false)
                .with("accrual", -5.0)
                .with("due", 5.0),
        ]
    }

    fn search() -> SearchSpec {
        SearchSpec::keys(&["name", "country"])
            .with(SearchField::new("active").with_bool_tokens("Active", "Inactive"))
    }

    #[test]
    fn search_is_case_insensitive_over_searchable_fields() {
        let cols = columns();
        let spec = search();
        let registry = ConditionRegistry::new();
        let engine = FilterEngine::new(&cols, &spec, &registry);
        let rows = rows();

        let mut state = FilterState {
            search_term: "  GEORGIA ".into(),
            ..FilterState::default()
        };
        assert_eq!(engine.apply_indices(&rows, &state, None), vec![0, 2]);

        state.search_term = "inactive".into();
        assert_eq!(engine.apply_indices(&rows, &state, None), vec![1, 2]);

        // accrual is not a searchable field
        state.search_term = "-5".into();
        assert!(engine.apply_indices(&rows, &state, None).is_empty());
    }

    #[test]
    fn empty_spec_searches_all_columns() {
        let cols = columns();
        let spec = SearchSpec::default();
        let registry = ConditionRegistry::new();
        let engine = FilterEngine::new(&cols, &spec, &registry);
        let state = FilterState {
            search_term: "-5".into(),
            ..FilterState::default()
        };
        assert_eq!(engine.apply_indices(&rows(), &state, None), vec![1, 2]);
    }

    #[test]
    fn facets_are_conjunctive_and_exclusion_skips_one() {
        let cols = columns();
        let spec = search();
        let registry = ConditionRegistry::new();
        let engine = FilterEngine::new(&cols, &spec, &registry);
        let rows = rows();

        let mut state = FilterState::default();
        state
            .facets
            .insert("country".into(), BTreeSet::from(["Georgia".to_string()]));
        state
            .facets
            .insert("active".into(), BTreeSet::from(["false".to_string()]));
        assert_eq!(engine.apply_indices(&rows, &state, None), vec![2]);
        assert_eq!(engine.apply_indices(&rows, &state, Some("active")), vec![0, 2]);
    }

    #[test]
    fn facet_on_unknown_column_is_inert() {
        let cols = columns();
        let spec = search();
        let registry = ConditionRegistry::new();
        let engine = FilterEngine::new(&cols, &spec, &registry);
        let mut state = FilterState::default();
        state
            .facets
            .insert("removed".into(), BTreeSet::from(["x".to_string()]));
        assert_eq!(engine.apply_indices(&rows(), &state, None).len(), 3);
    }

    #[test]
    fn conditions_are_disjunctive() {
        let cols = columns();
        let spec = search();
        let registry = ConditionRegistry::ledger();
        let engine = FilterEngine::new(&cols, &spec, &registry);
        let mut state = FilterState::default();
        state.conditions = BTreeSet::from(["Accrual>0".to_string(), "Due<0".to_string()]);
        assert_eq!(engine.apply_indices(&rows(), &state, None), vec![0, 1]);
    }

    #[test]
    fn unknown_conditions_do_not_constrain() {
        let cols = columns();
        let spec = search();
        let registry = ConditionRegistry::ledger();
        let engine = FilterEngine::new(&cols, &spec, &registry);
        let mut state = FilterState::default();
        state.conditions = BTreeSet::from(["Nope>0".to_string()]);
        assert_eq!(engine.apply(&rows(), &state).len(), 3);
    }
}
