//! # Grid Catalog
//!
//! Definitions of the business screens served by this binary. Each screen is
//! one [`GridDefinition`] over schema-agnostic [`Row`](ledgergrid_core::Row)s;
//! the engine is the same for all of them.

use ledgergrid_core::{
    Breakpoint, ColumnDescriptor, ColumnFormat, ConditionRegistry, GridDefinition, GridError,
    SearchField, SearchSpec,
};
use std::collections::BTreeMap;
use std::sync::Arc;

/// Registered grid definitions, by name.
#[derive(Debug, Clone, Default)]
pub struct Catalog {
    grids: BTreeMap<String, Arc<GridDefinition>>,
}

impl Catalog {
    /// Catalog over arbitrary definitions. A later definition with the same
    /// name replaces an earlier one.
    #[must_use]
    pub fn from_definitions(definitions: impl IntoIterator<Item = GridDefinition>) -> Self {
        let grids = definitions
            .into_iter()
            .map(|def| (def.name.clone(), Arc::new(def)))
            .collect();
        Self { grids }
    }

    /// The built-in business screens, paging `page_size` rows by default.
    #[must_use]
    pub fn builtin(page_size: usize) -> Self {
        Self::from_definitions(
            [
                counteragents(),
                countries(),
                entity_types(),
                jobs(),
                payments(),
                projects(),
                parsing_rules(),
                payments_ledger(),
            ]
            .into_iter()
            .map(|def| def.with_page_size(page_size)),
        )
    }

    /// Look a definition up by name.
    pub fn get(&self, name: &str) -> Result<Arc<GridDefinition>, GridError> {
        self.grids
            .get(name)
            .cloned()
            .ok_or_else(|| GridError::UnknownGrid(name.to_string()))
    }

    /// Definitions in name order.
    pub fn definitions(&self) -> impl Iterator<Item = &GridDefinition> {
        self.grids.values().map(Arc::as_ref)
    }

    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.grids.contains_key(name)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.grids.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.grids.is_empty()
    }
}

// =============================================================================
// BUSINESS SCREENS
// =============================================================================

fn active_column() -> ColumnDescriptor {
    ColumnDescriptor::new("is_active", "Status", 100).with_format(ColumnFormat::Boolean)
}

fn active_search() -> SearchField {
    SearchField::new("is_active").with_bool_tokens("active", "inactive")
}

fn counteragents() -> GridDefinition {
    GridDefinition::new(
        "counteragents",
        vec![
            ColumnDescriptor::new("name", "Name", 220),
            ColumnDescriptor::new("identification_number", "ID Number", 150),
            ColumnDescriptor::new("entity_type", "Entity Type", 150),
            ColumnDescriptor::new("country", "Country", 130).from_breakpoint(Breakpoint::Md),
            active_column(),
            ColumnDescriptor::new("created_at", "Created", 140)
                .with_format(ColumnFormat::Date)
                .from_breakpoint(Breakpoint::Lg),
        ],
    )
    .with_search(
        SearchSpec::keys(&["name", "identification_number", "entity_type", "country"])
            .with(active_search()),
    )
}

fn countries() -> GridDefinition {
    GridDefinition::new(
        "countries",
        vec![
            ColumnDescriptor::new("code", "Code", 80),
            ColumnDescriptor::new("iso3", "ISO3", 80),
            ColumnDescriptor::new("name", "Name", 220),
            ColumnDescriptor::new("phone_prefix", "Phone", 100).from_breakpoint(Breakpoint::Md),
            active_column(),
        ],
    )
    .with_search(SearchSpec::keys(&["code", "iso3", "name"]).with(active_search()))
}

fn entity_types() -> GridDefinition {
    GridDefinition::new(
        "entity-types",
        vec![
            ColumnDescriptor::new("code", "Code", 100),
            ColumnDescriptor::new("name", "Name", 200),
            ColumnDescriptor::new("description", "Description", 300)
                .unsortable()
                .unfilterable()
                .from_breakpoint(Breakpoint::Lg),
            active_column(),
        ],
    )
    .with_search(SearchSpec::keys(&["code", "name", "description"]).with(active_search()))
}

fn jobs() -> GridDefinition {
    GridDefinition::new(
        "jobs",
        vec![
            ColumnDescriptor::new("job_number", "Job #", 110),
            ColumnDescriptor::new("title", "Title", 220),
            ColumnDescriptor::new("project", "Project", 180),
            ColumnDescriptor::new("status", "Status", 120),
            ColumnDescriptor::new("start_date", "Start", 120).with_format(ColumnFormat::Date),
            ColumnDescriptor::new("budget", "Budget", 130)
                .with_format(ColumnFormat::Currency)
                .from_breakpoint(Breakpoint::Md),
            active_column().hidden(),
        ],
    )
    .with_search(SearchSpec::keys(&["job_number", "title", "project", "status"]))
}

fn payments() -> GridDefinition {
    GridDefinition::new(
        "payments",
        vec![
            ColumnDescriptor::new("payment_id", "Payment ID", 150),
            ColumnDescriptor::new("counteragent", "Counteragent", 220),
            ColumnDescriptor::new("project", "Project", 180),
            ColumnDescriptor::new("amount", "Amount", 130).with_format(ColumnFormat::Currency),
            ColumnDescriptor::new("currency", "Currency", 90),
            ColumnDescriptor::new("payment_date", "Date", 120).with_format(ColumnFormat::Date),
            ColumnDescriptor::new("status", "Status", 120).from_breakpoint(Breakpoint::Md),
        ],
    )
    .with_search(SearchSpec::keys(&[
        "payment_id",
        "counteragent",
        "project",
        "currency",
        "status",
    ]))
}

fn projects() -> GridDefinition {
    GridDefinition::new(
        "projects",
        vec![
            ColumnDescriptor::new("code", "Code", 100),
            ColumnDescriptor::new("name", "Name", 220),
            ColumnDescriptor::new("counteragent", "Counteragent", 200),
            ColumnDescriptor::new("start_date", "Start", 120).with_format(ColumnFormat::Date),
            ColumnDescriptor::new("end_date", "End", 120)
                .with_format(ColumnFormat::Date)
                .from_breakpoint(Breakpoint::Md),
            ColumnDescriptor::new("budget", "Budget", 130).with_format(ColumnFormat::Currency),
            ColumnDescriptor::new("completion", "Done", 90)
                .with_format(ColumnFormat::Percent)
                .from_breakpoint(Breakpoint::Lg),
        ],
    )
    .with_search(SearchSpec::keys(&["code", "name", "counteragent"]))
}

fn parsing_rules() -> GridDefinition {
    GridDefinition::new(
        "parsing-rules",
        vec![
            ColumnDescriptor::new("name", "Rule", 200),
            ColumnDescriptor::new("pattern", "Pattern", 260)
                .unsortable()
                .unfilterable(),
            ColumnDescriptor::new("target_field", "Target Field", 150),
            ColumnDescriptor::new("priority", "Priority", 90).with_format(ColumnFormat::Number),
            active_column(),
        ],
    )
    .with_search(SearchSpec::keys(&["name", "pattern", "target_field"]).with(active_search()))
}

fn payments_ledger() -> GridDefinition {
    let money = |key: &str, label: &str| {
        ColumnDescriptor::new(key, label, 120).with_format(ColumnFormat::Currency)
    };
    GridDefinition::new(
        "payments-ledger",
        vec![
            ColumnDescriptor::new("date", "Date", 120).with_format(ColumnFormat::Date),
            ColumnDescriptor::new("counteragent", "Counteragent", 220),
            ColumnDescriptor::new("project", "Project", 180),
            money("accrual", "Accrual"),
            money("order", "Order"),
            money("payment", "Payment"),
            money("due", "Due"),
            money("balance", "Balance"),
            ColumnDescriptor::new("comment", "Comment", 240)
                .unsortable()
                .unfilterable()
                .from_breakpoint(Breakpoint::Xl),
        ],
    )
    .with_search(SearchSpec::keys(&["counteragent", "project", "comment"]))
    .with_conditions(ConditionRegistry::ledger())
    .persisting_state()
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use ledgergrid_core::primitives::DEFAULT_PAGE_SIZE;

    #[test]
    fn builtin_has_every_screen() {
        let catalog = Catalog::builtin(DEFAULT_PAGE_SIZE);
        assert_eq!(catalog.len(), 8);
        for name in [
            "counteragents",
            "countries",
            "entity-types",
            "jobs",
            "payments",
            "projects",
            "parsing-rules",
            "payments-ledger",
        ] {
            assert!(catalog.contains(name), "missing {name}");
        }
    }

    #[test]
    fn definitions_are_well_formed() {
        let catalog = Catalog::builtin(25);
        for def in catalog.definitions() {
            assert!(def.duplicate_keys().is_empty(), "{} has duplicate keys", def.name);
            assert_eq!(def.default_page_size, 25);
            for field in def.search.fields() {
                assert!(
                    def.columns.iter().any(|c| c.key == field.key),
                    "{} searches unknown field {}",
                    def.name,
                    field.key
                );
            }
        }
    }

    #[test]
    fn only_the_ledger_persists_state_and_has_conditions() {
        let catalog = Catalog::builtin(DEFAULT_PAGE_SIZE);
        let ledger = catalog.get("payments-ledger").expect("ledger");
        assert!(ledger.persist_state);
        assert_eq!(ledger.conditions.len(), 15);
        assert!(ledger.conditions.get("Due<0").is_some());

        let others: Vec<_> = catalog
            .definitions()
            .filter(|d| d.name != "payments-ledger")
            .collect();
        assert!(others.iter().all(|d| !d.persist_state && d.conditions.is_empty()));
    }

    #[test]
    fn unknown_grid_is_an_error() {
        let catalog = Catalog::builtin(DEFAULT_PAGE_SIZE);
        assert!(matches!(
            catalog.get("invoices"),
            Err(GridError::UnknownGrid(name)) if name == "invoices"
        ));
    }
}
