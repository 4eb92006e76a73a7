//! # Condition Predicate Registry
//!
//! A closed table of named boolean predicates over numeric fields, each a
//! comparison against the literal `0` (e.g. `Accrual>0`, `Balance=0`).
//!
//! New conditions are added as registry entries; the filter engine only
//! looks names up here. Selected conditions are OR-combined by the engine.

use crate::GridRecord;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;

// =============================================================================
// COMPARISON
// =============================================================================

/// Comparison of a field against zero.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CompareOp {
    /// `field > 0`
    Positive,
    /// `field < 0`
    Negative,
    /// `field = 0`
    Zero,
}

impl CompareOp {
    /// Operator symbol used in condition names.
    #[must_use]
    pub const fn symbol(self) -> &'static str {
        match self {
            Self::Positive => ">",
            Self::Negative => "<",
            Self::Zero => "=",
        }
    }

    const fn expected(self) -> Ordering {
        match self {
            Self::Positive => Ordering::Greater,
            Self::Negative => Ordering::Less,
            Self::Zero => Ordering::Equal,
        }
    }

    /// Evaluate against a value. Non-numeric values never match.
    #[must_use]
    pub fn matches(self, value: Option<f64>) -> bool {
        value
            .and_then(|v| v.partial_cmp(&0.0))
            .is_some_and(|ord| ord == self.expected())
    }
}

// =============================================================================
// RULE
// =============================================================================

/// One named predicate.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConditionRule {
    pub name: String,
    pub field: String,
    pub op: CompareOp,
}

impl ConditionRule {
    #[must_use]
    pub fn new(name: impl Into<String>, field: impl Into<String>, op: CompareOp) -> Self {
        Self {
            name: name.into(),
            field: field.into(),
            op,
        }
    }

    /// Evaluate the rule on a row.
    pub fn evaluate<R: GridRecord>(&self, row: &R) -> bool {
        self.op.matches(row.cell(&self.field).as_number())
    }
}

// =============================================================================
// REGISTRY
// =============================================================================

/// Registered conditions, in registration order.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ConditionRegistry {
    rules: Vec<ConditionRule>,
}

impl ConditionRegistry {
    /// An empty registry (grids without conditions).
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a rule. A rule with an already registered name replaces it.
    pub fn register(&mut self, rule: ConditionRule) {
        match self.rules.iter_mut().find(|r| r.name == rule.name) {
            Some(existing) => *existing = rule,
            None => self.rules.push(rule),
        }
    }

    /// Builder-style [`ConditionRegistry::register`].
    #[must_use]
    pub fn with(mut self, rule: ConditionRule) -> Self {
        self.register(rule);
        self
    }

    /// Register `>0`, `<0` and `=0` for a field, named `<Label><op>0`.
    #[must_use]
    pub fn with_sign_rules(mut self, label: &str, field: &str) -> Self {
        for op in [CompareOp::Positive, CompareOp::Negative, CompareOp::Zero] {
            self.register(ConditionRule::new(
                format!("{label}{}0", op.symbol()),
                field,
                op,
            ));
        }
        self
    }

    /// The payments ledger table: sign rules over every money column.
    #[must_use]
    pub fn ledger() -> Self {
        Self::new()
            .with_sign_rules("Accrual", "accrual")
            .with_sign_rules("Order", "order")
            .with_sign_rules("Payment", "payment")
            .with_sign_rules("Due", "due")
            .with_sign_rules("Balance", "balance")
    }

    #[must_use]
    pub fn get(&self, name: &str) -> Option<&ConditionRule> {
        self.rules.iter().find(|r| r.name == name)
    }

    /// Registered names, in registration order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.rules.iter().map(|r| r.name.as_str())
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.rules.len()
    }

    /// Evaluate a named condition. `None` if the name is not registered.
    pub fn evaluate<R: GridRecord>(&self, name: &str, row: &R) -> Option<bool> {
        self.get(name).map(|rule| rule.evaluate(row))
    }
}
