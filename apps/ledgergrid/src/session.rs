//! # Grid Sessions
//!
//! One open grid instance over a dataset, as the HTTP service hosts it.
//! A session owns its engine state (filters, sort, page, layout gestures)
//! and follows dataset refreshes from the [`DatasetHub`].

use crate::hub::{DatasetHub, Refresh};
use ledgergrid_core::{Grid, GridDefinition, GridView, LayoutStore, Row, RowAction, RowActions};
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use std::sync::Arc;
use tokio::sync::broadcast::{self, error::TryRecvError};

/// Accepted row intents kept per session until a client drains them.
pub const MAX_PENDING_INTENTS: usize = 256;

/// A row action the service accepted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RowIntent {
    pub action: RowAction,
    pub row: Row,
}

/// Collects the intent dispatched by the grid.
#[derive(Debug, Default)]
struct IntentRecorder {
    intent: Option<RowIntent>,
}

impl IntentRecorder {
    fn record(&mut self, action: RowAction, row: &Row) {
        self.intent = Some(RowIntent {
            action,
            row: row.clone(),
        });
    }
}

impl RowActions<Row> for IntentRecorder {
    fn on_edit(&mut self, row: &Row) {
        self.record(RowAction::Edit, row);
    }

    fn on_delete(&mut self, row: &Row) {
        self.record(RowAction::Delete, row);
    }

    fn on_view_audit(&mut self, row: &Row) {
        self.record(RowAction::ViewAudit, row);
    }
}

/// An open grid.
#[derive(Debug)]
pub struct GridSession {
    id: u64,
    grid: Grid<Row>,
    refresh: broadcast::Receiver<Refresh>,
    viewport: Option<u32>,
    intents: VecDeque<RowIntent>,
}

impl GridSession {
    /// Open a session over the hub's current rows for the grid's dataset.
    #[must_use]
    pub fn open(
        id: u64,
        definition: Arc<GridDefinition>,
        hub: &DatasetHub,
        store: Arc<dyn LayoutStore>,
        min_width: u32,
    ) -> Self {
        let rows = hub.rows(&definition.name);
        let grid = Grid::open(definition, rows, store).with_min_width(min_width);
        Self {
            id,
            grid,
            refresh: hub.subscribe(),
            viewport: None,
            intents: VecDeque::new(),
        }
    }

    #[must_use]
    pub fn id(&self) -> u64 {
        self.id
    }

    #[must_use]
    pub fn grid_name(&self) -> &str {
        &self.grid.definition().name
    }

    #[must_use]
    pub fn grid(&self) -> &Grid<Row> {
        &self.grid
    }

    pub fn grid_mut(&mut self) -> &mut Grid<Row> {
        &mut self.grid
    }

    /// Pending row intents, oldest first.
    pub fn pending_intents(&self) -> impl Iterator<Item = &RowIntent> {
        self.intents.iter()
    }

    /// Remove and return the pending row intents, oldest first.
    pub fn take_intents(&mut self) -> Vec<RowIntent> {
        self.intents.drain(..).collect()
    }

    /// Apply pending refreshes for this session's dataset.
    ///
    /// Only the newest refresh matters, so a lagged receiver simply reloads
    /// the hub's current rows. Returns whether the rows were replaced.
    pub fn sync(&mut self, hub: &DatasetHub) -> bool {
        let mut latest = None;
        loop {
            match self.refresh.try_recv() {
                Ok(refresh) if refresh.dataset == self.grid.definition().name => {
                    latest = Some(refresh.rows);
                }
                Ok(_) => {}
                Err(TryRecvError::Lagged(skipped)) => {
                    tracing::warn!(session = self.id, skipped, "refresh receiver lagged, reloading");
                    latest = Some(hub.rows(self.grid_name()));
                }
                Err(TryRecvError::Empty | TryRecvError::Closed) => break,
            }
        }
        let Some(rows) = latest else {
            return false;
        };
        tracing::debug!(session = self.id, grid = %self.grid_name(), rows = rows.len(), "session rows refreshed");
        self.grid.set_shared_rows(rows);
        true
    }

    /// Rendered page at the last viewport a client asked for.
    pub fn view(&mut self) -> GridView {
        self.grid.view(self.viewport)
    }

    /// Rendered page at `viewport`, remembered for later views.
    pub fn view_at(&mut self, viewport: Option<u32>) -> GridView {
        if viewport.is_some() {
            self.viewport = viewport;
        }
        self.view()
    }

    /// Dispatch a row action on the `index`-th row of the current page.
    pub fn dispatch(&mut self, index: usize, action: RowAction) -> Option<RowIntent> {
        let mut recorder = IntentRecorder::default();
        if !self.grid.dispatch(index, action, &mut recorder) {
            return None;
        }
        let intent = recorder.intent?;
        tracing::info!(session = self.id, grid = %self.grid_name(), index, ?action, "row action");
        if self.intents.len() == MAX_PENDING_INTENTS {
            tracing::warn!(session = self.id, "pending intents full, dropping oldest");
            self.intents.pop_front();
        }
        self.intents.push_back(intent.clone());
        Some(intent)
    }
}
