//! # Dataset Hub
//!
//! Current rows of every dataset plus a broadcast channel announcing
//! replacements. Each open grid session holds a receiver and reloads its rows
//! when a refresh for its dataset arrives, so one edit refreshes every open
//! grid over that data.

use ledgergrid_core::Row;
use std::collections::BTreeMap;
use std::sync::Arc;
use tokio::sync::broadcast;

/// Refreshes buffered per receiver before it lags.
pub const REFRESH_CHANNEL_CAPACITY: usize = 64;

/// A dataset was replaced.
#[derive(Debug, Clone)]
pub struct Refresh {
    pub dataset: String,
    pub rows: Arc<Vec<Row>>,
}

/// Datasets keyed by grid name.
#[derive(Debug)]
pub struct DatasetHub {
    datasets: BTreeMap<String, Arc<Vec<Row>>>,
    sender: broadcast::Sender<Refresh>,
}

impl Default for DatasetHub {
    fn default() -> Self {
        Self::new()
    }
}

impl DatasetHub {
    #[must_use]
    pub fn new() -> Self {
        let (sender, _) = broadcast::channel(REFRESH_CHANNEL_CAPACITY);
        Self {
            datasets: BTreeMap::new(),
            sender,
        }
    }

    /// Current rows of a dataset; empty when never published.
    #[must_use]
    pub fn rows(&self, dataset: &str) -> Arc<Vec<Row>> {
        self.datasets.get(dataset).cloned().unwrap_or_default()
    }

    /// Replace a dataset and announce it. Returns how many receivers were
    /// notified.
    pub fn publish(&mut self, dataset: &str, rows: Vec<Row>) -> usize {
        let rows = Arc::new(rows);
        self.datasets.insert(dataset.to_string(), Arc::clone(&rows));
        let refresh = Refresh {
            dataset: dataset.to_string(),
            rows,
        };
        // No receivers is not an error: nobody has the grid open.
        let notified = self.sender.send(refresh).unwrap_or(0);
        tracing::info!(dataset, rows = self.rows(dataset).len(), notified, "dataset refreshed");
        notified
    }

    #[must_use]
    pub fn subscribe(&self) -> broadcast::Receiver<Refresh> {
        self.sender.subscribe()
    }

    /// Dataset names with their row counts.
    pub fn summary(&self) -> impl Iterator<Item = (&str, usize)> {
        self.datasets.iter().map(|(name, rows)| (name.as_str(), rows.len()))
    }
}
