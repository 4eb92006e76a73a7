//! # Layout Interaction Layer
//!
//! Two pointer-driven state machines over the column schema:
//!
//! ```text
//! Resize:  Idle --begin--> Resizing --move*--> Resizing --end--> Idle (commit once)
//!                                    \--cancel--> Idle
//! Reorder: Idle --start--> Dragging --over*--> Dragging --drop--> Idle (splice)
//!                                    \--leave/end--> Idle
//! ```
//!
//! While resizing, the live width is tracked here and never written to the
//! schema; only the final width is committed. The two machines are mutually
//! exclusive: beginning a resize cancels a drag, and a drag cannot start
//! while a resize is in progress.

use crate::primitives::MIN_COLUMN_WIDTH;
use serde::{Deserialize, Serialize};

// =============================================================================
// RESIZE
// =============================================================================

/// Column resize machine.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum ResizeTracker {
    #[default]
    Idle,
    Resizing {
        column: String,
        start_x: i64,
        start_width: u32,
        live_width: u32,
    },
}

impl ResizeTracker {
    /// Pointer-down on a column's resize handle.
    pub fn begin(&mut self, column: impl Into<String>, start_x: i64, start_width: u32) {
        *self = Self::Resizing {
            column: column.into(),
            start_x,
            start_width,
            live_width: start_width,
        };
    }

    /// Pointer-move: `max(min_width, start_width + (x - start_x))`.
    ///
    /// Returns the live width, or `None` when idle.
    pub fn update(&mut self, x: i64, min_width: u32) -> Option<u32> {
        let Self::Resizing {
            start_x,
            start_width,
            live_width,
            ..
        } = self
        else {
            return None;
        };
        let raw = i64::from(*start_width).saturating_add(x.saturating_sub(*start_x));
        let clamped = raw.clamp(i64::from(min_width), i64::from(u32::MAX));
        *live_width = u32::try_from(clamped).unwrap_or(u32::MAX);
        Some(*live_width)
    }

    /// Pointer-up: the `(column, width)` to commit, if resizing.
    pub fn commit(&mut self) -> Option<(String, u32)> {
        match std::mem::take(self) {
            Self::Resizing {
                column, live_width, ..
            } => Some((column, live_width)),
            Self::Idle => None,
        }
    }

    /// Abort without committing.
    pub fn cancel(&mut self) {
        *self = Self::Idle;
    }

    #[must_use]
    pub fn is_active(&self) -> bool {
        matches!(self, Self::Resizing { .. })
    }

    /// Uncommitted width of `column` while it is being resized.
    #[must_use]
    pub fn live_width(&self, column: &str) -> Option<u32> {
        match self {
            Self::Resizing {
                column: c,
                live_width,
                ..
            } if c == column => Some(*live_width),
            _ => None,
        }
    }
}

// =============================================================================
// REORDER
// =============================================================================

/// Column reorder (drag and drop) machine.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum DragTracker {
    #[default]
    Idle,
    Dragging {
        source: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        over: Option<String>,
    },
}

impl DragTracker {
    pub fn start(&mut self, source: impl Into<String>) {
        *self = Self::Dragging {
            source: source.into(),
            over: None,
        };
    }

    /// Drag-over: mark the drop target. Hovering the source clears the mark.
    pub fn over(&mut self, target: &str) {
        if let Self::Dragging { source, over } = self {
            *over = (source != target).then(|| target.to_string());
        }
    }

    /// Drop: `(source, target)` when they differ. Always returns to idle.
    pub fn drop_on(&mut self, target: &str) -> Option<(String, String)> {
        match std::mem::take(self) {
            Self::Dragging { source, .. } if source != target => {
                Some((source, target.to_string()))
            }
            _ => None,
        }
    }

    /// Pointer left the grid, or drag-end without a drop.
    pub fn end(&mut self) {
        *self = Self::Idle;
    }

    #[must_use]
    pub fn is_active(&self) -> bool {
        matches!(self, Self::Dragging { .. })
    }

    /// Current "drop here" indicator.
    #[must_use]
    pub fn drop_target(&self) -> Option<&str> {
        match self {
            Self::Dragging { over, .. } => over.as_deref(),
            Self::Idle => None,
        }
    }

    #[must_use]
    pub fn source(&self) -> Option<&str> {
        match self {
            Self::Dragging { source, .. } => Some(source),
            Self::Idle => None,
        }
    }
}

// =============================================================================
// EVENTS
// =============================================================================

/// Pointer event for the resize machine.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ResizeEvent {
    Begin { column: String, x: i64 },
    Move { x: i64 },
    End,
    Cancel,
}

/// Pointer event for the reorder machine.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum DragEvent {
    Start { column: String },
    Over { column: String },
    Drop { column: String },
    Leave,
    End,
}

/// A schema change produced by a finished gesture.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum LayoutCommit {
    Width { column: String, width: u32 },
    Move { source: String, target: String },
}

// =============================================================================
// INTERACTION
// =============================================================================

/// Both machines of one grid instance.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LayoutInteraction {
    resize: ResizeTracker,
    drag: DragTracker,
    min_width: u32,
}

impl Default for LayoutInteraction {
    fn default() -> Self {
        Self::new(MIN_COLUMN_WIDTH)
    }
}

impl LayoutInteraction {
    #[must_use]
    pub fn new(min_width: u32) -> Self {
        Self {
            resize: ResizeTracker::Idle,
            drag: DragTracker::Idle,
            min_width: min_width.max(1),
        }
    }

    #[must_use]
    pub fn resize(&self) -> &ResizeTracker {
        &self.resize
    }

    #[must_use]
    pub fn drag(&self) -> &DragTracker {
        &self.drag
    }

    #[must_use]
    pub fn min_width(&self) -> u32 {
        self.min_width
    }

    /// Begin a resize; cancels any drag in progress.
    pub fn begin_resize(&mut self, column: impl Into<String>, x: i64, start_width: u32) {
        self.drag.end();
        self.resize.begin(column, x, start_width);
    }

    pub fn update_resize(&mut self, x: i64) -> Option<u32> {
        self.resize.update(x, self.min_width)
    }

    /// Finish the resize, yielding the width commit.
    pub fn end_resize(&mut self) -> Option<LayoutCommit> {
        self.resize
            .commit()
            .map(|(column, width)| LayoutCommit::Width { column, width })
    }

    pub fn cancel_resize(&mut self) {
        self.resize.cancel();
    }

    /// Start a drag. Returns `false` (and does nothing) while resizing.
    pub fn start_drag(&mut self, column: impl Into<String>) -> bool {
        if self.resize.is_active() {
            return false;
        }
        self.drag.start(column);
        true
    }

    pub fn drag_over(&mut self, column: &str) {
        self.drag.over(column);
    }

    /// Drop on `column`, yielding the move commit if it is a real move.
    pub fn drop_on(&mut self, column: &str) -> Option<LayoutCommit> {
        self.drag
            .drop_on(column)
            .map(|(source, target)| LayoutCommit::Move { source, target })
    }

    pub fn end_drag(&mut self) {
        self.drag.end();
    }

    /// Drop every transient gesture state.
    pub fn reset(&mut self) {
        self.resize.cancel();
        self.drag.end();
    }

    /// Feed a resize pointer event. `start_width` resolves a column's
    /// committed width on `Begin`.
    pub fn handle_resize(
        &mut self,
        event: ResizeEvent,
        start_width: impl FnOnce(&str) -> Option<u32>,
    ) -> Option<LayoutCommit> {
        match event {
            ResizeEvent::Begin { column, x } => {
                if let Some(width) = start_width(&column) {
                    self.begin_resize(column, x, width);
                }
                None
            }
            ResizeEvent::Move { x } => {
                self.update_resize(x);
                None
            }
            ResizeEvent::End => self.end_resize(),
            ResizeEvent::Cancel => {
                self.cancel_resize();
                None
            }
        }
    }

    /// Feed a reorder pointer event.
    pub fn handle_drag(&mut self, event: DragEvent) -> Option<LayoutCommit> {
        match event {
            DragEvent::Start { column } => {
                self.start_drag(column);
                None
            }
            DragEvent::Over { column } => {
                self.drag_over(&column);
                None
            }
            DragEvent::Drop { column } => self.drop_on(&column),
            DragEvent::Leave | DragEvent::End => {
                self.end_drag();
                None
            }
        }
    }
}
