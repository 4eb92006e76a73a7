//! # Column Descriptors
//!
//! Column order is positional: the containing sequence defines display order.

use crate::primitives::{BREAKPOINT_LG, BREAKPOINT_MD, BREAKPOINT_SM, BREAKPOINT_XL};
use serde::{Deserialize, Serialize};

// =============================================================================
// BREAKPOINT
// =============================================================================

/// Responsive breakpoint below which a column is not rendered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Breakpoint {
    Sm,
    Md,
    Lg,
    Xl,
}

impl Breakpoint {
    /// Minimum viewport width (px) at which this breakpoint applies.
    #[must_use]
    pub const fn min_width(self) -> u32 {
        match self {
            Self::Sm => BREAKPOINT_SM,
            Self::Md => BREAKPOINT_MD,
            Self::Lg => BREAKPOINT_LG,
            Self::Xl => BREAKPOINT_XL,
        }
    }

    /// Largest breakpoint reached by a viewport width, if any.
    #[must_use]
    pub const fn from_width(px: u32) -> Option<Self> {
        if px >= BREAKPOINT_XL {
            Some(Self::Xl)
        } else if px >= BREAKPOINT_LG {
            Some(Self::Lg)
        } else if px >= BREAKPOINT_MD {
            Some(Self::Md)
        } else if px >= BREAKPOINT_SM {
            Some(Self::Sm)
        } else {
            None
        }
    }
}

// =============================================================================
// FORMAT
// =============================================================================

/// Display/comparison hint for a column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ColumnFormat {
    Currency,
    Number,
    Boolean,
    Date,
    Percent,
}

// =============================================================================
// COLUMN DESCRIPTOR
// =============================================================================

/// A column of a grid.
///
/// `key` is unique within a schema. A column that is not `visible`
/// contributes nothing to rendered width or facet UI but still participates
/// in filtering if a facet was previously set on it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ColumnDescriptor {
    pub key: String,
    pub label: String,
    pub width: u32,
    pub visible: bool,
    pub sortable: bool,
    pub filterable: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub responsive_breakpoint: Option<Breakpoint>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub format: Option<ColumnFormat>,
}

impl ColumnDescriptor {
    /// A visible, sortable, filterable column.
    #[must_use]
    pub fn new(key: impl Into<String>, label: impl Into<String>, width: u32) -> Self {
        Self {
            key: key.into(),
            label: label.into(),
            width: width.max(1),
            visible: true,
            sortable: true,
            filterable: true,
            responsive_breakpoint: None,
            format: None,
        }
    }

    /// Off by default.
    #[must_use]
    pub fn hidden(mut self) -> Self {
        self.visible = false;
        self
    }

    #[must_use]
    pub fn unsortable(mut self) -> Self {
        self.sortable = false;
        self
    }

    #[must_use]
    pub fn unfilterable(mut self) -> Self {
        self.filterable = false;
        self
    }

    #[must_use]
    pub fn with_format(mut self, format: ColumnFormat) -> Self {
        self.format = Some(format);
        self
    }

    #[must_use]
    pub fn from_breakpoint(mut self, breakpoint: Breakpoint) -> Self {
        self.responsive_breakpoint = Some(breakpoint);
        self
    }

    /// Whether the column renders at the given viewport width.
    ///
    /// `None` means "viewport unknown": only `visible` is considered.
    #[must_use]
    pub fn renders_at(&self, viewport: Option<u32>) -> bool {
        if !self.visible {
            return false;
        }
        match (self.responsive_breakpoint, viewport) {
            (Some(bp), Some(px)) => px >= bp.min_width(),
            _ => true,
        }
    }
}
