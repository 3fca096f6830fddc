//! Map-to-table bridge.
//!
//! The table owns its highlight: the map only sends "highlight this row until
//! then" and the table answers from its own state when it renders a row.

use crate::collab::{Notifier, UnitFilter};
use crate::config::MapConfig;
use crate::model::{Ident, Level, UnitKey, UnitRecord, UnitStatus, GOLD};

pub const PULSE_BG: &str = "#e6d7b3";
pub const ROW_GLOW: &str = "0 0 15px rgba(215, 194, 141, 0.9), inset 0 0 0 2px #c3aa69";

/// Stable row identity derived from building and unit.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct RowId {
    id: String,
    element: String,
}

impl RowId {
    pub fn new(building: &Ident, unit: &Ident) -> Self {
        RowId {
            id: format!("{}-{}", building, unit),
            element: format!("unit-row-{}{}", building, unit),
        }
    }

    pub fn from_key(key: &UnitKey) -> Self {
        RowId::new(&key.building, &key.unit)
    }

    pub fn as_str(&self) -> &str {
        &self.id
    }

    /// DOM id of the rendered row.
    pub fn element_id(&self) -> &str {
        &self.element
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct HighlightRequest {
    pub row: RowId,
    pub started_at: f64,
    pub expires_at: f64,
}

/// Inline style of a highlighted row. No highlight means default styling.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RowStyle {
    pub background: String,
    pub color: &'static str,
    pub font_weight: &'static str,
    pub box_shadow: &'static str,
    pub pulsing: bool,
}

pub trait RowTarget {
    fn has_row(&self, row: &RowId) -> bool;
    fn highlight(&mut self, request: HighlightRequest);
}

/// Rendering state of the property table.
#[derive(Clone, Debug, Default)]
pub struct TableView {
    filter: UnitFilter,
    rows: Vec<RowId>,
    highlight: Option<HighlightRequest>,
    pending_scroll: Option<RowId>,
    pulse_interval_ms: f64,
    pulse_count: u32,
    pulse_length_ms: f64,
}

impl TableView {
    pub fn new(config: &MapConfig) -> Self {
        TableView {
            filter: UnitFilter::default(),
            rows: Vec::new(),
            highlight: None,
            pending_scroll: None,
            pulse_interval_ms: config.pulse_interval_ms,
            pulse_count: config.pulse_count,
            pulse_length_ms: config.pulse_length_ms,
        }
    }

    pub fn filter(&self) -> UnitFilter {
        self.filter
    }

    pub fn rows(&self) -> &[RowId] {
        &self.rows
    }

    /// Rebuild the visible rows from the unit list under `filter`.
    pub fn set_units(&mut self, units: &[Option<UnitRecord>], filter: UnitFilter) {
        self.filter = filter;
        self.rows = units
            .iter()
            .flatten()
            .filter(|u| filter.admits(u.status_or_default()))
            .map(|u| RowId::new(&u.building_number, &u.unit_number))
            .collect();
        if let Some(h) = &self.highlight {
            if !self.rows.contains(&h.row) {
                self.highlight = None;
                self.pending_scroll = None;
            }
        }
    }

    pub fn highlighted(&self) -> Option<&HighlightRequest> {
        self.highlight.as_ref()
    }

    /// Row to scroll into the viewport center, handed out once.
    pub fn take_scroll_target(&mut self) -> Option<RowId> {
        self.pending_scroll.take()
    }

    /// Style for `row` at `now`. Pulses brighten the background for
    /// `pulse_length_ms` at each `pulse_interval_ms` step; expiry wins over a
    /// pulse that would start at the deadline.
    pub fn style_at(&self, row: &RowId, now: f64) -> Option<RowStyle> {
        let h = self.highlight.as_ref().filter(|h| &h.row == row)?;
        if now < h.started_at || now >= h.expires_at {
            return None;
        }
        let elapsed = now - h.started_at;
        let pulsing = (0..self.pulse_count).any(|k| {
            let start = k as f64 * self.pulse_interval_ms;
            elapsed >= start && elapsed < start + self.pulse_length_ms
        });
        Some(RowStyle {
            background: if pulsing {
                PULSE_BG.to_string()
            } else {
                format!("#{:02x}{:02x}{:02x}", GOLD.r, GOLD.g, GOLD.b)
            },
            color: "#000000",
            font_weight: "bold",
            box_shadow: ROW_GLOW,
            pulsing,
        })
    }

    /// Drop an expired highlight. Returns true if one was removed.
    pub fn tick(&mut self, now: f64) -> bool {
        match &self.highlight {
            Some(h) if now >= h.expires_at => {
                self.highlight = None;
                true
            }
            _ => false,
        }
    }
}

impl RowTarget for TableView {
    fn has_row(&self, row: &RowId) -> bool {
        self.rows.contains(row)
    }

    // A new request replaces the old one along with its pulses and expiry.
    fn highlight(&mut self, request: HighlightRequest) {
        self.pending_scroll = Some(request.row.clone());
        self.highlight = Some(request);
    }
}

pub struct CrossViewBridge {
    highlight_ms: f64,
}

impl CrossViewBridge {
    pub fn new(config: &MapConfig) -> Self {
        CrossViewBridge {
            highlight_ms: config.row_highlight_ms,
        }
    }

    /// Highlight the unit's row, or tell the user about the unit when the
    /// table does not show it. Returns true if a row was highlighted.
    pub fn activate(
        &self,
        building: &Ident,
        unit: &Ident,
        status: UnitStatus,
        now: f64,
        target: &mut dyn RowTarget,
        notifier: &mut dyn Notifier,
    ) -> bool {
        let row = RowId::new(building, unit);
        if target.has_row(&row) {
            log::debug!("highlighting row {}", row.as_str());
            target.highlight(HighlightRequest {
                row,
                started_at: now,
                expires_at: now + self.highlight_ms,
            });
            true
        } else {
            notifier.notify(
                &format!("Unit {}{}: {}", building, unit, status.label()),
                Level::Info,
            );
            false
        }
    }
}
