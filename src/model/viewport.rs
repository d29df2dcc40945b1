use std::ops::Range;

use super::vm::VmRecord;

/// Order rows for display: active domains first, then inactive ones unless
/// `active_only` hides them. Order within each group is kept.
pub fn partition(records: Vec<VmRecord>, active_only: bool) -> Vec<VmRecord> {
    let (mut active, inactive): (Vec<_>, Vec<_>) = records.into_iter().partition(|r| r.is_active());
    if !active_only {
        active.extend(inactive);
    }
    active
}

/// Selection cursor over the table rows. Survives across refresh cycles.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Viewport {
    pub selected: usize,
}

impl Viewport {
    pub fn next(&mut self, total: usize) {
        if total == 0 {
            self.selected = 0;
            return;
        }
        self.selected = (self.selected + 1) % total;
    }

    pub fn previous(&mut self, total: usize) {
        if total == 0 {
            self.selected = 0;
            return;
        }
        self.selected = (self.selected + total - 1) % total;
    }

    pub fn first(&mut self) {
        self.selected = 0;
    }

    pub fn last(&mut self, total: usize) {
        self.selected = total.saturating_sub(1);
    }

    /// Keep the selection valid after the row set was rebuilt.
    pub fn clamp(&mut self, total: usize) {
        if self.selected >= total {
            self.selected = total.saturating_sub(1);
        }
    }

    /// Rows visible in a pane of `height` lines, roughly centred on the
    /// selection. Always contains `selected` when `total > 0`.
    pub fn window(&self, total: usize, height: usize) -> Range<usize> {
        if total == 0 || height == 0 {
            return 0..0;
        }
        let selected = self.selected.min(total - 1);
        let mut start = selected.saturating_sub(height / 2);
        let end = (start + height).min(total);
        if end - start < height {
            start = end.saturating_sub(height);
        }
        start..end
    }
}
