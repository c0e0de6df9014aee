//! Aggregate coverage bookkeeping.
//!
//! The ledger shadows three derived cell subsets and keeps them current
//! through every mutation instead of recomputing them; at per-tick sensor
//! volumes a full-grid recount per query would dominate the simulation.
//!
//! Tracked at all times:
//! - `free_cells` == |{c : free}|
//! - `free_known_at_base` == |{c : free ∧ known-at-base}|
//! - `free_relayed_not_known` == |{c : free ∧ relayed ∧ ¬known-at-base}|
//! - `owned` == {c : free ∧ ¬known-at-base ∧ ¬relayed}
//!
//! Every free cell sits in exactly one of the three buckets, so
//! `free_known_at_base + free_relayed_not_known + |owned| == free_cells`.
//!
//! The update rules live here; the guards deciding *whether* a transition
//! happens live with the flag mutators in [`storage`](super::storage).

use log::warn;
use std::collections::HashSet;

use crate::core::{CellState, GridCoord};

/// Counters and the ownership set, maintained in lock-step with the grid.
///
/// The ownership set holds the cells this robot is currently responsible
/// for delivering to the base station: free, not yet known at base, and not
/// being relayed by anyone else. It is keyed by coordinate; iteration order
/// is unspecified.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct CoverageLedger {
    free_cells: usize,
    free_known_at_base: usize,
    free_relayed_not_known: usize,
    owned: HashSet<GridCoord>,
}

impl CoverageLedger {
    /// An empty ledger for a freshly constructed grid.
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// Number of cells marked free.
    #[inline]
    pub fn free_cells(&self) -> usize {
        self.free_cells
    }

    /// Number of cells marked free and known at base.
    #[inline]
    pub fn free_known_at_base(&self) -> usize {
        self.free_known_at_base
    }

    /// Number of cells marked free, relayed, and not yet known at base.
    #[inline]
    pub fn free_relayed_not_known(&self) -> usize {
        self.free_relayed_not_known
    }

    /// The cells this robot is responsible for delivering to base.
    #[inline]
    pub fn owned(&self) -> &HashSet<GridCoord> {
        &self.owned
    }

    /// Account for `coord` becoming free. The caller has verified the cell
    /// was not free before; the bucket is chosen by the known-at-base and
    /// relay bits of `state` (its free bit is not consulted).
    pub(crate) fn credit(&mut self, coord: GridCoord, state: CellState) {
        self.free_cells += 1;
        if state.is_known_at_base() {
            self.free_known_at_base += 1;
        } else if state.is_got_relayed() {
            self.free_relayed_not_known += 1;
        } else {
            self.owned.insert(coord);
        }
    }

    /// Account for `coord` ceasing to be free. The caller has verified the
    /// cell was free before; the bucket is chosen by the known-at-base and
    /// relay bits of `state` (its free bit is not consulted).
    pub(crate) fn debit(&mut self, coord: GridCoord, state: CellState) {
        self.free_cells = self.free_cells.saturating_sub(1);
        if state.is_known_at_base() {
            self.free_known_at_base = self.free_known_at_base.saturating_sub(1);
        } else if state.is_got_relayed() {
            self.free_relayed_not_known = self.free_relayed_not_known.saturating_sub(1);
        } else {
            self.remove_owned(coord);
        }
    }

    /// A free, not-known cell became known at base. `was_relayed` is the
    /// cell's relay bit at the time of the transition.
    pub(crate) fn on_known_at_base(&mut self, coord: GridCoord, was_relayed: bool) {
        self.free_known_at_base += 1;
        if was_relayed {
            debug_assert!(
                self.free_relayed_not_known > 0,
                "relayed counter would go negative at {coord}"
            );
            self.free_relayed_not_known = self.free_relayed_not_known.saturating_sub(1);
        } else {
            self.remove_owned(coord);
        }
    }

    /// A free, not-known, not-relayed cell became relayed. Ownership removal
    /// is skipped on the bulk-transfer path, where the whole set is cleared
    /// once instead of per cell.
    pub(crate) fn on_relayed(&mut self, coord: GridCoord, remove_from_ownership: bool) {
        self.free_relayed_not_known += 1;
        if remove_from_ownership {
            self.remove_owned(coord);
        }
    }

    /// A free, not-known, relayed cell lost its relay: the responsibility
    /// for delivering it returns to this robot.
    pub(crate) fn on_unrelayed(&mut self, coord: GridCoord) {
        debug_assert!(
            self.free_relayed_not_known > 0,
            "relayed counter would go negative at {coord}"
        );
        self.free_relayed_not_known = self.free_relayed_not_known.saturating_sub(1);
        self.owned.insert(coord);
    }

    /// Take the whole ownership set, leaving it empty.
    pub(crate) fn drain_owned(&mut self) -> HashSet<GridCoord> {
        std::mem::take(&mut self.owned)
    }

    /// Remove a cell expected to be present in the ownership set. An absent
    /// cell means the ledger has drifted from the flags; that is surfaced
    /// rather than swallowed, and fails hard in test builds.
    fn remove_owned(&mut self, coord: GridCoord) {
        let removed = self.owned.remove(&coord);
        if !removed {
            warn!("cell {coord} expected in ownership set but was absent");
        }
        debug_assert!(
            removed,
            "cell {coord} expected in ownership set but was absent"
        );
    }
}
