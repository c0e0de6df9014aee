//! Contact-time knowledge merge between two robots.
//!
//! When two robots (or a robot and the base station) come into
//! communication range, each pulls the other's knowledge into its own grid.
//! Information is only ever added; relay bookkeeping is deliberately *not*
//! unioned, because the receiving robot may itself be the relay for the
//! cell in question.

use log::debug;

use crate::core::GridCoord;
use crate::grid::storage::{GridError, KnowledgeGrid};

impl KnowledgeGrid {
    /// Merge a partner grid's knowledge into this one.
    ///
    /// Per cell, the four knowledge flags (free, safe, obstacle, known at
    /// base) are compared; where they differ, whatever the partner has is
    /// unioned in through the ordinary mutators, so the aggregate ledger
    /// stays exact. Relay state transfers only into a cell that was
    /// entirely blank beforehand: a genuinely unknown cell inherits the
    /// relay bookkeeping of whichever robot already tracks it, while a cell
    /// with any prior knowledge never silently inherits relay
    /// responsibility it was not assigned.
    ///
    /// With `with_base_station` set, every differing cell is additionally
    /// marked known at base: the partner is the base station itself, so
    /// whatever was exchanged has been delivered.
    ///
    /// Returns the coordinates whose observable state changed. After both
    /// robots have merged from each other, the two grids agree on all
    /// knowledge flags for every cell; their relay flags may still
    /// legitimately differ.
    ///
    /// Cost O(width·height); merges happen on communication contact, far
    /// less often than per-tick sensor updates.
    pub fn merge_from(
        &mut self,
        partner: &KnowledgeGrid,
        with_base_station: bool,
    ) -> Result<Vec<GridCoord>, GridError> {
        if self.width() != partner.width() || self.height() != partner.height() {
            return Err(GridError::DimensionMismatch {
                ours: (self.width(), self.height()),
                theirs: (partner.width(), partner.height()),
            });
        }

        let mut updated = Vec::new();
        for y in 0..self.height() as i32 {
            for x in 0..self.width() as i32 {
                let coord = GridCoord::new(x, y);
                let ours = self.state_or_blank(coord);
                let theirs = partner.state_or_blank(coord);
                if ours.knowledge_bits() == theirs.knowledge_bits() {
                    continue;
                }

                if theirs.is_free_space() {
                    self.set_free_space(coord)?;
                }
                if theirs.is_safe_space() {
                    self.set_safe_space(coord)?;
                }
                if theirs.is_obstacle() {
                    self.set_obstacle(coord)?;
                }
                if theirs.is_known_at_base() {
                    self.set_known_at_base(coord)?;
                }

                // Relay state rides along only into a previously blank cell.
                if ours.is_blank() && theirs.is_got_relayed() {
                    self.set_got_relayed(coord, true)?;
                }

                if with_base_station {
                    self.set_known_at_base(coord)?;
                }

                // The comparison also differs when only the partner is
                // missing information; report just the cells we changed.
                if self.state_or_blank(coord) != ours {
                    updated.push(coord);
                }
            }
        }

        debug!(
            "merged partner knowledge: {} cells updated (with_base_station={})",
            updated.len(),
            with_base_station
        );
        Ok(updated)
    }
}
