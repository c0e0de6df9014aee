//! Flag storage and mutation for the knowledge grid.
//!
//! One byte of flags per cell in a flat row-major array. Every mutator
//! updates the [`CoverageLedger`] in the same call, so the aggregate
//! counters and the ownership set are exact after every operation; nothing
//! is recomputed lazily.
//!
//! Mutating operations on one grid must be serialized by the caller. The
//! ledger update inside a mutator is multi-step, which is why the mutators
//! take `&mut self`; read-only queries take `&self` and may run
//! concurrently with each other. Long read-heavy planning scans should work
//! on a [`clone`](Clone::clone) instead of the live grid.

use std::fmt;

use crate::core::{CellState, GridCoord};
use crate::grid::config::{ConfigError, GridConfig};
use crate::grid::stats::CoverageLedger;

/// Error type for bounds-checked grid access.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GridError {
    /// Coordinate outside `[0, width) x [0, height)`.
    OutOfBounds {
        /// The rejected coordinate
        coord: GridCoord,
        /// Grid width in cells
        width: usize,
        /// Grid height in cells
        height: usize,
    },
    /// Merge partners must have identical dimensions.
    DimensionMismatch {
        /// Dimensions of the merging grid
        ours: (usize, usize),
        /// Dimensions of the partner grid
        theirs: (usize, usize),
    },
}

impl fmt::Display for GridError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GridError::OutOfBounds {
                coord,
                width,
                height,
            } => {
                write!(f, "coordinate {} outside {}x{} grid", coord, width, height)
            }
            GridError::DimensionMismatch { ours, theirs } => {
                write!(
                    f,
                    "cannot merge {}x{} grid with {}x{} partner",
                    ours.0, ours.1, theirs.0, theirs.1
                )
            }
        }
    }
}

impl std::error::Error for GridError {}

/// A single robot's spatial knowledge of the environment.
///
/// Fixed-size rectangular grid of [`CellState`] flag bytes, created once per
/// robot at simulation start and mutated by sensor updates, relay
/// bookkeeping, and contact-time merges. Cell `(x, y)` with `x` growing
/// rightward and `y` growing upward; `(0, 0)` is the first cell of the
/// backing array.
///
/// Two access policies, applied uniformly:
/// - store accessors and mutators are bounds-checked and return
///   [`GridError::OutOfBounds`] rather than silently defaulting;
/// - the read-only predicates ([`free_space_at`](Self::free_space_at) and
///   friends) treat out-of-range cells as never-observed, which is what the
///   neighborhood and ray queries in [`query`](crate::query) need.
///
/// `Clone` produces a fully independent deep copy (flags, counters, and
/// ownership set), cost O(width·height).
#[derive(Clone, Debug)]
pub struct KnowledgeGrid {
    /// Flag bytes, row-major
    flags: Vec<u8>,
    /// Grid width in cells
    width: usize,
    /// Grid height in cells
    height: usize,
    /// Aggregates maintained in lock-step with `flags`
    ledger: CoverageLedger,
}

impl KnowledgeGrid {
    /// Create an empty grid: all flags clear, counters zero, no owned cells.
    pub fn new(width: usize, height: usize) -> Result<Self, ConfigError> {
        Self::from_config(&GridConfig::new(width, height))
    }

    /// Create an empty grid from a validated configuration.
    pub fn from_config(config: &GridConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self {
            flags: vec![0; config.width * config.height],
            width: config.width,
            height: config.height,
            ledger: CoverageLedger::new(),
        })
    }

    /// Grid width in cells
    #[inline]
    pub fn width(&self) -> usize {
        self.width
    }

    /// Grid height in cells
    #[inline]
    pub fn height(&self) -> usize {
        self.height
    }

    /// Total number of cells
    #[inline]
    pub fn cell_count(&self) -> usize {
        self.width * self.height
    }

    /// Check if grid coordinates are within bounds
    #[inline]
    pub fn in_bounds(&self, coord: GridCoord) -> bool {
        coord.x >= 0
            && coord.y >= 0
            && (coord.x as usize) < self.width
            && (coord.y as usize) < self.height
    }

    /// Convert grid coordinates to flat array index
    #[inline]
    fn coord_to_index(&self, coord: GridCoord) -> Option<usize> {
        if self.in_bounds(coord) {
            Some(coord.y as usize * self.width + coord.x as usize)
        } else {
            None
        }
    }

    /// Flat index or an explicit bounds error.
    #[inline]
    fn index(&self, coord: GridCoord) -> Result<usize, GridError> {
        self.coord_to_index(coord).ok_or(GridError::OutOfBounds {
            coord,
            width: self.width,
            height: self.height,
        })
    }

    // === Reads ===

    /// Full flag set of a cell, bounds-checked.
    #[inline]
    pub fn state(&self, coord: GridCoord) -> Result<CellState, GridError> {
        self.index(coord).map(|i| CellState::from_bits(self.flags[i]))
    }

    /// Full flag set of a cell; out-of-range reads as never-observed.
    #[inline]
    pub fn state_or_blank(&self, coord: GridCoord) -> CellState {
        self.coord_to_index(coord)
            .map(|i| CellState::from_bits(self.flags[i]))
            .unwrap_or_else(CellState::blank)
    }

    /// Observed traversable at `coord`? Out-of-range is false.
    #[inline]
    pub fn free_space_at(&self, coord: GridCoord) -> bool {
        self.state_or_blank(coord).is_free_space()
    }

    /// Observed traversable at close range? Out-of-range is false.
    #[inline]
    pub fn safe_space_at(&self, coord: GridCoord) -> bool {
        self.state_or_blank(coord).is_safe_space()
    }

    /// Observed blocked? Out-of-range is false.
    #[inline]
    pub fn obstacle_at(&self, coord: GridCoord) -> bool {
        self.state_or_blank(coord).is_obstacle()
    }

    /// Already delivered to base? Out-of-range is false.
    #[inline]
    pub fn known_at_base(&self, coord: GridCoord) -> bool {
        self.state_or_blank(coord).is_known_at_base()
    }

    /// Carried toward base by another robot? Out-of-range is false.
    #[inline]
    pub fn got_relayed(&self, coord: GridCoord) -> bool {
        self.state_or_blank(coord).is_got_relayed()
    }

    /// Frozen for topological-map recomputation? Out-of-range is false.
    #[inline]
    pub fn final_topological_at(&self, coord: GridCoord) -> bool {
        self.state_or_blank(coord).is_final_topological()
    }

    /// Raw flag bytes, row-major. Bit order per [`CellState`]; external
    /// serialization must preserve it.
    #[inline]
    pub fn flags_raw(&self) -> &[u8] {
        &self.flags
    }

    // === Aggregates ===

    /// The aggregate ledger.
    #[inline]
    pub fn ledger(&self) -> &CoverageLedger {
        &self.ledger
    }

    /// Number of cells marked free.
    #[inline]
    pub fn free_cell_count(&self) -> usize {
        self.ledger.free_cells()
    }

    /// Number of cells marked free and known at base.
    #[inline]
    pub fn free_known_at_base_count(&self) -> usize {
        self.ledger.free_known_at_base()
    }

    /// Number of cells marked free, relayed, and not yet known at base.
    #[inline]
    pub fn free_relayed_count(&self) -> usize {
        self.ledger.free_relayed_not_known()
    }

    /// The cells this robot is responsible for delivering to base.
    #[inline]
    pub fn owned_cells(&self) -> &std::collections::HashSet<GridCoord> {
        self.ledger.owned()
    }

    // === Mutators ===

    /// Mark a cell as observed traversable.
    ///
    /// Does *not* clear an obstacle flag: a caller correcting a previous
    /// obstacle observation must call [`clear_obstacle`](Self::clear_obstacle)
    /// first, otherwise the two flags stay contradictory until it does.
    pub fn set_free_space(&mut self, coord: GridCoord) -> Result<(), GridError> {
        let idx = self.index(coord)?;
        self.set_free_at(idx, coord);
        Ok(())
    }

    /// Mark a cell as not traversable. Also clears the safe-space flag,
    /// which cannot outlive free space.
    pub fn clear_free_space(&mut self, coord: GridCoord) -> Result<(), GridError> {
        let idx = self.index(coord)?;
        self.clear_free_at(idx, coord);
        Ok(())
    }

    /// Mark a cell as observed traversable at close range. Safe space is
    /// also free space, so the free flag is set as a side effect.
    pub fn set_safe_space(&mut self, coord: GridCoord) -> Result<(), GridError> {
        let idx = self.index(coord)?;
        self.flags[idx] |= CellState::SAFE_SPACE;
        self.set_free_at(idx, coord);
        Ok(())
    }

    /// Mark a cell as blocked. Clears free space (and with it safe space).
    pub fn set_obstacle(&mut self, coord: GridCoord) -> Result<(), GridError> {
        let idx = self.index(coord)?;
        self.flags[idx] |= CellState::OBSTACLE;
        self.clear_free_at(idx, coord);
        Ok(())
    }

    /// Retract an obstacle observation. The sensor that saw no obstacle here
    /// has observed traversable space, so the free flag is set.
    pub fn clear_obstacle(&mut self, coord: GridCoord) -> Result<(), GridError> {
        let idx = self.index(coord)?;
        self.flags[idx] &= !CellState::OBSTACLE;
        self.set_free_at(idx, coord);
        Ok(())
    }

    /// Mark a cell's state as delivered to the base station.
    ///
    /// The aggregate transfer happens only for a free cell not already known
    /// at base; the flag bit itself is set regardless, and becomes relevant
    /// again if the cell is later observed free.
    pub fn set_known_at_base(&mut self, coord: GridCoord) -> Result<(), GridError> {
        let idx = self.index(coord)?;
        let prior = CellState::from_bits(self.flags[idx]);
        if !prior.is_known_at_base() && prior.is_free_space() {
            self.ledger.on_known_at_base(coord, prior.is_got_relayed());
        }
        self.flags[idx] |= CellState::KNOWN_AT_BASE;
        Ok(())
    }

    /// Mark a cell as being relayed to base by another robot.
    ///
    /// With `remove_from_ownership` false the ownership set is left alone;
    /// that variant exists for the bulk transfer in
    /// [`relay_all_owned`](Self::relay_all_owned), which clears the set
    /// wholesale instead of per cell.
    pub fn set_got_relayed(
        &mut self,
        coord: GridCoord,
        remove_from_ownership: bool,
    ) -> Result<(), GridError> {
        let idx = self.index(coord)?;
        self.relay_at(idx, coord, remove_from_ownership);
        Ok(())
    }

    /// Mark a cell as no longer being relayed. If the cell is free and not
    /// known at base, responsibility for delivering it returns to this
    /// robot.
    pub fn clear_got_relayed(&mut self, coord: GridCoord) -> Result<(), GridError> {
        let idx = self.index(coord)?;
        let prior = CellState::from_bits(self.flags[idx]);
        if prior.is_got_relayed() && prior.is_free_space() && !prior.is_known_at_base() {
            self.ledger.on_unrelayed(coord);
        }
        self.flags[idx] &= !CellState::GOT_RELAYED;
        Ok(())
    }

    /// Freeze a cell for topological-map recomputation. Advisory only.
    pub fn set_final_topological(&mut self, coord: GridCoord) -> Result<(), GridError> {
        let idx = self.index(coord)?;
        self.flags[idx] |= CellState::FINAL_TOPOLOGICAL_MAP;
        Ok(())
    }

    /// Unfreeze a cell for topological-map recomputation.
    pub fn clear_final_topological(&mut self, coord: GridCoord) -> Result<(), GridError> {
        let idx = self.index(coord)?;
        self.flags[idx] &= !CellState::FINAL_TOPOLOGICAL_MAP;
        Ok(())
    }

    /// Replace a cell's full flag byte.
    ///
    /// This is the bulk accessor: the old byte's ledger contribution is
    /// retired and the new byte's applied in the same call, so loading
    /// externally produced flag bytes keeps the aggregates exact.
    pub fn set_state(&mut self, coord: GridCoord, state: CellState) -> Result<(), GridError> {
        let idx = self.index(coord)?;
        let prior = CellState::from_bits(self.flags[idx]);
        if prior == state {
            return Ok(());
        }
        if prior.is_free_space() {
            self.ledger.debit(coord, prior);
        }
        self.flags[idx] = state.bits();
        if state.is_free_space() {
            self.ledger.credit(coord, state);
        }
        Ok(())
    }

    /// Hand off delivery responsibility for every owned cell.
    ///
    /// Marks each cell currently in the ownership set as relayed and clears
    /// the set wholesale; returns the number of cells transferred. Used when
    /// this robot's relay role changes and another robot takes over
    /// delivery.
    pub fn relay_all_owned(&mut self) -> usize {
        let drained = self.ledger.drain_owned();
        let mut transferred = 0;
        for &coord in &drained {
            // Ownership membership implies in-bounds, free, unrelayed, and
            // not known at base.
            if let Some(idx) = self.coord_to_index(coord) {
                self.relay_at(idx, coord, false);
                transferred += 1;
            }
        }
        transferred
    }

    /// Recompute the ledger from the flag bytes. O(width·height); the live
    /// ledger is maintained incrementally and never recomputed. This exists
    /// as an oracle for invariant tests.
    pub fn recount(&self) -> CoverageLedger {
        let mut ledger = CoverageLedger::new();
        for (i, &bits) in self.flags.iter().enumerate() {
            let state = CellState::from_bits(bits);
            if state.is_free_space() {
                let coord = GridCoord::new((i % self.width) as i32, (i / self.width) as i32);
                ledger.credit(coord, state);
            }
        }
        ledger
    }

    // === Internal transitions ===

    fn set_free_at(&mut self, idx: usize, coord: GridCoord) {
        let prior = CellState::from_bits(self.flags[idx]);
        if !prior.is_free_space() {
            self.ledger.credit(coord, prior);
        }
        self.flags[idx] |= CellState::FREE_SPACE;
    }

    fn clear_free_at(&mut self, idx: usize, coord: GridCoord) {
        let prior = CellState::from_bits(self.flags[idx]);
        if prior.is_free_space() {
            self.ledger.debit(coord, prior);
        }
        // Safe space cannot outlive free space.
        self.flags[idx] &= !(CellState::FREE_SPACE | CellState::SAFE_SPACE);
    }

    fn relay_at(&mut self, idx: usize, coord: GridCoord, remove_from_ownership: bool) {
        let prior = CellState::from_bits(self.flags[idx]);
        if !prior.is_got_relayed() && prior.is_free_space() && !prior.is_known_at_base() {
            self.ledger.on_relayed(coord, remove_from_ownership);
        }
        self.flags[idx] |= CellState::GOT_RELAYED;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn coord(x: i32, y: i32) -> GridCoord {
        GridCoord::new(x, y)
    }

    #[test]
    fn test_empty_grid() {
        let grid = KnowledgeGrid::new(10, 5).unwrap();
        assert_eq!(grid.width(), 10);
        assert_eq!(grid.height(), 5);
        assert_eq!(grid.cell_count(), 50);
        assert_eq!(grid.free_cell_count(), 0);
        assert_eq!(grid.free_known_at_base_count(), 0);
        assert_eq!(grid.free_relayed_count(), 0);
        assert!(grid.owned_cells().is_empty());
        assert!(grid.state(coord(3, 3)).unwrap().is_blank());
    }

    #[test]
    fn test_zero_dimension_rejected() {
        assert!(KnowledgeGrid::new(0, 5).is_err());
        assert!(KnowledgeGrid::new(5, 0).is_err());
    }

    #[test]
    fn test_out_of_bounds_errors() {
        let mut grid = KnowledgeGrid::new(4, 4).unwrap();
        for bad in [coord(-1, 0), coord(0, -1), coord(4, 0), coord(0, 4)] {
            assert!(matches!(
                grid.state(bad),
                Err(GridError::OutOfBounds { .. })
            ));
            assert!(grid.set_free_space(bad).is_err());
            assert!(grid.set_obstacle(bad).is_err());
            assert!(grid.set_known_at_base(bad).is_err());
        }
        // The query-policy reads default instead.
        assert!(!grid.free_space_at(coord(-1, 0)));
        assert!(!grid.obstacle_at(coord(4, 4)));
    }

    #[test]
    fn test_safe_space_implies_free_space() {
        let mut grid = KnowledgeGrid::new(4, 4).unwrap();
        grid.set_safe_space(coord(1, 1)).unwrap();
        assert!(grid.safe_space_at(coord(1, 1)));
        assert!(grid.free_space_at(coord(1, 1)));
        assert_eq!(grid.free_cell_count(), 1);
    }

    #[test]
    fn test_obstacle_clears_free_and_safe() {
        let mut grid = KnowledgeGrid::new(3, 3).unwrap();
        grid.set_safe_space(coord(1, 1)).unwrap();
        grid.set_obstacle(coord(1, 1)).unwrap();

        assert!(grid.obstacle_at(coord(1, 1)));
        assert!(!grid.free_space_at(coord(1, 1)));
        assert!(!grid.safe_space_at(coord(1, 1)));
        assert_eq!(grid.free_cell_count(), 0);
        assert!(grid.owned_cells().is_empty());
    }

    #[test]
    fn test_obstacle_on_unknown_grid() {
        // 3x3 grid, all unknown; one obstacle observation.
        let mut grid = KnowledgeGrid::new(3, 3).unwrap();
        grid.set_obstacle(coord(1, 1)).unwrap();
        assert!(grid.obstacle_at(coord(1, 1)));
        assert!(!grid.free_space_at(coord(1, 1)));
        assert_eq!(grid.free_cell_count(), 0);
    }

    #[test]
    fn test_free_space_does_not_clear_obstacle() {
        let mut grid = KnowledgeGrid::new(3, 3).unwrap();
        grid.set_obstacle(coord(0, 0)).unwrap();
        grid.set_free_space(coord(0, 0)).unwrap();
        // Contradictory until the caller clears the obstacle explicitly.
        assert!(grid.obstacle_at(coord(0, 0)));
        assert!(grid.free_space_at(coord(0, 0)));

        grid.clear_obstacle(coord(0, 0)).unwrap();
        assert!(!grid.obstacle_at(coord(0, 0)));
        assert!(grid.free_space_at(coord(0, 0)));
    }

    #[test]
    fn test_clear_obstacle_sets_free() {
        let mut grid = KnowledgeGrid::new(3, 3).unwrap();
        grid.set_obstacle(coord(2, 2)).unwrap();
        grid.clear_obstacle(coord(2, 2)).unwrap();
        assert!(grid.free_space_at(coord(2, 2)));
        assert_eq!(grid.free_cell_count(), 1);
    }

    #[test]
    fn test_known_at_base_counts() {
        let mut grid = KnowledgeGrid::new(3, 3).unwrap();
        grid.set_free_space(coord(0, 0)).unwrap();
        grid.set_known_at_base(coord(0, 0)).unwrap();

        assert_eq!(grid.free_cell_count(), 1);
        assert_eq!(grid.free_known_at_base_count(), 1);
        assert!(grid.owned_cells().is_empty());

        // Repeat application changes nothing.
        grid.set_known_at_base(coord(0, 0)).unwrap();
        assert_eq!(grid.free_known_at_base_count(), 1);
    }

    #[test]
    fn test_known_at_base_ignored_for_unknown_cell() {
        let mut grid = KnowledgeGrid::new(3, 3).unwrap();
        grid.set_known_at_base(coord(0, 0)).unwrap();
        assert!(grid.known_at_base(coord(0, 0)));
        assert_eq!(grid.free_known_at_base_count(), 0);

        // The stale bit counts once the cell is actually observed free.
        grid.set_free_space(coord(0, 0)).unwrap();
        assert_eq!(grid.free_cell_count(), 1);
        assert_eq!(grid.free_known_at_base_count(), 1);
        assert!(grid.owned_cells().is_empty());
    }

    #[test]
    fn test_ownership_lifecycle() {
        let mut grid = KnowledgeGrid::new(3, 3).unwrap();
        grid.set_free_space(coord(0, 0)).unwrap();
        assert_eq!(grid.owned_cells().len(), 1);
        assert!(grid.owned_cells().contains(&coord(0, 0)));

        let transferred = grid.relay_all_owned();
        assert_eq!(transferred, 1);
        assert!(grid.owned_cells().is_empty());
        assert_eq!(grid.free_relayed_count(), 1);
        assert!(grid.got_relayed(coord(0, 0)));
    }

    #[test]
    fn test_unrelay_restores_ownership() {
        let mut grid = KnowledgeGrid::new(3, 3).unwrap();
        grid.set_free_space(coord(1, 0)).unwrap();
        grid.set_got_relayed(coord(1, 0), true).unwrap();
        assert_eq!(grid.free_relayed_count(), 1);
        assert!(grid.owned_cells().is_empty());

        grid.clear_got_relayed(coord(1, 0)).unwrap();
        assert_eq!(grid.free_relayed_count(), 0);
        assert!(grid.owned_cells().contains(&coord(1, 0)));
    }

    #[test]
    fn test_relay_on_known_cell_is_counter_noop() {
        let mut grid = KnowledgeGrid::new(3, 3).unwrap();
        grid.set_free_space(coord(0, 1)).unwrap();
        grid.set_known_at_base(coord(0, 1)).unwrap();
        grid.set_got_relayed(coord(0, 1), true).unwrap();

        assert!(grid.got_relayed(coord(0, 1)));
        assert_eq!(grid.free_relayed_count(), 0);
        assert_eq!(grid.free_known_at_base_count(), 1);
    }

    #[test]
    fn test_set_state_keeps_ledger_exact() {
        let mut grid = KnowledgeGrid::new(4, 4).unwrap();
        grid.set_free_space(coord(0, 0)).unwrap();

        let relayed_free = CellState::blank()
            .with(CellState::FREE_SPACE)
            .with(CellState::GOT_RELAYED);
        grid.set_state(coord(0, 0), relayed_free).unwrap();
        grid.set_state(coord(1, 1), relayed_free).unwrap();
        grid.set_state(
            coord(2, 2),
            CellState::blank().with(CellState::OBSTACLE),
        )
        .unwrap();

        assert_eq!(grid.ledger(), &grid.recount());
        assert_eq!(grid.free_cell_count(), 2);
        assert_eq!(grid.free_relayed_count(), 2);
        assert!(grid.owned_cells().is_empty());
    }

    #[test]
    fn test_final_topological_is_advisory() {
        let mut grid = KnowledgeGrid::new(3, 3).unwrap();
        grid.set_final_topological(coord(2, 0)).unwrap();
        assert!(grid.final_topological_at(coord(2, 0)));
        assert_eq!(grid.free_cell_count(), 0);

        grid.clear_final_topological(coord(2, 0)).unwrap();
        assert!(!grid.final_topological_at(coord(2, 0)));
    }

    #[test]
    fn test_flags_raw_bit_order() {
        let mut grid = KnowledgeGrid::new(2, 1).unwrap();
        grid.set_safe_space(coord(0, 0)).unwrap();
        grid.set_obstacle(coord(1, 0)).unwrap();
        assert_eq!(
            grid.flags_raw(),
            &[
                CellState::FREE_SPACE | CellState::SAFE_SPACE,
                CellState::OBSTACLE
            ]
        );
    }

    #[test]
    fn test_recount_matches_live_ledger() {
        let mut grid = KnowledgeGrid::new(5, 5).unwrap();
        for x in 0..5 {
            grid.set_free_space(coord(x, 0)).unwrap();
        }
        grid.set_known_at_base(coord(0, 0)).unwrap();
        grid.set_got_relayed(coord(1, 0), true).unwrap();
        grid.set_obstacle(coord(2, 0)).unwrap();

        assert_eq!(grid.ledger(), &grid.recount());
    }
}
