//! Per-cell knowledge flags.
//!
//! Each cell of the knowledge grid is a single byte of independent flags.
//! The bit order is part of the external interface: the logging collaborator
//! serializes raw flag bytes, and anything that decodes them relies on this
//! layout.

use serde::{Deserialize, Serialize};

/// Flag set for a single grid cell.
///
/// Bit layout (bits 6-7 are reserved and always zero):
///
/// | bit | flag                  |
/// |-----|-----------------------|
/// | 0   | free space            |
/// | 1   | safe space            |
/// | 2   | obstacle              |
/// | 3   | known at base         |
/// | 4   | got relayed           |
/// | 5   | final topological map |
///
/// The flags are independent bits, but the grid mutators maintain two
/// relationships between them: safe space implies free space, and setting an
/// obstacle clears free space. Setting free space does *not* clear an
/// obstacle flag; callers correcting an obstacle observation must clear it
/// explicitly (see [`KnowledgeGrid::clear_obstacle`]).
///
/// [`KnowledgeGrid::clear_obstacle`]: crate::grid::KnowledgeGrid::clear_obstacle
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CellState(u8);

impl CellState {
    /// Observed traversable.
    pub const FREE_SPACE: u8 = 1 << 0;
    /// Observed traversable at close range.
    pub const SAFE_SPACE: u8 = 1 << 1;
    /// Observed blocked.
    pub const OBSTACLE: u8 = 1 << 2;
    /// The base station has received this cell's state.
    pub const KNOWN_AT_BASE: u8 = 1 << 3;
    /// Another robot is carrying this cell's state toward the base station.
    pub const GOT_RELAYED: u8 = 1 << 4;
    /// Frozen for topological-map recomputation. Advisory only.
    pub const FINAL_TOPOLOGICAL_MAP: u8 = 1 << 5;

    /// Every defined flag bit.
    pub const ALL: u8 = Self::FREE_SPACE
        | Self::SAFE_SPACE
        | Self::OBSTACLE
        | Self::KNOWN_AT_BASE
        | Self::GOT_RELAYED
        | Self::FINAL_TOPOLOGICAL_MAP;

    /// The four knowledge flags compared during a merge. Relay state and the
    /// advisory flag are excluded: two grids can legitimately disagree on
    /// who is relaying a cell.
    pub const KNOWLEDGE_MASK: u8 =
        Self::FREE_SPACE | Self::SAFE_SPACE | Self::OBSTACLE | Self::KNOWN_AT_BASE;

    /// A cell with no flags set.
    #[inline]
    pub const fn blank() -> Self {
        Self(0)
    }

    /// Reconstruct from a raw flag byte. Reserved bits 6-7 are dropped.
    #[inline]
    pub const fn from_bits(bits: u8) -> Self {
        Self(bits & Self::ALL)
    }

    /// The raw flag byte.
    #[inline]
    pub const fn bits(self) -> u8 {
        self.0
    }

    /// True if every bit of `mask` is set.
    #[inline]
    pub const fn contains(self, mask: u8) -> bool {
        self.0 & mask == mask
    }

    /// This state with the bits of `mask` added.
    #[inline]
    #[must_use]
    pub const fn with(self, mask: u8) -> Self {
        Self(self.0 | (mask & Self::ALL))
    }

    /// This state with the bits of `mask` removed.
    #[inline]
    #[must_use]
    pub const fn without(self, mask: u8) -> Self {
        Self(self.0 & !mask)
    }

    /// No flags at all: the cell has never been observed.
    #[inline]
    pub const fn is_blank(self) -> bool {
        self.0 == 0
    }

    /// Observed traversable.
    #[inline]
    pub const fn is_free_space(self) -> bool {
        self.contains(Self::FREE_SPACE)
    }

    /// Observed traversable at close range.
    #[inline]
    pub const fn is_safe_space(self) -> bool {
        self.contains(Self::SAFE_SPACE)
    }

    /// Observed blocked.
    #[inline]
    pub const fn is_obstacle(self) -> bool {
        self.contains(Self::OBSTACLE)
    }

    /// Already delivered to the base station.
    #[inline]
    pub const fn is_known_at_base(self) -> bool {
        self.contains(Self::KNOWN_AT_BASE)
    }

    /// Currently being carried toward base by another robot.
    #[inline]
    pub const fn is_got_relayed(self) -> bool {
        self.contains(Self::GOT_RELAYED)
    }

    /// Frozen for topological-map recomputation.
    #[inline]
    pub const fn is_final_topological(self) -> bool {
        self.contains(Self::FINAL_TOPOLOGICAL_MAP)
    }

    /// The knowledge bits used as the merge comparison key.
    #[inline]
    pub const fn knowledge_bits(self) -> u8 {
        self.0 & Self::KNOWLEDGE_MASK
    }

    /// Single character representation for debugging.
    pub fn as_char(self) -> char {
        if self.is_obstacle() {
            '#'
        } else if self.is_safe_space() {
            '+'
        } else if self.is_free_space() {
            '.'
        } else {
            '?'
        }
    }
}
