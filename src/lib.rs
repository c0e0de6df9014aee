//! # Veda-Map: Per-Robot Spatial Knowledge Grid
//!
//! A knowledge map for multi-robot exploration: each robot owns one
//! [`KnowledgeGrid`] recording, per cell, what it knows about the
//! environment (free, safe, obstacle), whether that knowledge has reached
//! the base station, and whether another robot is currently relaying it
//! there.
//!
//! ## Quick Start
//!
//! ```rust
//! use veda_map::{GridCoord, KnowledgeGrid};
//! use veda_map::query;
//!
//! let mut grid = KnowledgeGrid::new(20, 10).unwrap();
//!
//! // Sensor sweep: a free corridor with a wall cell.
//! for x in 0..5 {
//!     grid.set_free_space(GridCoord::new(x, 1)).unwrap();
//! }
//! grid.set_obstacle(GridCoord::new(5, 1)).unwrap();
//!
//! // The robot now owes these five cells to the base station.
//! assert_eq!(grid.owned_cells().len(), 5);
//!
//! // Frontier cells drive exploration-target selection.
//! assert!(query::is_frontier_cell(&grid, GridCoord::new(4, 1)));
//!
//! // Another robot takes over delivery.
//! let transferred = grid.relay_all_owned();
//! assert_eq!(transferred, 5);
//! assert!(grid.owned_cells().is_empty());
//! ```
//!
//! ## Coordinate Frame
//!
//! Integer cell coordinates: `(0, 0)` is the first cell, X grows rightward
//! (column index), Y grows upward (row index). The grid is sized once at
//! construction and never resized.
//!
//! ## Architecture
//!
//! - [`core`]: fundamental types ([`CellState`] flag bytes, [`GridCoord`])
//! - [`grid`]: the [`KnowledgeGrid`] store, the [`CoverageLedger`]
//!   aggregates maintained in lock-step with every mutation, construction
//!   [`GridConfig`], and the contact-time merge
//! - [`query`]: read-only spatial queries (frontier detection, visibility,
//!   ray counting)
//!
//! ## Consistency Model
//!
//! The ledger's counters and ownership set are updated transactionally
//! inside every mutator, never recomputed; at per-tick sensor volumes a
//! recount per query would dominate the simulation. Mutations on one grid
//! must be serialized by the caller (they take `&mut self`). Read-only
//! queries may run concurrently with each other; planners doing long
//! read-heavy scans should `clone()` the grid and work on the copy.

pub mod core;
pub mod grid;
pub mod query;

// Re-export main types at crate root
pub use crate::core::{CellState, GridCoord};
pub use crate::grid::{ConfigError, CoverageLedger, GridConfig, GridError, KnowledgeGrid};
