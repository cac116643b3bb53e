//! Search core for kinematically constrained path planning on 2D
//! occupancy grids.
//!
//! An agent with a discrete heading moves by replaying precomputed motion
//! primitives (a control set). Trajectories are found by A* over one of
//! two graphs:
//!
//! - the **state lattice**, whose vertices are `(i, j, heading)` states
//!   and whose edges are primitives (optimal under an admissible
//!   heuristic);
//! - the **type graph**, whose vertices are `(i, j, type)` cells obtained
//!   by coalescing lattice states of equal local structure (faster, not
//!   guaranteed optimal).
//!
//! [`astar::parall`] interleaves both searches and returns whichever
//! reaches a goal first.
//!
//! Search records (vertices and A* nodes) live in an [`arena::Arena`] and
//! are passed around as typed integer handles; see the module docs for
//! the ownership rules.

pub mod arena;
pub mod astar;
pub mod limits;
pub mod map;
pub mod metrics;
pub mod params;
pub mod primitives;
pub mod query;
pub mod scenario;
pub mod tree;
pub mod typeinfo;
