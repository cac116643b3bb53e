//! Compile-time sizing of the search space.
//!
//! These bounds size the bit-packed closed set (`MAX_MAP_HEIGHT *
//! MAX_MAP_WIDTH * MAX_INFO` bits, about 90 MB at the values below) and
//! back the range checks performed by the loaders.

/// Number of discrete headings an agent can point at.
pub const ANGLE_NUM: i32 = 16;

/// Upper bound on configuration-type identifiers in a type table.
pub const MAX_TYPES: usize = 1500;

/// Upper bound on scenarios run per map by the benchmark driver.
pub const MAX_TESTS: usize = 10_000;

/// Maximum dimensions of a loadable map.
pub const MAX_MAP_WIDTH: i32 = 1200;
pub const MAX_MAP_HEIGHT: i32 = 1200;

/// Upper bound on distinct merge-info values in a type table.
///
/// Must be at least `ANGLE_NUM`: the bit-packed closed set indexes lattice
/// states by heading and type cells by merge info through the same slot.
pub const MAX_INFO: i32 = 500;

const _: () = assert!(MAX_INFO >= ANGLE_NUM);
