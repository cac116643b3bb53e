//! Occupancy grid and the MovingAI `.map` loader.

use crate::limits::{MAX_MAP_HEIGHT, MAX_MAP_WIDTH};
use anyhow::{ensure, Context, Result};
use std::io::BufRead;
use std::path::Path;
use tracing::debug;

/// A rectangular grid of cells, each either free or blocked.
#[derive(Clone)]
pub struct Grid {
    /// Row-major occupancy; `true` means blocked.
    cells: Vec<bool>,
    height: i32,
    width: i32,
}

impl Grid {
    /// An all-free grid of the given dimensions.
    pub fn empty(height: i32, width: i32) -> Grid {
        assert!(height > 0 && width > 0);
        Grid {
            cells: vec![false; (height * width) as usize],
            height,
            width,
        }
    }

    pub fn height(&self) -> i32 {
        self.height
    }

    pub fn width(&self) -> i32 {
        self.width
    }

    /// Marks cell `(i, j)` as blocked.
    pub fn block(&mut self, i: i32, j: i32) {
        assert!(self.in_bounds(i, j));
        let w = self.width;
        self.cells[(i * w + j) as usize] = true;
    }

    pub fn in_bounds(&self, i: i32, j: i32) -> bool {
        (0..self.height).contains(&i) && (0..self.width).contains(&j)
    }

    /// Whether cell `(i, j)` is free. Callers must have checked
    /// `in_bounds` first.
    pub fn traversable(&self, i: i32, j: i32) -> bool {
        debug_assert!(self.in_bounds(i, j));
        !self.cells[(i * self.width + j) as usize]
    }

    /// Reads a map in the MovingAI format: a `type ...` header line plus
    /// three more header lines, then rows of `.` (free) and `#`/`@`/`T`
    /// (blocked) characters. Blank lines and unknown characters are
    /// skipped. With `keep_obstacles = false` every body cell loads as
    /// free.
    pub fn load(path: impl AsRef<Path>, keep_obstacles: bool) -> Result<Grid> {
        let path = path.as_ref();
        let file = std::fs::File::open(path)
            .with_context(|| format!("cannot open map file {}", path.display()))?;
        let grid = Self::parse(std::io::BufReader::new(file), keep_obstacles)
            .with_context(|| format!("malformed map file {}", path.display()))?;
        debug!(
            height = grid.height,
            width = grid.width,
            "loaded occupancy grid"
        );
        Ok(grid)
    }

    pub fn parse(reader: impl BufRead, keep_obstacles: bool) -> Result<Grid> {
        let mut lines = reader.lines();
        let mut rows: Vec<Vec<bool>> = Vec::new();

        while let Some(line) = lines.next() {
            let line = line?;
            if line.starts_with("type") {
                // Three more header lines (dimensions and the "map"
                // marker) follow; the body is self-describing.
                for _ in 0..3 {
                    lines.next().transpose()?;
                }
                continue;
            }
            if line.is_empty() {
                continue;
            }

            let mut row = Vec::with_capacity(line.len());
            for c in line.chars() {
                match c {
                    '.' => row.push(false),
                    '#' | '@' | 'T' => row.push(keep_obstacles),
                    _ => {}
                }
            }
            if let Some(first) = rows.first() {
                ensure!(
                    first.len() == row.len(),
                    "rows must all have the same length (got {} and {})",
                    first.len(),
                    row.len()
                );
            }
            rows.push(row);
        }

        ensure!(!rows.is_empty(), "map has no body rows");
        let height = rows.len() as i32;
        let width = rows[0].len() as i32;
        ensure!(
            height < MAX_MAP_HEIGHT && width < MAX_MAP_WIDTH,
            "map of {}x{} exceeds the {}x{} limit",
            height,
            width,
            MAX_MAP_HEIGHT,
            MAX_MAP_WIDTH
        );

        Ok(Grid {
            cells: rows.into_iter().flatten().collect(),
            height,
            width,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    const MAP: &str = "\
type octile
height 3
width 4
map
.#..

..@T
.T..
";

    #[test]
    fn parses_movingai_body() {
        let g = Grid::parse(Cursor::new(MAP), true).unwrap();
        assert_eq!((g.height(), g.width()), (3, 4));
        assert!(!g.traversable(0, 1));
        assert!(!g.traversable(1, 2));
        assert!(!g.traversable(1, 3));
        assert!(!g.traversable(2, 1));
        assert!(g.traversable(0, 0));
        assert!(g.traversable(2, 3));
    }

    #[test]
    fn obstacle_suppression_loads_all_free() {
        let g = Grid::parse(Cursor::new(MAP), false).unwrap();
        for i in 0..3 {
            for j in 0..4 {
                assert!(g.traversable(i, j));
            }
        }
    }

    #[test]
    fn ragged_rows_rejected() {
        let bad = "type octile\nh\nw\nmap\n...\n....\n";
        assert!(Grid::parse(Cursor::new(bad), true).is_err());
    }

    #[test]
    fn bounds() {
        let g = Grid::empty(2, 3);
        assert!(g.in_bounds(0, 0) && g.in_bounds(1, 2));
        assert!(!g.in_bounds(-1, 0) && !g.in_bounds(0, 3) && !g.in_bounds(2, 0));
    }
}
