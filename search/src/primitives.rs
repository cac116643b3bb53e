//! Motion primitives and the control-set file loader.

use crate::limits::ANGLE_NUM;
use anyhow::{bail, ensure, Context, Result};
use std::io::BufRead;
use std::path::Path;
use tracing::debug;

/// Displacement a primitive applies to the state it starts from.
#[derive(Clone, Copy, Debug, Default)]
pub struct Displacement {
    pub di: i32,
    pub dj: i32,
    /// Heading at the end of the primitive.
    pub theta: i32,
}

/// A precomputed short trajectory starting at cell `(0, 0)` under a fixed
/// heading. Replayed by translation during the lattice search.
#[derive(Clone, Debug)]
pub struct Primitive {
    /// Heading the primitive starts under.
    pub start_theta: i32,
    pub goal: Displacement,
    /// Cells swept while executing the primitive, in travel order and
    /// relative to the start cell.
    pub trace: Vec<(i32, i32)>,
    /// Arc length, as produced by the primitive generator.
    pub length: f64,
    /// Cost of walking the collision trace: 1 per side step, `sqrt(2)`
    /// per diagonal step.
    pub collision_cost: f64,
    /// Net heading change over the primitive.
    pub turning: i32,
}

impl Primitive {
    /// Cost of walking `trace` cell to cell.
    pub fn trace_cost(trace: &[(i32, i32)]) -> f64 {
        trace
            .windows(2)
            .map(|w| {
                let di = (w[1].0 - w[0].0) as f64;
                let dj = (w[1].1 - w[0].1) as f64;
                (di * di + dj * dj).sqrt()
            })
            .sum()
    }
}

/// The control set: all primitives, grouped by starting heading.
pub struct ControlSet {
    by_heading: Vec<Vec<Primitive>>,
}

impl Default for ControlSet {
    fn default() -> Self {
        Self::new()
    }
}

impl ControlSet {
    pub fn new() -> ControlSet {
        ControlSet {
            by_heading: (0..ANGLE_NUM).map(|_| Vec::new()).collect(),
        }
    }

    pub fn insert(&mut self, prim: Primitive) {
        assert!((0..ANGLE_NUM).contains(&prim.start_theta));
        self.by_heading[prim.start_theta as usize].push(prim);
    }

    pub fn by_heading(&self, theta: i32) -> &[Primitive] {
        debug_assert!((0..ANGLE_NUM).contains(&theta));
        &self.by_heading[theta as usize]
    }

    pub fn len(&self) -> usize {
        self.by_heading.iter().map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Loads a control-set file produced by the primitive generator.
    ///
    /// Primitives arrive as `===== prim description: =====` records whose
    /// body lines carry the start heading, goal displacement, length,
    /// turning, a trajectory polyline (ignored here) and the collision
    /// trace. `length` and `turning` are taken from the file as is;
    /// `collision_cost` is recomputed from the trace.
    pub fn load(path: impl AsRef<Path>) -> Result<ControlSet> {
        let path = path.as_ref();
        let file = std::fs::File::open(path)
            .with_context(|| format!("cannot open control-set file {}", path.display()))?;
        let set = Self::parse(std::io::BufReader::new(file))
            .with_context(|| format!("malformed control-set file {}", path.display()))?;
        debug!(primitives = set.len(), "loaded control set");
        Ok(set)
    }

    pub fn parse(reader: impl BufRead) -> Result<ControlSet> {
        let mut set = ControlSet::new();
        let mut lines = reader.lines();

        let mut draft: Option<Primitive> = None;
        while let Some(line) = lines.next() {
            let line = line?;

            if line.starts_with("===== prim description: =====") {
                draft = Some(Primitive {
                    start_theta: 0,
                    goal: Displacement::default(),
                    trace: Vec::new(),
                    length: 0.0,
                    collision_cost: 0.0,
                    turning: 0,
                });
                continue;
            }

            if line.starts_with("prim end") {
                if let Some(mut prim) = draft.take() {
                    prim.collision_cost = Primitive::trace_cost(&prim.trace);
                    set.insert(prim);
                }
                continue;
            }

            let Some(prim) = draft.as_mut() else {
                continue;
            };

            if line.starts_with("start heading (number):") {
                prim.start_theta = token(&line, 3)?;
                ensure!(
                    (0..ANGLE_NUM).contains(&prim.start_theta),
                    "start heading {} out of range",
                    prim.start_theta
                );
            } else if line.starts_with("goal state (i, j, heading num):") {
                prim.goal.di = token(&line, 6)?;
                prim.goal.dj = token(&line, 7)?;
                prim.goal.theta = token(&line, 8)?;
                ensure!(
                    (0..ANGLE_NUM).contains(&prim.goal.theta),
                    "goal heading {} out of range",
                    prim.goal.theta
                );
            } else if line.starts_with("length is:") {
                prim.length = token(&line, 2)?;
            } else if line.starts_with("turning on:") {
                prim.turning = token(&line, 2)?;
            } else if line.starts_with("trajectory is:") {
                // Plot support only; the search never looks at it.
                skip_until_dashes(&mut lines)?;
            } else if line.starts_with("collision is:") {
                loop {
                    let Some(cell) = lines.next().transpose()? else {
                        bail!("collision trace not terminated");
                    };
                    if cell.starts_with("---") {
                        break;
                    }
                    let mut it = cell.split_whitespace();
                    let i = parse_next(&mut it, &cell)?;
                    let j = parse_next(&mut it, &cell)?;
                    prim.trace.push((i, j));
                }
            }
        }

        Ok(set)
    }
}

fn token<T: std::str::FromStr>(line: &str, index: usize) -> Result<T> {
    let raw = line
        .split_whitespace()
        .nth(index)
        .with_context(|| format!("token {} missing in line {:?}", index, line))?;
    raw.parse()
        .ok()
        .with_context(|| format!("token {:?} in line {:?} not a number", raw, line))
}

fn parse_next<'a, T: std::str::FromStr>(
    it: &mut impl Iterator<Item = &'a str>,
    line: &str,
) -> Result<T> {
    it.next()
        .and_then(|raw| raw.parse().ok())
        .with_context(|| format!("expected number in line {:?}", line))
}

fn skip_until_dashes(lines: &mut impl Iterator<Item = std::io::Result<String>>) -> Result<()> {
    for line in lines {
        if line?.starts_with("---") {
            return Ok(());
        }
    }
    bail!("record section not terminated by ---")
}
