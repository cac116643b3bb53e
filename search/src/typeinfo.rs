//! Static tables describing the type graph.
//!
//! A *type* numbers the local configuration a lattice state sits in; type
//! cells `(i, j, type)` form a coarser graph than the lattice. Each type
//! additionally carries a *merge info* value: cells agreeing on
//! `(i, j, info)` are coalesced during the search, which is where the
//! speedup of the type formulation comes from.

use crate::limits::{ANGLE_NUM, MAX_INFO, MAX_TYPES};
use anyhow::{bail, ensure, Context, Result};
use fixedbitset::FixedBitSet;
use hashbrown::HashMap;
use smallvec::SmallVec;
use std::io::BufRead;
use std::path::Path;
use tracing::debug;

/// Which headings have a primitive terminating in cells of a given type.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum GoalHeading {
    /// No primitive ends in this type; its cells never satisfy a goal
    /// test and are skipped over by reconstructed parent chains.
    None,
    /// Exactly one terminating heading.
    Single(i32),
    /// Several distinct terminating headings; the per-heading table has
    /// the details.
    Multiple,
}

/// One outgoing edge of a type: relative cell offset plus successor type.
#[derive(Clone, Copy, Debug)]
pub struct TypeEdge {
    pub di: i32,
    pub dj: i32,
    pub to: i32,
}

pub struct TypeInfo {
    /// Outgoing edges per type.
    successors: Vec<SmallVec<[TypeEdge; 8]>>,
    /// Type of the cell an agent starts in, by its heading; -1 when the
    /// table never declared one.
    start_type_by_theta: Vec<i32>,
    /// Flat `theta * MAX_TYPES + type` bits: does a primitive with final
    /// heading `theta` end in a cell of `type`?
    goal_bits: FixedBitSet,
    goal_heading_by_type: Vec<GoalHeading>,
    /// Merge key per type.
    add_info_by_type: Vec<i32>,
}

impl Default for TypeInfo {
    fn default() -> Self {
        Self::new()
    }
}

impl TypeInfo {
    pub fn new() -> TypeInfo {
        TypeInfo {
            successors: (0..MAX_TYPES).map(|_| SmallVec::new()).collect(),
            start_type_by_theta: vec![-1; ANGLE_NUM as usize],
            goal_bits: FixedBitSet::with_capacity(ANGLE_NUM as usize * MAX_TYPES),
            goal_heading_by_type: vec![GoalHeading::None; MAX_TYPES],
            add_info_by_type: vec![0; MAX_TYPES],
        }
    }

    pub fn successors_of(&self, cell_type: i32) -> &[TypeEdge] {
        &self.successors[check_type(cell_type)]
    }

    pub fn start_type(&self, theta: i32) -> i32 {
        debug_assert!((0..ANGLE_NUM).contains(&theta));
        let t = self.start_type_by_theta[theta as usize];
        debug_assert!(t >= 0, "no start type declared for heading {theta}");
        t
    }

    pub fn goal_heading(&self, cell_type: i32) -> GoalHeading {
        self.goal_heading_by_type[check_type(cell_type)]
    }

    pub fn is_goal(&self, theta: i32, cell_type: i32) -> bool {
        debug_assert!((0..ANGLE_NUM).contains(&theta));
        self.goal_bits
            .contains(theta as usize * MAX_TYPES + check_type(cell_type))
    }

    pub fn merge_info(&self, cell_type: i32) -> i32 {
        self.add_info_by_type[check_type(cell_type)]
    }

    pub fn set_start_type(&mut self, theta: i32, cell_type: i32) {
        assert!((0..ANGLE_NUM).contains(&theta));
        self.start_type_by_theta[theta as usize] = check_type(cell_type) as i32;
    }

    /// Records that a primitive with final heading `theta` ends in cells
    /// of `cell_type`. The first recorded heading makes the type a
    /// single-heading goal; any further distinct one demotes it to
    /// `Multiple`.
    pub fn record_goal(&mut self, theta: i32, cell_type: i32) {
        assert!((0..ANGLE_NUM).contains(&theta));
        let t = check_type(cell_type);
        self.goal_bits.insert(theta as usize * MAX_TYPES + t);
        self.goal_heading_by_type[t] = match self.goal_heading_by_type[t] {
            GoalHeading::None => GoalHeading::Single(theta),
            _ => GoalHeading::Multiple,
        };
    }

    pub fn add_successor(&mut self, cell_type: i32, edge: TypeEdge) {
        check_type(edge.to);
        self.successors[check_type(cell_type)].push(edge);
    }

    pub fn set_merge_info(&mut self, cell_type: i32, info: i32) {
        assert!((0..MAX_INFO).contains(&info));
        self.add_info_by_type[check_type(cell_type)] = info;
    }

    /// Loads a type table produced by the configuration numbering step.
    ///
    /// Merge-info strings are interned in order of first appearance,
    /// starting at 0; the distinct-string count must stay below
    /// `MAX_INFO`.
    pub fn load(path: impl AsRef<Path>) -> Result<TypeInfo> {
        let path = path.as_ref();
        let file = std::fs::File::open(path)
            .with_context(|| format!("cannot open type-table file {}", path.display()))?;
        let info = Self::parse(std::io::BufReader::new(file))
            .with_context(|| format!("malformed type-table file {}", path.display()))?;
        debug!("loaded type table");
        Ok(info)
    }

    pub fn parse(reader: impl BufRead) -> Result<TypeInfo> {
        let mut info = TypeInfo::new();
        let mut interner: HashMap<String, i32> = HashMap::new();
        let mut lines = reader.lines();

        while let Some(line) = lines.next() {
            let line = line?;

            if line.starts_with("control-set-start with theta:") {
                let theta: i32 = token(&line, 3)?;
                let cell_type: i32 = token(&line, 6)?;
                ensure_theta(theta)?;
                ensure_type(cell_type)?;
                info.set_start_type(theta, cell_type);
            } else if line.starts_with("in goal type:") {
                let cell_type: i32 = token(&line, 3)?;
                ensure_type(cell_type)?;
                for raw in line.split_whitespace().skip(9) {
                    let theta: i32 = raw
                        .parse()
                        .ok()
                        .with_context(|| format!("bad heading {:?} in line {:?}", raw, line))?;
                    ensure_theta(theta)?;
                    info.record_goal(theta, cell_type);
                }
            } else if line.starts_with("start type is:") {
                let cell_type: i32 = token(&line, 3)?;
                ensure_type(cell_type)?;
                loop {
                    let Some(edge) = lines.next().transpose()? else {
                        bail!("successor list of type {} not terminated", cell_type);
                    };
                    if edge.starts_with("---") {
                        break;
                    }
                    let mut it = edge.split_whitespace();
                    let mut next = |what: &str| {
                        it.next()
                            .and_then(|raw| raw.parse::<i32>().ok())
                            .with_context(|| format!("expected {} in line {:?}", what, edge))
                    };
                    let (di, dj, to) = (next("di")?, next("dj")?, next("type")?);
                    ensure_type(to)?;
                    info.add_successor(cell_type, TypeEdge { di, dj, to });
                }
            } else if line.starts_with("add_info for type:") {
                let cell_type: i32 = token(&line, 3)?;
                ensure_type(cell_type)?;
                let raw = rest_after_tokens(&line, 5);
                let next_id = interner.len() as i32;
                let id = *interner.entry(raw.to_owned()).or_insert(next_id);
                ensure!(
                    id < MAX_INFO,
                    "more than {} distinct merge-info strings",
                    MAX_INFO
                );
                info.set_merge_info(cell_type, id);
            }
        }

        Ok(info)
    }
}

fn check_type(cell_type: i32) -> usize {
    debug_assert!(
        (0..MAX_TYPES as i32).contains(&cell_type),
        "type {cell_type} out of range"
    );
    cell_type as usize
}

fn ensure_theta(theta: i32) -> Result<()> {
    ensure!(
        (0..ANGLE_NUM).contains(&theta),
        "heading {} out of range",
        theta
    );
    Ok(())
}

fn ensure_type(cell_type: i32) -> Result<()> {
    ensure!(
        (0..MAX_TYPES as i32).contains(&cell_type),
        "type {} out of range",
        cell_type
    );
    Ok(())
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

/// The remainder of `line` after its first `n` whitespace-separated
/// tokens, with the separating whitespace of the remainder preserved.
fn rest_after_tokens(line: &str, n: usize) -> &str {
    let mut seen = 0;
    let mut in_token = false;
    for (pos, c) in line.char_indices() {
        if c.is_whitespace() {
            if in_token {
                seen += 1;
                in_token = false;
            }
        } else {
            if seen == n {
                return &line[pos..];
            }
            in_token = true;
        }
    }
    ""
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    const TYPE_TABLE: &str = "\
control-set-start with theta: 0 of type: 7
control-set-start with theta: 1 of type: 8
in goal type: 7 the final thetas are : 0
in goal type: 9 the final thetas are : 2 5
start type is: 7
0 1 8
1 1 9
---
start type is: 8
-1 0 7
---
add_info for type: 7 is: cfg-a
add_info for type: 8 is: cfg-b
add_info for type: 9 is: cfg-a
";

    #[test]
    fn parses_tables() {
        let info = TypeInfo::parse(Cursor::new(TYPE_TABLE)).unwrap();

        assert_eq!(info.start_type(0), 7);
        assert_eq!(info.start_type(1), 8);

        assert_eq!(info.goal_heading(7), GoalHeading::Single(0));
        assert_eq!(info.goal_heading(9), GoalHeading::Multiple);
        assert_eq!(info.goal_heading(8), GoalHeading::None);
        assert!(info.is_goal(0, 7));
        assert!(info.is_goal(2, 9) && info.is_goal(5, 9));
        assert!(!info.is_goal(1, 7));

        let succ = info.successors_of(7);
        assert_eq!(succ.len(), 2);
        assert_eq!((succ[1].di, succ[1].dj, succ[1].to), (1, 1, 9));
        assert_eq!(info.successors_of(8).len(), 1);

        // interned first-seen: cfg-a -> 0, cfg-b -> 1, cfg-a reused
        assert_eq!(info.merge_info(7), 0);
        assert_eq!(info.merge_info(8), 1);
        assert_eq!(info.merge_info(9), 0);
    }

    #[test]
    fn second_goal_heading_demotes_to_multiple() {
        let mut info = TypeInfo::new();
        info.record_goal(3, 5);
        assert_eq!(info.goal_heading(5), GoalHeading::Single(3));
        info.record_goal(4, 5);
        assert_eq!(info.goal_heading(5), GoalHeading::Multiple);
    }

    #[test]
    fn rest_after_tokens_keeps_inner_spacing() {
        assert_eq!(rest_after_tokens("a b c d  e  f g", 5), "f g");
        assert_eq!(rest_after_tokens("a b", 5), "");
    }
}
