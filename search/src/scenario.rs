//! MovingAI `.scen` scenario loading.
//!
//! A scenario row supplies start and goal cells; headings are not part
//! of the format, so each row is expanded into `samples` queries with
//! headings drawn from a seeded generator — reruns see the same suite.

use crate::limits::ANGLE_NUM;
use crate::query::Pose;
use anyhow::{Context, Result};
use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};
use std::io::BufRead;
use std::path::Path;
use tracing::debug;

/// One planning query: find a trajectory from `start` to `goal`.
#[derive(Clone, Copy, Debug)]
pub struct Scenario {
    pub start: Pose,
    pub goal: Pose,
}

pub fn load_scenarios(path: impl AsRef<Path>, samples: usize, seed: u64) -> Result<Vec<Scenario>> {
    let path = path.as_ref();
    let file = std::fs::File::open(path)
        .with_context(|| format!("cannot open scenario file {}", path.display()))?;
    let scenarios = parse_scenarios(std::io::BufReader::new(file), samples, seed)
        .with_context(|| format!("malformed scenario file {}", path.display()))?;
    debug!(scenarios = scenarios.len(), "loaded scenario suite");
    Ok(scenarios)
}

pub fn parse_scenarios(reader: impl BufRead, samples: usize, seed: u64) -> Result<Vec<Scenario>> {
    let mut rng = SmallRng::seed_from_u64(seed);
    let mut scenarios = Vec::new();

    // the first line carries the format version only
    for line in reader.lines().skip(1) {
        let line = line?;
        if line.is_empty() {
            continue;
        }
        let mut it = line.split_whitespace().skip(4);
        let mut next = |what: &str| -> Result<i32> {
            it.next()
                .and_then(|raw| raw.parse().ok())
                .with_context(|| format!("expected {} in scenario line {:?}", what, line))
        };
        // cells come column first
        let (start_j, start_i) = (next("start column")?, next("start row")?);
        let (goal_j, goal_i) = (next("goal column")?, next("goal row")?);

        for _ in 0..samples {
            let start_theta = rng.random_range(0..ANGLE_NUM);
            let goal_theta = rng.random_range(0..ANGLE_NUM);
            scenarios.push(Scenario {
                start: Pose::new(start_i, start_j, start_theta),
                goal: Pose::new(goal_i, goal_j, goal_theta),
            });
        }
    }

    Ok(scenarios)
}
