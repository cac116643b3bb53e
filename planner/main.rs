use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use latplan::arena::{Arena, VertexKind};
use latplan::astar::{parall, search, SearchOutcome};
use latplan::limits::{ANGLE_NUM, MAX_TESTS};
use latplan::map::Grid;
use latplan::params::{CostModel, LatticeParams, SearchParams, TypeParams};
use latplan::primitives::ControlSet;
use latplan::query::{GoalTolerance, Pose};
use latplan::scenario::{load_scenarios, Scenario};
use latplan::typeinfo::TypeInfo;
use std::fs::File;
use std::io::Write;
use std::path::PathBuf;
use std::time::Instant;

/// Trajectory search on state lattices and type graphs.
#[derive(Debug, Parser)]
#[command(name = "latplan", rename_all = "kebab-case")]
struct Opt {
    #[command(subcommand)]
    command: Command,

    /// Log level for diagnostics on stderr.
    #[arg(long, global = true, default_value = "info")]
    log_level: tracing::Level,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Runs the full algorithm suite over a scenario file and records
    /// one result block per query.
    Bench(BenchArgs),
    /// Searches a single trajectory and dumps its state chain.
    Query(QueryArgs),
}

#[derive(Debug, clap::Args)]
struct BenchArgs {
    /// MovingAI map file.
    map: PathBuf,
    /// MovingAI scenario file matching the map.
    scenarios: PathBuf,
    /// Control-set file with the motion primitives.
    #[arg(long = "prims")]
    control_set: PathBuf,
    /// Type table matching the control set.
    #[arg(long = "types")]
    type_table: PathBuf,
    /// Where to write the result blocks.
    #[arg(short, long)]
    output: PathBuf,
    /// Headings sampled per scenario row.
    #[arg(long, default_value_t = 3)]
    samples: usize,
    /// Seed for the heading sampler.
    #[arg(long, default_value_t = 12345)]
    seed: u64,
}

#[derive(Debug, clap::Args)]
struct QueryArgs {
    /// MovingAI map file.
    map: PathBuf,
    /// Control-set file; required by the lattice algorithms.
    #[arg(long = "prims")]
    control_set: Option<PathBuf>,
    /// Type table; required by the type-graph algorithm.
    #[arg(long = "types")]
    type_table: Option<PathBuf>,
    #[arg(long, value_enum)]
    algorithm: Algorithm,
    /// Start state as `i j theta`.
    #[arg(long, num_args = 3, value_names = ["I", "J", "THETA"])]
    start: Vec<i32>,
    /// Finish state as `i j theta`.
    #[arg(long, num_args = 3, value_names = ["I", "J", "THETA"])]
    finish: Vec<i32>,
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum Algorithm {
    /// Lattice search costing primitives by arc length.
    Prim,
    /// Lattice search costing primitives by their collision trace.
    Cost,
    /// Type-graph search.
    Types,
}

fn main() -> Result<()> {
    let opt = Opt::parse();
    tracing_subscriber::fmt()
        .with_max_level(opt.log_level)
        .with_writer(std::io::stderr)
        .init();

    match opt.command {
        Command::Bench(args) => bench(args),
        Command::Query(args) => query(args),
    }
}

/// Runs PRIM, COST and TYPES on their own, then the interleaved search
/// at a few periods, all with the default goal tolerance.
fn bench(args: BenchArgs) -> Result<()> {
    let map = Grid::load(&args.map, true)?;
    let control_set = ControlSet::load(&args.control_set)?;
    let types = TypeInfo::load(&args.type_table)?;
    let scenarios = load_scenarios(&args.scenarios, args.samples, args.seed)?;

    let mut out = File::create(&args.output)
        .with_context(|| format!("cannot create result file {}", args.output.display()))?;
    writeln!(out, "TOTAL TESTS: {}", scenarios.len())?;

    let tol = GoalTolerance::default();
    for (index, scenario) in scenarios.iter().take(MAX_TESTS).enumerate() {
        let Scenario { start, goal } = *scenario;
        writeln!(out, "=== Test: {} ===", index)?;
        writeln!(out, "start: {} {} {}", start.i, start.j, start.theta)?;
        writeln!(out, "goal: {} {} {}", goal.i, goal.j, goal.theta)?;
        writeln!(out, "---")?;

        for (name, mode) in [("PRIM", CostModel::Prim), ("COST", CostModel::Cost)] {
            let mut arena = Arena::new();
            let mut params =
                LatticeParams::new(start, goal, &map, &control_set, true, mode, tol);
            let started = Instant::now();
            let outcome = search(&mut params, &mut arena);
            finish_run(&mut out, &mut arena, &mut params, outcome, name, started)?;
        }

        {
            let mut arena = Arena::new();
            let mut params = TypeParams::new(start, goal, &map, &types, true, tol);
            let started = Instant::now();
            let outcome = search(&mut params, &mut arena);
            finish_run(&mut out, &mut arena, &mut params, outcome, "TYPES", started)?;
        }

        for period in [20, 100, 500] {
            let mut arena = Arena::new();
            let mut lattice =
                LatticeParams::new(start, goal, &map, &control_set, true, CostModel::Cost, tol);
            let mut type_graph = TypeParams::new(start, goal, &map, &types, true, tol);
            let started = Instant::now();
            let outcome = parall(&mut lattice, &mut type_graph, &mut arena, period);
            let elapsed = started.elapsed();
            writeln!(out, "{}", outcome.report(&arena, "PARALL"))?;
            writeln!(out, "time PARALL {}: {:.6}", period, elapsed.as_secs_f64())?;
            writeln!(out, "---")?;
            if let Some(node) = outcome.final_node {
                arena.release_node(node);
            }
            lattice.tree_mut().release_all(&mut arena);
            type_graph.tree_mut().release_all(&mut arena);
        }
    }

    tracing::info!(tests = scenarios.len().min(MAX_TESTS), "benchmark finished");
    Ok(())
}

fn finish_run<P: SearchParams>(
    out: &mut File,
    arena: &mut Arena,
    params: &mut P,
    outcome: SearchOutcome,
    name: &str,
    started: Instant,
) -> Result<()> {
    let elapsed = started.elapsed();
    writeln!(out, "{}", outcome.report(arena, name))?;
    writeln!(out, "time {}: {:.6}", name, elapsed.as_secs_f64())?;
    writeln!(out, "---")?;
    if let Some(node) = outcome.final_node {
        arena.release_node(node);
    }
    params.tree_mut().release_all(arena);
    Ok(())
}

/// One search with exact goal matching, printing the reconstructed
/// chain of states (lattice) or terminating cells (type graph).
fn query(args: QueryArgs) -> Result<()> {
    let map = Grid::load(&args.map, true)?;
    let start = pose(&args.start).context("--start takes `i j theta`")?;
    let finish = pose(&args.finish).context("--finish takes `i j theta`")?;
    let tol = GoalTolerance::exact();
    let mut arena = Arena::new();

    match args.algorithm {
        Algorithm::Prim | Algorithm::Cost => {
            let Some(path) = &args.control_set else {
                bail!("the lattice algorithms need --prims");
            };
            let control_set = ControlSet::load(path)?;
            let mode = match args.algorithm {
                Algorithm::Prim => CostModel::Prim,
                _ => CostModel::Cost,
            };
            let mut params =
                LatticeParams::new(start, finish, &map, &control_set, true, mode, tol);
            let outcome = search(&mut params, &mut arena);
            print_chain(&arena, &outcome, "states (i j theta), final first:");
            if let Some(node) = outcome.final_node {
                arena.release_node(node);
            }
            params.tree_mut().release_all(&mut arena);
        }
        Algorithm::Types => {
            let Some(path) = &args.type_table else {
                bail!("the type-graph algorithm needs --types");
            };
            let types = TypeInfo::load(path)?;
            let mut params = TypeParams::new(start, finish, &map, &types, true, tol);
            let outcome = search(&mut params, &mut arena);
            print_chain(&arena, &outcome, "cells (i j type), final first:");
            if let Some(node) = outcome.final_node {
                arena.release_node(node);
            }
            params.tree_mut().release_all(&mut arena);
        }
    }

    Ok(())
}

fn pose(raw: &[i32]) -> Option<Pose> {
    match raw {
        &[i, j, theta] if (0..ANGLE_NUM).contains(&theta) => Some(Pose::new(i, j, theta)),
        _ => None,
    }
}

fn print_chain(arena: &Arena, outcome: &SearchOutcome, header: &str) {
    match outcome.cost(arena) {
        None => println!("no trajectory found ({} steps)", outcome.steps),
        Some(g) => {
            println!("trajectory found, cost {} ({} steps)", g, outcome.steps);
            println!("{}", header);
            for v in outcome.path_vertices(arena) {
                match v.kind {
                    VertexKind::State => println!("{} {} {}", v.i, v.j, v.key),
                    VertexKind::Cell { cell_type } => println!("{} {} {}", v.i, v.j, cell_type),
                }
            }
        }
    }
}
