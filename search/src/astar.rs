//! The A* engine and the interleaved dual search.

use crate::arena::{Arena, NodeId, Vertex, VertexId};
use crate::params::{LatticeParams, SearchParams, TypeParams};
use tracing::debug;

/// What a search run produced.
///
/// On success `final_node` is the goal node; it sits in neither the
/// frontier nor the ledger, so the caller owns it and must hand it back
/// to the arena (after reading `cost` / `path_vertices`) before checking
/// arena balance. Walking `parent` links from it yields the trajectory's
/// vertex chain back to the start — on the type graph, the chain holds
/// goal-type cells only.
#[derive(Clone, Copy, Debug)]
pub struct SearchOutcome {
    pub found: bool,
    /// Number of engine steps taken, successful or not.
    pub steps: u32,
    pub final_node: Option<NodeId>,
}

impl SearchOutcome {
    /// Path cost, when a path was found.
    pub fn cost(&self, arena: &Arena) -> Option<f64> {
        self.final_node.map(|n| arena.node(n).g)
    }

    /// The vertices on the found path, final first, start last.
    ///
    /// Must be called before the owning tree is torn down: the chain's
    /// interior nodes live in its ledger.
    pub fn path_vertices(&self, arena: &Arena) -> Vec<Vertex> {
        let mut path = Vec::new();
        let mut cursor = self.final_node;
        while let Some(id) = cursor {
            let node = arena.node(id);
            path.push(*arena.vertex(node.vertex));
            cursor = node.parent;
        }
        path
    }

    /// The one-line result record used by the benchmark driver:
    /// `result <NAME>: <found> <steps> <cost>` with `-1` standing in for
    /// the cost of a failed search.
    pub fn report(&self, arena: &Arena, name: &str) -> String {
        match self.cost(arena) {
            Some(g) => format!("result {}: 1 {} {}", name, self.steps, g),
            None => format!("result {}: 0 {} -1", name, self.steps),
        }
    }
}

/// Creates the start node and seeds the frontier with it.
pub fn push_start<P: SearchParams>(params: &mut P, arena: &mut Arena) {
    let vertex = params.start_vertex(arena);
    let node = arena.new_node(vertex);
    let h = params.heuristic(arena, vertex);
    arena.node_mut(node).f = h;
    params.tree_mut().push_open(arena, node);
}

/// One engine iteration: pop the best frontier node, test it for the
/// goal, otherwise expand it into the frontier and close it.
///
/// Returns the goal node when one is popped; `None` both while the
/// search is still going and when the frontier is exhausted (the caller
/// distinguishes the two via `open_is_empty`).
pub fn step<P: SearchParams>(
    params: &mut P,
    arena: &mut Arena,
    scratch: &mut Vec<(VertexId, f64)>,
) -> Option<NodeId> {
    let current = params.tree_mut().pop_best(arena)?;
    let vertex = arena.node(current).vertex;
    if params.is_goal(arena, vertex) {
        return Some(current);
    }

    params.successors(arena, vertex, scratch);
    let g = arena.node(current).g;
    for &(u, cost) in scratch.iter() {
        if params.tree().was_expanded(arena, u) {
            // the vertex was closed since its producer was pushed
            arena.release_vertex(u);
            continue;
        }
        let fresh = arena.new_node(u);
        let h = params.heuristic(arena, u);
        {
            let node = arena.node_mut(fresh);
            node.g = g + cost;
            node.f = node.g + h;
        }
        params.link_parent(arena, current, fresh);
        params.tree_mut().push_open(arena, fresh);
    }

    params.tree_mut().admit_closed(arena, current);
    None
}

/// Runs A* to completion on one graph.
pub fn search<P: SearchParams>(params: &mut P, arena: &mut Arena) -> SearchOutcome {
    push_start(params, arena);

    let mut scratch = Vec::new();
    let mut steps = 0;
    while !params.tree().open_is_empty() {
        steps += 1;
        if let Some(node) = step(params, arena, &mut scratch) {
            debug!(steps, g = arena.node(node).g, "search reached a goal");
            return SearchOutcome {
                found: true,
                steps,
                final_node: Some(node),
            };
        }
    }

    debug!(steps, "search exhausted its frontier");
    SearchOutcome {
        found: false,
        steps,
        final_node: None,
    }
}

/// Interleaves a lattice search and a type search within one thread: the
/// type search steps every iteration, the lattice search every
/// `period`-th iteration, or every iteration once the type frontier is
/// exhausted. The first goal found wins.
///
/// Only the lattice running dry decides "no path": the type graph may
/// lose completeness to coalescing, so its exhaustion merely stops its
/// share of the schedule.
pub fn parall(
    lattice: &mut LatticeParams,
    types: &mut TypeParams,
    arena: &mut Arena,
    period: u32,
) -> SearchOutcome {
    assert!(period > 0);
    push_start(lattice, arena);
    push_start(types, arena);

    let mut scratch = Vec::new();
    let mut steps = 0;
    loop {
        let use_types = !types.tree().open_is_empty();
        if lattice.tree().open_is_empty() {
            return SearchOutcome {
                found: false,
                steps,
                final_node: None,
            };
        }
        steps += 1;

        if use_types {
            if let Some(node) = step(types, arena, &mut scratch) {
                return SearchOutcome {
                    found: true,
                    steps,
                    final_node: Some(node),
                };
            }
        }
        if steps % period == 0 || !use_types {
            if let Some(node) = step(lattice, arena, &mut scratch) {
                return SearchOutcome {
                    found: true,
                    steps,
                    final_node: Some(node),
                };
            }
        }
    }
}
