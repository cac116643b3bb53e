//! Search parameterizations: what A* needs to know about a graph.
//!
//! [`SearchParams`] bundles the start vertex, the goal predicate, the
//! successor generator and the heuristic behind one trait, so the engine
//! in [`crate::astar`] is written once. [`LatticeParams`] instantiates it
//! for the state lattice, [`TypeParams`] for the type graph.

use crate::arena::{Arena, NodeId, VertexId};
use crate::limits::ANGLE_NUM;
use crate::map::Grid;
use crate::metrics::{cyclic_angle_dist, euclid_dist, euclid_dist_sq, octile_dist, SQRT_2};
use crate::primitives::{ControlSet, Primitive};
use crate::query::{GoalTolerance, Pose};
use crate::tree::SearchTree;
use crate::typeinfo::{GoalHeading, TypeInfo};

/// Edge cost / heuristic pairing of the lattice search.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CostModel {
    /// Edges cost the primitive's arc length; the heuristic is the
    /// Euclidean distance to the finish.
    Prim,
    /// Edges cost the primitive's collision trace; the heuristic is the
    /// octile distance to the finish.
    Cost,
}

/// One graph's worth of search configuration.
///
/// `successors` clears `out` before filling it and hands ownership of the
/// appended vertex handles to the caller, which must either wrap each in
/// a node or release it.
pub trait SearchParams {
    fn tree(&self) -> &SearchTree;
    fn tree_mut(&mut self) -> &mut SearchTree;

    /// Allocates the root vertex of this search.
    fn start_vertex(&self, arena: &mut Arena) -> VertexId;

    fn is_goal(&self, arena: &Arena, vertex: VertexId) -> bool;

    fn successors(&self, arena: &mut Arena, vertex: VertexId, out: &mut Vec<(VertexId, f64)>);

    /// Admissible estimate of the remaining cost to the finish.
    fn heuristic(&self, arena: &Arena, vertex: VertexId) -> f64;

    /// Hooks `fresh` (an expansion product of `current`) into the parent
    /// structure. The default chains every node.
    fn link_parent(&self, arena: &mut Arena, current: NodeId, fresh: NodeId) {
        arena.node_mut(fresh).parent = Some(current);
    }
}

/// A* configuration for the state lattice.
pub struct LatticeParams<'a> {
    map: &'a Grid,
    control_set: &'a ControlSet,
    start: Pose,
    finish: Pose,
    tol: GoalTolerance,
    mode: CostModel,
    tree: SearchTree,
}

impl<'a> LatticeParams<'a> {
    pub fn new(
        start: Pose,
        finish: Pose,
        map: &'a Grid,
        control_set: &'a ControlSet,
        fast_closed: bool,
        mode: CostModel,
        tol: GoalTolerance,
    ) -> LatticeParams<'a> {
        LatticeParams {
            map,
            control_set,
            start,
            finish,
            tol,
            mode,
            tree: SearchTree::new(fast_closed),
        }
    }

    /// Whether `prim`, translated to start at `(i, j)`, stays in bounds
    /// and clear of obstacles.
    fn prim_fits(&self, i: i32, j: i32, prim: &Primitive) -> bool {
        prim.trace.iter().all(|&(ti, tj)| {
            self.map.in_bounds(i + ti, j + tj) && self.map.traversable(i + ti, j + tj)
        })
    }
}

impl SearchParams for LatticeParams<'_> {
    fn tree(&self) -> &SearchTree {
        &self.tree
    }

    fn tree_mut(&mut self) -> &mut SearchTree {
        &mut self.tree
    }

    fn start_vertex(&self, arena: &mut Arena) -> VertexId {
        arena.new_state(self.start.i, self.start.j, self.start.theta)
    }

    fn is_goal(&self, arena: &Arena, vertex: VertexId) -> bool {
        let v = arena.vertex(vertex);
        let dist_sq = euclid_dist_sq(v.i, v.j, self.finish.i, self.finish.j);
        dist_sq <= self.tol.radius * self.tol.radius
            && cyclic_angle_dist(v.theta(), self.finish.theta) <= self.tol.angle_slack
    }

    fn successors(&self, arena: &mut Arena, vertex: VertexId, out: &mut Vec<(VertexId, f64)>) {
        out.clear();
        let v = *arena.vertex(vertex);
        for prim in self.control_set.by_heading(v.theta()) {
            if !self.prim_fits(v.i, v.j, prim) {
                continue;
            }
            let u = arena.new_state(v.i + prim.goal.di, v.j + prim.goal.dj, prim.goal.theta);
            let cost = match self.mode {
                CostModel::Prim => prim.length,
                CostModel::Cost => prim.collision_cost,
            };
            out.push((u, cost));
        }
    }

    fn heuristic(&self, arena: &Arena, vertex: VertexId) -> f64 {
        let v = arena.vertex(vertex);
        match self.mode {
            CostModel::Prim => euclid_dist(v.i, v.j, self.finish.i, self.finish.j),
            CostModel::Cost => octile_dist(v.i, v.j, self.finish.i, self.finish.j),
        }
    }
}

/// A* configuration for the type graph.
///
/// Start and finish are still lattice states: the start is projected to
/// its type cell, and the goal test asks the type tables which cells a
/// suitable primitive can terminate in.
pub struct TypeParams<'a> {
    map: &'a Grid,
    types: &'a TypeInfo,
    start: Pose,
    finish: Pose,
    tol: GoalTolerance,
    tree: SearchTree,
}

impl<'a> TypeParams<'a> {
    pub fn new(
        start: Pose,
        finish: Pose,
        map: &'a Grid,
        types: &'a TypeInfo,
        fast_closed: bool,
        tol: GoalTolerance,
    ) -> TypeParams<'a> {
        TypeParams {
            map,
            types,
            start,
            finish,
            tol,
            tree: SearchTree::new(fast_closed),
        }
    }
}

impl SearchParams for TypeParams<'_> {
    fn tree(&self) -> &SearchTree {
        &self.tree
    }

    fn tree_mut(&mut self) -> &mut SearchTree {
        &mut self.tree
    }

    fn start_vertex(&self, arena: &mut Arena) -> VertexId {
        let t = self.types.start_type(self.start.theta);
        arena.new_cell(self.start.i, self.start.j, t, self.types.merge_info(t))
    }

    fn is_goal(&self, arena: &Arena, vertex: VertexId) -> bool {
        let v = arena.vertex(vertex);
        let heading = self.types.goal_heading(v.cell_type());
        if heading == GoalHeading::None {
            return false;
        }

        let dist_sq = euclid_dist_sq(v.i, v.j, self.finish.i, self.finish.j);
        if dist_sq > self.tol.radius * self.tol.radius {
            return false;
        }

        match heading {
            GoalHeading::None => unreachable!(),
            // The single terminating heading either fits the slack or no
            // primitive ending here can; the per-heading table holds no
            // further candidates for this type.
            GoalHeading::Single(theta) => {
                cyclic_angle_dist(theta, self.finish.theta) <= self.tol.angle_slack
            }
            GoalHeading::Multiple => {
                let slack = self.tol.angle_slack;
                (self.finish.theta - slack..=self.finish.theta + slack)
                    .any(|ft| self.types.is_goal(ft.rem_euclid(ANGLE_NUM), v.cell_type()))
            }
        }
    }

    fn successors(&self, arena: &mut Arena, vertex: VertexId, out: &mut Vec<(VertexId, f64)>) {
        out.clear();
        let v = *arena.vertex(vertex);
        for edge in self.types.successors_of(v.cell_type()) {
            let (ni, nj) = (v.i + edge.di, v.j + edge.dj);
            if !self.map.in_bounds(ni, nj) || !self.map.traversable(ni, nj) {
                continue;
            }
            let u = arena.new_cell(ni, nj, edge.to, self.types.merge_info(edge.to));
            let cost = if edge.di == 0 || edge.dj == 0 { 1.0 } else { SQRT_2 };
            out.push((u, cost));
        }
    }

    fn heuristic(&self, arena: &Arena, vertex: VertexId) -> f64 {
        let v = arena.vertex(vertex);
        octile_dist(v.i, v.j, self.finish.i, self.finish.j)
    }

    /// Parent chains on the type graph only keep cells a primitive can
    /// end in: a trajectory is recoverable from those alone, and the
    /// skipped cells may then be dropped once expanded.
    fn link_parent(&self, arena: &mut Arena, current: NodeId, fresh: NodeId) {
        let current_goal_type = {
            let cur = arena.node(current);
            self.types.goal_heading(arena.vertex(cur.vertex).cell_type()) != GoalHeading::None
        };
        let parent = if current_goal_type {
            Some(current)
        } else {
            arena.node(current).parent
        };
        arena.node_mut(fresh).parent = parent;

        let fresh_type = arena.vertex(arena.node(fresh).vertex).cell_type();
        if self.types.goal_heading(fresh_type) == GoalHeading::None {
            arena.node_mut(fresh).keep_after_closed = false;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::typeinfo::TypeEdge;

    fn straight_prim(theta: i32, di: i32, dj: i32, len: f64) -> Primitive {
        Primitive {
            start_theta: theta,
            goal: crate::primitives::Displacement { di, dj, theta },
            trace: vec![(0, 0), (di, dj)],
            length: len,
            collision_cost: Primitive::trace_cost(&[(0, 0), (di, dj)]),
            turning: 0,
        }
    }

    #[test]
    fn lattice_goal_respects_radius_and_slack() {
        let map = Grid::empty(10, 10);
        let set = ControlSet::new();
        let params = LatticeParams::new(
            Pose::new(0, 0, 0),
            Pose::new(5, 5, 4),
            &map,
            &set,
            false,
            CostModel::Prim,
            GoalTolerance {
                radius: 2.0,
                angle_slack: 1,
            },
        );
        let mut arena = Arena::with_capacity(8);

        let close_enough = arena.new_state(4, 4, 5);
        assert!(params.is_goal(&arena, close_enough));
        let too_far = arena.new_state(2, 2, 4);
        assert!(!params.is_goal(&arena, too_far));
        let wrong_heading = arena.new_state(5, 5, 6);
        assert!(!params.is_goal(&arena, wrong_heading));
    }

    #[test]
    fn lattice_successors_blocked_by_trace_collision() {
        let mut map = Grid::empty(3, 3);
        map.block(1, 0);
        let mut set = ControlSet::new();
        set.insert(straight_prim(0, 1, 0, 1.0));
        set.insert(straight_prim(0, 0, 1, 1.0));

        let params = LatticeParams::new(
            Pose::new(0, 0, 0),
            Pose::new(2, 2, 0),
            &map,
            &set,
            false,
            CostModel::Prim,
            GoalTolerance::exact(),
        );
        let mut arena = Arena::with_capacity(8);
        let v = arena.new_state(0, 0, 0);
        let mut out = Vec::new();
        params.successors(&mut arena, v, &mut out);

        // only the sideways primitive survives the blocked (1, 0)
        assert_eq!(out.len(), 1);
        let u = arena.vertex(out[0].0);
        assert_eq!((u.i, u.j), (0, 1));
    }

    #[test]
    fn lattice_cost_model_picks_edge_weight() {
        let map = Grid::empty(4, 4);
        let mut set = ControlSet::new();
        let mut prim = straight_prim(0, 1, 0, 2.5);
        prim.collision_cost = 7.0;
        set.insert(prim);

        let mut arena = Arena::with_capacity(8);
        let mut out = Vec::new();
        for (mode, expected) in [(CostModel::Prim, 2.5), (CostModel::Cost, 7.0)] {
            let params = LatticeParams::new(
                Pose::new(0, 0, 0),
                Pose::new(3, 0, 0),
                &map,
                &set,
                false,
                mode,
                GoalTolerance::exact(),
            );
            let v = arena.new_state(0, 0, 0);
            params.successors(&mut arena, v, &mut out);
            assert_eq!(out[0].1, expected);
            arena.release_vertex(out[0].0);
            arena.release_vertex(v);
        }
        assert!(arena.vertices_balanced());
    }

    fn single_type_table() -> TypeInfo {
        let mut types = TypeInfo::new();
        types.set_start_type(0, 0);
        types.record_goal(0, 0);
        types.set_merge_info(0, 0);
        for (di, dj) in [(1, 0), (0, 1), (1, 1)] {
            types.add_successor(0, TypeEdge { di, dj, to: 0 });
        }
        types
    }

    #[test]
    fn type_successors_cost_side_vs_diagonal() {
        let map = Grid::empty(5, 5);
        let types = single_type_table();
        let params = TypeParams::new(
            Pose::new(0, 0, 0),
            Pose::new(4, 4, 0),
            &map,
            &types,
            false,
            GoalTolerance::default(),
        );
        let mut arena = Arena::with_capacity(8);
        let v = params.start_vertex(&mut arena);
        let mut out = Vec::new();
        params.successors(&mut arena, v, &mut out);
        assert_eq!(out.len(), 3);
        assert_eq!(out[0].1, 1.0);
        assert_eq!(out[1].1, 1.0);
        assert_eq!(out[2].1, SQRT_2);
    }

    #[test]
    fn single_heading_goal_has_no_multi_heading_fallback() {
        // The type's only terminating heading is 0; with the finish
        // pointing the other way the cell is not a goal, and the test is
        // decided on that single heading alone.
        let map = Grid::empty(5, 5);
        let types = single_type_table();
        let params = TypeParams::new(
            Pose::new(0, 0, 0),
            Pose::new(0, 0, ANGLE_NUM / 2),
            &map,
            &types,
            false,
            GoalTolerance::default(),
        );
        let mut arena = Arena::with_capacity(8);
        let v = arena.new_cell(0, 0, 0, 0);
        assert!(!params.is_goal(&arena, v));
    }

    #[test]
    fn multi_heading_goal_scans_slack_window() {
        let map = Grid::empty(5, 5);
        let mut types = TypeInfo::new();
        types.set_start_type(0, 0);
        types.set_merge_info(0, 0);
        types.record_goal(2, 0);
        types.record_goal(ANGLE_NUM - 1, 0);

        let mut arena = Arena::with_capacity(8);
        let v = arena.new_cell(0, 0, 0, 0);

        // finish heading 0, slack 1: window {15, 0, 1} contains 15
        let params = TypeParams::new(
            Pose::new(0, 0, 0),
            Pose::new(0, 0, 0),
            &map,
            &types,
            false,
            GoalTolerance {
                radius: 1.0,
                angle_slack: 1,
            },
        );
        assert!(params.is_goal(&arena, v));

        // slack 0: window {0} matches neither recorded heading
        let exact = TypeParams::new(
            Pose::new(0, 0, 0),
            Pose::new(0, 0, 0),
            &map,
            &types,
            false,
            GoalTolerance::exact(),
        );
        assert!(!exact.is_goal(&arena, v));
    }
}
