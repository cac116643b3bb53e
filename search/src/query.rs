//! Query-side inputs of a search: endpoint states and goal tolerances.

use crate::limits::ANGLE_NUM;

/// A discrete agent state: grid cell plus heading.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Pose {
    pub i: i32,
    pub j: i32,
    pub theta: i32,
}

impl Pose {
    pub fn new(i: i32, j: i32, theta: i32) -> Pose {
        debug_assert!((0..ANGLE_NUM).contains(&theta));
        Pose { i, j, theta }
    }
}

/// How far from the finish state a vertex may be and still count as a
/// goal.
#[derive(Clone, Copy, Debug)]
pub struct GoalTolerance {
    /// Euclidean radius around the finish cell.
    pub radius: f64,
    /// Cyclic heading slack, in discrete steps.
    pub angle_slack: i32,
}

impl GoalTolerance {
    /// Goal must match the finish state exactly.
    pub fn exact() -> GoalTolerance {
        GoalTolerance {
            radius: 0.0,
            angle_slack: 0,
        }
    }
}

impl Default for GoalTolerance {
    fn default() -> Self {
        GoalTolerance {
            radius: 3.0,
            angle_slack: 1,
        }
    }
}
