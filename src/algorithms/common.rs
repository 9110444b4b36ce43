use std::fmt;

use crate::algorithms::engine::SearchEngine;
use crate::grid::{KnownGrid, Position};

/// Replanning direction. Forward searches agent-to-goal on every replan;
/// backward searches goal-to-agent and the agent walks the extracted path in
/// reverse, which amortizes work when the goal region is the better-explored
/// end of the map.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    Forward,
    Backward,
}

impl Mode {
    pub fn name(self) -> &'static str {
        match self {
            Mode::Forward => "forward",
            Mode::Backward => "backward",
        }
    }
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Why a replan produced no plan. Both variants are normal, recoverable
/// outcomes of a search, not faults; they only become user-visible when the
/// controller has nothing further to sense.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlanFailure {
    Unreachable,
    BudgetExhausted,
}

impl fmt::Display for PlanFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PlanFailure::Unreachable => write!(f, "unreachable from current knowledge"),
            PlanFailure::BudgetExhausted => write!(f, "search expansion budget exhausted"),
        }
    }
}

/// Manhattan distance. Admissible and consistent for unit-cost 4-connected
/// movement; any non-unit cost model would need this re-derived.
pub fn manhattan(a: Position, b: Position) -> u32 {
    ((a.row as i32 - b.row as i32).abs() + (a.col as i32 - b.col as i32).abs()) as u32
}

pub trait PlanningStrategy {
    /// Plan a path on the known grid. The returned path is in agent-to-goal
    /// order regardless of which direction the underlying search ran.
    fn plan(
        &mut self,
        engine: &mut SearchEngine,
        known: &KnownGrid,
        agent: Position,
        goal: Position,
    ) -> Result<Vec<Position>, PlanFailure>;

    fn name(&self) -> &'static str;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn manhattan_is_symmetric_and_zero_at_identity() {
        let a = Position::new(1, 4);
        let b = Position::new(3, 0);
        assert_eq!(manhattan(a, b), 6);
        assert_eq!(manhattan(b, a), 6);
        assert_eq!(manhattan(a, a), 0);
    }
}
