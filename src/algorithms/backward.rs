use crate::algorithms::common::{PlanFailure, PlanningStrategy};
use crate::algorithms::engine::{SearchEngine, SearchOutcome};
use crate::grid::{KnownGrid, Position};

/// Repeated backward A*: every replan searches from the goal towards the
/// agent. The extracted path comes out in goal-to-agent order and is reversed
/// here, so the controller walks it exactly like a forward plan. Searching
/// from the goal end amortizes replanning cost once the goal region is the
/// better-explored part of the map.
#[derive(Debug, Default)]
pub struct BackwardAStar;

impl BackwardAStar {
    pub fn new() -> Self {
        BackwardAStar
    }
}

impl PlanningStrategy for BackwardAStar {
    fn plan(
        &mut self,
        engine: &mut SearchEngine,
        known: &KnownGrid,
        agent: Position,
        goal: Position,
    ) -> Result<Vec<Position>, PlanFailure> {
        match engine.search(known, goal, agent) {
            SearchOutcome::Found(terminal) => {
                let mut path = engine.extract_path(terminal);
                path.reverse();
                Ok(path)
            }
            SearchOutcome::Unreachable => Err(PlanFailure::Unreachable),
            SearchOutcome::BudgetExhausted => Err(PlanFailure::BudgetExhausted),
        }
    }

    fn name(&self) -> &'static str {
        "backward"
    }
}
