use crate::algorithms::common::{PlanFailure, PlanningStrategy};
use crate::algorithms::engine::{SearchEngine, SearchOutcome};
use crate::grid::{KnownGrid, Position};

/// Repeated forward A*: every replan searches from the agent towards the
/// goal, so the extracted path is already in walking order.
#[derive(Debug, Default)]
pub struct ForwardAStar;

impl ForwardAStar {
    pub fn new() -> Self {
        ForwardAStar
    }
}

impl PlanningStrategy for ForwardAStar {
    fn plan(
        &mut self,
        engine: &mut SearchEngine,
        known: &KnownGrid,
        agent: Position,
        goal: Position,
    ) -> Result<Vec<Position>, PlanFailure> {
        match engine.search(known, agent, goal) {
            SearchOutcome::Found(terminal) => Ok(engine.extract_path(terminal)),
            SearchOutcome::Unreachable => Err(PlanFailure::Unreachable),
            SearchOutcome::BudgetExhausted => Err(PlanFailure::BudgetExhausted),
        }
    }

    fn name(&self) -> &'static str {
        "forward"
    }
}
