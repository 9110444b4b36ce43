use crate::grid::{Grid, KnownGrid, Position};

/// The moving agent: its current cell and its accumulated obstacle belief.
pub struct Agent {
    pub position: Position,
    pub known: KnownGrid,
}

impl Agent {
    pub fn new(start: Position, rows: usize, cols: usize) -> Self {
        Agent {
            position: start,
            known: KnownGrid::new(rows, cols),
        }
    }

    /// Observe the four cells adjacent to the agent and merge any obstacles
    /// into the known grid. Returns the cells that were newly discovered.
    /// Sensing radius is fixed at one step; cells further out stay unknown
    /// until the agent gets close to them.
    pub fn sense(&mut self, truth: &Grid) -> Vec<Position> {
        let mut newly_blocked = Vec::new();
        for neighbor in truth.neighbors4(self.position) {
            if truth.is_blocked(neighbor) && self.known.mark_blocked(neighbor) {
                newly_blocked.push(neighbor);
            }
        }
        newly_blocked
    }

    pub fn move_to(&mut self, pos: Position) {
        self.position = pos;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::grid::Cell;

    fn walled_grid() -> Grid {
        // 3x3 with an obstacle right of the start cell.
        let mut cells = vec![vec![Cell::Free; 3]; 3];
        cells[0][1] = Cell::Blocked;
        Grid::from_cells(cells, Position::new(0, 0), Position::new(2, 2)).unwrap()
    }

    #[test]
    fn sense_marks_adjacent_obstacles_once() {
        let truth = walled_grid();
        let mut agent = Agent::new(truth.start, truth.rows, truth.cols);

        let newly = agent.sense(&truth);
        assert_eq!(newly, vec![Position::new(0, 1)]);
        assert!(agent.known.is_blocked(Position::new(0, 1)));

        // A second observation from the same cell discovers nothing new.
        assert!(agent.sense(&truth).is_empty());
        assert_eq!(agent.known.blocked_count(), 1);
    }

    #[test]
    fn sense_ignores_obstacles_out_of_range() {
        let mut cells = vec![vec![Cell::Free; 4]; 4];
        cells[3][3] = Cell::Blocked;
        let truth = Grid::from_cells(cells, Position::new(0, 0), Position::new(0, 3)).unwrap();
        let mut agent = Agent::new(truth.start, truth.rows, truth.cols);

        assert!(agent.sense(&truth).is_empty());
        assert_eq!(agent.known.blocked_count(), 0);
    }
}
