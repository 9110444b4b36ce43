use std::cmp::Ordering;
use std::collections::BinaryHeap;

use log::debug;
use rustc_hash::FxHashMap;

use crate::algorithms::common::manhattan;
use crate::grid::{KnownGrid, Position};

const UNVISITED: u32 = u32::MAX;

/// Outcome of one search invocation. `Unreachable` is an expected, recurring
/// result under partial knowledge, not an error.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SearchOutcome {
    Found(NodeId),
    Unreachable,
    BudgetExhausted,
}

/// Handle to a terminal node in the engine's arena. Valid until the next
/// `search` call clears the arena.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NodeId(usize);

/// Parent links are arena indices, so the whole search tree of one invocation
/// is dropped in O(1) by clearing the node vector.
#[derive(Debug, Clone, Copy)]
struct Node {
    pos: Position,
    parent: Option<usize>,
}

/// Per-cell search state, kept across replans. The g-value is meaningful only
/// while `generation` matches the engine's current one; a mismatched tag
/// reads as "never visited this generation" without any O(cells) reset.
#[derive(Debug, Clone, Copy)]
struct CellState {
    generation: u64,
    g: u32,
    closed: bool,
}

#[derive(Debug, Clone, Copy, Eq)]
struct OpenEntry {
    f: u32,
    g: u32,
    pos: Position,
    node: usize,
}

impl PartialEq for OpenEntry {
    fn eq(&self, other: &Self) -> bool {
        self.f == other.f && self.g == other.g && self.pos == other.pos
    }
}

impl PartialOrd for OpenEntry {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for OpenEntry {
    // BinaryHeap is a max-heap, so "greater" means "popped first": smallest f
    // wins, ties go to the larger g (the node further along the frontier),
    // and remaining ties to the smaller position so pops are a total order.
    fn cmp(&self, other: &Self) -> Ordering {
        other
            .f
            .cmp(&self.f)
            .then(self.g.cmp(&other.g))
            .then(other.pos.cmp(&self.pos))
    }
}

/// Single-shot A* over the known grid, reusable across replans. One engine
/// owns one generation counter and one per-cell state map; concurrent
/// planners must each own their own engine.
pub struct SearchEngine {
    generation: u64,
    states: FxHashMap<Position, CellState>,
    nodes: Vec<Node>,
    open: BinaryHeap<OpenEntry>,
    expansion_cap: Option<usize>,
    expanded_last: usize,
    expanded_total: usize,
}

impl SearchEngine {
    pub fn new() -> Self {
        SearchEngine {
            generation: 0,
            states: FxHashMap::default(),
            nodes: Vec::new(),
            open: BinaryHeap::new(),
            expansion_cap: None,
            expanded_last: 0,
            expanded_total: 0,
        }
    }

    /// Cap the number of node expansions per invocation; a capped search
    /// reports `BudgetExhausted` instead of running the grid to exhaustion.
    pub fn set_expansion_cap(&mut self, cap: Option<usize>) {
        self.expansion_cap = cap;
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Expansions performed by the most recent search.
    pub fn expanded_last(&self) -> usize {
        self.expanded_last
    }

    /// Expansions accumulated over the engine's lifetime.
    pub fn expanded_total(&self) -> usize {
        self.expanded_total
    }

    /// Compute a shortest path on the currently known grid from `source` to
    /// `target`. Unit step costs, f = g + manhattan. Improved nodes are
    /// re-inserted into the heap and stale copies skipped on pop rather than
    /// decrease-keyed in place.
    pub fn search(
        &mut self,
        known: &KnownGrid,
        source: Position,
        target: Position,
    ) -> SearchOutcome {
        self.generation += 1;
        self.nodes.clear();
        self.open.clear();
        self.expanded_last = 0;

        self.nodes.push(Node {
            pos: source,
            parent: None,
        });
        self.states.insert(
            source,
            CellState {
                generation: self.generation,
                g: 0,
                closed: false,
            },
        );
        self.open.push(OpenEntry {
            f: manhattan(source, target),
            g: 0,
            pos: source,
            node: 0,
        });

        while let Some(entry) = self.open.pop() {
            let state = match self.states.get_mut(&entry.pos) {
                Some(state) if state.generation == self.generation => state,
                _ => continue,
            };
            // A cell closes at most once per generation; entries whose g was
            // improved after they were pushed are stale and skipped.
            if state.closed || entry.g > state.g {
                continue;
            }
            if entry.pos == target {
                return SearchOutcome::Found(NodeId(entry.node));
            }
            if let Some(cap) = self.expansion_cap {
                if self.expanded_last >= cap {
                    debug!(
                        "generation {}: expansion cap {} hit before reaching {:?}",
                        self.generation, cap, target
                    );
                    return SearchOutcome::BudgetExhausted;
                }
            }
            state.closed = true;
            self.expanded_last += 1;
            self.expanded_total += 1;

            let g_next = entry.g + 1;
            for neighbor in known.neighbors4(entry.pos) {
                if known.is_blocked(neighbor) {
                    continue;
                }
                let state = self.states.entry(neighbor).or_insert(CellState {
                    generation: 0,
                    g: UNVISITED,
                    closed: false,
                });
                if state.generation != self.generation {
                    // Stale tag from an earlier replan: logically unvisited.
                    state.generation = self.generation;
                    state.g = UNVISITED;
                    state.closed = false;
                }
                if g_next < state.g {
                    state.g = g_next;
                    let node = self.nodes.len();
                    self.nodes.push(Node {
                        pos: neighbor,
                        parent: Some(entry.node),
                    });
                    self.open.push(OpenEntry {
                        f: g_next + manhattan(neighbor, target),
                        g: g_next,
                        pos: neighbor,
                        node,
                    });
                }
            }
        }

        debug!(
            "generation {}: open set exhausted after {} expansions, {:?} unreachable",
            self.generation, self.expanded_last, target
        );
        SearchOutcome::Unreachable
    }

    /// Walk parent links from the terminal node back to the search root and
    /// reverse, yielding the path in source-to-target order.
    pub fn extract_path(&self, terminal: NodeId) -> Vec<Position> {
        let mut path = Vec::new();
        let mut current = Some(terminal.0);
        while let Some(index) = current {
            let node = self.nodes[index];
            path.push(node.pos);
            current = node.parent;
        }
        path.reverse();
        path
    }
}

impl Default for SearchEngine {
    fn default() -> Self {
        SearchEngine::new()
    }
}
