use rand::seq::SliceRandom;
use rand::SeedableRng;
use rand_xorshift::XorShiftRng;
use std::sync::Arc;
use tracing::{debug, trace};

use crate::errors::*;
use crate::exits::ExitMode;
use crate::ids::IdGenerator;
use crate::maze::Maze;
use crate::node::Node;
use crate::topology::Topology;
use crate::units::Complexity;
use crate::utils;

/// Grows a maze by random walks out from a single Origin node.
///
/// ```ignore
/// let maze = MazeBuilder::new(Arc::new(Compass4))
///     .complexity(Complexity(20))
///     .exit_mode(ExitMode::ExternalOpen)
///     .seed(7)
///     .build()?;
/// ```
///
/// The same topology, complexity, exit mode and seed always produce the same maze.
#[derive(Debug, Clone)]
pub struct MazeBuilder {
    topology: Arc<dyn Topology>,
    complexity: Complexity,
    exit_mode: ExitMode,
    seed: Option<u64>,
}

impl MazeBuilder {
    pub fn new(topology: Arc<dyn Topology>) -> MazeBuilder {
        MazeBuilder {
            topology,
            complexity: Complexity::default(),
            exit_mode: ExitMode::default(),
            seed: None,
        }
    }

    /// Length of the primary walk, the number of branches and the length of each branch.
    pub fn complexity(mut self, complexity: Complexity) -> Self {
        self.complexity = complexity;
        self
    }

    pub fn exit_mode(mut self, exit_mode: ExitMode) -> Self {
        self.exit_mode = exit_mode;
        self
    }

    /// Fix the random number generator seed. Without one the generator is seeded from entropy.
    pub fn seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    pub fn build(&self) -> Result<Maze> {
        let mut rng = match self.seed {
            Some(seed) => XorShiftRng::seed_from_u64(seed),
            None => XorShiftRng::from_entropy(),
        };
        let mut ids = IdGenerator::new();
        let mut maze = Maze::new(self.topology.clone());

        let origin = Node::new(ids.origin(),
                               self.topology.clone(),
                               self.topology.default_location(),
                               self.topology.connection_points());
        maze.add_node(origin, true)?;
        let origin_index = 0;

        let Complexity(complexity) = self.complexity;
        {
            let mut walker = Walker {
                maze: &mut maze,
                rng: &mut rng,
                ids: &mut ids,
            };
            walker.walk(origin_index, complexity)?;
            debug!(nodes = walker.maze.size(), "primary walk done");

            for branch in 0..complexity {
                let hops = utils::rand_inclusive(walker.rng, 0, complexity);
                let from = walker.wander(origin_index, hops);
                walker.walk(from, complexity)?;
                trace!(branch, hops, nodes = walker.maze.size(), "branch done");
            }
        }

        maze.normalize()?;

        let (entrance, exit) = self.exit_mode.strategy().place(&mut maze, &mut rng, &mut ids)?;
        if let Some(entrance) = entrance {
            maze.set_current(&entrance.node)?;
        }

        debug!(topology = self.topology.name(),
               complexity,
               nodes = maze.size(),
               links = maze.links_count(),
               dimensions = ?maze.dimensions(),
               has_exit = exit.is_some(),
               "maze built");
        Ok(maze)
    }
}

// The mutable state threaded through one generation run.
struct Walker<'a> {
    maze: &'a mut Maze,
    rng: &'a mut XorShiftRng,
    ids: &'a mut IdGenerator,
}

impl<'a> Walker<'a> {
    /// Walk `depth` steps from the node at `from`, returning where the walk stopped.
    fn walk(&mut self, from: usize, depth: usize) -> Result<usize> {
        let mut pointer = from;

        for step in 0..depth {
            let mut directions = self.maze.node_at(pointer).available_points();

            if directions.is_empty() {
                match self.random_neighbour(pointer) {
                    Some(next) => {
                        pointer = next;
                        continue;
                    }
                    None => {
                        trace!(node = %self.maze.node_at(pointer).id(), step, "walk boxed in");
                        break;
                    }
                }
            }

            // First pick is the random attempt, the rest are the retry order.
            directions.shuffle(self.rng);
            let mut moved = None;
            for &direction in &directions {
                match self.try_extend(pointer, direction) {
                    Ok(next) => {
                        moved = Some(next);
                        break;
                    }
                    Err(Error(ErrorKind::SlotOccupied(..), _)) |
                    Err(Error(ErrorKind::NodeSaturated(..), _)) => {}
                    Err(e) => return Err(e),
                }
            }

            match moved.or_else(|| self.random_neighbour(pointer)) {
                Some(next) => pointer = next,
                None => {
                    trace!(node = %self.maze.node_at(pointer).id(), step, "dead end");
                    break;
                }
            }
        }

        Ok(pointer)
    }

    /// Follow up to `hops` existing edges at random from `from`.
    fn wander(&mut self, from: usize, hops: usize) -> usize {
        let mut pointer = from;
        for _ in 0..hops {
            match self.random_neighbour(pointer) {
                Some(next) => pointer = next,
                None => break,
            }
        }
        pointer
    }

    fn random_neighbour(&mut self, index: usize) -> Option<usize> {
        self.maze.neighbour_indices(index).choose(self.rng).cloned()
    }

    /// Link the node at `index` to whatever lies through `direction`, creating that node if the
    /// spot is empty. Nothing is added to the maze unless the edge is made.
    fn try_extend(&mut self, index: usize, direction: usize) -> Result<usize> {
        let topology = self.maze.topology().clone();
        let (target_location, pointer_id, pointer_max) = {
            let pointer = self.maze.node_at(index);
            (topology.next_location(pointer.location(), direction)?,
             pointer.id().0.clone(),
             pointer.max_connections())
        };

        if let Some(existing) = self.maze.index_at_location(&target_location) {
            self.maze.connect_indices(index, existing, direction, true)?;
            return Ok(existing);
        }

        let pointer = self.maze.node_at(index);
        if pointer.is_occupied(direction)? {
            return Err(ErrorKind::SlotOccupied(pointer_id, direction).into());
        }
        if pointer.is_saturated() {
            return Err(ErrorKind::NodeSaturated(pointer_id, pointer_max).into());
        }

        let max_connections = utils::rand_inclusive(self.rng, 1, topology.connection_points());
        let node = Node::new(self.ids.next_node_id(), topology, target_location, max_connections);
        self.maze.add_node(node, true)?;
        let created = self.maze.size() - 1;
        self.maze.connect_indices(index, created, direction, true)?;
        Ok(created)
    }
}
