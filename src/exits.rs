//! Strategies for choosing where a maze is entered and left.
//!
//! A strategy tags the maze start in `place_entrance` and the finish in `place_exit`. The nodes
//! used by the entrance are handed on to `place_exit` as exclusions, so the two never coincide.

use error_chain::bail;
use rand::seq::SliceRandom;
use rand::{Rng, RngCore};
use std::fmt::Debug;
use std::iter;
use std::str::FromStr;
use tracing::debug;

use crate::analysis::Analysis;
use crate::errors::*;
use crate::ids::IdGenerator;
use crate::maze::Maze;
use crate::node::{Node, NodeId};
use crate::topology::ConnectionPointSmallVec;

/// Where an entrance or exit ended up.
#[derive(Eq, PartialEq, Clone, Debug)]
pub struct Placement {
    /// The node tagged as start or finish.
    pub node: NodeId,
    /// The resident boundary node an open exit was punched through, if any.
    pub frontier: Option<NodeId>,
    /// The connection point facing out of the maze, for boundary placements.
    pub direction: Option<usize>,
}

impl Placement {
    fn internal(node: NodeId) -> Placement {
        Placement {
            node,
            frontier: None,
            direction: None,
        }
    }

    /// The nodes a later placement must stay away from.
    pub fn exclusions(&self) -> impl Iterator<Item = &NodeId> {
        iter::once(&self.node).chain(self.frontier.iter())
    }
}

pub trait ExitPlacement: Debug {
    fn name(&self) -> &'static str;

    /// Choose and tag the start node. `Ok(None)` when there is nowhere eligible.
    fn place_entrance(&self,
                      maze: &mut Maze,
                      rng: &mut dyn RngCore,
                      ids: &mut IdGenerator,
                      excluded: &[NodeId])
                      -> Result<Option<Placement>>;

    /// Choose and tag the finish node. `Ok(None)` when there is nowhere eligible.
    fn place_exit(&self,
                  maze: &mut Maze,
                  rng: &mut dyn RngCore,
                  ids: &mut IdGenerator,
                  excluded: &[NodeId])
                  -> Result<Option<Placement>>;

    /// Entrance first, then an exit that avoids everything the entrance used.
    fn place(&self,
             maze: &mut Maze,
             rng: &mut dyn RngCore,
             ids: &mut IdGenerator)
             -> Result<(Option<Placement>, Option<Placement>)> {
        let entrance = self.place_entrance(maze, rng, ids, &[])?;
        let excluded = entrance.iter()
            .flat_map(|placement| placement.exclusions().cloned())
            .collect::<Vec<NodeId>>();
        let exit = self.place_exit(maze, rng, ids, &excluded)?;
        debug!(strategy = self.name(),
               entrance = ?entrance.as_ref().map(|p| &p.node),
               exit = ?exit.as_ref().map(|p| &p.node),
               "exits placed");
        Ok((entrance, exit))
    }
}

/// Selector for the built in strategies.
#[derive(Eq, PartialEq, Copy, Clone, Debug)]
pub enum ExitMode {
    Internal,
    ExternalSealed,
    ExternalOpen,
}

impl Default for ExitMode {
    fn default() -> ExitMode {
        ExitMode::Internal
    }
}

impl ExitMode {
    pub fn strategy(self) -> Box<dyn ExitPlacement> {
        match self {
            ExitMode::Internal => Box::new(InternalExits),
            ExitMode::ExternalSealed => Box::new(SealedBoundaryExits),
            ExitMode::ExternalOpen => Box::new(OpenBoundaryExits),
        }
    }
}

impl FromStr for ExitMode {
    type Err = Error;

    fn from_str(s: &str) -> Result<ExitMode> {
        match s {
            "internal" => Ok(ExitMode::Internal),
            "sealed" => Ok(ExitMode::ExternalSealed),
            "open" => Ok(ExitMode::ExternalOpen),
            other => Err(format!("unknown exit mode '{}', expected internal, sealed or open", other).into()),
        }
    }
}

/// Start at the origin, finish anywhere else. The maze is not changed.
#[derive(Debug, Copy, Clone)]
pub struct InternalExits;

impl ExitPlacement for InternalExits {
    fn name(&self) -> &'static str {
        "internal"
    }

    fn place_entrance(&self,
                      maze: &mut Maze,
                      _: &mut dyn RngCore,
                      _: &mut IdGenerator,
                      excluded: &[NodeId])
                      -> Result<Option<Placement>> {
        let origin = match maze.origin() {
            Some(origin) if !excluded.contains(origin.id()) => origin.id().clone(),
            _ => return Ok(None),
        };
        maze.set_start(&origin)?;
        Ok(Some(Placement::internal(origin)))
    }

    fn place_exit(&self,
                  maze: &mut Maze,
                  rng: &mut dyn RngCore,
                  _: &mut IdGenerator,
                  excluded: &[NodeId])
                  -> Result<Option<Placement>> {
        let candidates = maze.nodes_array()
            .iter()
            .map(Node::id)
            .filter(|id| !excluded.contains(id))
            .collect::<Vec<&NodeId>>();
        let finish = match candidates.choose(rng) {
            Some(&id) => id.clone(),
            None => return Ok(None),
        };
        maze.set_finish(&finish)?;
        Ok(Some(Placement::internal(finish)))
    }
}

/// Start and finish on the outside of the maze, but without opening any walls.
#[derive(Debug, Copy, Clone)]
pub struct SealedBoundaryExits;

impl ExitPlacement for SealedBoundaryExits {
    fn name(&self) -> &'static str {
        "sealed"
    }

    fn place_entrance(&self,
                      maze: &mut Maze,
                      rng: &mut dyn RngCore,
                      _: &mut IdGenerator,
                      excluded: &[NodeId])
                      -> Result<Option<Placement>> {
        let placement = sealed_placement(maze, rng, excluded)?;
        if let Some(ref p) = placement {
            maze.set_start(&p.node)?;
        }
        Ok(placement)
    }

    fn place_exit(&self,
                  maze: &mut Maze,
                  rng: &mut dyn RngCore,
                  _: &mut IdGenerator,
                  excluded: &[NodeId])
                  -> Result<Option<Placement>> {
        let placement = sealed_placement(maze, rng, excluded)?;
        if let Some(ref p) = placement {
            maze.set_finish(&p.node)?;
        }
        Ok(placement)
    }
}

fn sealed_placement(maze: &Maze, rng: &mut dyn RngCore, excluded: &[NodeId]) -> Result<Option<Placement>> {
    let analysis = Analysis::new(maze)?;
    Ok(choose_frontier(maze, &analysis, rng, excluded, false)?.map(|(node, direction)| {
        Placement {
            node,
            frontier: None,
            direction: Some(direction),
        }
    }))
}

/// Start and finish on new `EXIT-n` nodes just outside the maze, each joined to a boundary node.
///
/// If the boundary node had no connections to spare it is given exactly one more.
#[derive(Debug, Copy, Clone)]
pub struct OpenBoundaryExits;

impl OpenBoundaryExits {
    fn open(&self,
            maze: &mut Maze,
            rng: &mut dyn RngCore,
            ids: &mut IdGenerator,
            excluded: &[NodeId])
            -> Result<Option<Placement>> {
        let analysis = Analysis::new(maze)?;
        let (frontier_id, direction) = match choose_frontier(maze, &analysis, rng, excluded, true)? {
            Some(chosen) => chosen,
            None => return Ok(None),
        };

        let topology = maze.topology().clone();
        let frontier_index = maze.require_index(&frontier_id)?;
        let exit_location = topology.next_location(maze.node_at(frontier_index).location(), direction)?;

        // Nothing is written until the edge is certain to be made.
        if maze.node_at(frontier_index).is_occupied(direction)? {
            bail!(ErrorKind::SlotOccupied(frontier_id.0, direction));
        }
        if maze.node_at_location(&exit_location).is_some() {
            bail!(ErrorKind::DuplicateLocation(exit_location.encode()));
        }

        let exit = Node::new(ids.next_exit_id(), topology, exit_location, 1);
        let exit_id = exit.id().clone();
        maze.add_node(exit, true)?;
        let exit_index = maze.size() - 1;

        if maze.node_at(frontier_index).is_saturated() {
            maze.node_at_mut(frontier_index).raise_max_connections();
        }
        maze.connect_indices(frontier_index, exit_index, direction, true)?;
        debug!(exit = %exit_id, frontier = %frontier_id, direction, "boundary opened");

        Ok(Some(Placement {
            node: exit_id,
            frontier: Some(frontier_id),
            direction: Some(direction),
        }))
    }
}

impl ExitPlacement for OpenBoundaryExits {
    fn name(&self) -> &'static str {
        "open"
    }

    fn place_entrance(&self,
                      maze: &mut Maze,
                      rng: &mut dyn RngCore,
                      ids: &mut IdGenerator,
                      excluded: &[NodeId])
                      -> Result<Option<Placement>> {
        let placement = self.open(maze, rng, ids, excluded)?;
        if let Some(ref p) = placement {
            maze.set_start(&p.node)?;
        }
        Ok(placement)
    }

    fn place_exit(&self,
                  maze: &mut Maze,
                  rng: &mut dyn RngCore,
                  ids: &mut IdGenerator,
                  excluded: &[NodeId])
                  -> Result<Option<Placement>> {
        let placement = self.open(maze, rng, ids, excluded)?;
        if let Some(ref p) = placement {
            maze.set_finish(&p.node)?;
        }
        Ok(placement)
    }
}

/// Pick a frontier node facing out of a random side of the maze.
///
/// A random connection point is snapped to a prime cardinality to choose the side. Should that
/// side have nothing eligible the other sides are tried in random order. With `on_edge` only
/// nodes actually touching the bounding box qualify, so the cell one step further out is
/// outside the box. A node whose slot facing out of that side is already taken never qualifies.
fn choose_frontier(maze: &Maze,
                   analysis: &Analysis,
                   rng: &mut dyn RngCore,
                   excluded: &[NodeId],
                   on_edge: bool)
                   -> Result<Option<(NodeId, usize)>> {
    let topology = maze.topology();
    let first = topology.round_to_prime_cardinality(rng.gen_range(0..topology.connection_points()))?;
    let mut others = topology.prime_cardinalities()
        .into_iter()
        .filter(|&point| point != first)
        .collect::<ConnectionPointSmallVec>();
    others.shuffle(rng);

    for direction in iter::once(first).chain(others) {
        let cardinal = match analysis.cardinal_of(direction) {
            Some(cardinal) => cardinal,
            None => continue,
        };
        let candidates = analysis.frontier(direction)
            .iter()
            .filter(|id| !excluded.contains(id))
            .filter(|id| {
                maze.node_with_id(id).map_or(false, |node| {
                    node.is_occupied(direction).ok() == Some(false) &&
                    (!on_edge || analysis.touches_edge(node.location(), cardinal))
                })
            })
            .collect::<Vec<&NodeId>>();
        if let Some(&id) = candidates.choose(rng) {
            return Ok(Some((id.clone(), direction)));
        }
    }
    Ok(None)
}

#[cfg(test)]
mod tests {

    use super::*;
    use crate::location::Location;
    use crate::topology::{Compass4, Compass8, Topology};
    use rand::SeedableRng;
    use rand_xorshift::XorShiftRng;
    use std::sync::Arc;

    // A straight corridor of full nodes along x, Origin at the west end.
    fn corridor(topology: Arc<dyn Topology>, length: i64, max_connections: usize) -> Maze {
        let mut maze = Maze::new(topology.clone());
        let east = topology.cardinal_point(crate::topology::CompassPrimary::East);
        for x in 0..length {
            let id = if x == 0 { NodeId::new("Origin") } else { NodeId(format!("n{}", x)) };
            let n = Node::new(id, topology.clone(), Location::new(vec![x, 0]), max_connections);
            maze.add_node(n, true).unwrap();
        }
        for x in 1..length {
            let from = if x == 1 { NodeId::new("Origin") } else { NodeId(format!("n{}", x - 1)) };
            maze.connect(&from, &NodeId(format!("n{}", x)), east, true).unwrap();
        }
        maze.normalize().unwrap();
        maze
    }

    #[test]
    fn exit_modes_parse() {
        assert_eq!("internal".parse::<ExitMode>().unwrap(), ExitMode::Internal);
        assert_eq!("sealed".parse::<ExitMode>().unwrap(), ExitMode::ExternalSealed);
        assert_eq!("open".parse::<ExitMode>().unwrap(), ExitMode::ExternalOpen);
        assert!("sideways".parse::<ExitMode>().is_err());
        assert_eq!(ExitMode::default().strategy().name(), "internal");
    }

    #[test]
    fn internal_exits_start_at_origin() {
        let mut rng = XorShiftRng::seed_from_u64(1);
        let mut ids = IdGenerator::new();
        for _ in 0..20 {
            let mut maze = corridor(Arc::new(Compass4), 5, 2);
            let (entrance, exit) = InternalExits.place(&mut maze, &mut rng, &mut ids).unwrap();
            assert_eq!(entrance.unwrap().node, NodeId::new("Origin"));
            let finish = exit.unwrap().node;
            assert_ne!(finish, NodeId::new("Origin"));
            assert_eq!(maze.start().unwrap().id(), &NodeId::new("Origin"));
            assert_eq!(maze.finish().unwrap().id(), &finish);
            assert_eq!(maze.size(), 5);
        }
    }

    #[test]
    fn internal_exit_needs_a_second_node() {
        let mut rng = XorShiftRng::seed_from_u64(2);
        let mut maze = corridor(Arc::new(Compass4), 1, 4);
        let (entrance, exit) = InternalExits.place(&mut maze, &mut rng, &mut IdGenerator::new()).unwrap();
        assert!(entrance.is_some());
        assert!(exit.is_none());
        assert!(maze.finish().is_none());
    }

    #[test]
    fn sealed_exits_tag_distinct_frontier_nodes() {
        let mut rng = XorShiftRng::seed_from_u64(5);
        for _ in 0..30 {
            let mut maze = corridor(Arc::new(Compass8), 4, 2);
            let links_before = maze.links_count();
            let (entrance, exit) = SealedBoundaryExits.place(&mut maze, &mut rng, &mut IdGenerator::new())
                .unwrap();
            let (entrance, exit) = (entrance.unwrap(), exit.unwrap());

            assert_ne!(entrance.node, exit.node);
            for placement in &[&entrance, &exit] {
                let direction = placement.direction.unwrap();
                assert!(maze.topology().prime_cardinalities().contains(&direction));
                let analysis = Analysis::new(&maze).unwrap();
                assert!(analysis.frontier(direction).contains(&placement.node));
            }
            assert_eq!(maze.size(), 4);
            assert_eq!(maze.links_count(), links_before);
        }
    }

    #[test]
    fn open_exits_sit_outside_the_bounding_box() {
        let mut rng = XorShiftRng::seed_from_u64(8);
        for _ in 0..30 {
            let mut maze = corridor(Arc::new(Compass4), 3, 2);
            let mut ids = IdGenerator::new();
            let (entrance, exit) = OpenBoundaryExits.place(&mut maze, &mut rng, &mut ids).unwrap();
            let (entrance, exit) = (entrance.unwrap(), exit.unwrap());

            assert_eq!(entrance.node, NodeId::new("EXIT-1"));
            assert_eq!(exit.node, NodeId::new("EXIT-2"));
            assert_ne!(entrance.frontier, exit.frontier);
            assert_eq!(maze.size(), 5);

            let (width, height) = (maze.width().0 as i64, maze.height().0 as i64);
            for placement in &[&entrance, &exit] {
                let exit_node = maze.node_with_id(&placement.node).unwrap();
                let (x, y) = (exit_node.location().get(0).unwrap(), exit_node.location().get(1).unwrap());
                assert!(x < 0 || y < 0 || x >= width || y >= height);

                let frontier = maze.node_with_id(placement.frontier.as_ref().unwrap()).unwrap();
                let direction = placement.direction.unwrap();
                assert_eq!(frontier.neighbour_id_at(direction).unwrap(), Some(&placement.node));
                let back = maze.topology().opposite(direction).unwrap();
                assert_eq!(exit_node.neighbour_id_at(back).unwrap(), Some(frontier.id()));
                assert!(frontier.occupied_count() <= frontier.max_connections());
            }
            assert_eq!(maze.start().unwrap().id(), &entrance.node);
            assert_eq!(maze.finish().unwrap().id(), &exit.node);
        }
    }

    #[test]
    fn open_exit_raises_a_full_cap_by_one() {
        let mut rng = XorShiftRng::seed_from_u64(13);
        // the middle of a 3 long corridor of cap 2 nodes is full, the ends have a spare connection
        let mut maze = corridor(Arc::new(Compass4), 3, 2);
        let middle = NodeId::new("n1");
        let placement = OpenBoundaryExits.place_entrance(&mut maze, &mut rng, &mut IdGenerator::new(), &[
            NodeId::new("Origin"),
            NodeId::new("n2"),
        ]).unwrap().unwrap();

        assert_eq!(placement.frontier, Some(middle.clone()));
        let node = maze.node_with_id(&middle).unwrap();
        assert_eq!(node.max_connections(), 3);
        assert_eq!(node.occupied_count(), 3);
    }

    // Origin joined to each of `others` through the given points, edges that ignore geometry.
    fn skewed_maze(others: &[(&str, i64, usize)]) -> Maze {
        let topology: Arc<dyn Topology> = Arc::new(Compass4);
        let mut maze = Maze::new(topology.clone());
        maze.add_node(Node::new("Origin".into(), topology.clone(), Location::new(vec![0, 0]), 4), true)
            .unwrap();
        for &(id, x, point) in others {
            maze.add_node(Node::new(id.into(), topology.clone(), Location::new(vec![x, 0]), 4), true)
                .unwrap();
            maze.connect(&"Origin".into(), &id.into(), point, true).unwrap();
        }
        maze.normalize().unwrap();
        maze
    }

    #[test]
    fn open_exits_skip_taken_outward_slots() {
        let excluded = [NodeId::new("b")];
        for seed in 0..30 {
            let mut rng = XorShiftRng::seed_from_u64(seed);
            let mut maze = skewed_maze(&[("b", 1, Compass4::NORTH)]);
            let placement = OpenBoundaryExits.place_entrance(&mut maze, &mut rng, &mut IdGenerator::new(), &excluded)
                .unwrap()
                .unwrap();

            assert_eq!(placement.frontier, Some(NodeId::new("Origin")));
            assert_ne!(placement.direction, Some(Compass4::NORTH));
            assert_eq!(maze.size(), 3);
            let exit = maze.node_with_id(&placement.node).unwrap();
            assert_eq!(exit.occupied_count(), 1);
        }
    }

    #[test]
    fn open_exits_leave_the_maze_alone_when_every_outward_slot_is_taken() {
        let excluded = [NodeId::new("b"), NodeId::new("c"), NodeId::new("d")];
        let mut rng = XorShiftRng::seed_from_u64(4);
        let mut maze = skewed_maze(&[("b", 1, Compass4::NORTH), ("c", 2, Compass4::WEST), ("d", 3, Compass4::SOUTH)]);
        let links_before = maze.links_count();

        let placement = OpenBoundaryExits.place_entrance(&mut maze, &mut rng, &mut IdGenerator::new(), &excluded)
            .unwrap();
        assert!(placement.is_none());
        assert_eq!(maze.size(), 4);
        assert_eq!(maze.links_count(), links_before);
        assert_eq!(maze.origin().unwrap().max_connections(), 4);
        assert!(maze.start().is_none());
    }

    #[test]
    fn nothing_eligible_is_not_an_error() {
        let mut rng = XorShiftRng::seed_from_u64(21);
        let mut maze = corridor(Arc::new(Compass4), 1, 4);
        let excluded = [NodeId::new("Origin")];
        assert!(SealedBoundaryExits.place_exit(&mut maze, &mut rng, &mut IdGenerator::new(), &excluded)
            .unwrap()
            .is_none());
        assert!(OpenBoundaryExits.place_exit(&mut maze, &mut rng, &mut IdGenerator::new(), &excluded)
            .unwrap()
            .is_none());
        assert_eq!(maze.size(), 1);
    }
}
