use error_chain::bail;
use itertools::{Itertools, MinMaxResult};
use rand::seq::SliceRandom;
use rand::Rng;
use serde_derive::{Deserialize, Serialize};
use smallvec::SmallVec;
use std::cmp;
use std::fmt;
use std::sync::Arc;
use tracing::debug;

use crate::errors::*;
use crate::ids::ORIGIN_ID;
use crate::location::Location;
use crate::node::{Node, NodeId, NodeState};
use crate::topology::Topology;
use crate::units::{EdgesCount, Height, NodesCount, Width};
use crate::utils::{self, FnvHashMap};

pub type Dimensions = SmallVec<[usize; 2]>;

/// The maze graph: an arena owning every node, plus the indices and pointers derived from them.
///
/// Edges live inside the nodes as neighbour ids. The id index resolves those ids back to arena
/// slots, the location index answers "what is at this coordinate". Neither index is
/// authoritative, both can be rebuilt from the nodes at any time.
///
/// Only the builder and the exit placement strategies are expected to mutate a maze. Everything
/// else (path finding, rendering, content indexing) reads it.
pub struct Maze {
    topology: Arc<dyn Topology>,
    nodes: Vec<Node>,
    ids: FnvHashMap<NodeId, usize>,
    locations: FnvHashMap<Location, usize>,
    start: Option<NodeId>,
    finish: Option<NodeId>,
    current: Option<NodeId>,
    dimensions: Dimensions,
}

/// Field-for-field snapshot of a maze for persistence layers.
#[derive(Eq, PartialEq, Clone, Debug, Serialize, Deserialize)]
pub struct MazeState {
    pub topology: String,
    pub nodes: Vec<NodeState>,
    pub start: Option<NodeId>,
    pub finish: Option<NodeId>,
    pub current: Option<NodeId>,
    pub dimensions: Vec<usize>,
}

impl fmt::Debug for Maze {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "Maze :: topology: {}, nodes: {}, dimensions: {:?}, start: {:?}, finish: {:?}",
               self.topology.name(), self.nodes.len(), self.dimensions, self.start, self.finish)
    }
}

impl Maze {
    pub fn new(topology: Arc<dyn Topology>) -> Maze {
        let dimensions = SmallVec::from_elem(0, topology.dimensionality());
        Maze {
            topology,
            nodes: vec![],
            ids: utils::fnv_hashmap(64),
            locations: utils::fnv_hashmap(64),
            start: None,
            finish: None,
            current: None,
            dimensions,
        }
    }

    #[inline]
    pub fn topology(&self) -> &Arc<dyn Topology> {
        &self.topology
    }

    #[inline]
    pub fn size(&self) -> usize {
        self.nodes.len()
    }

    #[inline]
    pub fn nodes_count(&self) -> NodesCount {
        NodesCount(self.nodes.len())
    }

    /// All the nodes, in the order they were added. Origin, when present, comes first.
    #[inline]
    pub fn nodes_array(&self) -> &[Node] {
        &self.nodes
    }

    pub fn random_node<R: Rng + ?Sized>(&self, rng: &mut R) -> Option<&Node> {
        self.nodes.choose(rng)
    }

    pub fn origin(&self) -> Option<&Node> {
        self.node_with_id(&NodeId::new(ORIGIN_ID))
    }

    /// Register a node with the maze.
    ///
    /// The node must use the maze's topology and ids must always be unique. Locations must be
    /// unique too when `demand_unique_location` is set; otherwise a node may share a location,
    /// and the location index keeps pointing at the node that got there first.
    pub fn add_node(&mut self, node: Node, demand_unique_location: bool) -> Result<&Node> {
        if node.topology().name() != self.topology.name() {
            bail!(ErrorKind::TopologyMismatch(self.topology.name().to_owned(),
                                              node.topology().name().to_owned()));
        }
        let expected = self.topology.dimensionality();
        if node.location().dimensionality() != expected {
            bail!(ErrorKind::DimensionMismatch(expected, node.location().dimensionality()));
        }
        if self.ids.contains_key(node.id()) {
            bail!(ErrorKind::DuplicateNodeId(node.id().0.clone()));
        }
        if demand_unique_location && self.locations.contains_key(node.location()) {
            bail!(ErrorKind::DuplicateLocation(node.location().encode()));
        }

        let index = self.nodes.len();
        self.ids.insert(node.id().clone(), index);
        self.locations.entry(node.location().clone()).or_insert(index);
        self.nodes.push(node);
        Ok(&self.nodes[index])
    }

    pub fn node_with_id(&self, id: &NodeId) -> Option<&Node> {
        self.ids.get(id).map(|&index| &self.nodes[index])
    }

    pub fn node_at_location(&self, location: &Location) -> Option<&Node> {
        self.locations.get(location).map(|&index| &self.nodes[index])
    }

    #[inline]
    pub(crate) fn index_of(&self, id: &NodeId) -> Option<usize> {
        self.ids.get(id).cloned()
    }

    #[inline]
    pub(crate) fn index_at_location(&self, location: &Location) -> Option<usize> {
        self.locations.get(location).cloned()
    }

    #[inline]
    pub(crate) fn node_at(&self, index: usize) -> &Node {
        &self.nodes[index]
    }

    #[inline]
    pub(crate) fn node_at_mut(&mut self, index: usize) -> &mut Node {
        &mut self.nodes[index]
    }

    pub(crate) fn require_index(&self, id: &NodeId) -> Result<usize> {
        self.index_of(id).ok_or_else(|| ErrorKind::UnknownNode(id.0.clone()).into())
    }

    /// Arena indices of the nodes linked to the node at `index`.
    pub(crate) fn neighbour_indices(&self, index: usize) -> SmallVec<[usize; 8]> {
        self.nodes[index]
            .neighbour_ids()
            .filter_map(|id| self.index_of(id))
            .collect()
    }

    /// Connect two registered nodes, `from` reaching `to` through `direction`.
    pub(crate) fn connect(&mut self, from: &NodeId, to: &NodeId, direction: usize, auto_connect: bool) -> Result<()> {
        let from_index = self.require_index(from)?;
        let to_index = self.require_index(to)?;
        self.connect_indices(from_index, to_index, direction, auto_connect)
    }

    pub(crate) fn connect_indices(&mut self,
                                  from: usize,
                                  to: usize,
                                  direction: usize,
                                  auto_connect: bool)
                                  -> Result<()> {
        if from == to {
            bail!("node '{}' cannot be connected to itself", self.nodes[from].id());
        }
        let (from_node, to_node) = self.pair_mut(from, to);
        from_node.connect_to(to_node, direction, auto_connect)
    }

    // Two distinct nodes mutably borrowed out of the arena at once.
    fn pair_mut(&mut self, a: usize, b: usize) -> (&mut Node, &mut Node) {
        debug_assert!(a != b);
        if a < b {
            let (low, high) = self.nodes.split_at_mut(b);
            (&mut low[a], &mut high[0])
        } else {
            let (low, high) = self.nodes.split_at_mut(a);
            (&mut high[0], &mut low[b])
        }
    }

    /// Follow the current node's edge at `direction`.
    ///
    /// Returns the node moved to, or `None` (leaving current as it was) when there is no
    /// current node or no edge that way.
    pub fn move_current(&mut self, direction: usize) -> Option<&Node> {
        let next_id = {
            let current = self.current.as_ref().and_then(|id| self.node_with_id(id))?;
            current.neighbour_id_at(direction).ok()??.clone()
        };
        let next_index = self.index_of(&next_id)?;
        self.current = Some(next_id);
        Some(&self.nodes[next_index])
    }

    pub fn current(&self) -> Option<&Node> {
        self.current.as_ref().and_then(|id| self.node_with_id(id))
    }

    pub(crate) fn set_current(&mut self, id: &NodeId) -> Result<()> {
        self.require_index(id)?;
        self.current = Some(id.clone());
        Ok(())
    }

    pub fn start(&self) -> Option<&Node> {
        self.start.as_ref().and_then(|id| self.node_with_id(id))
    }

    pub fn finish(&self) -> Option<&Node> {
        self.finish.as_ref().and_then(|id| self.node_with_id(id))
    }

    pub(crate) fn set_start(&mut self, id: &NodeId) -> Result<()> {
        self.require_index(id)?;
        self.start = Some(id.clone());
        Ok(())
    }

    pub(crate) fn set_finish(&mut self, id: &NodeId) -> Result<()> {
        self.require_index(id)?;
        self.finish = Some(id.clone());
        Ok(())
    }

    /// Extent of the maze along each axis, as fixed by normalization.
    #[inline]
    pub fn dimensions(&self) -> &[usize] {
        &self.dimensions
    }

    pub fn width(&self) -> Width {
        Width(self.dimensions.get(0).cloned().unwrap_or(0))
    }

    pub fn height(&self) -> Height {
        Height(self.dimensions.get(1).cloned().unwrap_or(0))
    }

    /// Each edge once, as a pair of arena indices with the smaller index first.
    pub fn iter_link_indices<'a>(&'a self) -> impl Iterator<Item = (usize, usize)> + 'a {
        self.nodes
            .iter()
            .enumerate()
            .flat_map(move |(index, node)| {
                node.neighbour_ids()
                    .filter_map(move |id| self.index_of(id))
                    .map(move |other| (cmp::min(index, other), cmp::max(index, other)))
            })
            .unique()
    }

    pub fn iter_links<'a>(&'a self) -> impl Iterator<Item = (&'a NodeId, &'a NodeId)> + 'a {
        self.iter_link_indices()
            .map(move |(a, b)| (self.nodes[a].id(), self.nodes[b].id()))
    }

    pub fn links_count(&self) -> usize {
        self.iter_link_indices().count()
    }

    pub fn graph_size(&self) -> (NodesCount, EdgesCount) {
        (self.nodes_count(), EdgesCount(self.links_count()))
    }

    /// Resident nodes by canonical location string, over the `width x height` bounding box.
    ///
    /// Nodes outside the box (fabricated exits) are left out.
    pub fn location_index(&self) -> Result<FnvHashMap<String, NodeId>> {
        if self.dimensions.len() != 2 {
            bail!(ErrorKind::DimensionMismatch(2, self.dimensions.len()));
        }
        let (Width(width), Height(height)) = (self.width(), self.height());

        let mut dense: Vec<Option<usize>> = vec![None; width * height];
        for (index, node) in self.nodes.iter().enumerate() {
            let (x, y) = (node.location().get(0)?, node.location().get(1)?);
            if x >= 0 && y >= 0 && (x as usize) < width && (y as usize) < height {
                let cell = &mut dense[y as usize * width + x as usize];
                if cell.is_none() {
                    *cell = Some(index);
                }
            }
        }

        let mut index = utils::fnv_hashmap(self.nodes.len());
        for (cell, resident) in dense.into_iter().enumerate() {
            if let Some(node_index) = resident {
                let location = Location::new(vec![(cell % width) as i64, (cell / width) as i64]);
                index.insert(location.encode(), self.nodes[node_index].id().clone());
            }
        }
        Ok(index)
    }

    /// Shift every node so the smallest coordinate on each axis is 0 and record the dimensions.
    pub(crate) fn normalize(&mut self) -> Result<()> {
        let axes = self.topology.dimensionality();
        let mut offsets = SmallVec::<[i64; 2]>::with_capacity(axes);
        let mut dimensions = Dimensions::with_capacity(axes);

        for axis in 0..axes {
            let values = self.nodes
                .iter()
                .map(|node| node.location().get(axis))
                .collect::<Result<Vec<i64>>>()?;
            let (min, max) = match values.into_iter().minmax() {
                MinMaxResult::NoElements => (0, -1),
                MinMaxResult::OneElement(v) => (v, v),
                MinMaxResult::MinMax(min, max) => (min, max),
            };
            offsets.push(-min);
            dimensions.push((max - min + 1) as usize);
        }

        for node in &mut self.nodes {
            node.location_mut().translate(&offsets)?;
        }
        self.dimensions = dimensions;
        self.rebuild_location_index();

        debug!(offsets = ?offsets, dimensions = ?self.dimensions, "maze normalized");
        Ok(())
    }

    fn rebuild_location_index(&mut self) {
        self.locations.clear();
        for (index, node) in self.nodes.iter().enumerate() {
            self.locations.entry(node.location().clone()).or_insert(index);
        }
    }

    pub fn state(&self) -> MazeState {
        MazeState {
            topology: self.topology.name().to_owned(),
            nodes: self.nodes.iter().map(Node::state).collect(),
            start: self.start.clone(),
            finish: self.finish.clone(),
            current: self.current.clone(),
            dimensions: self.dimensions.to_vec(),
        }
    }
}
