// Shortest paths and range queries over a built maze.
//
// Every edge costs one step, so the search is a breadth first flood in disguise: the frontier is
// kept sorted by tentative distance and always popped from the front, and a node's distance is
// final the first time it is labelled. All the scratch state lives in `SearchNode`s owned by a
// single call, nothing is written back onto the maze.

use error_chain::bail;
use std::collections::VecDeque;
use std::slice;
use tracing::{debug, trace};

use crate::errors::*;
use crate::ids::IdGenerator;
use crate::maze::Maze;
use crate::node::{Node, NodeId};
use crate::utils::{self, FnvHashSet};

/// An ordered route through the maze with no repeated nodes, plus a read cursor.
#[derive(Debug, Clone)]
pub struct PathResult {
    id: String,
    nodes: Vec<NodeId>,
    members: FnvHashSet<NodeId>,
    position: usize,
}

impl PathResult {
    pub fn new<S: Into<String>>(id: S) -> PathResult {
        PathResult {
            id: id.into(),
            nodes: vec![],
            members: utils::fnv_hashset(16),
            position: 0,
        }
    }

    #[inline]
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Add a node to the end of the path. A node already on the path is refused.
    pub fn append(&mut self, id: NodeId) -> Result<()> {
        if self.members.contains(&id) {
            bail!(ErrorKind::DuplicatePathEntry(id.0));
        }
        self.members.insert(id.clone());
        self.nodes.push(id);
        Ok(())
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Number of edges walked, one less than the number of nodes.
    pub fn steps(&self) -> usize {
        self.nodes.len().saturating_sub(1)
    }

    pub fn contains(&self, id: &NodeId) -> bool {
        self.members.contains(id)
    }

    pub fn first(&self) -> Option<&NodeId> {
        self.nodes.first()
    }

    pub fn last(&self) -> Option<&NodeId> {
        self.nodes.last()
    }

    /// The node the cursor last handed out, `None` before the first `next`.
    pub fn current(&self) -> Option<&NodeId> {
        self.position.checked_sub(1).and_then(|i| self.nodes.get(i))
    }

    /// Move the cursor on and hand out the node it lands on; `None` once past the end.
    #[allow(clippy::should_implement_trait)]
    pub fn next(&mut self) -> Option<&NodeId> {
        if self.position < self.nodes.len() {
            self.position += 1;
            self.nodes.get(self.position - 1)
        } else {
            None
        }
    }

    pub fn reset(&mut self) {
        self.position = 0;
    }

    pub fn iter(&self) -> slice::Iter<NodeId> {
        self.nodes.iter()
    }

    #[inline]
    pub fn ids(&self) -> &[NodeId] {
        &self.nodes
    }

    /// Resolve every id on the path against `maze`.
    pub fn to_nodes<'m>(&self, maze: &'m Maze) -> Result<Vec<&'m Node>> {
        self.nodes
            .iter()
            .map(|id| maze.node_with_id(id).ok_or_else(|| ErrorKind::UnknownNode(id.0.clone()).into()))
            .collect()
    }
}

impl<'a> IntoIterator for &'a PathResult {
    type Item = &'a NodeId;
    type IntoIter = slice::Iter<'a, NodeId>;

    fn into_iter(self) -> Self::IntoIter {
        self.nodes.iter()
    }
}

#[derive(Debug, Copy, Clone)]
struct SearchNode {
    index: usize,
    distance: Option<usize>,
    previous: Option<usize>,
}

struct Search {
    nodes: Vec<SearchNode>,
    discovered: Vec<usize>,
}

/// Finds routes through a maze. Owns the id counter for the paths it hands out.
#[derive(Debug, Default)]
pub struct PathFinder {
    ids: IdGenerator,
}

impl PathFinder {
    pub fn new() -> PathFinder {
        PathFinder::default()
    }

    /// The shortest route from `from` to `to`, both ends included.
    ///
    /// Fails with `UnknownNode` for an id not in the maze and `NoPath` when `to` cannot be reached.
    pub fn find_path(&mut self, from: &NodeId, to: &NodeId, maze: &Maze) -> Result<PathResult> {
        let start = maze.require_index(from)?;
        let target = maze.require_index(to)?;

        let search = relax(maze, start, None, Some(target));
        if search.nodes[target].distance.is_none() {
            debug!(from = %from, to = %to, explored = search.discovered.len(), "no path");
            bail!(ErrorKind::NoPath(from.0.clone(), to.0.clone()));
        }

        let mut reversed = vec![];
        let mut cursor = Some(target);
        while let Some(index) = cursor {
            reversed.push(maze.node_at(search.nodes[index].index).id().clone());
            cursor = search.nodes[index].previous;
        }

        let mut path = PathResult::new(self.ids.next_path_id());
        for id in reversed.into_iter().rev() {
            path.append(id)?;
        }
        trace!(path = path.id(), steps = path.steps(), "path found");
        Ok(path)
    }

    /// Every node strictly less than `range` steps from `from`, nearest first.
    ///
    /// `from` itself is included whenever `range` is at least 1.
    pub fn tiles_within_range(&self, from: &NodeId, range: usize, maze: &Maze) -> Result<Vec<NodeId>> {
        let start = maze.require_index(from)?;
        let search = relax(maze, start, Some(range), None);
        Ok(search.discovered
            .into_iter()
            .map(|index| maze.node_at(index).id().clone())
            .collect())
    }
}

// Label distances outwards from `start`. Stops early once `target` is popped; nodes at `limit`
// steps or more are never admitted.
fn relax(maze: &Maze, start: usize, limit: Option<usize>, target: Option<usize>) -> Search {
    let mut nodes = (0..maze.size())
        .map(|index| {
            SearchNode {
                index,
                distance: None,
                previous: None,
            }
        })
        .collect::<Vec<_>>();
    let mut discovered = vec![];

    if limit == Some(0) {
        return Search { nodes, discovered };
    }

    nodes[start].distance = Some(0);
    discovered.push(start);
    let mut frontier = VecDeque::new();
    frontier.push_back(start);

    while let Some(current) = frontier.pop_front() {
        if Some(current) == target {
            break;
        }
        let distance = nodes[current].distance.unwrap_or(0);
        let tentative = distance + 1;
        if limit.map_or(false, |limit| tentative >= limit) {
            continue;
        }

        for neighbour in maze.neighbour_indices(current) {
            if nodes[neighbour].distance.is_some() {
                continue;
            }
            nodes[neighbour].distance = Some(tentative);
            nodes[neighbour].previous = Some(current);
            insert_sorted(&mut frontier, &nodes, neighbour);
            discovered.push(neighbour);
        }
    }

    Search { nodes, discovered }
}

// Keep the frontier ascending by distance, new entries going after their equals.
fn insert_sorted(frontier: &mut VecDeque<usize>, nodes: &[SearchNode], index: usize) {
    let distance = nodes[index].distance;
    let position = frontier.iter()
        .position(|&queued| nodes[queued].distance > distance)
        .unwrap_or_else(|| frontier.len());
    frontier.insert(position, index);
}
