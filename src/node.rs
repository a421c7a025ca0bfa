use error_chain::bail;
use serde_derive::{Deserialize, Serialize};
use smallvec::SmallVec;
use std::fmt;
use std::sync::Arc;

use crate::errors::*;
use crate::location::{Location, LocationState};
use crate::topology::{ConnectionPointSmallVec, Topology};

#[derive(Hash, Eq, PartialEq, Clone, Debug, Ord, PartialOrd, Serialize, Deserialize)]
pub struct NodeId(pub String);

impl NodeId {
    pub fn new<S: Into<String>>(id: S) -> NodeId {
        NodeId(id.into())
    }

    #[inline]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl<'a> From<&'a str> for NodeId {
    fn from(id: &'a str) -> NodeId {
        NodeId::new(id)
    }
}

pub type NeighbourSlots = SmallVec<[Option<NodeId>; 8]>;

/// A maze vertex.
///
/// Neighbours are held by id only, one slot per connection point of the topology. The maze that
/// owns the node resolves ids back to nodes, so there are never any references between nodes.
#[derive(Clone)]
pub struct Node {
    id: NodeId,
    topology: Arc<dyn Topology>,
    location: Location,
    neighbours: NeighbourSlots,
    max_connections: usize,
}

/// Field-for-field snapshot of a node for persistence layers.
#[derive(Eq, PartialEq, Clone, Debug, Serialize, Deserialize)]
pub struct NodeState {
    pub id: NodeId,
    pub topology: String,
    pub location: LocationState,
    pub neighbours: Vec<Option<NodeId>>,
    pub max_connections: usize,
}

impl fmt::Debug for Node {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "Node :: id: {}, location: {}, neighbours: {:?}, max connections: {}",
               self.id, self.location, self.neighbours, self.max_connections)
    }
}

impl Node {
    /// A node with every slot empty.
    ///
    /// `max_connections` is clamped into `1..=N`.
    pub fn new(id: NodeId,
               topology: Arc<dyn Topology>,
               location: Location,
               max_connections: usize)
               -> Node {
        let points = topology.connection_points();
        Node {
            id,
            location,
            neighbours: SmallVec::from_elem(None, points),
            max_connections: max_connections.max(1).min(points.max(1)),
            topology,
        }
    }

    #[inline]
    pub fn id(&self) -> &NodeId {
        &self.id
    }

    #[inline]
    pub fn topology(&self) -> &Arc<dyn Topology> {
        &self.topology
    }

    #[inline]
    pub fn location(&self) -> &Location {
        &self.location
    }

    #[inline]
    pub(crate) fn location_mut(&mut self) -> &mut Location {
        &mut self.location
    }

    #[inline]
    pub fn max_connections(&self) -> usize {
        self.max_connections
    }

    /// Allow one more connection than before. Only exit placement needs to punch through a full node.
    pub(crate) fn raise_max_connections(&mut self) {
        self.max_connections += 1;
    }

    pub fn occupied_count(&self) -> usize {
        self.neighbours.iter().filter(|slot| slot.is_some()).count()
    }

    #[inline]
    pub fn is_saturated(&self) -> bool {
        self.occupied_count() >= self.max_connections
    }

    /// Can a new connection be made at `point`: the slot is empty and there is room under the cap.
    pub fn is_open(&self, point: usize) -> Result<bool> {
        self.topology.validate(point)?;
        Ok(self.occupied_count() + 1 <= self.max_connections && self.neighbours[point].is_none())
    }

    pub fn is_occupied(&self, point: usize) -> Result<bool> {
        self.topology.validate(point)?;
        Ok(self.neighbours[point].is_some())
    }

    pub fn neighbour_id_at(&self, point: usize) -> Result<Option<&NodeId>> {
        self.topology.validate(point)?;
        Ok(self.neighbours[point].as_ref())
    }

    pub fn occupied_points(&self) -> ConnectionPointSmallVec {
        self.neighbours
            .iter()
            .enumerate()
            .filter(|&(_, slot)| slot.is_some())
            .map(|(point, _)| point)
            .collect()
    }

    /// The points a new connection could be made at right now.
    ///
    /// Empty once the node is saturated, even if some slots are still empty.
    pub fn available_points(&self) -> ConnectionPointSmallVec {
        if self.is_saturated() {
            return ConnectionPointSmallVec::new();
        }
        self.neighbours
            .iter()
            .enumerate()
            .filter(|&(_, slot)| slot.is_none())
            .map(|(point, _)| point)
            .collect()
    }

    /// Ids of the connected neighbours in connection point order.
    pub fn neighbour_ids(&self) -> impl Iterator<Item = &NodeId> {
        self.neighbours.iter().filter_map(|slot| slot.as_ref())
    }

    /// Every slot, empty ones included as `None` placeholders.
    #[inline]
    pub fn slots(&self) -> &[Option<NodeId>] {
        &self.neighbours
    }

    pub fn is_neighbour_with(&self, other: &Node) -> bool {
        self.neighbour_ids().any(|id| *id == other.id)
    }

    /// Connect `self` to `other` through `direction`.
    ///
    /// With `auto_connect` the reverse edge is written into `other` at the opposite point.
    /// Both ends are checked before anything is written: on error neither node has changed.
    pub fn connect_to(&mut self, other: &mut Node, direction: usize, auto_connect: bool) -> Result<()> {
        self.check_connectable(direction)?;
        let reverse = if auto_connect {
            let opposite = self.topology.opposite(direction)?;
            other.check_connectable(opposite)?;
            Some(opposite)
        } else {
            None
        };

        self.neighbours[direction] = Some(other.id.clone());
        if let Some(opposite) = reverse {
            other.neighbours[opposite] = Some(self.id.clone());
        }
        Ok(())
    }

    fn check_connectable(&self, point: usize) -> Result<()> {
        if self.is_occupied(point)? {
            bail!(ErrorKind::SlotOccupied(self.id.0.clone(), point));
        }
        if self.is_saturated() {
            bail!(ErrorKind::NodeSaturated(self.id.0.clone(), self.max_connections));
        }
        Ok(())
    }

    pub fn state(&self) -> NodeState {
        NodeState {
            id: self.id.clone(),
            topology: self.topology.name().to_owned(),
            location: self.location.state(),
            neighbours: self.neighbours.to_vec(),
            max_connections: self.max_connections,
        }
    }
}

#[cfg(test)]
mod tests {

    use super::*;
    use crate::topology::{Compass4, Compass8};

    fn node4(id: &str, max_connections: usize) -> Node {
        Node::new(NodeId::new(id), Arc::new(Compass4), Location::origin(2), max_connections)
    }

    fn node8(id: &str, max_connections: usize) -> Node {
        Node::new(NodeId::new(id), Arc::new(Compass8), Location::origin(2), max_connections)
    }

    #[test]
    fn new_nodes_are_empty() {
        let n = node8("a", 3);
        assert_eq!(n.slots().len(), 8);
        assert_eq!(n.occupied_count(), 0);
        assert!(n.occupied_points().is_empty());
        assert_eq!(&*n.available_points(), &[0, 1, 2, 3, 4, 5, 6, 7]);
        assert_eq!(n.neighbour_ids().count(), 0);
    }

    #[test]
    fn max_connections_is_clamped() {
        assert_eq!(node4("a", 0).max_connections(), 1);
        assert_eq!(node4("a", 9).max_connections(), 4);
    }

    #[test]
    fn connecting_is_reciprocal() {
        let mut a = node4("a", 4);
        let mut b = node4("b", 4);
        a.connect_to(&mut b, Compass4::EAST, true).unwrap();

        assert_eq!(a.neighbour_id_at(Compass4::EAST).unwrap(), Some(&NodeId::new("b")));
        assert_eq!(b.neighbour_id_at(Compass4::WEST).unwrap(), Some(&NodeId::new("a")));
        assert!(a.is_occupied(Compass4::EAST).unwrap());
        assert!(!a.is_open(Compass4::EAST).unwrap());
        assert!(a.is_neighbour_with(&b));
        assert!(b.is_neighbour_with(&a));
        assert_eq!(&*a.occupied_points(), &[Compass4::EAST]);
        assert_eq!(&*b.available_points(), &[Compass4::NORTH, Compass4::EAST, Compass4::SOUTH]);
    }

    #[test]
    fn one_way_connections() {
        let mut a = node4("a", 4);
        let mut b = node4("b", 4);
        a.connect_to(&mut b, Compass4::NORTH, false).unwrap();
        assert!(a.is_neighbour_with(&b));
        assert!(!b.is_neighbour_with(&a));
        assert_eq!(b.occupied_count(), 0);
    }

    #[test]
    fn occupied_direction_is_rejected_without_side_effects() {
        let mut a = node4("a", 4);
        let mut b = node4("b", 4);
        let mut c = node4("c", 4);
        a.connect_to(&mut b, Compass4::SOUTH, true).unwrap();

        match a.connect_to(&mut c, Compass4::SOUTH, true) {
            Err(Error(ErrorKind::SlotOccupied(ref id, Compass4::SOUTH), _)) if id == "a" => {}
            other => panic!("unexpected {:?}", other),
        }
        assert_eq!(c.occupied_count(), 0);
        assert_eq!(b.neighbour_id_at(Compass4::NORTH).unwrap(), Some(&NodeId::new("a")));
        assert_eq!(a.neighbour_id_at(Compass4::SOUTH).unwrap(), Some(&NodeId::new("b")));
    }

    #[test]
    fn saturated_nodes_refuse_connections() {
        let mut a = node4("a", 1);
        let mut b = node4("b", 4);
        let mut c = node4("c", 4);
        a.connect_to(&mut b, Compass4::NORTH, true).unwrap();

        assert!(a.is_saturated());
        assert!(!a.is_open(Compass4::EAST).unwrap());
        assert!(a.available_points().is_empty());
        match a.connect_to(&mut c, Compass4::EAST, true) {
            Err(Error(ErrorKind::NodeSaturated(_, 1), _)) => {}
            other => panic!("unexpected {:?}", other),
        }
        assert_eq!(c.occupied_count(), 0);
    }

    #[test]
    fn failed_reverse_connection_leaves_no_half_edge() {
        let mut a = node4("a", 4);
        let mut b = node4("b", 1);
        let mut c = node4("c", 4);
        b.connect_to(&mut c, Compass4::NORTH, true).unwrap();

        // b is full so the reverse edge cannot be made
        assert!(a.connect_to(&mut b, Compass4::EAST, true).is_err());
        assert_eq!(a.occupied_count(), 0);
        assert_eq!(b.occupied_count(), 1);
    }

    #[test]
    fn invalid_points() {
        let mut a = node4("a", 4);
        let mut b = node4("b", 4);
        assert!(a.is_open(4).is_err());
        assert!(a.is_occupied(17).is_err());
        assert!(a.neighbour_id_at(4).is_err());
        match a.connect_to(&mut b, 4, true) {
            Err(Error(ErrorKind::InvalidConnectionPoint(4, 4), _)) => {}
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn raising_the_cap() {
        let mut a = node4("a", 1);
        let mut b = node4("b", 4);
        let mut c = node4("c", 4);
        a.connect_to(&mut b, Compass4::NORTH, true).unwrap();
        a.raise_max_connections();
        a.connect_to(&mut c, Compass4::SOUTH, true).unwrap();
        assert_eq!(a.occupied_count(), 2);
        assert_eq!(a.max_connections(), 2);
    }

    #[test]
    fn state_snapshot() {
        let mut a = node8("a", 2);
        let mut b = node8("b", 2);
        a.connect_to(&mut b, Compass8::SOUTH_EAST, true).unwrap();
        let state = a.state();
        assert_eq!(state.id, NodeId::new("a"));
        assert_eq!(state.topology, "compass-8");
        assert_eq!(state.max_connections, 2);
        assert_eq!(state.neighbours.len(), 8);
        assert_eq!(state.neighbours[Compass8::SOUTH_EAST], Some(NodeId::new("b")));
        assert_eq!(state.location.values.len(), 2);
    }
}
