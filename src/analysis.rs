use error_chain::bail;
use smallvec::SmallVec;

use crate::errors::*;
use crate::location::Location;
use crate::maze::Maze;
use crate::node::NodeId;
use crate::topology::CompassPrimary;
use crate::units::{Height, Width};
use crate::utils::{self, FnvHashMap};

/// The nodes seen first when looking into the maze from each side of its bounding box.
///
/// Every row is looked at from the west and from the east, every column from the north and
/// from the south. Whatever is hit first is a frontier node for that side: there is only open
/// space between it and the edge. Keys are the connection points facing out of that side.
#[derive(Debug, Clone)]
pub struct Analysis {
    frontiers: FnvHashMap<usize, Vec<NodeId>>,
    cardinal_points: SmallVec<[(CompassPrimary, usize); 4]>,
    width: Width,
    height: Height,
}

impl Analysis {
    /// One sweep over the `width x height` box, independent of how many nodes there are.
    pub fn new(maze: &Maze) -> Result<Analysis> {
        let index = maze.location_index()?;
        let (width, height) = (maze.width(), maze.height());
        let topology = maze.topology();
        if topology.dimensionality() != 2 {
            bail!(ErrorKind::DimensionMismatch(2, topology.dimensionality()));
        }

        let cardinal_points = CompassPrimary::all()
            .iter()
            .map(|&cardinal| (cardinal, topology.cardinal_point(cardinal)))
            .collect::<SmallVec<[(CompassPrimary, usize); 4]>>();
        let point_of = |cardinal: CompassPrimary| topology.cardinal_point(cardinal);

        let mut frontiers: FnvHashMap<usize, Vec<NodeId>> = utils::fnv_hashmap(4);
        for &(_, point) in &cardinal_points {
            frontiers.entry(point).or_insert_with(Vec::new);
        }

        let resident = |x: usize, y: usize| -> Option<NodeId> {
            index.get(&Location::new(vec![x as i64, y as i64]).encode()).cloned()
        };
        let mut record = |cardinal: CompassPrimary, id: Option<NodeId>| {
            if let Some(id) = id {
                frontiers.entry(point_of(cardinal)).or_insert_with(Vec::new).push(id);
            }
        };

        for y in 0..height.0 {
            record(CompassPrimary::West, (0..width.0).filter_map(|x| resident(x, y)).next());
            record(CompassPrimary::East, (0..width.0).rev().filter_map(|x| resident(x, y)).next());
        }
        for x in 0..width.0 {
            record(CompassPrimary::North, (0..height.0).filter_map(|y| resident(x, y)).next());
            record(CompassPrimary::South, (0..height.0).rev().filter_map(|y| resident(x, y)).next());
        }

        Ok(Analysis {
            frontiers,
            cardinal_points,
            width,
            height,
        })
    }

    /// Frontier node ids facing out through connection point `direction`, empty for any direction
    /// that is not one of the four cardinal points.
    pub fn frontier(&self, direction: usize) -> &[NodeId] {
        self.frontiers.get(&direction).map(|ids| ids.as_slice()).unwrap_or(&[])
    }

    pub fn frontier_at(&self, cardinal: CompassPrimary) -> &[NodeId] {
        self.cardinal_points
            .iter()
            .find(|&&(c, _)| c == cardinal)
            .map(|&(_, point)| self.frontier(point))
            .unwrap_or(&[])
    }

    pub fn frontiers(&self) -> &FnvHashMap<usize, Vec<NodeId>> {
        &self.frontiers
    }

    /// Which side of the bounding box connection point `direction` faces out of.
    pub fn cardinal_of(&self, direction: usize) -> Option<CompassPrimary> {
        self.cardinal_points
            .iter()
            .find(|&&(_, point)| point == direction)
            .map(|&(cardinal, _)| cardinal)
    }

    /// Is `location` on the side of the bounding box that `cardinal` names.
    pub fn touches_edge(&self, location: &Location, cardinal: CompassPrimary) -> bool {
        let (x, y) = match (location.get(0), location.get(1)) {
            (Ok(x), Ok(y)) => (x, y),
            _ => return false,
        };
        match cardinal {
            CompassPrimary::North => y == 0,
            CompassPrimary::South => y == self.height.0 as i64 - 1,
            CompassPrimary::West => x == 0,
            CompassPrimary::East => x == self.width.0 as i64 - 1,
        }
    }
}
