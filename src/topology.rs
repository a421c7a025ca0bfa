//! Directional schemes for maze nodes.
//!
//! A topology decides how many connection points every node has and what each point means
//! geometrically. Points are numbered clockwise starting from north, so the point opposite
//! `p` is always half a turn away: `(p + N/2) mod N`.
//! North is towards negative y, east towards positive x.

use error_chain::bail;
use smallvec::SmallVec;
use std::fmt::Debug;

use crate::errors::*;
use crate::location::Location;

/// The four axis-aligned directions every 2D topology can express.
#[derive(Eq, PartialEq, Copy, Clone, Debug, Hash)]
pub enum CompassPrimary {
    North,
    East,
    South,
    West,
}

impl CompassPrimary {
    /// Clockwise quarter turns from north.
    #[inline]
    pub fn quarter_turns(self) -> usize {
        match self {
            CompassPrimary::North => 0,
            CompassPrimary::East => 1,
            CompassPrimary::South => 2,
            CompassPrimary::West => 3,
        }
    }

    pub fn from_quarter_turns(turns: usize) -> CompassPrimary {
        match turns % 4 {
            0 => CompassPrimary::North,
            1 => CompassPrimary::East,
            2 => CompassPrimary::South,
            _ => CompassPrimary::West,
        }
    }

    pub fn all() -> [CompassPrimary; 4] {
        [CompassPrimary::North, CompassPrimary::East, CompassPrimary::South, CompassPrimary::West]
    }
}

pub type ConnectionPointSmallVec = SmallVec<[usize; 8]>;

pub trait Topology: Debug + Send + Sync {
    /// Short identifier, e.g. for logs and snapshots.
    fn name(&self) -> &'static str;

    /// `N`, the number of neighbour slots on every node.
    fn connection_points(&self) -> usize;

    /// How many axes a location under this topology has.
    fn dimensionality(&self) -> usize;

    /// The coordinate one step away from `location` in `direction`.
    fn next_location(&self, location: &Location, direction: usize) -> Result<Location>;

    fn validate(&self, point: usize) -> Result<()> {
        let count = self.connection_points();
        if point < count {
            Ok(())
        } else {
            Err(ErrorKind::InvalidConnectionPoint(point, count).into())
        }
    }

    fn opposite(&self, point: usize) -> Result<usize> {
        let count = self.connection_points();
        if count % 2 != 0 {
            bail!(ErrorKind::OddConnectionPoints(count));
        }
        self.validate(point)?;
        Ok((point + count / 2) % count)
    }

    /// The connection point that best represents one of the four cardinal directions.
    fn cardinal_point(&self, cardinal: CompassPrimary) -> usize {
        // round(k * N / 4) without going through floats
        let count = self.connection_points();
        (2 * cardinal.quarter_turns() * count + 4) / 8 % count.max(1)
    }

    /// Snap a direction to the nearest cardinal direction.
    ///
    /// A point exactly halfway between two cardinals goes to the clockwise one, so on an eight
    /// point compass NE -> E, SE -> S, SW -> W, NW -> N.
    fn round_to_prime_cardinality(&self, point: usize) -> Result<usize> {
        self.validate(point)?;
        // round(4p / N) in integers
        let count = self.connection_points();
        let quarter = (8 * point + count) / (2 * count) % 4;
        Ok(self.cardinal_point(CompassPrimary::from_quarter_turns(quarter)))
    }

    fn prime_cardinalities(&self) -> ConnectionPointSmallVec {
        CompassPrimary::all()
            .iter()
            .map(|&cardinal| self.cardinal_point(cardinal))
            .collect()
    }

    /// Where the first node of a maze lives: the all zero location.
    fn default_location(&self) -> Location {
        Location::origin(self.dimensionality())
    }
}

/// Planar offset for one clockwise step index, shared by the square topologies.
fn planar_step(topology: &dyn Topology,
               location: &Location,
               direction: usize,
               offsets: &[(i64, i64)])
               -> Result<Location> {
    topology.validate(direction)?;
    if location.dimensionality() != 2 {
        bail!(ErrorKind::DimensionMismatch(2, location.dimensionality()));
    }
    let (dx, dy) = offsets[direction];
    let mut next = location.clone();
    next.adjust(0, dx)?;
    next.adjust(1, dy)?;
    Ok(next)
}

/// N, E, S, W.
const COMPASS_4_OFFSETS: [(i64, i64); 4] = [(0, -1), (1, 0), (0, 1), (-1, 0)];

/// N, NE, E, SE, S, SW, W, NW.
const COMPASS_8_OFFSETS: [(i64, i64); 8] = [(0, -1), (1, -1), (1, 0), (1, 1), (0, 1), (-1, 1), (-1, 0),
                                            (-1, -1)];

/// Square cells joined through their four sides.
#[derive(Eq, PartialEq, Copy, Clone, Debug, Default)]
pub struct Compass4;

impl Compass4 {
    pub const NORTH: usize = 0;
    pub const EAST: usize = 1;
    pub const SOUTH: usize = 2;
    pub const WEST: usize = 3;
}

impl Topology for Compass4 {
    fn name(&self) -> &'static str {
        "compass-4"
    }

    #[inline]
    fn connection_points(&self) -> usize {
        COMPASS_4_OFFSETS.len()
    }

    #[inline]
    fn dimensionality(&self) -> usize {
        2
    }

    fn next_location(&self, location: &Location, direction: usize) -> Result<Location> {
        planar_step(self, location, direction, &COMPASS_4_OFFSETS)
    }
}

/// Square cells joined through their sides and their corners.
#[derive(Eq, PartialEq, Copy, Clone, Debug, Default)]
pub struct Compass8;

impl Compass8 {
    pub const NORTH: usize = 0;
    pub const NORTH_EAST: usize = 1;
    pub const EAST: usize = 2;
    pub const SOUTH_EAST: usize = 3;
    pub const SOUTH: usize = 4;
    pub const SOUTH_WEST: usize = 5;
    pub const WEST: usize = 6;
    pub const NORTH_WEST: usize = 7;
}

impl Topology for Compass8 {
    fn name(&self) -> &'static str {
        "compass-8"
    }

    #[inline]
    fn connection_points(&self) -> usize {
        COMPASS_8_OFFSETS.len()
    }

    #[inline]
    fn dimensionality(&self) -> usize {
        2
    }

    fn next_location(&self, location: &Location, direction: usize) -> Result<Location> {
        planar_step(self, location, direction, &COMPASS_8_OFFSETS)
    }
}
