//! **mazegraph** generates mazes as sparse graphs by random walks over a pluggable direction
//! topology, places entrances and exits on them, and finds routes through them.
//!
//! A maze is not a grid: only the visited spots exist, each as a node with a fixed number of
//! direction slots of which a random few may be used.

pub mod analysis;
pub mod builder;
pub mod errors;
pub mod exits;
pub mod ids;
pub mod location;
pub mod maze;
pub mod node;
pub mod pathing;
pub mod topology;
pub mod units;
pub mod utils;

pub use crate::builder::MazeBuilder;
pub use crate::exits::ExitMode;
pub use crate::maze::Maze;
pub use crate::node::{Node, NodeId};
pub use crate::pathing::{PathFinder, PathResult};
pub use crate::topology::{Compass4, Compass8, Topology};
