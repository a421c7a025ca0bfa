use serde_derive::{Deserialize, Serialize};

/// How hard the builder works: the length of every walk and the number of branch walks.
#[derive(Eq, PartialEq, Copy, Clone, Debug, Default, Serialize, Deserialize)]
pub struct Complexity(pub usize);

#[derive(Eq, PartialEq, Copy, Clone, Debug, Serialize, Deserialize)]
pub struct Width(pub usize);
#[derive(Eq, PartialEq, Copy, Clone, Debug, Serialize, Deserialize)]
pub struct Height(pub usize);

#[derive(Eq, PartialEq, Copy, Clone, Debug)]
pub struct NodesCount(pub usize);
#[derive(Eq, PartialEq, Copy, Clone, Debug)]
pub struct EdgesCount(pub usize);
