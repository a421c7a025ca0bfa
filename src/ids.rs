use crate::node::NodeId;

/// The id of the first node of every maze.
pub const ORIGIN_ID: &str = "Origin";

/// Hands out the ids for nodes, fabricated exits and path results.
///
/// Each maze builder and path finder owns its own generator, so two builds with the same seed
/// produce identical ids and nothing needs resetting between runs.
#[derive(Debug, Clone, Default)]
pub struct IdGenerator {
    nodes: usize,
    exits: usize,
    paths: usize,
}

impl IdGenerator {
    pub fn new() -> IdGenerator {
        IdGenerator::default()
    }

    pub fn origin(&self) -> NodeId {
        NodeId::new(ORIGIN_ID)
    }

    pub fn next_node_id(&mut self) -> NodeId {
        self.nodes += 1;
        NodeId(format!("node-{}", self.nodes))
    }

    pub fn next_exit_id(&mut self) -> NodeId {
        self.exits += 1;
        NodeId(format!("EXIT-{}", self.exits))
    }

    pub fn next_path_id(&mut self) -> String {
        self.paths += 1;
        format!("path-{}", self.paths)
    }
}
