use docopt::Docopt;
use error_chain::bail;
use serde_derive::Deserialize;
use mazegraph::{
    exits::ExitMode,
    maze::Maze,
    pathing::PathFinder,
    topology::{Compass4, Compass8, Topology},
    units::{Complexity, EdgesCount, NodesCount},
    MazeBuilder,
};
use std::{
    io,
    io::prelude::*,
    fs::File,
    sync::Arc
};
use tracing::{info, Level};
use tracing_subscriber::fmt::SubscriberBuilder;

const USAGE: &str = "Maze graphs

Usage:
    maze_driver -h | --help
    maze_driver [--complexity=<n>] [--topology=<t>] [--exits=<mode>] [--seed=<n>] [--range=<n>] [--save-edges=<path>] [--verbose]

Options:
    -h --help              Show this screen.
    --complexity=<n>       Length of the primary walk, the number of branches and the length of each branch [default: 12].
    --topology=<t>         Directions out of each node: 4 (compass points) or 8 (with the diagonals) [default: 4].
    --exits=<mode>         Where the start and finish go: internal, sealed or open [default: internal].
    --seed=<n>             Seed for the random number generator. Random if not given.
    --range=<n>            Also count the nodes fewer than n steps from the start.
    --save-edges=<path>    Serialize the maze to a text file: each line is a pair of numbers. Line 1: n(#vertices) m(#edges). Line 2+ edge between vertices. Uses 1-based vertex indices.
    --verbose              Log the generation phases.
";
#[derive(Debug, Deserialize)]
struct MazeArgs {
    flag_complexity: usize,
    flag_topology: usize,
    flag_exits: String,
    flag_seed: Option<u64>,
    flag_range: Option<usize>,
    flag_save_edges: String,
    flag_verbose: bool,
}

mod errors {
    #![allow(deprecated)]
    use error_chain::*;
    error_chain! {

        links {
            Maze(::mazegraph::errors::Error, ::mazegraph::errors::ErrorKind);
        }

        foreign_links {
            DocOptFailure(::docopt::Error);
            Io(::std::io::Error);
        }
    }
}
use crate::errors::*;

fn main() -> Result<()> {

    let args: MazeArgs = Docopt::new(USAGE).and_then(|d| d.deserialize())?;

    SubscriberBuilder::default()
        .with_max_level(if args.flag_verbose { Level::DEBUG } else { Level::INFO })
        .with_target(false)
        .init();

    let topology: Arc<dyn Topology> = match args.flag_topology {
        4 => Arc::new(Compass4),
        8 => Arc::new(Compass8),
        other => bail!("Unsupported topology {}, expected 4 or 8", other),
    };
    let exit_mode = args.flag_exits.parse::<ExitMode>()?;

    let mut builder = MazeBuilder::new(topology)
        .complexity(Complexity(args.flag_complexity))
        .exit_mode(exit_mode);
    if let Some(seed) = args.flag_seed {
        builder = builder.seed(seed);
    }
    let maze = builder.build()?;

    print_summary(&maze, args.flag_range)?;

    if !args.flag_save_edges.is_empty() {

        save_maze_graph(&maze, &args.flag_save_edges)?;
        info!(path = %args.flag_save_edges, "edges saved");
    }

    Ok(())
}

fn print_summary(maze: &Maze, range: Option<usize>) -> Result<()> {

    let (NodesCount(nodes), EdgesCount(links)) = maze.graph_size();
    println!("topology:   {}", maze.topology().name());
    println!("nodes:      {}", nodes);
    println!("links:      {}", links);
    println!("dimensions: {:?}", maze.dimensions());

    let start = match maze.start() {
        Some(start) => start,
        None => return Ok(()),
    };
    println!("start:      {} at {}", start.id(), start.location());

    let mut finder = PathFinder::new();
    if let Some(finish) = maze.finish() {
        println!("finish:     {} at {}", finish.id(), finish.location());
        let path = finder.find_path(start.id(), finish.id(), maze)?;
        println!("route:      {} steps", path.steps());
    } else {
        println!("finish:     none");
    }

    if let Some(range) = range {
        let nearby = finder.tiles_within_range(start.id(), range, maze)?;
        println!("within {}:  {} nodes", range, nearby.len());
    }

    Ok(())
}

fn write_text_to_file(data: &str, file_name: &str) -> io::Result<()> {
    let mut f = File::create(file_name)?;
    f.write_all(data.as_bytes())?;
    Ok(())
}

fn save_maze_graph(maze: &Maze, file_path: &str) -> Result<()> {

    let (NodesCount(vertices_count), EdgesCount(edges_count)) = maze.graph_size();
    let mut graph_data = String::new();
    graph_data.push_str(vertices_count.to_string().as_ref());
    graph_data.push(' ');
    graph_data.push_str(edges_count.to_string().as_ref());
    graph_data.push('\n');

    for (index_a, index_b) in maze.iter_link_indices() {
        let src_as_1_based_index = index_a + 1;
        let dst_as_1_based_index = index_b + 1;

        graph_data.push_str(src_as_1_based_index.to_string().as_ref());
        graph_data.push(' ');
        graph_data.push_str(dst_as_1_based_index.to_string().as_ref());
        graph_data.push('\n');
    }

    write_text_to_file(&graph_data, file_path)
        .chain_err(|| format!("Failed to write maze graph to text file {}", file_path))?;

    Ok(())
}
