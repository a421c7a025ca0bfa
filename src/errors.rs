// Error, ErrorKind, ResultExt and the Result alias for the whole library.
//
// The kinds fall into three families:
// - range errors: a connection point or an axis that does not exist for the topology/location
// - state errors: an edit that would break a node or maze invariant
// - not found: a query naming a node that is not there, or a route that does not exist
#![allow(deprecated)]

use error_chain::error_chain;

error_chain! {

    errors {
        InvalidConnectionPoint(point: usize, count: usize) {
            description("invalid connection point")
            display("connection point {} is out of range for a topology with {} points", point, count)
        }
        OddConnectionPoints(count: usize) {
            description("odd connection point count")
            display("opposite points need an even connection point count, the topology has {}", count)
        }
        AxisOutOfRange(axis: usize, dimensionality: usize) {
            description("location axis out of range")
            display("axis {} does not exist on a location of dimensionality {}", axis, dimensionality)
        }
        DimensionMismatch(expected: usize, actual: usize) {
            description("location dimensionality mismatch")
            display("expected a location of dimensionality {}, found {}", expected, actual)
        }
        TopologyMismatch(expected: String, actual: String) {
            description("node topology mismatch")
            display("expected a node using topology {}, found {}", expected, actual)
        }
        DuplicateLocation(location: String) {
            description("duplicate node location")
            display("a node already occupies location {}", location)
        }
        DuplicateNodeId(id: String) {
            description("duplicate node id")
            display("a node with id '{}' is already registered", id)
        }
        SlotOccupied(id: String, point: usize) {
            description("connection point occupied")
            display("node '{}' already has a neighbour at connection point {}", id, point)
        }
        NodeSaturated(id: String, max_connections: usize) {
            description("node saturated")
            display("node '{}' is already at its maximum of {} connections", id, max_connections)
        }
        DuplicatePathEntry(id: String) {
            description("duplicate path entry")
            display("node '{}' is already on the path", id)
        }
        UnknownNode(id: String) {
            description("unknown node")
            display("no node with id '{}'", id)
        }
        NoPath(from: String, to: String) {
            description("no path")
            display("there is no path from '{}' to '{}'", from, to)
        }
    }
}
