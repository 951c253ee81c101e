//! Whole-model structural checks.

use hf_core::ObjectId;

use crate::error::{GraphError, GraphResult};
use crate::model::Model;
use crate::object::Shape;
use crate::port::{Port, PortKind};

/// Validate the connection table and the topology conventions.
///
/// - every link has a live, symmetric partner on a valid port of opposite direction
/// - no two nodes are adjacent, except a loop side's inlet and outlet nodes
///   with nothing between them
/// - splitter and mixer branches are contiguous from 0
pub fn validate_model(model: &Model) -> GraphResult<()> {
    let links = model.raw_links();
    let mut ends: Vec<_> = links.iter().collect();
    ends.sort();

    for (here, peer) in ends {
        for end in [here, peer] {
            let Some(shape) = model.shape(end.obj) else {
                return Err(GraphError::DanglingLink {
                    obj: here.obj,
                    port: here.port,
                });
            };
            if shape.port_kind(end.port).is_none() {
                return Err(GraphError::InvalidPort {
                    obj: end.obj,
                    port: end.port,
                });
            }
        }
        if links.get(peer) != Some(here) {
            return Err(GraphError::DanglingLink {
                obj: here.obj,
                port: here.port,
            });
        }
        let here_kind = model.shape(here.obj).and_then(|s| s.port_kind(here.port));
        let peer_kind = model.shape(peer.obj).and_then(|s| s.port_kind(peer.port));
        if here_kind.map(PortKind::opposite) != peer_kind {
            return Err(GraphError::WrongDirection {
                obj: here.obj,
                port: here.port,
            });
        }
    }

    for (from, to) in model.edges() {
        if model.is_node(from.obj) && model.is_node(to.obj) && !is_empty_side(model, from.obj, to.obj) {
            return Err(GraphError::AdjacentNodes {
                upstream: from.obj,
                downstream: to.obj,
            });
        }
    }

    for obj in model.objects() {
        if !matches!(model.shape(obj), Some(Shape::Splitter | Shape::Mixer)) {
            continue;
        }
        let count = model.next_branch_index(obj);
        for (port, _) in model.connected_ports(obj) {
            if let Port::Branch(i) = port {
                if i >= count {
                    return Err(GraphError::BranchGap { obj, index: i });
                }
            }
        }
    }
    Ok(())
}

fn is_empty_side(model: &Model, upstream: ObjectId, downstream: ObjectId) -> bool {
    model.objects().filter(|&o| model.shape(o) == Some(Shape::Loop)).any(|l| {
        (model.supply_inlet_node(l) == Some(upstream)
            && model.supply_outlet_nodes(l).contains(&downstream))
            || (model.demand_inlet_node(l) == Some(upstream)
                && model.demand_outlet_node(l) == Some(downstream))
    })
}
