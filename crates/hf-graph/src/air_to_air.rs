//! Dual-stream air-to-air heat exchangers on outdoor-air systems.
//!
//! The primary stream sits on the intake chain and the secondary stream on
//! the relief chain of the same system. Exchangers partition both chains
//! into segments, and an exchanger always lands in segment `k` on both
//! chains, so several exchangers keep the same order stream for stream.

use hf_core::ObjectId;

use crate::error::{GraphError, GraphResult};
use crate::indexing::{AirStream, Placement};
use crate::model::{Endpoint, Model};
use crate::object::Shape;
use crate::port::Port;

/// Nodes of segment `k` of a system-first chain, system side first.
fn segment_nodes(model: &Model, chain: &[ObjectId], k: usize) -> Vec<ObjectId> {
    chain
        .split(|&o| model.shape(o) == Some(Shape::AirToAir))
        .nth(k)
        .map(|seg| seg.iter().copied().filter(|&o| model.is_node(o)).collect())
        .unwrap_or_default()
}

/// Resolved edits for one exchanger insertion.
#[derive(Debug)]
struct HxPlan {
    intake_node: ObjectId,
    intake_next: Endpoint,
    relief_node: ObjectId,
    relief_edge: ReliefEdge,
}

#[derive(Debug)]
enum ReliefEdge {
    /// The relief node is the outboard node: go in right in front of it.
    Before(Endpoint),
    /// Anywhere else: go in right behind the relief node.
    After(Endpoint),
}

impl Model {
    pub(crate) fn add_air_to_air_to_node(&mut self, hx: ObjectId, node: ObjectId) -> GraphResult<bool> {
        let Some(plan) = self.plan_hx(hx, node)? else {
            return Ok(false);
        };

        self.connect(plan.intake_node, Port::Outlet, hx, Port::PrimaryInlet)?;
        self.drain_into(hx, Port::PrimaryOutlet, plan.intake_next)?;

        match plan.relief_edge {
            ReliefEdge::Before(before) => {
                self.feed_into(before, hx, Port::SecondaryInlet)?;
                self.connect(hx, Port::SecondaryOutlet, plan.relief_node, Port::Inlet)?;
            }
            ReliefEdge::After(after) => {
                self.connect(plan.relief_node, Port::Outlet, hx, Port::SecondaryInlet)?;
                self.drain_into(hx, Port::SecondaryOutlet, after)?;
            }
        }
        tracing::debug!(
            hx = %hx,
            intake = %plan.intake_node,
            relief = %plan.relief_node,
            "added heat exchanger"
        );
        Ok(true)
    }

    /// Work out both splice points before anything is connected.
    fn plan_hx(&self, hx: ObjectId, node: ObjectId) -> GraphResult<Option<HxPlan>> {
        let index = self.loop_index();
        let Some(membership) = index.systems_of(node).first().copied() else {
            return Ok(None);
        };
        if !index.systems_of(hx).is_empty() || self.is_connected(hx) {
            return Ok(None);
        }
        let system = membership.system;

        let intake: Vec<ObjectId> = index.intake(system).iter().rev().copied().collect();
        let relief: Vec<ObjectId> = index.relief(system).to_vec();
        let (same, other) = match membership.stream {
            AirStream::Intake => (&intake, &relief),
            AirStream::Relief => (&relief, &intake),
        };

        let pos = same
            .iter()
            .position(|&o| o == node)
            .ok_or_else(|| GraphError::invariant(format!("node {node} missing from its chain")))?;
        let k = same[..pos]
            .iter()
            .filter(|&&o| self.shape(o) == Some(Shape::AirToAir))
            .count();
        let rank = segment_nodes(self, same, k)
            .iter()
            .position(|&o| o == node)
            .ok_or_else(|| GraphError::invariant(format!("node {node} missing from segment {k}")))?;

        let opposite_nodes = segment_nodes(self, other, k);
        let opposite = *opposite_nodes
            .get(rank.min(opposite_nodes.len().saturating_sub(1)))
            .ok_or_else(|| {
                GraphError::invariant(format!("segment {k} of the opposite stream has no node"))
            })?;

        let (intake_node, relief_node) = match membership.stream {
            AirStream::Intake => (node, opposite),
            AirStream::Relief => (opposite, node),
        };

        let intake_next = self.peer(intake_node, Port::Outlet).ok_or_else(|| {
            GraphError::invariant(format!("intake node {intake_node} has nothing downstream"))
        })?;
        let relief_edge = if self.outboard_relief_node(system) == Some(relief_node) {
            ReliefEdge::Before(self.peer(relief_node, Port::Inlet).ok_or_else(|| {
                GraphError::invariant(format!("relief node {relief_node} has nothing upstream"))
            })?)
        } else {
            ReliefEdge::After(self.peer(relief_node, Port::Outlet).ok_or_else(|| {
                GraphError::invariant(format!("relief node {relief_node} has nothing downstream"))
            })?)
        };

        Ok(Some(HxPlan {
            intake_node,
            intake_next,
            relief_node,
            relief_edge,
        }))
    }

    /// Take an exchanger off both streams. Each stream is repaired on its
    /// own, dropping the spacer node the insertion created.
    pub(crate) fn remove_air_to_air_streams(&mut self, hx: ObjectId) -> GraphResult<bool> {
        let mut changed = false;
        for (inlet, outlet) in [
            (Port::PrimaryInlet, Port::PrimaryOutlet),
            (Port::SecondaryInlet, Port::SecondaryOutlet),
        ] {
            let membership = self
                .loop_index()
                .systems_of(hx)
                .iter()
                .copied()
                .find(|m| m.via == inlet);
            match membership {
                Some(m) => {
                    let placement = Placement::OutdoorAir {
                        system: m.system,
                        stream: m.stream,
                    };
                    let (start, end) = self.anchors_for(placement, hx)?;
                    changed |= self.unsplice(hx, start, end, inlet, outlet)?;
                }
                None => {
                    self.disconnect(hx, inlet);
                    self.disconnect(hx, outlet);
                }
            }
        }
        Ok(changed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::object::ObjectKind;

    fn system_on_loop() -> (Model, ObjectId) {
        let mut m = Model::new();
        let l = m.add_air_loop().unwrap();
        let oa = m.add_outdoor_air_system().unwrap();
        let inlet = m.supply_inlet_node(l).unwrap();
        assert!(m.add_to_node(oa, inlet).unwrap());
        (m, oa)
    }

    #[test]
    fn exchanger_spans_both_chains() {
        let (mut m, oa) = system_on_loop();
        let hx = m.add_component(ObjectKind::HeatExchangerAirToAir);
        let outboard_oa = m.outboard_oa_node(oa).unwrap();
        let outboard_relief = m.outboard_relief_node(oa).unwrap();

        assert!(m.add_to_node(hx, outboard_oa).unwrap());

        assert_eq!(m.connected_object(hx, Port::PrimaryInlet), Some(outboard_oa));
        assert_eq!(m.connected_object(hx, Port::SecondaryOutlet), Some(outboard_relief));
        assert_eq!(m.oa_components(oa).len(), 3);
        assert_eq!(m.relief_components(oa).len(), 3);
        assert_eq!(m.outboard_oa_node(oa), Some(outboard_oa));
        assert_eq!(m.outboard_relief_node(oa), Some(outboard_relief));
    }

    #[test]
    fn exchanger_already_on_a_system_is_refused() {
        let (mut m, oa) = system_on_loop();
        let hx = m.add_component(ObjectKind::HeatExchangerAirToAir);
        let outboard_oa = m.outboard_oa_node(oa).unwrap();
        assert!(m.add_to_node(hx, outboard_oa).unwrap());

        let relief_node = m.outboard_relief_node(oa).unwrap();
        assert!(!m.add_to_node(hx, relief_node).unwrap());
    }

    #[test]
    fn loop_nodes_are_refused() {
        let (mut m, _) = system_on_loop();
        let hx = m.add_component(ObjectKind::HeatExchangerAirToAir);
        let l = m.air_loops()[0];
        let outlet = m.supply_outlet_node(l).unwrap();
        assert!(!m.add_to_node(hx, outlet).unwrap());
    }

    #[test]
    fn segments_split_on_exchangers() {
        let mut m = Model::new();
        let a = m.add_node();
        let hx = m.add_component(ObjectKind::HeatExchangerAirToAir);
        let b = m.add_node();
        let c = m.add_node();
        let chain = [a, hx, b, c];
        assert_eq!(segment_nodes(&m, &chain, 0), vec![a]);
        assert_eq!(segment_nodes(&m, &chain, 1), vec![b, c]);
        assert!(segment_nodes(&m, &chain, 2).is_empty());
    }
}
