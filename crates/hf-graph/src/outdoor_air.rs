//! Outdoor-air systems: the compound object bridging an air loop's return
//! and mixed-air path, with its intake and relief chains.

use std::collections::BTreeSet;

use hf_core::ObjectId;

use crate::error::GraphResult;
use crate::indexing::{LoopSide, Placement};
use crate::model::Model;
use crate::object::{ObjectKind, Shape, Target};
use crate::port::Port;

impl Model {
    /// Intake chain, outboard node first. Derived by walking the links.
    pub fn oa_components(&self, system: ObjectId) -> Vec<ObjectId> {
        self.loop_index().intake(system).to_vec()
    }

    /// Relief chain, system side first. Derived by walking the links.
    pub fn relief_components(&self, system: ObjectId) -> Vec<ObjectId> {
        self.loop_index().relief(system).to_vec()
    }

    /// The node where outdoor air enters the intake chain.
    pub fn outboard_oa_node(&self, system: ObjectId) -> Option<ObjectId> {
        let first = *self.loop_index().intake(system).first()?;
        self.is_node(first).then_some(first)
    }

    /// The node where relief air leaves the relief chain.
    pub fn outboard_relief_node(&self, system: ObjectId) -> Option<ObjectId> {
        let last = *self.loop_index().relief(system).last()?;
        self.is_node(last).then_some(last)
    }

    pub fn controller_outdoor_air(&self, system: ObjectId) -> Option<ObjectId> {
        self.target(system, Target::Controller)
    }

    /// Splice an outdoor-air system into an air loop's supply side at `node`.
    ///
    /// Refused unless `node` is on the supply side of an air loop that has
    /// no outdoor-air system yet and `system` is not attached anywhere.
    pub(crate) fn add_outdoor_air_system_to_node(
        &mut self,
        system: ObjectId,
        node: ObjectId,
    ) -> GraphResult<bool> {
        let Some(
            placement @ Placement::Loop {
                loop_id,
                side: LoopSide::Supply,
            },
        ) = self.placement(node)
        else {
            return Ok(false);
        };
        if self.kind(loop_id) != Some(ObjectKind::AirLoop) {
            return Ok(false);
        }
        if let Some(existing) = self.loop_outdoor_air_system(loop_id) {
            tracing::warn!(
                loop_id = %loop_id,
                existing = %existing,
                "air loop already has an outdoor-air system"
            );
            return Ok(false);
        }
        if self.peer(system, Port::ReturnAir).is_some() || self.peer(system, Port::MixedAir).is_some() {
            return Ok(false);
        }

        let (start, end) = self.anchors_for(placement, node)?;
        self.splice_at_node(system, node, start, end, Port::ReturnAir, Port::MixedAir)
    }

    /// Remove the system, both of its chains and its controller, and repair
    /// the air loop it sat on.
    pub(crate) fn remove_outdoor_air_system(&mut self, system: ObjectId) -> GraphResult<Vec<ObjectId>> {
        let index = self.loop_index();
        let chains: BTreeSet<ObjectId> = index
            .intake(system)
            .iter()
            .chain(index.relief(system))
            .copied()
            .collect();
        let anchors = match self.placement(system) {
            Some(placement @ Placement::Loop { .. }) => Some(self.anchors_for(placement, system)?),
            _ => None,
        };

        let mut removed = Vec::new();
        for obj in chains {
            if matches!(self.shape(obj), Some(Shape::WaterToWater { .. })) {
                self.detach_from_plant_loops(obj)?;
            }
            removed.extend(self.delete_with_children(obj));
        }
        self.disconnect(system, Port::OutdoorAir);
        self.disconnect(system, Port::ReliefAir);

        match anchors {
            Some((start, end)) => {
                self.unsplice(system, start, end, Port::ReturnAir, Port::MixedAir)?;
            }
            None => {
                self.disconnect(system, Port::ReturnAir);
                self.disconnect(system, Port::MixedAir);
            }
        }
        removed.extend(self.delete_with_children(system));
        tracing::debug!(system = %system, removed = removed.len(), "removed outdoor-air system");
        Ok(removed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fresh_system_has_bare_chains() {
        let mut m = Model::new();
        let oa = m.add_outdoor_air_system().unwrap();
        assert_eq!(m.oa_components(oa).len(), 1);
        assert_eq!(m.relief_components(oa).len(), 1);
        assert!(m.outboard_oa_node(oa).is_some());
        assert!(m.controller_outdoor_air(oa).is_some());
    }

    #[test]
    fn only_one_system_per_loop() {
        let mut m = Model::new();
        let l = m.add_air_loop().unwrap();
        let first = m.add_outdoor_air_system().unwrap();
        let second = m.add_outdoor_air_system().unwrap();
        let inlet = m.supply_inlet_node(l).unwrap();
        let outlet = m.supply_outlet_node(l).unwrap();

        assert!(m.add_to_node(first, inlet).unwrap());
        assert!(!m.add_to_node(second, outlet).unwrap());
        assert!(!m.add_to_node(first, outlet).unwrap());
        assert_eq!(m.loop_outdoor_air_system(l), Some(first));
    }

    #[test]
    fn plant_and_demand_nodes_are_refused() {
        let mut m = Model::new();
        let plant = m.add_plant_loop().unwrap();
        let air = m.add_air_loop().unwrap();
        let oa = m.add_outdoor_air_system().unwrap();
        assert!(!m.add_to_node(oa, m.supply_inlet_node(plant).unwrap()).unwrap());
        assert!(!m.add_to_node(oa, m.demand_inlet_node(air).unwrap()).unwrap());
    }

    #[test]
    fn removal_takes_chains_and_controller() {
        let mut m = Model::new();
        let l = m.add_air_loop().unwrap();
        let oa = m.add_outdoor_air_system().unwrap();
        let controller = m.controller_outdoor_air(oa).unwrap();
        let inlet = m.supply_inlet_node(l).unwrap();
        assert!(m.add_to_node(oa, inlet).unwrap());
        let hx = m.add_component(ObjectKind::HeatExchangerAirToAir);
        assert!(m.add_to_node(hx, m.outboard_oa_node(oa).unwrap()).unwrap());

        let removed = m.remove(oa).unwrap();
        assert!(removed.contains(&oa));
        assert!(removed.contains(&controller));
        assert!(removed.contains(&hx));
        assert!(!m.owns(hx));
        assert_eq!(m.supply_components(l).len(), 2);
        assert_eq!(m.outlet_object(inlet), m.supply_outlet_node(l));
        // loop (1) + 5 demand objects + 2 supply nodes
        assert_eq!(m.object_count(), 8);
    }
}
