//! Water-to-water devices bridging plant loops.
//!
//! The supply port pair sits on one loop, the demand pair on another and,
//! for chillers with heat recovery, the tertiary pair on a third.

use hf_core::ObjectId;

use crate::error::GraphResult;
use crate::indexing::{LoopSide, Placement};
use crate::model::Model;
use crate::object::{ObjectKind, Shape};
use crate::port::Port;

impl Model {
    /// Plant loop and side of `node`, if it sits on a plant loop.
    fn plant_side_of(&self, node: ObjectId) -> Option<(ObjectId, LoopSide)> {
        match self.placement(node)? {
            Placement::Loop { loop_id, side } if self.kind(loop_id) == Some(ObjectKind::PlantLoop) => {
                Some((loop_id, side))
            }
            _ => None,
        }
    }

    pub(crate) fn add_water_to_water_to_node(&mut self, comp: ObjectId, node: ObjectId) -> GraphResult<bool> {
        if self.touches(node, comp) {
            return Ok(false);
        }
        let Some((loop_id, side)) = self.plant_side_of(node) else {
            return Ok(false);
        };

        // A heat-recovery chiller already serving a condenser loop goes onto
        // a second demand side through its tertiary ports.
        if side == LoopSide::Demand && self.shape(comp) == Some(Shape::WaterToWater { tertiary: true }) {
            if let Some(condenser) = self.secondary_plant_loop(comp) {
                if condenser != loop_id && self.tertiary_plant_loop(comp).is_none() {
                    tracing::warn!(
                        comp = %comp,
                        loop_id = %loop_id,
                        "condenser loop already set, connecting to the tertiary (heat recovery) loop"
                    );
                    return self.add_to_tertiary_node(comp, node);
                }
            }
        }

        let (inlet, outlet, conflicts) = match side {
            LoopSide::Supply => (
                Port::SupplyInlet,
                Port::SupplyOutlet,
                [self.secondary_plant_loop(comp), self.tertiary_plant_loop(comp)],
            ),
            LoopSide::Demand => (
                Port::DemandInlet,
                Port::DemandOutlet,
                [self.plant_loop(comp), self.tertiary_plant_loop(comp)],
            ),
        };
        if conflicts.contains(&Some(loop_id)) {
            return Ok(false);
        }
        let placement = Placement::Loop { loop_id, side };
        self.anchors_for(placement, node)?;

        self.remove_port_pair(comp, inlet, outlet)?;
        let (start, end) = self.anchors_for(placement, node)?;
        self.splice_at_node(comp, node, start, end, inlet, outlet)
    }

    /// Connect the tertiary port pair next to `node`.
    pub fn add_to_tertiary_node(&mut self, comp: ObjectId, node: ObjectId) -> GraphResult<bool> {
        if !self.owns(comp) || !self.owns(node) || !self.is_node(node) {
            return Ok(false);
        }
        if self.shape(comp) != Some(Shape::WaterToWater { tertiary: true }) || self.touches(node, comp) {
            return Ok(false);
        }
        let Some((loop_id, side)) = self.plant_side_of(node) else {
            return Ok(false);
        };
        if [self.plant_loop(comp), self.secondary_plant_loop(comp)].contains(&Some(loop_id)) {
            return Ok(false);
        }
        let placement = Placement::Loop { loop_id, side };
        self.anchors_for(placement, node)?;

        self.remove_from_tertiary_plant_loop(comp)?;
        let (start, end) = self.anchors_for(placement, node)?;
        self.splice_at_node(comp, node, start, end, Port::TertiaryInlet, Port::TertiaryOutlet)
    }

    /// Take the supply port pair off its loop.
    pub fn remove_from_plant_loop(&mut self, comp: ObjectId) -> GraphResult<bool> {
        self.remove_port_pair(comp, Port::SupplyInlet, Port::SupplyOutlet)
    }

    /// Take the demand port pair off its loop.
    pub fn remove_from_secondary_plant_loop(&mut self, comp: ObjectId) -> GraphResult<bool> {
        self.remove_port_pair(comp, Port::DemandInlet, Port::DemandOutlet)
    }

    /// Take the tertiary port pair off its loop.
    pub fn remove_from_tertiary_plant_loop(&mut self, comp: ObjectId) -> GraphResult<bool> {
        if self.shape(comp) != Some(Shape::WaterToWater { tertiary: true }) {
            return Ok(false);
        }
        self.remove_port_pair(comp, Port::TertiaryInlet, Port::TertiaryOutlet)
    }

    pub(crate) fn detach_from_plant_loops(&mut self, comp: ObjectId) -> GraphResult<bool> {
        let a = self.remove_from_plant_loop(comp)?;
        let b = self.remove_from_secondary_plant_loop(comp)?;
        let c = self.remove_from_tertiary_plant_loop(comp)?;
        Ok(a || b || c)
    }

    fn remove_port_pair(&mut self, comp: ObjectId, inlet: Port, outlet: Port) -> GraphResult<bool> {
        match self.membership_via(comp, inlet) {
            Some(m) => {
                let placement = Placement::Loop {
                    loop_id: m.loop_id,
                    side: m.side,
                };
                let (start, end) = self.anchors_for(placement, comp)?;
                self.unsplice(comp, start, end, inlet, outlet)
            }
            None => {
                // Not on a loop: just let go of whatever is attached.
                self.disconnect(comp, inlet);
                self.disconnect(comp, outlet);
                Ok(false)
            }
        }
    }
}
