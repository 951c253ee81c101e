//! Air and plant loop queries, branch management and loop-level edits.

use std::collections::BTreeSet;

use hf_core::ObjectId;

use crate::error::{GraphError, GraphResult};
use crate::indexing::{LoopMembership, LoopSide};
use crate::model::{Endpoint, Model};
use crate::object::{ObjectKind, Shape, Target};
use crate::port::Port;

impl Model {
    fn is_loop(&self, obj: ObjectId) -> bool {
        self.shape(obj) == Some(Shape::Loop)
    }

    pub fn supply_inlet_node(&self, loop_id: ObjectId) -> Option<ObjectId> {
        self.connected_object(loop_id, Port::SupplySideInlet)
    }

    /// Supply outlet nodes in outlet order. Dual-duct air loops have two.
    pub fn supply_outlet_nodes(&self, loop_id: ObjectId) -> Vec<ObjectId> {
        (0u32..)
            .map_while(|i| self.connected_object(loop_id, Port::SupplySideOutlet(i)))
            .collect()
    }

    pub fn supply_outlet_node(&self, loop_id: ObjectId) -> Option<ObjectId> {
        self.connected_object(loop_id, Port::SupplySideOutlet(0))
    }

    pub fn demand_inlet_node(&self, loop_id: ObjectId) -> Option<ObjectId> {
        self.connected_object(loop_id, Port::DemandSideInlet)
    }

    pub fn demand_outlet_node(&self, loop_id: ObjectId) -> Option<ObjectId> {
        self.connected_object(loop_id, Port::DemandSideOutlet)
    }

    pub fn supply_splitter(&self, loop_id: ObjectId) -> Option<ObjectId> {
        self.target(loop_id, Target::SupplySplitter)
    }

    pub fn supply_mixer(&self, loop_id: ObjectId) -> Option<ObjectId> {
        self.target(loop_id, Target::SupplyMixer)
    }

    pub fn demand_splitter(&self, loop_id: ObjectId) -> Option<ObjectId> {
        self.target(loop_id, Target::DemandSplitter)
    }

    pub fn demand_mixer(&self, loop_id: ObjectId) -> Option<ObjectId> {
        self.target(loop_id, Target::DemandMixer)
    }

    pub fn supply_components(&self, loop_id: ObjectId) -> Vec<ObjectId> {
        self.loop_index().supply(loop_id).to_vec()
    }

    pub fn demand_components(&self, loop_id: ObjectId) -> Vec<ObjectId> {
        self.loop_index().demand(loop_id).to_vec()
    }

    /// Supply then demand objects.
    pub fn components(&self, loop_id: ObjectId) -> Vec<ObjectId> {
        let index = self.loop_index();
        index
            .supply(loop_id)
            .iter()
            .chain(index.demand(loop_id))
            .copied()
            .collect()
    }

    pub fn supply_component(&self, loop_id: ObjectId, obj: ObjectId) -> bool {
        self.loop_index().supply(loop_id).contains(&obj)
    }

    pub fn demand_component(&self, loop_id: ObjectId, obj: ObjectId) -> bool {
        self.loop_index().demand(loop_id).contains(&obj)
    }

    pub fn component(&self, loop_id: ObjectId, obj: ObjectId) -> bool {
        self.supply_component(loop_id, obj) || self.demand_component(loop_id, obj)
    }

    /// The outdoor-air system on an air loop's supply side, if any.
    pub fn loop_outdoor_air_system(&self, loop_id: ObjectId) -> Option<ObjectId> {
        self.loop_index()
            .supply(loop_id)
            .iter()
            .copied()
            .find(|&o| self.kind(o) == Some(ObjectKind::OutdoorAirSystem))
    }

    /// End anchor for the supply chain holding `member`.
    ///
    /// With several supply outlets, an object on the run leading to a later
    /// outlet (that outlet included) belongs to that outlet's deck. Anything
    /// else ends at the first outlet.
    pub(crate) fn supply_end_for(&self, loop_id: ObjectId, member: ObjectId) -> Option<ObjectId> {
        let outlets = self.supply_outlet_nodes(loop_id);
        outlets
            .iter()
            .skip(1)
            .copied()
            .find(|&outlet| self.upstream_run(outlet).contains(&member))
            .or_else(|| outlets.first().copied())
    }

    /// `obj` and every pass-through object feeding it, up to the first
    /// splitter, mixer or other boundary.
    fn upstream_run(&self, obj: ObjectId) -> Vec<ObjectId> {
        let mut run = vec![obj];
        let mut cursor = Endpoint::new(obj, Port::Inlet);
        while let Some(up) = self.peer(cursor.obj, cursor.port) {
            let Some(shape) = self.shape(up.obj) else {
                break;
            };
            let Some(next) = shape.paired_port(up.port) else {
                break;
            };
            if run.contains(&up.obj) {
                break;
            }
            run.push(up.obj);
            cursor = Endpoint::new(up.obj, next);
        }
        run
    }

    // ------------------------------------------------------------------
    // Branches
    // ------------------------------------------------------------------

    fn side_connectors(&self, loop_id: ObjectId, side: LoopSide) -> Option<(ObjectId, ObjectId)> {
        match side {
            LoopSide::Supply => Some((self.supply_splitter(loop_id)?, self.supply_mixer(loop_id)?)),
            LoopSide::Demand => Some((self.demand_splitter(loop_id)?, self.demand_mixer(loop_id)?)),
        }
    }

    /// The branch node of a splitter/mixer pair whose only branch is empty.
    fn single_empty_branch(&self, splitter: ObjectId, mixer: ObjectId) -> Option<ObjectId> {
        match self.branch_objects(splitter).as_slice() {
            [only] if self.is_node(*only) && self.outlet_object(*only) == Some(mixer) => Some(*only),
            _ => None,
        }
    }

    fn add_branch(&mut self, splitter: ObjectId, mixer: ObjectId) -> GraphResult<ObjectId> {
        let node = self.add_node();
        let out = self.next_outlet_port(splitter);
        let inp = self.next_inlet_port(mixer);
        self.connect(splitter, out, node, Port::Inlet)?;
        self.connect(node, Port::Outlet, mixer, inp)?;
        Ok(node)
    }

    fn drop_branch_node(&mut self, splitter: ObjectId, mixer: ObjectId, node: ObjectId) -> GraphResult<()> {
        if let Some(i) = self.branch_index_for_outlet_object(splitter, node) {
            self.remove_port_for_branch(splitter, i)?;
        }
        if let Some(i) = self.branch_index_for_inlet_object(mixer, node) {
            self.remove_port_for_branch(mixer, i)?;
        }
        self.delete(node);
        Ok(())
    }

    fn add_branch_for_component(
        &mut self,
        loop_id: ObjectId,
        comp: ObjectId,
        side: LoopSide,
        tertiary: bool,
    ) -> GraphResult<bool> {
        if !self.owns(loop_id) || !self.owns(comp) || !self.is_loop(loop_id) {
            return Ok(false);
        }
        let Some((splitter, mixer)) = self.side_connectors(loop_id, side) else {
            return Ok(false);
        };

        let (node, fresh) = match self.single_empty_branch(splitter, mixer) {
            Some(n) => (n, false),
            None => (self.add_branch(splitter, mixer)?, true),
        };
        let added = if tertiary {
            self.add_to_tertiary_node(comp, node)?
        } else {
            self.add_to_node(comp, node)?
        };
        if !added && fresh {
            self.drop_branch_node(splitter, mixer, node)?;
        }
        Ok(added)
    }

    /// Put `comp` on its own supply branch, reusing the single empty branch
    /// if that is all the side has.
    pub fn add_supply_branch_for_component(&mut self, loop_id: ObjectId, comp: ObjectId) -> GraphResult<bool> {
        self.add_branch_for_component(loop_id, comp, LoopSide::Supply, false)
    }

    /// Demand-side counterpart of [`Model::add_supply_branch_for_component`].
    /// With `tertiary`, the component's tertiary ports are used.
    pub fn add_demand_branch_for_component(
        &mut self,
        loop_id: ObjectId,
        comp: ObjectId,
        tertiary: bool,
    ) -> GraphResult<bool> {
        self.add_branch_for_component(loop_id, comp, LoopSide::Demand, tertiary)
    }

    /// Walk from `comp` up to the splitter and down to the mixer of the
    /// branch it sits on. Returns the splitter and mixer endpoints plus every
    /// object on the branch.
    fn branch_run(&self, comp: ObjectId, via: Port) -> Option<(Endpoint, Endpoint, Vec<ObjectId>)> {
        let limit = self.object_count();
        let mut members = vec![comp];

        let mut cursor = Endpoint::new(comp, via);
        let splitter = loop {
            let up = self.peer(cursor.obj, cursor.port)?;
            match self.shape(up.obj)? {
                Shape::Splitter => break up,
                s if s.is_pass_through() && members.len() <= limit => {
                    members.push(up.obj);
                    cursor = Endpoint::new(up.obj, s.paired_port(up.port)?);
                }
                _ => return None,
            }
        };

        let out = self.shape(comp)?.paired_port(via)?;
        let mut cursor = Endpoint::new(comp, out);
        let mixer = loop {
            let down = self.peer(cursor.obj, cursor.port)?;
            match self.shape(down.obj)? {
                Shape::Mixer => break down,
                s if s.is_pass_through() && members.len() <= limit => {
                    members.push(down.obj);
                    cursor = Endpoint::new(down.obj, s.paired_port(down.port)?);
                }
                _ => return None,
            }
        };
        Some((splitter, mixer, members))
    }

    fn remove_branch_with_component(
        &mut self,
        loop_id: ObjectId,
        comp: ObjectId,
        side: LoopSide,
    ) -> GraphResult<bool> {
        if !self.owns(loop_id) || !self.owns(comp) {
            return Ok(false);
        }
        let Some((splitter, mixer)) = self.side_connectors(loop_id, side) else {
            return Ok(false);
        };
        let membership = self
            .loop_memberships(comp)
            .into_iter()
            .find(|m: &LoopMembership| m.loop_id == loop_id && m.side == side);
        let Some(membership) = membership else {
            return Ok(false);
        };
        let Some((s_end, m_end, members)) = self.branch_run(comp, membership.via) else {
            return Ok(false);
        };
        if s_end.obj != splitter || m_end.obj != mixer {
            return Ok(false);
        }

        let (Port::Branch(si), Port::Branch(mi)) = (s_end.port, m_end.port) else {
            return Err(GraphError::invariant("branch run does not end on branch ports"));
        };
        self.remove_port_for_branch(splitter, si)?;
        self.remove_port_for_branch(mixer, mi)?;

        let (nodes, others): (Vec<ObjectId>, Vec<ObjectId>) =
            members.into_iter().partition(|&o| self.is_node(o));
        for n in nodes {
            self.delete(n);
        }
        for o in others {
            self.remove(o)?;
        }
        self.ensure_branch(splitter, mixer)?;
        tracing::debug!(loop_id = %loop_id, comp = %comp, ?side, "removed branch");
        Ok(true)
    }

    /// Remove the whole supply branch holding `comp`, including `comp`.
    pub fn remove_supply_branch_with_component(&mut self, loop_id: ObjectId, comp: ObjectId) -> GraphResult<bool> {
        self.remove_branch_with_component(loop_id, comp, LoopSide::Supply)
    }

    /// Remove the whole demand branch holding `comp`, including `comp`.
    pub fn remove_demand_branch_with_component(&mut self, loop_id: ObjectId, comp: ObjectId) -> GraphResult<bool> {
        self.remove_branch_with_component(loop_id, comp, LoopSide::Demand)
    }

    // ------------------------------------------------------------------
    // Loop-level edits
    // ------------------------------------------------------------------

    /// Split an air loop's supply outlet into two decks.
    ///
    /// A supply splitter goes in front of the existing outlet node; branch 0
    /// keeps that node, branch 1 gets a new second outlet node.
    pub fn make_dual_duct(&mut self, loop_id: ObjectId) -> GraphResult<bool> {
        if self.kind(loop_id) != Some(ObjectKind::AirLoop)
            || self.supply_splitter(loop_id).is_some()
            || self.supply_outlet_nodes(loop_id).len() != 1
        {
            return Ok(false);
        }
        let Some(outlet) = self.supply_outlet_node(loop_id) else {
            return Ok(false);
        };
        let up = self.peer(outlet, Port::Inlet).ok_or_else(|| {
            GraphError::invariant(format!("supply outlet node {outlet} has nothing upstream"))
        })?;

        let splitter = self.insert(ObjectKind::SupplySplitter);
        if self.is_node(up.obj) {
            self.connect(up.obj, up.port, splitter, Port::Inlet)?;
        } else {
            let spacer = self.add_node();
            self.connect(up.obj, up.port, spacer, Port::Inlet)?;
            self.connect(spacer, Port::Outlet, splitter, Port::Inlet)?;
        }
        self.connect(splitter, Port::Branch(0), outlet, Port::Inlet)?;

        let second = self.add_node();
        self.connect(splitter, Port::Branch(1), second, Port::Inlet)?;
        self.connect(second, Port::Outlet, loop_id, Port::SupplySideOutlet(1))?;
        self.set_target(loop_id, Target::SupplySplitter, Some(splitter))?;
        tracing::debug!(loop_id = %loop_id, "made dual duct");
        Ok(true)
    }

    /// Remove a loop with everything found only on it.
    ///
    /// Objects also sitting on another loop (water-to-water devices) are
    /// only disconnected from this one.
    pub(crate) fn remove_loop(&mut self, loop_id: ObjectId) -> GraphResult<Vec<ObjectId>> {
        let index = self.loop_index();
        let mut doomed: BTreeSet<ObjectId> = BTreeSet::new();
        let mut detach: Vec<(ObjectId, Port)> = Vec::new();

        for &member in index.supply(loop_id).iter().chain(index.demand(loop_id)) {
            let memberships = index.loops_of(member);
            if memberships.iter().any(|m| m.loop_id != loop_id) {
                for m in memberships.iter().filter(|m| m.loop_id == loop_id) {
                    detach.push((member, m.via));
                }
                continue;
            }
            doomed.insert(member);
            if self.kind(member) == Some(ObjectKind::OutdoorAirSystem) {
                doomed.extend(index.intake(member).iter().copied());
                doomed.extend(index.relief(member).iter().copied());
            }
        }

        for (member, via) in detach {
            self.disconnect(member, via);
            if let Some(other) = self.shape(member).and_then(|s| s.paired_port(via)) {
                self.disconnect(member, other);
            }
        }
        let mut removed = Vec::new();
        for obj in doomed {
            removed.extend(self.delete_with_children(obj));
        }
        removed.extend(self.delete_with_children(loop_id));
        tracing::debug!(loop_id = %loop_id, removed = removed.len(), "removed loop");
        Ok(removed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn plant_loop_sides_read_in_flow_order() {
        let mut m = Model::new();
        let l = m.add_plant_loop().unwrap();
        let supply = m.supply_components(l);
        assert_eq!(supply.len(), 5);
        assert_eq!(supply[0], m.supply_inlet_node(l).unwrap());
        assert_eq!(supply[1], m.supply_splitter(l).unwrap());
        assert_eq!(supply[3], m.supply_mixer(l).unwrap());
        assert_eq!(supply[4], m.supply_outlet_node(l).unwrap());
        assert_eq!(m.demand_components(l).len(), 5);
        assert_eq!(m.components(l).len(), 10);
    }

    #[test]
    fn branches_are_walked_in_index_order() {
        let mut m = Model::new();
        let l = m.add_plant_loop().unwrap();
        let a = m.add_component(ObjectKind::Boiler);
        let b = m.add_component(ObjectKind::Pump);
        assert!(m.add_supply_branch_for_component(l, a).unwrap());
        assert!(m.add_supply_branch_for_component(l, b).unwrap());

        let splitter = m.supply_splitter(l).unwrap();
        assert_eq!(m.next_branch_index(splitter), 2);
        let supply = m.supply_components(l);
        let pos = |o| supply.iter().position(|&x| x == o).unwrap();
        assert!(pos(a) < pos(b));
        assert!(pos(b) < pos(m.supply_mixer(l).unwrap()));
        assert_eq!(supply.len(), 2 + 3 + 3 + 2);
    }

    #[test]
    fn removing_a_branch_keeps_one_empty_branch() {
        let mut m = Model::new();
        let l = m.add_plant_loop().unwrap();
        let boiler = m.add_component(ObjectKind::Boiler);
        assert!(m.add_supply_branch_for_component(l, boiler).unwrap());
        assert_eq!(m.supply_components(l).len(), 7);

        assert!(m.remove_supply_branch_with_component(l, boiler).unwrap());
        assert!(!m.owns(boiler));
        assert_eq!(m.supply_components(l).len(), 5);
        let splitter = m.supply_splitter(l).unwrap();
        assert_eq!(m.next_branch_index(splitter), 1);
    }

    #[test]
    fn failed_branch_add_leaves_no_branch_behind() {
        let mut m = Model::new();
        let l = m.add_plant_loop().unwrap();
        let first = m.add_component(ObjectKind::Boiler);
        assert!(m.add_supply_branch_for_component(l, first).unwrap());

        // A controller has no ports to splice with.
        let controller = m.add_component(ObjectKind::ControllerOutdoorAir);
        assert!(!m.add_supply_branch_for_component(l, controller).unwrap());
        assert_eq!(m.next_branch_index(m.supply_splitter(l).unwrap()), 1);
        assert_eq!(m.supply_components(l).len(), 7);
    }

    #[test]
    fn dual_duct_adds_second_outlet() {
        let mut m = Model::new();
        let l = m.add_air_loop().unwrap();
        assert!(m.make_dual_duct(l).unwrap());
        assert!(!m.make_dual_duct(l).unwrap());

        let outlets = m.supply_outlet_nodes(l);
        assert_eq!(outlets.len(), 2);
        let splitter = m.supply_splitter(l).unwrap();
        assert_eq!(m.branch_objects(splitter), outlets);
        assert_eq!(m.supply_end_for(l, outlets[1]), Some(outlets[1]));
        assert_eq!(m.supply_end_for(l, outlets[0]), Some(outlets[0]));
    }

    #[test]
    fn removing_a_loop_keeps_shared_devices() {
        let mut m = Model::new();
        let chilled = m.add_plant_loop().unwrap();
        let condenser = m.add_plant_loop().unwrap();
        let chiller = m.add_component(ObjectKind::Chiller);
        assert!(m.add_supply_branch_for_component(chilled, chiller).unwrap());
        assert!(m.add_demand_branch_for_component(condenser, chiller, false).unwrap());

        let removed = m.remove(condenser).unwrap();
        assert!(removed.contains(&condenser));
        assert!(!removed.contains(&chiller));
        assert!(m.owns(chiller));
        assert_eq!(m.secondary_plant_loop(chiller), None);
        assert_eq!(m.plant_loop(chiller), Some(chilled));
        assert_eq!(m.peer(chiller, Port::DemandInlet), None);
    }
}
