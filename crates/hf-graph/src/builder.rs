//! Constructors for objects and for the fixed topologies of loops and
//! outdoor-air systems.

use hf_core::ObjectId;

use crate::error::GraphResult;
use crate::model::Model;
use crate::object::{ObjectKind, Target};
use crate::port::Port;

impl Model {
    /// Add a fresh, unconnected node.
    pub fn add_node(&mut self) -> ObjectId {
        self.insert(ObjectKind::Node)
    }

    /// Add a fresh, unconnected object of `kind`.
    ///
    /// Loops and outdoor-air systems come with internal structure; use
    /// [`Model::add_air_loop`], [`Model::add_plant_loop`] and
    /// [`Model::add_outdoor_air_system`] for those.
    pub fn add_component(&mut self, kind: ObjectKind) -> ObjectId {
        self.insert(kind)
    }

    /// Add an air loop.
    ///
    /// Supply side: inlet node directly followed by the outlet node.
    /// Demand side: inlet node, zone splitter, one branch node, zone mixer,
    /// outlet node.
    pub fn add_air_loop(&mut self) -> GraphResult<ObjectId> {
        let air_loop = self.insert(ObjectKind::AirLoop);

        let supply_inlet = self.add_node();
        let supply_outlet = self.add_node();
        self.connect(air_loop, Port::SupplySideInlet, supply_inlet, Port::Inlet)?;
        self.connect(supply_inlet, Port::Outlet, supply_outlet, Port::Inlet)?;
        self.connect(supply_outlet, Port::Outlet, air_loop, Port::SupplySideOutlet(0))?;

        let (splitter, mixer) = self.build_side(
            air_loop,
            Port::DemandSideInlet,
            Port::DemandSideOutlet,
            ObjectKind::ZoneSplitter,
            ObjectKind::ZoneMixer,
        )?;
        self.set_target(air_loop, Target::DemandSplitter, Some(splitter))?;
        self.set_target(air_loop, Target::DemandMixer, Some(mixer))?;

        tracing::debug!(air_loop = %air_loop, "added air loop");
        Ok(air_loop)
    }

    /// Add a plant loop. Both sides get inlet node, connector splitter,
    /// one branch node, connector mixer, outlet node.
    pub fn add_plant_loop(&mut self) -> GraphResult<ObjectId> {
        let plant_loop = self.insert(ObjectKind::PlantLoop);

        let (s_splitter, s_mixer) = self.build_side(
            plant_loop,
            Port::SupplySideInlet,
            Port::SupplySideOutlet(0),
            ObjectKind::ConnectorSplitter,
            ObjectKind::ConnectorMixer,
        )?;
        let (d_splitter, d_mixer) = self.build_side(
            plant_loop,
            Port::DemandSideInlet,
            Port::DemandSideOutlet,
            ObjectKind::ConnectorSplitter,
            ObjectKind::ConnectorMixer,
        )?;
        self.set_target(plant_loop, Target::SupplySplitter, Some(s_splitter))?;
        self.set_target(plant_loop, Target::SupplyMixer, Some(s_mixer))?;
        self.set_target(plant_loop, Target::DemandSplitter, Some(d_splitter))?;
        self.set_target(plant_loop, Target::DemandMixer, Some(d_mixer))?;

        tracing::debug!(plant_loop = %plant_loop, "added plant loop");
        Ok(plant_loop)
    }

    fn build_side(
        &mut self,
        owner: ObjectId,
        side_inlet: Port,
        side_outlet: Port,
        splitter_kind: ObjectKind,
        mixer_kind: ObjectKind,
    ) -> GraphResult<(ObjectId, ObjectId)> {
        let inlet = self.add_node();
        let splitter = self.insert(splitter_kind);
        let branch = self.add_node();
        let mixer = self.insert(mixer_kind);
        let outlet = self.add_node();

        self.connect(owner, side_inlet, inlet, Port::Inlet)?;
        self.connect(inlet, Port::Outlet, splitter, Port::Inlet)?;
        self.connect(splitter, Port::Branch(0), branch, Port::Inlet)?;
        self.connect(branch, Port::Outlet, mixer, Port::Branch(0))?;
        self.connect(mixer, Port::Outlet, outlet, Port::Inlet)?;
        self.connect(outlet, Port::Outlet, owner, side_outlet)?;
        Ok((splitter, mixer))
    }

    /// Add an unattached outdoor-air system with its controller and the two
    /// outboard nodes (outdoor-air intake and relief).
    pub fn add_outdoor_air_system(&mut self) -> GraphResult<ObjectId> {
        let system = self.insert(ObjectKind::OutdoorAirSystem);
        let controller = self.insert(ObjectKind::ControllerOutdoorAir);
        self.set_parent(controller, Some(system))?;
        self.set_target(system, Target::Controller, Some(controller))?;
        self.attach_outboard_nodes(system)?;
        Ok(system)
    }

    pub(crate) fn attach_outboard_nodes(&mut self, system: ObjectId) -> GraphResult<()> {
        let oa_node = self.add_node();
        let relief_node = self.add_node();
        self.connect(oa_node, Port::Outlet, system, Port::OutdoorAir)?;
        self.connect(system, Port::ReliefAir, relief_node, Port::Inlet)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn air_loop_supply_nodes_are_adjacent() {
        let mut m = Model::new();
        let l = m.add_air_loop().unwrap();
        let inlet = m.connected_object(l, Port::SupplySideInlet).unwrap();
        let outlet = m.connected_object(l, Port::SupplySideOutlet(0)).unwrap();
        assert_eq!(m.outlet_object(inlet), Some(outlet));
    }

    #[test]
    fn plant_loop_has_splitter_and_mixer_on_both_sides() {
        let mut m = Model::new();
        let l = m.add_plant_loop().unwrap();
        for t in Target::ALL.into_iter().skip(1) {
            assert!(m.target(l, t).is_some(), "missing {:?}", t);
        }
        // 1 loop + 2 * (3 nodes + splitter + mixer)
        assert_eq!(m.object_count(), 11);
    }

    #[test]
    fn outdoor_air_system_owns_its_controller() {
        let mut m = Model::new();
        let oa = m.add_outdoor_air_system().unwrap();
        let controller = m.target(oa, Target::Controller).unwrap();
        assert_eq!(m.parent(controller), Some(oa));
        assert_eq!(m.children(oa), vec![controller]);
        assert!(m.connected_object(oa, Port::OutdoorAir).is_some());
        assert!(m.connected_object(oa, Port::ReliefAir).is_some());
    }
}
