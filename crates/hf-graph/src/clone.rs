//! Duplicating objects within a model or into another one.
//!
//! A clone keeps kind, name and attributes. It never keeps connections,
//! pointer fields or a parent; owned objects are cloned along and
//! re-parented onto the copy.

use std::collections::BTreeMap;

use hf_core::ObjectId;

use crate::error::GraphResult;
use crate::model::Model;
use crate::object::{AttributeValue, ObjectKind, Target};

/// Owned copy of everything a clone carries over.
#[derive(Debug, Clone)]
struct Snapshot {
    kind: ObjectKind,
    name: String,
    attributes: BTreeMap<String, AttributeValue>,
    children: Vec<Snapshot>,
}

impl Model {
    fn snapshot(&self, obj: ObjectId) -> GraphResult<Snapshot> {
        let record = self.require(obj)?;
        let children = self
            .children(obj)
            .into_iter()
            .map(|c| self.snapshot(c))
            .collect::<GraphResult<Vec<_>>>()?;
        Ok(Snapshot {
            kind: record.kind(),
            name: record.name().to_string(),
            attributes: record.attributes().clone(),
            children,
        })
    }

    fn instantiate(&mut self, snap: &Snapshot) -> GraphResult<ObjectId> {
        let obj = match snap.kind {
            // Loops come back as a fresh, empty topology.
            ObjectKind::AirLoop => self.add_air_loop()?,
            ObjectKind::PlantLoop => self.add_plant_loop()?,
            // Only the boundary nodes are new; the chains are not copied.
            ObjectKind::OutdoorAirSystem => {
                let system = self.insert(ObjectKind::OutdoorAirSystem);
                self.attach_outboard_nodes(system)?;
                system
            }
            kind => self.insert(kind),
        };
        self.set_name(obj, snap.name.clone())?;
        for (key, value) in &snap.attributes {
            self.set_attribute(obj, key.clone(), value.clone())?;
        }
        for child in &snap.children {
            let copy = self.instantiate(child)?;
            self.set_parent(copy, Some(obj))?;
            if snap.kind == ObjectKind::OutdoorAirSystem && child.kind == ObjectKind::ControllerOutdoorAir {
                self.set_target(obj, Target::Controller, Some(copy))?;
            }
        }
        Ok(obj)
    }

    /// Clone `obj` into this model.
    pub fn clone_object(&mut self, obj: ObjectId) -> GraphResult<ObjectId> {
        let snap = self.snapshot(obj)?;
        let copy = self.instantiate(&snap)?;
        tracing::debug!(source = %obj, copy = %copy, "cloned object");
        Ok(copy)
    }

    /// Clone `obj` into `target`.
    pub fn clone_into(&self, obj: ObjectId, target: &mut Model) -> GraphResult<ObjectId> {
        let snap = self.snapshot(obj)?;
        target.instantiate(&snap)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::port::Port;

    #[test]
    fn clone_is_unattached() {
        let mut m = Model::new();
        let l = m.add_air_loop().unwrap();
        let fan = m.add_component(ObjectKind::Fan);
        m.set_attribute(fan, "pressure_rise", AttributeValue::Real(500.0))
            .unwrap();
        assert!(m.add_to_node(fan, m.supply_outlet_node(l).unwrap()).unwrap());

        let copy = m.clone_object(fan).unwrap();
        assert_ne!(copy, fan);
        assert_ne!(m.handle(copy), m.handle(fan));
        assert_eq!(m.name(copy), m.name(fan));
        assert_eq!(
            m.attribute(copy, "pressure_rise"),
            Some(&AttributeValue::Real(500.0))
        );
        assert!(!m.is_connected(copy));
        assert_eq!(m.placement(copy), None);
    }

    #[test]
    fn outdoor_air_clone_gets_new_controller_and_nodes() {
        let mut m = Model::new();
        let l = m.add_air_loop().unwrap();
        let oa = m.add_outdoor_air_system().unwrap();
        assert!(m.add_to_node(oa, m.supply_inlet_node(l).unwrap()).unwrap());
        let fan = m.add_component(ObjectKind::Fan);
        assert!(m.add_to_node(fan, m.outboard_oa_node(oa).unwrap()).unwrap());

        let mut other = Model::new();
        let copy = m.clone_into(oa, &mut other).unwrap();

        let controller = other.controller_outdoor_air(copy).unwrap();
        assert_eq!(other.parent(controller), Some(copy));
        assert_ne!(Some(controller), m.controller_outdoor_air(oa));
        assert_eq!(other.oa_components(copy).len(), 1);
        assert_eq!(other.relief_components(copy).len(), 1);
        assert_eq!(other.peer(copy, Port::ReturnAir), None);
        assert_eq!(other.peer(copy, Port::MixedAir), None);
        // system, controller, two boundary nodes
        assert_eq!(other.object_count(), 4);
    }

    #[test]
    fn loop_clone_is_a_fresh_topology() {
        let mut m = Model::new();
        let l = m.add_plant_loop().unwrap();
        let boiler = m.add_component(ObjectKind::Boiler);
        assert!(m.add_supply_branch_for_component(l, boiler).unwrap());
        m.set_name(l, "Hot Water Loop").unwrap();

        let copy = m.clone_object(l).unwrap();
        assert_eq!(m.name(copy), Some("Hot Water Loop"));
        assert_eq!(m.supply_components(copy).len(), 5);
        assert_eq!(m.supply_components(l).len(), 7);
    }
}
