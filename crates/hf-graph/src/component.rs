//! Shape-dispatched entry points: insert at a node, take out of a loop,
//! remove from the model.

use hf_core::ObjectId;

use crate::error::GraphResult;
use crate::indexing::Placement;
use crate::model::Model;
use crate::object::Shape;
use crate::port::Port;

impl Model {
    /// Splice `comp` into the chain running through `node`.
    ///
    /// Returns `Ok(false)`, leaving the model unchanged, when `comp` or
    /// `node` belong to another model, `node` is not a node, `comp` cannot go
    /// there, or `node` sits on no loop or outdoor-air chain.
    pub fn add_to_node(&mut self, comp: ObjectId, node: ObjectId) -> GraphResult<bool> {
        if !self.owns(comp) || !self.owns(node) || !self.is_node(node) {
            return Ok(false);
        }
        match self.shape(comp) {
            Some(Shape::Straight) => self.add_straight_to_node(comp, node),
            Some(Shape::AirToAir) => self.add_air_to_air_to_node(comp, node),
            Some(Shape::WaterToWater { .. }) => self.add_water_to_water_to_node(comp, node),
            Some(Shape::OutdoorAirSystem) => self.add_outdoor_air_system_to_node(comp, node),
            _ => Ok(false),
        }
    }

    /// Take `comp` out of whatever loop or chain it sits on, repairing the
    /// chain around it. The object itself stays in the model.
    pub fn remove_from_loop(&mut self, comp: ObjectId) -> GraphResult<bool> {
        match self.shape(comp) {
            Some(Shape::Straight) => {
                let Some(placement) = self.placement(comp) else {
                    return Ok(false);
                };
                let (start, end) = self.anchors_for(placement, comp)?;
                self.unsplice(comp, start, end, Port::Inlet, Port::Outlet)
            }
            Some(Shape::AirToAir) => self.remove_air_to_air_streams(comp),
            Some(Shape::WaterToWater { .. }) => self.detach_from_plant_loops(comp),
            Some(Shape::OutdoorAirSystem) => {
                let Some(placement @ Placement::Loop { .. }) = self.placement(comp) else {
                    return Ok(false);
                };
                let (start, end) = self.anchors_for(placement, comp)?;
                self.unsplice(comp, start, end, Port::ReturnAir, Port::MixedAir)
            }
            _ => Ok(false),
        }
    }

    /// Whether [`Model::remove`] will act on `obj`.
    ///
    /// Owned objects (those with a parent) go with their parent. Nodes,
    /// splitters and mixers are fixed points of live loops and chains.
    pub fn is_removable(&self, obj: ObjectId) -> bool {
        let Some(o) = self.object(obj) else {
            return false;
        };
        if o.parent().is_some() {
            return false;
        }
        match o.shape() {
            Shape::Node | Shape::Splitter | Shape::Mixer => self.placement(obj).is_none(),
            _ => true,
        }
    }

    /// Remove `obj` from the model, unsplicing it first and taking owned
    /// objects with it. Returns the removed ids; empty if not removable.
    pub fn remove(&mut self, obj: ObjectId) -> GraphResult<Vec<ObjectId>> {
        if !self.is_removable(obj) {
            return Ok(Vec::new());
        }
        match self.shape(obj) {
            Some(Shape::OutdoorAirSystem) => return self.remove_outdoor_air_system(obj),
            Some(Shape::Loop) => return self.remove_loop(obj),
            Some(Shape::Straight | Shape::AirToAir | Shape::WaterToWater { .. }) => {
                self.remove_from_loop(obj)?;
            }
            _ => {}
        }
        let removed = self.delete_with_children(obj);
        tracing::debug!(obj = %obj, removed = removed.len(), "removed object");
        Ok(removed)
    }

    pub(crate) fn delete_with_children(&mut self, obj: ObjectId) -> Vec<ObjectId> {
        let mut removed = Vec::new();
        for child in self.children(obj) {
            removed.extend(self.delete_with_children(child));
        }
        if self.delete(obj) {
            removed.push(obj);
        }
        removed
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::object::ObjectKind;

    #[test]
    fn cross_model_insertion_is_refused() {
        let mut a = Model::new();
        let mut b = Model::new();
        let loop_b = b.add_air_loop().unwrap();
        let node_b = b.supply_inlet_node(loop_b).unwrap();
        let fan_a = a.add_component(ObjectKind::Fan);

        assert!(!a.add_to_node(fan_a, node_b).unwrap());
        assert!(!b.add_to_node(fan_a, node_b).unwrap());
        assert_eq!(b.supply_components(loop_b).len(), 2);
        assert!(!a.is_connected(fan_a));
    }

    #[test]
    fn loop_nodes_and_owned_objects_are_not_removable() {
        let mut m = Model::new();
        let l = m.add_plant_loop().unwrap();
        let inlet = m.supply_inlet_node(l).unwrap();
        let splitter = m.supply_splitter(l).unwrap();
        assert!(!m.is_removable(inlet));
        assert!(!m.is_removable(splitter));
        assert!(m.remove(inlet).unwrap().is_empty());
        assert!(m.owns(inlet));

        let oa = m.add_outdoor_air_system().unwrap();
        let controller = m.children(oa)[0];
        assert!(!m.is_removable(controller));

        let loose = m.add_node();
        assert_eq!(m.remove(loose).unwrap(), vec![loose]);
    }

    #[test]
    fn adding_next_to_itself_is_a_no_op() {
        let mut m = Model::new();
        let l = m.add_air_loop().unwrap();
        let fan = m.add_component(ObjectKind::Fan);
        let outlet = m.supply_outlet_node(l).unwrap();
        assert!(m.add_to_node(fan, outlet).unwrap());
        let before = m.edges();
        assert!(!m.add_to_node(fan, outlet).unwrap());
        assert_eq!(m.edges(), before);
    }

    #[test]
    fn straight_component_moves_between_loops() {
        let mut m = Model::new();
        let l1 = m.add_air_loop().unwrap();
        let l2 = m.add_air_loop().unwrap();
        let fan = m.add_component(ObjectKind::Fan);

        assert!(m.add_to_node(fan, m.supply_outlet_node(l1).unwrap()).unwrap());
        assert!(m.add_to_node(fan, m.supply_outlet_node(l2).unwrap()).unwrap());
        assert_eq!(m.supply_components(l1).len(), 2);
        assert_eq!(m.supply_components(l2).len(), 3);
        assert_eq!(m.air_loop(fan), Some(l2));
    }
}
