//! Single-stream components (fans, coils, pumps, ...).

use hf_core::ObjectId;

use crate::error::GraphResult;
use crate::model::Model;
use crate::port::Port;

impl Model {
    /// True if `node` is directly connected to `comp` on either side.
    pub(crate) fn touches(&self, node: ObjectId, comp: ObjectId) -> bool {
        self.connected_object(node, Port::Inlet) == Some(comp)
            || self.connected_object(node, Port::Outlet) == Some(comp)
    }

    /// Move a single-stream component next to `node`.
    ///
    /// The node decides the chain: an outdoor-air intake or relief chain if
    /// it is on one, otherwise the loop side it belongs to. The component is
    /// first taken out of wherever it currently sits.
    pub(crate) fn add_straight_to_node(&mut self, comp: ObjectId, node: ObjectId) -> GraphResult<bool> {
        if self.touches(node, comp) {
            return Ok(false);
        }
        let Some(placement) = self.placement(node) else {
            return Ok(false);
        };
        // Resolve anchors up front so a broken loop refuses before anything moves.
        self.anchors_for(placement, node)?;

        self.remove_from_loop(comp)?;
        let (start, end) = self.anchors_for(placement, node)?;
        self.splice_at_node(comp, node, start, end, Port::Inlet, Port::Outlet)
    }
}
