//! Splitter and mixer branch bookkeeping.
//!
//! Branch ports are numbered from 0 with no gaps, so the first free index is
//! also the branch count.

use hf_core::ObjectId;

use crate::error::{GraphError, GraphResult};
use crate::model::Model;
use crate::object::Shape;
use crate::port::Port;

impl Model {
    /// First unconnected branch index; equal to the number of branches.
    pub fn next_branch_index(&self, obj: ObjectId) -> u32 {
        let mut i = 0;
        while self.peer(obj, Port::Branch(i)).is_some() {
            i += 1;
        }
        i
    }

    /// Next free outlet port of a splitter.
    pub fn next_outlet_port(&self, splitter: ObjectId) -> Port {
        Port::Branch(self.next_branch_index(splitter))
    }

    /// Next free inlet port of a mixer.
    pub fn next_inlet_port(&self, mixer: ObjectId) -> Port {
        Port::Branch(self.next_branch_index(mixer))
    }

    /// Objects on the branch ports, in branch order.
    pub fn branch_objects(&self, obj: ObjectId) -> Vec<ObjectId> {
        (0..self.next_branch_index(obj))
            .filter_map(|i| self.connected_object(obj, Port::Branch(i)))
            .collect()
    }

    pub fn last_branch_object(&self, obj: ObjectId) -> Option<ObjectId> {
        self.branch_objects(obj).pop()
    }

    /// Branch index of a splitter leading to `neighbor`.
    pub fn branch_index_for_outlet_object(&self, splitter: ObjectId, neighbor: ObjectId) -> Option<u32> {
        if self.shape(splitter) != Some(Shape::Splitter) {
            return None;
        }
        self.branch_index_of(splitter, neighbor)
    }

    /// Branch index of a mixer fed by `neighbor`.
    pub fn branch_index_for_inlet_object(&self, mixer: ObjectId, neighbor: ObjectId) -> Option<u32> {
        if self.shape(mixer) != Some(Shape::Mixer) {
            return None;
        }
        self.branch_index_of(mixer, neighbor)
    }

    fn branch_index_of(&self, obj: ObjectId, neighbor: ObjectId) -> Option<u32> {
        (0..self.next_branch_index(obj))
            .find(|&i| self.connected_object(obj, Port::Branch(i)) == Some(neighbor))
    }

    /// Disconnect branch `index` and move every later branch down by one.
    ///
    /// Shifts run in ascending order, each reusing the partner the branch
    /// already had. Returns `false` if `obj` is not a splitter or mixer or the
    /// branch does not exist.
    pub fn remove_port_for_branch(&mut self, obj: ObjectId, index: u32) -> GraphResult<bool> {
        let shape = match self.shape(obj) {
            Some(s @ (Shape::Splitter | Shape::Mixer)) => s,
            _ => return Ok(false),
        };
        let count = self.next_branch_index(obj);
        if index >= count {
            return Ok(false);
        }

        self.disconnect(obj, Port::Branch(index));
        for j in index + 1..count {
            let peer = self
                .peer(obj, Port::Branch(j))
                .ok_or_else(|| GraphError::invariant(format!("branch {j} of {obj} vanished during shift")))?;
            self.disconnect(obj, Port::Branch(j));
            if shape == Shape::Splitter {
                self.connect(obj, Port::Branch(j - 1), peer.obj, peer.port)?;
            } else {
                self.connect(peer.obj, peer.port, obj, Port::Branch(j - 1))?;
            }
        }
        tracing::debug!(obj = %obj, index, remaining = count - 1, "removed branch port");
        Ok(true)
    }
}
