//! The model: an arena of objects plus a port-to-port connection table.

use std::cell::OnceCell;
use std::collections::{BTreeSet, HashMap};

use hf_core::{Handle, Id, ModelId, ObjectId, new_handle};

use crate::error::{GraphError, GraphResult};
use crate::indexing::LoopIndex;
use crate::object::{AttributeValue, Object, ObjectKind, Shape, Target};
use crate::port::{Port, PortKind};

/// One end of an edge: an object and one of its ports.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Endpoint {
    pub obj: ObjectId,
    pub port: Port,
}

impl Endpoint {
    pub fn new(obj: ObjectId, port: Port) -> Self {
        Self { obj, port }
    }
}

/// Exclusive owner of all objects and edges of one HVAC model.
///
/// Objects live in an arena and are referenced by [`ObjectId`]. Removing an
/// object leaves an empty slot; slots are never reused, so a stale id simply
/// stops resolving. Every edge is stored once per endpoint, and a port carries
/// at most one edge.
#[derive(Debug, Default)]
pub struct Model {
    id: ModelId,
    objects: Vec<Option<Object>>,
    handles: HashMap<Handle, Id>,
    links: HashMap<Endpoint, Endpoint>,
    /// Connected ports per object, mirroring `links`.
    ports: HashMap<ObjectId, BTreeSet<Port>>,
    /// Owned objects per parent, mirroring each record's `parent`.
    owned: HashMap<ObjectId, BTreeSet<ObjectId>>,
    /// Objects that may hold a pointer field at the key. Entries can be stale.
    referrers: HashMap<ObjectId, BTreeSet<ObjectId>>,
    counters: HashMap<ObjectKind, u32>,
    /// Derived loop/OA membership, rebuilt lazily after any mutation.
    index: OnceCell<LoopIndex>,
}

impl Model {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn id(&self) -> ModelId {
        self.id
    }

    /// True if `obj` is a live object of this model.
    pub fn owns(&self, obj: ObjectId) -> bool {
        self.object(obj).is_some()
    }

    pub fn object(&self, obj: ObjectId) -> Option<&Object> {
        if obj.model() != self.id {
            return None;
        }
        self.objects.get(obj.slot().index() as usize)?.as_ref()
    }

    fn object_mut(&mut self, obj: ObjectId) -> Option<&mut Object> {
        if obj.model() != self.id {
            return None;
        }
        self.objects.get_mut(obj.slot().index() as usize)?.as_mut()
    }

    /// Resolve `obj`, reporting why it does not resolve.
    pub fn require(&self, obj: ObjectId) -> GraphResult<&Object> {
        if obj.model() != self.id {
            return Err(GraphError::ForeignObject { obj });
        }
        self.object(obj).ok_or(GraphError::MissingObject { obj })
    }

    pub fn kind(&self, obj: ObjectId) -> Option<ObjectKind> {
        self.object(obj).map(Object::kind)
    }

    pub fn shape(&self, obj: ObjectId) -> Option<Shape> {
        self.object(obj).map(Object::shape)
    }

    pub fn is_node(&self, obj: ObjectId) -> bool {
        self.shape(obj) == Some(Shape::Node)
    }

    pub fn name(&self, obj: ObjectId) -> Option<&str> {
        self.object(obj).map(Object::name)
    }

    pub fn set_name(&mut self, obj: ObjectId, name: impl Into<String>) -> GraphResult<()> {
        self.require(obj)?;
        if let Some(o) = self.object_mut(obj) {
            o.name = name.into();
        }
        Ok(())
    }

    pub fn handle(&self, obj: ObjectId) -> Option<Handle> {
        self.object(obj).map(Object::handle)
    }

    pub fn object_by_handle(&self, handle: Handle) -> Option<ObjectId> {
        let slot = *self.handles.get(&handle)?;
        Some(ObjectId::new(self.id, slot))
    }

    pub fn attribute(&self, obj: ObjectId, key: &str) -> Option<&AttributeValue> {
        self.object(obj)?.attributes.get(key)
    }

    pub fn set_attribute(
        &mut self,
        obj: ObjectId,
        key: impl Into<String>,
        value: AttributeValue,
    ) -> GraphResult<()> {
        self.require(obj)?;
        if let Some(o) = self.object_mut(obj) {
            o.attributes.insert(key.into(), value);
        }
        Ok(())
    }

    /// All live objects in creation order.
    pub fn objects(&self) -> impl Iterator<Item = ObjectId> + '_ {
        let model = self.id;
        self.objects
            .iter()
            .enumerate()
            .filter(|(_, o)| o.is_some())
            .map(move |(i, _)| ObjectId::new(model, Id::from_index(i as u32)))
    }

    pub fn object_count(&self) -> usize {
        self.objects.iter().filter(|o| o.is_some()).count()
    }

    pub fn objects_of_kind(&self, kind: ObjectKind) -> Vec<ObjectId> {
        self.objects()
            .filter(|&o| self.kind(o) == Some(kind))
            .collect()
    }

    pub fn air_loops(&self) -> Vec<ObjectId> {
        self.objects_of_kind(ObjectKind::AirLoop)
    }

    pub fn plant_loops(&self) -> Vec<ObjectId> {
        self.objects_of_kind(ObjectKind::PlantLoop)
    }

    pub fn outdoor_air_systems(&self) -> Vec<ObjectId> {
        self.objects_of_kind(ObjectKind::OutdoorAirSystem)
    }

    // ------------------------------------------------------------------
    // Arena mutation
    // ------------------------------------------------------------------

    /// Create an unconnected object with a fresh handle and generated name.
    pub(crate) fn insert(&mut self, kind: ObjectKind) -> ObjectId {
        let counter = self.counters.entry(kind).or_insert(0);
        *counter += 1;
        let name = format!("{} {}", kind.title(), counter);
        self.insert_record(Object::new(new_handle(), kind, name))
    }

    fn insert_record(&mut self, record: Object) -> ObjectId {
        let slot = Id::from_index(self.objects.len() as u32);
        self.handles.insert(record.handle, slot);
        self.objects.push(Some(record));
        self.invalidate();
        ObjectId::new(self.id, slot)
    }

    /// Recreate an object with a known handle, as when loading a saved model.
    pub fn restore_object(
        &mut self,
        handle: Handle,
        kind: ObjectKind,
        name: impl Into<String>,
    ) -> GraphResult<ObjectId> {
        if self.handles.contains_key(&handle) {
            return Err(GraphError::DuplicateHandle { handle });
        }
        *self.counters.entry(kind).or_insert(0) += 1;
        Ok(self.insert_record(Object::new(handle, kind, name.into())))
    }

    /// Drop an object from the arena, disconnecting all of its ports and
    /// clearing pointer fields and parent links that referred to it.
    pub(crate) fn delete(&mut self, obj: ObjectId) -> bool {
        if !self.owns(obj) {
            return false;
        }
        for (port, _) in self.connected_ports(obj) {
            self.disconnect(obj, port);
        }
        for referrer in self.referrers.remove(&obj).unwrap_or_default() {
            if let Some(o) = self.object_mut(referrer) {
                o.targets.retain(|_, t| *t != obj);
            }
        }
        for child in self.owned.remove(&obj).unwrap_or_default() {
            if let Some(o) = self.object_mut(child) {
                o.parent = None;
            }
        }
        if let Some(record) = self.objects[obj.slot().index() as usize].take() {
            self.handles.remove(&record.handle);
            if let Some(siblings) = record.parent.and_then(|p| self.owned.get_mut(&p)) {
                siblings.remove(&obj);
            }
            for target in record.targets.values() {
                if let Some(set) = self.referrers.get_mut(target) {
                    set.remove(&obj);
                }
            }
        }
        self.ports.remove(&obj);
        self.invalidate();
        true
    }

    // ------------------------------------------------------------------
    // Connection table
    // ------------------------------------------------------------------

    fn port_kind_of(&self, obj: ObjectId, port: Port) -> GraphResult<PortKind> {
        let shape = self.require(obj)?.shape();
        shape
            .port_kind(port)
            .ok_or(GraphError::InvalidPort { obj, port })
    }

    /// Connect `(a, pa)` to `(b, pb)`, with flow going from `a` to `b`.
    ///
    /// Any edge already attached at either port is dropped first, so a port
    /// never ends up with two partners.
    pub fn connect(&mut self, a: ObjectId, pa: Port, b: ObjectId, pb: Port) -> GraphResult<()> {
        if self.port_kind_of(a, pa)? != PortKind::Outlet {
            return Err(GraphError::WrongDirection { obj: a, port: pa });
        }
        if self.port_kind_of(b, pb)? != PortKind::Inlet {
            return Err(GraphError::WrongDirection { obj: b, port: pb });
        }
        if a == b {
            return Err(GraphError::SelfLoop { obj: a });
        }
        self.disconnect(a, pa);
        self.disconnect(b, pb);
        let from = Endpoint::new(a, pa);
        let to = Endpoint::new(b, pb);
        self.links.insert(from, to);
        self.links.insert(to, from);
        self.ports.entry(a).or_default().insert(pa);
        self.ports.entry(b).or_default().insert(pb);
        self.invalidate();
        Ok(())
    }

    pub(crate) fn connect_endpoints(&mut self, from: Endpoint, to: Endpoint) -> GraphResult<()> {
        self.connect(from.obj, from.port, to.obj, to.port)
    }

    /// Drop the edge at `(obj, port)`, if any. Returns whether one existed.
    pub fn disconnect(&mut self, obj: ObjectId, port: Port) -> bool {
        let here = Endpoint::new(obj, port);
        match self.links.remove(&here) {
            Some(peer) => {
                self.links.remove(&peer);
                self.forget_port(here);
                self.forget_port(peer);
                self.invalidate();
                true
            }
            None => false,
        }
    }

    fn forget_port(&mut self, end: Endpoint) {
        if let Some(set) = self.ports.get_mut(&end.obj) {
            set.remove(&end.port);
            if set.is_empty() {
                self.ports.remove(&end.obj);
            }
        }
    }

    /// The far end of the edge at `(obj, port)`.
    pub fn peer(&self, obj: ObjectId, port: Port) -> Option<Endpoint> {
        self.links.get(&Endpoint::new(obj, port)).copied()
    }

    pub fn connected_object(&self, obj: ObjectId, port: Port) -> Option<ObjectId> {
        self.peer(obj, port).map(|e| e.obj)
    }

    pub fn connected_object_port(&self, obj: ObjectId, port: Port) -> Option<Port> {
        self.peer(obj, port).map(|e| e.port)
    }

    /// Object upstream of a single-stream object.
    pub fn inlet_object(&self, obj: ObjectId) -> Option<ObjectId> {
        self.connected_object(obj, Port::Inlet)
    }

    /// Object downstream of a single-stream object.
    pub fn outlet_object(&self, obj: ObjectId) -> Option<ObjectId> {
        self.connected_object(obj, Port::Outlet)
    }

    /// Every connected port of `obj` with its partner, in port order.
    pub fn connected_ports(&self, obj: ObjectId) -> Vec<(Port, Endpoint)> {
        self.ports
            .get(&obj)
            .into_iter()
            .flatten()
            .filter_map(|&port| Some((port, self.peer(obj, port)?)))
            .collect()
    }

    pub fn is_connected(&self, obj: ObjectId) -> bool {
        self.ports.contains_key(&obj)
    }

    /// Every edge once, as `(from, to)` in flow direction, sorted.
    pub fn edges(&self) -> Vec<(Endpoint, Endpoint)> {
        let mut out: Vec<(Endpoint, Endpoint)> = self
            .links
            .iter()
            .filter(|(here, _)| {
                self.shape(here.obj).and_then(|s| s.port_kind(here.port)) == Some(PortKind::Outlet)
            })
            .map(|(here, peer)| (*here, *peer))
            .collect();
        out.sort();
        out
    }

    pub(crate) fn raw_links(&self) -> &HashMap<Endpoint, Endpoint> {
        &self.links
    }

    // ------------------------------------------------------------------
    // Containment and pointer fields
    // ------------------------------------------------------------------

    pub fn parent(&self, obj: ObjectId) -> Option<ObjectId> {
        self.object(obj)?.parent
    }

    /// Make `parent` the owner of `child`, or clear ownership with `None`.
    ///
    /// Ownership is a forest: `child` may not own itself, directly or through
    /// any of `parent`'s ancestors.
    pub fn set_parent(&mut self, child: ObjectId, parent: Option<ObjectId>) -> GraphResult<()> {
        self.require(child)?;
        if let Some(p) = parent {
            self.require(p)?;
            if p == child {
                return Err(GraphError::SelfLoop { obj: child });
            }
            if self.ancestors(p).any(|a| a == child) {
                return Err(GraphError::OwnershipCycle { child, parent: p });
            }
        }
        let old = self.parent(child);
        if let Some(siblings) = old.and_then(|p| self.owned.get_mut(&p)) {
            siblings.remove(&child);
        }
        if let Some(p) = parent {
            self.owned.entry(p).or_default().insert(child);
        }
        if let Some(o) = self.object_mut(child) {
            o.parent = parent;
        }
        Ok(())
    }

    /// Owners of `obj`, nearest first.
    pub fn ancestors(&self, obj: ObjectId) -> impl Iterator<Item = ObjectId> + '_ {
        std::iter::successors(self.parent(obj), move |&p| self.parent(p))
    }

    /// Objects owned by `obj`, in creation order.
    pub fn children(&self, obj: ObjectId) -> Vec<ObjectId> {
        self.owned
            .get(&obj)
            .into_iter()
            .flatten()
            .copied()
            .filter(|&c| self.parent(c) == Some(obj))
            .collect()
    }

    pub fn target(&self, obj: ObjectId, field: Target) -> Option<ObjectId> {
        let t = *self.object(obj)?.targets.get(&field)?;
        self.owns(t).then_some(t)
    }

    pub fn set_target(
        &mut self,
        obj: ObjectId,
        field: Target,
        value: Option<ObjectId>,
    ) -> GraphResult<()> {
        self.require(obj)?;
        if let Some(v) = value {
            self.require(v)?;
        }
        if let Some(o) = self.object_mut(obj) {
            match value {
                Some(v) => {
                    o.targets.insert(field, v);
                }
                None => {
                    o.targets.remove(&field);
                }
            }
        }
        if let Some(v) = value {
            self.referrers.entry(v).or_default().insert(obj);
        }
        Ok(())
    }

    // ------------------------------------------------------------------
    // Derived membership index
    // ------------------------------------------------------------------

    /// Loop and outdoor-air membership, built on first use after a mutation.
    pub fn loop_index(&self) -> &LoopIndex {
        self.index.get_or_init(|| LoopIndex::build(self))
    }

    fn invalidate(&mut self) {
        self.index.take();
    }
}
