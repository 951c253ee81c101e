//! The two splicing primitives every topology-aware object reuses.
//!
//! [`Model::splice_at_node`] inserts an object next to a node on a chain
//! bounded by a start and end anchor; [`Model::unsplice`] takes it out again
//! and repairs the chain. Both resolve every endpoint they need before the
//! first edge changes, so a refused operation leaves the model untouched.

use hf_core::ObjectId;

use crate::error::{GraphError, GraphResult};
use crate::indexing::{AirStream, LoopSide, Placement};
use crate::model::{Endpoint, Model};
use crate::object::Shape;
use crate::port::{Port, PortKind};

/// Where a new object goes relative to the target node.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum SpliceCase {
    /// Node is the end anchor and directly follows the start anchor.
    EmptyAtEnd,
    /// Node is the start anchor and directly precedes the end anchor.
    EmptyAtStart,
    /// Node is the end anchor with other objects ahead of it.
    BeforeEnd,
    /// Any other node: insert right behind it.
    AfterNode,
}

/// How a chain is repaired once an object leaves it.
#[derive(Debug, Clone, PartialEq, Eq)]
enum Repair {
    /// Connect the two former neighbours directly.
    Bridge { from: Endpoint, to: Endpoint },
    /// Delete a now-redundant node and connect around it.
    DropNode {
        node: ObjectId,
        from: Endpoint,
        to: Endpoint,
    },
    /// The object was alone on a splitter/mixer branch: drop the branch.
    DropBranch {
        splitter: Endpoint,
        mixer: Endpoint,
        nodes: Vec<ObjectId>,
    },
}

impl Model {
    /// Start and end anchors of the chain `placement` describes.
    ///
    /// `member` is the node being spliced at, or the object being removed;
    /// it picks the supply outlet on loops with several.
    pub(crate) fn anchors_for(
        &self,
        placement: Placement,
        member: ObjectId,
    ) -> GraphResult<(ObjectId, ObjectId)> {
        let missing = |what: &str| GraphError::invariant(format!("{what} does not resolve"));
        match placement {
            Placement::Loop {
                loop_id,
                side: LoopSide::Supply,
            } => Ok((
                self.supply_inlet_node(loop_id)
                    .ok_or_else(|| missing("supply inlet node"))?,
                self.supply_end_for(loop_id, member)
                    .ok_or_else(|| missing("supply outlet node"))?,
            )),
            Placement::Loop {
                loop_id,
                side: LoopSide::Demand,
            } => Ok((
                self.demand_inlet_node(loop_id)
                    .ok_or_else(|| missing("demand inlet node"))?,
                self.demand_outlet_node(loop_id)
                    .ok_or_else(|| missing("demand outlet node"))?,
            )),
            Placement::OutdoorAir {
                system,
                stream: AirStream::Intake,
            } => Ok((
                self.outboard_oa_node(system)
                    .ok_or_else(|| missing("outboard outdoor-air node"))?,
                system,
            )),
            Placement::OutdoorAir {
                system,
                stream: AirStream::Relief,
            } => Ok((
                system,
                self.outboard_relief_node(system)
                    .ok_or_else(|| missing("outboard relief node"))?,
            )),
        }
    }

    fn check_port(&self, obj: ObjectId, port: Port, kind: PortKind) -> GraphResult<()> {
        match self.require(obj)?.shape().port_kind(port) {
            Some(k) if k == kind => Ok(()),
            Some(_) => Err(GraphError::WrongDirection { obj, port }),
            None => Err(GraphError::InvalidPort { obj, port }),
        }
    }

    /// Connect `from -> comp.inlet`, putting a spacer node in between when
    /// `from` is not itself a node.
    pub(crate) fn feed_into(&mut self, from: Endpoint, comp: ObjectId, inlet: Port) -> GraphResult<()> {
        if self.is_node(from.obj) {
            self.connect(from.obj, from.port, comp, inlet)
        } else {
            let spacer = self.add_node();
            self.connect(from.obj, from.port, spacer, Port::Inlet)?;
            self.connect(spacer, Port::Outlet, comp, inlet)
        }
    }

    /// Connect `comp.outlet -> to`, putting a spacer node in between when
    /// `to` is not itself a node.
    pub(crate) fn drain_into(&mut self, comp: ObjectId, outlet: Port, to: Endpoint) -> GraphResult<()> {
        if self.is_node(to.obj) {
            self.connect(comp, outlet, to.obj, to.port)
        } else {
            let spacer = self.add_node();
            self.connect(comp, outlet, spacer, Port::Inlet)?;
            self.connect(spacer, Port::Outlet, to.obj, to.port)
        }
    }

    /// Insert `comp` next to `node` on the chain running from `start` to
    /// `end`, using `comp`'s `inlet` and `outlet` ports.
    ///
    /// Returns `Ok(false)` without touching the model if any object is not
    /// part of this model, `node` is not a node, or `comp` is still
    /// connected on the given ports.
    pub(crate) fn splice_at_node(
        &mut self,
        comp: ObjectId,
        node: ObjectId,
        start: ObjectId,
        end: ObjectId,
        inlet: Port,
        outlet: Port,
    ) -> GraphResult<bool> {
        if [comp, node, start, end].iter().any(|&o| !self.owns(o)) {
            return Ok(false);
        }
        if !self.is_node(node) || comp == node {
            return Ok(false);
        }
        self.check_port(comp, inlet, PortKind::Inlet)?;
        self.check_port(comp, outlet, PortKind::Outlet)?;
        if self.peer(comp, inlet).is_some() || self.peer(comp, outlet).is_some() {
            return Ok(false);
        }

        let upstream = self.peer(node, Port::Inlet);
        let downstream = self.peer(node, Port::Outlet);
        let case = if node == end && upstream.map(|e| e.obj) == Some(start) {
            SpliceCase::EmptyAtEnd
        } else if node == start && downstream.map(|e| e.obj) == Some(end) {
            SpliceCase::EmptyAtStart
        } else if node == end {
            SpliceCase::BeforeEnd
        } else {
            SpliceCase::AfterNode
        };

        match case {
            SpliceCase::EmptyAtEnd | SpliceCase::BeforeEnd => {
                let up = upstream.ok_or_else(|| {
                    GraphError::invariant(format!("end anchor {node} has nothing upstream"))
                })?;
                self.feed_into(up, comp, inlet)?;
                self.connect(comp, outlet, node, Port::Inlet)?;
            }
            SpliceCase::EmptyAtStart | SpliceCase::AfterNode => {
                let down = downstream.ok_or_else(|| {
                    GraphError::invariant(format!("node {node} has nothing downstream"))
                })?;
                self.connect(node, Port::Outlet, comp, inlet)?;
                self.drain_into(comp, outlet, down)?;
            }
        }
        tracing::debug!(comp = %comp, node = %node, ?case, "spliced");
        Ok(true)
    }

    /// Take `comp` out of the chain running from `start` to `end` and
    /// reconnect its neighbours, dropping whichever node would otherwise sit
    /// next to another node.
    ///
    /// Returns `Ok(false)` if `comp` is not connected on both ports.
    pub(crate) fn unsplice(
        &mut self,
        comp: ObjectId,
        start: ObjectId,
        end: ObjectId,
        inlet: Port,
        outlet: Port,
    ) -> GraphResult<bool> {
        if [comp, start, end].iter().any(|&o| !self.owns(o)) {
            return Ok(false);
        }
        let (Some(up), Some(down)) = (self.peer(comp, inlet), self.peer(comp, outlet)) else {
            return Ok(false);
        };

        let repair = self.plan_repair(up, down, start, end)?;

        match &repair {
            Repair::Bridge { from, to } => {
                self.disconnect(comp, inlet);
                self.disconnect(comp, outlet);
                self.connect_endpoints(*from, *to)?;
            }
            Repair::DropNode { node, from, to } => {
                self.disconnect(comp, inlet);
                self.disconnect(comp, outlet);
                self.delete(*node);
                self.connect_endpoints(*from, *to)?;
            }
            Repair::DropBranch {
                splitter,
                mixer,
                nodes,
            } => {
                // Branch ports go first so later branches shift over intact edges.
                self.remove_branch_at(*splitter)?;
                self.remove_branch_at(*mixer)?;
                self.disconnect(comp, inlet);
                self.disconnect(comp, outlet);
                for &n in nodes {
                    self.delete(n);
                }
                self.ensure_branch(splitter.obj, mixer.obj)?;
            }
        }
        tracing::debug!(comp = %comp, ?repair, "unspliced");
        Ok(true)
    }

    fn plan_repair(
        &self,
        up: Endpoint,
        down: Endpoint,
        start: ObjectId,
        end: ObjectId,
    ) -> GraphResult<Repair> {
        let beyond = |node: ObjectId, port: Port| {
            self.peer(node, port).ok_or_else(|| {
                GraphError::invariant(format!("node {node} is not connected on {port}"))
            })
        };

        if up.obj == start && down.obj == end {
            return Ok(Repair::Bridge { from: up, to: down });
        }
        if down.obj == end && self.is_node(up.obj) {
            return Ok(Repair::DropNode {
                node: up.obj,
                from: beyond(up.obj, Port::Inlet)?,
                to: down,
            });
        }
        if up.obj == start && self.is_node(down.obj) {
            return Ok(Repair::DropNode {
                node: down.obj,
                from: up,
                to: beyond(down.obj, Port::Outlet)?,
            });
        }
        if let Some(branch) = self.lone_branch(up, down) {
            return Ok(branch);
        }
        if self.is_node(up.obj) && self.is_node(down.obj) {
            if let Some(after) = self.peer(down.obj, Port::Outlet) {
                return Ok(Repair::DropNode {
                    node: down.obj,
                    from: up,
                    to: after,
                });
            }
            if let Some(before) = self.peer(up.obj, Port::Inlet) {
                return Ok(Repair::DropNode {
                    node: up.obj,
                    from: before,
                    to: down,
                });
            }
        }
        Ok(Repair::Bridge { from: up, to: down })
    }

    /// Recognize an object sitting alone between a splitter and a mixer,
    /// optionally wrapped in one node on each side.
    fn lone_branch(&self, up: Endpoint, down: Endpoint) -> Option<Repair> {
        let mut nodes = Vec::new();
        let splitter = match self.shape(up.obj)? {
            Shape::Splitter => up,
            Shape::Node => {
                let before = self.peer(up.obj, Port::Inlet)?;
                if self.shape(before.obj)? != Shape::Splitter {
                    return None;
                }
                nodes.push(up.obj);
                before
            }
            _ => return None,
        };
        let mixer = match self.shape(down.obj)? {
            Shape::Mixer => down,
            Shape::Node => {
                let after = self.peer(down.obj, Port::Outlet)?;
                if self.shape(after.obj)? != Shape::Mixer {
                    return None;
                }
                nodes.push(down.obj);
                after
            }
            _ => return None,
        };
        Some(Repair::DropBranch {
            splitter,
            mixer,
            nodes,
        })
    }

    fn remove_branch_at(&mut self, at: Endpoint) -> GraphResult<()> {
        let Port::Branch(i) = at.port else {
            return Err(GraphError::invariant(format!(
                "{} is not a branch port of {}",
                at.port, at.obj
            )));
        };
        self.remove_port_for_branch(at.obj, i)?;
        Ok(())
    }

    /// Give a splitter/mixer pair left without branches one empty branch node.
    pub(crate) fn ensure_branch(&mut self, splitter: ObjectId, mixer: ObjectId) -> GraphResult<()> {
        if self.next_branch_index(splitter) > 0 {
            return Ok(());
        }
        let node = self.add_node();
        let out = self.next_outlet_port(splitter);
        let inp = self.next_inlet_port(mixer);
        self.connect(splitter, out, node, Port::Inlet)?;
        self.connect(node, Port::Outlet, mixer, inp)?;
        Ok(())
    }
}
