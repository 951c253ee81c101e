//! Derived loop and outdoor-air membership.
//!
//! Membership is never stored on the objects. The model keeps one
//! [`LoopIndex`] that is built by walking every loop and outdoor-air system
//! the first time it is needed, and discarded by any mutation.

use std::collections::HashMap;

use hf_core::ObjectId;

use crate::model::Model;
use crate::object::{ObjectKind, Shape};
use crate::port::Port;
use crate::walk;

/// Which side of a loop an object sits on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LoopSide {
    Supply,
    Demand,
}

/// Which chain of an outdoor-air system an object sits on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AirStream {
    Intake,
    Relief,
}

/// One appearance of an object on a loop. `via` is the inlet port the loop's
/// flow enters the object through, which tells multi-stream objects which
/// port pair belongs to this loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LoopMembership {
    pub loop_id: ObjectId,
    pub side: LoopSide,
    pub via: Port,
}

/// One appearance of an object on an outdoor-air chain.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OaMembership {
    pub system: ObjectId,
    pub stream: AirStream,
    pub via: Port,
}

/// Where a node (or single-stream component) sits, which decides the anchors
/// used when splicing next to it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Placement {
    Loop { loop_id: ObjectId, side: LoopSide },
    OutdoorAir { system: ObjectId, stream: AirStream },
}

#[derive(Debug, Clone, Default)]
pub struct LoopIndex {
    supply: HashMap<ObjectId, Vec<ObjectId>>,
    demand: HashMap<ObjectId, Vec<ObjectId>>,
    intake: HashMap<ObjectId, Vec<ObjectId>>,
    relief: HashMap<ObjectId, Vec<ObjectId>>,
    loops_of: HashMap<ObjectId, Vec<LoopMembership>>,
    systems_of: HashMap<ObjectId, Vec<OaMembership>>,
}

impl LoopIndex {
    pub(crate) fn build(model: &Model) -> Self {
        let mut index = LoopIndex::default();

        for obj in model.objects() {
            match model.kind(obj) {
                Some(ObjectKind::AirLoop | ObjectKind::PlantLoop) => {
                    for side in [LoopSide::Supply, LoopSide::Demand] {
                        let walked = walk::walk_loop_side(model, obj, side);
                        for &(member, via) in &walked {
                            index.loops_of.entry(member).or_default().push(LoopMembership {
                                loop_id: obj,
                                side,
                                via,
                            });
                        }
                        let list = walked.into_iter().map(|(o, _)| o).collect();
                        match side {
                            LoopSide::Supply => index.supply.insert(obj, list),
                            LoopSide::Demand => index.demand.insert(obj, list),
                        };
                    }
                }
                Some(ObjectKind::OutdoorAirSystem) => {
                    for stream in [AirStream::Intake, AirStream::Relief] {
                        let walked = match stream {
                            AirStream::Intake => walk::walk_intake(model, obj),
                            AirStream::Relief => walk::walk_relief(model, obj),
                        };
                        for &(member, via) in &walked {
                            index.systems_of.entry(member).or_default().push(OaMembership {
                                system: obj,
                                stream,
                                via,
                            });
                        }
                        let list = walked.into_iter().map(|(o, _)| o).collect();
                        match stream {
                            AirStream::Intake => index.intake.insert(obj, list),
                            AirStream::Relief => index.relief.insert(obj, list),
                        };
                    }
                }
                _ => {}
            }
        }
        index
    }

    /// Supply-side objects of a loop, in flow order.
    pub fn supply(&self, loop_id: ObjectId) -> &[ObjectId] {
        self.supply.get(&loop_id).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Demand-side objects of a loop, in flow order.
    pub fn demand(&self, loop_id: ObjectId) -> &[ObjectId] {
        self.demand.get(&loop_id).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Intake chain of an outdoor-air system, outboard node first.
    pub fn intake(&self, system: ObjectId) -> &[ObjectId] {
        self.intake.get(&system).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Relief chain of an outdoor-air system, system side first.
    pub fn relief(&self, system: ObjectId) -> &[ObjectId] {
        self.relief.get(&system).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn loops_of(&self, obj: ObjectId) -> &[LoopMembership] {
        self.loops_of.get(&obj).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn systems_of(&self, obj: ObjectId) -> &[OaMembership] {
        self.systems_of.get(&obj).map(Vec::as_slice).unwrap_or(&[])
    }
}

impl Model {
    /// Where `obj` sits: outdoor-air chains take precedence over loops,
    /// because chain members reach their loop only through the system.
    pub fn placement(&self, obj: ObjectId) -> Option<Placement> {
        let index = self.loop_index();
        if let Some(m) = index.systems_of(obj).first() {
            return Some(Placement::OutdoorAir {
                system: m.system,
                stream: m.stream,
            });
        }
        index.loops_of(obj).first().map(|m| Placement::Loop {
            loop_id: m.loop_id,
            side: m.side,
        })
    }

    pub fn loop_memberships(&self, obj: ObjectId) -> Vec<LoopMembership> {
        self.loop_index().loops_of(obj).to_vec()
    }

    /// The loop membership entered through `via`, if any.
    pub fn membership_via(&self, obj: ObjectId, via: Port) -> Option<LoopMembership> {
        self.loop_index()
            .loops_of(obj)
            .iter()
            .copied()
            .find(|m| m.via == via)
    }

    /// Air loop containing `obj`, directly or through its outdoor-air system.
    pub fn air_loop(&self, obj: ObjectId) -> Option<ObjectId> {
        let index = self.loop_index();
        let direct = index
            .loops_of(obj)
            .iter()
            .find(|m| self.kind(m.loop_id) == Some(ObjectKind::AirLoop))
            .map(|m| m.loop_id);
        direct.or_else(|| {
            let system = index.systems_of(obj).first()?.system;
            index
                .loops_of(system)
                .iter()
                .find(|m| self.kind(m.loop_id) == Some(ObjectKind::AirLoop))
                .map(|m| m.loop_id)
        })
    }

    /// Plant loop containing `obj`. For water-to-water objects this is the
    /// loop on their supply port pair.
    pub fn plant_loop(&self, obj: ObjectId) -> Option<ObjectId> {
        let index = self.loop_index();
        let is_plant = |m: &&LoopMembership| self.kind(m.loop_id) == Some(ObjectKind::PlantLoop);
        match self.shape(obj)? {
            Shape::WaterToWater { .. } => index
                .loops_of(obj)
                .iter()
                .filter(is_plant)
                .find(|m| m.via == Port::SupplyInlet)
                .map(|m| m.loop_id),
            _ => index.loops_of(obj).iter().find(is_plant).map(|m| m.loop_id),
        }
    }

    /// Plant loop on the demand port pair of a water-to-water object.
    pub fn secondary_plant_loop(&self, obj: ObjectId) -> Option<ObjectId> {
        self.membership_via(obj, Port::DemandInlet).map(|m| m.loop_id)
    }

    /// Plant loop on the tertiary port pair, found by searching every loop's
    /// supply and demand lists for this object entered through its tertiary
    /// inlet.
    pub fn tertiary_plant_loop(&self, obj: ObjectId) -> Option<ObjectId> {
        self.membership_via(obj, Port::TertiaryInlet).map(|m| m.loop_id)
    }

    pub fn outdoor_air_system(&self, obj: ObjectId) -> Option<ObjectId> {
        self.loop_index().systems_of(obj).first().map(|m| m.system)
    }
}
