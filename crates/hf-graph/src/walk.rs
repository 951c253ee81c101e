//! Flow-path traversals over the connection table.

use std::collections::{BTreeMap, HashMap, HashSet};

use hf_core::ObjectId;

use crate::indexing::LoopSide;
use crate::model::{Endpoint, Model};
use crate::object::Shape;
use crate::port::Port;

/// Walk one side of a loop downstream from its inlet boundary.
///
/// Yields each object with the port it was entered through. Splitter
/// branches are visited in index order; a mixer is yielded once every one of
/// its connected branches has reached it, so a side reads inlet, splitter,
/// branch 0, branch 1, ..., mixer, outlet.
pub(crate) fn walk_loop_side(model: &Model, loop_id: ObjectId, side: LoopSide) -> Vec<(ObjectId, Port)> {
    let start = match side {
        LoopSide::Supply => Port::SupplySideInlet,
        LoopSide::Demand => Port::DemandSideInlet,
    };

    let mut out = Vec::new();
    let mut seen: HashSet<ObjectId> = HashSet::new();
    let mut arrivals: HashMap<ObjectId, u32> = HashMap::new();
    // Mixers reached by some but not all branches, with their first entry port.
    let mut waiting: BTreeMap<ObjectId, Port> = BTreeMap::new();
    let mut stack: Vec<Endpoint> = model.peer(loop_id, start).into_iter().collect();

    loop {
        while let Some(here) = stack.pop() {
            if here.obj == loop_id {
                continue;
            }
            let Some(shape) = model.shape(here.obj) else {
                continue;
            };

            if shape == Shape::Mixer {
                let count = arrivals.entry(here.obj).or_insert(0);
                *count += 1;
                if *count < model.next_branch_index(here.obj) {
                    waiting.entry(here.obj).or_insert(here.port);
                    continue;
                }
                waiting.remove(&here.obj);
                if seen.insert(here.obj) {
                    out.push((here.obj, here.port));
                    stack.extend(model.peer(here.obj, Port::Outlet));
                }
                continue;
            }

            if !seen.insert(here.obj) {
                continue;
            }
            match shape {
                Shape::Splitter => {
                    out.push((here.obj, here.port));
                    let branches = model.next_branch_index(here.obj);
                    for i in (0..branches).rev() {
                        stack.extend(model.peer(here.obj, Port::Branch(i)));
                    }
                }
                Shape::OutdoorAirSystem if here.port == Port::ReturnAir => {
                    out.push((here.obj, here.port));
                    stack.extend(model.peer(here.obj, Port::MixedAir));
                }
                s if s.is_pass_through() => {
                    out.push((here.obj, here.port));
                    if let Some(next) = s.paired_port(here.port) {
                        stack.extend(model.peer(here.obj, next));
                    }
                }
                _ => {
                    tracing::warn!(
                        loop_id = %loop_id,
                        obj = %here.obj,
                        kind = ?model.kind(here.obj),
                        port = %here.port,
                        "unexpected object on loop path, branch walk stopped"
                    );
                }
            }
        }

        // A mixer whose other branches never arrive (detached upstream) is
        // released so the rest of the side is still discovered.
        match waiting.pop_first() {
            Some((mixer, port)) => {
                if seen.insert(mixer) {
                    out.push((mixer, port));
                    stack.extend(model.peer(mixer, Port::Outlet));
                }
            }
            None => break,
        }
    }
    out
}

/// Walk the outdoor-air intake chain upstream from the system.
///
/// Result is in flow order: the outboard node first, the object feeding the
/// system last. Ports are the inlet port each object is entered through.
pub(crate) fn walk_intake(model: &Model, system: ObjectId) -> Vec<(ObjectId, Port)> {
    let mut out = Vec::new();
    let mut seen: HashSet<ObjectId> = HashSet::new();
    let mut cursor = model.peer(system, Port::OutdoorAir);

    while let Some(here) = cursor {
        let Some(inlet) = chain_step(model, system, here, &mut seen) else {
            break;
        };
        out.push((here.obj, inlet));
        cursor = model.peer(here.obj, inlet);
    }
    out.reverse();
    out
}

/// Walk the relief chain downstream from the system, in flow order.
pub(crate) fn walk_relief(model: &Model, system: ObjectId) -> Vec<(ObjectId, Port)> {
    let mut out = Vec::new();
    let mut seen: HashSet<ObjectId> = HashSet::new();
    let mut cursor = model.peer(system, Port::ReliefAir);

    while let Some(here) = cursor {
        let Some(outlet) = chain_step(model, system, here, &mut seen) else {
            break;
        };
        out.push((here.obj, here.port));
        cursor = model.peer(here.obj, outlet);
    }
    out
}

/// Port on the far side of `here` along a chain, or `None` if the walk ends.
fn chain_step(
    model: &Model,
    system: ObjectId,
    here: Endpoint,
    seen: &mut HashSet<ObjectId>,
) -> Option<Port> {
    let shape = model.shape(here.obj)?;
    if !shape.is_pass_through() {
        tracing::warn!(
            system = %system,
            obj = %here.obj,
            kind = ?model.kind(here.obj),
            "unsupported object in outdoor-air chain, walk stopped"
        );
        return None;
    }
    if !seen.insert(here.obj) {
        tracing::warn!(system = %system, obj = %here.obj, "outdoor-air chain loops back on itself");
        return None;
    }
    shape.paired_port(here.port)
}
