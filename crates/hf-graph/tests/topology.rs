//! Integration tests for hf-graph: end-to-end topology edits on loops and
//! outdoor-air systems.

use hf_graph::{Model, ObjectKind, Port, validate_model};

fn position(list: &[hf_core::ObjectId], obj: hf_core::ObjectId) -> usize {
    list.iter().position(|&o| o == obj).unwrap()
}

/// Air loop with an outdoor-air system spliced in at the supply inlet.
fn air_loop_with_system() -> (Model, hf_core::ObjectId, hf_core::ObjectId) {
    let mut m = Model::new();
    let air_loop = m.add_air_loop().unwrap();
    let oa = m.add_outdoor_air_system().unwrap();
    let inlet = m.supply_inlet_node(air_loop).unwrap();
    assert!(m.add_to_node(oa, inlet).unwrap());
    (m, air_loop, oa)
}

#[test]
fn chiller_at_plant_supply_outlet() {
    let mut m = Model::new();
    let plant = m.add_plant_loop().unwrap();
    assert_eq!(m.supply_components(plant).len(), 5);

    let chiller = m.add_component(ObjectKind::Chiller);
    let outlet = m.supply_outlet_node(plant).unwrap();
    assert!(m.add_to_node(chiller, outlet).unwrap());

    // inlet, splitter, branch node, mixer, spacer, chiller, outlet
    assert_eq!(m.supply_components(plant).len(), 7);
    assert_eq!(m.connected_object(chiller, Port::SupplyOutlet), Some(outlet));
    assert_eq!(m.plant_loop(chiller), Some(plant));
    validate_model(&m).unwrap();

    assert!(m.remove_from_plant_loop(chiller).unwrap());
    assert_eq!(m.supply_components(plant).len(), 5);
    assert!(m.object(chiller).is_some());
    assert_eq!(m.plant_loop(chiller), None);
    validate_model(&m).unwrap();
}

#[test]
fn chiller_at_plant_supply_inlet() {
    let mut m = Model::new();
    let plant = m.add_plant_loop().unwrap();
    let chiller = m.add_component(ObjectKind::Chiller);
    let inlet = m.supply_inlet_node(plant).unwrap();
    let splitter = m.supply_splitter(plant).unwrap();
    assert!(m.add_to_node(chiller, inlet).unwrap());

    assert_eq!(m.connected_object(chiller, Port::SupplyInlet), Some(inlet));
    let spacer = m.connected_object(chiller, Port::SupplyOutlet).unwrap();
    assert_eq!(m.kind(spacer), Some(ObjectKind::Node));
    assert_eq!(m.outlet_object(spacer), Some(splitter));
    validate_model(&m).unwrap();
}

#[test]
fn condenser_side_goes_to_demand_branch() {
    let mut m = Model::new();
    let chilled = m.add_plant_loop().unwrap();
    let condenser = m.add_plant_loop().unwrap();
    let chiller = m.add_component(ObjectKind::Chiller);

    assert!(m.add_supply_branch_for_component(chilled, chiller).unwrap());
    assert!(m.add_demand_branch_for_component(condenser, chiller, false).unwrap());

    assert_eq!(m.plant_loop(chiller), Some(chilled));
    assert_eq!(m.secondary_plant_loop(chiller), Some(condenser));
    assert!(m.supply_component(chilled, chiller));
    assert!(m.demand_component(condenser, chiller));
    validate_model(&m).unwrap();

    // Dropping the secondary side leaves the supply side alone.
    assert!(m.remove_from_secondary_plant_loop(chiller).unwrap());
    assert_eq!(m.secondary_plant_loop(chiller), None);
    assert_eq!(m.plant_loop(chiller), Some(chilled));
    assert_eq!(m.branch_objects(m.demand_splitter(condenser).unwrap()).len(), 1);
    validate_model(&m).unwrap();
}

#[test]
fn fan_ahead_of_outdoor_air_system() {
    let (mut m, air_loop, oa) = air_loop_with_system();
    let inlet = m.supply_inlet_node(air_loop).unwrap();
    let fan = m.add_component(ObjectKind::Fan);
    assert!(m.add_to_node(fan, inlet).unwrap());

    // inlet -> fan -> node -> outdoor-air system
    assert_eq!(m.outlet_object(inlet), Some(fan));
    let spacer = m.outlet_object(fan).unwrap();
    assert!(m.is_node(spacer));
    assert_eq!(m.outlet_object(spacer), Some(oa));
    validate_model(&m).unwrap();
}

#[test]
fn fan_behind_outdoor_air_system_comes_out_cleanly() {
    let (mut m, air_loop, oa) = air_loop_with_system();
    let outlet = m.supply_outlet_node(air_loop).unwrap();
    let fan = m.add_component(ObjectKind::Fan);
    assert!(m.add_to_node(fan, outlet).unwrap());

    // outdoor-air system -> node -> fan -> outlet
    let spacer = m.connected_object(oa, Port::MixedAir).unwrap();
    assert!(m.is_node(spacer));
    assert_eq!(m.outlet_object(spacer), Some(fan));
    assert_eq!(m.outlet_object(fan), Some(outlet));
    validate_model(&m).unwrap();

    let before = m.object_count();
    assert!(m.remove_from_loop(fan).unwrap());
    assert_eq!(m.connected_object(oa, Port::MixedAir), Some(outlet));
    assert!(m.object(spacer).is_none());
    assert_eq!(m.object_count(), before - 1);
    validate_model(&m).unwrap();
}

#[test]
fn exchanger_comes_and_goes_on_outboard_node() {
    let (mut m, _air_loop, oa) = air_loop_with_system();
    let outboard = m.outboard_oa_node(oa).unwrap();
    let hx = m.add_component(ObjectKind::HeatExchangerAirToAir);

    assert!(m.add_to_node(hx, outboard).unwrap());
    assert_eq!(m.oa_components(oa).len(), 3);
    assert_eq!(m.relief_components(oa).len(), 3);
    validate_model(&m).unwrap();

    assert!(m.remove_from_loop(hx).unwrap());
    assert_eq!(m.oa_components(oa).len(), 1);
    assert_eq!(m.relief_components(oa).len(), 1);
    assert!(m.object(hx).is_some());
    validate_model(&m).unwrap();
}

#[test]
fn second_exchanger_outboard_on_both_streams() {
    let (mut m, _air_loop, oa) = air_loop_with_system();
    let outboard = m.outboard_oa_node(oa).unwrap();
    let a = m.add_component(ObjectKind::HeatExchangerAirToAir);
    let b = m.add_component(ObjectKind::HeatExchangerAirToAir);
    assert!(m.add_to_node(a, outboard).unwrap());
    assert!(m.add_to_node(b, outboard).unwrap());

    // Intake reads outboard first, relief reads system first.
    let intake = m.oa_components(oa);
    let relief = m.relief_components(oa);
    assert!(position(&intake, b) < position(&intake, a));
    assert!(position(&relief, b) > position(&relief, a));
    assert_eq!(m.outboard_oa_node(oa), Some(outboard));
    validate_model(&m).unwrap();
}

#[test]
fn second_exchanger_inboard_on_both_streams() {
    let (mut m, _air_loop, oa) = air_loop_with_system();
    let outboard = m.outboard_oa_node(oa).unwrap();
    let a = m.add_component(ObjectKind::HeatExchangerAirToAir);
    assert!(m.add_to_node(a, outboard).unwrap());

    let inboard = m.connected_object(a, Port::PrimaryOutlet).unwrap();
    let b = m.add_component(ObjectKind::HeatExchangerAirToAir);
    assert!(m.add_to_node(b, inboard).unwrap());

    let intake = m.oa_components(oa);
    let relief = m.relief_components(oa);
    assert!(position(&intake, b) > position(&intake, a));
    assert!(position(&relief, b) < position(&relief, a));
    validate_model(&m).unwrap();

    assert!(m.remove_from_loop(b).unwrap());
    assert!(m.remove_from_loop(a).unwrap());
    assert_eq!(m.oa_components(oa).len(), 1);
    assert_eq!(m.relief_components(oa).len(), 1);
    validate_model(&m).unwrap();
}

#[test]
fn relief_fan_on_outboard_relief_node() {
    let (mut m, _air_loop, oa) = air_loop_with_system();
    let relief_node = m.outboard_relief_node(oa).unwrap();
    let fan = m.add_component(ObjectKind::Fan);
    assert!(m.add_to_node(fan, relief_node).unwrap());

    // system -> node -> fan -> relief node
    assert_eq!(m.relief_components(oa).len(), 3);
    assert_eq!(m.outlet_object(fan), Some(relief_node));
    assert_eq!(m.outdoor_air_system(fan), Some(oa));
    validate_model(&m).unwrap();

    assert!(m.remove_from_loop(fan).unwrap());
    assert_eq!(m.relief_components(oa), vec![relief_node]);
    validate_model(&m).unwrap();
}

#[test]
fn straight_component_moves_between_chains() {
    let (mut m, air_loop, oa) = air_loop_with_system();
    let coil = m.add_component(ObjectKind::HeatingCoil);
    let outlet = m.supply_outlet_node(air_loop).unwrap();
    assert!(m.add_to_node(coil, outlet).unwrap());
    assert_eq!(m.air_loop(coil), Some(air_loop));

    let outboard = m.outboard_oa_node(oa).unwrap();
    assert!(m.add_to_node(coil, outboard).unwrap());
    assert!(!m.supply_component(air_loop, coil));
    assert_eq!(m.outdoor_air_system(coil), Some(oa));
    // Still served by the loop through its outdoor-air system.
    assert_eq!(m.air_loop(coil), Some(air_loop));
    validate_model(&m).unwrap();
}

#[test]
fn objects_from_another_model_are_refused() {
    let mut first = Model::new();
    let mut second = Model::new();
    let plant = first.add_plant_loop().unwrap();
    let outlet = first.supply_outlet_node(plant).unwrap();
    let foreign = second.add_component(ObjectKind::Boiler);
    let local = first.add_component(ObjectKind::Boiler);

    assert!(!first.add_to_node(foreign, outlet).unwrap());
    assert!(!second.add_to_node(foreign, outlet).unwrap());
    assert!(first.connect(local, Port::Outlet, foreign, Port::Inlet).is_err());
    assert_eq!(first.supply_components(plant).len(), 5);
    validate_model(&first).unwrap();
}

#[test]
fn dual_duct_decks_take_components_independently() {
    let mut m = Model::new();
    let air_loop = m.add_air_loop().unwrap();
    assert!(m.make_dual_duct(air_loop).unwrap());
    let outlets = m.supply_outlet_nodes(air_loop);
    assert_eq!(outlets.len(), 2);
    let splitter = m.supply_splitter(air_loop).unwrap();

    let hot = m.add_component(ObjectKind::HeatingCoil);
    let cold = m.add_component(ObjectKind::CoolingCoil);
    assert!(m.add_to_node(hot, outlets[1]).unwrap());
    assert!(m.add_to_node(cold, outlets[0]).unwrap());

    assert_eq!(m.outlet_object(hot), Some(outlets[1]));
    assert_eq!(m.outlet_object(cold), Some(outlets[0]));
    assert!(m.supply_component(air_loop, hot));
    assert!(m.supply_component(air_loop, cold));
    validate_model(&m).unwrap();

    assert!(m.remove_from_loop(hot).unwrap());
    assert_eq!(m.connected_object(splitter, Port::Branch(1)), Some(outlets[1]));
    assert_eq!(m.outlet_object(cold), Some(outlets[0]));
    validate_model(&m).unwrap();
}

#[test]
fn removing_the_system_takes_its_chains() {
    let (mut m, air_loop, oa) = air_loop_with_system();
    let outboard = m.outboard_oa_node(oa).unwrap();
    let controller = m.controller_outdoor_air(oa).unwrap();
    let fan = m.add_component(ObjectKind::Fan);
    assert!(m.add_to_node(fan, outboard).unwrap());

    assert!(m.is_removable(oa));
    let removed = m.remove(oa).unwrap();
    assert!(removed.contains(&oa));
    assert!(removed.contains(&controller));
    assert!(removed.contains(&outboard));
    assert!(removed.contains(&fan));

    assert_eq!(m.loop_outdoor_air_system(air_loop), None);
    let inlet = m.supply_inlet_node(air_loop).unwrap();
    let outlet = m.supply_outlet_node(air_loop).unwrap();
    assert_eq!(m.outlet_object(inlet), Some(outlet));
    validate_model(&m).unwrap();
}

#[test]
fn cloned_loop_is_a_fresh_topology() {
    let mut m = Model::new();
    let plant = m.add_plant_loop().unwrap();
    let boiler = m.add_component(ObjectKind::Boiler);
    assert!(m.add_supply_branch_for_component(plant, boiler).unwrap());

    let copy = m.clone_object(plant).unwrap();
    assert_ne!(copy, plant);
    assert_eq!(m.supply_components(copy).len(), 5);
    assert_eq!(m.demand_components(copy).len(), 5);
    assert!(!m.component(copy, boiler));
    validate_model(&m).unwrap();
}
