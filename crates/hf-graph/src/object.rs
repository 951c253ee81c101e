//! Object kinds, port shapes and the per-object record.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use hf_core::{Handle, HfError, ObjectId};

use crate::port::{Port, PortKind};

/// Every kind of object the topology knows about.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ObjectKind {
    Node,
    Fan,
    HeatingCoil,
    CoolingCoil,
    Humidifier,
    Pump,
    Boiler,
    Pipe,
    HeatExchangerAirToAir,
    /// Chiller with an optional heat-recovery (tertiary) connection.
    Chiller,
    HeatPumpWaterToWater,
    HeatExchangerFluidToFluid,
    ZoneSplitter,
    SupplySplitter,
    ConnectorSplitter,
    ZoneMixer,
    ConnectorMixer,
    OutdoorAirSystem,
    ControllerOutdoorAir,
    AirLoop,
    PlantLoop,
}

impl ObjectKind {
    pub const ALL: [ObjectKind; 21] = [
        ObjectKind::Node,
        ObjectKind::Fan,
        ObjectKind::HeatingCoil,
        ObjectKind::CoolingCoil,
        ObjectKind::Humidifier,
        ObjectKind::Pump,
        ObjectKind::Boiler,
        ObjectKind::Pipe,
        ObjectKind::HeatExchangerAirToAir,
        ObjectKind::Chiller,
        ObjectKind::HeatPumpWaterToWater,
        ObjectKind::HeatExchangerFluidToFluid,
        ObjectKind::ZoneSplitter,
        ObjectKind::SupplySplitter,
        ObjectKind::ConnectorSplitter,
        ObjectKind::ZoneMixer,
        ObjectKind::ConnectorMixer,
        ObjectKind::OutdoorAirSystem,
        ObjectKind::ControllerOutdoorAir,
        ObjectKind::AirLoop,
        ObjectKind::PlantLoop,
    ];

    /// Stable snake_case name used in project files.
    pub fn label(self) -> &'static str {
        match self {
            ObjectKind::Node => "node",
            ObjectKind::Fan => "fan",
            ObjectKind::HeatingCoil => "heating_coil",
            ObjectKind::CoolingCoil => "cooling_coil",
            ObjectKind::Humidifier => "humidifier",
            ObjectKind::Pump => "pump",
            ObjectKind::Boiler => "boiler",
            ObjectKind::Pipe => "pipe",
            ObjectKind::HeatExchangerAirToAir => "heat_exchanger_air_to_air",
            ObjectKind::Chiller => "chiller",
            ObjectKind::HeatPumpWaterToWater => "heat_pump_water_to_water",
            ObjectKind::HeatExchangerFluidToFluid => "heat_exchanger_fluid_to_fluid",
            ObjectKind::ZoneSplitter => "zone_splitter",
            ObjectKind::SupplySplitter => "supply_splitter",
            ObjectKind::ConnectorSplitter => "connector_splitter",
            ObjectKind::ZoneMixer => "zone_mixer",
            ObjectKind::ConnectorMixer => "connector_mixer",
            ObjectKind::OutdoorAirSystem => "outdoor_air_system",
            ObjectKind::ControllerOutdoorAir => "controller_outdoor_air",
            ObjectKind::AirLoop => "air_loop",
            ObjectKind::PlantLoop => "plant_loop",
        }
    }

    /// Human-readable prefix for generated names.
    pub fn title(self) -> &'static str {
        match self {
            ObjectKind::Node => "Node",
            ObjectKind::Fan => "Fan",
            ObjectKind::HeatingCoil => "Heating Coil",
            ObjectKind::CoolingCoil => "Cooling Coil",
            ObjectKind::Humidifier => "Humidifier",
            ObjectKind::Pump => "Pump",
            ObjectKind::Boiler => "Boiler",
            ObjectKind::Pipe => "Pipe",
            ObjectKind::HeatExchangerAirToAir => "Heat Exchanger Air To Air",
            ObjectKind::Chiller => "Chiller",
            ObjectKind::HeatPumpWaterToWater => "Heat Pump Water To Water",
            ObjectKind::HeatExchangerFluidToFluid => "Heat Exchanger Fluid To Fluid",
            ObjectKind::ZoneSplitter => "Zone Splitter",
            ObjectKind::SupplySplitter => "Supply Splitter",
            ObjectKind::ConnectorSplitter => "Connector Splitter",
            ObjectKind::ZoneMixer => "Zone Mixer",
            ObjectKind::ConnectorMixer => "Connector Mixer",
            ObjectKind::OutdoorAirSystem => "Outdoor Air System",
            ObjectKind::ControllerOutdoorAir => "Controller Outdoor Air",
            ObjectKind::AirLoop => "Air Loop",
            ObjectKind::PlantLoop => "Plant Loop",
        }
    }

    pub fn shape(self) -> Shape {
        match self {
            ObjectKind::Node => Shape::Node,
            ObjectKind::Fan
            | ObjectKind::HeatingCoil
            | ObjectKind::CoolingCoil
            | ObjectKind::Humidifier
            | ObjectKind::Pump
            | ObjectKind::Boiler
            | ObjectKind::Pipe => Shape::Straight,
            ObjectKind::HeatExchangerAirToAir => Shape::AirToAir,
            ObjectKind::Chiller => Shape::WaterToWater { tertiary: true },
            ObjectKind::HeatPumpWaterToWater | ObjectKind::HeatExchangerFluidToFluid => {
                Shape::WaterToWater { tertiary: false }
            }
            ObjectKind::ZoneSplitter | ObjectKind::SupplySplitter | ObjectKind::ConnectorSplitter => {
                Shape::Splitter
            }
            ObjectKind::ZoneMixer | ObjectKind::ConnectorMixer => Shape::Mixer,
            ObjectKind::OutdoorAirSystem => Shape::OutdoorAirSystem,
            ObjectKind::ControllerOutdoorAir => Shape::Detached,
            ObjectKind::AirLoop | ObjectKind::PlantLoop => Shape::Loop,
        }
    }
}

impl fmt::Display for ObjectKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for ObjectKind {
    type Err = HfError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        ObjectKind::ALL
            .into_iter()
            .find(|k| k.label() == s)
            .ok_or_else(|| HfError::invalid_arg(format!("unknown object kind '{s}'")))
    }
}

/// Port layout of an object.
///
/// Traversals match on the shape to find how flow passes through an object
/// instead of asking for each concrete kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Shape {
    /// Pass-through vertex with one inlet and one outlet.
    Node,
    /// One inlet and one outlet.
    Straight,
    /// Primary (intake) and secondary (relief) streams.
    AirToAir,
    /// Supply and demand port pairs, plus a tertiary pair when `tertiary` is set.
    WaterToWater { tertiary: bool },
    /// One inlet fanning out to `Branch(i)` outlets.
    Splitter,
    /// `Branch(i)` inlets joining into one outlet.
    Mixer,
    /// Return/mixed air pass-through plus outdoor-air and relief chain ends.
    OutdoorAirSystem,
    /// Supply and demand side boundaries of a loop.
    Loop,
    /// No ports at all.
    Detached,
}

impl Shape {
    /// Direction of `port` on this shape, or `None` if the shape lacks it.
    pub fn port_kind(self, port: Port) -> Option<PortKind> {
        use PortKind::{Inlet as In, Outlet as Out};
        match (self, port) {
            (Shape::Node | Shape::Straight, Port::Inlet) => Some(In),
            (Shape::Node | Shape::Straight, Port::Outlet) => Some(Out),

            (Shape::AirToAir, Port::PrimaryInlet | Port::SecondaryInlet) => Some(In),
            (Shape::AirToAir, Port::PrimaryOutlet | Port::SecondaryOutlet) => Some(Out),

            (Shape::WaterToWater { .. }, Port::SupplyInlet | Port::DemandInlet) => Some(In),
            (Shape::WaterToWater { .. }, Port::SupplyOutlet | Port::DemandOutlet) => Some(Out),
            (Shape::WaterToWater { tertiary: true }, Port::TertiaryInlet) => Some(In),
            (Shape::WaterToWater { tertiary: true }, Port::TertiaryOutlet) => Some(Out),

            (Shape::Splitter, Port::Inlet) => Some(In),
            (Shape::Splitter, Port::Branch(_)) => Some(Out),
            (Shape::Mixer, Port::Branch(_)) => Some(In),
            (Shape::Mixer, Port::Outlet) => Some(Out),

            (Shape::OutdoorAirSystem, Port::ReturnAir | Port::OutdoorAir) => Some(In),
            (Shape::OutdoorAirSystem, Port::MixedAir | Port::ReliefAir) => Some(Out),

            // Seen from the loop object, flow leaves into each side's inlet
            // and comes back from each side's outlet.
            (Shape::Loop, Port::SupplySideInlet | Port::DemandSideInlet) => Some(Out),
            (Shape::Loop, Port::SupplySideOutlet(_) | Port::DemandSideOutlet) => Some(In),

            _ => None,
        }
    }

    /// The port on the other end of the same stream, for shapes whose
    /// streams pass straight through.
    pub fn paired_port(self, port: Port) -> Option<Port> {
        let pair = match port {
            Port::Inlet => Port::Outlet,
            Port::Outlet => Port::Inlet,
            Port::PrimaryInlet => Port::PrimaryOutlet,
            Port::PrimaryOutlet => Port::PrimaryInlet,
            Port::SecondaryInlet => Port::SecondaryOutlet,
            Port::SecondaryOutlet => Port::SecondaryInlet,
            Port::SupplyInlet => Port::SupplyOutlet,
            Port::SupplyOutlet => Port::SupplyInlet,
            Port::DemandInlet => Port::DemandOutlet,
            Port::DemandOutlet => Port::DemandInlet,
            Port::TertiaryInlet => Port::TertiaryOutlet,
            Port::TertiaryOutlet => Port::TertiaryInlet,
            _ => return None,
        };
        match self {
            Shape::Node | Shape::Straight | Shape::AirToAir | Shape::WaterToWater { .. } => {
                self.port_kind(port).map(|_| pair)
            }
            _ => None,
        }
    }

    /// Whether flow passes through this shape port-to-port.
    pub fn is_pass_through(self) -> bool {
        matches!(
            self,
            Shape::Node | Shape::Straight | Shape::AirToAir | Shape::WaterToWater { .. }
        )
    }
}

/// Typed attribute value stored on an object.
#[derive(Debug, Clone, PartialEq)]
pub enum AttributeValue {
    Real(f64),
    Integer(i64),
    Text(String),
    Flag(bool),
}

/// Pointer-valued fields resolving to another object.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Target {
    Controller,
    SupplySplitter,
    SupplyMixer,
    DemandSplitter,
    DemandMixer,
}

impl Target {
    pub const ALL: [Target; 5] = [
        Target::Controller,
        Target::SupplySplitter,
        Target::SupplyMixer,
        Target::DemandSplitter,
        Target::DemandMixer,
    ];

    pub fn label(self) -> &'static str {
        match self {
            Target::Controller => "controller",
            Target::SupplySplitter => "supply_splitter",
            Target::SupplyMixer => "supply_mixer",
            Target::DemandSplitter => "demand_splitter",
            Target::DemandMixer => "demand_mixer",
        }
    }
}

impl FromStr for Target {
    type Err = HfError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        Target::ALL
            .into_iter()
            .find(|t| t.label() == s)
            .ok_or_else(|| HfError::invalid_arg(format!("unknown target field '{s}'")))
    }
}

/// One object in the model arena.
#[derive(Debug, Clone, PartialEq)]
pub struct Object {
    pub(crate) handle: Handle,
    pub(crate) kind: ObjectKind,
    pub(crate) name: String,
    pub(crate) attributes: BTreeMap<String, AttributeValue>,
    pub(crate) targets: BTreeMap<Target, ObjectId>,
    /// Containing object, if this one is owned by another (e.g. a controller).
    pub(crate) parent: Option<ObjectId>,
}

impl Object {
    pub(crate) fn new(handle: Handle, kind: ObjectKind, name: String) -> Self {
        Self {
            handle,
            kind,
            name,
            attributes: BTreeMap::new(),
            targets: BTreeMap::new(),
            parent: None,
        }
    }

    pub fn handle(&self) -> Handle {
        self.handle
    }

    pub fn kind(&self) -> ObjectKind {
        self.kind
    }

    pub fn shape(&self) -> Shape {
        self.kind.shape()
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn attributes(&self) -> &BTreeMap<String, AttributeValue> {
        &self.attributes
    }

    pub fn targets(&self) -> &BTreeMap<Target, ObjectId> {
        &self.targets
    }

    pub fn parent(&self) -> Option<ObjectId> {
        self.parent
    }
}
