//! Port identifiers and directions.

use std::fmt;
use std::str::FromStr;

use hf_core::HfError;

/// Whether an edge enters or leaves the owning object at a port.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PortKind {
    /// Flow enters the object here.
    Inlet,
    /// Flow leaves the object here.
    Outlet,
}

impl PortKind {
    pub fn opposite(self) -> Self {
        match self {
            PortKind::Inlet => PortKind::Outlet,
            PortKind::Outlet => PortKind::Inlet,
        }
    }
}

/// Named attachment point on an object.
///
/// Which ports exist, and in which direction they carry flow, depends on the
/// object's [`Shape`](crate::object::Shape).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Port {
    Inlet,
    Outlet,
    PrimaryInlet,
    PrimaryOutlet,
    SecondaryInlet,
    SecondaryOutlet,
    SupplyInlet,
    SupplyOutlet,
    DemandInlet,
    DemandOutlet,
    TertiaryInlet,
    TertiaryOutlet,
    /// Variable-arity splitter outlet or mixer inlet.
    Branch(u32),
    ReturnAir,
    MixedAir,
    OutdoorAir,
    ReliefAir,
    SupplySideInlet,
    SupplySideOutlet(u32),
    DemandSideInlet,
    DemandSideOutlet,
}

impl Port {
    fn fixed_label(self) -> Option<&'static str> {
        Some(match self {
            Port::Inlet => "inlet",
            Port::Outlet => "outlet",
            Port::PrimaryInlet => "primary_inlet",
            Port::PrimaryOutlet => "primary_outlet",
            Port::SecondaryInlet => "secondary_inlet",
            Port::SecondaryOutlet => "secondary_outlet",
            Port::SupplyInlet => "supply_inlet",
            Port::SupplyOutlet => "supply_outlet",
            Port::DemandInlet => "demand_inlet",
            Port::DemandOutlet => "demand_outlet",
            Port::TertiaryInlet => "tertiary_inlet",
            Port::TertiaryOutlet => "tertiary_outlet",
            Port::ReturnAir => "return_air",
            Port::MixedAir => "mixed_air",
            Port::OutdoorAir => "outdoor_air",
            Port::ReliefAir => "relief_air",
            Port::SupplySideInlet => "supply_side_inlet",
            Port::DemandSideInlet => "demand_side_inlet",
            Port::DemandSideOutlet => "demand_side_outlet",
            Port::Branch(_) | Port::SupplySideOutlet(_) => return None,
        })
    }

    const FIXED: [Port; 19] = [
        Port::Inlet,
        Port::Outlet,
        Port::PrimaryInlet,
        Port::PrimaryOutlet,
        Port::SecondaryInlet,
        Port::SecondaryOutlet,
        Port::SupplyInlet,
        Port::SupplyOutlet,
        Port::DemandInlet,
        Port::DemandOutlet,
        Port::TertiaryInlet,
        Port::TertiaryOutlet,
        Port::ReturnAir,
        Port::MixedAir,
        Port::OutdoorAir,
        Port::ReliefAir,
        Port::SupplySideInlet,
        Port::DemandSideInlet,
        Port::DemandSideOutlet,
    ];
}

impl fmt::Display for Port {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Port::Branch(i) => write!(f, "branch:{}", i),
            Port::SupplySideOutlet(i) => write!(f, "supply_side_outlet:{}", i),
            other => f.write_str(other.fixed_label().unwrap_or("?")),
        }
    }
}

impl FromStr for Port {
    type Err = HfError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if let Some((name, index)) = s.split_once(':') {
            let index: u32 = index
                .parse()
                .map_err(|_| HfError::invalid_arg(format!("port index in '{s}'")))?;
            return match name {
                "branch" => Ok(Port::Branch(index)),
                "supply_side_outlet" => Ok(Port::SupplySideOutlet(index)),
                _ => Err(HfError::invalid_arg(format!("unknown port '{s}'"))),
            };
        }
        Port::FIXED
            .into_iter()
            .find(|p| p.fixed_label() == Some(s))
            .ok_or_else(|| HfError::invalid_arg(format!("unknown port '{s}'")))
    }
}
