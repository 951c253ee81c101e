//! hf-graph: HVAC topology layer for hvacflow.
//!
//! Provides:
//! - The model: an arena of objects with a port-to-port connection table
//! - Air loops, plant loops and outdoor-air systems with their fixed anchors
//! - Splicing: insert a component next to a node, take it out again, with
//!   spacer nodes keeping every real component addressable
//! - Lazily rebuilt loop and outdoor-air membership
//! - Cloning and whole-model validation
//!
//! # Example
//!
//! ```
//! use hf_graph::{Model, ObjectKind, validate_model};
//!
//! let mut model = Model::new();
//! let plant = model.add_plant_loop().unwrap();
//! let chiller = model.add_component(ObjectKind::Chiller);
//!
//! let outlet = model.supply_outlet_node(plant).unwrap();
//! assert!(model.add_to_node(chiller, outlet).unwrap());
//! assert_eq!(model.supply_components(plant).len(), 7);
//!
//! model.remove(chiller).unwrap();
//! assert_eq!(model.supply_components(plant).len(), 5);
//! validate_model(&model).unwrap();
//! ```

mod air_to_air;
mod builder;
mod clone;
mod component;
mod connector;
pub mod error;
pub mod indexing;
mod loops;
pub mod model;
pub mod object;
mod outdoor_air;
pub mod port;
mod splice;
mod straight;
pub mod validate;
mod water_to_water;
mod walk;

// Re-exports for ergonomics
pub use error::{GraphError, GraphResult};
pub use indexing::{AirStream, LoopIndex, LoopMembership, LoopSide, OaMembership, Placement};
pub use model::{Endpoint, Model};
pub use object::{AttributeValue, Object, ObjectKind, Shape, Target};
pub use port::{Port, PortKind};
pub use validate::validate_model;
