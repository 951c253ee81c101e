//! Graph-specific error types.

use hf_core::{Handle, HfError, ObjectId};

use crate::port::Port;

pub type GraphResult<T> = Result<T, GraphError>;

/// Connection-table and topology errors.
///
/// These describe misuse of the low-level primitives or states that prior
/// validation should have ruled out. Expected failures of the splicing
/// operations are reported as `Ok(false)` instead.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GraphError {
    /// The object belongs to a different model.
    ForeignObject { obj: ObjectId },

    /// The object was removed or never existed.
    MissingObject { obj: ObjectId },

    /// The object's shape has no such port.
    InvalidPort { obj: ObjectId, port: Port },

    /// An edge must leave through an outlet-kind port and enter through an inlet-kind port.
    WrongDirection { obj: ObjectId, port: Port },

    /// An edge would connect an object to itself.
    SelfLoop { obj: ObjectId },

    /// `child` is already an ancestor of `parent`.
    OwnershipCycle { child: ObjectId, parent: ObjectId },

    /// A link has no live or symmetric partner.
    DanglingLink { obj: ObjectId, port: Port },

    /// Two bare nodes are directly connected.
    AdjacentNodes { upstream: ObjectId, downstream: ObjectId },

    /// A splitter or mixer has a connected branch past its first free index.
    BranchGap { obj: ObjectId, index: u32 },

    /// A persistent handle is already used by another object.
    DuplicateHandle { handle: Handle },

    /// A structurally impossible state was reached.
    Invariant { what: String },
}

impl GraphError {
    pub(crate) fn invariant(what: impl Into<String>) -> Self {
        GraphError::Invariant { what: what.into() }
    }
}

impl std::fmt::Display for GraphError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            GraphError::ForeignObject { obj } => {
                write!(f, "Object {} belongs to another model", obj)
            }
            GraphError::MissingObject { obj } => {
                write!(f, "Object {} does not exist", obj)
            }
            GraphError::InvalidPort { obj, port } => {
                write!(f, "Object {} has no port {}", obj, port)
            }
            GraphError::WrongDirection { obj, port } => {
                write!(f, "Port {} of object {} has the wrong direction", port, obj)
            }
            GraphError::SelfLoop { obj } => {
                write!(f, "Object {} cannot be connected to itself", obj)
            }
            GraphError::OwnershipCycle { child, parent } => {
                write!(f, "Object {} already owns {}", child, parent)
            }
            GraphError::DanglingLink { obj, port } => {
                write!(f, "Port {} of object {} has a dangling link", port, obj)
            }
            GraphError::AdjacentNodes {
                upstream,
                downstream,
            } => {
                write!(
                    f,
                    "Nodes {} and {} are directly connected",
                    upstream, downstream
                )
            }
            GraphError::BranchGap { obj, index } => {
                write!(f, "Object {} has a gap before branch {}", obj, index)
            }
            GraphError::DuplicateHandle { handle } => {
                write!(f, "Handle {} is already in use", handle)
            }
            GraphError::Invariant { what } => {
                write!(f, "Invariant violated: {}", what)
            }
        }
    }
}

impl std::error::Error for GraphError {}

impl From<GraphError> for HfError {
    fn from(err: GraphError) -> Self {
        match err {
            GraphError::MissingObject { .. } => HfError::NotFound {
                what: err.to_string(),
            },
            GraphError::ForeignObject { .. }
            | GraphError::InvalidPort { .. }
            | GraphError::WrongDirection { .. }
            | GraphError::SelfLoop { .. }
            | GraphError::OwnershipCycle { .. }
            | GraphError::DuplicateHandle { .. } => HfError::InvalidArg {
                what: err.to_string(),
            },
            _ => HfError::Invariant {
                what: err.to_string(),
            },
        }
    }
}
