use core::fmt;
use core::num::NonZeroU32;

use uuid::Uuid;

use crate::error::{HfError, HfResult};

/// Compact, stable slot identifier inside one model arena.
///
/// - `u32` keeps memory small
/// - `NonZero` enables `Option<Id>` to be pointer-optimized
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Id(NonZeroU32);

impl Id {
    /// Create an Id from a 0-based index by storing index+1.
    pub fn from_index(index: u32) -> Self {
        Self(NonZeroU32::MIN.saturating_add(index))
    }

    /// Recover the 0-based index.
    pub fn index(self) -> u32 {
        self.0.get() - 1
    }
}

impl fmt::Debug for Id {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Id({})", self.index())
    }
}

impl fmt::Display for Id {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.index())
    }
}

/// Identity of one model instance. Fresh for every model, never persisted.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ModelId(Uuid);

impl ModelId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for ModelId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for ModelId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ModelId({})", self.0.simple())
    }
}

/// Reference to an object living in a specific model.
///
/// Carrying the model id makes cross-model use detectable: an `ObjectId`
/// handed to a different model is simply not owned by it.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ObjectId {
    model: ModelId,
    slot: Id,
}

impl ObjectId {
    pub fn new(model: ModelId, slot: Id) -> Self {
        Self { model, slot }
    }

    pub fn model(self) -> ModelId {
        self.model
    }

    pub fn slot(self) -> Id {
        self.slot
    }
}

impl fmt::Debug for ObjectId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ObjectId({})", self.slot.index())
    }
}

impl fmt::Display for ObjectId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.slot.index())
    }
}

/// Persistent object identity, stable across save/load.
pub type Handle = Uuid;

pub fn new_handle() -> Handle {
    Uuid::new_v4()
}

pub fn parse_handle(text: &str) -> HfResult<Handle> {
    Uuid::parse_str(text.trim()).map_err(|e| HfError::InvalidArg {
        what: format!("handle '{text}': {e}"),
    })
}
