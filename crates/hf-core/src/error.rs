use thiserror::Error;

pub type HfResult<T> = Result<T, HfError>;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum HfError {
    #[error("Invalid argument: {what}")]
    InvalidArg { what: String },

    #[error("Not found: {what}")]
    NotFound { what: String },

    #[error("Invariant violated: {what}")]
    Invariant { what: String },
}

impl HfError {
    pub fn invalid_arg(what: impl Into<String>) -> Self {
        Self::InvalidArg { what: what.into() }
    }

    pub fn invariant(what: impl Into<String>) -> Self {
        Self::Invariant { what: what.into() }
    }
}
