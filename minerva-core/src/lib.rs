//! # Minerva Core
//!
//! Shared types, error taxonomy, and small pure-function utilities used by
//! every other crate in the workspace: the journal/entity/relation data
//! model, the duration parsing grammar, and retry policy primitives.

pub mod duration;
pub mod errors;
pub mod retry;
pub mod types;

pub use duration::parse_duration;
pub use errors::MinervaError;
pub use retry::RetryPolicy;

/// Prelude module for convenient imports across the workspace.
pub mod prelude {
    pub use crate::duration::parse_duration;
    pub use crate::errors::*;
    pub use crate::retry::RetryPolicy;
    pub use crate::types::*;
    pub use async_trait::async_trait;
    pub use chrono::{DateTime, Utc};
    pub use uuid::Uuid;
}
