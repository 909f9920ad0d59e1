//! Type definitions for quotrack

mod error;
mod snapshot;
mod stats;

pub use error::*;
pub use snapshot::*;
pub use stats::*;
