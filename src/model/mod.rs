// Re-export all model types from submodules.

pub use viewport::{partition, Viewport};
pub use vm::{DomainState, Field, VmRecord, INACTIVE, UNAVAILABLE};

mod viewport;
mod vm;
