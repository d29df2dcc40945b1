//! Auxiliary data resolved alongside the hypervisor's own metrics:
//! MAC → IP from the host neighbor table, disk → storage pool membership.

pub mod neighbors;
pub mod pools;

pub use neighbors::{NetworkTable, DEFAULT_NEIGHBOR_TABLE};
pub use pools::{load_pools, resolve_pool, PoolVolumes};
