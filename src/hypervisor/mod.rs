//! The hypervisor capability surface the dashboard consumes.
//!
//! Backends (`mock`, and `libvirt` when the feature is enabled) implement
//! these traits; the sampler and the lifecycle tasks only see trait objects.

use std::collections::HashSet;

pub mod credentials;
pub mod descriptor;
pub mod error;
#[cfg(feature = "libvirt")]
pub mod libvirt;
pub mod mock;

pub use credentials::{CredentialKind, Credentials};
pub use descriptor::DomainDescriptor;
pub use error::{HypervisorError, Result};

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct MemoryStats {
    /// Current balloon size, KiB.
    pub actual: Option<u64>,
    /// Memory the guest reports as usable, KiB. Needs a balloon driver.
    pub available: Option<u64>,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct InterfaceStats {
    pub rx_bytes: u64,
    pub tx_bytes: u64,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct BlockStats {
    pub rd_bytes: u64,
    pub wr_bytes: u64,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DestroyMode {
    /// Terminate immediately, escalating past an unresponsive guest.
    Forced,
    /// Ask the hypervisor to terminate without escalating.
    Graceful,
}

/// Opens connections. Shared with lifecycle tasks, hence `Send + Sync`.
pub trait Connector: Send + Sync {
    fn connect(&self, uri: &str, creds: &Credentials) -> Result<Box<dyn Connection>>;
}

pub trait Connection {
    fn uri(&self) -> String;
    fn list_domains(&self, active_only: bool) -> Result<Vec<Box<dyn Domain>>>;
    fn lookup_domain(&self, name: &str) -> Result<Box<dyn Domain>>;
    fn list_storage_pools(&self) -> Result<Vec<Box<dyn StoragePool>>>;
}

pub trait Domain {
    /// Hypervisor id; `None` when the domain is not running.
    fn id(&self) -> Option<u32>;
    fn name(&self) -> Result<String>;
    fn snapshot_count(&self) -> Result<u32>;
    fn describe_xml(&self) -> Result<String>;

    // Defined only for running domains.
    fn cpu_time_ns(&self) -> Result<u64>;
    fn memory_stats(&self) -> Result<MemoryStats>;
    fn interface_stats(&self, device: &str) -> Result<InterfaceStats>;
    fn block_stats(&self, path: &str) -> Result<BlockStats>;

    fn start(&self) -> Result<()>;
    fn shutdown(&self) -> Result<()>;
    fn destroy(&self, mode: DestroyMode) -> Result<()>;
}

pub trait StoragePool {
    fn name(&self) -> Result<String>;
    fn volume_names(&self) -> Result<HashSet<String>>;
}
