//! One pass over one endpoint: a `VmRecord` per enumerated domain.

use thiserror::Error;

use crate::collectors::{load_pools, resolve_pool, NetworkTable, PoolVolumes};
use crate::hypervisor::{Connection, Domain, DomainDescriptor, HypervisorError};
use crate::model::{DomainState, Field, VmRecord};

const NS_PER_SEC: u64 = 1_000_000_000;

/// Why a domain was left out of this cycle.
#[derive(Debug, Error)]
pub enum SampleError {
    #[error("{domain}: {source}")]
    Hypervisor {
        domain: String,
        #[source]
        source: HypervisorError,
    },

    #[error("{domain}: descriptor has no {element}")]
    MissingElement { domain: String, element: &'static str },
}

/// Sample every domain of `conn`, in enumeration order.
///
/// Only enumeration itself can fail the endpoint. A domain that cannot be
/// sampled is logged and left out.
pub fn sample_endpoint(
    conn: &dyn Connection,
    active_only: bool,
    neighbors: &NetworkTable,
) -> Result<Vec<VmRecord>, HypervisorError> {
    let uri = conn.uri();
    let domains = conn.list_domains(active_only)?;
    if domains.is_empty() {
        return Ok(Vec::new());
    }

    let pools = load_pools(conn);
    let mut records = Vec::with_capacity(domains.len());
    for dom in &domains {
        match sample_domain(dom.as_ref(), &uri, neighbors, &pools) {
            Ok(rec) => records.push(rec),
            Err(e) => tracing::warn!(uri = %uri, error = %e, "skipping domain this cycle"),
        }
    }
    tracing::debug!(uri = %uri, sampled = records.len(), listed = domains.len(), "endpoint sampled");
    Ok(records)
}

/// Build the record for one domain. Runtime-only queries are made only for
/// running domains.
pub fn sample_domain(
    dom: &dyn Domain,
    uri: &str,
    neighbors: &NetworkTable,
    pools: &[PoolVolumes],
) -> Result<VmRecord, SampleError> {
    let name = dom.name().map_err(|source| SampleError::Hypervisor {
        domain: "<unnamed>".to_string(),
        source,
    })?;
    let wrap = |source| SampleError::Hypervisor { domain: name.clone(), source };

    let id = dom.id();
    let mut rec = VmRecord::placeholder(id, name.clone(), uri);
    rec.snapshots = dom.snapshot_count().ok().into();

    let descriptor = DomainDescriptor::parse(&dom.describe_xml().map_err(wrap)?).map_err(wrap)?;

    if rec.state == DomainState::Inactive {
        rec.storage_pool = match descriptor.disk_file {
            Some(ref file) => resolve_pool(file, pools),
            None => Field::Unavailable,
        };
        return Ok(rec);
    }

    let missing = |element| SampleError::MissingElement { domain: name.clone(), element };
    let disk_file = descriptor.disk_file.as_deref().ok_or_else(|| missing("disk source file"))?;
    let interface_dev = descriptor.interface_dev.as_deref().ok_or_else(|| missing("interface target device"))?;
    let mac = descriptor.mac.clone().ok_or_else(|| missing("interface MAC address"))?;

    rec.cpu_seconds = dom.cpu_time_ns().ok().map(|ns| ns / NS_PER_SEC).into();

    match dom.memory_stats() {
        Ok(mem) => {
            rec.mem_actual_kib = mem.actual.into();
            rec.mem_available_kib = mem.available.into();
        }
        Err(e) => {
            tracing::debug!(domain = %name, error = %e, "memory stats unavailable");
            rec.mem_actual_kib = Field::Unavailable;
            rec.mem_available_kib = Field::Unavailable;
        }
    }

    let iface = dom.interface_stats(interface_dev).ok();
    rec.net_rx_bytes = iface.map(|s| s.rx_bytes).into();
    rec.net_tx_bytes = iface.map(|s| s.tx_bytes).into();

    let block = dom.block_stats(disk_file).ok();
    rec.disk_read_bytes = block.map(|s| s.rd_bytes).into();
    rec.disk_write_bytes = block.map(|s| s.wr_bytes).into();

    rec.ip = neighbors.lookup(&mac);
    rec.mac = Field::Value(mac);
    rec.storage_pool = resolve_pool(disk_file, pools);

    Ok(rec)
}
