//! libvirt backend (`--features libvirt`).

use std::cell::RefCell;
use std::collections::HashSet;

use virt::connect::{Connect, ConnectAuth, ConnectCredential};
use virt::domain::{Domain as VirDomain, MemoryStat};
use virt::domain_snapshot::DomainSnapshot;
use virt::storage_pool::StoragePool as VirStoragePool;
use virt::sys;

use super::credentials::{self, CredentialKind};
use super::{
    BlockStats, Connection, Connector, Credentials, DestroyMode, Domain, HypervisorError,
    InterfaceStats, MemoryStats, Result, StoragePool,
};

thread_local! {
    // libvirt's auth callback is a plain fn pointer; the credentials for the
    // connection being opened on this thread are parked here.
    static PENDING_CREDENTIALS: RefCell<Credentials> = RefCell::new(Credentials::default());
}

fn credential_kind(typ: i32) -> CredentialKind {
    match typ as u32 {
        sys::VIR_CRED_AUTHNAME => CredentialKind::AuthName,
        sys::VIR_CRED_PASSPHRASE => CredentialKind::Passphrase,
        _ => CredentialKind::Other(typ),
    }
}

fn auth_callback(creds: &mut Vec<ConnectCredential>) {
    let kinds: Vec<CredentialKind> = creds.iter().map(|c| credential_kind(c.typ)).collect();
    let answers = PENDING_CREDENTIALS.with(|pending| credentials::respond(&kinds, &pending.borrow()));
    for (cred, answer) in creds.iter_mut().zip(answers) {
        if answer.is_some() {
            cred.result = answer;
        }
    }
}

/// Balloon size and guest-available memory, both in KiB.
fn memory_from_stats(stats: &[MemoryStat]) -> MemoryStats {
    let find = |tag: u32| stats.iter().find(|s| s.tag == tag).map(|s| s.val);
    MemoryStats {
        actual: find(sys::VIR_DOMAIN_MEMORY_STAT_ACTUAL_BALLOON),
        available: find(sys::VIR_DOMAIN_MEMORY_STAT_AVAILABLE),
    }
}

fn call_err(op: &'static str) -> impl FnOnce(virt::error::Error) -> HypervisorError {
    move |e| HypervisorError::call(op, e)
}

pub struct LibvirtConnector;

impl Connector for LibvirtConnector {
    fn connect(&self, uri: &str, creds: &Credentials) -> Result<Box<dyn Connection>> {
        PENDING_CREDENTIALS.with(|pending| *pending.borrow_mut() = creds.clone());
        let mut auth = ConnectAuth::new(
            vec![sys::VIR_CRED_AUTHNAME, sys::VIR_CRED_PASSPHRASE],
            auth_callback,
        );
        let result = Connect::open_auth(Some(uri), &mut auth, 0);
        PENDING_CREDENTIALS.with(|pending| *pending.borrow_mut() = Credentials::default());
        let conn = result.map_err(|e| HypervisorError::Connect {
            uri: uri.to_string(),
            reason: e.to_string(),
        })?;
        Ok(Box::new(LibvirtConnection { uri: uri.to_string(), conn }))
    }
}

struct LibvirtConnection {
    uri: String,
    conn: Connect,
}

impl Connection for LibvirtConnection {
    fn uri(&self) -> String {
        self.conn.get_uri().unwrap_or_else(|_| self.uri.clone())
    }

    fn list_domains(&self, active_only: bool) -> Result<Vec<Box<dyn Domain>>> {
        let flags = if active_only { sys::VIR_CONNECT_LIST_DOMAINS_ACTIVE } else { 0 };
        let domains = self.conn.list_all_domains(flags).map_err(call_err("list domains"))?;
        Ok(domains
            .into_iter()
            .map(|dom| Box::new(LibvirtDomain { dom }) as Box<dyn Domain>)
            .collect())
    }

    fn lookup_domain(&self, name: &str) -> Result<Box<dyn Domain>> {
        let dom = VirDomain::lookup_by_name(&self.conn, name)
            .map_err(|_| HypervisorError::NotFound(name.to_string()))?;
        Ok(Box::new(LibvirtDomain { dom }))
    }

    fn list_storage_pools(&self) -> Result<Vec<Box<dyn StoragePool>>> {
        let pools = self.conn.list_all_storage_pools(0).map_err(call_err("list storage pools"))?;
        Ok(pools
            .into_iter()
            .map(|pool| Box::new(LibvirtPool { pool }) as Box<dyn StoragePool>)
            .collect())
    }
}

struct LibvirtPool {
    pool: VirStoragePool,
}

impl StoragePool for LibvirtPool {
    fn name(&self) -> Result<String> {
        self.pool.get_name().map_err(call_err("pool name"))
    }

    fn volume_names(&self) -> Result<HashSet<String>> {
        let volumes = self.pool.list_volumes().map_err(call_err("list volumes"))?;
        Ok(volumes.into_iter().collect())
    }
}

struct LibvirtDomain {
    dom: VirDomain,
}

impl Domain for LibvirtDomain {
    fn id(&self) -> Option<u32> {
        self.dom.get_id()
    }

    fn name(&self) -> Result<String> {
        self.dom.get_name().map_err(call_err("domain name"))
    }

    fn snapshot_count(&self) -> Result<u32> {
        DomainSnapshot::num(&self.dom, 0).map_err(call_err("snapshot count"))
    }

    fn describe_xml(&self) -> Result<String> {
        self.dom.get_xml_desc(0).map_err(call_err("describe domain"))
    }

    fn cpu_time_ns(&self) -> Result<u64> {
        self.dom.get_info().map(|info| info.cpu_time).map_err(call_err("cpu stats"))
    }

    fn memory_stats(&self) -> Result<MemoryStats> {
        // libvirt fills up to VIR_DOMAIN_MEMORY_STAT_NR slots itself.
        let stats = self.dom.memory_stats(0).map_err(call_err("memory stats"))?;
        Ok(memory_from_stats(&stats))
    }

    fn interface_stats(&self, device: &str) -> Result<InterfaceStats> {
        let stats = self.dom.interface_stats(device).map_err(call_err("interface stats"))?;
        Ok(InterfaceStats {
            rx_bytes: stats.rx_bytes.max(0) as u64,
            tx_bytes: stats.tx_bytes.max(0) as u64,
        })
    }

    fn block_stats(&self, path: &str) -> Result<BlockStats> {
        let stats = self.dom.get_block_stats(path).map_err(call_err("block stats"))?;
        Ok(BlockStats {
            rd_bytes: stats.rd_bytes.max(0) as u64,
            wr_bytes: stats.wr_bytes.max(0) as u64,
        })
    }

    fn start(&self) -> Result<()> {
        self.dom.create().map(|_| ()).map_err(call_err("start"))
    }

    fn shutdown(&self) -> Result<()> {
        self.dom.shutdown().map(|_| ()).map_err(call_err("shutdown"))
    }

    fn destroy(&self, mode: DestroyMode) -> Result<()> {
        let flags = match mode {
            DestroyMode::Forced => sys::VIR_DOMAIN_DESTROY_DEFAULT,
            DestroyMode::Graceful => sys::VIR_DOMAIN_DESTROY_GRACEFUL,
        };
        self.dom.destroy_flags(flags).map(|_| ()).map_err(call_err("destroy"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn memory_stats_pick_balloon_and_available() {
        let stats = [
            MemoryStat { tag: sys::VIR_DOMAIN_MEMORY_STAT_SWAP_IN, val: 7 },
            MemoryStat { tag: sys::VIR_DOMAIN_MEMORY_STAT_AVAILABLE, val: 2_000_000 },
            MemoryStat { tag: sys::VIR_DOMAIN_MEMORY_STAT_ACTUAL_BALLOON, val: 2_097_152 },
        ];
        assert_eq!(
            memory_from_stats(&stats),
            MemoryStats { actual: Some(2_097_152), available: Some(2_000_000) }
        );
    }

    #[test]
    fn memory_stats_missing_tags_are_absent() {
        let stats = [MemoryStat { tag: sys::VIR_DOMAIN_MEMORY_STAT_ACTUAL_BALLOON, val: 1024 }];
        assert_eq!(memory_from_stats(&stats).available, None);
    }

    #[test]
    fn credential_types_map_to_kinds() {
        assert_eq!(credential_kind(sys::VIR_CRED_AUTHNAME as i32), CredentialKind::AuthName);
        assert_eq!(credential_kind(sys::VIR_CRED_PASSPHRASE as i32), CredentialKind::Passphrase);
        assert_eq!(credential_kind(-1), CredentialKind::Other(-1));
    }
}
