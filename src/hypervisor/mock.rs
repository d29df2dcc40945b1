//! In-memory hypervisor backend. Backs `--demo` and the test suite.
//!
//! State is shared behind one mutex so handles always see the latest
//! lifecycle changes, and every runtime or lifecycle call is recorded.

use std::collections::{BTreeMap, HashSet};
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use super::{
    BlockStats, Connection, Connector, Credentials, DestroyMode, Domain, HypervisorError,
    InterfaceStats, MemoryStats, Result, StoragePool,
};

/// A call observed by the mock backend.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum MockCall {
    Runtime { domain: String, op: &'static str },
    Lifecycle { uri: String, domain: String, action: &'static str },
}

#[derive(Clone, Debug)]
pub struct MockDomain {
    pub id: Option<u32>,
    pub name: String,
    pub snapshots: Option<u32>,
    pub cpu_time_ns: Option<u64>,
    pub memory: Option<MemoryStats>,
    pub interface: Option<InterfaceStats>,
    pub block: Option<BlockStats>,
    pub disk_file: Option<String>,
    pub interface_dev: Option<String>,
    pub mac: Option<String>,
    /// Replaces the generated descriptor when set.
    pub xml: Option<String>,
    pub fail_destroy: Option<DestroyMode>,
}

impl MockDomain {
    /// A running domain with every metric present.
    pub fn running(id: u32, name: &str) -> Self {
        Self {
            id: Some(id),
            name: name.to_string(),
            snapshots: Some(0),
            cpu_time_ns: Some(0),
            memory: Some(MemoryStats { actual: Some(1_048_576), available: Some(1_000_000) }),
            interface: Some(InterfaceStats::default()),
            block: Some(BlockStats::default()),
            disk_file: Some(format!("/var/lib/libvirt/images/{}.qcow2", name)),
            interface_dev: Some(format!("vnet{}", id)),
            mac: Some(format!("52:54:00:00:00:{:02x}", id % 256)),
            xml: None,
            fail_destroy: None,
        }
    }

    /// A defined but stopped domain.
    pub fn stopped(name: &str) -> Self {
        Self {
            id: None,
            interface_dev: None,
            ..Self::running(0, name)
        }
    }

    pub fn with_cpu_time_ns(mut self, ns: Option<u64>) -> Self {
        self.cpu_time_ns = ns;
        self
    }

    pub fn with_memory(mut self, memory: Option<MemoryStats>) -> Self {
        self.memory = memory;
        self
    }

    pub fn with_interface(mut self, dev: Option<&str>, mac: Option<&str>, stats: Option<InterfaceStats>) -> Self {
        self.interface_dev = dev.map(str::to_string);
        self.mac = mac.map(str::to_string);
        self.interface = stats;
        self
    }

    pub fn with_disk(mut self, file: Option<&str>, stats: Option<BlockStats>) -> Self {
        self.disk_file = file.map(str::to_string);
        self.block = stats;
        self
    }

    pub fn with_snapshots(mut self, n: Option<u32>) -> Self {
        self.snapshots = n;
        self
    }

    pub fn with_xml(mut self, xml: &str) -> Self {
        self.xml = Some(xml.to_string());
        self
    }

    pub fn failing_destroy(mut self, mode: DestroyMode) -> Self {
        self.fail_destroy = Some(mode);
        self
    }

    fn descriptor_xml(&self) -> String {
        if let Some(ref xml) = self.xml {
            return xml.clone();
        }
        let mut xml = format!("<domain type='kvm'><name>{}</name><devices>", self.name);
        if let Some(ref file) = self.disk_file {
            xml.push_str(&format!(
                "<disk type='file' device='disk'><source file='{}'/><target dev='vda'/></disk>",
                file
            ));
        }
        if self.mac.is_some() || self.interface_dev.is_some() {
            xml.push_str("<interface type='network'>");
            if let Some(ref mac) = self.mac {
                xml.push_str(&format!("<mac address='{}'/>", mac));
            }
            if let Some(ref dev) = self.interface_dev {
                xml.push_str(&format!("<target dev='{}'/>", dev));
            }
            xml.push_str("</interface>");
        }
        xml.push_str("</devices></domain>");
        xml
    }
}

#[derive(Clone, Debug, Default)]
struct MockEndpoint {
    domains: Vec<MockDomain>,
    pools: Vec<(String, HashSet<String>)>,
    refuse: bool,
    fail_pool_listing: bool,
    connect_delay: Option<Duration>,
}

#[derive(Debug, Default)]
struct MockState {
    endpoints: BTreeMap<String, MockEndpoint>,
    calls: Vec<MockCall>,
    /// Long-running sessions (`--demo`) keep no call log.
    unrecorded: bool,
    next_id: u32,
}

/// Endpoints populated by [`MockConnector::demo`], in display order.
pub const DEMO_ENDPOINTS: [&str; 2] = ["qemu:///system", "qemu+ssh://lab/system"];

#[derive(Clone, Default)]
pub struct MockConnector {
    state: Arc<Mutex<MockState>>,
}

fn lock(state: &Mutex<MockState>) -> MutexGuard<'_, MockState> {
    state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

impl MockConnector {
    pub fn new() -> Self {
        Self::default()
    }

    /// A small two-endpoint inventory for `--demo`.
    pub fn demo() -> Self {
        let hv = Self::new();
        let [local, remote] = DEMO_ENDPOINTS;
        hv.add_domain(
            local,
            MockDomain::running(1, "web1")
                .with_cpu_time_ns(Some(8_412_000_000_000))
                .with_interface(
                    Some("vnet0"),
                    Some("52:54:00:3a:10:01"),
                    Some(InterfaceStats { rx_bytes: 734_221_118, tx_bytes: 98_112_334 }),
                )
                .with_disk(
                    Some("/var/lib/libvirt/images/web1.qcow2"),
                    Some(BlockStats { rd_bytes: 2_334_112_000, wr_bytes: 812_455_221 }),
                )
                .with_snapshots(Some(3)),
        );
        hv.add_domain(
            local,
            MockDomain::running(2, "db1")
                .with_cpu_time_ns(Some(91_330_000_000_000))
                .with_memory(Some(MemoryStats { actual: Some(8_388_608), available: None }))
                .with_disk(
                    Some("/srv/pool-fast/db1.raw"),
                    Some(BlockStats { rd_bytes: 88_123_000_000, wr_bytes: 41_876_000_000 }),
                ),
        );
        hv.add_domain(local, MockDomain::stopped("web2"));
        hv.add_pool(local, "default", &["web1.qcow2", "web2.qcow2"]);
        hv.add_pool(local, "fast", &["db1.raw"]);
        hv.add_domain(remote, MockDomain::running(7, "ci-runner").with_cpu_time_ns(None));
        hv.add_domain(remote, MockDomain::stopped("build-cache"));
        lock(&hv.state).unrecorded = true;
        hv
    }

    pub fn add_domain(&self, uri: &str, domain: MockDomain) {
        let mut state = lock(&self.state);
        if let Some(id) = domain.id {
            state.next_id = state.next_id.max(id + 1);
        }
        state.endpoints.entry(uri.to_string()).or_default().domains.push(domain);
    }

    pub fn add_pool(&self, uri: &str, name: &str, volumes: &[&str]) {
        let volumes = volumes.iter().map(|v| v.to_string()).collect();
        lock(&self.state)
            .endpoints
            .entry(uri.to_string())
            .or_default()
            .pools
            .push((name.to_string(), volumes));
    }

    /// Make `connect` fail for `uri`.
    pub fn refuse(&self, uri: &str) {
        lock(&self.state).endpoints.entry(uri.to_string()).or_default().refuse = true;
    }

    /// Make `connect` to `uri` block for `delay` before answering.
    pub fn slow(&self, uri: &str, delay: Duration) {
        lock(&self.state).endpoints.entry(uri.to_string()).or_default().connect_delay = Some(delay);
    }

    pub fn fail_pool_listing(&self, uri: &str) {
        lock(&self.state).endpoints.entry(uri.to_string()).or_default().fail_pool_listing = true;
    }

    pub fn calls(&self) -> Vec<MockCall> {
        lock(&self.state).calls.clone()
    }

    pub fn domain_id(&self, uri: &str, name: &str) -> Option<u32> {
        let state = lock(&self.state);
        state
            .endpoints
            .get(uri)
            .and_then(|ep| ep.domains.iter().find(|d| d.name == name))
            .and_then(|d| d.id)
    }
}

impl Connector for MockConnector {
    fn connect(&self, uri: &str, _creds: &Credentials) -> Result<Box<dyn Connection>> {
        let delay = lock(&self.state).endpoints.get(uri).and_then(|ep| ep.connect_delay);
        if let Some(delay) = delay {
            std::thread::sleep(delay);
        }
        let state = lock(&self.state);
        match state.endpoints.get(uri) {
            Some(ep) if !ep.refuse => Ok(Box::new(MockConnection {
                uri: uri.to_string(),
                state: Arc::clone(&self.state),
            })),
            _ => Err(HypervisorError::Connect {
                uri: uri.to_string(),
                reason: "connection refused".to_string(),
            }),
        }
    }
}

struct MockConnection {
    uri: String,
    state: Arc<Mutex<MockState>>,
}

impl MockConnection {
    fn handle(&self, name: &str) -> Box<dyn Domain> {
        Box::new(MockDomainHandle {
            uri: self.uri.clone(),
            name: name.to_string(),
            state: Arc::clone(&self.state),
        })
    }
}

impl Connection for MockConnection {
    fn uri(&self) -> String {
        self.uri.clone()
    }

    fn list_domains(&self, active_only: bool) -> Result<Vec<Box<dyn Domain>>> {
        let names: Vec<String> = {
            let state = lock(&self.state);
            let ep = state.endpoints.get(&self.uri).ok_or_else(|| HypervisorError::Connect {
                uri: self.uri.clone(),
                reason: "endpoint vanished".to_string(),
            })?;
            ep.domains
                .iter()
                .filter(|d| !active_only || d.id.is_some())
                .map(|d| d.name.clone())
                .collect()
        };
        Ok(names.iter().map(|n| self.handle(n)).collect())
    }

    fn lookup_domain(&self, name: &str) -> Result<Box<dyn Domain>> {
        let state = lock(&self.state);
        let found = state
            .endpoints
            .get(&self.uri)
            .is_some_and(|ep| ep.domains.iter().any(|d| d.name == name));
        drop(state);
        if found {
            Ok(self.handle(name))
        } else {
            Err(HypervisorError::NotFound(name.to_string()))
        }
    }

    fn list_storage_pools(&self) -> Result<Vec<Box<dyn StoragePool>>> {
        let state = lock(&self.state);
        let Some(ep) = state.endpoints.get(&self.uri) else {
            return Ok(Vec::new());
        };
        if ep.fail_pool_listing {
            return Err(HypervisorError::call("list storage pools", "permission denied"));
        }
        Ok(ep
            .pools
            .iter()
            .map(|(name, volumes)| {
                Box::new(MockPool { name: name.clone(), volumes: volumes.clone() }) as Box<dyn StoragePool>
            })
            .collect())
    }
}

struct MockPool {
    name: String,
    volumes: HashSet<String>,
}

impl StoragePool for MockPool {
    fn name(&self) -> Result<String> {
        Ok(self.name.clone())
    }

    fn volume_names(&self) -> Result<HashSet<String>> {
        Ok(self.volumes.clone())
    }
}

struct MockDomainHandle {
    uri: String,
    name: String,
    state: Arc<Mutex<MockState>>,
}

impl MockDomainHandle {
    fn with_domain<T>(&self, f: impl FnOnce(&mut MockDomain) -> Result<T>) -> Result<T> {
        let mut state = lock(&self.state);
        let domain = state
            .endpoints
            .get_mut(&self.uri)
            .and_then(|ep| ep.domains.iter_mut().find(|d| d.name == self.name))
            .ok_or_else(|| HypervisorError::NotFound(self.name.clone()))?;
        f(domain)
    }

    fn record(&self, call: MockCall) {
        let mut state = lock(&self.state);
        if !state.unrecorded {
            state.calls.push(call);
        }
    }

    fn runtime<T>(&self, op: &'static str, f: impl FnOnce(&MockDomain) -> Option<T>) -> Result<T> {
        self.record(MockCall::Runtime { domain: self.name.clone(), op });
        self.with_domain(|d| {
            if d.id.is_none() {
                return Err(HypervisorError::call(op, "domain is not running"));
            }
            f(d).ok_or(HypervisorError::Unsupported(op))
        })
    }

    fn lifecycle(&self, action: &'static str, f: impl FnOnce(&mut MockDomain, u32) -> Result<()>) -> Result<()> {
        self.record(MockCall::Lifecycle {
            uri: self.uri.clone(),
            domain: self.name.clone(),
            action,
        });
        let mut state = lock(&self.state);
        let next_id = state.next_id.max(1);
        let domain = state
            .endpoints
            .get_mut(&self.uri)
            .and_then(|ep| ep.domains.iter_mut().find(|d| d.name == self.name))
            .ok_or_else(|| HypervisorError::NotFound(self.name.clone()))?;
        let started = domain.id.is_none();
        f(domain, next_id)?;
        if started && domain.id.is_some() {
            state.next_id = next_id + 1;
        }
        Ok(())
    }
}

impl Domain for MockDomainHandle {
    fn id(&self) -> Option<u32> {
        self.with_domain(|d| Ok(d.id)).ok().flatten()
    }

    fn name(&self) -> Result<String> {
        Ok(self.name.clone())
    }

    fn snapshot_count(&self) -> Result<u32> {
        self.with_domain(|d| d.snapshots.ok_or(HypervisorError::Unsupported("snapshot count")))
    }

    fn describe_xml(&self) -> Result<String> {
        self.with_domain(|d| Ok(d.descriptor_xml()))
    }

    fn cpu_time_ns(&self) -> Result<u64> {
        self.runtime("cpu stats", |d| d.cpu_time_ns)
    }

    fn memory_stats(&self) -> Result<MemoryStats> {
        self.runtime("memory stats", |d| d.memory)
    }

    fn interface_stats(&self, device: &str) -> Result<InterfaceStats> {
        self.runtime("interface stats", |d| {
            d.interface.filter(|_| d.interface_dev.as_deref() == Some(device))
        })
    }

    fn block_stats(&self, path: &str) -> Result<BlockStats> {
        self.runtime("block stats", |d| d.block.filter(|_| d.disk_file.as_deref() == Some(path)))
    }

    fn start(&self) -> Result<()> {
        self.lifecycle("start", |d, next_id| {
            if d.id.is_some() {
                return Err(HypervisorError::call("start", "domain is already running"));
            }
            d.id = Some(next_id);
            d.interface_dev = Some(format!("vnet{}", next_id));
            Ok(())
        })
    }

    fn shutdown(&self) -> Result<()> {
        self.lifecycle("shutdown", |d, _| {
            if d.id.is_none() {
                return Err(HypervisorError::call("shutdown", "domain is not running"));
            }
            d.id = None;
            Ok(())
        })
    }

    fn destroy(&self, mode: DestroyMode) -> Result<()> {
        let action = match mode {
            DestroyMode::Forced => "destroy",
            DestroyMode::Graceful => "destroy (graceful)",
        };
        self.lifecycle(action, |d, _| {
            if d.fail_destroy == Some(mode) {
                return Err(HypervisorError::call("destroy", "device or resource busy"));
            }
            if d.id.is_none() {
                return Err(HypervisorError::call("destroy", "domain is not running"));
            }
            d.id = None;
            Ok(())
        })
    }
}
