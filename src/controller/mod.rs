//! VM data collection across all configured endpoints.

pub mod sampler;

use std::path::PathBuf;
use std::sync::Arc;

use chrono::Local;

use crate::collectors::NetworkTable;
use crate::hypervisor::{Connector, Credentials};
use crate::model::{partition, Viewport, VmRecord};

pub use sampler::{sample_domain, sample_endpoint, SampleError};

/// Polls every endpoint once per tick and keeps the display rows.
pub struct VmMonitor {
    connector: Arc<dyn Connector>,
    endpoints: Vec<String>,
    credentials: Credentials,
    neighbor_table: PathBuf,
    pub active_only: bool,
    /// Display order: active domains first.
    pub rows: Vec<VmRecord>,
    pub viewport: Viewport,
    /// Endpoints that could not be sampled last cycle.
    pub failed_endpoints: Vec<String>,
    pub last_update: Option<String>,
}

impl VmMonitor {
    pub fn new(
        connector: Arc<dyn Connector>,
        endpoints: Vec<String>,
        credentials: Credentials,
        neighbor_table: PathBuf,
        active_only: bool,
    ) -> Self {
        Self {
            connector,
            endpoints,
            credentials,
            neighbor_table,
            active_only,
            rows: Vec::new(),
            viewport: Viewport::default(),
            failed_endpoints: Vec::new(),
            last_update: None,
        }
    }

    pub fn endpoints(&self) -> &[String] {
        &self.endpoints
    }

    /// Rebuild the rows from scratch. Endpoints are sampled in configured
    /// order; one that fails is logged and skipped for this cycle.
    pub fn update(&mut self) {
        let neighbors = NetworkTable::load(&self.neighbor_table);
        let mut records = Vec::new();
        let mut failed = Vec::new();

        for uri in &self.endpoints {
            let sampled = self
                .connector
                .connect(uri, &self.credentials)
                .and_then(|conn| sample_endpoint(conn.as_ref(), self.active_only, &neighbors));
            match sampled {
                Ok(mut r) => records.append(&mut r),
                Err(e) => {
                    tracing::warn!(uri = %uri, error = %e, "endpoint skipped this cycle");
                    failed.push(uri.clone());
                }
            }
        }

        self.rows = partition(records, self.active_only);
        self.failed_endpoints = failed;
        self.viewport.clamp(self.rows.len());
        self.last_update = Some(Local::now().format("%H:%M:%S").to_string());
    }

    pub fn selected(&self) -> Option<&VmRecord> {
        self.rows.get(self.viewport.selected)
    }

    pub fn active_count(&self) -> usize {
        self.rows.iter().filter(|r| r.is_active()).count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hypervisor::mock::{MockConnector, MockDomain};

    fn monitor(hv: &MockConnector, endpoints: &[&str], active_only: bool) -> VmMonitor {
        VmMonitor::new(
            Arc::new(hv.clone()),
            endpoints.iter().map(|e| e.to_string()).collect(),
            Credentials::default(),
            PathBuf::from("/nonexistent/arp"),
            active_only,
        )
    }

    #[test]
    fn endpoints_concatenate_in_configured_order() {
        let hv = MockConnector::new();
        hv.add_domain("qemu+ssh://b/system", MockDomain::running(1, "b1"));
        hv.add_domain("qemu:///system", MockDomain::running(1, "a1"));
        let mut m = monitor(&hv, &["qemu:///system", "qemu+ssh://b/system"], false);
        m.update();
        let names: Vec<_> = m.rows.iter().map(|r| r.name.as_str()).collect();
        assert_eq!(names, ["a1", "b1"]);
        assert!(m.last_update.is_some());
    }

    #[test]
    fn failing_endpoint_is_skipped() {
        let hv = MockConnector::new();
        hv.refuse("qemu+ssh://down/system");
        hv.add_domain("qemu:///system", MockDomain::running(1, "web1"));
        let mut m = monitor(&hv, &["qemu+ssh://down/system", "qemu:///system"], false);
        m.update();
        assert_eq!(m.rows.len(), 1);
        assert_eq!(m.failed_endpoints, vec!["qemu+ssh://down/system".to_string()]);
    }

    #[test]
    fn selection_is_reclamped_when_rows_shrink() {
        let hv = MockConnector::new();
        hv.add_domain("qemu:///system", MockDomain::running(1, "a"));
        hv.add_domain("qemu:///system", MockDomain::running(2, "b"));
        hv.add_domain("qemu:///system", MockDomain::running(3, "c"));
        let mut m = monitor(&hv, &["qemu:///system"], true);
        m.update();
        m.viewport.last(m.rows.len());
        assert_eq!(m.selected().map(|r| r.name.as_str()), Some("c"));

        hv.add_domain("qemu:///system", MockDomain::stopped("d"));
        let conn = hv.connect("qemu:///system", &Credentials::default()).unwrap();
        conn.lookup_domain("c").unwrap().shutdown().unwrap();
        m.update();
        assert_eq!(m.rows.len(), 2);
        assert_eq!(m.viewport.selected, 1);
        assert_eq!(m.selected().map(|r| r.name.as_str()), Some("b"));
    }

    #[test]
    fn active_rows_come_first() {
        let hv = MockConnector::new();
        hv.add_domain("qemu:///system", MockDomain::stopped("off"));
        hv.add_domain("qemu:///system", MockDomain::running(1, "on"));
        let mut m = monitor(&hv, &["qemu:///system"], false);
        m.update();
        assert_eq!(m.rows[0].name, "on");
        assert_eq!(m.rows[1].name, "off");
        assert_eq!(m.active_count(), 1);
    }
}
