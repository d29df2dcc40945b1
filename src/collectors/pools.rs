use std::collections::HashSet;
use std::path::Path;

use crate::hypervisor::Connection;
use crate::model::Field;

/// Volume names of one storage pool, snapshotted for a cycle.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct PoolVolumes {
    pub name: String,
    pub volumes: HashSet<String>,
}

/// Snapshot every pool's volume names, in the hypervisor's listing order.
/// Pools that cannot be read are left out.
pub fn load_pools(conn: &dyn Connection) -> Vec<PoolVolumes> {
    let pools = match conn.list_storage_pools() {
        Ok(p) => p,
        Err(e) => {
            tracing::warn!(uri = %conn.uri(), error = %e, "storage pools unavailable");
            return Vec::new();
        }
    };

    let mut result = Vec::with_capacity(pools.len());
    for pool in pools {
        let volumes = pool.name().and_then(|name| {
            pool.volume_names().map(|volumes| PoolVolumes { name, volumes })
        });
        match volumes {
            Ok(v) => result.push(v),
            Err(e) => tracing::warn!(error = %e, "skipping unreadable storage pool"),
        }
    }
    result
}

/// Storage pool holding `disk_path`, matched by basename.
///
/// Several pools may hold volumes with the same basename; the first pool in
/// listing order wins.
pub fn resolve_pool(disk_path: &str, pools: &[PoolVolumes]) -> Field<String> {
    let Some(basename) = Path::new(disk_path).file_name().and_then(|n| n.to_str()) else {
        return Field::Unavailable;
    };
    pools
        .iter()
        .find(|p| p.volumes.contains(basename))
        .map(|p| p.name.clone())
        .into()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hypervisor::mock::MockConnector;
    use crate::hypervisor::{Connector, Credentials};

    fn pool(name: &str, volumes: &[&str]) -> PoolVolumes {
        PoolVolumes {
            name: name.to_string(),
            volumes: volumes.iter().map(|v| v.to_string()).collect(),
        }
    }

    #[test]
    fn single_containing_pool() {
        let pools = vec![pool("default", &["a.qcow2"]), pool("fast", &["web1.qcow2"])];
        assert_eq!(
            resolve_pool("/var/lib/libvirt/images/web1.qcow2", &pools),
            Field::Value("fast".to_string())
        );
    }

    #[test]
    fn no_containing_pool() {
        let pools = vec![pool("default", &["a.qcow2"])];
        assert_eq!(resolve_pool("/srv/orphan.img", &pools), Field::Unavailable);
        assert_eq!(resolve_pool("/srv/orphan.img", &[]), Field::Unavailable);
    }

    #[test]
    fn basename_collision_first_pool_wins() {
        let pools = vec![pool("default", &["disk.qcow2"]), pool("backup", &["disk.qcow2"])];
        assert_eq!(
            resolve_pool("/mnt/backup/disk.qcow2", &pools),
            Field::Value("default".to_string())
        );
    }

    #[test]
    fn path_without_basename() {
        let pools = vec![pool("default", &[".."])];
        assert_eq!(resolve_pool("/", &pools), Field::Unavailable);
        assert_eq!(resolve_pool("/srv/..", &pools), Field::Unavailable);
    }

    #[test]
    fn load_pools_keeps_listing_order() {
        let hv = MockConnector::new();
        hv.add_pool("qemu:///system", "default", &["a.qcow2"]);
        hv.add_pool("qemu:///system", "fast", &["b.raw"]);
        let conn = hv.connect("qemu:///system", &Credentials::default()).unwrap();
        let pools = load_pools(conn.as_ref());
        let names: Vec<_> = pools.iter().map(|p| p.name.as_str()).collect();
        assert_eq!(names, ["default", "fast"]);
    }

    #[test]
    fn failed_pool_listing_degrades_to_empty() {
        let hv = MockConnector::new();
        hv.add_pool("qemu:///system", "default", &["a.qcow2"]);
        hv.fail_pool_listing("qemu:///system");
        let conn = hv.connect("qemu:///system", &Credentials::default()).unwrap();
        assert!(load_pools(conn.as_ref()).is_empty());
    }
}
