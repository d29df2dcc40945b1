use std::collections::HashMap;
use std::fs;
use std::path::Path;

use crate::model::Field;

/// Default location of the kernel's neighbor (ARP) table.
pub const DEFAULT_NEIGHBOR_TABLE: &str = "/proc/net/arp";

/// MAC → IP snapshot of the host's neighbor table, read once per cycle.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct NetworkTable {
    by_mac: HashMap<String, String>,
}

impl NetworkTable {
    /// Parse the `/proc/net/arp` layout:
    ///
    /// ```text
    /// IP address       HW type     Flags       HW address            Mask     Device
    /// 192.168.122.45   0x1         0x2         52:54:00:aa:bb:cc     *        virbr0
    /// ```
    pub fn parse(content: &str) -> Self {
        let mut by_mac = HashMap::new();
        for line in content.lines() {
            let parts: Vec<&str> = line.split_whitespace().collect();
            // Fields (0-indexed): 0 IP, 1 HW type, 2 flags, 3 MAC, 4 mask, 5 device.
            // The header splits into more than six words and never has an IP first.
            if parts.len() < 6 || parts[0] == "IP" {
                continue;
            }
            by_mac.insert(parts[3].to_string(), parts[0].to_string());
        }
        Self { by_mac }
    }

    /// Read the table from `path`. An unreadable table is an empty one.
    pub fn load(path: &Path) -> Self {
        match fs::read_to_string(path) {
            Ok(content) => Self::parse(&content),
            Err(e) => {
                tracing::warn!(path = %path.display(), error = %e, "neighbor table unreadable, IPs will show N/A");
                Self::default()
            }
        }
    }

    /// IP for `mac`, matched exactly as read from the table.
    pub fn lookup(&self, mac: &str) -> Field<String> {
        self.by_mac.get(mac).cloned().into()
    }

    pub fn len(&self) -> usize {
        self.by_mac.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_mac.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    const ARP: &str = "\
IP address       HW type     Flags       HW address            Mask     Device
192.168.122.45   0x1         0x2         52:54:00:aa:bb:cc     *        virbr0
10.0.0.1         0x1         0x2         f4:8e:38:01:02:03     *        eth0
";

    #[test]
    fn lookup_present_mac() {
        let table = NetworkTable::parse(ARP);
        assert_eq!(table.len(), 2);
        assert_eq!(table.lookup("52:54:00:aa:bb:cc"), Field::Value("192.168.122.45".to_string()));
        assert_eq!(table.lookup("f4:8e:38:01:02:03"), Field::Value("10.0.0.1".to_string()));
    }

    #[test]
    fn lookup_absent_mac_is_unavailable() {
        let table = NetworkTable::parse(ARP);
        assert_eq!(table.lookup("52:54:00:00:00:99"), Field::Unavailable);
        assert_eq!(table.lookup(""), Field::Unavailable);
    }

    #[test]
    fn header_is_not_an_entry() {
        let table = NetworkTable::parse(ARP);
        assert_eq!(table.lookup("address"), Field::Unavailable);
        assert_eq!(table.lookup("HW"), Field::Unavailable);
    }

    #[test]
    fn macs_are_not_normalized() {
        let table = NetworkTable::parse(ARP);
        assert_eq!(table.lookup("52:54:00:AA:BB:CC"), Field::Unavailable);
    }

    #[test]
    fn short_lines_are_skipped() {
        let table = NetworkTable::parse("10.0.0.9 0x1 0x2\n\n");
        assert!(table.is_empty());
    }

    #[test]
    fn load_from_file_and_missing_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(ARP.as_bytes()).unwrap();
        assert_eq!(NetworkTable::load(file.path()).len(), 2);
        assert!(NetworkTable::load(Path::new("/nonexistent/arp")).is_empty());
    }
}
