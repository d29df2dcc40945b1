//! The parts of a domain's XML descriptor the dashboard needs.

use roxmltree::{Document, Node};

use super::error::{HypervisorError, Result};

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct DomainDescriptor {
    /// `devices/disk/source@file` of the first file-backed disk.
    pub disk_file: Option<String>,
    /// `devices/interface/target@dev` of the first interface.
    pub interface_dev: Option<String>,
    /// `devices/interface/mac@address` of the first interface.
    pub mac: Option<String>,
}

fn child<'a, 'i>(node: Node<'a, 'i>, name: &str) -> Option<Node<'a, 'i>> {
    node.children().find(|n| n.has_tag_name(name))
}

impl DomainDescriptor {
    pub fn parse(xml: &str) -> Result<Self> {
        let doc = Document::parse(xml).map_err(|e| HypervisorError::Descriptor(e.to_string()))?;
        let Some(devices) = child(doc.root_element(), "devices") else {
            return Ok(Self::default());
        };

        let disk_file = devices
            .children()
            .filter(|n| n.has_tag_name("disk"))
            .filter_map(|disk| child(disk, "source"))
            .find_map(|source| source.attribute("file"))
            .map(str::to_string);

        let interface = child(devices, "interface");
        let interface_dev = interface
            .and_then(|i| child(i, "target"))
            .and_then(|t| t.attribute("dev"))
            .map(str::to_string);
        let mac = interface
            .and_then(|i| child(i, "mac"))
            .and_then(|m| m.attribute("address"))
            .map(str::to_string);

        Ok(Self { disk_file, interface_dev, mac })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const WEB1: &str = r#"
<domain type='kvm' id='1'>
  <name>web1</name>
  <devices>
    <disk type='file' device='cdrom'>
      <target dev='sda' bus='sata'/>
    </disk>
    <disk type='file' device='disk'>
      <driver name='qemu' type='qcow2'/>
      <source file='/var/lib/libvirt/images/web1.qcow2'/>
      <target dev='vda' bus='virtio'/>
    </disk>
    <interface type='network'>
      <mac address='52:54:00:aa:bb:cc'/>
      <source network='default'/>
      <target dev='vnet0'/>
    </interface>
  </devices>
</domain>"#;

    #[test]
    fn extracts_disk_interface_and_mac() {
        let d = DomainDescriptor::parse(WEB1).unwrap();
        assert_eq!(d.disk_file.as_deref(), Some("/var/lib/libvirt/images/web1.qcow2"));
        assert_eq!(d.interface_dev.as_deref(), Some("vnet0"));
        assert_eq!(d.mac.as_deref(), Some("52:54:00:aa:bb:cc"));
    }

    #[test]
    fn missing_elements_are_absent() {
        let d = DomainDescriptor::parse("<domain><name>x</name><devices/></domain>").unwrap();
        assert_eq!(d, DomainDescriptor::default());
        let d = DomainDescriptor::parse("<domain><name>x</name></domain>").unwrap();
        assert_eq!(d, DomainDescriptor::default());
    }

    #[test]
    fn inactive_interface_has_no_target() {
        let xml = "<domain><devices><interface type='network'><mac address='52:54:00:00:00:01'/></interface></devices></domain>";
        let d = DomainDescriptor::parse(xml).unwrap();
        assert_eq!(d.mac.as_deref(), Some("52:54:00:00:00:01"));
        assert_eq!(d.interface_dev, None);
    }

    #[test]
    fn malformed_xml_is_an_error() {
        assert!(matches!(
            DomainDescriptor::parse("<domain><devices>"),
            Err(HypervisorError::Descriptor(_))
        ));
    }
}
