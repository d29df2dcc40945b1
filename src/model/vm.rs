use std::fmt;

/// Rendered text for a field whose source is missing or failing.
pub const UNAVAILABLE: &str = "N/A";
/// Rendered text for a runtime-only field of a stopped domain.
pub const INACTIVE: &str = "-";

/// One collected metric. Sentinels are variants, never magic strings.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Field<T> {
    Value(T),
    Unavailable,
    Inactive,
}

impl<T> Field<T> {
    /// Render the value with `f`, or the sentinel text.
    pub fn render(&self, f: impl FnOnce(&T) -> String) -> String {
        match self {
            Field::Value(v) => f(v),
            Field::Unavailable => UNAVAILABLE.to_string(),
            Field::Inactive => INACTIVE.to_string(),
        }
    }
}

impl<T> From<Option<T>> for Field<T> {
    fn from(opt: Option<T>) -> Self {
        match opt {
            Some(v) => Field::Value(v),
            None => Field::Unavailable,
        }
    }
}

impl<T: fmt::Display> fmt::Display for Field<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Field::Value(v) => write!(f, "{}", v),
            Field::Unavailable => f.write_str(UNAVAILABLE),
            Field::Inactive => f.write_str(INACTIVE),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DomainState {
    Active,
    Inactive,
}

impl DomainState {
    /// Running domains carry a hypervisor id; stopped ones do not.
    pub fn from_id(id: Option<u32>) -> Self {
        if id.is_some() { DomainState::Active } else { DomainState::Inactive }
    }
}

/// Everything sampled for one domain in one cycle.
#[derive(Clone, Debug, PartialEq)]
pub struct VmRecord {
    pub id: Option<u32>,
    pub name: String,
    pub uri: String,
    pub state: DomainState,
    pub cpu_seconds: Field<u64>,
    pub mem_actual_kib: Field<u64>,
    pub mem_available_kib: Field<u64>,
    pub net_rx_bytes: Field<u64>,
    pub net_tx_bytes: Field<u64>,
    pub disk_read_bytes: Field<u64>,
    pub disk_write_bytes: Field<u64>,
    pub snapshots: Field<u32>,
    pub mac: Field<String>,
    pub ip: Field<String>,
    pub storage_pool: Field<String>,
}

impl VmRecord {
    /// A record with every metric set to the inactive placeholder.
    pub fn placeholder(id: Option<u32>, name: impl Into<String>, uri: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
            uri: uri.into(),
            state: DomainState::from_id(id),
            cpu_seconds: Field::Inactive,
            mem_actual_kib: Field::Inactive,
            mem_available_kib: Field::Inactive,
            net_rx_bytes: Field::Inactive,
            net_tx_bytes: Field::Inactive,
            disk_read_bytes: Field::Inactive,
            disk_write_bytes: Field::Inactive,
            snapshots: Field::Inactive,
            mac: Field::Inactive,
            ip: Field::Inactive,
            storage_pool: Field::Inactive,
        }
    }

    pub fn is_active(&self) -> bool {
        self.state == DomainState::Active
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sentinels_render_distinctly() {
        let unavailable: Field<u64> = Field::Unavailable;
        let inactive: Field<u64> = Field::Inactive;
        assert_eq!(unavailable.to_string(), "N/A");
        assert_eq!(inactive.to_string(), "-");
        assert_ne!(unavailable, inactive);
        assert_eq!(Field::Value(42u64).to_string(), "42");
    }

    #[test]
    fn field_from_option() {
        assert_eq!(Field::from(Some(3)), Field::Value(3));
        assert_eq!(Field::<u8>::from(None), Field::Unavailable);
    }

    #[test]
    fn field_render_uses_formatter_only_for_values() {
        assert_eq!(Field::Value(5u64).render(|v| format!("{}s", v)), "5s");
        assert_eq!(Field::<u64>::Inactive.render(|v| format!("{}s", v)), "-");
    }

    #[test]
    fn state_follows_id_presence() {
        assert_eq!(DomainState::from_id(Some(1)), DomainState::Active);
        assert_eq!(DomainState::from_id(None), DomainState::Inactive);
        let rec = VmRecord::placeholder(None, "web2", "qemu:///system");
        assert!(!rec.is_active());
        assert_eq!(rec.cpu_seconds, Field::Inactive);
    }
}
