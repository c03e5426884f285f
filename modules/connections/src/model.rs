use serde::Serialize;
use std::collections::HashSet;
use std::fmt;

/// Column headers, in display order. The blank column is a spacer.
pub const HEADERS: [&str; 12] = [
    "Source IP",
    "Source Port",
    "Source Interface",
    "",
    "Destination IP",
    "Destination Port",
    "Protocol",
    "DNS Lookup Result",
    "Connection State",
    "PID",
    "Program",
    "User",
];

#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Protocol {
    Tcp,
    Udp,
}

impl fmt::Display for Protocol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Protocol::Tcp => f.write_str("TCP"),
            Protocol::Udp => f.write_str("UDP"),
        }
    }
}

/// IPv4 addresses bound to this host's interfaces, as strings.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct InterfaceAddressSet(HashSet<String>);

impl InterfaceAddressSet {
    pub fn contains(&self, ip: &str) -> bool {
        self.0.contains(ip)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    fn contains_opt(&self, ip: Option<&str>) -> bool {
        ip.map(|i| self.contains(i)).unwrap_or(false)
    }

    pub(crate) fn holds_source(&self, r: &ConnectionRecord) -> bool {
        self.contains(&r.source_ip)
    }

    pub(crate) fn holds_destination(&self, r: &ConnectionRecord) -> bool {
        self.contains_opt(r.destination_ip.as_deref())
    }
}

impl<S: Into<String>> FromIterator<S> for InterfaceAddressSet {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        InterfaceAddressSet(iter.into_iter().map(Into::into).collect())
    }
}

/// One observed socket.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ConnectionRecord {
    pub source_ip: String,
    pub source_port: Option<u16>,
    /// Reserved column; never populated.
    pub source_interface: Option<String>,
    pub destination_ip: Option<String>,
    pub destination_port: Option<u16>,
    pub protocol: Protocol,
    pub dns_lookup: Option<String>,
    pub state: String,
    pub pid: Option<u32>,
    pub program: Option<String>,
    pub user: Option<String>,
}

impl ConnectionRecord {
    /// Cells in `HEADERS` order.
    pub fn cells(&self) -> Vec<Option<String>> {
        vec![
            Some(self.source_ip.clone()),
            self.source_port.map(|p| p.to_string()),
            self.source_interface.clone(),
            None,
            self.destination_ip.clone(),
            self.destination_port.map(|p| p.to_string()),
            Some(self.protocol.to_string()),
            self.dns_lookup.clone(),
            Some(self.state.clone()),
            self.pid.map(|p| p.to_string()),
            self.program.clone(),
            self.user.clone(),
        ]
    }
}

/// Interface addresses plus the socket table, sampled once.
#[derive(Debug, Clone, Default)]
pub struct Snapshot {
    pub local_addrs: InterfaceAddressSet,
    pub records: Vec<ConnectionRecord>,
}
