//! Active connection listing: enumerate the host's inet sockets, annotate them
//! with process and reverse-DNS data, then classify them against the host's own
//! interface addresses.

mod classify;
mod enumerate;
mod model;
mod probe;
#[cfg(test)]
mod testing;

pub use classify::{classify, filter_ip, ClassifyError, Mode};
pub use enumerate::enumerate;
pub use model::{ConnectionRecord, InterfaceAddressSet, Protocol, Snapshot, HEADERS};
pub use probe::{HostProbe, ProcessInfo, RawSocket, SystemProbe};

/// Everything a listing run needs, fixed at startup.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ConnectionQuery {
    pub mode: Option<Mode>,
    pub ip: Option<String>,
    pub nslookup: bool,
}

impl ConnectionQuery {
    /// Enumerate, classify and IP-filter in one pass.
    ///
    /// A missing mode is rejected before the OS is touched, so the usage error
    /// never comes with partial output or lookups.
    pub fn run<P: HostProbe + ?Sized>(&self, probe: &P) -> Result<Vec<ConnectionRecord>, ClassifyError> {
        let mode = self.mode.ok_or(ClassifyError::InvalidMode)?;
        let snap = enumerate(probe, self.nslookup)?;
        let records = classify(&snap, Some(mode))?;
        Ok(filter_ip(records, self.ip.as_deref()))
    }
}
