use anyhow::{Context, Result};
use tracing::{debug, info};

use crate::model::{ConnectionRecord, Snapshot};
use crate::probe::HostProbe;

/// Sample interface addresses and the socket table, annotating each socket with
/// process metadata and, when `nslookup` is set, the destination's PTR name.
///
/// Sockets without a local address are dropped. A failed reverse lookup or a
/// process that exited after the socket table was read leaves the matching
/// fields empty; only failures to read the tables themselves are returned.
pub fn enumerate<P: HostProbe + ?Sized>(probe: &P, nslookup: bool) -> Result<Snapshot> {
    let local_addrs = probe.interface_addrs().context("failed to list interface addresses")?;
    let sockets = probe.sockets()?;
    let mut records = Vec::with_capacity(sockets.len());
    for sock in sockets {
        let Some(local) = sock.local else { continue };

        let (destination_ip, destination_port, dns_lookup) = match sock.remote {
            Some(remote) => {
                let dns = if nslookup { probe.reverse_dns(remote.ip()) } else { None };
                (Some(remote.ip().to_string()), Some(remote.port()), dns)
            }
            None => (None, None, None),
        };

        let process = sock.pid.and_then(|pid| probe.process(pid).map(|p| (pid, p)));
        if process.is_none() {
            debug!(pid = ?sock.pid, local = %local, "no process for socket");
        }
        let (pid, program, user) = match process {
            Some((pid, p)) => (Some(pid), Some(p.name), p.user),
            None => (None, None, None),
        };

        records.push(ConnectionRecord {
            source_ip: local.ip().to_string(),
            source_port: Some(local.port()),
            source_interface: None,
            destination_ip,
            destination_port,
            protocol: sock.protocol,
            dns_lookup,
            state: sock.state,
            pid,
            program,
            user,
        });
    }
    info!(sockets = records.len(), interfaces = local_addrs.len(), "connection table sampled");
    Ok(Snapshot { local_addrs, records })
}
