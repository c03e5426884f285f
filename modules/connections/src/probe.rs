//! Host probing: interface addresses, the inet socket table, process metadata
//! and reverse DNS. `SystemProbe` reads the live OS; tests substitute their own
//! `HostProbe`.

use anyhow::{Context, Result};
use netstat2::{get_sockets_info, AddressFamilyFlags, ProtocolFlags, ProtocolSocketInfo, TcpState};
use std::net::{IpAddr, SocketAddr};
use sysinfo::{Networks, Pid, ProcessRefreshKind, RefreshKind, System, Users};
use tracing::debug;

use crate::model::{InterfaceAddressSet, Protocol};

/// A socket as reported by the OS, before annotation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawSocket {
    pub protocol: Protocol,
    pub local: Option<SocketAddr>,
    /// `None` when there is no peer (listening TCP sockets, UDP).
    pub remote: Option<SocketAddr>,
    pub state: String,
    pub pid: Option<u32>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProcessInfo {
    pub name: String,
    pub user: Option<String>,
}

pub trait HostProbe {
    /// IPv4 addresses of every local interface.
    fn interface_addrs(&self) -> Result<InterfaceAddressSet>;
    /// Current TCP and UDP sockets, IPv4 and IPv6, in OS order.
    fn sockets(&self) -> Result<Vec<RawSocket>>;
    /// `None` if the process no longer exists.
    fn process(&self, pid: u32) -> Option<ProcessInfo>;
    /// `None` if the address has no PTR record or the lookup fails.
    fn reverse_dns(&self, ip: IpAddr) -> Option<String>;
}

/// Live probe backed by netstat2, sysinfo and the system resolver.
pub struct SystemProbe {
    sys: System,
    users: Users,
}

impl SystemProbe {
    /// Samples the process table and user list once.
    pub fn new() -> Self {
        let sys = System::new_with_specifics(
            RefreshKind::new().with_processes(ProcessRefreshKind::everything()),
        );
        SystemProbe { sys, users: Users::new_with_refreshed_list() }
    }
}

impl Default for SystemProbe {
    fn default() -> Self {
        Self::new()
    }
}

impl HostProbe for SystemProbe {
    fn interface_addrs(&self) -> Result<InterfaceAddressSet> {
        let networks = Networks::new_with_refreshed_list();
        let set = networks
            .iter()
            .flat_map(|(_, data)| data.ip_networks().iter())
            .filter(|net| net.addr.is_ipv4())
            .map(|net| net.addr.to_string())
            .collect();
        Ok(set)
    }

    fn sockets(&self) -> Result<Vec<RawSocket>> {
        let af = AddressFamilyFlags::IPV4 | AddressFamilyFlags::IPV6;
        let proto = ProtocolFlags::TCP | ProtocolFlags::UDP;
        let infos = get_sockets_info(af, proto).context("failed to read inet socket table")?;
        let mut out = Vec::with_capacity(infos.len());
        for si in infos {
            let pid = si.associated_pids.first().copied();
            let raw = match si.protocol_socket_info {
                ProtocolSocketInfo::Tcp(tcp) => {
                    let remote = if tcp.remote_addr.is_unspecified() && tcp.remote_port == 0 {
                        None
                    } else {
                        Some(SocketAddr::new(tcp.remote_addr, tcp.remote_port))
                    };
                    RawSocket {
                        protocol: Protocol::Tcp,
                        local: Some(SocketAddr::new(tcp.local_addr, tcp.local_port)),
                        remote,
                        state: tcp_state_name(&tcp.state).to_string(),
                        pid,
                    }
                }
                // netstat2 reports no peer for UDP, even for connected sockets.
                ProtocolSocketInfo::Udp(udp) => RawSocket {
                    protocol: Protocol::Udp,
                    local: Some(SocketAddr::new(udp.local_addr, udp.local_port)),
                    remote: None,
                    state: "NONE".to_string(),
                    pid,
                },
            };
            out.push(raw);
        }
        Ok(out)
    }

    fn process(&self, pid: u32) -> Option<ProcessInfo> {
        let proc = self.sys.process(Pid::from_u32(pid))?;
        let user = proc.user_id().map(|uid| {
            self.users
                .get_user_by_id(uid)
                .map(|u| u.name().to_string())
                .unwrap_or_else(|| uid.to_string())
        });
        Some(ProcessInfo { name: proc.name().to_string_lossy().into_owned(), user })
    }

    fn reverse_dns(&self, ip: IpAddr) -> Option<String> {
        match dns_lookup::lookup_addr(&ip) {
            Ok(host) => Some(host),
            Err(e) => {
                debug!(%ip, error = %e, "reverse lookup failed");
                None
            }
        }
    }
}

fn tcp_state_name(state: &TcpState) -> &'static str {
    match state {
        TcpState::Closed => "CLOSE",
        TcpState::Listen => "LISTEN",
        TcpState::SynSent => "SYN_SENT",
        TcpState::SynReceived => "SYN_RECV",
        TcpState::Established => "ESTABLISHED",
        TcpState::FinWait1 => "FIN_WAIT1",
        TcpState::FinWait2 => "FIN_WAIT2",
        TcpState::CloseWait => "CLOSE_WAIT",
        TcpState::Closing => "CLOSING",
        TcpState::LastAck => "LAST_ACK",
        TcpState::TimeWait => "TIME_WAIT",
        _ => "UNKNOWN",
    }
}
