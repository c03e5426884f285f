//! In-memory `HostProbe` for unit tests.

use anyhow::{anyhow, Result};
use std::cell::RefCell;
use std::collections::HashMap;
use std::net::{IpAddr, SocketAddr};

use crate::model::{InterfaceAddressSet, Protocol};
use crate::probe::{HostProbe, ProcessInfo, RawSocket};

#[derive(Default)]
pub struct FakeProbe {
    addrs: Vec<String>,
    sockets: Vec<RawSocket>,
    processes: HashMap<u32, ProcessInfo>,
    ptr: HashMap<IpAddr, String>,
    sockets_error: Option<String>,
    dns_queries: RefCell<Vec<String>>,
}

fn addr(s: &str) -> SocketAddr {
    s.parse().unwrap()
}

impl FakeProbe {
    pub fn new(addrs: &[&str]) -> Self {
        FakeProbe { addrs: addrs.iter().map(|a| a.to_string()).collect(), ..Default::default() }
    }

    pub fn tcp(&mut self, local: Option<&str>, remote: Option<&str>, state: &str, pid: Option<u32>) {
        self.sockets.push(RawSocket {
            protocol: Protocol::Tcp,
            local: local.map(addr),
            remote: remote.map(addr),
            state: state.to_string(),
            pid,
        });
    }

    pub fn udp(&mut self, local: &str, pid: Option<u32>) {
        self.sockets.push(RawSocket {
            protocol: Protocol::Udp,
            local: Some(addr(local)),
            remote: None,
            state: "NONE".to_string(),
            pid,
        });
    }

    pub fn add_process(&mut self, pid: u32, name: &str, user: Option<&str>) {
        self.processes
            .insert(pid, ProcessInfo { name: name.to_string(), user: user.map(str::to_string) });
    }

    pub fn ptr(&mut self, ip: &str, host: &str) {
        self.ptr.insert(ip.parse().unwrap(), host.to_string());
    }

    pub fn fail_sockets(&mut self, msg: &str) {
        self.sockets_error = Some(msg.to_string());
    }

    pub fn dns_queries(&self) -> Vec<String> {
        self.dns_queries.borrow().clone()
    }
}

impl HostProbe for FakeProbe {
    fn interface_addrs(&self) -> Result<InterfaceAddressSet> {
        Ok(self.addrs.iter().cloned().collect())
    }

    fn sockets(&self) -> Result<Vec<RawSocket>> {
        match &self.sockets_error {
            Some(msg) => Err(anyhow!(msg.clone())),
            None => Ok(self.sockets.clone()),
        }
    }

    fn process(&self, pid: u32) -> Option<ProcessInfo> {
        self.processes.get(&pid).cloned()
    }

    fn reverse_dns(&self, ip: IpAddr) -> Option<String> {
        self.dns_queries.borrow_mut().push(ip.to_string());
        self.ptr.get(&ip).cloned()
    }
}
