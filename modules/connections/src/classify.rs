use serde::Serialize;
use std::fmt;
use thiserror::Error;

use crate::model::{ConnectionRecord, Snapshot};

/// Which connections to report, relative to this host's interface addresses.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Mode {
    All,
    Local,
    Incoming,
    Outgoing,
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Mode::All => "all",
            Mode::Local => "local",
            Mode::Incoming => "incoming",
            Mode::Outgoing => "outgoing",
        };
        f.write_str(s)
    }
}

#[derive(Debug, Error)]
pub enum ClassifyError {
    #[error("no connection mode selected (expected one of: all, local, incoming, outgoing)")]
    InvalidMode,
    #[error(transparent)]
    Probe(#[from] anyhow::Error),
}

impl Mode {
    /// Whether `r` belongs in this mode's view of `snap`.
    ///
    /// `Outgoing` keeps records whose source is *not* a local interface address.
    /// It is not the complement of `Incoming`, and most sockets this host opened
    /// itself fall outside it.
    pub fn admits(self, snap: &Snapshot, r: &ConnectionRecord) -> bool {
        let set = &snap.local_addrs;
        match self {
            Mode::All => true,
            Mode::Local => set.holds_source(r) || set.holds_destination(r),
            Mode::Incoming => set.holds_destination(r),
            Mode::Outgoing => !set.holds_source(r),
        }
    }
}

/// Apply `mode` to the snapshot. Order is preserved.
pub fn classify(snap: &Snapshot, mode: Option<Mode>) -> Result<Vec<ConnectionRecord>, ClassifyError> {
    let mode = mode.ok_or(ClassifyError::InvalidMode)?;
    Ok(snap.records.iter().filter(|r| mode.admits(snap, r)).cloned().collect())
}

/// Keep records whose source or destination IP equals `ip` exactly.
pub fn filter_ip(records: Vec<ConnectionRecord>, ip: Option<&str>) -> Vec<ConnectionRecord> {
    let Some(ip) = ip else { return records };
    records
        .into_iter()
        .filter(|r| r.source_ip == ip || r.destination_ip.as_deref() == Some(ip))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{InterfaceAddressSet, Protocol};

    fn rec(src: &str, dst: Option<&str>) -> ConnectionRecord {
        let (destination_ip, destination_port) = match dst {
            Some(d) => {
                let (ip, port) = d.rsplit_once(':').unwrap();
                (Some(ip.to_string()), Some(port.parse().unwrap()))
            }
            None => (None, None),
        };
        let (ip, port) = src.rsplit_once(':').unwrap();
        ConnectionRecord {
            source_ip: ip.to_string(),
            source_port: Some(port.parse().unwrap()),
            source_interface: None,
            destination_ip,
            destination_port,
            protocol: Protocol::Tcp,
            dns_lookup: None,
            state: (if dst.is_some() { "ESTABLISHED" } else { "LISTEN" }).to_string(),
            pid: None,
            program: None,
            user: None,
        }
    }

    fn snap(addrs: &[&str], records: Vec<ConnectionRecord>) -> Snapshot {
        let local_addrs: InterfaceAddressSet = addrs.iter().copied().collect();
        Snapshot { local_addrs, records }
    }

    fn mixed() -> Snapshot {
        snap(
            &["127.0.0.1", "192.168.1.5"],
            vec![
                rec("192.168.1.5:443", Some("93.184.216.34:51000")),
                rec("0.0.0.0:22", None),
                rec("127.0.0.1:5432", Some("127.0.0.1:40000")),
                rec("10.8.0.3:40112", Some("192.168.1.5:8080")),
                rec("::1:631", None),
                rec("172.17.0.2:3000", Some("8.8.8.8:53")),
            ],
        )
    }

    const MODES: [Mode; 4] = [Mode::All, Mode::Local, Mode::Incoming, Mode::Outgoing];

    #[test]
    fn no_mode_is_an_error() {
        let err = classify(&mixed(), None).unwrap_err();
        assert!(matches!(err, ClassifyError::InvalidMode));
    }

    #[test]
    fn all_returns_everything_in_order() {
        let s = mixed();
        assert_eq!(classify(&s, Some(Mode::All)).unwrap(), s.records);
    }

    #[test]
    fn every_mode_is_a_subset_of_all() {
        let s = mixed();
        let all = classify(&s, Some(Mode::All)).unwrap();
        for m in MODES {
            let got = classify(&s, Some(m)).unwrap();
            assert!(got.len() <= all.len());
            assert!(got.iter().all(|r| all.contains(r)), "{m} produced a record not in all");
        }
    }

    #[test]
    fn local_means_either_endpoint_is_ours() {
        let s = mixed();
        let local = classify(&s, Some(Mode::Local)).unwrap();
        for r in &s.records {
            let ours = s.local_addrs.contains(&r.source_ip)
                || r.destination_ip.as_deref().map(|d| s.local_addrs.contains(d)).unwrap_or(false);
            assert_eq!(local.contains(r), ours, "{:?}", r);
        }
        assert_eq!(local.len(), 3);
    }

    #[test]
    fn incoming_checks_destination_only() {
        let s = mixed();
        let got = classify(&s, Some(Mode::Incoming)).unwrap();
        let dsts: Vec<_> = got.iter().map(|r| r.destination_ip.as_deref().unwrap()).collect();
        assert_eq!(dsts, vec!["127.0.0.1", "192.168.1.5"]);
    }

    #[test]
    fn outgoing_keeps_foreign_sources() {
        let s = mixed();
        let got = classify(&s, Some(Mode::Outgoing)).unwrap();
        let srcs: Vec<_> = got.iter().map(|r| r.source_ip.as_str()).collect();
        assert_eq!(srcs, vec!["0.0.0.0", "10.8.0.3", "::1", "172.17.0.2"]);
    }

    #[test]
    fn outgoing_is_not_the_mirror_of_incoming() {
        // A socket this host opened to a remote peer: source is ours, the
        // destination is not. It shows up under `local` but under neither
        // `incoming` nor `outgoing`.
        let s = snap(&["192.168.1.5"], vec![rec("192.168.1.5:443", Some("93.184.216.34:51000"))]);
        assert!(classify(&s, Some(Mode::Outgoing)).unwrap().is_empty());
        assert!(classify(&s, Some(Mode::Incoming)).unwrap().is_empty());
        assert_eq!(classify(&s, Some(Mode::Local)).unwrap().len(), 1);
    }

    #[test]
    fn classify_is_idempotent() {
        let s = mixed();
        for m in MODES {
            let first = classify(&s, Some(m)).unwrap();
            let second = classify(&s, Some(m)).unwrap();
            assert_eq!(first, second);
        }
    }

    #[test]
    fn ip_filter_never_grows_result() {
        let s = mixed();
        for m in MODES {
            let base = classify(&s, Some(m)).unwrap();
            for ip in ["192.168.1.5", "127.0.0.1", "8.8.8.8", "nope"] {
                let filtered = filter_ip(base.clone(), Some(ip));
                assert!(filtered.len() <= base.len());
                assert!(filtered
                    .iter()
                    .all(|r| r.source_ip == ip || r.destination_ip.as_deref() == Some(ip)));
            }
        }
    }

    #[test]
    fn ip_filter_without_match_is_empty() {
        let s = mixed();
        let all = classify(&s, Some(Mode::All)).unwrap();
        assert!(filter_ip(all, Some("10.0.0.1")).is_empty());
    }

    #[test]
    fn ip_filter_is_exact_and_case_sensitive() {
        let s = snap(&[], vec![rec("fe80::1:22", None), rec("10.0.0.10:80", None)]);
        let all = classify(&s, Some(Mode::All)).unwrap();
        assert!(filter_ip(all.clone(), Some("FE80::1")).is_empty());
        assert!(filter_ip(all.clone(), Some("10.0.0.1")).is_empty());
        assert_eq!(filter_ip(all.clone(), Some("fe80::1")).len(), 1);
        assert_eq!(filter_ip(all, None).len(), 2);
    }
}
