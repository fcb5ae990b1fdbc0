//! Lease data and its storage seam (`spec.md` §3 "Lease", §6), grounded on
//! the lease fields read back out of `ni_dhcp6_fsm_commit_lease` and
//! persisted by `ni_dhcp6_lease_file_write` in
//! `original_source/dhcp6/device.c` (the FSM module and on-disk format
//! themselves are out of scope here, per `spec.md` §1).

use std::net::Ipv6Addr;
use std::time::Instant;

use crate::request::IaRequest;

/// One address or prefix bound to an Identity Association.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Binding {
    Address {
        address: Ipv6Addr,
        preferred_lifetime: u32,
        valid_lifetime: u32,
    },
    Prefix {
        prefix: Ipv6Addr,
        prefix_len: u8,
        preferred_lifetime: u32,
        valid_lifetime: u32,
    },
}

impl Binding {
    pub fn valid_lifetime(&self) -> u32 {
        match self {
            Binding::Address { valid_lifetime, .. } => *valid_lifetime,
            Binding::Prefix { valid_lifetime, .. } => *valid_lifetime,
        }
    }
}

/// A resolved lease, as the FSM collaborator would hand it back.
#[derive(Debug, Clone)]
pub struct Lease {
    pub kind: IaRequest,
    pub server_duid: Vec<u8>,
    pub preference: i32,
    pub bindings: Vec<Binding>,
    pub acquired_at: Instant,
}

impl Lease {
    /// `spec.md` §4.8 boundary scenario: the earliest `valid_lifetime`
    /// across all bindings governs the renewal clock.
    pub fn earliest_valid_lifetime(&self) -> Option<u32> {
        self.bindings.iter().map(Binding::valid_lifetime).min()
    }

    pub fn is_empty(&self) -> bool {
        self.bindings.is_empty()
    }
}

/// Persistence hook for leases (`spec.md` §6). The on-disk format is out
/// of scope; this is the seam the FSM collaborator writes through.
pub trait LeaseStore {
    fn remove(&self, ifname: &str, kind: IaRequest, family: LeaseFamily);
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LeaseFamily {
    Inet6,
}

/// A `LeaseStore` that discards everything, for tests and `info-only`
/// sessions that never persist a lease.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullLeaseStore;

impl LeaseStore for NullLeaseStore {
    fn remove(&self, _ifname: &str, _kind: IaRequest, _family: LeaseFamily) {}
}
