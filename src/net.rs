//! A read-only view over the kernel's network-configuration state.
//!
//! The real process keeps this up to date via a netlink mirror; that
//! subsystem is out of scope here (`spec.md` §1), so the core is written
//! against this trait and driven by a fake in tests.

use std::net::IpAddr;

/// ARP hardware type, as carried in DUID-LLT and used to gate the
/// sibling-interface DUID fallback (`spec.md` §4.4 step 5).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArpHardwareType {
    Ethernet,
    Ieee802,
    InfiniBand,
    Other(u16),
}

impl ArpHardwareType {
    /// IANA ARP hardware type number (RFC 826 registry).
    pub fn code(self) -> u16 {
        match self {
            ArpHardwareType::Ethernet => 1,
            ArpHardwareType::Ieee802 => 6,
            ArpHardwareType::InfiniBand => 32,
            ArpHardwareType::Other(code) => code,
        }
    }

    /// Whether this hardware type is acceptable for deriving a DUID-LLT
    /// from a sibling interface (`spec.md` §4.4 step 5).
    pub fn accepted_for_duid(self) -> bool {
        matches!(
            self,
            ArpHardwareType::Ethernet | ArpHardwareType::Ieee802 | ArpHardwareType::InfiniBand
        )
    }
}

/// Flags carried by a kernel address entry that matter to the readiness gate.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct AddressFlags {
    pub tentative: bool,
    pub duplicate: bool,
}

/// A single address entry as reported by the kernel for an interface.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AddressInfo {
    pub address: IpAddr,
    pub flags: AddressFlags,
}

impl AddressInfo {
    pub fn is_ipv6_link_local(&self) -> bool {
        match self.address {
            IpAddr::V6(addr) => (addr.segments()[0] & 0xffc0) == 0xfe80,
            IpAddr::V4(_) => false,
        }
    }
}

/// A snapshot of one network interface, as the netlink mirror would report it.
#[derive(Debug, Clone)]
pub struct InterfaceInfo {
    pub name: String,
    pub ifindex: u32,
    /// Raw hardware address bytes. Variable length: 6 for Ethernet, 20 for
    /// InfiniBand, etc. — never assumed to be Ethernet-sized.
    pub hardware_address: Option<Vec<u8>>,
    pub arp_type: ArpHardwareType,
    pub link_up: bool,
    pub network_up: bool,
    pub vlan_tag: Option<u16>,
    pub addresses: Vec<AddressInfo>,
}

/// Read-only access to the interface/address state the core needs.
///
/// Implemented by the real netlink mirror in production, and by a fixture
/// struct in tests.
pub trait NetworkView {
    fn interface_by_index(&self, ifindex: u32) -> Option<InterfaceInfo>;

    /// All interfaces, used by the sibling-interface DUID fallback
    /// (`spec.md` §4.4 step 5), in the kernel's enumeration order.
    fn interfaces(&self) -> Vec<InterfaceInfo>;
}

/// Simple in-memory `NetworkView` used by tests and the demo binary.
#[derive(Debug, Clone, Default)]
pub struct FakeNetwork {
    pub interfaces: Vec<InterfaceInfo>,
}

impl NetworkView for FakeNetwork {
    fn interface_by_index(&self, ifindex: u32) -> Option<InterfaceInfo> {
        self.interfaces.iter().find(|i| i.ifindex == ifindex).cloned()
    }

    fn interfaces(&self) -> Vec<InterfaceInfo> {
        self.interfaces.clone()
    }
}
