//! DUID type and the derivation chain from `spec.md` §4.4.
//!
//! The `Duid` newtype itself is grounded on the teacher's
//! `shadow_dhcpv6::Duid` (`lib.rs`): an opaque byte vector with colon-hex
//! formatting, length validation, and a zero-cost conversion into
//! `dhcproto`'s own DUID wrapper for the FSM to embed as `ClientId`.

use std::fmt;
use std::time::{SystemTime, UNIX_EPOCH};

use serde::{de::Visitor, Deserialize, Serialize};
use tracing::{debug, warn};
use uuid::Uuid;

use crate::error::Dhcp6Error;
use crate::net::{ArpHardwareType, NetworkView};

/// Maximum DUID length per RFC 8415 §11.1.
pub const MAX_DUID_LEN: usize = 130;

/// DUID-LLT type code (RFC 8415 §11.2).
const DUID_LLT: u16 = 1;
/// DUID-UUID type code (RFC 8415 §11.5).
const DUID_UUID: u16 = 4;
/// Seconds between the Unix epoch and 2000-01-01T00:00:00Z, the DUID-LLT epoch.
const DUID_EPOCH_OFFSET_SECS: u64 = 946_684_800;

#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub struct Duid {
    pub bytes: Vec<u8>,
}

impl Duid {
    pub fn new(bytes: Vec<u8>) -> Option<Self> {
        if bytes.is_empty() || bytes.len() > MAX_DUID_LEN {
            return None;
        }
        Some(Duid { bytes })
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    /// Build a DUID-LLT (RFC 8415 §11.2) from an ARP hardware type, a
    /// hardware address, and the current wall-clock time.
    pub fn llt(arp_type: ArpHardwareType, hw_addr: &[u8], now: SystemTime) -> Self {
        let secs_since_epoch = now
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_secs())
            .unwrap_or(0);
        let duid_time = secs_since_epoch.saturating_sub(DUID_EPOCH_OFFSET_SECS) as u32;

        let mut bytes = Vec::with_capacity(8 + hw_addr.len());
        bytes.extend_from_slice(&DUID_LLT.to_be_bytes());
        bytes.extend_from_slice(&arp_type.code().to_be_bytes());
        bytes.extend_from_slice(&duid_time.to_be_bytes());
        bytes.extend_from_slice(hw_addr);
        Duid { bytes }
    }

    /// Build a DUID-UUID (RFC 8415 §11.5) wrapping a random UUID.
    pub fn from_uuid(uuid: Uuid) -> Self {
        let mut bytes = Vec::with_capacity(18);
        bytes.extend_from_slice(&DUID_UUID.to_be_bytes());
        bytes.extend_from_slice(uuid.as_bytes());
        Duid { bytes }
    }

    pub fn to_colon_string(&self) -> String {
        self.to_string()
    }
}

impl fmt::Display for Duid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, b) in self.bytes.iter().enumerate() {
            if i > 0 {
                f.write_str(":")?;
            }
            write!(f, "{:02x}", b)?;
        }
        Ok(())
    }
}

impl Serialize for Duid {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(&self.to_string())
    }
}

impl<'de> Deserialize<'de> for Duid {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        struct DuidVisitor;
        impl<'de> Visitor<'de> for DuidVisitor {
            type Value = Duid;

            fn expecting(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
                formatter.write_str(r#"colon or dash separated hex "00:11:22" or "00-11-22""#)
            }

            fn visit_str<E>(self, v: &str) -> Result<Self::Value, E>
            where
                E: serde::de::Error,
            {
                Duid::try_from(v).map_err(serde::de::Error::custom)
            }
        }
        deserializer.deserialize_str(DuidVisitor)
    }
}

impl From<Vec<u8>> for Duid {
    fn from(value: Vec<u8>) -> Self {
        Duid { bytes: value }
    }
}

impl From<&[u8]> for Duid {
    fn from(value: &[u8]) -> Self {
        Duid {
            bytes: value.to_vec(),
        }
    }
}

/// Hand-off to the FSM: `dhcproto`'s DUID wrapper is itself just a byte
/// newtype in the version this crate depends on.
impl From<Duid> for dhcproto::v6::duid::Duid {
    fn from(value: Duid) -> Self {
        Self::from(value.bytes)
    }
}

#[derive(Debug)]
pub struct DuidParseError {
    pub message: &'static str,
}

impl std::error::Error for DuidParseError {}

impl fmt::Display for DuidParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.message)
    }
}

impl TryFrom<&str> for Duid {
    type Error = DuidParseError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        let trimmed = value.trim();
        let sep = match trimmed.as_bytes().get(2) {
            Some(&b':') => ':',
            Some(&b'-') => '-',
            _ => {
                return Err(DuidParseError {
                    message: "invalid DUID format",
                })
            }
        };
        let bytes = trimmed
            .split(sep)
            .map(|hex| u8::from_str_radix(hex, 16))
            .collect::<Result<Vec<u8>, _>>()
            .map_err(|_| DuidParseError {
                message: "invalid DUID format",
            })?;
        if bytes.is_empty() || bytes.len() > MAX_DUID_LEN {
            return Err(DuidParseError {
                message: "DUID length out of range (1..=130 bytes)",
            });
        }
        Ok(Duid { bytes })
    }
}

/// Persistence hook for the on-disk DUID store (`spec.md` §4.4 step 3). The
/// real store serializes under the DUID module's own format, out of scope
/// here; this trait is the seam.
pub trait DuidStore {
    fn load(&self) -> Option<Duid>;
    fn save(&self, duid: &Duid);
}

/// A `DuidStore` that never persists anything, useful for tests and for
/// `info-only` sessions that don't care about identifier durability.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullDuidStore;

impl DuidStore for NullDuidStore {
    fn load(&self) -> Option<Duid> {
        None
    }
    fn save(&self, _duid: &Duid) {}
}

/// `spec.md` §4.4: the full derivation chain. `own_ifindex` identifies the
/// device's own interface so step 4 can be tried before step 5 iterates
/// siblings.
pub fn derive_duid(
    network: &dyn NetworkView,
    store: &dyn DuidStore,
    own_ifindex: u32,
    preferred_hex: Option<&str>,
    config_default_hex: Option<&str>,
) -> Result<Duid, Dhcp6Error> {
    let mut save = true;

    // Step 1: preferred (caller-supplied hex).
    let mut duid = preferred_hex
        .and_then(|hex| Duid::try_from(hex).ok())
        .unwrap_or_default();

    // Step 2: process configuration default.
    if duid.is_empty() {
        duid = config_default_hex
            .and_then(|hex| Duid::try_from(hex).ok())
            .unwrap_or_default();
    }

    // Step 3: persistent store.
    if duid.is_empty() {
        if let Some(loaded) = store.load() {
            duid = loaded;
            save = false;
        }
    }

    // Step 4: LLT from own interface.
    if duid.is_empty() {
        if let Some(ifp) = network.interface_by_index(own_ifindex) {
            if let Some(hw) = ifp.hardware_address {
                duid = Duid::llt(ifp.arp_type, &hw, SystemTime::now());
            }
        }
    }

    // Step 5: LLT from a sibling interface.
    if duid.is_empty() {
        for ifp in network.interfaces() {
            if ifp.ifindex == own_ifindex {
                continue;
            }
            if !ifp.arp_type.accepted_for_duid() {
                continue;
            }
            if let Some(hw) = ifp.hardware_address {
                duid = Duid::llt(ifp.arp_type, &hw, SystemTime::now());
                break;
            }
        }
    }

    // Step 6: UUID fallback.
    if duid.is_empty() {
        duid = Duid::from_uuid(Uuid::new_v4());
    }

    if duid.is_empty() {
        warn!("unable to find usable or generate client duid");
        return Err(Dhcp6Error::DuidGenerationFailed);
    }

    if save {
        store.save(&duid);
    }

    debug!(duid = %duid, "derived client duid");
    Ok(duid)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::net::{ArpHardwareType, FakeNetwork, InterfaceInfo};
    use std::cell::RefCell;

    #[derive(Default)]
    struct RecordingStore {
        saved: RefCell<Option<Duid>>,
        preload: Option<Duid>,
    }

    impl DuidStore for RecordingStore {
        fn load(&self) -> Option<Duid> {
            self.preload.clone()
        }
        fn save(&self, duid: &Duid) {
            *self.saved.borrow_mut() = Some(duid.clone());
        }
    }

    fn iface(ifindex: u32, hw: Option<[u8; 6]>, arp: ArpHardwareType) -> InterfaceInfo {
        InterfaceInfo {
            name: format!("eth{ifindex}"),
            ifindex,
            hardware_address: hw.map(|b| b.to_vec()),
            arp_type: arp,
            link_up: true,
            network_up: true,
            vlan_tag: None,
            addresses: vec![],
        }
    }

    #[test]
    fn preferred_wins_and_is_saved() {
        let net = FakeNetwork::default();
        let store = RecordingStore::default();
        let duid = derive_duid(&net, &store, 1, Some("00:11:22:33"), None).unwrap();
        assert_eq!(duid.bytes, vec![0x00, 0x11, 0x22, 0x33]);
        assert_eq!(store.saved.borrow().as_ref(), Some(&duid));
    }

    #[test]
    fn persisted_duid_is_not_resaved() {
        let net = FakeNetwork::default();
        let preload = Duid::from(vec![9, 9, 9]);
        let store = RecordingStore {
            saved: RefCell::new(None),
            preload: Some(preload.clone()),
        };
        let duid = derive_duid(&net, &store, 1, None, None).unwrap();
        assert_eq!(duid, preload);
        assert!(store.saved.borrow().is_none());
    }

    #[test]
    fn own_interface_llt_used_before_sibling() {
        let net = FakeNetwork {
            interfaces: vec![
                iface(1, Some([0, 1, 2, 3, 4, 5]), ArpHardwareType::Ethernet),
                iface(2, Some([9, 9, 9, 9, 9, 9]), ArpHardwareType::Ethernet),
            ],
        };
        let store = NullDuidStore;
        let duid = derive_duid(&net, &store, 1, None, None).unwrap();
        assert_eq!(&duid.bytes[4..], &[0, 1, 2, 3, 4, 5]);
    }

    #[test]
    fn sibling_llt_used_when_own_has_no_hwaddr() {
        let net = FakeNetwork {
            interfaces: vec![
                iface(1, None, ArpHardwareType::Other(772)), // loopback, no hwaddr
                iface(2, Some([9, 9, 9, 9, 9, 9]), ArpHardwareType::Ethernet),
            ],
        };
        let store = NullDuidStore;
        let duid = derive_duid(&net, &store, 1, None, None).unwrap();
        assert_eq!(&duid.bytes[4..], &[9, 9, 9, 9, 9, 9]);
    }

    #[test]
    fn uuid_fallback_when_no_hwaddr_anywhere() {
        let net = FakeNetwork {
            interfaces: vec![iface(1, None, ArpHardwareType::Other(772))],
        };
        let store = NullDuidStore;
        let duid = derive_duid(&net, &store, 1, None, None).unwrap();
        assert_eq!(u16::from_be_bytes([duid.bytes[0], duid.bytes[1]]), DUID_UUID);
    }

    #[test]
    fn hex_round_trip() {
        let duid = Duid::from(vec![0x29, 0x30, 0x31, 0x32]);
        let formatted = duid.to_string();
        let parsed = Duid::try_from(formatted.as_str()).unwrap();
        assert_eq!(parsed, duid);
    }
}
