//! The caller-supplied acquire request (`spec.md` §3 "Request"), grounded
//! on the options parsed out of `ni_dhcp6_device_acquire`'s configuration
//! argument in `original_source/dhcp6/device.c`.

use compact_str::CompactString;

/// Update bitset flags (`spec.md` §3): which resolved facts the caller
/// wants written back into the system once a lease lands. Mirrors
/// `NI_DHCP6_UPDATE_*` in the original.
pub const UPDATE_HOSTNAME: u32 = 1 << 0;
pub const UPDATE_RESOLVER: u32 = 1 << 1;
pub const UPDATE_NTP: u32 = 1 << 2;
pub const UPDATE_DEFAULT_ROUTE: u32 = 1 << 3;

/// One requested Identity Association: a type tag (IA_NA vs IA_PD) plus,
/// for IA_PD, the requested prefix length.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IaRequest {
    NonTemporaryAddress,
    PrefixDelegation { requested_prefix_len: Option<u8> },
}

/// A single acquire request, as handed to `Device::acquire`.
#[derive(Debug, Clone)]
pub struct Request {
    pub uuid: CompactString,
    pub info_only: bool,
    pub rapid_commit: bool,
    pub update: u32,
    pub hostname: Option<CompactString>,
    /// Overrides the chain in `derive_duid` for just this request.
    pub preferred_client_id_hex: Option<CompactString>,
    pub ia_list: Vec<IaRequest>,
    pub user_class: Vec<CompactString>,
    pub vendor_class: Option<(u32, CompactString)>,
}

impl Default for Request {
    fn default() -> Self {
        Request {
            uuid: CompactString::new(""),
            info_only: false,
            rapid_commit: false,
            update: UPDATE_HOSTNAME | UPDATE_RESOLVER,
            hostname: None,
            preferred_client_id_hex: None,
            ia_list: vec![IaRequest::NonTemporaryAddress],
            user_class: vec![],
            vendor_class: None,
        }
    }
}

impl Request {
    pub fn wants(&self, flag: u32) -> bool {
        self.update & flag != 0
    }
}

/// Domain-name validation for the requested hostname (`spec.md` §4.8 step
/// 4). The original calls out to `ni_check_domain_name` at `device.c:844`,
/// whose own definition lives outside the DHCP6 module and isn't available
/// here; this applies the RFC 1035 label rules it's documented to enforce
/// (1-63 chars per label, alphanumeric or hyphen, no leading/trailing
/// hyphen, 255 chars overall) rather than porting a body that doesn't exist
/// in this tree.
pub fn is_valid_domain_name(name: &str) -> bool {
    if name.is_empty() || name.len() > 255 {
        return false;
    }
    name.split('.').all(|label| {
        !label.is_empty()
            && label.len() <= 63
            && !label.starts_with('-')
            && !label.ends_with('-')
            && label.bytes().all(|b| b.is_ascii_alphanumeric() || b == b'-')
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_ordinary_hostnames() {
        assert!(is_valid_domain_name("host1"));
        assert!(is_valid_domain_name("host-1.example.com"));
    }

    #[test]
    fn rejects_malformed_hostnames() {
        assert!(!is_valid_domain_name(""));
        assert!(!is_valid_domain_name("-leading-hyphen"));
        assert!(!is_valid_domain_name("trailing-hyphen-"));
        assert!(!is_valid_domain_name("has a space"));
        assert!(!is_valid_domain_name("double..dot"));
        assert!(!is_valid_domain_name(&"a".repeat(64)));
        assert!(!is_valid_domain_name(&format!("{}.com", "a".repeat(252))));
    }
}
