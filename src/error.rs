use std::fmt;

/// Errors produced by the DHCPv6 client core.
///
/// `NotReady` is not a hard failure: callers translate it into timer
/// installation rather than surfacing it to the acquiring caller (RFC 3315
/// has no notion of "link not ready yet" as a protocol error).
#[derive(Debug)]
pub enum Dhcp6Error {
    /// The interface behind this device's ifindex could not be resolved.
    NoInterface,
    /// The interface exists but the kernel does not report it as link up.
    LinkDown,
    /// The interface has no hardware address to derive identifiers from.
    NoHardwareAddress,
    /// No usable client DUID could be produced through the whole chain.
    DuidGenerationFailed,
    /// No link-local address is present on the interface yet (transient).
    NotReady,
    /// The interface's link-local address is marked duplicate (hard failure).
    LinkLocalDuplicate,
    /// Writing the outbound message to the multicast socket failed.
    SendFailed(String),
    /// Retransmission reached MRC/MRD without a reply.
    RetransmitExhausted,
    /// The readiness timer expired before a usable link-local address appeared.
    ReadinessTimeout,
    /// The caller's request was malformed; recoverable by dropping the field.
    MalformedRequest(String),
    /// `send` was called with no message staged, or an empty one.
    NothingToSend,
}

impl fmt::Display for Dhcp6Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Dhcp6Error::NoInterface => write!(f, "unable to find network interface by index"),
            Dhcp6Error::LinkDown => write!(f, "link is not up"),
            Dhcp6Error::NoHardwareAddress => write!(f, "interface has no hardware address"),
            Dhcp6Error::DuidGenerationFailed => {
                write!(f, "unable to find usable or generate client duid")
            }
            Dhcp6Error::NotReady => write!(f, "link-local address not yet available"),
            Dhcp6Error::LinkLocalDuplicate => {
                write!(f, "link-local ipv6 address is marked duplicate")
            }
            Dhcp6Error::SendFailed(msg) => write!(f, "send failed: {msg}"),
            Dhcp6Error::RetransmitExhausted => write!(f, "retransmissions exhausted"),
            Dhcp6Error::ReadinessTimeout => write!(f, "timed out waiting for link-local address"),
            Dhcp6Error::MalformedRequest(msg) => write!(f, "malformed request: {msg}"),
            Dhcp6Error::NothingToSend => write!(f, "cannot send empty DHCPv6 message packet"),
        }
    }
}

impl std::error::Error for Dhcp6Error {}

impl Dhcp6Error {
    /// True for errors that the acquire path should translate into a timer
    /// rather than a caller-visible failure.
    pub fn is_transient(&self) -> bool {
        matches!(self, Dhcp6Error::NotReady)
    }
}
