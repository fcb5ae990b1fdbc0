//! Collaborator seams the device record calls out to (`spec.md` §4.10,
//! §6): the actual protocol state machine and the multicast socket. Both
//! are out of scope for this core (`spec.md` §1 Non-goals) and are
//! injected as traits so the lifecycle and timing logic here can be tested
//! without either one.

use std::io;

use crate::device::Device;

/// The protocol state machine collaborator. Implementations decide what
/// message to stage, parse replies, and commit leases; this core only
/// calls out at the right moments.
pub trait FsmGlue {
    /// Start a new exchange for `device` (`spec.md` §4.8): the FSM is
    /// expected to build and stage the first outbound message.
    fn fsm_start(&self, device: &mut Device);

    /// Retransmission timer fired; the FSM re-stages the current message.
    fn fsm_retransmit(&self, device: &mut Device);

    /// An address-update/delete event arrived for this device's interface.
    fn fsm_address_event(&self, device: &mut Device, event: &crate::events::Event);

    /// Arm a one-shot timer for `device`, `timeout_ms` from now.
    fn fsm_set_timeout_msec(&self, device: &mut Device, timeout_ms: u64);

    /// Commit (or clear, if `lease` is `None`) the device's active lease.
    fn fsm_commit_lease(&self, device: &mut Device, lease: Option<crate::lease::Lease>);
}

/// The multicast socket collaborator (`All_DHCP_Relay_Agents_and_Servers`,
/// `ff02::1:2`). Kept minimal: this core only ever writes to it.
pub trait McastSocket {
    fn send(&self, buf: &[u8]) -> io::Result<()>;
    fn close(&self);
}
