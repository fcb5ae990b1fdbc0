//! Core DHCPv6 client supplicant: identifier derivation, device lifecycle,
//! retransmission timing, and event dispatch. The protocol state machine
//! itself, the netlink mirror, and the on-disk lease/DUID formats are
//! injected as traits (`fsm`, `net`, `duid::DuidStore`, `lease::LeaseStore`)
//! and implemented by the surrounding process, not by this crate.

pub mod clock;
pub mod config;
pub mod device;
pub mod duid;
pub mod error;
pub mod events;
pub mod fsm;
pub mod iaid;
pub mod lease;
pub mod logging;
pub mod net;
pub mod registry;
pub mod request;
pub mod retransmit;

pub use device::{Device, FsmState};
pub use duid::Duid;
pub use error::Dhcp6Error;
pub use registry::DeviceRegistry;
pub use request::Request;
