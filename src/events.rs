//! Netlink-derived events and the adapter that turns them into device
//! actions (`spec.md` §4.9), grounded on `ni_dhcp6_device_event` and
//! `ni_dhcp6_address_event` in `original_source/dhcp6/device.c`.

use tracing::{debug, trace};

use crate::clock::Clock;
use crate::device::{Device, FsmState};
use crate::duid::DuidStore;
use crate::fsm::FsmGlue;
use crate::net::{AddressInfo, NetworkView};

/// A single interface/address change, as the netlink mirror would report
/// it. Kept deliberately small: the mirror's own representation is out of
/// scope here (`spec.md` §1).
#[derive(Debug, Clone)]
pub enum Event {
    DeviceUp { ifindex: u32 },
    DeviceDown { ifindex: u32 },
    NetworkUp { ifindex: u32 },
    NetworkDown { ifindex: u32 },
    LinkUp { ifindex: u32 },
    LinkDown { ifindex: u32 },
    AddressUpdate { ifindex: u32, address: AddressInfo },
    AddressDelete { ifindex: u32, address: AddressInfo },
}

impl Event {
    pub fn ifindex(&self) -> u32 {
        match self {
            Event::DeviceUp { ifindex }
            | Event::DeviceDown { ifindex }
            | Event::NetworkUp { ifindex }
            | Event::NetworkDown { ifindex }
            | Event::LinkUp { ifindex }
            | Event::LinkDown { ifindex }
            | Event::AddressUpdate { ifindex, .. }
            | Event::AddressDelete { ifindex, .. } => *ifindex,
        }
    }
}

/// Turns raw `Event`s into device-level reactions. Holds no state of its
/// own; it exists so `handle` reads as one coherent dispatch table instead
/// of being inlined at every call site.
#[derive(Debug, Default, Clone, Copy)]
pub struct EventAdapter;

impl EventAdapter {
    /// `spec.md` §4.9: link coming up re-tries a parked acquire; link going
    /// down, or the device disappearing, stops any in-flight exchange.
    pub fn handle<C: Clock>(
        &self,
        device: &mut Device,
        event: &Event,
        clock: &C,
        network: &dyn NetworkView,
        duid_store: &dyn DuidStore,
        preferred_duid_hex: Option<&str>,
        config_default_duid_hex: Option<&str>,
        fsm: &dyn FsmGlue,
    ) {
        trace!(ifindex = event.ifindex(), ?event, "dispatching event");
        match event {
            Event::DeviceDown { .. } | Event::LinkDown { .. } | Event::NetworkDown { .. } => {
                debug!(ifname = %device.ifname, "interface went down, stopping device");
                device.stop(clock, fsm);
            }
            Event::LinkUp { .. } | Event::NetworkUp { .. } | Event::AddressUpdate { .. } => {
                // Adopt a link-local source address the moment one becomes
                // usable, even outside the WaitReady gate (device.c:1079-1084).
                if let Event::AddressUpdate { address, .. } = event {
                    if device.link_addr.is_none()
                        && address.is_ipv6_link_local()
                        && !address.flags.tentative
                        && !address.flags.duplicate
                    {
                        device.link_addr = Some(address.address);
                    }
                }

                if device.fsm_state == FsmState::WaitReady {
                    let _ = device.retry_after_ready(
                        clock,
                        network,
                        duid_store,
                        preferred_duid_hex,
                        config_default_duid_hex,
                        fsm,
                    );
                } else {
                    fsm.fsm_address_event(device, event);
                }
            }
            Event::AddressDelete { address, .. } => {
                if device.link_addr.as_ref() == Some(&address.address) {
                    debug!(ifname = %device.ifname, "link-local source address removed");
                    device.link_addr = None;
                }
                fsm.fsm_address_event(device, event);
            }
            Event::DeviceUp { ifindex } => {
                if let Some(ifp) = network.interface_by_index(*ifindex) {
                    if ifp.name != device.ifname {
                        debug!(old = %device.ifname, new = %ifp.name, "interface renamed");
                        device.ifname = ifp.name;
                    }
                }
            }
        }
    }
}
