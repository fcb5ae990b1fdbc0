//! The device registry (`spec.md` §4.1), grounded on the intrusive
//! `ni_dhcp6_device_t` linked list walked by `ni_dhcp6_device_by_index` in
//! `original_source/dhcp6/device.c`. The original refcounts each device so
//! the FSM and event paths can hold a reference across callbacks; this
//! core instead owns every `Device` in one `Vec` and hands out ifindex
//! lookups, which sidesteps the refcounting entirely without changing any
//! observable behaviour (`spec.md` §9).

use std::time::Instant;

use tracing::{debug, trace};

use crate::device::Device;

/// Owns every device this process is tracking, keyed by ifindex.
#[derive(Default)]
pub struct DeviceRegistry {
    devices: Vec<Device>,
}

impl DeviceRegistry {
    pub fn new() -> Self {
        DeviceRegistry { devices: Vec::new() }
    }

    /// `ni_dhcp6_device_new` + registry insertion: create a device for
    /// `ifindex` and append it, unless one is already tracked.
    pub fn create(
        &mut self,
        ifname: impl Into<String>,
        ifindex: u32,
        hw_addr: Option<&[u8]>,
        vlan_tag: Option<u16>,
        now: Instant,
    ) -> Result<&mut Device, crate::error::Dhcp6Error> {
        if self.devices.iter().any(|d| d.ifindex == ifindex) {
            trace!(ifindex, "device already registered, returning existing");
            return Ok(self.get_mut(ifindex).expect("just checked membership"));
        }
        let device = Device::new(ifname, ifindex, hw_addr, vlan_tag, now)?;
        debug!(ifindex, "registered new device");
        self.devices.push(device);
        Ok(self.devices.last_mut().expect("just pushed"))
    }

    pub fn get(&self, ifindex: u32) -> Option<&Device> {
        self.devices.iter().find(|d| d.ifindex == ifindex)
    }

    pub fn get_mut(&mut self, ifindex: u32) -> Option<&mut Device> {
        self.devices.iter_mut().find(|d| d.ifindex == ifindex)
    }

    /// `ni_dhcp6_device_free`: drop the device entirely. Callers are
    /// expected to have already called `Device::stop` so nothing is
    /// dropped mid-exchange; this does not call it for them.
    pub fn free(&mut self, ifindex: u32) -> bool {
        let before = self.devices.len();
        self.devices.retain(|d| d.ifindex != ifindex);
        let removed = self.devices.len() != before;
        if removed {
            debug!(ifindex, "freed device");
        }
        removed
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = &mut Device> {
        self.devices.iter_mut()
    }

    pub fn len(&self) -> usize {
        self.devices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.devices.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn create_is_idempotent_by_ifindex() {
        let mut registry = DeviceRegistry::new();
        registry.create("eth0", 1, Some(&[0, 1, 2, 3, 4, 5]), None, Instant::now()).unwrap();
        registry.create("eth0", 1, Some(&[0, 1, 2, 3, 4, 5]), None, Instant::now()).unwrap();
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn free_removes_by_ifindex() {
        let mut registry = DeviceRegistry::new();
        registry.create("eth0", 1, Some(&[0, 1, 2, 3, 4, 5]), None, Instant::now()).unwrap();
        assert!(registry.free(1));
        assert!(registry.is_empty());
        assert!(!registry.free(1));
    }

    #[test]
    fn get_mut_finds_the_right_device() {
        let mut registry = DeviceRegistry::new();
        registry.create("eth0", 1, Some(&[0, 1, 2, 3, 4, 5]), None, Instant::now()).unwrap();
        registry.create("eth1", 2, Some(&[6, 7, 8, 9, 10, 11]), None, Instant::now()).unwrap();
        assert_eq!(registry.get_mut(2).unwrap().ifname, "eth1");
    }
}
