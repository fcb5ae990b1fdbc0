//! Demo binary: exercises `acquire` against a synthetic `FakeNetwork` so
//! the identifier-derivation and timing core can be driven end to end
//! without a real netlink mirror or FSM collaborator.

use std::net::{IpAddr, Ipv6Addr};

use tracing::{info, Level};

use dhcp6_supplicant::clock::Clock;
use dhcp6_supplicant::config::ClientConfig;
use dhcp6_supplicant::duid::NullDuidStore;
use dhcp6_supplicant::fsm::{FsmGlue, McastSocket};
use dhcp6_supplicant::net::{AddressFlags, AddressInfo, ArpHardwareType, FakeNetwork, InterfaceInfo};
use dhcp6_supplicant::registry::DeviceRegistry;
use dhcp6_supplicant::request::Request;

const HELP: &str = "\
dhcp6-supplicant

USAGE:
  dhcp6-supplicant [--ifname NAME] [--ifindex N] [--verbose]

Drives a single synthetic interface through acquire() so the identifier
derivation and retransmission core can be inspected without a live link.
";

struct Args {
    ifname: String,
    ifindex: u32,
    verbose: bool,
}

fn parse_args() -> Result<Args, pico_args::Error> {
    let mut pargs = pico_args::Arguments::from_env();

    if pargs.contains(["-h", "--help"]) {
        print!("{HELP}");
        std::process::exit(0);
    }

    let args = Args {
        ifname: pargs
            .opt_value_from_str("--ifname")?
            .unwrap_or_else(|| "eth0".to_string()),
        ifindex: pargs.opt_value_from_str("--ifindex")?.unwrap_or(1),
        verbose: pargs.contains("--verbose"),
    };

    let remaining = pargs.finish();
    if !remaining.is_empty() {
        eprintln!("unrecognized arguments: {remaining:?}");
    }

    Ok(args)
}

/// Minimal `FsmGlue` for the demo: stages a fixed Solicit-shaped buffer and
/// logs every callback instead of running the real protocol machinery.
struct DemoFsm;

impl FsmGlue for DemoFsm {
    fn fsm_start(&self, device: &mut dhcp6_supplicant::Device) {
        info!(ifname = %device.ifname, iaid = device.iaid, "fsm_start: staging Solicit");
        device.stage_outbound(vec![0x01, 0x00, 0x00, 0x00]);
    }

    fn fsm_retransmit(&self, device: &mut dhcp6_supplicant::Device) {
        info!(ifname = %device.ifname, "fsm_retransmit");
    }

    fn fsm_address_event(
        &self,
        device: &mut dhcp6_supplicant::Device,
        event: &dhcp6_supplicant::events::Event,
    ) {
        info!(ifname = %device.ifname, ?event, "fsm_address_event");
    }

    fn fsm_set_timeout_msec(&self, device: &mut dhcp6_supplicant::Device, timeout_ms: u64) {
        info!(ifname = %device.ifname, timeout_ms, "fsm_set_timeout_msec");
    }

    fn fsm_commit_lease(
        &self,
        device: &mut dhcp6_supplicant::Device,
        lease: Option<dhcp6_supplicant::lease::Lease>,
    ) {
        info!(ifname = %device.ifname, has_lease = lease.is_some(), "fsm_commit_lease");
        device.lease = lease;
    }
}

struct StdoutSocket;

impl McastSocket for StdoutSocket {
    fn send(&self, buf: &[u8]) -> std::io::Result<()> {
        info!(bytes = buf.len(), "would send to ff02::1:2");
        Ok(())
    }

    fn close(&self) {}
}

fn main() {
    let args = match parse_args() {
        Ok(args) => args,
        Err(err) => {
            eprintln!("{err}\n\n{HELP}");
            std::process::exit(1);
        }
    };

    dhcp6_supplicant::logging::init_stdout(if args.verbose { Level::DEBUG } else { Level::INFO });

    let config = ClientConfig::default();
    let network = FakeNetwork {
        interfaces: vec![InterfaceInfo {
            name: args.ifname.clone(),
            ifindex: args.ifindex,
            hardware_address: Some(vec![0x02, 0x11, 0x22, 0x33, 0x44, 0x55]),
            arp_type: ArpHardwareType::Ethernet,
            link_up: true,
            network_up: true,
            vlan_tag: None,
            addresses: vec![AddressInfo {
                address: IpAddr::V6(Ipv6Addr::new(0xfe80, 0, 0, 0, 0, 0, 0, 1)),
                flags: AddressFlags::default(),
            }],
        }],
    };

    let clock = dhcp6_supplicant::clock::SystemClock;

    let mut registry = DeviceRegistry::new();
    let device = registry
        .create(
            args.ifname.clone(),
            args.ifindex,
            Some(&[0x02, 0x11, 0x22, 0x33, 0x44, 0x55]),
            None,
            clock.now(),
        )
        .expect("failed to register device");

    let duid_store = NullDuidStore;
    let fsm = DemoFsm;
    let socket = StdoutSocket;

    match device.acquire(
        &clock,
        &network,
        &duid_store,
        None,
        config.default_duid_hex.as_deref(),
        Request::default(),
        &fsm,
    ) {
        Ok(()) => {
            info!("acquire started");
            // Solicit carries a mandatory initial delay (RFC 3315 §17.1.2);
            // the real daemon would wait for the timer `acquire` just armed
            // before driving this.
            if !device.has_pending_outbound() {
                device.transmit_start(&clock, &fsm);
            }
            if device.has_pending_outbound() {
                device.send(&socket).expect("send");
            }
        }
        Err(err) => info!(%err, "acquire did not start an exchange immediately"),
    }
}
