//! RFC 3315 §14 retransmission scheduling, plus the §17.1.2 first-Solicit
//! exception. Grounded on `ni_dhcp6_device_retransmit_arm` /
//! `_advance` / `_disarm` in `original_source/dhcp6/device.c`.

use std::time::Instant;

use rand::Rng;
use tracing::debug;

use crate::clock::{self, JitterWindow};
use crate::device::FsmState;

/// Tunable parameters for one message exchange's retransmission behaviour,
/// per RFC 3315 §14 (IRT/MRC/MRD/MRT).
#[derive(Debug, Clone, Copy)]
pub struct RetransmitParams {
    /// Initial Retransmission Time, in milliseconds.
    pub irt_ms: u64,
    /// Maximum Retransmission Time, 0 means unbounded.
    pub mrt_ms: u64,
    /// Maximum Retransmission Count, 0 means unlimited (bounded by MRD only).
    pub mrc: u32,
    /// Current RT, updated on each arm/advance.
    pub timeout_ms: u64,
}

impl RetransmitParams {
    pub fn new(irt_ms: u64, mrt_ms: u64, mrc: u32) -> Self {
        RetransmitParams {
            irt_ms,
            mrt_ms,
            mrc,
            timeout_ms: irt_ms,
        }
    }

    /// Whether the timeout policy (MRC only; MRD is handled by the caller's
    /// duration timer, per `spec.md` §4.5) permits another retransmission.
    fn allows_retransmit(&self, count: u32) -> bool {
        self.mrc == 0 || count < self.mrc
    }

    fn clamp_to_mrt(&self, rt_ms: u64) -> u64 {
        if self.mrt_ms > 0 && rt_ms > self.mrt_ms {
            self.mrt_ms
        } else {
            rt_ms
        }
    }
}

/// Outcome of arming the initial delay.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DelayOutcome {
    /// No delay was configured; the caller should start transmitting at once.
    NoDelay,
    /// A delay was armed on the FSM timer; the caller should wait for it.
    DelayScheduled,
}

/// Per-exchange retransmission bookkeeping. Mirrors `ni_dhcp6_retrans_t`.
#[derive(Debug, Clone)]
pub struct RetransmitState {
    /// Initial-delay milliseconds, nonzero only before the first transmission
    /// of an exchange requiring it (Solicit/Confirm/Information-Request).
    pub delay_ms: u64,
    /// Monotonic timestamp of the first transmission of the current message.
    pub start: Option<Instant>,
    /// Transmissions so far in the current exchange.
    pub count: u32,
    /// Symmetric ms magnitude used only to randomize the initial delay.
    pub jitter_base_ms: u64,
    pub params: RetransmitParams,
    /// Absolute time of the next scheduled retransmission.
    pub deadline: Option<Instant>,
    /// Maximum Retransmission Duration in milliseconds; 0 means unbounded.
    pub duration_ms: u64,
    /// Current transaction id; cleared together with the rest on disarm.
    pub xid: Option<u32>,
}

impl RetransmitState {
    pub fn new(delay_ms: u64, jitter_base_ms: u64, params: RetransmitParams, duration_ms: u64) -> Self {
        RetransmitState {
            delay_ms,
            start: None,
            count: 0,
            jitter_base_ms,
            params,
            deadline: None,
            duration_ms,
            xid: None,
        }
    }

    /// Invariant from `spec.md` §3: either armed-but-not-started or
    /// started-with-no-pending-delay.
    pub fn invariant_holds(&self) -> bool {
        if self.delay_ms > 0 {
            self.start.is_none()
        } else {
            true
        }
    }
}

impl Default for RetransmitState {
    fn default() -> Self {
        RetransmitState {
            delay_ms: 0,
            start: None,
            count: 0,
            jitter_base_ms: 0,
            params: RetransmitParams::new(0, 0, 0),
            deadline: None,
            duration_ms: 0,
            xid: None,
        }
    }
}

/// Arms the initial delay (`spec.md` §4.5 "Arm initial delay"). Returns
/// `NoDelay` immediately if no delay is configured; otherwise randomizes the
/// delay additively within `[delay - jitter_base, delay + jitter_base]` and
/// reports `DelayScheduled` so the caller arms a single FSM timeout of that
/// length.
pub fn transmit_arm_delay<R: Rng + ?Sized>(
    state: &RetransmitState,
    rng: &mut R,
) -> (DelayOutcome, Option<u64>) {
    if state.delay_ms == 0 {
        return (DelayOutcome::NoDelay, None);
    }

    let jitter = state.jitter_base_ms as i64;
    let sampled = if jitter == 0 {
        0
    } else {
        rng.gen_range(-jitter..=jitter)
    };
    let delay = (state.delay_ms as i64 + sampled).max(0) as u64;

    debug!(
        delay_ms = state.delay_ms,
        jitter_min = -jitter,
        jitter_max = jitter,
        armed_ms = delay,
        "arming initial transmit delay"
    );

    (DelayOutcome::DelayScheduled, Some(delay))
}

/// Result of arming the post-delay retransmission timer: the RT to use and,
/// if MRD or the first-Solicit rule applies, a duration timeout to also set.
#[derive(Debug, Clone, Copy)]
pub struct ArmResult {
    pub rt_ms: u64,
    pub duration_timeout_ms: Option<u64>,
}

/// `spec.md` §4.5 "Arm retransmission": clears the delay, records the start
/// time (via `now`), and computes the first RT.
pub fn retransmit_arm<R: Rng + ?Sized>(
    state: &mut RetransmitState,
    fsm_state: FsmState,
    now: Instant,
    rng: &mut R,
) -> Option<ArmResult> {
    state.delay_ms = 0;
    state.start = Some(now);

    if state.params.mrc == 0 && state.count == 0 {
        // nretries == 0 was historically "no retransmissions configured";
        // we still allow the very first transmission (count becomes 1 by
        // the caller immediately after `transmit`), so this only matters
        // once count has already advanced past the first send.
    }

    let first_solicit = fsm_state == FsmState::Selecting && state.count == 1;

    let window = if first_solicit {
        JitterWindow::first_solicit()
    } else {
        JitterWindow::symmetric()
    };

    let rt = if state.count <= 1 {
        clock::first_rt(state.params.irt_ms, window, rng)
    } else {
        clock::next_rt(state.params.timeout_ms, window, rng)
    };
    let rt = state.params.clamp_to_mrt(rt);

    state.params.timeout_ms = rt;
    state.deadline = Some(now + std::time::Duration::from_millis(rt));

    debug!(
        rt_ms = rt,
        first_solicit,
        count = state.count,
        "armed retransmission"
    );

    if first_solicit {
        // No MRD for Solicit; the duration timer fires at RT to flush the
        // collected Advertise messages (spec.md §4.5).
        Some(ArmResult {
            rt_ms: rt,
            duration_timeout_ms: Some(rt),
        })
    } else if state.duration_ms > 0 {
        Some(ArmResult {
            rt_ms: rt,
            duration_timeout_ms: Some(state.duration_ms),
        })
    } else {
        Some(ArmResult {
            rt_ms: rt,
            duration_timeout_ms: None,
        })
    }
}

/// `spec.md` §4.5 "Advance": recomputes RT for the next retransmission, or
/// returns `false` if the timeout policy (MRC) says to stop.
pub fn retransmit_advance<R: Rng + ?Sized>(
    state: &mut RetransmitState,
    now: Instant,
    rng: &mut R,
) -> bool {
    if !state.params.allows_retransmit(state.count) {
        return false;
    }

    let old = state.params.timeout_ms;
    let rt = clock::next_rt(state.params.timeout_ms, JitterWindow::symmetric(), rng);
    let rt = state.params.clamp_to_mrt(rt);
    state.params.timeout_ms = rt;
    state.deadline = Some(now + std::time::Duration::from_millis(rt));

    debug!(old_rt_ms = old, new_rt_ms = rt, "increased retransmission timeout");
    true
}

/// `spec.md` §4.5 "Disarm": zero the whole block and clear `xid`.
pub fn retransmit_disarm(state: &mut RetransmitState, now: Instant) {
    debug!(?now, "disarming retransmission");
    *state = RetransmitState::default();
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    fn params(irt: u64) -> RetransmitParams {
        RetransmitParams::new(irt, 0, 0)
    }

    #[test]
    fn invariant_exclusivity() {
        let mut state = RetransmitState::new(1000, 100, params(1000), 0);
        assert!(state.invariant_holds());
        assert_eq!(state.count, 0);

        let now = Instant::now();
        let mut rng = rand::thread_rng();
        retransmit_arm(&mut state, FsmState::Init, now, &mut rng);
        assert_eq!(state.delay_ms, 0);
        assert!(state.start.is_some());
        assert!(state.invariant_holds());
    }

    #[test]
    fn first_solicit_rt_strictly_greater_than_irt() {
        let mut state = RetransmitState::new(0, 0, params(1000), 0);
        state.count = 1;
        let now = Instant::now();
        let mut rng = rand::thread_rng();
        let result = retransmit_arm(&mut state, FsmState::Selecting, now, &mut rng).unwrap();
        assert!(result.rt_ms > 1000);
        assert!(result.rt_ms <= 1100);
        assert_eq!(result.duration_timeout_ms, Some(result.rt_ms));
    }

    #[test]
    fn non_first_transmit_uses_symmetric_window() {
        let mut state = RetransmitState::new(0, 0, params(1000), 0);
        state.count = 2;
        state.params.timeout_ms = 1000;
        let now = Instant::now();
        let mut rng = rand::thread_rng();
        let result = retransmit_arm(&mut state, FsmState::Selecting, now, &mut rng).unwrap();
        assert!((900..=1100).contains(&result.rt_ms));
    }

    #[test]
    fn advance_exhausts_at_mrc() {
        let mut state = RetransmitState::new(0, 0, RetransmitParams::new(1000, 0, 2), 0);
        state.count = 2;
        state.params.timeout_ms = 2000;
        let now = Instant::now();
        let mut rng = rand::thread_rng();
        assert!(!retransmit_advance(&mut state, now, &mut rng));
    }

    #[test]
    fn advance_grows_within_bounds() {
        let mut state = RetransmitState::new(0, 0, RetransmitParams::new(1000, 0, 0), 0);
        state.count = 1;
        state.params.timeout_ms = 2000;
        let now = Instant::now();
        let mut rng = rand::thread_rng();
        assert!(retransmit_advance(&mut state, now, &mut rng));
        assert!((3800..=4200).contains(&state.params.timeout_ms));
    }

    #[test]
    fn disarm_zeroes_everything() {
        let mut state = RetransmitState::new(1000, 100, params(1000), 5000);
        state.xid = Some(42);
        state.count = 3;
        retransmit_disarm(&mut state, Instant::now());
        assert_eq!(state.count, 0);
        assert_eq!(state.xid, None);
        assert_eq!(state.delay_ms, 0);
        assert!(state.start.is_none());
    }

    #[test]
    fn initial_delay_randomization_boundary() {
        // spec.md §8 boundary scenario 3, deterministic variant: when the
        // sampled jitter is forced to its max, delay == base + jitter_base.
        struct FixedRng;
        impl rand::RngCore for FixedRng {
            fn next_u32(&mut self) -> u32 {
                u32::MAX
            }
            fn next_u64(&mut self) -> u64 {
                u64::MAX
            }
            fn fill_bytes(&mut self, dest: &mut [u8]) {
                for b in dest.iter_mut() {
                    *b = 0xff;
                }
            }
            fn try_fill_bytes(&mut self, dest: &mut [u8]) -> Result<(), rand::Error> {
                self.fill_bytes(dest);
                Ok(())
            }
        }
        let state = RetransmitState::new(1000, 100, params(1000), 0);
        let mut rng = FixedRng;
        let (outcome, delay) = transmit_arm_delay(&state, &mut rng);
        assert_eq!(outcome, DelayOutcome::DelayScheduled);
        assert_eq!(delay, Some(1100));
        let _ = Duration::from_millis(0);
    }
}
