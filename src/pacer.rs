//! Real-Time Pacer (C7)
//!
//! Drives the bus against wall-clock time instead of stepping as fast as
//! possible: each scheduled entry is held back until the wall clock catches
//! up to `wall_anchor + (next_ts - sim_anchor) / speed_factor`. A
//! `speed_factor` of `f64::INFINITY` (or any non-positive value) collapses
//! to logical-clock-only mode — step as fast as possible, never sleep.

use std::sync::atomic::{AtomicBool, Ordering};
use std::time::{Duration as StdDuration, Instant};

use tracing::debug;

use crate::bus::Bus;
use crate::clock::Duration;

/// Cooperative shutdown flag for [`pace`]. Checked once per iteration;
/// setting it stops the loop after the current step completes.
#[derive(Debug, Default)]
pub struct ShutdownFlag(AtomicBool);

impl ShutdownFlag {
    pub fn new() -> Self {
        Self(AtomicBool::new(false))
    }

    pub fn signal(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_set(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

/// How long `pace` waits for an external publisher to enqueue more work
/// before giving up when the queue runs dry.
const GRACE_PERIOD: StdDuration = StdDuration::from_millis(50);

/// Drives `bus` against wall-clock time at `speed_factor` logical-seconds
/// per wall-second, until the queue is empty (after one grace period with
/// nothing arriving) or `shutdown` is signaled.
///
/// Returns the number of steps executed.
pub fn pace(bus: &mut Bus, speed_factor: f64, shutdown: &ShutdownFlag) -> usize {
    let sim_anchor = bus.now();
    let wall_anchor = Instant::now();
    let mut executed = 0;

    loop {
        if shutdown.is_set() {
            break;
        }

        let Some(next_ts) = bus.queue().peek_min_ts() else {
            std::thread::sleep(GRACE_PERIOD);
            if bus.queue().peek_min_ts().is_none() {
                break;
            }
            continue;
        };

        if speed_factor.is_finite() && speed_factor > 0.0 {
            let sim_elapsed = next_ts - sim_anchor;
            let wall_elapsed = StdDuration::from_secs_f64(sim_elapsed.as_secs_f64() / speed_factor);
            let target_wall = wall_anchor + wall_elapsed;
            let now = Instant::now();
            if target_wall > now {
                sleep_precise(target_wall - now);
            }
        }

        match bus.step() {
            Ok(()) => executed += 1,
            Err(_) => break,
        }
    }

    debug!(executed, "pacer stopped");
    executed
}

/// Sleeps `duration`, using a spin-wait for the final sub-millisecond
/// remainder so the pacer doesn't systematically overshoot by an entire OS
/// scheduler quantum the way a single long `thread::sleep` tends to.
fn sleep_precise(duration: StdDuration) {
    spin_sleep::sleep(duration);
}

/// Converts a logical [`Duration`] into the equivalent wall-clock
/// `std::time::Duration`, honoring a speed factor. Exposed for callers
/// that want to precompute a sleep budget without driving the full loop.
pub fn wall_duration_for(logical: Duration, speed_factor: f64) -> StdDuration {
    if !speed_factor.is_finite() || speed_factor <= 0.0 {
        return StdDuration::ZERO;
    }
    StdDuration::from_secs_f64(logical.as_secs_f64() / speed_factor)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::agent::AgentId;
    use crate::clock::Timestamp;
    use crate::event::Event;

    #[test]
    fn infinite_speed_factor_never_sleeps() {
        let mut bus = Bus::default();
        bus.publish_at(Timestamp::from_micros(1_000_000), "Bang", Event::Bang, "s", AgentId::UNASSIGNED);
        let shutdown = ShutdownFlag::new();
        let start = Instant::now();
        let steps = pace(&mut bus, f64::INFINITY, &shutdown);
        assert_eq!(steps, 1);
        assert!(start.elapsed() < StdDuration::from_millis(100));
    }

    #[test]
    fn wall_duration_for_scales_by_speed_factor() {
        let logical = Duration::from_micros(1_000_000);
        assert_eq!(wall_duration_for(logical, 2.0), StdDuration::from_millis(500));
        assert_eq!(wall_duration_for(logical, 0.0), StdDuration::ZERO);
    }

    #[test]
    fn shutdown_flag_stops_loop() {
        let mut bus = Bus::default();
        bus.publish_at(Timestamp::from_micros(10_000_000), "Bang", Event::Bang, "s", AgentId::UNASSIGNED);
        let shutdown = ShutdownFlag::new();
        shutdown.signal();
        let steps = pace(&mut bus, 1.0, &shutdown);
        assert_eq!(steps, 0);
    }
}
