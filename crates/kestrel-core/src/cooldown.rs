//! Single-permit cooldown gate.

use std::time::{Duration, Instant};

use parking_lot::Mutex;

use crate::clock::{Clock, SystemClock};

#[derive(Debug)]
struct Gate {
    next_eligible: Instant,
    fails: u32,
}

/// Allows an action at most once per `period`, and only after `gap` denied
/// checks have accumulated since the last allowed one.
///
/// The gate starts closed: the first permit is available one `period` after
/// construction.
#[derive(Debug)]
pub struct Cooldown<C: Clock = SystemClock> {
    period: Duration,
    gap: u32,
    clock: C,
    gate: Mutex<Gate>,
}

impl Cooldown {
    pub fn new(period: Duration, gap: u32) -> Self {
        Self::with_clock(period, gap, SystemClock)
    }
}

impl<C: Clock> Cooldown<C> {
    pub fn with_clock(period: Duration, gap: u32, clock: C) -> Self {
        let gate = Gate {
            next_eligible: clock.deadline(period),
            fails: 0,
        };

        Self {
            period,
            gap,
            clock,
            gate: Mutex::new(gate),
        }
    }

    /// Returns `true` if the gated action may run now.
    pub fn check(&self) -> bool {
        let mut gate = self.gate.lock();

        if gate.fails < self.gap {
            gate.fails += 1;
            return false;
        }

        let now = self.clock.now();
        if now < gate.next_eligible {
            return false;
        }

        gate.next_eligible = self.clock.deadline(self.period);
        gate.fails = 0;
        true
    }

    pub fn period(&self) -> Duration {
        self.period
    }

    pub fn gap(&self) -> u32 {
        self.gap
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::ManualClock;

    const PERIOD: Duration = Duration::from_secs(60);

    #[test]
    fn test_closed_until_first_period_elapses() {
        let clock = ManualClock::new();
        let gate = Cooldown::with_clock(PERIOD, 0, clock.clone());

        assert!(!gate.check());
        clock.advance(PERIOD);
        assert!(gate.check());
        assert!(!gate.check());
    }

    #[test]
    fn test_gap_denies_first_checks_regardless_of_time() {
        let clock = ManualClock::new();
        let gate = Cooldown::with_clock(PERIOD, 2, clock.clone());
        clock.advance(PERIOD * 10);

        assert!(!gate.check());
        assert!(!gate.check());
        assert!(gate.check());
    }

    #[test]
    fn test_third_check_waits_for_deadline() {
        let clock = ManualClock::new();
        let gate = Cooldown::with_clock(PERIOD, 2, clock.clone());

        assert!(!gate.check());
        assert!(!gate.check());
        // Gap satisfied but the deadline has not passed; fails stays at gap.
        assert!(!gate.check());
        clock.advance(PERIOD);
        assert!(gate.check());
    }

    #[test]
    fn test_success_resets_gap() {
        let clock = ManualClock::new();
        let gate = Cooldown::with_clock(PERIOD, 1, clock.clone());
        clock.advance(PERIOD);

        assert!(!gate.check());
        assert!(gate.check());

        clock.advance(PERIOD);
        assert!(!gate.check());
        assert!(gate.check());
    }
}
