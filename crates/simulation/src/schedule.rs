//! Countdown timers for periodic events.
//!
//! Every countdown is decremented exactly once per step and fires on the
//! step it reaches zero, then reloads. A countdown of period `n` created
//! before step 0 therefore first fires on step `n - 1`.

use rand::Rng;
use types::CurveSchedule;

/// A reloading step counter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Countdown {
    remaining: u64,
    period: u64,
}

impl Countdown {
    /// A countdown that fires every `period` steps (at least every step).
    pub fn new(period: u64) -> Self {
        let period = period.max(1);
        Self {
            remaining: period,
            period,
        }
    }

    pub fn period(&self) -> u64 {
        self.period
    }

    /// Advance one step. Returns `true` if the event is due this step, in
    /// which case the countdown has already reloaded with its period.
    pub fn tick(&mut self) -> bool {
        self.remaining = self.remaining.saturating_sub(1);
        if self.remaining == 0 {
            self.remaining = self.period;
            true
        } else {
            false
        }
    }

    /// Change the period and restart the countdown from it.
    pub fn reset(&mut self, period: u64) {
        *self = Self::new(period);
    }
}

/// All countdowns the scheduler carries.
#[derive(Debug, Clone)]
pub struct EventSchedule {
    /// One per token, each with its own randomised interval.
    curve_switches: Vec<Countdown>,
    drift: Countdown,
    commission: Countdown,
    switch_range: (u64, u64),
}

impl EventSchedule {
    pub fn new<R: Rng + ?Sized>(
        rng: &mut R,
        num_tokens: usize,
        curves: &CurveSchedule,
        commission_interval: u64,
    ) -> Self {
        let switch_range = (curves.switch_interval_min, curves.switch_interval_max);
        let curve_switches = (0..num_tokens)
            .map(|_| Countdown::new(sample_interval(rng, switch_range)))
            .collect();
        Self {
            curve_switches,
            drift: Countdown::new(curves.drift_interval),
            commission: Countdown::new(commission_interval),
            switch_range,
        }
    }

    /// Advance every per-token switch countdown and return the indices of
    /// tokens due to switch. Fired countdowns reload with a fresh interval.
    pub fn due_curve_switches<R: Rng + ?Sized>(&mut self, rng: &mut R) -> Vec<usize> {
        let mut due = Vec::new();
        for (index, countdown) in self.curve_switches.iter_mut().enumerate() {
            if countdown.tick() {
                countdown.reset(sample_interval(rng, self.switch_range));
                due.push(index);
            }
        }
        due
    }

    pub fn drift_due(&mut self) -> bool {
        self.drift.tick()
    }

    pub fn commission_due(&mut self) -> bool {
        self.commission.tick()
    }

    pub fn curve_switch_countdowns(&self) -> &[Countdown] {
        &self.curve_switches
    }
}

fn sample_interval<R: Rng + ?Sized>(rng: &mut R, (min, max): (u64, u64)) -> u64 {
    if max <= min {
        min
    } else {
        rng.random_range(min..=max)
    }
}
