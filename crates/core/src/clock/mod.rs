//! Per-turn countdown and the scheduling port that drives it.

/// Tick delivery backed by the tokio timer.
pub mod scheduler;

use serde::{Deserialize, Serialize};

pub use scheduler::{IntervalScheduler, SchedulerTick, TickScheduler};

/// Lifecycle of a [`TurnClock`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ClockPhase {
    /// Counting down; ticks are consumed.
    Running,
    /// Suspended; ticks are ignored until resumed.
    Paused,
    /// Reached zero. Terminal.
    Expired,
    /// Stopped from outside before expiry. Terminal.
    Cancelled,
}

/// Result of delivering one tick to a clock.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClockEvent {
    /// One second was consumed and time is left.
    Ticked {
        /// Seconds left after this tick.
        remaining: u32,
    },
    /// The countdown reached zero on this tick. Emitted once per clock.
    Expired,
    /// The tick had no effect (paused, expired or cancelled clock).
    Idle,
}

/// Countdown bound to a single turn.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TurnClock {
    duration: u32,
    remaining: u32,
    phase: ClockPhase,
}

impl TurnClock {
    /// Start a running countdown of `duration` seconds, at least one.
    pub fn start(duration: u32) -> Self {
        let duration = duration.max(1);
        Self {
            duration,
            remaining: duration,
            phase: ClockPhase::Running,
        }
    }

    /// Consume one tick.
    pub fn tick(&mut self) -> ClockEvent {
        if self.phase != ClockPhase::Running {
            return ClockEvent::Idle;
        }
        if self.remaining <= 1 {
            self.remaining = 0;
            self.phase = ClockPhase::Expired;
            return ClockEvent::Expired;
        }
        self.remaining -= 1;
        ClockEvent::Ticked {
            remaining: self.remaining,
        }
    }

    /// Suspend a running clock. Returns `false` when nothing changed.
    pub fn pause(&mut self) -> bool {
        if self.phase != ClockPhase::Running {
            return false;
        }
        self.phase = ClockPhase::Paused;
        true
    }

    /// Resume a paused clock from where it stopped. Returns `false` when nothing changed.
    pub fn resume(&mut self) -> bool {
        if self.phase != ClockPhase::Paused {
            return false;
        }
        self.phase = ClockPhase::Running;
        true
    }

    /// Stop the clock for good, whatever its phase.
    pub fn cancel(&mut self) {
        self.phase = ClockPhase::Cancelled;
    }

    /// Current phase.
    pub fn phase(&self) -> ClockPhase {
        self.phase
    }

    /// Seconds left.
    pub fn remaining(&self) -> u32 {
        self.remaining
    }

    /// Seconds the clock started with.
    pub fn duration(&self) -> u32 {
        self.duration
    }

    /// Seconds consumed so far.
    pub fn elapsed(&self) -> u32 {
        self.duration - self.remaining
    }

    /// Fraction of the countdown consumed, in `[0, 1]`.
    pub fn progress(&self) -> f64 {
        if self.duration == 0 {
            return 1.0;
        }
        f64::from(self.elapsed()) / f64::from(self.duration)
    }

    /// `true` while ticks are being consumed.
    pub fn is_running(&self) -> bool {
        self.phase == ClockPhase::Running
    }

    /// `true` while paused.
    pub fn is_paused(&self) -> bool {
        self.phase == ClockPhase::Paused
    }

    /// `true` once the countdown has reached zero.
    pub fn is_expired(&self) -> bool {
        self.phase == ClockPhase::Expired
    }

    /// `true` once cancelled.
    pub fn is_cancelled(&self) -> bool {
        self.phase == ClockPhase::Cancelled
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn counts_down_and_expires_once() {
        let mut clock = TurnClock::start(3);
        assert_eq!(clock.tick(), ClockEvent::Ticked { remaining: 2 });
        assert_eq!(clock.tick(), ClockEvent::Ticked { remaining: 1 });
        assert_eq!(clock.tick(), ClockEvent::Expired);
        assert_eq!(clock.remaining(), 0);
        assert_eq!(clock.phase(), ClockPhase::Expired);

        assert_eq!(clock.tick(), ClockEvent::Idle);
        assert_eq!(clock.tick(), ClockEvent::Idle);
        assert_eq!(clock.remaining(), 0);
        assert_eq!(clock.phase(), ClockPhase::Expired);
    }

    #[test]
    fn zero_duration_runs_for_one_tick() {
        let mut clock = TurnClock::start(0);
        assert!(clock.is_running());
        assert_eq!(clock.duration(), 1);
        assert_eq!(clock.remaining(), 1);
        assert_eq!(clock.tick(), ClockEvent::Expired);
        assert_eq!(clock.tick(), ClockEvent::Idle);
    }

    #[test]
    fn tick_at_one_second_expires() {
        let mut clock = TurnClock::start(1);
        assert_eq!(clock.tick(), ClockEvent::Expired);
        assert!(clock.is_expired());
        assert_eq!(clock.progress(), 1.0);
    }

    #[test]
    fn pause_is_idempotent_and_blocks_ticks() {
        let mut clock = TurnClock::start(10);
        clock.tick();
        assert!(clock.pause());
        assert!(!clock.pause());
        assert_eq!(clock.phase(), ClockPhase::Paused);

        assert_eq!(clock.tick(), ClockEvent::Idle);
        assert_eq!(clock.remaining(), 9);
    }

    #[test]
    fn resume_continues_from_paused_value() {
        let mut clock = TurnClock::start(60);
        for _ in 0..15 {
            clock.tick();
        }
        clock.pause();
        assert!(clock.resume());
        assert_eq!(clock.remaining(), 45);
        assert_eq!(clock.tick(), ClockEvent::Ticked { remaining: 44 });
        assert_eq!(clock.elapsed(), 16);
    }

    #[test]
    fn resume_on_running_clock_is_noop() {
        let mut clock = TurnClock::start(5);
        assert!(!clock.resume());
        assert_eq!(clock.phase(), ClockPhase::Running);
        assert_eq!(clock.remaining(), 5);
    }

    #[test]
    fn cancel_stops_from_any_phase() {
        let mut running = TurnClock::start(5);
        running.cancel();
        assert_eq!(running.tick(), ClockEvent::Idle);
        assert!(!running.resume());
        assert!(!running.pause());

        let mut paused = TurnClock::start(5);
        paused.pause();
        paused.cancel();
        assert!(!paused.resume());
        assert!(paused.is_cancelled());
    }

    #[test]
    fn expired_clock_cannot_pause() {
        let mut clock = TurnClock::start(1);
        clock.tick();
        assert!(!clock.pause());
        assert!(clock.is_expired());
    }
}
