use std::time::Duration;

use tokio::{
    sync::mpsc,
    task::JoinHandle,
    time::{self, Instant, MissedTickBehavior},
};
use tracing::debug;

/// Tick emitted by a scheduler.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SchedulerTick {
    /// Arming generation that produced this tick.
    pub generation: u64,
    /// 1-based index of the tick within its generation.
    pub sequence: u64,
}

/// Port that delivers one tick per period to whoever owns the turn clock.
///
/// Every call to [`TickScheduler::arm`] starts a new generation; receivers
/// drop ticks whose generation is not [`TickScheduler::generation`] so a tick
/// that was in flight when the scheduler was disarmed is never counted.
pub trait TickScheduler {
    /// Start delivering ticks to `sender`, replacing any previous delivery.
    fn arm(&mut self, sender: mpsc::Sender<SchedulerTick>);
    /// Stop delivering ticks.
    fn disarm(&mut self);
    /// Whether ticks are currently being delivered.
    fn is_armed(&self) -> bool;
    /// Generation of the most recent `arm` call.
    fn generation(&self) -> u64;

    /// `true` when the tick came from the current arming.
    fn is_current(&self, tick: &SchedulerTick) -> bool {
        self.is_armed() && tick.generation == self.generation()
    }
}

/// Scheduler running a tokio interval task. Must be armed inside a runtime.
pub struct IntervalScheduler {
    period: Duration,
    generation: u64,
    task: Option<JoinHandle<()>>,
}

impl IntervalScheduler {
    /// Create a disarmed scheduler ticking every `period`.
    pub fn new(period: Duration) -> Self {
        Self {
            period,
            generation: 0,
            task: None,
        }
    }

    /// Delay between ticks.
    pub fn period(&self) -> Duration {
        self.period
    }
}

impl TickScheduler for IntervalScheduler {
    fn arm(&mut self, sender: mpsc::Sender<SchedulerTick>) {
        self.disarm();
        self.generation += 1;
        let generation = self.generation;
        let period = self.period;
        debug!(generation, period_ms = period.as_millis() as u64, "Tick scheduler armed");
        self.task = Some(tokio::spawn(async move {
            let mut interval = time::interval_at(Instant::now() + period, period);
            interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
            let mut sequence = 0;
            loop {
                interval.tick().await;
                sequence += 1;
                if sender
                    .send(SchedulerTick {
                        generation,
                        sequence,
                    })
                    .await
                    .is_err()
                {
                    break;
                }
            }
        }));
    }

    fn disarm(&mut self) {
        if let Some(task) = self.task.take() {
            task.abort();
            debug!(generation = self.generation, "Tick scheduler disarmed");
        }
    }

    fn is_armed(&self) -> bool {
        self.task.is_some()
    }

    fn generation(&self) -> u64 {
        self.generation
    }
}

impl Drop for IntervalScheduler {
    fn drop(&mut self) {
        self.disarm();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test(start_paused = true)]
    async fn delivers_one_tick_per_period() {
        let period = Duration::from_secs(1);
        let mut scheduler = IntervalScheduler::new(period);
        let (tx, mut rx) = mpsc::channel(8);

        let started = Instant::now();
        scheduler.arm(tx);
        assert!(scheduler.is_armed());

        for expected in 1..=3 {
            let tick = rx.recv().await.expect("tick");
            assert_eq!(tick.sequence, expected);
            assert_eq!(tick.generation, 1);
            assert!(scheduler.is_current(&tick));
        }
        assert_eq!(Instant::now() - started, period * 3);

        scheduler.disarm();
        assert!(!scheduler.is_armed());
        assert!(rx.recv().await.is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn rearming_starts_a_new_generation() {
        let mut scheduler = IntervalScheduler::new(Duration::from_millis(500));
        let (tx, mut rx) = mpsc::channel(8);

        scheduler.arm(tx.clone());
        let first = rx.recv().await.expect("tick");
        assert_eq!(first.generation, 1);

        scheduler.arm(tx);
        assert!(!scheduler.is_current(&first));
        let second = rx.recv().await.expect("tick");
        assert_eq!(second.generation, 2);
        assert_eq!(second.sequence, 1);
        assert!(scheduler.is_current(&second));
    }
}
