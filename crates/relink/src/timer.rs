//! The timer capability used for the reconnect delay.

use std::time::Duration;

use tokio::task::JoinHandle;
use tracing::debug;

use crate::event::{ClientEvent, EventSender, TimerId};

/// Schedules one-shot delayed notifications.
///
/// When a timer elapses the implementation delivers
/// [`ClientEvent::TimerFired`] with the id it was scheduled under.
pub trait Scheduler {
    /// Handle to one scheduled timer.
    type Timer;

    /// Deliver `TimerFired(id)` after `delay`.
    fn schedule(&mut self, delay: Duration, id: TimerId) -> Self::Timer;

    /// Cancel a timer that has not fired yet.
    fn cancel(&mut self, timer: Self::Timer);
}

/// A scheduled tokio sleep.
#[derive(Debug)]
pub struct TokioTimer {
    id: TimerId,
    task: JoinHandle<()>,
}

impl TokioTimer {
    /// The id the timer fires with.
    #[must_use]
    pub const fn id(&self) -> TimerId {
        self.id
    }
}

/// [`Scheduler`] backed by `tokio::time`.
///
/// Each timer is a spawned task that sleeps and then pushes the fired event
/// onto the client's event queue. Works with `tokio::time::pause`.
#[derive(Debug, Clone)]
pub struct TokioScheduler {
    events: EventSender,
}

impl TokioScheduler {
    /// Create a scheduler delivering into `events`.
    #[must_use]
    pub const fn new(events: EventSender) -> Self {
        Self { events }
    }
}

impl Scheduler for TokioScheduler {
    type Timer = TokioTimer;

    fn schedule(&mut self, delay: Duration, id: TimerId) -> TokioTimer {
        let events = self.events.clone();
        let task = tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            if events.send(ClientEvent::TimerFired(id)).is_err() {
                debug!(timer = %id, "event queue closed before timer fired");
            }
        });
        TokioTimer { id, task }
    }

    fn cancel(&mut self, timer: TokioTimer) {
        timer.task.abort();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::event::event_channel;

    #[tokio::test(start_paused = true)]
    async fn test_timer_fires_after_delay() {
        let (tx, mut rx) = event_channel();
        let mut scheduler = TokioScheduler::new(tx);

        let timer = scheduler.schedule(Duration::from_millis(3000), TimerId(9));
        assert_eq!(timer.id(), TimerId(9));

        tokio::time::sleep(Duration::from_millis(2999)).await;
        assert!(rx.try_recv().is_err());

        let event = rx.recv().await;
        assert_eq!(event, Some(ClientEvent::TimerFired(TimerId(9))));
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancelled_timer_never_fires() {
        let (tx, mut rx) = event_channel();
        let mut scheduler = TokioScheduler::new(tx);

        let timer = scheduler.schedule(Duration::from_millis(100), TimerId(1));
        scheduler.cancel(timer);

        tokio::time::sleep(Duration::from_millis(500)).await;
        assert!(rx.try_recv().is_err());
    }

    #[tokio::test(start_paused = true)]
    async fn test_timers_fire_in_deadline_order() {
        let (tx, mut rx) = event_channel();
        let mut scheduler = TokioScheduler::new(tx);

        let _late = scheduler.schedule(Duration::from_millis(200), TimerId(2));
        let _early = scheduler.schedule(Duration::from_millis(100), TimerId(1));

        assert_eq!(rx.recv().await, Some(ClientEvent::TimerFired(TimerId(1))));
        assert_eq!(rx.recv().await, Some(ClientEvent::TimerFired(TimerId(2))));
    }
}
