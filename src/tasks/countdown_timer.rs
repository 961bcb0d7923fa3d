//! One-second countdown tick source

use std::time::Duration;
use tokio::{
    sync::mpsc,
    task::JoinHandle,
    time::{interval_at, Instant, MissedTickBehavior},
};
use tracing::debug;

/// Period between two countdown ticks
pub const TICK_PERIOD: Duration = Duration::from_secs(1);

/// Marker delivered once per elapsed tick period
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Tick;

/// Something that can be started and stopped to drive a coordinator
pub trait TickSource {
    /// Begin ticking; no-op when already running
    fn start(&mut self);
    /// Stop ticking; no-op when already stopped
    fn stop(&mut self);
    fn is_running(&self) -> bool;
}

/// Periodic tick source backed by a tokio interval.
///
/// Ticks are pushed into an unbounded channel. A late runtime delivers every
/// due tick in a burst, so a countdown never skips a value.
#[derive(Debug)]
pub struct CountdownTimer {
    period: Duration,
    tick_tx: mpsc::UnboundedSender<Tick>,
    handle: Option<JoinHandle<()>>,
}

impl CountdownTimer {
    /// Create a stopped timer feeding `tick_tx` every [`TICK_PERIOD`]
    pub fn new(tick_tx: mpsc::UnboundedSender<Tick>) -> Self {
        Self::with_period(tick_tx, TICK_PERIOD)
    }

    pub fn with_period(tick_tx: mpsc::UnboundedSender<Tick>, period: Duration) -> Self {
        Self {
            period,
            tick_tx,
            handle: None,
        }
    }

    /// Create a timer and its tick receiver in one go
    pub fn channel() -> (Self, mpsc::UnboundedReceiver<Tick>) {
        let (tick_tx, tick_rx) = mpsc::unbounded_channel();
        (Self::new(tick_tx), tick_rx)
    }
}

impl TickSource for CountdownTimer {
    fn start(&mut self) {
        if self.is_running() {
            return;
        }

        // Built here rather than inside the task so the first deadline is
        // measured from the start call, not from the task's first poll.
        let mut interval = interval_at(Instant::now() + self.period, self.period);
        interval.set_missed_tick_behavior(MissedTickBehavior::Burst);
        let tick_tx = self.tick_tx.clone();

        debug!("Countdown timer started ({:?} period)", self.period);
        self.handle = Some(tokio::spawn(async move {
            loop {
                interval.tick().await;
                if tick_tx.send(Tick).is_err() {
                    debug!("Tick receiver gone, countdown timer exiting");
                    break;
                }
            }
        }));
    }

    fn stop(&mut self) {
        if let Some(handle) = self.handle.take() {
            handle.abort();
            debug!("Countdown timer stopped");
        }
    }

    fn is_running(&self) -> bool {
        self.handle
            .as_ref()
            .map(|handle| !handle.is_finished())
            .unwrap_or(false)
    }
}

impl Drop for CountdownTimer {
    fn drop(&mut self) {
        self.stop();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test(start_paused = true)]
    async fn ticks_once_per_second() {
        let (mut timer, mut tick_rx) = CountdownTimer::channel();
        let started = Instant::now();
        timer.start();
        assert!(timer.is_running());

        for expected in 1..=3u64 {
            assert_eq!(tick_rx.recv().await, Some(Tick));
            assert_eq!(started.elapsed(), Duration::from_secs(expected));
        }
    }

    #[tokio::test(start_paused = true)]
    async fn start_twice_keeps_a_single_ticker() {
        let (mut timer, mut tick_rx) = CountdownTimer::channel();
        let started = Instant::now();
        timer.start();
        timer.start();

        assert_eq!(tick_rx.recv().await, Some(Tick));
        assert_eq!(tick_rx.recv().await, Some(Tick));
        // A second ticker would have produced two ticks per second
        assert_eq!(started.elapsed(), Duration::from_secs(2));
    }

    #[tokio::test(start_paused = true)]
    async fn stop_is_idempotent_and_halts_ticks() {
        let (mut timer, mut tick_rx) = CountdownTimer::channel();
        timer.start();
        assert_eq!(tick_rx.recv().await, Some(Tick));

        timer.stop();
        timer.stop();
        assert!(!timer.is_running());

        let next = tokio::time::timeout(Duration::from_secs(5), tick_rx.recv()).await;
        assert!(next.is_err(), "no tick expected after stop, got {:?}", next);
    }

    #[tokio::test(start_paused = true)]
    async fn dropping_the_timer_stops_ticking() {
        let (mut timer, mut tick_rx) = CountdownTimer::channel();
        timer.start();
        drop(timer);

        // The sender held by the timer and its task are both gone
        assert_eq!(tick_rx.recv().await, None);
    }

    #[tokio::test(start_paused = true)]
    async fn missed_deadlines_are_delivered_not_skipped() {
        let (mut timer, mut tick_rx) = CountdownTimer::channel();
        let started = Instant::now();
        timer.start();

        tokio::time::advance(Duration::from_millis(3500)).await;

        for _ in 0..3 {
            assert_eq!(tick_rx.recv().await, Some(Tick));
        }
        // All three overdue ticks arrive without waiting for the 4s deadline
        assert_eq!(started.elapsed(), Duration::from_millis(3500));
    }
}
