use std::sync::mpsc::{self, Receiver, RecvTimeoutError};
use std::time::Duration;

use crossterm::event::{self, Event as CtEvent, KeyEvent};

/// Unified event type consumed by the app runner
#[derive(Clone, Debug)]
pub enum TaskEvent {
    Key(KeyEvent),
    Resize,
    Tick,
}

/// Source of terminal events (keyboard, resize, etc.)
pub trait TaskEventSource: Send + 'static {
    /// Block for up to `timeout` waiting for an event.
    /// Returns Ok(event) if an event arrives before the timeout, or Err(Timeout) if it expires.
    fn recv_timeout(&self, timeout: Duration) -> Result<TaskEvent, RecvTimeoutError>;
}

/// Production event source using crossterm.
///
/// The reader thread exits on its own once the receiving side is dropped.
pub struct CrosstermEventSource {
    rx: Receiver<TaskEvent>,
}

impl CrosstermEventSource {
    pub fn new() -> Self {
        let (tx, rx) = mpsc::channel();

        std::thread::spawn(move || loop {
            match event::read() {
                Ok(CtEvent::Key(key)) => {
                    if tx.send(TaskEvent::Key(key)).is_err() {
                        break;
                    }
                }
                Ok(CtEvent::Resize(_, _)) => {
                    if tx.send(TaskEvent::Resize).is_err() {
                        break;
                    }
                }
                Ok(_) => {}
                Err(_) => break,
            }
        });

        Self { rx }
    }
}

impl Default for CrosstermEventSource {
    fn default() -> Self {
        Self::new()
    }
}

impl TaskEventSource for CrosstermEventSource {
    fn recv_timeout(&self, timeout: Duration) -> Result<TaskEvent, RecvTimeoutError> {
        self.rx.recv_timeout(timeout)
    }
}

/// Configurable ticker interface
pub trait Ticker: Send + Sync + 'static {
    fn interval(&self) -> Duration;
}

/// Fixed interval ticker
#[derive(Clone, Copy, Debug)]
pub struct FixedTicker {
    interval: Duration,
}

impl FixedTicker {
    pub fn new(interval: Duration) -> Self {
        Self { interval }
    }
}

impl Ticker for FixedTicker {
    fn interval(&self) -> Duration {
        self.interval
    }
}

/// Test event source for unit tests
pub struct TestEventSource {
    rx: Receiver<TaskEvent>,
}

impl TestEventSource {
    pub fn new(rx: Receiver<TaskEvent>) -> Self {
        Self { rx }
    }
}

impl TaskEventSource for TestEventSource {
    fn recv_timeout(&self, timeout: Duration) -> Result<TaskEvent, RecvTimeoutError> {
        self.rx.recv_timeout(timeout)
    }
}

/// Runner that advances the application one event/tick at a time
pub struct Runner<E: TaskEventSource, T: Ticker> {
    event_source: E,
    ticker: T,
}

impl<E: TaskEventSource, T: Ticker> Runner<E, T> {
    pub fn new(event_source: E, ticker: T) -> Self {
        Self {
            event_source,
            ticker,
        }
    }

    /// Blocks up to tick interval and returns the next event, or Tick on timeout
    pub fn step(&self) -> TaskEvent {
        match self.event_source.recv_timeout(self.ticker.interval()) {
            Ok(ev) => ev,
            Err(RecvTimeoutError::Timeout) | Err(RecvTimeoutError::Disconnected) => TaskEvent::Tick,
        }
    }
}

/// A recurring callback driven by elapsed time rather than a background thread.
///
/// Owners advance it with the wall-clock time that passed since the last call and
/// act once per reported firing. Dropping the value is the cancellation: nothing
/// fires after that. A bounded schedule stops by itself after `count` firings.
#[derive(Debug, Clone, PartialEq)]
pub struct Repeating {
    period: Duration,
    carried: Duration,
    remaining: Option<u32>,
}

impl Repeating {
    pub fn every(period: Duration) -> Self {
        Self {
            period,
            carried: Duration::ZERO,
            remaining: None,
        }
    }

    pub fn bounded(period: Duration, count: u32) -> Self {
        Self {
            period,
            carried: Duration::ZERO,
            remaining: Some(count),
        }
    }

    pub fn is_exhausted(&self) -> bool {
        self.remaining == Some(0)
    }

    /// Advance by `dt` and return how many times the callback is due.
    pub fn advance(&mut self, dt: Duration) -> u32 {
        if self.period.is_zero() || self.is_exhausted() {
            return 0;
        }

        self.carried += dt;
        let mut fired = 0;
        while self.carried >= self.period {
            if self.is_exhausted() {
                self.carried = Duration::ZERO;
                break;
            }
            self.carried -= self.period;
            fired += 1;
            if let Some(left) = self.remaining.as_mut() {
                *left -= 1;
            }
        }
        fired
    }
}
