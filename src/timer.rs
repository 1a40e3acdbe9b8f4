use std::time::Duration;

use crate::runtime::Repeating;

const ONE_SECOND: Duration = Duration::from_secs(1);

/// Whole-second stopwatch for an active attempt.
///
/// The one-second schedule only exists while running; stopping drops it.
#[derive(Debug, Clone, Default)]
pub struct SessionTimer {
    counter: u64,
    schedule: Option<Repeating>,
    frozen: Option<u64>,
}

impl SessionTimer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_running(&self) -> bool {
        self.schedule.is_some()
    }

    /// Live counter, regardless of any frozen value.
    pub fn elapsed(&self) -> u64 {
        self.counter
    }

    pub fn frozen(&self) -> Option<u64> {
        self.frozen
    }

    /// What the display shows: the frozen value wins over the live counter.
    pub fn display_seconds(&self) -> u64 {
        self.frozen.unwrap_or(self.counter)
    }

    pub fn set_running(&mut self, running: bool) {
        match (running, self.schedule.is_some()) {
            (true, false) => self.schedule = Some(Repeating::every(ONE_SECOND)),
            (false, _) => {
                self.schedule = None;
                if self.frozen.is_none() {
                    self.counter = 0;
                }
            }
            (true, true) => {}
        }
    }

    pub fn set_frozen(&mut self, frozen: Option<u64>) {
        self.frozen = frozen;
        if frozen.is_none() && !self.is_running() {
            self.counter = 0;
        }
    }

    /// Advance the clock. Returns how many whole seconds were added.
    pub fn on_tick(&mut self, dt: Duration) -> u64 {
        let Some(schedule) = self.schedule.as_mut() else {
            return 0;
        };
        let added = u64::from(schedule.advance(dt));
        self.counter += added;
        added
    }

    pub fn formatted(&self) -> String {
        format_elapsed(self.display_seconds())
    }
}

/// `H:MM:SS` from one hour up, `M:SS` below.
pub fn format_elapsed(seconds: u64) -> String {
    let hours = seconds / 3600;
    let minutes = (seconds % 3600) / 60;
    let secs = seconds % 60;

    if hours > 0 {
        format!("{hours}:{minutes:02}:{secs:02}")
    } else {
        format!("{minutes}:{secs:02}")
    }
}
