use std::time::Duration;

use chrono::Utc;
use rand::Rng;
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::catalog::TaskDefinition;
use crate::history::{record_attempt, view_attempt, AttemptRecord, AttemptView};
use crate::sandbox::SandboxEmbed;
use crate::selector::{SelectionEvent, SpinSettings, VariantSelector};
use crate::session::{TaskPhase, TaskSession};
use crate::store::{KeyValueStore, ProgressStore};
use crate::timer::SessionTimer;

pub const CLEAR_PROMPT: &str =
    "Clear all progress for this task? History and the saved solution will be deleted.";

/// Why a completion attempt was turned down. Nothing changes when this is returned.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompletionRejected {
    #[error("Pick a variant before marking the task as done.")]
    NoVariant,
    #[error("Write your solution before marking the task as done.")]
    EmptySolution,
    #[error("This attempt is already completed.")]
    AlreadyCompleted,
}

/// Modal yes/no gate in front of irreversible actions.
pub trait Confirm {
    fn confirm(self, prompt: &str) -> bool;
}

impl<F: FnOnce(&str) -> bool> Confirm for F {
    fn confirm(self, prompt: &str) -> bool {
        self(prompt)
    }
}

/// A mounted practice task: owns the session and drives selector, timer,
/// ledger and persistence from user actions and clock ticks.
#[derive(Debug)]
pub struct PracticeTask<S: KeyValueStore> {
    definition: TaskDefinition,
    session: TaskSession,
    selector: VariantSelector,
    timer: SessionTimer,
    store: ProgressStore<S>,
}

impl<S: KeyValueStore> PracticeTask<S> {
    /// Mount a widget, rehydrating whatever the store holds for it.
    pub fn mount(definition: TaskDefinition, backend: S, spin: SpinSettings) -> Self {
        let store = ProgressStore::new(backend);
        let id = definition.identifier();
        let variant_count = definition.variants.len();
        let mut session = TaskSession::new(id.clone());
        let mut selector =
            VariantSelector::new(variant_count, definition.difficulty.clone(), spin);
        let mut timer = SessionTimer::new();

        if let Some(saved) = store.load(&id) {
            session.history = saved.history;
            session.solution = saved.current_code;
            match saved.selected_variant {
                Some(index) if index < variant_count => {
                    session.selected_variant = Some(index);
                    selector.restore(index);
                    if saved.is_completed {
                        let frozen = saved.completed_time.unwrap_or(0);
                        session.completed = true;
                        session.completed_elapsed_seconds = Some(frozen);
                        session.elapsed_seconds = frozen;
                        timer.set_frozen(Some(frozen));
                    } else {
                        timer.set_running(true);
                    }
                }
                Some(index) => {
                    warn!(task = %id, index, variant_count, "saved variant no longer exists; starting idle");
                }
                None => {}
            }
        }

        debug!(task = %id, phase = %session.phase(), "mounted task");
        Self {
            definition,
            session,
            selector,
            timer,
            store,
        }
    }

    /// Stop recurring work and hand the storage backend back.
    pub fn unmount(mut self) -> S {
        self.selector.cancel();
        self.timer.set_running(false);
        debug!(task = %self.session.task_id(), "unmounted task");
        self.store.into_backend()
    }

    pub fn definition(&self) -> &TaskDefinition {
        &self.definition
    }

    pub fn session(&self) -> &TaskSession {
        &self.session
    }

    pub fn selector(&self) -> &VariantSelector {
        &self.selector
    }

    pub fn timer(&self) -> &SessionTimer {
        &self.timer
    }

    pub fn store(&self) -> &ProgressStore<S> {
        &self.store
    }

    pub fn phase(&self) -> TaskPhase {
        self.session.phase()
    }

    pub fn current_variant(&self) -> Option<&str> {
        self.session
            .selected_variant
            .and_then(|i| self.definition.variants.get(i))
            .map(String::as_str)
    }

    /// The embedded sandbox, present only once a variant is in play.
    pub fn sandbox(&self) -> Option<&SandboxEmbed> {
        match self.phase() {
            TaskPhase::Idle => None,
            TaskPhase::Active | TaskPhase::Completed => self.definition.sandbox.as_ref(),
        }
    }

    /// Ask the selector for a variant. No-op unless Idle and unlocked.
    pub fn request_variant<R: Rng>(&mut self, rng: &mut R) -> Option<SelectionEvent> {
        if self.phase() != TaskPhase::Idle {
            return None;
        }
        let event = self.selector.request(rng)?;
        if let SelectionEvent::Final(index) = event {
            self.begin(index);
        }
        Some(event)
    }

    /// Feed elapsed wall-clock time. Returns whether anything visible changed.
    pub fn on_tick<R: Rng>(&mut self, dt: Duration, rng: &mut R) -> bool {
        let mut changed = false;

        for event in self.selector.on_tick(dt, rng) {
            changed = true;
            if let SelectionEvent::Final(index) = event {
                self.begin(index);
            }
        }

        if self.timer.on_tick(dt) > 0 {
            if self.phase() == TaskPhase::Active {
                self.session.elapsed_seconds = self.timer.elapsed();
            }
            changed = true;
        }
        changed
    }

    fn begin(&mut self, index: usize) {
        if self.phase() != TaskPhase::Idle {
            return;
        }
        self.session.selected_variant = Some(index);
        self.session.elapsed_seconds = 0;
        self.session.solution.clear();
        self.session.completed = false;
        self.session.completed_elapsed_seconds = None;

        self.timer.set_frozen(None);
        self.timer.set_running(false);
        self.timer.set_running(true);

        info!(task = %self.session.task_id(), variant = index + 1, "variant selected");
        self.persist();
    }

    /// Replace the solution text. Ignored unless Active.
    pub fn set_solution<T: Into<String>>(&mut self, text: T) -> bool {
        if self.phase() != TaskPhase::Active {
            return false;
        }
        let text = text.into();
        if text == self.session.solution {
            return false;
        }
        self.session.solution = text;
        self.persist();
        true
    }

    pub fn push_char(&mut self, c: char) -> bool {
        if self.phase() != TaskPhase::Active {
            return false;
        }
        self.session.solution.push(c);
        self.persist();
        true
    }

    pub fn pop_char(&mut self) -> bool {
        if self.phase() != TaskPhase::Active || self.session.solution.pop().is_none() {
            return false;
        }
        self.persist();
        true
    }

    /// Finalize the attempt. On success returns the frozen completion time.
    pub fn complete(&mut self) -> Result<u64, CompletionRejected> {
        match self.phase() {
            TaskPhase::Idle => return Err(CompletionRejected::NoVariant),
            TaskPhase::Completed => return Err(CompletionRejected::AlreadyCompleted),
            TaskPhase::Active => {}
        }
        if !self.session.has_solution() {
            debug!(task = %self.session.task_id(), "completion rejected: empty solution");
            return Err(CompletionRejected::EmptySolution);
        }

        let frozen = self.session.elapsed_seconds;
        self.session.completed = true;
        self.session.completed_elapsed_seconds = Some(frozen);
        self.timer.set_frozen(Some(frozen));
        self.timer.set_running(false);

        info!(task = %self.session.task_id(), seconds = frozen, "task completed");
        self.persist();
        Ok(frozen)
    }

    /// Close out the current attempt into history and go back to Idle.
    /// Returns the appended record; Idle sessions have nothing to close.
    pub fn reset(&mut self) -> Option<&AttemptRecord> {
        if self.phase() == TaskPhase::Idle {
            return None;
        }

        record_attempt(&mut self.session, Utc::now())?;
        self.session.close_attempt();
        self.selector.reset();
        self.timer.set_frozen(None);
        self.timer.set_running(false);

        info!(
            task = %self.session.task_id(),
            attempts = self.session.history.len(),
            "attempt closed"
        );
        self.persist();
        self.session.history.last()
    }

    /// Discard everything for this task, including the durable slot, once
    /// `confirm` agrees. Returns whether the clear happened.
    pub fn clear_progress<C: Confirm>(&mut self, confirm: C) -> bool {
        if !confirm.confirm(CLEAR_PROMPT) {
            debug!(task = %self.session.task_id(), "clear cancelled");
            return false;
        }

        let id = self.session.task_id().to_string();
        self.session = TaskSession::new(id.clone());
        self.selector.reset();
        self.timer.set_frozen(None);
        self.timer.set_running(false);
        self.store.clear(&id);

        info!(task = %id, "progress cleared");
        true
    }

    pub fn view_attempt(&self, index: usize) -> Option<AttemptView<'_>> {
        self.session.history.get(index).map(view_attempt)
    }

    fn persist(&mut self) {
        self.store.save(&self.session);
    }
}
