use crate::history::AttemptRecord;

/// Where a task widget currently sits in its lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, strum_macros::Display)]
pub enum TaskPhase {
    /// No variant selected yet.
    Idle,
    /// A variant is locked in and the clock is running.
    Active,
    /// The solution was accepted and the completion time is frozen.
    Completed,
}

/// Live state of one task widget.
///
/// Mutation goes through [`crate::task::PracticeTask`], which keeps the
/// single-variant and frozen-completion invariants intact.
#[derive(Debug, Clone, PartialEq)]
pub struct TaskSession {
    pub(crate) task_id: String,
    pub(crate) selected_variant: Option<usize>,
    pub(crate) elapsed_seconds: u64,
    pub(crate) completed: bool,
    pub(crate) completed_elapsed_seconds: Option<u64>,
    pub(crate) solution: String,
    pub(crate) history: Vec<AttemptRecord>,
}

impl TaskSession {
    pub fn new<S: Into<String>>(task_id: S) -> Self {
        Self {
            task_id: task_id.into(),
            selected_variant: None,
            elapsed_seconds: 0,
            completed: false,
            completed_elapsed_seconds: None,
            solution: String::new(),
            history: Vec::new(),
        }
    }

    pub fn task_id(&self) -> &str {
        &self.task_id
    }

    pub fn selected_variant(&self) -> Option<usize> {
        self.selected_variant
    }

    pub fn elapsed_seconds(&self) -> u64 {
        self.elapsed_seconds
    }

    pub fn is_completed(&self) -> bool {
        self.completed
    }

    pub fn completed_elapsed_seconds(&self) -> Option<u64> {
        self.completed_elapsed_seconds
    }

    pub fn solution(&self) -> &str {
        &self.solution
    }

    pub fn history(&self) -> &[AttemptRecord] {
        &self.history
    }

    pub fn phase(&self) -> TaskPhase {
        match (self.selected_variant, self.completed) {
            (None, _) => TaskPhase::Idle,
            (Some(_), false) => TaskPhase::Active,
            (Some(_), true) => TaskPhase::Completed,
        }
    }

    /// Whether the solution text passes the completion gate.
    pub fn has_solution(&self) -> bool {
        !self.solution.trim().is_empty()
    }

    /// Time an attempt took: the frozen completion time when there is one.
    pub fn attempt_duration(&self) -> u64 {
        if self.completed {
            self.completed_elapsed_seconds
                .unwrap_or(self.elapsed_seconds)
        } else {
            self.elapsed_seconds
        }
    }

    /// Back to Idle, keeping the identifier and the history.
    pub(crate) fn close_attempt(&mut self) {
        self.selected_variant = None;
        self.elapsed_seconds = 0;
        self.completed = false;
        self.completed_elapsed_seconds = None;
        self.solution.clear();
    }
}
