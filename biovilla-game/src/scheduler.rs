//! Cooperative delayed-task scheduler driven by host time.
//!
//! Tasks carry the [`SessionToken`] that was current when they were scheduled.
//! Owners bump the token whenever a new dialogue, quiz or encounter starts and
//! drop any fired task whose token no longer matches, so late callbacks from a
//! previous session can never touch the new one.
//!
//! Time only moves when the host calls [`Scheduler::pop_due`] and
//! [`Scheduler::advance_to`]. Tasks fire in due-time order; ties fire in
//! scheduling order. A task scheduled while another is firing is measured from
//! the firing task's due time, so chained reveals stay exact across large ticks.
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Generation counter for cancellable work.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct SessionToken(u64);

impl SessionToken {
    #[must_use]
    pub const fn new(value: u64) -> Self {
        Self(value)
    }

    #[must_use]
    pub const fn next(self) -> Self {
        Self(self.0.wrapping_add(1))
    }

    #[must_use]
    pub const fn value(self) -> u64 {
        self.0
    }
}

impl fmt::Display for SessionToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "session#{}", self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TaskId(u64);

/// A task that reached its due time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Fired<T> {
    pub id: TaskId,
    pub due_ms: u64,
    pub session: SessionToken,
    pub payload: T,
}

#[derive(Debug, Clone)]
struct Entry<T> {
    session: SessionToken,
    payload: T,
}

#[derive(Debug, Clone)]
pub struct Scheduler<T> {
    now_ms: u64,
    next_id: u64,
    tasks: BTreeMap<(u64, TaskId), Entry<T>>,
}

impl<T> Default for Scheduler<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> Scheduler<T> {
    #[must_use]
    pub const fn new() -> Self {
        Self {
            now_ms: 0,
            next_id: 0,
            tasks: BTreeMap::new(),
        }
    }

    /// Current scheduler clock in milliseconds.
    #[must_use]
    pub const fn now(&self) -> u64 {
        self.now_ms
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }

    /// Schedule `payload` to fire `delay_ms` from now.
    pub fn schedule(&mut self, delay_ms: u64, session: SessionToken, payload: T) -> TaskId {
        let id = TaskId(self.next_id);
        self.next_id = self.next_id.wrapping_add(1);
        let due = self.now_ms.saturating_add(delay_ms);
        self.tasks.insert((due, id), Entry { session, payload });
        id
    }

    /// Cancel one task. Returns whether it was still pending.
    pub fn cancel(&mut self, id: TaskId) -> bool {
        let key = self.tasks.keys().find(|(_, task)| *task == id).copied();
        key.is_some_and(|key| self.tasks.remove(&key).is_some())
    }

    /// Cancel every task tagged with `session`. Returns how many were dropped.
    pub fn cancel_session(&mut self, session: SessionToken) -> usize {
        self.cancel_matching(|task_session, _| task_session == session)
    }

    /// Cancel every task whose payload matches `predicate`.
    pub fn cancel_where(&mut self, mut predicate: impl FnMut(&T) -> bool) -> usize {
        self.cancel_matching(|_, payload| predicate(payload))
    }

    fn cancel_matching(&mut self, mut predicate: impl FnMut(SessionToken, &T) -> bool) -> usize {
        let before = self.tasks.len();
        self.tasks.retain(|_, entry| !predicate(entry.session, &entry.payload));
        before - self.tasks.len()
    }

    /// Whether any pending task matches `predicate`.
    pub fn any(&self, mut predicate: impl FnMut(&T) -> bool) -> bool {
        self.tasks.values().any(|entry| predicate(&entry.payload))
    }

    /// Pop the earliest task due at or before `deadline_ms`, moving the clock
    /// to its due time.
    pub fn pop_due(&mut self, deadline_ms: u64) -> Option<Fired<T>> {
        let (&(due, _), _) = self.tasks.first_key_value()?;
        if due > deadline_ms {
            return None;
        }
        let ((due_ms, id), entry) = self.tasks.pop_first()?;
        self.now_ms = self.now_ms.max(due_ms);
        Some(Fired {
            id,
            due_ms,
            session: entry.session,
            payload: entry.payload,
        })
    }

    /// Move the clock forward to `deadline_ms`. The clock never goes backwards.
    pub fn advance_to(&mut self, deadline_ms: u64) {
        self.now_ms = self.now_ms.max(deadline_ms);
    }

    /// Pop everything due within `elapsed_ms` and advance the clock.
    ///
    /// Tasks scheduled by the caller while handling the result are not
    /// included; use [`Self::pop_due`] in a loop for chained work.
    pub fn advance(&mut self, elapsed_ms: u64) -> Vec<Fired<T>> {
        let deadline = self.now_ms.saturating_add(elapsed_ms);
        let mut fired = Vec::new();
        while let Some(task) = self.pop_due(deadline) {
            fired.push(task);
        }
        self.advance_to(deadline);
        fired
    }
}
