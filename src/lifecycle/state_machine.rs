use statig::prelude::*;

use super::types::Period;
use crate::portal::MonthRecord;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MonthEvent {
    /// Server snapshot of the month's lock flags.
    Observe {
        is_locked: bool,
        was_locked_once: bool,
    },
    /// Client-driven lock, sent once the service confirmed it.
    Lock,
    /// Admin reopened the month. Only ever observed, never sent by the client.
    AdminUnlock,
}

impl MonthEvent {
    pub fn observe(record: &MonthRecord) -> Self {
        MonthEvent::Observe {
            is_locked: record.is_locked,
            was_locked_once: record.was_locked_once,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MonthPhase {
    /// Unlocked and never sealed.
    Open,
    Locked,
    /// Unlocked again after having been locked at least once.
    Reopened,
}

#[derive(Debug, Default)]
pub struct MonthLifecycle {
    pub period: Option<Period>,
    is_locked: bool,
    was_locked_once: bool,
    rejected: Vec<MonthEvent>,
}

impl MonthLifecycle {
    pub fn new(period: Period) -> Self {
        Self {
            period: Some(period),
            ..Default::default()
        }
    }

    fn reject(&mut self, event: &MonthEvent, phase: MonthPhase) {
        tracing::warn!(
            period = ?self.period,
            event = ?event,
            phase = ?phase,
            "Ignoring invalid month transition"
        );
        self.rejected.push(event.clone());
    }

    fn mark_locked(&mut self) {
        self.is_locked = true;
        self.was_locked_once = true;
    }

    fn mark_reopened(&mut self) {
        self.is_locked = false;
        self.was_locked_once = true;
    }
}

#[state_machine(initial = "State::open()")]
impl MonthLifecycle {
    #[state]
    fn open(&mut self, event: &MonthEvent) -> Outcome<State> {
        match event {
            MonthEvent::Observe { is_locked: true, .. } | MonthEvent::Lock => {
                self.mark_locked();
                tracing::info!(period = ?self.period, "Month locked");
                Transition(State::locked())
            }
            MonthEvent::Observe {
                is_locked: false,
                was_locked_once: true,
            } => {
                self.mark_reopened();
                Transition(State::reopened())
            }
            MonthEvent::Observe { .. } => Handled,
            MonthEvent::AdminUnlock => {
                self.reject(event, MonthPhase::Open);
                Handled
            }
        }
    }

    #[state]
    fn locked(&mut self, event: &MonthEvent) -> Outcome<State> {
        match event {
            MonthEvent::AdminUnlock | MonthEvent::Observe { is_locked: false, .. } => {
                self.mark_reopened();
                tracing::info!(period = ?self.period, "Month reopened by admin");
                Transition(State::reopened())
            }
            MonthEvent::Observe { .. } => Handled,
            MonthEvent::Lock => {
                self.reject(event, MonthPhase::Locked);
                Handled
            }
        }
    }

    #[state]
    fn reopened(&mut self, event: &MonthEvent) -> Outcome<State> {
        match event {
            MonthEvent::Observe { is_locked: true, .. } | MonthEvent::Lock => {
                self.mark_locked();
                tracing::info!(period = ?self.period, "Reopened month locked again");
                Transition(State::locked())
            }
            MonthEvent::Observe { .. } => Handled,
            MonthEvent::AdminUnlock => {
                self.reject(event, MonthPhase::Reopened);
                Handled
            }
        }
    }
}

impl MonthLifecycle {
    pub fn phase(&self) -> MonthPhase {
        match (self.is_locked, self.was_locked_once) {
            (true, _) => MonthPhase::Locked,
            (false, true) => MonthPhase::Reopened,
            (false, false) => MonthPhase::Open,
        }
    }

    pub fn was_locked_once(&self) -> bool {
        self.was_locked_once
    }

    /// Whether the client may drive the lock edge from the current phase.
    pub fn can_lock(&self) -> bool {
        !self.is_locked
    }

    /// Events that were ignored because no transition accepts them.
    pub fn rejected_events(&self) -> &[MonthEvent] {
        &self.rejected
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn period() -> Period {
        Period::new(2026, 5).unwrap()
    }

    #[test]
    fn test_open_month_locks_and_reopens() {
        let mut sm = MonthLifecycle::new(period()).state_machine();
        assert_eq!(sm.inner().phase(), MonthPhase::Open);
        assert!(sm.inner().can_lock());

        sm.handle(&MonthEvent::Lock);
        assert_eq!(sm.inner().phase(), MonthPhase::Locked);
        assert!(!sm.inner().can_lock());

        sm.handle(&MonthEvent::AdminUnlock);
        assert_eq!(sm.inner().phase(), MonthPhase::Reopened);
        assert!(sm.inner().was_locked_once());

        sm.handle(&MonthEvent::Lock);
        assert_eq!(sm.inner().phase(), MonthPhase::Locked);
        assert!(sm.inner().rejected_events().is_empty());
    }

    #[test]
    fn test_second_lock_is_ignored() {
        let mut sm = MonthLifecycle::new(period()).state_machine();
        sm.handle(&MonthEvent::Lock);
        sm.handle(&MonthEvent::Lock);

        assert_eq!(sm.inner().phase(), MonthPhase::Locked);
        assert_eq!(sm.inner().rejected_events(), &[MonthEvent::Lock]);
    }

    #[test]
    fn test_unlock_of_open_month_is_invalid() {
        let mut sm = MonthLifecycle::new(period()).state_machine();
        sm.handle(&MonthEvent::AdminUnlock);

        assert_eq!(sm.inner().phase(), MonthPhase::Open);
        assert!(!sm.inner().was_locked_once());
        assert_eq!(sm.inner().rejected_events(), &[MonthEvent::AdminUnlock]);
    }

    #[test]
    fn test_observed_snapshots_place_the_machine() {
        let mut record = MonthRecord {
            was_locked_once: true,
            ..MonthRecord::default()
        };

        let mut sm = MonthLifecycle::new(period()).state_machine();
        sm.handle(&MonthEvent::observe(&record));
        assert_eq!(sm.inner().phase(), MonthPhase::Reopened);

        record.is_locked = true;
        sm.handle(&MonthEvent::observe(&record));
        assert_eq!(sm.inner().phase(), MonthPhase::Locked);

        // A fresh record leaves a fresh machine untouched
        let mut fresh = MonthLifecycle::new(period()).state_machine();
        fresh.handle(&MonthEvent::observe(&MonthRecord::default()));
        assert_eq!(fresh.inner().phase(), MonthPhase::Open);
    }
}
