// ABOUTME: Session lifecycle states and the validated transitions between them
// ABOUTME: State lives in a watch channel so callers can observe every change

use std::fmt;
use tokio::sync::watch;
use tracing::{debug, info};

/// Lifecycle of a session.
///
/// ```text
/// Disconnected → Binding → Bound ⇄ Rebinding
///                            ↓         ↓
///                         Closing → Closed
/// ```
///
/// `Failed` is reachable from every non-terminal state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SessionState {
    Disconnected,
    Binding,
    Bound,
    Rebinding,
    Closing,
    Closed,
    Failed,
}

impl SessionState {
    pub fn is_terminal(&self) -> bool {
        matches!(self, SessionState::Closed | SessionState::Failed)
    }

    pub fn can_transition_to(&self, next: SessionState) -> bool {
        use SessionState::*;

        match (self, next) {
            (Closed | Failed, _) => false,
            (_, Failed) => true,
            (Disconnected, Binding) => true,
            (Binding, Bound | Closing) => true,
            (Bound, Rebinding | Closing) => true,
            (Rebinding, Bound | Closing) => true,
            (Closing, Closed) => true,
            _ => false,
        }
    }
}

impl fmt::Display for SessionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            SessionState::Disconnected => "disconnected",
            SessionState::Binding => "binding",
            SessionState::Bound => "bound",
            SessionState::Rebinding => "rebinding",
            SessionState::Closing => "closing",
            SessionState::Closed => "closed",
            SessionState::Failed => "failed",
        };
        f.write_str(name)
    }
}

/// Current state plus its change feed
#[derive(Debug)]
pub(crate) struct StateCell {
    tx: watch::Sender<SessionState>,
}

impl StateCell {
    pub(crate) fn new() -> Self {
        let (tx, _) = watch::channel(SessionState::Disconnected);
        Self { tx }
    }

    pub(crate) fn get(&self) -> SessionState {
        *self.tx.borrow()
    }

    pub(crate) fn subscribe(&self) -> watch::Receiver<SessionState> {
        self.tx.subscribe()
    }

    /// Move to `next` if the transition is valid. Returns whether the state
    /// changed.
    pub(crate) fn transition(&self, next: SessionState) -> bool {
        let mut previous = None;
        self.tx.send_if_modified(|state| {
            if state.can_transition_to(next) {
                previous = Some(*state);
                *state = next;
                true
            } else {
                false
            }
        });

        match previous {
            Some(from) => {
                info!(%from, to = %next, "session state changed");
                true
            }
            None => {
                debug!(current = %self.get(), refused = %next, "state transition refused");
                false
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use SessionState::*;

    #[test]
    fn lifecycle_transitions() {
        assert!(Disconnected.can_transition_to(Binding));
        assert!(Binding.can_transition_to(Bound));
        assert!(Bound.can_transition_to(Rebinding));
        assert!(Rebinding.can_transition_to(Bound));
        assert!(Bound.can_transition_to(Closing));
        assert!(Closing.can_transition_to(Closed));

        assert!(!Disconnected.can_transition_to(Bound));
        assert!(!Bound.can_transition_to(Binding));
        assert!(!Closing.can_transition_to(Bound));
    }

    #[test]
    fn failed_is_reachable_until_terminal() {
        for state in [Disconnected, Binding, Bound, Rebinding, Closing] {
            assert!(state.can_transition_to(Failed), "{state} -> failed");
        }
        assert!(!Closed.can_transition_to(Failed));
        assert!(!Failed.can_transition_to(Bound));
        assert!(!Failed.can_transition_to(Failed));
    }

    #[test]
    fn cell_refuses_invalid_moves() {
        let cell = StateCell::new();
        let mut rx = cell.subscribe();

        assert!(!cell.transition(Bound));
        assert_eq!(cell.get(), Disconnected);
        assert!(!rx.has_changed().unwrap());

        assert!(cell.transition(Binding));
        assert!(rx.has_changed().unwrap());
        assert_eq!(*rx.borrow_and_update(), Binding);
    }
}
