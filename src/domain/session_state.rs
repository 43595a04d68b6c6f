use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Disconnected,
    Connecting,
    Authenticating,
    Ready,
    Closed,
    Failed,
}

impl SessionState {
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Closed | Self::Failed)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionEvent {
    Open,
    TransportOpened,
    Authenticated,
    Violation,
    Close,
}

#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
#[error("session cannot handle {event:?} while {from:?}")]
pub struct InvalidTransition {
    pub from: SessionState,
    pub event: SessionEvent,
}

#[derive(Debug, Clone)]
pub struct SessionStateMachine {
    state: SessionState,
}

impl Default for SessionStateMachine {
    fn default() -> Self {
        Self::new()
    }
}

impl SessionStateMachine {
    pub fn new() -> Self {
        Self {
            state: SessionState::Disconnected,
        }
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    // `Failed` and `Closed` absorb further `Close` and `Violation` events.
    pub fn observe(&mut self, event: SessionEvent) -> Result<SessionState, InvalidTransition> {
        let next = match (self.state, event) {
            (SessionState::Disconnected, SessionEvent::Open) => SessionState::Connecting,
            (SessionState::Connecting, SessionEvent::TransportOpened) => {
                SessionState::Authenticating
            }
            (SessionState::Authenticating, SessionEvent::Authenticated) => SessionState::Ready,
            (state, SessionEvent::Close | SessionEvent::Violation) if state.is_terminal() => state,
            (_, SessionEvent::Violation) => SessionState::Failed,
            (_, SessionEvent::Close) => SessionState::Closed,
            (from, event) => return Err(InvalidTransition { from, event }),
        };

        self.state = next;
        Ok(next)
    }
}
