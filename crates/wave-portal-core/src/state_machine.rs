use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum SessionState {
    #[default]
    Disconnected,
    Idle,
    Submitting,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SessionAction {
    Connect,
    SubmitAccepted,
    SubmitSettled,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StateTransition {
    pub from: SessionState,
    pub to: SessionState,
    pub reason: &'static str,
}

#[derive(Debug, Error, PartialEq, Eq)]
#[error("illegal session transition: {from:?} --{action:?}-->")]
pub struct TransitionError {
    pub from: SessionState,
    pub action: SessionAction,
}

impl SessionState {
    pub fn is_connected(self) -> bool {
        !matches!(self, SessionState::Disconnected)
    }

    pub fn is_mining(self) -> bool {
        matches!(self, SessionState::Submitting)
    }
}

pub fn session_transition(
    from: SessionState,
    action: SessionAction,
) -> Result<(SessionState, StateTransition), TransitionError> {
    let (to, reason) = match (from, action) {
        (SessionState::Disconnected, SessionAction::Connect) => {
            (SessionState::Idle, "account_authorized")
        }
        // A repeated connect keeps the session where it is.
        (SessionState::Idle, SessionAction::Connect) => (SessionState::Idle, "account_refreshed"),
        (SessionState::Submitting, SessionAction::Connect) => {
            (SessionState::Submitting, "account_refreshed")
        }
        (SessionState::Idle, SessionAction::SubmitAccepted) => {
            (SessionState::Submitting, "wave_submitted")
        }
        (SessionState::Submitting, SessionAction::SubmitSettled) => {
            (SessionState::Idle, "wave_settled")
        }
        _ => return Err(TransitionError { from, action }),
    };
    Ok((to, StateTransition { from, to, reason }))
}
