//! Session state machine.
//!
//! ```text
//!                 WalletConnected
//!  Disconnected ──────────────────▶ Connected ──InitStarted──▶ Initializing
//!       ▲                              ▲                          │    │
//!       │                              └────────InitFailed────────┘    │
//!       │                                                   InitSucceeded
//!       └──────────── WalletDisconnected (from any state) ◀── Ready ◀──┘
//! ```
//!
//! All transitions go through [`SessionState::transition`]; an event that
//! does not apply to the current state is ignored.

use serde::Serialize;

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum SessionState {
    #[default]
    Disconnected,
    /// Wallet connected, encryption engine not initialized.
    Connected { address: String },
    /// Initialization in flight.
    Initializing { address: String },
    /// Wallet connected and encryption engine initialized.
    Ready { address: String },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionEvent {
    WalletConnected { address: String },
    WalletDisconnected,
    InitStarted,
    InitSucceeded,
    InitFailed,
}

/// Coarse session phase, for display and snapshots.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionPhase {
    Disconnected,
    Connected,
    Initializing,
    Ready,
}

impl SessionState {
    /// Compute the next state, or `None` if `event` does not apply.
    ///
    /// A `WalletConnected` event for a different address starts a fresh
    /// session: whatever was initialized for the previous account is dropped.
    pub fn transition(&self, event: &SessionEvent) -> Option<SessionState> {
        use SessionEvent::*;
        use SessionState::*;

        match (self, event) {
            (Disconnected, WalletConnected { address }) => Some(Connected {
                address: address.clone(),
            }),
            (_, WalletConnected { address }) => {
                if self.address() == Some(address.as_str()) {
                    None
                } else {
                    Some(Connected {
                        address: address.clone(),
                    })
                }
            }
            (Disconnected, WalletDisconnected) => None,
            (_, WalletDisconnected) => Some(Disconnected),
            (Connected { address }, InitStarted) => Some(Initializing {
                address: address.clone(),
            }),
            (Initializing { address }, InitSucceeded) => Some(Ready {
                address: address.clone(),
            }),
            (Initializing { address }, InitFailed) => Some(Connected {
                address: address.clone(),
            }),
            _ => None,
        }
    }

    pub fn address(&self) -> Option<&str> {
        match self {
            SessionState::Disconnected => None,
            SessionState::Connected { address }
            | SessionState::Initializing { address }
            | SessionState::Ready { address } => Some(address),
        }
    }

    pub fn phase(&self) -> SessionPhase {
        match self {
            SessionState::Disconnected => SessionPhase::Disconnected,
            SessionState::Connected { .. } => SessionPhase::Connected,
            SessionState::Initializing { .. } => SessionPhase::Initializing,
            SessionState::Ready { .. } => SessionPhase::Ready,
        }
    }

    pub fn is_connected(&self) -> bool {
        !matches!(self, SessionState::Disconnected)
    }

    pub fn is_ready(&self) -> bool {
        matches!(self, SessionState::Ready { .. })
    }
}
