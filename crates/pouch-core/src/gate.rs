//! Capability gating in front of every command
//!
//! Each user-facing command declares which recovered state it needs before
//! it may run. The table below is consulted as a pure lookup; the gate only
//! checks presence, never freshness — an expired session is discovered by
//! the server at request time.

use crate::error::{Error, Requirement, Result};
use crate::state::AuthState;
use crate::store::StateStore;

/// A capability a command may require.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Capability {
    /// The persisted state must hold an activation secret.
    ActivationSecret,
    /// The persisted state must hold both session artifacts.
    ActiveSession,
    /// The command talks to the server; the transport must be established
    /// before dispatch.
    Network,
}

/// Every user-facing command, with its capability requirements.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommandKind {
    Status,
    Login,
    Activation,
    Relogin,
    Statement,
    CardList,
    Reload,
    ConfirmReload,
}

impl CommandKind {
    /// The capability-requirement table. The activation command's
    /// identity precondition is not a capability; the protocol checks it.
    pub fn requirements(&self) -> &'static [Capability] {
        use Capability::*;
        match self {
            CommandKind::Status => &[],
            CommandKind::Login => &[Network],
            CommandKind::Activation => &[Network],
            CommandKind::Relogin => &[ActivationSecret, Network],
            CommandKind::Statement => &[ActiveSession, Network],
            CommandKind::CardList => &[ActiveSession, Network],
            CommandKind::Reload => &[ActiveSession, Network],
            CommandKind::ConfirmReload => &[ActivationSecret, ActiveSession, Network],
        }
    }

    pub fn needs_network(&self) -> bool {
        self.requirements().contains(&Capability::Network)
    }
}

/// Loads the state, validates a command's requirements against it, and
/// persists the result once the command body has succeeded.
pub struct CommandGate {
    store: StateStore,
}

impl CommandGate {
    pub fn new(store: StateStore) -> Self {
        Self { store }
    }

    pub fn store(&self) -> &StateStore {
        &self.store
    }

    /// Load the persisted state and verify every declared capability,
    /// failing with a precondition error before any network traffic.
    pub fn prepare(&self, kind: CommandKind) -> Result<AuthState> {
        let state = self.store.load();
        for capability in kind.requirements() {
            match capability {
                Capability::ActivationSecret if !state.has_activation_secret() => {
                    return Err(Error::Precondition(Requirement::ActivationSecret));
                }
                Capability::ActiveSession if !state.has_session() => {
                    return Err(Error::Precondition(Requirement::ActiveSession));
                }
                // Network is a dispatch concern; the caller establishes the
                // transport when it is declared.
                _ => {}
            }
        }
        Ok(state)
    }

    /// Persist the possibly mutated state. Called exactly once, after the
    /// command body returned successfully.
    pub fn commit(&self, state: &AuthState) -> Result<()> {
        self.store.save(state)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn gate_with_state(state: Option<&AuthState>) -> (tempfile::TempDir, CommandGate) {
        let dir = tempfile::tempdir().unwrap();
        let store = StateStore::new(dir.path().join("authstate.json"));
        if let Some(state) = state {
            store.save(state).unwrap();
        }
        (dir, CommandGate::new(store))
    }

    #[test]
    fn test_status_and_login_pass_on_empty_state() {
        let (_dir, gate) = gate_with_state(None);
        assert!(gate.prepare(CommandKind::Status).is_ok());
        assert!(gate.prepare(CommandKind::Login).is_ok());
        assert!(gate.prepare(CommandKind::Activation).is_ok());
    }

    #[test]
    fn test_session_commands_rejected_without_session() {
        let (_dir, gate) = gate_with_state(None);
        for kind in [
            CommandKind::Statement,
            CommandKind::CardList,
            CommandKind::Reload,
            CommandKind::ConfirmReload,
        ] {
            let err = gate.prepare(kind).unwrap_err();
            assert!(
                matches!(err, Error::Precondition(_)),
                "{kind:?} should be gated"
            );
        }
    }

    #[test]
    fn test_relogin_rejected_without_secret() {
        let (_dir, gate) = gate_with_state(None);
        let err = gate.prepare(CommandKind::Relogin).unwrap_err();
        assert!(matches!(
            err,
            Error::Precondition(Requirement::ActivationSecret)
        ));
    }

    #[test]
    fn test_full_state_passes_everything() {
        let state = AuthState {
            identity: Some("0600000000".into()),
            activation_secret: Some("AAAAAAAAAAAAAAAA".into()),
            counter: 2,
            session_id: Some("S1".into()),
            bearer_token: Some("T1".into()),
        };
        let (_dir, gate) = gate_with_state(Some(&state));
        for kind in [
            CommandKind::Status,
            CommandKind::Relogin,
            CommandKind::Statement,
            CommandKind::CardList,
            CommandKind::Reload,
            CommandKind::ConfirmReload,
        ] {
            assert!(gate.prepare(kind).is_ok(), "{kind:?} should pass");
        }
    }

    #[test]
    fn test_needs_network_table() {
        assert!(!CommandKind::Status.needs_network());
        assert!(CommandKind::Login.needs_network());
        assert!(CommandKind::ConfirmReload.needs_network());
    }

    #[test]
    fn test_commit_round_trips_through_store() {
        let (_dir, gate) = gate_with_state(None);
        let mut state = gate.prepare(CommandKind::Status).unwrap();
        state.identity = Some("0600000000".into());
        state.counter = 5;
        gate.commit(&state).unwrap();

        let reloaded = gate.prepare(CommandKind::Status).unwrap();
        assert_eq!(reloaded.identity.as_deref(), Some("0600000000"));
        assert_eq!(reloaded.counter, 5);
    }
}
