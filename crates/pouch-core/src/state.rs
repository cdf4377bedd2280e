//! Persisted authentication state
//!
//! `AuthState` is the only long-lived record: it survives process restarts
//! through [`StateStore`](crate::store::StateStore) and is the sole channel
//! between invocations. The process owns it exclusively for the duration of
//! one command; there is no file locking (see the store docs).

use serde::{Deserialize, Serialize};
use zeroize::{Zeroize, ZeroizeOnDrop};

use crate::error::{Error, Requirement, Result};
use crate::otp;

/// Authentication record persisted between invocations.
///
/// `counter` and `activation_secret` together are the sole input to OTP
/// derivation; `session_id` and `bearer_token` together define "has an
/// active session".
#[derive(Debug, Clone, Default, Serialize, Deserialize, Zeroize, ZeroizeOnDrop)]
pub struct AuthState {
    /// Opaque user identifier (phone number). Set once, at first logon.
    pub identity: Option<String>,

    /// Activation secret as delivered out-of-band (base64 text; decoded
    /// only at derivation time).
    pub activation_secret: Option<String>,

    /// Monotonic OTP nonce. Strictly increasing for the lifetime of one
    /// activation secret; reset to zero only when a new secret is installed.
    pub counter: u64,

    /// Session token from the last successful logon round trip.
    pub session_id: Option<String>,

    /// Bearer credential attached to authenticated requests.
    pub bearer_token: Option<String>,
}

impl AuthState {
    pub fn has_identity(&self) -> bool {
        self.identity.is_some()
    }

    pub fn has_activation_secret(&self) -> bool {
        self.activation_secret.is_some()
    }

    /// Both session artifacts must be present for authenticated requests.
    pub fn has_session(&self) -> bool {
        self.session_id.is_some() && self.bearer_token.is_some()
    }

    /// Install a new activation secret.
    ///
    /// Clears any prior session artifacts and resets the counter: the nonce
    /// sequence is scoped to one secret.
    pub fn install_secret(&mut self, code: &str) {
        self.activation_secret = Some(code.to_string());
        self.session_id = None;
        self.bearer_token = None;
        self.counter = 0;
    }

    /// Derive the next one-time password and advance the counter.
    ///
    /// The increment happens before returning, so a counter value can never
    /// be handed out twice even if the caller aborts afterwards.
    pub fn next_otp(&mut self) -> Result<String> {
        let secret = self
            .activation_secret
            .as_deref()
            .ok_or(Error::Precondition(Requirement::ActivationSecret))?;
        let code = otp::derive_otp(secret, self.counter)?;
        self.counter += 1;
        Ok(code)
    }

    /// Record the session artifacts of a successful logon.
    pub fn record_session(&mut self, session_id: String, bearer_token: String) {
        self.session_id = Some(session_id);
        self.bearer_token = Some(bearer_token);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{Error, Requirement};

    const SECRET: &str = "AAAAAAAAAAAAAAAA";

    #[test]
    fn test_default_state_is_empty() {
        let state = AuthState::default();
        assert!(!state.has_identity());
        assert!(!state.has_activation_secret());
        assert!(!state.has_session());
        assert_eq!(state.counter, 0);
    }

    #[test]
    fn test_next_otp_increments_counter_exactly_once() {
        let mut state = AuthState::default();
        state.install_secret(SECRET);

        let first = state.next_otp().unwrap();
        assert_eq!(state.counter, 1);
        let second = state.next_otp().unwrap();
        assert_eq!(state.counter, 2);
        // No counter reuse: consecutive derivations differ
        assert_ne!(first, second);
    }

    #[test]
    fn test_next_otp_without_secret_is_precondition_error() {
        let mut state = AuthState::default();
        let err = state.next_otp().unwrap_err();
        assert!(matches!(
            err,
            Error::Precondition(Requirement::ActivationSecret)
        ));
        assert_eq!(state.counter, 0);
    }

    #[test]
    fn test_install_secret_resets_counter_and_session() {
        let mut state = AuthState {
            identity: Some("0600000000".into()),
            activation_secret: Some(SECRET.into()),
            counter: 17,
            session_id: Some("S0".into()),
            bearer_token: Some("T0".into()),
        };

        state.install_secret("AAECAwQFBgcICQoLDA0ODw==");

        assert_eq!(state.counter, 0);
        assert!(state.session_id.is_none());
        assert!(state.bearer_token.is_none());
        // Identity survives a re-activation
        assert_eq!(state.identity.as_deref(), Some("0600000000"));
    }

    #[test]
    fn test_session_requires_both_artifacts() {
        let mut state = AuthState::default();
        state.session_id = Some("S1".into());
        assert!(!state.has_session());
        state.bearer_token = Some("T1".into());
        assert!(state.has_session());
    }
}
