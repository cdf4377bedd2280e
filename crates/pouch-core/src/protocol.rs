//! The authentication protocol state machine
//!
//! Drives the three login phases against the remote collaborator and
//! performs authenticated requests. All methods mutate the in-memory
//! [`AuthState`] only; persistence is the gate's job and happens after the
//! whole operation succeeds, so a failed phase never commits partial state.
//!
//! Phases, in order:
//! 1. credential logon — plaintext password, triggers the out-of-band
//!    delivery of an activation secret, records the identity;
//! 2. activation — installs the secret, spends counter 0 on the first OTP,
//!    yields the first session;
//! 3. re-login — refreshes an expired session with `password + otp` as the
//!    combined credential.

use tracing::debug;

use crate::envelope::Envelope;
use crate::error::{Error, Requirement, Result};
use crate::otp;
use crate::rpc::{
    Amount, CardListRequest, LogonRequest, ReloadConfirmRequest, ReloadRequest, RemoteOp,
    RpcCall, StatementRequest, Transport,
};
use crate::state::AuthState;

/// Protocol driver borrowing the transport and the mutable state for the
/// duration of one command.
pub struct AuthProtocol<'a, T: Transport> {
    transport: &'a T,
    state: &'a mut AuthState,
}

impl<'a, T: Transport> AuthProtocol<'a, T> {
    pub fn new(transport: &'a T, state: &'a mut AuthState) -> Self {
        Self { transport, state }
    }

    /// Phase 1: credential logon. Yields no session; its only effect is to
    /// trigger the SMS activation code and record the identity.
    pub async fn credential_logon(&mut self, phone: &str, password: &str) -> Result<Envelope> {
        let envelope = self
            .logon(&LogonRequest {
                user: phone.to_string(),
                password: password.to_string(),
                pass_otp: None,
            })
            .await?;
        // Only record the identity once the server accepted the credentials
        self.state.identity = Some(phone.to_string());
        Ok(envelope)
    }

    /// Phase 2: activation with the out-of-band code.
    ///
    /// Installs the new secret (counter back to zero, session cleared),
    /// spends counter 0 on the first OTP and logs on with it. Requires the
    /// identity recorded by phase 1.
    pub async fn activate(&mut self, code: &str) -> Result<Envelope> {
        let identity = self
            .state
            .identity
            .clone()
            .ok_or(Error::Precondition(Requirement::Identity))?;

        self.state.install_secret(code);
        let otp = self.state.next_otp()?;

        let envelope = self
            .logon(&LogonRequest {
                user: identity,
                password: String::new(),
                pass_otp: Some(otp),
            })
            .await?;
        self.record_session(&envelope)?;
        Ok(envelope)
    }

    /// Re-login: refresh the session with one OTP. The server expects the
    /// plaintext password and the concatenation `password + otp` in the
    /// `passOTP` field.
    pub async fn relogin(&mut self, password: &str) -> Result<Envelope> {
        if !self.state.has_activation_secret() {
            return Err(Error::Precondition(Requirement::ActivationSecret));
        }
        let identity = self
            .state
            .identity
            .clone()
            .ok_or(Error::Precondition(Requirement::Identity))?;

        let otp = self.state.next_otp()?;
        let envelope = self
            .logon(&LogonRequest {
                user: identity,
                password: password.to_string(),
                pass_otp: Some(format!("{password}{otp}")),
            })
            .await?;
        self.record_session(&envelope)?;
        Ok(envelope)
    }

    /// Authenticated request. Requires both session artifacts; an envelope
    /// error is a protocol error (which usually means the session expired —
    /// the remedy is a `relogin`, decided by the user, not retried here).
    pub async fn request<O: RemoteOp>(&mut self, op: &O) -> Result<Envelope> {
        let call = RpcCall::authenticated(op, self.state)?;
        debug!(operation = call.operation, "authenticated request");
        let body = self.transport.call(&call).await?;
        let envelope = Envelope::parse(&body)?;
        if let Some(msg) = envelope.error_message() {
            return Err(Error::Protocol(msg.to_string()));
        }
        Ok(envelope)
    }

    /// List the registered payment cards.
    pub async fn card_list(&mut self) -> Result<Envelope> {
        self.request(&CardListRequest).await
    }

    /// Full transaction history.
    pub async fn statement(&mut self) -> Result<Envelope> {
        self.request(&StatementRequest::default()).await
    }

    /// Initiate a reload from a registered card. Must be followed by
    /// [`confirm_reload`](Self::confirm_reload).
    pub async fn reload(&mut self, card_id: &str, amount: Amount) -> Result<Envelope> {
        self.request(&ReloadRequest {
            card_id: card_id.to_string(),
            amount,
        })
        .await
    }

    /// Confirm a pending reload.
    ///
    /// Spends one OTP; the combined credential `password + otp` both keys
    /// the payment signature and travels in `passOTP`.
    pub async fn confirm_reload(
        &mut self,
        card_id: &str,
        amount: Amount,
        password: &str,
    ) -> Result<Envelope> {
        let identity = self
            .state
            .identity
            .clone()
            .ok_or(Error::Precondition(Requirement::Identity))?;
        let session_id = self
            .state
            .session_id
            .clone()
            .ok_or(Error::Precondition(Requirement::ActiveSession))?;

        let otp = self.state.next_otp()?;
        let pass_otp = format!("{password}{otp}");
        let amount_text = amount.to_string();
        let signature =
            otp::payment_signature(&identity, &session_id, card_id, &amount_text, &pass_otp)?;

        self.request(&ReloadConfirmRequest {
            card_id: card_id.to_string(),
            amount,
            signature,
            pass_otp,
        })
        .await
    }

    /// Send a logon-family request and map envelope errors to logon failures.
    async fn logon(&mut self, request: &LogonRequest) -> Result<Envelope> {
        let call = RpcCall::new(request);
        debug!(operation = call.operation, user = %request.user, "logon request");
        let body = self.transport.call(&call).await?;
        let envelope = Envelope::parse(&body)?;
        if let Some(msg) = envelope.error_message() {
            return Err(Error::Logon(msg.to_string()));
        }
        Ok(envelope)
    }

    /// Store the session artifacts from a successful logon envelope.
    fn record_session(&mut self, envelope: &Envelope) -> Result<()> {
        let session_id = envelope.require("SID")?.to_string();
        let token = envelope.require("ACCESS_TOKEN")?.to_string();
        debug!(session_id = %session_id, "session established");
        self.state.record_session(session_id, token);
        Ok(())
    }
}
