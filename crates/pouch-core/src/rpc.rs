//! Typed remote operations and the transport seam
//!
//! Each named server operation has its own request structure with a fixed
//! field list; the transport only ever sees a finished [`RpcCall`]. The
//! actual HTTP layer lives in the CLI crate behind the [`Transport`] trait.

use async_trait::async_trait;

use crate::error::{Error, Requirement, Result};
use crate::state::AuthState;

/// Common wire constants attached to every request.
pub const MODEL: &str = "A";
pub const FORMAT: &str = "T";
pub const CHANNEL: &str = "AIZ";
pub const PROTOCOL_VERSION: &str = "6.0";
pub const CLIENT_TYPE: &str = "PART";

/// A fixed-point amount, canonically rendered with two decimals.
///
/// Backed by integer cents so that the string fed into the payment
/// signature and the string sent on the wire are identical by construction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Amount {
    cents: u64,
}

impl Amount {
    pub fn from_cents(cents: u64) -> Self {
        Self { cents }
    }

    pub fn cents(&self) -> u64 {
        self.cents
    }

    /// Parse a decimal string such as `"12"`, `"12.5"` or `"12.50"`.
    /// More than two decimal places is rejected rather than rounded.
    pub fn parse(text: &str) -> Result<Self> {
        let invalid = || Error::Amount(text.to_string());
        let (whole, frac) = match text.split_once('.') {
            Some((w, f)) => (w, f),
            None => (text, ""),
        };
        if whole.is_empty() || frac.len() > 2 {
            return Err(invalid());
        }
        let units: u64 = whole.parse().map_err(|_| invalid())?;
        let cents = match frac.len() {
            0 => 0,
            n => {
                let f: u64 = frac.parse().map_err(|_| invalid())?;
                if n == 1 {
                    f * 10
                } else {
                    f
                }
            }
        };
        units
            .checked_mul(100)
            .and_then(|c| c.checked_add(cents))
            .map(Amount::from_cents)
            .ok_or_else(invalid)
    }
}

impl std::fmt::Display for Amount {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}.{:02}", self.cents / 100, self.cents % 100)
    }
}

impl std::str::FromStr for Amount {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Amount::parse(s)
    }
}

/// A named remote operation with its operation-specific parameters.
pub trait RemoteOp {
    const NAME: &'static str;

    fn params(&self) -> Vec<(&'static str, String)>;
}

/// `Logon` serves all three login phases; which optional fields are present
/// distinguishes them (see the protocol module).
pub struct LogonRequest {
    pub user: String,
    pub password: String,
    pub pass_otp: Option<String>,
}

impl RemoteOp for LogonRequest {
    const NAME: &'static str = "Logon";

    fn params(&self) -> Vec<(&'static str, String)> {
        let mut params = vec![
            ("user", self.user.clone()),
            ("password", self.password.clone()),
        ];
        if let Some(pass_otp) = &self.pass_otp {
            params.push(("passOTP", pass_otp.clone()));
        }
        params.extend([
            ("smoneyClientType", CLIENT_TYPE.to_string()),
            ("rooted", "0".to_string()),
            ("model", MODEL.to_string()),
            ("format", FORMAT.to_string()),
            ("channel", CHANNEL.to_string()),
        ]);
        params
    }
}

/// `MoneyInCbCbList` — registered payment cards.
pub struct CardListRequest;

impl RemoteOp for CardListRequest {
    const NAME: &'static str = "MoneyInCbCbList";

    fn params(&self) -> Vec<(&'static str, String)> {
        Vec::new()
    }
}

/// `GetStatement` — transaction history.
pub struct StatementRequest {
    pub filter: i32,
    pub nb_items: u32,
    pub first_id: i64,
}

impl Default for StatementRequest {
    /// The full, unfiltered history.
    fn default() -> Self {
        Self {
            filter: -1,
            nb_items: 0,
            first_id: -1,
        }
    }
}

impl RemoteOp for StatementRequest {
    const NAME: &'static str = "GetStatement";

    fn params(&self) -> Vec<(&'static str, String)> {
        vec![
            ("filter", self.filter.to_string()),
            ("nbItems", self.nb_items.to_string()),
            ("firstId", self.first_id.to_string()),
        ]
    }
}

/// `MoneyInCb` — initiate a reload from a registered card.
pub struct ReloadRequest {
    pub card_id: String,
    pub amount: Amount,
}

impl RemoteOp for ReloadRequest {
    const NAME: &'static str = "MoneyInCb";

    fn params(&self) -> Vec<(&'static str, String)> {
        vec![
            ("amount", self.amount.to_string()),
            ("cardId", self.card_id.clone()),
        ]
    }
}

/// `MoneyInCbConfirm` — confirm a pending reload with a payment signature.
pub struct ReloadConfirmRequest {
    pub card_id: String,
    pub amount: Amount,
    pub signature: String,
    pub pass_otp: String,
}

impl RemoteOp for ReloadConfirmRequest {
    const NAME: &'static str = "MoneyInCbConfirm";

    fn params(&self) -> Vec<(&'static str, String)> {
        vec![
            ("amount", self.amount.to_string()),
            ("cardId", self.card_id.clone()),
            ("print", self.signature.clone()),
            ("passOTP", self.pass_otp.clone()),
        ]
    }
}

/// A fully assembled request, ready for the transport.
#[derive(Debug, Clone)]
pub struct RpcCall {
    pub operation: &'static str,
    pub params: Vec<(&'static str, String)>,
    pub bearer: Option<String>,
}

impl RpcCall {
    /// An unauthenticated call (logon phases): only the operation's own
    /// parameters, no bearer token.
    pub fn new<O: RemoteOp>(op: &O) -> Self {
        Self {
            operation: O::NAME,
            params: op.params(),
            bearer: None,
        }
    }

    /// An authenticated call: appends the common identity, version and
    /// session fields from the recovered state and attaches the bearer
    /// token. Fails before any traffic if the session is incomplete.
    pub fn authenticated<O: RemoteOp>(op: &O, state: &AuthState) -> Result<Self> {
        let identity = state
            .identity
            .as_ref()
            .ok_or(Error::Precondition(Requirement::Identity))?;
        let (session_id, bearer) = match (&state.session_id, &state.bearer_token) {
            (Some(sid), Some(token)) => (sid, token),
            _ => return Err(Error::Precondition(Requirement::ActiveSession)),
        };

        let mut params = op.params();
        params.extend([
            ("userId", identity.clone()),
            ("model", MODEL.to_string()),
            ("format", FORMAT.to_string()),
            ("channel", CHANNEL.to_string()),
            ("version", PROTOCOL_VERSION.to_string()),
            ("sessionId", session_id.clone()),
        ]);
        Ok(Self {
            operation: O::NAME,
            params,
            bearer: Some(bearer.clone()),
        })
    }

    pub fn param(&self, name: &str) -> Option<&str> {
        self.params
            .iter()
            .find(|(k, _)| *k == name)
            .map(|(_, v)| v.as_str())
    }
}

/// The opaque request/response collaborator. One blocking round trip per
/// call; no retries, no timeouts beyond the implementation's own.
#[async_trait]
pub trait Transport: Send + Sync {
    /// Perform the call and return the raw response body.
    async fn call(&self, call: &RpcCall) -> Result<String>;
}
