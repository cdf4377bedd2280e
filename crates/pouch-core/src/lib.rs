//! Pouch Core - Authentication state machine and typed RPC surface
//!
//! This crate provides everything below the command line for the Pouch
//! wallet client: OTP and payment-signature derivation, the persisted
//! authentication state and its store, the multi-phase login protocol, and
//! the capability gate consulted before each command. The HTTP transport is
//! an external collaborator behind the [`rpc::Transport`] trait.

pub mod envelope;
pub mod error;
pub mod gate;
pub mod otp;
pub mod protocol;
pub mod rpc;
pub mod state;
pub mod store;

pub use envelope::{Envelope, Node};
pub use error::{Error, Requirement, Result};
pub use gate::{Capability, CommandGate, CommandKind};
pub use protocol::AuthProtocol;
pub use rpc::{Amount, RpcCall, Transport};
pub use state::AuthState;
pub use store::StateStore;
