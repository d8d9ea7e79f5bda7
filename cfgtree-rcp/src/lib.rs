//! The remote config protocol server (§4.E): framing lives in
//! `cfgtree-proto`; this crate owns the per-connection state machine, the
//! push-client registry, and dispatch of every action.

pub mod connection;
pub mod dispatch;
pub mod push;
pub mod server;

pub use dispatch::{dispatch, DispatchOutcome};
pub use push::PushRegistry;
pub use server::RcpServer;
