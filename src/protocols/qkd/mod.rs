//! BB84 Quantum Key Distribution.
//!
//! - **basis**: encoding bases and the encoding table.
//! - **parties**: Sender, Receiver and Interceptor, and the classical messages they exchange.
//! - **secret**: basis reconciliation and exposure sampling.
//! - **session**: the protocol state machine.
//! - **bb84**: session reports and a one-call entry point.

pub mod basis;
pub mod bb84;
pub mod parties;
pub mod secret;
pub mod session;
