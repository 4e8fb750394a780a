//! Quantum Cryptography Protocols.
//!
//! Currently the BB84 key distribution protocol with an intercept-resend
//! eavesdropper and exposure-sampling detection.

pub mod qkd;
pub use qkd::{bb84, session};
