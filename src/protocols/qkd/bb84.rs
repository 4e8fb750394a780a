use crate::config::SessionConfig;
use crate::errors::ProtocolError;
use crate::protocols::qkd::basis::Basis;
use crate::protocols::qkd::secret::{ExposureMask, SharedSecret};
use crate::protocols::qkd::session::{Outcome, Session};
use num_bigint::BigUint;

/// BB84 results
#[derive(Debug, Clone)]
pub struct SessionReport {
    pub outcome: Outcome,
    /// Qubits sent.
    pub raw_length: usize,
    /// Width of the reconciled secret.
    pub sifted_length: usize,
    /// Positions where the reconciled secrets disagreed before exposure.
    pub errors: usize,
    /// Quantum bit error rate, in percent.
    pub qber: f64,
    pub sender_key: Vec<bool>,
    pub sender_bases: Vec<Basis>,
    pub receiver_key: Vec<bool>,
    pub receiver_bases: Vec<Basis>,
    pub interceptor_key: Option<Vec<bool>>,
    /// Sifted positions where the Interceptor holds the Sender's bit.
    pub interceptor_correct: Option<usize>,
    /// Final secrets, disclosed bits already forced to 1.
    pub sender_secret: SharedSecret,
    pub receiver_secret: SharedSecret,
    pub sender_sample: BigUint,
    pub receiver_sample: BigUint,
    pub mask: ExposureMask,
}

impl SessionReport {
    pub fn established(&self) -> bool {
        self.outcome == Outcome::SecretEstablished
    }

    pub fn intercepted(&self) -> bool {
        self.interceptor_key.is_some()
    }
}

/// Runs one BB84 session over the density-matrix backend.
pub fn run(config: SessionConfig) -> Result<SessionReport, ProtocolError> {
    Session::from_config(config)?.run()
}

/// Bit positions where two reconciled secrets differ.
pub fn count_errors(a: &SharedSecret, b: &SharedSecret) -> usize {
    a.to_bits()
        .iter()
        .zip(b.to_bits())
        .filter(|(x, y)| **x != *y)
        .count()
}

/// Counts sifted positions (matching legitimate bases) where `other_key`
/// agrees with `sender_key`.
pub fn sifted_agreement(
    sender_key: &[bool],
    other_key: &[bool],
    sender_bases: &[Basis],
    receiver_bases: &[Basis],
) -> usize {
    sender_key
        .iter()
        .zip(other_key)
        .zip(sender_bases.iter().zip(receiver_bases))
        .filter(|((s, o), (sb, rb))| sb == rb && s == o)
        .count()
}

pub fn qber(errors: usize, sifted_len: usize) -> f64 {
    if sifted_len > 0 {
        (errors as f64 / sifted_len as f64) * 100.0
    } else {
        0.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn errors_count_differing_positions() {
        let a = SharedSecret::from_bits(&[true, false, true, false]).unwrap();
        let b = SharedSecret::from_bits(&[true, true, true, true]).unwrap();
        assert_eq!(count_errors(&a, &b), 2);
        assert_eq!(count_errors(&a, &a), 0);
    }

    #[test]
    fn qber_is_percentage_of_sifted_bits() {
        assert_eq!(qber(0, 0), 0.0);
        assert_eq!(qber(1, 4), 25.0);
    }

    #[test]
    fn agreement_only_counts_sifted_positions() {
        use Basis::{Diagonal as X, Rectilinear as Z};
        let alice = [true, true, false, false];
        let eve = [true, false, false, true];
        let alice_bases = [Z, Z, X, X];
        let bob_bases = [Z, X, X, Z];
        // Sifted: 0 and 2, Eve agrees on both
        assert_eq!(sifted_agreement(&alice, &eve, &alice_bases, &bob_bases), 2);
    }

    #[test]
    fn seeded_honest_run_establishes_secret() {
        let report = run(SessionConfig::new().with_seed(2024)).unwrap();
        assert!(report.established());
        assert!(!report.intercepted());
        assert_eq!(report.errors, 0);
        assert_eq!(report.sender_secret, report.receiver_secret);
        assert_eq!(report.raw_length, 48);
        assert_eq!(report.sender_key.len(), 48);
    }
}
