//! BB84 session state machine.
//!
//! `Initialized -> Encoded -> (Intercepted) -> Measured -> Reduced -> Sampled -> Terminal`
//!
//! Each step may only be taken from its predecessor; anything else is an
//! [`ProtocolError::InvalidTransition`].

use crate::config::SessionConfig;
use crate::errors::ProtocolError;
use crate::protocols::qkd::bb84::{self, SessionReport};
use crate::protocols::qkd::parties::{Interceptor, Receiver, SampleAnnouncement, Sender};
use crate::protocols::qkd::secret::{ExposureMask, SharedSecret};
use crate::source::{DensityMatrixSource, QubitSource};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tracing::{debug, info, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Initialized,
    Encoded,
    Intercepted,
    Measured,
    Reduced,
    Sampled,
    Terminal,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    SecretEstablished,
    InterceptionDetected,
}

/// One run of the protocol between a Sender, a Receiver and an optional
/// Interceptor sharing a qubit source.
pub struct Session<S: QubitSource, R> {
    config: SessionConfig,
    rng: R,
    source: S,
    sender: Sender,
    receiver: Receiver,
    interceptor: Option<Interceptor>,
    message: Option<Vec<S::Qubit>>,
    reconciled: Option<(SharedSecret, SharedSecret)>,
    mask: Option<ExposureMask>,
    announcements: Option<(SampleAnnouncement, SampleAnnouncement)>,
    outcome: Option<Outcome>,
    phase: Phase,
}

impl Session<DensityMatrixSource<StdRng>, StdRng> {
    /// Session over the density-matrix backend, seeded from `config.seed`
    /// or from the OS when absent.
    pub fn from_config(config: SessionConfig) -> Result<Self, ProtocolError> {
        let rng = match config.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_os_rng(),
        };
        Self::with_rng(config, rng)
    }

    /// Session over the density-matrix backend drawing all randomness from `rng`.
    pub fn with_rng(config: SessionConfig, mut rng: StdRng) -> Result<Self, ProtocolError> {
        let mut source = DensityMatrixSource::new(StdRng::from_rng(&mut rng));
        if let Some(noise) = &config.noise {
            source = source.with_channel(noise.channel()?);
        }
        Session::new(config, source, rng)
    }
}

impl<S: QubitSource, R: Rng> Session<S, R> {
    /// Validates `config` and constructs the parties.
    pub fn new(config: SessionConfig, source: S, mut rng: R) -> Result<Self, ProtocolError> {
        config.validate()?;

        let n = config.num_qubits;
        let sender = Sender::new(n, &mut rng);
        let receiver = Receiver::new(n, &mut rng);
        let interceptor = config.intercept.then(|| Interceptor::new(n, &mut rng));

        info!(
            qubits = n,
            sample_size = config.sample_size,
            intercept = config.intercept,
            "session initialized"
        );

        Ok(Self {
            config,
            rng,
            source,
            sender,
            receiver,
            interceptor,
            message: None,
            reconciled: None,
            mask: None,
            announcements: None,
            outcome: None,
            phase: Phase::Initialized,
        })
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    pub fn sender(&self) -> &Sender {
        &self.sender
    }

    pub fn receiver(&self) -> &Receiver {
        &self.receiver
    }

    pub fn interceptor(&self) -> Option<&Interceptor> {
        self.interceptor.as_ref()
    }

    pub fn outcome(&self) -> Option<Outcome> {
        self.outcome
    }

    fn advance(&mut self, from: &[Phase], to: Phase) -> Result<(), ProtocolError> {
        if !from.contains(&self.phase) {
            return Err(ProtocolError::InvalidTransition {
                from: self.phase,
                to,
            });
        }
        debug!(from = ?self.phase, ?to, "session transition");
        self.phase = to;
        Ok(())
    }

    /// Sender prepares the message and puts it on the line.
    pub fn encode(&mut self) -> Result<(), ProtocolError> {
        self.advance(&[Phase::Initialized], Phase::Encoded)?;
        self.message = Some(self.sender.encode_message(&mut self.source)?);
        Ok(())
    }

    /// Interceptor measures the message in transit.
    pub fn intercept(&mut self) -> Result<(), ProtocolError> {
        if self.interceptor.is_none() {
            return Err(ProtocolError::InvalidTransition {
                from: self.phase,
                to: Phase::Intercepted,
            });
        }
        self.advance(&[Phase::Encoded], Phase::Intercepted)?;
        if let (Some(eve), Some(message)) = (self.interceptor.as_mut(), self.message.as_mut()) {
            eve.intercept_message(&mut self.source, message)?;
        }
        Ok(())
    }

    /// Receiver measures the (possibly intercepted) message.
    pub fn measure(&mut self) -> Result<(), ProtocolError> {
        let from = if self.interceptor.is_some() {
            Phase::Intercepted
        } else {
            Phase::Encoded
        };
        self.advance(&[from], Phase::Measured)?;
        let message = self.message.take().unwrap_or_default();
        self.receiver.receive_message(&mut self.source, message)?;
        Ok(())
    }

    /// Both parties swap bases and reduce their keys.
    pub fn reconcile(&mut self) -> Result<(), ProtocolError> {
        self.advance(&[Phase::Measured], Phase::Reduced)?;

        let to_receiver = self.sender.publish_bases();
        let to_sender = self.receiver.publish_bases();

        let receiver_secret = self.receiver.receive_bases(&to_receiver)?.clone();
        let sender_secret = self.sender.receive_bases(&to_sender)?.clone();
        debug!(width = receiver_secret.width(), "common secret computed");

        self.reconciled = Some((sender_secret, receiver_secret));
        Ok(())
    }

    /// Both parties disclose the bits under one shared exposure mask.
    pub fn sample(&mut self) -> Result<(), ProtocolError> {
        self.advance(&[Phase::Reduced], Phase::Sampled)?;

        let width = self
            .receiver
            .secret()
            .map(SharedSecret::width)
            .ok_or(ProtocolError::NotReconciled)?;
        let mask = ExposureMask::random(self.config.sample_size, width, &mut self.rng)?;

        let from_sender = self.sender.publish_sample(&mask)?;
        let from_receiver = self.receiver.publish_sample(&mask)?;
        self.mask = Some(mask);
        self.announcements = Some((from_sender, from_receiver));
        Ok(())
    }

    /// Each party checks the other's disclosed sample against its own.
    pub fn conclude(&mut self) -> Result<Outcome, ProtocolError> {
        self.advance(&[Phase::Sampled], Phase::Terminal)?;

        let (from_sender, from_receiver) =
            self.announcements.as_ref().ok_or(ProtocolError::NotReconciled)?;
        let agreed = self.sender.receive_sample(from_receiver)?
            && self.receiver.receive_sample(from_sender)?;

        let outcome = if agreed {
            info!("no interception detected, common secret established");
            Outcome::SecretEstablished
        } else {
            warn!("sample mismatch, interception detected");
            Outcome::InterceptionDetected
        };
        self.outcome = Some(outcome);
        Ok(outcome)
    }

    /// Drives every remaining step and returns the report.
    pub fn run(mut self) -> Result<SessionReport, ProtocolError> {
        self.encode()?;
        if self.interceptor.is_some() {
            self.intercept()?;
        }
        self.measure()?;
        self.reconcile()?;
        self.sample()?;
        self.conclude()?;
        self.into_report()
    }

    /// Report of a session that reached `Terminal`.
    pub fn into_report(self) -> Result<SessionReport, ProtocolError> {
        let incomplete = ProtocolError::InvalidTransition {
            from: self.phase,
            to: Phase::Terminal,
        };
        let (
            Some(outcome),
            Some(mask),
            Some((sender_reduced, receiver_reduced)),
            Some((SampleAnnouncement(sender_sample), SampleAnnouncement(receiver_sample))),
        ) = (self.outcome, self.mask, self.reconciled, self.announcements)
        else {
            return Err(incomplete);
        };
        let (Some(receiver_key), Some(sender_secret), Some(receiver_secret)) = (
            self.receiver.key(),
            self.sender.secret(),
            self.receiver.secret(),
        ) else {
            return Err(incomplete);
        };

        let errors = bb84::count_errors(&sender_reduced, &receiver_reduced);
        let interceptor_correct = self.interceptor.as_ref().and_then(|eve| {
            eve.key().map(|eve_key| {
                bb84::sifted_agreement(
                    self.sender.key(),
                    eve_key,
                    self.sender.bases(),
                    self.receiver.bases(),
                )
            })
        });

        Ok(SessionReport {
            outcome,
            raw_length: self.config.num_qubits,
            sifted_length: receiver_reduced.width(),
            errors,
            qber: bb84::qber(errors, receiver_reduced.width()),
            sender_key: self.sender.key().to_vec(),
            sender_bases: self.sender.bases().to_vec(),
            receiver_key: receiver_key.to_vec(),
            receiver_bases: self.receiver.bases().to_vec(),
            interceptor_key: self
                .interceptor
                .as_ref()
                .and_then(|eve| eve.key().map(<[bool]>::to_vec)),
            interceptor_correct,
            sender_secret: sender_secret.clone(),
            receiver_secret: receiver_secret.clone(),
            sender_sample,
            receiver_sample,
            mask,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn seeded(config: SessionConfig) -> Session<DensityMatrixSource<StdRng>, StdRng> {
        Session::with_rng(config, StdRng::seed_from_u64(77)).unwrap()
    }

    #[test]
    fn phases_advance_in_order() {
        let mut session = seeded(SessionConfig::new());
        assert_eq!(session.phase(), Phase::Initialized);
        session.encode().unwrap();
        assert_eq!(session.phase(), Phase::Encoded);
        session.measure().unwrap();
        assert_eq!(session.phase(), Phase::Measured);
        session.reconcile().unwrap();
        assert_eq!(session.phase(), Phase::Reduced);
        session.sample().unwrap();
        assert_eq!(session.phase(), Phase::Sampled);
        assert_eq!(session.conclude().unwrap(), Outcome::SecretEstablished);
        assert_eq!(session.phase(), Phase::Terminal);
    }

    #[test]
    fn out_of_order_steps_are_rejected() {
        let mut session = seeded(SessionConfig::new());
        let err = session.reconcile().unwrap_err();
        assert!(matches!(
            err,
            ProtocolError::InvalidTransition {
                from: Phase::Initialized,
                to: Phase::Reduced
            }
        ));
        session.encode().unwrap();
        assert!(session.encode().is_err());
        assert!(session.conclude().is_err());
    }

    #[test]
    fn intercept_requires_configured_interceptor() {
        let mut session = seeded(SessionConfig::new());
        session.encode().unwrap();
        let err = session.intercept().unwrap_err();
        assert!(matches!(
            err,
            ProtocolError::InvalidTransition {
                to: Phase::Intercepted,
                ..
            }
        ));
    }

    #[test]
    fn intercepted_session_must_pass_through_interception() {
        let mut session = seeded(SessionConfig::new().with_intercept(true));
        session.encode().unwrap();
        assert!(session.measure().is_err());
        session.intercept().unwrap();
        session.measure().unwrap();
        assert!(session.interceptor().and_then(Interceptor::key).is_some());
    }

    #[test]
    fn report_requires_terminal_phase() {
        let mut session = seeded(SessionConfig::new());
        session.encode().unwrap();
        assert!(session.into_report().is_err());
    }

    #[test]
    fn zero_qubits_fails_before_any_phase() {
        let err = Session::with_rng(
            SessionConfig::new().with_num_qubits(0),
            StdRng::seed_from_u64(1),
        )
        .err()
        .unwrap();
        assert!(matches!(err, ProtocolError::ZeroQubits));
    }

    #[test]
    fn oversized_sample_aborts_at_sampling() {
        let mut session = seeded(SessionConfig::new().with_num_qubits(4).with_sample_size(5));
        session.encode().unwrap();
        session.measure().unwrap();
        match session.reconcile() {
            Ok(()) => assert!(matches!(
                session.sample(),
                Err(ProtocolError::SampleExceedsSecret { sample_size: 5, .. })
            )),
            Err(err) => assert!(matches!(err, ProtocolError::EmptyReduction)),
        }
    }
}
