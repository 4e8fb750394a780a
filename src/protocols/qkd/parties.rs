//! The three BB84 roles.
//!
//! Sender and Receiver only learn about each other through
//! [`BasisAnnouncement`] and [`SampleAnnouncement`] messages on the classical
//! channel. The Interceptor touches the qubits and nothing else.

use crate::errors::ProtocolError;
use crate::protocols::qkd::basis::{Basis, random_bases, random_bits};
use crate::protocols::qkd::secret::{ExposureMask, SharedSecret, reduce, reveal_sample};
use crate::source::{Preparation, QubitSource};
use num_bigint::BigUint;
use rand::Rng;
use tracing::debug;

/// Basis sequence published on the classical channel.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BasisAnnouncement(pub Vec<Basis>);

/// Disclosed sample (`secret & mask`) published on the classical channel.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SampleAnnouncement(pub BigUint);

/// Maps each key bit to its preparation in the matching basis.
pub fn encode(key: &[bool], bases: &[Basis]) -> Result<Vec<Preparation>, ProtocolError> {
    if key.len() != bases.len() {
        return Err(ProtocolError::LengthMismatch {
            expected: key.len(),
            got: bases.len(),
        });
    }
    Ok(key
        .iter()
        .zip(bases)
        .map(|(&bit, basis)| basis.preparation(bit))
        .collect())
}

/// Measures every qubit in place, one basis per slot.
pub fn measure<S: QubitSource>(
    source: &mut S,
    qubits: &mut [S::Qubit],
    bases: &[Basis],
) -> Result<Vec<bool>, ProtocolError> {
    if qubits.len() != bases.len() {
        return Err(ProtocolError::LengthMismatch {
            expected: bases.len(),
            got: qubits.len(),
        });
    }

    let mut bits = Vec::with_capacity(qubits.len());
    for (qubit, basis) in qubits.iter_mut().zip(bases) {
        bits.push(source.measure(qubit, basis.readout())?);
    }
    Ok(bits)
}

/// Classical post-processing state of a legitimate party.
#[derive(Debug, Clone, Default)]
pub struct Exchange {
    secret: Option<SharedSecret>,
    sample: Option<BigUint>,
}

impl Exchange {
    fn reconcile(
        &mut self,
        key: &[bool],
        bases: &[Basis],
        foreign: &BasisAnnouncement,
    ) -> Result<&SharedSecret, ProtocolError> {
        let secret = reduce(key, bases, &foreign.0)?;
        Ok(&*self.secret.insert(secret))
    }

    fn publish_sample(&mut self, mask: &ExposureMask) -> Result<SampleAnnouncement, ProtocolError> {
        let secret = self.secret.as_ref().ok_or(ProtocolError::NotReconciled)?;
        let (sample, spent) = reveal_sample(secret, mask);
        self.secret = Some(spent);
        self.sample = Some(sample.clone());
        Ok(SampleAnnouncement(sample))
    }

    fn receive_sample(&self, foreign: &SampleAnnouncement) -> Result<bool, ProtocolError> {
        let own = self.sample.as_ref().ok_or(ProtocolError::NotReconciled)?;
        Ok(*own == foreign.0)
    }

    pub fn secret(&self) -> Option<&SharedSecret> {
        self.secret.as_ref()
    }

    pub fn sample(&self) -> Option<&BigUint> {
        self.sample.as_ref()
    }
}

/// Alice. Chooses the key and encodes it.
#[derive(Debug, Clone)]
pub struct Sender {
    key: Vec<bool>,
    bases: Vec<Basis>,
    exchange: Exchange,
}

impl Sender {
    /// Draws an `n`-bit key and `n` bases from `rng`.
    pub fn new<R: Rng>(n: usize, rng: &mut R) -> Self {
        let key = random_bits(n, rng);
        let bases = random_bases(n, rng);
        Self::with_key(key, bases)
    }

    /// Sender with a fixed key and bases.
    pub fn with_key(key: Vec<bool>, bases: Vec<Basis>) -> Self {
        Self {
            key,
            bases,
            exchange: Exchange::default(),
        }
    }

    pub fn key(&self) -> &[bool] {
        &self.key
    }

    pub fn bases(&self) -> &[Basis] {
        &self.bases
    }

    pub fn secret(&self) -> Option<&SharedSecret> {
        self.exchange.secret()
    }

    pub fn exchange(&self) -> &Exchange {
        &self.exchange
    }

    /// Prepares one qubit per key bit and puts it on the line.
    pub fn encode_message<S: QubitSource>(
        &self,
        source: &mut S,
    ) -> Result<Vec<S::Qubit>, ProtocolError> {
        let preparations = encode(&self.key, &self.bases)?;
        let mut message = Vec::with_capacity(preparations.len());
        for preparation in preparations {
            let mut qubit = source.prepare(preparation)?;
            source.transmit(&mut qubit)?;
            message.push(qubit);
        }
        debug!(qubits = message.len(), "message encoded");
        Ok(message)
    }

    pub fn publish_bases(&self) -> BasisAnnouncement {
        BasisAnnouncement(self.bases.clone())
    }

    /// Reduces the key against the Receiver's bases.
    pub fn receive_bases(
        &mut self,
        foreign: &BasisAnnouncement,
    ) -> Result<&SharedSecret, ProtocolError> {
        self.exchange.reconcile(&self.key, &self.bases, foreign)
    }

    pub fn publish_sample(
        &mut self,
        mask: &ExposureMask,
    ) -> Result<SampleAnnouncement, ProtocolError> {
        self.exchange.publish_sample(mask)
    }

    /// True when the Receiver's sample equals ours.
    pub fn receive_sample(&self, foreign: &SampleAnnouncement) -> Result<bool, ProtocolError> {
        self.exchange.receive_sample(foreign)
    }
}

/// Bob. Measures whatever arrives in his own random bases.
#[derive(Debug, Clone)]
pub struct Receiver {
    bases: Vec<Basis>,
    key: Option<Vec<bool>>,
    exchange: Exchange,
}

impl Receiver {
    pub fn new<R: Rng>(n: usize, rng: &mut R) -> Self {
        Self::with_bases(random_bases(n, rng))
    }

    pub fn with_bases(bases: Vec<Basis>) -> Self {
        Self {
            bases,
            key: None,
            exchange: Exchange::default(),
        }
    }

    pub fn bases(&self) -> &[Basis] {
        &self.bases
    }

    /// Raw key, once the message has been measured.
    pub fn key(&self) -> Option<&[bool]> {
        self.key.as_deref()
    }

    pub fn secret(&self) -> Option<&SharedSecret> {
        self.exchange.secret()
    }

    pub fn exchange(&self) -> &Exchange {
        &self.exchange
    }

    /// Consumes the message, measuring each qubit in the Receiver's basis.
    pub fn receive_message<S: QubitSource>(
        &mut self,
        source: &mut S,
        mut message: Vec<S::Qubit>,
    ) -> Result<&[bool], ProtocolError> {
        let bits = measure(source, &mut message, &self.bases)?;
        debug!(bits = bits.len(), "message measured");
        Ok(self.key.insert(bits).as_slice())
    }

    pub fn publish_bases(&self) -> BasisAnnouncement {
        BasisAnnouncement(self.bases.clone())
    }

    pub fn receive_bases(
        &mut self,
        foreign: &BasisAnnouncement,
    ) -> Result<&SharedSecret, ProtocolError> {
        let key = self.key.as_deref().ok_or(ProtocolError::NotMeasured)?;
        self.exchange.reconcile(key, &self.bases, foreign)
    }

    pub fn publish_sample(
        &mut self,
        mask: &ExposureMask,
    ) -> Result<SampleAnnouncement, ProtocolError> {
        self.exchange.publish_sample(mask)
    }

    pub fn receive_sample(&self, foreign: &SampleAnnouncement) -> Result<bool, ProtocolError> {
        self.exchange.receive_sample(foreign)
    }
}

/// Eve. Measures qubits in transit and lets the collapsed states through.
#[derive(Debug, Clone)]
pub struct Interceptor {
    bases: Vec<Basis>,
    key: Option<Vec<bool>>,
}

impl Interceptor {
    pub fn new<R: Rng>(n: usize, rng: &mut R) -> Self {
        Self {
            bases: random_bases(n, rng),
            key: None,
        }
    }

    pub fn bases(&self) -> &[Basis] {
        &self.bases
    }

    pub fn key(&self) -> Option<&[bool]> {
        self.key.as_deref()
    }

    pub fn intercept_message<S: QubitSource>(
        &mut self,
        source: &mut S,
        message: &mut [S::Qubit],
    ) -> Result<&[bool], ProtocolError> {
        let bits = measure(source, message, &self.bases)?;
        debug!(bits = bits.len(), "message intercepted");
        Ok(self.key.insert(bits).as_slice())
    }
}
