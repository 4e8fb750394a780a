use crate::QuantumChannel;
use crate::errors::{ChannelError, ProtocolError};

/// Qubits sent per session unless configured otherwise.
pub const DEFAULT_NUM_QUBITS: usize = 48;

/// Reconciled bits disclosed for the interception check.
pub const DEFAULT_SAMPLE_SIZE: usize = 5;

/// Noise on the quantum line between Sender and Receiver.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum NoiseModel {
    BitFlip(f64),
    PhaseFlip(f64),
    Depolarizing(f64),
}

impl NoiseModel {
    pub fn channel(&self) -> Result<QuantumChannel, ChannelError> {
        match *self {
            NoiseModel::BitFlip(p) => QuantumChannel::bit_flip(p),
            NoiseModel::PhaseFlip(p) => QuantumChannel::phase_flip(p),
            NoiseModel::Depolarizing(p) => QuantumChannel::depolarizing(p),
        }
    }
}

/// Configuration of one key distribution session.
#[derive(Debug, Clone, PartialEq)]
pub struct SessionConfig {
    /// Qubit slots sent by the Sender
    pub num_qubits: usize,

    /// Reconciled bits disclosed during exposure sampling
    pub sample_size: usize,

    /// Whether an Interceptor measures every qubit in transit
    pub intercept: bool,

    /// Random seed for reproducibility
    pub seed: Option<u64>,

    /// Line noise, none by default
    pub noise: Option<NoiseModel>,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            num_qubits: DEFAULT_NUM_QUBITS,
            sample_size: DEFAULT_SAMPLE_SIZE,
            intercept: false,
            seed: None,
            noise: None,
        }
    }
}

impl SessionConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_num_qubits(mut self, num_qubits: usize) -> Self {
        self.num_qubits = num_qubits;
        self
    }

    pub fn with_sample_size(mut self, sample_size: usize) -> Self {
        self.sample_size = sample_size;
        self
    }

    pub fn with_intercept(mut self, intercept: bool) -> Self {
        self.intercept = intercept;
        self
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    pub fn with_noise(mut self, noise: NoiseModel) -> Self {
        self.noise = Some(noise);
        self
    }

    /// Rejects configurations that cannot start a session.
    ///
    /// Whether `sample_size` fits can only be known after reconciliation.
    pub fn validate(&self) -> Result<(), ProtocolError> {
        if self.num_qubits == 0 {
            return Err(ProtocolError::ZeroQubits);
        }
        if let Some(noise) = &self.noise {
            noise.channel()?;
        }
        Ok(())
    }
}
