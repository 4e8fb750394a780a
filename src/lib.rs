mod config;
mod core;
pub mod protocols;
mod sampler;
pub mod source;

pub use crate::config::{DEFAULT_NUM_QUBITS, DEFAULT_SAMPLE_SIZE, NoiseModel, SessionConfig};
pub use crate::core::{
    Gate, Measurement, MeasurementResult, QuantumChannel, QuantumState, errors, utils,
};
pub use crate::protocols::qkd::basis::Basis;
pub use crate::protocols::qkd::bb84::SessionReport;
pub use crate::protocols::qkd::parties::{Interceptor, Receiver, Sender};
pub use crate::protocols::qkd::secret::{ExposureMask, SharedSecret};
pub use crate::protocols::qkd::session::{Outcome, Phase, Session};
pub use crate::sampler::{TrialSampler, TrialStats};
pub use crate::source::{DensityMatrixSource, Preparation, QubitSource, Readout};
