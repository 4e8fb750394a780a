//! Qubit sources.
//!
//! A [`QubitSource`] is the only quantum collaborator of the protocol: it
//! prepares single-qubit states, carries them across the (possibly noisy)
//! line and measures them. Protocol code never touches amplitudes directly,
//! so any backend honoring this contract can drive a session.

use crate::{Gate, Measurement, QuantumChannel, QuantumState, errors::StateError};
use rand::Rng;
use tracing::trace;

/// How a classical bit is written onto a fresh |0> qubit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Preparation {
    /// |0>
    Identity,
    /// X|0> = |1>
    BitFlip,
    /// H|0> = |+>
    Rotation,
    /// H X|0> = |->
    BitFlipThenRotation,
}

impl Preparation {
    /// Gates applied to |0>, in order.
    pub fn gates(self) -> Vec<Gate> {
        match self {
            Preparation::Identity => vec![],
            Preparation::BitFlip => vec![Gate::x()],
            Preparation::Rotation => vec![Gate::h()],
            Preparation::BitFlipThenRotation => vec![Gate::x(), Gate::h()],
        }
    }
}

/// How a qubit is read out.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Readout {
    /// Projective measurement in the computational basis.
    Direct,
    /// Rotate with H, measure, rotate back. The qubit is left collapsed onto
    /// |+> or |->.
    Rotated,
}

/// Single-qubit preparation and measurement primitives.
pub trait QubitSource {
    /// One qubit slot in flight.
    type Qubit;

    /// Prepares a fresh qubit.
    fn prepare(&mut self, preparation: Preparation) -> Result<Self::Qubit, StateError>;

    /// Carries a qubit across the quantum line between two parties.
    fn transmit(&mut self, qubit: &mut Self::Qubit) -> Result<(), StateError>;

    /// Measures a qubit in place and returns the observed bit.
    ///
    /// Measurement is destructive: the qubit stays collapsed onto the
    /// observed eigenstate of the chosen readout.
    fn measure(&mut self, qubit: &mut Self::Qubit, readout: Readout) -> Result<bool, StateError>;
}

/// Qubit source backed by the crate's density-matrix simulator.
#[derive(Debug, Clone)]
pub struct DensityMatrixSource<R> {
    rng: R,
    channel: Option<QuantumChannel>,
    measurement: Measurement,
}

impl<R: Rng> DensityMatrixSource<R> {
    /// Creates a noise-free source drawing measurement outcomes from `rng`.
    pub fn new(rng: R) -> Self {
        Self {
            rng,
            channel: None,
            measurement: Measurement::z_basis(),
        }
    }

    /// Applies `channel` to every qubit on transmission.
    pub fn with_channel(mut self, channel: QuantumChannel) -> Self {
        self.channel = Some(channel);
        self
    }
}

impl<R: Rng> QubitSource for DensityMatrixSource<R> {
    type Qubit = QuantumState;

    fn prepare(&mut self, preparation: Preparation) -> Result<QuantumState, StateError> {
        let mut state = QuantumState::new(1);
        for gate in preparation.gates() {
            state.apply(&gate, &[0])?;
        }
        Ok(state)
    }

    fn transmit(&mut self, qubit: &mut QuantumState) -> Result<(), StateError> {
        if let Some(chan) = &self.channel {
            qubit.apply_channel(chan, &[0])?;
        }
        Ok(())
    }

    fn measure(&mut self, qubit: &mut QuantumState, readout: Readout) -> Result<bool, StateError> {
        let rotated = readout == Readout::Rotated;
        if rotated {
            qubit.apply(&Gate::h(), &[0])?;
        }

        let result = qubit.measure(&self.measurement, &[0], &mut self.rng)?;

        if rotated {
            qubit.apply(&Gate::h(), &[0])?;
        }

        trace!(?readout, bit = result.value, "qubit measured");
        Ok(result.value)
    }
}
