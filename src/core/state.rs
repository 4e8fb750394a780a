use crate::core::channels::QuantumChannel;
use crate::core::errors::{ChannelError, MeasurementError, StateError};
use crate::core::gates::Gate;
use crate::core::measurements::{Measurement, MeasurementResult};
use crate::core::utils::{dagger, find_duplicate, trace};
use ndarray::Array2;
use num_complex::Complex64;
use rand::Rng;

/// Mixed state of a small qubit register, stored as its density matrix.
#[derive(Clone, Debug)]
pub struct QuantumState {
    pub density_matrix: Array2<Complex64>,
    pub num_qubits: usize,
}

impl QuantumState {
    /// Creates a new quantum state initialized to |0...0>.
    pub fn new(num_qubits: usize) -> Self {
        let dim = 1 << num_qubits;
        let mut density_matrix = Array2::<Complex64>::zeros((dim, dim));
        density_matrix[[0, 0]] = Complex64::new(1.0, 0.0);

        Self {
            density_matrix,
            num_qubits,
        }
    }

    /// Checks the validity of a density matrix
    fn check_density_matrix(matrix: &Array2<Complex64>) -> Result<(), StateError> {
        let (rows, cols) = matrix.dim();

        if rows != cols {
            return Err(StateError::DimensionMismatch {
                expected: rows,
                got_rows: rows,
                got_cols: cols,
            });
        }
        if !rows.is_power_of_two() {
            return Err(StateError::InvalidDimensions);
        }

        let tr = trace(matrix);
        if (tr - Complex64::new(1.0, 0.0)).norm() > 1e-9 {
            return Err(StateError::InvalidTrace(tr));
        }

        Ok(())
    }

    /// Checks if a QuantumState is valid.
    pub fn is_valid(&self) -> Result<(), StateError> {
        Self::check_density_matrix(&self.density_matrix)
    }

    /// rho -> U rho U†, with U already expanded to the whole register
    fn apply_operator(&mut self, u: &Array2<Complex64>) -> Result<(), StateError> {
        let (rows, cols) = u.dim();
        let dim = 1 << self.num_qubits;

        if rows != dim || cols != dim {
            return Err(StateError::DimensionMismatch {
                expected: dim,
                got_rows: rows,
                got_cols: cols,
            });
        }

        self.density_matrix = u.dot(&self.density_matrix).dot(&dagger(u));

        Ok(())
    }

    fn validate_qubit_index(&self, index: usize) -> Result<(), StateError> {
        if index >= self.num_qubits {
            return Err(StateError::IndexOutOfBounds {
                index,
                num_qubits: self.num_qubits,
            });
        }
        Ok(())
    }

    /// Applies a gate to `target_qubits`.
    pub fn apply(&mut self, gate: &Gate, target_qubits: &[usize]) -> Result<(), StateError> {
        if gate.num_qubits != target_qubits.len() {
            return Err(StateError::DimensionMismatch {
                expected: gate.num_qubits,
                got_rows: target_qubits.len(),
                got_cols: 0,
            });
        }

        for &q in target_qubits {
            self.validate_qubit_index(q)?;
        }

        let full_gate = Gate::expand_gate(self.num_qubits, gate, target_qubits)?;

        self.apply_operator(&full_gate.matrix)
    }

    /// Returns the probability of each outcome together with the operators
    /// expanded to the whole register.
    pub fn set_measurement(
        &self,
        measurement: &Measurement,
        target_qubits: &[usize],
    ) -> Result<(Vec<f64>, Vec<Array2<Complex64>>), StateError> {
        for &q in target_qubits {
            self.validate_qubit_index(q)?;
        }

        if let Some(dup) = find_duplicate(target_qubits) {
            return Err(StateError::MeasurementError(
                MeasurementError::DuplicateQubit(dup),
            ));
        }

        let expanded_ops = measurement.get_expanded_operators(self.num_qubits, target_qubits)?;

        let mut probs = Vec::with_capacity(expanded_ops.len());
        let mut sum_probs = 0.0;

        for op in &expanded_ops {
            let unnormalized = op.dot(&self.density_matrix).dot(&dagger(op));
            let p_k = trace(&unnormalized).re.max(0.0);

            probs.push(p_k);
            sum_probs += p_k;
        }

        // Float drift, renormalize so the outcome distribution sums to 1
        for p in &mut probs {
            *p /= sum_probs;
        }

        Ok((probs, expanded_ops))
    }

    /// Picks an outcome index weighted by `probs`
    fn pick_outcome<R: Rng>(probs: &[f64], rng: &mut R) -> usize {
        let roll: f64 = rng.random();

        let mut cumulative = 0.0;
        for (i, &p) in probs.iter().enumerate() {
            cumulative += p;
            if roll < cumulative {
                return i;
            }
        }
        probs.len().saturating_sub(1)
    }

    /// Physical measurement, collapses the state irretrievably.
    pub fn measure<R: Rng>(
        &mut self,
        measurement: &Measurement,
        target_qubits: &[usize],
        rng: &mut R,
    ) -> Result<MeasurementResult, StateError> {
        let (probs, ops) = self.set_measurement(measurement, target_qubits)?;

        let outcome_idx = Self::pick_outcome(&probs, rng);
        let p_selected = probs[outcome_idx];

        if p_selected <= 1e-12 {
            return Err(StateError::InvalidTrace(Complex64::new(0.0, 0.0)));
        }

        // rho' = (M_k rho M_k†) / p_k
        let m_k = &ops[outcome_idx];
        let numerator = m_k.dot(&self.density_matrix).dot(&dagger(m_k));
        self.density_matrix = numerator.mapv(|val| val / Complex64::new(p_selected, 0.0));

        Ok(MeasurementResult {
            index: outcome_idx,
            value: measurement.values[outcome_idx],
        })
    }

    /// Sends the register through `channel` on `target_qubits`.
    pub fn apply_channel(
        &mut self,
        channel: &QuantumChannel,
        target_qubits: &[usize],
    ) -> Result<(), StateError> {
        if let Some(dup) = find_duplicate(target_qubits) {
            return Err(StateError::ChannelError(ChannelError::DuplicateQubit(dup)));
        }

        let ops = channel.get_expanded_operators(self.num_qubits, target_qubits)?;

        let dim = self.density_matrix.nrows();
        let mut new_rho = Array2::<Complex64>::zeros((dim, dim));

        for k in ops {
            new_rho = new_rho + k.dot(&self.density_matrix).dot(&dagger(&k));
        }

        self.density_matrix = new_rho;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    #[test]
    fn fresh_state_is_ground_state() {
        let state = QuantumState::new(1);
        assert!(state.is_valid().is_ok());
        assert_eq!(state.density_matrix[[0, 0]], Complex64::new(1.0, 0.0));
    }

    #[test]
    fn flipped_state_always_measures_one() {
        let mut rng = StdRng::seed_from_u64(7);
        for _ in 0..20 {
            let mut state = QuantumState::new(1);
            state.apply(&Gate::x(), &[0]).unwrap();
            let res = state.measure(&Measurement::z_basis(), &[0], &mut rng).unwrap();
            assert!(res.value);
        }
    }

    #[test]
    fn plus_state_has_even_outcome_probabilities() {
        let mut state = QuantumState::new(1);
        state.apply(&Gate::h(), &[0]).unwrap();
        let (probs, _) = state.set_measurement(&Measurement::z_basis(), &[0]).unwrap();
        assert!((probs[0] - 0.5).abs() < 1e-9);
        assert!((probs[1] - 0.5).abs() < 1e-9);
    }

    #[test]
    fn measurement_collapses_superposition() {
        let mut rng = StdRng::seed_from_u64(11);
        let mut state = QuantumState::new(1);
        state.apply(&Gate::h(), &[0]).unwrap();
        let first = state.measure(&Measurement::z_basis(), &[0], &mut rng).unwrap();
        for _ in 0..10 {
            let again = state.measure(&Measurement::z_basis(), &[0], &mut rng).unwrap();
            assert_eq!(again.value, first.value);
        }
        assert!(state.is_valid().is_ok());
    }

    #[test]
    fn full_bit_flip_channel_flips_ground_state() {
        let mut rng = StdRng::seed_from_u64(3);
        let mut state = QuantumState::new(1);
        state
            .apply_channel(&QuantumChannel::bit_flip(1.0).unwrap(), &[0])
            .unwrap();
        let res = state.measure(&Measurement::z_basis(), &[0], &mut rng).unwrap();
        assert!(res.value);
    }

    #[test]
    fn out_of_range_target_is_rejected() {
        let mut state = QuantumState::new(1);
        let err = state.apply(&Gate::x(), &[1]).unwrap_err();
        assert!(matches!(err, StateError::IndexOutOfBounds { index: 1, .. }));
    }
}
