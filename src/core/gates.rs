use crate::core::errors::GateError;
use crate::core::utils;
use ndarray::{Array2, arr2};
use num_complex::Complex64;

/// Represents a quantum gate.
///
/// A gate is defined by its unitary matrix and the number of qubits it acts on.
#[derive(Clone, Debug)]
pub struct Gate {
    /// The unitary matrix of the gate.
    pub matrix: Array2<Complex64>,
    /// The number of qubits the gate acts on.
    pub num_qubits: usize,
}

impl Gate {
    /// Creates a new `Gate` from a unitary matrix.
    ///
    /// # Errors
    ///
    /// Returns a `GateError` if:
    /// - The matrix is not square.
    /// - The matrix dimensions are not a power of 2.
    /// - The matrix is not unitary.
    pub fn new(matrix: Array2<Complex64>) -> Result<Self, GateError> {
        let (rows, cols) = matrix.dim();

        if rows != cols {
            return Err(GateError::NotSquareMatrix);
        }

        if !rows.is_power_of_two() {
            return Err(GateError::InvalidDimensions);
        }

        if !Self::check_unitary(&matrix) {
            return Err(GateError::NonUnitary);
        }

        let num_qubits = rows.trailing_zeros() as usize;

        Ok(Self { matrix, num_qubits })
    }

    /// Checks if a given matrix is unitary
    fn check_unitary(matrix: &Array2<Complex64>) -> bool {
        let (rows, _) = matrix.dim();
        let eye = Array2::<Complex64>::eye(rows);

        let product = matrix.dot(&utils::dagger(matrix));

        product
            .iter()
            .zip(eye.iter())
            .all(|(a, b)| (*a - *b).norm() < 1e-6)
    }

    /// Expands a gate to act on `num_total_qubits`, applying it to `targets`
    /// and Identity on the rest.
    ///
    /// # Errors
    ///
    /// Returns `GateError::DuplicateQubit` if a target index repeats.
    pub fn expand_gate(
        num_total_qubits: usize,
        gate: &Gate,
        targets: &[usize],
    ) -> Result<Gate, GateError> {
        if let Some(dup) = utils::find_duplicate(targets) {
            return Err(GateError::DuplicateQubit(dup));
        }

        Ok(Gate {
            matrix: utils::expand_operator(num_total_qubits, &gate.matrix, targets),
            num_qubits: num_total_qubits,
        })
    }

    /// Single-qubit gate from a known-unitary constant matrix.
    fn single(matrix: Array2<Complex64>) -> Gate {
        Gate {
            matrix,
            num_qubits: 1,
        }
    }

    // --- Standard Gates ---

    /// Creates an Identity gate.
    pub fn i() -> Gate {
        Gate::single(arr2(&[
            [Complex64::new(1.0, 0.0), Complex64::new(0.0, 0.0)],
            [Complex64::new(0.0, 0.0), Complex64::new(1.0, 0.0)],
        ]))
    }

    /// Creates a Pauli-X gate (NOT gate). Used as the bit-flip preparation.
    pub fn x() -> Gate {
        Gate::single(arr2(&[
            [Complex64::new(0.0, 0.0), Complex64::new(1.0, 0.0)],
            [Complex64::new(1.0, 0.0), Complex64::new(0.0, 0.0)],
        ]))
    }

    /// Creates a Hadamard gate. Rotates between the rectilinear and diagonal bases.
    pub fn h() -> Gate {
        let factor = 1.0 / 2.0_f64.sqrt();
        Gate::single(arr2(&[
            [Complex64::new(factor, 0.0), Complex64::new(factor, 0.0)],
            [Complex64::new(factor, 0.0), Complex64::new(-factor, 0.0)],
        ]))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn standard_gates_pass_unitary_validation() {
        for gate in [Gate::i(), Gate::x(), Gate::h()] {
            let checked = Gate::new(gate.matrix.clone()).unwrap();
            assert_eq!(checked.num_qubits, 1);
        }
    }

    #[test]
    fn non_unitary_matrix_is_rejected() {
        let m = arr2(&[
            [Complex64::new(1.0, 0.0), Complex64::new(1.0, 0.0)],
            [Complex64::new(0.0, 0.0), Complex64::new(1.0, 0.0)],
        ]);
        assert!(matches!(Gate::new(m), Err(GateError::NonUnitary)));
    }

    #[test]
    fn non_square_matrix_is_rejected() {
        let m = Array2::<Complex64>::zeros((2, 4));
        assert!(matches!(Gate::new(m), Err(GateError::NotSquareMatrix)));
    }

    #[test]
    fn hadamard_is_self_inverse() {
        let h = Gate::h();
        let hh = h.matrix.dot(&h.matrix);
        let eye = Array2::<Complex64>::eye(2);
        assert!(hh.iter().zip(eye.iter()).all(|(a, b)| (a - b).norm() < 1e-12));
    }

    #[test]
    fn expand_rejects_duplicate_targets() {
        let err = Gate::expand_gate(2, &Gate::x(), &[1, 1]).unwrap_err();
        assert!(matches!(err, GateError::DuplicateQubit(1)));
    }
}
