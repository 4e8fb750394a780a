//! Encoding bases and the BB84 encoding table.

use crate::source::{Preparation, Readout};
use rand::Rng;
use std::fmt;

/// Measurement/encoding frame of one qubit slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Basis {
    /// Z basis, {|0>, |1>}.
    Rectilinear,
    /// X basis, {|+>, |->}.
    Diagonal,
}

impl Basis {
    /// Uniformly random basis.
    pub fn random<R: Rng>(rng: &mut R) -> Self {
        if rng.random_bool(0.5) {
            Basis::Diagonal
        } else {
            Basis::Rectilinear
        }
    }

    /// Encoding table: (basis, bit) -> preparation.
    pub fn preparation(self, bit: bool) -> Preparation {
        match (self, bit) {
            (Basis::Rectilinear, false) => Preparation::Identity,
            (Basis::Rectilinear, true) => Preparation::BitFlip,
            (Basis::Diagonal, false) => Preparation::Rotation,
            (Basis::Diagonal, true) => Preparation::BitFlipThenRotation,
        }
    }

    pub fn readout(self) -> Readout {
        match self {
            Basis::Rectilinear => Readout::Direct,
            Basis::Diagonal => Readout::Rotated,
        }
    }
}

impl fmt::Display for Basis {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Basis::Rectilinear => write!(f, "Z"),
            Basis::Diagonal => write!(f, "X"),
        }
    }
}

/// `n` independent uniformly random bases.
pub fn random_bases<R: Rng>(n: usize, rng: &mut R) -> Vec<Basis> {
    (0..n).map(|_| Basis::random(rng)).collect()
}

/// `n` independent uniformly random bits.
pub fn random_bits<R: Rng>(n: usize, rng: &mut R) -> Vec<bool> {
    (0..n).map(|_| rng.random_bool(0.5)).collect()
}

/// Renders bits as `[0, 1, ...]`.
pub fn format_bits(bits: &[bool]) -> String {
    let body: Vec<&str> = bits.iter().map(|&b| if b { "1" } else { "0" }).collect();
    format!("[{}]", body.join(", "))
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    #[test]
    fn encoding_table_is_exact() {
        assert_eq!(Basis::Rectilinear.preparation(false), Preparation::Identity);
        assert_eq!(Basis::Rectilinear.preparation(true), Preparation::BitFlip);
        assert_eq!(Basis::Diagonal.preparation(false), Preparation::Rotation);
        assert_eq!(
            Basis::Diagonal.preparation(true),
            Preparation::BitFlipThenRotation
        );
    }

    #[test]
    fn readout_follows_basis() {
        assert_eq!(Basis::Rectilinear.readout(), Readout::Direct);
        assert_eq!(Basis::Diagonal.readout(), Readout::Rotated);
    }

    #[test]
    fn random_sequences_have_requested_length_and_both_values() {
        let mut rng = StdRng::seed_from_u64(5);
        let bases = random_bases(200, &mut rng);
        let bits = random_bits(200, &mut rng);
        assert_eq!(bases.len(), 200);
        assert_eq!(bits.len(), 200);
        assert!(bases.contains(&Basis::Rectilinear) && bases.contains(&Basis::Diagonal));
        assert!(bits.contains(&true) && bits.contains(&false));
    }

    #[test]
    fn bits_render_as_list() {
        assert_eq!(format_bits(&[true, false, true]), "[1, 0, 1]");
        assert_eq!(format_bits(&[]), "[]");
    }
}
