//! Basis reconciliation and exposure sampling.
//!
//! A reconciled secret is the big-endian integer spelled by the key bits
//! kept at matching-basis positions. Exposure publishes `secret & mask` and
//! then folds the mask into the secret (`secret | mask`): revealed
//! positions stay in the key as constant ones.

use crate::errors::ProtocolError;
use crate::protocols::qkd::basis::Basis;
use num_bigint::BigUint;
use num_traits::Zero;
use rand::Rng;
use rand::seq::SliceRandom;
use std::fmt;

/// Reconciled key material held by one party.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SharedSecret {
    value: BigUint,
    /// Number of reconciled bits, leading zeros included.
    width: usize,
}

impl SharedSecret {
    /// Builds a secret from bits in transmission order, first bit most significant.
    ///
    /// # Errors
    ///
    /// `ProtocolError::EmptyReduction` if `bits` is empty.
    pub fn from_bits(bits: &[bool]) -> Result<Self, ProtocolError> {
        if bits.is_empty() {
            return Err(ProtocolError::EmptyReduction);
        }

        let width = bits.len();
        let mut value = BigUint::zero();
        for (i, &bit) in bits.iter().enumerate() {
            if bit {
                value.set_bit((width - 1 - i) as u64, true);
            }
        }

        Ok(Self { value, width })
    }

    pub fn value(&self) -> &BigUint {
        &self.value
    }

    pub fn width(&self) -> usize {
        self.width
    }

    /// Bits in transmission order, exactly `width` long.
    pub fn to_bits(&self) -> Vec<bool> {
        (0..self.width)
            .rev()
            .map(|pos| self.value.bit(pos as u64))
            .collect()
    }
}

impl fmt::Display for SharedSecret {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.value)
    }
}

/// Keeps `own_key[i]` wherever `own_bases[i] == foreign_bases[i]`.
///
/// # Errors
///
/// - `ProtocolError::LengthMismatch` if the three sequences differ in length.
/// - `ProtocolError::EmptyReduction` if no basis matched.
pub fn reduce(
    own_key: &[bool],
    own_bases: &[Basis],
    foreign_bases: &[Basis],
) -> Result<SharedSecret, ProtocolError> {
    let expected = own_key.len();
    for got in [own_bases.len(), foreign_bases.len()] {
        if got != expected {
            return Err(ProtocolError::LengthMismatch { expected, got });
        }
    }

    let kept: Vec<bool> = own_key
        .iter()
        .zip(own_bases.iter().zip(foreign_bases))
        .filter(|(_, (b1, b2))| b1 == b2)
        .map(|(&k, _)| k)
        .collect();

    SharedSecret::from_bits(&kept)
}

/// Random selection of secret bit positions to be disclosed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExposureMask {
    value: BigUint,
    sample_size: usize,
}

impl ExposureMask {
    /// Sets exactly `sample_size` of the low `width` bits at random.
    ///
    /// # Errors
    ///
    /// `ProtocolError::SampleExceedsSecret` if `sample_size > width`.
    pub fn random<R: Rng>(
        sample_size: usize,
        width: usize,
        rng: &mut R,
    ) -> Result<Self, ProtocolError> {
        if sample_size > width {
            return Err(ProtocolError::SampleExceedsSecret { sample_size, width });
        }

        let mut slots = vec![true; sample_size];
        slots.resize(width, false);
        slots.shuffle(rng);

        let mut value = BigUint::zero();
        for (pos, _) in slots.iter().enumerate().filter(|(_, set)| **set) {
            value.set_bit(pos as u64, true);
        }

        Ok(Self { value, sample_size })
    }

    pub fn value(&self) -> &BigUint {
        &self.value
    }

    pub fn sample_size(&self) -> usize {
        self.sample_size
    }

    /// Set bit positions, least significant first.
    pub fn positions(&self) -> Vec<u64> {
        (0..self.value.bits()).filter(|&p| self.value.bit(p)).collect()
    }
}

/// Discloses `secret & mask` and returns it with the spent secret `secret | mask`.
pub fn reveal_sample(secret: &SharedSecret, mask: &ExposureMask) -> (BigUint, SharedSecret) {
    let sample = secret.value() & mask.value();
    let spent = SharedSecret {
        value: secret.value() | mask.value(),
        width: secret.width,
    };
    (sample, spent)
}
