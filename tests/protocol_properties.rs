use bb84_sim::protocols::qkd::parties::{BasisAnnouncement, encode};
use bb84_sim::protocols::qkd::secret::{reduce, reveal_sample};
use bb84_sim::{
    Basis, DensityMatrixSource, ExposureMask, Receiver, Sender, SessionConfig, SharedSecret,
    errors::ProtocolError, protocols::qkd::bb84,
};
use proptest::prelude::*;
use rand::SeedableRng;
use rand::rngs::StdRng;

fn basis_strategy() -> impl Strategy<Value = Basis> {
    prop_oneof![Just(Basis::Rectilinear), Just(Basis::Diagonal)]
}

fn keyed_bases(max: usize) -> impl Strategy<Value = (Vec<bool>, Vec<Basis>, Vec<Basis>)> {
    (1..max).prop_flat_map(|n| {
        (
            prop::collection::vec(any::<bool>(), n),
            prop::collection::vec(basis_strategy(), n),
            prop::collection::vec(basis_strategy(), n),
        )
    })
}

proptest! {
    #[test]
    fn sender_sequences_match_requested_length(n in 1usize..200, seed in any::<u64>()) {
        let mut rng = StdRng::seed_from_u64(seed);
        let alice = Sender::new(n, &mut rng);
        prop_assert_eq!(alice.key().len(), n);
        prop_assert_eq!(alice.bases().len(), n);
    }

    #[test]
    fn identical_bases_recover_key(n in 1usize..64, seed in any::<u64>()) {
        let mut rng = StdRng::seed_from_u64(seed);
        let mut source = DensityMatrixSource::new(StdRng::seed_from_u64(seed ^ 0x5eed));
        let alice = Sender::new(n, &mut rng);
        let mut bob = Receiver::with_bases(alice.bases().to_vec());

        let message = alice.encode_message(&mut source).unwrap();
        let raw = bob.receive_message(&mut source, message).unwrap();
        prop_assert_eq!(raw, alice.key());
    }

    #[test]
    fn reduced_width_counts_matching_bases((key, own, foreign) in keyed_bases(96)) {
        let matches = own.iter().zip(&foreign).filter(|(a, b)| a == b).count();
        match reduce(&key, &own, &foreign) {
            Ok(secret) => prop_assert_eq!(secret.width(), matches),
            Err(ProtocolError::EmptyReduction) => prop_assert_eq!(matches, 0),
            Err(other) => prop_assert!(false, "unexpected error {other}"),
        }
    }

    #[test]
    fn exposure_sets_mask_bits_and_is_idempotent(
        bits in prop::collection::vec(any::<bool>(), 1..96),
        sample in 0usize..10,
        seed in any::<u64>(),
    ) {
        let secret = SharedSecret::from_bits(&bits).unwrap();
        let mut rng = StdRng::seed_from_u64(seed);
        match ExposureMask::random(sample, secret.width(), &mut rng) {
            Ok(mask) => {
                prop_assert_eq!(mask.positions().len(), sample);
                let (_, once) = reveal_sample(&secret, &mask);
                let (_, twice) = reveal_sample(&once, &mask);
                prop_assert_eq!(&(once.value() & mask.value()), mask.value());
                prop_assert_eq!(once, twice);
            }
            Err(err) => {
                prop_assert!(sample > secret.width());
                let is_exceeds = matches!(err, ProtocolError::SampleExceedsSecret { .. });
                prop_assert!(is_exceeds);
            }
        }
    }

    #[test]
    fn honest_sessions_always_agree(seed in any::<u64>()) {
        let config = SessionConfig::new().with_seed(seed);
        match bb84::run(config) {
            Ok(report) => {
                prop_assert!(report.established());
                prop_assert_eq!(&report.sender_sample, &report.receiver_sample);
                prop_assert_eq!(report.errors, 0);
            }
            Err(err) => {
                let is_short = matches!(
                    err,
                    ProtocolError::EmptyReduction | ProtocolError::SampleExceedsSecret { .. }
                );
                prop_assert!(is_short);
            }
        }
    }
}

#[test]
fn encoding_follows_bb84_table() {
    use bb84_sim::Preparation::*;
    let preps = encode(
        &[false, true, false, true],
        &[
            Basis::Rectilinear,
            Basis::Rectilinear,
            Basis::Diagonal,
            Basis::Diagonal,
        ],
    )
    .unwrap();
    assert_eq!(preps, vec![Identity, BitFlip, Rotation, BitFlipThenRotation]);
}

#[test]
fn sample_equal_to_width_covers_whole_secret() {
    let mut rng = StdRng::seed_from_u64(8);
    let secret = SharedSecret::from_bits(&[false, true, false]).unwrap();
    let mask = ExposureMask::random(3, 3, &mut rng).unwrap();
    let (sample, spent) = reveal_sample(&secret, &mask);
    assert_eq!(&sample, secret.value());
    assert_eq!(spent.to_bits(), vec![true, true, true]);
}

#[test]
fn parties_exchange_bases_through_announcements() {
    let mut rng = StdRng::seed_from_u64(21);
    let mut source = DensityMatrixSource::new(StdRng::seed_from_u64(22));
    let mut alice = Sender::new(16, &mut rng);
    let mut bob = Receiver::new(16, &mut rng);

    let message = alice.encode_message(&mut source).unwrap();
    bob.receive_message(&mut source, message).unwrap();

    let BasisAnnouncement(published) = alice.publish_bases();
    assert_eq!(published, alice.bases());

    let from_bob = bob.publish_bases();
    let from_alice = alice.publish_bases();
    let a = alice.receive_bases(&from_bob).unwrap().clone();
    let b = bob.receive_bases(&from_alice).unwrap().clone();
    assert_eq!(a, b);
}
