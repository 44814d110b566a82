//! Property-based tests for channel invariants.
//!
//! Channels are drawn from seeded generators so every failure is
//! reproducible from the reported seed.

use proptest::prelude::*;
use qif_channel::Channel;
use rand::rngs::StdRng;
use rand::SeedableRng;

const TOL: f64 = 1e-9;

/// Strategy for a random channel with dimensions in `1..=max_dim`.
fn channel(max_dim: usize) -> impl Strategy<Value = Channel> {
    (1..=max_dim, 1..=max_dim, any::<u64>()).prop_map(|(n_in, n_out, seed)| {
        Channel::random(n_in, n_out, &mut StdRng::seed_from_u64(seed)).unwrap()
    })
}

/// Strategy for three cascade-compatible channels.
fn cascade_triple() -> impl Strategy<Value = (Channel, Channel, Channel)> {
    (1..6usize, 1..6usize, 1..6usize, 1..6usize, any::<u64>()).prop_map(|(a, b, c, d, seed)| {
        let mut rng = StdRng::seed_from_u64(seed);
        (
            Channel::random(a, b, &mut rng).unwrap(),
            Channel::random(b, c, &mut rng).unwrap(),
            Channel::random(c, d, &mut rng).unwrap(),
        )
    })
}

proptest! {
    /// Property: every random channel is row-stochastic with a normalized prior.
    #[test]
    fn prop_random_channels_are_stochastic(c in channel(8)) {
        for row in c.c_matrix() {
            prop_assert!((row.iter().sum::<f64>() - 1.0).abs() < TOL);
        }
        prop_assert!((c.prior().iter().sum::<f64>() - 1.0).abs() < TOL);
        prop_assert!((c.joint().iter().flatten().sum::<f64>() - 1.0).abs() < TOL);
    }

    /// Property: the output distribution is the column sum of the joint, and
    /// every observable column of the hyper matrix is a distribution.
    #[test]
    fn prop_derived_state_is_consistent(c in channel(8)) {
        for j in 0..c.n_out() {
            let col: f64 = c.joint().iter().map(|row| row[j]).sum();
            prop_assert!((col - c.out_distribution()[j]).abs() < TOL);
            if c.out_distribution()[j] > 0.0 {
                let hyper: f64 = c.hyper_matrix().iter().map(|row| row[j]).sum();
                prop_assert!((hyper - 1.0).abs() < TOL);
            }
        }
    }

    /// Property: 0 ≤ I(X;Y) ≤ min(H(X), H(Y)), and both formulas agree.
    #[test]
    fn prop_mutual_information_bounds(c in channel(8)) {
        let mi = c.mutual_information();
        prop_assert!(mi >= -TOL);
        prop_assert!(mi <= c.shannon_entropy_prior().min(c.shannon_entropy_out()) + TOL);
        let alt = c.shannon_entropy_out() - c.conditional_entropy();
        prop_assert!((mi - alt).abs() < 1e-8);
    }

    /// Property: decode(encode(c)) preserves the channel within 1e-8.
    #[test]
    fn prop_text_round_trip(c in channel(6)) {
        let back = Channel::from_text(&c.to_text()).unwrap();
        prop_assert_eq!(back.n_in(), c.n_in());
        prop_assert_eq!(back.n_out(), c.n_out());
        prop_assert_eq!(back.in_names(), c.in_names());
        prop_assert_eq!(back.out_names(), c.out_names());
        prop_assert_eq!(back.base_norm(), c.base_norm());
        for (r1, r2) in c.c_matrix().iter().zip(back.c_matrix()) {
            for (a, b) in r1.iter().zip(r2) {
                prop_assert!((a - b).abs() < 1e-8);
            }
        }
        for (a, b) in c.prior().iter().zip(back.prior()) {
            prop_assert!((a - b).abs() < 1e-8);
        }
    }

    /// Property: (c1 · c2) · c3 = c1 · (c2 · c3).
    #[test]
    fn prop_cascade_associative((c1, c2, c3) in cascade_triple()) {
        let left = c1.cascade(&c2).unwrap().cascade(&c3).unwrap();
        let right = c1.cascade(&c2.cascade(&c3).unwrap()).unwrap();
        for (r1, r2) in left.c_matrix().iter().zip(right.c_matrix()) {
            for (a, b) in r1.iter().zip(r2) {
                prop_assert!((a - b).abs() < TOL);
            }
        }
    }

    /// Property: parallel composition multiplies output counts and keeps inputs.
    #[test]
    fn prop_parallel_dimensions(n_in in 1..6usize, a in 1..6usize, b in 1..6usize, seed in any::<u64>()) {
        let mut rng = StdRng::seed_from_u64(seed);
        let c1 = Channel::random(n_in, a, &mut rng).unwrap();
        let c2 = Channel::random(n_in, b, &mut rng).unwrap();
        let c3 = c1.parallel(&c2).unwrap();
        prop_assert_eq!(c3.n_out(), a * b);
        prop_assert_eq!(c3.in_names(), c1.in_names());
        for row in c3.c_matrix() {
            prop_assert!((row.iter().sum::<f64>() - 1.0).abs() < TOL);
        }
    }

    /// Property: hidden choice of compatible channels is stochastic for any p.
    #[test]
    fn prop_hidden_choice_stochastic(n_in in 1..6usize, a in 1..6usize, b in 1..6usize, p in 0.0..=1.0f64, seed in any::<u64>()) {
        let mut rng = StdRng::seed_from_u64(seed);
        let c1 = Channel::random(n_in, a, &mut rng).unwrap();
        let c2 = Channel::random(n_in, b, &mut rng).unwrap();
        let h = Channel::hidden_choice(&c1, &c2, p).unwrap();
        prop_assert_eq!(h.n_out(), a.max(b));
        for row in h.c_matrix() {
            prop_assert!((row.iter().sum::<f64>() - 1.0).abs() < TOL);
        }
    }
}
