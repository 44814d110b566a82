//! A tour of channel composition and leakage metrics.
//!
//! Run with: cargo run -p qif-channel --example leakage_tour
//!
//! This example demonstrates:
//! - Building channels from matrices and at random
//! - Entropy, mutual information and Bayes vulnerability
//! - Parallel, cascade, hidden and visible choice composition
//! - The text encoding
//!
//! Key insight: leakage of a composed system follows from its parts.

use qif_channel::{Channel, ChannelError};
use rand::rngs::StdRng;
use rand::SeedableRng;

fn report(label: &str, c: &Channel) {
    println!(
        "  {label:<22} H(X)={:.4}  H(X|Y)={:.4}  I={:.4}  V(post)={:.4}",
        c.shannon_entropy_prior(),
        c.conditional_entropy_hyper(),
        c.mutual_information(),
        c.posterior_bayes_vulnerability(),
    );
}

fn main() -> Result<(), ChannelError> {
    println!("=== Channels and Leakage ===\n");

    // -------------------------------------------------------------------------
    // 1. Basic channels
    // -------------------------------------------------------------------------
    println!("1. Basic channels");
    println!("-----------------");

    let identity = Channel::identity(4)?;
    report("identity(4)", &identity);

    let checker = Channel::new(vec![
        vec![1.0, 0.0],
        vec![0.0, 1.0],
        vec![0.0, 1.0],
        vec![0.0, 1.0],
    ])?
    .with_name("checker")?;
    report("password checker", &checker);

    let noisy = Channel::new(vec![
        vec![0.7, 0.1, 0.1, 0.1],
        vec![0.1, 0.7, 0.1, 0.1],
        vec![0.1, 0.1, 0.7, 0.1],
        vec![0.1, 0.1, 0.1, 0.7],
    ])?
    .with_name("noisy")?;
    report("noisy identity", &noisy);
    println!();

    // -------------------------------------------------------------------------
    // 2. Composition
    // -------------------------------------------------------------------------
    println!("2. Composition");
    println!("--------------");

    report("checker || noisy", &checker.parallel(&noisy)?);
    report("noisy * noisy", &noisy.cascade(&noisy)?);
    report("hidden(noisy, id, .5)", &Channel::hidden_choice(&noisy, &identity, 0.5)?);
    report("visible(noisy, id, .5)", &Channel::visible_choice(&noisy, &identity, 0.5)?);
    println!();
    println!("Hidden choice never leaks more than visible choice.");
    println!();

    // -------------------------------------------------------------------------
    // 3. Random channels and the text encoding
    // -------------------------------------------------------------------------
    println!("3. A random channel");
    println!("-------------------");

    let mut rng = StdRng::seed_from_u64(2);
    let random = Channel::random(2, 3, &mut rng)?.with_name("random")?;
    print!("{random}");
    report("random", &random);

    Ok(())
}
