//! # qif-channel - Channels for Quantitative Information Flow
//!
//! A channel models a system that takes a secret input and produces an
//! observable output. Leakage is measured by how much observing the output
//! tells an adversary about the secret.
//!
//! ## Core Concepts
//!
//! - **Channels are row-stochastic matrices**: `C[x][y]` = P(output=y | input=x)
//! - **A prior turns a channel into a joint distribution**: p(x, y) = π(x) · C[x][y]
//! - **Posteriors (the hyper-distribution)**: p(x | y) = p(x, y) / p(y)
//! - **Composition builds systems from parts**: parallel, cascade, hidden and
//!   visible choice
//! - **Leakage is a difference of uncertainties**: I(X; Y) = H(X) - H(X|Y)
//!
//! ## Example: Password Checker
//!
//! ```rust
//! use qif_channel::Channel;
//!
//! // Secret: one of four passwords. Output: does the guess "p0" match?
//! let checker = Channel::new(vec![
//!     vec![1.0, 0.0],  // p0 → accept
//!     vec![0.0, 1.0],  // p1 → reject
//!     vec![0.0, 1.0],  // p2 → reject
//!     vec![0.0, 1.0],  // p3 → reject
//! ]).unwrap();
//!
//! // Uniform prior: H(X) = 2 bits
//! assert!((checker.shannon_entropy_prior() - 2.0).abs() < 1e-12);
//!
//! // One check leaks H(1/4) ≈ 0.811 bits
//! let leak = checker.mutual_information();
//! assert!((leak - 0.811278).abs() < 1e-6);
//!
//! // Two independent checks of the same secret leak no more
//! let twice = checker.parallel(&checker).unwrap();
//! assert!((twice.mutual_information() - leak).abs() < 1e-12);
//! ```

mod channel;
mod codec;
mod compose;
mod error;
mod metrics;
mod model;
mod names;
mod random;
mod vulnerability;

pub use channel::{Channel, DEFAULT_INPUT_PREFIX, DEFAULT_OUTPUT_PREFIX};
pub use codec::PRECISION;
pub use compose::LABEL_SEPARATOR;
pub use error::{ChannelError, Result};
pub use metrics::entropy_bits;
pub use model::MatrixModel;
pub use names::NameIndex;
pub use random::RandomConfig;
pub use vulnerability::GainFunction;

/// Tolerance for stochasticity checks on constructed channels.
pub const PROB_TOLERANCE: f64 = 1e-6;
