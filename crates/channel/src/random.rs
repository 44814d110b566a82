//! Random channel generation.
//!
//! Every generator takes the random source as an argument, so a seeded
//! [`StdRng`] reproduces the same channel. [`Channel::random_from_entropy`]
//! draws a fresh OS-seeded generator on each call.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tracing::{debug, warn};

use crate::channel::Channel;
use crate::error::{ChannelError, Result};
use crate::model::MatrixModel;
use crate::PROB_TOLERANCE;

/// Parameters of the randomizer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RandomConfig {
    /// Integer weights are drawn uniformly from `0..=max_weight`.
    /// A value of 0 is treated as 1.
    pub max_weight: u32,
}

impl Default for RandomConfig {
    fn default() -> Self {
        Self { max_weight: 1000 }
    }
}

/// Sampled integer weights of one channel.
struct Weights {
    rows: Vec<Vec<u64>>,
    row_sums: Vec<u64>,
    total: u64,
}

/// Draw `n_in × n_out` weights. A row that comes out all-zero is drawn
/// again, so every row sum is positive.
fn sample_weights<R: Rng + ?Sized>(
    n_in: usize,
    n_out: usize,
    config: RandomConfig,
    rng: &mut R,
) -> Weights {
    let max = u64::from(config.max_weight.max(1));
    let mut rows = Vec::with_capacity(n_in);
    let mut row_sums = Vec::with_capacity(n_in);

    for i in 0..n_in {
        loop {
            let row: Vec<u64> = (0..n_out).map(|_| rng.gen_range(0..=max)).collect();
            let sum: u64 = row.iter().sum();
            if sum > 0 {
                rows.push(row);
                row_sums.push(sum);
                break;
            }
            warn!(row = i, "sampled an all-zero row, resampling");
        }
    }

    let total = row_sums.iter().sum();
    Weights {
        rows,
        row_sums,
        total,
    }
}

fn normalized_rows(weights: &Weights) -> Vec<Vec<f64>> {
    weights
        .rows
        .iter()
        .zip(weights.row_sums.iter())
        .map(|(row, &sum)| row.iter().map(|&w| w as f64 / sum as f64).collect())
        .collect()
}

impl Channel {
    /// A random `n_in × n_out` channel using the default [`RandomConfig`].
    ///
    /// The prior is coupled to the matrix: `prior[i]` is the share of all
    /// sampled weight that fell into row `i`.
    ///
    /// # Example
    ///
    /// ```rust
    /// use qif_channel::Channel;
    /// use rand::SeedableRng;
    ///
    /// let mut rng = rand::rngs::StdRng::seed_from_u64(7);
    /// let c = Channel::random(2, 3, &mut rng).unwrap();
    /// for row in c.c_matrix() {
    ///     assert!((row.iter().sum::<f64>() - 1.0).abs() < 1e-9);
    /// }
    /// ```
    pub fn random<R: Rng + ?Sized>(n_in: usize, n_out: usize, rng: &mut R) -> Result<Self> {
        Self::random_with_config(n_in, n_out, RandomConfig::default(), rng)
    }

    /// A random channel with explicit randomizer parameters.
    pub fn random_with_config<R: Rng + ?Sized>(
        n_in: usize,
        n_out: usize,
        config: RandomConfig,
        rng: &mut R,
    ) -> Result<Self> {
        let mut channel = Self::zeroed(n_in, n_out)?;
        channel.randomize_with_config(config, rng)?;
        Ok(channel)
    }

    /// A random channel seeded from operating-system entropy.
    pub fn random_from_entropy(n_in: usize, n_out: usize) -> Result<Self> {
        let mut rng = StdRng::from_entropy();
        Self::random(n_in, n_out, &mut rng)
    }

    /// A random matrix under a caller-supplied prior.
    ///
    /// `n_in` is the prior's length. `base_norm` still records the total
    /// sampled weight.
    pub fn random_with_prior<R: Rng + ?Sized>(
        prior: Vec<f64>,
        n_out: usize,
        rng: &mut R,
    ) -> Result<Self> {
        let sum: f64 = prior.iter().sum();
        if (sum - 1.0).abs() > PROB_TOLERANCE {
            return Err(ChannelError::NotNormalized { sum });
        }
        let n_in = prior.len();
        let mut channel = Self::zeroed(n_in, n_out)?;
        let weights = sample_weights(n_in, n_out, RandomConfig::default(), rng);
        let model = MatrixModel::build(normalized_rows(&weights), prior)?;
        channel.replace_model(model, weights.total);
        Ok(channel)
    }

    /// Redraw the matrix and prior, keeping dimensions, labels and name.
    pub fn randomize<R: Rng + ?Sized>(&mut self, rng: &mut R) -> Result<()> {
        self.randomize_with_config(RandomConfig::default(), rng)
    }

    /// [`Channel::randomize`] with explicit randomizer parameters.
    pub fn randomize_with_config<R: Rng + ?Sized>(
        &mut self,
        config: RandomConfig,
        rng: &mut R,
    ) -> Result<()> {
        let (n_in, n_out) = (self.n_in(), self.n_out());
        let weights = sample_weights(n_in, n_out, config, rng);

        let prior: Vec<f64> = weights
            .row_sums
            .iter()
            .map(|&s| s as f64 / weights.total as f64)
            .collect();
        let model = MatrixModel::build(normalized_rows(&weights), prior)?;

        debug!(n_in, n_out, base_norm = weights.total, "randomized channel");
        self.replace_model(model, weights.total);
        Ok(())
    }
}
