//! Bayes and g-vulnerability.
//!
//! A gain function `g(w, x)` scores an adversary's guess `w` when the secret
//! is `x`. Vulnerability is the expected gain of the best guess, before
//! (prior) or after (posterior) observing the channel output.

use crate::channel::Channel;
use crate::error::{ChannelError, Result};
use crate::model::MatrixModel;

/// A gain function as a `|W| × |X|` matrix: `g[w][x]`.
#[derive(Debug, Clone, PartialEq)]
pub struct GainFunction {
    g: Vec<Vec<f64>>,
    n_secrets: usize,
}

impl GainFunction {
    /// Create a gain function from a guess-by-secret matrix.
    ///
    /// # Errors
    ///
    /// Empty or ragged matrices, and non-finite gains, are rejected.
    pub fn new(g: Vec<Vec<f64>>) -> Result<Self> {
        let n_secrets = g.first().map_or(0, Vec::len);
        if n_secrets == 0 {
            return Err(ChannelError::EmptyChannel);
        }
        for (w, row) in g.iter().enumerate() {
            if row.len() != n_secrets {
                return Err(ChannelError::RaggedMatrix {
                    row: w,
                    expected: n_secrets,
                    got: row.len(),
                });
            }
            if let Some(x) = row.iter().position(|v| !v.is_finite()) {
                return Err(ChannelError::NonFinite { row: w, col: Some(x) });
            }
        }
        Ok(Self { g, n_secrets })
    }

    /// The identity gain function: 1 for guessing the secret exactly.
    /// Its vulnerability is Bayes vulnerability.
    pub fn identity(n: usize) -> Result<Self> {
        Self::new(
            (0..n)
                .map(|w| (0..n).map(|x| if w == x { 1.0 } else { 0.0 }).collect())
                .collect(),
        )
    }

    pub fn n_guesses(&self) -> usize {
        self.g.len()
    }

    pub fn n_secrets(&self) -> usize {
        self.n_secrets
    }

    pub fn gains(&self) -> &[Vec<f64>] {
        &self.g
    }

    fn check_secrets(&self, n_in: usize) -> Result<()> {
        if self.n_secrets != n_in {
            return Err(ChannelError::ShapeMismatch {
                op: "g-vulnerability",
                expected: n_in,
                got: self.n_secrets,
            });
        }
        Ok(())
    }

    /// max_w Σₓ weights[x] · g(w, x)
    fn best_gain(&self, weights: impl Fn(usize) -> f64) -> f64 {
        self.g
            .iter()
            .map(|row| row.iter().enumerate().map(|(x, &g)| weights(x) * g).sum::<f64>())
            .fold(f64::NEG_INFINITY, f64::max)
    }
}

fn posterior_g(model: &MatrixModel, g: &GainFunction) -> f64 {
    let joint = model.joint();
    (0..model.n_out())
        .map(|y| g.best_gain(|x| joint[x][y]))
        .sum()
}

impl Channel {
    /// V(π) = maxₓ π(x): probability of guessing the secret in one try.
    pub fn prior_bayes_vulnerability(&self) -> f64 {
        self.prior().iter().copied().fold(0.0, f64::max)
    }

    /// V(π, C) = Σᵧ maxₓ p(x, y)
    pub fn posterior_bayes_vulnerability(&self) -> f64 {
        self.max_poutput().iter().sum()
    }

    /// Multiplicative Bayes leakage in bits: log₂(V(π, C) / V(π)).
    pub fn min_entropy_leakage(&self) -> f64 {
        let prior = self.prior_bayes_vulnerability();
        if prior > 0.0 {
            (self.posterior_bayes_vulnerability() / prior).log2()
        } else {
            0.0
        }
    }

    /// V_g(π) = max_w Σₓ π(x) · g(w, x)
    pub fn prior_g_vulnerability(&self, g: &GainFunction) -> Result<f64> {
        g.check_secrets(self.n_in())?;
        let prior = self.prior();
        Ok(g.best_gain(|x| prior[x]))
    }

    /// V_g(π, C) = Σᵧ max_w Σₓ π(x) · C[x, y] · g(w, x)
    pub fn posterior_g_vulnerability(&self, g: &GainFunction) -> Result<f64> {
        g.check_secrets(self.n_in())?;
        Ok(posterior_g(self.model(), g))
    }

    /// Posterior g-vulnerability of this channel's matrix under another prior.
    pub fn posterior_g_vulnerability_with_prior(
        &self,
        prior: &[f64],
        g: &GainFunction,
    ) -> Result<f64> {
        g.check_secrets(self.n_in())?;
        let model = self.model().with_prior(prior.to_vec())?;
        model.validate_prior()?;
        Ok(posterior_g(&model, g))
    }
}
