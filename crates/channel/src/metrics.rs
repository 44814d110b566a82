//! Entropy and mutual-information metrics over a built channel.
//!
//! All logarithms are base 2. A zero-probability term contributes exactly 0
//! (`0 · log₂(1/0) := 0`), and ratios with a zero denominator are 0.

use crate::channel::Channel;

/// `-p · log₂(p)`, with the zero-probability term defined as 0.
pub(crate) fn entropy_term(p: f64) -> f64 {
    if p > 0.0 {
        -p * p.log2()
    } else {
        0.0
    }
}

/// Shannon entropy in bits of a probability vector.
pub fn entropy_bits(p: &[f64]) -> f64 {
    p.iter().map(|&x| entropy_term(x)).sum()
}

fn ratio_or_zero(num: f64, den: f64) -> f64 {
    if den > 0.0 {
        num / den
    } else {
        0.0
    }
}

impl Channel {
    /// H(X): entropy of the prior.
    pub fn shannon_entropy_prior(&self) -> f64 {
        entropy_bits(self.prior())
    }

    /// H(Y): entropy of the output distribution.
    pub fn shannon_entropy_out(&self) -> f64 {
        entropy_bits(self.out_distribution())
    }

    /// H(Y|X) = Σₓ p(x) · H(C[x, ·])
    pub fn conditional_entropy(&self) -> f64 {
        self.prior()
            .iter()
            .zip(self.c_matrix().iter())
            .map(|(&p_x, row)| p_x * entropy_bits(row))
            .sum()
    }

    /// H(X|Y) = Σᵧ p(y) · H(p(· | y))
    pub fn conditional_entropy_hyper(&self) -> f64 {
        let hyper = self.hyper_matrix();
        self.out_distribution()
            .iter()
            .enumerate()
            .map(|(j, &p_y)| {
                let posterior_entropy: f64 = hyper.iter().map(|row| entropy_term(row[j])).sum();
                p_y * posterior_entropy
            })
            .sum()
    }

    /// H(X, Y): entropy of the joint distribution.
    pub fn joint_entropy(&self) -> f64 {
        self.joint().iter().map(|row| entropy_bits(row)).sum()
    }

    /// Expected number of guesses to find the secret when guessing inputs in
    /// decreasing order of prior probability.
    ///
    /// G(X) = Σₖ k · p₍ₖ₎, with p₍₁₎ ≥ p₍₂₎ ≥ ...
    pub fn guessing_entropy(&self) -> f64 {
        let mut sorted = self.prior().to_vec();
        sorted.sort_by(|a, b| b.total_cmp(a));
        sorted
            .iter()
            .enumerate()
            .map(|(k, &p)| (k + 1) as f64 * p)
            .sum()
    }

    /// I(X; Y) = H(X) - H(X|Y).
    ///
    /// Equal to H(Y) - H(Y|X) up to floating error.
    ///
    /// # Example
    ///
    /// ```rust
    /// use qif_channel::Channel;
    ///
    /// // A channel that reveals its input leaks the whole prior entropy
    /// let id = Channel::identity(4).unwrap();
    /// assert!((id.mutual_information() - 2.0).abs() < 1e-12);
    /// ```
    pub fn mutual_information(&self) -> f64 {
        self.shannon_entropy_prior() - self.conditional_entropy_hyper()
    }

    /// I(X; Y) / √(H(X) · H(Y)); 0 when either entropy is 0.
    pub fn normalized_mutual_information(&self) -> f64 {
        let den = (self.shannon_entropy_prior() * self.shannon_entropy_out()).sqrt();
        ratio_or_zero(self.mutual_information(), den)
    }

    /// 2 · I(X; Y) / (H(X) + H(Y)); 0 when both entropies are 0.
    pub fn symmetric_uncertainty(&self) -> f64 {
        let den = self.shannon_entropy_prior() + self.shannon_entropy_out();
        ratio_or_zero(2.0 * self.mutual_information(), den)
    }
}
