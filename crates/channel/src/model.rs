//! The matrix model behind a channel: `p(y|x)`, the prior, and everything
//! derived from them.

use serde::Serialize;
use tracing::trace;

use crate::error::{ChannelError, Result};
use crate::PROB_TOLERANCE;

/// A channel matrix and prior together with all derived distributions.
///
/// Represented as a row-stochastic matrix where:
/// - `c_matrix[i][j]` = P(output = j | input = i)
/// - `prior[i]` = P(input = i)
///
/// and the derived quantities:
/// - `joint[i][j]` = `c_matrix[i][j]` · `prior[i]`
/// - `out_distribution[j]` = Σᵢ `joint[i][j]`
/// - `hyper_matrix[i][j]` = `joint[i][j]` / `out_distribution[j]` (0 when the
///   output has no mass)
/// - `max_pinput[i]`, `max_poutput[j]`: row and column maxima of `joint`
///
/// A model is a value: [`MatrixModel::build`] computes every derived field in
/// one pass and returns a whole new model, so no field can go stale
/// independently of the others.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MatrixModel {
    c_matrix: Vec<Vec<f64>>,
    prior: Vec<f64>,
    #[serde(skip)]
    joint: Vec<Vec<f64>>,
    #[serde(skip)]
    out_distribution: Vec<f64>,
    #[serde(skip)]
    hyper_matrix: Vec<Vec<f64>>,
    #[serde(skip)]
    max_pinput: Vec<f64>,
    #[serde(skip)]
    max_poutput: Vec<f64>,
}

impl MatrixModel {
    /// The initial state for an `n_in × n_out` channel: zero matrices and a
    /// uniform prior.
    ///
    /// The zero matrix is not row-stochastic; this state exists to be
    /// overwritten by a build or a randomization.
    ///
    /// # Errors
    ///
    /// Returns [`ChannelError::EmptyChannel`] if either dimension is zero.
    pub fn reset(n_in: usize, n_out: usize) -> Result<Self> {
        if n_in == 0 || n_out == 0 {
            return Err(ChannelError::EmptyChannel);
        }
        let zeros = vec![vec![0.0; n_out]; n_in];
        Ok(Self {
            c_matrix: zeros.clone(),
            prior: vec![1.0 / n_in as f64; n_in],
            joint: zeros.clone(),
            out_distribution: vec![0.0; n_out],
            hyper_matrix: zeros,
            max_pinput: vec![0.0; n_in],
            max_poutput: vec![0.0; n_out],
        })
    }

    /// Build a model from a matrix and a prior, computing all derived state.
    ///
    /// Only structure is validated here (shape, finiteness, non-negativity);
    /// stochasticity is checked by [`MatrixModel::validate_stochastic`].
    /// Nothing is computed until validation has passed.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - The matrix is empty
    /// - Rows have different lengths
    /// - The prior length differs from the number of rows
    /// - Any entry is negative or not finite
    pub fn build(c_matrix: Vec<Vec<f64>>, prior: Vec<f64>) -> Result<Self> {
        let n_in = c_matrix.len();
        if n_in == 0 {
            return Err(ChannelError::EmptyChannel);
        }
        let n_out = c_matrix[0].len();
        if n_out == 0 {
            return Err(ChannelError::EmptyChannel);
        }

        for (i, row) in c_matrix.iter().enumerate() {
            if row.len() != n_out {
                return Err(ChannelError::RaggedMatrix {
                    row: i,
                    expected: n_out,
                    got: row.len(),
                });
            }
            for (j, &x) in row.iter().enumerate() {
                check_entry(x, i, Some(j))?;
            }
        }

        if prior.len() != n_in {
            return Err(ChannelError::ShapeMismatch {
                op: "build",
                expected: n_in,
                got: prior.len(),
            });
        }
        for (i, &p) in prior.iter().enumerate() {
            check_entry(p, i, None)?;
        }

        let mut joint = vec![vec![0.0; n_out]; n_in];
        let mut out_distribution = vec![0.0; n_out];
        let mut max_pinput = vec![0.0_f64; n_in];
        let mut max_poutput = vec![0.0_f64; n_out];

        for (i, (row, &p_x)) in c_matrix.iter().zip(prior.iter()).enumerate() {
            for (j, &c) in row.iter().enumerate() {
                let p_xy = c * p_x;
                joint[i][j] = p_xy;
                out_distribution[j] += p_xy;
                max_pinput[i] = max_pinput[i].max(p_xy);
                max_poutput[j] = max_poutput[j].max(p_xy);
            }
        }

        // Unobservable outputs carry no posterior.
        let hyper_matrix = joint
            .iter()
            .map(|row| {
                row.iter()
                    .zip(out_distribution.iter())
                    .map(|(&p_xy, &p_y)| if p_y > 0.0 { p_xy / p_y } else { 0.0 })
                    .collect()
            })
            .collect();

        trace!(n_in, n_out, "built matrix model");

        Ok(Self {
            c_matrix,
            prior,
            joint,
            out_distribution,
            hyper_matrix,
            max_pinput,
            max_poutput,
        })
    }

    /// Check that every row of the matrix and the prior sum to 1.
    pub fn validate_stochastic(&self) -> Result<()> {
        self.validate_stochastic_within(PROB_TOLERANCE)
    }

    /// [`MatrixModel::validate_stochastic`] with an explicit tolerance.
    pub fn validate_stochastic_within(&self, tolerance: f64) -> Result<()> {
        for (i, row) in self.c_matrix.iter().enumerate() {
            let sum: f64 = row.iter().sum();
            if (sum - 1.0).abs() > tolerance {
                return Err(ChannelError::RowNotNormalized { row: i, sum });
            }
        }
        self.validate_prior_within(tolerance)
    }

    /// Check that the prior sums to 1; the matrix is not looked at.
    pub fn validate_prior(&self) -> Result<()> {
        self.validate_prior_within(PROB_TOLERANCE)
    }

    fn validate_prior_within(&self, tolerance: f64) -> Result<()> {
        let sum: f64 = self.prior.iter().sum();
        if (sum - 1.0).abs() > tolerance {
            return Err(ChannelError::NotNormalized { sum });
        }
        Ok(())
    }

    /// The same matrix under a different prior.
    pub fn with_prior(&self, prior: Vec<f64>) -> Result<Self> {
        Self::build(self.c_matrix.clone(), prior)
    }

    pub fn n_in(&self) -> usize {
        self.c_matrix.len()
    }

    pub fn n_out(&self) -> usize {
        self.out_distribution.len()
    }

    /// P(output | input), indexed `[input][output]`.
    pub fn c_matrix(&self) -> &[Vec<f64>] {
        &self.c_matrix
    }

    pub fn prior(&self) -> &[f64] {
        &self.prior
    }

    /// P(input, output), indexed `[input][output]`.
    pub fn joint(&self) -> &[Vec<f64>] {
        &self.joint
    }

    pub fn out_distribution(&self) -> &[f64] {
        &self.out_distribution
    }

    /// P(input | output), indexed `[input][output]`.
    pub fn hyper_matrix(&self) -> &[Vec<f64>] {
        &self.hyper_matrix
    }

    pub fn max_pinput(&self) -> &[f64] {
        &self.max_pinput
    }

    pub fn max_poutput(&self) -> &[f64] {
        &self.max_poutput
    }
}

fn check_entry(x: f64, row: usize, col: Option<usize>) -> Result<()> {
    if !x.is_finite() {
        return Err(ChannelError::NonFinite { row, col });
    }
    if x < 0.0 {
        return Err(ChannelError::NegativeProbability { row, col });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reset_is_zeroed_with_uniform_prior() {
        let m = MatrixModel::reset(4, 3).unwrap();
        assert_eq!(m.n_in(), 4);
        assert_eq!(m.n_out(), 3);
        assert!(m.c_matrix().iter().flatten().all(|&x| x == 0.0));
        assert!(m.prior().iter().all(|&p| (p - 0.25).abs() < 1e-12));
        assert!(m.out_distribution().iter().all(|&p| p == 0.0));
    }

    #[test]
    fn test_reset_rejects_zero_dimension() {
        assert!(matches!(
            MatrixModel::reset(0, 2),
            Err(ChannelError::EmptyChannel)
        ));
    }

    #[test]
    fn test_build_derived_state() {
        let m = MatrixModel::build(vec![vec![0.5, 0.5], vec![0.0, 1.0]], vec![0.4, 0.6]).unwrap();

        assert!((m.joint()[0][0] - 0.2).abs() < 1e-12);
        assert!((m.joint()[1][1] - 0.6).abs() < 1e-12);

        // P(y0) = 0.2, P(y1) = 0.8
        assert!((m.out_distribution()[0] - 0.2).abs() < 1e-12);
        assert!((m.out_distribution()[1] - 0.8).abs() < 1e-12);

        // P(x0 | y0) = 1, P(x0 | y1) = 0.25
        assert!((m.hyper_matrix()[0][0] - 1.0).abs() < 1e-12);
        assert!((m.hyper_matrix()[0][1] - 0.25).abs() < 1e-12);
        assert!((m.hyper_matrix()[1][1] - 0.75).abs() < 1e-12);

        assert!((m.max_pinput()[0] - 0.2).abs() < 1e-12);
        assert!((m.max_pinput()[1] - 0.6).abs() < 1e-12);
        assert!((m.max_poutput()[0] - 0.2).abs() < 1e-12);
        assert!((m.max_poutput()[1] - 0.6).abs() < 1e-12);
    }

    #[test]
    fn test_hyper_column_for_unobservable_output_is_zero() {
        let m = MatrixModel::build(vec![vec![1.0, 0.0], vec![1.0, 0.0]], vec![0.5, 0.5]).unwrap();
        assert_eq!(m.out_distribution()[1], 0.0);
        assert_eq!(m.hyper_matrix()[0][1], 0.0);
        assert_eq!(m.hyper_matrix()[1][1], 0.0);
        assert!(m.hyper_matrix().iter().flatten().all(|x| x.is_finite()));
    }

    #[test]
    fn test_validate_within_scales_with_tolerance() {
        let m = MatrixModel::build(vec![vec![0.5, 0.500002]], vec![1.0]).unwrap();
        assert!(matches!(
            m.validate_stochastic(),
            Err(ChannelError::RowNotNormalized { row: 0, .. })
        ));
        assert!(m.validate_stochastic_within(1e-5).is_ok());
        assert!(m.validate_prior().is_ok());
    }

    #[test]
    fn test_build_ragged() {
        let result = MatrixModel::build(vec![vec![0.5, 0.5], vec![1.0]], vec![0.5, 0.5]);
        assert!(matches!(
            result,
            Err(ChannelError::RaggedMatrix { row: 1, expected: 2, got: 1 })
        ));
    }

    #[test]
    fn test_build_prior_length_mismatch() {
        let result = MatrixModel::build(vec![vec![1.0], vec![1.0]], vec![1.0]);
        assert!(matches!(result, Err(ChannelError::ShapeMismatch { .. })));
    }

    #[test]
    fn test_build_negative_and_nan() {
        assert!(matches!(
            MatrixModel::build(vec![vec![1.5, -0.5]], vec![1.0]),
            Err(ChannelError::NegativeProbability { row: 0, col: Some(1) })
        ));
        assert!(matches!(
            MatrixModel::build(vec![vec![1.0]], vec![f64::NAN]),
            Err(ChannelError::NonFinite { row: 0, col: None })
        ));
    }

    #[test]
    fn test_validate_stochastic() {
        let ok = MatrixModel::build(vec![vec![0.3, 0.7]], vec![1.0]).unwrap();
        assert!(ok.validate_stochastic().is_ok());

        let bad_row = MatrixModel::build(vec![vec![0.3, 0.6]], vec![1.0]).unwrap();
        assert!(matches!(
            bad_row.validate_stochastic(),
            Err(ChannelError::RowNotNormalized { row: 0, .. })
        ));

        let bad_prior = MatrixModel::build(vec![vec![1.0], vec![1.0]], vec![0.5, 0.6]).unwrap();
        assert!(matches!(
            bad_prior.validate_stochastic(),
            Err(ChannelError::NotNormalized { .. })
        ));
    }
}
