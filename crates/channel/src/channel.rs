//! Channels: a labeled matrix model from secret inputs to observable outputs.

use serde::Serialize;
use tracing::debug;

use crate::error::{ChannelError, Result};
use crate::model::MatrixModel;
use crate::names::NameIndex;

/// Prefix of default input labels (`x0`, `x1`, ...).
pub const DEFAULT_INPUT_PREFIX: &str = "x";
/// Prefix of default output labels (`y0`, `y1`, ...).
pub const DEFAULT_OUTPUT_PREFIX: &str = "y";

/// An information-theoretic channel `C: X → Y`.
///
/// Wraps a [`MatrixModel`] with a name, the randomizer's normalization
/// constant, and labeled input/output alphabets.
///
/// # Example
///
/// ```rust
/// use qif_channel::Channel;
///
/// // Binary symmetric channel with error rate 0.1
/// let bsc = Channel::new(vec![
///     vec![0.9, 0.1],
///     vec![0.1, 0.9],
/// ]).unwrap();
///
/// assert_eq!(bsc.n_in(), 2);
/// assert_eq!(bsc.in_names(), ["x0", "x1"]);
/// // Uniform prior by default, so the outputs are uniform as well
/// assert!((bsc.out_distribution()[0] - 0.5).abs() < 1e-12);
/// ```
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Channel {
    name: String,
    base_norm: u64,
    #[serde(rename = "in_names")]
    inputs: NameIndex,
    #[serde(rename = "out_names")]
    outputs: NameIndex,
    #[serde(flatten)]
    model: MatrixModel,
}

impl Channel {
    /// Create a channel from a row-stochastic matrix with a uniform prior.
    ///
    /// # Errors
    ///
    /// Returns an error if the matrix is empty, ragged, has negative or
    /// non-finite entries, or a row doesn't sum to 1 (within tolerance).
    pub fn new(c_matrix: Vec<Vec<f64>>) -> Result<Self> {
        let n_in = c_matrix.len();
        if n_in == 0 {
            return Err(ChannelError::EmptyChannel);
        }
        Self::with_prior(c_matrix, vec![1.0 / n_in as f64; n_in])
    }

    /// Create a channel from a row-stochastic matrix and a prior.
    ///
    /// # Errors
    ///
    /// Same as [`Channel::new`], plus a prior that has the wrong length or
    /// doesn't sum to 1.
    pub fn with_prior(c_matrix: Vec<Vec<f64>>, prior: Vec<f64>) -> Result<Self> {
        let model = MatrixModel::build(c_matrix, prior)?;
        model.validate_stochastic()?;
        Ok(Self::from_model(model))
    }

    /// The identity channel on `n` inputs: each input is revealed exactly.
    ///
    /// Output labels equal the input labels.
    pub fn identity(n: usize) -> Result<Self> {
        let c_matrix = (0..n)
            .map(|i| {
                let mut row = vec![0.0; n];
                row[i] = 1.0;
                row
            })
            .collect();
        let mut channel = Self::new(c_matrix)?;
        channel.outputs = NameIndex::numbered(DEFAULT_INPUT_PREFIX, n);
        channel.name = "identity".to_string();
        Ok(channel)
    }

    /// A channel in its reset state: zero matrix, uniform prior, default
    /// labels. Not stochastic until randomized.
    pub fn zeroed(n_in: usize, n_out: usize) -> Result<Self> {
        Ok(Self::from_model(MatrixModel::reset(n_in, n_out)?))
    }

    /// Return the channel to its reset state at new dimensions.
    ///
    /// The name is kept; labels, `base_norm` and all matrices are reset.
    pub fn reset(&mut self, n_in: usize, n_out: usize) -> Result<()> {
        let fresh = Self::zeroed(n_in, n_out)?;
        debug!(n_in, n_out, name = %self.name, "reset channel");
        self.model = fresh.model;
        self.inputs = fresh.inputs;
        self.outputs = fresh.outputs;
        self.base_norm = 0;
        Ok(())
    }

    pub(crate) fn from_model(model: MatrixModel) -> Self {
        Self {
            name: String::new(),
            base_norm: 0,
            inputs: NameIndex::numbered(DEFAULT_INPUT_PREFIX, model.n_in()),
            outputs: NameIndex::numbered(DEFAULT_OUTPUT_PREFIX, model.n_out()),
            model,
        }
    }

    /// Assemble a channel from already-validated parts.
    pub(crate) fn from_parts(
        name: String,
        base_norm: u64,
        inputs: NameIndex,
        outputs: NameIndex,
        model: MatrixModel,
    ) -> Result<Self> {
        if inputs.len() != model.n_in() {
            return Err(ChannelError::LabelCountMismatch {
                expected: model.n_in(),
                got: inputs.len(),
            });
        }
        if outputs.len() != model.n_out() {
            return Err(ChannelError::LabelCountMismatch {
                expected: model.n_out(),
                got: outputs.len(),
            });
        }
        Ok(Self {
            name,
            base_norm,
            inputs,
            outputs,
            model,
        })
    }

    /// Replace the whole matrix model, e.g. after randomization.
    pub(crate) fn replace_model(&mut self, model: MatrixModel, base_norm: u64) {
        debug_assert_eq!(model.n_in(), self.inputs.len());
        debug_assert_eq!(model.n_out(), self.outputs.len());
        self.model = model;
        self.base_norm = base_norm;
    }

    /// Builder-style name setter.
    ///
    /// # Errors
    ///
    /// [`ChannelError::InvalidName`] if the name contains a line break.
    pub fn with_name(mut self, name: impl Into<String>) -> Result<Self> {
        self.set_name(name)?;
        Ok(self)
    }

    /// Builder-style label setter for both alphabets.
    pub fn with_names(mut self, in_names: Vec<String>, out_names: Vec<String>) -> Result<Self> {
        self.set_in_names(in_names)?;
        self.set_out_names(out_names)?;
        Ok(self)
    }

    /// Rename the channel; the old name is kept on failure.
    pub fn set_name(&mut self, name: impl Into<String>) -> Result<()> {
        let name = name.into();
        check_name(&name)?;
        self.name = name;
        Ok(())
    }

    /// Replace the input labels; the inverse map is rebuilt with them.
    ///
    /// # Errors
    ///
    /// Fails on a wrong label count or an invalid/duplicate label. The old
    /// labels are kept on failure.
    pub fn set_in_names(&mut self, labels: Vec<String>) -> Result<()> {
        self.inputs = relabel(labels, self.n_in())?;
        Ok(())
    }

    /// Replace the output labels; see [`Channel::set_in_names`].
    pub fn set_out_names(&mut self, labels: Vec<String>) -> Result<()> {
        self.outputs = relabel(labels, self.n_out())?;
        Ok(())
    }

    /// Rebuild the channel under a different prior, keeping the matrix.
    ///
    /// All derived state is recomputed; on error nothing changes. Only the
    /// new prior is checked, the matrix was accepted when it was built.
    pub fn set_prior(&mut self, prior: Vec<f64>) -> Result<()> {
        let model = self.model.with_prior(prior)?;
        model.validate_prior()?;
        self.model = model;
        Ok(())
    }

    /// Two channels are compatible when they share the same input alphabet,
    /// in the same order.
    pub fn compatible(c1: &Channel, c2: &Channel) -> bool {
        c1.n_in() == c2.n_in() && c1.in_names() == c2.in_names()
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Normalization constant of the randomizer (0 if not randomized).
    pub fn base_norm(&self) -> u64 {
        self.base_norm
    }

    pub fn n_in(&self) -> usize {
        self.model.n_in()
    }

    pub fn n_out(&self) -> usize {
        self.model.n_out()
    }

    pub fn inputs(&self) -> &NameIndex {
        &self.inputs
    }

    pub fn outputs(&self) -> &NameIndex {
        &self.outputs
    }

    pub fn in_names(&self) -> &[String] {
        self.inputs.labels()
    }

    pub fn out_names(&self) -> &[String] {
        self.outputs.labels()
    }

    /// Index of an input label.
    pub fn in_index(&self, label: &str) -> Result<usize> {
        self.inputs.index_of(label)
    }

    /// Index of an output label.
    pub fn out_index(&self, label: &str) -> Result<usize> {
        self.outputs.index_of(label)
    }

    pub fn model(&self) -> &MatrixModel {
        &self.model
    }

    pub fn c_matrix(&self) -> &[Vec<f64>] {
        self.model.c_matrix()
    }

    pub fn prior(&self) -> &[f64] {
        self.model.prior()
    }

    pub fn joint(&self) -> &[Vec<f64>] {
        self.model.joint()
    }

    pub fn out_distribution(&self) -> &[f64] {
        self.model.out_distribution()
    }

    pub fn hyper_matrix(&self) -> &[Vec<f64>] {
        self.model.hyper_matrix()
    }

    pub fn max_pinput(&self) -> &[f64] {
        self.model.max_pinput()
    }

    pub fn max_poutput(&self) -> &[f64] {
        self.model.max_poutput()
    }

    /// P(output = `output` | input = `input`), by label.
    pub fn conditional(&self, input: &str, output: &str) -> Result<f64> {
        let i = self.in_index(input)?;
        let j = self.out_index(output)?;
        Ok(self.c_matrix()[i][j])
    }
}

/// A name must fit on the single name line of the text encoding.
pub(crate) fn check_name(name: &str) -> Result<()> {
    if name.contains(['\n', '\r']) {
        return Err(ChannelError::InvalidName {
            name: name.to_string(),
        });
    }
    Ok(())
}

fn relabel(labels: Vec<String>, expected: usize) -> Result<NameIndex> {
    if labels.len() != expected {
        return Err(ChannelError::LabelCountMismatch {
            expected,
            got: labels.len(),
        });
    }
    NameIndex::new(labels)
}
