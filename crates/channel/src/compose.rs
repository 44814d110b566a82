//! Channel composition: parallel, cascade, hidden and visible choice.
//!
//! Every operator reads its operands and returns a newly built channel. The
//! result keeps the first operand's input labels and starts from a uniform
//! prior; apply another one with [`Channel::set_prior`]. Operands that cannot
//! be composed produce an error, never a stand-in channel.

use tracing::debug;

use crate::channel::Channel;
use crate::error::{ChannelError, Result};
use crate::model::MatrixModel;
use crate::names::NameIndex;

/// Joins component labels in composed alphabets (`a.b`, `1.a`).
pub const LABEL_SEPARATOR: char = '.';

fn require_compatible(op: &'static str, c1: &Channel, c2: &Channel) -> Result<()> {
    if Channel::compatible(c1, c2) {
        return Ok(());
    }
    let reason = if c1.n_in() != c2.n_in() {
        format!("input sizes differ ({} vs {})", c1.n_in(), c2.n_in())
    } else {
        format!(
            "input labels differ ({:?} vs {:?})",
            c1.in_names(),
            c2.in_names()
        )
    };
    Err(ChannelError::Incompatible { op, reason })
}

fn check_probability(p: f64) -> Result<()> {
    if (0.0..=1.0).contains(&p) {
        Ok(())
    } else {
        Err(ChannelError::InvalidProbability { p })
    }
}

fn join(a: &str, b: &str) -> String {
    format!("{a}{LABEL_SEPARATOR}{b}")
}

/// Build the result channel: `c1`'s inputs, a uniform prior, the given
/// outputs.
fn assemble(
    name: String,
    c1: &Channel,
    out_labels: Vec<String>,
    c_matrix: Vec<Vec<f64>>,
) -> Result<Channel> {
    let outputs = NameIndex::new(out_labels)?;
    let n_in = c1.n_in();
    let model = MatrixModel::build(c_matrix, vec![1.0 / n_in as f64; n_in])?;
    Channel::from_parts(name, 0, c1.inputs().clone(), outputs, model)
}

impl Channel {
    /// Parallel composition `self ∥ other`.
    ///
    /// Both channels run independently on the same secret and the adversary
    /// sees both outputs. Outputs are pairs `(a, b)` in row-major order
    /// (`self`'s outputs outer), labeled `a.b`:
    ///
    /// `(C1 ∥ C2)[x, (a, b)] = C1[x, a] · C2[x, b]`
    ///
    /// # Errors
    ///
    /// [`ChannelError::Incompatible`] unless both channels have the same
    /// input alphabet; [`ChannelError::DuplicateLabel`] if two joined labels
    /// collide, which can only happen when output labels already contain
    /// [`LABEL_SEPARATOR`] (see [`NameIndex::new`]).
    ///
    /// # Example
    ///
    /// ```rust
    /// use qif_channel::Channel;
    ///
    /// let a = Channel::new(vec![vec![0.5, 0.5], vec![0.1, 0.9]]).unwrap();
    /// let b = Channel::new(vec![vec![1.0, 0.0, 0.0], vec![0.0, 0.5, 0.5]]).unwrap();
    /// let ab = a.parallel(&b).unwrap();
    /// assert_eq!(ab.n_out(), 6);
    /// assert_eq!(ab.out_names()[1], "y0.y1");
    /// ```
    pub fn parallel(&self, other: &Channel) -> Result<Channel> {
        require_compatible("parallel", self, other)?;

        let n_in = self.n_in();
        let n_out = self.n_out() * other.n_out();
        let mut c_matrix = vec![Vec::with_capacity(n_out); n_in];
        let mut labels = Vec::with_capacity(n_out);

        for (a, label_a) in self.outputs().iter().enumerate() {
            for (b, label_b) in other.outputs().iter().enumerate() {
                labels.push(join(label_a, label_b));
                for (x, row) in c_matrix.iter_mut().enumerate() {
                    row.push(self.c_matrix()[x][a] * other.c_matrix()[x][b]);
                }
            }
        }

        debug!(n_in, n_out, "parallel composition");
        assemble(
            format!("({}||{})", self.name(), other.name()),
            self,
            labels,
            c_matrix,
        )
    }

    /// Cascade composition `self · other`: `self`'s output is fed into
    /// `other`.
    ///
    /// `(C1 · C2)[x, z] = Σᵧ C1[x, y] · C2[y, z]`
    ///
    /// The result has `self`'s inputs and `other`'s outputs.
    ///
    /// # Errors
    ///
    /// [`ChannelError::ShapeMismatch`] if `self.n_out() != other.n_in()`.
    pub fn cascade(&self, other: &Channel) -> Result<Channel> {
        if self.n_out() != other.n_in() {
            return Err(ChannelError::ShapeMismatch {
                op: "cascade",
                expected: self.n_out(),
                got: other.n_in(),
            });
        }

        let n = self.n_in();
        let m = self.n_out();
        let p = other.n_out();
        let (left, right) = (self.c_matrix(), other.c_matrix());

        let mut c_matrix = vec![vec![0.0; p]; n];
        for (i, result_row) in c_matrix.iter_mut().enumerate() {
            for (k, result_elem) in result_row.iter_mut().enumerate() {
                let mut sum = 0.0;
                for j in 0..m {
                    sum += left[i][j] * right[j][k];
                }
                *result_elem = sum;
            }
        }

        debug!(n_in = n, inner = m, n_out = p, "cascade composition");
        assemble(
            format!("({}*{})", self.name(), other.name()),
            self,
            other.out_names().to_vec(),
            c_matrix,
        )
    }

    /// Hidden choice `c1 ⊕ₚ c2`: run `c1` with probability `p`, `c2`
    /// otherwise, without revealing which one ran.
    ///
    /// The output alphabet is the sorted union of both alphabets. A label
    /// shared by both channels merges their probabilities:
    ///
    /// - in both: `p · C1[x, y] + (1 - p) · C2[x, y]`
    /// - only in `c1`: `p · C1[x, y]`
    /// - only in `c2`: `(1 - p) · C2[x, y]`
    ///
    /// # Errors
    ///
    /// [`ChannelError::InvalidProbability`] for `p ∉ [0, 1]`,
    /// [`ChannelError::Incompatible`] if the input alphabets differ.
    ///
    /// # Example
    ///
    /// ```rust
    /// use qif_channel::Channel;
    ///
    /// let c1 = Channel::new(vec![vec![1.0, 0.0], vec![0.0, 1.0]]).unwrap();
    /// let c2 = Channel::new(vec![vec![0.5, 0.5], vec![0.5, 0.5]]).unwrap();
    /// // Same output labels (y0, y1): the alphabets merge
    /// let h = Channel::hidden_choice(&c1, &c2, 0.5).unwrap();
    /// assert_eq!(h.n_out(), 2);
    /// assert!((h.c_matrix()[0][0] - 0.75).abs() < 1e-12);
    /// ```
    pub fn hidden_choice(c1: &Channel, c2: &Channel, p: f64) -> Result<Channel> {
        check_probability(p)?;
        require_compatible("hidden_choice", c1, c2)?;

        let mut labels: Vec<String> = c1
            .out_names()
            .iter()
            .chain(c2.out_names().iter())
            .cloned()
            .collect();
        labels.sort();
        labels.dedup();

        // Source column in each operand, per combined label.
        let columns = labels
            .iter()
            .map(|label| {
                let a = c1.outputs().index_of(label).ok();
                let b = c2.outputs().index_of(label).ok();
                if a.is_none() && b.is_none() {
                    return Err(ChannelError::LabelNotFound {
                        label: label.clone(),
                    });
                }
                Ok((a, b))
            })
            .collect::<Result<Vec<_>>>()?;

        let q = 1.0 - p;
        let c_matrix: Vec<Vec<f64>> = c1
            .c_matrix()
            .iter()
            .zip(c2.c_matrix().iter())
            .map(|(row1, row2)| {
                columns
                    .iter()
                    .map(|&(a, b)| {
                        let from1 = a.map_or(0.0, |a| p * row1[a]);
                        let from2 = b.map_or(0.0, |b| q * row2[b]);
                        from1 + from2
                    })
                    .collect()
            })
            .collect();

        debug!(n_in = c1.n_in(), n_out = labels.len(), p, "hidden choice");
        assemble(
            format!("({}+[{}]{})", c1.name(), p, c2.name()),
            c1,
            labels,
            c_matrix,
        )
    }

    /// Visible choice `c1 □ₚ c2`: like [`Channel::hidden_choice`], but the
    /// adversary also learns which channel ran.
    ///
    /// Outputs are the disjoint union of both alphabets, tagged `1.y` for
    /// `c1`'s and `2.y` for `c2`'s, with entries `p · C1[x, y]` and
    /// `(1 - p) · C2[x, y]` respectively.
    ///
    /// # Errors
    ///
    /// Same as [`Channel::hidden_choice`].
    pub fn visible_choice(c1: &Channel, c2: &Channel, p: f64) -> Result<Channel> {
        check_probability(p)?;
        require_compatible("visible_choice", c1, c2)?;

        let labels: Vec<String> = c1
            .outputs()
            .iter()
            .map(|l| join("1", l))
            .chain(c2.outputs().iter().map(|l| join("2", l)))
            .collect();

        let q = 1.0 - p;
        let c_matrix: Vec<Vec<f64>> = c1
            .c_matrix()
            .iter()
            .zip(c2.c_matrix().iter())
            .map(|(row1, row2)| {
                row1.iter()
                    .map(|&v| p * v)
                    .chain(row2.iter().map(|&v| q * v))
                    .collect()
            })
            .collect();

        debug!(n_in = c1.n_in(), n_out = labels.len(), p, "visible choice");
        assemble(
            format!("({}#[{}]{})", c1.name(), p, c2.name()),
            c1,
            labels,
            c_matrix,
        )
    }
}
