//! Plain-text encoding of channels.
//!
//! ```text
//! name
//! n_in n_out
//! base_norm
//! in_label_0 ... in_label_{n_in-1}
//! out_label_0 ... out_label_{n_out-1}
//! c[0][0] ... c[0][n_out-1]
//! ...
//! c[n_in-1][0] ... c[n_in-1][n_out-1]
//! prior[0] ... prior[n_in-1]
//! ```
//!
//! Probabilities are written with 8 fractional digits.

use std::fmt;
use std::path::Path;
use std::str::FromStr;

use tracing::debug;

use crate::channel::Channel;
use crate::channel::check_name;
use crate::error::{ChannelError, Result};
use crate::model::MatrixModel;
use crate::names::NameIndex;
use crate::PROB_TOLERANCE;

/// Fractional digits written for every probability.
pub const PRECISION: usize = 8;

/// Line of the first matrix row (1-based).
const FIRST_ROW_LINE: usize = 6;

/// Largest drift of a sum of `n` entries that were each rounded to
/// [`PRECISION`] digits, never tighter than [`PROB_TOLERANCE`].
fn rounding_tolerance(n: usize) -> f64 {
    PROB_TOLERANCE.max(n as f64 * 10f64.powi(-(PRECISION as i32)))
}

fn write_row<T: fmt::Display>(f: &mut fmt::Formatter<'_>, items: &[T]) -> fmt::Result {
    for (k, item) in items.iter().enumerate() {
        if k > 0 {
            f.write_str(" ")?;
        }
        write!(f, "{item}")?;
    }
    writeln!(f)
}

fn write_probs(f: &mut fmt::Formatter<'_>, probs: &[f64]) -> fmt::Result {
    let formatted: Vec<String> = probs.iter().map(|p| format!("{:.*}", PRECISION, p)).collect();
    write_row(f, &formatted)
}

impl fmt::Display for Channel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{}", self.name())?;
        writeln!(f, "{} {}", self.n_in(), self.n_out())?;
        writeln!(f, "{}", self.base_norm())?;
        write_row(f, self.in_names())?;
        write_row(f, self.out_names())?;
        for row in self.c_matrix() {
            write_probs(f, row)?;
        }
        write_probs(f, self.prior())
    }
}

/// Line-by-line reader that remembers where it is for error messages.
struct Lines<'a> {
    lines: Vec<&'a str>,
    pos: usize,
}

impl<'a> Lines<'a> {
    fn new(text: &'a str) -> Self {
        let mut lines: Vec<&str> = text.lines().collect();
        while lines.last().is_some_and(|l| l.trim().is_empty()) {
            lines.pop();
        }
        Self { lines, pos: 0 }
    }

    /// Next line and its 1-based number.
    fn next(&mut self, field: &str) -> Result<(usize, &'a str)> {
        let line = self.pos + 1;
        let text = self.lines.get(self.pos).copied().ok_or_else(|| ChannelError::Parse {
            line,
            reason: format!("unexpected end of input, expected {field}"),
        })?;
        self.pos += 1;
        Ok((line, text))
    }

    /// Next line split into exactly `count` whitespace-separated tokens.
    fn tokens(&mut self, field: &str, count: usize) -> Result<(usize, Vec<&'a str>)> {
        let (line, text) = self.next(field)?;
        let tokens: Vec<&str> = text.split_whitespace().collect();
        if tokens.len() != count {
            return Err(ChannelError::Parse {
                line,
                reason: format!("expected {count} {field}, got {}", tokens.len()),
            });
        }
        Ok((line, tokens))
    }

    fn finish(&self) -> Result<()> {
        if self.pos < self.lines.len() {
            return Err(ChannelError::Parse {
                line: self.pos + 1,
                reason: "unexpected trailing content".to_string(),
            });
        }
        Ok(())
    }
}

fn parse_number<T>(line: usize, field: &str, token: &str) -> Result<T>
where
    T: FromStr,
    T::Err: fmt::Display,
{
    token.parse().map_err(|e| ChannelError::Parse {
        line,
        reason: format!("invalid {field} {token:?}: {e}"),
    })
}

fn parse_labels(lines: &mut Lines<'_>, field: &str, count: usize) -> Result<NameIndex> {
    let (line, tokens) = lines.tokens(field, count)?;
    NameIndex::new(tokens.into_iter().map(str::to_string).collect()).map_err(|e| {
        ChannelError::Parse {
            line,
            reason: e.to_string(),
        }
    })
}

fn parse_probs(lines: &mut Lines<'_>, field: &str, count: usize) -> Result<Vec<f64>> {
    let (line, tokens) = lines.tokens(field, count)?;
    tokens
        .into_iter()
        .map(|t| parse_number(line, field, t))
        .collect()
}

/// Attach the line of the offending row/prior to a validation error.
fn locate(err: ChannelError, n_in: usize) -> ChannelError {
    let prior_line = FIRST_ROW_LINE + n_in;
    let (line, reason) = match &err {
        ChannelError::RaggedMatrix { row, .. }
        | ChannelError::RowNotNormalized { row, .. }
        | ChannelError::NegativeProbability { row, col: Some(_) }
        | ChannelError::NonFinite { row, col: Some(_) } => (FIRST_ROW_LINE + row, err.to_string()),
        _ => (prior_line, err.to_string()),
    };
    ChannelError::Parse { line, reason }
}

impl Channel {
    /// Decode a channel from its text encoding.
    ///
    /// # Errors
    ///
    /// [`ChannelError::Parse`] naming the offending line for any structural
    /// or numeric problem, including a matrix or prior that is not
    /// stochastic. Nothing is constructed on failure.
    ///
    /// Row and prior sums may drift from 1 by the rounding of every entry
    /// to [`PRECISION`] digits, so wide channels decode what they encode.
    ///
    /// # Example
    ///
    /// ```rust
    /// use qif_channel::Channel;
    ///
    /// let text = "coin\n2 2\n0\nh t\nH T\n1 0\n0 1\n0.5 0.5\n";
    /// let c = Channel::from_text(text).unwrap();
    /// assert_eq!(c.name(), "coin");
    /// assert_eq!(c.out_index("T").unwrap(), 1);
    /// ```
    pub fn from_text(text: &str) -> Result<Self> {
        let mut lines = Lines::new(text);

        let (line, name) = lines.next("channel name")?;
        check_name(name).map_err(|e| ChannelError::Parse {
            line,
            reason: e.to_string(),
        })?;

        let (line, dims) = lines.tokens("dimensions", 2)?;
        let n_in: usize = parse_number(line, "n_in", dims[0])?;
        let n_out: usize = parse_number(line, "n_out", dims[1])?;
        if n_in == 0 || n_out == 0 {
            return Err(ChannelError::Parse {
                line,
                reason: format!("dimensions must be positive, got {n_in} {n_out}"),
            });
        }

        let (line, norm) = lines.tokens("base_norm", 1)?;
        let base_norm: u64 = parse_number(line, "base_norm", norm[0])?;

        let inputs = parse_labels(&mut lines, "input labels", n_in)?;
        let outputs = parse_labels(&mut lines, "output labels", n_out)?;

        let c_matrix = (0..n_in)
            .map(|_| parse_probs(&mut lines, "matrix entries", n_out))
            .collect::<Result<Vec<_>>>()?;
        let prior = parse_probs(&mut lines, "prior entries", n_in)?;
        lines.finish()?;

        let model = MatrixModel::build(c_matrix, prior).map_err(|e| locate(e, n_in))?;
        model
            .validate_stochastic_within(rounding_tolerance(n_in.max(n_out)))
            .map_err(|e| locate(e, n_in))?;

        debug!(n_in, n_out, channel = name, "decoded channel");
        Channel::from_parts(name.to_string(), base_norm, inputs, outputs, model)
    }

    /// The text encoding; inverse of [`Channel::from_text`] up to
    /// [`PRECISION`] fractional digits.
    pub fn to_text(&self) -> String {
        self.to_string()
    }

    /// Read a whole file and decode it.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|source| ChannelError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_text(&text)
    }

    /// Write the text encoding to a file.
    pub fn write_file(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        std::fs::write(path, self.to_text()).map_err(|source| ChannelError::Io {
            path: path.to_path_buf(),
            source,
        })
    }
}

impl FromStr for Channel {
    type Err = ChannelError;

    fn from_str(s: &str) -> Result<Self> {
        Self::from_text(s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = "\
pin check
2 3
17
ok bad
a b c
0.50000000 0.25000000 0.25000000
0.00000000 0.00000000 1.00000000
0.30000000 0.70000000
";

    fn parse_err_line(text: &str) -> usize {
        match Channel::from_text(text) {
            Err(ChannelError::Parse { line, .. }) => line,
            other => panic!("expected parse error, got {other:?}"),
        }
    }

    #[test]
    fn test_parse_sample() {
        let c: Channel = SAMPLE.parse().unwrap();
        assert_eq!(c.name(), "pin check");
        assert_eq!((c.n_in(), c.n_out()), (2, 3));
        assert_eq!(c.base_norm(), 17);
        assert_eq!(c.in_index("bad").unwrap(), 1);
        assert_eq!(c.out_names(), ["a", "b", "c"]);
        assert_eq!(c.c_matrix()[0], vec![0.5, 0.25, 0.25]);
        assert_eq!(c.prior(), &[0.3, 0.7]);
        assert!((c.out_distribution()[2] - (0.3 * 0.25 + 0.7)).abs() < 1e-12);
    }

    #[test]
    fn test_encode_matches_layout() {
        let c: Channel = SAMPLE.parse().unwrap();
        assert_eq!(c.to_text(), SAMPLE);
    }

    #[test]
    fn test_empty_name_round_trips() {
        let c = Channel::new(vec![vec![1.0]]).unwrap();
        let text = c.to_text();
        assert!(text.starts_with('\n'));
        let back = Channel::from_text(&text).unwrap();
        assert_eq!(back.name(), "");
    }

    #[test]
    fn test_name_whitespace_preserved() {
        let c = Channel::new(vec![vec![1.0]]).unwrap().with_name("  spaced out ").unwrap();
        let back = Channel::from_text(&c.to_text()).unwrap();
        assert_eq!(back.name(), "  spaced out ");
    }

    #[test]
    fn test_carriage_return_in_name_rejected() {
        let err = Channel::from_text("a\rb\n1 1\n0\nx\ny\n1\n1\n").unwrap_err();
        assert!(matches!(&err, ChannelError::Parse { line: 1, reason } if reason.contains("line breaks")));
    }

    #[test]
    fn test_wide_row_round_trips() {
        let c = Channel::new(vec![vec![1.0 / 600.0; 600]]).unwrap();
        let back = Channel::from_text(&c.to_text()).unwrap();
        assert_eq!(back.n_out(), 600);
        for (a, b) in c.c_matrix()[0].iter().zip(&back.c_matrix()[0]) {
            assert!((a - b).abs() < 1e-8);
        }
    }

    #[test]
    fn test_wide_parallel_composition_round_trips() {
        let third = Channel::new(vec![vec![1.0 / 3.0; 3]; 2]).unwrap();
        let mut wide = third.clone();
        for _ in 0..5 {
            wide = wide.parallel(&third).unwrap();
        }
        assert_eq!(wide.n_out(), 729);
        let back = Channel::from_text(&wide.to_text()).unwrap();
        assert_eq!(back.out_names(), wide.out_names());
        for (r1, r2) in wide.c_matrix().iter().zip(back.c_matrix()) {
            for (a, b) in r1.iter().zip(r2) {
                assert!((a - b).abs() < 1e-8);
            }
        }
    }

    #[test]
    fn test_narrow_rows_keep_strict_tolerance() {
        let text = SAMPLE.replace("0.00000000 0.00000000 1.00000000", "0.00000000 0.00000000 1.00001000");
        assert_eq!(parse_err_line(&text), 7);
    }

    #[test]
    fn test_trailing_blank_lines_accepted() {
        let text = format!("{SAMPLE}\n\n");
        assert!(Channel::from_text(&text).is_ok());
    }

    #[test]
    fn test_truncated_input() {
        let text: String = SAMPLE.lines().take(6).map(|l| format!("{l}\n")).collect();
        assert_eq!(parse_err_line(&text), 7);
    }

    #[test]
    fn test_bad_dimensions() {
        assert_eq!(parse_err_line("c\n2\n0\n"), 2);
        assert_eq!(parse_err_line("c\ntwo 2\n0\n"), 2);
        assert_eq!(parse_err_line("c\n0 2\n0\n"), 2);
    }

    #[test]
    fn test_bad_base_norm() {
        assert_eq!(parse_err_line("c\n1 1\n-3\nx\ny\n1\n1\n"), 3);
    }

    #[test]
    fn test_wrong_label_count() {
        let text = SAMPLE.replace("ok bad", "ok");
        assert_eq!(parse_err_line(&text), 4);
    }

    #[test]
    fn test_duplicate_label() {
        let text = SAMPLE.replace("a b c", "a b a");
        let err = Channel::from_text(&text).unwrap_err();
        assert!(matches!(&err, ChannelError::Parse { line: 5, reason } if reason.contains("Duplicate")));
    }

    #[test]
    fn test_bad_number() {
        let text = SAMPLE.replace("0.00000000 0.00000000 1.00000000", "0.0 zero 1.0");
        let err = Channel::from_text(&text).unwrap_err();
        assert!(matches!(&err, ChannelError::Parse { line: 7, reason } if reason.contains("zero")));
    }

    #[test]
    fn test_row_not_stochastic_reports_line() {
        let text = SAMPLE.replace("0.00000000 0.00000000 1.00000000", "0.1 0.1 0.1");
        assert_eq!(parse_err_line(&text), 7);
    }

    #[test]
    fn test_prior_not_normalized_reports_line() {
        let text = SAMPLE.replace("0.30000000 0.70000000", "0.3 0.3");
        assert_eq!(parse_err_line(&text), 8);
    }

    #[test]
    fn test_trailing_content_rejected() {
        let text = format!("{SAMPLE}0.5 0.5\n");
        assert_eq!(parse_err_line(&text), 9);
    }

    #[test]
    fn test_missing_file() {
        let err = Channel::from_file("/nonexistent/dir/channel.txt").unwrap_err();
        assert!(matches!(err, ChannelError::Io { .. }));
    }
}
