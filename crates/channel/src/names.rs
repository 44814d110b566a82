//! Bidirectional label ↔ index mapping for channel alphabets.

use std::collections::HashMap;

use serde::{Serialize, Serializer};

use crate::error::{ChannelError, Result};

/// An ordered alphabet of unique labels together with its inverse map.
///
/// Invariant: for every index `i`, `index_of(&labels[i]) == Ok(i)`, and the
/// map holds exactly one entry per label. The only way to obtain a
/// `NameIndex` is through a constructor that checks this, so the two halves
/// can never drift apart.
///
/// # Example
///
/// ```rust
/// use qif_channel::NameIndex;
///
/// let names = NameIndex::new(vec!["low".into(), "high".into()]).unwrap();
/// assert_eq!(names.index_of("high").unwrap(), 1);
/// assert!(NameIndex::new(vec!["a".into(), "a".into()]).is_err());
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NameIndex {
    labels: Vec<String>,
    positions: HashMap<String, usize>,
}

impl NameIndex {
    /// Build an index from an ordered label sequence.
    ///
    /// # Errors
    ///
    /// - [`ChannelError::DuplicateLabel`] if a label repeats
    /// - [`ChannelError::InvalidLabel`] if a label is empty or contains
    ///   whitespace (it could not survive the text encoding)
    ///
    /// Labels may contain [`LABEL_SEPARATOR`](crate::LABEL_SEPARATOR), which
    /// composed alphabets use themselves (`1.y0`, `a.b`). Joining is not
    /// injective across such labels: `a` + `b.c` and `a.b` + `c` both give
    /// `a.b.c`, and [`Channel::parallel`](crate::Channel::parallel) reports
    /// the clash as [`ChannelError::DuplicateLabel`]. Relabel an operand
    /// with [`Channel::set_out_names`](crate::Channel::set_out_names) to
    /// compose it.
    pub fn new(labels: Vec<String>) -> Result<Self> {
        let mut positions = HashMap::with_capacity(labels.len());
        for (i, label) in labels.iter().enumerate() {
            if label.is_empty() || label.chars().any(char::is_whitespace) {
                return Err(ChannelError::InvalidLabel {
                    label: label.clone(),
                });
            }
            if positions.insert(label.clone(), i).is_some() {
                return Err(ChannelError::DuplicateLabel {
                    label: label.clone(),
                });
            }
        }
        Ok(Self { labels, positions })
    }

    /// Default labels `prefix0, prefix1, ..., prefix{n-1}`.
    pub fn numbered(prefix: &str, n: usize) -> Self {
        let labels: Vec<String> = (0..n).map(|i| format!("{prefix}{i}")).collect();
        let positions = labels
            .iter()
            .enumerate()
            .map(|(i, l)| (l.clone(), i))
            .collect();
        Self { labels, positions }
    }

    /// Position of `label` in the alphabet.
    pub fn index_of(&self, label: &str) -> Result<usize> {
        self.positions
            .get(label)
            .copied()
            .ok_or_else(|| ChannelError::LabelNotFound {
                label: label.to_string(),
            })
    }

    /// Whether `label` belongs to the alphabet.
    pub fn contains(&self, label: &str) -> bool {
        self.positions.contains_key(label)
    }

    /// Label at index `i`, if any.
    pub fn get(&self, i: usize) -> Option<&str> {
        self.labels.get(i).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.labels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }

    /// Labels in index order.
    pub fn labels(&self) -> &[String] {
        &self.labels
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.labels.iter().map(String::as_str)
    }
}

impl Serialize for NameIndex {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        self.labels.serialize(serializer)
    }
}
