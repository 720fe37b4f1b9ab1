// walship - bitdrift's prometheus to cloud monitoring shipper
// Copyright Bitdrift, Inc. All rights reserved.
//
// Use of this source code is governed by a source available license that can be found in the
// LICENSE file or at:
// https://polyformproject.org/wp-content/uploads/2020/06/PolyForm-Shield-1.0.0.txt

#[cfg(test)]
#[path = "./labels_test.rs"]
mod labels_test;

use bytes::Bytes;
use std::fmt::Display;
use xxhash_rust::xxh64::Xxh64;

// The reserved label carrying the prometheus metric name.
pub const METRIC_NAME_LABEL: &[u8] = b"__name__";

// The reserved label carrying the upper bound of a cumulative histogram bucket series.
pub const BUCKET_LABEL: &[u8] = b"le";

//
// Label
//

// A single (name, value) pair of a series label set.
#[derive(Clone, Debug, Eq, Hash, Ord, PartialEq, PartialOrd)]
pub struct Label {
  pub name: Bytes,
  pub value: Bytes,
}

impl Label {
  pub fn new(name: impl Into<Bytes>, value: impl Into<Bytes>) -> Self {
    Self {
      name: name.into(),
      value: value.into(),
    }
  }
}

impl Display for Label {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    write!(
      f,
      "{}={}",
      String::from_utf8_lossy(&self.name),
      String::from_utf8_lossy(&self.value)
    )
  }
}

//
// LabelSet
//

// The sorted label set identifying one series. Construction sorts by label name so that lookups
// can binary search and equality is input order independent.
#[derive(Clone, Debug, Default, Eq, Hash, PartialEq)]
pub struct LabelSet {
  labels: Vec<Label>,
}

impl LabelSet {
  #[must_use]
  pub fn new(mut labels: Vec<Label>) -> Self {
    labels.sort_unstable();
    Self { labels }
  }

  pub fn get(&self, name: &[u8]) -> Option<&Bytes> {
    self
      .labels
      .binary_search_by(|l| l.name.as_ref().cmp(name))
      .ok()
      .map(|i| &self.labels[i].value)
  }

  // The value of the __name__ label, or empty if the set has none.
  #[must_use]
  pub fn name(&self) -> &[u8] {
    self.get(METRIC_NAME_LABEL).map_or(&[], |v| v.as_ref())
  }

  #[must_use]
  pub fn as_slice(&self) -> &[Label] {
    &self.labels
  }

  pub fn iter(&self) -> std::slice::Iter<'_, Label> {
    self.labels.iter()
  }

  #[must_use]
  pub fn len(&self) -> usize {
    self.labels.len()
  }

  #[must_use]
  pub fn is_empty(&self) -> bool {
    self.labels.is_empty()
  }

  // A stable identity hash over the sorted pairs. Length prefixing is not needed because label
  // names and values never contain the separator.
  #[must_use]
  pub fn hash64(&self) -> u64 {
    let mut hasher = Xxh64::new(0);
    for label in &self.labels {
      hasher.update(&label.name);
      hasher.update(b"\xff");
      hasher.update(&label.value);
      hasher.update(b"\xff");
    }
    hasher.digest()
  }
}

impl<'a> IntoIterator for &'a LabelSet {
  type IntoIter = std::slice::Iter<'a, Label>;
  type Item = &'a Label;

  fn into_iter(self) -> Self::IntoIter {
    self.labels.iter()
  }
}

impl Display for LabelSet {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    write!(f, "{}(", String::from_utf8_lossy(self.name()))?;
    for label in &self.labels {
      if label.name.as_ref() == METRIC_NAME_LABEL {
        continue;
      }
      write!(f, "[{label}]")?;
    }
    write!(f, ")")
  }
}
