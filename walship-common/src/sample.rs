// walship - bitdrift's prometheus to cloud monitoring shipper
// Copyright Bitdrift, Inc. All rights reserved.
//
// Use of this source code is governed by a source available license that can be found in the
// LICENSE file or at:
// https://polyformproject.org/wp-content/uploads/2020/06/PolyForm-Shield-1.0.0.txt

//
// RefSample
//

// A single value observed for a WAL series reference, with a millisecond epoch timestamp. A NaN
// value is the upstream stale marker and is dropped without emitting.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct RefSample {
  pub series_ref: u64,
  pub timestamp: i64,
  pub value: f64,
}

impl RefSample {
  #[must_use]
  pub const fn new(series_ref: u64, timestamp: i64, value: f64) -> Self {
    Self {
      series_ref,
      timestamp,
      value,
    }
  }
}
