// walship - bitdrift's prometheus to cloud monitoring shipper
// Copyright Bitdrift, Inc. All rights reserved.
//
// Use of this source code is governed by a source available license that can be found in the
// LICENSE file or at:
// https://polyformproject.org/wp-content/uploads/2020/06/PolyForm-Shield-1.0.0.txt

#[cfg(test)]
#[path = "./time_test.rs"]
mod time_test;

use prost_types::Timestamp;

const NANOS_PER_MILLI: i64 = 1_000_000;

// Convert a millisecond epoch into a protobuf timestamp. Total over all inputs; negative epochs
// follow the same truncating arithmetic.
#[must_use]
#[allow(clippy::cast_possible_truncation)]
pub const fn timestamp_from_millis(t: i64) -> Timestamp {
  Timestamp {
    seconds: t / 1000,
    nanos: ((t % 1000) * NANOS_PER_MILLI) as i32,
  }
}
