// walship - bitdrift's prometheus to cloud monitoring shipper
// Copyright Bitdrift, Inc. All rights reserved.
//
// Use of this source code is governed by a source available license that can be found in the
// LICENSE file or at:
// https://polyformproject.org/wp-content/uploads/2020/06/PolyForm-Shield-1.0.0.txt

#[cfg(test)]
#[path = "./distribution_test.rs"]
mod distribution_test;

use super::{histogram_labels_equal, SampleBuilder, TransformError};
use walship_common::labels::{LabelSet, BUCKET_LABEL};
use walship_common::sample::RefSample;
use walship_protobuf::protos::google::api::distribution::bucket_options::{Explicit, Options};
use walship_protobuf::protos::google::api::distribution::BucketOptions;
use walship_protobuf::protos::google::api::Distribution;

// Scratch space for one histogram family: parallel cumulative bucket bounds and counts, in
// scrape order.
#[derive(Default)]
struct Scratch {
  bounds: Vec<f64>,
  values: Vec<i64>,
}

// Outcome of one family fold: the distribution and its reset timestamp (None while the family
// has no usable baseline), and the unconsumed remainder of the input.
pub(super) type DistributionResult<'a> = (
  Result<Option<(Distribution, i64)>, TransformError>,
  &'a [RefSample],
);

impl SampleBuilder {
  // Consume the contiguous prefix of samples that belongs to the histogram family with the
  // given base name and label set, and fold it into a single distribution. The consumed prefix
  // is reported even when nothing is emitted so the caller advances past the family.
  pub(super) async fn build_distribution<'a>(
    &self,
    base_name: &str,
    match_lset: &LabelSet,
    samples: &'a [RefSample],
  ) -> DistributionResult<'a> {
    let mut consumed = 0;
    let mut count = 0.0;
    let mut sum = 0.0;
    let mut reset_timestamp = 0;
    let mut last_timestamp = 0;
    let mut scratch = Scratch::default();
    let mut skip = false;

    // All series belonging to one histogram are emitted back to back by the scraper; consume
    // until a sample no longer matches the family.
    for (i, s) in samples.iter().enumerate() {
      let entry = match self.series.get(s.series_ref).await {
        Ok(Some(entry)) => entry,
        Ok(None) => {
          consumed += 1;
          continue;
        },
        Err(e) => return (Err(TransformError::Series(e)), samples),
      };

      let name = entry.lset.name();
      if !name.starts_with(base_name.as_bytes())
        || !histogram_labels_equal(&entry.lset, match_lset)
      {
        break;
      }

      // A well formed scrape never repeats a family at a second timestamp, but a bad client
      // can. Close the distribution at the timestamp boundary and leave the repeat untouched
      // on the input.
      if i > 0 && s.timestamp != last_timestamp {
        break;
      }
      last_timestamp = s.timestamp;

      let adjusted = self
        .series
        .get_reset_adjusted(s.series_ref, s.timestamp, s.value);
      let v = adjusted.map_or(0.0, |(_, v)| v);

      match &name[base_name.len() ..] {
        b"_sum" => sum = v,
        b"_count" => {
          count = v;
          // The count series is the authoritative source for the overall reset timestamp.
          if let Some((rt, _)) = adjusted {
            reset_timestamp = rt;
          }
        },
        b"_bucket" => {
          let upper = entry
            .lset
            .get(BUCKET_LABEL)
            .and_then(|le| std::str::from_utf8(le).ok())
            .and_then(|le| le.parse::<f64>().ok());
          let Some(upper) = upper else {
            consumed += 1;
            continue;
          };
          scratch.bounds.push(upper);
          #[allow(clippy::cast_possible_truncation)]
          scratch.values.push(v as i64);
        },
        _ => break,
      }

      // A series seen for the first time has no baseline yet. That happens for brand new
      // histograms and for bucket layout changes; skip the whole family sample and pick it up
      // on the next scrape, which has a defined baseline.
      if adjusted.is_none() {
        skip = true;
      }
      consumed += 1;
    }

    // Nothing to emit if the family was skipped or no anchored count series was seen.
    if skip || reset_timestamp == 0 {
      return (Ok(None), &samples[consumed ..]);
    }

    // Buckets within the scrape are not guaranteed to be ordered; the cumulative to delta
    // lowering below requires ascending bounds.
    let mut buckets: Vec<(f64, i64)> = scratch.bounds.into_iter().zip(scratch.values).collect();
    buckets.sort_unstable_by(|a, b| a.0.total_cmp(&b.0));

    let mut bounds = Vec::with_capacity(buckets.len());
    let mut values = Vec::with_capacity(buckets.len());
    let mean = if count > 0.0 { sum / count } else { 0.0 };
    let mut dev = 0.0;
    let mut lower = 0.0;
    let mut prev_val = 0;

    for (upper, cumulative) in buckets {
      // The overflow bound is implied by the extra counts entry and is not emitted. Its
      // representative value for the deviation term is the previous finite bound, which keeps
      // the term finite.
      let upper = if upper == f64::INFINITY {
        lower
      } else {
        bounds.push(upper);
        upper
      };

      let val = cumulative - prev_val;
      let x = (lower + upper) / 2.0;
      #[allow(clippy::cast_precision_loss)]
      {
        dev += val as f64 * (x - mean) * (x - mean);
      }

      lower = upper;
      prev_val = cumulative;
      values.push(val);
    }

    #[allow(clippy::cast_possible_truncation)]
    let distribution = Distribution {
      count: count as i64,
      mean,
      sum_of_squared_deviation: dev,
      bucket_options: Some(BucketOptions {
        options: Some(Options::ExplicitBuckets(Explicit { bounds })),
      }),
      bucket_counts: values,
    };
    (Ok(Some((distribution, reset_timestamp))), &samples[consumed ..])
  }
}
