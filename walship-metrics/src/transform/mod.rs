// walship - bitdrift's prometheus to cloud monitoring shipper
// Copyright Bitdrift, Inc. All rights reserved.
//
// Use of this source code is governed by a source available license that can be found in the
// LICENSE file or at:
// https://polyformproject.org/wp-content/uploads/2020/06/PolyForm-Shield-1.0.0.txt


mod distribution;

use crate::series::{MetricSuffix, MetricType, SeriesGetter};
use std::sync::Arc;
use thiserror::Error;
use walship_common::labels::{Label, LabelSet, BUCKET_LABEL, METRIC_NAME_LABEL};
use walship_common::sample::RefSample;
use walship_common::time::timestamp_from_millis;
use walship_protobuf::protos::google::api::metric_descriptor::ValueType;
use walship_protobuf::protos::google::monitoring::typed_value::Value;
use walship_protobuf::protos::google::monitoring::{Point, TimeInterval, TimeSeries, TypedValue};

//
// TransformError
//

// Failures surfaced by the sample builder. Everything data dependent (NaN, missing series,
// missing baseline, unparseable bounds, gate refusal) is a silent drop instead; the builder
// itself never logs.
#[derive(Debug, Error)]
pub enum TransformError {
  // Transient directory failure. The input stream is returned unconsumed so the caller can
  // retry the same position.
  #[error("get series information: {0}")]
  Series(#[source] anyhow::Error),
  // A summary component series carrying a suffix with no point mapping.
  #[error("unexpected metric name suffix {0:?}")]
  UnexpectedSuffix(MetricSuffix),
  // A declared metric type with no point mapping.
  #[error("unexpected metric type {0:?}")]
  UnexpectedType(MetricType),
}

//
// BuiltSample
//

// A ready to ship time series value, together with the series identity hash the shard queues
// key on.
#[derive(Clone, Debug, PartialEq)]
pub struct BuiltSample {
  pub series: TimeSeries,
  pub hash: u64,
}

// Outcome of one builder step: the point (if any) and the unconsumed remainder of the input.
pub type NextResult<'a> = (Result<Option<BuiltSample>, TransformError>, &'a [RefSample]);

//
// SampleBuilder
//

// Converts the raw WAL sample stream into backend time series values, one step at a time.
// next() consumes at least one leading sample unless it fails, and reports the remainder;
// histogram families consume their whole contiguous prefix. Callers re-invoke with the
// remainder until the stream is empty.
pub struct SampleBuilder {
  series: Arc<dyn SeriesGetter>,
}

impl SampleBuilder {
  #[must_use]
  pub fn new(series: Arc<dyn SeriesGetter>) -> Self {
    Self { series }
  }

  // Extract the next point from the non-empty input stream and return the remainder.
  pub async fn next<'a>(&self, samples: &'a [RefSample]) -> NextResult<'a> {
    let sample = &samples[0];
    let mut tail = &samples[1 ..];

    // Stale markers terminate a series; there is nothing to emit for them.
    if sample.value.is_nan() {
      return (Ok(None), tail);
    }

    let entry = match self.series.get(sample.series_ref).await {
      Ok(Some(entry)) => entry,
      Ok(None) => return (Ok(None), tail),
      Err(e) => return (Err(TransformError::Series(e)), samples),
    };

    if let Some(tracker) = &entry.tracker {
      tracker.new_point(&entry.lset, sample.timestamp, sample.value);
    }

    if !entry.exported {
      return (Ok(None), tail);
    }

    let mut interval = TimeInterval {
      end_time: Some(timestamp_from_millis(sample.timestamp)),
      start_time: None,
    };
    let mut reset_timestamp = 0;
    let value;

    match entry.metadata.metric_type {
      MetricType::Counter => {
        let Some((rt, v)) =
          self
            .series
            .get_reset_adjusted(sample.series_ref, sample.timestamp, sample.value)
        else {
          return (Ok(None), tail);
        };
        reset_timestamp = rt;
        interval.start_time = Some(timestamp_from_millis(rt));
        value = build_typed_value(entry.metadata.value_type, v);
      },
      MetricType::Gauge | MetricType::Untyped => {
        value = build_typed_value(entry.metadata.value_type, sample.value);
      },
      MetricType::Summary => match entry.suffix {
        Some(MetricSuffix::Sum) => {
          let Some((rt, v)) =
            self
              .series
              .get_reset_adjusted(sample.series_ref, sample.timestamp, sample.value)
          else {
            return (Ok(None), tail);
          };
          reset_timestamp = rt;
          interval.start_time = Some(timestamp_from_millis(rt));
          value = TypedValue {
            value: Some(Value::DoubleValue(v)),
          };
        },
        Some(MetricSuffix::Count) => {
          let Some((rt, v)) =
            self
              .series
              .get_reset_adjusted(sample.series_ref, sample.timestamp, sample.value)
          else {
            return (Ok(None), tail);
          };
          reset_timestamp = rt;
          interval.start_time = Some(timestamp_from_millis(rt));
          #[allow(clippy::cast_possible_truncation)]
          let count = v as i64;
          value = TypedValue {
            value: Some(Value::Int64Value(count)),
          };
        },
        // Actual quantiles.
        None => {
          value = TypedValue {
            value: Some(Value::DoubleValue(sample.value)),
          };
        },
        Some(suffix) => return (Err(TransformError::UnexpectedSuffix(suffix)), tail),
      },
      MetricType::Histogram => {
        // Match against the full original label set; the whole family shares the target
        // labels.
        let (result, rest) = self
          .build_distribution(&entry.metadata.metric, &entry.lset, samples)
          .await;
        tail = rest;
        match result {
          Err(e) => return (Err(e), tail),
          Ok(None) => return (Ok(None), tail),
          Ok(Some((dist, rt))) => {
            reset_timestamp = rt;
            interval.start_time = Some(timestamp_from_millis(rt));
            value = TypedValue {
              value: Some(Value::DistributionValue(dist)),
            };
          },
        }
      },
      MetricType::GaugeHistogram | MetricType::Info | MetricType::Stateset => {
        return (
          Err(TransformError::UnexpectedType(entry.metadata.metric_type)),
          &samples[1 ..],
        );
      },
    }

    if !self
      .series
      .update_sample_interval(entry.hash, reset_timestamp, sample.timestamp)
    {
      return (Ok(None), tail);
    }

    // Clone the pre-populated skeleton so the template stays stable for concurrent readers and
    // emissions never alias each other's points.
    let mut series = entry.proto.clone();
    series.points.push(Point {
      interval: Some(interval),
      value: Some(value),
    });
    (
      Ok(Some(BuiltSample {
        series,
        hash: entry.hash,
      })),
      tail,
    )
  }
}

// The discriminated point value for a declared value type. Int64 is the only integral
// destination and rounds to nearest, ties away from zero; everything else emits the double
// as is.
#[must_use]
pub fn build_typed_value(value_type: ValueType, v: f64) -> TypedValue {
  if value_type == ValueType::Int64 {
    #[allow(clippy::cast_possible_truncation)]
    let rounded = v.round() as i64;
    return TypedValue {
      value: Some(Value::Int64Value(rounded)),
    };
  }
  TypedValue {
    value: Some(Value::DoubleValue(v)),
  }
}

// Whether two label sets identify the same histogram family, i.e. are equal aside from their
// le and __name__ labels.
#[must_use]
pub fn histogram_labels_equal(a: &LabelSet, b: &LabelSet) -> bool {
  fn skipped(label: &Label) -> bool {
    label.name.as_ref() == BUCKET_LABEL || label.name.as_ref() == METRIC_NAME_LABEL
  }

  let a = a.as_slice();
  let b = b.as_slice();
  let (mut i, mut j) = (0, 0);
  while i < a.len() && j < b.len() {
    if skipped(&a[i]) {
      i += 1;
      continue;
    }
    if skipped(&b[j]) {
      j += 1;
      continue;
    }
    if a[i] != b[j] {
      return false;
    }
    i += 1;
    j += 1;
  }
  // Drain trailing skipped labels so the exhaustion check below holds for sets that only
  // differ in them.
  while i < a.len() && skipped(&a[i]) {
    i += 1;
  }
  while j < b.len() && skipped(&b[j]) {
    j += 1;
  }
  i == a.len() && j == b.len()
}
