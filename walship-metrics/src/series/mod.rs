// walship - bitdrift's prometheus to cloud monitoring shipper
// Copyright Bitdrift, Inc. All rights reserved.
//
// Use of this source code is governed by a source available license that can be found in the
// LICENSE file or at:
// https://polyformproject.org/wp-content/uploads/2020/06/PolyForm-Shield-1.0.0.txt


pub mod cache;

use async_trait::async_trait;
use mockall::automock;
use std::sync::Arc;
use walship_common::labels::LabelSet;
use walship_protobuf::protos::google::api::metric_descriptor::ValueType;
use walship_protobuf::protos::google::monitoring::TimeSeries;

//
// MetricType
//

// Semantic metric type reported by metadata discovery for a metric family. Individual WAL
// samples carry no type; this drives how the sample builder reconstructs points. The last three
// variants exist in the exposition formats but have no point mapping and fail transformation.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum MetricType {
  Counter,
  Gauge,
  Untyped,
  Summary,
  Histogram,
  GaugeHistogram,
  Info,
  Stateset,
}

//
// MetricSuffix
//

// Compound suffixes of summary and histogram component series. Classification order matters:
// _bucket is tested before _count so a metric literally named foo_count_bucket classifies as a
// bucket of foo_count.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum MetricSuffix {
  Bucket,
  Count,
  Sum,
  Total,
}

impl MetricSuffix {
  const ORDERED: &'static [Self] = &[Self::Bucket, Self::Count, Self::Sum, Self::Total];

  #[must_use]
  pub const fn as_bytes(self) -> &'static [u8] {
    match self {
      Self::Bucket => b"_bucket",
      Self::Count => b"_count",
      Self::Sum => b"_sum",
      Self::Total => b"_total",
    }
  }

  // Strip the first matching compound suffix from a metric name, returning the base name and
  // the classified suffix.
  #[must_use]
  pub fn strip(name: &[u8]) -> (&[u8], Option<Self>) {
    for suffix in Self::ORDERED {
      if let Some(prefix) = name.strip_suffix(suffix.as_bytes()) {
        return (prefix, Some(*suffix));
      }
    }
    (name, None)
  }
}

//
// MetricMetadata
//

// Metadata for a metric family as reported by the metadata discovery collaborator. metric is
// the base family name shared by all component series.
#[derive(Clone, Debug)]
pub struct MetricMetadata {
  pub metric: String,
  pub metric_type: MetricType,
  pub value_type: ValueType,
}

//
// SampleTracker
//

// Observability hook invoked with every raw sample of a tracked series, before export
// filtering.
pub trait SampleTracker: Send + Sync {
  fn new_point(&self, lset: &LabelSet, t: i64, v: f64);
}

//
// SeriesEntry
//

// Resolved information for one WAL series reference. proto is the pre-populated time series
// skeleton; the sample builder clones it and attaches the point, so it must never be mutated
// after construction.
#[derive(Clone)]
pub struct SeriesEntry {
  pub lset: LabelSet,
  pub metadata: MetricMetadata,
  pub suffix: Option<MetricSuffix>,
  pub exported: bool,
  pub proto: TimeSeries,
  pub hash: u64,
  pub tracker: Option<Arc<dyn SampleTracker>>,
}

//
// SeriesGetter
//

// The narrow interface the sample builder reads series state through. get() may suspend on
// metadata fetch or cache fill and owns cancellation of those lookups; the reset and interval
// state accessors are synchronous and guard their own state.
#[automock]
#[async_trait]
pub trait SeriesGetter: Send + Sync {
  // Resolve a WAL series reference to its entry. Ok(None) is a benign miss and the caller
  // drops the sample; an error is transient and the caller retries with the same stream.
  async fn get(&self, series_ref: u64) -> anyhow::Result<Option<Arc<SeriesEntry>>>;

  // The reset timestamp and the cumulative value rebased to the current reset epoch. None
  // means the series has no baseline yet and the sample must be dropped.
  fn get_reset_adjusted(&self, series_ref: u64, t: i64, v: f64) -> Option<(i64, f64)>;

  // Interval gate. Returns false if the point for this series hash must be suppressed, e.g.
  // because the sample is not strictly newer than the last accepted emission.
  fn update_sample_interval(&self, hash: u64, reset_timestamp: i64, sample_time: i64) -> bool;
}
