// walship - bitdrift's prometheus to cloud monitoring shipper
// Copyright Bitdrift, Inc. All rights reserved.
//
// Use of this source code is governed by a source available license that can be found in the
// LICENSE file or at:
// https://polyformproject.org/wp-content/uploads/2020/06/PolyForm-Shield-1.0.0.txt

use crate::config::ExportConfig;
use crate::series::cache::SeriesCache;
use crate::series::{MetricMetadata, MetricType, SampleTracker};
use crate::transform::SampleBuilder;
use prometheus::Registry;
use std::sync::Arc;
use walship_common::labels::{Label, LabelSet};
use walship_common::sample::RefSample;
use walship_protobuf::protos::google::api::metric_descriptor::ValueType;

#[must_use]
pub fn make_label(name: &str, value: &str) -> Label {
  Label::new(name.to_string(), value.to_string())
}

#[must_use]
pub fn make_lset(labels: &[(&str, &str)]) -> LabelSet {
  LabelSet::new(
    labels
      .iter()
      .map(|(name, value)| make_label(name, value))
      .collect(),
  )
}

#[must_use]
pub const fn make_sample(series_ref: u64, timestamp: i64, value: f64) -> RefSample {
  RefSample::new(series_ref, timestamp, value)
}

//
// TransformHelper
//

// A sample builder wired to a real series cache, for tests that drive the full transformation
// path.
pub struct TransformHelper {
  pub cache: Arc<SeriesCache>,
  pub builder: SampleBuilder,
}

impl Default for TransformHelper {
  fn default() -> Self {
    let cache = Arc::new(SeriesCache::new(&ExportConfig::default(), &Registry::new()));
    Self {
      builder: SampleBuilder::new(cache.clone()),
      cache,
    }
  }
}

impl TransformHelper {
  pub fn series(
    &self,
    series_ref: u64,
    labels: &[(&str, &str)],
    metric: &str,
    metric_type: MetricType,
    value_type: ValueType,
  ) {
    self.series_with(series_ref, labels, metric, metric_type, value_type, true, None);
  }

  #[allow(clippy::too_many_arguments)]
  pub fn series_with(
    &self,
    series_ref: u64,
    labels: &[(&str, &str)],
    metric: &str,
    metric_type: MetricType,
    value_type: ValueType,
    exported: bool,
    tracker: Option<Arc<dyn SampleTracker>>,
  ) {
    self.cache.set_series(
      series_ref,
      make_lset(labels),
      MetricMetadata {
        metric: metric.to_string(),
        metric_type,
        value_type,
      },
      exported,
      tracker,
    );
  }

  // Register the five component series of a histogram family named "foo" with bounds 1, 2 and
  // +Inf, starting at the given series ref.
  pub fn histogram_family(&self, base_ref: u64) {
    for (offset, le) in ["1", "2", "+Inf"].iter().enumerate() {
      self.series(
        base_ref + offset as u64,
        &[("__name__", "foo_bucket"), ("job", "test"), ("le", le)],
        "foo",
        MetricType::Histogram,
        ValueType::Double,
      );
    }
    self.series(
      base_ref + 3,
      &[("__name__", "foo_sum"), ("job", "test")],
      "foo",
      MetricType::Histogram,
      ValueType::Double,
    );
    self.series(
      base_ref + 4,
      &[("__name__", "foo_count"), ("job", "test")],
      "foo",
      MetricType::Histogram,
      ValueType::Double,
    );
  }
}
