// walship - bitdrift's prometheus to cloud monitoring shipper
// Copyright Bitdrift, Inc. All rights reserved.
//
// Use of this source code is governed by a source available license that can be found in the
// LICENSE file or at:
// https://polyformproject.org/wp-content/uploads/2020/06/PolyForm-Shield-1.0.0.txt

#[cfg(test)]
#[path = "./cache_test.rs"]
mod cache_test;

use super::{
  MetricMetadata,
  MetricSuffix,
  MetricType,
  SampleTracker,
  SeriesEntry,
  SeriesGetter,
};
use crate::config::ExportConfig;
use async_trait::async_trait;
use parking_lot::Mutex;
use prometheus::{IntCounter, IntGauge, Registry};
use std::collections::BTreeMap;
use std::sync::Arc;
use walship_common::labels::{LabelSet, BUCKET_LABEL, METRIC_NAME_LABEL};
use walship_protobuf::protos::google::api::metric_descriptor::{MetricKind, ValueType};
use walship_protobuf::protos::google::api::{Metric, MonitoredResource};
use walship_protobuf::protos::google::monitoring::TimeSeries;

type HashMap<Key, Value> = std::collections::HashMap<Key, Value, ahash::RandomState>;

// Metric descriptors are rejected by the backend past this many user labels.
pub const MAX_LABEL_COUNT: usize = 10;

const DEFAULT_METRICS_PREFIX: &str = "external.googleapis.com/prometheus";

// The backend metric type name for a prometheus metric name.
#[must_use]
pub fn metric_type_name(prefix: &str, prom_name: &str) -> String {
  if prefix.is_empty() {
    format!("{DEFAULT_METRICS_PREFIX}/{prom_name}")
  } else {
    format!("{prefix}/{prom_name}")
  }
}

//
// Stats
//

// Internal stats for the cache.
#[derive(Clone)]
struct Stats {
  tracked_series: IntGauge,
  missed_lookups: IntCounter,
}

impl Stats {
  fn new(registry: &Registry) -> Self {
    let tracked_series = IntGauge::new(
      "series_cache_tracked_series",
      "Number of series currently tracked by the cache",
    )
    .unwrap();
    let missed_lookups = IntCounter::new(
      "series_cache_missed_lookups",
      "Number of lookups for series refs the cache has never seen",
    )
    .unwrap();
    registry.register(Box::new(tracked_series.clone())).unwrap();
    registry.register(Box::new(missed_lookups.clone())).unwrap();
    Self {
      tracked_series,
      missed_lookups,
    }
  }
}

//
// ResetState
//

// Cumulative baseline for one series ref. The first observation only anchors the baseline; the
// accumulation window before it is unknown, so that sample is never emitted. A decrease against
// the last seen value is a counter reset.
#[derive(Default)]
struct ResetState {
  has_reset: bool,
  reset_value: f64,
  reset_timestamp: i64,
  previous_value: f64,
}

//
// SampleInterval
//

// Last accepted emission interval for a series hash.
#[derive(Clone, Copy)]
struct SampleInterval {
  start: i64,
  end: i64,
}

impl SampleInterval {
  // A new interval is accepted if it extends the current one or starts after it ends.
  const fn accepts(self, start: i64, end: i64) -> bool {
    (start == self.start && end > self.end) || (start > self.start && start >= self.end)
  }
}

//
// SeriesCache
//

// The stateful series directory. The WAL tailer registers every decoded series record through
// set_series(); the sample builder resolves refs and reads cumulative state through the
// SeriesGetter interface. Templates handed out are immutable once built.
pub struct SeriesCache {
  metrics_prefix: String,
  resource: MonitoredResource,
  entries: Mutex<HashMap<u64, Arc<SeriesEntry>>>,
  reset_state: Mutex<HashMap<u64, ResetState>>,
  intervals: Mutex<HashMap<u64, SampleInterval>>,
  stats: Stats,
}

impl SeriesCache {
  #[must_use]
  pub fn new(config: &ExportConfig, registry: &Registry) -> Self {
    Self {
      metrics_prefix: config.metrics_prefix.clone().unwrap_or_default(),
      resource: config.resource(),
      entries: Mutex::default(),
      reset_state: Mutex::default(),
      intervals: Mutex::default(),
      stats: Stats::new(registry),
    }
  }

  // Register a decoded WAL series record. Replaces any previous entry for the ref; cumulative
  // and interval state survive replacement so a tailer restart does not re-anchor every
  // counter.
  pub fn set_series(
    &self,
    series_ref: u64,
    lset: LabelSet,
    metadata: MetricMetadata,
    exported: bool,
    tracker: Option<Arc<dyn SampleTracker>>,
  ) {
    let suffix = classify_suffix(metadata.metric_type, &metadata.metric, lset.name());
    let (proto, within_label_limit) = self.build_template(&lset, &metadata, suffix);
    let hash = lset.hash64();
    log::debug!("tracking series {lset} (ref={series_ref})");

    let entry = Arc::new(SeriesEntry {
      hash,
      suffix,
      exported: exported && within_label_limit,
      proto,
      metadata,
      tracker,
      lset,
    });
    let mut entries = self.entries.lock();
    entries.insert(series_ref, entry);
    #[allow(clippy::cast_possible_wrap)]
    self.stats.tracked_series.set(entries.len() as i64);
  }

  fn build_template(
    &self,
    lset: &LabelSet,
    metadata: &MetricMetadata,
    suffix: Option<MetricSuffix>,
  ) -> (TimeSeries, bool) {
    let histogram = metadata.metric_type == MetricType::Histogram;

    // Histogram component series collapse into a single family metric; everything else keeps
    // its literal series name.
    let prom_name = if histogram {
      metadata.metric.clone()
    } else {
      String::from_utf8_lossy(lset.name()).into_owned()
    };

    let mut labels = BTreeMap::new();
    for label in lset {
      if label.name.as_ref() == METRIC_NAME_LABEL
        || (histogram && label.name.as_ref() == BUCKET_LABEL)
      {
        continue;
      }
      labels.insert(
        String::from_utf8_lossy(&label.name).into_owned(),
        String::from_utf8_lossy(&label.value).into_owned(),
      );
    }
    let within_label_limit = labels.len() <= MAX_LABEL_COUNT;

    let (metric_kind, value_type) = kind_and_value(metadata, suffix);
    let proto = TimeSeries {
      metric: Some(Metric {
        r#type: metric_type_name(&self.metrics_prefix, &prom_name),
        labels,
      }),
      resource: Some(self.resource.clone()),
      metric_kind: metric_kind as i32,
      value_type: value_type as i32,
      points: vec![],
    };
    (proto, within_label_limit)
  }
}

// The component suffix of one series within its family. Only summary and histogram families
// have compound components; a counter named foo_total is a single series, and a bare summary
// name is a quantile series.
fn classify_suffix(metric_type: MetricType, base: &str, name: &[u8]) -> Option<MetricSuffix> {
  if !matches!(metric_type, MetricType::Summary | MetricType::Histogram) {
    return None;
  }
  match MetricSuffix::strip(name) {
    (prefix, Some(suffix))
      if prefix == base.as_bytes() && suffix != MetricSuffix::Total =>
    {
      Some(suffix)
    },
    _ => None,
  }
}

fn kind_and_value(
  metadata: &MetricMetadata,
  suffix: Option<MetricSuffix>,
) -> (MetricKind, ValueType) {
  match metadata.metric_type {
    MetricType::Counter => (MetricKind::Cumulative, metadata.value_type),
    MetricType::Summary => match suffix {
      Some(MetricSuffix::Sum) => (MetricKind::Cumulative, ValueType::Double),
      Some(MetricSuffix::Count) => (MetricKind::Cumulative, ValueType::Int64),
      _ => (MetricKind::Gauge, ValueType::Double),
    },
    MetricType::Histogram => (MetricKind::Cumulative, ValueType::Distribution),
    _ => (MetricKind::Gauge, metadata.value_type),
  }
}

#[async_trait]
impl SeriesGetter for SeriesCache {
  async fn get(&self, series_ref: u64) -> anyhow::Result<Option<Arc<SeriesEntry>>> {
    let entry = self.entries.lock().get(&series_ref).cloned();
    if entry.is_none() {
      self.stats.missed_lookups.inc();
    }
    Ok(entry)
  }

  fn get_reset_adjusted(&self, series_ref: u64, t: i64, v: f64) -> Option<(i64, f64)> {
    if !self.entries.lock().contains_key(&series_ref) {
      return None;
    }
    let mut reset_state = self.reset_state.lock();
    let state = reset_state.entry(series_ref).or_default();
    if !state.has_reset {
      state.has_reset = true;
      state.reset_timestamp = t;
      state.reset_value = v;
      state.previous_value = v;
      // The window the current cumulative value accumulated over is unknown; the next sample
      // for the series has a defined baseline.
      return None;
    }
    if v < state.previous_value {
      log::trace!("counter reset detected for series ref {series_ref} at {t}");
      state.reset_value = 0.0;
      state.reset_timestamp = t;
    }
    state.previous_value = v;
    Some((state.reset_timestamp, v - state.reset_value))
  }

  fn update_sample_interval(&self, hash: u64, reset_timestamp: i64, sample_time: i64) -> bool {
    let mut intervals = self.intervals.lock();
    if let Some(interval) = intervals.get(&hash) {
      if !interval.accepts(reset_timestamp, sample_time) {
        return false;
      }
    }
    intervals.insert(
      hash,
      SampleInterval {
        start: reset_timestamp,
        end: sample_time,
      },
    );
    true
  }
}
