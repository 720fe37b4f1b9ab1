// walship - bitdrift's prometheus to cloud monitoring shipper
// Copyright Bitdrift, Inc. All rights reserved.
//
// Use of this source code is governed by a source available license that can be found in the
// LICENSE file or at:
// https://polyformproject.org/wp-content/uploads/2020/06/PolyForm-Shield-1.0.0.txt

// Hand maintained bindings for the subset of the google.api metric surface walship emits. Tags
// match the upstream proto field numbers so encoded messages stay wire compatible; fields and
// bucket shapes the shipper never produces are not bound.

use prost::alloc::collections::BTreeMap;

//
// Metric
//

// A specific metric identified by a type name and a set of labels.
#[derive(Clone, PartialEq, ::prost::Message)]
pub struct Metric {
  #[prost(string, tag = "3")]
  pub r#type: String,
  #[prost(btree_map = "string, string", tag = "2")]
  pub labels: BTreeMap<String, String>,
}

//
// MonitoredResource
//

// The monitored object the points of a time series are attributed to.
#[derive(Clone, PartialEq, ::prost::Message)]
pub struct MonitoredResource {
  #[prost(string, tag = "1")]
  pub r#type: String,
  #[prost(btree_map = "string, string", tag = "2")]
  pub labels: BTreeMap<String, String>,
}

//
// MetricDescriptor
//

// Only the nested kind and value type enumerations are needed; the full descriptor message is
// managed by the backend.
pub mod metric_descriptor {
  #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, ::prost::Enumeration)]
  #[repr(i32)]
  pub enum MetricKind {
    Unspecified = 0,
    Gauge = 1,
    Delta = 2,
    Cumulative = 3,
  }

  #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, ::prost::Enumeration)]
  #[repr(i32)]
  pub enum ValueType {
    Unspecified = 0,
    Bool = 1,
    Int64 = 2,
    Double = 3,
    String = 4,
    Distribution = 5,
    Money = 6,
  }
}

//
// Distribution
//

// A distribution of values: overall count, mean, and sum of squared deviations from the mean,
// plus a histogram over a set of buckets. bucket_counts has one more entry than the explicit
// bounds; the extra entry is the implied overflow bucket.
#[derive(Clone, PartialEq, ::prost::Message)]
pub struct Distribution {
  #[prost(int64, tag = "1")]
  pub count: i64,
  #[prost(double, tag = "2")]
  pub mean: f64,
  #[prost(double, tag = "3")]
  pub sum_of_squared_deviation: f64,
  #[prost(message, optional, tag = "6")]
  pub bucket_options: Option<distribution::BucketOptions>,
  #[prost(int64, repeated, tag = "7")]
  pub bucket_counts: Vec<i64>,
}

pub mod distribution {
  //
  // BucketOptions
  //

  #[derive(Clone, PartialEq, ::prost::Message)]
  pub struct BucketOptions {
    #[prost(oneof = "bucket_options::Options", tags = "3")]
    pub options: Option<bucket_options::Options>,
  }

  pub mod bucket_options {
    // Explicit buckets: n bounds describe n + 1 buckets, the last being unbounded above.
    #[derive(Clone, PartialEq, ::prost::Message)]
    pub struct Explicit {
      #[prost(double, repeated, tag = "1")]
      pub bounds: Vec<f64>,
    }

    #[derive(Clone, PartialEq, ::prost::Oneof)]
    pub enum Options {
      #[prost(message, tag = "3")]
      ExplicitBuckets(Explicit),
    }
  }
}
