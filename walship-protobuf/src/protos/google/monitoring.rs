// walship - bitdrift's prometheus to cloud monitoring shipper
// Copyright Bitdrift, Inc. All rights reserved.
//
// Use of this source code is governed by a source available license that can be found in the
// LICENSE file or at:
// https://polyformproject.org/wp-content/uploads/2020/06/PolyForm-Shield-1.0.0.txt

// Hand maintained bindings for the google.monitoring.v3 time series types, tagged with the
// upstream field numbers.

use super::api::metric_descriptor::{MetricKind, ValueType};
use super::api::{Metric, MonitoredResource};

//
// TimeInterval
//

// The time window a point applies to. end_time is always set; start_time is only set for
// cumulative points and must not be later than end_time.
#[derive(Clone, PartialEq, ::prost::Message)]
pub struct TimeInterval {
  #[prost(message, optional, tag = "2")]
  pub end_time: Option<::prost_types::Timestamp>,
  #[prost(message, optional, tag = "1")]
  pub start_time: Option<::prost_types::Timestamp>,
}

//
// TypedValue
//

// A single point value, discriminated by the metric descriptor's value type.
#[derive(Clone, PartialEq, ::prost::Message)]
pub struct TypedValue {
  #[prost(oneof = "typed_value::Value", tags = "1, 2, 3, 4, 5")]
  pub value: Option<typed_value::Value>,
}

pub mod typed_value {
  #[derive(Clone, PartialEq, ::prost::Oneof)]
  pub enum Value {
    #[prost(bool, tag = "1")]
    BoolValue(bool),
    #[prost(int64, tag = "2")]
    Int64Value(i64),
    #[prost(double, tag = "3")]
    DoubleValue(f64),
    #[prost(string, tag = "4")]
    StringValue(String),
    #[prost(message, tag = "5")]
    DistributionValue(super::super::api::Distribution),
  }
}

//
// Point
//

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct Point {
  #[prost(message, optional, tag = "1")]
  pub interval: Option<TimeInterval>,
  #[prost(message, optional, tag = "2")]
  pub value: Option<TypedValue>,
}

//
// TimeSeries
//

// A collection of points belonging to one metric on one monitored resource. Writes carry exactly
// one point per series.
#[derive(Clone, PartialEq, ::prost::Message)]
pub struct TimeSeries {
  #[prost(message, optional, tag = "1")]
  pub metric: Option<Metric>,
  #[prost(message, optional, tag = "2")]
  pub resource: Option<MonitoredResource>,
  #[prost(enumeration = "MetricKind", tag = "3")]
  pub metric_kind: i32,
  #[prost(enumeration = "ValueType", tag = "4")]
  pub value_type: i32,
  #[prost(message, repeated, tag = "5")]
  pub points: Vec<Point>,
}
