// walship - bitdrift's prometheus to cloud monitoring shipper
// Copyright Bitdrift, Inc. All rights reserved.
//
// Use of this source code is governed by a source available license that can be found in the
// LICENSE file or at:
// https://polyformproject.org/wp-content/uploads/2020/06/PolyForm-Shield-1.0.0.txt

#[cfg(test)]
#[path = "./config_test.rs"]
mod config_test;

use serde::Deserialize;
use std::collections::BTreeMap;
use walship_protobuf::protos::google::api::MonitoredResource;

//
// ExportConfig
//

// Where emitted points are routed: the metric type prefix every prometheus name is qualified
// with, and the monitored resource identity stamped on every series template. An unset prefix
// falls back to the backend's prometheus namespace.
#[derive(Clone, Debug, Default, Deserialize, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct ExportConfig {
  pub metrics_prefix: Option<String>,
  pub resource_type: String,
  pub resource_labels: BTreeMap<String, String>,
}

impl ExportConfig {
  #[must_use]
  pub fn resource(&self) -> MonitoredResource {
    MonitoredResource {
      r#type: self.resource_type.clone(),
      labels: self.resource_labels.clone(),
    }
  }
}
