use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use super::k8s::{NodeSystemInfo, Taint};

/// Display projection of a node. Built by `nodes::convert`, never stored.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct NodeView {
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub name: String,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub labels: BTreeMap<String, String>,
    #[serde(default)]
    pub creation_timestamp: Option<DateTime<Utc>>,
    #[serde(default)]
    pub spec: NodeViewSpec,
    #[serde(default)]
    pub status: NodeViewStatus,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct NodeViewSpec {
    #[serde(default)]
    pub unschedulable: bool,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub taints: Vec<Taint>,
    /// Status of the `Ready` condition (`"True"`, `"False"`, `"Unknown"`),
    /// empty when the node reports none.
    #[serde(default)]
    pub ready: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct NodeViewStatus {
    /// `cpu` in whole cores and `memory` in whole GiB; nothing else.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub capacity: BTreeMap<String, String>,
    #[serde(default)]
    pub node_info: NodeSystemInfo,
}

// `details` is reserved; nothing fills it yet.
#[allow(dead_code)]
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct NodeStatistics {
    #[serde(default, skip_serializing_if = "is_zero")]
    pub total: usize,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub details: Option<BTreeMap<String, usize>>,
}

fn is_zero(n: &usize) -> bool {
    *n == 0
}
