//! Node operations for the console: pass-throughs to a [`NodeApi`] plus the
//! conversion from the API server's node object to the display view.

use std::collections::BTreeMap;

use tracing::{debug, info};

use crate::clients::NodeApi;
use crate::error::Result;
use crate::models::k8s::{ListOptions, NODE_READY, Node, RESOURCE_CPU, RESOURCE_MEMORY};
use crate::models::quantity::GIBI;
use crate::models::views::{NodeView, NodeViewSpec, NodeViewStatus};

pub async fn count<A: NodeApi>(api: &A) -> Result<usize> {
    api.count().await
}

/// Lists nodes matching `options` and converts each one, keeping the order
/// the API server returned them in.
pub async fn list<A: NodeApi>(api: &A, options: &ListOptions) -> Result<Vec<NodeView>> {
    let list = api.list(options).await?;
    debug!("listed {} nodes", list.items.len());
    Ok(list.items.iter().map(convert).collect())
}

/// Returns the node as stored, unconverted, ready to be modified and passed
/// to [`update`].
pub async fn get_by_name<A: NodeApi>(api: &A, name: &str) -> Result<Node> {
    api.get(name).await
}

pub async fn update<A: NodeApi>(api: &A, node: &Node) -> Result<Node> {
    let stored = api.update(node).await?;
    info!(
        "updated node {} (resourceVersion {})",
        stored.metadata.name, stored.metadata.resource_version
    );
    Ok(stored)
}

pub async fn delete<A: NodeApi>(api: &A, name: &str) -> Result<()> {
    api.delete(name).await?;
    info!("deleted node {}", name);
    Ok(())
}

pub fn convert(node: &Node) -> NodeView {
    let mut capacity = BTreeMap::new();
    if let Some(cpu) = node.status.capacity.get(RESOURCE_CPU) {
        capacity.insert(RESOURCE_CPU.to_string(), cpu.floor().to_string());
    }
    if let Some(memory) = node.status.capacity.get(RESOURCE_MEMORY) {
        capacity.insert(
            RESOURCE_MEMORY.to_string(),
            memory.floor_div(GIBI).to_string(),
        );
    }

    // Last match wins, as with duplicate conditions on the server side.
    let ready = node
        .status
        .conditions
        .iter()
        .rev()
        .find(|c| c.condition_type == NODE_READY)
        .map(|c| c.status.clone())
        .unwrap_or_default();

    NodeView {
        name: node.metadata.name.clone(),
        labels: node.metadata.labels.clone().unwrap_or_default(),
        creation_timestamp: node.metadata.creation_timestamp,
        spec: NodeViewSpec {
            unschedulable: node.spec.unschedulable,
            taints: node.spec.taints.clone(),
            ready,
        },
        status: NodeViewStatus {
            capacity,
            node_info: node.status.node_info.clone(),
        },
    }
}

impl From<&Node> for NodeView {
    fn from(node: &Node) -> Self {
        convert(node)
    }
}
