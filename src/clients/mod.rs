pub mod kube;
#[cfg(test)]
pub mod memory;

use std::future::Future;

use crate::error::Result;
use crate::models::k8s::{ListOptions, Node, NodeList};

pub use kube::KubeClient;

/// The node operations the console needs from a cluster. Implementations
/// forward to the control plane and report its errors unchanged; retries,
/// timeouts and credentials are their own business.
pub trait NodeApi: Send + Sync {
    fn list(&self, options: &ListOptions) -> impl Future<Output = Result<NodeList>> + Send;

    /// Number of nodes in the cluster, unfiltered.
    fn count(&self) -> impl Future<Output = Result<usize>> + Send {
        async move {
            let list = self.list(&ListOptions::default()).await?;
            Ok(list.items.len())
        }
    }

    fn get(&self, name: &str) -> impl Future<Output = Result<Node>> + Send;

    /// Whole-object replace. The server checks `metadata.resourceVersion`.
    fn update(&self, node: &Node) -> impl Future<Output = Result<Node>> + Send;

    fn delete(&self, name: &str) -> impl Future<Output = Result<()>> + Send;
}
