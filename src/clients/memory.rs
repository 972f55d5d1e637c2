use std::collections::BTreeMap;
use std::sync::Mutex;

use super::NodeApi;
use crate::error::{ApiError, Result};
use crate::models::k8s::{ListMeta, ListOptions, Node, NodeList};

/// In-memory stand-in for the API server. Keeps nodes in insertion order,
/// versions them like the server does and understands the simple selector
/// forms the console passes through.
pub struct InMemoryNodes {
    state: Mutex<State>,
}

struct State {
    nodes: Vec<Node>,
    next_version: u64,
    last_list: Option<ListOptions>,
}

impl InMemoryNodes {
    pub fn new(nodes: Vec<Node>) -> Self {
        let mut state = State {
            nodes: Vec::new(),
            next_version: 1,
            last_list: None,
        };
        for mut node in nodes {
            node.metadata.resource_version = state.bump();
            state.nodes.push(node);
        }
        Self {
            state: Mutex::new(state),
        }
    }

    pub fn empty() -> Self {
        Self::new(Vec::new())
    }

    /// Options received by the most recent `list` call.
    pub fn last_list_options(&self) -> Option<ListOptions> {
        self.state.lock().unwrap().last_list.clone()
    }

    pub fn names(&self) -> Vec<String> {
        let state = self.state.lock().unwrap();
        state.nodes.iter().map(|n| n.metadata.name.clone()).collect()
    }
}

impl State {
    fn bump(&mut self) -> String {
        let v = self.next_version;
        self.next_version += 1;
        v.to_string()
    }

    fn position(&self, name: &str) -> Result<usize> {
        if name.is_empty() {
            return Err(ApiError::Invalid {
                code: 400,
                message: "resource name may not be empty".to_string(),
            });
        }
        self.nodes
            .iter()
            .position(|n| n.metadata.name == name)
            .ok_or_else(|| ApiError::NotFound {
                message: format!("nodes {:?} not found", name),
            })
    }
}

impl NodeApi for InMemoryNodes {
    async fn list(&self, options: &ListOptions) -> Result<NodeList> {
        let mut state = self.state.lock().unwrap();
        state.last_list = Some(options.clone());

        let labels = Selector::parse(options.label_selector.as_deref().unwrap_or_default())?;
        let fields = Selector::parse(options.field_selector.as_deref().unwrap_or_default())?;

        let matching: Vec<&Node> = state
            .nodes
            .iter()
            .filter(|n| labels.matches(|key| n.metadata.labels.as_ref()?.get(key).cloned()))
            .filter(|n| {
                fields.matches(|key| match key {
                    "metadata.name" => Some(n.metadata.name.clone()),
                    "spec.unschedulable" => Some(n.spec.unschedulable.to_string()),
                    _ => None,
                })
            })
            .collect();

        let start = match options.continue_token.as_deref() {
            Some(token) => token.parse::<usize>().map_err(|_| ApiError::Invalid {
                code: 400,
                message: format!("invalid continue token {:?}", token),
            })?,
            None => 0,
        };
        let end = match options.limit {
            Some(limit) if limit > 0 => (start + limit as usize).min(matching.len()),
            _ => matching.len(),
        };

        let items: Vec<Node> = matching
            .get(start..end)
            .unwrap_or_default()
            .iter()
            .map(|n| (*n).clone())
            .collect();
        let continue_token = if end < matching.len() {
            end.to_string()
        } else {
            String::new()
        };

        Ok(NodeList {
            metadata: ListMeta {
                resource_version: (state.next_version - 1).to_string(),
                continue_token,
            },
            items,
            ..Default::default()
        })
    }

    async fn get(&self, name: &str) -> Result<Node> {
        let state = self.state.lock().unwrap();
        let idx = state.position(name)?;
        Ok(state.nodes[idx].clone())
    }

    async fn update(&self, node: &Node) -> Result<Node> {
        let mut state = self.state.lock().unwrap();
        let idx = state.position(node.name())?;

        let current = &state.nodes[idx].metadata.resource_version;
        if !node.metadata.resource_version.is_empty() && node.metadata.resource_version != *current {
            return Err(ApiError::Conflict {
                message: format!(
                    "Operation cannot be fulfilled on nodes {:?}: the object has been modified; please apply your changes to the latest version and try again",
                    node.name()
                ),
            });
        }

        let mut stored = node.clone();
        stored.metadata.resource_version = state.bump();
        state.nodes[idx] = stored.clone();
        Ok(stored)
    }

    async fn delete(&self, name: &str) -> Result<()> {
        let mut state = self.state.lock().unwrap();
        let idx = state.position(name)?;
        state.nodes.remove(idx);
        state.next_version += 1;
        Ok(())
    }
}

enum Requirement {
    Equals(String, String),
    NotEquals(String, String),
    Exists(String),
    NotExists(String),
}

/// Comma-separated `k=v`, `k==v`, `k!=v`, `k` and `!k` terms, all of which
/// must hold.
struct Selector(Vec<Requirement>);

impl Selector {
    fn parse(s: &str) -> Result<Self> {
        let mut reqs = Vec::new();
        for term in s.split(',').map(str::trim).filter(|t| !t.is_empty()) {
            let req = if let Some((k, v)) = term.split_once("!=") {
                Requirement::NotEquals(k.trim().to_string(), v.trim().to_string())
            } else if let Some((k, v)) = term.split_once("==") {
                Requirement::Equals(k.trim().to_string(), v.trim().to_string())
            } else if let Some((k, v)) = term.split_once('=') {
                Requirement::Equals(k.trim().to_string(), v.trim().to_string())
            } else if let Some(k) = term.strip_prefix('!') {
                Requirement::NotExists(k.trim().to_string())
            } else {
                Requirement::Exists(term.to_string())
            };
            if let Requirement::Equals(k, _)
            | Requirement::NotEquals(k, _)
            | Requirement::Exists(k)
            | Requirement::NotExists(k) = &req
            {
                if k.is_empty() {
                    return Err(ApiError::Invalid {
                        code: 400,
                        message: format!("unable to parse requirement {:?}", term),
                    });
                }
            }
            reqs.push(req);
        }
        Ok(Selector(reqs))
    }

    fn matches(&self, lookup: impl Fn(&str) -> Option<String>) -> bool {
        self.0.iter().all(|req| match req {
            Requirement::Equals(k, v) => lookup(k).as_ref() == Some(v),
            Requirement::NotEquals(k, v) => lookup(k).as_ref() != Some(v),
            Requirement::Exists(k) => lookup(k).is_some(),
            Requirement::NotExists(k) => lookup(k).is_none(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::k8s::ObjectMeta;

    fn node(name: &str, labels: &[(&str, &str)]) -> Node {
        Node {
            metadata: ObjectMeta {
                name: name.to_string(),
                labels: Some(
                    labels
                        .iter()
                        .map(|(k, v)| (k.to_string(), v.to_string()))
                        .collect(),
                ),
                ..Default::default()
            },
            ..Default::default()
        }
    }

    fn fixture() -> InMemoryNodes {
        InMemoryNodes::new(vec![
            node("cp-1", &[("role", "control-plane")]),
            node("worker-1", &[("role", "worker"), ("gpu", "true")]),
            node("worker-2", &[("role", "worker")]),
        ])
    }

    fn names(list: &NodeList) -> Vec<&str> {
        list.items.iter().map(|n| n.name()).collect()
    }

    #[tokio::test]
    async fn test_label_selectors() {
        let api = fixture();
        let opts = |s: &str| ListOptions {
            label_selector: Some(s.to_string()),
            ..Default::default()
        };

        let list = api.list(&opts("role=worker")).await.unwrap();
        assert_eq!(names(&list), ["worker-1", "worker-2"]);
        let list = api.list(&opts("role!=worker")).await.unwrap();
        assert_eq!(names(&list), ["cp-1"]);
        let list = api.list(&opts("role==worker,gpu")).await.unwrap();
        assert_eq!(names(&list), ["worker-1"]);
        let list = api.list(&opts("!gpu")).await.unwrap();
        assert_eq!(names(&list), ["cp-1", "worker-2"]);
        assert!(api.list(&opts("=x")).await.is_err());
    }

    #[tokio::test]
    async fn test_field_selector_by_name() {
        let api = fixture();
        let list = api
            .list(&ListOptions {
                field_selector: Some("metadata.name=worker-2".to_string()),
                ..Default::default()
            })
            .await
            .unwrap();
        assert_eq!(names(&list), ["worker-2"]);
    }

    #[tokio::test]
    async fn test_paging() {
        let api = fixture();
        let first = api
            .list(&ListOptions {
                limit: Some(2),
                ..Default::default()
            })
            .await
            .unwrap();
        assert_eq!(names(&first), ["cp-1", "worker-1"]);
        assert_eq!(first.metadata.continue_token, "2");

        let rest = api
            .list(&ListOptions {
                limit: Some(2),
                continue_token: Some(first.metadata.continue_token.clone()),
                ..Default::default()
            })
            .await
            .unwrap();
        assert_eq!(names(&rest), ["worker-2"]);
        assert!(rest.metadata.continue_token.is_empty());
    }

    #[tokio::test]
    async fn test_update_bumps_version_and_detects_conflicts() {
        let api = fixture();
        let mut fetched = api.get("worker-1").await.unwrap();
        let stale = fetched.clone();

        fetched.spec.unschedulable = true;
        let stored = api.update(&fetched).await.unwrap();
        assert_ne!(stored.metadata.resource_version, fetched.metadata.resource_version);
        assert!(api.get("worker-1").await.unwrap().spec.unschedulable);

        let err = api.update(&stale).await.unwrap_err();
        assert!(err.is_conflict());
    }

    #[tokio::test]
    async fn test_delete() {
        let api = fixture();
        api.delete("worker-2").await.unwrap();
        assert_eq!(api.names(), ["cp-1", "worker-1"]);
        assert!(api.delete("worker-2").await.unwrap_err().is_not_found());
    }
}
