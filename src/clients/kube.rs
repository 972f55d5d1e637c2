use reqwest::{header, Certificate, Client, RequestBuilder, Response, Url};
use serde::de::DeserializeOwned;
use tracing::debug;

use super::NodeApi;
use crate::config::{ApiServerConfig, ConfigError};
use crate::error::{ApiError, Result};
use crate::models::k8s::{DeleteOptions, ListOptions, Node, NodeList};

/// `NodeApi` over the core/v1 REST endpoints of a Kubernetes API server.
#[derive(Clone)]
pub struct KubeClient {
    base_url: Url,
    http: Client,
}

impl KubeClient {
    pub fn from_config(cfg: &ApiServerConfig) -> std::result::Result<Self, ConfigError> {
        let base_url = Url::parse(cfg.base_url.trim())
            .map_err(|e| ConfigError::Invalid(format!("api_server.base_url: {}", e)))?;
        if base_url.cannot_be_a_base() {
            return Err(ConfigError::Invalid(format!(
                "api_server.base_url {:?} cannot be a base URL",
                cfg.base_url
            )));
        }

        let mut headers = header::HeaderMap::new();
        headers.insert(
            header::ACCEPT,
            header::HeaderValue::from_static("application/json"),
        );
        if let Some(ref token) = cfg.token {
            let mut value = header::HeaderValue::from_str(&format!("Bearer {}", token))
                .map_err(|_| ConfigError::Invalid("api_server.token is not a valid header value".into()))?;
            value.set_sensitive(true);
            headers.insert(header::AUTHORIZATION, value);
        }

        let mut builder = Client::builder()
            .default_headers(headers)
            .timeout(cfg.timeout());
        if let Some(ref pem) = cfg.ca_pem {
            builder = builder.add_root_certificate(Certificate::from_pem(pem.as_bytes())?);
        }
        let http = builder.build()?;

        Ok(Self { base_url, http })
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// `{base}/api/v1/nodes[/{name}]`, with the name escaped as a path segment.
    fn nodes_url(&self, name: Option<&str>) -> Url {
        let mut url = self.base_url.clone();
        if let Ok(mut segments) = url.path_segments_mut() {
            segments.pop_if_empty().extend(["api", "v1", "nodes"]);
            if let Some(name) = name {
                segments.push(name);
            }
        }
        url
    }

    fn node_url(&self, name: &str) -> Result<Url> {
        if name.is_empty() {
            return Err(ApiError::Invalid {
                code: 400,
                message: "resource name may not be empty".to_string(),
            });
        }
        Ok(self.nodes_url(Some(name)))
    }

    async fn send(&self, req: RequestBuilder) -> Result<Response> {
        let req = req.build()?;
        let (method, url) = (req.method().clone(), req.url().clone());
        debug!("{} {}", method, url);

        let resp = self.http.execute(req).await?;

        let status = resp.status();
        if !status.is_success() {
            let text = resp.text().await.unwrap_or_default();
            debug!("{} {} returned {}", method, url, status);
            return Err(ApiError::from_response(status.as_u16(), &text));
        }
        Ok(resp)
    }

    async fn decode<T: DeserializeOwned>(resp: Response, what: &'static str) -> Result<T> {
        let bytes = resp.bytes().await?;
        serde_json::from_slice(&bytes).map_err(|e| ApiError::Decode {
            what,
            message: e.to_string(),
        })
    }
}

impl NodeApi for KubeClient {
    async fn list(&self, options: &ListOptions) -> Result<NodeList> {
        let req = self.http.get(self.nodes_url(None)).query(options);
        let resp = self.send(req).await?;
        Self::decode(resp, "NodeList").await
    }

    async fn get(&self, name: &str) -> Result<Node> {
        let req = self.http.get(self.node_url(name)?);
        let resp = self.send(req).await?;
        Self::decode(resp, "Node").await
    }

    async fn update(&self, node: &Node) -> Result<Node> {
        let req = self.http.put(self.node_url(node.name())?).json(node);
        let resp = self.send(req).await?;
        Self::decode(resp, "Node").await
    }

    async fn delete(&self, name: &str) -> Result<()> {
        let req = self
            .http
            .delete(self.node_url(name)?)
            .json(&DeleteOptions::default());
        self.send(req).await?;
        Ok(())
    }
}
