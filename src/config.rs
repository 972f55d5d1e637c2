use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("reading config {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("parsing config: {0}")]
    Parse(#[from] serde_yaml::Error),
    #[error("reading token file {path}: {source}")]
    TokenFile {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("reading CA file {path}: {source}")]
    CaFile {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("invalid config: {0}")]
    Invalid(String),
    #[error("building HTTP client: {0}")]
    Client(#[from] reqwest::Error),
}

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    #[serde(default = "default_cluster_name")]
    pub cluster_name: String,
    #[serde(default = "default_listen_port")]
    pub listen_port: u16,
    pub api_server: ApiServerConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ApiServerConfig {
    pub base_url: String,
    #[serde(default)]
    pub token: Option<String>,
    #[serde(default)]
    pub token_file: Option<PathBuf>,
    /// PEM bundle of the cluster CA, e.g.
    /// `/var/run/secrets/kubernetes.io/serviceaccount/ca.crt` in a pod.
    #[serde(default)]
    pub ca_file: Option<PathBuf>,
    /// Contents of `ca_file`, filled in by `Config::load`.
    #[serde(skip)]
    pub ca_pem: Option<String>,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

fn default_cluster_name() -> String {
    "kubernetes".to_string()
}

fn default_listen_port() -> u16 {
    9090
}

fn default_timeout_secs() -> u64 {
    10
}

impl Config {
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let data = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let mut cfg = Self::parse(&data)?;

        // A token file wins over an inline token; it is what in-cluster
        // service accounts provide.
        if let Some(ref token_path) = cfg.api_server.token_file {
            let token =
                std::fs::read_to_string(token_path).map_err(|source| ConfigError::TokenFile {
                    path: token_path.clone(),
                    source,
                })?;
            cfg.api_server.token = Some(token.trim().to_string());
        }

        if let Some(ref ca_path) = cfg.api_server.ca_file {
            let pem = std::fs::read_to_string(ca_path).map_err(|source| ConfigError::CaFile {
                path: ca_path.clone(),
                source,
            })?;
            if !pem.contains("-----BEGIN CERTIFICATE-----") {
                return Err(ConfigError::Invalid(format!(
                    "api_server.ca_file {} holds no PEM certificate",
                    ca_path.display()
                )));
            }
            cfg.api_server.ca_pem = Some(pem);
        }

        Ok(cfg)
    }

    pub fn parse(data: &str) -> Result<Self, ConfigError> {
        let cfg: Config = serde_yaml::from_str(data)?;
        cfg.validate()?;
        Ok(cfg)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        let base_url = self.api_server.base_url.trim();
        if base_url.is_empty() {
            return Err(ConfigError::Invalid("api_server.base_url must be set".into()));
        }
        if !(base_url.starts_with("http://") || base_url.starts_with("https://")) {
            return Err(ConfigError::Invalid(format!(
                "api_server.base_url {:?} must be an http(s) URL",
                base_url
            )));
        }
        if self.api_server.timeout_secs == 0 {
            return Err(ConfigError::Invalid("api_server.timeout_secs must be positive".into()));
        }
        Ok(())
    }

    pub fn listen_addr(&self) -> String {
        format!("0.0.0.0:{}", self.listen_port)
    }
}

impl ApiServerConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}


/// Self-signed EC P-256 CA (`CN=kubernetes`) used by config and client tests.
#[cfg(test)]
pub const TEST_CA_PEM: &str = "-----BEGIN CERTIFICATE-----
MIIBkTCCATegAwIBAgIUeYRe/BpwaquYyD9o1zFQhD2SZ4kwCgYIKoZIzj0EAwIw
FTETMBEGA1UEAwwKa3ViZXJuZXRlczAgFw0yNjEwMTgyMDQzNTBaGA8yMTI2MDky
NDIwNDM1MFowFTETMBEGA1UEAwwKa3ViZXJuZXRlczBZMBMGByqGSM49AgEGCCqG
SM49AwEHA0IABK9pBBYG+YZ3ORZnmFWrC3jhhWopRHrx6BlZQuBb9vvrgTmChPV/
5Xr5Q7X6eAL3laGSPpzYt7fiB+kTRAkDyk+jYzBhMB0GA1UdDgQWBBQ5qMr71mEy
N78YezduJeYe6i9tZDAfBgNVHSMEGDAWgBQ5qMr71mEyN78YezduJeYe6i9tZDAP
BgNVHRMBAf8EBTADAQH/MA4GA1UdDwEB/wQEAwIBhjAKBggqhkjOPQQDAgNIADBF
AiEAhLXwTPsEpbTUNbslafogvvr0EGaDEE22Fo1w34YnmZkCIETCZWvfFNPkjMyL
E1QeRNJvKEFIq+YuVVG0kcYM8vqu
-----END CERTIFICATE-----
";
