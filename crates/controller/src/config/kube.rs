//! Kubernetes API Config

use std::{fs, path::PathBuf};

use clap::Args;
use spi_migration::kube::KubeConfig;

use super::ConfigError;

/// Kubernetes API server settings.
#[derive(Debug, Args)]
pub struct KubeArgs {
    /// Kubernetes API server address
    #[arg(
        long = "kube-api-server",
        env = "KUBE_API_SERVER",
        default_value = "https://kubernetes.default.svc"
    )]
    pub api_server: String,

    /// Bearer token; read from the token file when omitted
    #[arg(long = "kube-token", env = "KUBE_TOKEN", hide_env_values = true)]
    pub token: Option<String>,

    /// Service account token file
    #[arg(
        long = "kube-token-file",
        env = "KUBE_TOKEN_FILE",
        default_value = "/var/run/secrets/kubernetes.io/serviceaccount/token"
    )]
    pub token_file: PathBuf,

    /// PEM bundle of the cluster CA
    #[arg(long = "kube-ca-cert", env = "KUBE_CA_CERT")]
    pub ca_cert: Option<PathBuf>,

    /// Skip TLS certificate verification
    #[arg(long = "kube-insecure", env = "KUBE_INSECURE", default_value_t = false)]
    pub insecure: bool,
}

impl KubeArgs {
    /// Resolve the client configuration, reading the token and CA files.
    ///
    /// # Errors
    ///
    /// Returns an error when a referenced file cannot be read or the token is empty.
    pub fn load(&self) -> Result<KubeConfig, ConfigError> {
        let token = match &self.token {
            Some(token) => token.trim().to_string(),
            None => fs::read_to_string(&self.token_file)
                .map_err(|source| ConfigError::Read {
                    path: self.token_file.clone(),
                    source,
                })?
                .trim()
                .to_string(),
        };

        if token.is_empty() {
            return Err(ConfigError::EmptyToken);
        }

        let ca_certificate_pem = self
            .ca_cert
            .as_ref()
            .map(|path| {
                fs::read(path).map_err(|source| ConfigError::Read {
                    path: path.clone(),
                    source,
                })
            })
            .transpose()?;

        Ok(KubeConfig {
            api_server: self.api_server.clone(),
            token,
            ca_certificate_pem,
            accept_invalid_certs: self.insecure,
        })
    }
}
