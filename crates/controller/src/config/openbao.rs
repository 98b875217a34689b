//! Token Storage Config

use clap::Args;
use spi_migration::storage::OpenBaoConfig;

/// `OpenBao` token storage settings.
#[derive(Debug, Args)]
pub struct OpenBaoArgs {
    /// `OpenBao` server address
    #[arg(long = "openbao-addr", env = "OPENBAO_ADDR")]
    pub addr: String,

    /// `OpenBao` authentication token
    #[arg(long = "openbao-token", env = "OPENBAO_TOKEN", hide_env_values = true)]
    pub token: String,

    /// Mount path of the KV v2 engine
    #[arg(long = "openbao-mount", env = "OPENBAO_MOUNT", default_value = "secret")]
    pub mount: String,

    /// Path prefix for stored token payloads
    #[arg(long = "openbao-path-prefix", env = "OPENBAO_PATH_PREFIX", default_value = "spi")]
    pub path_prefix: String,
}

impl From<OpenBaoArgs> for OpenBaoConfig {
    fn from(args: OpenBaoArgs) -> Self {
        Self {
            addr: args.addr,
            token: args.token,
            mount: args.mount,
            path_prefix: args.path_prefix,
        }
    }
}
