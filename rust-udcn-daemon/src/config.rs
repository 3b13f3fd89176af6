//! Daemon configuration, loaded with the `config` crate from a TOML file
//! plus `UDCND_`-prefixed environment overrides (spec.md §6.3).

use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::PathBuf;

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct CsConfig {
    pub capacity: usize,
    pub admit: bool,
    pub serve: bool,
}

impl Default for CsConfig {
    fn default() -> Self {
        Self { capacity: 1024, admit: true, serve: true }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct DeadNonceListConfig {
    pub lifetime_ms: u64,
}

impl Default for DeadNonceListConfig {
    fn default() -> Self {
        Self { lifetime_ms: 6000 }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct StrategyChoiceConfig {
    /// Strategy installed at `/` (spec.md §4.5); one of `best-route`,
    /// `multicast`, `access`.
    pub default: String,
}

impl Default for StrategyChoiceConfig {
    fn default() -> Self {
        Self { default: "best-route".to_string() }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct TablesConfig {
    pub dead_nonce_list: DeadNonceListConfig,
    pub strategy_choice: StrategyChoiceConfig,
}

impl Default for TablesConfig {
    fn default() -> Self {
        Self { dead_nonce_list: DeadNonceListConfig::default(), strategy_choice: StrategyChoiceConfig::default() }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct AutoPrefixPropagateConfig {
    pub cost: u64,
    pub timeout_ms: u64,
}

impl Default for AutoPrefixPropagateConfig {
    fn default() -> Self {
        Self { cost: 2048, timeout_ms: 10_000 }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct RibConfig {
    pub localhost_security: bool,
    pub localhop_security: bool,
    pub auto_prefix_propagate: AutoPrefixPropagateConfig,
    pub readvertise_nlsr: bool,
}

impl Default for RibConfig {
    fn default() -> Self {
        Self {
            localhost_security: true,
            localhop_security: true,
            auto_prefix_propagate: AutoPrefixPropagateConfig::default(),
            readvertise_nlsr: false,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct QuicConfig {
    pub listen_addr: String,
    pub cert_path: PathBuf,
    pub key_path: PathBuf,
}

impl Default for QuicConfig {
    fn default() -> Self {
        Self {
            listen_addr: format!("0.0.0.0:{}", rust_udcn_quic::NDN_QUIC_PORT),
            cert_path: PathBuf::from("cert.pem"),
            key_path: PathBuf::from("key.pem"),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ManagementConfig {
    pub socket_path: PathBuf,
}

impl Default for ManagementConfig {
    fn default() -> Self {
        Self { socket_path: PathBuf::from("/tmp/udcnd.sock") }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct DaemonConfig {
    pub cs: CsConfig,
    pub tables: TablesConfig,
    pub rib: RibConfig,
    pub quic: QuicConfig,
    pub management: ManagementConfig,
}

impl DaemonConfig {
    /// Loads `path` (if it exists) layered under defaults, then applies
    /// `UDCND_*` environment overrides (e.g. `UDCND_CS__CAPACITY=2048`).
    pub fn load(path: Option<&std::path::Path>) -> Result<Self> {
        let mut builder = config::Config::builder();
        if let Some(path) = path {
            builder = builder.add_source(config::File::from(path).required(false));
        }
        builder = builder.add_source(config::Environment::with_prefix("UDCND").separator("__"));
        let raw = builder.build().context("loading daemon configuration")?;
        raw.try_deserialize().context("deserializing daemon configuration")
    }
}
