use alloy::primitives::{address, Address};
use thiserror::Error;

use wave_portal_core::WAVE_GAS_LIMIT;

/// The deployed WavePortal contract.
pub const DEFAULT_CONTRACT_ADDRESS: Address = address!("6909e506FBEc9F2738226b0b73eC2AAee7de6489");

pub const DEFAULT_EXPLORER_TX_BASE_URL: &str = "https://rinkeby.etherscan.io/tx/";

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("invalid contract address '{0}'")]
    InvalidContract(String),
    #[error("invalid rpc url '{0}': expected http(s)")]
    InvalidUrl(String),
    #[error("{0} must be greater than zero")]
    ZeroInterval(&'static str),
}

#[derive(Debug, Clone)]
pub struct WavePortalConfig {
    pub contract_address: Address,
    /// JSON-RPC endpoint of the wallet. `None` behaves like a browser without
    /// a wallet extension.
    pub wallet_rpc_url: Option<String>,
    /// Node used for reads and logs; falls back to the wallet endpoint.
    pub node_rpc_url: Option<String>,
    pub gas_limit: u64,
    pub request_timeout_ms: u64,
    pub receipt_poll_interval_ms: u64,
    pub log_poll_interval_ms: u64,
    pub explorer_tx_base_url: String,
    /// Deterministic wallet and in-memory contract.
    pub demo_mode: bool,
}

impl Default for WavePortalConfig {
    fn default() -> Self {
        Self {
            contract_address: DEFAULT_CONTRACT_ADDRESS,
            wallet_rpc_url: None,
            node_rpc_url: None,
            gas_limit: WAVE_GAS_LIMIT,
            request_timeout_ms: 15_000,
            receipt_poll_interval_ms: 2_000,
            log_poll_interval_ms: 4_000,
            explorer_tx_base_url: DEFAULT_EXPLORER_TX_BASE_URL.to_owned(),
            demo_mode: false,
        }
    }
}

impl WavePortalConfig {
    /// Defaults overridden by `WAVE_PORTAL_*` variables. Unparseable values
    /// are ignored with a warning.
    pub fn from_env() -> Self {
        let mut cfg = Self::default();
        if let Some(url) = env_value("WAVE_PORTAL_WALLET_RPC_URL") {
            cfg.wallet_rpc_url = Some(url);
        }
        if let Some(url) = env_value("WAVE_PORTAL_NODE_RPC_URL") {
            cfg.node_rpc_url = Some(url);
        }
        if let Some(raw) = env_value("WAVE_PORTAL_CONTRACT") {
            match parse_contract_address(&raw) {
                Ok(addr) => cfg.contract_address = addr,
                Err(e) => tracing::warn!(error = %e, "keeping default contract address"),
            }
        }
        if let Some(raw) = env_value("WAVE_PORTAL_DEMO") {
            cfg.demo_mode = matches!(raw.to_ascii_lowercase().as_str(), "1" | "true" | "yes");
        }
        cfg
    }

    pub fn node_url(&self) -> Option<&str> {
        self.node_rpc_url
            .as_deref()
            .or(self.wallet_rpc_url.as_deref())
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        for url in [self.wallet_rpc_url.as_deref(), self.node_rpc_url.as_deref()]
            .into_iter()
            .flatten()
        {
            if !(url.starts_with("http://") || url.starts_with("https://")) {
                return Err(ConfigError::InvalidUrl(url.to_owned()));
            }
        }
        if self.receipt_poll_interval_ms == 0 {
            return Err(ConfigError::ZeroInterval("receipt_poll_interval_ms"));
        }
        if self.log_poll_interval_ms == 0 {
            return Err(ConfigError::ZeroInterval("log_poll_interval_ms"));
        }
        Ok(())
    }
}

pub fn parse_contract_address(raw: &str) -> Result<Address, ConfigError> {
    raw.trim()
        .parse()
        .map_err(|_| ConfigError::InvalidContract(raw.to_owned()))
}

fn env_value(key: &str) -> Option<String> {
    std::env::var(key)
        .ok()
        .map(|v| v.trim().to_owned())
        .filter(|v| !v.is_empty())
}
