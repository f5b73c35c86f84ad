use std::sync::{Arc, Mutex};

use alloy::primitives::Address;
use serde_json::Value;

use wave_portal_core::{PortError, WalletProviderPort};

use crate::rpc::JsonRpcTransport;
use crate::WavePortalConfig;

/// Wallet reached through EIP-1193 style requests.
#[derive(Debug, Clone)]
pub struct Eip1193Adapter {
    mode: ProviderMode,
    state: Arc<Mutex<ProviderState>>,
}

#[derive(Debug, Clone)]
enum ProviderMode {
    Disabled(String),
    Deterministic,
    Proxy(JsonRpcTransport),
}

#[derive(Debug, Clone, Default)]
struct ProviderState {
    /// Accounts `eth_requestAccounts` grants in deterministic mode.
    grantable: Vec<Address>,
    authorized: Vec<Address>,
    deny_requests: bool,
}

impl Eip1193Adapter {
    pub fn with_config(config: &WavePortalConfig) -> Self {
        if config.demo_mode {
            return Self::deterministic(vec![demo_account()]);
        }

        let mode = match config.wallet_rpc_url.as_deref() {
            Some(url) => match JsonRpcTransport::new(url, config.request_timeout_ms) {
                Ok(transport) => ProviderMode::Proxy(transport),
                Err(e) => ProviderMode::Disabled(format!("wallet transport unavailable: {e}")),
            },
            None => ProviderMode::Disabled("no wallet provider configured".to_owned()),
        };
        Self::from_mode(mode)
    }

    pub fn disabled(reason: impl Into<String>) -> Self {
        Self::from_mode(ProviderMode::Disabled(reason.into()))
    }

    /// In-memory wallet that grants `accounts` on the first
    /// `eth_requestAccounts`.
    pub fn deterministic(accounts: Vec<Address>) -> Self {
        let adapter = Self::from_mode(ProviderMode::Deterministic);
        if let Ok(mut g) = adapter.state.lock() {
            g.grantable = accounts;
        }
        adapter
    }

    pub fn proxy(transport: JsonRpcTransport) -> Self {
        Self::from_mode(ProviderMode::Proxy(transport))
    }

    fn from_mode(mode: ProviderMode) -> Self {
        Self {
            mode,
            state: Arc::new(Mutex::new(ProviderState::default())),
        }
    }

    pub fn is_available(&self) -> bool {
        !matches!(self.mode, ProviderMode::Disabled(_))
    }

    pub fn transport(&self) -> Option<&JsonRpcTransport> {
        match &self.mode {
            ProviderMode::Proxy(transport) => Some(transport),
            _ => None,
        }
    }

    fn check_mode(&self) -> Result<(), PortError> {
        if let ProviderMode::Disabled(reason) = &self.mode {
            return Err(PortError::ProviderUnavailable(reason.clone()));
        }
        Ok(())
    }

    fn lock_state(&self) -> Result<std::sync::MutexGuard<'_, ProviderState>, PortError> {
        self.state
            .lock()
            .map_err(|e| PortError::Transport(format!("provider lock poisoned: {e}")))
    }

    /// Marks `accounts` as already authorized, as if granted in an earlier
    /// session.
    pub fn debug_authorize(&self, accounts: Vec<Address>) -> Result<(), PortError> {
        self.lock_state()?.authorized = accounts;
        Ok(())
    }

    pub fn debug_deny_requests(&self, deny: bool) -> Result<(), PortError> {
        self.lock_state()?.deny_requests = deny;
        Ok(())
    }

    fn proxy_accounts(
        &self,
        transport: &JsonRpcTransport,
        method: &str,
    ) -> Result<Vec<Address>, PortError> {
        let result = transport.call(method, serde_json::json!([]))?;
        let accounts = parse_accounts(method, &result)?;
        self.lock_state()?.authorized = accounts.clone();
        Ok(accounts)
    }
}

impl WalletProviderPort for Eip1193Adapter {
    fn authorized_accounts(&self) -> Result<Vec<Address>, PortError> {
        self.check_mode()?;
        if let ProviderMode::Proxy(transport) = &self.mode {
            return self.proxy_accounts(transport, "eth_accounts");
        }
        Ok(self.lock_state()?.authorized.clone())
    }

    fn request_accounts(&self) -> Result<Vec<Address>, PortError> {
        self.check_mode()?;
        if let ProviderMode::Proxy(transport) = &self.mode {
            return self.proxy_accounts(transport, "eth_requestAccounts");
        }

        let mut g = self.lock_state()?;
        if g.deny_requests {
            return Err(PortError::Rejected("User rejected the request.".to_owned()));
        }
        if g.authorized.is_empty() {
            g.authorized = g.grantable.clone();
        }
        Ok(g.authorized.clone())
    }
}

fn parse_accounts(method: &str, result: &Value) -> Result<Vec<Address>, PortError> {
    let arr = result
        .as_array()
        .ok_or_else(|| PortError::Transport(format!("{method}: array expected")))?;
    arr.iter()
        .map(|item| {
            let raw = item
                .as_str()
                .ok_or_else(|| PortError::Transport(format!("{method}: string expected")))?;
            raw.parse()
                .map_err(|e| PortError::Validation(format!("invalid account address: {e}")))
        })
        .collect()
}

pub fn demo_account() -> Address {
    Address::repeat_byte(0x1d)
}
