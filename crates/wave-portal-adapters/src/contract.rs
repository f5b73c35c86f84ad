//! WavePortal contract gateway.
//!
//! Three runtimes share one subscriber registry:
//! - `Rpc`: `eth_call` reads, wallet-signed `eth_sendTransaction` writes,
//!   receipt polling and a log watcher thread for `NewWave`.
//! - `InMemory`: a deterministic ledger that mines on confirmation.
//! - `Disabled`: no node configured.

use std::collections::{BTreeMap, HashMap};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};
use std::thread;
use std::time::Duration;

use alloy::primitives::{keccak256, Address, B256, U256};
use alloy::sol_types::{SolCall, SolEvent};
use serde_json::Value;

use wave_portal_core::{
    ContractGatewayPort, NewWaveEvent, NewWaveHandler, PortError, SubscriptionId, WaveRecord,
};

use crate::rpc::{parse_quantity, quantity, JsonRpcTransport};
use crate::WavePortalConfig;

mod abi {
    alloy::sol! {
        struct Wave {
            address waver;
            string message;
            uint256 timestamp;
        }

        function wave(string _message) external;
        function getAllWaves() external view returns (Wave[] memory);
        function getTotalWaves() external view returns (uint256);

        event NewWave(address indexed from, uint256 timestamp, string message);
    }
}

/// First timestamp handed out by the in-memory ledger.
const LEDGER_GENESIS_SECS: u64 = 1_700_000_000;
const LEDGER_BLOCK_TIME_SECS: u64 = 12;

#[derive(Clone)]
pub struct WavePortalAdapter {
    contract: Address,
    mode: GatewayMode,
    subscribers: Arc<Mutex<Subscribers>>,
}

#[derive(Clone)]
enum GatewayMode {
    Disabled(String),
    InMemory(Arc<Mutex<Ledger>>),
    Rpc(RpcRuntime),
}

#[derive(Clone)]
struct RpcRuntime {
    node: JsonRpcTransport,
    wallet: Option<JsonRpcTransport>,
    receipt_poll: Duration,
    log_poll: Duration,
    /// Stop flag of the running log watcher, if any.
    watcher: Arc<Mutex<Option<Arc<AtomicBool>>>>,
}

#[derive(Default)]
struct Subscribers {
    next_id: u64,
    handlers: BTreeMap<u64, NewWaveHandler>,
}

struct Ledger {
    waves: Vec<WaveRecord>,
    clock: u64,
    nonce: u64,
    pending: HashMap<B256, PendingWave>,
    fail_next_send: Option<PortError>,
    revert_next: bool,
}

struct PendingWave {
    from: Address,
    message: String,
}

impl Default for Ledger {
    fn default() -> Self {
        Self {
            waves: Vec::new(),
            clock: LEDGER_GENESIS_SECS,
            nonce: 0,
            pending: HashMap::new(),
            fail_next_send: None,
            revert_next: false,
        }
    }
}

impl std::fmt::Debug for WavePortalAdapter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mode = match &self.mode {
            GatewayMode::Disabled(_) => "disabled",
            GatewayMode::InMemory(_) => "in-memory",
            GatewayMode::Rpc(_) => "rpc",
        };
        f.debug_struct("WavePortalAdapter")
            .field("contract", &self.contract)
            .field("mode", &mode)
            .finish_non_exhaustive()
    }
}

impl WavePortalAdapter {
    pub fn with_config(config: &WavePortalConfig) -> Self {
        if config.demo_mode {
            return Self::in_memory(config.contract_address);
        }

        let Some(node_url) = config.node_url() else {
            return Self::disabled(config.contract_address, "no node rpc configured");
        };
        let node = match JsonRpcTransport::new(node_url, config.request_timeout_ms) {
            Ok(node) => node,
            Err(e) => return Self::disabled(config.contract_address, e.to_string()),
        };
        let wallet = config
            .wallet_rpc_url
            .as_deref()
            .and_then(|url| JsonRpcTransport::new(url, config.request_timeout_ms).ok());
        Self::rpc(
            config.contract_address,
            node,
            wallet,
            Duration::from_millis(config.receipt_poll_interval_ms),
            Duration::from_millis(config.log_poll_interval_ms),
        )
    }

    pub fn rpc(
        contract: Address,
        node: JsonRpcTransport,
        wallet: Option<JsonRpcTransport>,
        receipt_poll: Duration,
        log_poll: Duration,
    ) -> Self {
        Self::from_mode(
            contract,
            GatewayMode::Rpc(RpcRuntime {
                node,
                wallet,
                receipt_poll,
                log_poll,
                watcher: Arc::new(Mutex::new(None)),
            }),
        )
    }

    pub fn in_memory(contract: Address) -> Self {
        Self::from_mode(contract, GatewayMode::InMemory(Arc::default()))
    }

    pub fn disabled(contract: Address, reason: impl Into<String>) -> Self {
        Self::from_mode(contract, GatewayMode::Disabled(reason.into()))
    }

    fn from_mode(contract: Address, mode: GatewayMode) -> Self {
        Self {
            contract,
            mode,
            subscribers: Arc::default(),
        }
    }

    pub fn subscriber_count(&self) -> Result<usize, PortError> {
        Ok(lock(&self.subscribers, "subscribers")?.handlers.len())
    }

    fn ledger(&self) -> Result<MutexGuard<'_, Ledger>, PortError> {
        match &self.mode {
            GatewayMode::InMemory(ledger) => lock(ledger, "ledger"),
            _ => Err(PortError::NotImplemented("debug hooks need the in-memory ledger")),
        }
    }

    pub fn debug_seed(&self, waves: Vec<WaveRecord>) -> Result<(), PortError> {
        self.ledger()?.waves = waves;
        Ok(())
    }

    pub fn debug_fail_next_send(&self, error: PortError) -> Result<(), PortError> {
        self.ledger()?.fail_next_send = Some(error);
        Ok(())
    }

    pub fn debug_revert_next(&self) -> Result<(), PortError> {
        self.ledger()?.revert_next = true;
        Ok(())
    }

    /// Delivers `event` to subscribers without touching the ledger.
    pub fn debug_emit(&self, event: NewWaveEvent) -> Result<(), PortError> {
        dispatch(&self.subscribers, &event)
    }

    fn eth_call(&self, node: &JsonRpcTransport, data: Vec<u8>) -> Result<Vec<u8>, PortError> {
        let params = serde_json::json!([
            {
                "to": self.contract.to_string(),
                "data": alloy::hex::encode_prefixed(data),
            },
            "latest"
        ]);
        let result = node.call("eth_call", params)?;
        decode_hex(&result, "eth_call")
    }
}

impl ContractGatewayPort for WavePortalAdapter {
    fn total_waves(&self) -> Result<U256, PortError> {
        match &self.mode {
            GatewayMode::Disabled(reason) => Err(PortError::ProviderUnavailable(reason.clone())),
            GatewayMode::InMemory(ledger) => {
                Ok(U256::from(lock(ledger, "ledger")?.waves.len()))
            }
            GatewayMode::Rpc(rt) => {
                let out = self.eth_call(&rt.node, abi::getTotalWavesCall {}.abi_encode())?;
                let decoded = abi::getTotalWavesCall::abi_decode_returns(&out, true)
                    .map_err(|e| PortError::Validation(format!("getTotalWaves decode: {e}")))?;
                Ok(decoded._0)
            }
        }
    }

    fn all_waves(&self) -> Result<Vec<WaveRecord>, PortError> {
        match &self.mode {
            GatewayMode::Disabled(reason) => Err(PortError::ProviderUnavailable(reason.clone())),
            GatewayMode::InMemory(ledger) => Ok(lock(ledger, "ledger")?.waves.clone()),
            GatewayMode::Rpc(rt) => {
                let out = self.eth_call(&rt.node, abi::getAllWavesCall {}.abi_encode())?;
                let decoded = abi::getAllWavesCall::abi_decode_returns(&out, true)
                    .map_err(|e| PortError::Validation(format!("getAllWaves decode: {e}")))?;
                Ok(decoded
                    ._0
                    .into_iter()
                    .map(|w| WaveRecord {
                        waver: w.waver,
                        timestamp: w.timestamp,
                        message: w.message,
                    })
                    .collect())
            }
        }
    }

    fn send_wave(&self, from: Address, message: &str, gas_limit: u64) -> Result<B256, PortError> {
        match &self.mode {
            GatewayMode::Disabled(reason) => Err(PortError::ProviderUnavailable(reason.clone())),
            GatewayMode::InMemory(ledger) => {
                let mut g = lock(ledger, "ledger")?;
                if let Some(err) = g.fail_next_send.take() {
                    return Err(err);
                }
                g.nonce += 1;
                let mut seed = Vec::with_capacity(28 + message.len());
                seed.extend_from_slice(from.as_slice());
                seed.extend_from_slice(&g.nonce.to_be_bytes());
                seed.extend_from_slice(message.as_bytes());
                let hash = keccak256(seed);
                g.pending.insert(
                    hash,
                    PendingWave {
                        from,
                        message: message.to_owned(),
                    },
                );
                Ok(hash)
            }
            GatewayMode::Rpc(rt) => {
                let wallet = rt.wallet.as_ref().ok_or_else(|| {
                    PortError::ProviderUnavailable("no wallet to sign the wave".to_owned())
                })?;
                let data = abi::waveCall {
                    _message: message.to_owned(),
                }
                .abi_encode();
                let tx = serde_json::json!({
                    "from": from.to_string(),
                    "to": self.contract.to_string(),
                    "data": alloy::hex::encode_prefixed(data),
                    "gas": quantity(gas_limit),
                });
                let result = wallet.call("eth_sendTransaction", serde_json::json!([tx]))?;
                let hash = result.as_str().ok_or_else(|| {
                    PortError::Transport("eth_sendTransaction must return hash".to_owned())
                })?;
                hash.parse()
                    .map_err(|e| PortError::Validation(format!("invalid tx hash: {e}")))
            }
        }
    }

    fn await_confirmation(&self, tx_hash: B256) -> Result<(), PortError> {
        match &self.mode {
            GatewayMode::Disabled(reason) => Err(PortError::ProviderUnavailable(reason.clone())),
            GatewayMode::InMemory(ledger) => {
                let event = {
                    let mut g = lock(ledger, "ledger")?;
                    let pending = g.pending.remove(&tx_hash).ok_or_else(|| {
                        PortError::Validation(format!("unknown transaction {tx_hash}"))
                    })?;
                    if std::mem::take(&mut g.revert_next) {
                        return Err(PortError::Reverted(tx_hash));
                    }
                    g.clock += LEDGER_BLOCK_TIME_SECS;
                    let record = WaveRecord {
                        waver: pending.from,
                        timestamp: U256::from(g.clock),
                        message: pending.message,
                    };
                    g.waves.push(record.clone());
                    NewWaveEvent {
                        from: record.waver,
                        timestamp: record.timestamp,
                        message: record.message,
                    }
                };
                dispatch(&self.subscribers, &event)
            }
            GatewayMode::Rpc(rt) => loop {
                let receipt = match rt.node.call(
                    "eth_getTransactionReceipt",
                    serde_json::json!([tx_hash.to_string()]),
                ) {
                    Ok(receipt) => receipt,
                    // The transaction may still be pending; only a receipt settles it.
                    Err(PortError::Transport(e)) => {
                        tracing::warn!(%tx_hash, error = %e, "receipt poll failed, retrying");
                        thread::sleep(rt.receipt_poll);
                        continue;
                    }
                    Err(e) => return Err(e),
                };
                if receipt.is_null() {
                    thread::sleep(rt.receipt_poll);
                    continue;
                }
                let status = receipt
                    .get("status")
                    .map(parse_quantity)
                    .transpose()?
                    .unwrap_or(1);
                return if status == 1 {
                    Ok(())
                } else {
                    Err(PortError::Reverted(tx_hash))
                };
            },
        }
    }

    fn subscribe_new_wave(&self, handler: NewWaveHandler) -> Result<SubscriptionId, PortError> {
        if let GatewayMode::Disabled(reason) = &self.mode {
            return Err(PortError::ProviderUnavailable(reason.clone()));
        }
        let id = {
            let mut subs = lock(&self.subscribers, "subscribers")?;
            subs.next_id += 1;
            let id = subs.next_id;
            subs.handlers.insert(id, handler);
            id
        };
        if let GatewayMode::Rpc(rt) = &self.mode {
            if let Err(e) = self.ensure_log_watcher(rt) {
                lock(&self.subscribers, "subscribers")?.handlers.remove(&id);
                return Err(e);
            }
        }
        Ok(SubscriptionId(id))
    }

    fn unsubscribe(&self, id: SubscriptionId) -> Result<(), PortError> {
        let now_empty = {
            let mut subs = lock(&self.subscribers, "subscribers")?;
            subs.handlers.remove(&id.0);
            subs.handlers.is_empty()
        };
        if let (true, GatewayMode::Rpc(rt)) = (now_empty, &self.mode) {
            if let Some(stop) = lock(&rt.watcher, "watcher")?.take() {
                stop.store(true, Ordering::SeqCst);
            }
        }
        Ok(())
    }
}

impl WavePortalAdapter {
    fn ensure_log_watcher(&self, rt: &RpcRuntime) -> Result<(), PortError> {
        let mut slot = lock(&rt.watcher, "watcher")?;
        if slot.is_some() {
            return Ok(());
        }
        let stop = Arc::new(AtomicBool::new(false));
        let watcher = LogWatcher {
            node: rt.node.clone(),
            contract: self.contract,
            poll: rt.log_poll,
            subscribers: Arc::clone(&self.subscribers),
            stop: Arc::clone(&stop),
        };
        thread::Builder::new()
            .name("wave-portal-logs".to_owned())
            .spawn(move || watcher.run())
            .map_err(|e| PortError::Transport(format!("failed to spawn log watcher: {e}")))?;
        *slot = Some(stop);
        Ok(())
    }
}

struct LogWatcher {
    node: JsonRpcTransport,
    contract: Address,
    poll: Duration,
    subscribers: Arc<Mutex<Subscribers>>,
    stop: Arc<AtomicBool>,
}

impl LogWatcher {
    fn run(self) {
        // Only blocks mined after the subscription are of interest.
        let mut next_block = None;
        while !self.stop.load(Ordering::SeqCst) {
            match next_block {
                None => match self.block_number() {
                    Ok(latest) => next_block = Some(latest + 1),
                    Err(e) => tracing::warn!(error = %e, "log watcher cannot read block number"),
                },
                Some(from) => match self.fetch_new_waves(from) {
                    Ok((events, next)) => {
                        next_block = Some(next);
                        for event in events {
                            if let Err(e) = dispatch(&self.subscribers, &event) {
                                tracing::warn!(error = %e, "failed to deliver NewWave");
                            }
                        }
                    }
                    Err(e) => tracing::warn!(error = %e, from, "failed to poll NewWave logs"),
                },
            }
            thread::sleep(self.poll);
        }
        tracing::debug!("log watcher stopped");
    }

    fn block_number(&self) -> Result<u64, PortError> {
        parse_quantity(&self.node.call("eth_blockNumber", serde_json::json!([]))?)
    }

    fn fetch_new_waves(&self, from: u64) -> Result<(Vec<NewWaveEvent>, u64), PortError> {
        let latest = self.block_number()?;
        if latest < from {
            return Ok((Vec::new(), from));
        }
        let filter = serde_json::json!({
            "address": self.contract.to_string(),
            "topics": [abi::NewWave::SIGNATURE_HASH.to_string()],
            "fromBlock": quantity(from),
            "toBlock": quantity(latest),
        });
        let logs = self.node.call("eth_getLogs", serde_json::json!([filter]))?;
        let logs = logs
            .as_array()
            .ok_or_else(|| PortError::Transport("eth_getLogs: array expected".to_owned()))?;
        let mut events = Vec::with_capacity(logs.len());
        for log in logs {
            if log.get("removed").and_then(Value::as_bool) == Some(true) {
                continue;
            }
            match decode_new_wave_log(log) {
                Ok(event) => events.push(event),
                Err(e) => tracing::warn!(error = %e, "skipping undecodable NewWave log"),
            }
        }
        Ok((events, latest + 1))
    }
}

/// Runs every handler with the registry locked, so an unsubscribed handler
/// never fires afterwards.
fn dispatch(subscribers: &Mutex<Subscribers>, event: &NewWaveEvent) -> Result<(), PortError> {
    let subs = lock(subscribers, "subscribers")?;
    for handler in subs.handlers.values() {
        handler(event.clone());
    }
    Ok(())
}

pub(crate) fn decode_new_wave_log(log: &Value) -> Result<NewWaveEvent, PortError> {
    let topics = log
        .get("topics")
        .and_then(Value::as_array)
        .ok_or_else(|| PortError::Transport("log missing topics".to_owned()))?
        .iter()
        .map(|t| {
            t.as_str()
                .ok_or_else(|| PortError::Transport("topic must be string".to_owned()))?
                .parse::<B256>()
                .map_err(|e| PortError::Validation(format!("invalid topic: {e}")))
        })
        .collect::<Result<Vec<_>, _>>()?;
    let data = decode_hex(
        log.get("data")
            .ok_or_else(|| PortError::Transport("log missing data".to_owned()))?,
        "log data",
    )?;
    let decoded = abi::NewWave::decode_raw_log(topics, &data, true)
        .map_err(|e| PortError::Validation(format!("NewWave decode: {e}")))?;
    Ok(NewWaveEvent {
        from: decoded.from,
        timestamp: decoded.timestamp,
        message: decoded.message,
    })
}

fn decode_hex(value: &Value, what: &str) -> Result<Vec<u8>, PortError> {
    let raw = value
        .as_str()
        .ok_or_else(|| PortError::Transport(format!("{what}: hex string expected")))?;
    alloy::hex::decode(raw).map_err(|e| PortError::Validation(format!("{what}: invalid hex: {e}")))
}

fn lock<'a, T>(mutex: &'a Mutex<T>, what: &str) -> Result<MutexGuard<'a, T>, PortError> {
    mutex
        .lock()
        .map_err(|e| PortError::Transport(format!("{what} lock poisoned: {e}")))
}

#[cfg(test)]
pub(crate) mod fixtures {
    use super::*;
    use alloy::sol_types::SolValue;

    pub fn total_waves_return(total: u64) -> String {
        alloy::hex::encode_prefixed(U256::from(total).abi_encode())
    }

    pub fn all_waves_return(records: &[WaveRecord]) -> String {
        let waves: Vec<abi::Wave> = records
            .iter()
            .map(|r| abi::Wave {
                waver: r.waver,
                message: r.message.clone(),
                timestamp: r.timestamp,
            })
            .collect();
        alloy::hex::encode_prefixed(abi::getAllWavesCall::abi_encode_returns(&(waves,)))
    }

    pub fn new_wave_log(from: Address, timestamp: u64, message: &str) -> Value {
        let event = abi::NewWave {
            from,
            timestamp: U256::from(timestamp),
            message: message.to_owned(),
        };
        let data = event.encode_data();
        serde_json::json!({
            "topics": [
                abi::NewWave::SIGNATURE_HASH.to_string(),
                B256::left_padding_from(from.as_slice()).to_string(),
            ],
            "data": alloy::hex::encode_prefixed(data),
            "removed": false,
        })
    }

    pub fn wave_selector() -> [u8; 4] {
        abi::waveCall::SELECTOR
    }
}
