#![allow(dead_code)]

use std::collections::BTreeMap;
use std::sync::mpsc::{self, Receiver, Sender};
use std::sync::{Arc, Mutex};

use alloy::primitives::{Address, B256, U256};

use wave_portal_core::{
    ContractGatewayPort, NewWaveEvent, NewWaveHandler, PortError, SubscriptionId,
    WalletProviderPort, WaveClient, WaveRecord,
};

pub fn account() -> Address {
    "0x1000000000000000000000000000000000000001"
        .parse()
        .expect("valid account")
}

pub fn waver() -> Address {
    "0x000000000000000000000000000000000000ABCD"
        .parse()
        .expect("valid waver")
}

pub fn tx_hash(seed: u8) -> B256 {
    B256::repeat_byte(seed)
}

#[derive(Debug, Clone)]
pub enum WalletScript {
    Missing,
    Authorized(Vec<Address>),
    Denied,
}

#[derive(Debug, Clone)]
pub struct ScriptedWallet {
    pub script: WalletScript,
}

impl ScriptedWallet {
    pub fn missing() -> Self {
        Self {
            script: WalletScript::Missing,
        }
    }

    pub fn authorized(accounts: Vec<Address>) -> Self {
        Self {
            script: WalletScript::Authorized(accounts),
        }
    }

    pub fn denied() -> Self {
        Self {
            script: WalletScript::Denied,
        }
    }
}

impl WalletProviderPort for ScriptedWallet {
    fn authorized_accounts(&self) -> Result<Vec<Address>, PortError> {
        match &self.script {
            WalletScript::Missing => Err(PortError::ProviderUnavailable(
                "no injected provider".to_owned(),
            )),
            WalletScript::Authorized(accounts) => Ok(accounts.clone()),
            WalletScript::Denied => Ok(Vec::new()),
        }
    }

    fn request_accounts(&self) -> Result<Vec<Address>, PortError> {
        match &self.script {
            WalletScript::Missing => Err(PortError::ProviderUnavailable(
                "no injected provider".to_owned(),
            )),
            WalletScript::Authorized(accounts) => Ok(accounts.clone()),
            WalletScript::Denied => Err(PortError::Rejected("user rejected".to_owned())),
        }
    }
}

#[derive(Default)]
pub struct GatewayState {
    pub total: U256,
    pub history: Vec<WaveRecord>,
    pub fail_reads: bool,
    pub fail_send: Option<PortError>,
    pub fail_confirm: Option<PortError>,
    pub sends: Vec<(Address, String, u64)>,
    pub total_reads: usize,
    pub next_sub: u64,
}

/// Gateway fake; confirmations can be held until the test releases them.
#[derive(Clone)]
pub struct ScriptedGateway {
    pub state: Arc<Mutex<GatewayState>>,
    pub handlers: Arc<Mutex<BTreeMap<u64, NewWaveHandler>>>,
    gate: Option<Arc<Mutex<Receiver<()>>>>,
    entered: Option<Arc<Mutex<Sender<()>>>>,
}

impl Default for ScriptedGateway {
    fn default() -> Self {
        Self {
            state: Arc::new(Mutex::new(GatewayState::default())),
            handlers: Arc::new(Mutex::new(BTreeMap::new())),
            gate: None,
            entered: None,
        }
    }
}

pub struct ConfirmationGate {
    pub release: Sender<()>,
    pub entered: Receiver<()>,
}

impl ScriptedGateway {
    /// Confirmation blocks until `release` is signalled; `entered` fires
    /// once the client is waiting.
    pub fn gated() -> (Self, ConfirmationGate) {
        let (release_tx, release_rx) = mpsc::channel();
        let (entered_tx, entered_rx) = mpsc::channel();
        let gateway = Self {
            gate: Some(Arc::new(Mutex::new(release_rx))),
            entered: Some(Arc::new(Mutex::new(entered_tx))),
            ..Self::default()
        };
        (
            gateway,
            ConfirmationGate {
                release: release_tx,
                entered: entered_rx,
            },
        )
    }

    pub fn with_total(self, total: u64) -> Self {
        self.state.lock().expect("gateway state").total = U256::from(total);
        self
    }

    pub fn with_history(self, history: Vec<WaveRecord>) -> Self {
        self.state.lock().expect("gateway state").history = history;
        self
    }

    pub fn emit(&self, event: NewWaveEvent) {
        let handlers = self.handlers.lock().expect("handlers");
        for handler in handlers.values() {
            handler(event.clone());
        }
    }

    pub fn send_count(&self) -> usize {
        self.state.lock().expect("gateway state").sends.len()
    }
}

impl ContractGatewayPort for ScriptedGateway {
    fn total_waves(&self) -> Result<U256, PortError> {
        let mut g = self.state.lock().expect("gateway state");
        g.total_reads += 1;
        if g.fail_reads {
            return Err(PortError::Transport("node unreachable".to_owned()));
        }
        Ok(g.total)
    }

    fn all_waves(&self) -> Result<Vec<WaveRecord>, PortError> {
        let g = self.state.lock().expect("gateway state");
        if g.fail_reads {
            return Err(PortError::Transport("node unreachable".to_owned()));
        }
        Ok(g.history.clone())
    }

    fn send_wave(&self, from: Address, message: &str, gas_limit: u64) -> Result<B256, PortError> {
        let mut g = self.state.lock().expect("gateway state");
        if let Some(err) = g.fail_send.clone() {
            return Err(err);
        }
        g.sends.push((from, message.to_owned(), gas_limit));
        Ok(tx_hash(g.sends.len() as u8))
    }

    fn await_confirmation(&self, _tx_hash: B256) -> Result<(), PortError> {
        if let Some(entered) = &self.entered {
            let _ = entered.lock().expect("entered").send(());
        }
        if let Some(gate) = &self.gate {
            let _ = gate.lock().expect("gate").recv();
        }
        let mut g = self.state.lock().expect("gateway state");
        if let Some(err) = g.fail_confirm.clone() {
            return Err(err);
        }
        g.total += U256::from(1);
        Ok(())
    }

    fn subscribe_new_wave(&self, handler: NewWaveHandler) -> Result<SubscriptionId, PortError> {
        let id = {
            let mut g = self.state.lock().expect("gateway state");
            g.next_sub += 1;
            g.next_sub
        };
        self.handlers.lock().expect("handlers").insert(id, handler);
        Ok(SubscriptionId(id))
    }

    fn unsubscribe(&self, id: SubscriptionId) -> Result<(), PortError> {
        self.handlers.lock().expect("handlers").remove(&id.0);
        Ok(())
    }
}

pub type TestClient = WaveClient<ScriptedWallet, ScriptedGateway>;

/// Client that already went through `check_connection`.
pub fn connected_client(gateway: ScriptedGateway) -> TestClient {
    let client = WaveClient::new(ScriptedWallet::authorized(vec![account()]), gateway);
    client.check_connection().expect("check connection");
    client
}
