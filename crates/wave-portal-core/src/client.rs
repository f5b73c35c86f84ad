use std::sync::{Arc, Mutex, MutexGuard};

use alloy::primitives::{Address, B256, U256};
use thiserror::Error;

use crate::domain::{DomainError, NewWaveEvent, Notice, Wave, WAVE_GAS_LIMIT};
use crate::ports::{
    ContractGatewayPort, NewWaveHandler, PortError, SubscriptionId, WalletProviderPort,
};
use crate::state_machine::{
    session_transition, SessionAction, SessionState, StateTransition, TransitionError,
};
use crate::view::{derive_view, WaveView};

#[derive(Debug, Error)]
pub enum ClientError {
    #[error("wallet extension required")]
    WalletMissing,
    #[error("no connected account")]
    NotConnected,
    #[error("wave message is empty")]
    EmptyMessage,
    #[error("a wave is already being mined")]
    SubmissionInFlight,
    #[error(transparent)]
    Port(#[from] PortError),
    #[error(transparent)]
    Domain(#[from] DomainError),
    #[error(transparent)]
    Transition(#[from] TransitionError),
    #[error("client state lock poisoned")]
    StatePoisoned,
}

/// Everything the shell renders, plus the session bookkeeping behind it.
#[derive(Debug, Clone, Default)]
pub struct ClientState {
    pub account: Option<Address>,
    pub session: SessionState,
    pub waves: Vec<Wave>,
    pub wave_count: Option<u64>,
    pub pending_message: String,
    pub last_tx: Option<B256>,
    pub alert: Option<Notice>,
    pub transitions: Vec<StateTransition>,
    pub listening: bool,
}

impl ClientState {
    pub fn is_mining(&self) -> bool {
        self.session.is_mining()
    }

    fn apply(&mut self, action: SessionAction) -> Result<(), TransitionError> {
        let (next, record) = session_transition(self.session, action)?;
        self.session = next;
        self.transitions.push(record);
        Ok(())
    }

    fn push_event(&mut self, event: NewWaveEvent) -> Result<(), DomainError> {
        let wave = Wave::from_event(event)?;
        self.waves.push(wave);
        Ok(())
    }
}

/// Orchestrates the wallet and the WavePortal contract for one session.
///
/// Every operation blocks on its port calls; the state mutex is never held
/// across one, so the live event handler and a pending submission never wait
/// on each other.
pub struct WaveClient<W, G>
where
    W: WalletProviderPort,
    G: ContractGatewayPort,
{
    pub wallet: W,
    pub gateway: G,
    gas_limit: u64,
    state: Arc<Mutex<ClientState>>,
    subscription: Mutex<Option<SubscriptionId>>,
}

impl<W, G> WaveClient<W, G>
where
    W: WalletProviderPort,
    G: ContractGatewayPort,
{
    pub fn new(wallet: W, gateway: G) -> Self {
        Self {
            wallet,
            gateway,
            gas_limit: WAVE_GAS_LIMIT,
            state: Arc::new(Mutex::new(ClientState::default())),
            subscription: Mutex::new(None),
        }
    }

    pub fn with_gas_limit(mut self, gas_limit: u64) -> Self {
        self.gas_limit = gas_limit;
        self
    }

    fn lock_state(&self) -> Result<MutexGuard<'_, ClientState>, ClientError> {
        self.state.lock().map_err(|_| ClientError::StatePoisoned)
    }

    pub fn snapshot(&self) -> Result<ClientState, ClientError> {
        Ok(self.lock_state()?.clone())
    }

    pub fn view(&self, explorer_tx_base_url: &str) -> Result<WaveView, ClientError> {
        Ok(derive_view(&*self.lock_state()?, explorer_tx_base_url))
    }

    pub fn account(&self) -> Result<Option<Address>, ClientError> {
        Ok(self.lock_state()?.account)
    }

    pub fn is_mining(&self) -> Result<bool, ClientError> {
        Ok(self.lock_state()?.is_mining())
    }

    pub fn set_pending_message(&self, text: &str) -> Result<(), ClientError> {
        let mut state = self.lock_state()?;
        if state.pending_message != text {
            state.pending_message = text.to_owned();
        }
        Ok(())
    }

    pub fn take_alert(&self) -> Result<Option<Notice>, ClientError> {
        Ok(self.lock_state()?.alert.take())
    }

    fn raise(&self, notice: Notice) -> Result<(), ClientError> {
        self.lock_state()?.alert = Some(notice);
        Ok(())
    }

    /// Picks up an account the wallet already authorized, without prompting.
    pub fn check_connection(&self) -> Result<Option<Address>, ClientError> {
        let accounts = match self.wallet.authorized_accounts() {
            Ok(accounts) => accounts,
            Err(PortError::ProviderUnavailable(reason)) => {
                tracing::warn!(%reason, "wallet extension not found");
                return Ok(None);
            }
            Err(e) => {
                tracing::warn!(error = %e, "failed to list authorized accounts");
                return Err(e.into());
            }
        };

        let Some(account) = accounts.first().copied() else {
            tracing::info!("no authorized account found");
            return Ok(None);
        };
        tracing::info!(%account, "found an authorized account");
        self.set_account(account)?;
        self.load_initial_data();
        Ok(Some(account))
    }

    /// Asks the wallet to authorize this client.
    pub fn connect(&self) -> Result<Address, ClientError> {
        let accounts = match self.wallet.request_accounts() {
            Ok(accounts) => accounts,
            Err(PortError::ProviderUnavailable(reason)) => {
                tracing::warn!(%reason, "cannot connect without a wallet extension");
                self.raise(Notice::WalletMissing)?;
                return Err(ClientError::WalletMissing);
            }
            Err(e) => {
                tracing::warn!(error = %e, "wallet authorization failed");
                return Err(e.into());
            }
        };

        let account = accounts.first().copied().ok_or_else(|| {
            tracing::warn!("wallet authorized no accounts");
            ClientError::Port(PortError::Rejected("no accounts authorized".to_owned()))
        })?;
        tracing::info!(%account, "connected");
        self.set_account(account)?;
        self.load_initial_data();
        Ok(account)
    }

    fn set_account(&self, account: Address) -> Result<(), ClientError> {
        let mut state = self.lock_state()?;
        state.apply(SessionAction::Connect)?;
        state.account = Some(account);
        Ok(())
    }

    fn load_initial_data(&self) {
        // Both reads log their own failures.
        let _ = self.refresh_count();
        let _ = self.load_history();
    }

    /// Replaces the wave list with the contract's full history.
    pub fn load_history(&self) -> Result<usize, ClientError> {
        let records = self.gateway.all_waves().map_err(|e| {
            tracing::warn!(error = %e, "failed to read wave history");
            e
        })?;
        let waves = records
            .into_iter()
            .map(Wave::from_record)
            .collect::<Result<Vec<_>, _>>()
            .map_err(|e| {
                tracing::warn!(error = %e, "wave history contains an invalid record");
                e
            })?;

        let loaded = waves.len();
        self.lock_state()?.waves = waves;
        tracing::info!(loaded, "wave history loaded");
        Ok(loaded)
    }

    pub fn refresh_count(&self) -> Result<u64, ClientError> {
        let total = self.gateway.total_waves().map_err(|e| {
            tracing::warn!(error = %e, "failed to read total wave count");
            e
        })?;
        let total = u64::try_from(total).map_err(|_| {
            tracing::warn!(%total, "total wave count does not fit in u64");
            PortError::Validation(format!("wave count out of range: {total}"))
        })?;

        self.lock_state()?.wave_count = Some(total);
        tracing::info!(total, "retrieved total wave count");
        Ok(total)
    }

    /// Sends `wave(text)` and blocks until it is mined or fails.
    pub fn submit_wave(&self, text: &str) -> Result<B256, ClientError> {
        if text.is_empty() {
            self.raise(Notice::EmptyMessage)?;
            return Err(ClientError::EmptyMessage);
        }

        let from = {
            let mut state = self.lock_state()?;
            let account = state.account.ok_or(ClientError::NotConnected)?;
            if state.is_mining() {
                return Err(ClientError::SubmissionInFlight);
            }
            state.apply(SessionAction::SubmitAccepted)?;
            account
        };

        let tx_hash = match self.gateway.send_wave(from, text, self.gas_limit) {
            Ok(hash) => hash,
            Err(e) => return Err(self.fail_submission(e)),
        };
        self.lock_state()?.last_tx = Some(tx_hash);
        tracing::info!(%tx_hash, "mining");

        if let Err(e) = self.gateway.await_confirmation(tx_hash) {
            return Err(self.fail_submission(e));
        }
        tracing::info!(%tx_hash, "mined");

        {
            let mut state = self.lock_state()?;
            state.pending_message.clear();
            state.apply(SessionAction::SubmitSettled)?;
        }
        let _ = self.refresh_count();
        Ok(tx_hash)
    }

    fn fail_submission(&self, error: PortError) -> ClientError {
        tracing::warn!(error = %error, "wave submission failed");
        match self.lock_state() {
            Ok(mut state) => {
                if let Err(e) = state.apply(SessionAction::SubmitSettled) {
                    tracing::error!(error = %e, "could not settle failed submission");
                }
                state.alert = Some(Notice::SubmissionFailed(error.to_string()));
                ClientError::Port(error)
            }
            Err(e) => e,
        }
    }

    /// Appends one live wave. Duplicates of history entries are kept.
    pub fn on_new_wave_event(
        &self,
        from: Address,
        timestamp: U256,
        message: String,
    ) -> Result<(), ClientError> {
        let event = NewWaveEvent {
            from,
            timestamp,
            message,
        };
        self.lock_state()?.push_event(event)?;
        Ok(())
    }

    /// Subscribes to `NewWave`. Idempotent.
    pub fn mount(&self) -> Result<SubscriptionId, ClientError> {
        let mut slot = self
            .subscription
            .lock()
            .map_err(|_| ClientError::StatePoisoned)?;
        if let Some(id) = *slot {
            return Ok(id);
        }

        self.lock_state()?.listening = true;
        let state = Arc::clone(&self.state);
        let handler: NewWaveHandler = Arc::new(move |event: NewWaveEvent| {
            deliver_live_wave(&state, event);
        });
        let id = match self.gateway.subscribe_new_wave(handler) {
            Ok(id) => id,
            Err(e) => {
                tracing::warn!(error = %e, "failed to subscribe to NewWave");
                self.lock_state()?.listening = false;
                return Err(e.into());
            }
        };
        tracing::debug!(subscription = id.0, "listening for NewWave");
        *slot = Some(id);
        Ok(id)
    }

    /// Releases the `NewWave` subscription. Safe to call more than once.
    pub fn teardown(&self) -> Result<(), ClientError> {
        let id = self
            .subscription
            .lock()
            .map_err(|_| ClientError::StatePoisoned)?
            .take();
        self.lock_state()?.listening = false;
        if let Some(id) = id {
            self.gateway.unsubscribe(id)?;
            tracing::debug!(subscription = id.0, "stopped listening for NewWave");
        }
        Ok(())
    }
}

impl<W, G> Drop for WaveClient<W, G>
where
    W: WalletProviderPort,
    G: ContractGatewayPort,
{
    fn drop(&mut self) {
        if let Err(e) = self.teardown() {
            tracing::warn!(error = %e, "teardown on drop failed");
        }
    }
}

fn deliver_live_wave(state: &Mutex<ClientState>, event: NewWaveEvent) {
    tracing::debug!(from = %event.from, timestamp = %event.timestamp, "NewWave");
    let Ok(mut state) = state.lock() else {
        return;
    };
    if !state.listening {
        tracing::debug!("dropping NewWave delivered after teardown");
        return;
    }
    if let Err(e) = state.push_event(event) {
        tracing::warn!(error = %e, "ignoring NewWave with invalid timestamp");
    }
}
