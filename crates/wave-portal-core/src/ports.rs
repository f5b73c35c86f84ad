use std::sync::Arc;

use alloy::primitives::{Address, B256, U256};
use thiserror::Error;

use crate::domain::{NewWaveEvent, WaveRecord};

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PortError {
    #[error("port not implemented: {0}")]
    NotImplemented(&'static str),
    #[error("wallet provider unavailable: {0}")]
    ProviderUnavailable(String),
    #[error("request rejected: {0}")]
    Rejected(String),
    #[error("transaction reverted: {0}")]
    Reverted(B256),
    #[error("transport error: {0}")]
    Transport(String),
    #[error("validation error: {0}")]
    Validation(String),
}

/// Callback for live `NewWave` events.
pub type NewWaveHandler = Arc<dyn Fn(NewWaveEvent) + Send + Sync>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SubscriptionId(pub u64);

/// Browser-style (EIP-1193) wallet.
pub trait WalletProviderPort {
    /// `eth_accounts`: accounts already authorized for this client.
    fn authorized_accounts(&self) -> Result<Vec<Address>, PortError>;
    /// `eth_requestAccounts`: prompts the user for authorization.
    fn request_accounts(&self) -> Result<Vec<Address>, PortError>;
}

/// The deployed WavePortal contract.
///
/// Writes are signed by the wallet behind the gateway; the client only
/// supplies the sender.
pub trait ContractGatewayPort {
    fn total_waves(&self) -> Result<U256, PortError>;
    fn all_waves(&self) -> Result<Vec<WaveRecord>, PortError>;
    fn send_wave(&self, from: Address, message: &str, gas_limit: u64) -> Result<B256, PortError>;
    /// Blocks until the transaction is mined. No timeout.
    fn await_confirmation(&self, tx_hash: B256) -> Result<(), PortError>;
    fn subscribe_new_wave(&self, handler: NewWaveHandler) -> Result<SubscriptionId, PortError>;
    /// Once this returns the handler is never invoked again.
    fn unsubscribe(&self, id: SubscriptionId) -> Result<(), PortError>;
}
