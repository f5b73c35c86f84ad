pub mod client;
pub mod domain;
pub mod ports;
pub mod state_machine;
pub mod view;

pub use client::{ClientError, ClientState, WaveClient};
pub use domain::{
    wave_timestamp, DomainError, NewWaveEvent, Notice, Wave, WaveRecord, WAVE_GAS_LIMIT,
};
pub use ports::{
    ContractGatewayPort, NewWaveHandler, PortError, SubscriptionId, WalletProviderPort,
};
pub use state_machine::{session_transition, SessionAction, SessionState, StateTransition};
pub use view::{derive_view, WaveView, EMPTY_WAVES_NOTICE};
