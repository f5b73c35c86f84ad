pub mod config;
pub mod contract;
pub mod eip1193;
pub mod rpc;

pub use config::{ConfigError, WavePortalConfig};
pub use contract::WavePortalAdapter;
pub use eip1193::Eip1193Adapter;
pub use rpc::JsonRpcTransport;
