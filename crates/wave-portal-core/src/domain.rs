use alloy::primitives::{Address, U256};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Gas ceiling attached to every `wave` transaction.
pub const WAVE_GAS_LIMIT: u64 = 300_000;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum DomainError {
    #[error("timestamp out of range: {0}")]
    TimestampOutOfRange(U256),
}

/// A wave as rendered by the client.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Wave {
    pub address: Address,
    pub timestamp: DateTime<Utc>,
    pub message: String,
}

/// Raw `Wave` struct as returned by `getAllWaves()`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WaveRecord {
    pub waver: Address,
    pub timestamp: U256,
    pub message: String,
}

/// Decoded `NewWave(from, timestamp, message)` log.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewWaveEvent {
    pub from: Address,
    pub timestamp: U256,
    pub message: String,
}

/// User-facing prompts raised by client operations.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Notice {
    WalletMissing,
    EmptyMessage,
    SubmissionFailed(String),
}

impl Notice {
    pub fn message(&self) -> String {
        match self {
            Notice::WalletMissing => {
                "A wallet extension is required. Get MetaMask!".to_string()
            }
            Notice::EmptyMessage => "Please wave with a message!".to_string(),
            Notice::SubmissionFailed(reason) => format!("Wave failed: {}", reason),
        }
    }
}

/// Converts a contract timestamp (unix seconds) into a UTC instant.
pub fn wave_timestamp(seconds: U256) -> Result<DateTime<Utc>, DomainError> {
    let secs = u64::try_from(seconds)
        .ok()
        .and_then(|s| i64::try_from(s).ok())
        .ok_or(DomainError::TimestampOutOfRange(seconds))?;
    DateTime::<Utc>::from_timestamp(secs, 0).ok_or(DomainError::TimestampOutOfRange(seconds))
}

impl Wave {
    pub fn from_record(record: WaveRecord) -> Result<Self, DomainError> {
        Ok(Self {
            address: record.waver,
            timestamp: wave_timestamp(record.timestamp)?,
            message: record.message,
        })
    }

    pub fn from_event(event: NewWaveEvent) -> Result<Self, DomainError> {
        Ok(Self {
            address: event.from,
            timestamp: wave_timestamp(event.timestamp)?,
            message: event.message,
        })
    }
}
