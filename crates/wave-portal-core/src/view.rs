//! Presentation state derived from [`ClientState`].

use crate::client::ClientState;
use crate::domain::{Notice, Wave};

pub const EMPTY_WAVES_NOTICE: &str = "It's so lonely here! Nobody has waved yet. :(";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WaveView {
    /// Shows the "Connect Wallet" button instead of the wave form.
    pub show_connect: bool,
    pub submit_enabled: bool,
    pub submit_label: &'static str,
    pub pending_message: String,
    /// `None` while the count is unknown.
    pub wave_count_text: Option<String>,
    pub tx_link: Option<String>,
    pub empty_notice: Option<&'static str>,
    pub waves: Vec<Wave>,
    pub alert: Option<Notice>,
}

pub fn derive_view(state: &ClientState, explorer_tx_base_url: &str) -> WaveView {
    let mining = state.is_mining();
    WaveView {
        show_connect: state.account.is_none(),
        submit_enabled: state.account.is_some() && !mining,
        submit_label: if mining {
            "Wave in progress"
        } else {
            "Wave at Me"
        },
        pending_message: state.pending_message.clone(),
        wave_count_text: state.wave_count.map(|n| n.to_string()),
        tx_link: state
            .last_tx
            .map(|hash| format!("{}{}", explorer_tx_base_url, hash)),
        empty_notice: state.waves.is_empty().then_some(EMPTY_WAVES_NOTICE),
        waves: state.waves.clone(),
        alert: state.alert.clone(),
    }
}
