//! Bridge between the egui shell and the wave client.
//! Every client call that touches a port runs on its own thread.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;

use eframe::egui;

use wave_portal_adapters::{Eip1193Adapter, WavePortalAdapter, WavePortalConfig};
use wave_portal_core::{ClientError, Notice, WaveClient, WaveView};

type PortalClient = WaveClient<Eip1193Adapter, WavePortalAdapter>;

#[derive(Clone)]
pub struct WaveBridge {
    client: Arc<PortalClient>,
    explorer_tx_base_url: String,
    /// Set while a connect request is waiting on the wallet.
    connecting: Arc<AtomicBool>,
}

impl WaveBridge {
    pub fn new(config: &WavePortalConfig) -> Self {
        let client = WaveClient::new(
            Eip1193Adapter::with_config(config),
            WavePortalAdapter::with_config(config),
        )
        .with_gas_limit(config.gas_limit);
        Self {
            client: Arc::new(client),
            explorer_tx_base_url: config.explorer_tx_base_url.clone(),
            connecting: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Starts listening for new waves and picks up an already authorized
    /// account.
    pub fn spawn_startup(&self, ctx: &egui::Context) {
        self.spawn("startup", ctx, |client| {
            if let Err(e) = client.mount() {
                tracing::warn!(error = %e, "live waves unavailable");
            }
            client.check_connection().map(|_| ())
        });
    }

    pub fn spawn_connect(&self, ctx: &egui::Context) {
        if self.connecting.swap(true, Ordering::SeqCst) {
            return;
        }
        let connecting = Arc::clone(&self.connecting);
        self.spawn("connect", ctx, move |client| {
            let result = client.connect().map(|_| ());
            connecting.store(false, Ordering::SeqCst);
            result
        });
    }

    pub fn spawn_submit(&self, ctx: &egui::Context, message: String) {
        self.spawn("submit", ctx, move |client| {
            client.submit_wave(&message).map(|_| ())
        });
    }

    pub fn is_connecting(&self) -> bool {
        self.connecting.load(Ordering::SeqCst)
    }

    pub fn view(&self) -> Result<WaveView, ClientError> {
        self.client.view(&self.explorer_tx_base_url)
    }

    pub fn set_pending_message(&self, text: &str) {
        if let Err(e) = self.client.set_pending_message(text) {
            tracing::error!(error = %e, "failed to record pending message");
        }
    }

    pub fn take_alert(&self) -> Option<Notice> {
        self.client.take_alert().unwrap_or_else(|e| {
            tracing::error!(error = %e, "failed to read alert");
            None
        })
    }

    pub fn teardown(&self) {
        if let Err(e) = self.client.teardown() {
            tracing::warn!(error = %e, "teardown failed");
        }
    }

    fn spawn<F>(&self, task: &'static str, ctx: &egui::Context, job: F)
    where
        F: FnOnce(&PortalClient) -> Result<(), ClientError> + Send + 'static,
    {
        let client = Arc::clone(&self.client);
        let ctx = ctx.clone();
        let spawned = thread::Builder::new()
            .name(format!("wave-portal-{task}"))
            .spawn(move || {
                if let Err(e) = job(&client) {
                    // User-facing failures already raised a notice.
                    tracing::debug!(task, error = %e, "task finished with error");
                }
                ctx.request_repaint();
            });
        if let Err(e) = spawned {
            tracing::error!(task, error = %e, "failed to spawn worker thread");
        }
    }
}
