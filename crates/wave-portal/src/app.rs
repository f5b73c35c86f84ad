//! Main application state and update loop

use std::time::Duration;

use eframe::egui;

use wave_portal_adapters::WavePortalConfig;
use wave_portal_core::{Notice, WaveView};

use crate::bridge::WaveBridge;
use crate::ui;

/// Live waves arrive on a background thread; poll at least this often.
const REFRESH_INTERVAL: Duration = Duration::from_secs(1);

pub struct App {
    bridge: WaveBridge,
    /// Notice currently shown in the modal, if any
    alert: Option<Notice>,
}

impl App {
    pub fn new(cc: &eframe::CreationContext<'_>, config: WavePortalConfig) -> Self {
        let bridge = WaveBridge::new(&config);
        bridge.spawn_startup(&cc.egui_ctx);
        Self {
            bridge,
            alert: None,
        }
    }
}

impl eframe::App for App {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        ctx.set_visuals(egui::Visuals::dark());

        if self.alert.is_none() {
            self.alert = self.bridge.take_alert();
        }

        let view = match self.bridge.view() {
            Ok(view) => view,
            Err(e) => {
                tracing::error!(error = %e, "cannot read client state");
                return;
            }
        };

        egui::CentralPanel::default().show(ctx, |ui| {
            egui::ScrollArea::vertical().show(ui, |ui| {
                ui.vertical_centered(|ui| {
                    ui.add_space(20.0);
                    self.render_header(ui);
                    ui.add_space(15.0);
                    self.render_controls(ui, ctx, &view);
                });
                ui.add_space(15.0);
                self.render_waves(ui, &view);
                ui.add_space(20.0);
            });
        });

        self.render_alert(ctx);
        ctx.request_repaint_after(REFRESH_INTERVAL);
    }

    fn on_exit(&mut self, _gl: Option<&eframe::glow::Context>) {
        self.bridge.teardown();
    }
}

impl App {
    fn render_header(&self, ui: &mut egui::Ui) {
        ui::styled_heading(ui, "👋 Hey there!");
        ui.add_space(8.0);
        ui.label(
            "I am a Rust dev learning web3. Connect your Ethereum wallet and wave at me!",
        );
    }

    fn render_controls(&self, ui: &mut egui::Ui, ctx: &egui::Context, view: &WaveView) {
        if view.show_connect {
            let connecting = self.bridge.is_connecting();
            let label = if connecting {
                "Waiting for wallet..."
            } else {
                "Connect Wallet"
            };
            if ui
                .add_enabled(!connecting, egui::Button::new(label))
                .clicked()
            {
                self.bridge.spawn_connect(ctx);
            }
            return;
        }

        let mut message = view.pending_message.clone();
        let response = ui.add(
            egui::TextEdit::singleline(&mut message)
                .hint_text("Leave a message")
                .desired_width(360.0),
        );
        if response.changed() {
            self.bridge.set_pending_message(&message);
        }

        ui.add_space(8.0);
        ui.horizontal(|ui| {
            let button = egui::Button::new(view.submit_label);
            if ui.add_enabled(view.submit_enabled, button).clicked() {
                self.bridge.spawn_submit(ctx, message.clone());
            }
            if !view.submit_enabled {
                ui.spinner();
            }
        });

        if let Some(count) = &view.wave_count_text {
            ui.add_space(8.0);
            ui.label(egui::RichText::new(format!("Total Wave Count: {count}")).strong());
        }
        if let Some(link) = &view.tx_link {
            ui::link_with_copy(ui, "See Transaction Status", link);
        }
    }

    fn render_waves(&self, ui: &mut egui::Ui, view: &WaveView) {
        if let Some(notice) = view.empty_notice {
            ui.vertical_centered(|ui| {
                ui.label(egui::RichText::new(notice).italics().weak());
            });
            return;
        }
        for wave in &view.waves {
            ui::wave_card(ui, wave);
            ui.add_space(6.0);
        }
    }

    fn render_alert(&mut self, ctx: &egui::Context) {
        let Some(notice) = &self.alert else {
            return;
        };
        let text = notice.message();
        let mut dismissed = false;
        egui::Window::new("Notice")
            .collapsible(false)
            .resizable(false)
            .anchor(egui::Align2::CENTER_CENTER, [0.0, 0.0])
            .show(ctx, |ui| {
                ui.label(text);
                ui.add_space(8.0);
                if ui.button("OK").clicked() {
                    dismissed = true;
                }
            });
        if dismissed {
            self.alert = None;
        }
    }
}
