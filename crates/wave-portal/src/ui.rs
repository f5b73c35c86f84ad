//! UI helper components

use eframe::egui;

use wave_portal_core::Wave;

const ACCENT: egui::Color32 = egui::Color32::from_rgb(0, 212, 170);

/// Open URL in the default browser
pub fn open_url_new_tab(url: &str) {
    if let Err(e) = open::that(url) {
        tracing::warn!(url, error = %e, "failed to open browser");
    }
}

pub fn copy_to_clipboard(text: &str) {
    if let Ok(mut clipboard) = arboard::Clipboard::new() {
        let _ = clipboard.set_text(text);
    }
}

/// Styled heading with accent color
pub fn styled_heading(ui: &mut egui::Ui, text: &str) {
    ui.heading(egui::RichText::new(text).size(26.0).color(ACCENT));
}

/// Link that opens in the browser, with a copy button next to it
pub fn link_with_copy(ui: &mut egui::Ui, label: &str, url: &str) {
    ui.horizontal(|ui| {
        if ui.link(label).on_hover_text(url).clicked() {
            open_url_new_tab(url);
        }
        if ui
            .small_button("📋")
            .on_hover_text("Copy to clipboard")
            .clicked()
        {
            copy_to_clipboard(url);
        }
    });
}

/// One entry of the wave list: sender, local time, message.
pub fn wave_card(ui: &mut egui::Ui, wave: &Wave) {
    egui::Frame::group(ui.style())
        .fill(ui.visuals().faint_bg_color)
        .inner_margin(egui::Margin::same(8.0))
        .show(ui, |ui| {
            ui.set_width(ui.available_width());
            ui.horizontal(|ui| {
                ui.label(egui::RichText::new("Address:").strong());
                ui.label(egui::RichText::new(wave.address.to_string()).monospace());
            });
            ui.horizontal(|ui| {
                ui.label(egui::RichText::new("Time:").strong());
                ui.label(local_time(wave));
            });
            ui.horizontal_wrapped(|ui| {
                ui.label(egui::RichText::new("Message:").strong());
                ui.label(wave.message.as_str());
            });
        });
}

fn local_time(wave: &Wave) -> String {
    wave.timestamp
        .with_timezone(&chrono::Local)
        .format("%a %b %e %Y %H:%M:%S")
        .to_string()
}
