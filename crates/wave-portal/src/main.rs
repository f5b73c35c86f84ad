//! WavePortal: wave at the contract, watch everyone else wave back.

use eframe::egui;
use eyre::WrapErr;

use wave_portal_adapters::WavePortalConfig;

mod app;
mod bridge;
mod ui;

fn main() -> eyre::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .init();

    let config = WavePortalConfig::from_env();
    config
        .validate()
        .wrap_err("invalid WAVE_PORTAL_* configuration")?;

    tracing::info!(
        git = env!("GIT_HASH"),
        built = env!("BUILD_TIME"),
        contract = %config.contract_address,
        demo = config.demo_mode,
        "Starting WavePortal"
    );

    let native_options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_title("WavePortal")
            .with_inner_size([640.0, 720.0])
            .with_min_inner_size([420.0, 400.0]),
        ..Default::default()
    };

    eframe::run_native(
        "WavePortal",
        native_options,
        Box::new(move |cc| Ok(Box::new(app::App::new(cc, config)))),
    )
    .map_err(|e| eyre::eyre!("eframe failed: {e}"))
}
