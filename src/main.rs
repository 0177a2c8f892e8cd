//! # Ally Gamepad
//!
//! Pushes a configuration profile to the ROG Ally gamepad MCU.
//!
//! ```bash
//! ally-gamepad config/default.toml
//! RUST_LOG=debug ally-gamepad
//! ```
//!
//! Without an argument the built-in defaults are used. With `dry_run` set,
//! every report is printed as a JSON line on stdout and acknowledged locally.

use anyhow::{Context, Result};
use tracing::info;

use ally_gamepad::config::{Config, ProfileConfig};
use ally_gamepad::device::Device;
use ally_gamepad::transport::hidraw::HidrawTransport;
use ally_gamepad::transport::{FrameLogTransport, Transport};

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .with_writer(std::io::stderr)
        .init();

    info!("Ally gamepad v{} starting...", env!("CARGO_PKG_VERSION"));

    let config = match std::env::args().nth(1) {
        Some(path) => Config::load(&path).with_context(|| format!("loading {}", path))?,
        None => Config::default(),
    };
    let timeout = config.transport.response_timeout();

    if config.transport.dry_run {
        info!("Dry run: reports are logged to stdout");
        let device = Device::new("dry-run", FrameLogTransport::new(std::io::stdout()), timeout);
        push_profile(&device, &config.profile).await?;
        let frames = device.into_transport().frames_logged();
        info!("Logged {} reports", frames);
    } else {
        let paths: Vec<&str> = config
            .transport
            .device_paths
            .iter()
            .map(String::as_str)
            .collect();
        let transport = HidrawTransport::open_with_paths(&paths)?;
        let name = transport.device_path().to_string();
        info!("Gamepad opened at: {}", name);
        let device = Device::new(name, transport, timeout);
        push_profile(&device, &config.profile).await?;
    }

    Ok(())
}

/// Seeds the device with the profile and pushes it in one pass.
async fn push_profile<T: Transport>(device: &Device<T>, profile: &ProfileConfig) -> Result<()> {
    device
        .initialize_profile(profile)
        .await
        .with_context(|| format!("{}: initialization failed", device.name()))?;

    info!(
        "{}: profile applied in {} mode ({} commands acknowledged)",
        device.name(),
        profile.mode.name(),
        device.commands_acked().await
    );
    Ok(())
}
