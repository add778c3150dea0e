//! # DualSense Link
//!
//! Opens a DualSense controller, logs what it does and keeps it connected.
//!
//! # Control Flow
//!
//! 1. **Initialization**
//!    - Load the configuration file given as the first argument (defaults
//!      otherwise)
//!    - Set up logging with tracing subscriber, plus an optional rolling file
//!    - Register event handlers on the controller components
//!
//! 2. **Supervisor Loop**
//!    - Try to open the controller every `reconnect_interval_ms` while it is
//!      closed, and resend the full output state after every reopen
//!    - Log battery status every `status_interval_s`
//!    - Handle Ctrl+C for graceful shutdown
//!
//! # Examples
//!
//! ```bash
//! RUST_LOG=dualsense_link=debug cargo run --release -- config/dualsense.toml
//! ```

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use anyhow::Result;
use tokio::time::{interval, Duration, MissedTickBehavior};
use tracing::{debug, info, warn};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

use dualsense_link::components::{MicLedState, PlayerLedArrangement};
use dualsense_link::config::{Config, LoggingConfig};
use dualsense_link::event::Scheduler;
use dualsense_link::transport::{enumerate, DeviceSelector};
use dualsense_link::{DualSense, SessionOptions, SessionState};

/// Player LED patterns cycled with the options button
const PLAYER_LED_CYCLE: [PlayerLedArrangement; 6] = [
    PlayerLedArrangement::Off,
    PlayerLedArrangement::Player1,
    PlayerLedArrangement::Player2,
    PlayerLedArrangement::Player3,
    PlayerLedArrangement::Player4,
    PlayerLedArrangement::All,
];

#[tokio::main]
async fn main() -> Result<()> {
    let config = match std::env::args().nth(1) {
        Some(path) => Config::load(&path)?,
        None => Config::default(),
    };

    let _log_guard = init_logging(&config.logging);

    info!("dualsense-link v{} starting...", env!("CARGO_PKG_VERSION"));

    let options = SessionOptions::from(&config);
    log_attached_controllers(&options.selector);

    let controller = Arc::new(DualSense::new(options));
    register_handlers(&controller);

    let mut reconnect_interval = interval(Duration::from_millis(config.supervisor.reconnect_interval_ms));
    reconnect_interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
    let mut status_interval = interval(Duration::from_secs(config.supervisor.status_interval_s));

    info!("Press Ctrl+C to exit");

    loop {
        tokio::select! {
            _ = reconnect_interval.tick() => {
                if controller.state() != SessionState::Closed {
                    continue;
                }

                // open() blocks until the first report exchange
                let session = Arc::clone(&controller);
                match tokio::task::spawn_blocking(move || session.open()).await {
                    Ok(Ok(())) => {
                        controller.force_update();
                        if let Some(device) = controller.device_info() {
                            info!("Controller {} ready", device.mac_address_string());
                        }
                    }
                    Ok(Err(e)) => debug!("Controller not available: {}", e),
                    Err(e) => warn!("Open task failed: {}", e),
                }
            }

            _ = status_interval.tick() => {
                if controller.is_connected() {
                    info!(
                        "Battery {}% ({}) over {}",
                        controller.battery_percent(),
                        controller.battery_state(),
                        controller.transport_mode()
                    );
                }
            }

            _ = tokio::signal::ctrl_c() => {
                info!("Received Ctrl+C, shutting down...");
                break;
            }
        }
    }

    let session = Arc::clone(&controller);
    tokio::task::spawn_blocking(move || session.close()).await?;
    Ok(())
}

fn log_attached_controllers(selector: &DeviceSelector) {
    match enumerate(selector) {
        Ok(controllers) if controllers.is_empty() => {
            info!("No controller matching {} attached yet", selector)
        }
        Ok(controllers) => {
            for controller in controllers {
                info!(
                    "Found controller at {} (serial {}, interface {})",
                    controller.path,
                    controller.serial_number.as_deref().unwrap_or("unknown"),
                    controller.interface_number
                );
            }
        }
        Err(e) => warn!("Controller discovery failed: {}", e),
    }
}

/// Console logging, plus a daily rolling file when a directory is configured.
///
/// The returned guard flushes the file writer on drop.
fn init_logging(config: &LoggingConfig) -> Option<WorkerGuard> {
    let filter = tracing_subscriber::EnvFilter::from_default_env()
        .add_directive(tracing::Level::INFO.into());
    let registry = tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer());

    match &config.directory {
        Some(directory) => {
            let appender = tracing_appender::rolling::daily(directory, &config.file_prefix);
            let (writer, guard) = tracing_appender::non_blocking(appender);
            registry
                .with(
                    tracing_subscriber::fmt::layer()
                        .with_writer(writer)
                        .with_ansi(false),
                )
                .init();
            Some(guard)
        }
        None => {
            registry.init();
            None
        }
    }
}

/// Demo wiring: log events and drive a few outputs from buttons.
fn register_handlers(controller: &DualSense) {
    let inputs = controller.inputs();
    let outputs = controller.outputs();

    controller.on_connection().register(|connected| {
        if connected {
            info!("Controller connected");
        } else {
            warn!("Controller disconnected");
        }
    });

    // Logging is slow enough to keep off the polling thread
    let runtime: Arc<dyn Scheduler> = Arc::new(tokio::runtime::Handle::current());
    for (name, button) in [
        ("cross", &inputs.cross),
        ("circle", &inputs.circle),
        ("square", &inputs.square),
        ("triangle", &inputs.triangle),
        ("ps", &inputs.ps),
    ] {
        button
            .on_press()
            .register_scheduled(Arc::clone(&runtime), move |_| info!("{} pressed", name));
    }

    inputs
        .dpad
        .on_direction()
        .register(|direction| debug!("D-pad: {:?}", direction));

    inputs.battery.on_state().register(|state| info!("Battery {}", state));

    // Mic button toggles mute, mic LED follows
    let mic_outputs = outputs.clone();
    inputs.mic_button.on_press().register(move |_| {
        let muted = mic_outputs.update(|o| {
            let muted = o.microphone.toggle_muted();
            o.mic_led.set_state(if muted {
                MicLedState::On
            } else {
                MicLedState::Off
            });
            muted
        });
        info!("Microphone {}", if muted { "muted" } else { "live" });
    });

    // Options cycles the player LEDs
    let led_outputs = outputs.clone();
    let led_index = AtomicUsize::new(0);
    inputs.options.on_press().register(move |_| {
        let index = led_index.fetch_add(1, Ordering::Relaxed) + 1;
        let arrangement = PLAYER_LED_CYCLE[index % PLAYER_LED_CYCLE.len()];
        led_outputs.update(|o| o.player_led.set_arrangement(arrangement));
    });

    // Touchpad click replays the blue fade
    let bar_outputs = outputs.clone();
    inputs.touchpad.button.on_press().register(move |_| {
        bar_outputs.update(|o| o.touchpad_led.fade_to_blue());
    });

    // Analog triggers drive the rumble motors
    let rumble_outputs = outputs.clone();
    inputs.left_trigger.on_change().register(move |value| {
        rumble_outputs.update(|o| o.left_rumble.set_intensity(value));
    });
    inputs.right_trigger.on_change().register(move |value| {
        outputs.update(|o| o.right_rumble.set_intensity(value));
    });
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_player_led_cycle_starts_off_and_ends_all() {
        assert_eq!(PLAYER_LED_CYCLE[0], PlayerLedArrangement::Off);
        assert_eq!(PLAYER_LED_CYCLE[PLAYER_LED_CYCLE.len() - 1], PlayerLedArrangement::All);
    }

    #[tokio::test]
    async fn test_handlers_register_on_every_control() {
        let controller = DualSense::new(SessionOptions::default());
        register_handlers(&controller);

        let inputs = controller.inputs();
        assert_eq!(controller.on_connection().len(), 1);
        assert_eq!(inputs.cross.on_press().len(), 1);
        assert_eq!(inputs.mic_button.on_press().len(), 1);
        assert_eq!(inputs.options.on_press().len(), 1);
        assert_eq!(inputs.right_trigger.on_change().len(), 1);
    }
}
