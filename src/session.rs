//! # Controller Session
//!
//! Owns one physical controller: the open/poll/close lifecycle, the polling
//! thread and all component state.
//!
//! ```text
//! Closed → Opening → Polling → Closing → Closed
//!                       └──── I/O error ───┘
//! ```
//!
//! Every polling iteration reads one input report (bounded by the read
//! timeout), decodes it into the input components, then always encodes and
//! writes one output report from the dirty output state. Components persist
//! across reconnects; call [`DualSense::force_update`] after reopening to push
//! the full output state again.
//!
//! ## Usage
//!
//! ```no_run
//! use dualsense_link::session::{DualSense, SessionOptions};
//!
//! let controller = DualSense::new(SessionOptions::default());
//! controller.inputs().cross.on_press().register(|_| println!("cross"));
//! controller.open()?;
//! controller.with_outputs(|outputs| outputs.touchpad_led.set_color(0, 0, 255));
//! # Ok::<(), dualsense_link::error::DualSenseError>(())
//! ```

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::{self, RecvTimeoutError, SyncSender};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;

use parking_lot::Mutex;
use tracing::{debug, error, info, trace, warn};

use crate::components::{BatteryState, Inputs, Outputs};
use crate::config::Config;
use crate::error::{DualSenseError, Result};
use crate::event::Callback;
use crate::report::crc::verify_input_checksum;
use crate::report::protocol::{
    FeatureReport, TransportMode, FEATURE_REPORT_CALIBRATION, FEATURE_REPORT_FIRMWARE,
    FEATURE_REPORT_PAIRING,
};
use crate::report::{decode, encode_output_report};
use crate::transport::{DeviceSelector, HidTransport, HidapiTransport};

/// Large enough to notice reports longer than either transport expects
const READ_BUFFER_LENGTH: usize = 128;

/// Lifecycle state of a [`DualSense`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum SessionState {
    #[default]
    Closed,
    Opening,
    Polling,
    Closing,
}

/// Identity read from the feature reports while opening
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct DeviceInfo {
    /// Bytes as sent by the controller (least significant first)
    pub mac_address: [u8; 6],
    pub hardware_version: u32,
    pub firmware_version: u32,
    /// Raw IMU calibration report
    pub calibration: Vec<u8>,
}

impl DeviceInfo {
    fn from_feature_reports(calibration: Vec<u8>, pairing: &[u8], firmware: &[u8]) -> Self {
        let mut mac_address = [0u8; 6];
        mac_address.copy_from_slice(&pairing[1..7]);
        Self {
            mac_address,
            hardware_version: read_u32_le(firmware, 24),
            firmware_version: read_u32_le(firmware, 28),
            calibration,
        }
    }

    /// MAC address in the usual `AA:BB:CC:DD:EE:FF` notation
    pub fn mac_address_string(&self) -> String {
        self.mac_address
            .iter()
            .rev()
            .map(|b| format!("{:02X}", b))
            .collect::<Vec<_>>()
            .join(":")
    }
}

fn read_u32_le(data: &[u8], offset: usize) -> u32 {
    let mut bytes = [0u8; 4];
    bytes.copy_from_slice(&data[offset..offset + 4]);
    u32::from_le_bytes(bytes)
}

/// How a session finds and drives its controller
#[derive(Debug, Clone)]
pub struct SessionOptions {
    pub selector: DeviceSelector,
    /// Treat the device as Bluetooth regardless of its interface number
    pub force_bluetooth: bool,
    /// Upper bound on one blocking read, and so on shutdown latency
    pub read_timeout: Duration,
    /// Make `open()` wait for the first read/write exchange
    pub hold_on_open: bool,
    pub hold_timeout: Duration,
}

impl Default for SessionOptions {
    fn default() -> Self {
        Self {
            selector: DeviceSelector::default(),
            force_bluetooth: false,
            read_timeout: Duration::from_millis(1000),
            hold_on_open: true,
            hold_timeout: Duration::from_millis(5000),
        }
    }
}

impl From<&Config> for SessionOptions {
    fn from(config: &Config) -> Self {
        Self {
            selector: DeviceSelector {
                serial_number: config.device.serial_number.clone(),
                path: config.device.path.clone(),
            },
            force_bluetooth: config.device.force_bluetooth,
            read_timeout: Duration::from_millis(config.session.read_timeout_ms),
            hold_on_open: config.session.hold_on_open,
            hold_timeout: Duration::from_millis(config.session.hold_timeout_ms),
        }
    }
}

/// Cloneable access to the output state, for use inside callbacks
#[derive(Debug, Clone)]
pub struct OutputHandle {
    outputs: Arc<Mutex<Outputs>>,
}

impl OutputHandle {
    /// Run `f` with the output lock held. Keep it short: the polling thread
    /// takes the same lock once per iteration.
    pub fn update<R>(&self, f: impl FnOnce(&mut Outputs) -> R) -> R {
        f(&mut self.outputs.lock())
    }
}

/// State shared between the session handle and its polling thread
#[derive(Debug)]
struct Shared {
    state: Mutex<SessionState>,
    running: AtomicBool,
    connected: AtomicBool,
    mode: Mutex<TransportMode>,
    device_info: Mutex<Option<DeviceInfo>>,
    inputs: Inputs,
    outputs: Arc<Mutex<Outputs>>,
    on_connection: Callback<bool>,
    on_update: Callback<()>,
}

/// One DualSense controller
#[derive(Debug)]
pub struct DualSense {
    shared: Arc<Shared>,
    options: SessionOptions,
    poller: Mutex<Option<JoinHandle<()>>>,
}

impl DualSense {
    /// Create a closed session. Components exist from here on and keep their
    /// state across reconnects.
    pub fn new(options: SessionOptions) -> Self {
        Self {
            shared: Arc::new(Shared {
                state: Mutex::new(SessionState::Closed),
                running: AtomicBool::new(false),
                connected: AtomicBool::new(false),
                mode: Mutex::new(TransportMode::default()),
                device_info: Mutex::new(None),
                inputs: Inputs::new(),
                outputs: Arc::new(Mutex::new(Outputs::new())),
                on_connection: Callback::new(),
                on_update: Callback::new(),
            }),
            options,
            poller: Mutex::new(None),
        }
    }

    /// Input components: state accessors and event registration
    pub fn inputs(&self) -> &Inputs {
        &self.shared.inputs
    }

    /// Run `f` with the output state locked
    pub fn with_outputs<R>(&self, f: impl FnOnce(&mut Outputs) -> R) -> R {
        f(&mut self.shared.outputs.lock())
    }

    /// Handle to the output state that can be moved into callbacks
    pub fn outputs(&self) -> OutputHandle {
        OutputHandle {
            outputs: Arc::clone(&self.shared.outputs),
        }
    }

    /// Fired with `true` after the first polling iteration and with `false`
    /// when a connected session closes.
    pub fn on_connection(&self) -> &Callback<bool> {
        &self.shared.on_connection
    }

    /// Fired after every polling iteration.
    pub fn on_update(&self) -> &Callback<()> {
        &self.shared.on_update
    }

    pub fn state(&self) -> SessionState {
        *self.shared.state.lock()
    }

    /// Whether the polling thread is running
    pub fn is_open(&self) -> bool {
        self.state() == SessionState::Polling
    }

    /// Whether at least one read/write iteration has completed since opening
    pub fn is_connected(&self) -> bool {
        self.shared.connected.load(Ordering::Acquire)
    }

    /// Transport of the current (or last) connection
    pub fn transport_mode(&self) -> TransportMode {
        *self.shared.mode.lock()
    }

    /// Identity of the current (or last) connection
    pub fn device_info(&self) -> Option<DeviceInfo> {
        self.shared.device_info.lock().clone()
    }

    pub fn battery_percent(&self) -> u8 {
        self.shared.inputs.battery.percent()
    }

    pub fn battery_state(&self) -> BatteryState {
        self.shared.inputs.battery.state()
    }

    /// Discover the controller described by the session options and open it
    ///
    /// # Errors
    ///
    /// Returns error if the session is already open, no controller matches,
    /// the device cannot be opened or its feature reports cannot be read
    pub fn open(&self) -> Result<()> {
        if self.state() != SessionState::Closed {
            return Err(DualSenseError::AlreadyOpen);
        }
        let transport = HidapiTransport::open(&self.options.selector)?;
        self.open_with(Box::new(transport))
    }

    /// Open using an already-resolved transport
    ///
    /// Reads the feature reports, detects the transport mode and starts the
    /// polling thread. With `hold_on_open` set, blocks until the first
    /// read/write exchange completes or `hold_timeout` elapses.
    ///
    /// # Errors
    ///
    /// Returns error if the session is already open, setup fails (the
    /// transport is closed first) or the polling thread stops before its
    /// first exchange
    pub fn open_with(&self, transport: Box<dyn HidTransport>) -> Result<()> {
        {
            let mut state = self.shared.state.lock();
            if *state != SessionState::Closed {
                return Err(DualSenseError::AlreadyOpen);
            }
            *state = SessionState::Opening;
        }
        self.reap_poller();

        let mut transport = transport;
        let (mode, device_info) = match identify(transport.as_mut(), self.options.force_bluetooth) {
            Ok(identity) => identity,
            Err(e) => {
                info!(
                    "Closing controller at {} after failed setup",
                    transport.info().path
                );
                drop(transport);
                *self.shared.state.lock() = SessionState::Closed;
                return Err(e);
            }
        };

        info!(
            "Controller {} connected over {} (firmware 0x{:08X}, hardware 0x{:08X})",
            device_info.mac_address_string(),
            mode,
            device_info.firmware_version,
            device_info.hardware_version
        );
        *self.shared.mode.lock() = mode;
        *self.shared.device_info.lock() = Some(device_info);

        {
            let mut state = self.shared.state.lock();
            if *state == SessionState::Closing {
                *state = SessionState::Closed;
                drop(state);
                info!(
                    "Close requested while opening, closing controller at {}",
                    transport.info().path
                );
                drop(transport);
                return Err(DualSenseError::Io(std::io::Error::new(
                    std::io::ErrorKind::ConnectionAborted,
                    "controller closed while opening",
                )));
            }
            self.shared.running.store(true, Ordering::Release);
            *state = SessionState::Polling;
        }

        let (ready_tx, ready_rx) = mpsc::sync_channel(1);
        let shared = Arc::clone(&self.shared);
        let read_timeout_ms = i32::try_from(self.options.read_timeout.as_millis()).unwrap_or(i32::MAX);

        let spawned = thread::Builder::new()
            .name("dualsense-poll".to_string())
            .spawn(move || poll_loop(shared, transport, mode, read_timeout_ms, ready_tx));

        match spawned {
            Ok(handle) => *self.poller.lock() = Some(handle),
            Err(e) => {
                self.shared.running.store(false, Ordering::Release);
                *self.shared.state.lock() = SessionState::Closed;
                return Err(e.into());
            }
        }

        if !self.options.hold_on_open {
            return Ok(());
        }

        match ready_rx.recv_timeout(self.options.hold_timeout) {
            Ok(()) => Ok(()),
            Err(RecvTimeoutError::Timeout) => {
                warn!(
                    "No report exchange within {:?}, continuing in the background",
                    self.options.hold_timeout
                );
                Ok(())
            }
            Err(RecvTimeoutError::Disconnected) => Err(DualSenseError::Io(std::io::Error::new(
                std::io::ErrorKind::ConnectionAborted,
                "controller closed before the first report exchange",
            ))),
        }
    }

    /// Stop polling and close the device
    ///
    /// Returns once the polling thread has finished (at most one read timeout
    /// later). Called while another thread is opening, the open fails instead
    /// of starting to poll. Safe to call from a callback running on the polling thread, in
    /// which case the thread finishes on its own after the current iteration.
    pub fn close(&self) {
        {
            // A close during Opening is picked up by open_with before polling starts
            let mut state = self.shared.state.lock();
            if matches!(*state, SessionState::Opening | SessionState::Polling) {
                *state = SessionState::Closing;
            }
        }
        self.shared.running.store(false, Ordering::Release);
        self.reap_poller();
    }

    /// Mark every output dirty so the next report resends the full state.
    pub fn force_update(&self) {
        self.shared.outputs.lock().force_update();
    }

    fn reap_poller(&self) {
        let handle = self.poller.lock().take();
        if let Some(handle) = handle {
            if handle.thread().id() == thread::current().id() {
                return;
            }
            if handle.join().is_err() {
                error!("Polling thread panicked");
            }
        }
    }
}

impl Drop for DualSense {
    fn drop(&mut self) {
        self.close();
    }
}

/// Read the feature reports and work out the transport mode.
fn identify(
    transport: &mut dyn HidTransport,
    force_bluetooth: bool,
) -> Result<(TransportMode, DeviceInfo)> {
    let calibration = read_feature_report(transport, FEATURE_REPORT_CALIBRATION)?;
    let pairing = read_feature_report(transport, FEATURE_REPORT_PAIRING)?;
    let firmware = read_feature_report(transport, FEATURE_REPORT_FIRMWARE)?;

    let mode = TransportMode::detect(transport.info().interface_number, force_bluetooth);
    Ok((
        mode,
        DeviceInfo::from_feature_reports(calibration, &pairing, &firmware),
    ))
}

fn read_feature_report(transport: &mut dyn HidTransport, report: FeatureReport) -> Result<Vec<u8>> {
    let bytes = transport.get_feature_report(report)?;
    if bytes.len() < report.length {
        return Err(DualSenseError::FeatureReport {
            id: report.id,
            expected: report.length,
            actual: bytes.len(),
        });
    }
    debug!("Feature report 0x{:02X}: {} bytes", report.id, bytes.len());
    Ok(bytes)
}

fn poll_loop(
    shared: Arc<Shared>,
    mut transport: Box<dyn HidTransport>,
    mode: TransportMode,
    read_timeout_ms: i32,
    ready: SyncSender<()>,
) {
    let mut buf = [0u8; READ_BUFFER_LENGTH];
    let mut ready = Some(ready);

    let result = loop {
        if !shared.running.load(Ordering::Acquire) {
            break Ok(());
        }

        match transport.read_timeout(&mut buf, read_timeout_ms) {
            Ok(0) => debug!("No input report within {}ms", read_timeout_ms),
            Ok(n) => {
                if mode == TransportMode::Bluetooth && !verify_input_checksum(&buf[..n]) {
                    trace!("Input report checksum mismatch (not enforced)");
                }
                if let Err(e) = decode(&buf[..n], mode, &shared.inputs) {
                    warn!("Discarding input report: {}", e);
                }
            }
            Err(e) => break Err(e),
        }

        if !shared.connected.swap(true, Ordering::AcqRel) {
            shared.on_connection.fire(true);
        }

        let report = {
            let mut outputs = shared.outputs.lock();
            encode_output_report(&mut outputs, mode)
        };
        if let Err(e) = transport.write(&report) {
            break Err(e);
        }

        if let Some(ready) = ready.take() {
            // Nobody is waiting when the caller did not hold
            let _ = ready.try_send(());
        }

        shared.on_update.fire(());
    };

    if let Err(e) = result {
        error!("Controller I/O failed, closing: {}", e);
    }

    info!("Closing controller at {}", transport.info().path);
    drop(transport);

    shared.running.store(false, Ordering::Release);
    let was_connected = shared.connected.swap(false, Ordering::AcqRel);
    *shared.state.lock() = SessionState::Closed;
    if was_connected {
        shared.on_connection.fire(false);
    }
}
