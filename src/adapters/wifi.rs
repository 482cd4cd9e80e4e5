//! WiFi station-mode adapter.
//!
//! Implements [`ConnectivityPort`], the hexagonal boundary for network
//! connectivity.
//!
//! ## cfg gating
//!
//! - **`target_os = "espidf"`**: real ESP-IDF WiFi driver calls via `esp_idf_svc::wifi`.
//! - **all other targets**: an in-memory link with injectable failures.
//!
//! ## Reconnection policy
//!
//! On disconnect the adapter waits an exponential backoff (2 s → 4 s →
//! 8 s … capped at 60 s) before retrying.  Retries only happen from
//! [`poll`](ConnectivityPort::poll), which the control loop calls once per
//! cycle.

use std::time::{Duration, Instant};

use embedded_hal::delay::DelayNs;
use log::{error, info, warn};

#[cfg(target_os = "espidf")]
use esp_idf_svc::wifi::{AuthMethod, BlockingWifi, ClientConfiguration, Configuration, EspWifi};

use crate::app::ports::ConnectivityPort;
use crate::error::ConnectivityError;

// ───────────────────────────────────────────────────────────────
// Connection state
// ───────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WifiState {
    Disconnected,
    Connecting,
    Connected,
    Reconnecting { attempt: u32 },
}

const INITIAL_BACKOFF: Duration = Duration::from_secs(2);
const MAX_BACKOFF: Duration = Duration::from_secs(60);

// ───────────────────────────────────────────────────────────────
// Validation
// ───────────────────────────────────────────────────────────────

/// 1-32 bytes, each in the printable ASCII range (space through tilde).
pub fn validate_ssid(ssid: &str) -> Result<(), ConnectivityError> {
    let printable = ssid.bytes().all(|b| (b' '..=b'~').contains(&b));
    if ssid.is_empty() || ssid.len() > 32 || !printable {
        return Err(ConnectivityError::InvalidSsid);
    }
    Ok(())
}

/// Empty means an open network; otherwise WPA2 bounds apply.
pub fn validate_password(password: &str) -> Result<(), ConnectivityError> {
    if password.is_empty() {
        return Ok(());
    }
    if password.len() < 8 || password.len() > 64 {
        return Err(ConnectivityError::InvalidPassword);
    }
    Ok(())
}

// ───────────────────────────────────────────────────────────────
// WiFi adapter
// ───────────────────────────────────────────────────────────────

pub struct WifiAdapter {
    state: WifiState,
    ssid: heapless::String<32>,
    password: heapless::String<64>,
    backoff: Duration,
    initial_backoff: Duration,
    max_backoff: Duration,
    retry_at: Option<Instant>,
    #[cfg(target_os = "espidf")]
    wifi: BlockingWifi<EspWifi<'static>>,
    #[cfg(not(target_os = "espidf"))]
    sim: SimLink,
}

/// Host stand-in for the radio.
#[cfg(not(target_os = "espidf"))]
#[derive(Debug, Default)]
struct SimLink {
    up: bool,
    fail_next: u32,
    attempts: u32,
}

impl WifiAdapter {
    #[cfg(target_os = "espidf")]
    pub fn new(wifi: BlockingWifi<EspWifi<'static>>) -> Self {
        Self {
            state: WifiState::Disconnected,
            ssid: heapless::String::new(),
            password: heapless::String::new(),
            backoff: INITIAL_BACKOFF,
            initial_backoff: INITIAL_BACKOFF,
            max_backoff: MAX_BACKOFF,
            retry_at: None,
            wifi,
        }
    }

    #[cfg(not(target_os = "espidf"))]
    pub fn new() -> Self {
        Self {
            state: WifiState::Disconnected,
            ssid: heapless::String::new(),
            password: heapless::String::new(),
            backoff: INITIAL_BACKOFF,
            initial_backoff: INITIAL_BACKOFF,
            max_backoff: MAX_BACKOFF,
            retry_at: None,
            sim: SimLink::default(),
        }
    }

    /// Override the reconnect backoff bounds.
    pub fn with_backoff(mut self, initial: Duration, max: Duration) -> Self {
        self.initial_backoff = initial;
        self.max_backoff = max.max(initial);
        self.backoff = initial;
        self
    }

    pub fn state(&self) -> WifiState {
        self.state
    }

    /// Delay before the next reconnect attempt.
    pub fn backoff(&self) -> Duration {
        self.backoff
    }

    pub fn set_credentials(&mut self, ssid: &str, password: &str) -> Result<(), ConnectivityError> {
        validate_ssid(ssid)?;
        validate_password(password)?;
        self.ssid.clear();
        self.ssid.push_str(ssid).map_err(|_| ConnectivityError::InvalidSsid)?;
        self.password.clear();
        self.password.push_str(password).map_err(|_| ConnectivityError::InvalidPassword)?;
        info!("WiFi: credentials updated (SSID='{}')", self.ssid);
        Ok(())
    }

    /// Boot-time connect: up to `attempts` tries, `pause_ms` apart.
    /// On failure the adapter stays in `Reconnecting` so `poll` keeps
    /// trying in the background.
    pub fn connect_with_retries(
        &mut self,
        attempts: u32,
        pause_ms: u32,
        delay: &mut impl DelayNs,
    ) -> Result<(), ConnectivityError> {
        let mut last = ConnectivityError::ConnectionFailed;
        for i in 1..=attempts.max(1) {
            info!("WiFi: connection attempt #{}", i);
            match self.connect() {
                Ok(()) => return Ok(()),
                Err(e @ (ConnectivityError::NoCredentials | ConnectivityError::InvalidSsid | ConnectivityError::InvalidPassword)) => {
                    return Err(e);
                }
                Err(e) => last = e,
            }
            if i < attempts {
                delay.delay_ms(pause_ms);
            }
        }
        Err(last)
    }

    fn on_connected(&mut self) {
        self.state = WifiState::Connected;
        self.backoff = self.initial_backoff;
        self.retry_at = None;
    }

    fn schedule_retry(&mut self, attempt: u32) {
        self.state = WifiState::Reconnecting { attempt };
        self.retry_at = Some(Instant::now() + self.backoff);
    }

    // ── Platform-specific ─────────────────────────────────────

    #[cfg(target_os = "espidf")]
    fn platform_connect(&mut self) -> Result<(), ConnectivityError> {
        let auth_method = if self.password.is_empty() {
            AuthMethod::None
        } else {
            AuthMethod::WPA2Personal
        };
        let cfg = Configuration::Client(ClientConfiguration {
            ssid: self.ssid.as_str().try_into().map_err(|_| ConnectivityError::InvalidSsid)?,
            password: self.password.as_str().try_into().map_err(|_| ConnectivityError::InvalidPassword)?,
            auth_method,
            ..Default::default()
        });

        let fail = |e: esp_idf_svc::sys::EspError| {
            warn!("WiFi(espidf): {}", e);
            ConnectivityError::ConnectionFailed
        };
        self.wifi.set_configuration(&cfg).map_err(fail)?;
        if !self.wifi.is_started().unwrap_or(false) {
            self.wifi.start().map_err(fail)?;
        }
        let _ = self.wifi.disconnect();
        self.wifi.connect().map_err(fail)?;
        self.wifi.wait_netif_up().map_err(fail)?;
        Ok(())
    }

    #[cfg(not(target_os = "espidf"))]
    fn platform_connect(&mut self) -> Result<(), ConnectivityError> {
        self.sim.attempts += 1;
        if self.sim.fail_next > 0 {
            self.sim.fail_next -= 1;
            warn!("WiFi(sim): simulated failure (attempt {})", self.sim.attempts);
            return Err(ConnectivityError::ConnectionFailed);
        }
        self.sim.up = true;
        info!("WiFi(sim): connected to '{}' (attempt {})", self.ssid, self.sim.attempts);
        Ok(())
    }

    #[cfg(target_os = "espidf")]
    fn platform_is_connected(&self) -> bool {
        self.wifi.is_connected().unwrap_or(false)
    }

    #[cfg(not(target_os = "espidf"))]
    fn platform_is_connected(&self) -> bool {
        self.sim.up
    }

    // ── Simulation hooks ──────────────────────────────────────

    /// Make the next `n` connection attempts fail.
    #[cfg(not(target_os = "espidf"))]
    pub fn sim_fail_next(&mut self, n: u32) {
        self.sim.fail_next = n;
    }

    /// Drop the link as if the AP went away.
    #[cfg(not(target_os = "espidf"))]
    pub fn sim_drop_link(&mut self) {
        self.sim.up = false;
    }

    #[cfg(not(target_os = "espidf"))]
    pub fn sim_attempts(&self) -> u32 {
        self.sim.attempts
    }
}

#[cfg(not(target_os = "espidf"))]
impl Default for WifiAdapter {
    fn default() -> Self {
        Self::new()
    }
}

// ───────────────────────────────────────────────────────────────
// ConnectivityPort
// ───────────────────────────────────────────────────────────────

impl ConnectivityPort for WifiAdapter {
    fn connect(&mut self) -> Result<(), ConnectivityError> {
        if self.ssid.is_empty() {
            return Err(ConnectivityError::NoCredentials);
        }
        if self.state == WifiState::Connected && self.platform_is_connected() {
            return Ok(());
        }

        info!("WiFi: connecting to '{}'", self.ssid);
        self.state = WifiState::Connecting;

        match self.platform_connect() {
            Ok(()) => {
                self.on_connected();
                info!("WiFi: connected");
                Ok(())
            }
            Err(e) => {
                error!("WiFi: connection failed, {}", e);
                self.schedule_retry(0);
                Err(e)
            }
        }
    }

    fn poll(&mut self) {
        match self.state {
            WifiState::Connected => {
                if !self.platform_is_connected() {
                    warn!("WiFi: connection lost, entering reconnect");
                    self.schedule_retry(0);
                }
            }
            WifiState::Reconnecting { attempt } => {
                if self.retry_at.is_some_and(|at| Instant::now() < at) {
                    return;
                }
                info!("WiFi: reconnect attempt {} (backoff {:?})", attempt + 1, self.backoff);
                match self.platform_connect() {
                    Ok(()) => {
                        self.on_connected();
                        info!("WiFi: reconnected");
                    }
                    Err(_) => {
                        self.backoff = (self.backoff * 2).min(self.max_backoff);
                        self.schedule_retry(attempt + 1);
                    }
                }
            }
            WifiState::Disconnected | WifiState::Connecting => {}
        }
    }

    fn is_connected(&self) -> bool {
        self.state == WifiState::Connected && self.platform_is_connected()
    }
}

// ───────────────────────────────────────────────────────────────
// Tests
// ───────────────────────────────────────────────────────────────
