//! One-shot hardware peripheral initialization and raw pin access.
//!
//! Configures ADC1 channels, GPIO directions and the button interrupt
//! using raw ESP-IDF sys calls.  Called once from `main()` before
//! calibration starts.
//!
//! [`GpioOutput`] and [`GpioInput`] wrap a configured pin behind the
//! `embedded_hal` digital traits so the drivers stay hardware-agnostic.
//!
//! ## Dual-target design
//!
//! On ESP-IDF: real register access.  On host/test: pin levels and ADC
//! counts live in static atomics, injected with the `sim_*` helpers.

#[cfg(target_os = "espidf")]
use esp_idf_svc::sys::*;

use embedded_hal::digital::{ErrorKind, ErrorType, InputPin, OutputPin};
use log::info;

// ── Error type ────────────────────────────────────────────────

/// Errors during one-shot peripheral initialization.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HwInitError {
    AdcInitFailed(i32),
    /// The GPIO is not routed to ADC1.
    NotAnAdcPin(i32),
    GpioConfigFailed(i32),
    IsrInstallFailed(i32),
}

impl core::fmt::Display for HwInitError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::AdcInitFailed(rc) => write!(f, "ADC1 init failed (rc={})", rc),
            Self::NotAnAdcPin(gpio) => write!(f, "GPIO{} has no ADC1 channel", gpio),
            Self::GpioConfigFailed(rc) => write!(f, "GPIO config failed (rc={})", rc),
            Self::IsrInstallFailed(rc) => write!(f, "GPIO ISR service install failed (rc={})", rc),
        }
    }
}

impl std::error::Error for HwInitError {}

/// `ESP_ERR_INVALID_ARG`, reported for pins the chip does not have.
const ERR_INVALID_ARG: i32 = 0x102;

/// Bit mask for `gpio_config`, refusing numbers outside the chip's range.
fn gpio_mask(gpio: i32) -> Result<u64, HwInitError> {
    if !crate::pins::is_valid_gpio(gpio) {
        return Err(HwInitError::GpioConfigFailed(ERR_INVALID_ARG));
    }
    Ok(1u64 << gpio)
}

/// A GPIO level could not be read or written.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PinError(pub i32);

impl embedded_hal::digital::Error for PinError {
    fn kind(&self) -> ErrorKind {
        ErrorKind::Other
    }
}

// ── ADC (oneshot) ─────────────────────────────────────────────

#[cfg(target_os = "espidf")]
static mut ADC1_HANDLE: adc_oneshot_unit_handle_t = core::ptr::null_mut();

/// SAFETY: Must be called only after `init_adc()` from the main task.
/// The handle is written once at boot and only read afterwards.
#[cfg(target_os = "espidf")]
unsafe fn adc1_handle() -> adc_oneshot_unit_handle_t {
    unsafe { ADC1_HANDLE }
}

/// Create the ADC1 oneshot unit and configure each GPIO in `gpios`
/// (12-bit, 12 dB attenuation for the full 0-3.3 V swing).
#[cfg(target_os = "espidf")]
pub fn init_adc(gpios: &[i32]) -> Result<(), HwInitError> {
    let init_cfg = adc_oneshot_unit_init_cfg_t {
        unit_id: adc_unit_t_ADC_UNIT_1,
        ulp_mode: adc_ulp_mode_t_ADC_ULP_MODE_DISABLE,
        ..Default::default()
    };
    // SAFETY: ADC1_HANDLE is only written here, once at boot.
    let ret = unsafe { adc_oneshot_new_unit(&init_cfg, &raw mut ADC1_HANDLE) };
    if ret != ESP_OK as i32 {
        return Err(HwInitError::AdcInitFailed(ret));
    }

    let chan_cfg = adc_oneshot_chan_cfg_t {
        atten: adc_atten_t_ADC_ATTEN_DB_12,
        bitwidth: adc_bitwidth_t_ADC_BITWIDTH_12,
    };
    for &gpio in gpios {
        let channel = crate::pins::adc1_channel_for_gpio(gpio).ok_or(HwInitError::NotAnAdcPin(gpio))?;
        // SAFETY: handle initialised above; single-threaded boot path.
        let ret = unsafe { adc_oneshot_config_channel(adc1_handle(), channel, &chan_cfg) };
        if ret != ESP_OK as i32 {
            return Err(HwInitError::AdcInitFailed(ret));
        }
        info!("hw_init: ADC1 CH{} on GPIO{}", channel, gpio);
    }
    Ok(())
}

#[cfg(not(target_os = "espidf"))]
pub fn init_adc(gpios: &[i32]) -> Result<(), HwInitError> {
    for &gpio in gpios {
        crate::pins::adc1_channel_for_gpio(gpio).ok_or(HwInitError::NotAnAdcPin(gpio))?;
    }
    info!("hw_init(sim): ADC init skipped");
    Ok(())
}

/// One conversion on `channel`, or `None` if the driver reports an error.
#[cfg(target_os = "espidf")]
pub fn adc1_read(channel: u32) -> Option<u16> {
    let mut raw: i32 = 0;
    // SAFETY: adc1_handle() contract, main-task access only.
    let ret = unsafe { adc_oneshot_read(adc1_handle(), channel, &mut raw) };
    if ret != ESP_OK as i32 {
        return None;
    }
    Some(raw.max(0) as u16)
}

#[cfg(not(target_os = "espidf"))]
pub fn adc1_read(channel: u32) -> Option<u16> {
    use core::sync::atomic::Ordering;
    let slot = sim::ADC.get(channel as usize)?;
    if sim::ADC_FAIL.load(Ordering::Relaxed) & (1 << channel) != 0 {
        return None;
    }
    Some(slot.load(Ordering::Relaxed))
}

// ── GPIO ──────────────────────────────────────────────────────

/// Push-pull output, driven LOW on construction.
pub struct GpioOutput {
    gpio: i32,
}

impl GpioOutput {
    #[cfg(target_os = "espidf")]
    pub fn new(gpio: i32) -> Result<Self, HwInitError> {
        let cfg = gpio_config_t {
            pin_bit_mask: gpio_mask(gpio)?,
            mode: gpio_mode_t_GPIO_MODE_OUTPUT,
            pull_up_en: gpio_pullup_t_GPIO_PULLUP_DISABLE,
            pull_down_en: gpio_pulldown_t_GPIO_PULLDOWN_DISABLE,
            intr_type: gpio_int_type_t_GPIO_INTR_DISABLE,
        };
        // SAFETY: plain register configuration from the boot path.
        let ret = unsafe { gpio_config(&cfg) };
        if ret != ESP_OK as i32 {
            return Err(HwInitError::GpioConfigFailed(ret));
        }
        unsafe { gpio_set_level(gpio, 0) };
        info!("hw_init: GPIO{} output", gpio);
        Ok(Self { gpio })
    }

    #[cfg(not(target_os = "espidf"))]
    pub fn new(gpio: i32) -> Result<Self, HwInitError> {
        gpio_mask(gpio)?;
        sim::set_output(gpio, false);
        Ok(Self { gpio })
    }

    pub fn gpio(&self) -> i32 {
        self.gpio
    }

    #[cfg(target_os = "espidf")]
    fn write(&mut self, high: bool) -> Result<(), PinError> {
        // SAFETY: pin configured as output in new().
        let ret = unsafe { gpio_set_level(self.gpio, u32::from(high)) };
        if ret != ESP_OK as i32 {
            return Err(PinError(self.gpio));
        }
        Ok(())
    }

    #[cfg(not(target_os = "espidf"))]
    fn write(&mut self, high: bool) -> Result<(), PinError> {
        sim::set_output(self.gpio, high);
        Ok(())
    }
}

impl ErrorType for GpioOutput {
    type Error = PinError;
}

impl OutputPin for GpioOutput {
    fn set_low(&mut self) -> Result<(), PinError> {
        self.write(false)
    }

    fn set_high(&mut self) -> Result<(), PinError> {
        self.write(true)
    }
}

/// Input with the internal pull-up enabled.
pub struct GpioInput {
    gpio: i32,
}

impl GpioInput {
    #[cfg(target_os = "espidf")]
    pub fn new(gpio: i32) -> Result<Self, HwInitError> {
        let cfg = gpio_config_t {
            pin_bit_mask: gpio_mask(gpio)?,
            mode: gpio_mode_t_GPIO_MODE_INPUT,
            pull_up_en: gpio_pullup_t_GPIO_PULLUP_ENABLE,
            pull_down_en: gpio_pulldown_t_GPIO_PULLDOWN_DISABLE,
            intr_type: gpio_int_type_t_GPIO_INTR_NEGEDGE,
        };
        // SAFETY: plain register configuration from the boot path.
        let ret = unsafe { gpio_config(&cfg) };
        if ret != ESP_OK as i32 {
            return Err(HwInitError::GpioConfigFailed(ret));
        }
        info!("hw_init: GPIO{} input (pull-up)", gpio);
        Ok(Self { gpio })
    }

    #[cfg(not(target_os = "espidf"))]
    pub fn new(gpio: i32) -> Result<Self, HwInitError> {
        gpio_mask(gpio)?;
        Ok(Self { gpio })
    }

    pub fn gpio(&self) -> i32 {
        self.gpio
    }

    #[cfg(target_os = "espidf")]
    fn level(&self) -> bool {
        // SAFETY: read-only register access on a configured input.
        (unsafe { gpio_get_level(self.gpio) }) != 0
    }

    #[cfg(not(target_os = "espidf"))]
    fn level(&self) -> bool {
        sim::input_level(self.gpio)
    }
}

impl ErrorType for GpioInput {
    type Error = PinError;
}

impl InputPin for GpioInput {
    fn is_high(&mut self) -> Result<bool, PinError> {
        Ok(self.level())
    }

    fn is_low(&mut self) -> Result<bool, PinError> {
        Ok(!self.level())
    }
}

// ── GPIO ISR Service ──────────────────────────────────────────

#[cfg(target_os = "espidf")]
unsafe extern "C" fn button_gpio_isr(_arg: *mut core::ffi::c_void) {
    // SAFETY: esp_timer_get_time is an RTC counter read; safe in ISR context.
    let now_ms = (unsafe { esp_timer_get_time() } / 1_000) as u32;
    crate::drivers::button::button_isr_handler(now_ms);
}

/// Install the per-pin ISR service and hook the calibration button's
/// falling edge.  Call after the button pin is configured.
#[cfg(target_os = "espidf")]
pub fn init_button_isr(gpio: i32) -> Result<(), HwInitError> {
    // SAFETY: gpio_install_isr_service is idempotent; ESP_ERR_INVALID_STATE
    // means it was already installed.  The handler only touches atomics.
    unsafe {
        let ret = gpio_install_isr_service(0);
        if ret != ESP_OK as i32 && ret != ESP_ERR_INVALID_STATE as i32 {
            return Err(HwInitError::IsrInstallFailed(ret));
        }
        gpio_set_intr_type(gpio, gpio_int_type_t_GPIO_INTR_NEGEDGE);
        let ret = gpio_isr_handler_add(gpio, Some(button_gpio_isr), core::ptr::null_mut());
        if ret != ESP_OK as i32 {
            return Err(HwInitError::IsrInstallFailed(ret));
        }
        gpio_intr_enable(gpio);
    }
    info!("hw_init: button ISR on GPIO{}", gpio);
    Ok(())
}

#[cfg(not(target_os = "espidf"))]
pub fn init_button_isr(_gpio: i32) -> Result<(), HwInitError> {
    info!("hw_init(sim): ISR service skipped");
    Ok(())
}

// ── Host simulation ───────────────────────────────────────────

#[cfg(not(target_os = "espidf"))]
mod sim {
    use core::sync::atomic::{AtomicU16, AtomicU64, AtomicU8, Ordering};

    pub(super) static ADC: [AtomicU16; 8] = [const { AtomicU16::new(0) }; 8];
    /// Bit per ADC1 channel; a set bit makes reads on it fail.
    pub(super) static ADC_FAIL: AtomicU8 = AtomicU8::new(0);
    static OUTPUTS: AtomicU64 = AtomicU64::new(0);
    /// Inputs idle HIGH (pull-up).
    static INPUTS: AtomicU64 = AtomicU64::new(u64::MAX);

    /// Unknown pins map to an empty mask: writes are dropped, reads see
    /// the idle level of the word.
    fn bit(gpio: i32) -> u64 {
        super::gpio_mask(gpio).unwrap_or(0)
    }

    fn set_bit(word: &AtomicU64, gpio: i32, on: bool) {
        if on {
            word.fetch_or(bit(gpio), Ordering::Relaxed);
        } else {
            word.fetch_and(!bit(gpio), Ordering::Relaxed);
        }
    }

    pub(super) fn set_output(gpio: i32, high: bool) {
        set_bit(&OUTPUTS, gpio, high);
    }

    pub(super) fn output_level(gpio: i32) -> bool {
        OUTPUTS.load(Ordering::Relaxed) & bit(gpio) != 0
    }

    pub(super) fn set_input(gpio: i32, high: bool) {
        set_bit(&INPUTS, gpio, high);
    }

    pub(super) fn input_level(gpio: i32) -> bool {
        let mask = bit(gpio);
        mask == 0 || INPUTS.load(Ordering::Relaxed) & mask != 0
    }
}

/// Inject the raw count returned for an ADC1 channel.
#[cfg(not(target_os = "espidf"))]
pub fn sim_set_adc(channel: u32, raw: u16) {
    if let Some(slot) = sim::ADC.get(channel as usize) {
        slot.store(raw, core::sync::atomic::Ordering::Relaxed);
    }
}

/// Make reads on an ADC1 channel fail (`true`) or succeed again.
#[cfg(not(target_os = "espidf"))]
pub fn sim_fail_adc(channel: u32, fail: bool) {
    use core::sync::atomic::Ordering;
    if channel >= 8 {
        return;
    }
    if fail {
        sim::ADC_FAIL.fetch_or(1 << channel, Ordering::Relaxed);
    } else {
        sim::ADC_FAIL.fetch_and(!(1 << channel), Ordering::Relaxed);
    }
}

/// Current level of a simulated output pin.
#[cfg(not(target_os = "espidf"))]
pub fn sim_output_level(gpio: i32) -> bool {
    sim::output_level(gpio)
}

/// Drive a simulated input pin.
#[cfg(not(target_os = "espidf"))]
pub fn sim_set_input(gpio: i32, high: bool) {
    sim::set_input(gpio, high);
}
