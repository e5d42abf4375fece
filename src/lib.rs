//! SPI driver for IL3820/SSD1608 black/white E-Paper panels.
//!
//! Draw into the in-memory frame with embedded-graphics, then push it with
//! [`EPD::update`] or [`EPD::update_part_or_full`]. The panel refreshes on its
//! own and reports completion on the busy line.
//!
//! ```ignore
//! let di = EPDInterface::new(spi, cs, dc, rst, busy);
//! let mut epd: Epd2in9<_> = EPD::new(di, OperatingMode::Sync);
//! epd.init(&mut delay, None)?;
//! epd.enter_partial_mode()?;
//!
//! Text::new("12:30", Point::new(8, 40), style).draw(&mut epd)?;
//! epd.update_part_or_full(&mut delay)?;
//!
//! // keep `epd.state()` somewhere that survives deep sleep and hand it back
//! // to `init` after wake up
//! ```
#![cfg_attr(not(test), no_std)]

#[macro_use]
mod fmt;

pub mod command;
pub mod display;
pub mod drivers;
pub mod interface;
pub mod panel;

#[cfg(test)]
mod testing;

use core::convert::Infallible;
use core::marker::PhantomData;

use embedded_graphics::{pixelcolor::BinaryColor, prelude::*};
use embedded_hal::blocking::delay::DelayUs;

pub use display::{Color, DisplayRotation, FrameBuffer, Mirroring};
pub use drivers::{BusyWait, RegisterBlock, IL3820};
pub use interface::{DisplayError, DisplayInterface, EPDInterface, SPI_FREQUENCY_HZ, SPI_MODE};
pub use panel::{DisplaySize, Gdeh029a1, Gdep015oc1, PanelProfile};

use drivers::il3820::lut::{LUT_FULL_UPDATE, LUT_PARTIAL_UPDATE};

/// 2.9" 128x296 panel
pub type Epd2in9<DI> = EPD<DI, Gdeh029a1, { <Gdeh029a1 as DisplaySize>::N }>;
/// 1.54" 200x200 panel
pub type Epd1in54<DI> = EPD<DI, Gdep015oc1, { <Gdep015oc1 as DisplaySize>::N }>;

/// Refresh bookkeeping, restorable across host resets.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct PanelState {
    /// Partial refreshes since the last full one.
    pub partial_update_count: u32,
    /// LUT and power sequence sent since the last reset.
    pub is_initialized: bool,
    pub is_full_mode: bool,
    /// Clock and charge pump are off.
    pub is_power_off: bool,
}

impl Default for PanelState {
    fn default() -> Self {
        PanelState {
            partial_update_count: 0,
            is_initialized: false,
            is_full_mode: true,
            is_power_off: true,
        }
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum OperatingMode {
    /// `update` waits for the refresh before powering down.
    #[default]
    Sync,
    /// `update` powers down right behind the activation and drops frames
    /// while the panel is still busy.
    Async,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum UpdateStatus {
    /// Refresh done, panel idle.
    Completed,
    /// A busy wait gave up; the frame may be incomplete.
    TimedOut,
    /// Panel was busy, nothing sent. Retry later.
    Skipped,
}

impl UpdateStatus {
    fn after(self, next: UpdateStatus) -> UpdateStatus {
        if self == UpdateStatus::TimedOut {
            self
        } else {
            next
        }
    }
}

/// Panel protocol engine.
pub struct EPD<DI, P, const N: usize> {
    pub interface: DI,
    framebuf: FrameBuffer<N>,
    state: PanelState,
    mode: OperatingMode,
    registers: RegisterBlock,
    violations: u32,
    _panel: PhantomData<P>,
}

impl<DI: DisplayInterface, P: PanelProfile, const N: usize> EPD<DI, P, N> {
    const BUFFER_FITS_PANEL: () = assert!(N == P::N, "buffer size does not match the panel");

    pub fn new(interface: DI, mode: OperatingMode) -> Self {
        #[allow(clippy::let_unit_value)]
        let () = Self::BUFFER_FITS_PANEL;

        let mut framebuf = FrameBuffer::new(P::WIDTH, P::HEIGHT);
        framebuf.set_mirroring(P::MIRRORING);

        Self {
            interface,
            framebuf,
            state: PanelState::default(),
            mode,
            registers: RegisterBlock::for_height(P::HEIGHT as u16),
            violations: 0,
            _panel: PhantomData,
        }
    }

    /// Reset the controller and send the panel configuration.
    ///
    /// `restore` resumes the refresh mode and ghosting counter of an earlier
    /// session. The LUT is always sent again on the next mode entry.
    pub fn init<DELAY>(
        &mut self,
        delay: &mut DELAY,
        restore: Option<PanelState>,
    ) -> Result<(), DisplayError>
    where
        DELAY: DelayUs<u32>,
    {
        self.interface.init(delay)?;
        IL3820::init_registers(&mut self.interface, &self.registers)?;

        if let Some(state) = restore {
            debug!("restoring panel state");
            self.state = state;
            self.state.partial_update_count = state
                .partial_update_count
                .min(P::PARTIAL_UPDATE_THRESHOLD);
        }
        self.state.is_initialized = false;

        Ok(())
    }

    /// Snapshot to hand back to `init` after a host reset.
    pub fn state(&self) -> PanelState {
        self.state
    }

    pub fn operating_mode(&self) -> OperatingMode {
        self.mode
    }

    /// Power sequencing mistakes seen so far.
    pub fn violations(&self) -> u32 {
        self.violations
    }

    pub fn enter_full_mode(&mut self) -> Result<(), DisplayError> {
        if self.state.is_full_mode && self.state.is_initialized {
            return Ok(());
        }
        debug!("entering full refresh mode");

        // full mode keeps this window for every later frame
        self.set_whole_panel_window()?;
        IL3820::write_lut(&mut self.interface, &LUT_FULL_UPDATE)?;
        self.state.is_initialized = true;
        self.state.is_full_mode = true;

        self.power_up_after_mode_entry()
    }

    pub fn enter_partial_mode(&mut self) -> Result<(), DisplayError> {
        if !self.state.is_full_mode && self.state.is_initialized {
            return Ok(());
        }
        debug!("entering partial refresh mode");

        IL3820::write_lut(&mut self.interface, &LUT_PARTIAL_UPDATE)?;
        self.state.is_initialized = true;
        self.state.is_full_mode = false;

        self.power_up_after_mode_entry()
    }

    pub fn set_rotation(&mut self, rotation: DisplayRotation) {
        self.framebuf.set_rotation(rotation);
    }

    pub fn rotation(&self) -> DisplayRotation {
        self.framebuf.rotation()
    }

    /// Logical width, after rotation.
    pub fn width(&self) -> usize {
        self.framebuf.logical_size().0
    }

    /// Logical height, after rotation.
    pub fn height(&self) -> usize {
        self.framebuf.logical_size().1
    }

    /// Off screen points are ignored.
    pub fn draw_pixel(&mut self, x: i32, y: i32, color: Color) {
        self.framebuf.set_pixel(x, y, color);
    }

    pub fn pixel(&self, x: i32, y: i32) -> Option<Color> {
        self.framebuf.pixel(x, y)
    }

    pub fn fill_screen(&mut self, color: Color) {
        self.framebuf.fill(color);
    }

    pub fn framebuffer(&self) -> &FrameBuffer<N> {
        &self.framebuf
    }

    /// Busy line, high while the panel refreshes.
    pub fn is_busy(&self) -> bool {
        self.interface.is_busy()
    }

    /// Block until the panel is idle, for at most 2 s.
    pub fn wait_while_busy<DELAY>(&mut self, delay: &mut DELAY) -> BusyWait
    where
        DELAY: DelayUs<u32>,
    {
        IL3820::wait_while_busy(&mut self.interface, delay)
    }

    /// Push the frame to the panel and refresh it in the current mode.
    ///
    /// Returns with the panel idle (or the wait timed out) in both modes, so
    /// the next command never lands on a running refresh.
    pub fn update<DELAY>(&mut self, delay: &mut DELAY) -> Result<UpdateStatus, DisplayError>
    where
        DELAY: DelayUs<u32>,
    {
        if self.mode == OperatingMode::Async && self.is_busy() {
            debug!("panel busy, frame dropped");
            return Ok(UpdateStatus::Skipped);
        }

        let wait = self.show_buffer(delay)?;
        self.power_off()?;

        Ok(if wait.and(self.wait_while_busy(delay)).is_timed_out() {
            UpdateStatus::TimedOut
        } else {
            UpdateStatus::Completed
        })
    }

    /// Refresh in the current mode, with a full refresh every
    /// `PARTIAL_UPDATE_THRESHOLD` calls to clear ghosting.
    pub fn update_part_or_full<DELAY>(
        &mut self,
        delay: &mut DELAY,
    ) -> Result<UpdateStatus, DisplayError>
    where
        DELAY: DelayUs<u32>,
    {
        self.state.partial_update_count += 1;
        if self.state.partial_update_count < P::PARTIAL_UPDATE_THRESHOLD {
            return self.update(delay);
        }

        debug!(
            "forcing full refresh after {} partial refreshes",
            self.state.partial_update_count
        );
        self.state.partial_update_count = 0;

        let status = self.update(delay)?;
        self.enter_full_mode()?;
        let status = if self.wait_while_busy(delay).is_timed_out() {
            UpdateStatus::TimedOut
        } else {
            status
        };
        let status = status.after(self.update(delay)?);
        self.enter_partial_mode()?;

        Ok(status)
    }

    /// Consume the driver and return the display interface.
    pub fn release(self) -> DI {
        self.interface
    }

    fn show_buffer<DELAY>(&mut self, delay: &mut DELAY) -> Result<BusyWait, DisplayError>
    where
        DELAY: DelayUs<u32>,
    {
        if self.state.is_power_off {
            self.power_on()?;
        }

        let full = self.state.is_full_mode;
        if !full {
            self.set_whole_panel_window()?;
        }

        let mut wait =
            IL3820::write_display_data(&mut self.interface, delay, self.framebuf.as_bytes())?;

        if full {
            IL3820::update_full(&mut self.interface)?;
        } else {
            IL3820::update_partial(&mut self.interface)?;
        }

        if self.mode == OperatingMode::Sync {
            wait = wait.and(self.wait_while_busy(delay));
        }

        if !full {
            // same frame again into the now idle RAM, otherwise the next
            // partial refresh flashes twice
            let second =
                IL3820::write_display_data(&mut self.interface, delay, self.framebuf.as_bytes())?;
            wait = wait.and(second);
        }

        Ok(wait)
    }

    fn set_whole_panel_window(&mut self) -> Result<(), DisplayError> {
        // Y runs bottom up, matching the data entry mode
        IL3820::set_addresses(
            &mut self.interface,
            0,
            (P::WIDTH - 1) as u16,
            (P::HEIGHT - 1) as u16,
            0,
        )
    }

    fn power_up_after_mode_entry(&mut self) -> Result<(), DisplayError> {
        self.power_on()?;
        if P::POWER_OFF_AFTER_MODE_ENTRY {
            self.power_off()?;
        }
        Ok(())
    }

    fn power_on(&mut self) -> Result<(), DisplayError> {
        if !self.state.is_power_off {
            self.violations += 1;
            warn!("power on while already on");
        }
        IL3820::power_on(&mut self.interface)?;
        self.state.is_power_off = false;
        Ok(())
    }

    fn power_off(&mut self) -> Result<(), DisplayError> {
        if self.state.is_power_off {
            self.violations += 1;
            warn!("power off while already off");
        }
        IL3820::power_off(&mut self.interface)?;
        self.state.is_power_off = true;
        Ok(())
    }
}

impl<DI, P, const N: usize> OriginDimensions for EPD<DI, P, N> {
    fn size(&self) -> Size {
        self.framebuf.size()
    }
}

impl<DI, P, const N: usize> DrawTarget for EPD<DI, P, N> {
    type Color = BinaryColor;
    type Error = Infallible;

    fn draw_iter<I>(&mut self, pixels: I) -> Result<(), Self::Error>
    where
        I: IntoIterator<Item = Pixel<Self::Color>>,
    {
        self.framebuf.draw_iter(pixels)
    }

    fn clear(&mut self, color: Self::Color) -> Result<(), Self::Error> {
        self.framebuf.fill(color.into());
        Ok(())
    }
}
