//! IL3820 / SSD1608 driver.
//!
//! For:
//! - GDEH029A1, 2.9" 128x296
//! - GDEP015OC1, 1.54" 200x200
//!
//! Each helper here is one bus transaction, except `set_addresses` which is
//! the RAM area followed by the RAM pointer.

use embedded_hal::blocking::delay::DelayUs;

use crate::command::{update_control, Command};
use crate::interface::{DisplayError, DisplayInterface};

pub mod lut;

/// Busy line poll period.
pub const BUSY_POLL_INTERVAL_US: u32 = 5_000;
/// Polls before giving up, 2 s in total.
pub const BUSY_POLL_LIMIT: u32 = 400;

/// Outcome of a bounded wait on the busy line.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum BusyWait {
    Idle,
    /// Still busy after `BUSY_POLL_LIMIT` polls.
    TimedOut,
}

impl BusyWait {
    pub fn is_timed_out(self) -> bool {
        self == BusyWait::TimedOut
    }

    /// Combine two waits, a timeout in either one sticks.
    pub fn and(self, other: BusyWait) -> BusyWait {
        if self.is_timed_out() || other.is_timed_out() {
            BusyWait::TimedOut
        } else {
            BusyWait::Idle
        }
    }
}

/// Controller configuration written once after reset.
///
/// Computed per panel; the gate count comes from the physical height.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RegisterBlock {
    /// Gate count low/high byte, gate scan direction
    pub driver_output: [u8; 3],
    pub soft_start: [u8; 3],
    pub vcom: u8,
    pub dummy_line_period: u8,
    /// 2us per line
    pub gate_line_width: u8,
    /// X increment, Y decrement
    pub data_entry_mode: u8,
}

impl RegisterBlock {
    pub const fn for_height(height: u16) -> Self {
        RegisterBlock {
            driver_output: [(height % 256) as u8, (height / 256) as u8, 0x00],
            soft_start: [0xd7, 0xd6, 0x9d],
            vcom: 0xa8,
            dummy_line_period: 0x1a,
            gate_line_width: 0x08,
            data_entry_mode: 0x01,
        }
    }
}

/// 200 source outputs, 300 gate outputs, B/W, 30 bytes LUT
pub struct IL3820;

impl IL3820 {
    /// Panel configuration, one batched transaction.
    ///
    /// The order matters: the data entry mode must match the gate scan
    /// direction or the image comes out mirrored.
    pub fn init_registers<DI: DisplayInterface>(
        di: &mut DI,
        registers: &RegisterBlock,
    ) -> Result<(), DisplayError> {
        debug!("init registers");
        di.transaction(|di| {
            di.write_command(Command::DriverOutputControl.into())?;
            di.write_data(&registers.driver_output)?;
            di.write_command(Command::BoosterSoftStartControl.into())?;
            di.write_data(&registers.soft_start)?;
            di.write_command(Command::WriteVcomRegister.into())?;
            di.write_data(&[registers.vcom])?;
            di.write_command(Command::SetDummyLinePeriod.into())?;
            di.write_data(&[registers.dummy_line_period])?;
            di.write_command(Command::SetGatelineWidth.into())?;
            di.write_data(&[registers.gate_line_width])?;
            di.write_command(Command::DataEntryModeSetting.into())?;
            di.write_data(&[registers.data_entry_mode])
        })
    }

    pub fn write_lut<DI: DisplayInterface>(di: &mut DI, lut: &[u8; 30]) -> Result<(), DisplayError> {
        di.send_command_data(Command::WriteLutRegister.into(), lut)
    }

    /// RAM window and pointer, x in pixels, y in rows.
    ///
    /// The pointer starts at (`x_start`, `y_start`); with Y decrement entry
    /// mode `y_start` is the bottom row.
    pub fn set_addresses<DI: DisplayInterface>(
        di: &mut DI,
        x_start: u16,
        x_end: u16,
        y_start: u16,
        y_end: u16,
    ) -> Result<(), DisplayError> {
        Self::set_ram_area(di, (x_start / 8) as u8, (x_end / 8) as u8, y_start, y_end)?;
        Self::set_ram_pointer(di, (x_start / 8) as u8, y_start)
    }

    /// X in byte units, Y in rows.
    pub fn set_ram_area<DI: DisplayInterface>(
        di: &mut DI,
        x_start: u8,
        x_end: u8,
        y_start: u16,
        y_end: u16,
    ) -> Result<(), DisplayError> {
        di.transaction(|di| {
            di.write_command(Command::SetRamXAddressStartEndPosition.into())?;
            di.write_data(&[x_start, x_end])?;
            di.write_command(Command::SetRamYAddressStartEndPosition.into())?;
            di.write_data(&[
                (y_start % 256) as u8,
                (y_start / 256) as u8,
                (y_end % 256) as u8,
                (y_end / 256) as u8,
            ])
        })
    }

    pub fn set_ram_pointer<DI: DisplayInterface>(
        di: &mut DI,
        x: u8,
        y: u16,
    ) -> Result<(), DisplayError> {
        di.transaction(|di| {
            di.write_command(Command::SetRamXAddressCounter.into())?;
            di.write_data(&[x])?;
            di.write_command(Command::SetRamYAddressCounter.into())?;
            di.write_data(&[(y % 256) as u8, (y / 256) as u8])
        })
    }

    /// Enable clock and charge pump.
    pub fn power_on<DI: DisplayInterface>(di: &mut DI) -> Result<(), DisplayError> {
        Self::update_sequence(di, update_control::CLOCK_CHARGE_PUMP_ON, false)
    }

    pub fn power_off<DI: DisplayInterface>(di: &mut DI) -> Result<(), DisplayError> {
        Self::update_sequence(di, update_control::CLOCK_CHARGE_PUMP_OFF, false)
    }

    pub fn update_full<DI: DisplayInterface>(di: &mut DI) -> Result<(), DisplayError> {
        Self::update_sequence(di, update_control::DISPLAY_FULL, true)
    }

    pub fn update_partial<DI: DisplayInterface>(di: &mut DI) -> Result<(), DisplayError> {
        Self::update_sequence(di, update_control::DISPLAY_PARTIAL, true)
    }

    fn update_sequence<DI: DisplayInterface>(
        di: &mut DI,
        option: u8,
        terminate: bool,
    ) -> Result<(), DisplayError> {
        di.transaction(|di| {
            di.write_command(Command::DisplayUpdateControl2.into())?;
            di.write_data(&[option])?;
            di.write_command(Command::MasterActivation.into())?;
            if terminate {
                di.write_command(Command::Nop.into())?;
            }
            Ok(())
        })
    }

    /// Write a whole frame to panel RAM at the current pointer.
    ///
    /// RAM must be idle from the previous operation, so this waits on the
    /// busy line first.
    pub fn write_display_data<DI, DELAY>(
        di: &mut DI,
        delay: &mut DELAY,
        buffer: &[u8],
    ) -> Result<BusyWait, DisplayError>
    where
        DI: DisplayInterface,
        DELAY: DelayUs<u32>,
    {
        let wait = Self::wait_while_busy(di, delay);
        di.send_command_data(Command::WriteRam.into(), buffer)?;
        Ok(wait)
    }

    /// Poll the busy line every 5 ms for at most 2 s.
    pub fn wait_while_busy<DI, DELAY>(di: &mut DI, delay: &mut DELAY) -> BusyWait
    where
        DI: DisplayInterface,
        DELAY: DelayUs<u32>,
    {
        for _ in 0..BUSY_POLL_LIMIT {
            if !di.is_busy() {
                return BusyWait::Idle;
            }
            delay.delay_us(BUSY_POLL_INTERVAL_US);
        }

        warn!("panel still busy after {} polls", BUSY_POLL_LIMIT);
        BusyWait::TimedOut
    }
}
