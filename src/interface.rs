//! The display interface for e-Paper displays.
//!
//! Frames command and data bytes into chip-select transactions. The
//! controller samples the data/command line per byte, so it is held low only
//! while a command byte is clocked out and high otherwise.

use embedded_hal::blocking::delay::DelayUs;
use embedded_hal::blocking::spi::Write;
use embedded_hal::digital::v2::{InputPin, OutputPin};
use embedded_hal::spi::{Mode, MODE_0};

/// SPI mode expected by the controller: CPOL = 0, CPHA = 0, MSB first.
pub const SPI_MODE: Mode = MODE_0;

/// Clock rate the panels are known to work with.
pub const SPI_FREQUENCY_HZ: u32 = 4_000_000;

/// Settle time after each reset edge.
const RESET_DELAY_US: u32 = 40_000;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum DisplayError {
    BusWriteError,
    DCError,
    CSError,
    ResetError,
    /// `start_transaction` while a transaction was already open.
    NestedTransaction,
}

/// Bus transaction framer used by the panel engine.
///
/// `write_command` and `write_data` belong inside a transaction opened with
/// `start_transaction`. Implementations must never clock a byte out with
/// chip-select deasserted.
pub trait DisplayInterface {
    /// Drive the control lines to their idle levels, then hard reset.
    fn init<D>(&mut self, delay: &mut D) -> Result<(), DisplayError>
    where
        D: DelayUs<u32>;

    /// Hard reset
    fn reset<D>(&mut self, delay: &mut D) -> Result<(), DisplayError>
    where
        D: DelayUs<u32>;

    /// Assert chip-select.
    fn start_transaction(&mut self) -> Result<(), DisplayError>;

    /// Deassert chip-select.
    fn end_transaction(&mut self) -> Result<(), DisplayError>;

    /// Send a command to the controller.
    fn write_command(&mut self, command: u8) -> Result<(), DisplayError>;

    /// Send data for a command.
    fn write_data(&mut self, data: &[u8]) -> Result<(), DisplayError>;

    /// Busy line is high while the panel is refreshing. An unreadable
    /// line counts as busy.
    fn is_busy(&self) -> bool;

    /// Run `f` inside one transaction.
    ///
    /// The transaction is closed even if `f` fails; the first error wins.
    fn transaction<F>(&mut self, f: F) -> Result<(), DisplayError>
    where
        F: FnOnce(&mut Self) -> Result<(), DisplayError>,
    {
        self.start_transaction()?;
        let ret = f(self);
        let end = self.end_transaction();
        ret.and(end)
    }

    fn write_command_transaction(&mut self, command: u8) -> Result<(), DisplayError> {
        self.transaction(|di| di.write_command(command))
    }

    fn write_data_transaction(&mut self, data: &[u8]) -> Result<(), DisplayError> {
        self.transaction(|di| di.write_data(data))
    }

    /// One command followed by its data burst, in a single transaction.
    fn send_command_data(&mut self, command: u8, data: &[u8]) -> Result<(), DisplayError> {
        self.transaction(|di| {
            di.write_command(command)?;
            di.write_data(data)
        })
    }
}

/// EPaperDisplay SPI display interface.
pub struct EPDInterface<SPI, CS, DC, RST, BUSY> {
    spi: SPI,
    cs: CS,
    dc: DC,
    rst: RST,
    busy: BUSY,
    in_transaction: bool,
    violations: u32,
}

impl<SPI, CS, DC, RST, BUSY> EPDInterface<SPI, CS, DC, RST, BUSY>
where
    SPI: Write<u8>,
    CS: OutputPin,
    DC: OutputPin,
    RST: OutputPin,
    BUSY: InputPin,
{
    pub fn new(spi: SPI, cs: CS, dc: DC, rst: RST, busy: BUSY) -> Self {
        EPDInterface {
            spi,
            cs,
            dc,
            rst,
            busy,
            in_transaction: false,
            violations: 0,
        }
    }

    /// Number of framing violations seen so far: writes outside a
    /// transaction, nested opens and unmatched closes.
    pub fn violations(&self) -> u32 {
        self.violations
    }

    pub fn in_transaction(&self) -> bool {
        self.in_transaction
    }

    /// Consume the display interface and return
    /// the underlying peripherial driver and GPIO pins used by it
    pub fn release(self) -> (SPI, CS, DC, RST, BUSY) {
        (self.spi, self.cs, self.dc, self.rst, self.busy)
    }

    fn write_framed(&mut self, is_command: bool, bytes: &[u8]) -> Result<(), DisplayError> {
        // a stray write still gets a chip-select window of its own
        let bracket = !self.in_transaction;
        if bracket {
            self.violations += 1;
            warn!(
                "{} written outside a transaction",
                if is_command { "command" } else { "data" }
            );
            self.cs.set_low().map_err(|_| DisplayError::CSError)?;
        }

        // 1 = data, 0 = command
        if is_command && self.dc.set_low().is_err() {
            if bracket {
                self.cs.set_high().ok();
            }
            return Err(DisplayError::DCError);
        }

        let ret = self
            .spi
            .write(bytes)
            .map_err(|_| DisplayError::BusWriteError);

        if is_command {
            self.dc.set_high().ok();
        }
        if bracket {
            self.cs.set_high().ok();
        }

        ret
    }
}

impl<SPI, CS, DC, RST, BUSY> DisplayInterface for EPDInterface<SPI, CS, DC, RST, BUSY>
where
    SPI: Write<u8>,
    CS: OutputPin,
    DC: OutputPin,
    RST: OutputPin,
    BUSY: InputPin,
{
    fn init<D>(&mut self, delay: &mut D) -> Result<(), DisplayError>
    where
        D: DelayUs<u32>,
    {
        self.in_transaction = false;
        self.cs.set_high().map_err(|_| DisplayError::CSError)?;
        self.dc.set_high().map_err(|_| DisplayError::DCError)?;
        self.rst.set_high().map_err(|_| DisplayError::ResetError)?;

        self.reset(delay)
    }

    fn reset<D>(&mut self, delay: &mut D) -> Result<(), DisplayError>
    where
        D: DelayUs<u32>,
    {
        self.rst.set_low().map_err(|_| DisplayError::ResetError)?;
        delay.delay_us(RESET_DELAY_US);
        self.rst.set_high().map_err(|_| DisplayError::ResetError)?;
        delay.delay_us(RESET_DELAY_US);
        Ok(())
    }

    fn start_transaction(&mut self) -> Result<(), DisplayError> {
        if self.in_transaction {
            self.violations += 1;
            error!("transaction opened while another one is open");
            return Err(DisplayError::NestedTransaction);
        }

        // Assert chip select pin
        self.cs.set_low().map_err(|_| DisplayError::CSError)?;
        self.in_transaction = true;
        Ok(())
    }

    fn end_transaction(&mut self) -> Result<(), DisplayError> {
        if !self.in_transaction {
            self.violations += 1;
            warn!("no open transaction to close");
        }
        self.in_transaction = false;

        // Deassert chip select pin
        self.cs.set_high().map_err(|_| DisplayError::CSError)
    }

    fn write_command(&mut self, command: u8) -> Result<(), DisplayError> {
        trace!("command {:#x}", command);
        self.write_framed(true, &[command])
    }

    fn write_data(&mut self, data: &[u8]) -> Result<(), DisplayError> {
        self.write_framed(false, data)
    }

    fn is_busy(&self) -> bool {
        match self.busy.is_high() {
            Ok(busy) => busy,
            Err(_) => {
                warn!("busy line unreadable, assuming busy");
                true
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use embedded_hal_mock::delay::MockNoop;
    use embedded_hal_mock::pin::{Mock as PinMock, State as PinState, Transaction as PinTransaction};
    use embedded_hal_mock::spi::{Mock as SpiMock, Transaction as SpiTransaction};

    type MockInterface = EPDInterface<SpiMock, PinMock, PinMock, PinMock, PinMock>;

    fn interface(
        spi: &[SpiTransaction],
        cs: &[PinTransaction],
        dc: &[PinTransaction],
        rst: &[PinTransaction],
        busy: &[PinTransaction],
    ) -> MockInterface {
        EPDInterface::new(
            SpiMock::new(spi),
            PinMock::new(cs),
            PinMock::new(dc),
            PinMock::new(rst),
            PinMock::new(busy),
        )
    }

    fn done(di: MockInterface) {
        let (mut spi, mut cs, mut dc, mut rst, mut busy) = di.release();
        spi.done();
        cs.done();
        dc.done();
        rst.done();
        busy.done();
    }

    fn low() -> PinTransaction {
        PinTransaction::set(PinState::Low)
    }

    fn high() -> PinTransaction {
        PinTransaction::set(PinState::High)
    }

    #[test]
    fn command_transaction_brackets_one_byte() {
        let mut di = interface(
            &[SpiTransaction::write(vec![0x22])],
            &[low(), high()],
            &[low(), high()],
            &[],
            &[],
        );

        di.write_command_transaction(0x22).unwrap();

        assert!(!di.in_transaction());
        assert_eq!(di.violations(), 0);
        done(di);
    }

    #[test]
    fn command_and_data_share_one_chip_select_window() {
        let mut di = interface(
            &[
                SpiTransaction::write(vec![0x32]),
                SpiTransaction::write(vec![0x10, 0x18, 0x18]),
            ],
            &[low(), high()],
            &[low(), high()],
            &[],
            &[],
        );

        di.send_command_data(0x32, &[0x10, 0x18, 0x18]).unwrap();

        assert_eq!(di.violations(), 0);
        done(di);
    }

    #[test]
    fn data_transaction_leaves_dc_high() {
        let mut di = interface(
            &[SpiTransaction::write(vec![0xc0])],
            &[low(), high()],
            &[],
            &[],
            &[],
        );

        di.write_data_transaction(&[0xc0]).unwrap();
        done(di);
    }

    #[test]
    fn write_outside_transaction_is_reported_and_framed() {
        let mut di = interface(
            &[
                SpiTransaction::write(vec![0x20]),
                SpiTransaction::write(vec![0xc0]),
            ],
            &[low(), high(), low(), high()],
            &[low(), high()],
            &[],
            &[],
        );

        di.write_command(0x20).unwrap();
        di.write_data(&[0xc0]).unwrap();

        assert_eq!(di.violations(), 2);
        assert!(!di.in_transaction());
        done(di);
    }

    #[test]
    fn nested_transaction_is_rejected() {
        let mut di = interface(&[], &[low(), high()], &[], &[], &[]);

        di.start_transaction().unwrap();
        assert_eq!(di.start_transaction(), Err(DisplayError::NestedTransaction));
        assert!(di.in_transaction());
        di.end_transaction().unwrap();

        assert_eq!(di.violations(), 1);
        done(di);
    }

    #[test]
    fn unmatched_end_is_reported() {
        let mut di = interface(&[], &[high()], &[], &[], &[]);

        di.end_transaction().unwrap();

        assert_eq!(di.violations(), 1);
        done(di);
    }

    #[test]
    fn init_sets_idle_levels_then_resets() {
        let mut di = interface(&[], &[high()], &[high()], &[high(), low(), high()], &[]);

        di.init(&mut MockNoop::new()).unwrap();
        done(di);
    }

    #[test]
    fn busy_line_high_means_busy() {
        let di = interface(
            &[],
            &[],
            &[],
            &[],
            &[
                PinTransaction::get(PinState::High),
                PinTransaction::get(PinState::Low),
            ],
        );

        assert!(di.is_busy());
        assert!(!di.is_busy());
        done(di);
    }

    #[test]
    fn unreadable_busy_line_counts_as_busy() {
        use embedded_hal_mock::MockError;
        use std::io::ErrorKind;

        let di = interface(
            &[],
            &[],
            &[],
            &[],
            &[PinTransaction::get(PinState::Low).with_error(MockError::Io(ErrorKind::NotConnected))],
        );

        assert!(di.is_busy());
        done(di);
    }
}
