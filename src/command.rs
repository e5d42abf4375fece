//! Command Table

#[repr(u8)]
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Command {
    /// Set the number of gate
    ///
    /// <<A:u8, 0:b7, A8:b1, 0:b5, GD:b1, SM:b1, TB:b1>>
    DriverOutputControl = 0x01,
    /// Booster Enable with Phase 1, Phase 2 and Phase 3 for soft start current setting.
    BoosterSoftStartControl = 0x0c,
    /// Define data entry sequence
    /// <<0:b5, A:b3>>
    ///
    /// ## A[1:0]
    /// - 00 – Y decrement, X decrement,
    /// - 01 – Y decrement, X increment,
    /// - 10 – Y increment, X decrement,
    /// - 11 – Y increment, X increment [POR]
    ///
    /// ## A[2]
    /// - AM = 0, the address counter is updated in the X direction. [POR]
    /// - AM = 1, the address counter is updated in the Y direction.
    DataEntryModeSetting = 0x11,
    /// Activate Display Update Sequence
    ///
    /// The Display Update Sequence Option is located at R22h
    MasterActivation = 0x20,
    /// Display Update Sequence Option:
    /// Enable the stage for Master Activation.
    ///
    /// See [`update_control`] for the option bytes used here.
    DisplayUpdateControl2 = 0x22,
    /// Pixel data follows, written at the RAM address counter.
    WriteRam = 0x24,
    WriteVcomRegister = 0x2c,
    /// Write LUT register from MCU interface [30 bytes]
    /// (excluding the VSH/VSL and Dummy bit)
    WriteLutRegister = 0x32,
    /// LUT byte 29, the content of dummy line.
    SetDummyLinePeriod = 0x3a,
    /// LUT byte 31, the content of gate line width,
    SetGatelineWidth = 0x3b,
    /// Specify the start/end positions of the window address in the X direction by an address unit.
    ///
    /// x point must be the multiple of 8 or the last 3 bits will be ignored
    SetRamXAddressStartEndPosition = 0x44,
    /// Specify the start/end positions of the window address in the Y direction by an address unit.
    SetRamYAddressStartEndPosition = 0x45,
    SetRamXAddressCounter = 0x4e,
    SetRamYAddressCounter = 0x4f,
    /// Terminates a frame write, otherwise does nothing.
    Nop = 0xff,
}

impl From<Command> for u8 {
    fn from(command: Command) -> u8 {
        command as u8
    }
}

/// Option bytes for [`Command::DisplayUpdateControl2`].
pub mod update_control {
    /// Enable clock and charge pump.
    pub const CLOCK_CHARGE_PUMP_ON: u8 = 0xc0;
    /// Disable charge pump and clock.
    pub const CLOCK_CHARGE_PUMP_OFF: u8 = 0x03;
    /// Initial display + pattern display, clears residual charge.
    pub const DISPLAY_FULL: u8 = 0xc4;
    /// Pattern display only.
    pub const DISPLAY_PARTIAL: u8 = 0x04;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn wire_values() {
        assert_eq!(u8::from(Command::MasterActivation), 0x20);
        assert_eq!(u8::from(Command::DisplayUpdateControl2), 0x22);
        assert_eq!(u8::from(Command::WriteRam), 0x24);
        assert_eq!(u8::from(Command::WriteLutRegister), 0x32);
        assert_eq!(u8::from(Command::SetRamXAddressStartEndPosition), 0x44);
        assert_eq!(u8::from(Command::SetRamYAddressStartEndPosition), 0x45);
        assert_eq!(u8::from(Command::SetRamXAddressCounter), 0x4e);
        assert_eq!(u8::from(Command::SetRamYAddressCounter), 0x4f);
        assert_eq!(u8::from(Command::Nop), 0xff);
    }
}
