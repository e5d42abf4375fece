//! Panel profiles.
//!
//! Both panels run the same IL3820 command set and differ in geometry and
//! refresh policy only.

use crate::display::{buffer_len, Mirroring};

/// Trait that defines display size information
pub trait DisplaySize {
    /// Width in pixels
    const WIDTH: usize;
    /// Height in pixels
    const HEIGHT: usize;

    /// Frame buffer size in bytes
    const N: usize = buffer_len(Self::WIDTH, Self::HEIGHT);
}

/// Refresh policy of a panel.
pub trait PanelProfile: DisplaySize {
    /// Partial refreshes, counting the forcing one, before a full refresh
    /// clears the ghosting.
    const PARTIAL_UPDATE_THRESHOLD: u32;

    /// Switch clock and charge pump back off right after switching them on
    /// when entering a refresh mode. The next `update` powers up again.
    const POWER_OFF_AFTER_MODE_ENTRY: bool;

    const MIRRORING: Mirroring = Mirroring::None;
}

/// 2in9, 128x296
#[derive(Clone, Copy)]
pub struct Gdeh029a1;

impl DisplaySize for Gdeh029a1 {
    const WIDTH: usize = 128;
    const HEIGHT: usize = 296;
}

impl PanelProfile for Gdeh029a1 {
    const PARTIAL_UPDATE_THRESHOLD: u32 = 10;
    const POWER_OFF_AFTER_MODE_ENTRY: bool = false;
}

/// 1in54, 200x200
#[derive(Clone, Copy)]
pub struct Gdep015oc1;

impl DisplaySize for Gdep015oc1 {
    const WIDTH: usize = 200;
    const HEIGHT: usize = 200;
}

impl PanelProfile for Gdep015oc1 {
    const PARTIAL_UPDATE_THRESHOLD: u32 = 7;
    const POWER_OFF_AFTER_MODE_ENTRY: bool = true;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn buffer_sizes() {
        assert_eq!(Gdeh029a1::N, 128 / 8 * 296);
        assert_eq!(Gdep015oc1::N, 200 / 8 * 200);
    }
}
