//! Waveform Look Up Table(LUT), which defines the display driving waveform settings.
//!
//! # LUT Table
//!
//! 30 bytes, written with `0x32` after the clock/charge pump is configured.
//!
//! - bytes 0..20: VS[n-XY], source voltage level per phase and transition,
//!   2 bits each (00 VSS, 01 VSH, 10 VSL, 11 NA)
//! - bytes 20..30: TP[n], phase length in frames, two phases per byte
//!
//! The full table drives every pixel through a black/white flash, which
//! clears the charge left behind by partial refreshes. The partial table
//! only drives transitioning pixels and leaves that charge in place.

/// LUT for full update.
#[rustfmt::skip]
pub const LUT_FULL_UPDATE: [u8; 30] = [
    // VS
    0x02, 0x02, 0x01, 0x11, 0x12,
    0x12, 0x22, 0x22, 0x66, 0x69,
    0x69, 0x59, 0x58, 0x99, 0x99,
    0x88, 0x00, 0x00, 0x00, 0x00,
    // TP
    0xF8, 0xB4, 0x13, 0x51, 0x35,
    0x51, 0x51, 0x19, 0x01, 0x00,
];

/// LUT for partial update.
#[rustfmt::skip]
pub const LUT_PARTIAL_UPDATE: [u8; 30] = [
    // VS
    0x10, 0x18, 0x18, 0x08, 0x18,
    0x18, 0x08, 0x00, 0x00, 0x00,
    0x00, 0x00, 0x00, 0x00, 0x00,
    0x00, 0x00, 0x00, 0x00, 0x00,
    // TP
    0x13, 0x14, 0x44, 0x12, 0x00,
    0x00, 0x00, 0x00, 0x00, 0x00,
];
