//! Frame buffer for embedded-graphics.
//!
//! One bit per pixel, MSB first, rows in panel RAM order. Drawing happens in
//! logical (rotated) coordinates and is mapped to the physical layout here.
//!
//! The buffer has to be flushed to update the display after a group of draw calls has been completed.
//! The flush is not part of embedded-graphics API.

use core::convert::Infallible;

use embedded_graphics::{pixelcolor::BinaryColor, prelude::*};

/// Panel color. The controller stores black as 0 and white as 1.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Color {
    Black,
    White,
}

impl Color {
    /// A byte of eight pixels in this color.
    pub const fn byte_value(self) -> u8 {
        match self {
            Color::Black => 0x00,
            Color::White => 0xff,
        }
    }
}

/// `On` is ink, i.e. black.
impl From<BinaryColor> for Color {
    fn from(color: BinaryColor) -> Self {
        match color {
            BinaryColor::On => Color::Black,
            BinaryColor::Off => Color::White,
        }
    }
}

impl From<Color> for BinaryColor {
    fn from(color: Color) -> Self {
        match color {
            Color::Black => BinaryColor::On,
            Color::White => BinaryColor::Off,
        }
    }
}

/// Rotation of the display.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[repr(u8)]
pub enum DisplayRotation {
    /// No rotation, normal display
    Rotate0,
    /// Rotate by 90 degress clockwise
    Rotate90,
    /// Rotate by 180 degress clockwise
    Rotate180,
    /// Rotate 270 degress clockwise
    Rotate270,
}

/// Rotation class 0..=3, higher values wrap.
impl From<u8> for DisplayRotation {
    fn from(value: u8) -> Self {
        match value & 3 {
            0 => DisplayRotation::Rotate0,
            1 => DisplayRotation::Rotate90,
            2 => DisplayRotation::Rotate180,
            _ => DisplayRotation::Rotate270,
        }
    }
}

impl DisplayRotation {
    fn is_landscape_swap(self) -> bool {
        matches!(self, DisplayRotation::Rotate90 | DisplayRotation::Rotate270)
    }
}

/// Applied after rotation, in physical coordinates.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Mirroring {
    None,
    Horizontal,
    Vertical,
    Origin,
}

/// Bytes needed for a `width` x `height` 1bpp frame.
pub const fn buffer_len(width: usize, height: usize) -> usize {
    (width / 8 + (width % 8 != 0) as usize) * height
}

#[derive(Clone)]
pub struct FrameBuffer<const N: usize> {
    buf: [u8; N],
    width: usize,
    height: usize,
    rotation: DisplayRotation,
    mirroring: Mirroring,
}

impl<const N: usize> FrameBuffer<N> {
    /// A white frame for a `width` x `height` panel.
    pub fn new(width: usize, height: usize) -> Self {
        debug_assert_eq!(buffer_len(width, height), N);

        Self {
            buf: [Color::White.byte_value(); N],
            width,
            height,
            rotation: DisplayRotation::Rotate0,
            mirroring: Mirroring::None,
        }
    }

    /// Whole buffer in one color, without per-pixel addressing.
    pub fn fill(&mut self, color: Color) {
        self.buf.fill(color.byte_value())
    }

    pub fn set_rotation(&mut self, rotation: DisplayRotation) {
        self.rotation = rotation;
    }

    pub fn rotation(&self) -> DisplayRotation {
        self.rotation
    }

    pub fn set_mirroring(&mut self, mirroring: Mirroring) {
        self.mirroring = mirroring;
    }

    pub fn mirroring(&self) -> Mirroring {
        self.mirroring
    }

    /// Width and height as seen by drawing code.
    pub fn logical_size(&self) -> (usize, usize) {
        if self.rotation.is_landscape_swap() {
            (self.height, self.width)
        } else {
            (self.width, self.height)
        }
    }

    /// Width and height of the panel RAM.
    pub fn physical_size(&self) -> (usize, usize) {
        (self.width, self.height)
    }

    /// Set one pixel. Returns false, and leaves the buffer alone, when the
    /// point is off screen.
    pub fn set_pixel(&mut self, x: i32, y: i32, color: Color) -> bool {
        let (byte_offset, mask) = match self.locate(x, y) {
            Some(location) => location,
            None => return false,
        };

        match self.buf.get_mut(byte_offset) {
            Some(byte) => {
                match color {
                    Color::White => *byte |= mask,
                    Color::Black => *byte &= !mask,
                }
                true
            }
            None => false,
        }
    }

    /// Read back one pixel in logical coordinates.
    pub fn pixel(&self, x: i32, y: i32) -> Option<Color> {
        let (byte_offset, mask) = self.locate(x, y)?;
        let byte = self.buf.get(byte_offset)?;
        Some(if byte & mask != 0 {
            Color::White
        } else {
            Color::Black
        })
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.buf
    }

    /// Byte offset and bit mask for a logical point.
    fn locate(&self, x: i32, y: i32) -> Option<(usize, u8)> {
        let (x, y) = self.to_physical(x, y)?;
        let width_in_byte = self.width / 8 + (self.width % 8 != 0) as usize;
        Some((y * width_in_byte + x / 8, 0x80 >> (x % 8)))
    }

    fn to_physical(&self, x: i32, y: i32) -> Option<(usize, usize)> {
        let (width, height) = self.logical_size();
        if x < 0 || y < 0 || x as usize >= width || y as usize >= height {
            return None;
        }
        let (x, y) = (x as usize, y as usize);
        let (w, h) = (self.width, self.height);

        let (mut x, mut y) = match self.rotation {
            DisplayRotation::Rotate0 => (x, y),
            DisplayRotation::Rotate90 => (w - y - 1, x),
            DisplayRotation::Rotate180 => (w - x - 1, h - y - 1),
            DisplayRotation::Rotate270 => (y, h - x - 1),
        };

        match self.mirroring {
            Mirroring::Horizontal => {
                x = w - x - 1;
            }
            Mirroring::Vertical => {
                y = h - y - 1;
            }
            Mirroring::Origin => {
                x = w - x - 1;
                y = h - y - 1;
            }
            Mirroring::None => (),
        }

        Some((x, y))
    }
}

impl<const N: usize> OriginDimensions for FrameBuffer<N> {
    fn size(&self) -> Size {
        let (width, height) = self.logical_size();
        Size::new(width as u32, height as u32)
    }
}

impl<const N: usize> DrawTarget for FrameBuffer<N> {
    type Color = BinaryColor;
    type Error = Infallible;

    fn draw_iter<I>(&mut self, pixels: I) -> Result<(), Self::Error>
    where
        I: IntoIterator<Item = Pixel<Self::Color>>,
    {
        for Pixel(coord, color) in pixels.into_iter() {
            self.set_pixel(coord.x, coord.y, color.into());
        }

        Ok(())
    }

    fn clear(&mut self, color: Self::Color) -> Result<(), Self::Error> {
        self.fill(color.into());
        Ok(())
    }
}
