use embedded_graphics::{
    pixelcolor::BinaryColor,
    prelude::{DrawTarget, OriginDimensions, Pixel, Size},
};

/// Owned 1-bit-per-pixel frame buffer, row-major, 8 pixels per byte with
/// the most significant bit leftmost. The render loop draws into it and
/// pushes the whole frame to the display every pass.
#[derive(Debug, Clone)]
pub struct Frame {
    width: u32,
    height: u32,
    bits: Vec<u8>,
}

impl Frame {
    pub fn new(width: u32, height: u32) -> Self {
        let bytes_per_row = width.div_ceil(8) as usize;
        Self {
            width,
            height,
            bits: vec![0; bytes_per_row * height as usize],
        }
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    /// Blanks every pixel.
    pub fn reset(&mut self) {
        self.bits.fill(0);
    }

    fn index(&self, x: u32, y: u32) -> (usize, u8) {
        let bytes_per_row = self.width.div_ceil(8);
        let byte = (y * bytes_per_row + x / 8) as usize;
        let mask = 0x80 >> (x % 8);
        (byte, mask)
    }

    pub fn set(&mut self, x: u32, y: u32, on: bool) {
        if x >= self.width || y >= self.height {
            return;
        }
        let (byte, mask) = self.index(x, y);
        if on {
            self.bits[byte] |= mask;
        } else {
            self.bits[byte] &= !mask;
        }
    }

    pub fn get(&self, x: u32, y: u32) -> bool {
        if x >= self.width || y >= self.height {
            return false;
        }
        let (byte, mask) = self.index(x, y);
        self.bits[byte] & mask != 0
    }

    /// Raw packed pixel data, as pushed to the display.
    pub fn data(&self) -> &[u8] {
        &self.bits
    }

    pub fn lit_pixels(&self) -> usize {
        self.bits.iter().map(|byte| byte.count_ones() as usize).sum()
    }
}

impl OriginDimensions for Frame {
    fn size(&self) -> Size {
        Size::new(self.width, self.height)
    }
}

impl DrawTarget for Frame {
    type Color = BinaryColor;
    type Error = core::convert::Infallible;

    fn draw_iter<I>(&mut self, pixels: I) -> Result<(), Self::Error>
    where
        I: IntoIterator<Item = Pixel<Self::Color>>,
    {
        for Pixel(point, color) in pixels {
            if point.x >= 0 && point.y >= 0 {
                self.set(point.x as u32, point.y as u32, color.is_on());
            }
        }
        Ok(())
    }
}
