//! Decoded pixel data handed to the renderer

/// Tightly packed RGBA8 pixels, row-major, top row first
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageData {
    width: u32,
    height: u32,
    pixels: Vec<u8>,
}

/// Pixel buffer size does not match its dimensions
#[derive(Debug, thiserror::Error)]
#[error("Pixel buffer of {actual} bytes does not match {width}x{height} RGBA8 ({expected} bytes)")]
pub struct ImageSizeMismatch {
    width: u32,
    height: u32,
    expected: usize,
    actual: usize,
}

impl ImageData {
    /// Bytes per RGBA8 pixel
    pub const BYTES_PER_PIXEL: usize = 4;

    /// Wrap decoded RGBA8 pixels
    pub fn from_rgba8(width: u32, height: u32, pixels: Vec<u8>) -> Result<Self, ImageSizeMismatch> {
        let expected = width as usize * height as usize * Self::BYTES_PER_PIXEL;
        if pixels.len() != expected || expected == 0 {
            return Err(ImageSizeMismatch {
                width,
                height,
                expected,
                actual: pixels.len(),
            });
        }
        Ok(Self { width, height, pixels })
    }

    /// Single-pixel image of one color
    pub fn solid(rgba: [u8; 4]) -> Self {
        Self {
            width: 1,
            height: 1,
            pixels: rgba.to_vec(),
        }
    }

    /// Width in pixels
    pub const fn width(&self) -> u32 {
        self.width
    }

    /// Height in pixels
    pub const fn height(&self) -> u32 {
        self.height
    }

    /// Raw pixel bytes
    pub fn pixels(&self) -> &[u8] {
        &self.pixels
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_size_checked() {
        assert!(ImageData::from_rgba8(2, 2, vec![0; 16]).is_ok());
        assert!(ImageData::from_rgba8(2, 2, vec![0; 15]).is_err());
        assert!(ImageData::from_rgba8(0, 0, Vec::new()).is_err());
    }

    #[test]
    fn test_solid() {
        let white = ImageData::solid([255; 4]);
        assert_eq!((white.width(), white.height()), (1, 1));
        assert_eq!(white.pixels(), &[255, 255, 255, 255]);
    }
}
