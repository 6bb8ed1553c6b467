use crate::error::{ReplaintError, ReplaintResult};

/// Index of a command within a stroke log's command stream.
#[derive(
    Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, serde::Serialize, serde::Deserialize,
)]
pub struct CommandIndex(pub u32);

/// Output raster dimensions, in pixels.
///
/// Stroke logs store coordinates as canvas-width fractions, so the canvas
/// size is chosen by the caller at replay time, not by the file.
#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct CanvasSize {
    pub width: u32,
    pub height: u32,
}

impl CanvasSize {
    pub fn new(width: u32, height: u32) -> ReplaintResult<Self> {
        if width == 0 || height == 0 {
            return Err(ReplaintError::validation("canvas dimensions must be > 0"));
        }
        Ok(Self { width, height })
    }

    /// Derive a canvas from a target width and the header's aspect ratio
    /// (width / height). Non-finite or non-positive ratios fall back to 1:1.
    pub fn from_width_and_aspect(width: u32, aspect: f32) -> ReplaintResult<Self> {
        let aspect = if aspect.is_finite() && aspect > 0.0 {
            aspect
        } else {
            1.0
        };
        let height = (f64::from(width) / f64::from(aspect)).round().max(1.0) as u32;
        Self::new(width, height)
    }

    pub fn pixel_count(self) -> usize {
        self.width as usize * self.height as usize
    }

    /// Byte length of one RGBA8 buffer for this canvas.
    pub fn rgba_len(self) -> usize {
        self.pixel_count() * 4
    }
}

/// Straight (non-premultiplied) 8-bit RGB tool colour.
#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct Rgb8 {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Rgb8 {
    pub const BLACK: Self = Self { r: 0, g: 0, b: 0 };
    pub const WHITE: Self = Self {
        r: 255,
        g: 255,
        b: 255,
    };

    pub fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn canvas_rejects_zero_dimensions() {
        assert!(CanvasSize::new(0, 100).is_err());
        assert!(CanvasSize::new(100, 0).is_err());
    }

    #[test]
    fn canvas_from_aspect_rounds_height() {
        let c = CanvasSize::from_width_and_aspect(300, 1.5).unwrap();
        assert_eq!(c.width, 300);
        assert_eq!(c.height, 200);
    }

    #[test]
    fn canvas_from_degenerate_aspect_is_square() {
        for aspect in [0.0, -2.0, f32::NAN, f32::INFINITY] {
            let c = CanvasSize::from_width_and_aspect(64, aspect).unwrap();
            assert_eq!((c.width, c.height), (64, 64));
        }
    }

    #[test]
    fn rgba_len_is_four_bytes_per_pixel() {
        let c = CanvasSize::new(7, 3).unwrap();
        assert_eq!(c.pixel_count(), 21);
        assert_eq!(c.rgba_len(), 84);
    }
}
