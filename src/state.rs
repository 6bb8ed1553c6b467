use kurbo::Point;

use crate::command::{BrushControl, BrushType};
use crate::core::{CanvasSize, Rgb8};
use crate::region::Region;

/// The "current pen" for one logical user: everything a stroke-point command
/// needs to rasterize, plus the in-flight stroke bookkeeping.
#[derive(Clone, Debug)]
pub struct ToolState {
    /// Active layer index (0 = topmost). Always read fresh; layer moves can
    /// re-target what lives at this index.
    pub layer: usize,
    pub color: Rgb8,
    pub brush_type: BrushType,
    pub brush_control: BrushControl,
    /// Brush radius in output pixels (already scaled by canvas width).
    pub brush_radius: f64,
    /// Stroke opacity in `[0, 1]`.
    pub opacity: f64,
    /// Most recent pen pressure in `[0, 1]`.
    pub pressure: f64,
    /// A stroke is in progress: stroke points extend it instead of starting
    /// a new one.
    pub drawing: bool,
    pub last_point: Point,
    pub last_pressure: f64,
}

impl Default for ToolState {
    fn default() -> Self {
        Self {
            layer: 0,
            color: Rgb8::BLACK,
            brush_type: BrushType::Hard,
            brush_control: BrushControl::VariableOpacity,
            brush_radius: 20.0,
            opacity: 1.0,
            pressure: 0.0,
            drawing: false,
            last_point: Point::ZERO,
            last_pressure: 0.0,
        }
    }
}

/// Per-user replay state: the tool plus the private stroke scratch mask.
///
/// Multiple users may interleave in one stream; each gets an independent
/// `UserState` so one user's in-flight stroke survives another's commands.
#[derive(Clone, Debug)]
pub struct UserState {
    pub tool: ToolState,
    /// One alpha byte per canvas pixel; the current stroke accumulates here
    /// until finalize composites it into a layer.
    pub mask: Vec<u8>,
    /// Pixels the current stroke has touched.
    pub dirty: Region,
}

impl UserState {
    pub fn new(size: CanvasSize) -> Self {
        Self {
            tool: ToolState::default(),
            mask: vec![0; size.pixel_count()],
            dirty: Region::empty(),
        }
    }

    /// Reallocate the stroke mask for a new canvas size. Any accumulated
    /// stroke data is discarded.
    pub fn set_buffer_size(&mut self, size: CanvasSize) {
        self.mask.clear();
        self.mask.resize(size.pixel_count(), 0);
        self.dirty.reset();
    }

    /// Zero the stroke mask and dirty region, after a finalize.
    pub fn clear_mask(&mut self) {
        self.mask.fill(0);
        self.dirty.reset();
    }
}
