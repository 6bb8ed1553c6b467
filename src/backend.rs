//! Backend seams: the layer-stack capability interface the replay engine is
//! generic over, and the pixel sink it blits finished frames into.

use crate::brush::BrushEngine;
use crate::core::{CanvasSize, Rgb8};
use crate::error::ReplaintResult;
use crate::state::UserState;

/// A stroke log always addresses exactly five layers. Index 0 is topmost;
/// operations reorder, clear, or composite them but never create or destroy
/// one.
pub const LAYER_COUNT: usize = 5;

/// Anything that can receive a full-canvas RGBA8 blit. The display side of a
/// viewer implements this; the engine knows nothing beyond it.
pub trait FrameSink {
    fn put_frame(&mut self, size: CanvasSize, rgba8: &[u8]) -> ReplaintResult<()>;
}

/// Capability interface of a layer-stack backend.
///
/// The replay engine owns tool state, user scratch buffers, and the brush
/// engine; a backend owns the five layers' raster storage and the pixel
/// effects of layer operations. Keeping the seam here lets a GPU or surface
/// backend replace [`crate::PixelBackend`] without touching replay logic.
pub trait LayerBackend {
    /// Reallocate every layer for a new canvas size, discarding content.
    fn set_size(&mut self, size: CanvasSize);

    fn size(&self) -> CanvasSize;

    /// Blend the user's accumulated stroke mask into the layer at `layer`,
    /// then mark it changed. The mask itself is left for the caller to clear.
    fn composite_stroke(
        &mut self,
        layer: usize,
        brush: &BrushEngine,
        user: &mut UserState,
    ) -> ReplaintResult<()>;

    /// Remove the layer at `src` and reinsert it at `dst`; everything in
    /// between shifts by one.
    fn move_layer(&mut self, src: usize, dst: usize) -> ReplaintResult<()>;

    /// Composite layer `src` onto layer `dst`. When `src` sits *below* `dst`
    /// in paint order (`src > dst`), the composite must run in "under"
    /// order: `dst` keeps its own content on top.
    fn copy_layer(&mut self, src: usize, dst: usize) -> ReplaintResult<()>;

    /// Zero the layer's pixels. The layer stays in the stack.
    fn clear_layer(&mut self, layer: usize) -> ReplaintResult<()>;

    /// Same pixel effect as [`LayerBackend::clear_layer`]; exists as the
    /// restart hook so playback can begin from a blank slate.
    fn reset_layer(&mut self, layer: usize) -> ReplaintResult<()>;

    /// Mirror every layer about the canvas center along the given axes,
    /// regardless of which layer is active.
    fn flip(&mut self, flip_x: bool, flip_y: bool);

    /// Flatten visible layers bottom-to-top over `background` and hand the
    /// full-canvas result to `sink`.
    fn blit_visible(&mut self, background: Rgb8, sink: &mut dyn FrameSink) -> ReplaintResult<()>;
}

/// Trivial owned-buffer sink, for tests and offline export.
#[derive(Clone, Debug, Default)]
pub struct FrameBuffer {
    pub size: Option<CanvasSize>,
    pub rgba8: Vec<u8>,
}

impl FrameBuffer {
    pub fn new() -> Self {
        Self::default()
    }
}

impl FrameSink for FrameBuffer {
    fn put_frame(&mut self, size: CanvasSize, rgba8: &[u8]) -> ReplaintResult<()> {
        self.size = Some(size);
        self.rgba8.clear();
        self.rgba8.extend_from_slice(rgba8);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn frame_buffer_copies_the_blit() {
        let size = CanvasSize::new(2, 2).unwrap();
        let mut sink = FrameBuffer::new();
        sink.put_frame(size, &[7u8; 16]).unwrap();
        assert_eq!(sink.size, Some(size));
        assert_eq!(sink.rgba8, vec![7u8; 16]);
    }
}
